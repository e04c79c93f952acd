// ==========================================
// Sistema de Inventario - Capa de dominio
// ==========================================
// Responsabilidad: entidades y tipos compartidos del pipeline
// ==========================================

// Declaración de módulos
pub mod reference;
pub mod row;
pub mod types;

// Reexportación de tipos centrales
pub use reference::{ReferenceCatalogs, ReferenceEntity};
pub use row::{
    AdjustmentRow, BatchResult, BatchSubmission, DuplicateGroup, ErrorFila,
    ExistingEntityMatch, FilaIncidencia, ProductRow, RawAdjustmentRecord, RawProductRecord,
    RawRow, StockPorAlmacen, ValidationReport,
};
pub use types::{AccionStock, BatchOutcome, DuplicateKind, ImportStep, ResolutionStrategy};
