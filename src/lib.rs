// ==========================================
// Sistema de Inventario - Núcleo de importación masiva
// ==========================================
// Pipeline: archivo tabular → validación → conciliación → envío por lotes
// Alcance: ajustes de inventario y altas/actualizaciones de catálogo
// ==========================================

// ==========================================
// Declaración de módulos
// ==========================================

// Capa de dominio - entidades y tipos
pub mod domain;

// Capa de importación - pipeline completo
pub mod importer;

// Capa de configuración - límites y umbrales
pub mod config;

// Sistema de logs
pub mod logging;

// ==========================================
// Reexportación de tipos centrales
// ==========================================

// Tipos de dominio
pub use domain::types::{
    AccionStock, BatchOutcome, DuplicateKind, ImportStep, ResolutionStrategy,
};

// Entidades de dominio
pub use domain::{
    AdjustmentRow, BatchResult, BatchSubmission, DuplicateGroup, ExistingEntityMatch,
    ProductRow, RawRow, ReferenceCatalogs, ReferenceEntity, ValidationReport,
};

// Pipeline de importación
pub use importer::{
    AdjustmentImportOrchestrator, ImportBackend, ImportError, ImportResult,
    ProductImportOrchestrator, SourceFile, UniversalFileParser,
};

// Configuración
pub use config::ImportConfig;

// ==========================================
// Constantes del sistema
// ==========================================

// Versión del crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Nombre del sistema
pub const APP_NAME: &str = "Sistema de Inventario - Importación Masiva";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
