// ==========================================
// Sistema de Inventario - Entidades de referencia
// ==========================================
// Responsabilidad: registros canónicos de catálogo contra los que se
// resuelven los identificadores de texto libre del archivo.
// Los catálogos se entregan una vez por corrida de validación y son
// de solo lectura para el pipeline.
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ==========================================
// ReferenceEntity - registro canónico de catálogo
// ==========================================
// Compartida por todos los puntos de resolución:
// categorías, marcas, unidades, almacenes, tipos de operación y motivos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntity {
    pub id: i64,
    pub nombre: String,
}

impl ReferenceEntity {
    pub fn new(id: i64, nombre: impl Into<String>) -> Self {
        Self {
            id,
            nombre: nombre.into(),
        }
    }
}

// ==========================================
// ReferenceCatalogs - catálogos de una corrida
// ==========================================
// El llamador los construye antes de iniciar la validación.
// `operaciones_requieren_motivo` lista los ids de tipo de operación que
// vuelven obligatorio el campo motivo para esa fila (obligatoriedad
// condicional, no un esquema fijo).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceCatalogs {
    pub categorias: Vec<ReferenceEntity>,
    pub marcas: Vec<ReferenceEntity>,
    pub unidades: Vec<ReferenceEntity>,
    pub almacenes: Vec<ReferenceEntity>,
    pub tipos_operacion: Vec<ReferenceEntity>,
    pub tipos_motivo: Vec<ReferenceEntity>,

    pub operaciones_requieren_motivo: HashSet<i64>,
}

impl ReferenceCatalogs {
    /// Indica si el tipo de operación exige motivo
    pub fn operacion_requiere_motivo(&self, tipo_operacion_id: i64) -> bool {
        self.operaciones_requieren_motivo
            .contains(&tipo_operacion_id)
    }
}
