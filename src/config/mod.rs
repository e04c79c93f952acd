// ==========================================
// Sistema de Inventario - Configuración de importación
// ==========================================
// Responsabilidad: límites estructurales y umbrales del pipeline
// No incluye: lógica de negocio ni acceso a datos
// ==========================================

use serde::{Deserialize, Serialize};

// Límite de tamaño de archivo: 10 MB
pub const MAX_TAMANO_ARCHIVO_BYTES: u64 = 10 * 1024 * 1024;

// Límite de filas de datos por archivo
pub const MAX_FILAS_DATOS: usize = 5_000;

// Umbral por defecto del resolutor difuso (ver importer::matching)
pub const UMBRAL_SIMILITUD_DEFECTO: f64 = 0.60;

// ==========================================
// ImportConfig - límites y umbrales
// ==========================================
// Se construye una vez por sesión de importación;
// el pipeline nunca la modifica.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Tamaño máximo del archivo en bytes
    pub max_tamano_bytes: u64,

    /// Máximo de filas de datos (sin contar encabezado)
    pub max_filas: usize,

    /// Extensiones aceptadas (en minúsculas, sin punto)
    pub extensiones_permitidas: Vec<String>,

    /// Umbral de similitud para la resolución difusa de referencias
    pub umbral_similitud: f64,

    /// Días de anticipación para avisar vencimiento próximo
    pub dias_aviso_vencimiento: i64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_tamano_bytes: MAX_TAMANO_ARCHIVO_BYTES,
            max_filas: MAX_FILAS_DATOS,
            extensiones_permitidas: vec![
                "csv".to_string(),
                "xlsx".to_string(),
                "xls".to_string(),
                "ods".to_string(),
            ],
            umbral_similitud: UMBRAL_SIMILITUD_DEFECTO,
            dias_aviso_vencimiento: 30,
        }
    }
}

impl ImportConfig {
    /// Indica si la extensión (en minúsculas) está permitida
    pub fn extension_permitida(&self, ext: &str) -> bool {
        self.extensiones_permitidas.iter().any(|e| e == ext)
    }
}
