// ==========================================
// Sistema de Inventario - Errores de importación
// ==========================================
// Herramienta: macro derive de thiserror
// Política: solo los errores estructurales y de envío interrumpen el
// flujo; los problemas por fila se acumulan en la propia fila.
// ==========================================

use crate::importer::backend::BackendError;
use thiserror::Error;

/// Errores del pipeline de importación
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== Errores estructurales (previos a toda fila) =====
    #[error("El archivo supera el límite de tamaño: {tamano} bytes (máximo {limite})")]
    ArchivoDemasiadoGrande { tamano: u64, limite: u64 },

    #[error("Formato de archivo no soportado: {0} (solo csv/xlsx/xls/ods)")]
    FormatoNoSoportado(String),

    #[error("El archivo está vacío")]
    ArchivoVacio,

    #[error("El archivo no contiene filas de datos")]
    SinFilasDeDatos,

    #[error("El archivo supera el límite de filas: {filas} (máximo {limite})")]
    DemasiadasFilas { filas: usize, limite: usize },

    #[error("Faltan columnas obligatorias: {}", .0.join(", "))]
    ColumnasFaltantes(Vec<String>),

    #[error("Fallo al interpretar Excel/ODS: {0}")]
    ExcelParse(String),

    #[error("Fallo al interpretar CSV: {0}")]
    CsvParse(String),

    #[error("Fallo al leer el archivo: {0}")]
    LecturaArchivo(String),

    // ===== Errores de flujo =====
    #[error("Operación no permitida en el paso {actual} (se esperaba {esperado})")]
    EstadoInvalido { esperado: String, actual: String },

    #[error("Hay {0} grupos de duplicados sin resolver")]
    DuplicadosSinResolver(usize),

    #[error("No hay filas válidas para enviar")]
    SinFilasValidas,

    #[error("Edición inválida: {0}")]
    EdicionInvalida(String),

    // ===== Errores de envío (recuperables) =====
    #[error("Fallo el envío del lote: {0}")]
    Envio(#[from] BackendError),

    // ===== Corrida invalidada =====
    #[error("La operación fue invalidada por una cancelación o una carga más reciente")]
    Cancelado,

    // ===== Genérico =====
    #[error(transparent)]
    Otro(#[from] anyhow::Error),
}

// Conversión desde std::io::Error (lectura de archivo)
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::LecturaArchivo(err.to_string())
    }
}

// Conversión desde csv::Error
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParse(err.to_string())
    }
}

// Conversión desde calamine::Error
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParse(err.to_string())
    }
}

impl ImportError {
    /// Indica si el error es estructural (rechazo previo a las filas)
    pub fn es_estructural(&self) -> bool {
        matches!(
            self,
            ImportError::ArchivoDemasiadoGrande { .. }
                | ImportError::FormatoNoSoportado(_)
                | ImportError::ArchivoVacio
                | ImportError::SinFilasDeDatos
                | ImportError::DemasiadasFilas { .. }
                | ImportError::ColumnasFaltantes(_)
                | ImportError::ExcelParse(_)
                | ImportError::CsvParse(_)
                | ImportError::LecturaArchivo(_)
        )
    }
}

/// Alias de Result para el pipeline
pub type ImportResult<T> = Result<T, ImportError>;
