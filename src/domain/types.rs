// ==========================================
// Sistema de Inventario - Tipos de dominio
// ==========================================
// Enumeraciones del pipeline de importación
// Formato de serialización: SCREAMING_SNAKE_CASE (igual que el backend)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Paso del flujo de importación (Import Step)
// ==========================================
// Loading → Validating → Validated → Processing → Result
// Un error de envío regresa a Validated; cancelar regresa a Loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStep {
    Loading,    // Esperando archivo
    Validating, // Pipeline de validación en curso
    Validated,  // Confirmación interactiva
    Processing, // Envío al backend (no interactivo)
    Result,     // Terminal: resultado del lote disponible
}

impl fmt::Display for ImportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStep::Loading => write!(f, "LOADING"),
            ImportStep::Validating => write!(f, "VALIDATING"),
            ImportStep::Validated => write!(f, "VALIDATED"),
            ImportStep::Processing => write!(f, "PROCESSING"),
            ImportStep::Result => write!(f, "RESULT"),
        }
    }
}

// ==========================================
// Estrategia de resolución de duplicados
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStrategy {
    Fusionar,     // Suma cantidades y conserva la primera fila como base
    MantenerTodo, // Sin cambio estructural
    Cancelar,     // Descarta el lote completo
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionStrategy::Fusionar => write!(f, "FUSIONAR"),
            ResolutionStrategy::MantenerTodo => write!(f, "MANTENER_TODO"),
            ResolutionStrategy::Cancelar => write!(f, "CANCELAR"),
        }
    }
}

// ==========================================
// Tipo de clave de duplicado
// ==========================================
// Ajustes agrupan por producto+almacén+operación.
// Productos agrupan por nombre normalizado Y por código de barras
// (una misma fila puede aparecer en un grupo de cada tipo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DuplicateKind {
    ProductoAlmacenOperacion,
    NombreNormalizado,
    CodigoBarra,
    Sku,
}

impl fmt::Display for DuplicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateKind::ProductoAlmacenOperacion => write!(f, "PRODUCTO_ALMACEN_OPERACION"),
            DuplicateKind::NombreNormalizado => write!(f, "NOMBRE_NORMALIZADO"),
            DuplicateKind::CodigoBarra => write!(f, "CODIGO_BARRA"),
            DuplicateKind::Sku => write!(f, "SKU"),
        }
    }
}

// ==========================================
// Acción sobre stock existente
// ==========================================
// Aplica cuando el backend detecta un producto ya registrado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccionStock {
    Sumar,      // stock existente + cantidad importada
    Reemplazar, // la cantidad importada sustituye al stock
}

impl fmt::Display for AccionStock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccionStock::Sumar => write!(f, "sumar"),
            AccionStock::Reemplazar => write!(f, "reemplazar"),
        }
    }
}

// ==========================================
// Desenlace de un lote enviado
// ==========================================
// El orquestador nunca reporta éxito pleno si el backend informó errores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchOutcome {
    Completo, // procesados > 0, errores == 0
    Parcial,  // procesados > 0, errores > 0
    Fallido,  // procesados == 0
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOutcome::Completo => write!(f, "COMPLETO"),
            BatchOutcome::Parcial => write!(f, "PARCIAL"),
            BatchOutcome::Fallido => write!(f, "FALLIDO"),
        }
    }
}
