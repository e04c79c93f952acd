// ==========================================
// Sistema de Inventario - Interfaz con el backend
// ==========================================
// Responsabilidad: contrato de los dos endpoints externos que usa el
// pipeline (detección de existentes y envío final) y sus DTO.
// El transporte HTTP y la sesión viven fuera de este núcleo; los tests
// usan una implementación simulada.
// ==========================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errores reportados por la capa de transporte
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Error de red: {0}")]
    Red(String),

    #[error("Solicitud rechazada por el servidor: {0}")]
    Rechazada(String),
}

// ==========================================
// Detección de productos existentes
// ==========================================

/// Elemento de la consulta de detección (una fila del lote)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeteccionItem {
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo_barra: Option<String>,
    pub cantidad: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub almacen_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub almacen_nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lote: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeteccionRespuesta {
    pub success: bool,
    pub resultados: Vec<DeteccionResultado>,
}

/// Resultado por fila; `index` refiere a la posición en la consulta
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeteccionResultado {
    pub index: usize,
    pub existe: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producto_existente: Option<ProductoExistente>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductoExistente {
    pub id: i64,
    pub nombre: String,
    pub stock_total: i64,
    #[serde(default)]
    pub stock_por_almacen: Vec<StockAlmacenDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAlmacenDto {
    pub almacen_id: i64,
    pub almacen_nombre: String,
    pub cantidad: i64,
}

// ==========================================
// Envío final del lote
// ==========================================

/// Ajuste confirmado, tal como viaja al backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AjusteEnvio {
    pub fila: usize,
    pub producto: String,
    pub almacen_id: Option<i64>,
    pub tipo_operacion_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motivo_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motivo: Option<String>,
    pub cantidad: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lote: Option<String>,
    pub observaciones: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvioAjustes {
    pub nombre_archivo: String,
    pub datos_csv: String,
    pub ajustes: Vec<AjusteEnvio>,
}

/// Producto confirmado, tal como viaja al backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductoEnvio {
    pub fila: usize,
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo_barra: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub categoria_id: Option<i64>,
    pub categoria: String,
    pub marca_id: Option<i64>,
    pub unidad_id: Option<i64>,
    pub almacen_id: Option<i64>,
    pub cantidad: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precio_compra: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precio_venta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producto_existente_id: Option<i64>,
    pub accion_stock: crate::domain::types::AccionStock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lote: Option<String>,
    pub observaciones: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvioProductos {
    pub nombre_archivo: String,
    pub datos_csv: String,
    pub productos: Vec<ProductoEnvio>,
}

/// Respuesta del envío: conteos y detalle por fila fallida
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvioRespuesta {
    pub success: bool,
    pub procesados: usize,
    pub errores: usize,
    pub mensaje: String,
    #[serde(default)]
    pub detalles: Option<Vec<EnvioDetalle>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvioDetalle {
    pub fila: usize,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producto: Option<String>,
}

// ==========================================
// ImportBackend - contrato del backend
// ==========================================
// Implementado por la capa de transporte de la aplicación.
#[async_trait]
pub trait ImportBackend: Send + Sync {
    /// Consulta si cada fila corresponde a un producto ya registrado
    async fn detectar_existentes(
        &self,
        items: Vec<DeteccionItem>,
    ) -> Result<DeteccionRespuesta, BackendError>;

    /// Envía un lote de ajustes de inventario confirmado
    async fn enviar_ajustes(&self, envio: EnvioAjustes) -> Result<EnvioRespuesta, BackendError>;

    /// Envía un lote de productos confirmado
    async fn enviar_productos(&self, envio: EnvioProductos)
        -> Result<EnvioRespuesta, BackendError>;
}
