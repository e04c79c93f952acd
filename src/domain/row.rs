// ==========================================
// Sistema de Inventario - Modelos de fila e informes
// ==========================================
// Ciclo de vida de una fila:
//   RawRow (parser) → RawAdjustmentRecord / RawProductRecord (mapper)
//   → AdjustmentRow / ProductRow (validador + resolutor)
// Las filas crudas son efímeras; se descartan al validar.
// ==========================================

use crate::domain::types::{AccionStock, BatchOutcome, DuplicateKind};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ==========================================
// RawRow - fila cruda del parser
// ==========================================
// `numero_fila` es 1-based sobre las filas de datos y coincide con la
// posición en el archivo fuente: es el contrato con el usuario para
// que los mensajes de error sean accionables.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub numero_fila: usize,
    pub campos: HashMap<String, String>,
}

// ==========================================
// RawAdjustmentRecord - ajuste crudo tipado
// ==========================================
// Conserva los valores como texto: los números y fechas se interpretan
// en el validador para que un valor malformado sea un error de fila y
// no un fallo del mapeo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAdjustmentRecord {
    pub numero_fila: usize,
    pub producto: String,
    pub almacen: String,
    pub tipo_operacion: String,
    pub motivo: String,
    pub cantidad: String,
    pub lote: Option<String>,
    pub observaciones: Option<String>,
}

// ==========================================
// RawProductRecord - producto crudo tipado
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProductRecord {
    pub numero_fila: usize,
    pub nombre: String,
    pub codigo_barra: Option<String>,
    pub sku: Option<String>,
    pub categoria: Option<String>,
    pub marca: Option<String>,
    pub unidad: Option<String>,
    pub almacen: Option<String>,
    pub cantidad: String,
    pub precio_compra: Option<String>,
    pub precio_venta: Option<String>,
    pub fecha_vencimiento: Option<String>,
    pub lote: Option<String>,
    pub observaciones: Option<String>,
}

// ==========================================
// AdjustmentRow - fila de ajuste validada
// ==========================================
// `valido` es la conjunción de todas las reglas bloqueantes.
// Los campos *_id quedan en None cuando la referencia no se resolvió;
// el texto original siempre se conserva.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRow {
    pub numero_fila: usize,

    pub producto: String,
    pub almacen: String,
    pub almacen_id: Option<i64>,
    pub tipo_operacion: String,
    pub tipo_operacion_id: Option<i64>,
    pub motivo: String,
    pub motivo_id: Option<i64>,

    // Cantidad interpretada; 0 cuando el valor crudo no fue un entero
    // positivo (la fila queda inválida en ese caso)
    pub cantidad: i64,
    pub lote: Option<String>,
    pub observaciones: String,

    pub valido: bool,
    pub errores: Vec<String>,
    pub advertencias: Vec<String>,
}

// ==========================================
// ProductRow - fila de producto validada
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRow {
    pub numero_fila: usize,

    pub nombre: String,
    pub codigo_barra: Option<String>,
    pub sku: Option<String>,

    pub categoria: String,
    pub categoria_id: Option<i64>,
    pub marca: String,
    pub marca_id: Option<i64>,
    pub unidad: String,
    pub unidad_id: Option<i64>,
    pub almacen: String,
    pub almacen_id: Option<i64>,

    pub cantidad: i64,
    pub precio_compra: Option<f64>,
    pub precio_venta: Option<f64>,
    pub fecha_vencimiento: Option<NaiveDate>,
    pub lote: Option<String>,
    pub observaciones: String,

    // Coincidencia reportada por el backend (detección de existentes)
    pub existente: Option<ExistingEntityMatch>,
    pub accion: AccionStock,

    pub valido: bool,
    pub errores: Vec<String>,
    pub advertencias: Vec<String>,
}

// ==========================================
// ExistingEntityMatch - producto ya registrado
// ==========================================
// Enriquecido por la detección del backend: desglose de stock por
// almacén y cifras de previsualización para sumar vs reemplazar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingEntityMatch {
    pub producto_id: i64,
    pub nombre: String,
    pub stock_total: i64,
    pub stock_por_almacen: Vec<StockPorAlmacen>,
    pub preview_sumar: i64,
    pub preview_reemplazar: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockPorAlmacen {
    pub almacen_id: i64,
    pub almacen_nombre: String,
    pub cantidad: i64,
}

// ==========================================
// DuplicateGroup - grupo de filas duplicadas
// ==========================================
// Efímero: se recalcula bajo demanda y nunca se persiste.
// Invariante: `filas` tiene al menos 2 números de fila.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub clave: String,
    pub tipo: DuplicateKind,
    pub filas: Vec<usize>,
    pub cantidad_total: i64,
}

// ==========================================
// ValidationReport - resultado de validación
// ==========================================
// Salida hacia la UI tras la etapa de validación.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_filas: usize,
    pub filas_validas: usize,
    pub filas_invalidas: usize,
    pub filas_con_advertencias: usize,
    pub grupos_duplicados: usize,

    // Detalle por fila, solo para filas con errores o advertencias
    pub detalles: Vec<FilaIncidencia>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilaIncidencia {
    pub fila: usize,
    pub valido: bool,
    pub errores: Vec<String>,
    pub advertencias: Vec<String>,
}

// ==========================================
// BatchSubmission - instantánea de envío
// ==========================================
// Inmutable una vez creada: un reintento construye una instantánea
// nueva a partir del estado vigente, nunca muta la anterior.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSubmission<T> {
    pub id: Uuid,
    pub nombre_archivo: String,
    // Copia del contenido original para auditoría
    pub datos_csv: String,
    pub filas: Vec<T>,
    pub creado_en: DateTime<Utc>,
}

impl<T> BatchSubmission<T> {
    pub fn nueva(nombre_archivo: String, datos_csv: String, filas: Vec<T>) -> Self {
        Self {
            id: Uuid::new_v4(),
            nombre_archivo,
            datos_csv,
            filas,
            creado_en: Utc::now(),
        }
    }
}

// ==========================================
// BatchResult - resultado reportado por el backend
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub procesados: usize,
    pub errores: usize,
    pub mensaje: String,
    pub detalles: Vec<ErrorFila>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorFila {
    pub fila: usize,
    pub error: String,
    pub producto: Option<String>,
}

impl BatchResult {
    /// Desenlace del lote: el llamador debe poder distinguir éxito
    /// pleno, parcial y fallo total.
    pub fn desenlace(&self) -> BatchOutcome {
        if self.errores == 0 {
            BatchOutcome::Completo
        } else if self.procesados > 0 {
            BatchOutcome::Parcial
        } else {
            BatchOutcome::Fallido
        }
    }
}
