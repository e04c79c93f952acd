// ==========================================
// Sistema de Inventario - Mapeador de campos
// ==========================================
// Etapa 1: fila cruda (mapa encabezado → valor) → registro tipado.
// Los encabezados se comparan normalizados y admiten alias.
// El mapeo nunca falla por valores: los valores malformados se
// detectan en el validador como errores de fila.
// ==========================================

use crate::domain::row::{RawAdjustmentRecord, RawProductRecord, RawRow};
use crate::importer::matching;
use std::collections::HashMap;

/// Columnas obligatorias del archivo de ajustes de inventario
pub const COLUMNAS_AJUSTE: &[&str] = &["producto", "almacen", "tipo operacion", "cantidad"];

/// Columnas obligatorias del archivo de productos
pub const COLUMNAS_PRODUCTO: &[&str] = &["nombre", "cantidad"];

/// Alias aceptados por columna canónica (ya normalizados)
fn alias_de(canonica: &str) -> &'static [&'static str] {
    match canonica {
        "producto" => &["producto", "nombre producto", "articulo"],
        "nombre" => &["nombre", "producto", "descripcion"],
        "almacen" => &["almacen", "bodega", "deposito"],
        "tipo operacion" => &["tipo operacion", "operacion", "tipo de operacion"],
        "motivo" => &["motivo", "tipo motivo", "razon"],
        "cantidad" => &["cantidad", "cant", "stock", "unidades"],
        "lote" => &["lote", "numero lote"],
        "observaciones" => &["observaciones", "notas", "comentarios"],
        "codigo barra" => &["codigo barra", "codigo de barras", "barcode", "ean"],
        "sku" => &["sku", "codigo", "codigo interno"],
        "categoria" => &["categoria", "rubro"],
        "marca" => &["marca"],
        "unidad" => &["unidad", "unidad medida", "unidad de medida"],
        "precio compra" => &["precio compra", "costo", "precio de compra"],
        "precio venta" => &["precio venta", "precio", "precio de venta"],
        "fecha vencimiento" => &["fecha vencimiento", "vencimiento", "fecha de vencimiento"],
        _ => &[],
    }
}

/// Columnas canónicas requeridas que no aparecen en los encabezados
/// (bajo ningún alias). Usada por el parser para la validación
/// estructural del encabezado.
pub fn columnas_faltantes(encabezados: &[String], requeridas: &[&str]) -> Vec<String> {
    let normalizados: Vec<String> = encabezados.iter().map(|h| matching::normalizar(h)).collect();

    requeridas
        .iter()
        .filter(|canonica| {
            !alias_de(canonica)
                .iter()
                .any(|alias| normalizados.iter().any(|h| h == alias))
        })
        .map(|c| c.to_string())
        .collect()
}

/// Busca el valor de una columna canónica probando sus alias.
/// Devuelve None cuando la celda está ausente o vacía.
fn obtener(campos: &HashMap<String, String>, canonica: &str) -> Option<String> {
    for alias in alias_de(canonica) {
        for (encabezado, valor) in campos {
            if matching::normalizar(encabezado) == *alias {
                let recortado = valor.trim();
                if !recortado.is_empty() {
                    return Some(recortado.to_string());
                }
            }
        }
    }
    None
}

// ==========================================
// AdjustmentFieldMapper
// ==========================================
pub struct AdjustmentFieldMapper;

impl AdjustmentFieldMapper {
    pub fn mapear_fila(fila: &RawRow) -> RawAdjustmentRecord {
        RawAdjustmentRecord {
            numero_fila: fila.numero_fila,
            producto: obtener(&fila.campos, "producto").unwrap_or_default(),
            almacen: obtener(&fila.campos, "almacen").unwrap_or_default(),
            tipo_operacion: obtener(&fila.campos, "tipo operacion").unwrap_or_default(),
            motivo: obtener(&fila.campos, "motivo").unwrap_or_default(),
            cantidad: obtener(&fila.campos, "cantidad").unwrap_or_default(),
            lote: obtener(&fila.campos, "lote"),
            observaciones: obtener(&fila.campos, "observaciones"),
        }
    }

    pub fn mapear(filas: &[RawRow]) -> Vec<RawAdjustmentRecord> {
        filas.iter().map(Self::mapear_fila).collect()
    }
}

// ==========================================
// ProductFieldMapper
// ==========================================
pub struct ProductFieldMapper;

impl ProductFieldMapper {
    pub fn mapear_fila(fila: &RawRow) -> RawProductRecord {
        RawProductRecord {
            numero_fila: fila.numero_fila,
            nombre: obtener(&fila.campos, "nombre").unwrap_or_default(),
            codigo_barra: obtener(&fila.campos, "codigo barra"),
            sku: obtener(&fila.campos, "sku"),
            categoria: obtener(&fila.campos, "categoria"),
            marca: obtener(&fila.campos, "marca"),
            unidad: obtener(&fila.campos, "unidad"),
            almacen: obtener(&fila.campos, "almacen"),
            cantidad: obtener(&fila.campos, "cantidad").unwrap_or_default(),
            precio_compra: obtener(&fila.campos, "precio compra"),
            precio_venta: obtener(&fila.campos, "precio venta"),
            fecha_vencimiento: obtener(&fila.campos, "fecha vencimiento"),
            lote: obtener(&fila.campos, "lote"),
            observaciones: obtener(&fila.campos, "observaciones"),
        }
    }

    pub fn mapear(filas: &[RawRow]) -> Vec<RawProductRecord> {
        filas.iter().map(Self::mapear_fila).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fila(pares: &[(&str, &str)]) -> RawRow {
        RawRow {
            numero_fila: 1,
            campos: pares
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_mapeo_ajuste_basico() {
        let registro = AdjustmentFieldMapper::mapear_fila(&fila(&[
            ("Producto", "Harina 000"),
            ("Almacén", "Central"),
            ("Tipo Operación", "Salida"),
            ("Cantidad", "5"),
        ]));

        assert_eq!(registro.producto, "Harina 000");
        assert_eq!(registro.almacen, "Central");
        assert_eq!(registro.tipo_operacion, "Salida");
        assert_eq!(registro.cantidad, "5");
        assert_eq!(registro.motivo, "");
    }

    #[test]
    fn test_mapeo_acepta_alias() {
        let registro = AdjustmentFieldMapper::mapear_fila(&fila(&[
            ("Artículo", "Harina"),
            ("Bodega", "Norte"),
            ("Operación", "Entrada"),
            ("Cant", "3"),
        ]));

        assert_eq!(registro.producto, "Harina");
        assert_eq!(registro.almacen, "Norte");
        assert_eq!(registro.tipo_operacion, "Entrada");
        assert_eq!(registro.cantidad, "3");
    }

    #[test]
    fn test_mapeo_producto_opcionales() {
        let registro = ProductFieldMapper::mapear_fila(&fila(&[
            ("Nombre", "Yerba 1kg"),
            ("Código de Barras", "779123"),
            ("Cantidad", "10"),
            ("Precio", "2500.50"),
        ]));

        assert_eq!(registro.nombre, "Yerba 1kg");
        assert_eq!(registro.codigo_barra, Some("779123".to_string()));
        assert_eq!(registro.precio_venta, Some("2500.50".to_string()));
        assert_eq!(registro.sku, None);
    }

    #[test]
    fn test_columnas_faltantes() {
        let encabezados = vec!["Producto".to_string(), "Cantidad".to_string()];
        let faltantes = columnas_faltantes(&encabezados, COLUMNAS_AJUSTE);
        assert_eq!(
            faltantes,
            vec!["almacen".to_string(), "tipo operacion".to_string()]
        );
    }

    #[test]
    fn test_celda_vacia_es_none() {
        let registro =
            ProductFieldMapper::mapear_fila(&fila(&[("Nombre", "Yerba"), ("SKU", "   ")]));
        assert_eq!(registro.sku, None);
    }
}
