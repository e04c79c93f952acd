// ==========================================
// Sistema de Inventario - Validador de filas
// ==========================================
// Etapa 2: reglas declarativas por fila + resolución de referencias.
// Una sola pasada determinista de izquierda a derecha, en el orden del
// archivo: el número de fila es el contrato con el usuario.
// `valido` = conjunción de reglas bloqueantes; las advertencias nunca
// bloquean.
// ==========================================

use crate::config::ImportConfig;
use crate::domain::reference::ReferenceCatalogs;
use crate::domain::row::{AdjustmentRow, ProductRow, RawAdjustmentRecord, RawProductRecord};
use crate::domain::types::AccionStock;
use crate::importer::reference_resolver::resolver_con_umbral;
use chrono::NaiveDate;

// ==========================================
// Interpretación de valores crudos
// ==========================================

/// Cantidad: entero estrictamente positivo
fn interpretar_cantidad(valor: &str) -> Result<i64, String> {
    let valor = valor.trim();
    if valor.is_empty() {
        return Err("La cantidad es obligatoria".to_string());
    }
    match valor.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(n) => Err(format!("La cantidad debe ser un entero positivo (valor: {})", n)),
        Err(_) => Err(format!(
            "La cantidad debe ser un entero positivo (valor: '{}')",
            valor
        )),
    }
}

/// Precio: decimal no negativo
fn interpretar_precio(valor: &str, campo: &str) -> Result<f64, String> {
    let normalizado = valor.trim().replace(',', ".");
    match normalizado.parse::<f64>() {
        Ok(p) if p >= 0.0 => Ok(p),
        Ok(p) => Err(format!("El {} no puede ser negativo (valor: {})", campo, p)),
        Err(_) => Err(format!("El {} no es un número válido (valor: '{}')", campo, valor)),
    }
}

/// Fecha: ISO o formato local dd/mm/aaaa
fn interpretar_fecha(valor: &str) -> Option<NaiveDate> {
    let valor = valor.trim();
    NaiveDate::parse_from_str(valor, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(valor, "%d/%m/%Y"))
        .ok()
}

// ==========================================
// Validación de ajustes de inventario
// ==========================================
// Reglas bloqueantes: producto no vacío, cantidad entero positivo,
// almacén y tipo de operación resueltos, y motivo resuelto cuando el
// tipo de operación lo exige (obligatoriedad condicional por fila).
pub fn validar_ajustes(
    registros: &[RawAdjustmentRecord],
    catalogos: &ReferenceCatalogs,
    config: &ImportConfig,
) -> Vec<AdjustmentRow> {
    registros
        .iter()
        .map(|registro| validar_ajuste(registro, catalogos, config))
        .collect()
}

fn validar_ajuste(
    registro: &RawAdjustmentRecord,
    catalogos: &ReferenceCatalogs,
    config: &ImportConfig,
) -> AdjustmentRow {
    let mut errores = Vec::new();
    let mut advertencias = Vec::new();
    let umbral = config.umbral_similitud;

    // Producto: identificador obligatorio (se resuelve en el backend)
    if registro.producto.is_empty() {
        errores.push("El producto es obligatorio".to_string());
    }

    // Cantidad
    let cantidad = match interpretar_cantidad(&registro.cantidad) {
        Ok(n) => n,
        Err(mensaje) => {
            errores.push(mensaje);
            0
        }
    };

    // Almacén: referencia obligatoria
    let almacen_id = if registro.almacen.is_empty() {
        errores.push("El almacén es obligatorio".to_string());
        None
    } else {
        match resolver_con_umbral(&registro.almacen, &catalogos.almacenes, umbral) {
            Some(entidad) => Some(entidad.id),
            None => {
                errores.push(format!("Almacén '{}' no reconocido", registro.almacen));
                None
            }
        }
    };

    // Tipo de operación: referencia obligatoria
    let tipo_operacion_id = if registro.tipo_operacion.is_empty() {
        errores.push("El tipo de operación es obligatorio".to_string());
        None
    } else {
        match resolver_con_umbral(&registro.tipo_operacion, &catalogos.tipos_operacion, umbral) {
            Some(entidad) => Some(entidad.id),
            None => {
                errores.push(format!(
                    "Tipo de operación '{}' no reconocido",
                    registro.tipo_operacion
                ));
                None
            }
        }
    };

    // Motivo: obligatorio solo si la operación resuelta lo exige
    let motivo_requerido = tipo_operacion_id
        .map(|id| catalogos.operacion_requiere_motivo(id))
        .unwrap_or(false);

    let motivo_id = if registro.motivo.is_empty() {
        if motivo_requerido {
            errores.push(format!(
                "El motivo es obligatorio para la operación '{}'",
                registro.tipo_operacion
            ));
        }
        None
    } else {
        match resolver_con_umbral(&registro.motivo, &catalogos.tipos_motivo, umbral) {
            Some(entidad) => Some(entidad.id),
            None if motivo_requerido => {
                errores.push(format!("Motivo '{}' no reconocido", registro.motivo));
                None
            }
            None => {
                // Referencia opcional sin resolver: se conserva el texto
                advertencias.push(format!(
                    "Motivo '{}' no encontrado en el catálogo; se conservará el texto original",
                    registro.motivo
                ));
                None
            }
        }
    };

    let valido = errores.is_empty();

    AdjustmentRow {
        numero_fila: registro.numero_fila,
        producto: registro.producto.clone(),
        almacen: registro.almacen.clone(),
        almacen_id,
        tipo_operacion: registro.tipo_operacion.clone(),
        tipo_operacion_id,
        motivo: registro.motivo.clone(),
        motivo_id,
        cantidad,
        lote: registro.lote.clone(),
        observaciones: registro.observaciones.clone().unwrap_or_default(),
        valido,
        errores,
        advertencias,
    }
}

// ==========================================
// Validación de productos
// ==========================================
// Bloqueantes: nombre no vacío, cantidad entero positivo, precios no
// negativos. Las referencias de catálogo (categoría/marca/unidad/
// almacén) son opcionales: sin resolver → advertencia y texto original.
pub fn validar_productos(
    registros: &[RawProductRecord],
    catalogos: &ReferenceCatalogs,
    config: &ImportConfig,
) -> Vec<ProductRow> {
    let hoy = chrono::Local::now().date_naive();
    registros
        .iter()
        .map(|registro| validar_producto(registro, catalogos, config, hoy))
        .collect()
}

fn validar_producto(
    registro: &RawProductRecord,
    catalogos: &ReferenceCatalogs,
    config: &ImportConfig,
    hoy: NaiveDate,
) -> ProductRow {
    let mut errores = Vec::new();
    let mut advertencias = Vec::new();
    let umbral = config.umbral_similitud;

    if registro.nombre.is_empty() {
        errores.push("El nombre del producto es obligatorio".to_string());
    }

    let cantidad = match interpretar_cantidad(&registro.cantidad) {
        Ok(n) => n,
        Err(mensaje) => {
            errores.push(mensaje);
            0
        }
    };

    // Precios
    let precio_compra = registro.precio_compra.as_deref().and_then(|v| {
        match interpretar_precio(v, "precio de compra") {
            Ok(p) => Some(p),
            Err(mensaje) => {
                errores.push(mensaje);
                None
            }
        }
    });
    let precio_venta = registro.precio_venta.as_deref().and_then(|v| {
        match interpretar_precio(v, "precio de venta") {
            Ok(p) => Some(p),
            Err(mensaje) => {
                errores.push(mensaje);
                None
            }
        }
    });

    if let (Some(compra), Some(venta)) = (precio_compra, precio_venta) {
        if venta < compra {
            advertencias.push(format!(
                "El precio de venta ({:.2}) es menor al precio de compra ({:.2})",
                venta, compra
            ));
        }
    }

    // Referencias opcionales: sin resolver → advertencia, texto intacto
    let categoria_id = resolver_opcional(
        registro.categoria.as_deref(),
        &catalogos.categorias,
        "Categoría",
        umbral,
        &mut advertencias,
    );
    let marca_id = resolver_opcional(
        registro.marca.as_deref(),
        &catalogos.marcas,
        "Marca",
        umbral,
        &mut advertencias,
    );
    let unidad_id = resolver_opcional(
        registro.unidad.as_deref(),
        &catalogos.unidades,
        "Unidad",
        umbral,
        &mut advertencias,
    );
    let almacen_id = resolver_opcional(
        registro.almacen.as_deref(),
        &catalogos.almacenes,
        "Almacén",
        umbral,
        &mut advertencias,
    );

    // Campos opcionales ausentes
    if registro.categoria.is_none() {
        advertencias.push("Fila sin categoría".to_string());
    }
    if registro.codigo_barra.is_none() && registro.sku.is_none() {
        advertencias.push("Fila sin código de barras ni SKU".to_string());
    }

    // Vencimiento
    let fecha_vencimiento = match registro.fecha_vencimiento.as_deref() {
        None => None,
        Some(crudo) => match interpretar_fecha(crudo) {
            Some(fecha) => {
                let dias = (fecha - hoy).num_days();
                if dias < 0 {
                    advertencias.push(format!("El producto está vencido desde {}", fecha));
                } else if dias <= config.dias_aviso_vencimiento {
                    advertencias.push(format!("Vencimiento próximo: {} (en {} días)", fecha, dias));
                }
                Some(fecha)
            }
            None => {
                advertencias.push(format!(
                    "Fecha de vencimiento ilegible: '{}' (se esperaba AAAA-MM-DD o DD/MM/AAAA)",
                    crudo
                ));
                None
            }
        },
    };

    let valido = errores.is_empty();

    ProductRow {
        numero_fila: registro.numero_fila,
        nombre: registro.nombre.clone(),
        codigo_barra: registro.codigo_barra.clone(),
        sku: registro.sku.clone(),
        categoria: registro.categoria.clone().unwrap_or_default(),
        categoria_id,
        marca: registro.marca.clone().unwrap_or_default(),
        marca_id,
        unidad: registro.unidad.clone().unwrap_or_default(),
        unidad_id,
        almacen: registro.almacen.clone().unwrap_or_default(),
        almacen_id,
        cantidad,
        precio_compra,
        precio_venta,
        fecha_vencimiento,
        lote: registro.lote.clone(),
        observaciones: registro.observaciones.clone().unwrap_or_default(),
        existente: None,
        accion: AccionStock::Sumar,
        valido,
        errores,
        advertencias,
    }
}

// ==========================================
// Informe de validación
// ==========================================

/// Resume un lote validado para la UI. El detalle por fila solo
/// incluye filas con errores o advertencias.
pub fn construir_reporte<R: crate::importer::duplicate_detector::FilaLote>(
    filas: &[R],
    grupos_duplicados: usize,
) -> crate::domain::row::ValidationReport {
    use crate::domain::row::FilaIncidencia;

    let filas_validas = filas.iter().filter(|f| f.es_valida()).count();
    let filas_con_advertencias = filas.iter().filter(|f| !f.advertencias().is_empty()).count();

    let detalles = filas
        .iter()
        .filter(|f| !f.errores().is_empty() || !f.advertencias().is_empty())
        .map(|f| FilaIncidencia {
            fila: f.numero_fila(),
            valido: f.es_valida(),
            errores: f.errores().to_vec(),
            advertencias: f.advertencias().to_vec(),
        })
        .collect();

    crate::domain::row::ValidationReport {
        total_filas: filas.len(),
        filas_validas,
        filas_invalidas: filas.len() - filas_validas,
        filas_con_advertencias,
        grupos_duplicados,
        detalles,
    }
}

fn resolver_opcional(
    texto: Option<&str>,
    candidatos: &[crate::domain::reference::ReferenceEntity],
    etiqueta: &str,
    umbral: f64,
    advertencias: &mut Vec<String>,
) -> Option<i64> {
    let texto = texto?;
    match resolver_con_umbral(texto, candidatos, umbral) {
        Some(entidad) => Some(entidad.id),
        None => {
            advertencias.push(format!(
                "{} '{}' no encontrada en el catálogo; se conservará el texto original",
                etiqueta, texto
            ));
            None
        }
    }
}
