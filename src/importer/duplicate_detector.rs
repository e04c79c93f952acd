// ==========================================
// Sistema de Inventario - Detector de duplicados
// ==========================================
// Etapa 3: agrupa filas validadas por clave compuesta y aplica la
// estrategia elegida como reductor puro sobre una instantánea.
// Invariante de conservación: la suma de cantidades de un grupo antes
// de fusionar es exactamente la cantidad de la fila fusionada.
// ==========================================

use crate::domain::row::{AdjustmentRow, DuplicateGroup, ProductRow};
use crate::domain::types::DuplicateKind;
use crate::importer::matching;
use std::collections::{HashMap, HashSet};

// ==========================================
// FilaLote - operaciones mínimas para agrupar y fusionar
// ==========================================
pub trait FilaLote {
    fn numero_fila(&self) -> usize;
    fn cantidad(&self) -> i64;
    fn set_cantidad(&mut self, cantidad: i64);
    fn agregar_observacion(&mut self, nota: &str);
    fn es_valida(&self) -> bool;
    fn errores(&self) -> &[String];
    fn advertencias(&self) -> &[String];
}

impl FilaLote for AdjustmentRow {
    fn numero_fila(&self) -> usize {
        self.numero_fila
    }
    fn cantidad(&self) -> i64 {
        self.cantidad
    }
    fn set_cantidad(&mut self, cantidad: i64) {
        self.cantidad = cantidad;
    }
    fn agregar_observacion(&mut self, nota: &str) {
        if self.observaciones.is_empty() {
            self.observaciones = nota.to_string();
        } else {
            self.observaciones.push_str("; ");
            self.observaciones.push_str(nota);
        }
    }
    fn es_valida(&self) -> bool {
        self.valido
    }
    fn errores(&self) -> &[String] {
        &self.errores
    }
    fn advertencias(&self) -> &[String] {
        &self.advertencias
    }
}

impl FilaLote for ProductRow {
    fn numero_fila(&self) -> usize {
        self.numero_fila
    }
    fn cantidad(&self) -> i64 {
        self.cantidad
    }
    fn set_cantidad(&mut self, cantidad: i64) {
        self.cantidad = cantidad;
    }
    fn agregar_observacion(&mut self, nota: &str) {
        if self.observaciones.is_empty() {
            self.observaciones = nota.to_string();
        } else {
            self.observaciones.push_str("; ");
            self.observaciones.push_str(nota);
        }
    }
    fn es_valida(&self) -> bool {
        self.valido
    }
    fn errores(&self) -> &[String] {
        &self.errores
    }
    fn advertencias(&self) -> &[String] {
        &self.advertencias
    }
}

// ==========================================
// Claves compuestas
// ==========================================

/// Ajustes: producto + almacén + tipo de operación.
/// Usa el id resuelto cuando existe; el texto normalizado como respaldo.
pub fn clave_ajuste(fila: &AdjustmentRow) -> Option<String> {
    if !fila.es_valida() || fila.producto.is_empty() {
        return None;
    }
    let producto = matching::normalizar(&fila.producto);
    let almacen = fila
        .almacen_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| matching::normalizar(&fila.almacen));
    let operacion = fila
        .tipo_operacion_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| matching::normalizar(&fila.tipo_operacion));
    Some(format!("{}|{}|{}", producto, almacen, operacion))
}

/// Productos: nombre normalizado
pub fn clave_nombre(fila: &ProductRow) -> Option<String> {
    if fila.nombre.is_empty() {
        return None;
    }
    Some(matching::normalizar(&fila.nombre))
}

/// Productos: código de barras exacto
pub fn clave_codigo_barra(fila: &ProductRow) -> Option<String> {
    fila.codigo_barra
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Productos: SKU (pasada de unificación, solo a pedido del usuario)
pub fn clave_sku(fila: &ProductRow) -> Option<String> {
    fila.sku
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
}

// ==========================================
// Detección
// ==========================================

/// Agrupa las filas válidas por clave. Los grupos salen en orden de
/// primera aparición y siempre con al menos 2 miembros.
pub fn detectar_grupos<R, F>(filas: &[R], tipo: DuplicateKind, clave_de: F) -> Vec<DuplicateGroup>
where
    R: FilaLote,
    F: Fn(&R) -> Option<String>,
{
    let mut orden: Vec<String> = Vec::new();
    let mut miembros: HashMap<String, Vec<usize>> = HashMap::new();
    let mut cantidades: HashMap<String, i64> = HashMap::new();

    for fila in filas {
        if !fila.es_valida() {
            continue;
        }
        let clave = match clave_de(fila) {
            Some(c) => c,
            None => continue,
        };
        if !miembros.contains_key(&clave) {
            orden.push(clave.clone());
        }
        miembros.entry(clave.clone()).or_default().push(fila.numero_fila());
        *cantidades.entry(clave).or_insert(0) += fila.cantidad();
    }

    orden
        .into_iter()
        .filter_map(|clave| {
            let filas_grupo = miembros.remove(&clave)?;
            if filas_grupo.len() < 2 {
                return None;
            }
            Some(DuplicateGroup {
                cantidad_total: cantidades[&clave],
                clave,
                tipo,
                filas: filas_grupo,
            })
        })
        .collect()
}

/// Duplicados de un lote de ajustes
pub fn detectar_duplicados_ajustes(filas: &[AdjustmentRow]) -> Vec<DuplicateGroup> {
    detectar_grupos(filas, DuplicateKind::ProductoAlmacenOperacion, clave_ajuste)
}

/// Duplicados de un lote de productos: por nombre Y por código de
/// barras. Una misma fila puede aparecer en un grupo de cada tipo y
/// ambos se reportan.
pub fn detectar_duplicados_productos(filas: &[ProductRow]) -> Vec<DuplicateGroup> {
    let mut grupos = detectar_grupos(filas, DuplicateKind::NombreNormalizado, clave_nombre);
    grupos.extend(detectar_grupos(
        filas,
        DuplicateKind::CodigoBarra,
        clave_codigo_barra,
    ));
    grupos
}

// ==========================================
// Fusión (reductor puro sobre instantánea)
// ==========================================

/// Fusiona cada grupo: la primera fila queda como base, con la suma de
/// cantidades y una nota de auditoría; las demás se eliminan. Las filas
/// no tocadas conservan su número original.
///
/// Los grupos solapados (una fila en dos grupos) se procesan en orden:
/// una fila ya consumida por una fusión anterior se omite, y un grupo
/// que queda con menos de 2 miembros vivos no fusiona nada.
pub fn fusionar_grupos<R>(filas: Vec<R>, grupos: &[DuplicateGroup]) -> Vec<R>
where
    R: FilaLote,
{
    let mut filas = filas;
    let posicion: HashMap<usize, usize> = filas
        .iter()
        .enumerate()
        .map(|(i, f)| (f.numero_fila(), i))
        .collect();
    let mut consumidas: HashSet<usize> = HashSet::new();

    for grupo in grupos {
        let vivas: Vec<usize> = grupo
            .filas
            .iter()
            .copied()
            .filter(|nf| posicion.contains_key(nf) && !consumidas.contains(nf))
            .collect();
        if vivas.len() < 2 {
            continue;
        }

        // Conservación: la suma se toma del estado vigente de los miembros
        let suma: i64 = vivas.iter().map(|nf| filas[posicion[nf]].cantidad()).sum();

        let base = posicion[&vivas[0]];
        filas[base].set_cantidad(suma);
        filas[base].agregar_observacion(&format!(
            "Fusión de {} filas duplicadas (cantidad total: {})",
            vivas.len(),
            suma
        ));

        for nf in &vivas[1..] {
            consumidas.insert(*nf);
        }
    }

    filas.retain(|f| !consumidas.contains(&f.numero_fila()));
    filas
}

/// Unificación por SKU (solo pipeline de productos, disparada por el
/// usuario): agrupa el subconjunto válido por SKU ignorando almacén y
/// nombre, suma cantidades y deja intactas las filas inválidas.
pub fn unificar_por_sku(filas: Vec<ProductRow>) -> Vec<ProductRow> {
    let grupos = detectar_grupos(&filas, DuplicateKind::Sku, clave_sku);
    fusionar_grupos(filas, &grupos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::AccionStock;

    fn ajuste(numero_fila: usize, producto: &str, almacen_id: i64, cantidad: i64) -> AdjustmentRow {
        AdjustmentRow {
            numero_fila,
            producto: producto.to_string(),
            almacen: "Central".to_string(),
            almacen_id: Some(almacen_id),
            tipo_operacion: "Entrada".to_string(),
            tipo_operacion_id: Some(1),
            motivo: String::new(),
            motivo_id: None,
            cantidad,
            lote: None,
            observaciones: String::new(),
            valido: true,
            errores: Vec::new(),
            advertencias: Vec::new(),
        }
    }

    fn producto(
        numero_fila: usize,
        nombre: &str,
        codigo_barra: Option<&str>,
        sku: Option<&str>,
        cantidad: i64,
    ) -> ProductRow {
        ProductRow {
            numero_fila,
            nombre: nombre.to_string(),
            codigo_barra: codigo_barra.map(str::to_string),
            sku: sku.map(str::to_string),
            categoria: String::new(),
            categoria_id: None,
            marca: String::new(),
            marca_id: None,
            unidad: String::new(),
            unidad_id: None,
            almacen: String::new(),
            almacen_id: None,
            cantidad,
            precio_compra: None,
            precio_venta: None,
            fecha_vencimiento: None,
            lote: None,
            observaciones: String::new(),
            existente: None,
            accion: AccionStock::Sumar,
            valido: true,
            errores: Vec::new(),
            advertencias: Vec::new(),
        }
    }

    #[test]
    fn test_detectar_un_grupo_con_cantidad_total() {
        // Dos filas con mismo producto/almacén/operación, cantidades 5 y 7
        let filas = vec![
            ajuste(1, "Harina", 1, 5),
            ajuste(2, "Azúcar", 1, 4),
            ajuste(3, "Harina", 1, 7),
        ];

        let grupos = detectar_duplicados_ajustes(&filas);

        assert_eq!(grupos.len(), 1);
        assert_eq!(grupos[0].filas, vec![1, 3]);
        assert_eq!(grupos[0].cantidad_total, 12);
    }

    #[test]
    fn test_filas_invalidas_no_agrupan() {
        let mut invalida = ajuste(2, "Harina", 1, 5);
        invalida.valido = false;
        let filas = vec![ajuste(1, "Harina", 1, 5), invalida];

        assert!(detectar_duplicados_ajustes(&filas).is_empty());
    }

    #[test]
    fn test_distinto_almacen_no_es_duplicado() {
        let filas = vec![ajuste(1, "Harina", 1, 5), ajuste(2, "Harina", 2, 7)];
        assert!(detectar_duplicados_ajustes(&filas).is_empty());
    }

    #[test]
    fn test_fusion_conserva_cantidad() {
        let filas = vec![
            ajuste(1, "Harina", 1, 5),
            ajuste(2, "Azúcar", 1, 4),
            ajuste(3, "Harina", 1, 7),
        ];
        let grupos = detectar_duplicados_ajustes(&filas);
        let antes: i64 = grupos[0].cantidad_total;

        let fusionadas = fusionar_grupos(filas, &grupos);

        assert_eq!(fusionadas.len(), 2);
        let base = fusionadas.iter().find(|f| f.numero_fila == 1).unwrap();
        assert_eq!(base.cantidad, antes);
        assert_eq!(base.cantidad, 12);
        assert!(base.observaciones.contains("Fusión de 2 filas"));

        // La fila no tocada conserva su número original
        assert!(fusionadas.iter().any(|f| f.numero_fila == 2));
    }

    #[test]
    fn test_redeteccion_tras_fusion_sin_grupos() {
        let filas = vec![
            ajuste(1, "Harina", 1, 5),
            ajuste(2, "Harina", 1, 7),
            ajuste(3, "Harina", 1, 2),
        ];
        let grupos = detectar_duplicados_ajustes(&filas);
        let fusionadas = fusionar_grupos(filas, &grupos);

        assert_eq!(fusionadas.len(), 1);
        assert_eq!(fusionadas[0].cantidad, 14);
        assert!(detectar_duplicados_ajustes(&fusionadas).is_empty());
    }

    #[test]
    fn test_producto_en_dos_grupos_a_la_vez() {
        // Fila 1 y 2 comparten nombre; fila 1 y 3 comparten código de barras
        let filas = vec![
            producto(1, "Yerba 1kg", Some("779000"), None, 5),
            producto(2, "yerba 1KG", None, None, 3),
            producto(3, "Yerba Suave", Some("779000"), None, 2),
        ];

        let grupos = detectar_duplicados_productos(&filas);

        assert_eq!(grupos.len(), 2);
        assert_eq!(grupos[0].tipo, DuplicateKind::NombreNormalizado);
        assert_eq!(grupos[0].filas, vec![1, 2]);
        assert_eq!(grupos[1].tipo, DuplicateKind::CodigoBarra);
        assert_eq!(grupos[1].filas, vec![1, 3]);
    }

    #[test]
    fn test_fusion_grupos_solapados_no_duplica() {
        let filas = vec![
            producto(1, "Yerba 1kg", Some("779000"), None, 5),
            producto(2, "yerba 1KG", None, None, 3),
            producto(3, "Yerba Suave", Some("779000"), None, 2),
        ];
        let grupos = detectar_duplicados_productos(&filas);
        let fusionadas = fusionar_grupos(filas, &grupos);

        // El grupo por nombre consume la fila 2; el grupo por código
        // consume la fila 3. La cantidad total se conserva.
        assert_eq!(fusionadas.len(), 1);
        let total: i64 = fusionadas.iter().map(|f| f.cantidad).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_unificar_por_sku_ignora_invalidas() {
        let mut invalida = producto(3, "Yerba x2", None, Some("SKU-1"), 100);
        invalida.valido = false;

        let filas = vec![
            producto(1, "Yerba 1kg", None, Some("sku-1"), 5),
            producto(2, "Yerba 1kg suave", None, Some("SKU-1"), 3),
            invalida,
            producto(4, "Azúcar", None, Some("SKU-2"), 1),
        ];

        let unificadas = unificar_por_sku(filas);

        // Las dos válidas con SKU-1 se unifican; la inválida queda intacta
        assert_eq!(unificadas.len(), 3);
        let base = unificadas.iter().find(|f| f.numero_fila == 1).unwrap();
        assert_eq!(base.cantidad, 8);
        assert!(unificadas.iter().any(|f| f.numero_fila == 3 && f.cantidad == 100));
    }
}
