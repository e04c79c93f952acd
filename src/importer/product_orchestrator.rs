// ==========================================
// Sistema de Inventario - Orquestador de importación de productos
// ==========================================
// Misma máquina de pasos que el orquestador de ajustes, con tres
// diferencias: consulta de productos existentes al backend durante la
// validación (con degradación elegante si el servicio falla),
// duplicados por nombre Y por código de barras, y una pasada de
// unificación por SKU disparada por el usuario.
// ==========================================

use crate::config::ImportConfig;
use crate::domain::reference::ReferenceCatalogs;
use crate::domain::row::{
    BatchResult, BatchSubmission, DuplicateGroup, ErrorFila, ExistingEntityMatch, ProductRow,
    StockPorAlmacen, ValidationReport,
};
use crate::domain::types::{AccionStock, ImportStep, ResolutionStrategy};
use crate::importer::backend::{
    BackendError, DeteccionItem, EnvioProductos, ImportBackend, ProductoEnvio,
};
use crate::importer::duplicate_detector::{
    detectar_duplicados_productos, fusionar_grupos, unificar_por_sku,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{ProductFieldMapper, COLUMNAS_PRODUCTO};
use crate::importer::file_parser::{SourceFile, UniversalFileParser};
use crate::importer::row_validator::{construir_reporte, validar_productos};
use crate::importer::session::{CancelToken, ProgresoNulo, ProgresoSink};
use tracing::{debug, info, instrument, warn};

// ==========================================
// ProductImportOrchestrator
// ==========================================
pub struct ProductImportOrchestrator<B: ImportBackend> {
    config: ImportConfig,
    catalogos: ReferenceCatalogs,
    backend: B,

    token: CancelToken,
    progreso: Box<dyn ProgresoSink>,

    paso: ImportStep,
    nombre_archivo: String,
    datos_csv: String,
    filas: Vec<ProductRow>,
    grupos: Vec<DuplicateGroup>,
    reporte: Option<ValidationReport>,
    resultado: Option<BatchResult>,
}

impl<B: ImportBackend> ProductImportOrchestrator<B> {
    pub fn new(config: ImportConfig, catalogos: ReferenceCatalogs, backend: B) -> Self {
        Self {
            config,
            catalogos,
            backend,
            token: CancelToken::new(),
            progreso: Box::new(ProgresoNulo),
            paso: ImportStep::Loading,
            nombre_archivo: String::new(),
            datos_csv: String::new(),
            filas: Vec::new(),
            grupos: Vec::new(),
            reporte: None,
            resultado: None,
        }
    }

    pub fn con_progreso(mut self, progreso: Box<dyn ProgresoSink>) -> Self {
        self.progreso = progreso;
        self
    }

    // ===== Accesores =====

    pub fn paso(&self) -> ImportStep {
        self.paso
    }

    pub fn filas(&self) -> &[ProductRow] {
        &self.filas
    }

    pub fn grupos_duplicados(&self) -> &[DuplicateGroup] {
        &self.grupos
    }

    pub fn reporte(&self) -> Option<&ValidationReport> {
        self.reporte.as_ref()
    }

    pub fn resultado(&self) -> Option<&BatchResult> {
        self.resultado.as_ref()
    }

    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    // ===== Operaciones =====

    /// Carga y valida un archivo de productos. Incluye la consulta de
    /// existentes al backend; si esa llamada falla, la validación
    /// continúa en modo solo local (degradación, no aborto).
    #[instrument(skip(self, archivo), fields(archivo = %archivo.nombre))]
    pub async fn cargar(&mut self, archivo: SourceFile) -> ImportResult<&ValidationReport> {
        if self.paso == ImportStep::Processing {
            return Err(self.estado_invalido("LOADING"));
        }

        let generacion = self.token.invalidar();
        self.reiniciar();
        self.paso = ImportStep::Validating;
        info!(tamano = archivo.tamano(), "inicio de carga de productos");

        let es_csv = archivo.extension() == "csv";
        let tabla = match UniversalFileParser.parse(&archivo, &self.config, COLUMNAS_PRODUCTO) {
            Ok(tabla) => tabla,
            Err(error) => {
                warn!(error = %error, "archivo rechazado por error estructural");
                self.paso = ImportStep::Loading;
                return Err(error);
            }
        };
        self.progreso.reportar(25);

        debug!(filas = tabla.filas.len(), "mapeo de campos");
        let registros = ProductFieldMapper::mapear(&tabla.filas);
        self.progreso.reportar(50);

        let mut filas = validar_productos(&registros, &self.catalogos, &self.config);
        self.progreso.reportar(75);

        // Consulta de existentes: punto de suspensión cancelable
        self.detectar_existentes(&mut filas).await;

        if !self.token.vigente(generacion) {
            debug!("validación descartada: corrida invalidada");
            return Err(ImportError::Cancelado);
        }

        let grupos = detectar_duplicados_productos(&filas);
        let reporte = construir_reporte(&filas, grupos.len());

        self.datos_csv = if es_csv {
            String::from_utf8_lossy(&archivo.bytes).into_owned()
        } else {
            tabla.a_csv()
        };
        self.nombre_archivo = archivo.nombre;
        self.filas = filas;
        self.grupos = grupos;
        self.reporte = Some(reporte);
        self.paso = ImportStep::Validated;
        self.progreso.reportar(100);

        let reporte = self.reporte.as_ref().unwrap();
        info!(
            total = reporte.total_filas,
            validas = reporte.filas_validas,
            invalidas = reporte.filas_invalidas,
            grupos = reporte.grupos_duplicados,
            "validación de productos completada"
        );
        Ok(reporte)
    }

    /// Enriquece las filas con las coincidencias del backend.
    /// Cualquier fallo degrada a validación solo local.
    async fn detectar_existentes(&self, filas: &mut [ProductRow]) {
        let items: Vec<DeteccionItem> = filas
            .iter()
            .map(|f| DeteccionItem {
                nombre: f.nombre.clone(),
                codigo_barra: f.codigo_barra.clone(),
                cantidad: f.cantidad,
                almacen_id: f.almacen_id,
                almacen_nombre: if f.almacen.is_empty() {
                    None
                } else {
                    Some(f.almacen.clone())
                },
                lote: f.lote.clone(),
            })
            .collect();

        let respuesta = match self.backend.detectar_existentes(items).await {
            Ok(respuesta) if respuesta.success => respuesta,
            Ok(_) => {
                warn!("la detección de existentes respondió sin éxito; validación solo local");
                degradar(filas);
                return;
            }
            Err(error) => {
                warn!(error = %error, "detección de existentes no disponible; validación solo local");
                degradar(filas);
                return;
            }
        };

        let mut coincidencias = 0usize;
        for resultado in respuesta.resultados {
            if !resultado.existe {
                continue;
            }
            let existente = match resultado.producto_existente {
                Some(e) => e,
                None => continue,
            };
            // `index` refiere a la posición en la consulta, que es la
            // posición de la fila en el lote
            if let Some(fila) = filas.get_mut(resultado.index) {
                fila.existente = Some(ExistingEntityMatch {
                    producto_id: existente.id,
                    nombre: existente.nombre,
                    stock_total: existente.stock_total,
                    stock_por_almacen: existente
                        .stock_por_almacen
                        .into_iter()
                        .map(|s| StockPorAlmacen {
                            almacen_id: s.almacen_id,
                            almacen_nombre: s.almacen_nombre,
                            cantidad: s.cantidad,
                        })
                        .collect(),
                    preview_sumar: existente.stock_total + fila.cantidad,
                    preview_reemplazar: fila.cantidad,
                });
                fila.accion = AccionStock::Sumar;
                coincidencias += 1;
            }
        }
        debug!(coincidencias, "detección de existentes aplicada");
    }

    /// Aplica la estrategia elegida sobre los grupos detectados
    pub fn resolver_duplicados(&mut self, estrategia: ResolutionStrategy) -> ImportResult<()> {
        if self.paso != ImportStep::Validated {
            return Err(self.estado_invalido("VALIDATED"));
        }

        match estrategia {
            ResolutionStrategy::Fusionar => {
                let filas = std::mem::take(&mut self.filas);
                self.filas = fusionar_grupos(filas, &self.grupos);
                self.grupos = detectar_duplicados_productos(&self.filas);
                self.actualizar_reporte();
                info!(filas = self.filas.len(), "grupos de duplicados fusionados");
            }
            ResolutionStrategy::MantenerTodo => {
                info!(grupos = self.grupos.len(), "duplicados conservados sin cambio");
                self.grupos.clear();
                self.actualizar_reporte();
            }
            ResolutionStrategy::Cancelar => {
                return self.cancelar();
            }
        }
        Ok(())
    }

    /// Unificación por SKU: pasada posterior y explícita del usuario,
    /// nunca corre durante la detección automática.
    pub fn unificar_skus(&mut self) -> ImportResult<()> {
        if self.paso != ImportStep::Validated {
            return Err(self.estado_invalido("VALIDATED"));
        }
        let antes = self.filas.len();
        let filas = std::mem::take(&mut self.filas);
        self.filas = unificar_por_sku(filas);
        self.grupos = detectar_duplicados_productos(&self.filas);
        self.actualizar_reporte();
        info!(
            unificadas = antes - self.filas.len(),
            "unificación por SKU aplicada"
        );
        Ok(())
    }

    /// Cambia la acción de stock de una fila con producto existente
    pub fn establecer_accion(
        &mut self,
        numero_fila: usize,
        accion: AccionStock,
    ) -> ImportResult<()> {
        if self.paso != ImportStep::Validated {
            return Err(self.estado_invalido("VALIDATED"));
        }
        let fila = self
            .filas
            .iter_mut()
            .find(|f| f.numero_fila == numero_fila)
            .ok_or_else(|| {
                ImportError::EdicionInvalida(format!("no existe la fila {}", numero_fila))
            })?;
        if fila.existente.is_none() {
            return Err(ImportError::EdicionInvalida(format!(
                "la fila {} no tiene producto existente detectado",
                numero_fila
            )));
        }
        fila.accion = accion;
        Ok(())
    }

    /// Edición manual previa a la confirmación
    pub fn actualizar_cantidad(&mut self, numero_fila: usize, cantidad: i64) -> ImportResult<()> {
        if self.paso != ImportStep::Validated {
            return Err(self.estado_invalido("VALIDATED"));
        }
        if cantidad <= 0 {
            return Err(ImportError::EdicionInvalida(format!(
                "la cantidad debe ser positiva (valor: {})",
                cantidad
            )));
        }
        let fila = self
            .filas
            .iter_mut()
            .find(|f| f.numero_fila == numero_fila)
            .ok_or_else(|| {
                ImportError::EdicionInvalida(format!("no existe la fila {}", numero_fila))
            })?;
        fila.cantidad = cantidad;
        // Las previsualizaciones dependen de la cantidad vigente
        if let Some(existente) = fila.existente.as_mut() {
            existente.preview_sumar = existente.stock_total + cantidad;
            existente.preview_reemplazar = cantidad;
        }
        self.grupos = detectar_duplicados_productos(&self.filas);
        self.actualizar_reporte();
        Ok(())
    }

    /// Envía el lote confirmado
    #[instrument(skip(self))]
    pub async fn enviar(&mut self) -> ImportResult<&BatchResult> {
        if self.paso != ImportStep::Validated {
            return Err(self.estado_invalido("VALIDATED"));
        }
        if !self.grupos.is_empty() {
            return Err(ImportError::DuplicadosSinResolver(self.grupos.len()));
        }

        let validas: Vec<ProductRow> = self.filas.iter().filter(|f| f.valido).cloned().collect();
        if validas.is_empty() {
            return Err(ImportError::SinFilasValidas);
        }

        let instantanea = BatchSubmission::nueva(
            self.nombre_archivo.clone(),
            self.datos_csv.clone(),
            validas,
        );
        let envio = EnvioProductos {
            nombre_archivo: instantanea.nombre_archivo.clone(),
            datos_csv: instantanea.datos_csv.clone(),
            productos: instantanea.filas.iter().map(a_envio).collect(),
        };

        let generacion = self.token.generacion();
        self.paso = ImportStep::Processing;
        info!(
            envio_id = %instantanea.id,
            filas = envio.productos.len(),
            "enviando lote de productos"
        );

        match self.backend.enviar_productos(envio).await {
            Err(error) => {
                if !self.token.vigente(generacion) {
                    return Err(ImportError::Cancelado);
                }
                self.paso = ImportStep::Validated;
                warn!(error = %error, "envío fallido; se conserva el estado validado");
                Err(ImportError::Envio(error))
            }
            Ok(respuesta) => {
                if !self.token.vigente(generacion) {
                    return Err(ImportError::Cancelado);
                }
                if !respuesta.success {
                    self.paso = ImportStep::Validated;
                    warn!(mensaje = %respuesta.mensaje, "lote rechazado por el backend");
                    return Err(ImportError::Envio(BackendError::Rechazada(
                        respuesta.mensaje,
                    )));
                }

                let resultado = BatchResult {
                    procesados: respuesta.procesados,
                    errores: respuesta.errores,
                    mensaje: respuesta.mensaje,
                    detalles: respuesta
                        .detalles
                        .unwrap_or_default()
                        .into_iter()
                        .map(|d| ErrorFila {
                            fila: d.fila,
                            error: d.error,
                            producto: d.producto,
                        })
                        .collect(),
                };

                if resultado.errores > 0 {
                    warn!(
                        procesados = resultado.procesados,
                        errores = resultado.errores,
                        "lote procesado con errores parciales"
                    );
                } else {
                    info!(procesados = resultado.procesados, "lote procesado completo");
                }

                self.resultado = Some(resultado);
                self.paso = ImportStep::Result;
                Ok(self.resultado.as_ref().unwrap())
            }
        }
    }

    /// Cancela la sesión (ver orquestador de ajustes)
    pub fn cancelar(&mut self) -> ImportResult<()> {
        if self.paso == ImportStep::Processing {
            return Err(self.estado_invalido("un paso interactivo"));
        }
        self.token.invalidar();
        self.reiniciar();
        info!("importación de productos cancelada");
        Ok(())
    }

    // ===== Auxiliares =====

    fn reiniciar(&mut self) {
        self.paso = ImportStep::Loading;
        self.nombre_archivo.clear();
        self.datos_csv.clear();
        self.filas.clear();
        self.grupos.clear();
        self.reporte = None;
        self.resultado = None;
    }

    fn actualizar_reporte(&mut self) {
        self.reporte = Some(construir_reporte(&self.filas, self.grupos.len()));
    }

    fn estado_invalido(&self, esperado: &str) -> ImportError {
        ImportError::EstadoInvalido {
            esperado: esperado.to_string(),
            actual: self.paso.to_string(),
        }
    }
}

/// Degradación: sin detección remota, cada fila lo advierte
fn degradar(filas: &mut [ProductRow]) {
    for fila in filas.iter_mut() {
        fila.advertencias.push(
            "No se pudo verificar si el producto ya existe; validación solo local".to_string(),
        );
    }
}

/// Fila validada → DTO de envío
fn a_envio(fila: &ProductRow) -> ProductoEnvio {
    ProductoEnvio {
        fila: fila.numero_fila,
        nombre: fila.nombre.clone(),
        codigo_barra: fila.codigo_barra.clone(),
        sku: fila.sku.clone(),
        categoria_id: fila.categoria_id,
        categoria: fila.categoria.clone(),
        marca_id: fila.marca_id,
        unidad_id: fila.unidad_id,
        almacen_id: fila.almacen_id,
        cantidad: fila.cantidad,
        precio_compra: fila.precio_compra,
        precio_venta: fila.precio_venta,
        producto_existente_id: fila.existente.as_ref().map(|e| e.producto_id),
        accion_stock: fila.accion,
        lote: fila.lote.clone(),
        observaciones: fila.observaciones.clone(),
    }
}
