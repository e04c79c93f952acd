// ==========================================
// Sistema de Inventario - Orquestador de importación de ajustes
// ==========================================
// Máquina de pasos sobre un lote de ajustes de inventario:
//   Loading → Validating → Validated → Processing → Result
// Un error de envío regresa a Validated con el estado validado
// intacto (reintento sin volver a subir el archivo); cancelar en
// cualquier paso interactivo regresa a Loading y descarta todo.
// ==========================================

use crate::config::ImportConfig;
use crate::domain::reference::ReferenceCatalogs;
use crate::domain::row::{
    AdjustmentRow, BatchResult, BatchSubmission, DuplicateGroup, ErrorFila, ValidationReport,
};
use crate::domain::types::{ImportStep, ResolutionStrategy};
use crate::importer::backend::{AjusteEnvio, BackendError, EnvioAjustes, ImportBackend};
use crate::importer::duplicate_detector::{detectar_duplicados_ajustes, fusionar_grupos};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{AdjustmentFieldMapper, COLUMNAS_AJUSTE};
use crate::importer::file_parser::{SourceFile, UniversalFileParser};
use crate::importer::row_validator::{construir_reporte, validar_ajustes};
use crate::importer::session::{CancelToken, ProgresoNulo, ProgresoSink};
use tracing::{debug, info, instrument, warn};

// ==========================================
// AdjustmentImportOrchestrator
// ==========================================
// Exactamente una instancia mutable por sesión de importación; los
// catálogos de referencia son de solo lectura durante toda la corrida.
pub struct AdjustmentImportOrchestrator<B: ImportBackend> {
    config: ImportConfig,
    catalogos: ReferenceCatalogs,
    backend: B,

    token: CancelToken,
    progreso: Box<dyn ProgresoSink>,

    paso: ImportStep,
    nombre_archivo: String,
    datos_csv: String,
    filas: Vec<AdjustmentRow>,
    grupos: Vec<DuplicateGroup>,
    reporte: Option<ValidationReport>,
    resultado: Option<BatchResult>,
}

impl<B: ImportBackend> AdjustmentImportOrchestrator<B> {
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

    /// Conecta el canal de progreso de la UI
    pub fn con_progreso(mut self, progreso: Box<dyn ProgresoSink>) -> Self {
        self.progreso = progreso;
        self
    }

    // ===== Accesores =====

    pub fn paso(&self) -> ImportStep {
        self.paso
    }

    pub fn filas(&self) -> &[AdjustmentRow] {
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

    /// Token compartible con la UI para cancelar corridas en vuelo
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    // ===== Operaciones =====

    /// Carga y valida un archivo: parseo → mapeo → resolución →
    /// validación → detección de duplicados, con puntos de progreso
    /// 25/50/75/100. Un error estructural deja el paso en Loading.
    #[instrument(skip(self, archivo), fields(archivo = %archivo.nombre))]
    pub async fn cargar(&mut self, archivo: SourceFile) -> ImportResult<&ValidationReport> {
        if self.paso == ImportStep::Processing {
            return Err(self.estado_invalido("LOADING"));
        }

        // Una carga nueva invalida cualquier corrida anterior
        let generacion = self.token.invalidar();
        self.reiniciar();
        self.paso = ImportStep::Validating;
        info!(tamano = archivo.tamano(), "inicio de carga de ajustes");

        let es_csv = archivo.extension() == "csv";
        let tabla = match UniversalFileParser.parse(&archivo, &self.config, COLUMNAS_AJUSTE) {
            Ok(tabla) => tabla,
            Err(error) => {
                warn!(error = %error, "archivo rechazado por error estructural");
                self.paso = ImportStep::Loading;
                return Err(error);
            }
        };
        self.progreso.reportar(25);

        debug!(filas = tabla.filas.len(), "mapeo de campos");
        let registros = AdjustmentFieldMapper::mapear(&tabla.filas);
        self.progreso.reportar(50);

        let filas = validar_ajustes(&registros, &self.catalogos, &self.config);
        self.progreso.reportar(75);

        if !self.token.vigente(generacion) {
            debug!("validación descartada: corrida invalidada");
            return Err(ImportError::Cancelado);
        }

        let grupos = detectar_duplicados_ajustes(&filas);
        let reporte = construir_reporte(&filas, grupos.len());

        // Copia original para auditoría: el CSV tal cual, o una
        // reconstrucción CSV para los formatos binarios
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
            "validación de ajustes completada"
        );
        Ok(reporte)
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
                self.grupos = detectar_duplicados_ajustes(&self.filas);
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

        // Los totales de los grupos dependen de las cantidades vigentes
        self.grupos = detectar_duplicados_ajustes(&self.filas);
        self.actualizar_reporte();
        Ok(())
    }

    /// Envía el lote confirmado. La instantánea es inmutable: un
    /// reintento construye una nueva desde el estado vigente.
    #[instrument(skip(self))]
    pub async fn enviar(&mut self) -> ImportResult<&BatchResult> {
        if self.paso != ImportStep::Validated {
            return Err(self.estado_invalido("VALIDATED"));
        }
        if !self.grupos.is_empty() {
            return Err(ImportError::DuplicadosSinResolver(self.grupos.len()));
        }

        let validas: Vec<AdjustmentRow> =
            self.filas.iter().filter(|f| f.valido).cloned().collect();
        if validas.is_empty() {
            return Err(ImportError::SinFilasValidas);
        }

        let instantanea = BatchSubmission::nueva(
            self.nombre_archivo.clone(),
            self.datos_csv.clone(),
            validas,
        );
        let envio = EnvioAjustes {
            nombre_archivo: instantanea.nombre_archivo.clone(),
            datos_csv: instantanea.datos_csv.clone(),
            ajustes: instantanea.filas.iter().map(a_envio).collect(),
        };

        let generacion = self.token.generacion();
        self.paso = ImportStep::Processing;
        info!(
            envio_id = %instantanea.id,
            filas = envio.ajustes.len(),
            "enviando lote de ajustes"
        );

        match self.backend.enviar_ajustes(envio).await {
            Err(error) => {
                if !self.token.vigente(generacion) {
                    return Err(ImportError::Cancelado);
                }
                // Estado validado intacto: reintento sin re-subir
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

    /// Cancela la sesión: inmediato para el estado de UI; las
    /// respuestas en vuelo se ignoran al llegar (guardia de vigencia).
    pub fn cancelar(&mut self) -> ImportResult<()> {
        if self.paso == ImportStep::Processing {
            return Err(self.estado_invalido("un paso interactivo"));
        }
        self.token.invalidar();
        self.reiniciar();
        info!("importación de ajustes cancelada");
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

/// Fila validada → DTO de envío. El texto original del motivo viaja
/// cuando la referencia quedó sin resolver.
fn a_envio(fila: &AdjustmentRow) -> AjusteEnvio {
    AjusteEnvio {
        fila: fila.numero_fila,
        producto: fila.producto.clone(),
        almacen_id: fila.almacen_id,
        tipo_operacion_id: fila.tipo_operacion_id,
        motivo_id: fila.motivo_id,
        motivo: if fila.motivo_id.is_none() && !fila.motivo.is_empty() {
            Some(fila.motivo.clone())
        } else {
            None
        },
        cantidad: fila.cantidad,
        lote: fila.lote.clone(),
        observaciones: fila.observaciones.clone(),
    }
}
