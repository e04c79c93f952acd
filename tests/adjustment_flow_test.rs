// ==========================================
// Tests de integración: flujo de importación de ajustes
// ==========================================
// Objetivo: máquina de pasos completa, fusión de duplicados,
// fallos parciales y reintento de envío
// ==========================================


use inventario_import::domain::types::{BatchOutcome, ImportStep, ResolutionStrategy};
use inventario_import::importer::{
    AdjustmentImportOrchestrator, BackendError, EnvioDetalle, ImportError,
};
use inventario_import::{logging, ImportConfig};
use test_helpers::{catalogos_de_prueba, csv_ajustes, envio_parcial, MockBackend};

fn orquestador(
    backend: &MockBackend,
) -> AdjustmentImportOrchestrator<&MockBackend> {
    AdjustmentImportOrchestrator::new(ImportConfig::default(), catalogos_de_prueba(), backend)
}

#[tokio::test]
async fn test_flujo_completo_con_fusion() {
    logging::init_test();
    let backend = MockBackend::new();
    let mut orq = orquestador(&backend);
    assert_eq!(orq.paso(), ImportStep::Loading);

    // Dos filas con mismo producto/almacén/operación, cantidades 5 y 7
    let archivo = csv_ajustes(&[
        ("Harina 000", "Central", "Entrada", "", "5"),
        ("Azúcar", "Norte", "Entrada", "", "4"),
        ("Harina 000", "Central", "Entrada", "", "7"),
    ]);

    let reporte = orq.cargar(archivo).await.expect("la carga debe validar");
    assert_eq!(reporte.total_filas, 3);
    assert_eq!(reporte.filas_validas, 3);
    assert_eq!(orq.paso(), ImportStep::Validated);

    // Un solo grupo, cantidad total 12
    let grupos = orq.grupos_duplicados();
    assert_eq!(grupos.len(), 1);
    assert_eq!(grupos[0].filas, vec![1, 3]);
    assert_eq!(grupos[0].cantidad_total, 12);

    // Fusión: conservación exacta de la cantidad + nota de auditoría
    orq.resolver_duplicados(ResolutionStrategy::Fusionar).unwrap();
    assert!(orq.grupos_duplicados().is_empty());
    assert_eq!(orq.filas().len(), 2);

    let base = orq.filas().iter().find(|f| f.numero_fila == 1).unwrap();
    assert_eq!(base.cantidad, 12);
    assert!(base.observaciones.contains("Fusión de 2 filas duplicadas"));

    // La fila no tocada conserva su número original
    assert!(orq.filas().iter().any(|f| f.numero_fila == 2));

    // Envío: terminal con éxito pleno
    let resultado = orq.enviar().await.expect("el envío debe completarse");
    assert_eq!(resultado.procesados, 2);
    assert_eq!(resultado.desenlace(), BatchOutcome::Completo);
    assert_eq!(orq.paso(), ImportStep::Result);

    // El backend recibió las dos filas fusionadas
    let recibidos = backend.ajustes_recibidos.lock().unwrap();
    assert_eq!(recibidos.len(), 1);
    assert_eq!(recibidos[0].ajustes.len(), 2);
    assert_eq!(recibidos[0].nombre_archivo, "ajustes.csv");
}

#[tokio::test]
async fn test_fallo_parcial_expone_conteos() {
    logging::init_test();
    let backend = MockBackend::new();
    backend.encolar_envio(Ok(envio_parcial(
        8,
        vec![
            EnvioDetalle {
                fila: 3,
                error: "Producto no encontrado".to_string(),
                producto: Some("Fideo X".to_string()),
            },
            EnvioDetalle {
                fila: 7,
                error: "Stock insuficiente".to_string(),
                producto: None,
            },
        ],
    )));

    let mut orq = orquestador(&backend);

    let filas: Vec<(String, &str, &str, &str, String)> = (0..10)
        .map(|i| {
            (
                format!("Producto {}", i),
                "Central",
                "Entrada",
                "",
                "1".to_string(),
            )
        })
        .collect();
    let filas_ref: Vec<(&str, &str, &str, &str, &str)> = filas
        .iter()
        .map(|(p, a, o, m, c)| (p.as_str(), *a, *o, *m, c.as_str()))
        .collect();

    orq.cargar(csv_ajustes(&filas_ref)).await.unwrap();
    let resultado = orq.enviar().await.unwrap();

    // 8 procesadas / 2 con error: nunca un éxito plano
    assert_eq!(resultado.procesados, 8);
    assert_eq!(resultado.errores, 2);
    assert_eq!(resultado.detalles.len(), 2);
    assert_eq!(resultado.detalles[0].fila, 3);
    assert_eq!(resultado.desenlace(), BatchOutcome::Parcial);
    assert_eq!(orq.paso(), ImportStep::Result);
}

#[tokio::test]
async fn test_cancelar_durante_resolucion_de_duplicados() {
    logging::init_test();
    let backend = MockBackend::new();
    let mut orq = orquestador(&backend);

    let archivo = csv_ajustes(&[
        ("Harina", "Central", "Entrada", "", "5"),
        ("Harina", "Central", "Entrada", "", "7"),
    ]);
    orq.cargar(archivo).await.unwrap();
    assert_eq!(orq.grupos_duplicados().len(), 1);

    // Cancelar en el paso de duplicados regresa a Loading sin filas
    orq.resolver_duplicados(ResolutionStrategy::Cancelar).unwrap();
    assert_eq!(orq.paso(), ImportStep::Loading);
    assert!(orq.filas().is_empty());
    assert!(orq.grupos_duplicados().is_empty());
    assert!(orq.reporte().is_none());
}

#[tokio::test]
async fn test_mantener_todo_limpia_grupos() {
    let backend = MockBackend::new();
    let mut orq = orquestador(&backend);

    orq.cargar(csv_ajustes(&[
        ("Harina", "Central", "Entrada", "", "5"),
        ("Harina", "Central", "Entrada", "", "7"),
    ]))
    .await
    .unwrap();

    orq.resolver_duplicados(ResolutionStrategy::MantenerTodo)
        .unwrap();

    // Sin cambio estructural: las dos filas siguen, sin grupos activos
    assert_eq!(orq.filas().len(), 2);
    assert!(orq.grupos_duplicados().is_empty());
}

#[tokio::test]
async fn test_envio_fallido_regresa_a_validated_y_reintenta() {
    logging::init_test();
    let backend = MockBackend::new();
    backend.encolar_envio(Err(BackendError::Red("timeout".to_string())));

    let mut orq = orquestador(&backend);
    orq.cargar(csv_ajustes(&[("Harina", "Central", "Entrada", "", "5")]))
        .await
        .unwrap();

    // Primer intento: falla y conserva el estado validado
    let error = orq.enviar().await.unwrap_err();
    assert!(matches!(error, ImportError::Envio(_)));
    assert_eq!(orq.paso(), ImportStep::Validated);
    assert_eq!(orq.filas().len(), 1);

    // Reintento sin volver a subir el archivo: nueva instantánea
    let resultado = orq.enviar().await.unwrap();
    assert_eq!(resultado.desenlace(), BatchOutcome::Completo);
    assert_eq!(backend.ajustes_recibidos.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_duplicados_sin_resolver_bloquean_envio() {
    let backend = MockBackend::new();
    let mut orq = orquestador(&backend);

    orq.cargar(csv_ajustes(&[
        ("Harina", "Central", "Entrada", "", "5"),
        ("Harina", "Central", "Entrada", "", "7"),
    ]))
    .await
    .unwrap();

    let error = orq.enviar().await.unwrap_err();
    assert!(matches!(error, ImportError::DuplicadosSinResolver(1)));
    assert_eq!(orq.paso(), ImportStep::Validated);
    assert_eq!(backend.total_envios(), 0);
}

#[tokio::test]
async fn test_filas_invalidas_excluidas_del_envio() {
    let backend = MockBackend::new();
    let mut orq = orquestador(&backend);

    let reporte = orq
        .cargar(csv_ajustes(&[
            ("Harina", "Central", "Entrada", "", "5"),
            ("", "Central", "Entrada", "", "3"),       // sin producto
            ("Azúcar", "Central", "Entrada", "", "-2"), // cantidad inválida
        ]))
        .await
        .unwrap();

    assert_eq!(reporte.filas_validas, 1);
    assert_eq!(reporte.filas_invalidas, 2);

    orq.enviar().await.unwrap();
    let recibidos = backend.ajustes_recibidos.lock().unwrap();
    assert_eq!(recibidos[0].ajustes.len(), 1);
    assert_eq!(recibidos[0].ajustes[0].producto, "Harina");
}

#[tokio::test]
async fn test_error_estructural_permanece_en_loading() {
    let backend = MockBackend::new();
    let mut orq = orquestador(&backend);

    // Falta la columna de almacén
    let archivo = inventario_import::importer::SourceFile::new(
        "ajustes.csv",
        b"producto,cantidad\nHarina,5\n".to_vec(),
    );
    let error = orq.cargar(archivo).await.unwrap_err();

    assert!(matches!(error, ImportError::ColumnasFaltantes(_)));
    assert_eq!(orq.paso(), ImportStep::Loading);
    assert!(orq.filas().is_empty());
}

#[tokio::test]
async fn test_edicion_de_cantidad_antes_de_confirmar() {
    let backend = MockBackend::new();
    let mut orq = orquestador(&backend);

    orq.cargar(csv_ajustes(&[("Harina", "Central", "Entrada", "", "5")]))
        .await
        .unwrap();

    orq.actualizar_cantidad(1, 9).unwrap();
    assert_eq!(orq.filas()[0].cantidad, 9);

    // Una cantidad no positiva se rechaza
    assert!(matches!(
        orq.actualizar_cantidad(1, 0),
        Err(ImportError::EdicionInvalida(_))
    ));

    orq.enviar().await.unwrap();
    let recibidos = backend.ajustes_recibidos.lock().unwrap();
    assert_eq!(recibidos[0].ajustes[0].cantidad, 9);
}

#[tokio::test]
async fn test_motivo_condicional_en_flujo() {
    let backend = MockBackend::new();
    let mut orq = orquestador(&backend);

    let reporte = orq
        .cargar(csv_ajustes(&[
            ("Harina", "Central", "Salida", "Merma", "5"), // Salida con motivo: válida
            ("Azúcar", "Central", "Salida", "", "3"),      // Salida sin motivo: inválida
            ("Fideos", "Central", "Entrada", "", "2"),     // Entrada sin motivo: válida
        ]))
        .await
        .unwrap();

    assert_eq!(reporte.filas_validas, 2);
    assert_eq!(reporte.filas_invalidas, 1);

    let invalida = orq.filas().iter().find(|f| f.numero_fila == 2).unwrap();
    assert!(invalida.errores.iter().any(|e| e.contains("motivo")));
}

#[tokio::test]
async fn test_puntos_de_progreso() {
    use inventario_import::importer::ProgresoSink;
    use std::sync::{Arc, Mutex};

    struct ProgresoRegistro(Arc<Mutex<Vec<u8>>>);
    impl ProgresoSink for ProgresoRegistro {
        fn reportar(&self, porcentaje: u8) {
            self.0.lock().unwrap().push(porcentaje);
        }
    }

    let backend = MockBackend::new();
    let registro = Arc::new(Mutex::new(Vec::new()));
    let mut orq =
        orquestador(&backend).con_progreso(Box::new(ProgresoRegistro(Arc::clone(&registro))));

    orq.cargar(csv_ajustes(&[("Harina", "Central", "Entrada", "", "5")]))
        .await
        .unwrap();

    assert_eq!(*registro.lock().unwrap(), vec![25, 50, 75, 100]);
}

#[tokio::test]
async fn test_lote_rechazado_regresa_a_validated() {
    let backend = MockBackend::new();
    backend.encolar_envio(Ok(inventario_import::importer::EnvioRespuesta {
        success: false,
        procesados: 0,
        errores: 0,
        mensaje: "Sesión expirada".to_string(),
        detalles: None,
    }));

    let mut orq = orquestador(&backend);
    orq.cargar(csv_ajustes(&[("Harina", "Central", "Entrada", "", "5")]))
        .await
        .unwrap();

    let error = orq.enviar().await.unwrap_err();
    assert!(matches!(error, ImportError::Envio(BackendError::Rechazada(_))));
    assert_eq!(orq.paso(), ImportStep::Validated);
}
