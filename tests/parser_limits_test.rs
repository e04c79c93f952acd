// ==========================================
// Tests de límites estructurales del parser
// ==========================================
// Objetivo: techos de tamaño y de filas, extensiones, encabezados
// ==========================================

use inventario_import::config::ImportConfig;
use inventario_import::importer::field_mapper::COLUMNAS_AJUSTE;
use inventario_import::importer::{ImportError, SourceFile, UniversalFileParser};
use std::io::Write;

fn csv_con_filas(filas: usize) -> SourceFile {
    let mut contenido = String::from("producto,almacen,tipo operacion,cantidad\n");
    for i in 0..filas {
        contenido.push_str(&format!("P{},Central,Entrada,1\n", i));
    }
    SourceFile::new("ajustes.csv", contenido.into_bytes())
}

#[test]
fn test_limite_de_filas_exacto_acepta() {
    let archivo = csv_con_filas(5_000);
    let tabla = UniversalFileParser
        .parse(&archivo, &ImportConfig::default(), COLUMNAS_AJUSTE)
        .expect("5000 filas de datos deben aceptarse");

    assert_eq!(tabla.filas.len(), 5_000);
    // Índices 1-based coincidentes con la posición en el archivo
    assert_eq!(tabla.filas[0].numero_fila, 1);
    assert_eq!(tabla.filas[4_999].numero_fila, 5_000);
}

#[test]
fn test_limite_de_filas_excedido_rechaza() {
    let archivo = csv_con_filas(5_001);
    let resultado = UniversalFileParser.parse(&archivo, &ImportConfig::default(), COLUMNAS_AJUSTE);

    match resultado {
        Err(ImportError::DemasiadasFilas { filas, limite }) => {
            assert_eq!(filas, 5_001);
            assert_eq!(limite, 5_000);
        }
        otro => panic!("se esperaba DemasiadasFilas, fue {:?}", otro.err()),
    }
}

#[test]
fn test_solo_encabezado_rechaza_sin_datos() {
    let archivo = csv_con_filas(0);
    let resultado = UniversalFileParser.parse(&archivo, &ImportConfig::default(), COLUMNAS_AJUSTE);
    assert!(matches!(resultado, Err(ImportError::SinFilasDeDatos)));
}

#[test]
fn test_archivo_de_11mb_rechazado_antes_de_parsear() {
    // El contenido ni siquiera es tabular: el rechazo ocurre por tamaño
    let archivo = SourceFile::new("grande.csv", vec![b'x'; 11 * 1024 * 1024]);
    let resultado = UniversalFileParser.parse(&archivo, &ImportConfig::default(), COLUMNAS_AJUSTE);

    match resultado {
        Err(ImportError::ArchivoDemasiadoGrande { tamano, limite }) => {
            assert_eq!(tamano, 11 * 1024 * 1024);
            assert_eq!(limite, 10 * 1024 * 1024);
        }
        otro => panic!("se esperaba ArchivoDemasiadoGrande, fue {:?}", otro.err()),
    }
}

#[test]
fn test_from_path_rechaza_por_metadatos() {
    // El límite se verifica sobre los metadatos, antes de leer el contenido
    let mut archivo_temporal = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
    let bloque = vec![b'x'; 1024 * 1024];
    for _ in 0..11 {
        archivo_temporal.write_all(&bloque).unwrap();
    }
    archivo_temporal.flush().unwrap();

    let resultado = SourceFile::from_path(archivo_temporal.path(), &ImportConfig::default());
    assert!(matches!(
        resultado,
        Err(ImportError::ArchivoDemasiadoGrande { .. })
    ));
}

#[test]
fn test_from_path_carga_archivo_valido() {
    let mut archivo_temporal = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
    writeln!(archivo_temporal, "producto,almacen,tipo operacion,cantidad").unwrap();
    writeln!(archivo_temporal, "Harina,Central,Entrada,5").unwrap();
    archivo_temporal.flush().unwrap();

    let archivo =
        SourceFile::from_path(archivo_temporal.path(), &ImportConfig::default()).unwrap();
    assert_eq!(archivo.extension(), "csv");

    let tabla = UniversalFileParser
        .parse(&archivo, &ImportConfig::default(), COLUMNAS_AJUSTE)
        .unwrap();
    assert_eq!(tabla.filas.len(), 1);
}

#[test]
fn test_extension_no_permitida() {
    let archivo = SourceFile::new("datos.pdf", b"producto,cantidad\nHarina,5\n".to_vec());
    let resultado = UniversalFileParser.parse(&archivo, &ImportConfig::default(), COLUMNAS_AJUSTE);
    assert!(matches!(
        resultado,
        Err(ImportError::FormatoNoSoportado(ext)) if ext == "pdf"
    ));
}

#[test]
fn test_contenido_vacio() {
    let archivo = SourceFile::new("vacio.csv", Vec::new());
    let resultado = UniversalFileParser.parse(&archivo, &ImportConfig::default(), COLUMNAS_AJUSTE);
    assert!(matches!(resultado, Err(ImportError::ArchivoVacio)));
}

#[test]
fn test_encabezado_incompleto() {
    let archivo = SourceFile::new(
        "ajustes.csv",
        b"producto,cantidad\nHarina,5\n".to_vec(),
    );
    let resultado = UniversalFileParser.parse(&archivo, &ImportConfig::default(), COLUMNAS_AJUSTE);

    match resultado {
        Err(ImportError::ColumnasFaltantes(faltantes)) => {
            assert!(faltantes.contains(&"almacen".to_string()));
            assert!(faltantes.contains(&"tipo operacion".to_string()));
        }
        otro => panic!("se esperaba ColumnasFaltantes, fue {:?}", otro.err()),
    }
}

#[test]
fn test_conteo_igual_a_filas_de_datos() {
    for n in [1usize, 7, 42] {
        let archivo = csv_con_filas(n);
        let tabla = UniversalFileParser
            .parse(&archivo, &ImportConfig::default(), COLUMNAS_AJUSTE)
            .unwrap();
        assert_eq!(tabla.filas.len(), n);
        for (i, fila) in tabla.filas.iter().enumerate() {
            assert_eq!(fila.numero_fila, i + 1);
        }
    }
}
