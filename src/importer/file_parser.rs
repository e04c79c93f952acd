// ==========================================
// Sistema de Inventario - Parser de archivos tabulares
// ==========================================
// Etapa 0 del pipeline: bytes → filas crudas con número estable.
// Soporta: CSV (crate csv) / Excel y ODS (crate calamine)
// Falla rápido: ningún parseo parcial ante un error estructural.
// ==========================================

use crate::config::ImportConfig;
use crate::domain::row::RawRow;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper;
use calamine::Reader;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

// ==========================================
// SourceFile - archivo fuente en memoria
// ==========================================
// El nombre conserva la extensión original; los bytes se entregan
// completos al parser. El chequeo de tamaño en `from_path` ocurre
// sobre los metadatos, antes de leer el contenido.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub nombre: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(nombre: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            nombre: nombre.into(),
            bytes,
        }
    }

    /// Carga un archivo del disco, rechazando por tamaño antes de leerlo
    pub fn from_path<P: AsRef<Path>>(path: P, config: &ImportConfig) -> ImportResult<Self> {
        let path = path.as_ref();

        let metadata = std::fs::metadata(path)?;
        if metadata.len() > config.max_tamano_bytes {
            return Err(ImportError::ArchivoDemasiadoGrande {
                tamano: metadata.len(),
                limite: config.max_tamano_bytes,
            });
        }

        let nombre = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("desconocido")
            .to_string();
        let bytes = std::fs::read(path)?;

        Ok(Self { nombre, bytes })
    }

    pub fn tamano(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Extensión en minúsculas, sin punto
    pub fn extension(&self) -> String {
        Path::new(&self.nombre)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
    }
}

// ==========================================
// TablaCruda - resultado del parseo
// ==========================================
// `filas[i].numero_fila` es 1-based sobre las filas de datos y coincide
// con la posición en el archivo (las filas en blanco se omiten pero no
// desplazan la numeración de las siguientes).
#[derive(Debug, Clone)]
pub struct TablaCruda {
    pub encabezados: Vec<String>,
    pub filas: Vec<RawRow>,
}

impl TablaCruda {
    /// Reconstruye el contenido como CSV para la copia de auditoría
    /// que acompaña al envío (`datos_csv`).
    pub fn a_csv(&self) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let _ = writer.write_record(&self.encabezados);
        for fila in &self.filas {
            let registro: Vec<&str> = self
                .encabezados
                .iter()
                .map(|h| fila.campos.get(h).map(String::as_str).unwrap_or(""))
                .collect();
            let _ = writer.write_record(&registro);
        }
        let bytes = writer.into_inner().unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

// ==========================================
// FileParser - interfaz de decodificación
// ==========================================
pub trait FileParser: Send + Sync {
    /// Decodifica el archivo a encabezados + filas crudas.
    /// No aplica límites: eso es responsabilidad del parser universal.
    fn parse_tabla(&self, archivo: &SourceFile) -> ImportResult<TablaCruda>;
}

// ==========================================
// CsvParser
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_tabla(&self, archivo: &SourceFile) -> ImportResult<TablaCruda> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // tolera filas de largo distinto
            .from_reader(archivo.bytes.as_slice());

        let encabezados: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if encabezados.iter().all(|h| h.is_empty()) {
            return Err(ImportError::ArchivoVacio);
        }

        let mut filas = Vec::new();
        for (idx, resultado) in reader.records().enumerate() {
            let registro = resultado?;
            let mut campos = HashMap::new();

            for (col, valor) in registro.iter().enumerate() {
                if let Some(encabezado) = encabezados.get(col) {
                    campos.insert(encabezado.clone(), valor.trim().to_string());
                }
            }

            // Las filas totalmente en blanco se omiten sin renumerar
            if campos.values().all(|v| v.is_empty()) {
                continue;
            }

            filas.push(RawRow {
                numero_fila: idx + 1,
                campos,
            });
        }

        Ok(TablaCruda { encabezados, filas })
    }
}

// ==========================================
// ExcelParser (xlsx / xls / ods)
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_tabla(&self, archivo: &SourceFile) -> ImportResult<TablaCruda> {
        let cursor = Cursor::new(archivo.bytes.as_slice());
        let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
            .map_err(|e| ImportError::ExcelParse(e.to_string()))?;

        let nombres_hoja = workbook.sheet_names();
        if nombres_hoja.is_empty() {
            return Err(ImportError::ArchivoVacio);
        }

        // Se lee la primera hoja
        let nombre_hoja = nombres_hoja[0].clone();
        let rango = workbook
            .worksheet_range(&nombre_hoja)
            .map_err(|e| ImportError::ExcelParse(e.to_string()))?;

        let mut filas_rango = rango.rows();
        let fila_encabezado = filas_rango.next().ok_or(ImportError::ArchivoVacio)?;

        let encabezados: Vec<String> = fila_encabezado
            .iter()
            .map(|celda| celda.to_string().trim().to_string())
            .collect();

        if encabezados.iter().all(|h| h.is_empty()) {
            return Err(ImportError::ArchivoVacio);
        }

        let mut filas = Vec::new();
        for (idx, fila_datos) in filas_rango.enumerate() {
            let mut campos = HashMap::new();

            for (col, celda) in fila_datos.iter().enumerate() {
                if let Some(encabezado) = encabezados.get(col) {
                    campos.insert(encabezado.clone(), celda.to_string().trim().to_string());
                }
            }

            if campos.values().all(|v| v.is_empty()) {
                continue;
            }

            filas.push(RawRow {
                numero_fila: idx + 1,
                campos,
            });
        }

        Ok(TablaCruda { encabezados, filas })
    }
}

// ==========================================
// UniversalFileParser - despacho + límites estructurales
// ==========================================
// Orden de verificación: tamaño → extensión → contenido vacío →
// decodificación → columnas obligatorias → techo de filas → sin datos.
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse(
        &self,
        archivo: &SourceFile,
        config: &ImportConfig,
        columnas_requeridas: &[&str],
    ) -> ImportResult<TablaCruda> {
        // Tamaño: se rechaza antes de cualquier intento de parseo
        if archivo.tamano() > config.max_tamano_bytes {
            return Err(ImportError::ArchivoDemasiadoGrande {
                tamano: archivo.tamano(),
                limite: config.max_tamano_bytes,
            });
        }

        // Extensión
        let ext = archivo.extension();
        if !config.extension_permitida(&ext) {
            return Err(ImportError::FormatoNoSoportado(ext));
        }

        // Contenido vacío
        if archivo.bytes.is_empty() {
            return Err(ImportError::ArchivoVacio);
        }

        // Decodificación según formato
        let tabla = match ext.as_str() {
            "csv" => CsvParser.parse_tabla(archivo)?,
            "xlsx" | "xls" | "ods" => ExcelParser.parse_tabla(archivo)?,
            _ => return Err(ImportError::FormatoNoSoportado(ext)),
        };

        // Columnas obligatorias (validación de estructura del encabezado)
        let faltantes = field_mapper::columnas_faltantes(&tabla.encabezados, columnas_requeridas);
        if !faltantes.is_empty() {
            return Err(ImportError::ColumnasFaltantes(faltantes));
        }

        // Techo de filas de datos
        let total_datos = tabla
            .filas
            .last()
            .map(|f| f.numero_fila)
            .unwrap_or(0);
        if total_datos > config.max_filas {
            return Err(ImportError::DemasiadasFilas {
                filas: total_datos,
                limite: config.max_filas,
            });
        }

        // Sin filas de datos (archivo de solo encabezado)
        if tabla.filas.is_empty() {
            return Err(ImportError::SinFilasDeDatos);
        }

        Ok(tabla)
    }
}
