// ==========================================
// Sistema de Inventario - Resolutor de referencias
// ==========================================
// Responsabilidad: resolver identificadores de texto libre contra un
// catálogo canónico, por niveles de precedencia.
// Puro respecto a los candidatos: nunca muta el catálogo.
// ==========================================

use crate::config::UMBRAL_SIMILITUD_DEFECTO;
use crate::domain::reference::ReferenceEntity;
use crate::importer::matching;

/// Resuelve `texto` contra `candidatos` con el umbral por defecto.
///
/// Niveles de precedencia (cada uno solo si el anterior falla):
/// 1. coincidencia exacta de id (texto numérico)
/// 2. nombre exacto sin distinguir mayúsculas
/// 3. coincidencia normalizada (sin diacríticos ni puntuación)
/// 4. puntaje difuso >= umbral, gana el candidato de mayor puntaje
///
/// Devuelve None si ningún nivel produce coincidencia; la fila debe
/// conservar el texto original en ese caso.
pub fn resolver<'a>(
    texto: &str,
    candidatos: &'a [ReferenceEntity],
) -> Option<&'a ReferenceEntity> {
    resolver_con_umbral(texto, candidatos, UMBRAL_SIMILITUD_DEFECTO)
}

/// Variante con umbral explícito (ver `ImportConfig::umbral_similitud`)
pub fn resolver_con_umbral<'a>(
    texto: &str,
    candidatos: &'a [ReferenceEntity],
    umbral: f64,
) -> Option<&'a ReferenceEntity> {
    let texto = texto.trim();
    if texto.is_empty() {
        return None;
    }

    // Nivel 1: id exacto
    if let Ok(id) = texto.parse::<i64>() {
        if let Some(entidad) = candidatos.iter().find(|c| c.id == id) {
            return Some(entidad);
        }
    }

    // Nivel 2: nombre exacto, sin distinguir mayúsculas
    let texto_minusculas = texto.to_lowercase();
    if let Some(entidad) = candidatos
        .iter()
        .find(|c| c.nombre.to_lowercase() == texto_minusculas)
    {
        return Some(entidad);
    }

    // Nivel 3: coincidencia normalizada
    let texto_normalizado = matching::normalizar(texto);
    if !texto_normalizado.is_empty() {
        if let Some(entidad) = candidatos
            .iter()
            .find(|c| matching::normalizar(&c.nombre) == texto_normalizado)
        {
            return Some(entidad);
        }
    }

    // Nivel 4: puntaje difuso; empates los gana el primero del catálogo
    let mut mejor: Option<(&ReferenceEntity, f64)> = None;
    for candidato in candidatos {
        let puntaje = matching::similitud(texto, &candidato.nombre);
        if puntaje >= umbral {
            match mejor {
                Some((_, mejor_puntaje)) if puntaje <= mejor_puntaje => {}
                _ => mejor = Some((candidato, puntaje)),
            }
        }
    }

    mejor.map(|(entidad, _)| entidad)
}
