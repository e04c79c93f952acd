// ==========================================
// Sistema de Inventario - Normalización y similitud de texto
// ==========================================
// Responsabilidad: funciones puras de comparación para el resolutor
// de referencias y las claves de duplicado. Sin estado, sin UI.
// ==========================================

use std::collections::HashSet;

/// Umbral documentado del contrato de puntuación: una coincidencia
/// difusa solo se acepta con `similitud >= umbral`. El valor por
/// defecto vive en `config::UMBRAL_SIMILITUD_DEFECTO` (0.60).
///
/// Escala: 0.0 (sin relación) a 1.0 (equivalentes tras normalizar).
pub fn similitud(a: &str, b: &str) -> f64 {
    let na = normalizar(a);
    let nb = normalizar(b);

    if na.is_empty() || nb.is_empty() {
        return 0.0;
    }
    if na == nb {
        return 1.0;
    }

    let contencion = puntaje_contencion(&na, &nb);
    let solapamiento = solapamiento_tokens(&na, &nb);

    contencion.max(solapamiento)
}

/// Normaliza texto para comparación: minúsculas, sin diacríticos,
/// sin puntuación, espacios colapsados.
pub fn normalizar(texto: &str) -> String {
    let mut salida = String::with_capacity(texto.len());
    let mut anterior_espacio = true;

    for c in texto.chars() {
        let c = quitar_diacritico(c);
        if c.is_alphanumeric() {
            for minuscula in c.to_lowercase() {
                salida.push(minuscula);
            }
            anterior_espacio = false;
        } else if !anterior_espacio {
            salida.push(' ');
            anterior_espacio = true;
        }
    }

    while salida.ends_with(' ') {
        salida.pop();
    }
    salida
}

/// Puntaje por contención: si una cadena contiene a la otra, la
/// proporción de longitudes; 0.0 en caso contrario.
fn puntaje_contencion(a: &str, b: &str) -> f64 {
    let (corta, larga) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    if larga.contains(corta) {
        corta.chars().count() as f64 / larga.chars().count() as f64
    } else {
        0.0
    }
}

/// Solapamiento de tokens (índice de Jaccard sobre palabras)
fn solapamiento_tokens(a: &str, b: &str) -> f64 {
    let tokens_a: HashSet<&str> = a.split_whitespace().collect();
    let tokens_b: HashSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let interseccion = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();

    interseccion as f64 / union as f64
}

/// Mapea los diacríticos del español a su base ASCII
fn quitar_diacritico(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'Á' | 'À' | 'Ä' | 'Â' => 'A',
        'É' | 'È' | 'Ë' | 'Ê' => 'E',
        'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
        'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
        'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
        'Ñ' => 'N',
        _ => c,
    }
}
