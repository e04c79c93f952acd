// ==========================================
// Sistema de Inventario - Infraestructura de sesión
// ==========================================
// Responsabilidad: guardia de vigencia para operaciones en vuelo y
// canal de progreso hacia la UI.
// Una cancelación o una carga más reciente invalidan los resultados de
// cualquier operación asíncrona anterior: el resultado obsoleto se
// descarta al llegar, nunca pisa un estado más nuevo.
// ==========================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ==========================================
// CancelToken - contador de generación compartido
// ==========================================
// El orquestador toma una instantánea de la generación al iniciar una
// operación asíncrona y la verifica después de cada await.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    generacion: Arc<AtomicU64>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generación vigente
    pub fn generacion(&self) -> u64 {
        self.generacion.load(Ordering::SeqCst)
    }

    /// Invalida todo lo que esté en vuelo y devuelve la nueva generación
    pub fn invalidar(&self) -> u64 {
        self.generacion.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Indica si una instantánea sigue siendo la corrida vigente
    pub fn vigente(&self, instantanea: u64) -> bool {
        self.generacion() == instantanea
    }
}

// ==========================================
// ProgresoSink - avance grueso para la UI
// ==========================================
// Puntos de control 25/50/75/100: solo retroalimentación visual,
// nunca control de flujo.
pub trait ProgresoSink: Send + Sync {
    fn reportar(&self, porcentaje: u8);
}

/// Implementación por defecto: descarta el progreso
pub struct ProgresoNulo;

impl ProgresoSink for ProgresoNulo {
    fn reportar(&self, _porcentaje: u8) {}
}
