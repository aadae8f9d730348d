//! Cálculo de créditos por ejecución
//!
//! Un crédito por segundo completo de ejecución, sin mínimo ni tope.

use std::time::Duration;

/// Créditos a cobrar: parte entera de los segundos transcurridos
pub fn credits_for(duration: Duration) -> u64 {
    duration.as_secs()
}
