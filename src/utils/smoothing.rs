//! Suavizado de velocidad y rumbo
//!
//! Las ventanas son propiedad del llamador (la app del conductor, el
//! simulador): se crean una vez por dispositivo, se les empujan lecturas y se
//! pasan por referencia a funciones sin estado. Nada aquí se comparte entre
//! peticiones.

use std::collections::VecDeque;

/// Buffer circular acotado: al llenarse descarta la lectura más antigua
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

impl SmoothingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    /// Añadir una lectura; los valores no finitos se ignoran
    pub fn push(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Media aritmética de la ventana de velocidades
pub fn smoothed_speed(window: &SmoothingWindow) -> Option<f64> {
    if window.is_empty() {
        return None;
    }
    Some(window.values().sum::<f64>() / window.len() as f64)
}

/// Rumbo suavizado de la ventana (media circular)
pub fn smoothed_heading(window: &SmoothingWindow) -> Option<f64> {
    circular_mean(window.values())
}

/// Media circular de ángulos en grados, normalizada a [0, 360).
///
/// Promedia los vectores unitarios `(sin θ, cos θ)` y vuelve con `atan2`;
/// la media aritmética ingenua de 350° y 10° daría 180°.
/// Devuelve `None` sin datos o cuando los vectores se anulan (p.ej. 0° y 180°).
pub fn circular_mean<I>(headings: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (mut sin_sum, mut cos_sum, mut count) = (0.0_f64, 0.0_f64, 0usize);
    for heading in headings {
        let rad = heading.to_radians();
        sin_sum += rad.sin();
        cos_sum += rad.cos();
        count += 1;
    }

    if count == 0 {
        return None;
    }

    let sin_mean = sin_sum / count as f64;
    let cos_mean = cos_sum / count as f64;
    if sin_mean.hypot(cos_mean) < 1e-9 {
        return None;
    }

    Some(normalize_degrees(sin_mean.atan2(cos_mean).to_degrees()))
}

/// Llevar un ángulo cualquiera a [0, 360)
pub fn normalize_degrees(angle: f64) -> f64 {
    let normalized = angle.rem_euclid(360.0);
    // rem_euclid de un negativo minúsculo redondea a 360.0
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}
