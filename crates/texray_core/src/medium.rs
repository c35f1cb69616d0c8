//! Optical media: complex refractive index and absorption coefficient,
//! sampled on the wavelengths of a sweep.

use std::f64::consts::PI;

use num_complex::Complex64;

/// A medium's optical constants, one entry per sweep wavelength.
#[derive(Debug, Clone, PartialEq)]
pub struct Medium {
    pub name: String,
    index: Vec<Complex64>,
    /// Absorption coefficient in 1/µm
    alpha: Vec<f64>,
}

impl Medium {
    /// Create a medium from precomputed constants.
    ///
    /// Both vectors must have one entry per wavelength; `Stack::new` checks
    /// that all media agree.
    pub fn new(name: impl Into<String>, index: Vec<Complex64>, alpha: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            index,
            alpha,
        }
    }

    /// Create a medium from n and k, deriving `alpha = 4πk/λ`.
    ///
    /// Wavelengths are in nm; the slices must have equal length.
    pub fn from_nk(name: impl Into<String>, wavelengths: &[f64], n: &[f64], k: &[f64]) -> Self {
        let index = n.iter().zip(k).map(|(&n, &k)| Complex64::new(n, k)).collect();
        let alpha = wavelengths
            .iter()
            .zip(k)
            .map(|(&wl, &k)| absorption_coefficient(k, wl))
            .collect();
        Self::new(name, index, alpha)
    }

    /// A dispersionless medium.
    pub fn constant(name: impl Into<String>, n: f64, k: f64, wavelengths: &[f64]) -> Self {
        let count = wavelengths.len();
        Self::from_nk(name, wavelengths, &vec![n; count], &vec![k; count])
    }

    /// Number of wavelengths this medium is sampled on.
    pub fn wavelength_count(&self) -> usize {
        self.index.len().min(self.alpha.len())
    }

    /// Complex refractive index at wavelength slot `wl`.
    #[inline]
    pub fn index(&self, wl: usize) -> Complex64 {
        self.index[wl]
    }

    /// Absorption coefficient (1/µm) at wavelength slot `wl`.
    #[inline]
    pub fn alpha(&self, wl: usize) -> f64 {
        self.alpha[wl]
    }

    pub(crate) fn is_consistent(&self) -> bool {
        self.index.len() == self.alpha.len()
    }
}

/// `4πk/λ` with λ in nm, returned in 1/µm.
pub fn absorption_coefficient(k: f64, wavelength_nm: f64) -> f64 {
    4.0 * PI * k / (wavelength_nm * 1e-3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorption_coefficient() {
        // k = 1e-3 at 1000 nm: 4π·1e-3 / 1 µm
        let alpha = absorption_coefficient(1e-3, 1000.0);
        assert!((alpha - 4.0 * PI * 1e-3).abs() < 1e-15);
    }

    #[test]
    fn test_constant_medium() {
        let wl = [500.0, 1000.0];
        let m = Medium::constant("glass", 1.5, 0.0, &wl);

        assert_eq!(m.wavelength_count(), 2);
        assert_eq!(m.index(1), Complex64::new(1.5, 0.0));
        assert_eq!(m.alpha(0), 0.0);
    }

    #[test]
    fn test_from_nk_is_dispersive() {
        let wl = [500.0, 1000.0];
        let m = Medium::from_nk("si", &wl, &[4.3, 3.6], &[0.07, 0.0]);

        assert_eq!(m.index(0), Complex64::new(4.3, 0.07));
        assert!(m.alpha(0) > 1.0);
        assert_eq!(m.alpha(1), 0.0);
    }
}
