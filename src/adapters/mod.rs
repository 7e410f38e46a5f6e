//! Adapters implementing the crate's ports.

pub mod spectral_gradient;

pub use spectral_gradient::SpectralProjectedGradient;
