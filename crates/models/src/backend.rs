//! Backend selection for the harness.
//!
//! Evaluation runs on the CPU ndarray backend; nothing here trains, so an
//! autodiff wrapper is not needed.

use burn::tensor::backend::Backend;

pub type DefaultBackend = burn::backend::NdArray<f32>;

/// The default device for the harness backend.
pub fn default_device() -> <DefaultBackend as Backend>::Device {
    burn::backend::ndarray::NdArrayDevice::Cpu
}

/// Human-readable name for the current backend.
pub fn backend_name() -> &'static str {
    "ndarray (CPU)"
}
