// SPDX-License-Identifier: MIT

pub mod artifact;
pub mod backbone;
pub mod backend;
pub mod error;
pub mod runner;

pub use artifact::Classifier;
pub use backbone::{Backbone, FeatureExtractor};
pub use backend::{backend_name, default_device, DefaultBackend};
pub use error::ModelError;
pub use runner::{batch_to_tensors, EvalReport, EvalRunner};
