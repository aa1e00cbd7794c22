//! Core library for vision-harness ─ evaluation config, plan normalization and
//! the image-folder dataset pipeline.

pub mod augment;
pub mod backbone;
pub mod config;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod plan;

pub use augment::{Augment, ColorGeometryJitter};
pub use backbone::{BackboneKind, BackboneSpec, Weights};
pub use config::EvalConfig;
pub use dataset::{DecodedSample, ImageFolderDataset, Sample};
pub use error::PipelineError;
pub use loader::{Batch, BatchLoader};
pub use metrics::Metrics;
pub use plan::EvalPlan;
