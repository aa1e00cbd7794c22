// SPDX-License-Identifier: MIT

//! Saved classifier artifacts.
//!
//! The classifier is the backbone's extractor plus global pooling and a
//! linear head. Saved models are opaque named records; loading restores the
//! full module state, so the architecture built here has to match the one
//! that produced the artifact.

use std::path::Path;

use burn::{
    module::Module,
    nn::{
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Linear, LinearConfig,
    },
    record::CompactRecorder,
    tensor::{backend::Backend, Tensor},
};

use crate::backbone::{Backbone, FeatureExtractor};
use crate::error::ModelError;
use vision_harness_core::BackboneKind;

#[derive(Module, Debug)]
pub struct Classifier<B: Backend> {
    features: FeatureExtractor<B>,
    pool: AdaptiveAvgPool2d,
    head: Linear<B>,
    num_classes: usize,
}

impl<B: Backend> Classifier<B> {
    /// Fresh classifier with randomly initialized weights.
    pub fn init(kind: BackboneKind, num_classes: usize, device: &B::Device) -> Self {
        let features = FeatureExtractor::new(kind, device);
        let pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let head = LinearConfig::new(features.out_channels(), num_classes).init(device);

        Self {
            features,
            pool,
            head,
            num_classes,
        }
    }

    /// Classifier on top of an already-built (possibly pretrained) backbone.
    pub fn from_backbone(backbone: Backbone<B>, num_classes: usize, device: &B::Device) -> Self {
        let features = backbone.into_extractor();
        let pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let head = LinearConfig::new(features.out_channels(), num_classes).init(device);

        Self {
            features,
            pool,
            head,
            num_classes,
        }
    }

    /// Restore a classifier from a saved record. The recorder appends its own
    /// file extension to `path`.
    pub fn load(
        path: &Path,
        kind: BackboneKind,
        num_classes: usize,
        device: &B::Device,
    ) -> Result<Self, ModelError> {
        Self::init(kind, num_classes, device)
            .load_file(path.to_path_buf(), &CompactRecorder::new(), device)
            .map_err(|e| ModelError::artifact(path, e))
    }

    /// Logits of shape `[batch, num_classes]`.
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.features.forward(images);
        let x = self.pool.forward(x);
        let [n, c, _, _] = x.dims();
        let x = x.reshape([n, c]);
        self.head.forward(x)
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{default_device, DefaultBackend};
    use tempfile::TempDir;

    #[test]
    fn forward_produces_per_class_logits() {
        let device = default_device();
        let model = Classifier::<DefaultBackend>::init(BackboneKind::MobileNetV3, 5, &device);

        let input = Tensor::<DefaultBackend, 4>::zeros([2, 3, 64, 64], &device);
        let logits = model.forward(input);
        assert_eq!(logits.dims(), [2, 5]);
    }

    #[test]
    fn classifier_stacks_on_a_built_backbone() {
        let device = default_device();
        let spec = vision_harness_core::BackboneSpec::new(
            BackboneKind::DenseNet121,
            [64, 64, 3],
            vision_harness_core::Weights::None,
            false,
        )
        .unwrap();
        let backbone =
            Backbone::<DefaultBackend>::build(&spec, Path::new("weights"), &device).unwrap();

        let model = Classifier::from_backbone(backbone, 7, &device);
        assert_eq!(model.num_classes(), 7);

        let input = Tensor::<DefaultBackend, 4>::zeros([1, 3, 64, 64], &device);
        assert_eq!(model.forward(input).dims(), [1, 7]);
    }

    #[test]
    fn saved_artifact_round_trips() {
        let device = default_device();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("classifier");

        let model = Classifier::<DefaultBackend>::init(BackboneKind::EffNetB0, 3, &device);
        model
            .clone()
            .save_file(path.clone(), &CompactRecorder::new())
            .unwrap();

        let restored =
            Classifier::<DefaultBackend>::load(&path, BackboneKind::EffNetB0, 3, &device).unwrap();
        assert_eq!(restored.num_classes(), 3);

        let input = Tensor::<DefaultBackend, 4>::zeros([1, 3, 64, 64], &device);
        assert_eq!(restored.forward(input).dims(), [1, 3]);
    }

    #[test]
    fn missing_artifact_is_a_load_error() {
        let device = default_device();
        let err = Classifier::<DefaultBackend>::load(
            Path::new("/nonexistent/model"),
            BackboneKind::DenseNet121,
            4,
            &device,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::ArtifactLoad { .. }));
    }
}
