// SPDX-License-Identifier: MIT

//! Backbone construction.
//!
//! Each [`BackboneKind`] maps to a feature-extraction module through one
//! exhaustive match, so dispatch can never fall through to a missing branch.
//! Pretrained weights are resolved from a local weights directory as named
//! records; fetching them is the weight provider's job, not ours.

use std::path::Path;

use burn::{
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d, Relu,
    },
    record::CompactRecorder,
    tensor::{backend::Backend, Tensor},
};
use tracing::info;

use crate::error::ModelError;
use vision_harness_core::{BackboneKind, BackboneSpec, Weights};

/// Conv → BatchNorm → ReLU, with optional 2× max-pool downsampling.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B, 2>,
    relu: Relu,
    pool: Option<MaxPool2d>,
}

impl<B: Backend> ConvBlock<B> {
    fn new(in_channels: usize, out_channels: usize, with_pool: bool, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let bn = BatchNormConfig::new(out_channels).init(device);
        let pool = if with_pool {
            Some(MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init())
        } else {
            None
        };

        Self {
            conv,
            bn,
            relu: Relu::new(),
            pool,
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        let x = self.relu.forward(x);
        match &self.pool {
            Some(pool) => pool.forward(x),
            None => x,
        }
    }
}

/// Channel widths for a backbone family: stem width plus one width per stage.
fn stage_widths(kind: BackboneKind) -> (usize, &'static [usize]) {
    match kind {
        BackboneKind::DenseNet121 => (64, &[128, 256, 512, 1024]),
        BackboneKind::MobileNetV3 => (16, &[24, 40, 96, 576]),
        BackboneKind::EffNetB0 => (32, &[24, 40, 112, 1280]),
    }
}

/// Headless convolutional feature extractor. Output is the final feature map
/// `[batch, out_channels, H/32, W/32]`; there is no classification head here.
#[derive(Module, Debug)]
pub struct FeatureExtractor<B: Backend> {
    stem: ConvBlock<B>,
    stages: Vec<ConvBlock<B>>,
    out_channels: usize,
}

impl<B: Backend> FeatureExtractor<B> {
    pub fn new(kind: BackboneKind, device: &B::Device) -> Self {
        let (stem_width, widths) = stage_widths(kind);

        let stem = ConvBlock::new(3, stem_width, true, device);
        let mut stages = Vec::with_capacity(widths.len());
        let mut in_channels = stem_width;
        for &width in widths {
            stages.push(ConvBlock::new(in_channels, width, true, device));
            in_channels = width;
        }

        Self {
            stem,
            stages,
            out_channels: in_channels,
        }
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = self.stem.forward(x);
        for stage in &self.stages {
            x = stage.forward(x);
        }
        x
    }
}

/// A built backbone: the extractor module plus the spec it was built from.
#[derive(Debug)]
pub struct Backbone<B: Backend> {
    extractor: FeatureExtractor<B>,
    spec: BackboneSpec,
}

impl<B: Backend> Backbone<B> {
    /// Build the extractor for `spec`, loading pretrained weights when asked.
    /// A frozen backbone is detached from gradient tracking.
    pub fn build(
        spec: &BackboneSpec,
        weights_dir: &Path,
        device: &B::Device,
    ) -> Result<Self, ModelError> {
        let extractor = FeatureExtractor::new(spec.kind, device);

        let extractor = match spec.weights {
            Weights::None => extractor,
            Weights::ImageNet => {
                let record_path = weights_dir.join(format!("{}-imagenet", spec.kind));
                let loaded = extractor
                    .load_file(record_path.clone(), &CompactRecorder::new(), device)
                    .map_err(|e| ModelError::artifact(&record_path, e))?;
                info!(
                    "loaded imagenet weights for {} from '{}'",
                    spec.kind,
                    record_path.display()
                );
                loaded
            }
        };

        let extractor = if spec.trainable() {
            extractor
        } else {
            extractor.no_grad()
        };

        Ok(Self {
            extractor,
            spec: spec.clone(),
        })
    }

    pub fn spec(&self) -> &BackboneSpec {
        &self.spec
    }

    pub fn input_shape(&self) -> [usize; 3] {
        self.spec.input_shape
    }

    pub fn trainable(&self) -> bool {
        self.spec.trainable()
    }

    pub fn out_channels(&self) -> usize {
        self.extractor.out_channels()
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.extractor.forward(x)
    }

    pub fn into_extractor(self) -> FeatureExtractor<B> {
        self.extractor
    }
}
