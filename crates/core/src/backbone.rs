// crates/core/src/backbone.rs
//
// Backbone selection as data: a closed enumeration of the known feature
// extractors plus the validated, immutable spec handed to the model layer.
// Name validation and dispatch are the same exhaustive match, so an
// unrecognized name can never produce a half-built extractor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// The convolutional feature extractors this harness knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackboneKind {
    DenseNet121,
    MobileNetV3,
    EffNetB0,
}

impl BackboneKind {
    pub const ALL: [BackboneKind; 3] = [
        BackboneKind::DenseNet121,
        BackboneKind::MobileNetV3,
        BackboneKind::EffNetB0,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackboneKind::DenseNet121 => "densenet121",
            BackboneKind::MobileNetV3 => "mobilenetv3",
            BackboneKind::EffNetB0 => "effnetb0",
        }
    }
}

impl fmt::Display for BackboneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackboneKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "densenet121" => Ok(BackboneKind::DenseNet121),
            "mobilenetv3" => Ok(BackboneKind::MobileNetV3),
            "effnetb0" => Ok(BackboneKind::EffNetB0),
            other => Err(PipelineError::Configuration(format!(
                "unknown backbone '{}' (expected one of: densenet121, mobilenetv3, effnetb0)",
                other
            ))),
        }
    }
}

/// Pretrained-weight source for a backbone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weights {
    /// Random initialization, nothing to load.
    None,
    /// ImageNet weights resolved from the local weights directory.
    ImageNet,
}

impl fmt::Display for Weights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Weights::None => "none",
            Weights::ImageNet => "imagenet",
        })
    }
}

impl FromStr for Weights {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Weights::None),
            "imagenet" => Ok(Weights::ImageNet),
            other => Err(PipelineError::Configuration(format!(
                "unknown weights source '{}' (expected 'none' or 'imagenet')",
                other
            ))),
        }
    }
}

/// Validated backbone configuration. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackboneSpec {
    pub kind: BackboneKind,
    /// Input shape as [height, width, channels].
    pub input_shape: [usize; 3],
    pub weights: Weights,
    trainable: bool,
}

impl BackboneSpec {
    pub fn new(
        kind: BackboneKind,
        input_shape: [usize; 3],
        weights: Weights,
        trainable: bool,
    ) -> Result<Self, PipelineError> {
        if input_shape[2] != 3 {
            return Err(PipelineError::Configuration(format!(
                "backbone input shape must have 3 channels, got {:?}",
                input_shape
            )));
        }
        if input_shape[0] == 0 || input_shape[1] == 0 {
            return Err(PipelineError::Configuration(format!(
                "backbone input shape must be non-zero, got {:?}",
                input_shape
            )));
        }
        Ok(Self {
            kind,
            input_shape,
            weights,
            trainable,
        })
    }

    /// Effective trainability: randomly initialized weights always train.
    pub fn trainable(&self) -> bool {
        match self.weights {
            Weights::None => true,
            Weights::ImageNet => self.trainable,
        }
    }
}
