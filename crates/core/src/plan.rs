// crates/core/src/plan.rs
//
// Normalized execution plan derived from an EvalConfig. All defaulting and
// validation happens here so the rest of the harness never sees an Option.

use std::path::PathBuf;

use crate::backbone::{BackboneKind, BackboneSpec, Weights};
use crate::config::EvalConfig;
use crate::error::PipelineError;
use vision_harness_formats::ImageCodec;

/// Immutable, validated plan for one evaluation run.
#[derive(Debug, Clone)]
pub struct EvalPlan {
    pub data_root: PathBuf,
    pub extension: String,
    /// Target image size as (height, width).
    pub target: (u32, u32),
    /// `Some(seed)` enables a deterministic shuffle; `None` keeps enumeration order.
    pub seed: Option<u64>,
    /// Resolved concurrent decode units (never zero).
    pub parallelism: usize,
    pub training: bool,

    pub batch_size: usize,
    /// Resolved prefetched-batch capacity (never zero).
    pub prefetch: usize,
    pub cache: bool,

    pub artifact: PathBuf,
    pub num_classes: Option<usize>,
    pub backbone: BackboneSpec,
    pub weights_dir: PathBuf,
}

impl EvalPlan {
    pub fn from_config(cfg: &EvalConfig) -> Result<Self, PipelineError> {
        let dataset = &cfg.dataset;

        if dataset.data_folder.is_empty() {
            return Err(PipelineError::Configuration(
                "dataset.data_folder must not be empty".to_string(),
            ));
        }

        let extension = dataset
            .extension
            .clone()
            .unwrap_or_else(|| "png".to_string());
        // Fail fast on an extension no codec claims; per-file resolution
        // happens again at decode time.
        ImageCodec::from_extension(&extension)?;

        let target_size = dataset.target_size.unwrap_or([224, 224]);
        if target_size[0] == 0 || target_size[1] == 0 {
            return Err(PipelineError::Configuration(format!(
                "dataset.target_size must be non-zero, got {:?}",
                target_size
            )));
        }

        // seed == 0 disables shuffling.
        let seed = match dataset.seed.unwrap_or(1) {
            0 => None,
            s => Some(s),
        };

        let parallelism = match dataset.read_threads.unwrap_or(0) {
            0 => num_cpus::get().max(1),
            n => n,
        };

        let reader = cfg.reader.clone().unwrap_or(crate::config::ReaderConfig {
            batch_size: None,
            prefetch: None,
            cache: None,
        });
        let batch_size = reader.batch_size.unwrap_or(128);
        if batch_size == 0 {
            return Err(PipelineError::Configuration(
                "reader.batch_size must be greater than zero".to_string(),
            ));
        }
        let prefetch = match reader.prefetch.unwrap_or(0) {
            0 => (parallelism / 2).max(2),
            n => n,
        };

        let model = &cfg.model;
        if model.artifact.is_empty() {
            return Err(PipelineError::Configuration(
                "model.artifact must not be empty".to_string(),
            ));
        }

        let kind: BackboneKind = model.backbone.name.parse()?;
        let weights: Weights = model
            .backbone
            .weights
            .as_deref()
            .unwrap_or("imagenet")
            .parse()?;
        let input_shape = model.backbone.input_shape.unwrap_or([224, 224, 3]);
        let trainable = model.backbone.trainable.unwrap_or(false);
        let backbone = BackboneSpec::new(kind, input_shape, weights, trainable)?;

        Ok(Self {
            data_root: PathBuf::from(&dataset.data_folder),
            extension,
            target: (target_size[0], target_size[1]),
            seed,
            parallelism,
            training: dataset.training.unwrap_or(false),
            batch_size,
            prefetch,
            cache: reader.cache.unwrap_or(true),
            artifact: PathBuf::from(&model.artifact),
            num_classes: model.num_classes,
            backbone,
            weights_dir: PathBuf::from(
                model.weights_dir.clone().unwrap_or_else(|| "weights".to_string()),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvalConfig;

    fn base_yaml() -> &'static str {
        r#"
dataset:
  data_folder: data/Test
  seed: 0
model:
  artifact: saved_models/classifier
  backbone:
    name: densenet121
    weights: none
    trainable: false
"#
    }

    #[test]
    fn defaults_are_normalized() {
        let cfg = EvalConfig::from_yaml(base_yaml()).unwrap();
        let plan = EvalPlan::from_config(&cfg).unwrap();

        assert_eq!(plan.extension, "png");
        assert_eq!(plan.target, (224, 224));
        assert_eq!(plan.seed, None);
        assert!(plan.parallelism >= 1);
        assert_eq!(plan.batch_size, 128);
        assert!(plan.prefetch >= 2);
        assert!(plan.cache);
        assert!(!plan.training);
        // weights: none forces trainability
        assert!(plan.backbone.trainable());
    }

    #[test]
    fn seed_zero_disables_shuffle_positive_enables() {
        let cfg = EvalConfig::from_yaml(base_yaml()).unwrap();
        assert_eq!(EvalPlan::from_config(&cfg).unwrap().seed, None);

        let mut cfg = cfg;
        cfg.dataset.seed = Some(42);
        assert_eq!(EvalPlan::from_config(&cfg).unwrap().seed, Some(42));
    }

    #[test]
    fn bad_backbone_name_fails_eagerly() {
        let mut cfg = EvalConfig::from_yaml(base_yaml()).unwrap();
        cfg.model.backbone.name = "vgg16".to_string();
        let err = EvalPlan::from_config(&cfg).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn unsupported_extension_fails_eagerly() {
        let mut cfg = EvalConfig::from_yaml(base_yaml()).unwrap();
        cfg.dataset.extension = Some("bmp".to_string());
        assert!(EvalPlan::from_config(&cfg).is_err());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut cfg = EvalConfig::from_yaml(base_yaml()).unwrap();
        cfg.reader = Some(crate::config::ReaderConfig {
            batch_size: Some(0),
            prefetch: None,
            cache: None,
        });
        assert!(EvalPlan::from_config(&cfg).is_err());
    }
}
