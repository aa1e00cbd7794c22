// crates/core/src/config.rs
//
// Serde-facing evaluation config. Everything optional gets a default here;
// validation and normalization happen in `plan`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level evaluation configuration, usually loaded from YAML.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvalConfig {
    pub dataset: DatasetConfig,
    pub reader: Option<ReaderConfig>,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetConfig {
    /// Root directory with one subdirectory per class label.
    pub data_folder: String,
    /// File extension to enumerate (default: png).
    pub extension: Option<String>,
    /// Target image size as [height, width] (default: [224, 224]).
    pub target_size: Option<[u32; 2]>,
    /// Seed > 0 enables a deterministic shuffle of the file list (default: 1).
    pub seed: Option<u64>,
    /// Concurrent decode units; 0 or absent lets the harness pick (default: auto).
    pub read_threads: Option<usize>,
    /// Training mode enables the augmentation stage (default: false).
    pub training: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReaderConfig {
    pub batch_size: Option<usize>,
    /// Prefetched batches; 0 or absent lets the harness pick.
    pub prefetch: Option<usize>,
    /// Materialize processed samples once before batching (default: true).
    pub cache: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Path to the saved classifier record (recorder extension is appended).
    pub artifact: String,
    /// Head width; absent means "use the dataset's label count".
    pub num_classes: Option<usize>,
    pub backbone: BackboneConfig,
    /// Directory holding pretrained backbone records (default: ./weights).
    pub weights_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackboneConfig {
    pub name: String,
    /// [height, width, channels] (default: [224, 224, 3]).
    pub input_shape: Option<[usize; 3]>,
    /// "none" or "imagenet" (default: imagenet).
    pub weights: Option<String>,
    pub trainable: Option<bool>,
}

impl EvalConfig {
    /// Parse from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str).with_context(|| "Failed to parse JSON eval config")
    }

    /// Parse from a YAML string by converting to JSON first.
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let yaml_value: serde_yaml::Value =
            serde_yaml::from_str(yaml_str).with_context(|| "Failed to parse YAML")?;

        let json_str =
            serde_json::to_string(&yaml_value).with_context(|| "Failed to convert YAML to JSON")?;

        Self::from_json(&json_str)
    }

    /// Load from a YAML file on disk.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path.as_ref()))?;
        Self::from_yaml(&text)
    }

    /// Validate and normalize into an immutable [`EvalPlan`].
    pub fn to_plan(&self) -> std::result::Result<crate::plan::EvalPlan, crate::error::PipelineError> {
        crate::plan::EvalPlan::from_config(self)
    }
}

/// Convert a YAML string to pretty JSON (CLI `validate --to-json`).
pub fn yaml_to_json(yaml_str: &str) -> Result<String> {
    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(yaml_str).with_context(|| "Failed to parse YAML")?;

    serde_json::to_string_pretty(&yaml_value).with_context(|| "Failed to convert to JSON")
}
