use anyhow::Result;
use vision_harness_core::{BackboneKind, EvalConfig, EvalPlan, Weights};

/// Test configuration parsing and plan normalization from fixture files
#[test]
fn test_config_parsing() -> Result<()> {
    let full = EvalConfig::from_yaml_file("tests/configs/eval_file_config.yaml")?;
    assert_eq!(full.dataset.data_folder, "data/Test");
    assert_eq!(full.dataset.extension.as_deref(), Some("png"));
    assert_eq!(full.model.backbone.name, "densenet121");

    let minimal = EvalConfig::from_yaml_file("tests/configs/eval_minimal_config.yaml")?;
    assert!(minimal.reader.is_none());
    assert!(minimal.dataset.extension.is_none());

    println!("✅ Config parsing tests passed");
    Ok(())
}

#[test]
fn test_plan_normalization() -> Result<()> {
    let config = EvalConfig::from_yaml_file("tests/configs/eval_file_config.yaml")?;
    let plan = EvalPlan::from_config(&config)?;

    assert_eq!(plan.extension, "png");
    assert_eq!(plan.target, (224, 224));
    assert_eq!(plan.seed, Some(1));
    assert_eq!(plan.parallelism, 4);
    assert_eq!(plan.batch_size, 128);
    assert_eq!(plan.prefetch, 8);
    assert!(plan.cache);
    assert_eq!(plan.backbone.kind, BackboneKind::DenseNet121);
    assert_eq!(plan.backbone.weights, Weights::ImageNet);
    assert!(!plan.backbone.trainable());

    println!("✅ Plan normalization tests passed");
    Ok(())
}

#[test]
fn test_minimal_config_gets_defaults() -> Result<()> {
    let config = EvalConfig::from_yaml_file("tests/configs/eval_minimal_config.yaml")?;
    let plan = EvalPlan::from_config(&config)?;

    assert_eq!(plan.extension, "png");
    assert_eq!(plan.target, (224, 224));
    assert_eq!(plan.seed, Some(1));
    assert!(plan.parallelism >= 1);
    assert_eq!(plan.batch_size, 128);
    assert!(plan.prefetch >= 2);
    assert!(plan.cache);
    assert_eq!(plan.backbone.kind, BackboneKind::MobileNetV3);
    // imagenet default keeps the extractor frozen
    assert!(!plan.backbone.trainable());

    Ok(())
}

#[test]
fn test_invalid_backbone_is_rejected() {
    let yaml = r#"
dataset:
  data_folder: data/Test
model:
  artifact: saved_models/tsl_classifier
  backbone:
    name: resnet50
"#;
    let config = EvalConfig::from_yaml(yaml).expect("parse should succeed");
    assert!(EvalPlan::from_config(&config).is_err());
}
