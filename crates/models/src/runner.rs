// SPDX-License-Identifier: MIT

//! Evaluation entry point: wire a test-mode dataset through
//! cache → batch → prefetch, and load the saved classifier artifact.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use burn::tensor::{backend::Backend, Tensor, TensorData};
use futures::StreamExt;
use serde::Serialize;
use tracing::{info, warn};

use crate::artifact::Classifier;
use crate::backend::{default_device, DefaultBackend};
use vision_harness_core::{Batch, BatchLoader, EvalPlan, ImageFolderDataset, Metrics};

/// Outcome of one evaluation run: data readiness plus model readiness.
#[derive(Debug, Clone, Serialize)]
pub struct EvalReport {
    pub labels: Vec<String>,
    pub files: usize,
    pub samples: u64,
    pub batches: u64,
    pub model_loaded: bool,
    pub elapsed_secs: f64,
    pub samples_per_sec: Option<f64>,
}

pub struct EvalRunner {
    plan: EvalPlan,
    metrics: Metrics,
}

impl EvalRunner {
    pub fn new(plan: EvalPlan) -> Self {
        Self {
            plan,
            metrics: Metrics::new(),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub async fn run(&mut self) -> Result<EvalReport> {
        let start = Instant::now();

        if self.plan.training {
            warn!("evaluation plan has training mode set; augmentation belongs to training runs");
        }

        let dataset = Arc::new(ImageFolderDataset::from_plan(&self.plan)?);
        info!(
            "dataset ready: {} classes, {} files",
            dataset.num_classes(),
            dataset.len()
        );

        let num_classes = self.plan.num_classes.unwrap_or_else(|| dataset.num_classes());
        let device = default_device();
        let classifier = Classifier::<DefaultBackend>::load(
            &self.plan.artifact,
            self.plan.backbone.kind,
            num_classes,
            &device,
        )
        .with_context(|| format!("loading model artifact '{}'", self.plan.artifact.display()))?;
        info!(
            "model ready: {} backbone, {} classes",
            self.plan.backbone.kind,
            classifier.num_classes()
        );

        let loader = BatchLoader::from_plan(Arc::clone(&dataset), &self.plan);
        let mut stream = Box::pin(loader.batches());
        while let Some(batch) = stream.next().await {
            let batch = batch.context("batch pipeline failed")?;
            let t0 = Instant::now();
            let (images, targets) = batch_to_tensors::<DefaultBackend>(&batch, &device);
            debug_assert_eq!(images.dims()[0], targets.dims()[0]);
            self.metrics.record_batch(batch.len(), t0.elapsed());
        }

        // The classifier is loaded for readiness only; no forward pass or
        // metric aggregation happens in this entry point.
        // TODO: feed batches through classifier.forward once accuracy
        // reporting is wired up.
        let _ = &classifier;

        self.metrics.record_total_time(start.elapsed());
        self.metrics.print_summary();

        Ok(EvalReport {
            labels: dataset.labels().to_vec(),
            files: dataset.len(),
            samples: self.metrics.samples_seen,
            batches: self.metrics.batches_seen,
            model_loaded: true,
            elapsed_secs: start.elapsed().as_secs_f64(),
            samples_per_sec: self.metrics.samples_per_second(),
        })
    }
}

/// Stack an ndarray batch into backend tensors: images become NCHW floats,
/// labels stay as one-hot rows.
pub fn batch_to_tensors<B: Backend>(batch: &Batch, device: &B::Device) -> (Tensor<B, 4>, Tensor<B, 2>) {
    let (n, h, w, c) = batch.images.dim();
    let pixels: Vec<f32> = batch.images.iter().copied().collect();
    let images = Tensor::<B, 4>::from_floats(TensorData::new(pixels, [n, h, w, c]), device)
        .permute([0, 3, 1, 2]);

    let (rows, k) = batch.labels.dim();
    let hot: Vec<f32> = batch.labels.iter().copied().collect();
    let targets = Tensor::<B, 2>::from_floats(TensorData::new(hot, [rows, k]), device);

    (images, targets)
}
