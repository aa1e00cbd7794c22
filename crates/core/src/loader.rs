// crates/core/src/loader.rs
//
// cache -> batch -> prefetch over a dataset's processed stream. The producer
// runs on its own task and pushes batches through a bounded channel; dropping
// the consumer side is the cancellation mechanism.

use std::sync::Arc;

use futures::stream::{Stream, StreamExt};
use ndarray::{s, Array2, Array4};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::dataset::{ImageFolderDataset, Sample};
use crate::error::PipelineError;
use crate::plan::EvalPlan;

/// A stacked batch of processed samples.
///
/// Images are [batch, height, width, 3] floats in [0, 1]; labels are
/// [batch, num_classes] one-hot rows.
#[derive(Debug, Clone)]
pub struct Batch {
    pub images: Array4<f32>,
    pub labels: Array2<f32>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.images.dim().0
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Batching front-end for one dataset.
pub struct BatchLoader {
    dataset: Arc<ImageFolderDataset>,
    batch_size: usize,
    prefetch: usize,
    cache: bool,
}

impl BatchLoader {
    pub fn new(
        dataset: Arc<ImageFolderDataset>,
        batch_size: usize,
        prefetch: usize,
        cache: bool,
    ) -> Self {
        Self {
            dataset,
            batch_size: batch_size.max(1),
            prefetch: prefetch.max(1),
            cache,
        }
    }

    pub fn from_plan(dataset: Arc<ImageFolderDataset>, plan: &EvalPlan) -> Self {
        Self::new(dataset, plan.batch_size, plan.prefetch, plan.cache)
    }

    /// Spawn the producer and return the prefetched batch stream. The final
    /// partial batch is kept. Any pipeline error is forwarded once and ends
    /// the stream.
    pub fn batches(&self) -> impl Stream<Item = Result<Batch, PipelineError>> + Send + 'static {
        let (tx, rx) = mpsc::channel(self.prefetch);
        let dataset = Arc::clone(&self.dataset);
        let batch_size = self.batch_size;
        let cache = self.cache;

        tokio::spawn(async move {
            let mut pending: Vec<Sample> = Vec::with_capacity(batch_size);
            let mut samples = if cache {
                // Materialize once, then feed batches from memory.
                let mut cached = Vec::with_capacity(dataset.len());
                let mut stream = Box::pin(dataset.stream());
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(sample) => cached.push(sample),
                        Err(e) => {
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    }
                }
                debug!("cached {} processed samples", cached.len());
                futures::stream::iter(cached.into_iter().map(Ok)).boxed()
            } else {
                dataset.stream().boxed()
            };

            while let Some(item) = samples.next().await {
                match item {
                    Ok(sample) => {
                        pending.push(sample);
                        if pending.len() == batch_size {
                            let batch = stack(std::mem::take(&mut pending));
                            if tx.send(batch).await.is_err() {
                                return; // consumer dropped the stream
                            }
                            pending.reserve(batch_size);
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }

            if !pending.is_empty() {
                let _ = tx.send(stack(pending)).await;
            }
        });

        ReceiverStream::new(rx)
    }
}

/// Stack samples into one contiguous batch. All samples share the dataset's
/// target size and label width.
fn stack(samples: Vec<Sample>) -> Result<Batch, PipelineError> {
    let n = samples.len();
    let (h, w, c) = samples[0].image.dim();
    let k = samples[0].label.len();

    let mut images = Array4::zeros((n, h, w, c));
    let mut labels = Array2::zeros((n, k));
    for (i, sample) in samples.iter().enumerate() {
        if sample.image.dim() != (h, w, c) || sample.label.len() != k {
            return Err(PipelineError::Worker(format!(
                "inconsistent sample shape at '{}'",
                sample.path.display()
            )));
        }
        images.slice_mut(s![i, .., .., ..]).assign(&sample.image);
        labels.slice_mut(s![i, ..]).assign(&sample.label);
    }

    Ok(Batch { images, labels })
}
