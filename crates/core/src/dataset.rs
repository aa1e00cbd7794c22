// crates/core/src/dataset.rs
//
// Directory-per-class image dataset pipeline:
//
//   enumerate labels -> enumerate files -> order -> decode -> process
//
// Both the decode-only and the fully processed sequences are lazy streams,
// re-derivable from the same immutable dataset value. Decode and process run
// as blocking units buffered up to the parallelism hint; ordering is
// preserved so a seeded run is reproducible end to end.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{Stream, StreamExt};
use ndarray::{Array1, Array3};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::augment::{Augment, ColorGeometryJitter};
use crate::error::PipelineError;
use crate::plan::EvalPlan;
use vision_harness_formats::{pixels, ImageCodec};

/// A decoded, un-resized sample: H×W×3 bytes plus a one-hot label.
#[derive(Debug, Clone)]
pub struct DecodedSample {
    pub image: Array3<u8>,
    pub label: Array1<f32>,
    pub path: PathBuf,
}

/// A fully processed sample: resized, optionally augmented, normalized to [0, 1].
#[derive(Debug, Clone)]
pub struct Sample {
    pub image: Array3<f32>,
    pub label: Array1<f32>,
    pub path: PathBuf,
}

/// Knobs for opening a dataset outside of a full [`EvalPlan`].
#[derive(Debug, Clone)]
pub struct DatasetOptions {
    /// `Some(seed)` applies a deterministic permutation to the file list.
    pub seed: Option<u64>,
    pub parallelism: usize,
    pub training: bool,
    /// Target size as (height, width).
    pub target: (u32, u32),
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            seed: Some(1),
            parallelism: 1,
            training: false,
            target: (224, 224),
        }
    }
}

/// Immutable dataset over a `<root>/<label>/**/*.<ext>` layout.
pub struct ImageFolderDataset {
    root: PathBuf,
    extension: String,
    target: (u32, u32),
    parallelism: usize,
    training: bool,
    labels: Arc<Vec<String>>,
    files: Arc<Vec<PathBuf>>,
    augmenter: Option<Arc<dyn Augment>>,
}

impl ImageFolderDataset {
    pub fn from_plan(plan: &EvalPlan) -> Result<Self, PipelineError> {
        Self::open(
            &plan.data_root,
            &plan.extension,
            DatasetOptions {
                seed: plan.seed,
                parallelism: plan.parallelism,
                training: plan.training,
                target: plan.target,
            },
        )
    }

    pub fn open(
        root: &Path,
        extension: &str,
        opts: DatasetOptions,
    ) -> Result<Self, PipelineError> {
        let labels = list_labels(root)?;
        if labels.is_empty() {
            return Err(PipelineError::Configuration(format!(
                "no class subdirectories under '{}'",
                root.display()
            )));
        }

        let mut files = list_files(root, extension)?;
        if let Some(seed) = opts.seed {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            files.shuffle(&mut rng);
            debug!("shuffled {} files with seed {}", files.len(), seed);
        }

        info!(
            "opened dataset at '{}': {} classes, {} files",
            root.display(),
            labels.len(),
            files.len()
        );

        // The default augmentation collaborator is only wired in for training.
        let augmenter: Option<Arc<dyn Augment>> = if opts.training {
            Some(Arc::new(ColorGeometryJitter::new(opts.seed)))
        } else {
            None
        };

        Ok(Self {
            root: root.to_path_buf(),
            extension: extension.to_string(),
            target: opts.target,
            parallelism: opts.parallelism.max(1),
            training: opts.training,
            labels: Arc::new(labels),
            files: Arc::new(files),
            augmenter,
        })
    }

    /// Swap the augmentation collaborator. Only takes effect in training mode;
    /// evaluation datasets never augment.
    pub fn with_augmenter(mut self, augmenter: Arc<dyn Augment>) -> Self {
        if self.training {
            self.augmenter = Some(augmenter);
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn num_classes(&self) -> usize {
        self.labels.len()
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Lazy stream of decoded, un-resized samples.
    pub fn decode_stream(
        &self,
    ) -> impl Stream<Item = Result<DecodedSample, PipelineError>> + Send + 'static {
        let labels = Arc::clone(&self.labels);
        let files = Arc::clone(&self.files);
        let parallelism = self.parallelism;

        futures::stream::iter(0..files.len())
            .map(move |i| {
                let labels = Arc::clone(&labels);
                let files = Arc::clone(&files);
                tokio::task::spawn_blocking(move || {
                    let path = files[i].clone();
                    let (image, label) = decode_one(&path, &labels)?;
                    Ok(DecodedSample {
                        image: pixels::to_hwc_u8(&image),
                        label,
                        path,
                    })
                })
            })
            .buffered(parallelism)
            .map(flatten_join)
    }

    /// Lazy stream of fully processed samples: resize, training-only
    /// augmentation, then /255 normalization.
    pub fn stream(&self) -> impl Stream<Item = Result<Sample, PipelineError>> + Send + 'static {
        let labels = Arc::clone(&self.labels);
        let files = Arc::clone(&self.files);
        let augmenter = self.augmenter.clone();
        let target = self.target;
        let parallelism = self.parallelism;

        futures::stream::iter(0..files.len())
            .map(move |i| {
                let labels = Arc::clone(&labels);
                let files = Arc::clone(&files);
                let augmenter = augmenter.clone();
                tokio::task::spawn_blocking(move || {
                    let path = files[i].clone();
                    let (image, label) = decode_one(&path, &labels)?;
                    let mut image = pixels::resize(&image, target);
                    if let Some(aug) = &augmenter {
                        image = aug.transform(image);
                    }
                    Ok(Sample {
                        image: pixels::normalize(&image),
                        label,
                        path,
                    })
                })
            })
            .buffered(parallelism)
            .map(flatten_join)
    }
}

impl std::fmt::Debug for ImageFolderDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFolderDataset")
            .field("root", &self.root)
            .field("extension", &self.extension)
            .field("classes", &self.labels.len())
            .field("files", &self.files.len())
            .field("training", &self.training)
            .finish()
    }
}

/// Sorted immediate subdirectory names of the dataset root.
fn list_labels(root: &Path) -> Result<Vec<String>, PipelineError> {
    let mut labels = Vec::new();
    let entries = fs::read_dir(root).map_err(|e| PipelineError::io(root, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(root, e))?;
        let is_dir = entry
            .file_type()
            .map_err(|e| PipelineError::io(entry.path(), e))?
            .is_dir();
        if is_dir {
            if let Some(name) = entry.file_name().to_str() {
                labels.push(name.to_string());
            }
        }
    }
    labels.sort();
    Ok(labels)
}

/// All files matching `<root>/**/*.<ext>` at any depth, in lexicographic order.
fn list_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>, PipelineError> {
    let pattern = format!("{}/**/*.{}", root.display(), extension);
    let entries = glob::glob(&pattern)
        .map_err(|e| PipelineError::Configuration(format!("invalid glob pattern '{}': {}", pattern, e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            PipelineError::io(path, e.into_error())
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read, decode and label a single file. The label comes from the immediate
/// parent directory name; names outside the label set one-hot to all zeros.
fn decode_one(
    path: &Path,
    labels: &[String],
) -> Result<(image::RgbImage, Array1<f32>), PipelineError> {
    let bytes = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    let codec = ImageCodec::from_path(path)?;
    let image = codec.decode(&bytes)?;

    let parent = path
        .parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str());
    Ok((image, one_hot(parent, labels)))
}

fn one_hot(name: Option<&str>, labels: &[String]) -> Array1<f32> {
    Array1::from_iter(labels.iter().map(|label| match name {
        Some(n) if label == n => 1.0,
        _ => 0.0,
    }))
}

fn flatten_join<T>(
    joined: Result<Result<T, PipelineError>, tokio::task::JoinError>,
) -> Result<T, PipelineError> {
    match joined {
        Ok(res) => res,
        Err(e) => Err(PipelineError::Worker(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn write_png(path: &Path, color: [u8; 3]) {
        let img = image::RgbImage::from_pixel(6, 6, image::Rgb(color));
        img.save(path).unwrap();
    }

    fn cat_dog_root() -> TempDir {
        let dir = TempDir::new().unwrap();
        for (label, color) in [("cat", [255, 0, 0]), ("dog", [0, 255, 0])] {
            let sub = dir.path().join(label);
            fs::create_dir_all(&sub).unwrap();
            for i in 0..3 {
                write_png(&sub.join(format!("img_{i}.png")), color);
            }
        }
        dir
    }

    fn eval_opts(seed: Option<u64>) -> DatasetOptions {
        DatasetOptions {
            seed,
            parallelism: 2,
            training: false,
            target: (8, 8),
        }
    }

    struct CountingAugmenter(AtomicUsize);

    impl Augment for CountingAugmenter {
        fn transform(&self, image: image::RgbImage) -> image::RgbImage {
            self.0.fetch_add(1, Ordering::SeqCst);
            image
        }
    }

    #[test]
    fn labels_are_sorted_and_order_is_stable_without_seed() {
        let root = cat_dog_root();
        let ds = ImageFolderDataset::open(root.path(), "png", eval_opts(None)).unwrap();

        assert_eq!(ds.labels(), ["cat".to_string(), "dog".to_string()]);
        assert_eq!(ds.len(), 6);

        let sorted: Vec<_> = {
            let mut v = ds.files().to_vec();
            v.sort();
            v
        };
        assert_eq!(ds.files(), sorted.as_slice());
    }

    #[test]
    fn seeded_shuffle_is_deterministic() {
        let root = cat_dog_root();
        let a = ImageFolderDataset::open(root.path(), "png", eval_opts(Some(42))).unwrap();
        let b = ImageFolderDataset::open(root.path(), "png", eval_opts(Some(42))).unwrap();
        assert_eq!(a.files(), b.files());
    }

    #[test]
    fn empty_label_set_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = ImageFolderDataset::open(dir.path(), "png", eval_opts(None)).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[tokio::test]
    async fn decoded_samples_are_one_hot() {
        let root = cat_dog_root();
        let ds = ImageFolderDataset::open(root.path(), "png", eval_opts(None)).unwrap();

        let samples: Vec<_> = ds.decode_stream().collect().await;
        assert_eq!(samples.len(), 6);
        for sample in samples {
            let sample = sample.unwrap();
            assert_eq!(sample.image.dim(), (6, 6, 3));
            assert_eq!(sample.label.len(), 2);
            assert_eq!(sample.label.sum(), 1.0);
        }
    }

    #[tokio::test]
    async fn processed_samples_are_resized_and_unit_range() {
        let root = cat_dog_root();
        let ds = ImageFolderDataset::open(root.path(), "png", eval_opts(Some(42))).unwrap();

        let samples: Vec<_> = ds.stream().collect().await;
        for sample in samples {
            let sample = sample.unwrap();
            assert_eq!(sample.image.dim(), (8, 8, 3));
            assert!(sample.image.iter().all(|&v| (0.0..=1.0).contains(&v)));
            assert_eq!(sample.label.sum(), 1.0);
        }
    }

    #[tokio::test]
    async fn evaluation_mode_never_augments() {
        let root = cat_dog_root();
        let counter = Arc::new(CountingAugmenter(AtomicUsize::new(0)));

        let ds = ImageFolderDataset::open(root.path(), "png", eval_opts(None))
            .unwrap()
            .with_augmenter(Arc::clone(&counter) as Arc<dyn Augment>);
        let _: Vec<_> = ds.stream().collect().await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn training_mode_augments_every_sample() {
        let root = cat_dog_root();
        let counter = Arc::new(CountingAugmenter(AtomicUsize::new(0)));

        let mut opts = eval_opts(Some(1));
        opts.training = true;
        let ds = ImageFolderDataset::open(root.path(), "png", opts)
            .unwrap()
            .with_augmenter(Arc::clone(&counter) as Arc<dyn Augment>);
        let results: Vec<_> = ds.stream().collect().await;
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(counter.0.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn unreadable_file_fails_lazily_at_iteration() {
        let root = cat_dog_root();
        let ds = ImageFolderDataset::open(root.path(), "png", eval_opts(None)).unwrap();

        // Construction succeeded; remove a file before iterating.
        fs::remove_file(&ds.files()[0]).unwrap();

        let results: Vec<_> = ds.stream().collect().await;
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(PipelineError::Io { .. }))));
    }

    #[tokio::test]
    async fn unmapped_extension_is_an_explicit_error() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("cat");
        fs::create_dir_all(&sub).unwrap();
        // A real PNG payload under a .bmp name: the codec is derived from the
        // extension, and bmp maps to no codec.
        write_png(&sub.join("decoy.png"), [1, 2, 3]);
        fs::rename(sub.join("decoy.png"), sub.join("decoy.bmp")).unwrap();

        let ds = ImageFolderDataset::open(dir.path(), "bmp", eval_opts(None)).unwrap();
        let results: Vec<_> = ds.decode_stream().collect().await;
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(PipelineError::Format(_))));
    }

    #[test]
    fn nested_files_label_from_immediate_parent() {
        let root = cat_dog_root();
        let nested = root.path().join("cat").join("extra");
        fs::create_dir_all(&nested).unwrap();
        write_png(&nested.join("deep.png"), [9, 9, 9]);

        let ds = ImageFolderDataset::open(root.path(), "png", eval_opts(None)).unwrap();
        // The glob reaches any depth; the nested file's label directory is
        // "extra", which is not in the label set.
        assert_eq!(ds.len(), 7);
        let hot = one_hot(Some("extra"), ds.labels());
        assert_eq!(hot.sum(), 0.0);
    }
}
