// crates/core/src/augment.rs
//
// Training-time augmentation seam. The pipeline talks to a trait so the
// transform set stays a collaborator concern; the default implementation
// covers the usual geometric/color jitter.

use std::sync::Mutex;

use image::RgbImage;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// An image-only transform applied during training. Labels never pass
/// through here.
pub trait Augment: Send + Sync {
    fn transform(&self, image: RgbImage) -> RgbImage;
}

/// Default augmentation: random horizontal flip plus brightness jitter.
pub struct ColorGeometryJitter {
    rng: Mutex<ChaCha8Rng>,
    max_brightness_shift: i32,
}

impl ColorGeometryJitter {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
            max_brightness_shift: 24,
        }
    }
}

impl Augment for ColorGeometryJitter {
    fn transform(&self, image: RgbImage) -> RgbImage {
        let (flip, shift) = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            (
                rng.gen_bool(0.5),
                rng.gen_range(-self.max_brightness_shift..=self.max_brightness_shift),
            )
        };

        let mut image = image;
        if flip {
            image = image::imageops::flip_horizontal(&image);
        }
        if shift != 0 {
            image = image::imageops::brighten(&image, shift);
        }
        image
    }
}
