// SPDX-License-Identifier: MIT

// crates/formats/src/lib.rs
//
// Image codec resolution and pixel buffer conversion.

pub mod codec;
pub mod pixels;

pub use codec::{FormatError, ImageCodec};
pub use pixels::{normalize, resize, to_hwc_u8};
