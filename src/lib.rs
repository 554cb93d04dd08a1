//! A library for median cut color quantization and Floyd-Steinberg dithering.
//!
//! `mediancut` reduces an image's color space to a small palette by
//! recursively partitioning its pixel colors along the channel with the
//! greatest spread, and renders the result either by flat nearest-color
//! matching or with error diffusion dithering.
//!
//! # Features
//! To reduce dependencies and compile times, `mediancut` has several `cargo`
//! features that can be turned off or on:
//! - `pipelines`: exposes the [`Pipeline`] builder struct that serves as the high-level API.
//! - `threads`: builds partition trees and flat quantizes in parallel via [`rayon`].
//! - `image`: enables integration with the [`image`] crate.
//!
//! # High-Level API
//! To get started with the high-level API, see [`Pipeline`].
//! Here is an additional example:
//! ```no_run
//! # use mediancut::{Pipeline, PaletteSize, TreeVariant};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut img = image::open("some image")?.into_rgba8();
//!
//! let palette = Pipeline::from_image(&mut img)
//!     .palette_size(PaletteSize::try_from(8)?) // set the max number of colors in the palette
//!     .variant(TreeVariant::Modified) // shift cuts toward denser color mass
//!     .dither(true) // diffuse quantization error over neighboring pixels
//!     .run()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Low-Level API
//! The pipeline is a thin layer over the individual stages, which are all
//! public: [`PointSet`] extraction, [`PartitionNode`] construction,
//! [`palette()`] generation, [`nearest()`] matching, [`quantize`], and
//! [`FloydSteinberg::dither`].

#![deny(unsafe_code)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod dither;
mod nearest;
mod remap;
mod types;

#[cfg(feature = "pipelines")]
mod api;

pub mod median_cut;

pub use dither::FloydSteinberg;
pub use median_cut::{palette, PartitionNode, TreeVariant};
pub use nearest::{nearest, squared_distance};
pub use remap::quantize;
#[cfg(feature = "threads")]
pub use remap::quantize_par;
pub use types::*;

#[cfg(feature = "pipelines")]
pub use api::Pipeline;

/// The maximum supported number of palette colors is `256`.
pub const MAX_COLORS: u16 = u8::MAX as u16 + 1;

#[cfg(test)]
pub(crate) mod tests {
    use crate::Point;
    use palette::Srgb;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoroshiro128PlusPlus;

    /// Shorthand for building a palette color.
    pub fn srgb(r: u8, g: u8, b: u8) -> Srgb<u8> {
        Srgb::new(r, g, b)
    }

    /// Deterministic pseudorandom color samples.
    pub fn test_points(n: usize) -> Vec<Point> {
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(42);
        (0..n)
            .map(|_| {
                [
                    rng.gen_range(0..=255),
                    rng.gen_range(0..=255),
                    rng.gen_range(0..=255),
                ]
            })
            .collect()
    }

    /// Deterministic pseudorandom palette entries.
    pub fn test_palette(n: usize) -> Vec<Srgb<u8>> {
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(123);
        (0..n)
            .map(|_| Srgb::new(rng.gen::<u8>(), rng.gen::<u8>(), rng.gen::<u8>()))
            .collect()
    }

    /// Deterministic pseudorandom interleaved RGBA bytes with varied alpha.
    pub fn test_rgba_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(7);
        (0..width as usize * height as usize)
            .flat_map(|_| [rng.gen(), rng.gen(), rng.gen(), rng.gen()])
            .collect()
    }
}
