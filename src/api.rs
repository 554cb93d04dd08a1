//! Contains the types and functions for the high level pipeline builder API.

use crate::{
    dither::FloydSteinberg, quantize, Error, PaletteSize, PixelBuffer, TreeVariant,
};
use palette::Srgb;
#[cfg(feature = "image")]
use image::RgbaImage;

/// A builder struct to quantize or dither an image with configurable options.
///
/// The pipeline borrows its pixel buffer, so the surrounding driver can rerun
/// it with new options whenever a user facing parameter changes (for example,
/// a palette size slider) without the core holding any UI state.
///
/// # Examples
/// To start, create a [`Pipeline`] from a [`PixelBuffer`]
/// (or from an [`RgbaImage`] with the `image` feature):
/// ```
/// # use mediancut::{Pipeline, PixelBuffer, Error};
/// # fn main() -> Result<(), Error> {
/// let mut bytes = vec![0; 8 * 8 * 4];
/// let buffer = PixelBuffer::new(&mut bytes, 8, 8)?;
/// let pipeline = Pipeline::new(buffer);
/// # Ok(())
/// # }
/// ```
///
/// Then, change options and run it:
/// ```
/// # use mediancut::{Pipeline, PixelBuffer, PaletteSize, TreeVariant, Error};
/// # fn main() -> Result<(), Error> {
/// # let mut bytes = vec![0; 8 * 8 * 4];
/// # let buffer = PixelBuffer::new(&mut bytes, 8, 8)?;
/// let palette = Pipeline::new(buffer)
///     .palette_size(PaletteSize::try_from(5)?)
///     .variant(TreeVariant::Modified)
///     .dither(true)
///     .run()?;
/// assert!(!palette.is_empty());
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug)]
pub struct Pipeline<'a> {
    /// The image to transform in place.
    buffer: PixelBuffer<'a>,
    /// The number of colors to put in the palette.
    size: PaletteSize,
    /// The split strategy for the partition tree.
    variant: TreeVariant,
    /// Whether to diffuse quantization error or flat quantize.
    dither: bool,
}

impl<'a> Pipeline<'a> {
    /// Creates a new [`Pipeline`] over the given buffer with default options:
    /// a palette of 8 colors, the standard median cut, and dithering on.
    pub fn new(buffer: PixelBuffer<'a>) -> Self {
        Self {
            buffer,
            size: PaletteSize::default(),
            variant: TreeVariant::default(),
            dither: true,
        }
    }

    /// Creates a new [`Pipeline`] over the given image's pixels.
    #[cfg(feature = "image")]
    pub fn from_image(image: &'a mut RgbaImage) -> Self {
        Self::new(PixelBuffer::from_image(image))
    }

    /// Sets the palette size which determines the (maximum) number of colors
    /// to have in the palette.
    ///
    /// The default is 8 colors.
    pub fn palette_size(mut self, size: PaletteSize) -> Self {
        self.size = size;
        self
    }

    /// Sets the split strategy for the partition tree.
    ///
    /// The default is [`TreeVariant::Standard`].
    pub fn variant(mut self, variant: TreeVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Sets whether or not to apply Floyd-Steinberg dithering.
    /// When off, pixels are flat quantized to their nearest palette color.
    ///
    /// The default is `true`.
    pub fn dither(mut self, dither: bool) -> Self {
        self.dither = dither;
        self
    }

    /// Runs the pipeline, transforming the buffer in place
    /// and returning the computed palette.
    ///
    /// # Errors
    /// Returns [`Error::EmptyInput`] if the buffer has zero pixels.
    pub fn run(mut self) -> Result<Vec<Srgb<u8>>, Error> {
        if self.dither {
            FloydSteinberg::new().dither(&mut self.buffer, self.size, self.variant)
        } else {
            quantize(&mut self.buffer, self.size, self.variant)
        }
    }
}
