//! Flat quantization: palette matching without error diffusion.

use crate::{
    median_cut, nearest::nearest, Error, PaletteSize, PixelBuffer, PointSet, TreeVariant,
    BYTES_PER_PIXEL, CHANNELS,
};
use palette::Srgb;
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// Replaces the RGB of one interleaved pixel with its nearest palette color.
///
/// The palette is non-empty by construction, so the lookup cannot fail.
fn remap_pixel(pixel: &mut [u8], palette: &[Srgb<u8>]) -> Result<(), Error> {
    let point = [pixel[0].into(), pixel[1].into(), pixel[2].into()];
    let (_, color) = nearest(palette, point)?;
    pixel[..CHANNELS].copy_from_slice(&[color.red, color.green, color.blue]);
    Ok(())
}

/// Quantizes the buffer's pixels to a palette of at most `size` colors,
/// without error diffusion.
///
/// A partition tree is built over the buffer's RGB samples at depth
/// `ceil(log2(size))` using the given split strategy, its leaves are averaged
/// into a palette, and every pixel's RGB is replaced in place by its nearest
/// palette color. Alpha bytes are untouched. The computed palette is
/// returned.
///
/// # Errors
/// Returns [`Error::EmptyInput`] if the buffer has zero pixels.
///
/// # Examples
/// ```
/// # use mediancut::{quantize, PixelBuffer, PaletteSize, TreeVariant};
/// # fn main() -> Result<(), mediancut::Error> {
/// let mut bytes = vec![0; 8 * 8 * 4];
/// let mut buffer = PixelBuffer::new(&mut bytes, 8, 8)?;
/// let size = PaletteSize::try_from(8)?;
/// let palette = quantize(&mut buffer, size, TreeVariant::Standard)?;
/// assert!(!palette.is_empty());
/// # Ok(())
/// # }
/// ```
pub fn quantize(
    buffer: &mut PixelBuffer<'_>,
    size: PaletteSize,
    variant: TreeVariant,
) -> Result<Vec<Srgb<u8>>, Error> {
    let points = PointSet::from_pixel_buffer(buffer);
    let palette = median_cut::palette(points, size, variant)?;

    for pixel in buffer.bytes_mut().chunks_exact_mut(BYTES_PER_PIXEL) {
        remap_pixel(pixel, &palette)?;
    }

    Ok(palette)
}

/// Quantizes the buffer's pixels in parallel.
///
/// Pixels are remapped independently of each other, so this produces
/// output identical to [`quantize`].
///
/// # Errors
/// Returns [`Error::EmptyInput`] if the buffer has zero pixels.
#[cfg(feature = "threads")]
pub fn quantize_par(
    buffer: &mut PixelBuffer<'_>,
    size: PaletteSize,
    variant: TreeVariant,
) -> Result<Vec<Srgb<u8>>, Error> {
    let points = PointSet::from_pixel_buffer(buffer);
    let palette = median_cut::palette(points, size, variant)?;

    buffer
        .bytes_mut()
        .par_chunks_exact_mut(BYTES_PER_PIXEL)
        .try_for_each(|pixel| remap_pixel(pixel, &palette))?;

    Ok(palette)
}
