//! Floyd-Steinberg error diffusion dithering.

use crate::{
    median_cut,
    nearest::{nearest, palette_point},
    Error, PaletteSize, PixelBuffer, Point, PointSet, TreeVariant, CHANNELS,
};
use palette::Srgb;

/// The Floyd-Steinberg neighbor weights, as sixteenths:
/// right, below-left, below, below-right. They sum to one,
/// so diffusion redistributes error without amplifying it.
const WEIGHTS: [i32; 4] = [7, 3, 5, 1];

/// The neighbor offsets matching [`WEIGHTS`], as `(dx, dy)`.
const OFFSETS: [(i64, i64); 4] = [(1, 0), (-1, 1), (0, 1), (1, 1)];

/// Floyd-Steinberg dithering.
///
/// Quantizes an image to a palette while diffusing each pixel's quantization
/// error onto its unprocessed neighbors, trading local color accuracy for a
/// perceptually smoother result.
///
/// # Examples
/// ```
/// # use mediancut::{FloydSteinberg, PixelBuffer, PaletteSize, TreeVariant};
/// # fn main() -> Result<(), mediancut::Error> {
/// let mut bytes = vec![0; 8 * 8 * 4];
/// let mut buffer = PixelBuffer::new(&mut bytes, 8, 8)?;
/// let palette = FloydSteinberg::new().dither(
///     &mut buffer,
///     PaletteSize::try_from(4)?,
///     TreeVariant::Standard,
/// )?;
/// assert!(!palette.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FloydSteinberg;

/// The working image during a dither pass: one `i32` point per pixel,
/// so propagated error can push channels negative or above 255.
struct WorkBuf {
    /// The width of a row of pixels.
    width: i64,
    /// The height of the image.
    height: i64,
    /// The error-adjusted pixels, row-major.
    points: Vec<Point>,
}

impl WorkBuf {
    /// Copies the buffer's RGB planes into working points.
    fn new(buffer: &PixelBuffer<'_>) -> Self {
        Self {
            width: i64::from(buffer.width()),
            height: i64::from(buffer.height()),
            points: PointSet::from_pixel_buffer(buffer).into_inner(),
        }
    }

    /// The working point at `(x, y)`.
    fn get(&self, x: i64, y: i64) -> Point {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let i = (y * self.width + x) as usize;
        self.points[i]
    }

    /// Adds the floored weighted error to the neighbor at `(x, y)`.
    ///
    /// Neighbors outside the image are skipped: the reference algorithm
    /// wrote through its flat pixel array unguarded, wrapping row ends onto
    /// adjacent rows; bounds-checked skipping is this crate's documented
    /// policy instead (see `DESIGN.md`).
    fn add_error(&mut self, x: i64, y: i64, error: Point, weight: i32) {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let i = (y * self.width + x) as usize;
        for (channel, err) in self.points[i].iter_mut().zip(error) {
            // Math.floor semantics: -3 * 7 / 16 rounds to -2, not -1.
            *channel += (err * weight).div_euclid(16);
        }
    }
}

impl FloydSteinberg {
    /// Creates a new [`FloydSteinberg`].
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Dithers the buffer to a palette of at most `size` colors.
    ///
    /// The palette is derived exactly as in [`quantize`](crate::quantize):
    /// a partition tree over the buffer's RGB samples at depth
    /// `ceil(log2(size))`, leaves averaged. Pixels are then scanned row-major
    /// (left to right, top to bottom); each is replaced by its nearest
    /// palette color and the per-channel quantization error is spread over
    /// four forward neighbors at 7/16, 3/16, 5/16, and 1/16, each term
    /// floored before being added to whatever error the neighbor has already
    /// accumulated.
    ///
    /// The scan is inherently sequential: every pixel's match depends on
    /// error propagated by its predecessors. Alpha bytes are untouched.
    /// The computed palette is returned.
    ///
    /// # Errors
    /// Returns [`Error::EmptyInput`] if the buffer has zero pixels.
    pub fn dither(
        &self,
        buffer: &mut PixelBuffer<'_>,
        size: PaletteSize,
        variant: TreeVariant,
    ) -> Result<Vec<Srgb<u8>>, Error> {
        let points = PointSet::from_pixel_buffer(buffer);
        let palette = median_cut::palette(points, size, variant)?;
        self.dither_with_palette(buffer, &palette)?;
        Ok(palette)
    }

    /// Dithers the buffer against an already computed palette.
    ///
    /// # Errors
    /// Returns [`Error::EmptyPalette`] if `palette` is empty.
    pub fn dither_with_palette(
        &self,
        buffer: &mut PixelBuffer<'_>,
        palette: &[Srgb<u8>],
    ) -> Result<(), Error> {
        if palette.is_empty() {
            return Err(Error::EmptyPalette);
        }

        let mut work = WorkBuf::new(buffer);

        for y in 0..work.height {
            for x in 0..work.width {
                let oldpix = work.get(x, y);
                let (_, closest) = nearest(palette, oldpix)?;
                let closest_point = palette_point(closest);

                let mut error = [0; CHANNELS];
                for c in 0..CHANNELS {
                    error[c] = oldpix[c] - closest_point[c];
                }

                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                buffer.set_rgb(x as u32, y as u32, [closest.red, closest.green, closest.blue]);

                for (&weight, (dx, dy)) in WEIGHTS.iter().zip(OFFSETS) {
                    work.add_error(x + dx, y + dy, error, weight);
                }
            }
        }

        Ok(())
    }
}
