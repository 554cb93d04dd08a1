//! Contains various types needed across the crate.

use crate::MAX_COLORS;
use std::{error::Error as StdError, fmt::Display, ops::Deref};
#[cfg(feature = "image")]
use image::RgbaImage;

/// The number of color channels in a [`Point`].
pub const CHANNELS: usize = 3;

/// The number of interleaved bytes per pixel in a [`PixelBuffer`] (R, G, B, A).
pub const BYTES_PER_PIXEL: usize = 4;

/// A single RGB color sample.
///
/// Channels are conceptually in `0..=255`, but `i32` components are used, since
/// error diffusion pushes intermediate values negative or above `255`.
pub type Point = [i32; CHANNELS];

/// The error type for precondition violations reported by this crate.
///
/// None of these are transient: the computations here are deterministic,
/// so a failed call will fail the same way if retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A partition tree build was attempted over zero points.
    EmptyInput,
    /// A nearest color lookup was attempted against a zero-length palette.
    ///
    /// This is unreachable through the crate's own palettes, since a tree built
    /// from a non-empty point set always has at least one leaf, but it is
    /// reported rather than silently misbehaving.
    EmptyPalette,
    /// A palette size outside of `1..=256` was given.
    InvalidPaletteSize(u16),
    /// A pixel buffer's byte length did not match its dimensions.
    BufferSizeMismatch {
        /// The length implied by the dimensions (`width * height * 4`).
        expected: usize,
        /// The actual byte length given.
        actual: usize,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Error::EmptyInput => write!(f, "cannot build a partition tree from zero points"),
            Error::EmptyPalette => write!(f, "cannot match against an empty palette"),
            Error::InvalidPaletteSize(size) => {
                write!(f, "palette size {size} is outside of 1..={MAX_COLORS}")
            }
            Error::BufferSizeMismatch { expected, actual } => {
                write!(f, "expected a buffer of {expected} bytes but got {actual}")
            }
        }
    }
}

impl StdError for Error {}

/// An ordered collection of color samples.
///
/// This is a simple new type wrapper around `Vec<Point>`.
/// The order is insertion order from the source buffer; it carries no meaning
/// beyond being the sort input for tree construction, but it must be stable
/// for palettes to be reproducible.
///
/// # Examples
/// From raw points:
/// ```
/// # use mediancut::PointSet;
/// let points = PointSet::new(vec![[0, 0, 0], [255, 255, 255]]);
/// assert_eq!(points.len(), 2);
/// ```
///
/// From interleaved RGBA bytes:
/// ```
/// # use mediancut::{PixelBuffer, PointSet};
/// # fn main() -> Result<(), mediancut::Error> {
/// let mut bytes = [10, 20, 30, 255, 40, 50, 60, 255];
/// let buffer = PixelBuffer::new(&mut bytes, 2, 1)?;
/// let points = PointSet::from_pixel_buffer(&buffer);
/// assert_eq!(points.as_ref(), &[[10, 20, 30], [40, 50, 60]]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct PointSet(Vec<Point>);

impl PointSet {
    /// Creates a new [`PointSet`] from the given points, preserving their order.
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Extracts one [`Point`] per pixel from the given buffer, in row-major
    /// order. Alpha bytes are skipped.
    #[must_use]
    pub fn from_pixel_buffer(buffer: &PixelBuffer<'_>) -> Self {
        let points = buffer
            .bytes()
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|pixel| [pixel[0].into(), pixel[1].into(), pixel[2].into()])
            .collect();
        Self(points)
    }

    /// Returns the number of points in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether or not the set contains zero points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the set, returning the inner `Vec`.
    #[must_use]
    pub fn into_inner(self) -> Vec<Point> {
        self.0
    }
}

impl AsRef<[Point]> for PointSet {
    fn as_ref(&self) -> &[Point] {
        &self.0
    }
}

impl Deref for PointSet {
    type Target = [Point];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Point> for PointSet {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// This type is used to specify the (maximum) number of colors to include in a palette.
///
/// This is a simple new type wrapper around `u16` with the invariant that it must be
/// in the range `1..=`[`MAX_COLORS`]. A size of `0` would make the derived tree
/// depth, `ceil(log2(size))`, undefined.
///
/// # Examples
/// Use `try_into` or [`PaletteSize::from_clamped`] to create [`PaletteSize`]s.
/// ```
/// # use mediancut::{PaletteSize, Error};
/// # fn main() -> Result<(), Error> {
/// let size = PaletteSize::try_from(16)?;
/// let size: PaletteSize = 16.try_into()?;
/// let size = PaletteSize::from_clamped(1024);
/// assert_eq!(size, PaletteSize::MAX);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PaletteSize(u16);

impl PaletteSize {
    /// The maximum supported palette size (given by [`MAX_COLORS`]).
    pub const MAX: Self = Self(MAX_COLORS);

    /// The minimum supported palette size.
    pub const MIN: Self = Self(1);

    /// Gets the inner `u16` value.
    #[must_use]
    pub const fn into_inner(self) -> u16 {
        self.0
    }

    /// Creates a [`PaletteSize`] directly from the given `u16`
    /// without ensuring that it lies in `1..=`[`MAX_COLORS`].
    #[allow(unused)]
    pub(crate) const fn new_unchecked(value: u16) -> Self {
        Self(value)
    }

    /// Creates a [`PaletteSize`] by clamping the given `u16` into `1..=`[`MAX_COLORS`].
    #[must_use]
    pub const fn from_clamped(value: u16) -> Self {
        if value == 0 {
            Self(1)
        } else if value <= MAX_COLORS {
            Self(value)
        } else {
            Self(MAX_COLORS)
        }
    }

    /// The partition tree depth needed for a palette of this size,
    /// `ceil(log2(size))`.
    ///
    /// A tree of this depth has at most `2^depth` leaves and therefore
    /// at most `2^depth` palette entries, the smallest power of two
    /// that can cover the requested size.
    ///
    /// # Examples
    /// ```
    /// # use mediancut::PaletteSize;
    /// assert_eq!(PaletteSize::MIN.max_depth(), 0);
    /// assert_eq!(PaletteSize::from_clamped(5).max_depth(), 3);
    /// assert_eq!(PaletteSize::MAX.max_depth(), 8);
    /// ```
    #[must_use]
    pub const fn max_depth(self) -> u32 {
        if self.0 == 1 {
            0
        } else {
            (self.0 - 1).ilog2() + 1
        }
    }
}

impl Default for PaletteSize {
    fn default() -> Self {
        Self(8)
    }
}

impl From<PaletteSize> for u16 {
    fn from(val: PaletteSize) -> Self {
        val.into_inner()
    }
}

impl TryFrom<u16> for PaletteSize {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if (1..=MAX_COLORS).contains(&value) {
            Ok(PaletteSize(value))
        } else {
            Err(Error::InvalidPaletteSize(value))
        }
    }
}

impl Display for PaletteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}

/// A mutable view over externally owned image data:
/// interleaved RGBA bytes, 4 per pixel, row-major.
///
/// The buffer is borrowed, not owned; the image decoding and display subsystem
/// around this crate keeps ownership, and quantization and dithering modify
/// the bytes in place. Alpha bytes are never written.
///
/// # Examples
/// ```
/// # use mediancut::{PixelBuffer, Error};
/// # fn main() -> Result<(), Error> {
/// let mut bytes = vec![0; 4 * 4 * 4];
/// let buffer = PixelBuffer::new(&mut bytes, 4, 4)?;
/// assert_eq!(buffer.rgb(1, 2), [0, 0, 0]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PixelBuffer<'a> {
    /// The interleaved RGBA bytes, of length `width * height * 4`.
    bytes: &'a mut [u8],
    /// The width of the image in pixels.
    width: u32,
    /// The height of the image in pixels.
    height: u32,
}

impl<'a> PixelBuffer<'a> {
    /// Creates a new [`PixelBuffer`] over the given bytes.
    ///
    /// # Errors
    /// Returns [`Error::BufferSizeMismatch`] if `bytes.len()` is not
    /// `width * height * 4`.
    pub fn new(bytes: &'a mut [u8], width: u32, height: u32) -> Result<Self, Error> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if bytes.len() == expected {
            Ok(Self { bytes, width, height })
        } else {
            Err(Error::BufferSizeMismatch { expected, actual: bytes.len() })
        }
    }

    /// The width of the image in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// The height of the image in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The number of pixels in the image.
    #[must_use]
    pub const fn num_pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The underlying bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.bytes
    }

    /// The underlying bytes, mutably.
    ///
    /// Writes through this slice can touch alpha bytes; the crate's own
    /// transforms only ever write the leading RGB bytes of each pixel.
    #[must_use]
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.bytes
    }

    /// The byte index of the pixel at `(x, y)`.
    fn byte_index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }

    /// The RGB channels of the pixel at `(x, y)`.
    ///
    /// # Panics
    /// Panics if `(x, y)` is outside the image.
    #[must_use]
    pub fn rgb(&self, x: u32, y: u32) -> Point {
        let i = self.byte_index(x, y);
        let pixel = &self.bytes[i..i + CHANNELS];
        [pixel[0].into(), pixel[1].into(), pixel[2].into()]
    }

    /// Overwrites the RGB channels of the pixel at `(x, y)`, leaving alpha as is.
    ///
    /// # Panics
    /// Panics if `(x, y)` is outside the image.
    pub fn set_rgb(&mut self, x: u32, y: u32, rgb: [u8; CHANNELS]) {
        let i = self.byte_index(x, y);
        self.bytes[i..i + CHANNELS].copy_from_slice(&rgb);
    }

    /// Creates a [`PixelBuffer`] over the given image's pixels.
    #[cfg(feature = "image")]
    #[must_use]
    pub fn from_image(image: &'a mut RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            bytes: &mut **image,
            width,
            height,
        }
    }
}
