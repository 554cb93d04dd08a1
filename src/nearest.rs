//! Nearest palette color lookup.

use crate::{Error, Point, CHANNELS};
use palette::Srgb;

/// Squared euclidean distance between two points.
///
/// The square root is skipped since only the relative ordering of
/// distances matters for matching.
#[inline]
#[must_use]
pub fn squared_distance(a: Point, b: Point) -> i64 {
    let mut dist = 0;
    for c in 0..CHANNELS {
        let d = i64::from(a[c]) - i64::from(b[c]);
        dist += d * d;
    }
    dist
}

/// A palette color as a [`Point`], for distance arithmetic.
#[inline]
pub(crate) fn palette_point(color: Srgb<u8>) -> Point {
    [color.red.into(), color.green.into(), color.blue.into()]
}

/// Finds the palette entry closest to `point` in RGB space,
/// returning its index and color.
///
/// A linear scan with strict `<` against the running minimum distance,
/// so the earliest of equally distant entries wins.
///
/// # Errors
/// Returns [`Error::EmptyPalette`] if `palette` is empty. Palettes produced
/// by this crate always have at least one entry, so lookups against them
/// cannot fail.
///
/// # Examples
/// ```
/// # use mediancut::nearest;
/// # use palette::Srgb;
/// # fn main() -> Result<(), mediancut::Error> {
/// let palette = [Srgb::new(0u8, 0, 0), Srgb::new(255, 255, 255)];
/// let (index, color) = nearest(&palette, [10, 20, 30])?;
/// assert_eq!(index, 0);
/// assert_eq!(color, palette[0]);
/// # Ok(())
/// # }
/// ```
pub fn nearest(palette: &[Srgb<u8>], point: Point) -> Result<(usize, Srgb<u8>), Error> {
    let mut entries = palette.iter().enumerate();
    let (_, &first) = entries.next().ok_or(Error::EmptyPalette)?;

    let mut min_index = 0;
    let mut min_distance = squared_distance(point, palette_point(first));
    for (i, &color) in entries {
        let distance = squared_distance(point, palette_point(color));
        if distance < min_distance {
            min_distance = distance;
            min_index = i;
        }
    }

    Ok((min_index, palette[min_index]))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    #[test]
    fn empty_palette() {
        assert_eq!(nearest(&[], [0, 0, 0]), Err(Error::EmptyPalette));
    }

    #[test]
    fn palette_members_match_themselves() {
        let palette = test_palette(64);
        for (i, &color) in palette.iter().enumerate() {
            let (index, matched) = nearest(&palette, palette_point(color)).unwrap();
            assert_eq!(matched, color);
            // A duplicate entry earlier in the palette may shadow this index.
            assert!(index <= i);
        }
    }

    #[test]
    fn equidistant_entries_resolve_to_the_first() {
        let palette = [srgb(0, 0, 0), srgb(10, 10, 10)];
        let (index, color) = nearest(&palette, [5, 5, 5]).unwrap();
        assert_eq!(index, 0);
        assert_eq!(color, srgb(0, 0, 0));
    }

    #[test]
    fn out_of_gamut_points_still_match() {
        // Dithering feeds error-adjusted points outside of 0..=255.
        let palette = [srgb(0, 0, 0), srgb(200, 200, 200)];

        let (index, _) = nearest(&palette, [-50, -3, 0]).unwrap();
        assert_eq!(index, 0);

        let (index, _) = nearest(&palette, [300, 256, 280]).unwrap();
        assert_eq!(index, 1);
    }

    #[test]
    fn matches_naive_oracle() {
        let palette = test_palette(37);
        for point in test_points(512) {
            let (_, color) = nearest(&palette, point).unwrap();
            let expected = palette
                .iter()
                .map(|&c| squared_distance(point, palette_point(c)))
                .min()
                .unwrap();
            assert_eq!(squared_distance(point, palette_point(color)), expected);
        }
    }
}
