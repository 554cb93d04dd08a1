//! Median cut color quantization.
//!
//! This preclustering method recursively splits the point set along the color
//! channel with the greatest spread, at the statistical median, until the
//! requested depth is reached. Averaging each resulting bucket of colors
//! yields a palette of at most `2^max_depth` entries.
//!
//! Two split strategies are provided:
//! - [`PartitionNode::build`]: the cut is made at the median itself.
//! - [`PartitionNode::build_modified`]: the cut is shifted toward whichever
//!   side of the median holds more of the color mass, which improves palette
//!   fidelity for skewed color distributions at the cost of asymmetric
//!   bucket sizes.

// Referenced material:
// Paul Heckbert, Color image quantization for frame buffer display,
// ACM SIGGRAPH Computer Graphics, vol. 16, no. 3, 297-307, 1982.
// https://doi.org/10.1145/965145.801294

use crate::{Error, PaletteSize, Point, PointSet, CHANNELS};
use palette::Srgb;

/// The minimum number of points for which a split recurses
/// onto worker threads rather than inline.
#[cfg(feature = "threads")]
const PARALLEL_CUTOFF: usize = 1 << 12;

/// Selects which split strategy to use when building a partition tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TreeVariant {
    /// Cut at the statistical median ([`PartitionNode::build`]).
    #[default]
    Standard,
    /// Cut shifted toward the denser side of the median
    /// ([`PartitionNode::build_modified`]).
    Modified,
}

/// A node of a partition tree over a set of color samples.
///
/// The tree is a closed union of two variants; traversal matches exhaustively
/// rather than dispatching through a trait object, since the algorithm never
/// needs open extension.
///
/// Each `Internal` node records the split channel and the pivot point chosen
/// as the split location. Every split sheds exactly one point: the multiset
/// of points across all leaves equals the input minus one per internal node
/// (the pivot itself for the standard cut, the point at the shifted cut
/// index for the modified cut). Dropping the cut point loses it from leaf
/// averaging; this is how the median cut here has always behaved, and the
/// palettes in the test suite are derived from it, so it is preserved rather
/// than corrected (see `DESIGN.md`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionNode {
    /// An internal node splitting the point set along `axis` at `pivot`.
    Internal {
        /// The color channel this node splits on (0 = R, 1 = G, 2 = B).
        axis: usize,
        /// The point at the sorted median. For the standard cut it survives
        /// in neither subtree; for the modified cut the dropped point is the
        /// one at the (possibly shifted) cut index instead.
        pivot: Point,
        /// The subtree over points below the cut.
        left: Box<PartitionNode>,
        /// The subtree over points above the cut.
        right: Box<PartitionNode>,
    },
    /// A terminal bucket of points. Never empty.
    Leaf {
        /// The points in this bucket, at least one.
        points: Vec<Point>,
    },
}

/// The spread of values on one channel: `max - min` over the given points.
fn range(points: &[Point], channel: usize) -> i32 {
    let mut min = i32::MAX;
    let mut max = i32::MIN;
    for point in points {
        min = min.min(point[channel]);
        max = max.max(point[channel]);
    }
    max - min
}

/// The channel with the strictly largest range over the given points.
///
/// Comparison uses strict `>` against the running maximum,
/// so the first of equally spread channels wins.
fn widest_axis(points: &[Point]) -> usize {
    let mut axis = 0;
    let mut widest = range(points, 0);
    for channel in 1..CHANNELS {
        let r = range(points, channel);
        if r > widest {
            widest = r;
            axis = channel;
        }
    }
    axis
}

/// The mean of `points[lo..hi]` on the given channel, as a float.
///
/// The caller guarantees `lo < hi`.
#[allow(clippy::cast_precision_loss)]
fn mean(points: &[Point], lo: usize, hi: usize, channel: usize) -> f64 {
    let sum: i64 = points[lo..hi].iter().map(|p| i64::from(p[channel])).sum();
    sum as f64 / (hi - lo) as f64
}

/// Computes the index to cut a sorted point list at.
///
/// For the standard variant this is the median itself. The modified variant
/// compares the mean of each half against the median value and moves the cut
/// halfway into whichever side lies further from it: `median / 2` when the
/// left mean is the outlier, `3 * median / 2` otherwise. Note the asymmetry
/// inherited from the reference algorithm: the right mean includes the median
/// point while the left does not.
fn cut_index(points: &[Point], axis: usize, median: usize, variant: TreeVariant) -> usize {
    match variant {
        TreeVariant::Standard => median,
        TreeVariant::Modified => {
            let pivot_value = f64::from(points[median][axis]);
            let avg_left = mean(points, 0, median, axis);
            let avg_right = mean(points, median, points.len(), axis);

            if (avg_left - pivot_value).abs() > (avg_right - pivot_value).abs() {
                median / 2
            } else {
                3 * median / 2
            }
        }
    }
}

/// Recursively builds a partition tree over an owned point list.
///
/// Every call checks for an empty list defensively: the split arithmetic
/// should never produce one (empty sub-ranges collapse into a leaf below),
/// but an off-by-one there must surface as an error rather than an empty leaf.
fn build_tree(
    mut points: Vec<Point>,
    max_depth: u32,
    depth: u32,
    variant: TreeVariant,
) -> Result<PartitionNode, Error> {
    if points.is_empty() {
        return Err(Error::EmptyInput);
    }
    if depth >= max_depth || points.len() == 1 {
        return Ok(PartitionNode::Leaf { points });
    }

    let axis = widest_axis(&points);
    points.sort_by_key(|point| point[axis]);

    let median = points.len() / 2;
    let cut = cut_index(&points, axis, median, variant);
    let pivot = points[median];

    // A cut at either end would leave an empty subtree; keep the bucket whole.
    if cut == 0 || cut + 1 >= points.len() {
        return Ok(PartitionNode::Leaf { points });
    }

    let upper = points.split_off(cut + 1);
    points.truncate(cut); // drops the cut point itself

    let (left, right) = join_builds(points, upper, max_depth, depth + 1, variant);

    Ok(PartitionNode::Internal {
        axis,
        pivot,
        left: Box::new(left?),
        right: Box::new(right?),
    })
}

/// Builds both subtrees, splitting the work across threads when
/// the input is large enough to be worth it.
///
/// The two halves are disjoint, so the parallel build produces
/// bit-identical trees to the sequential one.
#[cfg(feature = "threads")]
#[allow(clippy::type_complexity)]
fn join_builds(
    lower: Vec<Point>,
    upper: Vec<Point>,
    max_depth: u32,
    depth: u32,
    variant: TreeVariant,
) -> (Result<PartitionNode, Error>, Result<PartitionNode, Error>) {
    if lower.len() + upper.len() >= PARALLEL_CUTOFF {
        rayon::join(
            || build_tree(lower, max_depth, depth, variant),
            || build_tree(upper, max_depth, depth, variant),
        )
    } else {
        (
            build_tree(lower, max_depth, depth, variant),
            build_tree(upper, max_depth, depth, variant),
        )
    }
}

/// Builds both subtrees sequentially.
#[cfg(not(feature = "threads"))]
#[allow(clippy::type_complexity)]
fn join_builds(
    lower: Vec<Point>,
    upper: Vec<Point>,
    max_depth: u32,
    depth: u32,
    variant: TreeVariant,
) -> (Result<PartitionNode, Error>, Result<PartitionNode, Error>) {
    (
        build_tree(lower, max_depth, depth, variant),
        build_tree(upper, max_depth, depth, variant),
    )
}

impl PartitionNode {
    /// Builds a partition tree over the given points using the standard
    /// median cut, recursing at most `max_depth` levels.
    ///
    /// At each level, the points are sorted on the channel with the widest
    /// range (stable sort, so duplicate values keep their input order and
    /// palettes are reproducible) and split at the median. The median point
    /// becomes the node's pivot and is retained in neither subtree. A node
    /// whose input has a single point, or that lies at `max_depth`, becomes
    /// a leaf.
    ///
    /// # Errors
    /// Returns [`Error::EmptyInput`] if `points` is empty.
    pub fn build(points: PointSet, max_depth: u32) -> Result<Self, Error> {
        build_tree(points.into_inner(), max_depth, 0, TreeVariant::Standard)
    }

    /// Builds a partition tree using the variance-aware modified median cut.
    ///
    /// Sorting and pivot selection are as in [`PartitionNode::build`], but the
    /// cut point shifts toward the denser side of the distribution: to
    /// `median / 2` when the left half's mean sits further from the median
    /// value than the right half's, and to `3 * median / 2` otherwise. The
    /// point at the cut index is retained in neither subtree, so a split can
    /// shed a point in addition to its pivot.
    ///
    /// # Errors
    /// Returns [`Error::EmptyInput`] if `points` is empty.
    pub fn build_modified(points: PointSet, max_depth: u32) -> Result<Self, Error> {
        build_tree(points.into_inner(), max_depth, 0, TreeVariant::Modified)
    }

    /// Builds a partition tree using the given split strategy.
    ///
    /// # Errors
    /// Returns [`Error::EmptyInput`] if `points` is empty.
    pub fn build_variant(
        points: PointSet,
        max_depth: u32,
        variant: TreeVariant,
    ) -> Result<Self, Error> {
        build_tree(points.into_inner(), max_depth, 0, variant)
    }

    /// Averages each leaf bucket into one palette color.
    ///
    /// Leaves are visited left before right, and each contributes the
    /// per-channel floored mean of its points. Callers must not depend on
    /// palette order for correctness, but the in-order contract is stable
    /// and reproducible.
    #[must_use]
    pub fn average_leaves(&self) -> Vec<Srgb<u8>> {
        let mut palette = Vec::with_capacity(self.leaf_count());
        self.push_leaf_averages(&mut palette);
        palette
    }

    /// Appends this subtree's leaf averages to `palette`, left then right.
    fn push_leaf_averages(&self, palette: &mut Vec<Srgb<u8>>) {
        match self {
            PartitionNode::Internal { left, right, .. } => {
                left.push_leaf_averages(palette);
                right.push_leaf_averages(palette);
            }
            PartitionNode::Leaf { points } => {
                let len = points.len() as i64;
                let mut sums = [0i64; CHANNELS];
                for point in points {
                    for (sum, &channel) in sums.iter_mut().zip(point) {
                        *sum += i64::from(channel);
                    }
                }
                // Leaf points come from 0..=255 samples, so the floored
                // means fit in u8.
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let [r, g, b] = sums.map(|sum| sum.div_euclid(len) as u8);
                palette.push(Srgb::new(r, g, b));
            }
        }
    }

    /// The number of leaves in this subtree. At least 1, at most `2^max_depth`.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            PartitionNode::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
            PartitionNode::Leaf { .. } => 1,
        }
    }

    /// The number of internal nodes in this subtree,
    /// which is also the number of dropped pivot points.
    #[must_use]
    pub fn internal_count(&self) -> usize {
        match self {
            PartitionNode::Internal { left, right, .. } => {
                1 + left.internal_count() + right.internal_count()
            }
            PartitionNode::Leaf { .. } => 0,
        }
    }

    /// The total number of points stored across this subtree's leaves.
    #[must_use]
    pub fn point_count(&self) -> usize {
        match self {
            PartitionNode::Internal { left, right, .. } => {
                left.point_count() + right.point_count()
            }
            PartitionNode::Leaf { points } => points.len(),
        }
    }

    /// The height of this subtree: 0 for a leaf.
    #[must_use]
    pub fn depth(&self) -> u32 {
        match self {
            PartitionNode::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
            PartitionNode::Leaf { .. } => 0,
        }
    }
}

/// Computes a color palette for the given points with at most
/// `size` entries, using the given split strategy.
///
/// The tree is built at depth `ceil(log2(size))` and its leaves averaged,
/// so the palette has at most the next power of two at or above `size`
/// colors, and possibly fewer for small or clustered inputs.
///
/// # Errors
/// Returns [`Error::EmptyInput`] if `points` is empty.
///
/// # Examples
/// ```
/// # use mediancut::{palette, PointSet, PaletteSize, TreeVariant};
/// # fn main() -> Result<(), mediancut::Error> {
/// let points = PointSet::new(vec![[0, 0, 0], [10, 0, 0], [20, 0, 0]]);
/// let size = PaletteSize::try_from(2)?;
/// let palette = palette(points, size, TreeVariant::Standard)?;
/// assert_eq!(palette.len(), 2);
/// # Ok(())
/// # }
/// ```
pub fn palette(
    points: PointSet,
    size: PaletteSize,
    variant: TreeVariant,
) -> Result<Vec<Srgb<u8>>, Error> {
    let tree = PartitionNode::build_variant(points, size.max_depth(), variant)?;
    Ok(tree.average_leaves())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    fn build(points: &[Point], max_depth: u32) -> PartitionNode {
        PartitionNode::build(PointSet::new(points.to_vec()), max_depth).unwrap()
    }

    #[test]
    fn empty_input() {
        assert_eq!(
            PartitionNode::build(PointSet::default(), 4),
            Err(Error::EmptyInput),
        );
        assert_eq!(
            PartitionNode::build_modified(PointSet::default(), 4),
            Err(Error::EmptyInput),
        );
    }

    #[test]
    fn single_point_is_a_leaf() {
        let tree = build(&[[1, 2, 3]], 8);
        assert_eq!(tree, PartitionNode::Leaf { points: vec![[1, 2, 3]] });
    }

    #[test]
    fn zero_depth_is_a_leaf() {
        let tree = build(&[[0, 0, 0], [255, 255, 255]], 0);
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.point_count(), 2);
    }

    #[test]
    fn three_point_red_ramp() {
        // Range 20 on R and 0 elsewhere, so the cut is on axis 0 at the
        // median [10, 0, 0], which survives in neither leaf.
        let tree = build(&[[0, 0, 0], [10, 0, 0], [20, 0, 0]], 1);

        match &tree {
            PartitionNode::Internal { axis, pivot, left, right } => {
                assert_eq!(*axis, 0);
                assert_eq!(*pivot, [10, 0, 0]);
                assert_eq!(**left, PartitionNode::Leaf { points: vec![[0, 0, 0]] });
                assert_eq!(**right, PartitionNode::Leaf { points: vec![[20, 0, 0]] });
            }
            PartitionNode::Leaf { .. } => panic!("expected an internal root"),
        }

        let palette = tree.average_leaves();
        assert_eq!(palette, vec![srgb(0, 0, 0), srgb(20, 0, 0)]);
    }

    #[test]
    fn first_axis_wins_range_ties() {
        // Equal spread on all three channels.
        let tree = build(&[[0, 0, 0], [10, 10, 10], [20, 20, 20]], 1);
        match tree {
            PartitionNode::Internal { axis, .. } => assert_eq!(axis, 0),
            PartitionNode::Leaf { .. } => panic!("expected an internal root"),
        }
    }

    #[test]
    fn axis_ignores_narrower_channels() {
        let tree = build(&[[0, 0, 0], [1, 30, 2], [2, 60, 4]], 1);
        match tree {
            PartitionNode::Internal { axis, pivot, .. } => {
                assert_eq!(axis, 1);
                assert_eq!(pivot, [1, 30, 2]);
            }
            PartitionNode::Leaf { .. } => panic!("expected an internal root"),
        }
    }

    #[test]
    fn two_points_collapse_to_a_leaf() {
        // A median cut of two points would leave an empty right subtree;
        // the guard keeps them in one bucket instead.
        let tree = build(&[[0, 0, 0], [100, 0, 0]], 4);
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.point_count(), 2);
    }

    #[test]
    fn pivot_conservation() {
        for n in [3, 10, 100, 1024] {
            for max_depth in [1, 2, 4, 8] {
                let points = test_points(n);
                let tree = build(&points, max_depth);

                let leaves = tree.leaf_count();
                let internal = tree.internal_count();
                assert_eq!(internal, leaves - 1);
                assert_eq!(tree.point_count(), n - internal, "n = {n}, depth = {max_depth}");
            }
        }
    }

    #[test]
    fn leaf_and_depth_bounds() {
        for max_depth in 0..=8 {
            let points = test_points(1024);
            let tree = build(&points, max_depth);
            assert!(tree.leaf_count() <= 1 << max_depth);
            assert!(tree.leaf_count() <= points.len());
            assert!(tree.depth() <= max_depth);

            let modified =
                PartitionNode::build_modified(PointSet::new(points), max_depth).unwrap();
            assert!(modified.leaf_count() <= 1 << max_depth);
            assert!(modified.depth() <= max_depth);
        }
    }

    #[test]
    fn palettes_are_deterministic() {
        let points = test_points(2048);

        for variant in [TreeVariant::Standard, TreeVariant::Modified] {
            let size = PaletteSize::try_from(16).unwrap();
            let a = palette(PointSet::new(points.clone()), size, variant).unwrap();
            let b = palette(PointSet::new(points.clone()), size, variant).unwrap();
            assert_eq!(a, b, "{variant:?}");
            assert!(!a.is_empty() && a.len() <= 16);
        }
    }

    #[test]
    fn duplicate_values_keep_stable_order() {
        // Two points tie on the R sort key; the stable sort must keep their
        // input order, pinning which of them becomes the pivot.
        let points = vec![[0, 1, 0], [5, 3, 0], [5, 2, 0], [9, 4, 0]];
        let tree = build(&points, 1);
        match tree {
            PartitionNode::Internal { axis, pivot, .. } => {
                assert_eq!(axis, 0);
                assert_eq!(pivot, [5, 2, 0]);
            }
            PartitionNode::Leaf { .. } => panic!("expected an internal root"),
        }
    }

    #[test]
    fn modified_cut_shifts_right_past_dense_low_end() {
        // Mass clusters at the low end: the right mean (~50.7) sits further
        // from the median value (2) than the left mean (0.5), so the cut
        // moves to 3 * median / 2 = 3.
        // Sorted points: [0], [1], [2], [50], [100] with median index 2.
        let points = vec![[0, 0, 0], [1, 0, 0], [2, 0, 0], [50, 0, 0], [100, 0, 0]];
        let tree = PartitionNode::build_modified(PointSet::new(points), 1).unwrap();

        match &tree {
            PartitionNode::Internal { axis, pivot, left, right } => {
                assert_eq!(*axis, 0);
                // The pivot is still the median point even though the cut moved.
                assert_eq!(*pivot, [2, 0, 0]);
                assert_eq!(
                    **left,
                    PartitionNode::Leaf {
                        points: vec![[0, 0, 0], [1, 0, 0], [2, 0, 0]]
                    },
                );
                assert_eq!(**right, PartitionNode::Leaf { points: vec![[100, 0, 0]] });
            }
            PartitionNode::Leaf { .. } => panic!("expected an internal root"),
        }

        // The point at the cut index, [50, 0, 0], survives in neither subtree.
        assert_eq!(tree.point_count(), 4);
    }

    #[test]
    fn modified_cut_shifts_left_past_dense_high_end() {
        // Mass clusters at the high end: the left mean (25) is the outlier
        // relative to the median value (98), so the cut moves to
        // median / 2 = 1 and [50, 0, 0] is dropped at the cut.
        let points = vec![[0, 0, 0], [50, 0, 0], [98, 0, 0], [99, 0, 0], [100, 0, 0]];
        let tree = PartitionNode::build_modified(PointSet::new(points), 1).unwrap();

        match &tree {
            PartitionNode::Internal { pivot, left, right, .. } => {
                assert_eq!(*pivot, [98, 0, 0]);
                assert_eq!(**left, PartitionNode::Leaf { points: vec![[0, 0, 0]] });
                assert_eq!(
                    **right,
                    PartitionNode::Leaf {
                        points: vec![[98, 0, 0], [99, 0, 0], [100, 0, 0]]
                    },
                );
            }
            PartitionNode::Leaf { .. } => panic!("expected an internal root"),
        }

        assert_eq!(tree.point_count(), 4);
    }

    #[test]
    fn averages_use_floor_division() {
        // Sums 0 + 1 + 3 = 4 over 3 points: floor(4 / 3) = 1.
        let tree = build(&[[0, 1, 2], [1, 1, 2], [3, 1, 2]], 0);
        assert_eq!(tree.average_leaves(), vec![srgb(1, 1, 2)]);
    }

    #[test]
    fn palette_respects_size_depth() {
        let points = test_points(4096);
        let size = PaletteSize::try_from(5).unwrap();
        assert_eq!(size.max_depth(), 3);

        let colors = palette(PointSet::new(points), size, TreeVariant::Standard).unwrap();
        assert!(colors.len() <= 8);
    }

    #[cfg(feature = "threads")]
    #[test]
    fn parallel_build_matches_sequential() {
        // Enough points to cross the parallel cutoff.
        let points = test_points(1 << 13);

        let first = PartitionNode::build(PointSet::new(points.clone()), 6).unwrap();
        let second = PartitionNode::build(PointSet::new(points), 6).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.average_leaves(), second.average_leaves());
    }
}
