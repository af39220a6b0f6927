//! Spatial partitioning: split a large point set into local segments.
//!
//! Tour construction is quadratic in the segment size, so large color
//! layers are cut into roughly square tiles first: sort by `x` and cut
//! into column strips, then sort each strip by `y` and cut it into row
//! bands. Cuts are made by count, not by coordinate, which keeps tiles
//! balanced on unevenly filled canvases.
//!
//! Segments are ordered independently. Two points at a shared tile
//! border may therefore end up adjacent in the final order even if they
//! are closer than the minimum gap.

use crate::types::{PhysicalPoint, PlanConfig, Segment};

/// Split `points` using the default threshold and segment count.
#[must_use = "returns the segments"]
pub fn partition(points: Vec<PhysicalPoint>) -> Vec<Segment> {
    partition_with(
        points,
        PlanConfig::DEFAULT_SEGMENT_THRESHOLD,
        PlanConfig::DEFAULT_TARGET_SEGMENTS,
    )
}

/// Split `points` into about `target_segments` spatially local segments.
///
/// Point sets smaller than `segment_threshold` come back as one segment
/// in their original order. An empty input yields no segments.
///
/// Otherwise the points form `floor(sqrt(target_segments))` column
/// strips of equal count (the last strip takes the remainder), each
/// split into `ceil(target_segments / strips)` row bands. Segments are
/// emitted strip by strip, bottom band first.
#[must_use = "returns the segments"]
pub fn partition_with(
    points: Vec<PhysicalPoint>,
    segment_threshold: usize,
    target_segments: usize,
) -> Vec<Segment> {
    if points.is_empty() {
        return Vec::new();
    }
    if points.len() < segment_threshold {
        return vec![Segment::new(points)];
    }

    let strips = target_segments.isqrt().max(1);
    let bands = target_segments.div_ceil(strips).max(1);
    let strip_len = (points.len() / strips).max(1);

    let mut remaining = points;
    remaining.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut segments = Vec::with_capacity(strips * bands);
    for strip_index in 0..strips {
        if remaining.is_empty() {
            break;
        }
        let mut strip = if strip_index + 1 == strips {
            std::mem::take(&mut remaining)
        } else {
            let rest = remaining.split_off(strip_len.min(remaining.len()));
            std::mem::replace(&mut remaining, rest)
        };

        strip.sort_by(|a, b| a.y.total_cmp(&b.y));
        let band_len = strip.len().div_ceil(bands).max(1);
        segments.extend(strip.chunks(band_len).map(|band| Segment::new(band.to_vec())));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic scatter of `n` distinct points over the unit square.
    fn scatter(n: usize) -> Vec<PhysicalPoint> {
        (0..n)
            .map(|i| {
                let i = u32::try_from(i).unwrap_or(u32::MAX);
                // Two co-prime strides give a well-mixed, repeatable layout.
                let x = f64::from((i * 37) % 101) / 100.0;
                let y = f64::from((i * 61) % 97) / 96.0;
                PhysicalPoint::new(x, y, 0.0)
            })
            .collect()
    }

    fn sorted_keys(points: &[PhysicalPoint]) -> Vec<(u64, u64)> {
        let mut keys: Vec<(u64, u64)> = points
            .iter()
            .map(|p| (p.x.to_bits(), p.y.to_bits()))
            .collect();
        keys.sort_unstable();
        keys
    }

    #[test]
    fn empty_input_yields_no_segments() {
        assert!(partition(Vec::new()).is_empty());
    }

    #[test]
    fn fifty_nine_points_stay_one_segment_in_order() {
        let points = scatter(59);
        let segments = partition(points.clone());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].points(), points.as_slice());
    }

    #[test]
    fn sixty_points_are_split() {
        let segments = partition(scatter(60));
        assert!(segments.len() > 1);
        // 4 strips of 15 points, 5 bands of 3 points each.
        assert_eq!(segments.len(), 20);
        assert!(segments.iter().all(|s| s.len() == 3));
    }

    #[test]
    fn last_strip_absorbs_remainder() {
        // 63 / 4 = 15 -> strips of 15, 15, 15, 18.
        let segments = partition(scatter(63));
        let sizes: Vec<usize> = segments.iter().map(Segment::len).collect();
        assert_eq!(sizes.len(), 20);
        assert_eq!(&sizes[15..], &[4, 4, 4, 4, 2]);
        assert_eq!(sizes.iter().sum::<usize>(), 63);
    }

    #[test]
    fn partition_preserves_point_set() {
        for n in [60, 61, 97, 250, 1000] {
            let points = scatter(n);
            let segments = partition(points.clone());
            let flattened: Vec<PhysicalPoint> =
                segments.into_iter().flat_map(Segment::into_points).collect();
            assert_eq!(flattened.len(), n);
            assert_eq!(sorted_keys(&flattened), sorted_keys(&points), "n={n}");
        }
    }

    #[test]
    fn strips_do_not_overlap_in_x() {
        let segments = partition(scatter(200));
        // Segments come strip by strip, five bands per strip.
        let strip_bounds: Vec<(f64, f64)> = segments
            .chunks(5)
            .map(|strip| {
                let xs = strip.iter().flat_map(|s| s.points().iter().map(|p| p.x));
                xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                    (lo.min(x), hi.max(x))
                })
            })
            .collect();
        for pair in strip_bounds.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "strips overlap: {pair:?}");
        }
    }

    #[test]
    fn bands_are_sorted_by_y_within_strip() {
        let segments = partition(scatter(120));
        for strip in segments.chunks(5) {
            let ys: Vec<f64> = strip
                .iter()
                .flat_map(|s| s.points().iter().map(|p| p.y))
                .collect();
            assert!(ys.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn partition_is_deterministic() {
        let a = partition(scatter(300));
        let b = partition(scatter(300));
        assert_eq!(a, b);
    }

    #[test]
    fn custom_threshold_and_target() {
        // 9 segments -> 3 strips x 3 bands.
        let segments = partition_with(scatter(30), 10, 9);
        assert_eq!(segments.len(), 9);
        assert_eq!(partition_with(scatter(9), 10, 9).len(), 1);
    }
}
