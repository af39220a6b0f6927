//! Print-order optimization: a drying-aware nearest-neighbor tour.
//!
//! Dispensing a drop right next to one that is still wet smears both.
//! Each segment is ordered greedily: from the current point, go to the
//! nearest remaining point that is
//!
//! - at least `min_gap` away from the current point, and
//! - at least `min_gap` away from every point in the exclusion cache
//!   (the last few dispenses).
//!
//! Distances are rounded to a fixed number of decimals before they are
//! compared against `min_gap`; the gap itself is used as given. When no
//! point qualifies, the nearest remaining point is taken
//! regardless of the gap. The cache is not cleared by that fallback.
//!
//! Large point sets are first split by [`partition_with`](crate::partition::partition_with)
//! and each segment is ordered on its own; segment tours are simply
//! concatenated.

use std::collections::VecDeque;

use crate::partition::partition_with;
use crate::types::{PhysicalPoint, PlanConfig, Segment};

/// Order one segment with the default cache size and rounding.
///
/// Starts from the first point of `segment`.
#[must_use = "returns the ordered points"]
pub fn order_segment(segment: Segment, min_gap: f64) -> Vec<PhysicalPoint> {
    TourBuilder::new(min_gap).order_segment(segment).points
}

/// Partition `points` and order every segment with default settings.
#[must_use = "returns the ordered points"]
pub fn order_all(points: Vec<PhysicalPoint>, min_gap: f64) -> Vec<PhysicalPoint> {
    TourBuilder::new(min_gap).order_all(points).points
}

/// Bounded FIFO of recently dispensed points.
#[derive(Debug, Clone)]
pub struct ExclusionCache {
    points: VecDeque<PhysicalPoint>,
    capacity: usize,
}

impl ExclusionCache {
    /// Create an empty cache holding at most `capacity` points.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::new(),
            capacity,
        }
    }

    /// Record a dispensed point, evicting the oldest beyond capacity.
    pub fn push(&mut self, point: PhysicalPoint) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// Number of cached points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Cached points, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &PhysicalPoint> {
        self.points.iter()
    }

    /// Returns `true` if `candidate` lies within `min_gap` of any cached
    /// point (distances rounded to `decimals` places).
    #[must_use]
    pub fn blocks(&self, candidate: PhysicalPoint, min_gap: f64, decimals: u8) -> bool {
        self.points
            .iter()
            .any(|&cached| round_to(cached.distance(candidate), decimals) < min_gap)
    }
}

/// Counters collected while building a tour.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TourStats {
    /// Number of independently ordered segments.
    pub segments: usize,
    /// Steps where no candidate satisfied the gap constraints.
    pub fallbacks: usize,
    /// Total travel distance within segments (normalized units).
    pub travel: f64,
}

impl TourStats {
    fn absorb(&mut self, other: Self) {
        self.segments += other.segments;
        self.fallbacks += other.fallbacks;
        self.travel += other.travel;
    }
}

/// An ordered dispense sequence and how it was built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tour {
    /// Points in visiting order.
    pub points: Vec<PhysicalPoint>,
    /// Construction counters.
    pub stats: TourStats,
}

/// Builds drying-aware tours with a fixed set of parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TourBuilder {
    min_gap: f64,
    cache_len: usize,
    decimals: u8,
    segment_threshold: usize,
    target_segments: usize,
}

impl TourBuilder {
    /// Builder with the default cache, rounding and partitioning.
    #[must_use]
    pub const fn new(min_gap: f64) -> Self {
        Self {
            min_gap,
            cache_len: PlanConfig::DEFAULT_EXCLUSION_CACHE_LEN,
            decimals: PlanConfig::DEFAULT_GAP_ROUNDING_DECIMALS,
            segment_threshold: PlanConfig::DEFAULT_SEGMENT_THRESHOLD,
            target_segments: PlanConfig::DEFAULT_TARGET_SEGMENTS,
        }
    }

    /// Builder taking everything except the gap from `config`.
    ///
    /// `min_gap` is in normalized units; see
    /// [`PlateSpacing::min_gap`](crate::geometry::PlateSpacing::min_gap).
    #[must_use]
    pub const fn from_config(config: &PlanConfig, min_gap: f64) -> Self {
        Self {
            min_gap,
            cache_len: config.exclusion_cache_len,
            decimals: config.gap_rounding_decimals,
            segment_threshold: config.segment_threshold,
            target_segments: config.target_segments,
        }
    }

    /// The gap this builder enforces, in normalized units.
    #[must_use]
    pub const fn min_gap(&self) -> f64 {
        self.min_gap
    }

    /// Rounding precision used for gap comparisons.
    #[must_use]
    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Partition `points` and order each segment, concatenating results.
    #[must_use = "returns the ordered tour"]
    pub fn order_all(&self, points: Vec<PhysicalPoint>) -> Tour {
        let total = points.len();
        let segments = partition_with(points, self.segment_threshold, self.target_segments);
        tracing::debug!(points = total, segments = segments.len(), "partitioned points");

        let mut tour = Tour {
            points: Vec::with_capacity(total),
            stats: TourStats::default(),
        };
        for segment in segments {
            let part = self.order_segment(segment);
            tour.points.extend(part.points);
            tour.stats.absorb(part.stats);
        }
        tour
    }

    /// Order one segment, starting from its first point.
    ///
    /// The start point does not enter the exclusion cache; every later
    /// pick does. An empty segment yields an empty tour.
    #[must_use = "returns the ordered tour"]
    pub fn order_segment(&self, segment: Segment) -> Tour {
        let mut pool = segment.into_points();
        if pool.is_empty() {
            return Tour::default();
        }

        let mut current = pool.remove(0);
        let mut points = Vec::with_capacity(pool.len() + 1);
        points.push(current);

        let mut cache = ExclusionCache::new(self.cache_len);
        let mut stats = TourStats {
            segments: 1,
            ..TourStats::default()
        };

        while let Some((index, fell_back)) = self.select_next(current, &pool, &cache) {
            if fell_back {
                stats.fallbacks += 1;
                tracing::trace!(
                    remaining = pool.len(),
                    "no point clears the gap, taking nearest"
                );
            }
            // `remove` keeps pool order, which decides ties.
            let chosen = pool.remove(index);
            cache.push(chosen);
            stats.travel += current.distance(chosen);
            points.push(chosen);
            current = chosen;
        }

        Tour { points, stats }
    }

    /// Pick the index of the next point, and whether the fallback was used.
    ///
    /// Returns `None` only when `pool` is empty.
    fn select_next(
        &self,
        current: PhysicalPoint,
        pool: &[PhysicalPoint],
        cache: &ExclusionCache,
    ) -> Option<(usize, bool)> {
        let constrained = nearest_index(current, pool, |distance, candidate| {
            round_to(distance, self.decimals) >= self.min_gap
                && !cache.blocks(candidate, self.min_gap, self.decimals)
        });
        constrained
            .map(|index| (index, false))
            .or_else(|| nearest_index(current, pool, |_, _| true).map(|index| (index, true)))
    }
}

/// Index of the accepted point nearest to `from`; the first one wins ties.
fn nearest_index(
    from: PhysicalPoint,
    pool: &[PhysicalPoint],
    accept: impl Fn(f64, PhysicalPoint) -> bool,
) -> Option<usize> {
    let mut best = None;
    let mut best_dist = f64::INFINITY;
    for (index, &candidate) in pool.iter().enumerate() {
        let distance = from.distance(candidate);
        if distance < best_dist && accept(distance, candidate) {
            best_dist = distance;
            best = Some(index);
        }
    }
    best
}

/// Round `value` to `decimals` decimal places (half away from zero).
#[must_use]
pub fn round_to(value: f64, decimals: u8) -> f64 {
    let factor = 10_f64.powi(i32::from(decimals));
    (value * factor).round() / factor
}

/// Count consecutive pairs in `points` closer than `min_gap`.
///
/// Uses the same rounding as tour construction. Includes pairs that
/// straddle a segment seam.
#[must_use]
pub fn count_gap_violations(points: &[PhysicalPoint], min_gap: f64, decimals: u8) -> usize {
    points
        .windows(2)
        .filter(|pair| round_to(pair[0].distance(pair[1]), decimals) < min_gap)
        .count()
}
