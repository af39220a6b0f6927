//! Plan diagnostics: timing and tour metrics per artwork and color.
//!
//! Collected alongside the plan by [`build_print_plan_with_diagnostics`].
//! The planner never reads the wall clock itself; callers pass a
//! [`Clock`] so the core stays deterministic and platform-agnostic.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::job::{PrintJob, PrintJobRequest, assign_canvas_slots};
use crate::plan::{ArtworkPlanner, check_unique_slugs};
use crate::tour::count_gap_violations;
use crate::types::{Artwork, ColorId, PixelsByColor, PlanConfig, PlanError, PlateGeometry};

/// Source of timestamps for diagnostics.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Capture the current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Metrics for one (artwork, color) tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorDiagnostics {
    /// Artwork slug.
    pub slug: String,
    /// Color id.
    pub color: ColorId,
    /// Number of dispense points.
    pub point_count: usize,
    /// Number of independently ordered segments.
    pub segment_count: usize,
    /// Steps that ignored the gap because nothing qualified.
    pub fallback_count: usize,
    /// Consecutive pairs closer than the gap, seams included.
    pub gap_violations: usize,
    /// Total travel within segments, in normalized plate units.
    pub travel: f64,
    /// Minimum gap in normalized plate units.
    pub min_gap: f64,
    /// Time spent mapping and ordering this color (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

/// High-level counts across the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    /// Artworks planned.
    pub artwork_count: usize,
    /// Distinct colors across the batch.
    pub color_count: usize,
    /// Dispense points across the batch.
    pub point_count: usize,
    /// Fallback steps across the batch.
    pub fallback_count: usize,
    /// Gap violations across the batch.
    pub gap_violations: usize,
}

/// Diagnostics collected from one planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDiagnostics {
    /// One entry per (artwork, color), in planning order.
    pub colors: Vec<ColorDiagnostics>,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts.
    pub summary: PlanSummary,
}

impl PlanDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Print Plan Diagnostics\n{}", "=".repeat(60)));
        lines.push(format!(
            "Artworks: {}  |  Colors: {}  |  Points: {}",
            self.summary.artwork_count, self.summary.color_count, self.summary.point_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration)
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<20} {:<8} {:>7} {:>5} {:>9} {:>6} {:>9} {:>10}",
            "Artwork", "Color", "Points", "Segs", "Fallback", "Close", "Travel", "Duration"
        ));
        lines.push("-".repeat(80));

        for c in &self.colors {
            lines.push(format!(
                "{:<20} {:<8} {:>7} {:>5} {:>9} {:>6} {:>9.3} {:>8.3}ms",
                c.slug,
                c.color,
                c.point_count,
                c.segment_count,
                c.fallback_count,
                c.gap_violations,
                c.travel,
                duration_ms(c.duration),
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "Fallbacks: {}  |  Consecutive pairs closer than gap: {}",
            self.summary.fallback_count, self.summary.gap_violations,
        ));

        lines.join("\n")
    }
}

fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Build the print plan and collect per-color diagnostics.
///
/// Produces exactly the plan [`build_print_plan`](crate::build_print_plan)
/// would.
///
/// # Errors
///
/// Same as [`build_print_plan`](crate::build_print_plan).
pub fn build_print_plan_with_diagnostics<C: Clock>(
    artworks: &[Artwork],
    plate: &PlateGeometry,
    config: &PlanConfig,
    clock: &C,
) -> Result<(PixelsByColor, PlanDiagnostics), PlanError> {
    let run_start = clock.now();
    config.validate()?;
    check_unique_slugs(artworks)?;

    let mut plan = PixelsByColor::new();
    let mut colors = Vec::new();
    let mut summary = PlanSummary {
        artwork_count: artworks.len(),
        ..PlanSummary::default()
    };

    for artwork in artworks {
        let planner = ArtworkPlanner::new(artwork, plate, config)?;
        let builder = planner.builder();

        for (color, pixels) in &artwork.pixels {
            let start = clock.now();
            let tour = planner.order_color(pixels)?;
            let duration = clock.elapsed(&start);

            let gap_violations =
                count_gap_violations(&tour.points, builder.min_gap(), builder.decimals());
            summary.point_count += tour.points.len();
            summary.fallback_count += tour.stats.fallbacks;
            summary.gap_violations += gap_violations;

            colors.push(ColorDiagnostics {
                slug: artwork.slug.clone(),
                color: color.clone(),
                point_count: tour.points.len(),
                segment_count: tour.stats.segments,
                fallback_count: tour.stats.fallbacks,
                gap_violations,
                travel: tour.stats.travel,
                min_gap: builder.min_gap(),
                duration,
            });
            plan.entry(color.clone())
                .or_default()
                .insert(artwork.slug.clone(), tour.points);
        }
    }

    summary.color_count = plan.len();
    let diagnostics = PlanDiagnostics {
        colors,
        total_duration: clock.elapsed(&run_start),
        summary,
    };
    Ok((plan, diagnostics))
}

/// Plan a whole print run and collect diagnostics in the same pass.
///
/// The job is identical to [`assemble_print_job`](crate::assemble_print_job).
///
/// # Errors
///
/// Same as [`assemble_print_job`](crate::assemble_print_job).
pub fn assemble_print_job_with_diagnostics<C: Clock>(
    request: &PrintJobRequest,
    clock: &C,
) -> Result<(PrintJob, PlanDiagnostics), PlanError> {
    let canvas_locations = assign_canvas_slots(&request.artworks)?;
    let (pixels, diagnostics) = build_print_plan_with_diagnostics(
        &request.artworks,
        &request.plate,
        &request.config,
        clock,
    )?;
    Ok((
        PrintJob::from_plan(request, canvas_locations, pixels),
        diagnostics,
    ))
}
