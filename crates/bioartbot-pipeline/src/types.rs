//! Shared types for the bioartbot print planner.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier of a bacterial color as stored by the submission backend.
pub type ColorId = String;

/// Final planner output: color id -> artwork slug -> ordered dispense points.
///
/// Color-major grouping lets the robot dispense one color across every
/// plate before switching to the next.
pub type PixelsByColor = BTreeMap<ColorId, BTreeMap<String, Vec<PhysicalPoint>>>;

/// A pixel position in the submitted art grid.
///
/// Serialized as `[row, col]`: row (vertical) first, column second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct PixelCoordinate {
    /// Row index, growing downward from the top edge.
    pub row: u32,
    /// Column index, growing rightward from the left edge.
    pub col: u32,
}

impl PixelCoordinate {
    /// Create a new pixel coordinate.
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl From<[u32; 2]> for PixelCoordinate {
    fn from([row, col]: [u32; 2]) -> Self {
        Self { row, col }
    }
}

impl From<PixelCoordinate> for [u32; 2] {
    fn from(coord: PixelCoordinate) -> Self {
        [coord.row, coord.col]
    }
}

/// Art grid dimensions for one artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    /// Number of columns.
    #[serde(alias = "x")]
    pub width: u32,
    /// Number of rows.
    #[serde(alias = "y")]
    pub height: u32,
}

impl CanvasSize {
    /// Create a new canvas size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if `coord` lies inside the grid.
    #[must_use]
    pub const fn contains(self, coord: PixelCoordinate) -> bool {
        coord.row < self.height && coord.col < self.width
    }
}

/// Outline of the plate the art is printed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlateShape {
    /// Petri dish: the art grid is inscribed in the plate ellipse.
    Round,
    /// Rectangular well plate: the art grid fills the shorter axis.
    Rectangular,
}

/// Physical plate descriptor supplied by the lab-object configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlateGeometry {
    /// Plate outline.
    pub shape: PlateShape,
    /// Half-width of the usable plate area in millimetres.
    pub x_radius_mm: f64,
    /// Half-height of the usable plate area in millimetres.
    pub y_radius_mm: f64,
    /// Height at which the pipette touches the agar, as a fraction of
    /// the plate depth.
    pub z_touch_position_frac: f64,
}

/// A dispense location in plate-radius-normalized coordinates.
///
/// `x` and `y` are offsets from the plate center (roughly `-1..=1`,
/// +Y up). `z` is constant per plate and never takes part in distance
/// calculations. Serialized as `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct PhysicalPoint {
    /// Horizontal offset from the plate center.
    pub x: f64,
    /// Vertical offset from the plate center.
    pub y: f64,
    /// Touch height fraction.
    pub z: f64,
}

impl PhysicalPoint {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared planar distance to another point.
    ///
    /// Plain multiply and add, not `mul_add`: tour tie-breaks and gap
    /// checks depend on the unfused rounding.
    #[must_use]
    #[allow(clippy::suboptimal_flops)]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Planar Euclidean distance to another point (`z` is ignored).
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

impl From<[f64; 3]> for PhysicalPoint {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<PhysicalPoint> for [f64; 3] {
    fn from(point: PhysicalPoint) -> Self {
        [point.x, point.y, point.z]
    }
}

/// A spatially local batch of points ordered by one independent tour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segment(Vec<PhysicalPoint>);

impl Segment {
    /// Create a segment from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<PhysicalPoint>) -> Self {
        Self(points)
    }

    /// Returns `true` if the segment has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the segment.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[PhysicalPoint] {
        &self.0
    }

    /// Consumes the segment and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<PhysicalPoint> {
        self.0
    }
}

/// One submitted artwork as handed over by the submission backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    /// Unique, URL-safe identifier of the artwork.
    pub slug: String,
    /// Grid dimensions the pixels were drawn on.
    pub canvas_size: CanvasSize,
    /// Pixels to dispense, grouped by color id.
    #[serde(alias = "art", default)]
    pub pixels: BTreeMap<ColorId, Vec<PixelCoordinate>>,
}

/// Tuning parameters for print-order planning.
///
/// Every field falls back to its `DEFAULT_*` constant when missing from
/// a serialized config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Minimum distance in millimetres between two consecutive dispenses.
    /// Closer drops smear into each other before they dry.
    pub min_gap_mm: f64,

    /// How many recently visited points block nearby candidates.
    pub exclusion_cache_len: usize,

    /// Point sets smaller than this are ordered as a single segment.
    pub segment_threshold: usize,

    /// Approximate number of spatial segments for large point sets.
    pub target_segments: usize,

    /// Distances are rounded to this many decimal places before they are
    /// compared against the minimum gap.
    pub gap_rounding_decimals: u8,
}

impl PlanConfig {
    /// Default minimum gap between consecutive dispenses (millimetres).
    pub const DEFAULT_MIN_GAP_MM: f64 = 2.0;
    /// Default exclusion cache capacity.
    pub const DEFAULT_EXCLUSION_CACHE_LEN: usize = 10;
    /// Default size below which partitioning is skipped.
    pub const DEFAULT_SEGMENT_THRESHOLD: usize = 60;
    /// Default number of spatial segments.
    pub const DEFAULT_TARGET_SEGMENTS: usize = 20;
    /// Default rounding precision for gap comparisons.
    pub const DEFAULT_GAP_ROUNDING_DECIMALS: u8 = 5;

    /// Check the config for values the planner cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidConfig`] if `min_gap_mm` is negative or
    /// not finite, or if `target_segments` is zero.
    pub fn validate(&self) -> Result<(), PlanError> {
        if !self.min_gap_mm.is_finite() || self.min_gap_mm < 0.0 {
            return Err(PlanError::InvalidConfig(format!(
                "min_gap_mm must be finite and non-negative, got {}",
                self.min_gap_mm
            )));
        }
        if self.target_segments == 0 {
            return Err(PlanError::InvalidConfig(
                "target_segments must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            min_gap_mm: Self::DEFAULT_MIN_GAP_MM,
            exclusion_cache_len: Self::DEFAULT_EXCLUSION_CACHE_LEN,
            segment_threshold: Self::DEFAULT_SEGMENT_THRESHOLD,
            target_segments: Self::DEFAULT_TARGET_SEGMENTS,
            gap_rounding_decimals: Self::DEFAULT_GAP_ROUNDING_DECIMALS,
        }
    }
}

/// Plate or canvas parameters that admit no physical layout.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// A grid needs at least two cells per axis to define a spacing.
    #[error("canvas grid must be at least 2x2, got {width}x{height}")]
    GridTooSmall {
        /// Grid width in cells.
        width: u32,
        /// Grid height in cells.
        height: u32,
    },

    /// Plate radii must be positive, finite millimetre values.
    #[error("plate radii must be positive, got x={x_radius_mm}mm y={y_radius_mm}mm")]
    NonPositiveRadius {
        /// Offending x radius.
        x_radius_mm: f64,
        /// Offending y radius.
        y_radius_mm: f64,
    },

    /// A pixel lies outside the artwork's canvas.
    #[error("pixel [{row}, {col}] lies outside the {width}x{height} canvas")]
    PixelOutOfBounds {
        /// Pixel row.
        row: u32,
        /// Pixel column.
        col: u32,
        /// Canvas width.
        width: u32,
        /// Canvas height.
        height: u32,
    },
}

/// Errors that abort building a print plan.
///
/// A failing artwork fails the whole batch; the error names the artwork
/// so the caller can pull it from the run and retry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// One artwork cannot be laid out on the plate.
    #[error("artwork `{slug}`: {source}")]
    Artwork {
        /// Slug of the offending artwork.
        slug: String,
        /// Underlying geometry problem.
        #[source]
        source: GeometryError,
    },

    /// Two artworks in one batch share a slug.
    #[error("artwork slug `{0}` appears more than once in the batch")]
    DuplicateSlug(String),

    /// More artworks than there are canvas slots on the deck.
    #[error("{count} artworks requested but only {slots} canvas slots are available")]
    TooManyArtworks {
        /// Number of artworks in the batch.
        count: usize,
        /// Number of available deck slots.
        slots: usize,
    },

    /// Planner configuration is invalid.
    #[error("invalid plan configuration: {0}")]
    InvalidConfig(String),
}
