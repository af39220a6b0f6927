//! bioartbot-pipeline: pure print-order planning for bacterial bio-art (sans-IO).
//!
//! Turns submitted pixel art into ordered dispense coordinates on a
//! plate:
//! geometry mapping -> spatial partitioning -> drying-aware tour ->
//! color-major print plan.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! artworks and returns structured data. Reading job files, rendering
//! previews and writing robot procedures live in other crates.

pub mod diagnostics;
pub mod geometry;
pub mod job;
pub mod partition;
pub mod plan;
pub mod tour;
pub mod types;

pub use geometry::{PlateSpacing, compute_plate_spacing, map_pixel_to_point};
pub use job::{ColorCatalog, Labware, PrintJob, PrintJobRequest, assemble_print_job};
pub use partition::partition;
pub use plan::build_print_plan;
pub use tour::{ExclusionCache, Tour, TourBuilder, TourStats, order_all, order_segment};
pub use types::{
    Artwork, CanvasSize, ColorId, GeometryError, PhysicalPoint, PixelCoordinate, PixelsByColor,
    PlanConfig, PlanError, PlateGeometry, PlateShape, Segment,
};
