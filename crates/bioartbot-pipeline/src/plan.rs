//! Pixel-to-order pipeline: turn a batch of artworks into a print plan.
//!
//! For every artwork the plate layout is computed once (it depends only
//! on the canvas size and the plate). Each color's pixels are then
//! mapped onto the plate and ordered. The result is grouped color-major
//! so the robot can finish one color on every plate before changing
//! tips.
//!
//! A batch either plans completely or fails with the first offending
//! artwork named; no partial plan is returned.

use std::collections::BTreeSet;

use crate::geometry::{PlateSpacing, compute_plate_spacing, map_pixels};
use crate::tour::{Tour, TourBuilder};
use crate::types::{Artwork, PixelCoordinate, PixelsByColor, PlanConfig, PlanError, PlateGeometry};

/// Per-artwork planning context: layout and tour parameters.
#[derive(Debug, Clone, Copy)]
pub struct ArtworkPlanner<'a> {
    artwork: &'a Artwork,
    plate: &'a PlateGeometry,
    layout: PlateSpacing,
    builder: TourBuilder,
}

impl<'a> ArtworkPlanner<'a> {
    /// Lay out `artwork` on `plate`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Artwork`] if the canvas or plate admit no
    /// layout.
    pub fn new(
        artwork: &'a Artwork,
        plate: &'a PlateGeometry,
        config: &PlanConfig,
    ) -> Result<Self, PlanError> {
        let layout = compute_plate_spacing(plate, artwork.canvas_size).map_err(|source| {
            PlanError::Artwork {
                slug: artwork.slug.clone(),
                source,
            }
        })?;
        let builder = TourBuilder::from_config(config, layout.min_gap(config.min_gap_mm));
        Ok(Self {
            artwork,
            plate,
            layout,
            builder,
        })
    }

    /// The artwork being planned.
    #[must_use]
    pub const fn artwork(&self) -> &'a Artwork {
        self.artwork
    }

    /// Plate layout of this artwork.
    #[must_use]
    pub const fn layout(&self) -> &PlateSpacing {
        &self.layout
    }

    /// Tour parameters, with the gap already in normalized units.
    #[must_use]
    pub const fn builder(&self) -> &TourBuilder {
        &self.builder
    }

    /// Map and order one color's pixels.
    ///
    /// An empty pixel list yields an empty tour.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Artwork`] if a pixel lies outside the canvas.
    pub fn order_color(&self, pixels: &[PixelCoordinate]) -> Result<Tour, PlanError> {
        let points = map_pixels(pixels, self.artwork.canvas_size, self.plate, &self.layout)
            .map_err(|source| PlanError::Artwork {
                slug: self.artwork.slug.clone(),
                source,
            })?;
        Ok(self.builder.order_all(points))
    }
}

/// Reject batches in which two artworks share a slug.
///
/// # Errors
///
/// Returns [`PlanError::DuplicateSlug`] naming the first repeated slug.
pub fn check_unique_slugs(artworks: &[Artwork]) -> Result<(), PlanError> {
    let mut seen = BTreeSet::new();
    for artwork in artworks {
        if !seen.insert(artwork.slug.as_str()) {
            return Err(PlanError::DuplicateSlug(artwork.slug.clone()));
        }
    }
    Ok(())
}

/// Build the color-major print plan for a batch of artworks.
///
/// Every color listed by an artwork gets an entry under that artwork's
/// slug, even when its pixel list is empty.
///
/// # Errors
///
/// Returns [`PlanError::InvalidConfig`] for an unusable `config`,
/// [`PlanError::DuplicateSlug`] if slugs repeat, and
/// [`PlanError::Artwork`] for the first artwork whose geometry is
/// invalid. On error nothing is returned for the rest of the batch.
pub fn build_print_plan(
    artworks: &[Artwork],
    plate: &PlateGeometry,
    config: &PlanConfig,
) -> Result<PixelsByColor, PlanError> {
    config.validate()?;
    check_unique_slugs(artworks)?;

    let mut plan = PixelsByColor::new();
    for artwork in artworks {
        let planner = ArtworkPlanner::new(artwork, plate, config)?;
        tracing::info!(
            slug = %artwork.slug,
            colors = artwork.pixels.len(),
            "planning artwork"
        );
        for (color, pixels) in &artwork.pixels {
            let tour = planner.order_color(pixels)?;
            tracing::debug!(
                slug = %artwork.slug,
                color = %color,
                points = tour.points.len(),
                fallbacks = tour.stats.fallbacks,
                "ordered color"
            );
            plan.entry(color.clone())
                .or_default()
                .insert(artwork.slug.clone(), tour.points);
        }
    }
    Ok(plan)
}
