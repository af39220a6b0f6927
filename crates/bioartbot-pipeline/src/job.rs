//! Print-job assembly: everything the robot procedure needs as data.
//!
//! Next to the ordered pixels, a procedure needs to know which labware
//! to load, which deck slot holds which artwork's plate, and a display
//! name for every color. This module gathers those into a [`PrintJob`].
//! Turning a job into a robot script is left to the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::plan::build_print_plan;
use crate::types::{Artwork, ColorId, PixelsByColor, PlanConfig, PlanError, PlateGeometry};

/// Deck slots available for canvas plates, in fill order.
pub const CANVAS_SLOTS: [&str; 9] = ["1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// Tip rack used with 300 µl pipettes.
pub const TIPRACK_300UL: &str = "opentrons_96_tiprack_300ul";

/// Tip rack used with every other pipette.
pub const TIPRACK_20UL: &str = "opentrons_96_tiprack_20ul";

/// Labware names for one print run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labware {
    /// Rack holding the bacterial color stocks.
    pub palette: String,
    /// Pipette model.
    pub pipette: String,
    /// Plate model the art is printed on.
    pub canvas: String,
}

impl Labware {
    /// Tip rack matching the pipette volume.
    #[must_use]
    pub fn tiprack(&self) -> &'static str {
        if self.pipette.contains("p300") {
            TIPRACK_300UL
        } else {
            TIPRACK_20UL
        }
    }
}

impl Default for Labware {
    fn default() -> Self {
        Self {
            palette: "cryo_35_tuberack_2000ul".to_owned(),
            pipette: "p20_single_gen2".to_owned(),
            canvas: "bioartbot_petriplate_90mm_round".to_owned(),
        }
    }
}

/// Display names of the bacterial colors, keyed by color id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorCatalog(BTreeMap<ColorId, String>);

impl ColorCatalog {
    /// Create a catalog from `(id, name)` pairs.
    pub fn new(entries: impl IntoIterator<Item = (ColorId, String)>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// Display name of `id`, if known.
    #[must_use]
    pub fn label(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    /// Labels for every color used in `plan`.
    ///
    /// Colors missing from the catalog are labelled with their id.
    #[must_use]
    pub fn labels_for(&self, plan: &PixelsByColor) -> BTreeMap<ColorId, String> {
        plan.keys()
            .map(|id| {
                let name = self.label(id).map_or_else(
                    || {
                        tracing::warn!(color = %id, "color missing from catalog");
                        id.clone()
                    },
                    str::to_owned,
                );
                (id.clone(), name)
            })
            .collect()
    }
}

/// Assign deck slots to artworks in batch order.
///
/// # Errors
///
/// Returns [`PlanError::TooManyArtworks`] if the batch does not fit on
/// the deck.
pub fn assign_canvas_slots(artworks: &[Artwork]) -> Result<BTreeMap<String, String>, PlanError> {
    if artworks.len() > CANVAS_SLOTS.len() {
        return Err(PlanError::TooManyArtworks {
            count: artworks.len(),
            slots: CANVAS_SLOTS.len(),
        });
    }
    Ok(artworks
        .iter()
        .zip(CANVAS_SLOTS)
        .map(|(artwork, slot)| (artwork.slug.clone(), slot.to_owned()))
        .collect())
}

/// Input for one print run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintJobRequest {
    /// Geometry of the canvas plate model.
    pub plate: PlateGeometry,
    /// Labware selection.
    #[serde(default)]
    pub labware: Labware,
    /// Artworks to print, in submission order.
    pub artworks: Vec<Artwork>,
    /// Color display names.
    #[serde(default)]
    pub colors: ColorCatalog,
    /// Planner tuning.
    #[serde(default)]
    pub config: PlanConfig,
}

/// Data for one robot procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintJob {
    /// Labware selection.
    pub labware: Labware,
    /// Tip rack matching the pipette.
    pub tiprack: String,
    /// Deck slot per artwork slug.
    pub canvas_locations: BTreeMap<String, String>,
    /// Ordered dispense points, color-major.
    pub pixels: PixelsByColor,
    /// Display names of the colors used.
    pub colors: BTreeMap<ColorId, String>,
}

/// Plan a whole print run.
///
/// # Errors
///
/// Returns [`PlanError::TooManyArtworks`] if the artworks do not fit on
/// the deck, or any error from [`build_print_plan`].
pub fn assemble_print_job(request: &PrintJobRequest) -> Result<PrintJob, PlanError> {
    let canvas_locations = assign_canvas_slots(&request.artworks)?;
    let pixels = build_print_plan(&request.artworks, &request.plate, &request.config)?;
    Ok(PrintJob::from_plan(request, canvas_locations, pixels))
}

impl PrintJob {
    /// Wrap an already built plan with the request's labware and labels.
    pub(crate) fn from_plan(
        request: &PrintJobRequest,
        canvas_locations: BTreeMap<String, String>,
        pixels: PixelsByColor,
    ) -> Self {
        let colors = request.colors.labels_for(&pixels);
        tracing::info!(
            artworks = request.artworks.len(),
            colors = colors.len(),
            canvas = %request.labware.canvas,
            "assembled print job"
        );
        Self {
            tiprack: request.labware.tiprack().to_owned(),
            labware: request.labware.clone(),
            canvas_locations,
            pixels,
            colors,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{CanvasSize, PixelCoordinate, PlateShape};

    fn plate() -> PlateGeometry {
        PlateGeometry {
            shape: PlateShape::Round,
            x_radius_mm: 40.0,
            y_radius_mm: 40.0,
            z_touch_position_frac: 0.1,
        }
    }

    fn artwork(slug: &str, colors: &[&str]) -> Artwork {
        Artwork {
            slug: slug.to_owned(),
            canvas_size: CanvasSize::new(4, 4),
            pixels: colors
                .iter()
                .map(|c| ((*c).to_owned(), vec![PixelCoordinate::new(1, 2)]))
                .collect(),
        }
    }

    #[test]
    fn tiprack_follows_pipette() {
        let mut labware = Labware::default();
        assert_eq!(labware.tiprack(), TIPRACK_20UL);
        labware.pipette = "p300_single_gen2".to_owned();
        assert_eq!(labware.tiprack(), TIPRACK_300UL);
    }

    #[test]
    fn slots_follow_batch_order() {
        let artworks = [artwork("zebra", &[]), artwork("apple", &[])];
        let slots = assign_canvas_slots(&artworks).unwrap();
        assert_eq!(slots["zebra"], "1");
        assert_eq!(slots["apple"], "2");
    }

    #[test]
    fn ten_artworks_do_not_fit() {
        let artworks: Vec<Artwork> = (0..10).map(|i| artwork(&format!("a{i}"), &[])).collect();
        let err = assign_canvas_slots(&artworks).unwrap_err();
        assert_eq!(
            err,
            PlanError::TooManyArtworks {
                count: 10,
                slots: 9
            }
        );
    }

    #[test]
    fn catalog_labels_only_used_colors() {
        let catalog = ColorCatalog::new([
            ("1".to_owned(), "pink".to_owned()),
            ("2".to_owned(), "teal".to_owned()),
            ("3".to_owned(), "violet".to_owned()),
        ]);
        let request = PrintJobRequest {
            plate: plate(),
            labware: Labware::default(),
            artworks: vec![artwork("a", &["1", "3"]), artwork("b", &["9"])],
            colors: catalog,
            config: PlanConfig::default(),
        };
        let job = assemble_print_job(&request).unwrap();
        assert_eq!(job.colors.len(), 3);
        assert_eq!(job.colors["1"], "pink");
        assert_eq!(job.colors["3"], "violet");
        // Unknown colors fall back to their id.
        assert_eq!(job.colors["9"], "9");
        assert!(!job.colors.contains_key("2"));
    }

    #[test]
    fn job_carries_all_parts() {
        let request = PrintJobRequest {
            plate: plate(),
            labware: Labware::default(),
            artworks: vec![artwork("a", &["1"])],
            colors: ColorCatalog::default(),
            config: PlanConfig::default(),
        };
        let job = assemble_print_job(&request).unwrap();
        assert_eq!(job.tiprack, TIPRACK_20UL);
        assert_eq!(job.canvas_locations["a"], "1");
        assert_eq!(job.pixels["1"]["a"].len(), 1);
    }

    #[test]
    fn request_parses_with_defaults() {
        let json = r#"{
            "plate": {"shape": "rectangular", "x_radius_mm": 60, "y_radius_mm": 40, "z_touch_position_frac": 0.05},
            "artworks": [
                {"slug": "dot", "canvas_size": {"x": 2, "y": 2}, "art": {"4": [[1, 1]]}}
            ],
            "colors": {"4": "orange"}
        }"#;
        let request: PrintJobRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.labware, Labware::default());
        assert_eq!(request.config, PlanConfig::default());
        assert_eq!(request.colors.label("4"), Some("orange"));

        let job = assemble_print_job(&request).unwrap();
        let point = job.pixels["4"]["dot"][0];
        assert!(point.x > 0.0 && point.y < 0.0);
    }

    #[test]
    fn job_serializes_points_as_triples() {
        let request = PrintJobRequest {
            plate: plate(),
            labware: Labware::default(),
            artworks: vec![artwork("a", &["1"])],
            colors: ColorCatalog::default(),
            config: PlanConfig::default(),
        };
        let job = assemble_print_job(&request).unwrap();
        let value = serde_json::to_value(&job).unwrap();
        let triple = &value["pixels"]["1"]["a"][0];
        assert_eq!(triple.as_array().map(Vec::len), Some(3));
        assert_eq!(value["tiprack"], TIPRACK_20UL);
    }

    #[test]
    fn too_many_artworks_fails_before_planning() {
        let artworks: Vec<Artwork> = (0..10).map(|i| artwork(&format!("a{i}"), &["1"])).collect();
        let request = PrintJobRequest {
            plate: plate(),
            labware: Labware::default(),
            artworks,
            colors: ColorCatalog::default(),
            config: PlanConfig::default(),
        };
        assert!(matches!(
            assemble_print_job(&request),
            Err(PlanError::TooManyArtworks { .. })
        ));
    }
}
