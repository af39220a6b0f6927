//! SVG plate preview serializer.
//!
//! Renders one artwork of a print plan the way it will land on the
//! plate: the plate outline, a dot per dispense and, per color, a thin
//! path through the dots in dispense order. Built with the [`svg`]
//! crate for document construction, XML escaping and path data
//! formatting.
//!
//! Plate coordinates are normalized by the well radius with +Y up; the
//! document uses millimetres with +Y down and the plate center at the
//! origin of the `viewBox`.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::collections::BTreeMap;

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Ellipse, Group, Path, Rectangle, Title};
use svg::node::{Text, Value};

use bioartbot_pipeline::{ColorId, PhysicalPoint, PixelsByColor, PlateGeometry, PlateShape};

/// Stroke/fill colors assigned to plan colors in plan order.
pub const LAYER_COLORS: &[&str] = &[
    "#e6194b", // red
    "#3cb44b", // green
    "#4363d8", // blue
    "#f58231", // orange
    "#911eb4", // purple
    "#42d4f4", // cyan
    "#f032e6", // magenta
    "#9a6324", // brown
];

/// Empty border around the plate outline, in millimetres.
const MARGIN_MM: f64 = 2.0;
/// Radius of a dispense dot, in millimetres.
const DOT_RADIUS_MM: f64 = 0.8;

/// Metadata to embed in the SVG document.
///
/// All fields are optional. `title` and `description` become the
/// standard `<title>` and `<desc>` accessibility elements; labels give
/// every color layer a `<title>` with its display name.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, typically the artwork slug.
    pub title: Option<&'a str>,
    /// Document description, typically the labware and planner config.
    pub description: Option<&'a str>,
    /// Display names per color id.
    pub color_labels: Option<&'a BTreeMap<ColorId, String>>,
}

/// Convert a normalized plate point to document millimetres.
fn to_document(point: PhysicalPoint, well_radius: f64) -> (f64, f64) {
    // `0.0 - y` rather than `-y` so the origin prints as `0`, not `-0`.
    (point.x * well_radius, (0.0 - point.y) * well_radius)
}

/// Build an SVG path `d` attribute tracing `points` in order.
///
/// Uses `M` for the first point and `L` for subsequent points.
/// Returns an empty string for fewer than 2 points.
///
/// # Examples
///
/// ```
/// use bioartbot_pipeline::PhysicalPoint;
/// use bioartbot_export::build_path_data;
///
/// let points = [
///     PhysicalPoint::new(0.0, 0.0, 0.1),
///     PhysicalPoint::new(0.5, -0.5, 0.1),
/// ];
/// assert_eq!(build_path_data(&points, 40.0), "M0,0 L20,20");
/// ```
#[must_use]
pub fn build_path_data(points: &[PhysicalPoint], well_radius: f64) -> String {
    let Some((first, rest)) = points.split_first() else {
        return String::new();
    };
    if rest.is_empty() {
        return String::new();
    }

    let mut data = Data::new().move_to(to_document(*first, well_radius));
    for &p in rest {
        data = data.line_to(to_document(p, well_radius));
    }
    String::from(Value::from(data))
}

/// Plate outline element centered on the origin.
fn plate_outline(plate: &PlateGeometry) -> Group {
    let group = Group::new()
        .set("id", "plate")
        .set("fill", "#fdf6e3")
        .set("stroke", "#888888")
        .set("stroke-width", 0.5);
    match plate.shape {
        PlateShape::Round => group.add(
            Ellipse::new()
                .set("cx", 0)
                .set("cy", 0)
                .set("rx", plate.x_radius_mm)
                .set("ry", plate.y_radius_mm),
        ),
        PlateShape::Rectangular => group.add(
            Rectangle::new()
                .set("x", -plate.x_radius_mm)
                .set("y", -plate.y_radius_mm)
                .set("width", 2.0 * plate.x_radius_mm)
                .set("height", 2.0 * plate.y_radius_mm),
        ),
    }
}

/// Render the preview of artwork `slug` from `plan`.
///
/// Each color of the plan that has points for `slug` becomes a
/// `<g class="color-layer">` holding its dispense path and dots. Layer
/// colors are picked from [`LAYER_COLORS`] by the color's position in
/// the plan, so one color looks the same on every plate of a run.
#[must_use]
pub fn to_svg(
    plan: &PixelsByColor,
    slug: &str,
    plate: &PlateGeometry,
    metadata: &SvgMetadata<'_>,
) -> String {
    let width = 2.0 * (plate.x_radius_mm + MARGIN_MM);
    let height = 2.0 * (plate.y_radius_mm + MARGIN_MM);
    let well_radius = plate.x_radius_mm.min(plate.y_radius_mm);

    let mut doc = Document::new()
        .set("width", format!("{width}mm"))
        .set("height", format!("{height}mm"))
        .set("viewBox", (-width / 2.0, -height / 2.0, width, height))
        .set("preserveAspectRatio", "xMidYMid meet");

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    doc = doc.add(plate_outline(plate));

    for (index, (color, artworks)) in plan.iter().enumerate() {
        let Some(points) = artworks.get(slug) else {
            continue;
        };
        if points.is_empty() {
            continue;
        }
        let fill = LAYER_COLORS[index % LAYER_COLORS.len()];

        let mut layer = Group::new()
            .set("class", "color-layer")
            .set("data-color", color.as_str())
            .set("fill", fill)
            .set("stroke", fill);
        if let Some(label) = metadata.color_labels.and_then(|labels| labels.get(color)) {
            layer = layer.add(Title::new(label.as_str()));
        }

        let d = build_path_data(points, well_radius);
        if !d.is_empty() {
            layer = layer.add(
                Path::new()
                    .set("d", d)
                    .set("fill", "none")
                    .set("stroke-width", 0.2)
                    .set("opacity", 0.5),
            );
        }
        for (order, &point) in points.iter().enumerate() {
            let (cx, cy) = to_document(point, well_radius);
            layer = layer.add(
                Circle::new()
                    .set("cx", cx)
                    .set("cy", cy)
                    .set("r", DOT_RADIUS_MM)
                    .set("stroke", "none")
                    .set("data-order", order.to_string()),
            );
        }
        doc = doc.add(layer);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
