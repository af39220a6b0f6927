//! bioartbot-export: Pure format serializers for print plans (sans-IO).
//!
//! Currently renders SVG plate previews. The robot procedure itself is
//! produced elsewhere from the serialized print job.

pub mod svg;

pub use svg::{LAYER_COLORS, SvgMetadata, build_path_data, to_svg};
