//! Stretch, content and placeholder zones read from marker shapes inside an SVG.
//!
//! Marker shapes carry an id starting with `mapbox-`. The document goes through
//! three stages: prepare (marker ids become a private attribute, shapes become
//! paths), collapse (group transforms are pushed down and groups flattened, repeated
//! until the serialized document stops changing) and extract (marker path bounds are
//! scaled by the pixel ratio and rounded).

mod document;
mod passes;
mod path;
mod transform;

pub use document::{Element, Node, parse};
pub use path::{canonicalize_path_data, strong_round};
pub use transform::parse_transform;

use crate::error::{Result, SpriteError};
use crate::model::IconMetadata;
use tracing::debug;

/// Id prefix that marks a shape as zone metadata.
pub const MARKER_PREFIX: &str = "mapbox-";
/// Private attribute the marker name is moved into during preparation.
pub const MARKER_ATTR: &str = "sprite:marker";
/// Collapse passes allowed before the rewrite is declared non-terminating.
pub const MAX_COLLAPSE_PASSES: usize = 32;
/// Decimals kept by [`strong_round`] for extracted coordinates.
pub const ZONE_PRECISION: u32 = 3;

/// What a marker shape's bounding box stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `content`: area reserved for overlaid content.
    Content,
    /// `text-placeholder`
    Placeholder,
    /// `stretch`: one horizontal and one vertical stretch zone.
    Stretch,
    /// `stretch-x*`
    StretchX,
    /// `stretch-y*`
    StretchY,
}

impl Marker {
    /// Classifies a marker name with the id prefix already removed.
    pub fn classify(name: &str) -> Option<Self> {
        if name.starts_with("stretch-x") {
            Some(Marker::StretchX)
        } else if name.starts_with("stretch-y") {
            Some(Marker::StretchY)
        } else {
            match name {
                "stretch" => Some(Marker::Stretch),
                "content" => Some(Marker::Content),
                "text-placeholder" => Some(Marker::Placeholder),
                _ => None,
            }
        }
    }

    fn record(self, metadata: &mut IconMetadata, [left, top, right, bottom]: [f64; 4]) {
        match self {
            Marker::Content => metadata.content = Some([left, top, right, bottom]),
            Marker::Placeholder => metadata.placeholder = Some([left, top, right, bottom]),
            Marker::Stretch => {
                metadata.stretch_x.push([left, right]);
                metadata.stretch_y.push([top, bottom]);
            }
            Marker::StretchX => metadata.stretch_x.push([left, right]),
            Marker::StretchY => metadata.stretch_y.push([top, bottom]),
        }
    }
}

/// Cheap check used to skip parsing icons without any marker.
pub fn has_markers(svg: &[u8]) -> bool {
    svg.windows(MARKER_PREFIX.len())
        .any(|w| w == MARKER_PREFIX.as_bytes())
}

/// Runs collapse passes until two consecutive serializations match.
///
/// Returns the number of passes it took.
pub fn collapse_to_fixpoint(root: &mut Element) -> Result<usize> {
    let mut previous = root.serialize();
    for pass in 1..=MAX_COLLAPSE_PASSES {
        passes::collapse_pass(root);
        let current = root.serialize();
        if current == previous {
            return Ok(pass);
        }
        previous = current;
    }
    Err(SpriteError::NoFixpoint {
        passes: MAX_COLLAPSE_PASSES,
    })
}

/// Prepares a parsed document: marker ids move into [`MARKER_ATTR`], other
/// unreferenced ids are dropped and basic shapes become paths.
pub fn prepare(root: &mut Element) {
    passes::rename_markers(root);
    passes::shapes_to_paths(root);
}

/// Extracts zones from an SVG document, in destination pixels.
///
/// Coordinates are multiplied by `pixel_ratio` (non-finite or non-positive
/// ratios count as 1) and rounded with [`strong_round`]. Stretch zones come
/// back sorted by their first coordinate. Marker paths with unusable path
/// data are skipped.
pub fn extract_metadata(svg: &[u8], pixel_ratio: f64) -> Result<IconMetadata> {
    let ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
        pixel_ratio
    } else {
        1.0
    };

    let mut root = parse(svg)?;
    prepare(&mut root);
    let pass_count = collapse_to_fixpoint(&mut root)?;
    debug!(passes = pass_count, "svg collapsed");
    passes::strip_marker_presentation(&mut root);

    let mut metadata = IconMetadata::default();
    for marker_path in passes::marker_paths(&root) {
        let Some(marker) = Marker::classify(marker_path.marker) else {
            continue;
        };
        let Some(bounds) = path::parse_path(marker_path.d, marker_path.transform)
            .as_ref()
            .and_then(path::path_bounds)
        else {
            debug!(marker = marker_path.marker, "skipping marker with unusable path data");
            continue;
        };
        let scaled = [bounds.x0, bounds.y0, bounds.x1, bounds.y1]
            .map(|v| strong_round(v * ratio, ZONE_PRECISION));
        marker.record(&mut metadata, scaled);
    }

    metadata.stretch_x.sort_by(|a, b| a[0].total_cmp(&b[0]));
    metadata.stretch_y.sort_by(|a, b| a[0].total_cmp(&b[0]));
    Ok(metadata)
}
