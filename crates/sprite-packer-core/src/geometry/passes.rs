//! Structural rewrites applied to a parsed SVG before zones are read.

use super::document::{Element, Node};
use super::path::parse_path;
use super::transform::{format_matrix, is_identity, is_translation, parse_numbers, parse_transform};
use super::{MARKER_ATTR, MARKER_PREFIX};
use kurbo::Affine;
use std::collections::HashSet;

/// Attributes that block moving a group transform onto its children.
const CLIPPING_ATTRS: &[&str] = &["clip-path", "mask", "filter"];

/// Presentation attributes dropped from marker paths before their bounds are read.
const PRESENTATION_ATTRS: &[&str] = &[
    "style",
    "class",
    "fill",
    "fill-opacity",
    "fill-rule",
    "opacity",
    "stroke",
    "stroke-width",
    "stroke-opacity",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-dasharray",
    "stroke-dashoffset",
    "vector-effect",
];

// ---------------------------------------------------------------------------
// Prepare
// ---------------------------------------------------------------------------

fn referenced_ids(root: &Element) -> HashSet<String> {
    let mut ids = HashSet::new();
    root.walk(&mut |el: &Element| {
        for (key, value) in &el.attrs {
            if (key == "href" || key == "xlink:href") && value.starts_with('#') {
                ids.insert(value[1..].to_string());
            }
            let mut rest = value.as_str();
            while let Some(start) = rest.find("url(#") {
                let tail = &rest[start + 5..];
                let Some(end) = tail.find(')') else { break };
                ids.insert(tail[..end].trim().to_string());
                rest = &tail[end..];
            }
        }
    });
    ids
}

/// Drops unreferenced ids and moves marker ids into the private marker attribute.
pub fn rename_markers(root: &mut Element) {
    let keep = referenced_ids(root);
    root.walk_mut(&mut |el: &mut Element| {
        let Some(id) = el.attr("id").map(str::to_string) else {
            return;
        };
        if let Some(marker) = id.strip_prefix(MARKER_PREFIX) {
            el.remove_attr("id");
            el.set_attr(MARKER_ATTR, marker);
        } else if !keep.contains(&id) {
            el.remove_attr("id");
        }
    });
}

const RECT_ATTRS: &[&str] = &["x", "y", "width", "height"];
const LINE_ATTRS: &[&str] = &["x1", "y1", "x2", "y2"];
const POLY_ATTRS: &[&str] = &["points"];
const CIRCLE_ATTRS: &[&str] = &["cx", "cy", "r"];
const ELLIPSE_ATTRS: &[&str] = &["cx", "cy", "rx", "ry"];

fn number_attr(el: &Element, key: &str) -> Option<f64> {
    match el.attr(key) {
        None => Some(0.0),
        Some(v) => v.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

fn shape_path_data(el: &Element) -> Option<(String, &'static [&'static str])> {
    match el.name.as_str() {
        "rect" => {
            // Rounded corners stay a rect.
            if el.has_attr("rx") || el.has_attr("ry") {
                return None;
            }
            let (x, y) = (number_attr(el, "x")?, number_attr(el, "y")?);
            let (w, h) = (number_attr(el, "width")?, number_attr(el, "height")?);
            if w <= 0.0 || h <= 0.0 {
                return None;
            }
            let d = format!("M{} {}H{}V{}H{}z", x, y, x + w, y + h, x);
            Some((d, RECT_ATTRS))
        }
        "line" => {
            let (x1, y1) = (number_attr(el, "x1")?, number_attr(el, "y1")?);
            let (x2, y2) = (number_attr(el, "x2")?, number_attr(el, "y2")?);
            let d = format!("M{} {}L{} {}", x1, y1, x2, y2);
            Some((d, LINE_ATTRS))
        }
        "polyline" | "polygon" => {
            let coords = parse_numbers(el.attr("points")?)?;
            if coords.len() < 4 {
                return None;
            }
            let mut d = String::new();
            for (i, pair) in coords.chunks_exact(2).enumerate() {
                d.push(if i == 0 { 'M' } else { 'L' });
                d.push_str(&format!("{} {}", pair[0], pair[1]));
            }
            if el.is("polygon") {
                d.push('z');
            }
            Some((d, POLY_ATTRS))
        }
        "circle" | "ellipse" => {
            let (cx, cy) = (number_attr(el, "cx")?, number_attr(el, "cy")?);
            let (rx, ry) = if el.is("circle") {
                let r = number_attr(el, "r")?;
                (r, r)
            } else {
                (number_attr(el, "rx")?, number_attr(el, "ry")?)
            };
            if rx <= 0.0 || ry <= 0.0 {
                return None;
            }
            let d = format!(
                "M{cx} {top}A{rx} {ry} 0 1 0 {cx} {bottom}A{rx} {ry} 0 1 0 {cx} {top}z",
                top = cy - ry,
                bottom = cy + ry,
            );
            let consumed = if el.is("circle") {
                CIRCLE_ATTRS
            } else {
                ELLIPSE_ATTRS
            };
            Some((d, consumed))
        }
        _ => None,
    }
}

/// Rewrites basic shapes into `path` elements. Shapes with a missing or
/// non-positive size are left as they are.
pub fn shapes_to_paths(root: &mut Element) {
    root.walk_mut(&mut |el: &mut Element| {
        if let Some((d, consumed)) = shape_path_data(el) {
            el.attrs.retain(|(k, _)| !consumed.contains(&k.as_str()));
            el.name = "path".to_string();
            el.set_attr("d", d);
        }
    });
}

// ---------------------------------------------------------------------------
// Collapse
// ---------------------------------------------------------------------------

/// Rewrites every `transform` as a single matrix; identity transforms are removed.
pub fn normalize_transforms(root: &mut Element) {
    root.walk_mut(&mut |el: &mut Element| {
        let Some(raw) = el.attr("transform") else {
            return;
        };
        match parse_transform(raw) {
            Some(affine) if is_identity(affine) => {
                el.remove_attr("transform");
            }
            Some(affine) => el.set_attr("transform", format_matrix(affine)),
            // Unknown syntax is left for the rasterizer to judge.
            None => {}
        }
    });
}

fn element_transform(el: &Element) -> Option<Affine> {
    el.attr("transform").and_then(parse_transform)
}

/// Moves each group's transform down onto its child elements.
pub fn push_group_transforms(root: &mut Element) {
    root.walk_mut(&mut |el: &mut Element| {
        if !el.is("g") || CLIPPING_ATTRS.iter().any(|a| el.has_attr(a)) {
            return;
        }
        let Some(group) = element_transform(el) else {
            return;
        };
        if el.children.iter().any(|n| matches!(n, Node::Text(_))) {
            return;
        }
        el.remove_attr("transform");
        for child in el.child_elements_mut() {
            let combined = match element_transform(child) {
                Some(own) => group * own,
                None => group,
            };
            child.set_attr("transform", format_matrix(combined));
        }
    });
}

fn is_stroked(el: &Element) -> bool {
    el.attr("stroke").is_some_and(|s| s != "none")
}

fn bake_path(el: &mut Element) {
    let Some(affine) = element_transform(el) else {
        return;
    };
    let Some(path) = el.attr("d").and_then(|d| parse_path(d, affine)) else {
        return;
    };
    el.set_attr("d", path.to_svg());
    el.remove_attr("transform");
}

/// Applies path transforms directly to the path data. Stroked paths keep
/// any transform that is more than a translation.
pub fn bake_transforms(root: &mut Element) {
    root.walk_mut(&mut |el: &mut Element| {
        if !el.is("path") || !el.has_attr("transform") {
            return;
        }
        if is_stroked(el) && !element_transform(el).is_some_and(is_translation) {
            return;
        }
        bake_path(el);
    });
}

fn collapse_children(el: &mut Element) {
    let mut out = Vec::with_capacity(el.children.len());
    for child in el.children.drain(..) {
        match child {
            Node::Element(mut g) if g.is("g") => {
                collapse_children(&mut g);
                if g.children.is_empty() {
                    continue;
                }
                if g.attrs.is_empty() {
                    out.extend(g.children);
                    continue;
                }
                out.push(Node::Element(hoist_single_child(g)));
            }
            Node::Element(mut other) => {
                collapse_children(&mut other);
                out.push(Node::Element(other));
            }
            text => out.push(text),
        }
    }
    el.children = out;
}

/// A group wrapping one element hands its attributes to that element when
/// none of them would clash.
fn hoist_single_child(mut g: Element) -> Element {
    if g.children.len() != 1 || g.has_attr("id") || CLIPPING_ATTRS.iter().any(|a| g.has_attr(a)) {
        return g;
    }
    let Some(Node::Element(child)) = g.children.first() else {
        return g;
    };
    if child.has_attr("id") || g.attrs.iter().any(|(k, _)| child.has_attr(k)) {
        return g;
    }
    let Some(Node::Element(mut child)) = g.children.pop() else {
        return g;
    };
    // Group attributes go first so inherited values read in document order.
    let mut attrs = std::mem::take(&mut g.attrs);
    attrs.append(&mut child.attrs);
    child.attrs = attrs;
    child
}

/// Unwraps attribute-less groups, hoists single children and drops empty groups.
pub fn collapse_groups(root: &mut Element) {
    collapse_children(root);
}

/// One collapse pass. The caller repeats it until the output is stable.
pub fn collapse_pass(root: &mut Element) {
    normalize_transforms(root);
    push_group_transforms(root);
    bake_transforms(root);
    collapse_groups(root);
}

// ---------------------------------------------------------------------------
// Extract
// ---------------------------------------------------------------------------

/// A marker path and the full transform from its coordinates to the root.
pub struct MarkerPath<'a> {
    pub marker: &'a str,
    pub d: &'a str,
    pub transform: Affine,
}

pub fn strip_marker_presentation(root: &mut Element) {
    root.walk_mut(&mut |el: &mut Element| {
        if el.has_attr(MARKER_ATTR) {
            el.attrs
                .retain(|(k, _)| !PRESENTATION_ATTRS.contains(&k.as_str()));
        }
    });
}

fn collect<'a>(el: &'a Element, parent: Affine, out: &mut Vec<MarkerPath<'a>>) {
    let own = element_transform(el).unwrap_or(Affine::IDENTITY);
    let transform = parent * own;
    if el.is("path") {
        if let (Some(marker), Some(d)) = (el.attr(MARKER_ATTR), el.attr("d")) {
            out.push(MarkerPath {
                marker,
                d,
                transform,
            });
        }
    }
    for child in el.child_elements() {
        collect(child, transform, out);
    }
}

/// Marker paths in document order, with ancestor transforms that survived
/// collapsing folded in.
pub fn marker_paths(root: &Element) -> Vec<MarkerPath<'_>> {
    let mut out = Vec::new();
    collect(root, Affine::IDENTITY, &mut out);
    out
}
