//! SVG `transform` attribute parsing into a single affine matrix.

use kurbo::{Affine, Point};

/// Splits a list of numbers separated by whitespace and/or commas.
pub(crate) fn parse_numbers(s: &str) -> Option<Vec<f64>> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect()
}

fn function(name: &str, args: &[f64]) -> Option<Affine> {
    let affine = match (name, args) {
        ("matrix", &[a, b, c, d, e, f]) => Affine::new([a, b, c, d, e, f]),
        ("translate", &[tx]) => Affine::translate((tx, 0.0)),
        ("translate", &[tx, ty]) => Affine::translate((tx, ty)),
        ("scale", &[s]) => Affine::scale(s),
        ("scale", &[sx, sy]) => Affine::scale_non_uniform(sx, sy),
        ("rotate", &[deg]) => Affine::rotate(deg.to_radians()),
        ("rotate", &[deg, cx, cy]) => {
            Affine::rotate_about(deg.to_radians(), Point::new(cx, cy))
        }
        ("skewX", &[deg]) => Affine::skew(deg.to_radians().tan(), 0.0),
        ("skewY", &[deg]) => Affine::skew(0.0, deg.to_radians().tan()),
        _ => return None,
    };
    Some(affine)
}

/// Parses a transform list such as `translate(2 3) rotate(45)` into one matrix.
///
/// Functions compose left to right, so the rightmost applies to the geometry
/// first. Returns `None` for anything unparsable.
pub fn parse_transform(s: &str) -> Option<Affine> {
    let mut out = Affine::IDENTITY;
    let mut rest = s.trim();
    while !rest.is_empty() {
        let open = rest.find('(')?;
        let close = rest[open..].find(')')? + open;
        let name = rest[..open].trim_matches(|c: char| c.is_whitespace() || c == ',');
        let args = parse_numbers(&rest[open + 1..close])?;
        out = out * function(name, &args)?;
        rest = rest[close + 1..].trim_start_matches(|c: char| c.is_whitespace() || c == ',');
    }
    Some(out)
}

pub fn is_identity(affine: Affine) -> bool {
    affine
        .as_coeffs()
        .iter()
        .zip(Affine::IDENTITY.as_coeffs())
        .all(|(a, b)| (a - b).abs() < 1e-12)
}

/// Pure translation. Baking one into a stroked path keeps the stroke intact.
pub fn is_translation(affine: Affine) -> bool {
    let [a, b, c, d, _, _] = affine.as_coeffs();
    a == 1.0 && b == 0.0 && c == 0.0 && d == 1.0
}

pub fn format_matrix(affine: Affine) -> String {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    if is_translation(affine) {
        return format!("translate({} {})", e, f);
    }
    format!("matrix({} {} {} {} {} {})", a, b, c, d, e, f)
}
