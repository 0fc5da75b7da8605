//! Path data canonicalization, bounds and rounding.

use kurbo::{Affine, BezPath, Rect, Shape};

fn is_command(c: char) -> bool {
    matches!(
        c,
        'M' | 'm' | 'L' | 'l' | 'H' | 'h' | 'V' | 'v' | 'C' | 'c' | 'S' | 's' | 'Q' | 'q' | 'T'
            | 't' | 'A' | 'a' | 'Z' | 'z'
    )
}

/// Length of the number lexeme at the start of `s`, or 0.
///
/// A second decimal point starts a new number, so `1.5.5` lexes as `1.5` then `.5`.
fn number_len(s: &[u8]) -> usize {
    let mut i = 0;
    if i < s.len() && (s[i] == b'+' || s[i] == b'-') {
        i += 1;
    }
    let digits_start = i;
    while i < s.len() && s[i].is_ascii_digit() {
        i += 1;
    }
    let mut has_digits = i > digits_start;
    if i < s.len() && s[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < s.len() && s[j].is_ascii_digit() {
            j += 1;
        }
        if j > frac_start || has_digits {
            has_digits = true;
            i = j;
        }
    }
    if !has_digits {
        return 0;
    }
    if i < s.len() && (s[i] == b'e' || s[i] == b'E') {
        let mut j = i + 1;
        if j < s.len() && (s[j] == b'+' || s[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < s.len() && s[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

/// Rewrites path data into one token per command or number, space separated,
/// with every number in plain decimal form (`.5` -> `0.5`, `-.5` -> `-0.5`).
///
/// Arc flags written without separators (`a1 1 0 0110 10`) are split correctly.
/// Returns `None` on characters that are not path data.
pub fn canonicalize_path_data(d: &str) -> Option<String> {
    let bytes = d.as_bytes();
    let mut tokens: Vec<String> = Vec::new();
    let mut command = ' ';
    let mut arg = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() || c == ',' {
            i += 1;
            continue;
        }
        if is_command(c) {
            tokens.push(c.to_string());
            command = c;
            arg = 0;
            i += 1;
            continue;
        }
        let is_flag = matches!(command, 'A' | 'a') && matches!(arg % 7, 3 | 4);
        if is_flag {
            if c != '0' && c != '1' {
                return None;
            }
            tokens.push(c.to_string());
            arg += 1;
            i += 1;
            continue;
        }
        let len = number_len(&bytes[i..]);
        if len == 0 {
            return None;
        }
        let value: f64 = d[i..i + len].parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        tokens.push(value.to_string());
        arg += 1;
        i += len;
    }

    Some(tokens.join(" "))
}

/// Parses (canonicalized) path data and applies `affine` to it.
pub fn parse_path(d: &str, affine: Affine) -> Option<BezPath> {
    let canonical = canonicalize_path_data(d)?;
    let mut path = BezPath::from_svg(&canonical).ok()?;
    path.apply_affine(affine);
    Some(path)
}

/// Exact bounds of the path, or `None` when it has no drawable segment or the
/// bounds are not finite.
pub fn path_bounds(path: &BezPath) -> Option<Rect> {
    path.segments().next()?;
    let bounds = path.bounding_box();
    let finite = [bounds.x0, bounds.y0, bounds.x1, bounds.y1]
        .iter()
        .all(|v| v.is_finite());
    finite.then_some(bounds)
}

fn round_to(value: f64, precision: i32) -> f64 {
    let factor = 10f64.powi(precision);
    (value * factor).round() / factor
}

/// Rounds to `precision` decimals, preferring one decimal fewer when that is
/// within `10^-precision` of the input. Values already within `precision`
/// decimals are returned untouched.
///
/// `2.3491` rounds to `2.35`, `2.3449` to `2.345`.
pub fn strong_round(value: f64, precision: u32) -> f64 {
    let p = precision.max(1) as i32;
    let error = round_to(0.1f64.powi(p), p);
    let fixed = round_to(value, p);
    if fixed == value {
        return value;
    }
    let coarse = round_to(value, p - 1);
    if round_to((coarse - value).abs(), p + 1) >= error {
        fixed
    } else {
        coarse
    }
}
