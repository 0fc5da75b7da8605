//! Consistency rules for icon zones against the icon's final raster size.

use crate::model::IconMetadata;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Stretch axis a zone error refers to; displays as the JSON key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn key(self) -> &'static str {
        match self {
            Axis::X => "stretchX",
            Axis::Y => "stretchY",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// First rule an icon's metadata violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("image is invalid")]
    InvalidImage,
    #[error("image has invalid metadata")]
    InvalidMetadata,
    #[error("image has invalid width")]
    InvalidWidth,
    #[error("image has invalid height")]
    InvalidHeight,
    #[error("image content area must be an array of 4 numbers")]
    ContentShape,
    #[error("image content area must be positive")]
    ContentNotPositive,
    #[error("image content area must be within image bounds")]
    ContentOutOfBounds,
    #[error("image {0} zones must be an array")]
    ZonesNotArray(Axis),
    #[error("image {0} zone must consist of two numbers")]
    ZoneShape(Axis),
    #[error("image {0} zone may not be zero-size")]
    ZoneZeroSize(Axis),
    #[error("image {0} zone must be within image bounds")]
    ZoneOutOfBounds(Axis),
    #[error("image {0} zones may not overlap")]
    ZonesOverlap(Axis),
}

fn check_content(
    [left, top, right, bottom]: [f64; 4],
    width: f64,
    height: f64,
) -> Result<(), MetadataError> {
    if left >= right || top >= bottom {
        return Err(MetadataError::ContentNotPositive);
    }
    if left < 0.0 || right > width || top < 0.0 || bottom > height {
        return Err(MetadataError::ContentOutOfBounds);
    }
    Ok(())
}

fn check_zone(axis: Axis, [a, b]: [f64; 2], limit: f64) -> Result<(), MetadataError> {
    if a >= b {
        return Err(MetadataError::ZoneZeroSize(axis));
    }
    if a < 0.0 || b > limit {
        return Err(MetadataError::ZoneOutOfBounds(axis));
    }
    Ok(())
}

/// Zones must come sorted by their first coordinate. Touching zones are allowed.
fn check_overlap(axis: Axis, zones: &[[f64; 2]]) -> Result<(), MetadataError> {
    if zones.windows(2).any(|pair| pair[1][0] < pair[0][1]) {
        return Err(MetadataError::ZonesOverlap(axis));
    }
    Ok(())
}

fn numbers<const N: usize>(value: &Value) -> Option<[f64; N]> {
    let items = value.as_array()?;
    if items.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_f64()?;
    }
    Some(out)
}

fn positive(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|v| *v > 0.0)
}

/// Validates JSON metadata against a JSON icon `{ width, height }`.
///
/// Rules run in a fixed order and the first violation is returned.
pub fn validate_metadata(icon: &Value, metadata: &Value) -> Result<(), MetadataError> {
    let icon = icon.as_object().ok_or(MetadataError::InvalidImage)?;
    let metadata = metadata.as_object().ok_or(MetadataError::InvalidMetadata)?;
    let width = positive(icon.get("width")).ok_or(MetadataError::InvalidWidth)?;
    let height = positive(icon.get("height")).ok_or(MetadataError::InvalidHeight)?;

    if let Some(content) = metadata.get("content") {
        let content = numbers::<4>(content).ok_or(MetadataError::ContentShape)?;
        check_content(content, width, height)?;
    }

    for (axis, limit) in [(Axis::X, width), (Axis::Y, height)] {
        let Some(zones) = metadata.get(axis.key()) else {
            continue;
        };
        let zones = zones.as_array().ok_or(MetadataError::ZonesNotArray(axis))?;
        let mut parsed = Vec::with_capacity(zones.len());
        for zone in zones {
            let zone = numbers::<2>(zone).ok_or(MetadataError::ZoneShape(axis))?;
            check_zone(axis, zone, limit)?;
            parsed.push(zone);
        }
        check_overlap(axis, &parsed)?;
    }

    Ok(())
}

impl IconMetadata {
    /// Same rules as [`validate_metadata`] for an icon of `width x height` pixels.
    pub fn validate(&self, width: u32, height: u32) -> Result<(), MetadataError> {
        if width == 0 {
            return Err(MetadataError::InvalidWidth);
        }
        if height == 0 {
            return Err(MetadataError::InvalidHeight);
        }
        let (width, height) = (f64::from(width), f64::from(height));
        if let Some(content) = self.content {
            check_content(content, width, height)?;
        }
        for (axis, zones, limit) in [
            (Axis::X, &self.stretch_x, width),
            (Axis::Y, &self.stretch_y, height),
        ] {
            for zone in zones {
                check_zone(axis, *zone, limit)?;
            }
            check_overlap(axis, zones)?;
        }
        Ok(())
    }
}
