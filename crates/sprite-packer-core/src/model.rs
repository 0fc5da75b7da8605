use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One icon handed to the pipeline: caller-visible id plus raw SVG bytes.
#[derive(Debug, Clone)]
pub struct IconSource {
    pub id: String,
    pub svg: Vec<u8>,
    /// Density the SVG was authored at. Rasterization and zone extraction use
    /// `run pixel_ratio / declared pixel_ratio` as the effective scale.
    pub pixel_ratio: Option<f32>,
}

impl IconSource {
    pub fn new(id: impl Into<String>, svg: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            svg: svg.into(),
            pixel_ratio: None,
        }
    }

    /// Scale applied to this icon for a run at `pixel_ratio`.
    pub fn effective_scale(&self, pixel_ratio: f32) -> f32 {
        match self.pixel_ratio {
            Some(declared) if declared.is_finite() && declared > 0.0 => pixel_ratio / declared,
            _ => pixel_ratio,
        }
    }
}

/// Stretch/content/placeholder zones of one icon, in destination pixels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconMetadata {
    /// `[left, top, right, bottom]` of the area reserved for overlaid content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<[f64; 4]>,
    /// `[left, top, right, bottom]` of a text placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<[f64; 4]>,
    /// Horizontal stretch zones `[left, right]`, sorted by left edge.
    #[serde(default, rename = "stretchX", skip_serializing_if = "Vec::is_empty")]
    pub stretch_x: Vec<[f64; 2]>,
    /// Vertical stretch zones `[top, bottom]`, sorted by top edge.
    #[serde(default, rename = "stretchY", skip_serializing_if = "Vec::is_empty")]
    pub stretch_y: Vec<[f64; 2]>,
}

impl IconMetadata {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.placeholder.is_none()
            && self.stretch_x.is_empty()
            && self.stretch_y.is_empty()
    }
}

/// A placed rectangle within the sprite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedItem {
    pub id: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PackedItem {
    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }
    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
    /// True if the two items share at least one pixel.
    pub fn overlaps(&self, other: &PackedItem) -> bool {
        !(self.x >= other.right()
            || other.x >= self.right()
            || self.y >= other.bottom()
            || other.y >= self.bottom())
    }
}

/// Smallest rectangle containing every placement. An empty bin is `0 x 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bin {
    pub width: u32,
    pub height: u32,
}

impl Bin {
    /// Grows the bin so it contains `item`. Never shrinks.
    pub fn include(&mut self, item: &PackedItem) {
        self.width = self.width.max(item.right());
        self.height = self.height.max(item.bottom());
    }

    pub fn area(&self) -> u64 {
        (self.width as u64) * (self.height as u64)
    }
}

/// Statistics about sprite packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LayoutStats {
    /// Number of distinct placements.
    pub num_items: usize,
    /// Area of the bin.
    pub bin_area: u64,
    /// Sum of placement areas.
    pub used_area: u64,
    /// used_area / bin_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl LayoutStats {
    pub fn compute(bin: Bin, items: &[PackedItem]) -> Self {
        let used_area: u64 = items
            .iter()
            .map(|it| (it.width as u64) * (it.height as u64))
            .sum();
        let bin_area = bin.area();
        let occupancy = if bin_area > 0 {
            used_area as f64 / bin_area as f64
        } else {
            0.0
        };
        Self {
            num_items: items.len(),
            bin_area,
            used_area,
            occupancy,
        }
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Items: {}, Occupancy: {:.2}%, Bin Area: {} px², Used Area: {} px²",
            self.num_items,
            self.occupancy * 100.0,
            self.bin_area,
            self.used_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.bin_area.saturating_sub(self.used_area)
    }
}

/// Placement record of one distinct icon in the sprite.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestRecord {
    /// Id of the icon that was packed (the dedup representative).
    pub id: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
    pub sdf: bool,
    pub metadata: IconMetadata,
}

impl ManifestRecord {
    pub fn new(item: &PackedItem, pixel_ratio: f32) -> Self {
        Self {
            id: item.id.clone(),
            x: item.x,
            y: item.y,
            width: item.width,
            height: item.height,
            pixel_ratio,
            sdf: false,
            metadata: IconMetadata::default(),
        }
    }

    /// Equality of everything a client sees for an id (ignores which id was packed).
    pub fn same_entry(&self, other: &ManifestRecord) -> bool {
        self.x == other.x
            && self.y == other.y
            && self.width == other.width
            && self.height == other.height
            && self.pixel_ratio == other.pixel_ratio
            && self.sdf == other.sdf
            && self.metadata == other.metadata
    }
}

/// JSON interchange shape of one manifest entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry {
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    #[serde(default = "one")]
    pixel_ratio: f32,
    #[serde(default, skip_serializing_if = "is_false")]
    sdf: bool,
    #[serde(flatten)]
    metadata: IconMetadata,
}

fn one() -> f32 {
    1.0
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Mapping from every original icon id to its placement record.
///
/// Records are stored once; ids collapsed by deduplication index the same record,
/// so aliased ids can never disagree on x/y/width/height.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    records: Vec<ManifestRecord>,
    index: BTreeMap<String, usize>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record` once and points every id in `ids` at it.
    ///
    /// Ids already present are re-pointed; a record left with no id is dropped.
    pub fn insert_shared<I, S>(&mut self, record: ManifestRecord, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slot = self.records.len();
        self.records.push(record);
        let mut replaced: Vec<usize> = ids
            .into_iter()
            .filter_map(|id| self.index.insert(id.into(), slot))
            .collect();
        replaced.sort_unstable();
        replaced.dedup();
        for old in replaced.into_iter().rev() {
            if self.index.values().any(|&s| s == old) {
                continue;
            }
            self.records.remove(old);
            for s in self.index.values_mut() {
                if *s > old {
                    *s -= 1;
                }
            }
        }
    }

    /// Stores `record` under its own id.
    pub fn insert(&mut self, record: ManifestRecord) {
        let id = record.id.clone();
        self.insert_shared(record, [id]);
    }

    pub fn get(&self, id: &str) -> Option<&ManifestRecord> {
        self.index.get(id).map(|&slot| &self.records[slot])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of ids (not distinct records).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Distinct records, in insertion order.
    pub fn records(&self) -> &[ManifestRecord] {
        &self.records
    }

    /// `(id, record)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ManifestRecord)> {
        self.index
            .iter()
            .map(|(id, &slot)| (id.as_str(), &self.records[slot]))
    }

    /// Parses the JSON interchange form (`{ id: { width, height, x, y, pixelRatio, ... } }`).
    pub fn from_json(value: &serde_json::Value) -> crate::error::Result<Self> {
        Ok(Manifest::deserialize(value)?)
    }
}

impl PartialEq for Manifest {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(id, rec)| {
                other
                    .get(id)
                    .is_some_and(|theirs| rec.same_entry(theirs))
            })
    }
}

impl Serialize for Manifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (id, rec) in self.iter() {
            let entry = ManifestEntry {
                width: rec.width,
                height: rec.height,
                x: rec.x,
                y: rec.y,
                pixel_ratio: rec.pixel_ratio,
                sdf: rec.sdf,
                metadata: rec.metadata.clone(),
            };
            map.serialize_entry(id, &entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Manifest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<String, ManifestEntry>::deserialize(deserializer)?;
        let mut manifest = Manifest::new();
        for (id, e) in entries {
            manifest.insert(ManifestRecord {
                id,
                x: e.x,
                y: e.y,
                width: e.width,
                height: e.height,
                pixel_ratio: e.pixel_ratio,
                sdf: e.sdf,
                metadata: e.metadata,
            });
        }
        Ok(manifest)
    }
}
