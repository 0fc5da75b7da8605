use crate::model::{Bin, PackedItem};
use std::cmp::Ordering;

pub mod shelf;

pub use shelf::ShelfPacker;

/// One rectangle waiting to be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackRequest {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

impl PackRequest {
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }
}

/// A packer places rectangles into a growing bin.
///
/// Implementations must ensure no overlaps. Placement never fails for positive sizes;
/// the bin grows instead.
pub trait Packer {
    fn pack(&mut self, id: &str, width: u32, height: u32) -> PackedItem;
    /// Tight bounding box of everything placed so far.
    fn bin(&self) -> Bin;
}

/// Packing order: height descending, then id ascending.
pub fn packing_order(a: &PackRequest, b: &PackRequest) -> Ordering {
    b.height.cmp(&a.height).then_with(|| a.id.cmp(&b.id))
}

pub fn sort_for_packing(requests: &mut [PackRequest]) {
    requests.sort_by(packing_order);
}

/// Sorts `requests` by the packing order and shelf-packs them.
///
/// Items come back in placement order. Zero requests give a `0 x 0` bin.
pub fn pack(mut requests: Vec<PackRequest>) -> (Bin, Vec<PackedItem>) {
    sort_for_packing(&mut requests);
    let mut packer = ShelfPacker::new();
    let items = requests
        .iter()
        .map(|r| packer.pack(&r.id, r.width, r.height))
        .collect();
    (packer.bin(), items)
}
