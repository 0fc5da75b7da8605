use super::Packer;
use crate::model::{Bin, PackedItem};

#[derive(Clone, Debug)]
struct Shelf {
    y: u32,
    h: u32,
    /// Next free x on this shelf.
    cursor: u32,
}

/// First-fit shelf packer with an auto-resizing capacity.
///
/// The capacity starts at `1 x 1` and doubles along one or both axes whenever a
/// rectangle neither fits an existing shelf nor a new shelf below the last one.
/// The reported [`Bin`] is the tight bounding box of the placements, not the capacity.
#[derive(Clone, Debug)]
pub struct ShelfPacker {
    cap_w: u32,
    cap_h: u32,
    shelves: Vec<Shelf>,
    bin: Bin,
}

impl Default for ShelfPacker {
    fn default() -> Self {
        Self::new()
    }
}

impl ShelfPacker {
    pub fn new() -> Self {
        Self {
            cap_w: 1,
            cap_h: 1,
            shelves: Vec::new(),
            bin: Bin::default(),
        }
    }

    /// Current capacity, always at least as large as the bin.
    pub fn capacity(&self) -> (u32, u32) {
        (self.cap_w, self.cap_h)
    }

    fn next_y(&self) -> u32 {
        self.shelves.last().map_or(0, |s| s.y + s.h)
    }

    fn choose(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        let cap_w = self.cap_w;
        if let Some(sh) = self
            .shelves
            .iter_mut()
            .find(|sh| h <= sh.h && cap_w - sh.cursor >= w)
        {
            let x = sh.cursor;
            sh.cursor += w;
            return Some((x, sh.y));
        }
        let y = self.next_y();
        if w <= self.cap_w && y + h <= self.cap_h {
            self.shelves.push(Shelf { y, h, cursor: w });
            return Some((0, y));
        }
        None
    }

    fn grow(&mut self, w: u32, h: u32) {
        let (w1, h1) = (self.cap_w, self.cap_h);
        let mut w2 = w1;
        let mut h2 = h1;
        if w1 <= h1 || w > w1 {
            w2 = w.max(w1).saturating_mul(2);
        }
        if h1 < w1 || h > h1 {
            h2 = h.max(h1).saturating_mul(2);
        }
        self.cap_w = w2;
        self.cap_h = h2;
    }
}

impl Packer for ShelfPacker {
    fn pack(&mut self, id: &str, width: u32, height: u32) -> PackedItem {
        let (x, y) = loop {
            if let Some(pos) = self.choose(width, height) {
                break pos;
            }
            self.grow(width, height);
        };
        let item = PackedItem {
            id: id.to_string(),
            x,
            y,
            width,
            height,
        };
        self.bin.include(&item);
        item
    }

    fn bin(&self) -> Bin {
        self.bin
    }
}
