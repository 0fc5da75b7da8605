//! Core library for packing SVG icons into a sprite sheet.
//!
//! - Packing: deterministic shelf packer (height desc, id asc) with an auto-growing bin
//! - Dedup: byte-identical sources share one placement, every id keeps its manifest entry
//! - Geometry: stretch/content/placeholder zones read from `mapbox-*` marker shapes
//! - Manifest: JSON interchange form plus a compact binary form embedded in the PNG
//! - Rasterizing and compositing sit behind the `Rasterizer` and `Compositor` traits
//!   (resvg and `image` implementations are included)
//!
//! Quick example:
//! ```ignore
//! use sprite_packer_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let icons = vec![
//!   IconSource::new("a", std::fs::read("a.svg")?),
//!   IconSource::new("b", std::fs::read("b.svg")?),
//! ];
//! let cfg = SpriteConfig::builder().pixel_ratio(2.0).deduplicate(true).build();
//! let layout = generate_layout(icons, &cfg, &ResvgRasterizer)?;
//! let png = generate_image(&layout, &PngCompositor, &CompositeOptions::default())?;
//! println!("{}x{} sprite, {} bytes", layout.bin.width, layout.bin.height, png.len());
//! # Ok(()) }
//! ```

pub mod codec;
pub mod compositing;
pub mod config;
pub mod container;
pub mod dedup;
pub mod error;
pub mod export;
pub mod geometry;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod raster;
pub mod validate;

pub use config::*;
pub use error::*;
pub use export::*;
pub use model::*;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `sprite_packer_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::codec::{decode_manifest, encode_manifest};
    pub use crate::compositing::{CompositeOptions, Compositor, Placement, PngCompositor};
    pub use crate::config::{DEFAULT_MAX_ICON_SIZE, SpriteConfig, SpriteConfigBuilder};
    pub use crate::container::{crc32, embed_manifest, extract_manifest};
    pub use crate::dedup::{DedupGroup, DedupTable, Signature, deduplicate};
    pub use crate::error::{Result, SpriteError};
    pub use crate::geometry::{Marker, extract_metadata, strong_round};
    pub use crate::model::{
        Bin, IconMetadata, IconSource, LayoutStats, Manifest, ManifestRecord, PackedItem,
    };
    pub use crate::packer::{PackRequest, Packer, ShelfPacker, pack, sort_for_packing};
    pub use crate::raster::{RasterError, RasterOptions, Rasterized, Rasterizer, ResvgRasterizer};
    pub use crate::validate::{Axis, MetadataError, validate_metadata};
    pub use crate::{LayoutItem, SpriteLayout, generate_image, generate_layout};
    pub use crate::{to_json_layout, to_json_manifest};
}
