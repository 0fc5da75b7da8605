use crate::compositing::{CompositeOptions, Compositor, Placement};
use crate::config::SpriteConfig;
use crate::dedup::{DedupTable, deduplicate, representatives};
use crate::error::{Result, SpriteError};
use crate::geometry::{extract_metadata, has_markers};
use crate::model::{Bin, IconMetadata, IconSource, LayoutStats, Manifest, ManifestRecord, PackedItem};
use crate::packer::{PackRequest, pack};
use crate::raster::{RasterError, RasterOptions, Rasterizer};
use image::RgbaImage;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One packed icon and the pixels to draw at its placement.
#[derive(Debug, Clone)]
pub struct LayoutItem {
    pub placement: PackedItem,
    pub image: RgbaImage,
}

/// Output of a layout run: the bin, placements in packing order and, when
/// `format` is set, the id -> record manifest.
#[derive(Debug, Clone)]
pub struct SpriteLayout {
    pub bin: Bin,
    pub items: Vec<LayoutItem>,
    pub manifest: Option<Manifest>,
}

impl SpriteLayout {
    /// Placements without pixel data.
    pub fn placements(&self) -> impl Iterator<Item = &PackedItem> {
        self.items.iter().map(|it| &it.placement)
    }

    pub fn stats(&self) -> LayoutStats {
        let items: Vec<PackedItem> = self.placements().cloned().collect();
        LayoutStats::compute(self.bin, &items)
    }
}

/// A surviving icon between rasterization and packing.
struct Prepared {
    id: String,
    width: u32,
    height: u32,
    image: RgbaImage,
    metadata: IconMetadata,
}

fn ensure_unique_ids(icons: &[IconSource]) -> Result<()> {
    let mut seen = HashSet::with_capacity(icons.len());
    for icon in icons {
        if !seen.insert(icon.id.as_str()) {
            return Err(SpriteError::DuplicateId(icon.id.clone()));
        }
    }
    Ok(())
}

/// Rasterizes one source and reads its zones. `Ok(None)` means the icon is dropped.
fn prepare_icon<R: Rasterizer>(
    src: &IconSource,
    cfg: &SpriteConfig,
    rasterizer: &R,
) -> Result<Option<Prepared>> {
    let scale = src.effective_scale(cfg.pixel_ratio);
    let options = RasterOptions {
        scale,
        max_size: cfg.max_size(),
    };
    let raster = match rasterizer.rasterize(&src.svg, &options) {
        Ok(raster) => raster,
        Err(RasterError::TooLarge { max_size }) if cfg.remove_oversized_icons => {
            debug!(id = %src.id, max_size, "dropping oversized icon");
            return Ok(None);
        }
        Err(RasterError::TooLarge { max_size }) => {
            return Err(SpriteError::OversizedIcon {
                id: src.id.clone(),
                max_size,
            });
        }
        Err(RasterError::Failed(message)) => {
            return Err(SpriteError::Rasterize {
                id: src.id.clone(),
                message,
            });
        }
    };
    if raster.is_empty() {
        debug!(id = %src.id, "dropping icon without absolute size");
        return Ok(None);
    }

    let metadata = if cfg.extract_metadata && cfg.format && has_markers(&src.svg) {
        let metadata = extract_metadata(&src.svg, f64::from(scale))?;
        if let Err(violation) = metadata.validate(raster.width, raster.height) {
            warn!(id = %src.id, %violation, "extracted metadata is inconsistent with icon size");
        }
        metadata
    } else {
        IconMetadata::default()
    };

    Ok(Some(Prepared {
        id: src.id.clone(),
        width: raster.width,
        height: raster.height,
        image: raster.image,
        metadata,
    }))
}

fn prepare_all<R: Rasterizer>(
    sources: &[IconSource],
    cfg: &SpriteConfig,
    rasterizer: &R,
) -> Result<Vec<Option<Prepared>>> {
    #[cfg(feature = "parallel")]
    {
        if cfg.parallel {
            return sources
                .par_iter()
                .map(|src| prepare_icon(src, cfg, rasterizer))
                .collect();
        }
    }
    sources
        .iter()
        .map(|src| prepare_icon(src, cfg, rasterizer))
        .collect()
}

#[instrument(skip_all, fields(icons = icons.len(), pixel_ratio = cfg.pixel_ratio))]
/// Rasterizes, measures and packs `icons` into one sprite layout.
///
/// Notes:
/// - With `deduplicate`, byte-identical sources are packed once and every id of the
///   group points at the shared manifest record.
/// - Any fatal error (oversized icon that may not be dropped, rasterizer failure,
///   malformed SVG during zone extraction) aborts the run before packing.
/// - Placement order comes only from the packing sort, never from rasterization order.
pub fn generate_layout<R: Rasterizer>(
    icons: Vec<IconSource>,
    cfg: &SpriteConfig,
    rasterizer: &R,
) -> Result<SpriteLayout> {
    cfg.validate()?;
    ensure_unique_ids(&icons)?;

    let table: Option<DedupTable> = if cfg.deduplicate {
        Some(deduplicate(&icons)?)
    } else {
        None
    };
    let sources = match &table {
        Some(t) => representatives(icons, t),
        None => icons,
    };

    let prepared = prepare_all(&sources, cfg, rasterizer)?;
    let mut by_id: HashMap<String, Prepared> = prepared
        .into_iter()
        .flatten()
        .map(|p| (p.id.clone(), p))
        .collect();

    let requests = by_id
        .values()
        .map(|p| PackRequest::new(p.id.clone(), p.width, p.height))
        .collect();
    let (bin, placed) = pack(requests);

    let mut manifest = cfg.format.then(Manifest::new);
    let mut items = Vec::with_capacity(placed.len());
    for placement in placed {
        let Some(prepared) = by_id.remove(&placement.id) else {
            continue;
        };
        if let Some(manifest) = manifest.as_mut() {
            let mut record = ManifestRecord::new(&placement, cfg.pixel_ratio);
            record.sdf = cfg.signed_distance_field;
            record.metadata = prepared.metadata;
            match &table {
                Some(t) => {
                    let members: Vec<String> = t
                        .members_of(&placement.id)
                        .into_iter()
                        .map(str::to_string)
                        .collect();
                    manifest.insert_shared(record, members);
                }
                None => manifest.insert(record),
            }
        }
        items.push(LayoutItem {
            placement,
            image: prepared.image,
        });
    }

    debug!(
        width = bin.width,
        height = bin.height,
        placed = items.len(),
        "sprite layout ready"
    );
    Ok(SpriteLayout {
        bin,
        items,
        manifest,
    })
}

#[instrument(skip_all)]
/// Composites a layout into an encoded sprite image.
///
/// An empty layout yields a transparent 1x1 image.
pub fn generate_image<C: Compositor>(
    layout: &SpriteLayout,
    compositor: &C,
    options: &CompositeOptions,
) -> Result<Vec<u8>> {
    let placements: Vec<Placement<'_>> = layout
        .items
        .iter()
        .map(|it| Placement {
            image: &it.image,
            x: it.placement.x,
            y: it.placement.y,
        })
        .collect();
    compositor.composite(layout.bin.width, layout.bin.height, &placements, options)
}
