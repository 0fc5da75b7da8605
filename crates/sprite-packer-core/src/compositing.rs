//! Drawing rasterized icons onto the sprite canvas and encoding it.

use crate::error::{Result, SpriteError};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Encoder knobs forwarded to the compositor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeOptions {
    /// PNG compression effort, 0 (fastest) to 9 (smallest). None uses the encoder default.
    #[serde(default)]
    pub quality: Option<u8>,
    /// Draw a red 1px outline around every placement (debugging aid).
    #[serde(default)]
    pub outlines: bool,
}

/// One raster buffer and where it goes on the canvas.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub image: &'a RgbaImage,
    pub x: u32,
    pub y: u32,
}

/// Composites positioned buffers onto a blank canvas and encodes the result.
pub trait Compositor {
    /// With zero placements the output is a valid, fully transparent 1x1 image.
    fn composite(
        &self,
        width: u32,
        height: u32,
        placements: &[Placement<'_>],
        options: &CompositeOptions,
    ) -> Result<Vec<u8>>;
}

/// Copy `src` into `canvas` at (dx, dy), clipping at the canvas edge.
///
/// - outlines: if true, draw a red 1px outline around the copied area
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32, outlines: bool) {
    let (cw, ch) = canvas.dimensions();
    let (rw, rh) = src.dimensions();

    for yy in 0..rh {
        for xx in 0..rw {
            if dx + xx < cw && dy + yy < ch {
                let px = *src.get_pixel(xx, yy);
                canvas.put_pixel(dx + xx, dy + yy, px);
            }
        }
    }

    if outlines && rw > 0 && rh > 0 {
        let red = Rgba([255, 0, 0, 255]);
        for xx in 0..rw {
            for y in [dy, dy + rh - 1] {
                if dx + xx < cw && y < ch {
                    canvas.put_pixel(dx + xx, y, red);
                }
            }
        }
        for yy in 0..rh {
            for x in [dx, dx + rw - 1] {
                if x < cw && dy + yy < ch {
                    canvas.put_pixel(x, dy + yy, red);
                }
            }
        }
    }
}

fn compression(quality: Option<u8>) -> CompressionType {
    match quality {
        None => CompressionType::Default,
        Some(q) if q <= 3 => CompressionType::Fast,
        Some(q) if q >= 7 => CompressionType::Best,
        Some(_) => CompressionType::Default,
    }
}

/// Encodes an RGBA canvas as PNG.
pub fn encode_png(canvas: &RgbaImage, options: &CompositeOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut out,
        compression(options.quality),
        FilterType::Adaptive,
    );
    encoder
        .write_image(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| SpriteError::Encode(e.to_string()))?;
    Ok(out)
}

/// [`Compositor`] producing PNG bytes with the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngCompositor;

impl Compositor for PngCompositor {
    fn composite(
        &self,
        width: u32,
        height: u32,
        placements: &[Placement<'_>],
        options: &CompositeOptions,
    ) -> Result<Vec<u8>> {
        if placements.is_empty() || width == 0 || height == 0 {
            return encode_png(&RgbaImage::new(1, 1), options);
        }
        let mut canvas = RgbaImage::new(width, height);
        for p in placements {
            blit_rgba(p.image, &mut canvas, p.x, p.y, options.outlines);
        }
        encode_png(&canvas, options)
    }
}
