//! Turning SVG bytes into pixels.

use image::RgbaImage;
use quick_xml::Reader;
use quick_xml::events::Event;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Multiplier applied to the SVG's declared size.
    pub scale: f32,
    /// Largest allowed side in pixels.
    pub max_size: u32,
}

/// A rasterized icon. Zero width or height means the source had no usable
/// absolute size (missing, relative, zero or negative).
#[derive(Debug, Clone)]
pub struct Rasterized {
    pub width: u32,
    pub height: u32,
    pub image: RgbaImage,
}

impl Rasterized {
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            image: RgbaImage::new(0, 0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RasterError {
    #[error("image created from svg must be {max_size} pixels or fewer on each side")]
    TooLarge { max_size: u32 },
    #[error("{0}")]
    Failed(String),
}

/// Produces a raster buffer from SVG bytes.
///
/// Implementations are called concurrently when the pipeline runs in parallel.
pub trait Rasterizer: Sync {
    fn rasterize(&self, svg: &[u8], options: &RasterOptions) -> Result<Rasterized, RasterError>;
}

/// Numeric part of an absolute length (`12`, `12.5px`, `2em`); `None` for percentages.
fn absolute_length(value: &[u8]) -> Option<f64> {
    let value = std::str::from_utf8(value).ok()?.trim();
    if value.ends_with('%') {
        return None;
    }
    value
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .trim_end()
        .parse::<f64>()
        .ok()
}

/// True when the root element declares both `width` and `height` as positive
/// absolute lengths.
pub fn has_absolute_size(svg: &[u8]) -> bool {
    let mut reader = Reader::from_reader(svg);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let mut width = None;
                let mut height = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"width" => width = Some(attr.value.into_owned()),
                        b"height" => height = Some(attr.value.into_owned()),
                        _ => {}
                    }
                }
                let absolute = |v: Option<Vec<u8>>| {
                    v.as_deref()
                        .and_then(absolute_length)
                        .is_some_and(|len| len.is_finite() && len > 0.0)
                };
                return absolute(width) && absolute(height);
            }
            Ok(Event::Eof) | Err(_) => return false,
            Ok(_) => {}
        }
    }
}

/// resvg-backed [`Rasterizer`]. Text is not rendered.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResvgRasterizer;

impl ResvgRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl Rasterizer for ResvgRasterizer {
    fn rasterize(&self, svg: &[u8], options: &RasterOptions) -> Result<Rasterized, RasterError> {
        if !has_absolute_size(svg) {
            return Ok(Rasterized::empty());
        }
        let tree = match usvg::Tree::from_data(svg, &usvg::Options::default()) {
            Ok(tree) => tree,
            Err(usvg::Error::InvalidSize) => return Ok(Rasterized::empty()),
            Err(e) => return Err(RasterError::Failed(e.to_string())),
        };

        let size = tree.size();
        let scale = options.scale;
        let width = (size.width() * scale).ceil();
        let height = (size.height() * scale).ceil();
        if !width.is_finite() || !height.is_finite() || width < 1.0 || height < 1.0 {
            return Ok(Rasterized::empty());
        }
        if width > options.max_size as f32 || height > options.max_size as f32 {
            return Err(RasterError::TooLarge {
                max_size: options.max_size,
            });
        }
        let (width, height) = (width as u32, height as u32);

        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| RasterError::Failed("failed to allocate svg pixmap".into()))?;
        resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

        let mut image = RgbaImage::new(width, height);
        for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
        }
        Ok(Rasterized {
            width,
            height,
            image,
        })
    }
}
