use serde::{Deserialize, Serialize};

/// Rasterizer ceiling applied when `max_icon_size` is not set.
pub const DEFAULT_MAX_ICON_SIZE: u32 = 2048;

/// Options for one sprite generation run.
/// Key notes:
///   - `pixel_ratio` scales every icon and every extracted zone
///   - `deduplicate` collapses byte-identical sources into one placement shared by all their ids
///   - `format` builds the id -> record manifest next to the image layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteConfig {
    /// Ratio of a 72dpi screen pixel to the destination pixel density.
    pub pixel_ratio: f32,
    /// Largest allowed rasterized side in pixels. None => `DEFAULT_MAX_ICON_SIZE`.
    #[serde(default)]
    pub max_icon_size: Option<u32>,
    /// Drop icons the rasterizer reports as too large instead of failing the run.
    #[serde(default)]
    pub remove_oversized_icons: bool,
    /// Pack byte-identical sources once and point every id at the shared placement.
    #[serde(default)]
    pub deduplicate: bool,
    /// Read stretch/content/placeholder markers from the SVG sources.
    #[serde(default = "default_extract_metadata")]
    pub extract_metadata: bool,
    /// Flag every manifest record as a signed distance field icon.
    #[serde(default)]
    pub signed_distance_field: bool,
    /// Build the manifest (id -> placement) in addition to the image layout.
    #[serde(default = "default_format")]
    pub format: bool,
    /// Rasterize in parallel when the crate feature "parallel" is on.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            max_icon_size: None,
            remove_oversized_icons: false,
            deduplicate: false,
            extract_metadata: default_extract_metadata(),
            signed_distance_field: false,
            format: default_format(),
            parallel: default_parallel(),
        }
    }
}

impl SpriteConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - `pixel_ratio` is not a finite number greater than zero
    /// - `max_icon_size` is set to zero
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SpriteError;

        if !self.pixel_ratio.is_finite() || self.pixel_ratio <= 0.0 {
            return Err(SpriteError::InvalidConfig(format!(
                "pixel_ratio must be a positive number, got {}",
                self.pixel_ratio
            )));
        }

        if self.max_icon_size == Some(0) {
            return Err(SpriteError::InvalidConfig(
                "max_icon_size must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Effective rasterizer ceiling.
    pub fn max_size(&self) -> u32 {
        self.max_icon_size.unwrap_or(DEFAULT_MAX_ICON_SIZE)
    }
}

fn default_extract_metadata() -> bool {
    true
}
fn default_format() -> bool {
    true
}
fn default_parallel() -> bool {
    false
}

/// Builder for `SpriteConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct SpriteConfigBuilder {
    cfg: SpriteConfig,
}

impl SpriteConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: SpriteConfig::default(),
        }
    }
    pub fn pixel_ratio(mut self, v: f32) -> Self {
        self.cfg.pixel_ratio = v;
        self
    }
    pub fn max_icon_size(mut self, v: Option<u32>) -> Self {
        self.cfg.max_icon_size = v;
        self
    }
    pub fn remove_oversized_icons(mut self, v: bool) -> Self {
        self.cfg.remove_oversized_icons = v;
        self
    }
    pub fn deduplicate(mut self, v: bool) -> Self {
        self.cfg.deduplicate = v;
        self
    }
    pub fn extract_metadata(mut self, v: bool) -> Self {
        self.cfg.extract_metadata = v;
        self
    }
    pub fn signed_distance_field(mut self, v: bool) -> Self {
        self.cfg.signed_distance_field = v;
        self
    }
    pub fn format(mut self, v: bool) -> Self {
        self.cfg.format = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.parallel = v;
        self
    }
    pub fn build(self) -> SpriteConfig {
        self.cfg
    }
}

impl SpriteConfig {
    /// Create a fluent builder for `SpriteConfig`.
    pub fn builder() -> SpriteConfigBuilder {
        SpriteConfigBuilder::new()
    }
}
