use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Duplicate icon id '{0}'")]
    DuplicateId(String),
    #[error("Malformed SVG: {0}")]
    MalformedSvg(String),
    #[error("SVG rewrite did not settle after {passes} passes")]
    NoFixpoint { passes: usize },
    #[error("image created from svg must be {max_size} pixels or fewer on each side")]
    OversizedIcon { id: String, max_size: u32 },
    #[error("Failed to rasterize '{id}': {message}")]
    Rasterize { id: String, message: String },
    #[error("Content signature collision between '{first}' and '{second}'")]
    SignatureCollision { first: String, second: String },
    #[error("Not a PNG container (bad signature or truncated chunk)")]
    InvalidContainer,
    #[error("Manifest chunk checksum mismatch: expected {expected:#010x}, computed {actual:#010x}")]
    Integrity { expected: u32, actual: u32 },
    #[error("Manifest decode error: {0}")]
    ManifestDecode(String),
    #[error("Encoding error: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, SpriteError>;
