//! Marker image references and decoding

use serde::{Deserialize, Serialize};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Where a marker image comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageRef {
    /// An encoded image on disk
    Path(PathBuf),
    /// Encoded image bytes held in memory, serialized as a byte array
    #[serde(with = "embedded_bytes")]
    Embedded(Arc<[u8]>),
}

mod embedded_bytes {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::sync::Arc;

    pub fn serialize<S: Serializer>(bytes: &Arc<[u8]>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Arc<[u8]>, D::Error> {
        Vec::<u8>::deserialize(deserializer).map(Arc::from)
    }
}

impl ImageRef {
    pub fn path(path: impl AsRef<Path>) -> Self {
        Self::Path(path.as_ref().to_path_buf())
    }

    pub fn embedded(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Embedded(bytes.into())
    }

    /// Reads the encoded bytes this reference points at
    pub fn read(&self) -> Result<Arc<[u8]>, ImageLoadError> {
        match self {
            Self::Path(path) => std::fs::read(path)
                .map(Arc::from)
                .map_err(|source| ImageLoadError::Io {
                    path: path.clone(),
                    source,
                }),
            Self::Embedded(bytes) => Ok(bytes.clone()),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Embedded(bytes) => write!(f, "<embedded {} bytes>", bytes.len()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image {0} has no pixels")]
    Empty(String),
}

/// An image decoded to straight RGBA8, ready to register with a surface
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

impl DecodedImage {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Decodes an encoded image (PNG or JPEG) into RGBA8
pub fn decode(data: &[u8]) -> Result<DecodedImage, ImageLoadError> {
    let img = image::load_from_memory(data)?.to_rgba8();
    let (width, height) = img.dimensions();

    Ok(DecodedImage {
        width,
        height,
        pixels: Arc::from(img.into_raw()),
    })
}

/// Reads and decodes the image behind `image_ref`
pub fn load(image_ref: &ImageRef) -> Result<DecodedImage, ImageLoadError> {
    let bytes = image_ref.read()?;
    if bytes.is_empty() {
        return Err(ImageLoadError::Empty(image_ref.to_string()));
    }
    decode(&bytes)
}

/// Encodes a solid-color square as PNG. Handy for fixtures and demo assets.
pub fn solid_png(size: u32, rgba: [u8; 4]) -> Result<Vec<u8>, ImageLoadError> {
    let buffer = image::RgbaImage::from_pixel(size, size, image::Rgba(rgba));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(buffer).write_to(
        &mut std::io::Cursor::new(&mut bytes),
        image::ImageOutputFormat::Png,
    )?;
    Ok(bytes)
}
