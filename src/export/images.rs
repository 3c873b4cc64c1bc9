//! Photo reading and decoding
//!
//! Photos are read concurrently, decoded on the blocking pool and re-encoded
//! as JPEG for embedding. A photo that cannot be read or decoded is skipped;
//! the others keep their original numbers.

use crate::cli::PdfQuality;
use futures::future::join_all;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoMime {
    Png,
    Jpeg,
}

impl PhotoMime {
    /// Detects PNG and JPEG by signature; anything else is unsupported
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(PhotoMime::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(PhotoMime::Jpeg)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoMime::Png => "image/png",
            PhotoMime::Jpeg => "image/jpeg",
        }
    }

    fn format(&self) -> ImageFormat {
        match self {
            PhotoMime::Png => ImageFormat::Png,
            PhotoMime::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// Raw photo bytes with their detected type
#[derive(Debug, Clone)]
pub struct PhotoData {
    pub bytes: Vec<u8>,
    pub mime: PhotoMime,
}

impl PhotoData {
    pub fn new(bytes: Vec<u8>) -> Result<Self, String> {
        let mime = PhotoMime::sniff(&bytes).ok_or("not a PNG or JPEG file")?;
        Ok(Self { bytes, mime })
    }
}

/// A photo ready to embed
#[derive(Debug, Clone)]
pub struct DecodedPhoto {
    /// Caption number, 1-based position in the input list
    pub number: usize,
    pub source: String,
    /// Upright size before downsampling, used for layout
    pub native_width: u32,
    pub native_height: u32,
    /// Embedded JPEG
    pub jpeg: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl DecodedPhoto {
    pub fn layout_size(&self) -> funnskjema_common::PhotoSize {
        funnskjema_common::PhotoSize {
            number: self.number,
            width_px: self.native_width,
            height_px: self.native_height,
        }
    }
}

/// Turns the pixels upright according to the EXIF orientation tag
fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Decodes, orients, downsamples to the quality's max width and re-encodes as JPEG
pub fn decode_photo(
    number: usize,
    source: &str,
    data: &PhotoData,
    quality: PdfQuality,
) -> Result<DecodedPhoto, String> {
    let img = image::load_from_memory_with_format(&data.bytes, data.mime.format())
        .map_err(|e| format!("decode failed: {}", e))?;

    let img = match data.mime {
        PhotoMime::Jpeg => match crate::scanner::exif::read_orientation(&data.bytes) {
            Some(orientation) => apply_orientation(img, orientation),
            None => img,
        },
        PhotoMime::Png => img,
    };
    let (native_width, native_height) = img.dimensions();
    if native_width == 0 || native_height == 0 {
        return Err("image has no pixels".into());
    }

    let img = if native_width > quality.max_width() {
        img.resize(quality.max_width(), u32::MAX, FilterType::Triangle)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let (width_px, height_px) = rgb.dimensions();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality.jpeg_quality())
        .encode_image(&rgb)
        .map_err(|e| format!("JPEG encode failed: {}", e))?;

    Ok(DecodedPhoto {
        number,
        source: source.to_string(),
        native_width,
        native_height,
        jpeg,
        width_px,
        height_px,
    })
}

async fn load_photo(number: usize, path: PathBuf, quality: PdfQuality) -> Option<DecodedPhoto> {
    let source = path.display().to_string();
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("photo {} ({}) unreadable: {}", number, source, e);
            return None;
        }
    };

    let data = match PhotoData::new(bytes) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("photo {} ({}) skipped: {}", number, source, e);
            return None;
        }
    };

    let decode_source = source.clone();
    let decoded =
        tokio::task::spawn_blocking(move || decode_photo(number, &decode_source, &data, quality))
            .await;
    match decoded {
        Ok(Ok(photo)) => {
            log::debug!(
                "photo {} decoded: {}x{} from {}",
                number,
                photo.native_width,
                photo.native_height,
                source
            );
            Some(photo)
        }
        Ok(Err(e)) => {
            log::warn!("photo {} ({}) skipped: {}", number, source, e);
            None
        }
        Err(e) => {
            log::warn!("photo {} ({}) decode task failed: {}", number, source, e);
            None
        }
    }
}

/// Reads and decodes all photos concurrently. Output order matches input order.
pub async fn load_photos(paths: &[PathBuf], quality: PdfQuality) -> Vec<Option<DecodedPhoto>> {
    join_all(
        paths
            .iter()
            .enumerate()
            .map(|(index, path)| load_photo(index + 1, path.clone(), quality)),
    )
    .await
}
