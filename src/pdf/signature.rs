//! Signature image loading and embedding
//!
//! A signature is decoded once and can then be embedded into any number of
//! documents as an image XObject. JPEG files are embedded verbatim with
//! `/DCTDecode`. Everything else is decoded to RGBA and stored as
//! zlib-compressed RGB samples, with an `/SMask` soft mask when the picture
//! has transparent pixels (typical for scanned signatures on a cleared
//! background).

use std::io::Write;
use std::path::{Path, PathBuf};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{ColorType, ImageFormat};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use crate::error::{Error, Result};

/// Pixel payload ready to be written as a PDF image stream
#[derive(Debug, Clone)]
enum ImagePayload {
    /// Original JPEG bytes
    Jpeg { data: Vec<u8>, color_space: &'static str },
    /// Zlib-compressed RGB samples plus optional compressed alpha channel
    Flate { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// A decoded signature image
#[derive(Debug, Clone)]
pub struct SignatureImage {
    path: PathBuf,
    width: u32,
    height: u32,
    payload: ImagePayload,
}

impl SignatureImage {
    /// Load a PNG or JPEG image from disk
    pub fn open(path: &Path) -> Result<Self> {
        let image_error = |source| Error::Image { path: path.to_path_buf(), source };

        let bytes = std::fs::read(path)
            .map_err(|e| image_error(image::ImageError::IoError(e)))?;

        Self::from_bytes(path, &bytes).map_err(image_error)
    }

    fn from_bytes(path: &Path, bytes: &[u8]) -> std::result::Result<Self, image::ImageError> {
        let format = image::guess_format(bytes)?;
        let decoded = image::load_from_memory_with_format(bytes, format)?;
        let (width, height) = (decoded.width(), decoded.height());

        let color_space = match format {
            ImageFormat::Jpeg => jpeg_color_space(bytes),
            _ => None,
        };

        let payload = match color_space {
            Some(color_space) => ImagePayload::Jpeg {
                data: bytes.to_vec(),
                color_space,
            },
            None => encode_rgba(&decoded.to_rgba8(), decoded.color())
                .map_err(image::ImageError::IoError)?,
        };

        log::debug!(
            "Decoded signature {} ({}x{}, {:?})",
            path.display(),
            width,
            height,
            format
        );

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            payload,
        })
    }

    /// Path the image was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pixel dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether the embedded image carries a soft mask
    pub fn has_alpha(&self) -> bool {
        matches!(self.payload, ImagePayload::Flate { alpha: Some(_), .. })
    }

    /// Add the image (and its soft mask) to a document, returning the XObject id
    pub fn embed(&self, doc: &mut Document) -> ObjectId {
        let mut dict = self.image_dictionary();

        let content = match &self.payload {
            ImagePayload::Jpeg { data, color_space } => {
                dict.set("ColorSpace", Object::Name(color_space.as_bytes().to_vec()));
                dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
                data.clone()
            }
            ImagePayload::Flate { rgb, alpha } => {
                dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
                dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));

                if let Some(alpha) = alpha {
                    let mut mask_dict = self.image_dictionary();
                    mask_dict.set("ColorSpace", Object::Name(b"DeviceGray".to_vec()));
                    mask_dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));

                    let mask_id = doc.add_object(Object::Stream(encoded_stream(mask_dict, alpha.clone())));
                    dict.set("SMask", Object::Reference(mask_id));
                }

                rgb.clone()
            }
        };

        doc.add_object(Object::Stream(encoded_stream(dict, content)))
    }

    /// Entries shared by the image and its soft mask
    fn image_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(self.width as i64));
        dict.set("Height", Object::Integer(self.height as i64));
        dict.set("BitsPerComponent", Object::Integer(8));
        dict
    }
}

/// A stream whose content is already encoded; lopdf must not compress it again
fn encoded_stream(dict: Dictionary, content: Vec<u8>) -> Stream {
    let mut stream = Stream {
        dict,
        content,
        allows_compression: false,
        start_position: None,
    };
    let length = stream.content.len() as i64;
    stream.dict.set("Length", Object::Integer(length));
    stream
}

/// Split RGBA pixels into compressed RGB samples and an optional alpha channel
fn encode_rgba(rgba: &image::RgbaImage, color: ColorType) -> std::io::Result<ImagePayload> {
    let pixel_count = (rgba.width() * rgba.height()) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    let mut translucent = false;

    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
        translucent |= a != u8::MAX;
    }

    // Formats without an alpha channel decode as fully opaque anyway
    let alpha = if translucent && color.has_alpha() {
        Some(zlib_compress(&alpha)?)
    } else {
        None
    };

    Ok(ImagePayload::Flate {
        rgb: zlib_compress(&rgb)?,
        alpha,
    })
}

fn zlib_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// PDF colour space for JPEG data that can be embedded as-is
///
/// Read from the frame header, because the decoder reports CMYK and YCCK
/// files as RGB. Those are re-encoded instead.
fn jpeg_color_space(bytes: &[u8]) -> Option<&'static str> {
    match jpeg_components(bytes)? {
        1 => Some("DeviceGray"),
        3 => Some("DeviceRGB"),
        _ => None,
    }
}

/// Number of colour components declared by a JPEG's start-of-frame marker
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];

        // Fill bytes before a marker
        if marker == 0xFF {
            pos += 1;
            continue;
        }

        let length = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;

        // SOF0..SOF15, excluding DHT (C4), JPG (C8) and DAC (CC)
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            // Segment: length(2) precision(1) height(2) width(2) components(1)
            return bytes.get(pos + 9).copied();
        }

        // Start of scan: no frame header seen
        if marker == 0xDA {
            return None;
        }

        pos += 2 + length;
    }

    None
}
