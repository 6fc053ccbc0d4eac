use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Frame, ImageResult};
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Unsupported,
}

type DecodeFn = fn(&[u8]) -> ImageResult<DynamicImage>;
type EncodeFn = fn(&DynamicImage, u8) -> ImageResult<Vec<u8>>;

/// Decoder/encoder pair for one supported format.
pub(crate) struct Codec {
    pub format: ImageFormat,
    pub extensions: &'static [&'static str],
    pub decode: DecodeFn,
    pub encode: EncodeFn,
}

const CODECS: &[Codec] = &[
    Codec {
        format: ImageFormat::Jpeg,
        extensions: &["jpg", "jpeg"],
        decode: decode_jpeg,
        encode: encode_jpeg,
    },
    Codec {
        format: ImageFormat::Png,
        extensions: &["png"],
        decode: decode_png,
        encode: encode_png,
    },
    Codec {
        format: ImageFormat::Gif,
        extensions: &["gif"],
        decode: decode_gif,
        encode: encode_gif,
    },
];

impl ImageFormat {
    pub(crate) fn codec(self) -> Option<&'static Codec> {
        CODECS.iter().find(|c| c.format == self)
    }

    pub fn is_supported(self) -> bool {
        self.codec().is_some()
    }
}

/// Final path component of an uploaded name; clients may send either separator.
pub(crate) fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
}

/// Split a file name into (stem, extension) at the final `.`.
fn split_extension(filename: &str) -> (&str, Option<&str>) {
    let base = base_name(filename);
    match base.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (base, None),
    }
}

/// Map a file name to its format by extension only. Content is never sniffed.
pub fn classify_format(filename: &str) -> ImageFormat {
    let Some(ext) = split_extension(filename).1 else {
        return ImageFormat::Unsupported;
    };
    let ext = ext.to_ascii_lowercase();

    CODECS
        .iter()
        .find(|c| c.extensions.contains(&ext.as_str()))
        .map(|c| c.format)
        .unwrap_or(ImageFormat::Unsupported)
}

/// `photo.JPG` becomes `photo_resized.jpg`.
pub fn resized_name(filename: &str) -> String {
    let (stem, ext) = split_extension(filename);
    match ext {
        Some(ext) => format!("{}_resized.{}", stem, ext.to_ascii_lowercase()),
        None => format!("{}_resized", stem),
    }
}

fn decode_jpeg(bytes: &[u8]) -> ImageResult<DynamicImage> {
    image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg)
}

fn decode_png(bytes: &[u8]) -> ImageResult<DynamicImage> {
    image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
}

fn decode_gif(bytes: &[u8]) -> ImageResult<DynamicImage> {
    image::load_from_memory_with_format(bytes, image::ImageFormat::Gif)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> ImageResult<Vec<u8>> {
    // JPEG carries no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
    Ok(buf)
}

fn encode_png(img: &DynamicImage, _quality: u8) -> ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

fn encode_gif(img: &DynamicImage, _quality: u8) -> ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        encoder.encode_frame(Frame::new(img.to_rgba8()))?;
    }
    Ok(buf)
}
