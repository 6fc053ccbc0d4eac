use super::format::resized_name;
use crate::models::{
    BatchResult, Config, ResampleFilter, ResizeOutcome, ResizeRequest, UploadItem,
};
use crate::{Error, Result};
use tracing::{debug, info, warn};

/// Upper bound on `width * height` of a resize target, roughly 8K by 5K.
pub const DEFAULT_MAX_TARGET_PIXELS: u64 = 40_000_000;

/// A request whose dimensions and item list have passed validation.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedRequest<'a> {
    pub width: u32,
    pub height: u32,
    pub items: &'a [UploadItem],
}

/// Reject non-positive (or unrepresentable) dimensions and empty batches.
pub fn validate_request(
    width: i64,
    height: i64,
    items: &[UploadItem],
) -> Result<ValidatedRequest<'_>> {
    let invalid = || Error::InvalidDimensions { width, height };

    if width <= 0 || height <= 0 {
        return Err(invalid());
    }
    let width = u32::try_from(width).map_err(|_| invalid())?;
    let height = u32::try_from(height).map_err(|_| invalid())?;

    if items.is_empty() {
        return Err(Error::NoItems);
    }

    Ok(ValidatedRequest {
        width,
        height,
        items,
    })
}

/// Stateless resize core: decode, resample to exact dimensions, re-encode.
#[derive(Debug, Clone, Copy)]
pub struct BatchResizer {
    filter: ResampleFilter,
    jpeg_quality: u8,
    max_target_pixels: u64,
}

impl Default for BatchResizer {
    fn default() -> Self {
        Self::new(ResampleFilter::default(), 75)
    }
}

impl BatchResizer {
    pub fn new(filter: ResampleFilter, jpeg_quality: u8) -> Self {
        Self {
            filter,
            jpeg_quality,
            max_target_pixels: DEFAULT_MAX_TARGET_PIXELS,
        }
    }

    pub fn with_max_target_pixels(mut self, max_target_pixels: u64) -> Self {
        self.max_target_pixels = max_target_pixels;
        self
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.resize_filter, config.jpeg_quality)
            .with_max_target_pixels(config.max_target_pixels)
    }

    /// The resample buffer is allocated up front, so oversized targets must
    /// be refused before any decoding happens.
    fn check_target(&self, width: u32, height: u32) -> Result<()> {
        if u64::from(width) * u64::from(height) > self.max_target_pixels {
            return Err(Error::InvalidDimensions {
                width: i64::from(width),
                height: i64::from(height),
            });
        }
        Ok(())
    }

    /// Resize a single item. `Ok(None)` means the item's format is not
    /// supported and it should be dropped from the batch.
    ///
    /// Aspect ratio is not preserved: the output is always exactly
    /// `width` x `height`.
    pub fn resize_one(
        &self,
        item: &UploadItem,
        width: u32,
        height: u32,
    ) -> Result<Option<ResizeOutcome>> {
        self.check_target(width, height)?;

        let Some(codec) = item.format().codec() else {
            debug!("Skipping unsupported file {}", item.original_name());
            return Ok(None);
        };

        let decoded = (codec.decode)(item.bytes()).map_err(|e| Error::Decode {
            name: item.original_name().to_string(),
            reason: e.to_string(),
        })?;

        let (orig_width, orig_height) = (decoded.width(), decoded.height());
        if orig_width == 0 || orig_height == 0 {
            return Err(Error::Decode {
                name: item.original_name().to_string(),
                reason: "image has zero dimensions".to_string(),
            });
        }

        debug!(
            "Resampling {} from {}x{} to {}x{}",
            item.original_name(),
            orig_width,
            orig_height,
            width,
            height
        );
        let resized = decoded.resize_exact(width, height, self.filter.filter_type());

        let encoded_bytes =
            (codec.encode)(&resized, self.jpeg_quality).map_err(|e| Error::Encode {
                name: item.original_name().to_string(),
                reason: e.to_string(),
            })?;
        if encoded_bytes.is_empty() {
            return Err(Error::Encode {
                name: item.original_name().to_string(),
                reason: "encoder produced no output".to_string(),
            });
        }

        Ok(Some(ResizeOutcome {
            original_name: item.original_name().to_string(),
            resized_name: resized_name(item.original_name()),
            encoded_bytes,
            format: codec.format,
        }))
    }

    /// Resize every supported item in input order. The first hard failure
    /// aborts the whole batch; unsupported items are dropped silently.
    pub fn process_batch(&self, request: &ResizeRequest) -> Result<BatchResult> {
        let validated =
            validate_request(request.target_width, request.target_height, &request.items)?;
        self.check_target(validated.width, validated.height)?;

        info!(
            "Resizing batch of {} item(s) to {}x{}",
            validated.items.len(),
            validated.width,
            validated.height
        );

        let mut outcomes = Vec::with_capacity(validated.items.len());
        for item in validated.items {
            match self.resize_one(item, validated.width, validated.height) {
                Ok(Some(outcome)) => outcomes.push(outcome),
                Ok(None) => {}
                Err(e) => {
                    warn!("Aborting batch: {}", e);
                    return Err(e);
                }
            }
        }

        if outcomes.is_empty() {
            warn!("No supported images in batch");
            return Err(Error::EmptyResult);
        }

        Ok(BatchResult { outcomes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resize::ImageFormat;
    use image::codecs::gif::GifEncoder;
    use image::{DynamicImage, Frame, ImageFormat as Encoding, RgbImage};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn encode_fixture(width: u32, height: u32, encoding: Encoding) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut bytes = Vec::new();
        if encoding == Encoding::Gif {
            GifEncoder::new(&mut bytes)
                .encode_frame(Frame::new(DynamicImage::ImageRgb8(img).to_rgba8()))
                .unwrap();
        } else {
            DynamicImage::ImageRgb8(img)
                .write_to(&mut Cursor::new(&mut bytes), encoding)
                .unwrap();
        }
        bytes
    }

    fn decoded_dimensions(bytes: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn test_validate_rejects_non_positive_dimensions() {
        let items = vec![UploadItem::new("a.png", vec![])];
        for (w, h) in [(0, 600), (800, 0), (-5, 600), (800, -1), (0, 0)] {
            assert!(matches!(
                validate_request(w, h, &items),
                Err(Error::InvalidDimensions { .. })
            ));
        }
    }

    #[test]
    fn test_validate_rejects_oversized_dimensions() {
        let items = vec![UploadItem::new("a.png", vec![])];
        let too_wide = i64::from(u32::MAX) + 1;
        assert!(matches!(
            validate_request(too_wide, 10, &items),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_validate_checks_dimensions_before_items() {
        assert!(matches!(
            validate_request(0, 10, &[]),
            Err(Error::InvalidDimensions { .. })
        ));
        assert!(matches!(validate_request(10, 10, &[]), Err(Error::NoItems)));
    }

    #[test]
    fn test_validate_passes_through() {
        let items = vec![UploadItem::new("a.png", vec![1])];
        let validated = validate_request(800, 600, &items).unwrap();
        assert_eq!((validated.width, validated.height), (800, 600));
        assert_eq!(validated.items.len(), 1);
    }

    #[test]
    fn test_process_batch_rejects_targets_over_pixel_cap() {
        let max = i64::from(u32::MAX);
        let request = ResizeRequest::new(
            max,
            max,
            vec![UploadItem::new("a.png", encode_fixture(4, 4, Encoding::Png))],
        );
        assert!(matches!(
            BatchResizer::default().process_batch(&request),
            Err(Error::InvalidDimensions { width, height }) if width == max && height == max
        ));
    }

    #[test]
    fn test_resize_one_respects_configured_pixel_cap() {
        let item = UploadItem::new("a.png", encode_fixture(4, 4, Encoding::Png));
        let resizer = BatchResizer::default().with_max_target_pixels(100);

        assert!(resizer.resize_one(&item, 10, 10).unwrap().is_some());
        assert!(matches!(
            resizer.resize_one(&item, 10, 11),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_resize_one_reports_encoder_limits() {
        // Baseline JPEG cannot be wider than 65535 pixels
        let item = UploadItem::new("a.jpg", encode_fixture(4, 4, Encoding::Jpeg));
        let err = BatchResizer::default()
            .resize_one(&item, 70_000, 1)
            .unwrap_err();
        assert!(matches!(err, Error::Encode { ref name, .. } if name == "a.jpg"));
    }

    #[test]
    fn test_resize_one_jpeg_forces_exact_dimensions() {
        let item = UploadItem::new("photo.jpg", encode_fixture(1000, 500, Encoding::Jpeg));
        let outcome = BatchResizer::default()
            .resize_one(&item, 800, 600)
            .unwrap()
            .unwrap();

        assert_eq!(outcome.original_name, "photo.jpg");
        assert_eq!(outcome.resized_name, "photo_resized.jpg");
        assert_eq!(outcome.format, ImageFormat::Jpeg);
        assert_eq!(decoded_dimensions(&outcome.encoded_bytes), (800, 600));
        assert_eq!(
            image::guess_format(&outcome.encoded_bytes).unwrap(),
            Encoding::Jpeg
        );
    }

    #[test]
    fn test_resize_one_keeps_png_and_gif_formats() {
        let resizer = BatchResizer::default();

        let png = UploadItem::new("a.PNG", encode_fixture(40, 20, Encoding::Png));
        let outcome = resizer.resize_one(&png, 7, 9).unwrap().unwrap();
        assert_eq!(outcome.resized_name, "a_resized.png");
        assert_eq!(image::guess_format(&outcome.encoded_bytes).unwrap(), Encoding::Png);
        assert_eq!(decoded_dimensions(&outcome.encoded_bytes), (7, 9));

        let gif = UploadItem::new("anim.gif", encode_fixture(16, 16, Encoding::Gif));
        let outcome = resizer.resize_one(&gif, 32, 8).unwrap().unwrap();
        assert_eq!(image::guess_format(&outcome.encoded_bytes).unwrap(), Encoding::Gif);
        assert_eq!(decoded_dimensions(&outcome.encoded_bytes), (32, 8));
    }

    #[test]
    fn test_resize_one_skips_unsupported() {
        let item = UploadItem::new("b.txt", encode_fixture(10, 10, Encoding::Png));
        assert!(BatchResizer::default()
            .resize_one(&item, 10, 10)
            .unwrap()
            .is_none());
        assert!(!item.format().is_supported());
    }

    #[test]
    fn test_resize_one_decodes_by_claimed_format() {
        // Valid PNG bytes under a .jpg name must fail as JPEG
        let item = UploadItem::new("mislabelled.jpg", encode_fixture(10, 10, Encoding::Png));
        let err = BatchResizer::default()
            .resize_one(&item, 5, 5)
            .unwrap_err();
        assert!(matches!(err, Error::Decode { ref name, .. } if name == "mislabelled.jpg"));
    }

    #[test]
    fn test_process_batch_preserves_order_and_drops_unsupported() {
        let request = ResizeRequest::new(
            30,
            20,
            vec![
                UploadItem::new("first.png", encode_fixture(10, 10, Encoding::Png)),
                UploadItem::new("skip.txt", b"plain text".to_vec()),
                UploadItem::new("second.jpeg", encode_fixture(50, 10, Encoding::Jpeg)),
                UploadItem::new("third.gif", encode_fixture(5, 5, Encoding::Gif)),
            ],
        );

        let result = BatchResizer::default().process_batch(&request).unwrap();
        let names: Vec<&str> = result
            .outcomes
            .iter()
            .map(|o| o.original_name.as_str())
            .collect();

        assert_eq!(names, vec!["first.png", "second.jpeg", "third.gif"]);
        for outcome in &result.outcomes {
            assert_eq!(decoded_dimensions(&outcome.encoded_bytes), (30, 20));
        }
    }

    #[test]
    fn test_process_batch_all_unsupported_is_empty_result() {
        let request = ResizeRequest::new(
            100,
            100,
            vec![
                UploadItem::new("a.txt", b"a".to_vec()),
                UploadItem::new("b.bmp", b"b".to_vec()),
            ],
        );
        assert!(matches!(
            BatchResizer::default().process_batch(&request),
            Err(Error::EmptyResult)
        ));
    }

    #[test]
    fn test_process_batch_fails_fast_on_corrupt_item() {
        let request = ResizeRequest::new(
            10,
            10,
            vec![
                UploadItem::new("good.png", encode_fixture(10, 10, Encoding::Png)),
                UploadItem::new("broken.jpg", vec![0xFF, 0xD8, 0xFF, 0x00, 0x13, 0x37]),
                UploadItem::new("later.png", encode_fixture(10, 10, Encoding::Png)),
            ],
        );
        assert!(matches!(
            BatchResizer::default().process_batch(&request),
            Err(Error::Decode { ref name, .. }) if name == "broken.jpg"
        ));
    }

    #[test]
    fn test_process_batch_rejects_invalid_dimensions_before_decoding() {
        // Corrupt bytes would fail decoding, but validation must fire first
        let request = ResizeRequest::new(0, 600, vec![UploadItem::new("broken.jpg", vec![0])]);
        assert!(matches!(
            BatchResizer::default().process_batch(&request),
            Err(Error::InvalidDimensions { width: 0, height: 600 })
        ));
    }

    #[test]
    fn test_resample_is_deterministic() {
        let item = UploadItem::new("a.png", encode_fixture(123, 45, Encoding::Png));
        let resizer = BatchResizer::new(ResampleFilter::CatmullRom, 75);

        let first = resizer.resize_one(&item, 64, 64).unwrap().unwrap();
        let second = resizer.resize_one(&item, 64, 64).unwrap().unwrap();

        assert_eq!(decoded_dimensions(&first.encoded_bytes), (64, 64));
        assert_eq!(first.encoded_bytes, second.encoded_bytes);
    }
}
