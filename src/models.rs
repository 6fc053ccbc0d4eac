//! Data models and structures
//!
//! Defines the upload/outcome types the resize pipeline works on, the JSON
//! envelope returned to clients, and environment configuration.

use crate::resize::format::base_name;
use crate::resize::{classify_format, ImageFormat};
use crate::{Error, Result};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// One received file. Only the final path component of the name is kept, and
/// the format is fixed from it at construction.
#[derive(Debug, Clone)]
pub struct UploadItem {
    original_name: String,
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl UploadItem {
    pub fn new(original_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let original_name = original_name.into();
        let original_name = base_name(&original_name).to_string();
        let format = classify_format(&original_name);
        Self {
            original_name,
            bytes,
            format,
        }
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

/// Target dimensions are kept signed so that coerced form input (which may be
/// zero or negative) reaches validation intact.
#[derive(Debug, Clone)]
pub struct ResizeRequest {
    pub target_width: i64,
    pub target_height: i64,
    pub items: Vec<UploadItem>,
}

impl ResizeRequest {
    pub fn new(target_width: i64, target_height: i64, items: Vec<UploadItem>) -> Self {
        Self {
            target_width,
            target_height,
            items,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResizeOutcome {
    pub original_name: String,
    pub resized_name: String,
    pub encoded_bytes: Vec<u8>,
    pub format: ImageFormat,
}

#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub outcomes: Vec<ResizeOutcome>,
}

/// Raw multipart-style input: two optional text fields plus named files.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub width: Option<String>,
    pub height: Option<String>,
    pub files: Vec<(String, Vec<u8>)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizedImage {
    pub original_name: String,
    pub resized_name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResizeResponse {
    Success { results: Vec<ResizedImage> },
    Error { message: String },
}

impl ResizeResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, ResizeResponse::Success { .. })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<Result<Vec<ResizedImage>>> for ResizeResponse {
    fn from(result: Result<Vec<ResizedImage>>) -> Self {
        match result {
            Ok(results) => ResizeResponse::Success { results },
            Err(e) => ResizeResponse::Error {
                message: e.to_string(),
            },
        }
    }
}

/// Interpolating resample filters. Nearest-neighbour is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleFilter {
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResampleFilter {
    pub fn filter_type(self) -> FilterType {
        match self {
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl FromStr for ResampleFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "triangle" | "bilinear" => Ok(ResampleFilter::Triangle),
            "catmullrom" | "bicubic" => Ok(ResampleFilter::CatmullRom),
            "gaussian" => Ok(ResampleFilter::Gaussian),
            "lanczos3" => Ok(ResampleFilter::Lanczos3),
            other => Err(Error::Config(format!(
                "Unsupported RESIZE_FILTER '{}'",
                other
            ))),
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub upload_dir: PathBuf,
    pub public_prefix: String,
    pub default_width: i64,
    pub default_height: i64,
    pub jpeg_quality: u8,
    pub resize_filter: ResampleFilter,
    pub max_upload_bytes: usize,
    pub max_target_pixels: u64,
    pub keep_originals: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            public_prefix: "uploads".to_string(),
            default_width: 600,
            default_height: 800,
            jpeg_quality: 75,
            resize_filter: ResampleFilter::default(),
            max_upload_bytes: 10 * 1024 * 1024,
            max_target_pixels: crate::resize::batch::DEFAULT_MAX_TARGET_PIXELS,
            keep_originals: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let jpeg_quality = parse_var(&lookup, "JPEG_QUALITY", defaults.jpeg_quality)?;
        if !(1..=100).contains(&jpeg_quality) {
            return Err(Error::Config(format!(
                "JPEG_QUALITY must be within 1..=100, got {}",
                jpeg_quality
            )));
        }

        let max_target_pixels =
            parse_var(&lookup, "MAX_TARGET_PIXELS", defaults.max_target_pixels)?;
        if max_target_pixels == 0 {
            return Err(Error::Config(
                "MAX_TARGET_PIXELS must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            public_prefix: lookup("PUBLIC_PREFIX")
                .map(|p| p.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_prefix),
            default_width: parse_var(&lookup, "DEFAULT_WIDTH", defaults.default_width)?,
            default_height: parse_var(&lookup, "DEFAULT_HEIGHT", defaults.default_height)?,
            jpeg_quality,
            resize_filter: parse_var(&lookup, "RESIZE_FILTER", defaults.resize_filter)?,
            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            max_target_pixels,
            keep_originals: parse_var(&lookup, "KEEP_ORIGINALS", defaults.keep_originals)?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{} is invalid ('{}'): {}", key, raw, e))),
        None => Ok(default),
    }
}
