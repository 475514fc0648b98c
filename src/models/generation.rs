use crate::error::{LiblibError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_DIMENSION: u32 = 512;
pub const MAX_DIMENSION: u32 = 2048;
pub const MIN_IMG_COUNT: i32 = 1;
pub const MAX_IMG_COUNT: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    Square,
    Portrait,
    Landscape,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "square",
            AspectRatio::Portrait => "portrait",
            AspectRatio::Landscape => "landscape",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = LiblibError;

    /// Accepts the bare token or the node selector form `square:1024x1024`.
    fn from_str(s: &str) -> Result<Self> {
        let token = s.split(':').next().unwrap_or_default().trim();
        match token {
            "square" => Ok(AspectRatio::Square),
            "portrait" => Ok(AspectRatio::Portrait),
            "landscape" => Ok(AspectRatio::Landscape),
            _ => Err(LiblibError::Validation(format!(
                "Invalid aspect ratio '{}' (expected square, portrait or landscape)",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Caller-supplied sizing. Explicit dimensions win over the aspect ratio.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeSpec {
    pub aspect_ratio: Option<AspectRatio>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Sizing after validation: exactly one form is ever sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSizing {
    Aspect(AspectRatio),
    Explicit(ImageSize),
}

impl SizeSpec {
    pub fn aspect(aspect_ratio: AspectRatio) -> Self {
        Self {
            aspect_ratio: Some(aspect_ratio),
            ..Default::default()
        }
    }

    pub fn explicit(width: u32, height: u32) -> Self {
        Self {
            aspect_ratio: None,
            width: Some(width),
            height: Some(height),
        }
    }

    pub fn resolve(&self) -> Result<ImageSizing> {
        if let Some(width) = self.width {
            check_dimension("width", width)?;
        }
        if let Some(height) = self.height {
            check_dimension("height", height)?;
        }

        match (self.width, self.height, self.aspect_ratio) {
            (Some(width), Some(height), _) => Ok(ImageSizing::Explicit(ImageSize { width, height })),
            (_, _, Some(aspect)) => Ok(ImageSizing::Aspect(aspect)),
            _ => Err(LiblibError::Validation(
                "At least one size parameter must be specified".into(),
            )),
        }
    }
}

fn check_dimension(name: &str, value: u32) -> Result<()> {
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
        return Err(LiblibError::Validation(format!(
            "Invalid {} {} (must be between {} and {})",
            name, value, MIN_DIMENSION, MAX_DIMENSION
        )));
    }
    Ok(())
}

pub fn validate_img_count(img_count: i32) -> Result<u32> {
    if !(MIN_IMG_COUNT..=MAX_IMG_COUNT).contains(&img_count) {
        return Err(LiblibError::Validation(format!(
            "Invalid image count {} (must be between {} and {})",
            img_count, MIN_IMG_COUNT, MAX_IMG_COUNT
        )));
    }
    Ok(img_count as u32)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateParams {
    pub prompt: String,
    pub img_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<ImageSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
}

impl GenerateParams {
    pub fn text(prompt: impl Into<String>, img_count: u32, sizing: ImageSizing) -> Self {
        let (aspect_ratio, image_size) = match sizing {
            ImageSizing::Aspect(aspect) => (Some(aspect), None),
            ImageSizing::Explicit(size) => (None, Some(size)),
        };
        Self {
            prompt: prompt.into(),
            img_count,
            aspect_ratio,
            image_size,
            source_image: None,
        }
    }

    pub fn image(prompt: impl Into<String>, img_count: u32, source_image: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            img_count,
            aspect_ratio: None,
            image_size: None,
            source_image: Some(source_image.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub template_uuid: String,
    pub generate_params: GenerateParams,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub generate_uuid: String,
}

/// `{code, msg, data}` wrapper around every API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub generate_uuid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "i64")]
pub enum GenerateStatus {
    Pending,
    Processing,
    Generated,
    Auditing,
    Completed,
    Failed,
    Unknown(i64),
}

impl From<i64> for GenerateStatus {
    fn from(code: i64) -> Self {
        match code {
            1 => GenerateStatus::Pending,
            2 => GenerateStatus::Processing,
            3 => GenerateStatus::Generated,
            4 => GenerateStatus::Auditing,
            5 => GenerateStatus::Completed,
            6 => GenerateStatus::Failed,
            other => GenerateStatus::Unknown(other),
        }
    }
}

impl Default for GenerateStatus {
    fn default() -> Self {
        GenerateStatus::Unknown(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "i64")]
pub enum AuditStatus {
    Pending,
    Processing,
    Passed,
    Blocked,
    Failed,
    Unknown(i64),
}

impl From<i64> for AuditStatus {
    fn from(code: i64) -> Self {
        match code {
            1 => AuditStatus::Pending,
            2 => AuditStatus::Processing,
            3 => AuditStatus::Passed,
            4 => AuditStatus::Blocked,
            5 => AuditStatus::Failed,
            other => AuditStatus::Unknown(other),
        }
    }
}

impl Default for AuditStatus {
    fn default() -> Self {
        AuditStatus::Unknown(0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub seed: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub audit_status: AuditStatus,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJob {
    #[serde(default, deserialize_with = "null_as_default")]
    pub generate_uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub generate_status: GenerateStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub percent_completed: f64,
    #[serde(default)]
    pub generate_msg: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<GeneratedImage>,
}

impl GenerationJob {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.generate_status,
            GenerateStatus::Completed | GenerateStatus::Failed
        )
    }

    /// The final image list; `None` until the job has completed.
    pub fn finished_images(&self) -> Option<&[GeneratedImage]> {
        match self.generate_status {
            GenerateStatus::Completed => Some(&self.images),
            _ => None,
        }
    }
}

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
