use super::auth::AuthInfo;
use super::NodeContext;
use crate::client::imaging;
use crate::error::Result;
use crate::logger;
use crate::models::{validate_img_count, AspectRatio, ModelCatalog, ModelTier, SizeSpec};
use ndarray::Array4;

#[derive(Debug, Clone)]
pub struct TextToImageInput {
    pub auth_info: AuthInfo,
    pub prompt: String,
    pub model_type: ModelTier,
    pub img_count: i32,
    /// Selector value such as `square:1024x1024`; empty means unset.
    pub aspect_ratio: Option<String>,
    /// 0 means unset.
    pub width: u32,
    /// 0 means unset.
    pub height: u32,
}

impl TextToImageInput {
    pub fn size_spec(&self) -> Result<SizeSpec> {
        let width = (self.width > 0).then_some(self.width);
        let height = (self.height > 0).then_some(self.height);

        let aspect_ratio = match (width, height, self.aspect_ratio.as_deref()) {
            (Some(_), Some(_), _) => None,
            (_, _, Some(selector)) if !selector.is_empty() => {
                Some(selector.parse::<AspectRatio>()?)
            }
            _ => None,
        };

        Ok(SizeSpec {
            aspect_ratio,
            width,
            height,
        })
    }
}

pub struct TextToImageNode {
    context: NodeContext,
}

impl TextToImageNode {
    pub fn new(context: NodeContext) -> Self {
        Self { context }
    }

    pub async fn execute(&self, input: TextToImageInput) -> Result<Array4<f32>> {
        let _timer = logger::timer("LibLib text-to-image");

        let sizing = input.size_spec()?;
        let model = ModelCatalog::for_tier(input.model_type);
        let client = self.context.client(&input.auth_info)?;

        let job = client
            .text_to_image(&input.prompt, model.name, &sizing, input.img_count)
            .await?;
        client.generate_and_fetch(&job.generate_uuid).await
    }
}

#[derive(Debug, Clone)]
pub struct ImageToImageInput {
    pub auth_info: AuthInfo,
    /// `[batch, H, W, C]`; only the first image is sent.
    pub image: Array4<f32>,
    pub prompt: String,
    pub model_type: ModelTier,
    pub img_count: i32,
}

pub struct ImageToImageNode {
    context: NodeContext,
}

impl ImageToImageNode {
    pub fn new(context: NodeContext) -> Self {
        Self { context }
    }

    pub async fn execute(&self, input: ImageToImageInput) -> Result<Array4<f32>> {
        let _timer = logger::timer("LibLib image-to-image");

        validate_img_count(input.img_count)?;
        let model = ModelCatalog::for_tier(input.model_type);
        let client = self.context.client(&input.auth_info)?;
        let source = imaging::tensor_to_base64_png(&input.image)?;

        let job = client
            .image_to_image(&input.prompt, &source, model.name, input.img_count)
            .await?;
        client.generate_and_fetch(&job.generate_uuid).await
    }
}
