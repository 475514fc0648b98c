pub mod imaging;
pub mod poller;
pub mod signer;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

use crate::{
    config::LiblibConfig,
    error::{LiblibError, Result},
    models::{
        validate_img_count, ApiEnvelope, GenerateParams, GenerateRequest, GenerationJob,
        GeneratedImage, JobCreated, ModelCatalog, SizeSpec, StatusRequest,
    },
};
use ndarray::Array4;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub use poller::PollOptions;
pub use signer::{Credentials, SignedRequest, Signer};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};

pub const STATUS_PATH: &str = "/api/generate/webui/status";

#[derive(Clone)]
pub struct LiblibClient {
    signer: Signer,
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    poll: PollOptions,
}

impl LiblibClient {
    pub fn new(config: LiblibConfig) -> Result<Self> {
        let credentials = match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => Credentials::new(access_key, secret_key)?,
            _ => {
                return Err(LiblibError::Validation(
                    "Missing credentials: access key and secret key are required".into(),
                ))
            }
        };
        let transport = ReqwestTransport::new(config.request_timeout)?;

        Ok(Self::with_transport(credentials, &config, Arc::new(transport)))
    }

    pub fn with_transport(
        credentials: Credentials,
        config: &LiblibConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        log::debug!(
            "LibLib client configured: base_url={}, access_key={}",
            config.base_url(),
            credentials.access_key()
        );

        Self {
            signer: Signer::new(credentials),
            transport,
            base_url: config.base_url().to_string(),
            poll: config.poll_options(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn poll_options(&self) -> &PollOptions {
        &self.poll
    }

    pub fn sign(&self, path: &str) -> SignedRequest {
        self.signer.sign(path)
    }

    /// Signed POST of `body` to `path`; returns the envelope's `data` member.
    pub async fn request(&self, path: &str, body: &Value) -> Result<Value> {
        let signed = self.signer.sign(path);
        let url = reqwest::Url::parse_with_params(
            &format!("{}{}", self.base_url, path),
            &[
                ("AccessKey", self.signer.credentials().access_key()),
                ("Signature", signed.signature.as_str()),
                ("Timestamp", signed.timestamp.as_str()),
                ("SignatureNonce", signed.nonce.as_str()),
            ],
        )
        .map_err(|e| LiblibError::Config(format!("Invalid request URL: {}", e)))?;

        log::debug!("POST {}", path);

        let response = self
            .transport
            .post_json(url.as_str(), body)
            .await?
            .error_for_status()
            .map_err(|e| {
                log::error!("Request to {} failed: {}", path, e);
                e
            })?;

        let envelope: ApiEnvelope = serde_json::from_slice(&response.body).map_err(|e| {
            LiblibError::Response(format!("Invalid response envelope from {}: {}", path, e))
        })?;

        if envelope.code != 0 {
            let message = envelope.msg.unwrap_or_else(|| "Unknown error".to_string());
            log::error!("API error {} from {}: {}", envelope.code, path, message);
            return Err(LiblibError::Api {
                code: envelope.code,
                message,
            });
        }

        Ok(envelope.data.unwrap_or(Value::Null))
    }

    async fn request_as<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let data = self.request(path, &body).await?;
        serde_json::from_value(data)
            .map_err(|e| LiblibError::Response(format!("Unexpected data from {}: {}", path, e)))
    }

    pub async fn text_to_image(
        &self,
        prompt: &str,
        model_name: &str,
        sizing: &SizeSpec,
        img_count: i32,
    ) -> Result<JobCreated> {
        let img_count = validate_img_count(img_count)?;
        let sizing = sizing.resolve()?;
        let model = ModelCatalog::resolve(model_name)?;

        let request = GenerateRequest {
            template_uuid: model.text2img_template.to_string(),
            generate_params: GenerateParams::text(prompt, img_count, sizing),
        };

        log::info!("Submitting text-to-image job with model: {}", model.name);
        let job: JobCreated = self.request_as(&model.text2img_path(), &request).await?;
        log::info!("Created job {}", job.generate_uuid);
        Ok(job)
    }

    /// `source_image` may be a URL or a base64 payload; it is sent as given.
    pub async fn image_to_image(
        &self,
        prompt: &str,
        source_image: &str,
        model_name: &str,
        img_count: i32,
    ) -> Result<JobCreated> {
        let img_count = validate_img_count(img_count)?;
        let model = ModelCatalog::resolve(model_name)?;

        let request = GenerateRequest {
            template_uuid: model.img2img_template.to_string(),
            generate_params: GenerateParams::image(prompt, img_count, source_image),
        };

        log::info!("Submitting image-to-image job with model: {}", model.name);
        let job: JobCreated = self.request_as(&model.img2img_path(), &request).await?;
        log::info!("Created job {}", job.generate_uuid);
        Ok(job)
    }

    pub async fn query_status(&self, job_id: &str) -> Result<GenerationJob> {
        let request = StatusRequest {
            generate_uuid: job_id.to_string(),
        };
        self.request_as(STATUS_PATH, &request).await
    }

    /// Download `url` and decode it into a `[1, H, W, 3]` tensor.
    pub async fn fetch_image(&self, url: &str) -> Result<Array4<f32>> {
        log::debug!("Downloading {}", url);
        let response = self.transport.get(url).await?.error_for_status()?;
        imaging::decode_image(&response.body)
    }

    /// Poll `job_id` to completion and download every image in server order.
    pub async fn generate_and_fetch(&self, job_id: &str) -> Result<Array4<f32>> {
        let images = self.poll_until_terminal(job_id).await?;
        self.fetch_all(job_id, &images).await
    }

    async fn fetch_all(&self, job_id: &str, images: &[GeneratedImage]) -> Result<Array4<f32>> {
        if images.is_empty() {
            return Err(LiblibError::Response(format!(
                "Job {} completed without images",
                job_id
            )));
        }

        let mut tensors = Vec::with_capacity(images.len());
        for image in images {
            tensors.push(self.fetch_image(&image.image_url).await?);
        }
        imaging::concat_batches(&tensors)
    }
}
