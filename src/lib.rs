pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod nodes;

pub use client::{Credentials, HttpTransport, LiblibClient, PollOptions, ReqwestTransport};
pub use config::LiblibConfig;
pub use error::{LiblibError, Result};
pub use models::{
    AspectRatio, AuditStatus, GenerateStatus, GeneratedImage, GenerationJob, JobCreated,
    ModelCatalog, ModelTier, SizeSpec,
};
pub use nodes::{
    AuthInfo, AuthInfoNode, CredentialStore, ImageToImageInput, ImageToImageNode,
    LoadAuthInfoNode, NodeContext, NodeKind, SaveAuthInfoNode, TextToImageInput, TextToImageNode,
};
