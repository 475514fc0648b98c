//! Host-facing node records. Each node maps its typed inputs onto
//! [`LiblibClient`] calls and returns host values (auth bundles or image batches).

pub mod auth;
pub mod generate;

use crate::client::{HttpTransport, LiblibClient, ReqwestTransport};
use crate::config::LiblibConfig;
use crate::error::Result;
use std::sync::Arc;

pub use auth::{
    AuthInfo, AuthInfoNode, CredentialStore, LoadAuthInfoNode, SaveAuthInfoNode, StoreFormat,
};
pub use generate::{ImageToImageInput, ImageToImageNode, TextToImageInput, TextToImageNode};

pub const CATEGORY: &str = "LibLib";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    AuthInfo,
    SaveAuthInfo,
    LoadAuthInfo,
    TextToImage,
    ImageToImage,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        NodeKind::AuthInfo,
        NodeKind::SaveAuthInfo,
        NodeKind::LoadAuthInfo,
        NodeKind::TextToImage,
        NodeKind::ImageToImage,
    ];

    pub fn class_name(&self) -> &'static str {
        match self {
            NodeKind::AuthInfo => "LibLibAuthInfo",
            NodeKind::SaveAuthInfo => "SaveLibLibAuthInfo",
            NodeKind::LoadAuthInfo => "LoadLibLibAuthInfo",
            NodeKind::TextToImage => "LibLibTextToImage",
            NodeKind::ImageToImage => "LibLibImageToImage",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            NodeKind::AuthInfo => "LibLib Auth Info",
            NodeKind::SaveAuthInfo => "Save LibLib Auth Info",
            NodeKind::LoadAuthInfo => "Load LibLib Auth Info",
            NodeKind::TextToImage => "LibLib Text to Image",
            NodeKind::ImageToImage => "LibLib Image to Image",
        }
    }

    pub fn from_class_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.class_name() == name)
    }
}

/// Shared settings for the generation nodes. A client is built per execution
/// from the auth bundle wired into the node.
#[derive(Clone)]
pub struct NodeContext {
    config: LiblibConfig,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl NodeContext {
    pub fn new(config: LiblibConfig) -> Self {
        Self {
            config,
            transport: None,
        }
    }

    pub fn with_transport(config: LiblibConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            transport: Some(transport),
        }
    }

    pub fn client(&self, auth: &AuthInfo) -> Result<LiblibClient> {
        let credentials = auth.credentials()?;
        let transport = match &self.transport {
            Some(transport) => transport.clone(),
            None => Arc::new(ReqwestTransport::new(self.config.request_timeout)?),
        };
        Ok(LiblibClient::with_transport(
            credentials,
            &self.config,
            transport,
        ))
    }
}
