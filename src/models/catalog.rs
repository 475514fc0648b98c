use crate::error::{LiblibError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MODEL: &str = "Star-3-Alpha";

/// Path suffix selecting the upstream endpoint family for a model tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointFamily {
    Ultra,
    Standard,
}

impl EndpointFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointFamily::Ultra => "ultra",
            EndpointFamily::Standard => "standard",
        }
    }
}

impl fmt::Display for EndpointFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelDescriptor {
    pub name: &'static str,
    pub family: EndpointFamily,
    pub text2img_template: &'static str,
    pub img2img_template: &'static str,
}

impl ModelDescriptor {
    pub fn text2img_path(&self) -> String {
        format!("/api/generate/webui/text2img/{}", self.family)
    }

    pub fn img2img_path(&self) -> String {
        format!("/api/generate/webui/img2img/{}", self.family)
    }
}

const MODELS: &[ModelDescriptor] = &[
    ModelDescriptor {
        name: "Star-3-Alpha",
        family: EndpointFamily::Ultra,
        text2img_template: "5d7e67009b344550bc1aa6ccbfa1d7f4",
        img2img_template: "07e00af4fc464c7ab55ff906f8acf1b7",
    },
    ModelDescriptor {
        name: "SDXL",
        family: EndpointFamily::Standard,
        text2img_template: "e10adc3949ba59abbe56e057f20f883e",
        img2img_template: "9c7d531dc75f476aa833b3d452b8f7ad",
    },
    ModelDescriptor {
        name: "FLUX1",
        family: EndpointFamily::Standard,
        text2img_template: "6f7c4652458d4802969f8d089cf5b91f",
        img2img_template: "63b72710c9574457ba303d9d9b8df8bd",
    },
];

static CATALOG: Lazy<BTreeMap<&'static str, ModelDescriptor>> =
    Lazy::new(|| MODELS.iter().map(|m| (m.name, m.clone())).collect());

/// The two-member tier selector exposed by the generation nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelTier {
    #[default]
    #[serde(rename = "SDXL")]
    Sdxl,
    #[serde(rename = "FLUX1")]
    Flux1,
}

impl ModelTier {
    pub fn model_name(&self) -> &'static str {
        match self {
            ModelTier::Sdxl => "SDXL",
            ModelTier::Flux1 => "FLUX1",
        }
    }
}

impl FromStr for ModelTier {
    type Err = LiblibError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SDXL" => Ok(ModelTier::Sdxl),
            "FLUX1" => Ok(ModelTier::Flux1),
            other => Err(LiblibError::Validation(format!(
                "Unknown model type '{}' (expected SDXL or FLUX1)",
                other
            ))),
        }
    }
}

pub struct ModelCatalog;

impl ModelCatalog {
    pub fn resolve(name: &str) -> Result<&'static ModelDescriptor> {
        CATALOG.get(name).ok_or_else(|| {
            LiblibError::Validation(format!(
                "Unknown model '{}'. Valid: {}",
                name,
                Self::names().join(", ")
            ))
        })
    }

    pub fn for_tier(tier: ModelTier) -> &'static ModelDescriptor {
        // Every tier has a catalog entry; see MODELS.
        &CATALOG[tier.model_name()]
    }

    pub fn names() -> Vec<&'static str> {
        CATALOG.keys().copied().collect()
    }

    pub fn supported_models() -> impl Iterator<Item = &'static ModelDescriptor> {
        CATALOG.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_model() {
        let model = ModelCatalog::resolve(DEFAULT_MODEL).unwrap();
        assert_eq!(model.family, EndpointFamily::Ultra);
        assert_eq!(model.text2img_template, "5d7e67009b344550bc1aa6ccbfa1d7f4");
        assert_eq!(model.img2img_template, "07e00af4fc464c7ab55ff906f8acf1b7");
        assert_eq!(model.text2img_path(), "/api/generate/webui/text2img/ultra");
        assert_eq!(model.img2img_path(), "/api/generate/webui/img2img/ultra");
    }

    #[test]
    fn test_unknown_model_is_validation_error() {
        let err = ModelCatalog::resolve("Star-4-Omega").unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Star-4-Omega"));
    }

    #[test]
    fn test_every_tier_is_in_catalog() {
        for tier in [ModelTier::Sdxl, ModelTier::Flux1] {
            let model = ModelCatalog::for_tier(tier);
            assert_eq!(model.name, tier.model_name());
            assert_eq!(model.family, EndpointFamily::Standard);
        }
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!("SDXL".parse::<ModelTier>().unwrap(), ModelTier::Sdxl);
        assert_eq!("FLUX1".parse::<ModelTier>().unwrap(), ModelTier::Flux1);
        assert!("flux".parse::<ModelTier>().is_err());
        assert_eq!(ModelTier::default(), ModelTier::Sdxl);
    }

    #[test]
    fn test_names_cover_catalog() {
        let names = ModelCatalog::names();
        assert_eq!(names.len(), MODELS.len());
        assert!(names.contains(&"Star-3-Alpha"));
        assert_eq!(ModelCatalog::supported_models().count(), MODELS.len());
    }
}
