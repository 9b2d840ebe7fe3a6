//! stack.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::context::{ContextError, DeployContext, DEFAULT_PARTITION};
use crate::source::{RepositoryRef, SourceError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Source(#[from] SourceError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackConfig {
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub image: ImageConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextConfig {
    pub account: Option<String>,
    pub region: Option<String>,
    pub partition: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageConfig {
    pub repository: Option<String>,
}

impl StackConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: StackConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Scaffold a stack.toml for the given account, region and repository.
    pub fn scaffold(account: &str, region: &str, repository: &str) -> Self {
        StackConfig {
            context: ContextConfig {
                account: Some(account.to_string()),
                region: Some(region.to_string()),
                partition: Some(DEFAULT_PARTITION.to_string()),
            },
            image: ImageConfig {
                repository: Some(repository.to_string()),
            },
        }
    }

    /// Overlay values that are set in `other` on top of this config.
    pub fn merge(self, other: StackConfig) -> Self {
        StackConfig {
            context: ContextConfig {
                account: other.context.account.or(self.context.account),
                region: other.context.region.or(self.context.region),
                partition: other.context.partition.or(self.context.partition),
            },
            image: ImageConfig {
                repository: other.image.repository.or(self.image.repository),
            },
        }
    }

    /// Validate and convert into the descriptor inputs.
    pub fn resolve(&self) -> Result<(DeployContext, RepositoryRef), ConfigError> {
        let account = self
            .context
            .account
            .as_deref()
            .ok_or(ConfigError::Missing("context.account"))?;
        let region = self
            .context
            .region
            .as_deref()
            .ok_or(ConfigError::Missing("context.region"))?;
        let partition = self
            .context
            .partition
            .as_deref()
            .unwrap_or(DEFAULT_PARTITION);
        let repository = self
            .image
            .repository
            .as_deref()
            .ok_or(ConfigError::Missing("image.repository"))?;

        let ctx = DeployContext::with_partition(account, region, partition)?;
        let repo = RepositoryRef::parse(repository)?;
        Ok((ctx, repo))
    }
}
