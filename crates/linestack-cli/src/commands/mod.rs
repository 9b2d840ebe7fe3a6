pub mod init;
pub mod synth;

use std::path::Path;

use linestack_core::config::{ContextConfig, ImageConfig};
use linestack_core::{DeployContext, RepositoryRef, StackConfig};
use tracing::debug;

use crate::StackArgs;

/// Resolve descriptor inputs: config file first, then flag/env overrides.
pub fn load_inputs(args: &StackArgs) -> anyhow::Result<(DeployContext, RepositoryRef)> {
    let path = Path::new(&args.config);
    let base = if path.exists() {
        debug!(config = %path.display(), "loading stack config");
        StackConfig::from_file(path)?
    } else {
        StackConfig::default()
    };

    let overrides = StackConfig {
        context: ContextConfig {
            account: args.account.clone(),
            region: args.region.clone(),
            partition: None,
        },
        image: ImageConfig {
            repository: args.repository.clone(),
        },
    };

    Ok(base.merge(overrides).resolve()?)
}
