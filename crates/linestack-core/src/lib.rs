pub mod config;
pub mod context;
pub mod source;
pub mod types;

pub use config::StackConfig;
pub use context::DeployContext;
pub use source::RepositoryRef;
pub use types::*;
