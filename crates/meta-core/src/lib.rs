pub mod codes;
pub mod config;
pub mod types;

pub use codes::ErrorCode;
pub use config::{DeploymentDescriptor, DeploymentInfo};
pub use types::*;
