//! Deployment environment: path classification, identity resolution and the
//! views rendered from it.

pub mod classifier;
pub mod identity;
pub mod render;
pub mod resolver;
pub mod tool_env;

pub use classifier::{Classification, DeploymentKind, PathSegments, classify, classify_required};
pub use identity::{DeploymentIdentity, environment_type, project_id};
pub use render::{EnvironmentView, Properties};
pub use resolver::{locate_iac_root, resolve};
pub use tool_env::ToolEnvironment;
