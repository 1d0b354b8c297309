//! Configuration loading

pub mod file_config;
pub mod loader;

pub use file_config::{
    FileConfig, FileDockerConfig, FileKubernetesConfig, FileSessionConfig, FileWorkspaceConfig,
};
pub use loader::ConfigLoader;
