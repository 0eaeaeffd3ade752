//! lambdeploy core library
//!
//! Packages a project into a zip archive, publishes it as a new immutable
//! function version and moves the live alias onto that version.

pub mod archive;
pub mod config;
pub mod deploy;
pub mod domain;
pub mod obs;
pub mod service;
pub mod telemetry;

pub use archive::{archive_digest, ArchiveBuilder, ArchiveEntry, ArchiveError, ZipArchiveBuilder};
pub use config::{
    load_credentials, ConfigResolver, DeployConfig, EnvironmentConfig, FunctionConfig,
    CREDENTIALS_FILE, DEPLOY_CONFIG_FILE,
};
pub use deploy::DeployOrchestrator;
pub use domain::{
    CommitHash, DeployError, DeployExecutionContext, DeployManifest, DeployRequest, DeployResult,
    DeployStage, Result,
};
pub use service::{DeployService, PackagedArchive};
pub use telemetry::init_tracing;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
