//! lambdeploy-lambda: function service layer for lambdeploy
//!
//! This crate owns the two network-facing steps of a deploy: publishing an
//! archive as a new immutable function version, and repointing an alias at
//! that version.
//!
//! ## Key Components
//!
//! - `FunctionPublisher` / `AliasMover`: capability traits the orchestrator
//!   depends on
//! - `AwsLambdaService`: AWS Lambda implementation of both traits
//! - `MemoryFunctionService`: in-memory fake for tests

pub mod aws;
mod error;
pub mod fakes;
pub mod service_traits;

pub use aws::{AwsLambdaService, LambdaClientConfig};
pub use error::LambdaError;
pub use service_traits::{
    AliasBinding, AliasMover, FunctionId, FunctionPublisher, LambdaResult, PublishedVersion,
};
