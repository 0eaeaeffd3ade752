//! Tracing setup for the `lambdeploy` binary.
//!
//! `RUST_LOG` wins when set. Otherwise the chosen level applies to our own
//! crates while the AWS SDK and its HTTP stack stay at `warn`, so `--verbose`
//! shows deploy steps rather than connection pool chatter.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates held at `warn` regardless of the requested level.
const QUIET_TARGETS: &[&str] = &[
    "aws_config",
    "aws_sdk_lambda",
    "aws_smithy_runtime",
    "aws_smithy_runtime_api",
    "hyper",
    "hyper_util",
    "rustls",
];

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(level: Level) -> String {
    let mut directives = vec![level.as_str().to_ascii_lowercase()];
    directives.extend(QUIET_TARGETS.iter().map(|target| format!("{}=warn", target)));
    directives.join(",")
}

/// Install the global subscriber, writing to stderr.
///
/// Stdout is reserved for command output (the deploy result JSON or the
/// archive digest). A second call is a no-op.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry().with(env_filter);
    let _ = if json {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer).try_init()
    };
}
