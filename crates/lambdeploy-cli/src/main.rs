//! lambdeploy - publish a project as a new Lambda version and go live
//!
//! ## Commands
//!
//! - `deploy`: zip, publish a new version, move the live alias onto it
//! - `package`: build the archive a deploy would publish, without publishing
//! - `move-alias`: point the live alias at an existing version
//!
//! ## Exit codes
//!
//! | code | meaning |
//! |---|---|
//! | 0 | success |
//! | 2 | invalid request |
//! | 3 | configuration error |
//! | 4 | archive could not be built |
//! | 5 | publish failed |
//! | 6 | version published but alias not moved |
//! | 1 | anything else |

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lambdeploy_core::{
    load_credentials, DeployConfig, DeployError, DeployRequest, DeployService, ZipArchiveBuilder,
    CREDENTIALS_FILE, DEPLOY_CONFIG_FILE,
};
use lambdeploy_lambda::AwsLambdaService;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "lambdeploy")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Publish a project as a new Lambda version and move its live alias", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding deployConfig.json and deployCredentials.json
    #[arg(long, global = true, env = "LAMBDEPLOY_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Project directory that zipContents entries are relative to
    #[arg(long, global = true, env = "LAMBDEPLOY_PROJECT_ROOT", default_value = ".")]
    project_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Target selection shared by every subcommand.
///
/// All three are optional at parse time so that a missing value is reported
/// as an invalid request rather than a usage error.
#[derive(Args, Debug, Clone)]
struct TargetArgs {
    /// Base function name from deployConfig.json
    #[arg(short = 'f', long = "function")]
    function: Option<String>,

    /// Environment name
    #[arg(short = 'e', long = "environment")]
    environment: Option<String>,

    /// Full 40-character commit hash being deployed
    #[arg(short = 'c', long = "commit-hash")]
    commit_hash: Option<String>,
}

impl TargetArgs {
    fn into_request(self) -> lambdeploy_core::Result<DeployRequest> {
        DeployRequest::from_parts(self.function, self.environment, self.commit_hash)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Zip the project, publish a new version and move the live alias to it
    Deploy {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Build the deploy archive and write it to disk without publishing
    Package {
        #[command(flatten)]
        target: TargetArgs,

        /// Where to write the zip file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Point the live alias at an already-published version
    MoveAlias {
        #[command(flatten)]
        target: TargetArgs,

        /// Published version number to go live with
        #[arg(long)]
        version: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    lambdeploy_core::init_tracing(cli.json, level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_failure(&err),
    }
}

/// Print the error chain once to stderr and pick the exit code.
fn report_failure(err: &anyhow::Error) -> ExitCode {
    eprintln!("Error: {:#}", err);
    ExitCode::from(exit_code(err))
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Deploy { target } => {
            let request = target.into_request()?;
            let service = build_service(&cli.config_dir, &cli.project_root)?;
            cmd_deploy(&service, &request).await
        }
        Commands::Package { target, output } => {
            let request = target.into_request()?;
            let service = build_service(&cli.config_dir, &cli.project_root)?;
            cmd_package(&service, &request, &output).await
        }
        Commands::MoveAlias { target, version } => {
            let request = target.into_request()?;
            let service = build_service(&cli.config_dir, &cli.project_root)?;
            cmd_move_alias(&service, &request, &version).await
        }
    }
}

/// Map an error to the process exit code.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<DeployError>() {
        Some(DeployError::InvalidRequest(_)) => 2,
        Some(DeployError::Configuration(_)) => 3,
        Some(DeployError::MissingManifestEntry { .. } | DeployError::Archive(_)) => 4,
        Some(DeployError::PublishFailed { .. }) => 5,
        Some(DeployError::AliasUpdateFailed { .. }) => 6,
        None => 1,
    }
}

/// Load both config files and wire the AWS backend into a `DeployService`.
fn build_service(config_dir: &Path, project_root: &Path) -> Result<DeployService> {
    let config = DeployConfig::load(&config_dir.join(DEPLOY_CONFIG_FILE))?;
    let credentials = load_credentials(&config_dir.join(CREDENTIALS_FILE))?;

    let project_root = project_root.canonicalize().map_err(|e| {
        DeployError::Configuration(format!(
            "project root {} is not accessible: {}",
            project_root.display(),
            e
        ))
    })?;

    let lambda = Arc::new(AwsLambdaService::new(&credentials));
    Ok(DeployService::new(
        config,
        project_root,
        Arc::new(ZipArchiveBuilder::new()),
        lambda.clone(),
        lambda,
    ))
}

async fn cmd_deploy(service: &DeployService, request: &DeployRequest) -> Result<()> {
    let result = service.deploy(request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn cmd_package(service: &DeployService, request: &DeployRequest, output: &Path) -> Result<()> {
    let packaged = service.package(request).await?;

    std::fs::write(output, &packaged.bytes)
        .with_context(|| format!("Failed to write archive to {}", output.display()))?;

    info!(
        function = %packaged.context.function_id(),
        path = %output.display(),
        bytes = packaged.bytes.len(),
        "Archive written"
    );
    println!("{}  {}", packaged.digest, output.display());
    Ok(())
}

async fn cmd_move_alias(service: &DeployService, request: &DeployRequest, version: &str) -> Result<()> {
    let result = service.repair_alias(request, version).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
