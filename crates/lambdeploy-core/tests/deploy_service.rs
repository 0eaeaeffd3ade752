use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use lambdeploy_core::{
    DeployConfig, DeployError, DeployRequest, DeployService, ZipArchiveBuilder,
};
use lambdeploy_lambda::fakes::MemoryFunctionService;
use lambdeploy_lambda::{FunctionId, FunctionPublisher, LambdaError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const HASH: &str = "ppXhTRJpPHDOzHraN7A7GXaCoVi6jr1u9OEzqgW3";

const CONFIG: &str = r#"{
    "lambdaFunctions": [
        {
            "functionName": "orders",
            "zipContents": ["index.js", "lib/"],
            "environments": [
                { "envName": "prod", "liveAliasName": "LIVE" },
                { "envName": "staging", "nodeEnvValue": "development", "liveAliasName": "CURRENT" }
            ]
        },
        {
            "functionName": "billing",
            "zipContents": ["handler.js"],
            "environments": [
                { "envName": "prod", "liveAliasName": "LIVE" },
                { "envName": "prod", "liveAliasName": "CURRENT" }
            ]
        }
    ]
}"#;

fn write_project(root: &Path) {
    std::fs::create_dir_all(root.join("lib")).unwrap();
    std::fs::write(root.join("index.js"), "exports.handler = require('./lib/a');").unwrap();
    std::fs::write(root.join("lib/a.js"), "module.exports = 'a';").unwrap();
    std::fs::write(root.join("lib/b.js"), "module.exports = 'b';").unwrap();
    std::fs::write(root.join("handler.js"), "exports.handler = () => 1;").unwrap();
}

fn fake_service() -> Arc<MemoryFunctionService> {
    Arc::new(
        MemoryFunctionService::new()
            .with_alias("orders_prod", "LIVE", "$LATEST")
            .with_alias("orders_staging", "CURRENT", "$LATEST")
            .with_alias("billing_prod", "LIVE", "$LATEST"),
    )
}

fn make_service(root: &Path, fake: &Arc<MemoryFunctionService>) -> DeployService {
    let config = DeployConfig::from_json(CONFIG).expect("config");
    config.validate().expect("valid config");
    DeployService::new(
        config,
        root,
        Arc::new(ZipArchiveBuilder::new()),
        fake.clone(),
        fake.clone(),
    )
}

fn zip_entries(bytes: &[u8]) -> Vec<(String, String)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut content = String::new();
            file.read_to_string(&mut content).unwrap();
            (file.name().to_string(), content)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// deploy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deploy_resolves_config_and_goes_live() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());
    let fake = fake_service();
    let service = make_service(dir.path(), &fake);

    let request = DeployRequest::new("orders", "prod", HASH).unwrap();
    let result = service.deploy(&request).await.expect("deploy");

    assert_eq!(result.function_name, "orders_prod");
    assert_eq!(result.alias_name, "LIVE");
    assert_eq!(result.function_version, "1");
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!({
            "FunctionName": "orders_prod",
            "AliasName": "LIVE",
            "FunctionVersion": "1",
        })
    );

    let stored = fake.archive("orders_prod", "1").expect("published archive");
    let entries = zip_entries(&stored);
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["index.js", "lib/a.js", "lib/b.js", ".env"]);
    assert_eq!(entries.last().unwrap().1, "NODE_ENV=prod");
}

#[tokio::test]
async fn deploy_uses_node_env_override_and_env_alias() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());
    let fake = fake_service();
    let service = make_service(dir.path(), &fake);

    let request = DeployRequest::new("orders", "staging", HASH).unwrap();
    let result = service.deploy(&request).await.unwrap();

    assert_eq!(result.function_name, "orders_staging");
    assert_eq!(result.alias_name, "CURRENT");
    assert_eq!(fake.alias_target("orders_staging", "CURRENT").as_deref(), Some("1"));
    assert_eq!(fake.alias_target("orders_prod", "LIVE").as_deref(), Some("$LATEST"));

    let entries = zip_entries(&fake.archive("orders_staging", "1").unwrap());
    assert_eq!(entries.last().unwrap().1, "NODE_ENV=development");
}

#[test]
fn short_commit_hash_rejected_before_any_work() {
    let err = DeployRequest::from_parts(
        Some("orders".to_string()),
        Some("prod".to_string()),
        Some("abc123".to_string()),
    )
    .unwrap_err();

    assert!(matches!(err, DeployError::InvalidRequest(_)));
    assert_eq!(err.stage(), None);
}

#[tokio::test]
async fn ambiguous_environment_never_reaches_the_service() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());
    let fake = fake_service();
    let service = make_service(dir.path(), &fake);

    let request = DeployRequest::new("billing", "prod", HASH).unwrap();
    let err = service.deploy(&request).await.unwrap_err();

    assert!(matches!(err, DeployError::Configuration(_)));
    assert_eq!(fake.publish_calls(), 0);
    assert_eq!(fake.alias_move_calls(), 0);
}

#[tokio::test]
async fn unknown_function_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let fake = fake_service();
    let service = make_service(dir.path(), &fake);

    let request = DeployRequest::new("inventory", "prod", HASH).unwrap();
    let err = service.deploy(&request).await.unwrap_err();

    assert!(matches!(err, DeployError::Configuration(ref m) if m.contains("inventory")));
    assert_eq!(fake.publish_calls(), 0);
}

#[tokio::test]
async fn missing_file_in_project_stops_deploy() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.js"), "x").unwrap();
    let fake = fake_service();
    let service = make_service(dir.path(), &fake);

    let request = DeployRequest::new("orders", "prod", HASH).unwrap();
    let err = service.deploy(&request).await.unwrap_err();

    assert!(matches!(err, DeployError::MissingManifestEntry { ref entry } if entry == "lib/"));
    assert_eq!(fake.publish_calls(), 0);
}

// ---------------------------------------------------------------------------
// package
// ---------------------------------------------------------------------------

#[tokio::test]
async fn package_builds_archive_without_publishing() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());
    let fake = fake_service();
    let service = make_service(dir.path(), &fake);

    let request = DeployRequest::new("orders", "prod", HASH).unwrap();
    let packaged = service.package(&request).await.expect("package");

    assert_eq!(packaged.context.function_id().as_str(), "orders_prod");
    assert_eq!(packaged.digest, lambdeploy_core::archive_digest(&packaged.bytes));
    assert_eq!(packaged.digest.len(), 64);
    assert_eq!(zip_entries(&packaged.bytes).len(), 4);
    assert_eq!(fake.publish_calls(), 0);
    assert_eq!(fake.alias_move_calls(), 0);
}

// ---------------------------------------------------------------------------
// repair_alias
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repair_alias_moves_alias_to_stranded_version() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());
    let fake = fake_service();
    let service = make_service(dir.path(), &fake);
    fake.fail_next_alias_move(LambdaError::Throttled("rate exceeded".to_string()));

    let request = DeployRequest::new("orders", "prod", HASH).unwrap();
    let err = service.deploy(&request).await.unwrap_err();
    let stranded = match err {
        DeployError::AliasUpdateFailed { version, .. } => version,
        other => panic!("expected AliasUpdateFailed, got {other:?}"),
    };
    assert_eq!(fake.alias_target("orders_prod", "LIVE").as_deref(), Some("$LATEST"));

    let result = service.repair_alias(&request, &stranded).await.expect("repair");

    assert_eq!(result.function_version, stranded);
    assert_eq!(fake.alias_target("orders_prod", "LIVE").as_deref(), Some("1"));
    assert_eq!(fake.publish_calls(), 1);
}

#[tokio::test]
async fn repair_alias_to_unknown_version_fails() {
    let dir = tempfile::tempdir().unwrap();
    let fake = fake_service();
    fake.publish(&FunctionId::qualified("orders", "prod"), b"code".to_vec())
        .await
        .unwrap();
    let service = make_service(dir.path(), &fake);

    let request = DeployRequest::new("orders", "prod", HASH).unwrap();
    let err = service.repair_alias(&request, "42").await.unwrap_err();

    assert!(matches!(
        err,
        DeployError::AliasUpdateFailed { source: LambdaError::VersionNotFound { .. }, ref version, .. }
            if version == "42"
    ));
    assert_eq!(fake.alias_target("orders_prod", "LIVE").as_deref(), Some("$LATEST"));
}
