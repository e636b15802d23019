//! Test plan generation
//!
//! Sends a raw spec to the generation service and publishes what comes back
//! into the workspace: the annotated spec as `swagger_meqa.yaml` and one
//! `<plan>.yaml` per generated test plan.
//!
//! Publishing is not atomic. Files are overwritten in place one by one, and a
//! failed write leaves the files written before it on disk.

mod service;

pub use service::{
    GenerationRequest, GenerationService, HttpGenerationService, ServiceResponse,
    DEFAULT_SERVER_URL, MAX_REDIRECTS,
};

use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::common::paths::{annotated_spec_path, is_plain_file_stem, plan_path};
use crate::common::{Error, Result, WorkspaceConfig};

/// Files written by a successful generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    pub annotated_spec: PathBuf,
    pub plans: Vec<PathBuf>,
}

/// A response that passed validation, ready to be written out
#[derive(Debug)]
struct GeneratedArtifacts {
    annotated_spec: String,
    test_plans: BTreeMap<String, String>,
}

/// Generate test plans for the spec at `swagger_path` into `workspace`
pub async fn generate(
    workspace: &Path,
    swagger_path: &Path,
    service: &dyn GenerationService,
) -> Result<GenerationSummary> {
    let config = WorkspaceConfig::load(workspace)?;
    let api_key = config.api_key().ok_or_else(|| {
        Error::Config(format!("api_key not found in {}", config.path().display()))
    })?;

    // Invalid UTF-8 is replaced, not rejected
    let bytes = std::fs::read(swagger_path).map_err(|e| Error::file_read(swagger_path, e))?;
    let swagger = String::from_utf8_lossy(&bytes).into_owned();

    let request = GenerationRequest {
        api_key: api_key.to_string(),
        swagger,
    };
    let response = service.submit(&request).await?;

    if response.status >= 300 {
        return Err(Error::Service {
            status: response.status,
            body: response.body,
        });
    }

    let artifacts = parse_response(&response)?;
    publish(workspace, &artifacts)
}

/// Validate the whole response before anything touches the workspace
///
/// A 2xx status alone doesn't make a response usable.
fn parse_response(response: &ServiceResponse) -> Result<GeneratedArtifacts> {
    let protocol = |reason: &str| Error::protocol(response.status, reason, &response.body);

    let body: Value = serde_json::from_str(&response.body)
        .map_err(|e| protocol(&format!("body is not JSON: {e}")))?;
    let Value::Object(mut fields) = body else {
        return Err(protocol("body is not a JSON object"));
    };

    let annotated_spec = match fields.remove("swagger_meqa") {
        Some(Value::String(text)) => text,
        Some(_) => return Err(protocol("swagger_meqa is not a string")),
        None => return Err(protocol("swagger_meqa is missing")),
    };

    let mut test_plans = BTreeMap::new();
    match fields.remove("test_plans") {
        None | Some(Value::Null) => {
            tracing::warn!("generation service returned no test_plans");
        }
        Some(Value::Object(plans)) => {
            for (name, text) in plans {
                if !is_plain_file_stem(&name) {
                    return Err(protocol(&format!("invalid test plan name {name:?}")));
                }
                let Value::String(text) = text else {
                    return Err(protocol(&format!("test plan {name:?} is not a string")));
                };
                test_plans.insert(name, text);
            }
        }
        Some(_) => return Err(protocol("test_plans is not an object")),
    }

    Ok(GeneratedArtifacts {
        annotated_spec,
        test_plans,
    })
}

/// Write the annotated spec, then each plan in name order
///
/// Stops at the first failed write; earlier files stay in place.
fn publish(workspace: &Path, artifacts: &GeneratedArtifacts) -> Result<GenerationSummary> {
    let annotated_spec = annotated_spec_path(workspace);
    write_artifact(&annotated_spec, &artifacts.annotated_spec)?;
    tracing::info!(path = %annotated_spec.display(), "wrote annotated spec");

    let mut plans = Vec::with_capacity(artifacts.test_plans.len());
    for (name, text) in &artifacts.test_plans {
        let path = plan_path(workspace, name);
        write_artifact(&path, text)?;
        tracing::info!(plan = %name, path = %path.display(), "wrote test plan");
        plans.push(path);
    }

    Ok(GenerationSummary {
        annotated_spec,
        plans,
    })
}

/// Create or truncate `path` with mode 0644 and write `contents`
fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let mut file = options.open(path).map_err(|e| Error::file_write(path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| Error::file_write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::paths::{config_path, ANNOTATED_SPEC_FILE, CONFIG_FILE};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Returns a canned response and remembers what it was sent
    struct StubService {
        status: u16,
        body: String,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl StubService {
        fn new(status: u16, body: impl Into<String>) -> Self {
            Self {
                status,
                body: body.into(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GenerationService for StubService {
        async fn submit(&self, request: &GenerationRequest) -> Result<ServiceResponse> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(ServiceResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    fn workspace_with_spec() -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let spec = dir.path().join("swagger.yaml");
        std::fs::write(&spec, "swagger: '2.0'\nhost: pets.test\n").unwrap();
        (dir, spec)
    }

    /// Workspace entries other than the config file and the input spec
    fn generated_files(workspace: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(workspace)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n != CONFIG_FILE && n != "swagger.yaml")
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_generate_writes_spec_and_plans() {
        let (dir, spec) = workspace_with_spec();
        let body = serde_json::json!({
            "swagger_meqa": "annotated: true\n",
            "test_plans": {"simple": "suite: []\n", "object": "other: []\n"},
        });
        let service = StubService::new(200, body.to_string());

        let summary = generate(dir.path(), &spec, &service).await.unwrap();

        assert_eq!(summary.annotated_spec, dir.path().join(ANNOTATED_SPEC_FILE));
        assert_eq!(
            summary.plans,
            vec![dir.path().join("object.yaml"), dir.path().join("simple.yaml")]
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join(ANNOTATED_SPEC_FILE)).unwrap(),
            "annotated: true\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("simple.yaml")).unwrap(),
            "suite: []\n"
        );

        let requests = service.requests.lock().unwrap();
        let config = WorkspaceConfig::load(dir.path()).unwrap();
        assert_eq!(Some(requests[0].api_key.as_str()), config.api_key());
        assert_eq!(requests[0].swagger, "swagger: '2.0'\nhost: pets.test\n");
    }

    #[tokio::test]
    async fn test_generate_overwrites_existing_files() {
        let (dir, spec) = workspace_with_spec();
        std::fs::write(dir.path().join(ANNOTATED_SPEC_FILE), "old old old old\n").unwrap();
        std::fs::write(dir.path().join("simple.yaml"), "stale plan content\n").unwrap();
        let body = serde_json::json!({
            "swagger_meqa": "new\n",
            "test_plans": {"simple": "fresh\n"},
        });

        generate(dir.path(), &spec, &StubService::new(201, body.to_string()))
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join(ANNOTATED_SPEC_FILE)).unwrap(),
            "new\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("simple.yaml")).unwrap(),
            "fresh\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_generated_files_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, spec) = workspace_with_spec();
        let body = serde_json::json!({"swagger_meqa": "x", "test_plans": {"p": "y"}});
        generate(dir.path(), &spec, &StubService::new(200, body.to_string()))
            .await
            .unwrap();

        let mode = std::fs::metadata(dir.path().join("p.yaml"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o044, 0o044);
    }

    #[tokio::test]
    async fn test_service_error_leaves_workspace_clean() {
        let (dir, spec) = workspace_with_spec();
        let service = StubService::new(404, "no such endpoint");

        let err = generate(dir.path(), &spec, &service).await.unwrap_err();

        match err {
            Error::Service { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "no such endpoint");
            }
            other => panic!("Expected Service error, got {other:?}"),
        }
        assert!(generated_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_success_status_without_spec_is_protocol_error() {
        let (dir, spec) = workspace_with_spec();
        let body = r#"{"test_plans": {"simple": "x"}}"#;

        let err = generate(dir.path(), &spec, &StubService::new(200, body))
            .await
            .unwrap_err();

        match err {
            Error::Protocol { status, body: raw, .. } => {
                assert_eq!(status, 200);
                assert_eq!(raw, body);
            }
            other => panic!("Expected Protocol error, got {other:?}"),
        }
        assert!(generated_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_malformed_responses_are_protocol_errors() {
        let bodies = [
            "not json at all",
            "[1, 2, 3]",
            r#"{"swagger_meqa": 42}"#,
            r#"{"swagger_meqa": "x", "test_plans": "nope"}"#,
            r#"{"swagger_meqa": "x", "test_plans": {"a": 1}}"#,
            r#"{"swagger_meqa": "x", "test_plans": {"../escape": "y"}}"#,
        ];

        for body in bodies {
            let (dir, spec) = workspace_with_spec();
            let err = generate(dir.path(), &spec, &StubService::new(200, body))
                .await
                .unwrap_err();
            assert!(
                matches!(err, Error::Protocol { .. }),
                "body {body:?} gave {err:?}"
            );
            assert!(generated_files(dir.path()).is_empty(), "body {body:?}");
        }
    }

    #[tokio::test]
    async fn test_missing_test_plans_means_no_plans() {
        let (dir, spec) = workspace_with_spec();
        let summary = generate(
            dir.path(),
            &spec,
            &StubService::new(200, r#"{"swagger_meqa": "x"}"#),
        )
        .await
        .unwrap();

        assert!(summary.plans.is_empty());
        assert_eq!(generated_files(dir.path()), vec![ANNOTATED_SPEC_FILE]);
    }

    #[tokio::test]
    async fn test_partial_publish_is_not_rolled_back() {
        let (dir, spec) = workspace_with_spec();
        // A directory where the second plan should go makes that write fail
        std::fs::create_dir(dir.path().join("b.yaml")).unwrap();
        let body = serde_json::json!({
            "swagger_meqa": "annotated\n",
            "test_plans": {"a": "first\n", "b": "second\n", "c": "third\n"},
        });

        let err = generate(dir.path(), &spec, &StubService::new(200, body.to_string()))
            .await
            .unwrap_err();

        match &err {
            Error::FileWrite { path, .. } => assert!(path.ends_with("b.yaml")),
            other => panic!("Expected FileWrite error, got {other:?}"),
        }
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.yaml")).unwrap(),
            "first\n"
        );
        assert!(dir.path().join(ANNOTATED_SPEC_FILE).exists());
        assert!(!dir.path().join("c.yaml").exists());
    }

    #[tokio::test]
    async fn test_missing_api_key_skips_network() {
        let (dir, spec) = workspace_with_spec();
        std::fs::write(config_path(dir.path()), "someone: else\n").unwrap();
        let service = StubService::new(200, r#"{"swagger_meqa": "x"}"#);

        let err = generate(dir.path(), &spec, &service).await.unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains(CONFIG_FILE));
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_spec_skips_network() {
        let dir = tempdir().unwrap();
        let service = StubService::new(200, r#"{"swagger_meqa": "x"}"#);

        let err = generate(dir.path(), &dir.path().join("missing.yaml"), &service)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::FileRead { .. }));
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_utf8_spec_is_sent_lossily() {
        let dir = tempdir().unwrap();
        let spec = dir.path().join("swagger.yaml");
        std::fs::write(&spec, b"swagger: '2.0'\ntitle: caf\xe9\n").unwrap();
        let service = StubService::new(200, r#"{"swagger_meqa": "annotated"}"#);

        generate(dir.path(), &spec, &service).await.unwrap();

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].swagger, "swagger: '2.0'\ntitle: caf\u{FFFD}\n");
    }
}
