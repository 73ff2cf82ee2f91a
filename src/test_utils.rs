// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mocked Kubernetes API and recording fakes for the
//! provisioner's collaborators.

use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

use crate::arn::{AccountId, PolicyArn, RoleArn};
use crate::aws::{CloudApi, CloudFailure};
use crate::command::{CommandError, CommandOutput, CommandRunner, Invocation};
use crate::kubernetes::ClusterApi;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(("GET".to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Add a response for POST requests matching the exact path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(("POST".to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Build a kube Client from this mock service, with "default" as default namespace
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// Whether a request with this method and path was served
    pub fn received(&self, method: &str, path: &str) -> bool {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .any(|(m, p)| m == method && p == path)
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        for ((m, p), resp) in responses.iter() {
            if m == method && path.starts_with(p) {
                return Some(resp.clone());
            }
        }

        None
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let response = self.find_response(&method, &path);
        self.requests.lock().unwrap().push((method, path));

        Box::pin(async move {
            let (status, body) = response
                .unwrap_or_else(|| (404, status_json(404, "NotFound", "not found")));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a mock namespace JSON response
pub fn namespace_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        }
    })
    .to_string()
}

/// Create a mock service account JSON response in the default namespace
pub fn service_account_json(name: &str, annotations: &[(&str, &str)]) -> String {
    let annotations: BTreeMap<&str, &str> = annotations.iter().copied().collect();
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "ServiceAccount",
        "metadata": {
            "name": name,
            "namespace": "default",
            "annotations": annotations
        }
    })
    .to_string()
}

/// Create a mock list JSON response
pub fn list_json(kind: &str, items: Vec<serde_json::Value>) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": kind,
        "metadata": {"resourceVersion": "1"},
        "items": items
    })
    .to_string()
}

/// Create a Status failure response
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// A call made to one of the fake collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CallerIdentity,
    CreateRole(String),
    GetRole(String),
    CreatePolicy(String),
    GetPolicy(String),
    AttachRolePolicy(String, String),
    LookupServiceAccount(String),
    EnsureNamespace(String),
    LookupRelease(String),
    /// Full command line of a subprocess
    Command(String),
}

impl Call {
    pub fn is_command(&self, prefix: &str) -> bool {
        matches!(self, Call::Command(line) if line.starts_with(prefix))
    }
}

/// Ordered record of every call made during a test, shared by all fakes
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Command(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }
}

/// Operations of [`FakeCloud`] that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudOp {
    CallerIdentity,
    CreateRole,
    GetRole,
    CreatePolicy,
    GetPolicy,
    AttachRolePolicy,
}

/// In-memory IAM/STS that records calls
pub struct FakeCloud {
    log: CallLog,
    account_id: String,
    role_path: String,
    failures: HashMap<CloudOp, CloudFailure>,
}

impl FakeCloud {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            account_id: "123456789012".to_string(),
            role_path: "/".to_string(),
            failures: HashMap::new(),
        }
    }

    pub fn with_account(mut self, account_id: &str) -> Self {
        self.account_id = account_id.to_string();
        self
    }

    /// Roles are reported under this IAM path, e.g. "/ci/"
    pub fn with_role_path(mut self, path: &str) -> Self {
        self.role_path = path.to_string();
        self
    }

    pub fn failing(mut self, op: CloudOp, failure: CloudFailure) -> Self {
        self.failures.insert(op, failure);
        self
    }

    fn check(&self, op: CloudOp) -> Result<(), CloudFailure> {
        match self.failures.get(&op) {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    fn role_arn(&self, role_name: &str) -> RoleArn {
        RoleArn::new(format!(
            "arn:aws:iam::{}:role{}{}",
            self.account_id, self.role_path, role_name
        ))
    }
}

impl CloudApi for FakeCloud {
    async fn caller_account_id(&self) -> Result<AccountId, CloudFailure> {
        self.log.push(Call::CallerIdentity);
        self.check(CloudOp::CallerIdentity)?;
        Ok(AccountId::new(self.account_id.clone()))
    }

    async fn create_role(&self, role_name: &str, _trust_policy: &str) -> Result<RoleArn, CloudFailure> {
        self.log.push(Call::CreateRole(role_name.to_string()));
        self.check(CloudOp::CreateRole)?;
        Ok(self.role_arn(role_name))
    }

    async fn get_role(&self, role_name: &str) -> Result<RoleArn, CloudFailure> {
        self.log.push(Call::GetRole(role_name.to_string()));
        self.check(CloudOp::GetRole)?;
        Ok(self.role_arn(role_name))
    }

    async fn create_policy(
        &self,
        policy_name: &str,
        _description: &str,
        _document: &str,
    ) -> Result<PolicyArn, CloudFailure> {
        self.log.push(Call::CreatePolicy(policy_name.to_string()));
        self.check(CloudOp::CreatePolicy)?;
        Ok(PolicyArn::new(format!(
            "arn:aws:iam::{}:policy/{}",
            self.account_id, policy_name
        )))
    }

    async fn get_policy(&self, policy_arn: &PolicyArn) -> Result<PolicyArn, CloudFailure> {
        self.log.push(Call::GetPolicy(policy_arn.to_string()));
        self.check(CloudOp::GetPolicy)?;
        Ok(policy_arn.clone())
    }

    async fn attach_role_policy(
        &self,
        role_name: &str,
        policy_arn: &PolicyArn,
    ) -> Result<(), CloudFailure> {
        self.log
            .push(Call::AttachRolePolicy(role_name.to_string(), policy_arn.to_string()));
        self.check(CloudOp::AttachRolePolicy)
    }
}

/// In-memory cluster state that records lookups
pub struct FakeCluster {
    log: CallLog,
    service_account: Option<BTreeMap<String, String>>,
    release_installed: bool,
    failing: bool,
}

impl FakeCluster {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            service_account: None,
            release_installed: false,
            failing: false,
        }
    }

    pub fn with_service_account(mut self, annotations: &[(&str, &str)]) -> Self {
        self.service_account = Some(
            annotations
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn with_release(mut self) -> Self {
        self.release_installed = true;
        self
    }

    /// Every API call answers with a 500
    pub fn unavailable(mut self) -> Self {
        self.failing = true;
        self
    }

    fn check(&self) -> kube::Result<()> {
        if self.failing {
            return Err(kube::Error::Api(kube::core::ErrorResponse {
                status: "Failure".to_string(),
                message: "cluster unavailable".to_string(),
                reason: "InternalError".to_string(),
                code: 500,
            }));
        }
        Ok(())
    }
}

impl ClusterApi for FakeCluster {
    async fn service_account_annotations(
        &self,
        name: &str,
    ) -> kube::Result<Option<BTreeMap<String, String>>> {
        self.log.push(Call::LookupServiceAccount(name.to_string()));
        self.check()?;
        Ok(self.service_account.clone())
    }

    async fn ensure_namespace(&self, namespace: &str) -> kube::Result<()> {
        self.log.push(Call::EnsureNamespace(namespace.to_string()));
        self.check()
    }

    async fn release_exists(&self, _namespace: &str, release: &str) -> kube::Result<bool> {
        self.log.push(Call::LookupRelease(release.to_string()));
        self.check()?;
        Ok(self.release_installed)
    }
}

/// Command runner that records command lines instead of spawning processes
pub struct FakeRunner {
    log: CallLog,
    /// Command line prefix -> exit code
    exit_codes: Vec<(String, i32)>,
    timeouts: Vec<String>,
}

impl FakeRunner {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            exit_codes: Vec::new(),
            timeouts: Vec::new(),
        }
    }

    /// Commands starting with `prefix` exit with `code` and an error on stderr
    pub fn exiting(mut self, prefix: &str, code: i32) -> Self {
        self.exit_codes.push((prefix.to_string(), code));
        self
    }

    /// Commands starting with `prefix` time out
    pub fn hanging(mut self, prefix: &str) -> Self {
        self.timeouts.push(prefix.to_string());
        self
    }
}

impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        let line = invocation.to_string();
        self.log.push(Call::Command(line.clone()));

        if self.timeouts.iter().any(|prefix| line.starts_with(prefix)) {
            return Err(CommandError::TimedOut {
                command: line,
                timeout: Duration::from_secs(1),
            });
        }

        let code = self
            .exit_codes
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix))
            .map(|(_, code)| *code)
            .unwrap_or(0);

        Ok(CommandOutput {
            code: Some(code),
            stdout: format!("ran {}", invocation.program()),
            stderr: if code == 0 {
                String::new()
            } else {
                format!("Error: {} failed", invocation.program())
            },
        })
    }
}

/// Collects formatted log output for assertions
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// A plain-text subscriber writing events up to `level` into this capture
    pub fn subscriber(&self, level: Level) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(self.clone())
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
