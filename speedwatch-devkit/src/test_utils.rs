/*!
Harness HTTP pour tester l'API du kernel

Construit un `AppState` complet (journal, poller sur sonde scriptée, santé)
et pilote le routeur via `tower::ServiceExt::oneshot`, sans socket.
Les réponses sont décodées en JSON ; un corps texte devient une chaîne.
*/

use anyhow::{anyhow, Context, Result};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use speedwatch_kernel::device::DevicePoller;
use speedwatch_kernel::health::HealthTracker;
use speedwatch_kernel::http::{build_router, AppState};
use speedwatch_kernel::records::{RecordStore, ViolationRecord};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use crate::fixtures::{fixture_port, sample_records};
use crate::probe_stub::ScriptedProbe;

/// Délai de sondage par défaut du harness (celui de l'app)
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(1500);

pub struct TestHarness {
    pub app: AppState,
    pub probe: Arc<ScriptedProbe>,
    router: Router,
}

impl TestHarness {
    /// Journal de démonstration, sonde scriptée vide (déconnectée)
    pub fn new() -> Self {
        Self::with_records(sample_records())
    }

    pub fn with_records(records: Vec<ViolationRecord>) -> Self {
        Self::build(records, Arc::new(ScriptedProbe::new()), DEFAULT_POLL_DELAY)
    }

    pub fn with_probe(probe: ScriptedProbe, delay: Duration) -> Self {
        Self::build(sample_records(), Arc::new(probe), delay)
    }

    fn build(records: Vec<ViolationRecord>, probe: Arc<ScriptedProbe>, delay: Duration) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let poller = DevicePoller::new(probe.clone(), delay);
        let app = AppState::new(RecordStore::new(records), fixture_port(), poller, HealthTracker::new());
        let router = build_router(app.clone());
        Self { app, probe, router }
    }

    /// Active la clé API ; le routeur est reconstruit sur le même état
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.app = self.app.with_api_key(Some(key.to_string()));
        self.router = build_router(self.app.clone());
        self
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method.clone()).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| anyhow!("router error: {e}"))?;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .with_context(|| format!("reading body of {method} {path}"))?
            .to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        log::debug!("{method} {path} -> {status}");
        Ok(TestResponse { status, body })
    }

    pub async fn get(&self, path: &str) -> Result<TestResponse> {
        self.request(Method::GET, path, None, &[]).await
    }

    pub async fn get_with_key(&self, path: &str, key: &str) -> Result<TestResponse> {
        self.request(Method::GET, path, None, &[("x-api-key", key)]).await
    }

    pub async fn post(&self, path: &str) -> Result<TestResponse> {
        self.request(Method::POST, path, None, &[]).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Result<TestResponse> {
        self.request(Method::POST, path, Some(body), &[]).await
    }

    pub async fn put_json(&self, path: &str, body: Value) -> Result<TestResponse> {
        self.request(Method::PUT, path, Some(body), &[]).await
    }

    pub async fn delete(&self, path: &str) -> Result<TestResponse> {
        self.request(Method::DELETE, path, None, &[]).await
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// Accès par chemin pointé : "filters.speed_bucket", "records.0.plate"
    pub fn field(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.body, |current, key| match current {
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            Value::Object(map) => map.get(key),
            _ => None,
        })
    }

    pub fn assert_status(&self, expected: StatusCode) -> Result<&Self> {
        if self.status != expected {
            return Err(anyhow!(
                "expected status {expected}, got {} (body: {})",
                self.status,
                self.body
            ));
        }
        Ok(self)
    }

    pub fn assert_field_equals(&self, path: &str, expected: &Value) -> Result<&Self> {
        let actual = self
            .field(path)
            .ok_or_else(|| anyhow!("field '{path}' not found in {}", self.body))?;
        if actual != expected {
            return Err(anyhow!("field '{path}': expected {expected}, got {actual}"));
        }
        Ok(self)
    }

    /// Liste `records` d'une réponse /violations
    pub fn records(&self) -> &[Value] {
        self.body
            .get("records")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
