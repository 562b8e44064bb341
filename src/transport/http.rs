// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! HTTP executor for the engine's REST/JSON protocol.
//!
//! Envelopes map onto endpoints as follows:
//!
//! ```text
//! search        POST   /{index}/_search
//! get           GET    /{index}/_doc/{id}
//! bulk          POST   /_bulk                 (application/x-ndjson)
//! index         PUT    /{index}/_doc/{id}     (POST /{index}/_doc without id)
//! update        POST   /{index}/_update/{id}
//! delete        DELETE /{index}/_doc/{id}
//! put_mapping   PUT    /{index}/_mapping
//! put_settings  PUT    /{index}/_settings
//! create_index  PUT    /{index}
//! ```
//!
//! `routing` metadata travels as a query parameter. `timestamp` stays on the
//! envelope only; the engine rejects it as a URL parameter. A 404 on
//! get or delete is an engine answer (`found: false` / `not_found`) and is
//! returned as a response, not an error.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::traits::{Executor, QueryError, TransportError};
use crate::config::{ConnectionConfig, ConnectionProfile};
use crate::search::{EnvelopeBody, OperationKind, RequestEnvelope};

/// Metadata keys forwarded as query parameters.
const QUERY_METADATA: [&str; 1] = ["routing"];

/// Method, path segments and query parameters for one envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
}

impl Route {
    /// Plan the endpoint for an envelope.
    pub fn plan(envelope: &RequestEnvelope) -> Result<Self, TransportError> {
        let index = envelope.collection.clone();
        let require_id = || {
            envelope.id().ok_or_else(|| {
                TransportError::Protocol(format!("{} request on '{}' has no id", envelope.kind, envelope.collection))
            })
        };

        let (method, segments) = match envelope.kind {
            OperationKind::Search => (Method::POST, vec![index, "_search".into()]),
            OperationKind::Get => (Method::GET, vec![index, "_doc".into(), require_id()?]),
            OperationKind::Bulk => (Method::POST, vec!["_bulk".into()]),
            OperationKind::Index => match envelope.id() {
                Some(id) => (Method::PUT, vec![index, "_doc".into(), id]),
                None => (Method::POST, vec![index, "_doc".into()]),
            },
            OperationKind::Update => (Method::POST, vec![index, "_update".into(), require_id()?]),
            OperationKind::Delete => (Method::DELETE, vec![index, "_doc".into(), require_id()?]),
            OperationKind::PutMapping => (Method::PUT, vec![index, "_mapping".into()]),
            OperationKind::PutSettings => (Method::PUT, vec![index, "_settings".into()]),
            OperationKind::CreateIndex => (Method::PUT, vec![index]),
        };

        if envelope.metadata.contains_key("timestamp") {
            debug!(kind = %envelope.kind, collection = %envelope.collection, "Timestamp metadata not sent");
        }

        let query = QUERY_METADATA
            .iter()
            .filter_map(|key| envelope.metadata_text(key).map(|v| (key.to_string(), v)))
            .collect();

        Ok(Self { method, segments, query })
    }

    /// Resolve against a host base URL.
    pub fn url(&self, host: &str) -> Result<Url, TransportError> {
        let mut url = Url::parse(host)
            .map_err(|e| TransportError::Connection(format!("invalid host '{}': {}", host, e)))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| TransportError::Connection(format!("host '{}' cannot be a base URL", host)))?;
            path.pop_if_empty();
            path.extend(self.segments.iter());
        }
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}

/// Render bulk lines as newline-delimited JSON (with trailing newline).
pub fn ndjson(lines: &[Value]) -> Result<String, TransportError> {
    let mut out = String::new();
    for line in lines {
        let encoded = serde_json::to_string(line).map_err(|e| TransportError::Protocol(e.to_string()))?;
        out.push_str(&encoded);
        out.push('\n');
    }
    Ok(out)
}

/// Executor backed by a pooled `reqwest` client.
///
/// Requests rotate across the profile's hosts. In-flight requests are capped
/// at the profile's `max_connections`; callers beyond the cap wait for a slot.
pub struct HttpExecutor {
    client: Client,
    hosts: Vec<String>,
    next_host: AtomicUsize,
    credentials: Option<(String, String)>,
    permits: Semaphore,
    timeout: Option<Duration>,
}

impl HttpExecutor {
    /// Build from a named profile.
    pub fn connect(config: &ConnectionConfig, profile: &str) -> Result<Self, QueryError> {
        Self::from_profile(config.profile(profile)?)
    }

    pub fn from_profile(profile: &ConnectionProfile) -> Result<Self, QueryError> {
        if profile.hosts.is_empty() {
            return Err(QueryError::Configuration("connection profile has no hosts".into()));
        }
        if profile.max_connections == 0 {
            return Err(QueryError::Configuration("max_connections must be at least 1".into()));
        }

        let timeout = profile.timeout_duration()?;
        let mut builder = Client::builder().pool_max_idle_per_host(profile.max_connections);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| QueryError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        debug!(hosts = ?profile.hosts, max_connections = profile.max_connections, "HTTP executor ready");

        Ok(Self {
            client,
            hosts: profile.hosts.clone(),
            next_host: AtomicUsize::new(0),
            credentials: profile
                .credentials()
                .map(|(user, pass)| (user.to_string(), pass.to_string())),
            permits: Semaphore::new(profile.max_connections),
            timeout,
        })
    }

    fn next_host(&self) -> &str {
        let i = self.next_host.fetch_add(1, Ordering::Relaxed) % self.hosts.len();
        &self.hosts[i]
    }

    fn request_for(&self, host: &str, envelope: &RequestEnvelope) -> Result<RequestBuilder, TransportError> {
        let route = Route::plan(envelope)?;
        let url = route.url(host)?;

        let mut request = self.client.request(route.method, url);
        if let Some((user, pass)) = &self.credentials {
            request = request.basic_auth(user, Some(pass));
        }
        request = match &envelope.body {
            EnvelopeBody::Empty => request,
            EnvelopeBody::Json(body) => request.json(body),
            EnvelopeBody::Lines(lines) => request
                .header(CONTENT_TYPE, "application/x-ndjson")
                .body(ndjson(lines)?),
        };
        Ok(request)
    }

    fn classify(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout.unwrap_or_default())
        } else if error.is_decode() {
            TransportError::Protocol(error.to_string())
        } else {
            TransportError::Connection(error.to_string())
        }
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn execute(&self, envelope: &RequestEnvelope) -> Result<Value, TransportError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| TransportError::Connection("connection pool closed".into()))?;

        let host = self.next_host();
        let request = self.request_for(host, envelope)?;
        let response = request.send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        let absent_document = status == StatusCode::NOT_FOUND
            && matches!(envelope.kind, OperationKind::Get | OperationKind::Delete);
        if !status.is_success() && !absent_document {
            let body = response.text().await.unwrap_or_default();
            warn!(host, kind = %envelope.kind, status = status.as_u16(), "Engine rejected request");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().await.map_err(|e| self.classify(e))
    }
}
