// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use backoffice_app::{ApiFailure, HttpMethod, Route, Transport};
use reqwest::blocking::Client as HttpClient;
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Blocking HTTP access to the resource API.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    token: Option<String>,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration, token: Option<&str>) -> Result<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let mut base_url = Url::parse(trimmed).with_context(|| {
            format!("parse api.base_url {trimmed:?} -- use a full URL like http://localhost:3000/api")
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "api.base_url {trimmed:?} uses scheme {:?} -- use http or https",
                base_url.scheme()
            );
        }
        // Joining relative paths keeps the last segment only with a trailing slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            token: token
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_owned),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ApiFailure> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|error| ApiFailure::NoResponse {
                detail: format!("invalid request path {path:?}: {error}"),
            })
    }
}

impl Transport for Client {
    fn send(&self, route: &Route) -> Result<Value, ApiFailure> {
        let url = self.endpoint(&route.path)?;
        debug!(method = route.method.as_str(), %url, "sending request");

        let mut request = self.http.request(method(route.method), url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &route.body {
            request = request.json(body);
        }

        let response = request.send().map_err(transport_failure)?;
        let status = response.status();
        let text = response.text().map_err(transport_failure)?;
        debug!(%route, status = status.as_u16(), "response received");

        if !status.is_success() {
            return Err(error_response(status, &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|error| ApiFailure::Decode {
            detail: format!("{route}: {error}"),
        })
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn transport_failure(error: reqwest::Error) -> ApiFailure {
    if error.is_timeout() {
        return ApiFailure::Timeout;
    }
    ApiFailure::NoResponse {
        detail: error.to_string(),
    }
}

fn error_response(status: StatusCode, body: &str) -> ApiFailure {
    let status = status.as_u16();
    if let Ok(parsed) = serde_json::from_str::<Value>(body) {
        return ApiFailure::response(status, parsed);
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('<') {
        return ApiFailure::response(status, json!({ "message": trimmed }));
    }

    ApiFailure::Response { status, body: None }
}
