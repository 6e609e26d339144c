// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub const FIELDS_MESSAGE: &str = "Please correct the indicated fields.";
pub const CONNECTION_MESSAGE: &str = "Connection error: the server could not be reached.";
pub const TIMEOUT_MESSAGE: &str = "The request took too long -- try again.";
pub const AUTHORIZATION_MESSAGE: &str =
    "You are not permitted to do this, or your session has expired -- sign in again.";
pub const FALLBACK_MESSAGE: &str = "Something went wrong -- try again.";

/// A remote call that did not produce a usable success payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiFailure {
    #[error("server returned {status}")]
    Response { status: u16, body: Option<Value> },
    #[error("no response from server: {detail}")]
    NoResponse { detail: String },
    #[error("request timed out")]
    Timeout,
    #[error("malformed response: {detail}")]
    Decode { detail: String },
}

impl ApiFailure {
    pub fn response(status: u16, body: Value) -> Self {
        Self::Response {
            status,
            body: Some(body),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ServerValidation,
    Authorization,
    Server,
    Transport,
    Unknown,
}

/// What the user is told about a failed call. Built fresh from each
/// failure; never merged with an earlier envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub kind: ErrorKind,
    pub general_message: Option<String>,
    pub field_errors: BTreeMap<String, String>,
}

impl ErrorEnvelope {
    pub fn general(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            general_message: Some(message.into()),
            field_errors: BTreeMap::new(),
        }
    }

    /// One line suitable for a transient notification.
    pub fn summary(&self) -> &str {
        self.general_message.as_deref().unwrap_or(FIELDS_MESSAGE)
    }
}

pub fn map_error(failure: &ApiFailure) -> ErrorEnvelope {
    match failure {
        ApiFailure::Response { status, body } => {
            let body = body.as_ref();
            if let Some(envelope) = body.and_then(validation_envelope) {
                return envelope;
            }
            if matches!(status, 401 | 403) {
                return ErrorEnvelope::general(ErrorKind::Authorization, AUTHORIZATION_MESSAGE);
            }
            if let Some(message) = body.and_then(message_text) {
                return ErrorEnvelope::general(ErrorKind::Server, message);
            }
            ErrorEnvelope::general(ErrorKind::Unknown, FALLBACK_MESSAGE)
        }
        ApiFailure::NoResponse { .. } => {
            ErrorEnvelope::general(ErrorKind::Transport, CONNECTION_MESSAGE)
        }
        ApiFailure::Timeout => ErrorEnvelope::general(ErrorKind::Transport, TIMEOUT_MESSAGE),
        ApiFailure::Decode { .. } => ErrorEnvelope::general(ErrorKind::Unknown, FALLBACK_MESSAGE),
    }
}

fn validation_envelope(body: &Value) -> Option<ErrorEnvelope> {
    let entries = body.get("errors")?.as_array()?;
    let mut field_errors = BTreeMap::new();
    let mut general = Vec::new();

    for entry in entries {
        if let Some(text) = entry.as_str() {
            general.push(text.to_owned());
            continue;
        }
        let Some(message) = entry
            .get("msg")
            .or_else(|| entry.get("message"))
            .and_then(Value::as_str)
        else {
            continue;
        };
        match entry.get("path").and_then(Value::as_str) {
            Some(path) if !path.is_empty() => {
                field_errors
                    .entry(path.to_owned())
                    .or_insert_with(|| message.to_owned());
            }
            _ => general.push(message.to_owned()),
        }
    }

    if field_errors.is_empty() && general.is_empty() {
        return None;
    }

    let general_message = if general.is_empty() {
        FIELDS_MESSAGE.to_owned()
    } else {
        general.join("; ")
    };
    Some(ErrorEnvelope {
        kind: ErrorKind::ServerValidation,
        general_message: Some(general_message),
        field_errors,
    })
}

fn message_text(body: &Value) -> Option<String> {
    let candidates = [
        body.get("message"),
        body.get("error"),
        body.get("error").and_then(|error| error.get("message")),
        body.as_str().map(|_| body),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_owned)
}
