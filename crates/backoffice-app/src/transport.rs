// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::Value;
use std::fmt;

use crate::{ApiFailure, RecordStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// One HTTP exchange against the resource API, relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method.as_str(), self.path)
    }
}

/// The calls a resource screen makes.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall<Id> {
    List,
    FetchOne(Id),
    Create(Value),
    Update(Id, Value),
    SetStatus(Id, RecordStatus),
    Delete(Id),
}

impl<Id: fmt::Display> ApiCall<Id> {
    pub fn route(&self, collection: &str) -> Route {
        let collection = collection.trim_end_matches('/');
        let (method, path, body) = match self {
            Self::List => (HttpMethod::Get, collection.to_owned(), None),
            Self::FetchOne(id) => (HttpMethod::Get, format!("{collection}/{id}"), None),
            Self::Create(payload) => (HttpMethod::Post, collection.to_owned(), Some(payload.clone())),
            Self::Update(id, payload) => (
                HttpMethod::Put,
                format!("{collection}/{id}"),
                Some(payload.clone()),
            ),
            Self::SetStatus(id, status) => (
                HttpMethod::Patch,
                format!("{collection}/{id}/status"),
                Some(serde_json::json!({ "status": status.as_str() })),
            ),
            Self::Delete(id) => (HttpMethod::Delete, format!("{collection}/{id}"), None),
        };
        Route { method, path, body }
    }
}

/// Blocking access to the remote resource API. Implementations own the
/// wire; callers only see JSON bodies or an [`ApiFailure`].
pub trait Transport {
    fn send(&self, route: &Route) -> Result<Value, ApiFailure>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, route: &Route) -> Result<Value, ApiFailure> {
        (**self).send(route)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, route: &Route) -> Result<Value, ApiFailure> {
        (**self).send(route)
    }
}

/// Accepts a bare JSON array or a `{"data": [...]}` wrapper.
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut object) if object.contains_key("data") => {
            object.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
