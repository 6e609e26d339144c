// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use backoffice_app::{ApiFailure, RequestId, Route, ScreenKind, Transport};
use backoffice_tui::{AppRuntime, InternalEvent};
use serde_json::Value;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use tracing::debug;

/// Runs every request on its own worker thread so the console keeps
/// drawing while calls are in flight.
pub struct ThreadRuntime<T> {
    transport: Arc<T>,
}

impl<T> ThreadRuntime<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }
}

impl<T> AppRuntime for ThreadRuntime<T>
where
    T: Transport + Send + Sync + 'static,
{
    fn execute(&mut self, route: &Route) -> Result<Value, ApiFailure> {
        self.transport.send(route)
    }

    fn spawn_request(
        &mut self,
        screen: ScreenKind,
        request: RequestId,
        route: Route,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let transport = Arc::clone(&self.transport);
        thread::Builder::new()
            .name(format!("request-{request}"))
            .spawn(move || {
                let outcome = transport.send(&route);
                if let Err(failure) = &outcome {
                    debug!(%request, %route, %failure, "request failed");
                }
                // The console may already be gone; nothing is waiting then.
                let _ = tx.send(InternalEvent::Reply {
                    screen,
                    request,
                    outcome,
                });
            })
            .context("spawn request worker thread")?;
        Ok(())
    }
}
