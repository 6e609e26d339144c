// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use backoffice_app::{
    ApiFailure, Client, ClientId, HttpMethod, Payment, PaymentId, RecordStatus, Role, RoleId,
    Route, Transport, User, UserId, unwrap_data,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tracing::debug;

use crate::Dataset;

/// An in-process stand-in for the remote resource API. It keeps the four
/// collections in memory, answers REST routes with JSON, reports
/// validation failures the way the real server does and records every call.
#[derive(Debug)]
pub struct MemoryApi {
    inner: Mutex<Store>,
    latency: Duration,
}

#[derive(Debug)]
struct Store {
    data: Dataset,
    next_id: i64,
    calls: Vec<Route>,
    scripted: Vec<(String, ApiFailure)>,
}

type Reply = Result<Value, ApiFailure>;

impl MemoryApi {
    pub fn new(data: Dataset) -> Self {
        let next_id = max_id(&data) + 1;
        Self {
            inner: Mutex::new(Store {
                data,
                next_id,
                calls: Vec::new(),
                scripted: Vec::new(),
            }),
            latency: Duration::ZERO,
        }
    }

    /// Delays every reply, so in-flight state is observable in the console.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fails the next call whose `METHOD path` starts with `prefix`.
    pub fn fail_next(&self, prefix: &str, failure: ApiFailure) {
        self.store().scripted.push((prefix.to_owned(), failure));
    }

    pub fn calls(&self) -> Vec<Route> {
        self.store().calls.clone()
    }

    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.store()
            .calls
            .iter()
            .filter(|route| route.method == method && route.path == path)
            .count()
    }

    pub fn snapshot(&self) -> Dataset {
        self.store().data.clone()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        // A panicking test thread must not wedge the others.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Transport for MemoryApi {
    fn send(&self, route: &Route) -> Reply {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        let mut store = self.store();
        store.calls.push(route.clone());

        let line = route.to_string();
        if let Some(index) = store
            .scripted
            .iter()
            .position(|(prefix, _)| line.starts_with(prefix.as_str()))
        {
            let (_, failure) = store.scripted.remove(index);
            debug!(%route, %failure, "scripted failure");
            return Err(failure);
        }

        let reply = store.handle(route);
        debug!(%route, ok = reply.is_ok(), "memory api reply");
        reply
    }
}

impl Store {
    fn handle(&mut self, route: &Route) -> Reply {
        let segments = route
            .path
            .trim_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>();
        let body = route.body.clone().map(unwrap_data).unwrap_or(Value::Null);

        let (collection, id, tail) = match segments.as_slice() {
            [collection] => (*collection, None, None),
            [collection, id] => (*collection, Some(parse_id(id)?), None),
            [collection, id, tail] => (*collection, Some(parse_id(id)?), Some(*tail)),
            _ => return Err(not_found(&route.path)),
        };

        match (route.method, id, tail) {
            (HttpMethod::Get, None, None) => self.list(collection),
            (HttpMethod::Get, Some(id), None) => self.fetch(collection, id),
            (HttpMethod::Post, None, None) => self.create(collection, &body),
            (HttpMethod::Put, Some(id), None) => self.update(collection, id, &body),
            (HttpMethod::Patch, Some(id), Some("status")) => {
                self.set_status(collection, id, &body)
            }
            (HttpMethod::Delete, Some(id), None) => self.delete(collection, id),
            _ => Err(ApiFailure::response(
                405,
                json!({"message": format!("{} not allowed on {}", route.method.as_str(), route.path)}),
            )),
        }
    }

    fn list(&self, collection: &str) -> Reply {
        match collection {
            "clients" => encode(&self.data.clients),
            "payments" => encode(&self.data.payments),
            "roles" => encode(&self.data.roles),
            "users" => encode(&self.data.users),
            other => Err(not_found(other)),
        }
    }

    fn fetch(&self, collection: &str, id: i64) -> Reply {
        let found = match collection {
            "clients" => find(&self.data.clients, |c| c.id.get() == id).map(encode),
            "payments" => find(&self.data.payments, |p| p.id.get() == id).map(encode),
            "roles" => find(&self.data.roles, |r| r.id.get() == id).map(encode),
            "users" => find(&self.data.users, |u| u.id.get() == id).map(encode),
            other => return Err(not_found(other)),
        };
        found.unwrap_or_else(|| Err(missing(collection, id)))
    }

    fn create(&mut self, collection: &str, body: &Value) -> Reply {
        let id = self.next_id;
        let reply = match collection {
            "clients" => {
                let client = self.client_from(body, id, None)?;
                self.data.clients.push(client.clone());
                encode(&client)
            }
            "payments" => {
                let payment = self.payment_from(body, id, None)?;
                self.data.payments.push(payment.clone());
                encode(&payment)
            }
            "roles" => {
                let role = self.role_from(body, id, None)?;
                self.data.roles.push(role.clone());
                encode(&role)
            }
            "users" => {
                let user = self.user_from(body, id, None)?;
                self.data.users.push(user.clone());
                encode(&user)
            }
            other => return Err(not_found(other)),
        };
        self.next_id += 1;
        reply
    }

    fn update(&mut self, collection: &str, id: i64, body: &Value) -> Reply {
        match collection {
            "clients" => {
                let index = position(&self.data.clients, |c| c.id.get() == id)
                    .ok_or_else(|| missing(collection, id))?;
                let existing = self.data.clients[index].clone();
                let client = self.client_from(body, id, Some(&existing))?;
                self.data.clients[index] = client.clone();
                // Payments show the client's current name.
                for payment in &mut self.data.payments {
                    if payment.client_id == client.id {
                        payment.client_name = client.name.clone();
                    }
                }
                encode(&client)
            }
            "payments" => {
                let index = position(&self.data.payments, |p| p.id.get() == id)
                    .ok_or_else(|| missing(collection, id))?;
                let existing = self.data.payments[index].clone();
                let payment = self.payment_from(body, id, Some(&existing))?;
                self.data.payments[index] = payment.clone();
                encode(&payment)
            }
            "roles" => {
                let index = position(&self.data.roles, |r| r.id.get() == id)
                    .ok_or_else(|| missing(collection, id))?;
                let existing = self.data.roles[index].clone();
                let role = self.role_from(body, id, Some(&existing))?;
                self.data.roles[index] = role.clone();
                for user in &mut self.data.users {
                    if user.role_id == role.id {
                        user.role_name = role.name.clone();
                    }
                }
                encode(&role)
            }
            "users" => {
                let index = position(&self.data.users, |u| u.id.get() == id)
                    .ok_or_else(|| missing(collection, id))?;
                let existing = self.data.users[index].clone();
                let user = self.user_from(body, id, Some(&existing))?;
                self.data.users[index] = user.clone();
                encode(&user)
            }
            other => Err(not_found(other)),
        }
    }

    fn set_status(&mut self, collection: &str, id: i64, body: &Value) -> Reply {
        let status = body
            .get("status")
            .and_then(Value::as_str)
            .and_then(RecordStatus::parse)
            .ok_or_else(|| {
                validation(vec![("status", "status must be active or inactive".to_owned())])
            })?;
        let slot = match collection {
            "clients" => self
                .data
                .clients
                .iter_mut()
                .find(|c| c.id.get() == id)
                .map(|c| &mut c.status),
            "payments" => self
                .data
                .payments
                .iter_mut()
                .find(|p| p.id.get() == id)
                .map(|p| &mut p.status),
            "roles" => self
                .data
                .roles
                .iter_mut()
                .find(|r| r.id.get() == id)
                .map(|r| &mut r.status),
            "users" => self
                .data
                .users
                .iter_mut()
                .find(|u| u.id.get() == id)
                .map(|u| &mut u.status),
            other => return Err(not_found(other)),
        };
        let slot = slot.ok_or_else(|| missing(collection, id))?;
        *slot = status;
        Ok(json!({"id": id, "status": status.as_str()}))
    }

    fn delete(&mut self, collection: &str, id: i64) -> Reply {
        let removed = match collection {
            "clients" => {
                if self.data.payments.iter().any(|p| p.client_id.get() == id) {
                    return Err(conflict("client has payments; deactivate it instead"));
                }
                remove(&mut self.data.clients, |c| c.id.get() == id)
            }
            "payments" => remove(&mut self.data.payments, |p| p.id.get() == id),
            "roles" => {
                if self.data.users.iter().any(|u| u.role_id.get() == id) {
                    return Err(conflict("role is assigned to users"));
                }
                remove(&mut self.data.roles, |r| r.id.get() == id)
            }
            "users" => remove(&mut self.data.users, |u| u.id.get() == id),
            other => return Err(not_found(other)),
        };
        if removed {
            Ok(json!({"deleted": id}))
        } else {
            Err(missing(collection, id))
        }
    }

    fn client_from(
        &self,
        body: &Value,
        id: i64,
        existing: Option<&Client>,
    ) -> Result<Client, ApiFailure> {
        let name = text(body, "name");
        let email = text(body, "email");
        let phone = text(body, "phone");
        let mut errors = Vec::new();
        if name.is_empty() {
            errors.push(("name", "name is required".to_owned()));
        }
        if !email.contains('@') {
            errors.push(("email", "invalid".to_owned()));
        } else if self
            .data
            .clients
            .iter()
            .any(|c| c.id.get() != id && c.email.eq_ignore_ascii_case(&email))
        {
            errors.push(("email", "email already registered".to_owned()));
        }
        if phone.len() != 10 {
            errors.push(("phone", "phone must have 10 digits".to_owned()));
        }
        reject(errors)?;

        Ok(Client {
            id: ClientId::new(id),
            name,
            email,
            phone,
            address: text(body, "address"),
            status: existing.map_or(RecordStatus::Active, |c| c.status),
        })
    }

    fn payment_from(
        &self,
        body: &Value,
        id: i64,
        existing: Option<&Payment>,
    ) -> Result<Payment, ApiFailure> {
        let client = match existing {
            Some(payment) => find(&self.data.clients, |c| c.id == payment.client_id),
            None => int(body, "client_id")
                .and_then(|client_id| find(&self.data.clients, |c| c.id.get() == client_id)),
        };
        let amount_cents = int(body, "amount_cents").unwrap_or(0);
        let month = int(body, "month").unwrap_or(0);
        let year = int(body, "year").unwrap_or(0);

        let mut errors = Vec::new();
        if client.is_none() && existing.is_none() {
            errors.push(("client_id", "client not found".to_owned()));
        }
        if amount_cents <= 0 {
            errors.push(("amount", "amount must be positive".to_owned()));
        }
        if !(1..=12).contains(&month) {
            errors.push(("month", "invalid month".to_owned()));
        }
        if !(2000..=2100).contains(&year) {
            errors.push(("year", "invalid year".to_owned()));
        }
        reject(errors)?;

        let (client_id, client_name) = match (client, existing) {
            (Some(client), _) => (client.id, client.name.clone()),
            (None, Some(payment)) => (payment.client_id, payment.client_name.clone()),
            (None, None) => {
                return Err(validation(vec![(
                    "client_id",
                    "client not found".to_owned(),
                )]));
            }
        };
        Ok(Payment {
            id: PaymentId::new(id),
            client_id,
            client_name,
            amount_cents,
            month: month as u8,
            year: year as i32,
            paid_on: body
                .get("paid_on")
                .and_then(Value::as_str)
                .map(str::to_owned),
            reference: text(body, "reference"),
            status: existing.map_or(RecordStatus::Active, |p| p.status),
        })
    }

    fn role_from(
        &self,
        body: &Value,
        id: i64,
        existing: Option<&Role>,
    ) -> Result<Role, ApiFailure> {
        let name = text(body, "name");
        if name.is_empty() {
            return Err(validation(vec![("name", "name is required".to_owned())]));
        }
        if self
            .data
            .roles
            .iter()
            .any(|r| r.id.get() != id && r.name.eq_ignore_ascii_case(&name))
        {
            return Err(conflict("role name already exists"));
        }
        Ok(Role {
            id: RoleId::new(id),
            name,
            description: text(body, "description"),
            status: existing.map_or(RecordStatus::Active, |r| r.status),
        })
    }

    fn user_from(
        &self,
        body: &Value,
        id: i64,
        existing: Option<&User>,
    ) -> Result<User, ApiFailure> {
        let name = text(body, "name");
        let email = text(body, "email");
        let role = int(body, "role_id")
            .and_then(|role_id| find(&self.data.roles, |r| r.id.get() == role_id));
        let password = text(body, "password");

        let mut errors = Vec::new();
        if name.is_empty() {
            errors.push(("name", "name is required".to_owned()));
        }
        if !email.contains('@') {
            errors.push(("email", "invalid".to_owned()));
        } else if self
            .data
            .users
            .iter()
            .any(|u| u.id.get() != id && u.email.eq_ignore_ascii_case(&email))
        {
            errors.push(("email", "email already registered".to_owned()));
        }
        if role.is_none() {
            errors.push(("role_id", "role not found".to_owned()));
        }
        if existing.is_none() && password.chars().count() < 8 {
            errors.push(("password", "password too short".to_owned()));
        }
        reject(errors)?;

        let (role_id, role_name) =
            role.map_or((RoleId::new(0), String::new()), |r| (r.id, r.name.clone()));
        Ok(User {
            id: UserId::new(id),
            name,
            email,
            role_id,
            role_name,
            status: existing.map_or(RecordStatus::Active, |u| u.status),
        })
    }
}

fn max_id(data: &Dataset) -> i64 {
    let clients = data.clients.iter().map(|c| c.id.get());
    let payments = data.payments.iter().map(|p| p.id.get());
    let roles = data.roles.iter().map(|r| r.id.get());
    let users = data.users.iter().map(|u| u.id.get());
    clients
        .chain(payments)
        .chain(roles)
        .chain(users)
        .max()
        .unwrap_or(0)
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Reply {
    serde_json::to_value(value).map_err(|error| ApiFailure::Decode {
        detail: error.to_string(),
    })
}

fn find<T>(items: &[T], predicate: impl Fn(&T) -> bool) -> Option<&T> {
    items.iter().find(|item| predicate(item))
}

fn position<T>(items: &[T], predicate: impl Fn(&T) -> bool) -> Option<usize> {
    items.iter().position(predicate)
}

fn remove<T>(items: &mut Vec<T>, predicate: impl Fn(&T) -> bool) -> bool {
    let before = items.len();
    items.retain(|item| !predicate(item));
    items.len() != before
}

fn text(body: &Value, key: &str) -> String {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_owned()
}

fn int(body: &Value, key: &str) -> Option<i64> {
    body.get(key).and_then(Value::as_i64)
}

fn parse_id(segment: &str) -> Result<i64, ApiFailure> {
    segment
        .parse()
        .map_err(|_| ApiFailure::response(400, json!({"message": format!("bad id {segment:?}")})))
}

fn reject(errors: Vec<(&str, String)>) -> Result<(), ApiFailure> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(validation(errors))
    }
}

fn validation(errors: Vec<(&str, String)>) -> ApiFailure {
    let entries = errors
        .into_iter()
        .map(|(path, msg)| json!({"path": path, "msg": msg}))
        .collect::<Vec<_>>();
    ApiFailure::response(400, json!({ "errors": entries }))
}

fn conflict(message: &str) -> ApiFailure {
    ApiFailure::response(409, json!({ "message": message }))
}

fn missing(collection: &str, id: i64) -> ApiFailure {
    ApiFailure::response(404, json!({"message": format!("{collection}/{id} not found")}))
}

fn not_found(path: &str) -> ApiFailure {
    ApiFailure::response(404, json!({"message": format!("no such resource: {path}")}))
}

#[cfg(test)]
mod tests {
    use super::MemoryApi;
    use crate::{Dataset, OfficeFaker};
    use backoffice_app::{
        ApiCall, ApiFailure, ClientId, HttpMethod, RecordStatus, RoleId, Transport,
    };
    use serde_json::json;

    fn api() -> MemoryApi {
        MemoryApi::new(OfficeFaker::new(11).dataset(3, 4, 2))
    }

    #[test]
    fn list_and_fetch() {
        let api = api();
        let list = api
            .send(&ApiCall::<ClientId>::List.route("/clients"))
            .expect("list");
        assert_eq!(list.as_array().map(Vec::len), Some(3));

        let one = api
            .send(&ApiCall::FetchOne(ClientId::new(2)).route("/clients"))
            .expect("fetch");
        assert_eq!(one["id"], 2);

        let gone = api.send(&ApiCall::FetchOne(ClientId::new(99)).route("/clients"));
        assert_eq!(gone.err().and_then(|failure| failure.status()), Some(404));
    }

    #[test]
    fn create_assigns_fresh_ids() {
        let api = MemoryApi::new(Dataset::default());
        let body = json!({"name": "Ana", "email": "ana@example.com", "phone": "5512345678"});
        let first = api
            .send(&ApiCall::<ClientId>::Create(body).route("/clients"))
            .expect("create");
        let second = api
            .send(
                &ApiCall::<ClientId>::Create(
                    json!({"name": "Juan", "email": "juan@example.com", "phone": "5512345679"}),
                )
                .route("/clients"),
            )
            .expect("create");
        assert_ne!(first["id"], second["id"]);
        assert_eq!(api.snapshot().clients.len(), 2);
    }

    #[test]
    fn duplicate_email_is_a_field_error() {
        let api = MemoryApi::new(Dataset::default());
        let body = json!({"name": "Ana", "email": "ana@example.com", "phone": "5512345678"});
        api.send(&ApiCall::<ClientId>::Create(body.clone()).route("/clients"))
            .expect("first create");
        let failure = api
            .send(&ApiCall::<ClientId>::Create(body).route("/clients"))
            .expect_err("duplicate");
        assert_eq!(
            failure,
            ApiFailure::response(
                400,
                json!({"errors": [{"path": "email", "msg": "email already registered"}]})
            )
        );
    }

    #[test]
    fn status_patch_and_call_log() {
        let api = api();
        let route = ApiCall::SetStatus(ClientId::new(1), RecordStatus::Inactive).route("/clients");
        api.send(&route).expect("patch");
        assert_eq!(api.snapshot().clients[0].status, RecordStatus::Inactive);
        assert_eq!(api.count(HttpMethod::Patch, "/clients/1/status"), 1);
        assert_eq!(api.calls(), vec![route]);
    }

    #[test]
    fn scripted_failure_fires_once() {
        let api = api();
        api.fail_next("GET /roles", ApiFailure::Timeout);
        let route = ApiCall::<RoleId>::List.route("/roles");
        assert_eq!(api.send(&route), Err(ApiFailure::Timeout));
        assert!(api.send(&route).is_ok());
    }

    #[test]
    fn role_in_use_cannot_be_deleted() {
        let api = api();
        let role = api.snapshot().users[0].role_id;
        let failure = api
            .send(&ApiCall::Delete(role).route("/roles"))
            .expect_err("conflict");
        assert_eq!(failure.status(), Some(409));
    }
}
