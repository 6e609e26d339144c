// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::borrow::Cow;
use std::fmt;

use crate::rules;
use crate::search::Searchable;
use crate::validation::{FieldRules, FieldSpec, FormMode, FormValues};
use crate::{Client, ClientId, Payment, RecordStatus, Role, RoleId, ScreenKind, User};

/// One managed entity type: its endpoint, table columns, searchable fields
/// and form. A single generic controller drives all of them.
pub trait Resource: FieldRules {
    type Id: Copy + Ord + fmt::Debug + fmt::Display;
    type Entity: Clone + fmt::Debug + PartialEq + DeserializeOwned + Searchable;

    const SCREEN: ScreenKind;
    const PATH: &'static str;
    const SINGULAR: &'static str;
    const COLUMNS: &'static [&'static str];
    const SEARCH_FIELDS: &'static [&'static str];

    fn id(entity: &Self::Entity) -> Self::Id;
    fn status(entity: &Self::Entity) -> RecordStatus;
    fn display_name(entity: &Self::Entity) -> String;
    fn cells(entity: &Self::Entity) -> Vec<String>;
    fn blank_values() -> FormValues;
    fn values_from(entity: &Self::Entity) -> FormValues;
    fn to_payload(values: &FormValues, mode: FormMode) -> Result<Value>;
}

fn values<const N: usize>(pairs: [(&str, String); N]) -> FormValues {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect()
}

fn text<'a>(values: &'a FormValues, name: &str) -> &'a str {
    values.get(name).map_or("", |value| value.trim())
}

fn int<T: std::str::FromStr>(values: &FormValues, name: &str) -> Result<T> {
    text(values, name)
        .parse::<T>()
        .map_err(|_| anyhow!("{name} must be a whole number"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Clients;

static CLIENT_FIELDS: [FieldSpec; 4] = [
    FieldSpec::text("name", "name"),
    FieldSpec::text("email", "email"),
    FieldSpec::text("phone", "phone"),
    FieldSpec::text("address", "address"),
];

impl FieldRules for Clients {
    fn fields() -> &'static [FieldSpec] {
        &CLIENT_FIELDS
    }

    fn validate_field(
        name: &str,
        value: &str,
        _values: &FormValues,
        _mode: FormMode,
    ) -> Option<String> {
        match name {
            "name" => rules::required(value, "name"),
            "email" => rules::email(value),
            "phone" => rules::phone(value),
            _ => None,
        }
    }
}

impl Searchable for Client {
    fn search_text(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "name" => Some(Cow::Borrowed(&self.name)),
            "email" => Some(Cow::Borrowed(&self.email)),
            "phone" => Some(Cow::Borrowed(&self.phone)),
            _ => None,
        }
    }
}

impl Resource for Clients {
    type Id = ClientId;
    type Entity = Client;

    const SCREEN: ScreenKind = ScreenKind::Clients;
    const PATH: &'static str = "/clients";
    const SINGULAR: &'static str = "client";
    const COLUMNS: &'static [&'static str] = &["id", "name", "email", "phone", "status"];
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "email", "phone"];

    fn id(entity: &Client) -> ClientId {
        entity.id
    }

    fn status(entity: &Client) -> RecordStatus {
        entity.status
    }

    fn display_name(entity: &Client) -> String {
        entity.name.clone()
    }

    fn cells(entity: &Client) -> Vec<String> {
        vec![
            entity.id.to_string(),
            entity.name.clone(),
            entity.email.clone(),
            entity.phone.clone(),
            entity.status.as_str().to_owned(),
        ]
    }

    fn blank_values() -> FormValues {
        FormValues::new()
    }

    fn values_from(entity: &Client) -> FormValues {
        values([
            ("name", entity.name.clone()),
            ("email", entity.email.clone()),
            ("phone", entity.phone.clone()),
            ("address", entity.address.clone()),
        ])
    }

    fn to_payload(values: &FormValues, _mode: FormMode) -> Result<Value> {
        Ok(json!({
            "name": text(values, "name"),
            "email": text(values, "email"),
            "phone": text(values, "phone"),
            "address": text(values, "address"),
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Payments;

static PAYMENT_FIELDS: [FieldSpec; 6] = [
    FieldSpec::number("client_id", "client id").create_only(),
    FieldSpec::text("amount", "amount"),
    FieldSpec::number("month", "month"),
    FieldSpec::number("year", "year"),
    FieldSpec::text("paid_on", "paid on (YYYY-MM-DD)"),
    FieldSpec::text("reference", "reference"),
];

impl FieldRules for Payments {
    fn fields() -> &'static [FieldSpec] {
        &PAYMENT_FIELDS
    }

    fn validate_field(
        name: &str,
        value: &str,
        _values: &FormValues,
        mode: FormMode,
    ) -> Option<String> {
        match name {
            "client_id" if !mode.is_editing() => rules::reference_id(value, "client"),
            "amount" => rules::amount(value),
            "month" => rules::month(value),
            "year" => rules::year(value),
            "paid_on" => rules::optional_date(value),
            _ => None,
        }
    }

    // A payment cannot be created without the client it belongs to.
    fn submit_blocked(values: &FormValues, mode: FormMode) -> bool {
        !mode.is_editing() && text(values, "client_id").is_empty()
    }
}

impl Searchable for Payment {
    fn search_text(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "reference" => Some(Cow::Borrowed(&self.reference)),
            "client_name" => Some(Cow::Borrowed(&self.client_name)),
            "month" => Some(Cow::Owned(format!("{:02}/{}", self.month, self.year))),
            _ => None,
        }
    }
}

impl Resource for Payments {
    type Id = crate::PaymentId;
    type Entity = Payment;

    const SCREEN: ScreenKind = ScreenKind::Payments;
    const PATH: &'static str = "/payments";
    const SINGULAR: &'static str = "payment";
    const COLUMNS: &'static [&'static str] =
        &["id", "client", "amount", "period", "reference", "status"];
    const SEARCH_FIELDS: &'static [&'static str] = &["reference", "client_name", "month"];

    fn id(entity: &Payment) -> crate::PaymentId {
        entity.id
    }

    fn status(entity: &Payment) -> RecordStatus {
        entity.status
    }

    fn display_name(entity: &Payment) -> String {
        format!(
            "{} for {:02}/{}",
            rules::format_cents(entity.amount_cents),
            entity.month,
            entity.year
        )
    }

    fn cells(entity: &Payment) -> Vec<String> {
        let client = if entity.client_name.is_empty() {
            format!("#{}", entity.client_id)
        } else {
            entity.client_name.clone()
        };
        vec![
            entity.id.to_string(),
            client,
            rules::format_cents(entity.amount_cents),
            format!("{:02}/{}", entity.month, entity.year),
            entity.reference.clone(),
            entity.status.as_str().to_owned(),
        ]
    }

    fn blank_values() -> FormValues {
        let today = time::OffsetDateTime::now_utc().date();
        values([
            ("month", u8::from(today.month()).to_string()),
            ("year", today.year().to_string()),
        ])
    }

    fn values_from(entity: &Payment) -> FormValues {
        values([
            ("client_id", entity.client_id.to_string()),
            ("amount", rules::amount_input(entity.amount_cents)),
            ("month", entity.month.to_string()),
            ("year", entity.year.to_string()),
            ("paid_on", entity.paid_on.clone().unwrap_or_default()),
            ("reference", entity.reference.clone()),
        ])
    }

    fn to_payload(values: &FormValues, mode: FormMode) -> Result<Value> {
        let amount_cents = rules::parse_cents(text(values, "amount"))
            .map_err(|message| anyhow!("{message}"))
            .context("encode payment amount")?;
        let paid_on = Some(text(values, "paid_on")).filter(|value| !value.is_empty());
        let mut payload = json!({
            "amount_cents": amount_cents,
            "month": int::<u8>(values, "month")?,
            "year": int::<i32>(values, "year")?,
            "paid_on": paid_on,
            "reference": text(values, "reference"),
        });
        if !mode.is_editing() {
            payload["client_id"] = json!(int::<i64>(values, "client_id")?);
        }
        Ok(payload)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Roles;

static ROLE_FIELDS: [FieldSpec; 2] = [
    FieldSpec::text("name", "name"),
    FieldSpec::text("description", "description"),
];

impl FieldRules for Roles {
    fn fields() -> &'static [FieldSpec] {
        &ROLE_FIELDS
    }

    fn validate_field(
        name: &str,
        value: &str,
        _values: &FormValues,
        _mode: FormMode,
    ) -> Option<String> {
        match name {
            "name" => rules::required(value, "name"),
            _ => None,
        }
    }
}

impl Searchable for Role {
    fn search_text(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "name" => Some(Cow::Borrowed(&self.name)),
            "description" => Some(Cow::Borrowed(&self.description)),
            _ => None,
        }
    }
}

impl Resource for Roles {
    type Id = RoleId;
    type Entity = Role;

    const SCREEN: ScreenKind = ScreenKind::Roles;
    const PATH: &'static str = "/roles";
    const SINGULAR: &'static str = "role";
    const COLUMNS: &'static [&'static str] = &["id", "name", "description", "status"];
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "description"];

    fn id(entity: &Role) -> RoleId {
        entity.id
    }

    fn status(entity: &Role) -> RecordStatus {
        entity.status
    }

    fn display_name(entity: &Role) -> String {
        entity.name.clone()
    }

    fn cells(entity: &Role) -> Vec<String> {
        vec![
            entity.id.to_string(),
            entity.name.clone(),
            entity.description.clone(),
            entity.status.as_str().to_owned(),
        ]
    }

    fn blank_values() -> FormValues {
        FormValues::new()
    }

    fn values_from(entity: &Role) -> FormValues {
        values([
            ("name", entity.name.clone()),
            ("description", entity.description.clone()),
        ])
    }

    fn to_payload(values: &FormValues, _mode: FormMode) -> Result<Value> {
        Ok(json!({
            "name": text(values, "name"),
            "description": text(values, "description"),
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Users;

static USER_FIELDS: [FieldSpec; 4] = [
    FieldSpec::text("name", "name"),
    FieldSpec::text("email", "email"),
    FieldSpec::number("role_id", "role id"),
    FieldSpec::secret("password", "password"),
];

impl FieldRules for Users {
    fn fields() -> &'static [FieldSpec] {
        &USER_FIELDS
    }

    fn validate_field(
        name: &str,
        value: &str,
        _values: &FormValues,
        mode: FormMode,
    ) -> Option<String> {
        match name {
            "name" => rules::required(value, "name"),
            "email" => rules::email(value),
            "role_id" => rules::reference_id(value, "role"),
            "password" => rules::password(value, mode.is_editing()),
            _ => None,
        }
    }

    fn submit_blocked(values: &FormValues, mode: FormMode) -> bool {
        !mode.is_editing() && text(values, "role_id").is_empty()
    }
}

impl Searchable for User {
    fn search_text(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "name" => Some(Cow::Borrowed(&self.name)),
            "email" => Some(Cow::Borrowed(&self.email)),
            "role_name" => Some(Cow::Borrowed(&self.role_name)),
            _ => None,
        }
    }
}

impl Resource for Users {
    type Id = crate::UserId;
    type Entity = User;

    const SCREEN: ScreenKind = ScreenKind::Users;
    const PATH: &'static str = "/users";
    const SINGULAR: &'static str = "user";
    const COLUMNS: &'static [&'static str] = &["id", "name", "email", "role", "status"];
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "email", "role_name"];

    fn id(entity: &User) -> crate::UserId {
        entity.id
    }

    fn status(entity: &User) -> RecordStatus {
        entity.status
    }

    fn display_name(entity: &User) -> String {
        entity.name.clone()
    }

    fn cells(entity: &User) -> Vec<String> {
        let role = if entity.role_name.is_empty() {
            format!("#{}", entity.role_id)
        } else {
            entity.role_name.clone()
        };
        vec![
            entity.id.to_string(),
            entity.name.clone(),
            entity.email.clone(),
            role,
            entity.status.as_str().to_owned(),
        ]
    }

    fn blank_values() -> FormValues {
        FormValues::new()
    }

    fn values_from(entity: &User) -> FormValues {
        values([
            ("name", entity.name.clone()),
            ("email", entity.email.clone()),
            ("role_id", entity.role_id.to_string()),
            ("password", String::new()),
        ])
    }

    fn to_payload(values: &FormValues, _mode: FormMode) -> Result<Value> {
        let mut payload = json!({
            "name": text(values, "name"),
            "email": text(values, "email"),
            "role_id": int::<i64>(values, "role_id")?,
        });
        let password = values.get("password").map_or("", String::as_str);
        if !password.is_empty() {
            payload["password"] = json!(password);
        }
        Ok(payload)
    }
}
