// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Field-level form state: live client-side validation reconciled with
//! validation errors reported by the server.

use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;

use crate::error::ErrorEnvelope;

pub type FormValues = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

impl FormMode {
    pub const fn is_editing(self) -> bool {
        matches!(self, Self::Edit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Secret,
    Number,
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub create_only: bool,
}

impl FieldSpec {
    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Text,
            create_only: false,
        }
    }

    pub const fn number(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Number,
            create_only: false,
        }
    }

    pub const fn secret(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Secret,
            create_only: false,
        }
    }

    pub const fn create_only(mut self) -> Self {
        self.create_only = true;
        self
    }

    pub const fn shown_in(&self, mode: FormMode) -> bool {
        !self.create_only || !mode.is_editing()
    }
}

/// Per-entity validation rules the engine runs. Rule content lives with
/// each resource; the engine only orchestrates when rules run and which
/// errors are visible.
pub trait FieldRules {
    fn fields() -> &'static [FieldSpec];

    fn validate_field(name: &str, value: &str, values: &FormValues, mode: FormMode)
    -> Option<String>;

    /// Entity-specific hard block on submit, independent of touch state.
    fn submit_blocked(_values: &FormValues, _mode: FormMode) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitGate {
    Proceed,
    Invalid,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState<V> {
    mode: FormMode,
    values: FormValues,
    touched: BTreeSet<String>,
    submit_attempted: bool,
    client_errors: BTreeMap<String, Option<String>>,
    backend_errors: BTreeMap<String, String>,
    general_error: Option<String>,
    is_saving: bool,
    rules: PhantomData<fn() -> V>,
}

impl<V: FieldRules> FormState<V> {
    pub fn new(mode: FormMode, values: FormValues) -> Self {
        let mut state = Self {
            mode,
            values,
            touched: BTreeSet::new(),
            submit_attempted: false,
            client_errors: BTreeMap::new(),
            backend_errors: BTreeMap::new(),
            general_error: None,
            is_saving: false,
            rules: PhantomData,
        };
        for spec in V::fields() {
            if !spec.shown_in(mode) {
                continue;
            }
            state.values.entry(spec.name.to_owned()).or_default();
            state.revalidate(spec.name);
        }
        state
    }

    pub const fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map_or("", String::as_str)
    }

    pub const fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub const fn submit_attempted(&self) -> bool {
        self.submit_attempted
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.touched.contains(name)
    }

    pub fn general_error(&self) -> Option<&str> {
        self.general_error.as_deref()
    }

    pub fn backend_errors(&self) -> &BTreeMap<String, String> {
        &self.backend_errors
    }

    pub fn client_error(&self, name: &str) -> Option<&str> {
        self.client_errors.get(name).and_then(Option::as_deref)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static FieldSpec> + '_ {
        V::fields().iter().filter(|spec| spec.shown_in(self.mode))
    }

    pub fn on_change(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_owned(), value.into());
        self.touched.insert(name.to_owned());
        // Editing a field retires whatever the server said about it.
        self.backend_errors.remove(name);
        self.revalidate(name);
    }

    pub fn on_blur(&mut self, name: &str) {
        self.touched.insert(name.to_owned());
        self.revalidate(name);
    }

    pub fn on_submit(&mut self) -> SubmitGate {
        self.submit_attempted = true;
        let names = self.fields().map(|spec| spec.name).collect::<Vec<_>>();
        for name in names {
            self.touched.insert(name.to_owned());
            self.revalidate(name);
        }

        if self.is_saving {
            return SubmitGate::Busy;
        }
        if self.has_client_errors()
            || !self.backend_errors.is_empty()
            || V::submit_blocked(&self.values, self.mode)
        {
            return SubmitGate::Invalid;
        }
        SubmitGate::Proceed
    }

    /// The error shown under `name`. A server error always wins; a client
    /// error shows once the field was touched or a submit was attempted.
    pub fn displayed_error(&self, name: &str) -> Option<&str> {
        if let Some(error) = self.backend_errors.get(name) {
            return Some(error);
        }
        if self.touched.contains(name) || self.submit_attempted {
            return self.client_error(name);
        }
        None
    }

    pub fn is_submit_disabled(&self) -> bool {
        self.is_saving
            || !self.backend_errors.is_empty()
            || (self.submit_attempted && self.has_client_errors())
            || V::submit_blocked(&self.values, self.mode)
    }

    pub fn begin_saving(&mut self) {
        self.is_saving = true;
        self.general_error = None;
    }

    /// Replaces server-side errors with a fresh envelope. Entered values are
    /// left untouched. Errors for paths that are not fields of this form go
    /// to the general message as `path: message`, since nothing could clear
    /// them inline.
    pub fn apply_failure(&mut self, envelope: &ErrorEnvelope) {
        self.is_saving = false;
        let (inline, stray): (BTreeMap<_, _>, BTreeMap<_, _>) = envelope
            .field_errors
            .iter()
            .map(|(path, message)| (path.clone(), message.clone()))
            .partition(|(path, _)| self.fields().any(|spec| spec.name == path.as_str()));
        self.backend_errors = inline;
        self.general_error = if stray.is_empty() {
            envelope.general_message.clone()
        } else {
            let listed = stray
                .iter()
                .map(|(path, message)| format!("{path}: {message}"))
                .collect::<Vec<_>>()
                .join("; ");
            match &envelope.general_message {
                Some(general) if !self.backend_errors.is_empty() => {
                    Some(format!("{general} {listed}"))
                }
                _ => Some(listed),
            }
        };
    }

    fn has_client_errors(&self) -> bool {
        self.client_errors.values().any(Option::is_some)
    }

    fn revalidate(&mut self, name: &str) {
        let value = self.value(name).to_owned();
        let error = V::validate_field(name, &value, &self.values, self.mode);
        self.client_errors.insert(name.to_owned(), error);
    }
}
