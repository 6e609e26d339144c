// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::pagination::{PageWindow, clamp_page, page_slice, paginate, total_pages};
use crate::search::filter_items;
use crate::transport::{ApiCall, Route, unwrap_data};
use crate::validation::{FormMode, FormState, SubmitGate};
use crate::{
    ActionCoordinator, ActionRejected, ApiFailure, ConfirmPrompt, ErrorEnvelope, ErrorKind,
    GuardedAction, ListSettings, Notice, NoticeKind, Resource, map_error,
};

/// Identifies one outstanding call. `session` changes on teardown, so a reply
/// addressed to an earlier session can never match a live request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId {
    pub session: u64,
    pub seq: u64,
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.session, self.seq)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// The host must run `route` and feed the outcome back through
    /// [`ResourceListController::complete`].
    Request(RequestId, Route),
    Confirm(ConfirmPrompt),
    Notify(Notice),
    FormClosed,
    DetailLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingCall<Id> {
    List { initial: bool },
    Save { epoch: u64, mode: FormMode },
    Action { id: Id, action: GuardedAction },
    Detail { id: Id },
}

/// The open create or edit form. `target` is `None` when creating.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSession<R: Resource> {
    pub target: Option<R::Id>,
    pub state: FormState<R>,
    epoch: u64,
}

/// One visible table row, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView<Id> {
    pub id: Id,
    pub cells: Vec<String>,
    pub active: bool,
    pub busy: bool,
}

/// List, search, pagination, form and row-action state for one resource
/// screen. The controller never performs I/O: every operation returns the
/// events the host must act on, and replies come back through `complete`.
#[derive(Debug)]
pub struct ResourceListController<R: Resource> {
    settings: ListSettings,
    items: Vec<R::Entity>,
    search_term: String,
    current_page: usize,
    loading: bool,
    load_error: Option<ErrorEnvelope>,
    session: u64,
    next_seq: u64,
    applied_list_seq: u64,
    pending: BTreeMap<RequestId, PendingCall<R::Id>>,
    actions: ActionCoordinator<R::Id>,
    form: Option<FormSession<R>>,
    form_epoch: u64,
    detail: Option<R::Entity>,
}

impl<R: Resource> ResourceListController<R> {
    pub fn new(settings: ListSettings) -> Self {
        Self {
            settings,
            items: Vec::new(),
            search_term: String::new(),
            current_page: 1,
            loading: false,
            load_error: None,
            session: 0,
            next_seq: 0,
            applied_list_seq: 0,
            pending: BTreeMap::new(),
            actions: ActionCoordinator::default(),
            form: None,
            form_epoch: 0,
            detail: None,
        }
    }

    pub const fn settings(&self) -> &ListSettings {
        &self.settings
    }

    pub fn items(&self) -> &[R::Entity] {
        &self.items
    }

    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn load_error(&self) -> Option<&ErrorEnvelope> {
        self.load_error.as_ref()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// First fetch: shows the loading indicator and starts on page 1.
    pub fn load(&mut self) -> Vec<ControllerEvent> {
        self.loading = true;
        vec![self.issue(ApiCall::List, PendingCall::List { initial: true })]
    }

    /// Background re-fetch after a mutation. Keeps the current page.
    pub fn refresh(&mut self) -> Vec<ControllerEvent> {
        vec![self.issue(ApiCall::List, PendingCall::List { initial: false })]
    }

    pub fn filtered(&self) -> Vec<&R::Entity> {
        filter_items(&self.items, &self.search_term, R::SEARCH_FIELDS)
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered().len(), self.settings.items_per_page)
    }

    pub fn page_window(&self) -> PageWindow {
        paginate(
            self.filtered().len(),
            self.current_page,
            self.settings.items_per_page,
            self.settings.max_page_buttons,
        )
    }

    pub fn visible_items(&self) -> Vec<&R::Entity> {
        let filtered = self.filtered();
        page_slice(&filtered, self.current_page, self.settings.items_per_page).to_vec()
    }

    pub fn visible_rows(&self) -> Vec<RowView<R::Id>> {
        self.visible_items()
            .into_iter()
            .map(|entity| {
                let id = R::id(entity);
                RowView {
                    id,
                    cells: R::cells(entity),
                    active: R::status(entity).is_active(),
                    busy: self.actions.is_in_flight(id),
                }
            })
            .collect()
    }

    pub fn find(&self, id: R::Id) -> Option<&R::Entity> {
        self.items.iter().find(|entity| R::id(entity) == id)
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.clamp_current_page();
    }

    pub fn set_page(&mut self, page: usize) {
        self.current_page = clamp_page(page, self.total_pages());
    }

    pub fn next_page(&mut self) {
        self.set_page(self.current_page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.current_page.saturating_sub(1));
    }

    pub fn first_page(&mut self) {
        self.set_page(1);
    }

    pub fn last_page(&mut self) {
        self.set_page(self.total_pages());
    }

    fn clamp_current_page(&mut self) {
        self.current_page = clamp_page(self.current_page, self.total_pages());
    }

    pub fn form(&self) -> Option<&FormSession<R>> {
        self.form.as_ref()
    }

    pub fn open_create(&mut self) {
        self.form_epoch += 1;
        self.form = Some(FormSession {
            target: None,
            state: FormState::new(FormMode::Create, R::blank_values()),
            epoch: self.form_epoch,
        });
    }

    /// Seeds a fresh form from the entity. Returns false when the id is not
    /// in the current list.
    pub fn open_edit(&mut self, id: R::Id) -> bool {
        let Some(values) = self.find(id).map(R::values_from) else {
            return false;
        };
        self.form_epoch += 1;
        self.form = Some(FormSession {
            target: Some(id),
            state: FormState::new(FormMode::Edit, values),
            epoch: self.form_epoch,
        });
        true
    }

    /// Closing while a save is in flight is allowed; the reply still
    /// refreshes the list but no longer touches a form.
    pub fn close_form(&mut self) {
        self.form = None;
    }

    pub fn change_field(&mut self, name: &str, value: impl Into<String>) {
        if let Some(form) = self.form.as_mut() {
            form.state.on_change(name, value);
        }
    }

    pub fn blur_field(&mut self, name: &str) {
        if let Some(form) = self.form.as_mut() {
            form.state.on_blur(name);
        }
    }

    pub fn submit(&mut self) -> Vec<ControllerEvent> {
        let Some(form) = self.form.as_mut() else {
            return Vec::new();
        };
        match form.state.on_submit() {
            SubmitGate::Proceed => {}
            gate => {
                debug!(resource = R::SINGULAR, ?gate, "submit held back");
                return Vec::new();
            }
        }

        let mode = form.state.mode();
        let payload = match R::to_payload(form.state.values(), mode) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(resource = R::SINGULAR, error = %format!("{error:#}"), "payload rejected");
                form.state
                    .apply_failure(&ErrorEnvelope::general(ErrorKind::Unknown, format!("{error:#}")));
                return Vec::new();
            }
        };
        form.state.begin_saving();
        let call = match form.target {
            Some(id) => ApiCall::Update(id, payload),
            None => ApiCall::Create(payload),
        };
        let epoch = form.epoch;
        vec![self.issue(call, PendingCall::Save { epoch, mode })]
    }

    pub fn request_delete(&mut self, id: R::Id) -> Vec<ControllerEvent> {
        self.request_action(id, GuardedAction::Delete)
    }

    pub fn request_toggle_status(&mut self, id: R::Id) -> Vec<ControllerEvent> {
        let Some(current) = self.find(id).map(R::status) else {
            return Vec::new();
        };
        self.request_action(id, GuardedAction::SetStatus(current.toggled()))
    }

    pub fn is_busy(&self, id: R::Id) -> bool {
        self.actions.is_in_flight(id)
    }

    pub fn pending_confirmation(&self) -> Option<&ConfirmPrompt> {
        self.actions.pending_prompt()
    }

    pub fn resolve_confirmation(&mut self, accepted: bool) -> Vec<ControllerEvent> {
        let Some((id, action)) = self.actions.resolve(accepted) else {
            return Vec::new();
        };
        let call = match action {
            GuardedAction::Delete => ApiCall::Delete(id),
            GuardedAction::SetStatus(status) => ApiCall::SetStatus(id, status),
        };
        vec![self.issue(call, PendingCall::Action { id, action })]
    }

    fn request_action(&mut self, id: R::Id, action: GuardedAction) -> Vec<ControllerEvent> {
        let Some(name) = self.find(id).map(R::display_name) else {
            return Vec::new();
        };
        let prompt = confirm_prompt(R::SINGULAR, &name, action);
        match self.actions.request(id, action, prompt) {
            Ok(prompt) => vec![ControllerEvent::Confirm(prompt.clone())],
            Err(ActionRejected::InFlight) => {
                debug!(resource = R::SINGULAR, %id, "action ignored: row busy");
                Vec::new()
            }
            Err(ActionRejected::AwaitingConfirmation) => {
                debug!(resource = R::SINGULAR, %id, "action ignored: prompt open");
                Vec::new()
            }
        }
    }

    pub fn show_detail(&mut self, id: R::Id) -> Vec<ControllerEvent> {
        vec![self.issue(ApiCall::FetchOne(id), PendingCall::Detail { id })]
    }

    pub fn detail(&self) -> Option<&R::Entity> {
        self.detail.as_ref()
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    /// Applies the outcome of a request issued earlier. Replies for requests
    /// this controller no longer tracks are dropped.
    pub fn complete(
        &mut self,
        request: RequestId,
        outcome: Result<Value, ApiFailure>,
    ) -> Vec<ControllerEvent> {
        let Some(call) = self.pending.remove(&request) else {
            debug!(resource = R::SINGULAR, %request, "dropping stale reply");
            return Vec::new();
        };

        match call {
            PendingCall::List { initial } => self.finish_list(request, initial, outcome),
            PendingCall::Save { epoch, mode } => self.finish_save(epoch, mode, outcome),
            PendingCall::Action { id, action } => self.finish_action(id, action, outcome),
            PendingCall::Detail { id } => self.finish_detail(id, outcome),
        }
    }

    /// Stops tracking everything in flight. Late replies become no-ops; the
    /// controller can be loaded again afterwards.
    pub fn teardown(&mut self) {
        if !self.pending.is_empty() {
            info!(
                resource = R::SINGULAR,
                abandoned = self.pending.len(),
                "tearing down with requests in flight"
            );
        }
        self.session += 1;
        self.pending.clear();
        self.actions.clear();
        self.form = None;
        self.detail = None;
        self.loading = false;
    }

    fn finish_list(
        &mut self,
        request: RequestId,
        initial: bool,
        outcome: Result<Value, ApiFailure>,
    ) -> Vec<ControllerEvent> {
        if initial {
            self.loading = false;
        }
        if request.seq < self.applied_list_seq {
            debug!(resource = R::SINGULAR, %request, "ignoring older list reply");
            return Vec::new();
        }
        let decoded = outcome.and_then(|body| decode::<Vec<R::Entity>>(unwrap_data(body)));
        match decoded {
            Ok(items) => {
                self.applied_list_seq = request.seq;
                debug!(resource = R::SINGULAR, count = items.len(), "list loaded");
                self.items = items;
                self.load_error = None;
                if initial {
                    self.current_page = 1;
                }
                self.clamp_current_page();
                Vec::new()
            }
            Err(failure) => {
                warn!(resource = R::SINGULAR, %failure, "list fetch failed");
                let envelope = map_error(&failure);
                let notice = self.notice(NoticeKind::Error, envelope.summary());
                self.load_error = Some(envelope);
                vec![notice]
            }
        }
    }

    fn finish_save(
        &mut self,
        epoch: u64,
        mode: FormMode,
        outcome: Result<Value, ApiFailure>,
    ) -> Vec<ControllerEvent> {
        let live_form = self.form.as_mut().filter(|form| form.epoch == epoch);
        match outcome {
            Ok(_) => {
                let verb = if mode.is_editing() { "updated" } else { "created" };
                info!(resource = R::SINGULAR, verb, "saved");
                let mut events = Vec::new();
                if live_form.is_some() {
                    self.form = None;
                    events.push(ControllerEvent::FormClosed);
                }
                events.push(self.notice(NoticeKind::Success, &format!("{} {verb}", R::SINGULAR)));
                events.extend(self.refresh());
                events
            }
            Err(failure) => {
                warn!(resource = R::SINGULAR, %failure, "save failed");
                let envelope = map_error(&failure);
                if let Some(form) = live_form {
                    form.state.apply_failure(&envelope);
                }
                vec![self.notice(NoticeKind::Error, envelope.summary())]
            }
        }
    }

    fn finish_action(
        &mut self,
        id: R::Id,
        action: GuardedAction,
        outcome: Result<Value, ApiFailure>,
    ) -> Vec<ControllerEvent> {
        self.actions.finish(id);
        match outcome {
            Ok(_) => {
                info!(resource = R::SINGULAR, %id, action = action.verb(), "row action done");
                if action == GuardedAction::Delete
                    && self.detail.as_ref().is_some_and(|entity| R::id(entity) == id)
                {
                    self.detail = None;
                }
                let message = format!("{} {}", R::SINGULAR, action.past_tense());
                let mut events = vec![self.notice(NoticeKind::Success, &message)];
                events.extend(self.refresh());
                events
            }
            Err(failure) => {
                warn!(resource = R::SINGULAR, %id, %failure, "row action failed");
                let envelope = map_error(&failure);
                vec![self.notice(NoticeKind::Error, envelope.summary())]
            }
        }
    }

    fn finish_detail(
        &mut self,
        id: R::Id,
        outcome: Result<Value, ApiFailure>,
    ) -> Vec<ControllerEvent> {
        match outcome.and_then(|body| decode::<R::Entity>(unwrap_data(body))) {
            Ok(entity) => {
                debug!(resource = R::SINGULAR, %id, "detail loaded");
                self.detail = Some(entity);
                vec![ControllerEvent::DetailLoaded]
            }
            Err(failure) => {
                warn!(resource = R::SINGULAR, %id, %failure, "detail fetch failed");
                let envelope = map_error(&failure);
                vec![self.notice(NoticeKind::Error, envelope.summary())]
            }
        }
    }

    fn issue(&mut self, call: ApiCall<R::Id>, pending: PendingCall<R::Id>) -> ControllerEvent {
        self.next_seq += 1;
        let request = RequestId {
            session: self.session,
            seq: self.next_seq,
        };
        let route = call.route(R::PATH);
        debug!(resource = R::SINGULAR, %request, %route, "issuing request");
        self.pending.insert(request, pending);
        ControllerEvent::Request(request, route)
    }

    fn notice(&self, kind: NoticeKind, message: &str) -> ControllerEvent {
        ControllerEvent::Notify(Notice {
            kind,
            message: message.to_owned(),
            duration: self.settings.alert_duration,
        })
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, ApiFailure> {
    serde_json::from_value(body).map_err(|error| ApiFailure::Decode {
        detail: error.to_string(),
    })
}

fn confirm_prompt(singular: &str, name: &str, action: GuardedAction) -> ConfirmPrompt {
    let verb = action.verb();
    let mut title = format!("{verb} {singular}");
    if let Some(first) = title.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    let body = match action {
        GuardedAction::Delete => format!("Delete {name}? This cannot be undone."),
        GuardedAction::SetStatus(_) => format!("{title} {name}?"),
    };
    ConfirmPrompt { title, body }
}
