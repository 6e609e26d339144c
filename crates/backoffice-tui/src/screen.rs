// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use backoffice_app::pagination::PageWindow;
use backoffice_app::{
    ApiFailure, ConfirmPrompt, ControllerEvent, FieldKind, ListSettings, RequestId, Resource,
    ResourceListController, RowView,
};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNav {
    Next,
    Prev,
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub label: &'static str,
    pub value: String,
    pub error: Option<String>,
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub title: String,
    pub fields: Vec<FieldView>,
    pub general_error: Option<String>,
    pub saving: bool,
    pub submit_disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub columns: &'static [&'static str],
    pub rows: Vec<RowView<String>>,
    pub cursor: usize,
    pub window: PageWindow,
    pub matched: usize,
    pub total: usize,
    pub loading: bool,
    pub search_term: String,
    pub load_error: Option<String>,
}

/// What the console needs from one resource screen, independent of the
/// resource type behind it.
pub trait Screen {
    fn load(&mut self) -> Vec<ControllerEvent>;
    fn refresh(&mut self) -> Vec<ControllerEvent>;
    fn complete(
        &mut self,
        request: RequestId,
        outcome: Result<Value, ApiFailure>,
    ) -> Vec<ControllerEvent>;
    fn teardown(&mut self);

    fn search_term(&self) -> &str;
    fn set_search_term(&mut self, term: String);
    fn page(&mut self, nav: PageNav);
    fn move_cursor(&mut self, delta: isize);
    fn table(&self) -> TableView;

    fn open_create(&mut self);
    fn open_edit_selected(&mut self) -> bool;
    fn form(&self) -> Option<FormView>;
    fn focus_field(&mut self, delta: isize);
    fn type_char(&mut self, ch: char);
    fn erase_char(&mut self);
    fn submit(&mut self) -> Vec<ControllerEvent>;
    fn close_form(&mut self);

    fn delete_selected(&mut self) -> Vec<ControllerEvent>;
    fn toggle_selected(&mut self) -> Vec<ControllerEvent>;
    fn confirm_prompt(&self) -> Option<&ConfirmPrompt>;
    fn resolve_confirmation(&mut self, accepted: bool) -> Vec<ControllerEvent>;

    fn show_selected(&mut self) -> Vec<ControllerEvent>;
    fn detail(&self) -> Option<Vec<(&'static str, String)>>;
    fn close_detail(&mut self);
}

#[derive(Debug)]
pub struct ListScreen<R: Resource> {
    controller: ResourceListController<R>,
    cursor: usize,
    focus: usize,
}

impl<R: Resource> ListScreen<R> {
    pub fn new(settings: ListSettings) -> Self {
        Self {
            controller: ResourceListController::new(settings),
            cursor: 0,
            focus: 0,
        }
    }

    pub fn controller(&self) -> &ResourceListController<R> {
        &self.controller
    }

    fn selected(&self) -> Option<R::Id> {
        self.controller
            .visible_items()
            .get(self.cursor)
            .map(|entity| R::id(entity))
    }

    fn clamp_cursor(&mut self) {
        let rows = self.controller.visible_items().len();
        self.cursor = self.cursor.min(rows.saturating_sub(1));
    }

    fn focused_field(&self) -> Option<&'static str> {
        let form = self.controller.form()?;
        form.state.fields().nth(self.focus).map(|spec| spec.name)
    }
}

impl<R: Resource> Screen for ListScreen<R> {
    fn load(&mut self) -> Vec<ControllerEvent> {
        self.cursor = 0;
        self.controller.load()
    }

    fn refresh(&mut self) -> Vec<ControllerEvent> {
        self.controller.refresh()
    }

    fn complete(
        &mut self,
        request: RequestId,
        outcome: Result<Value, ApiFailure>,
    ) -> Vec<ControllerEvent> {
        let events = self.controller.complete(request, outcome);
        self.clamp_cursor();
        events
    }

    fn teardown(&mut self) {
        self.controller.teardown();
    }

    fn search_term(&self) -> &str {
        self.controller.search_term()
    }

    fn set_search_term(&mut self, term: String) {
        self.controller.set_search_term(term);
        self.clamp_cursor();
    }

    fn page(&mut self, nav: PageNav) {
        match nav {
            PageNav::Next => self.controller.next_page(),
            PageNav::Prev => self.controller.prev_page(),
            PageNav::First => self.controller.first_page(),
            PageNav::Last => self.controller.last_page(),
        }
        self.cursor = 0;
    }

    fn move_cursor(&mut self, delta: isize) {
        let rows = self.controller.visible_items().len();
        if rows == 0 {
            self.cursor = 0;
            return;
        }
        let next = (self.cursor as isize + delta).clamp(0, rows as isize - 1);
        self.cursor = next as usize;
    }

    fn table(&self) -> TableView {
        let rows = self
            .controller
            .visible_rows()
            .into_iter()
            .map(|row| RowView {
                id: row.id.to_string(),
                cells: row.cells,
                active: row.active,
                busy: row.busy,
            })
            .collect();
        TableView {
            columns: R::COLUMNS,
            rows,
            cursor: self.cursor,
            window: self.controller.page_window(),
            matched: self.controller.filtered().len(),
            total: self.controller.items().len(),
            loading: self.controller.is_loading(),
            search_term: self.controller.search_term().to_owned(),
            load_error: self
                .controller
                .load_error()
                .map(|envelope| envelope.summary().to_owned()),
        }
    }

    fn open_create(&mut self) {
        self.focus = 0;
        self.controller.open_create();
    }

    fn open_edit_selected(&mut self) -> bool {
        let Some(id) = self.selected() else {
            return false;
        };
        self.focus = 0;
        self.controller.open_edit(id)
    }

    fn form(&self) -> Option<FormView> {
        let form = self.controller.form()?;
        let state = &form.state;
        let title = match form.target {
            Some(id) => format!("edit {} #{id}", R::SINGULAR),
            None => format!("new {}", R::SINGULAR),
        };
        let fields = state
            .fields()
            .enumerate()
            .map(|(index, spec)| {
                let raw = state.value(spec.name);
                let value = match spec.kind {
                    FieldKind::Secret => "*".repeat(raw.chars().count()),
                    _ => raw.to_owned(),
                };
                FieldView {
                    label: spec.label,
                    value,
                    error: state.displayed_error(spec.name).map(str::to_owned),
                    focused: index == self.focus,
                }
            })
            .collect();
        Some(FormView {
            title,
            fields,
            general_error: state.general_error().map(str::to_owned),
            saving: state.is_saving(),
            submit_disabled: state.is_submit_disabled(),
        })
    }

    fn focus_field(&mut self, delta: isize) {
        let Some(count) = self
            .controller
            .form()
            .map(|form| form.state.fields().count())
        else {
            return;
        };
        if count == 0 {
            return;
        }
        if let Some(name) = self.focused_field() {
            self.controller.blur_field(name);
        }
        let next = (self.focus as isize + delta).rem_euclid(count as isize);
        self.focus = next as usize;
    }

    fn type_char(&mut self, ch: char) {
        let Some(name) = self.focused_field() else {
            return;
        };
        let Some(mut value) = self
            .controller
            .form()
            .map(|form| form.state.value(name).to_owned())
        else {
            return;
        };
        value.push(ch);
        self.controller.change_field(name, value);
    }

    fn erase_char(&mut self) {
        let Some(name) = self.focused_field() else {
            return;
        };
        let Some(mut value) = self
            .controller
            .form()
            .map(|form| form.state.value(name).to_owned())
        else {
            return;
        };
        value.pop();
        self.controller.change_field(name, value);
    }

    fn submit(&mut self) -> Vec<ControllerEvent> {
        self.controller.submit()
    }

    fn close_form(&mut self) {
        self.controller.close_form();
    }

    fn delete_selected(&mut self) -> Vec<ControllerEvent> {
        match self.selected() {
            Some(id) => self.controller.request_delete(id),
            None => Vec::new(),
        }
    }

    fn toggle_selected(&mut self) -> Vec<ControllerEvent> {
        match self.selected() {
            Some(id) => self.controller.request_toggle_status(id),
            None => Vec::new(),
        }
    }

    fn confirm_prompt(&self) -> Option<&ConfirmPrompt> {
        self.controller.pending_confirmation()
    }

    fn resolve_confirmation(&mut self, accepted: bool) -> Vec<ControllerEvent> {
        self.controller.resolve_confirmation(accepted)
    }

    fn show_selected(&mut self) -> Vec<ControllerEvent> {
        match self.selected() {
            Some(id) => self.controller.show_detail(id),
            None => Vec::new(),
        }
    }

    fn detail(&self) -> Option<Vec<(&'static str, String)>> {
        let entity = self.controller.detail()?;
        Some(R::COLUMNS.iter().copied().zip(R::cells(entity)).collect())
    }

    fn close_detail(&mut self) {
        self.controller.close_detail();
    }
}
