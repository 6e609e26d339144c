// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use backoffice_app::rules::MONTH_RANGE_MESSAGE;
use backoffice_app::{
    ApiFailure, CONNECTION_MESSAGE, Client, ClientId, Clients, ControllerEvent, HttpMethod,
    ListSettings, NoticeKind, Payments, RecordStatus, RequestId, Resource,
    ResourceListController, Route, Transport,
};
use backoffice_testkit::{Dataset, MemoryApi, OfficeFaker};
use serde_json::json;
use std::collections::VecDeque;

/// Runs every request the controller asks for against `api`, feeding the
/// replies back until nothing is left in flight. Returns the other events.
fn settle<R: Resource>(
    controller: &mut ResourceListController<R>,
    api: &MemoryApi,
    events: Vec<ControllerEvent>,
) -> Vec<ControllerEvent> {
    let mut queue = VecDeque::from(events);
    let mut surfaced = Vec::new();
    while let Some(event) = queue.pop_front() {
        match event {
            ControllerEvent::Request(request, route) => {
                let outcome = api.send(&route);
                queue.extend(controller.complete(request, outcome));
            }
            other => surfaced.push(other),
        }
    }
    surfaced
}

fn take_request(events: Vec<ControllerEvent>) -> Result<(RequestId, Route)> {
    events
        .into_iter()
        .find_map(|event| match event {
            ControllerEvent::Request(request, route) => Some((request, route)),
            _ => None,
        })
        .ok_or_else(|| anyhow!("expected a request event"))
}

fn notices(events: &[ControllerEvent]) -> Vec<(NoticeKind, &str)> {
    events
        .iter()
        .filter_map(|event| match event {
            ControllerEvent::Notify(notice) => Some((notice.kind, notice.message.as_str())),
            _ => None,
        })
        .collect()
}

fn clients_named(names: &[&str]) -> Dataset {
    let clients = names
        .iter()
        .zip(1..)
        .map(|(name, id)| Client {
            id: ClientId::new(id),
            name: (*name).to_owned(),
            email: format!("client{id}@example.com"),
            phone: "5512345678".to_owned(),
            address: String::new(),
            status: RecordStatus::Active,
        })
        .collect();
    Dataset {
        clients,
        ..Dataset::default()
    }
}

fn numbered_clients(count: usize) -> Dataset {
    let names = (1..=count).map(|n| format!("Client {n}")).collect::<Vec<_>>();
    clients_named(&names.iter().map(String::as_str).collect::<Vec<_>>())
}

fn loaded_clients(api: &MemoryApi) -> ResourceListController<Clients> {
    let mut controller = ResourceListController::<Clients>::new(ListSettings::default());
    let events = controller.load();
    settle(&mut controller, api, events);
    controller
}

#[test]
fn twelve_items_split_across_two_pages() {
    let api = MemoryApi::new(numbered_clients(12));
    let mut controller = loaded_clients(&api);

    assert_eq!(controller.total_pages(), 2);
    controller.set_page(2);
    let ids = controller
        .visible_items()
        .iter()
        .map(|client| client.id.get())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![11, 12]);
}

#[test]
fn search_narrows_and_clamps_page() {
    let mut names = vec!["Juan Perez", "Ana Gomez"];
    names.extend(["Luis Diaz"; 10]);
    let api = MemoryApi::new(clients_named(&names));
    let mut controller = loaded_clients(&api);
    controller.set_page(2);
    assert_eq!(controller.current_page(), 2);

    controller.set_search_term("juan");
    assert_eq!(controller.filtered().len(), 1);
    assert_eq!(controller.filtered()[0].name, "Juan Perez");
    assert_eq!(controller.total_pages(), 1);
    assert_eq!(controller.current_page(), 1);

    controller.set_search_term("  ");
    assert_eq!(controller.filtered().len(), 12);
    assert_eq!(controller.current_page(), 1);
}

#[test]
fn out_of_range_month_never_reaches_the_network() -> Result<()> {
    let api = MemoryApi::new(clients_named(&["Ana Gomez"]));
    let mut controller = ResourceListController::<Payments>::new(ListSettings::default());
    let events = controller.load();
    settle(&mut controller, &api, events);

    controller.open_create();
    for (name, value) in [
        ("client_id", "1"),
        ("amount", "150.00"),
        ("month", "13"),
        ("year", "2026"),
        ("reference", "R-1"),
    ] {
        controller.change_field(name, value);
    }
    assert!(controller.submit().is_empty());
    let form = controller.form().ok_or_else(|| anyhow!("form closed"))?;
    assert_eq!(form.state.displayed_error("month"), Some(MONTH_RANGE_MESSAGE));
    assert_eq!(api.count(HttpMethod::Post, "/payments"), 0);

    controller.change_field("month", "6");
    let events = controller.submit();
    let (_, route) = take_request(events.clone())?;
    assert_eq!(route.method, HttpMethod::Post);
    assert_eq!(route.body.as_ref().map(|body| body["month"].clone()), Some(json!(6)));

    let surfaced = settle(&mut controller, &api, events);
    assert_eq!(api.count(HttpMethod::Post, "/payments"), 1);
    assert!(surfaced.contains(&ControllerEvent::FormClosed));
    assert_eq!(
        notices(&surfaced),
        vec![(NoticeKind::Success, "payment created")]
    );
    assert!(controller.form().is_none());
    assert_eq!(controller.items().len(), 1);
    assert_eq!(controller.items()[0].client_name, "Ana Gomez");
    Ok(())
}

#[test]
fn server_field_error_keeps_entered_values() -> Result<()> {
    let api = MemoryApi::new(Dataset::default());
    let mut controller = loaded_clients(&api);
    api.fail_next(
        "POST /clients",
        ApiFailure::response(400, json!({"errors": [{"path": "email", "msg": "invalid"}]})),
    );

    controller.open_create();
    controller.change_field("name", "Ana Gomez");
    controller.change_field("email", "ana@example.com");
    controller.change_field("phone", "5512345678");
    let events = controller.submit();
    let surfaced = settle(&mut controller, &api, events);

    let form = controller.form().ok_or_else(|| anyhow!("form should stay open"))?;
    assert_eq!(form.state.backend_errors().get("email").map(String::as_str), Some("invalid"));
    assert_eq!(form.state.value("email"), "ana@example.com");
    assert_eq!(form.state.displayed_error("email"), Some("invalid"));
    assert!(!form.state.is_saving());
    assert!(form.state.is_submit_disabled());
    assert_eq!(notices(&surfaced).len(), 1);
    assert!(controller.items().is_empty());

    controller.change_field("email", "ana.gomez@example.com");
    let form = controller.form().ok_or_else(|| anyhow!("form should stay open"))?;
    assert_eq!(form.state.displayed_error("email"), None);
    assert!(!form.state.is_submit_disabled());
    Ok(())
}

#[test]
fn duplicate_email_reported_by_server_lands_on_the_field() -> Result<()> {
    let api = MemoryApi::new(clients_named(&["Ana Gomez"]));
    let mut controller = loaded_clients(&api);

    controller.open_create();
    controller.change_field("name", "Ana Twin");
    controller.change_field("email", "client1@example.com");
    controller.change_field("phone", "5512345678");
    let events = controller.submit();
    settle(&mut controller, &api, events);

    let form = controller.form().ok_or_else(|| anyhow!("form should stay open"))?;
    assert_eq!(
        form.state.displayed_error("email"),
        Some("email already registered")
    );
    assert_eq!(controller.items().len(), 1);
    Ok(())
}

#[test]
fn double_toggle_on_one_row_sends_one_call() -> Result<()> {
    let api = MemoryApi::new(numbered_clients(3));
    let mut controller = loaded_clients(&api);
    let id = ClientId::new(1);

    let confirm = controller.request_toggle_status(id);
    assert!(matches!(confirm.as_slice(), [ControllerEvent::Confirm(_)]));
    let held = controller.resolve_confirmation(true);
    assert!(controller.is_busy(id));

    assert!(controller.request_toggle_status(id).is_empty());
    assert!(controller.resolve_confirmation(true).is_empty());
    assert!(!controller.is_busy(ClientId::new(2)));

    let surfaced = settle(&mut controller, &api, held);
    assert_eq!(api.count(HttpMethod::Patch, "/clients/1/status"), 1);
    assert!(!controller.is_busy(id));
    assert_eq!(
        notices(&surfaced),
        vec![(NoticeKind::Success, "client deactivated")]
    );
    assert_eq!(
        controller.find(id).map(|client| client.status),
        Some(RecordStatus::Inactive)
    );
    Ok(())
}

#[test]
fn rows_act_independently() -> Result<()> {
    let api = MemoryApi::new(numbered_clients(3));
    let mut controller = loaded_clients(&api);

    controller.request_toggle_status(ClientId::new(1));
    let first = controller.resolve_confirmation(true);
    controller.request_delete(ClientId::new(2));
    let second = controller.resolve_confirmation(true);
    take_request(second.clone())?;

    assert!(controller.is_busy(ClientId::new(1)));
    assert!(controller.is_busy(ClientId::new(2)));
    assert!(!controller.is_busy(ClientId::new(3)));

    settle(&mut controller, &api, second);
    assert!(controller.is_busy(ClientId::new(1)));
    assert!(controller.find(ClientId::new(2)).is_none());

    settle(&mut controller, &api, first);
    assert!(!controller.is_busy(ClientId::new(1)));
    Ok(())
}

#[test]
fn declined_confirmation_has_no_effect() {
    let api = MemoryApi::new(numbered_clients(2));
    let mut controller = loaded_clients(&api);
    let calls_before = api.calls().len();

    controller.request_delete(ClientId::new(1));
    assert!(controller.pending_confirmation().is_some());
    assert!(controller.resolve_confirmation(false).is_empty());
    assert!(controller.pending_confirmation().is_none());
    assert!(!controller.is_busy(ClientId::new(1)));
    assert_eq!(api.calls().len(), calls_before);
}

#[test]
fn failed_action_notifies_and_leaves_list_alone() {
    let api = MemoryApi::new(numbered_clients(2));
    let mut controller = loaded_clients(&api);
    api.fail_next(
        "DELETE /clients",
        ApiFailure::NoResponse {
            detail: "connection refused".to_owned(),
        },
    );

    controller.request_delete(ClientId::new(1));
    let events = controller.resolve_confirmation(true);
    let surfaced = settle(&mut controller, &api, events);

    assert_eq!(notices(&surfaced), vec![(NoticeKind::Error, CONNECTION_MESSAGE)]);
    assert_eq!(controller.items().len(), 2);
    assert!(!controller.is_busy(ClientId::new(1)));
    assert_eq!(api.count(HttpMethod::Get, "/clients"), 1);
}

#[test]
fn late_save_reply_does_not_touch_a_reopened_form() -> Result<()> {
    let api = MemoryApi::new(Dataset::default());
    let mut controller = loaded_clients(&api);

    controller.open_create();
    controller.change_field("name", "Ana Gomez");
    controller.change_field("email", "ana@example.com");
    controller.change_field("phone", "5512345678");
    let held = controller.submit();

    controller.close_form();
    controller.open_create();
    controller.change_field("name", "Draft");

    let surfaced = settle(&mut controller, &api, held);
    assert!(!surfaced.contains(&ControllerEvent::FormClosed));
    let form = controller.form().ok_or_else(|| anyhow!("new form should survive"))?;
    assert_eq!(form.state.value("name"), "Draft");
    assert!(!form.state.is_saving());
    assert_eq!(controller.items().len(), 1);
    Ok(())
}

#[test]
fn edit_saves_and_refreshes_without_resetting_page() -> Result<()> {
    let api = MemoryApi::new(numbered_clients(15));
    let mut controller = loaded_clients(&api);
    controller.set_page(2);

    assert!(controller.open_edit(ClientId::new(12)));
    let form = controller.form().ok_or_else(|| anyhow!("edit form"))?;
    assert_eq!(form.state.value("name"), "Client 12");

    controller.change_field("name", "Renamed");
    let events = controller.submit();
    let (_, route) = take_request(events.clone())?;
    assert_eq!((route.method, route.path.as_str()), (HttpMethod::Put, "/clients/12"));

    let surfaced = settle(&mut controller, &api, events);
    assert_eq!(notices(&surfaced), vec![(NoticeKind::Success, "client updated")]);
    assert_eq!(controller.current_page(), 2);
    assert!(!controller.is_loading());
    assert_eq!(
        controller.find(ClientId::new(12)).map(|client| client.name.as_str()),
        Some("Renamed")
    );
    Ok(())
}

#[test]
fn teardown_discards_replies_in_flight() -> Result<()> {
    let api = MemoryApi::new(numbered_clients(4));
    let mut controller = ResourceListController::<Clients>::new(ListSettings::default());
    let (request, route) = take_request(controller.load())?;
    controller.teardown();

    assert!(controller.complete(request, api.send(&route)).is_empty());
    assert!(controller.items().is_empty());
    assert_eq!(controller.pending_requests(), 0);
    Ok(())
}

#[test]
fn detail_view_fetches_one_record() {
    let api = MemoryApi::new(OfficeFaker::new(5).dataset(6, 0, 0));
    let mut controller = loaded_clients(&api);

    let events = controller.show_detail(ClientId::new(3));
    let surfaced = settle(&mut controller, &api, events);
    assert_eq!(surfaced, vec![ControllerEvent::DetailLoaded]);
    assert_eq!(controller.detail().map(|client| client.id.get()), Some(3));

    let events = controller.show_detail(ClientId::new(99));
    let surfaced = settle(&mut controller, &api, events);
    assert_eq!(notices(&surfaced).len(), 1);
}

#[test]
fn list_failure_surfaces_and_keeps_old_rows() {
    let api = MemoryApi::new(numbered_clients(3));
    let mut controller = loaded_clients(&api);
    api.fail_next("GET /clients", ApiFailure::Timeout);

    let events = controller.refresh();
    let surfaced = settle(&mut controller, &api, events);
    assert_eq!(notices(&surfaced).len(), 1);
    assert_eq!(controller.items().len(), 3);
    assert!(controller.load_error().is_some());
}

#[test]
fn older_list_failure_after_newer_success_is_ignored() -> Result<()> {
    let api = MemoryApi::new(numbered_clients(2));
    let mut controller = loaded_clients(&api);

    let (first, _) = take_request(controller.refresh())?;
    let (second, route) = take_request(controller.refresh())?;
    assert!(controller.complete(second, api.send(&route)).is_empty());

    let surfaced = controller.complete(first, Err(ApiFailure::Timeout));
    assert!(notices(&surfaced).is_empty());
    assert!(controller.load_error().is_none());
    assert_eq!(controller.items().len(), 2);
    Ok(())
}

#[test]
fn payload_key_error_shows_in_general_message_and_allows_resubmit() -> Result<()> {
    let api = MemoryApi::new(clients_named(&["Ana Gomez"]));
    let mut controller = ResourceListController::<Payments>::new(ListSettings::default());
    let events = controller.load();
    settle(&mut controller, &api, events);
    api.fail_next(
        "POST /payments",
        ApiFailure::response(
            400,
            json!({"errors": [{"path": "amount_cents", "msg": "too large"}]}),
        ),
    );

    controller.open_create();
    for (name, value) in [
        ("client_id", "1"),
        ("amount", "99999999.00"),
        ("month", "6"),
        ("year", "2026"),
        ("reference", "R-9"),
    ] {
        controller.change_field(name, value);
    }
    let events = controller.submit();
    settle(&mut controller, &api, events);

    let form = controller.form().ok_or_else(|| anyhow!("form should stay open"))?;
    assert!(form.state.backend_errors().is_empty());
    assert_eq!(form.state.general_error(), Some("amount_cents: too large"));
    assert!(!form.state.is_submit_disabled());

    controller.change_field("amount", "150.00");
    let events = controller.submit();
    let surfaced = settle(&mut controller, &api, events);
    assert!(surfaced.contains(&ControllerEvent::FormClosed));
    assert_eq!(api.count(HttpMethod::Post, "/payments"), 2);
    Ok(())
}
