// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedAction {
    Delete,
    SetStatus(crate::RecordStatus),
}

impl GuardedAction {
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::SetStatus(status) if status.is_active() => "activate",
            Self::SetStatus(_) => "deactivate",
        }
    }

    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Delete => "deleted",
            Self::SetStatus(status) if status.is_active() => "activated",
            Self::SetStatus(_) => "deactivated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionRejected {
    InFlight,
    AwaitingConfirmation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingConfirmation<Id> {
    id: Id,
    action: GuardedAction,
    prompt: ConfirmPrompt,
}

/// Per-row action state. Each id owns its own in-flight flag, so work on
/// one row never blocks another, and a row with a call outstanding refuses
/// a second one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCoordinator<Id> {
    in_flight: BTreeMap<Id, bool>,
    pending: Option<PendingConfirmation<Id>>,
}

impl<Id> Default for ActionCoordinator<Id> {
    fn default() -> Self {
        Self {
            in_flight: BTreeMap::new(),
            pending: None,
        }
    }
}

impl<Id: Copy + Ord> ActionCoordinator<Id> {
    pub fn is_in_flight(&self, id: Id) -> bool {
        self.in_flight.get(&id).copied().unwrap_or(false)
    }

    pub fn in_flight_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.in_flight
            .iter()
            .filter(|(_, busy)| **busy)
            .map(|(id, _)| *id)
    }

    pub fn pending_prompt(&self) -> Option<&ConfirmPrompt> {
        self.pending.as_ref().map(|pending| &pending.prompt)
    }

    /// Step one: park the action behind a confirmation prompt.
    pub fn request(
        &mut self,
        id: Id,
        action: GuardedAction,
        prompt: ConfirmPrompt,
    ) -> Result<&ConfirmPrompt, ActionRejected> {
        if self.is_in_flight(id) {
            return Err(ActionRejected::InFlight);
        }
        if self.pending.is_some() {
            return Err(ActionRejected::AwaitingConfirmation);
        }
        let pending = self.pending.insert(PendingConfirmation { id, action, prompt });
        Ok(&pending.prompt)
    }

    /// Step two: a declined prompt leaves no trace; an accepted one marks
    /// the row busy and hands the action back to run.
    pub fn resolve(&mut self, accepted: bool) -> Option<(Id, GuardedAction)> {
        let pending = self.pending.take()?;
        if !accepted {
            return None;
        }
        if self.is_in_flight(pending.id) {
            return None;
        }
        self.in_flight.insert(pending.id, true);
        Some((pending.id, pending.action))
    }

    pub fn finish(&mut self, id: Id) {
        self.in_flight.insert(id, false);
    }

    pub fn clear(&mut self) {
        self.in_flight.clear();
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionCoordinator, ActionRejected, ConfirmPrompt, GuardedAction};
    use crate::RecordStatus;

    fn prompt() -> ConfirmPrompt {
        ConfirmPrompt {
            title: "Delete client".to_owned(),
            body: "This cannot be undone.".to_owned(),
        }
    }

    #[test]
    fn declined_prompt_has_no_side_effect() {
        let mut actions = ActionCoordinator::default();
        actions
            .request(1, GuardedAction::Delete, prompt())
            .expect("first request should park");
        assert_eq!(actions.resolve(false), None);
        assert!(!actions.is_in_flight(1));
        assert!(actions.pending_prompt().is_none());
    }

    #[test]
    fn accepted_prompt_marks_only_that_row() {
        let mut actions = ActionCoordinator::default();
        actions
            .request(1, GuardedAction::SetStatus(RecordStatus::Inactive), prompt())
            .expect("request should park");
        let resolved = actions.resolve(true);
        assert_eq!(
            resolved,
            Some((1, GuardedAction::SetStatus(RecordStatus::Inactive)))
        );
        assert!(actions.is_in_flight(1));
        assert!(!actions.is_in_flight(2));
        assert_eq!(actions.in_flight_ids().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn busy_row_rejects_second_request() {
        let mut actions = ActionCoordinator::default();
        actions
            .request(1, GuardedAction::Delete, prompt())
            .expect("request should park");
        actions.resolve(true);
        assert_eq!(
            actions.request(1, GuardedAction::Delete, prompt()),
            Err(ActionRejected::InFlight)
        );
    }

    #[test]
    fn other_rows_proceed_while_one_is_busy() {
        let mut actions = ActionCoordinator::default();
        actions
            .request(1, GuardedAction::Delete, prompt())
            .expect("request should park");
        actions.resolve(true);

        actions
            .request(2, GuardedAction::Delete, prompt())
            .expect("other row should park");
        assert_eq!(actions.resolve(true), Some((2, GuardedAction::Delete)));
        assert!(actions.is_in_flight(1));
        assert!(actions.is_in_flight(2));
    }

    #[test]
    fn only_one_prompt_at_a_time() {
        let mut actions = ActionCoordinator::default();
        actions
            .request(1, GuardedAction::Delete, prompt())
            .expect("request should park");
        assert_eq!(
            actions.request(2, GuardedAction::Delete, prompt()),
            Err(ActionRejected::AwaitingConfirmation)
        );
    }

    #[test]
    fn finish_resets_flag() {
        let mut actions = ActionCoordinator::default();
        actions
            .request(5, GuardedAction::Delete, prompt())
            .expect("request should park");
        actions.resolve(true);
        actions.finish(5);
        assert!(!actions.is_in_flight(5));
        assert!(actions.request(5, GuardedAction::Delete, prompt()).is_ok());
    }

    #[test]
    fn verbs_follow_target_status() {
        assert_eq!(GuardedAction::Delete.verb(), "delete");
        assert_eq!(
            GuardedAction::SetStatus(RecordStatus::Active).past_tense(),
            "activated"
        );
        assert_eq!(
            GuardedAction::SetStatus(RecordStatus::Inactive).verb(),
            "deactivate"
        );
    }
}
