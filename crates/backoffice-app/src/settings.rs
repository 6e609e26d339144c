// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, DEFAULT_MAX_PAGE_BUTTONS};

pub const DEFAULT_ALERT_DURATION: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSettings {
    pub items_per_page: usize,
    pub max_page_buttons: usize,
    pub alert_duration: Duration,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            max_page_buttons: DEFAULT_MAX_PAGE_BUTTONS,
            alert_duration: DEFAULT_ALERT_DURATION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// A transient, auto-dismissing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub duration: Duration,
}
