// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::ops::RangeInclusive;

pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;
pub const DEFAULT_MAX_PAGE_BUTTONS: usize = 5;

/// The run of page-number controls shown under a table.
///
/// Pages are 1-based. `start_page..=end_page` always has
/// `min(max_buttons, total_pages)` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub start_page: usize,
    pub end_page: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

impl PageWindow {
    pub fn pages(&self) -> RangeInclusive<usize> {
        self.start_page..=self.end_page
    }

    pub const fn len(&self) -> usize {
        self.end_page + 1 - self.start_page
    }

    pub const fn is_empty(&self) -> bool {
        false
    }

    pub const fn leading_ellipsis(&self) -> bool {
        self.start_page > 1
    }

    pub const fn trailing_ellipsis(&self) -> bool {
        self.end_page < self.total_pages
    }

    pub const fn show_first_jump(&self) -> bool {
        self.leading_ellipsis()
    }

    pub const fn show_last_jump(&self) -> bool {
        self.trailing_ellipsis()
    }

    pub const fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    total_items.div_ceil(page_size.max(1)).max(1)
}

/// Pulls `page` into `1..=total_pages`. Shrinking lists move the page down,
/// never up.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

pub fn paginate(
    total_items: usize,
    current_page: usize,
    page_size: usize,
    max_buttons: usize,
) -> PageWindow {
    let total = total_pages(total_items, page_size);
    let current = clamp_page(current_page, total);
    let max_buttons = max_buttons.max(1);

    if total <= max_buttons {
        return PageWindow {
            start_page: 1,
            end_page: total,
            total_pages: total,
            current_page: current,
        };
    }

    let before = max_buttons / 2;
    let after = max_buttons.div_ceil(2) - 1;
    let (start_page, end_page) = if current <= before {
        (1, max_buttons)
    } else if current + after >= total {
        (total - max_buttons + 1, total)
    } else {
        (current - before, current + after)
    };

    PageWindow {
        start_page,
        end_page,
        total_pages: total,
        current_page: current,
    }
}

pub fn page_slice<T>(items: &[T], current_page: usize, page_size: usize) -> &[T] {
    let page_size = page_size.max(1);
    let page = clamp_page(current_page, total_pages(items.len(), page_size));
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(items.len());
    &items[start.min(items.len())..end]
}
