// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::borrow::Cow;

/// Text a row exposes to the search box, looked up by field name.
pub trait Searchable {
    fn search_text(&self, field: &str) -> Option<Cow<'_, str>>;
}

/// Case-insensitive substring match over `fields`. A blank term keeps
/// every item, in order.
pub fn filter_items<'a, T: Searchable>(items: &'a [T], term: &str, fields: &[&str]) -> Vec<&'a T> {
    let needle = normalize(term);
    if needle.is_empty() {
        return items.iter().collect();
    }

    items
        .iter()
        .filter(|item| matches_term(*item, &needle, fields))
        .collect()
}

fn matches_term<T: Searchable>(item: &T, needle: &str, fields: &[&str]) -> bool {
    fields.iter().any(|field| {
        item.search_text(field)
            .is_some_and(|text| text.to_lowercase().contains(needle))
    })
}

fn normalize(term: &str) -> String {
    term.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{Searchable, filter_items};
    use std::borrow::Cow;

    struct Person {
        name: &'static str,
        city: &'static str,
    }

    impl Searchable for Person {
        fn search_text(&self, field: &str) -> Option<Cow<'_, str>> {
            match field {
                "name" => Some(Cow::Borrowed(self.name)),
                "city" => Some(Cow::Borrowed(self.city)),
                _ => None,
            }
        }
    }

    fn people() -> Vec<Person> {
        vec![
            Person {
                name: "Juan Perez",
                city: "Lima",
            },
            Person {
                name: "Ana Gomez",
                city: "Juanjui",
            },
        ]
    }

    #[test]
    fn search_is_case_insensitive_over_listed_fields() {
        let people = people();
        let matched = filter_items(&people, "juan", &["name"]);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "Juan Perez");
    }

    #[test]
    fn unlisted_fields_are_not_searched() {
        let people = people();
        assert_eq!(filter_items(&people, "juanjui", &["name"]).len(), 0);
        assert_eq!(filter_items(&people, "juanjui", &["name", "city"]).len(), 1);
    }

    #[test]
    fn blank_term_keeps_everything() {
        let people = people();
        assert_eq!(filter_items(&people, "   ", &["name"]).len(), 2);
    }

    #[test]
    fn term_is_trimmed() {
        let people = people();
        assert_eq!(filter_items(&people, "  GOMEZ ", &["name"]).len(), 1);
    }
}
