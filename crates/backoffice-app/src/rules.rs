// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Field rules shared by the resource forms. Each check returns the message
//! to show, or `None` when the value passes.

use time::Date;
use time::macros::format_description;

pub const MONTH_RANGE_MESSAGE: &str = "month must be between 1 and 12";
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 2000..=2100;
pub const MIN_PASSWORD_LEN: usize = 8;

pub fn required(value: &str, label: &str) -> Option<String> {
    value
        .trim()
        .is_empty()
        .then(|| format!("{label} is required"))
}

pub fn email(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return Some("email is required".to_owned());
    }
    let valid = value.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && !value.contains(char::is_whitespace)
            && domain
                .rsplit_once('.')
                .is_some_and(|(host, tld)| !host.is_empty() && tld.len() >= 2)
    });
    (!valid).then(|| "enter a valid email address".to_owned())
}

pub fn phone(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return Some("phone is required".to_owned());
    }
    let valid = value.len() == 10 && value.bytes().all(|byte| byte.is_ascii_digit());
    (!valid).then(|| "phone must have exactly 10 digits".to_owned())
}

pub fn month(value: &str) -> Option<String> {
    match value.trim().parse::<u8>() {
        Ok(month) if (1..=12).contains(&month) => None,
        _ => Some(MONTH_RANGE_MESSAGE.to_owned()),
    }
}

pub fn year(value: &str) -> Option<String> {
    match value.trim().parse::<i32>() {
        Ok(year) if YEAR_RANGE.contains(&year) => None,
        _ => Some(format!(
            "year must be between {} and {}",
            YEAR_RANGE.start(),
            YEAR_RANGE.end()
        )),
    }
}

pub fn reference_id(value: &str, label: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return Some(format!("{label} is required"));
    }
    match value.parse::<i64>() {
        Ok(id) if id > 0 => None,
        _ => Some(format!("choose a valid {label}")),
    }
}

pub fn amount(value: &str) -> Option<String> {
    match parse_cents(value) {
        Ok(cents) if cents > 0 => None,
        Ok(_) => Some("amount must be greater than zero".to_owned()),
        Err(message) => Some(message.to_owned()),
    }
}

pub fn password(value: &str, editing: bool) -> Option<String> {
    if editing && value.is_empty() {
        return None;
    }
    if value.is_empty() {
        return Some("password is required".to_owned());
    }
    (value.chars().count() < MIN_PASSWORD_LEN)
        .then(|| format!("password must have at least {MIN_PASSWORD_LEN} characters"))
}

pub fn optional_date(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    parse_date(value)
        .is_err()
        .then(|| "use a YYYY-MM-DD date".to_owned())
}

pub fn parse_date(input: &str) -> Result<Date, time::error::Parse> {
    Date::parse(input.trim(), &format_description!("[year]-[month]-[day]"))
}

/// Parses `1,234.5` or `$12` into cents. Negative and over-precise amounts
/// are rejected.
pub fn parse_cents(input: &str) -> Result<i64, &'static str> {
    const INVALID: &str = "enter an amount like 1250.00";

    let clean = input.trim().replace(',', "");
    if clean.starts_with('-') {
        return Err("amount cannot be negative");
    }
    let clean = clean.strip_prefix('$').unwrap_or(&clean);
    if clean.is_empty() {
        return Err("amount is required");
    }

    let (whole, frac) = match clean.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (clean, None),
    };
    let digits = |text: &str| !text.is_empty() && text.bytes().all(|byte| byte.is_ascii_digit());

    let whole = if whole.is_empty() {
        0
    } else if digits(whole) {
        whole.parse::<i64>().map_err(|_| INVALID)?
    } else {
        return Err(INVALID);
    };

    let frac = match frac {
        None => 0,
        Some(frac) if frac.len() <= 2 && digits(frac) => {
            let value = frac.parse::<i64>().map_err(|_| INVALID)?;
            if frac.len() == 1 { value * 10 } else { value }
        }
        Some(_) => return Err(INVALID),
    };

    whole
        .checked_mul(100)
        .and_then(|value| value.checked_add(frac))
        .ok_or(INVALID)
}

/// Ungrouped amount for form inputs, e.g. `1234.50` or `-0.05`.
pub fn amount_input(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, ch) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{:02}", cents % 100)
}
