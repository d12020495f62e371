//! Format predicates (email/url/phone/slug/uuid/ulid) and locale-independent
//! display formatters (currency/percent/number/date/datetime), per spec §4.5:
//! "Format types ... run the corresponding format predicate" and
//! "`record.format(field)` applies the declared format hint ... using
//! locale-independent formatters".
//!
//! Grounded on the teacher's hand-rolled field validators
//! (`oxide-orm/src/fields/char.rs`'s `EmailField`/`UrlField::validate`),
//! generalised from fixed Rust field types to runtime format tags.

use parsley_core::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Email,
    Url,
    Phone,
    Slug,
    Uuid,
    Ulid,
}

impl FormatKind {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "email" => Self::Email,
            "url" => Self::Url,
            "phone" => Self::Phone,
            "slug" => Self::Slug,
            "uuid" => Self::Uuid,
            "ulid" => Self::Ulid,
            _ => return None,
        })
    }

    #[must_use]
    pub fn matches(self, value: &str) -> bool {
        match self {
            Self::Email => is_email(value),
            Self::Url => is_url(value),
            Self::Phone => is_phone(value),
            Self::Slug => is_slug(value),
            Self::Uuid => is_uuid(value),
            Self::Ulid => is_ulid(value),
        }
    }
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && !domain.is_empty() && domain.contains('.') && !value.contains(' ')
}

fn is_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn is_phone(value: &str) -> bool {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    let allowed_extra = value.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    allowed_extra && (7..=15).contains(&digits.len())
}

fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !value.starts_with('-')
        && !value.ends_with('-')
}

fn is_uuid(value: &str) -> bool {
    let parts: Vec<&str> = value.split('-').collect();
    matches!(parts.as_slice(), [a, b, c, d, e]
        if a.len() == 8 && b.len() == 4 && c.len() == 4 && d.len() == 4 && e.len() == 12
        && value.chars().all(|ch| ch.is_ascii_hexdigit() || ch == '-'))
}

fn is_ulid(value: &str) -> bool {
    const CROCKFORD_BASE32: &str = "0123456789ABCDEFGHJKMNPQRSTVWXYZ";
    value.len() == 26 && value.chars().all(|c| CROCKFORD_BASE32.contains(c.to_ascii_uppercase()))
}

/// `record.format(field)` hints: `currency`, `percent`, `number`, `date`,
/// `datetime`. Unknown hint returns the value's default string form (spec
/// §4.5).
#[must_use]
pub fn apply_format_hint(hint: &str, value: &Value) -> String {
    match (hint, value) {
        ("currency", Value::Money(m)) => format!("{} {:.*}", m.currency_code(), usize::from(m.scale), m.amount()),
        ("percent", Value::Float(f)) => format!("{:.1}%", f * 100.0),
        ("percent", Value::Integer(n)) => format!("{}%", n * 100),
        ("number", Value::Float(f)) => format_thousands(*f),
        ("number", Value::Integer(n)) => format_thousands(*n as f64),
        ("date", Value::DateTime(dt)) => dt.iso().unwrap_or_else(|| value.to_display_string()),
        ("datetime", Value::DateTime(dt)) => dt.iso().unwrap_or_else(|| value.to_display_string()),
        _ => value.to_display_string(),
    }
}

fn format_thousands(value: f64) -> String {
    let negative = value < 0.0;
    let rounded = value.abs().round() as i64;
    let digits = rounded.to_string();
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let grouped: String = grouped.chars().rev().collect();
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_predicate() {
        assert!(is_email("user@example.com"));
        assert!(!is_email("not-an-email"));
        assert!(!is_email("@example.com"));
    }

    #[test]
    fn slug_predicate_rejects_leading_and_trailing_dash() {
        assert!(is_slug("hello-world"));
        assert!(!is_slug("-hello"));
        assert!(!is_slug("hello-"));
    }

    #[test]
    fn uuid_predicate_checks_group_lengths() {
        assert!(is_uuid("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_uuid("not-a-uuid"));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(format_thousands(1_234_567.0), "1,234,567");
        assert_eq!(format_thousands(-42.0), "-42");
    }
}
