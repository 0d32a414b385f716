//! Field-level validation rules for each entity kind.
//!
//! Every entity is described by an ordered table of [`FieldRule`]s. The table doubles as the
//! strict schema for the entity: fields that are not listed are never persisted.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// The three kinds of documents this service persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Profile,
    Booking,
    ContactMessage,
}

/// Format constraint attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    /// Free text.
    Text,
    /// Exactly 10 ASCII digits.
    TenDigitPhone,
    /// Exactly 6 ASCII digits.
    SixDigitPostalCode,
    /// Boolean flag.
    Flag,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub required: bool,
    pub format: FieldFormat,
}

const fn text(name: &'static str, required: bool) -> FieldRule {
    FieldRule {
        name,
        required,
        format: FieldFormat::Text,
    }
}

const fn formatted(name: &'static str, required: bool, format: FieldFormat) -> FieldRule {
    FieldRule {
        name,
        required,
        format,
    }
}

const PROFILE_RULES: &[FieldRule] = &[
    text("auth0Id", true),
    text("firstName", false),
    text("lastName", false),
    text("username", true),
    text("email", false),
    formatted("phone", false, FieldFormat::TenDigitPhone),
    formatted("alternatePhone", false, FieldFormat::TenDigitPhone),
    text("addressLine1", false),
    text("addressLine2", false),
    text("city", false),
    text("state", false),
    formatted("pincode", false, FieldFormat::SixDigitPostalCode),
    text("landmark", false),
    formatted("isProfileComplete", false, FieldFormat::Flag),
];

const BOOKING_RULES: &[FieldRule] = &[
    text("firstName", true),
    text("lastName", true),
    formatted("phone", true, FieldFormat::TenDigitPhone),
    text("date", true),
    text("timeSlot", true),
];

const CONTACT_MESSAGE_RULES: &[FieldRule] = &[
    text("firstName", true),
    text("lastName", true),
    text("email", true),
    text("message", true),
];

impl EntityKind {
    /// Ordered rule table for this entity.
    pub fn rules(self) -> &'static [FieldRule] {
        match self {
            EntityKind::Profile => PROFILE_RULES,
            EntityKind::Booking => BOOKING_RULES,
            EntityKind::ContactMessage => CONTACT_MESSAGE_RULES,
        }
    }

    pub fn required_fields(self) -> impl Iterator<Item = &'static str> {
        self.rules().iter().filter(|r| r.required).map(|r| r.name)
    }

    pub fn rule(self, field: &str) -> Option<&'static FieldRule> {
        self.rules().iter().find(|r| r.name == field)
    }
}

/// True iff `s` is exactly 10 ASCII digits.
pub fn is_ten_digit_phone(s: &str) -> bool {
    is_ascii_digits_of_len(s, 10)
}

/// True iff `s` is exactly 6 ASCII digits.
pub fn is_six_digit_postal_code(s: &str) -> bool {
    is_ascii_digits_of_len(s, 6)
}

fn is_ascii_digits_of_len(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl FieldRule {
    /// Checks one field value; `None` means the field is absent.
    pub fn check(&self, value: Option<&JsonValue>) -> Option<FieldViolation> {
        let value = match value {
            None | Some(JsonValue::Null) => {
                return self.required.then(|| self.violation("is required"));
            }
            Some(v) => v,
        };

        if self.format == FieldFormat::Flag {
            return (!value.is_boolean()).then(|| self.violation("must be true or false"));
        }

        let Some(s) = value.as_str() else {
            return Some(self.violation("must be a string"));
        };

        if s.trim().is_empty() {
            return self.required.then(|| self.violation("is required"));
        }

        match self.format {
            FieldFormat::TenDigitPhone if !is_ten_digit_phone(s) => {
                Some(self.violation("must be a 10 digit phone number"))
            }
            FieldFormat::SixDigitPostalCode if !is_six_digit_postal_code(s) => {
                Some(self.violation("must be a 6 digit pincode"))
            }
            _ => None,
        }
    }

    fn violation(&self, what: &str) -> FieldViolation {
        FieldViolation {
            field: self.name,
            message: format!("{} {}", self.name, what),
        }
    }
}

/// Runs every rule of `kind` against `record`, in table order.
///
/// A record that is not a JSON object violates every required field.
pub fn validate(kind: EntityKind, record: &JsonValue) -> Vec<FieldViolation> {
    let empty = Map::new();
    let obj = record.as_object().unwrap_or(&empty);
    kind.rules()
        .iter()
        .filter_map(|rule| rule.check(obj.get(rule.name)))
        .collect()
}

/// Keeps only the fields declared for `kind`.
pub fn retain_declared_fields(kind: EntityKind, record: &JsonValue) -> Map<String, JsonValue> {
    let mut out = Map::new();
    if let Some(obj) = record.as_object() {
        for (k, v) in obj {
            if kind.rule(k).is_some() {
                out.insert(k.clone(), v.clone());
            }
        }
    }
    out
}
