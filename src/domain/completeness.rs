//! Profile completeness derivation.

use crate::domain::rules::{is_six_digit_postal_code, is_ten_digit_phone};
use serde_json::Value as JsonValue;

/// Fields a profile needs before it counts as complete.
pub const MANDATORY_PROFILE_FIELDS: &[&str] = &[
    "firstName",
    "lastName",
    "username",
    "phone",
    "addressLine1",
    "addressLine2",
    "city",
    "state",
    "pincode",
];

/// Returns true iff every mandatory field is a non-blank string and `phone` / `pincode`
/// match their digit patterns. Absent or non-string values count as missing.
pub fn is_profile_complete(record: &JsonValue) -> bool {
    MANDATORY_PROFILE_FIELDS.iter().all(|&field| {
        let Some(value) = record.get(field).and_then(JsonValue::as_str) else {
            return false;
        };
        if value.trim().is_empty() {
            return false;
        }
        match field {
            "phone" => is_ten_digit_phone(value),
            "pincode" => is_six_digit_postal_code(value),
            _ => true,
        }
    })
}
