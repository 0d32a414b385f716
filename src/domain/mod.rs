//! Domain rules: per-entity validation tables and profile completeness.

pub mod completeness;
pub mod rules;

pub use completeness::{is_profile_complete, MANDATORY_PROFILE_FIELDS};
pub use rules::{
    is_six_digit_postal_code, is_ten_digit_phone, validate, EntityKind, FieldFormat, FieldRule,
    FieldViolation,
};
