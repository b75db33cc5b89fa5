//! Field-level validation.
//!
//! Entities implement [`Validate`] by running a [`Validator`] over their
//! fields. Every rule that fails records a [`FieldViolation`]; the caller gets
//! the complete list rather than only the first problem.
//!
//! ```rust
//! use tronics_core::validation::{Validate, ValidationErrors, Validator};
//!
//! struct Sku(String);
//!
//! impl Validate for Sku {
//!     fn validate(&self) -> Result<(), ValidationErrors> {
//!         let mut v = Validator::new();
//!         v.char_len("sku", &self.0, 4, 8);
//!         v.finish()
//!     }
//! }
//!
//! assert!(Sku("AB12".into()).validate().is_ok());
//! assert!(Sku("A".into()).validate().is_err());
//! ```

use core::fmt;

use crate::types::Email;

/// A single failed rule on a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Wire name of the offending field.
    pub field: String,
    /// Human-readable description of the broken rule.
    pub message: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Non-empty set of field violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    /// A set holding exactly one violation.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.to_owned(),
                message: message.into(),
            }],
        }
    }

    /// All recorded violations, in the order the rules ran.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Names of the offending fields (may repeat if a field broke several rules).
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.field.as_str())
    }

    /// Returns `true` if `field` broke at least one rule.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.fields().any(|f| f == field)
    }

    /// Prefix every field with the position of the entity in a batch,
    /// e.g. `price` becomes `[2].price`.
    #[must_use]
    pub fn at_index(self, index: usize) -> Self {
        Self {
            violations: self
                .violations
                .into_iter()
                .map(|v| FieldViolation {
                    field: format!("[{index}].{}", v.field),
                    message: v.message,
                })
                .collect(),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Types that can check themselves against their declared constraints.
pub trait Validate {
    /// Run every rule for this entity.
    ///
    /// # Errors
    ///
    /// Returns all violations found.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Accumulates violations while rules are applied.
#[derive(Debug, Default)]
pub struct Validator {
    violations: Vec<FieldViolation>,
}

impl Validator {
    /// Start an empty validation run.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    /// Record a violation directly.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field: field.to_owned(),
            message: message.into(),
        });
    }

    /// The field must be present. Returns the value for chaining further rules.
    pub fn required<'v, T>(&mut self, field: &str, value: Option<&'v T>) -> Option<&'v T>
    where
        T: ?Sized,
    {
        if value.is_none() {
            self.add(field, "is required");
        }
        value
    }

    /// The string must be present and contain at least one non-whitespace character.
    pub fn required_text<'v>(&mut self, field: &str, value: Option<&'v str>) -> Option<&'v str> {
        match value {
            Some(s) if !s.trim().is_empty() => Some(s),
            _ => {
                self.add(field, "is required");
                None
            }
        }
    }

    /// The string must have at most `max` characters.
    pub fn max_chars(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(field, format!("must be at most {max} characters"));
        }
    }

    /// The string must have exactly `len` characters.
    pub fn exact_chars(&mut self, field: &str, value: &str, len: usize) {
        if value.chars().count() != len {
            self.add(field, format!("must be exactly {len} characters"));
        }
    }

    /// The string must have between `min` and `max` characters (inclusive).
    pub fn char_len(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let count = value.chars().count();
        if count < min || count > max {
            self.add(field, format!("must be between {min} and {max} characters"));
        }
    }

    /// The number must lie in `min..=max`.
    pub fn range(&mut self, field: &str, value: i64, min: i64, max: i64) {
        if !(min..=max).contains(&value) {
            self.add(field, format!("must be between {min} and {max}"));
        }
    }

    /// The string must be a syntactically valid email address.
    pub fn email(&mut self, field: &str, value: &str) {
        if let Err(e) = Email::parse(value) {
            self.add(field, e.to_string());
        }
    }

    /// Finish the run.
    ///
    /// # Errors
    ///
    /// Returns the collected violations if any rule failed.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                violations: self.violations,
            })
        }
    }
}
