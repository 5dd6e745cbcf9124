//! Patient identity captured alongside each prognosis.
//!
//! # Memory Security
//!
//! Name and IC number are the only directly identifying values handled by
//! the application. `PatientIdentity` implements `ZeroizeOnDrop` so both
//! buffers are erased when a record or form is dropped, and its `Debug`
//! output never contains them.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::form::ValidationError;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct PatientIdentity {
    #[serde(rename = "Name")]
    name: String,

    /// National identity card number (e.g. `850101-14-5523`)
    #[serde(rename = "IC Number")]
    ic_number: String,
}

impl PatientIdentity {
    #[must_use]
    pub fn new(name: impl Into<String>, ic_number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ic_number: ic_number.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn ic_number(&self) -> &str {
        &self.ic_number
    }

    /// Both fields must be non-blank before a prognosis may run.
    ///
    /// # Errors
    /// Returns `ValidationError::MissingIdentity` naming the first blank field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingIdentity("Name"));
        }
        if self.ic_number.trim().is_empty() {
            return Err(ValidationError::MissingIdentity("IC Number"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for PatientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatientIdentity")
            .field("name", &"[REDACTED]")
            .field("ic_number", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_does_not_leak() {
        let identity = PatientIdentity::new("Tan Wei Ming", "900215-10-6677");
        let debug = format!("{identity:?}");
        assert!(!debug.contains("Tan"));
        assert!(!debug.contains("900215"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_blank_fields_fail_validation() {
        assert_eq!(
            PatientIdentity::new("  ", "900215-10-6677").validate(),
            Err(ValidationError::MissingIdentity("Name"))
        );
        assert_eq!(
            PatientIdentity::new("Tan Wei Ming", "").validate(),
            Err(ValidationError::MissingIdentity("IC Number"))
        );
        assert!(PatientIdentity::new("Tan Wei Ming", "900215-10-6677")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_zeroize_clears_buffers() {
        let mut identity = PatientIdentity::new("Tan Wei Ming", "900215-10-6677");
        identity.zeroize();
        assert!(identity.name().is_empty());
        assert!(identity.ic_number().is_empty());
    }
}
