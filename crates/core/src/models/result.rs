//! The validation result that accumulates everything the policy engine derives.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, WardenError};
use crate::models::names::{RdnType, SanType};
use crate::models::request::NameValue;

/// Status returned to the CA when a policy denies a request.
pub const CERTSRV_E_TEMPLATE_DENIED: i32 = 0x8009_4012_u32 as i32;

/// Status of a request that has not been denied.
pub const ERROR_SUCCESS: i32 = 0;

/// Accumulated Subject Alternative Name entries, in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubjectAlternativeNames {
    alternative_names: Vec<NameValue>,
}

impl SubjectAlternativeNames {
    pub fn alternative_names(&self) -> &[NameValue] {
        &self.alternative_names
    }

    pub fn is_empty(&self) -> bool {
        self.alternative_names.is_empty()
    }

    /// Whether an entry of the given type is present.
    pub fn contains(&self, kind: &str) -> bool {
        self.first(kind).is_some()
    }

    /// Value of the first entry of the given type.
    pub fn first(&self, kind: &str) -> Option<&str> {
        self.alternative_names
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(kind))
            .map(|(_, v)| v.as_str())
    }

    /// Add an entry after checking its type and syntax.
    ///
    /// With `replace_existing`, entries of the same type are removed first.
    pub fn add(&mut self, kind: &str, value: &str, replace_existing: bool) -> Result<()> {
        let san_type: SanType = kind
            .parse()
            .map_err(|_| WardenError::InvalidRuleField(kind.to_string()))?;

        if !san_type.accepts(value) {
            return Err(WardenError::InvalidAlternativeName {
                kind: san_type.name().to_string(),
                value: value.to_string(),
            });
        }

        if replace_existing {
            self.alternative_names
                .retain(|(k, _)| !k.eq_ignore_ascii_case(san_type.name()));
        }

        self.alternative_names
            .push((san_type.name().to_string(), value.to_string()));
        Ok(())
    }
}

/// Outcome of evaluating one certificate request against its policy.
///
/// Denial is terminal: once [`ValidationResult::set_failure_status`] has been
/// called the request stays denied and the first status code is kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResult {
    denied_for_issuance: bool,
    status_code: i32,
    description: Vec<String>,
    /// Subject DN components keyed by certificate property, e.g. `Subject.CommonName`.
    certificate_properties: BTreeMap<String, String>,
    subject_alternative_name_extension: SubjectAlternativeNames,
    /// Raw extension values keyed by dotted-decimal OID.
    certificate_extensions: BTreeMap<String, Vec<u8>>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the SAN accumulator with the names already present in the request.
    pub fn with_alternative_names(names: &[NameValue]) -> Self {
        let mut result = Self::new();
        result.subject_alternative_name_extension.alternative_names = names.to_vec();
        result
    }

    pub fn is_denied(&self) -> bool {
        self.denied_for_issuance
    }

    pub fn status_code(&self) -> i32 {
        self.status_code
    }

    pub fn description(&self) -> &[String] {
        &self.description
    }

    /// Deny the request. The first status code wins; every message is kept.
    pub fn set_failure_status(&mut self, status_code: i32, message: impl Into<String>) {
        let message = message.into();
        warn!(status_code = %format!("0x{:08X}", status_code as u32), %message, "request denied");

        if !self.denied_for_issuance {
            self.denied_for_issuance = true;
            self.status_code = status_code;
        }
        self.description.push(message);
    }

    pub fn certificate_properties(&self) -> &BTreeMap<String, String> {
        &self.certificate_properties
    }

    /// Whether a Subject DN component of the given RDN type has been set.
    pub fn has_subject_distinguished_name(&self, rdn: RdnType) -> bool {
        self.certificate_properties
            .keys()
            .any(|k| k.eq_ignore_ascii_case(rdn.certificate_property()))
    }

    /// Set a Subject DN component, addressed by RDN abbreviation such as `CN`.
    pub fn set_subject_distinguished_name(&mut self, field: &str, value: &str) -> Result<()> {
        let rdn: RdnType = field
            .parse()
            .map_err(|_| WardenError::InvalidRuleField(field.to_string()))?;
        self.certificate_properties
            .insert(rdn.certificate_property().to_string(), value.to_string());
        Ok(())
    }

    pub fn subject_alternative_name_extension(&self) -> &SubjectAlternativeNames {
        &self.subject_alternative_name_extension
    }

    pub fn subject_alternative_name_extension_mut(&mut self) -> &mut SubjectAlternativeNames {
        &mut self.subject_alternative_name_extension
    }

    pub fn certificate_extensions(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.certificate_extensions
    }

    /// Store an extension value, replacing an earlier one with the same OID.
    pub fn add_certificate_extension(&mut self, oid: &str, value: Vec<u8>) {
        self.certificate_extensions.insert(oid.to_string(), value);
    }
}
