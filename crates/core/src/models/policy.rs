//! Declarative certificate request policy.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WardenError};
use crate::models::names::{RdnType, SanType};

/// Policy applied to every request for one certificate template.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CertificateRequestPolicy {
    /// Take `sdn` tokens from the subject embedded in the request instead of the
    /// subject the CA has already validated.
    #[serde(default)]
    pub read_subject_from_request: bool,
    #[serde(default)]
    pub directory_services_mapping: Option<DirectoryServicesMapping>,
    #[serde(default)]
    pub outbound_subject: Vec<OutboundRule>,
    #[serde(default)]
    pub outbound_subject_alternative_name: Vec<OutboundRule>,
    #[serde(default)]
    pub crl_distribution_points: Vec<String>,
    #[serde(default)]
    pub authority_information_access: Vec<String>,
    #[serde(default)]
    pub online_certificate_status_protocol: Vec<String>,
    #[serde(default)]
    pub custom_certificate_extensions: Vec<CustomCertificateExtension>,
}

/// One entry of `outbound_subject` or `outbound_subject_alternative_name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboundRule {
    pub field: String,
    /// Template that may contain `{ad:..}`, `{yk:..}`, `{sdn:..}` and `{san:..}` tokens.
    pub value: String,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub mandatory: bool,
}

/// A static extension to put into the issued certificate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomCertificateExtension {
    pub oid: String,
    /// Base64-encoded DER payload; an empty extension value when absent.
    #[serde(default)]
    pub value: Option<String>,
}

/// How the requester is looked up in the directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryServicesMapping {
    /// Request field holding the identity, a SAN type or a subject RDN.
    #[serde(default = "default_certificate_attribute")]
    pub certificate_attribute: String,
    /// Directory attribute the identity is matched against.
    #[serde(default = "default_directory_services_attribute")]
    pub directory_services_attribute: String,
    #[serde(default = "default_object_category")]
    pub object_category: String,
    /// Explicit search root; a forest-wide lookup determines it when unset.
    #[serde(default)]
    pub search_root: Option<String>,
    #[serde(default)]
    pub resolve_nested_group_memberships: bool,
    /// Continue without directory facts when the identity does not exist.
    #[serde(default)]
    pub permit_if_not_found: bool,
}

fn default_certificate_attribute() -> String {
    "userPrincipalName".into()
}

fn default_directory_services_attribute() -> String {
    "userPrincipalName".into()
}

fn default_object_category() -> String {
    "user".into()
}

impl Default for DirectoryServicesMapping {
    fn default() -> Self {
        Self {
            certificate_attribute: default_certificate_attribute(),
            directory_services_attribute: default_directory_services_attribute(),
            object_category: default_object_category(),
            search_root: None,
            resolve_nested_group_memberships: false,
            permit_if_not_found: false,
        }
    }
}

impl CertificateRequestPolicy {
    /// Load a policy from a TOML file at the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let policy: Self = toml::from_str(&content)
            .map_err(|e| WardenError::Config(format!("failed to parse policy: {e}")))?;
        Ok(policy)
    }

    /// Check the parts of the policy that can be verified without a request.
    pub fn validate(&self) -> Result<()> {
        for rule in &self.outbound_subject {
            if rule.field.parse::<RdnType>().is_err() {
                return Err(WardenError::Config(format!(
                    "outbound_subject field \"{}\" is not a known RDN type",
                    rule.field
                )));
            }
        }

        for rule in &self.outbound_subject_alternative_name {
            if rule.field.parse::<SanType>().is_err() {
                return Err(WardenError::Config(format!(
                    "outbound_subject_alternative_name field \"{}\" is not a known SAN type",
                    rule.field
                )));
            }
        }

        if let Some(ref mapping) = self.directory_services_mapping {
            if mapping.certificate_attribute.is_empty() {
                return Err(WardenError::Config(
                    "directory_services_mapping.certificate_attribute must not be empty".into(),
                ));
            }
        }

        Ok(())
    }
}
