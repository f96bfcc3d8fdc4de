//! The certificate request as recorded by the certificate authority.

use serde::{Deserialize, Serialize};

/// An ordered name/value pair, e.g. `("CN", "rudi")` or `("dNSName", "host.example.com")`.
pub type NameValue = (String, String);

/// The request row the CA hands to the policy engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateDatabaseRow {
    pub request_id: u64,
    /// Subject RDNs the CA has already validated.
    #[serde(default)]
    pub subject_relative_distinguished_names: Vec<NameValue>,
    /// Subject RDNs as embedded in the request itself.
    #[serde(default)]
    pub inline_subject_relative_distinguished_names: Vec<NameValue>,
    #[serde(default)]
    pub subject_alternative_names: Vec<NameValue>,
}

impl CertificateDatabaseRow {
    /// Whether the validated subject carries an RDN of the given type.
    ///
    /// The inline subject is not consulted, whatever `read_subject_from_request`
    /// says: an RDN the CA did not validate does not block a rule.
    pub fn has_subject_rdn(&self, field: &str) -> bool {
        self.subject_relative_distinguished_names
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(field))
    }

    /// The subject RDNs that back the `sdn` token namespace.
    pub fn subject_token_source(&self, read_subject_from_request: bool) -> &[NameValue] {
        if read_subject_from_request {
            &self.inline_subject_relative_distinguished_names
        } else {
            &self.subject_relative_distinguished_names
        }
    }
}

/// First value whose name matches `name`, ignoring case.
pub fn first_value<'a>(pairs: &'a [NameValue], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
