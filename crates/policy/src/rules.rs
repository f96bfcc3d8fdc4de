//! Inputs and per-rule outcomes shared by the Subject DN and SAN rule engines.

use warden_core::error::Result;
use warden_core::models::policy::CertificateRequestPolicy;
use warden_core::models::request::CertificateDatabaseRow;
use warden_core::models::token::HardwareTokenObject;
use warden_directory::object::DirectoryObject;

use crate::tokens::{substitute, TokenNamespace};

/// Everything a rule template may draw values from.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub db_row: &'a CertificateDatabaseRow,
    pub policy: &'a CertificateRequestPolicy,
    pub directory_object: Option<&'a DirectoryObject>,
    pub token_object: Option<&'a HardwareTokenObject>,
}

impl<'a> RuleContext<'a> {
    pub fn new(db_row: &'a CertificateDatabaseRow, policy: &'a CertificateRequestPolicy) -> Self {
        Self {
            db_row,
            policy,
            directory_object: None,
            token_object: None,
        }
    }

    pub fn with_directory_object(mut self, object: Option<&'a DirectoryObject>) -> Self {
        self.directory_object = object;
        self
    }

    pub fn with_token_object(mut self, token: Option<&'a HardwareTokenObject>) -> Self {
        self.token_object = token;
        self
    }

    /// Expand a rule template through the `ad`, `yk`, `sdn` and `san` namespaces, in that order.
    ///
    /// A missing directory or token object is an empty source, so any token of
    /// its namespace fails the expansion.
    pub fn expand(&self, template: &str) -> Result<String> {
        let ad = self.directory_object.map(DirectoryObject::attributes).unwrap_or(&[]);
        let yk = self
            .token_object
            .map(HardwareTokenObject::attributes)
            .unwrap_or_default();
        let sdn = self
            .db_row
            .subject_token_source(self.policy.read_subject_from_request);

        let value = substitute(template, TokenNamespace::Ad, ad)?;
        let value = substitute(&value, TokenNamespace::Yk, &yk)?;
        let value = substitute(&value, TokenNamespace::Sdn, sdn)?;
        substitute(&value, TokenNamespace::San, &self.db_row.subject_alternative_names)
    }
}

/// What happened to a single rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The field was written.
    Applied,
    /// The field was already present and the rule is not forced.
    Skipped,
    /// An optional rule failed; processing continued.
    FailedSoft { reason: String },
    /// A mandatory rule failed and denied the request.
    FailedHard { reason: String },
}
