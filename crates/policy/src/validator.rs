//! Applies a policy's content rules to one request in a fixed order.

use tracing::info;
use warden_core::models::ca::CaConfiguration;
use warden_core::models::policy::CertificateRequestPolicy;
use warden_core::models::request::CertificateDatabaseRow;
use warden_core::models::result::ValidationResult;
use warden_core::models::token::HardwareTokenObject;
use warden_directory::object::DirectoryObject;

use crate::extensions::{
    apply_custom_extensions, apply_revocation_extensions, DerExtensionEncoder, ExtensionEncoder,
};
use crate::rules::RuleContext;
use crate::san::apply_san_rules;
use crate::subject::apply_subject_rules;

/// Derives certificate content from policy, request and directory facts.
pub struct CertificateContentValidator<E = DerExtensionEncoder> {
    encoder: E,
}

impl CertificateContentValidator {
    pub fn new() -> Self {
        Self {
            encoder: DerExtensionEncoder,
        }
    }
}

impl Default for CertificateContentValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ExtensionEncoder> CertificateContentValidator<E> {
    pub fn with_encoder(encoder: E) -> Self {
        Self { encoder }
    }

    /// Run CRL distribution points, authority information access, Subject DN
    /// rules, SAN rules and custom extensions against `result`, in that order.
    ///
    /// An already denied result is returned untouched, and a denial at any step
    /// ends processing.
    pub fn verify_request(
        &self,
        mut result: ValidationResult,
        policy: &CertificateRequestPolicy,
        db_row: &CertificateDatabaseRow,
        directory_object: Option<&DirectoryObject>,
        ca_config: &CaConfiguration,
        token_object: Option<&HardwareTokenObject>,
    ) -> ValidationResult {
        if result.is_denied() {
            return result;
        }

        apply_revocation_extensions(policy, ca_config, &self.encoder, &mut result);

        let context = RuleContext::new(db_row, policy)
            .with_directory_object(directory_object)
            .with_token_object(token_object);

        apply_subject_rules(&policy.outbound_subject, &mut result, &context);
        apply_san_rules(&policy.outbound_subject_alternative_name, &mut result, &context);
        apply_custom_extensions(policy, &mut result);

        info!(
            request_id = db_row.request_id,
            denied = result.is_denied(),
            subject_fields = result.certificate_properties().len(),
            alternative_names = result.subject_alternative_name_extension().alternative_names().len(),
            extensions = result.certificate_extensions().len(),
            "certificate content evaluated"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::error::{Result, WardenError};
    use warden_core::models::policy::{CustomCertificateExtension, OutboundRule};
    use warden_core::models::result::CERTSRV_E_TEMPLATE_DENIED;

    use crate::extensions::{OID_AUTHORITY_INFO_ACCESS, OID_CRL_DISTRIBUTION_POINTS};

    struct BrokenCdpEncoder;

    impl ExtensionEncoder for BrokenCdpEncoder {
        fn encode_crl_distribution_points(&self, _: &[String]) -> Result<Vec<u8>> {
            Err(WardenError::Encoding("broken".into()))
        }

        fn encode_authority_information_access(&self, _: &[String], _: &[String]) -> Result<Vec<u8>> {
            Ok(vec![0x30, 0x00])
        }
    }

    fn rule(field: &str, value: &str, mandatory: bool) -> OutboundRule {
        OutboundRule {
            field: field.into(),
            value: value.into(),
            force: false,
            mandatory,
        }
    }

    fn policy() -> CertificateRequestPolicy {
        CertificateRequestPolicy {
            outbound_subject: vec![rule("O", "{ad:company}", false)],
            outbound_subject_alternative_name: vec![rule(
                "userPrincipalName",
                "{ad:userPrincipalName}",
                false,
            )],
            crl_distribution_points: vec!["http://pki.contoso.local/{ServerShortName}.crl".into()],
            online_certificate_status_protocol: vec!["http://ocsp.contoso.local/".into()],
            custom_certificate_extensions: vec![CustomCertificateExtension {
                oid: "1.2.3.4".into(),
                value: Some("AAA=".into()),
            }],
            ..Default::default()
        }
    }

    fn row() -> CertificateDatabaseRow {
        CertificateDatabaseRow {
            request_id: 99,
            subject_relative_distinguished_names: vec![("CN".into(), "rudi".into())],
            ..Default::default()
        }
    }

    fn object() -> DirectoryObject {
        DirectoryObject::builder("CN=rudi,OU=Users,DC=contoso,DC=local")
            .attribute("company", "Contoso")
            .attribute("userPrincipalName", "rudi@contoso.local")
            .build()
    }

    fn ca() -> CaConfiguration {
        CaConfiguration {
            server_short_name: "CA02".into(),
            ..Default::default()
        }
    }

    #[test]
    fn full_policy_is_applied() {
        let (policy, row, object) = (policy(), row(), object());
        let result = CertificateContentValidator::new().verify_request(
            ValidationResult::new(),
            &policy,
            &row,
            Some(&object),
            &ca(),
            None,
        );

        assert!(!result.is_denied());
        assert_eq!(
            result.certificate_properties().get("Subject.Organization"),
            Some(&"Contoso".to_string())
        );
        assert_eq!(
            result
                .subject_alternative_name_extension()
                .first("userPrincipalName"),
            Some("rudi@contoso.local")
        );
        let extensions = result.certificate_extensions();
        assert!(extensions.contains_key(OID_CRL_DISTRIBUTION_POINTS));
        assert!(extensions.contains_key(OID_AUTHORITY_INFO_ACCESS));
        assert_eq!(extensions.get("1.2.3.4"), Some(&vec![0, 0]));
    }

    #[test]
    fn denied_input_is_returned_untouched() {
        let (policy, row, object) = (policy(), row(), object());
        let mut denied = ValidationResult::new();
        denied.set_failure_status(CERTSRV_E_TEMPLATE_DENIED, "directory lookup failed");

        let result = CertificateContentValidator::new().verify_request(
            denied.clone(),
            &policy,
            &row,
            Some(&object),
            &ca(),
            None,
        );
        assert_eq!(result, denied);
    }

    #[test]
    fn mandatory_subject_failure_skips_later_steps() {
        let (mut policy, row) = (policy(), row());
        policy.outbound_subject = vec![rule("O", "{ad:company}", true)];

        let result = CertificateContentValidator::new().verify_request(
            ValidationResult::new(),
            &policy,
            &row,
            None,
            &ca(),
            None,
        );

        assert!(result.is_denied());
        assert_eq!(result.description().len(), 1);
        assert!(result.subject_alternative_name_extension().is_empty());
        assert!(!result.certificate_extensions().contains_key("1.2.3.4"));
        // Revocation extensions run before the rules.
        assert!(result
            .certificate_extensions()
            .contains_key(OID_CRL_DISTRIBUTION_POINTS));
    }

    #[test]
    fn encoder_failure_stops_before_rules() {
        let (policy, row, object) = (policy(), row(), object());
        let result = CertificateContentValidator::with_encoder(BrokenCdpEncoder).verify_request(
            ValidationResult::new(),
            &policy,
            &row,
            Some(&object),
            &ca(),
            None,
        );

        assert!(result.is_denied());
        assert!(result.certificate_properties().is_empty());
        assert!(result.certificate_extensions().is_empty());
    }

    #[test]
    fn hardware_token_facts_feed_rules() {
        let row = row();
        let policy = CertificateRequestPolicy {
            outbound_subject: vec![rule("SN", "{yk:SerialNumber}", true)],
            ..Default::default()
        };
        let token = HardwareTokenObject {
            serial_number: "23456789".into(),
            ..Default::default()
        };

        let result = CertificateContentValidator::new().verify_request(
            ValidationResult::new(),
            &policy,
            &row,
            None,
            &ca(),
            Some(&token),
        );

        assert!(!result.is_denied());
        assert_eq!(
            result.certificate_properties().get("Subject.SurName"),
            Some(&"23456789".to_string())
        );
    }
}
