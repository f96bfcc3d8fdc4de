//! CRL distribution point, authority information access and custom extensions.

use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use const_oid::ObjectIdentifier;
use der::asn1::Ia5String;
use der::Encode;
use regex::Regex;
use tracing::debug;
use warden_core::error::{Result, WardenError};
use warden_core::models::ca::CaConfiguration;
use warden_core::models::policy::{CertificateRequestPolicy, CustomCertificateExtension};
use warden_core::models::result::{ValidationResult, CERTSRV_E_TEMPLATE_DENIED};
use x509_cert::ext::pkix::crl::dp::DistributionPoint;
use x509_cert::ext::pkix::name::{DistributionPointName, GeneralName};
use x509_cert::ext::pkix::{AccessDescription, AuthorityInfoAccessSyntax, CrlDistributionPoints};

pub const OID_CRL_DISTRIBUTION_POINTS: &str = "2.5.29.31";
pub const OID_AUTHORITY_INFO_ACCESS: &str = "1.3.6.1.5.5.7.1.1";

const ID_AD_OCSP: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1");
const ID_AD_CA_ISSUERS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.2");

static VALID_OID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-2])((\.0)|(\.[1-9][0-9]*))*$").expect("Invalid OID pattern")
});

static VALID_BASE64: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-A-Za-z0-9+/]*={0,3}$").expect("Invalid base64 pattern"));

/// Encodes extension values from already expanded URIs.
pub trait ExtensionEncoder: Send + Sync {
    fn encode_crl_distribution_points(&self, uris: &[String]) -> Result<Vec<u8>>;

    /// CA issuer entries come first, followed by OCSP entries.
    fn encode_authority_information_access(
        &self,
        ca_issuers: &[String],
        ocsp: &[String],
    ) -> Result<Vec<u8>>;
}

/// DER encoder built on the RustCrypto `x509-cert` types.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerExtensionEncoder;

fn uri(value: &str) -> Result<GeneralName> {
    Ia5String::new(value)
        .map(GeneralName::UniformResourceIdentifier)
        .map_err(|e| WardenError::Encoding(format!("\"{value}\" is not a valid URI string: {e}")))
}

impl ExtensionEncoder for DerExtensionEncoder {
    fn encode_crl_distribution_points(&self, uris: &[String]) -> Result<Vec<u8>> {
        let full_name = uris.iter().map(|u| uri(u)).collect::<Result<Vec<_>>>()?;
        let cdp = CrlDistributionPoints(vec![DistributionPoint {
            distribution_point: Some(DistributionPointName::FullName(full_name)),
            reasons: None,
            crl_issuer: None,
        }]);
        cdp.to_der()
            .map_err(|e| WardenError::Encoding(format!("CRL distribution points: {e}")))
    }

    fn encode_authority_information_access(
        &self,
        ca_issuers: &[String],
        ocsp: &[String],
    ) -> Result<Vec<u8>> {
        let issuers = ca_issuers.iter().map(|u| (ID_AD_CA_ISSUERS, u));
        let responders = ocsp.iter().map(|u| (ID_AD_OCSP, u));
        let descriptions = issuers
            .chain(responders)
            .map(|(method, u)| -> Result<AccessDescription> {
                Ok(AccessDescription {
                    access_method: method,
                    access_location: uri(u)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        AuthorityInfoAccessSyntax(descriptions)
            .to_der()
            .map_err(|e| WardenError::Encoding(format!("authority information access: {e}")))
    }
}

/// Add the CDP and AIA extensions described by the policy.
///
/// URIs are expanded against the CA tokens first. An encoder failure denies the request.
pub fn apply_revocation_extensions(
    policy: &CertificateRequestPolicy,
    ca_config: &CaConfiguration,
    encoder: &dyn ExtensionEncoder,
    result: &mut ValidationResult,
) {
    if result.is_denied() {
        return;
    }

    if !policy.crl_distribution_points.is_empty() {
        let uris = expand_all(&policy.crl_distribution_points, ca_config);
        match encoder.encode_crl_distribution_points(&uris) {
            Ok(der) => {
                debug!(count = uris.len(), "CRL distribution points added");
                result.add_certificate_extension(OID_CRL_DISTRIBUTION_POINTS, der);
            }
            Err(e) => {
                result.set_failure_status(CERTSRV_E_TEMPLATE_DENIED, e.to_string());
                return;
            }
        }
    }

    if !policy.authority_information_access.is_empty()
        || !policy.online_certificate_status_protocol.is_empty()
    {
        let ca_issuers = expand_all(&policy.authority_information_access, ca_config);
        let ocsp = expand_all(&policy.online_certificate_status_protocol, ca_config);
        match encoder.encode_authority_information_access(&ca_issuers, &ocsp) {
            Ok(der) => {
                debug!(ca_issuers = ca_issuers.len(), ocsp = ocsp.len(), "authority information access added");
                result.add_certificate_extension(OID_AUTHORITY_INFO_ACCESS, der);
            }
            Err(e) => result.set_failure_status(CERTSRV_E_TEMPLATE_DENIED, e.to_string()),
        }
    }
}

fn expand_all(templates: &[String], ca_config: &CaConfiguration) -> Vec<String> {
    templates.iter().map(|t| ca_config.replace_tokens(t)).collect()
}

/// Check a custom extension and return its decoded value.
pub fn decode_custom_extension(extension: &CustomCertificateExtension) -> Result<Vec<u8>> {
    let invalid = || WardenError::InvalidCustomExtension {
        oid: extension.oid.clone(),
        value: extension.value.clone().unwrap_or_default(),
    };

    if !VALID_OID.is_match(&extension.oid) {
        return Err(invalid());
    }

    match extension.value {
        None => Ok(Vec::new()),
        Some(ref value) if VALID_BASE64.is_match(value) => {
            STANDARD.decode(value).map_err(|_| invalid())
        }
        Some(_) => Err(invalid()),
    }
}

/// Add the policy's custom extensions. The first invalid entry denies the request.
pub fn apply_custom_extensions(policy: &CertificateRequestPolicy, result: &mut ValidationResult) {
    if result.is_denied() {
        return;
    }

    for extension in &policy.custom_certificate_extensions {
        match decode_custom_extension(extension) {
            Ok(value) => {
                debug!(oid = %extension.oid, length = value.len(), "custom extension added");
                result.add_certificate_extension(&extension.oid, value);
            }
            Err(e) => {
                result.set_failure_status(CERTSRV_E_TEMPLATE_DENIED, e.to_string());
                return;
            }
        }
    }
}
