//! Directory lookup stage: maps a request to the directory object it speaks for.

use tracing::{info, warn};
use warden_core::error::{DirectoryError, Result, WardenError};
use warden_core::models::names::{RdnType, SanType};
use warden_core::models::policy::{CertificateRequestPolicy, DirectoryServicesMapping};
use warden_core::models::request::{first_value, CertificateDatabaseRow};
use warden_core::models::result::{ValidationResult, CERTSRV_E_TEMPLATE_DENIED};
use warden_directory::object::DirectoryObject;
use warden_directory::resolver::{DirectoryResolver, ResolveRequest};
use warden_directory::searcher::DirectorySearcher;

/// The request value the mapping designates as identity.
///
/// `certificate_attribute` names either a SAN type (`userPrincipalName`) or a
/// subject RDN (`CN`, or the long form `commonName`).
pub fn identity_from_request<'a>(
    mapping: &DirectoryServicesMapping,
    policy: &CertificateRequestPolicy,
    db_row: &'a CertificateDatabaseRow,
) -> Option<&'a str> {
    let attribute = mapping.certificate_attribute.as_str();

    if let Ok(san) = attribute.parse::<SanType>() {
        return first_value(&db_row.subject_alternative_names, san.name());
    }

    let rdn = if attribute.eq_ignore_ascii_case("commonName") {
        RdnType::CommonName
    } else {
        attribute.parse::<RdnType>().ok()?
    };
    first_value(
        db_row.subject_token_source(policy.read_subject_from_request),
        rdn.abbreviation(),
    )
}

/// Resolve the directory object for a request, if the policy asks for one.
///
/// Lookup failures deny `result` and yield `Ok(None)`, except a missing object
/// when the mapping permits it. Configuration errors are returned as `Err`.
pub async fn lookup_directory_object<S: DirectorySearcher>(
    resolver: &DirectoryResolver<S>,
    forest_root: &str,
    policy: &CertificateRequestPolicy,
    db_row: &CertificateDatabaseRow,
    result: &mut ValidationResult,
) -> Result<Option<DirectoryObject>> {
    let Some(ref mapping) = policy.directory_services_mapping else {
        return Ok(None);
    };
    if result.is_denied() {
        return Ok(None);
    }

    let Some(identity) = identity_from_request(mapping, policy, db_row) else {
        result.set_failure_status(
            CERTSRV_E_TEMPLATE_DENIED,
            format!(
                "request {} contains no \"{}\" to identify the directory object",
                db_row.request_id, mapping.certificate_attribute
            ),
        );
        return Ok(None);
    };

    let request = ResolveRequest {
        forest_root,
        match_attribute: &mapping.directory_services_attribute,
        identity,
        object_category: &mapping.object_category,
        search_root: mapping.search_root.as_deref(),
        resolve_nested_groups: mapping.resolve_nested_group_memberships,
    };

    match resolver.resolve(&request).await {
        Ok(object) => {
            info!(
                request_id = db_row.request_id,
                dn = %object.distinguished_name(),
                "request mapped to directory object"
            );
            Ok(Some(object))
        }
        Err(e) if e.is_configuration() => Err(WardenError::Directory(e)),
        Err(e @ DirectoryError::NotFound { .. }) if mapping.permit_if_not_found => {
            warn!(request_id = db_row.request_id, error = %e, "directory object not found, continuing without it");
            Ok(None)
        }
        Err(e) => {
            result.set_failure_status(CERTSRV_E_TEMPLATE_DENIED, e.to_string());
            Ok(None)
        }
    }
}
