use std::path::Path;

use tracing::info;
use warden_core::models::policy::CertificateRequestPolicy;
use warden_policy::extensions::decode_custom_extension;

/// Run the `check-policy` command: load a policy file and report problems.
pub async fn run(policy_path: &str) -> anyhow::Result<()> {
    let policy = check(Path::new(policy_path))?;
    info!("Policy {} is valid", policy_path);

    println!("Policy: {policy_path}");
    println!("  Subject rules:       {}", policy.outbound_subject.len());
    println!(
        "  SAN rules:           {}",
        policy.outbound_subject_alternative_name.len()
    );
    println!("  CRL distribution:    {}", policy.crl_distribution_points.len());
    println!(
        "  AIA / OCSP:          {} / {}",
        policy.authority_information_access.len(),
        policy.online_certificate_status_protocol.len()
    );
    println!(
        "  Custom extensions:   {}",
        policy.custom_certificate_extensions.len()
    );
    match policy.directory_services_mapping {
        Some(ref mapping) => println!(
            "  Directory mapping:   {} -> {} ({})",
            mapping.certificate_attribute, mapping.directory_services_attribute, mapping.object_category
        ),
        None => println!("  Directory mapping:   none"),
    }

    Ok(())
}

/// Load a policy and check everything that does not depend on a request.
pub fn check(path: &Path) -> anyhow::Result<CertificateRequestPolicy> {
    let policy = CertificateRequestPolicy::load(path)?;
    policy.validate()?;

    if let Some(ref mapping) = policy.directory_services_mapping {
        mapping
            .directory_services_attribute
            .parse::<warden_directory::attributes::MatchAttribute>()?;
        mapping
            .object_category
            .parse::<warden_directory::attributes::ObjectCategory>()?;
    }

    for extension in &policy.custom_certificate_extensions {
        decode_custom_extension(extension)?;
    }

    Ok(policy)
}
