use std::path::Path;

use serde_json::json;
use tracing::info;
use warden_core::config::WardenConfig;
use warden_core::error::WardenError;
use warden_core::models::policy::CertificateRequestPolicy;
use warden_core::models::request::CertificateDatabaseRow;
use warden_core::models::result::ValidationResult;
use warden_core::models::token::HardwareTokenObject;
use warden_directory::client::LdapDirectoryClient;
use warden_directory::resolver::DirectoryResolver;
use warden_policy::lookup::lookup_directory_object;
use warden_policy::validator::CertificateContentValidator;

/// Options of the `evaluate` command.
#[derive(Debug, Clone)]
pub struct EvaluateOptions {
    pub policy: String,
    pub request: String,
    pub token: Option<String>,
    /// Skip the directory lookup even if the policy maps the request.
    pub offline: bool,
}

/// Run the `evaluate` command: apply a policy to a request and print the result.
pub async fn run(config_path: &str, options: &EvaluateOptions) -> anyhow::Result<()> {
    let config = WardenConfig::load(Path::new(config_path))?;
    config.validate()?;

    info!("Loaded configuration from {}", config_path);

    let report = evaluate(&config, options).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Evaluate one request and return the JSON report.
pub async fn evaluate(
    config: &WardenConfig,
    options: &EvaluateOptions,
) -> anyhow::Result<serde_json::Value> {
    let policy = CertificateRequestPolicy::load(Path::new(&options.policy))?;
    policy.validate()?;

    let db_row: CertificateDatabaseRow = read_json(&options.request)?;
    let token: Option<HardwareTokenObject> = match options.token {
        Some(ref path) => Some(read_json(path)?),
        None => None,
    };

    let mut result = ValidationResult::with_alternative_names(&db_row.subject_alternative_names);

    let directory_object = if options.offline {
        None
    } else {
        let resolver = DirectoryResolver::new(LdapDirectoryClient::new(&config.directory));
        lookup_directory_object(
            &resolver,
            &config.directory.forest_root,
            &policy,
            &db_row,
            &mut result,
        )
        .await?
    };

    let result = CertificateContentValidator::new().verify_request(
        result,
        &policy,
        &db_row,
        directory_object.as_ref(),
        &config.ca,
        token.as_ref(),
    );

    info!(
        request_id = db_row.request_id,
        denied = result.is_denied(),
        "Evaluation finished"
    );

    Ok(json!({
        "request_id": db_row.request_id,
        "denied": result.is_denied(),
        "status_code": format!("0x{:08X}", result.status_code() as u32),
        "directory_object": directory_object,
        "result": result,
    }))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {path}: {e}"))?;
    let value = serde_json::from_str(&content)
        .map_err(|e| WardenError::Serialization(format!("{path}: {e}")))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path.to_string_lossy().to_string()
    }

    fn config() -> WardenConfig {
        let mut config = WardenConfig::generate_default();
        config.ca.server_short_name = "CA02".into();
        config
    }

    #[tokio::test]
    async fn offline_evaluation_applies_rules() {
        let dir = tempfile::tempdir().unwrap();
        let options = EvaluateOptions {
            policy: write(
                dir.path(),
                "policy.toml",
                r#"
crl_distribution_points = ["http://pki.contoso.local/{ServerShortName}.crl"]

[[outbound_subject]]
field = "SN"
value = "{yk:SerialNumber}"
mandatory = true

[[outbound_subject_alternative_name]]
field = "dNSName"
value = "{sdn:CN}.contoso.local"
"#,
            ),
            request: write(
                dir.path(),
                "request.json",
                r#"{"request_id": 5, "subject_relative_distinguished_names": [["CN", "host01"]]}"#,
            ),
            token: Some(write(
                dir.path(),
                "token.json",
                r#"{"serial_number": "23456789", "firmware_version": "5.7.1", "form_factor": "UsbAKeychain",
                    "slot": "9a", "pin_policy": "Once", "touch_policy": "Never"}"#,
            )),
            offline: true,
        };

        let report = evaluate(&config(), &options).await.unwrap();
        assert_eq!(report["denied"], false);
        assert_eq!(report["status_code"], "0x00000000");
        assert!(report["directory_object"].is_null());
        assert_eq!(
            report["result"]["certificate_properties"]["Subject.SurName"],
            "23456789"
        );
        assert_eq!(
            report["result"]["subject_alternative_name_extension"]["alternative_names"][0][1],
            "host01.contoso.local"
        );
        assert!(report["result"]["certificate_extensions"]["2.5.29.31"].is_array());
    }

    #[tokio::test]
    async fn offline_evaluation_reports_denial() {
        let dir = tempfile::tempdir().unwrap();
        let options = EvaluateOptions {
            policy: write(
                dir.path(),
                "policy.toml",
                r#"
[[custom_certificate_extensions]]
oid = "1.2.3.4"
value = "not-base64!"
"#,
            ),
            request: write(dir.path(), "request.json", r#"{"request_id": 6}"#),
            token: None,
            offline: true,
        };

        let report = evaluate(&config(), &options).await.unwrap();
        assert_eq!(report["denied"], true);
        assert_eq!(report["status_code"], "0x80094012");
    }

    #[tokio::test]
    async fn missing_request_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let options = EvaluateOptions {
            policy: write(dir.path(), "policy.toml", ""),
            request: dir.path().join("missing.json").to_string_lossy().to_string(),
            token: None,
            offline: true,
        };

        let err = evaluate(&config(), &options).await.unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
