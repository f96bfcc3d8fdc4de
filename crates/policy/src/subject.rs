//! Outbound Subject DN rules.

use tracing::{debug, info};
use warden_core::error::Result;
use warden_core::models::names::RdnType;
use warden_core::models::policy::OutboundRule;
use warden_core::models::result::{ValidationResult, CERTSRV_E_TEMPLATE_DENIED};

use crate::rules::{RuleContext, RuleOutcome};

/// Apply `rules` in order to the Subject DN of `result`.
///
/// Returns one outcome per evaluated rule. Nothing is evaluated once the request
/// is denied, and a failing mandatory rule ends processing.
pub fn apply_subject_rules(
    rules: &[OutboundRule],
    result: &mut ValidationResult,
    context: &RuleContext<'_>,
) -> Vec<RuleOutcome> {
    let mut outcomes = Vec::with_capacity(rules.len());
    if result.is_denied() {
        return outcomes;
    }

    for rule in rules {
        let outcome = apply_subject_rule(rule, result, context);
        let stop = matches!(outcome, RuleOutcome::FailedHard { .. });
        outcomes.push(outcome);
        if stop {
            break;
        }
    }
    outcomes
}

fn apply_subject_rule(
    rule: &OutboundRule,
    result: &mut ValidationResult,
    context: &RuleContext<'_>,
) -> RuleOutcome {
    let request_id = context.db_row.request_id;

    if !rule.force {
        if let Ok(rdn) = rule.field.parse::<RdnType>() {
            if context.db_row.has_subject_rdn(rdn.abbreviation())
                || result.has_subject_distinguished_name(rdn)
            {
                debug!(request_id, field = %rule.field, "subject field already present, rule skipped");
                return RuleOutcome::Skipped;
            }
        }
    }

    match populate(rule, result, context) {
        Ok(value) => {
            info!(request_id, field = %rule.field, %value, "subject field set");
            RuleOutcome::Applied
        }
        Err(e) if rule.mandatory => {
            let reason = format!(
                "could not populate mandatory subject field \"{}\": {e}",
                rule.field
            );
            result.set_failure_status(CERTSRV_E_TEMPLATE_DENIED, reason.clone());
            RuleOutcome::FailedHard { reason }
        }
        Err(e) => {
            debug!(request_id, field = %rule.field, error = %e, "optional subject rule skipped");
            RuleOutcome::FailedSoft {
                reason: e.to_string(),
            }
        }
    }
}

fn populate(
    rule: &OutboundRule,
    result: &mut ValidationResult,
    context: &RuleContext<'_>,
) -> Result<String> {
    let value = context.expand(&rule.value)?;
    result.set_subject_distinguished_name(&rule.field, &value)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::models::policy::CertificateRequestPolicy;
    use warden_core::models::request::CertificateDatabaseRow;
    use warden_directory::object::DirectoryObject;

    fn rule(field: &str, value: &str, force: bool, mandatory: bool) -> OutboundRule {
        OutboundRule {
            field: field.into(),
            value: value.into(),
            force,
            mandatory,
        }
    }

    fn object() -> DirectoryObject {
        DirectoryObject::builder("CN=Rudi Ratlos,OU=Users,DC=contoso,DC=local")
            .attribute("displayName", "Rudi Ratlos")
            .attribute("company", "Contoso")
            .build()
    }

    fn row() -> CertificateDatabaseRow {
        CertificateDatabaseRow {
            request_id: 4711,
            subject_relative_distinguished_names: vec![("CN".into(), "rudi".into())],
            ..Default::default()
        }
    }

    #[test]
    fn sets_fields_from_directory() {
        let (row, policy, object) = (row(), CertificateRequestPolicy::default(), object());
        let context = RuleContext::new(&row, &policy).with_directory_object(Some(&object));
        let mut result = ValidationResult::new();

        let outcomes = apply_subject_rules(
            &[rule("o", "{ad:company}", false, false)],
            &mut result,
            &context,
        );

        assert_eq!(outcomes, [RuleOutcome::Applied]);
        assert_eq!(
            result.certificate_properties().get("Subject.Organization"),
            Some(&"Contoso".to_string())
        );
    }

    #[test]
    fn present_field_is_skipped_without_substitution() {
        let (row, policy) = (row(), CertificateRequestPolicy::default());
        // No directory object: substitution would fail if it were attempted.
        let context = RuleContext::new(&row, &policy);
        let mut result = ValidationResult::new();

        let outcomes = apply_subject_rules(
            &[rule("CN", "{ad:displayName}", false, true)],
            &mut result,
            &context,
        );

        assert_eq!(outcomes, [RuleOutcome::Skipped]);
        assert!(!result.is_denied());
        assert!(result.certificate_properties().is_empty());
    }

    #[test]
    fn inline_only_field_is_not_skipped() {
        let row = CertificateDatabaseRow {
            request_id: 4712,
            inline_subject_relative_distinguished_names: vec![("CN".into(), "rudi".into())],
            ..Default::default()
        };
        let (policy, object) = (CertificateRequestPolicy::default(), object());
        let context = RuleContext::new(&row, &policy).with_directory_object(Some(&object));
        let mut result = ValidationResult::new();

        let outcomes = apply_subject_rules(
            &[rule("CN", "{ad:displayName}", false, true)],
            &mut result,
            &context,
        );

        assert_eq!(outcomes, [RuleOutcome::Applied]);
        assert_eq!(
            result.certificate_properties().get("Subject.CommonName"),
            Some(&"Rudi Ratlos".to_string())
        );
    }

    #[test]
    fn field_set_by_earlier_rule_is_skipped() {
        let (row, policy, object) = (row(), CertificateRequestPolicy::default(), object());
        let context = RuleContext::new(&row, &policy).with_directory_object(Some(&object));
        let mut result = ValidationResult::new();

        let outcomes = apply_subject_rules(
            &[
                rule("O", "{ad:company}", false, false),
                rule("O", "Other", false, false),
            ],
            &mut result,
            &context,
        );

        assert_eq!(outcomes, [RuleOutcome::Applied, RuleOutcome::Skipped]);
        assert_eq!(
            result.certificate_properties().get("Subject.Organization"),
            Some(&"Contoso".to_string())
        );
    }

    #[test]
    fn forced_rule_overwrites_request_subject() {
        let (row, policy, object) = (row(), CertificateRequestPolicy::default(), object());
        let context = RuleContext::new(&row, &policy).with_directory_object(Some(&object));
        let mut result = ValidationResult::new();

        let outcomes = apply_subject_rules(
            &[rule("CN", "{ad:displayName}", true, false)],
            &mut result,
            &context,
        );

        assert_eq!(outcomes, [RuleOutcome::Applied]);
        assert_eq!(
            result.certificate_properties().get("Subject.CommonName"),
            Some(&"Rudi Ratlos".to_string())
        );
    }

    #[test]
    fn optional_failure_is_soft() {
        let (row, policy, object) = (row(), CertificateRequestPolicy::default(), object());
        let context = RuleContext::new(&row, &policy).with_directory_object(Some(&object));
        let mut result = ValidationResult::new();

        let outcomes = apply_subject_rules(
            &[
                rule("L", "{ad:l}", false, false),
                rule("O", "{ad:company}", false, false),
            ],
            &mut result,
            &context,
        );

        assert!(matches!(outcomes[0], RuleOutcome::FailedSoft { .. }));
        assert_eq!(outcomes[1], RuleOutcome::Applied);
        assert!(!result.is_denied());
    }

    #[test]
    fn mandatory_failure_denies_and_stops() {
        let (row, policy, object) = (row(), CertificateRequestPolicy::default(), object());
        let context = RuleContext::new(&row, &policy).with_directory_object(Some(&object));
        let mut result = ValidationResult::new();

        let outcomes = apply_subject_rules(
            &[
                rule("L", "{ad:l}", false, true),
                rule("O", "{ad:company}", false, false),
            ],
            &mut result,
            &context,
        );

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], RuleOutcome::FailedHard { .. }));
        assert!(result.is_denied());
        assert_eq!(result.status_code(), CERTSRV_E_TEMPLATE_DENIED);
        assert!(result.description()[0].contains("\"l\""));
        assert!(!result.has_subject_distinguished_name(RdnType::Organization));
    }

    #[test]
    fn unknown_field_fails_the_rule() {
        let (row, policy) = (row(), CertificateRequestPolicy::default());
        let context = RuleContext::new(&row, &policy);
        let mut result = ValidationResult::new();

        let outcomes = apply_subject_rules(
            &[rule("nickname", "rudi", false, true)],
            &mut result,
            &context,
        );

        assert!(matches!(outcomes[0], RuleOutcome::FailedHard { .. }));
        assert!(result.is_denied());
    }

    #[test]
    fn denied_result_is_left_alone() {
        let (row, policy) = (row(), CertificateRequestPolicy::default());
        let context = RuleContext::new(&row, &policy);
        let mut result = ValidationResult::new();
        result.set_failure_status(CERTSRV_E_TEMPLATE_DENIED, "earlier");

        let outcomes = apply_subject_rules(&[rule("O", "static", true, true)], &mut result, &context);

        assert!(outcomes.is_empty());
        assert!(result.certificate_properties().is_empty());
        assert_eq!(result.description(), ["earlier"]);
    }
}
