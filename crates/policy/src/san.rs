//! Outbound Subject Alternative Name rules.
//!
//! Every rule outcome is reported as an event with a stable `event_id`:
//! 4651 (already present), 4652 (added), 4653 (could not be added).

use tracing::{info, warn};
use warden_core::error::Result;
use warden_core::models::names::SanType;
use warden_core::models::policy::OutboundRule;
use warden_core::models::result::{ValidationResult, CERTSRV_E_TEMPLATE_DENIED};

use crate::rules::{RuleContext, RuleOutcome};

pub const EVENT_SAN_ALREADY_PRESENT: u32 = 4651;
pub const EVENT_SAN_ADDED: u32 = 4652;
pub const EVENT_SAN_NOT_ADDED: u32 = 4653;

/// Apply `rules` in order to the SAN accumulator of `result`.
///
/// A forced rule replaces entries of its type; otherwise a type that is already
/// present is left alone.
pub fn apply_san_rules(
    rules: &[OutboundRule],
    result: &mut ValidationResult,
    context: &RuleContext<'_>,
) -> Vec<RuleOutcome> {
    let mut outcomes = Vec::with_capacity(rules.len());
    if result.is_denied() {
        return outcomes;
    }

    for rule in rules {
        let outcome = apply_san_rule(rule, result, context);
        let stop = matches!(outcome, RuleOutcome::FailedHard { .. });
        outcomes.push(outcome);
        if stop {
            break;
        }
    }
    outcomes
}

fn apply_san_rule(
    rule: &OutboundRule,
    result: &mut ValidationResult,
    context: &RuleContext<'_>,
) -> RuleOutcome {
    let request_id = context.db_row.request_id;
    let sans = result.subject_alternative_name_extension();

    if !rule.force && rule.field.parse::<SanType>().is_ok() && sans.contains(&rule.field) {
        let existing: Vec<&str> = sans
            .alternative_names()
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(&rule.field))
            .map(|(_, v)| v.as_str())
            .collect();
        info!(
            event_id = EVENT_SAN_ALREADY_PRESENT,
            request_id,
            san_type = %rule.field,
            template = %rule.value,
            existing = ?existing,
            "SAN already present"
        );
        return RuleOutcome::Skipped;
    }

    match add(rule, result, context) {
        Ok(value) => {
            info!(
                event_id = EVENT_SAN_ADDED,
                request_id,
                san_type = %rule.field,
                %value,
                replaced = rule.force,
                "SAN added"
            );
            RuleOutcome::Applied
        }
        Err(e) => {
            warn!(
                event_id = EVENT_SAN_NOT_ADDED,
                request_id,
                san_type = %rule.field,
                template = %rule.value,
                error = %e,
                "SAN could not be added"
            );
            if rule.mandatory {
                let reason = format!(
                    "could not add mandatory subject alternative name \"{}\": {e}",
                    rule.field
                );
                result.set_failure_status(CERTSRV_E_TEMPLATE_DENIED, reason.clone());
                RuleOutcome::FailedHard { reason }
            } else {
                RuleOutcome::FailedSoft {
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn add(rule: &OutboundRule, result: &mut ValidationResult, context: &RuleContext<'_>) -> Result<String> {
    let value = context.expand(&rule.value)?;
    result
        .subject_alternative_name_extension_mut()
        .add(&rule.field, &value, rule.force)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;
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

    fn row() -> CertificateDatabaseRow {
        CertificateDatabaseRow {
            request_id: 815,
            subject_alternative_names: vec![("dNSName".into(), "requested.contoso.local".into())],
            ..Default::default()
        }
    }

    fn object() -> DirectoryObject {
        DirectoryObject::builder("CN=rudi,OU=Users,DC=contoso,DC=local")
            .attribute("userPrincipalName", "rudi@contoso.local")
            .attribute("mail", "rudi.ratlos@contoso.com")
            .attribute("dNSHostName", "rudi-pc.contoso.local")
            .build()
    }

    fn seeded_result(row: &CertificateDatabaseRow) -> ValidationResult {
        ValidationResult::with_alternative_names(&row.subject_alternative_names)
    }

    #[test]
    #[traced_test]
    fn adds_missing_san() {
        let (row, policy, object) = (row(), CertificateRequestPolicy::default(), object());
        let context = RuleContext::new(&row, &policy).with_directory_object(Some(&object));
        let mut result = seeded_result(&row);

        let outcomes = apply_san_rules(
            &[rule("userPrincipalName", "{ad:userPrincipalName}", false, false)],
            &mut result,
            &context,
        );

        assert_eq!(outcomes, [RuleOutcome::Applied]);
        assert_eq!(
            result
                .subject_alternative_name_extension()
                .first("userPrincipalName"),
            Some("rudi@contoso.local")
        );
        assert!(logs_contain("event_id=4652"));
        assert!(logs_contain("request_id=815"));
        assert!(logs_contain("SAN added"));
    }

    #[test]
    #[traced_test]
    fn present_san_is_skipped() {
        let (row, policy, object) = (row(), CertificateRequestPolicy::default(), object());
        let context = RuleContext::new(&row, &policy).with_directory_object(Some(&object));
        let mut result = seeded_result(&row);

        let outcomes = apply_san_rules(
            &[rule("dNSName", "{ad:dNSHostName}", false, true)],
            &mut result,
            &context,
        );

        assert_eq!(outcomes, [RuleOutcome::Skipped]);
        assert_eq!(
            result.subject_alternative_name_extension().alternative_names(),
            [("dNSName".to_string(), "requested.contoso.local".to_string())]
        );
        assert!(logs_contain("event_id=4651"));
        assert!(logs_contain("template={ad:dNSHostName}"));
        assert!(logs_contain("SAN already present"));
    }

    #[test]
    #[traced_test]
    fn forced_san_overwrites() {
        let (row, policy, object) = (row(), CertificateRequestPolicy::default(), object());
        let context = RuleContext::new(&row, &policy).with_directory_object(Some(&object));
        let mut result = seeded_result(&row);

        let outcomes = apply_san_rules(
            &[rule("dNSName", "{ad:dNSHostName}", true, false)],
            &mut result,
            &context,
        );

        assert_eq!(outcomes, [RuleOutcome::Applied]);
        assert_eq!(
            result.subject_alternative_name_extension().alternative_names(),
            [("dNSName".to_string(), "rudi-pc.contoso.local".to_string())]
        );
        assert!(logs_contain("replaced=true"));
    }

    #[test]
    #[traced_test]
    fn invalid_value_is_a_failed_add() {
        let (row, policy, object) = (row(), CertificateRequestPolicy::default(), object());
        let context = RuleContext::new(&row, &policy).with_directory_object(Some(&object));
        let mut result = seeded_result(&row);

        let outcomes = apply_san_rules(
            &[rule("iPAddress", "{ad:dNSHostName}", false, false)],
            &mut result,
            &context,
        );

        assert!(matches!(outcomes[0], RuleOutcome::FailedSoft { .. }));
        assert!(!result.is_denied());
        assert!(!result.subject_alternative_name_extension().contains("iPAddress"));
        assert!(logs_contain("event_id=4653"));
    }

    #[test]
    #[traced_test]
    fn mandatory_failure_denies_and_stops() {
        let (row, policy, object) = (row(), CertificateRequestPolicy::default(), object());
        let context = RuleContext::new(&row, &policy).with_directory_object(Some(&object));
        let mut result = seeded_result(&row);

        let outcomes = apply_san_rules(
            &[
                rule("rfc822Name", "{ad:otherMailbox}", false, true),
                rule("userPrincipalName", "{ad:userPrincipalName}", false, false),
            ],
            &mut result,
            &context,
        );

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], RuleOutcome::FailedHard { .. }));
        assert!(result.is_denied());
        assert_eq!(result.status_code(), CERTSRV_E_TEMPLATE_DENIED);
        assert!(!result
            .subject_alternative_name_extension()
            .contains("userPrincipalName"));
        assert!(logs_contain("SAN could not be added"));
    }

    #[test]
    fn denied_result_is_left_alone() {
        let (row, policy) = (row(), CertificateRequestPolicy::default());
        let context = RuleContext::new(&row, &policy);
        let mut result = seeded_result(&row);
        result.set_failure_status(CERTSRV_E_TEMPLATE_DENIED, "earlier");

        let outcomes = apply_san_rules(
            &[rule("dNSName", "static.contoso.local", true, true)],
            &mut result,
            &context,
        );

        assert!(outcomes.is_empty());
        assert_eq!(
            result.subject_alternative_name_extension().first("dNSName"),
            Some("requested.contoso.local")
        );
    }
}
