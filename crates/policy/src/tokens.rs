//! `{namespace:token}` placeholder substitution.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use warden_core::error::{Result, WardenError};
use warden_core::models::request::{first_value, NameValue};

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z0-9]+):([A-Za-z0-9-]+)\}").expect("Invalid token pattern")
});

/// Data source a placeholder refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenNamespace {
    /// Directory object attributes.
    Ad,
    /// Hardware-token facts.
    Yk,
    /// Subject RDNs of the request.
    Sdn,
    /// Subject alternative names of the request.
    San,
}

impl TokenNamespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ad => "ad",
            Self::Yk => "yk",
            Self::Sdn => "sdn",
            Self::San => "san",
        }
    }
}

impl fmt::Display for TokenNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replace every `{namespace:token}` placeholder in `template` with the value of
/// `token` in `source`.
///
/// Namespace and token names match case-insensitively. Placeholders of other
/// namespaces are kept verbatim, and inserted values are never expanded again.
/// A placeholder whose token is absent from `source` fails the whole substitution.
pub fn substitute(template: &str, namespace: TokenNamespace, source: &[NameValue]) -> Result<String> {
    let mut output = String::with_capacity(template.len());
    let mut last = 0;

    for caps in TOKEN_PATTERN.captures_iter(template) {
        let (Some(whole), Some(ns), Some(token)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if !ns.as_str().eq_ignore_ascii_case(namespace.as_str()) {
            continue;
        }

        let value = first_value(source, token.as_str()).ok_or_else(|| WardenError::UnknownToken {
            namespace: namespace.to_string(),
            token: token.as_str().to_string(),
        })?;

        output.push_str(&template[last..whole.start()]);
        output.push_str(value);
        last = whole.end();
    }

    output.push_str(&template[last..]);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Vec<NameValue> {
        vec![
            ("sAMAccountName".into(), "rudi".into()),
            ("displayName".into(), "Rudi Ratlos".into()),
            ("title".into(), "{ad:displayName}".into()),
        ]
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        let out = substitute("plain text, no tokens", TokenNamespace::Ad, &source()).unwrap();
        assert_eq!(out, "plain text, no tokens");
    }

    #[test]
    fn replaces_every_occurrence() {
        let out = substitute(
            "{ad:sAMAccountName}@contoso.local ({ad:sAMAccountName})",
            TokenNamespace::Ad,
            &source(),
        )
        .unwrap();
        assert_eq!(out, "rudi@contoso.local (rudi)");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let out = substitute("{AD:samaccountname}", TokenNamespace::Ad, &source()).unwrap();
        assert_eq!(out, "rudi");
    }

    #[test]
    fn unknown_token_fails() {
        let err = substitute("{ad:employeeID}", TokenNamespace::Ad, &source()).unwrap_err();
        assert!(matches!(
            err,
            WardenError::UnknownToken { ref namespace, ref token } if namespace == "ad" && token == "employeeID"
        ));
    }

    #[test]
    fn other_namespaces_are_left_alone() {
        let out = substitute("{sdn:CN}-{ad:sAMAccountName}-{yk:Slot}", TokenNamespace::Ad, &source()).unwrap();
        assert_eq!(out, "{sdn:CN}-rudi-{yk:Slot}");
    }

    #[test]
    fn substituted_values_are_not_expanded_again() {
        let out = substitute("{ad:title}", TokenNamespace::Ad, &source()).unwrap();
        assert_eq!(out, "{ad:displayName}");
    }

    #[test]
    fn empty_source_only_fails_when_referenced() {
        assert_eq!(substitute("static", TokenNamespace::Yk, &[]).unwrap(), "static");
        assert!(substitute("{yk:SerialNumber}", TokenNamespace::Yk, &[]).is_err());
    }

    #[test]
    fn malformed_placeholders_are_literal() {
        let out = substitute("{ad:} {ad sAMAccountName} {:x}", TokenNamespace::Ad, &source()).unwrap();
        assert_eq!(out, "{ad:} {ad sAMAccountName} {:x}");
    }
}
