//! Certificate authority identity and CA-scoped URI token substitution.

use serde::{Deserialize, Serialize};

/// Maximum length of the truncated, sanitized CA name.
const TRUNCATED_NAME_LENGTH: usize = 32;

/// Identity of the issuing certificate authority, used to expand tokens in
/// CRL distribution point and authority information access URIs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaConfiguration {
    #[serde(default)]
    pub server_short_name: String,
    #[serde(default)]
    pub server_dns_name: String,
    #[serde(default)]
    pub ca_name: String,
    /// Renewal index of the CA certificate; `0` for the initial certificate.
    #[serde(default)]
    pub ca_certificate_index: u32,
    /// Renewal index of the CRL signing key; `0` for the initial key.
    #[serde(default)]
    pub crl_name_index: u32,
    #[serde(default)]
    pub configuration_container: String,
}

impl CaConfiguration {
    /// CA name with every character that is unsafe in file names and URLs
    /// replaced by `!` followed by its four-digit hexadecimal code.
    pub fn sanitized_ca_name(&self) -> String {
        sanitize(&self.ca_name)
    }

    /// Sanitized CA name cut down to 32 characters.
    pub fn truncated_ca_name(&self) -> String {
        self.sanitized_ca_name()
            .chars()
            .take(TRUNCATED_NAME_LENGTH)
            .collect()
    }

    /// Expand CA tokens in a URI template.
    ///
    /// Both the named form (`{ServerShortName}`) and the numeric form (`%2`)
    /// are supported; named tokens match case-insensitively. Unknown tokens are
    /// left in place.
    pub fn replace_tokens(&self, input: &str) -> String {
        let certificate_name = renewal_suffix(self.ca_certificate_index);
        let crl_name_suffix = renewal_suffix(self.crl_name_index);
        let sanitized = self.sanitized_ca_name();
        let truncated = self.truncated_ca_name();

        let tokens: [(&str, &str, &str); 8] = [
            ("{ServerDNSName}", "%1", &self.server_dns_name),
            ("{ServerShortName}", "%2", &self.server_short_name),
            ("{CAName}", "%3", &sanitized),
            ("{CertificateName}", "%4", &certificate_name),
            ("{ConfigurationContainer}", "%6", &self.configuration_container),
            ("{CATruncatedName}", "%7", &truncated),
            ("{CRLNameSuffix}", "%8", &crl_name_suffix),
            // Delta CRLs are not published through policy-driven CDPs.
            ("{DeltaCRLAllowed}", "%9", ""),
        ];

        tokens
            .iter()
            .fold(input.to_string(), |current, (named, numeric, value)| {
                replace_case_insensitive(&current, named, value).replace(numeric, value)
            })
    }
}

fn renewal_suffix(index: u32) -> String {
    if index == 0 {
        String::new()
    } else {
        format!("({index})")
    }
}

fn sanitize(name: &str) -> String {
    name.chars().fold(String::new(), |mut acc, c| {
        if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '.' | '_' | '(' | ')') {
            acc.push(c);
        } else {
            acc.push_str(&format!("!{:04x}", c as u32));
        }
        acc
    })
}

/// Replace every occurrence of `pattern` in `input` with `replacement`, ignoring
/// ASCII case, scanning left to right without overlap.
pub fn replace_case_insensitive(input: &str, pattern: &str, replacement: &str) -> String {
    if pattern.is_empty() {
        return input.to_string();
    }

    let haystack = input.to_ascii_lowercase();
    let needle = pattern.to_ascii_lowercase();
    let mut output = String::with_capacity(input.len());
    let mut last = 0;

    for (start, _) in haystack.match_indices(&needle) {
        if start < last {
            continue;
        }
        output.push_str(&input[last..start]);
        output.push_str(replacement);
        last = start + needle.len();
    }
    output.push_str(&input[last..]);
    output
}
