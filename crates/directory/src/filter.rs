//! Search filter construction and DN helpers.

use crate::attributes::{MatchAttribute, ObjectCategory};

/// Escape a value for safe inclusion in an LDAP search filter.
///
/// `\`, `*`, `(`, `)`, NUL and `/` are replaced by their `\xx` hex escapes.
/// Every other character is passed through unchanged.
pub fn escape_filter_value(input: &str) -> String {
    input.chars().fold(String::with_capacity(input.len()), |mut acc, c| {
        match c {
            '\\' => acc.push_str("\\5c"),
            '*' => acc.push_str("\\2a"),
            '(' => acc.push_str("\\28"),
            ')' => acc.push_str("\\29"),
            '\0' => acc.push_str("\\00"),
            '/' => acc.push_str("\\2f"),
            _ => acc.push(c),
        }
        acc
    })
}

/// Build the filter that matches exactly the object carrying `identity` in `attribute`.
///
/// The identity is always escaped; this is the only place filters are assembled.
pub fn build_filter(attribute: MatchAttribute, identity: &str, category: ObjectCategory) -> String {
    format!(
        "(&({}={})(objectCategory={}))",
        attribute,
        escape_filter_value(identity),
        category
    )
}

/// Split a DN into its RDN components, honouring backslash-escaped commas.
pub fn split_dn(dn: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in dn.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ',' => {
                parts.push(dn[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(dn[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// The domain naming context an object lives in: its trailing `DC=` components.
///
/// E.g. `CN=rudi,OU=Users,DC=contoso,DC=local` -> `DC=contoso,DC=local`.
/// A DN without domain components is returned unchanged.
pub fn naming_context(dn: &str) -> String {
    let parts = split_dn(dn);
    let first_dc = parts
        .iter()
        .rposition(|p| !is_domain_component(p))
        .map(|i| i + 1)
        .unwrap_or(0);

    if first_dc >= parts.len() {
        return dn.to_string();
    }
    parts[first_dc..].join(",")
}

/// The DNS name of the domain a DN lives in, from its trailing `DC=` components.
///
/// E.g. `CN=x,DC=emea,DC=contoso,DC=local` -> `emea.contoso.local`.
pub fn dns_domain(dn: &str) -> Option<String> {
    let mut labels: Vec<&str> = split_dn(dn)
        .into_iter()
        .rev()
        .take_while(|p| is_domain_component(p))
        .map(|p| p[3..].trim())
        .collect();
    if labels.is_empty() {
        return None;
    }
    labels.reverse();
    Some(labels.join("."))
}

fn is_domain_component(rdn: &str) -> bool {
    rdn.get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("DC="))
}
