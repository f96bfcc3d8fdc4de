//! The seam between the resolver and the directory protocol.

use std::collections::HashMap;

use async_trait::async_trait;
use warden_core::error::DirectoryError;

/// Which directory service a search is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTarget {
    /// Forest-wide search through the global catalog of the given forest root.
    GlobalCatalog { forest_root: String },
    /// Search against a domain controller holding the search base.
    DomainController,
}

/// Search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Only the base object itself.
    Base,
    /// The base object and everything below it.
    Subtree,
}

/// A single search operation.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    pub target: SearchTarget,
    pub base: &'a str,
    pub scope: SearchScope,
    pub filter: &'a str,
    pub attributes: &'a [&'a str],
}

/// One entry returned by a search. Attribute names keep the server's spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attrs: HashMap<String, Vec<String>>,
    pub bin_attrs: HashMap<String, Vec<Vec<u8>>>,
}

impl DirectoryEntry {
    /// All text values of an attribute, matched case-insensitively.
    pub fn values(&self, name: &str) -> &[String] {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    /// First text value of an attribute.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    /// First value of an attribute as raw bytes, whether or not it was valid UTF-8.
    pub fn first_binary(&self, name: &str) -> Option<Vec<u8>> {
        self.bin_attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.first().cloned())
            .or_else(|| self.first(name).map(|s| s.as_bytes().to_vec()))
    }
}

/// Executes searches against the directory.
///
/// Implementations must release every connection or result handle they acquire
/// before returning, on success and on failure alike, and must report transport
/// errors and timeouts as [`DirectoryError::QueryFailed`].
#[async_trait]
pub trait DirectorySearcher: Send + Sync {
    async fn search(
        &self,
        request: &SearchRequest<'_>,
    ) -> Result<Vec<DirectoryEntry>, DirectoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> DirectoryEntry {
        DirectoryEntry {
            dn: "CN=rudi,DC=contoso,DC=local".into(),
            attrs: HashMap::from([
                ("displayName".to_string(), vec!["Rudi".to_string()]),
                (
                    "memberOf".to_string(),
                    vec!["CN=A,DC=x".to_string(), "CN=B,DC=x".to_string()],
                ),
            ]),
            bin_attrs: HashMap::from([("objectSid".to_string(), vec![vec![1, 0, 0, 0, 0, 0, 0, 5]])]),
        }
    }

    #[test]
    fn values_are_case_insensitive() {
        let e = entry();
        assert_eq!(e.values("MEMBEROF").len(), 2);
        assert_eq!(e.first("displayname"), Some("Rudi"));
        assert!(e.values("mail").is_empty());
        assert_eq!(e.first("mail"), None);
    }

    #[test]
    fn first_binary_prefers_binary_values() {
        let e = entry();
        assert_eq!(e.first_binary("objectsid"), Some(vec![1, 0, 0, 0, 0, 0, 0, 5]));
        assert_eq!(e.first_binary("displayName"), Some(b"Rudi".to_vec()));
        assert_eq!(e.first_binary("mail"), None);
    }
}
