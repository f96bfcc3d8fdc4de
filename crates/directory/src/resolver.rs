//! Resolution of exactly one directory object for an untrusted identity.

use tracing::{debug, info};
use warden_core::error::DirectoryError;

use crate::attributes::{
    attributes_to_load, MatchAttribute, ObjectCategory, NESTED_GROUP_ATTRIBUTE,
    RETRIEVAL_ATTRIBUTES,
};
use crate::filter::{build_filter, naming_context};
use crate::object::{DirectoryObject, SecurityIdentifier, UserAccountControl};
use crate::searcher::{DirectoryEntry, DirectorySearcher, SearchRequest, SearchScope, SearchTarget};

/// Parameters of one resolution.
#[derive(Debug, Clone)]
pub struct ResolveRequest<'a> {
    /// DNS name of the forest root, used for the global catalog lookup.
    pub forest_root: &'a str,
    /// Directory attribute the identity is matched against, e.g. `sAMAccountName`.
    pub match_attribute: &'a str,
    /// Untrusted identity taken from the certificate request.
    pub identity: &'a str,
    /// `user` or `computer`.
    pub object_category: &'a str,
    /// Search root; determined through the global catalog when `None`.
    pub search_root: Option<&'a str>,
    pub resolve_nested_groups: bool,
}

/// Resolves directory objects through a [`DirectorySearcher`].
pub struct DirectoryResolver<S> {
    searcher: S,
}

impl<S: DirectorySearcher> DirectoryResolver<S> {
    pub fn new(searcher: S) -> Self {
        Self { searcher }
    }

    /// Resolve the single object matching the request.
    pub async fn resolve(
        &self,
        request: &ResolveRequest<'_>,
    ) -> Result<DirectoryObject, DirectoryError> {
        let attribute: MatchAttribute = request.match_attribute.parse()?;
        let category: ObjectCategory = request.object_category.parse()?;

        let search_root = match request.search_root.filter(|r| !r.is_empty()) {
            Some(root) => root.to_string(),
            None => {
                let target = SearchTarget::GlobalCatalog {
                    forest_root: request.forest_root.to_string(),
                };
                let entry = self
                    .find_single(target, "", attribute, request.identity, category, &["distinguishedName"])
                    .await?;
                let dn = entry.first("distinguishedName").unwrap_or(entry.dn.as_str());
                let root = naming_context(dn);
                debug!(identity = %request.identity, search_root = %root, "search root determined via global catalog");
                root
            }
        };

        let attributes = attributes_to_load();
        let entry = self
            .find_single(
                SearchTarget::DomainController,
                &search_root,
                attribute,
                request.identity,
                category,
                &attributes,
            )
            .await?;

        let object = self
            .build_object(entry, &search_root, request.resolve_nested_groups)
            .await?;

        info!(
            identity = %request.identity,
            dn = %object.distinguished_name(),
            groups = object.member_of().len(),
            nested = request.resolve_nested_groups,
            "directory object resolved"
        );
        Ok(object)
    }

    async fn find_single(
        &self,
        target: SearchTarget,
        base: &str,
        attribute: MatchAttribute,
        identity: &str,
        category: ObjectCategory,
        attributes: &[&str],
    ) -> Result<DirectoryEntry, DirectoryError> {
        let filter = build_filter(attribute, identity, category);
        let request = SearchRequest {
            target,
            base,
            scope: SearchScope::Subtree,
            filter: &filter,
            attributes,
        };

        let mut entries = self.searcher.search(&request).await?;
        match entries.len() {
            0 => Err(DirectoryError::NotFound {
                category: category.to_string(),
                attribute: attribute.to_string(),
                identity: identity.to_string(),
                search_root: base.to_string(),
            }),
            1 => Ok(entries.remove(0)),
            count => Err(DirectoryError::Ambiguous {
                category: category.to_string(),
                attribute: attribute.to_string(),
                identity: identity.to_string(),
                count,
            }),
        }
    }

    async fn build_object(
        &self,
        entry: DirectoryEntry,
        search_root: &str,
        resolve_nested_groups: bool,
    ) -> Result<DirectoryObject, DirectoryError> {
        let distinguished_name = entry
            .first("distinguishedName")
            .unwrap_or(entry.dn.as_str())
            .to_string();

        let malformed = |detail: &str| DirectoryError::QueryFailed {
            filter: String::new(),
            search_root: search_root.to_string(),
            detail: format!("entry \"{distinguished_name}\" {detail}"),
        };

        let security_identifier = entry
            .first_binary("objectSid")
            .and_then(|bytes| SecurityIdentifier::from_bytes(&bytes))
            .ok_or_else(|| malformed("has no valid objectSid"))?;

        let user_account_control = match entry.first("userAccountControl") {
            Some(value) => UserAccountControl::parse_directory_value(value)
                .ok_or_else(|| malformed("has a non-numeric userAccountControl"))?,
            None => UserAccountControl::default(),
        };

        let member_of = if resolve_nested_groups {
            self.nested_group_names(&distinguished_name).await?
        } else {
            entry.values("memberOf").to_vec()
        };

        let builder = DirectoryObject::builder(distinguished_name.clone())
            .user_account_control(user_account_control)
            .security_identifier(security_identifier)
            .member_of(member_of)
            .service_principal_names(entry.values("servicePrincipalName").iter().cloned());

        let builder = RETRIEVAL_ATTRIBUTES
            .iter()
            .filter_map(|name| entry.first(name).map(|value| (*name, value)))
            .fold(builder, |b, (name, value)| b.attribute(name, value));

        Ok(builder.build())
    }

    /// Read the computed transitive group closure of an object.
    ///
    /// Fails closed: an empty or missing attribute never falls back to `memberOf`.
    async fn nested_group_names(&self, distinguished_name: &str) -> Result<Vec<String>, DirectoryError> {
        let attributes = [NESTED_GROUP_ATTRIBUTE];
        let request = SearchRequest {
            target: SearchTarget::DomainController,
            base: distinguished_name,
            scope: SearchScope::Base,
            filter: "(objectClass=*)",
            attributes: &attributes,
        };

        let entries = self.searcher.search(&request).await?;
        let groups = entries
            .first()
            .map(|e| e.values(NESTED_GROUP_ATTRIBUTE).to_vec())
            .unwrap_or_default();

        if groups.is_empty() {
            return Err(DirectoryError::NestedGroupsUnavailable {
                distinguished_name: distinguished_name.to_string(),
            });
        }

        debug!(dn = %distinguished_name, count = groups.len(), "nested group memberships resolved");
        Ok(groups)
    }
}
