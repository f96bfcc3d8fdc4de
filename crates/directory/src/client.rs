//! LDAP client wrapper for Active Directory lookups.

use std::time::Duration;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use warden_core::config::DirectoryConfig;
use warden_core::error::DirectoryError;

use crate::filter::dns_domain;
use crate::searcher::{DirectoryEntry, DirectorySearcher, SearchRequest, SearchScope, SearchTarget};

/// LDAP client for Active Directory lookups.
///
/// Domain controller searches go to the configured server when the search base
/// lies in that server's domain, and to the base's own domain otherwise, so an
/// object found in the global catalog is read from a DC that holds it.
pub struct LdapDirectoryClient {
    config: DirectoryConfig,
    timeout: Duration,
}

/// A bound LDAP connection together with the task driving it.
///
/// Dropping the guard aborts the driver and with it the socket, so a connection
/// never outlives the search that opened it, whichever way that search ends.
struct BoundConnection {
    ldap: Ldap,
    driver: JoinHandle<()>,
}

impl BoundConnection {
    /// Unbind politely, then let `Drop` tear the driver down.
    async fn release(mut self) {
        if let Err(e) = self.ldap.unbind().await {
            debug!(error = %e, "LDAP unbind failed");
        }
    }
}

impl Drop for BoundConnection {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

impl LdapDirectoryClient {
    /// Create a new client from connection configuration.
    pub fn new(config: &DirectoryConfig) -> Self {
        Self {
            config: config.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn url_for(&self, request: &SearchRequest<'_>) -> String {
        match request.target {
            SearchTarget::DomainController => domain_controller_url(&self.config.server, request.base),
            SearchTarget::GlobalCatalog { ref forest_root } => {
                self.config.global_catalog_url(forest_root)
            }
        }
    }

    async fn connect(&self, url: &str) -> Result<BoundConnection, String> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.timeout)
            .set_no_tls_verify(!self.config.tls_verify);
        let (conn, ldap) = LdapConnAsync::with_settings(settings, url)
            .await
            .map_err(|e| format!("LDAP connect to {url} failed: {e}"))?;

        let driver = tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection error");
            }
        });
        let mut bound = BoundConnection { ldap, driver };

        if !self.config.bind_dn.is_empty() {
            bound
                .ldap
                .with_timeout(self.timeout)
                .simple_bind(&self.config.bind_dn, &self.config.bind_password)
                .await
                .map_err(|e| format!("LDAP bind failed: {e}"))?
                .success()
                .map_err(|e| format!("LDAP bind rejected: {e}"))?;
        }

        debug!(server = %url, "LDAP bind successful");
        Ok(bound)
    }

    async fn run_search(
        &self,
        bound: &mut BoundConnection,
        request: &SearchRequest<'_>,
    ) -> Result<Vec<DirectoryEntry>, String> {
        let scope = match request.scope {
            SearchScope::Base => Scope::Base,
            SearchScope::Subtree => Scope::Subtree,
        };

        let (results, _) = bound
            .ldap
            .with_timeout(self.timeout)
            .search(request.base, scope, request.filter, request.attributes.to_vec())
            .await
            .map_err(|e| format!("LDAP search failed: {e}"))?
            .success()
            .map_err(|e| format!("LDAP search error: {e}"))?;

        let mut referrals = 0;
        let mut entries = Vec::with_capacity(results.len());
        for entry in results {
            if entry.is_ref() {
                referrals += 1;
            } else if !entry.is_intermediate() {
                let se = SearchEntry::construct(entry);
                entries.push(DirectoryEntry {
                    dn: se.dn,
                    attrs: se.attrs,
                    bin_attrs: se.bin_attrs,
                });
            }
        }
        check_referrals(entries, referrals)
    }
}

/// The DC URL for a search under `base`.
///
/// The configured server is used when its host is the base's domain name or a
/// machine directly in it. Otherwise the base's domain name takes its place,
/// keeping scheme and port.
fn domain_controller_url(server: &str, base: &str) -> String {
    let Some(domain) = dns_domain(base) else {
        return server.to_string();
    };
    let (scheme, rest) = server.split_once("://").unwrap_or(("ldap", server));
    let authority = rest.split('/').next().unwrap_or(rest);
    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (authority, None),
    };

    let host = host.to_ascii_lowercase();
    let domain = domain.to_ascii_lowercase();
    let serves_domain =
        host == domain || host.split_once('.').is_some_and(|(_, parent)| parent == domain);
    if serves_domain {
        return server.to_string();
    }
    match port {
        Some(port) => format!("{scheme}://{domain}:{port}"),
        None => format!("{scheme}://{domain}"),
    }
}

/// A search answered only with referrals did not look where the object lives,
/// so it must not read as "no match".
fn check_referrals(entries: Vec<DirectoryEntry>, referrals: usize) -> Result<Vec<DirectoryEntry>, String> {
    if entries.is_empty() && referrals > 0 {
        return Err(format!(
            "search returned {referrals} referral(s) and no entries; the object lives on another server"
        ));
    }
    Ok(entries)
}

#[async_trait]
impl DirectorySearcher for LdapDirectoryClient {
    async fn search(
        &self,
        request: &SearchRequest<'_>,
    ) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let url = self.url_for(request);
        let query_failed = |detail: String| DirectoryError::QueryFailed {
            filter: request.filter.to_string(),
            search_root: format!("{url}/{}", request.base),
            detail,
        };

        debug!(server = %url, base = %request.base, filter = %request.filter, "LDAP search");

        let mut bound = self.connect(&url).await.map_err(&query_failed)?;
        let outcome = self.run_search(&mut bound, request).await;
        bound.release().await;

        outcome.map_err(query_failed)
    }
}
