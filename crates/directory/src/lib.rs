//! Warden Directory -- resolution of Active Directory objects for certificate requests.
//!
//! Finds exactly one user or computer object for an identity taken from a
//! request, via the global catalog and a domain controller over LDAP.

pub mod attributes;
pub mod client;
pub mod filter;
pub mod object;
pub mod resolver;
pub mod searcher;
