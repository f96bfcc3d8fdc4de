//! Warden Policy -- derives certificate content from policy rules.
//!
//! Expands `{namespace:token}` templates, evaluates the outbound Subject DN and
//! SAN rules, and builds the CRL distribution point, authority information
//! access and custom extensions for a single request.

pub mod extensions;
pub mod lookup;
pub mod rules;
pub mod san;
pub mod subject;
pub mod tokens;
pub mod validator;
