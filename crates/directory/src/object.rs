//! The resolved directory object and its account-state and identity types.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use tracing::debug;
use warden_core::models::request::NameValue;

use crate::attributes::retrievable_attribute;

/// userAccountControl flags describing account state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserAccountControl(pub u32);

impl UserAccountControl {
    pub const SCRIPT: u32 = 0x0000_0001;
    pub const ACCOUNT_DISABLE: u32 = 0x0000_0002;
    pub const HOMEDIR_REQUIRED: u32 = 0x0000_0008;
    pub const LOCKOUT: u32 = 0x0000_0010;
    pub const PASSWD_NOTREQD: u32 = 0x0000_0020;
    pub const PASSWD_CANT_CHANGE: u32 = 0x0000_0040;
    pub const ENCRYPTED_TEXT_PWD_ALLOWED: u32 = 0x0000_0080;
    pub const TEMP_DUPLICATE_ACCOUNT: u32 = 0x0000_0100;
    pub const NORMAL_ACCOUNT: u32 = 0x0000_0200;
    pub const INTERDOMAIN_TRUST_ACCOUNT: u32 = 0x0000_0800;
    pub const WORKSTATION_TRUST_ACCOUNT: u32 = 0x0000_1000;
    pub const SERVER_TRUST_ACCOUNT: u32 = 0x0000_2000;
    pub const DONT_EXPIRE_PASSWORD: u32 = 0x0001_0000;
    pub const MNS_LOGON_ACCOUNT: u32 = 0x0002_0000;
    pub const SMARTCARD_REQUIRED: u32 = 0x0004_0000;
    pub const TRUSTED_FOR_DELEGATION: u32 = 0x0008_0000;
    pub const NOT_DELEGATED: u32 = 0x0010_0000;
    pub const USE_DES_KEY_ONLY: u32 = 0x0020_0000;
    pub const DONT_REQ_PREAUTH: u32 = 0x0040_0000;
    pub const PASSWORD_EXPIRED: u32 = 0x0080_0000;
    pub const TRUSTED_TO_AUTH_FOR_DELEGATION: u32 = 0x0100_0000;
    pub const PARTIAL_SECRETS_ACCOUNT: u32 = 0x0400_0000;

    pub fn contains(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    pub fn is_disabled(self) -> bool {
        self.contains(Self::ACCOUNT_DISABLE)
    }

    pub fn is_locked_out(self) -> bool {
        self.contains(Self::LOCKOUT)
    }

    /// Parse the decimal text form the directory returns. AD stores the value as
    /// a signed 32-bit integer, so negative numbers are accepted. Anything outside
    /// 32 bits is rejected.
    pub fn parse_directory_value(value: &str) -> Option<Self> {
        let v = value.trim().parse::<i64>().ok()?;
        match i32::try_from(v) {
            Ok(signed) => Some(Self(u32::from_ne_bytes(signed.to_ne_bytes()))),
            Err(_) => u32::try_from(v).ok().map(Self),
        }
    }
}

/// A Windows security identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SecurityIdentifier {
    revision: u8,
    authority: u64,
    sub_authorities: Vec<u32>,
}

impl SecurityIdentifier {
    /// Decode the binary `objectSid` representation.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 8 {
            return None;
        }
        let revision = bytes[0];
        let count = bytes[1] as usize;
        if bytes.len() != 8 + 4 * count {
            return None;
        }

        let authority = bytes[2..8]
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        let sub_authorities = bytes[8..]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Some(Self {
            revision,
            authority,
            sub_authorities,
        })
    }

    /// Encode back into the binary `objectSid` representation.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + 4 * self.sub_authorities.len());
        bytes.push(self.revision);
        bytes.push(self.sub_authorities.len() as u8);
        bytes.extend_from_slice(&self.authority.to_be_bytes()[2..]);
        for sub in &self.sub_authorities {
            bytes.extend_from_slice(&sub.to_le_bytes());
        }
        bytes
    }

    /// The relative identifier, i.e. the last sub-authority.
    pub fn rid(&self) -> Option<u32> {
        self.sub_authorities.last().copied()
    }
}

impl FromStr for SecurityIdentifier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('-');
        if !parts.next().is_some_and(|p| p.eq_ignore_ascii_case("S")) {
            return Err(());
        }
        let revision = parts.next().ok_or(())?.parse().map_err(|_| ())?;
        let authority_text = parts.next().ok_or(())?;
        let authority = match authority_text.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16).map_err(|_| ())?,
            None => authority_text.parse().map_err(|_| ())?,
        };
        let sub_authorities = parts
            .map(|p| p.parse::<u32>().map_err(|_| ()))
            .collect::<Result<Vec<_>, _>>()?;

        if sub_authorities.len() > 15 || authority >= 1 << 48 {
            return Err(());
        }

        Ok(Self {
            revision,
            authority,
            sub_authorities,
        })
    }
}

impl fmt::Display for SecurityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}-", self.revision)?;
        if self.authority < 1 << 32 {
            write!(f, "{}", self.authority)?;
        } else {
            write!(f, "0x{:012X}", self.authority)?;
        }
        for sub in &self.sub_authorities {
            write!(f, "-{sub}")?;
        }
        Ok(())
    }
}

impl Serialize for SecurityIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A directory entry that matched a lookup exactly once.
///
/// Instances are only produced by [`DirectoryObjectBuilder`], either from a live
/// resolution or from literal values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryObject {
    distinguished_name: String,
    user_account_control: UserAccountControl,
    security_identifier: SecurityIdentifier,
    member_of: Vec<String>,
    service_principal_names: Vec<String>,
    attributes: Vec<NameValue>,
}

impl DirectoryObject {
    pub fn builder(distinguished_name: impl Into<String>) -> DirectoryObjectBuilder {
        DirectoryObjectBuilder::new(distinguished_name)
    }

    pub fn distinguished_name(&self) -> &str {
        &self.distinguished_name
    }

    pub fn user_account_control(&self) -> UserAccountControl {
        self.user_account_control
    }

    pub fn security_identifier(&self) -> &SecurityIdentifier {
        &self.security_identifier
    }

    pub fn member_of(&self) -> &[String] {
        &self.member_of
    }

    /// Whether the object is a member of the group, compared case-insensitively.
    pub fn is_member_of(&self, group_dn: &str) -> bool {
        self.member_of
            .iter()
            .any(|g| g.eq_ignore_ascii_case(group_dn))
    }

    pub fn service_principal_names(&self) -> &[String] {
        &self.service_principal_names
    }

    /// Whitelisted attributes in retrieval order, the `ad` token source.
    pub fn attributes(&self) -> &[NameValue] {
        &self.attributes
    }

    /// Look up an attribute value by name, ignoring case.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Builder for [`DirectoryObject`].
#[derive(Debug, Clone)]
pub struct DirectoryObjectBuilder {
    object: DirectoryObject,
}

impl DirectoryObjectBuilder {
    pub fn new(distinguished_name: impl Into<String>) -> Self {
        Self {
            object: DirectoryObject {
                distinguished_name: distinguished_name.into(),
                user_account_control: UserAccountControl::default(),
                security_identifier: SecurityIdentifier::default(),
                member_of: Vec::new(),
                service_principal_names: Vec::new(),
                attributes: Vec::new(),
            },
        }
    }

    pub fn user_account_control(mut self, uac: UserAccountControl) -> Self {
        self.object.user_account_control = uac;
        self
    }

    pub fn security_identifier(mut self, sid: SecurityIdentifier) -> Self {
        self.object.security_identifier = sid;
        self
    }

    pub fn member_of<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.object.member_of = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn service_principal_names<I, S>(mut self, spns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.object.service_principal_names = spns.into_iter().map(Into::into).collect();
        self
    }

    /// Add an attribute value. Names outside the retrieval whitelist are dropped
    /// and only the first value of each attribute is kept.
    pub fn attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        let Some(canonical) = retrievable_attribute(name) else {
            debug!(attribute = %name, "ignoring attribute outside the retrieval whitelist");
            return self;
        };

        if !self
            .object
            .attributes
            .iter()
            .any(|(k, _)| k == canonical)
        {
            self.object
                .attributes
                .push((canonical.to_string(), value.into()));
        }
        self
    }

    pub fn build(self) -> DirectoryObject {
        self.object
    }
}
