//! Fixed attribute lists and the enumerated match attributes and object categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use warden_core::error::DirectoryError;

/// Attributes loaded on every resolution regardless of the whitelist.
pub const ALWAYS_LOADED_ATTRIBUTES: [&str; 5] = [
    "memberOf",
    "userAccountControl",
    "objectSid",
    "distinguishedName",
    "servicePrincipalName",
];

/// Computed attribute holding the transitive group closure of an object.
/// Only served by Windows Server 2016 or newer domain controllers.
pub const NESTED_GROUP_ATTRIBUTE: &str = "msDS-TokenGroupNames";

/// Directory attributes that may be retrieved and exposed as `ad` tokens.
pub const RETRIEVAL_ATTRIBUTES: [&str; 61] = [
    "c",
    "co",
    "cn",
    "company",
    "department",
    "departmentNumber",
    "description",
    "displayName",
    "division",
    "dNSHostName",
    "employeeID",
    "employeeNumber",
    "employeeType",
    "extensionAttribute1",
    "extensionAttribute10",
    "extensionAttribute11",
    "extensionAttribute12",
    "extensionAttribute13",
    "extensionAttribute14",
    "extensionAttribute15",
    "extensionAttribute2",
    "extensionAttribute3",
    "extensionAttribute4",
    "extensionAttribute5",
    "extensionAttribute6",
    "extensionAttribute7",
    "extensionAttribute8",
    "extensionAttribute9",
    "facsimileTelephoneNumber",
    "gecos",
    "givenName",
    "homePhone",
    "homePostalAddress",
    "info",
    "initials",
    "l",
    "location",
    "mail",
    "mailNickname",
    "middleName",
    "mobile",
    "name",
    "otherMailbox",
    "otherMobile",
    "otherPager",
    "otherTelephone",
    "pager",
    "personalPager",
    "personalTitle",
    "postalAddress",
    "postalCode",
    "postOfficeBox",
    "pwdLastSet",
    "sAMAccountName",
    "sn",
    "st",
    "street",
    "streetAddress",
    "telephoneNumber",
    "title",
    "userPrincipalName",
];

/// Canonical spelling of a whitelisted attribute, or `None` if it is not retrievable.
pub fn retrievable_attribute(name: &str) -> Option<&'static str> {
    RETRIEVAL_ATTRIBUTES
        .iter()
        .copied()
        .find(|a| a.eq_ignore_ascii_case(name))
}

/// Every attribute requested from the directory for the main lookup.
pub fn attributes_to_load() -> Vec<&'static str> {
    ALWAYS_LOADED_ATTRIBUTES
        .iter()
        .chain(RETRIEVAL_ATTRIBUTES.iter())
        .copied()
        .collect()
}

/// Directory attribute an identity may be matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchAttribute {
    CommonName,
    Name,
    SamAccountName,
    UserPrincipalName,
    DnsHostName,
}

impl MatchAttribute {
    pub const ALL: [MatchAttribute; 5] = [
        Self::CommonName,
        Self::Name,
        Self::SamAccountName,
        Self::UserPrincipalName,
        Self::DnsHostName,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CommonName => "cn",
            Self::Name => "name",
            Self::SamAccountName => "sAMAccountName",
            Self::UserPrincipalName => "userPrincipalName",
            Self::DnsHostName => "dNSHostName",
        }
    }
}

impl FromStr for MatchAttribute {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DirectoryError::InvalidMatchAttribute(s.to_string()))
    }
}

impl fmt::Display for MatchAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of directory object a request may map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectCategory {
    User,
    Computer,
}

impl ObjectCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Computer => "computer",
        }
    }
}

impl FromStr for ObjectCategory {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::User, Self::Computer]
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DirectoryError::InvalidObjectCategory(s.to_string()))
    }
}

impl fmt::Display for ObjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
