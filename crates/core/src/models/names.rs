//! Catalogues of the Subject DN and Subject Alternative Name types a policy may target.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Relative distinguished name types that may be written into the Subject DN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RdnType {
    Country,
    CommonName,
    DomainComponent,
    Email,
    GivenName,
    Initials,
    Locality,
    Organization,
    OrgUnit,
    State,
    SurName,
    StreetAddress,
    Title,
    UnstructuredName,
    UnstructuredAddress,
    DeviceSerialNumber,
}

impl RdnType {
    pub const ALL: [RdnType; 16] = [
        Self::Country,
        Self::CommonName,
        Self::DomainComponent,
        Self::Email,
        Self::GivenName,
        Self::Initials,
        Self::Locality,
        Self::Organization,
        Self::OrgUnit,
        Self::State,
        Self::SurName,
        Self::StreetAddress,
        Self::Title,
        Self::UnstructuredName,
        Self::UnstructuredAddress,
        Self::DeviceSerialNumber,
    ];

    /// Short name used in policies and request subjects, e.g. `CN`.
    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::Country => "C",
            Self::CommonName => "CN",
            Self::DomainComponent => "DC",
            Self::Email => "E",
            Self::GivenName => "G",
            Self::Initials => "I",
            Self::Locality => "L",
            Self::Organization => "O",
            Self::OrgUnit => "OU",
            Self::State => "S",
            Self::SurName => "SN",
            Self::StreetAddress => "STREET",
            Self::Title => "T",
            Self::UnstructuredName => "UnstructuredName",
            Self::UnstructuredAddress => "UnstructuredAddress",
            Self::DeviceSerialNumber => "DeviceSerialNumber",
        }
    }

    /// Certificate property the CA stores this component under.
    pub fn certificate_property(self) -> &'static str {
        match self {
            Self::Country => "Subject.Country",
            Self::CommonName => "Subject.CommonName",
            Self::DomainComponent => "Subject.DomainComponent",
            Self::Email => "Subject.EMail",
            Self::GivenName => "Subject.GivenName",
            Self::Initials => "Subject.Initials",
            Self::Locality => "Subject.Locality",
            Self::Organization => "Subject.Organization",
            Self::OrgUnit => "Subject.OrgUnit",
            Self::State => "Subject.State",
            Self::SurName => "Subject.SurName",
            Self::StreetAddress => "Subject.StreetAddress",
            Self::Title => "Subject.Title",
            Self::UnstructuredName => "Subject.UnstructuredName",
            Self::UnstructuredAddress => "Subject.UnstructuredAddress",
            Self::DeviceSerialNumber => "Subject.DeviceSerialNumber",
        }
    }
}

impl FromStr for RdnType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.abbreviation().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

impl fmt::Display for RdnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Subject Alternative Name types that may be added by policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SanType {
    DnsName,
    Rfc822Name,
    UniformResourceIdentifier,
    UserPrincipalName,
    IpAddress,
}

impl SanType {
    pub const ALL: [SanType; 5] = [
        Self::DnsName,
        Self::Rfc822Name,
        Self::UniformResourceIdentifier,
        Self::UserPrincipalName,
        Self::IpAddress,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::DnsName => "dNSName",
            Self::Rfc822Name => "rfc822Name",
            Self::UniformResourceIdentifier => "uniformResourceIdentifier",
            Self::UserPrincipalName => "userPrincipalName",
            Self::IpAddress => "iPAddress",
        }
    }

    /// Syntax check for a value of this type.
    pub fn accepts(self, value: &str) -> bool {
        if value.is_empty() || value.chars().any(char::is_whitespace) {
            return false;
        }
        match self {
            Self::DnsName => value
                .strip_suffix('.')
                .unwrap_or(value)
                .split('.')
                .all(|label| !label.is_empty()),
            Self::Rfc822Name | Self::UserPrincipalName => match value.split_once('@') {
                Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
                None => false,
            },
            Self::UniformResourceIdentifier => value.contains(':'),
            Self::IpAddress => value.parse::<IpAddr>().is_ok(),
        }
    }
}

impl FromStr for SanType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

impl fmt::Display for SanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
