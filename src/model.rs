//! Data structures

use std::{convert::TryFrom, fmt};

use bytes::Bytes;

use crate::{entry::EntryAttribute, error::Error};

/// Distinguished name, kept in its string form
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dn(String);

impl Dn {
    pub fn new<S: Into<String>>(dn: S) -> Self {
        Self(dn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Dn {
    fn from(dn: &str) -> Self {
        Dn(dn.to_owned())
    }
}

impl From<String> for Dn {
    fn from(dn: String) -> Self {
        Dn(dn)
    }
}

/// Decode a wire string, rejecting invalid UTF-8
pub(crate) fn utf8_string(raw: Bytes, what: &str) -> Result<String, Error> {
    String::from_utf8(raw.to_vec()).map_err(|_| Error::Protocol(format!("{} is not valid UTF-8", what)))
}

impl TryFrom<Bytes> for Dn {
    type Error = Error;

    fn try_from(raw: Bytes) -> Result<Self, Self::Error> {
        utf8_string(raw, "distinguished name").map(Dn)
    }
}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// LDAP protocol version, selects how attribute options are put on the wire
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    /// Same-typed attributes are merged into one, options are dropped
    V2,
    /// One attribute per type and option set
    #[default]
    V3,
}

impl TryFrom<u8> for ProtocolVersion {
    type Error = Error;

    fn try_from(version: u8) -> Result<Self, Self::Error> {
        match version {
            2 => Ok(ProtocolVersion::V2),
            3 => Ok(ProtocolVersion::V3),
            other => Err(Error::Protocol(format!("unsupported LDAP version {}", other))),
        }
    }
}

impl From<ProtocolVersion> for u8 {
    fn from(version: ProtocolVersion) -> Self {
        match version {
            ProtocolVersion::V2 => 2,
            ProtocolVersion::V3 => 3,
        }
    }
}

/// LDAP attribute as carried on the wire
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute description, type name with options
    pub name: String,
    /// Attribute values
    pub values: Vec<Bytes>,
}

pub type Attributes = Vec<Attribute>;

impl Attribute {
    pub fn new<S, I, V>(name: S, values: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<Bytes>,
    {
        Attribute {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<rasn_ldap::PartialAttribute> for Attribute {
    type Error = Error;

    fn try_from(raw: rasn_ldap::PartialAttribute) -> Result<Self, Self::Error> {
        Ok(Attribute {
            name: utf8_string(Bytes::from(raw.r#type.0), "attribute description")?,
            values: raw.vals.to_vec().into_iter().cloned().collect(),
        })
    }
}

impl From<&EntryAttribute> for Attribute {
    fn from(attr: &EntryAttribute) -> Self {
        Attribute {
            name: attr.description().to_owned(),
            values: attr.values().to_vec(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Attribute(type={}, values={{", self.name)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&String::from_utf8_lossy(value))?;
        }
        f.write_str("})")
    }
}
