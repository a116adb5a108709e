//! Schema lookup for attribute types and object classes

use std::{
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
};

use log::trace;
use once_cell::sync::Lazy;

use crate::{description::is_valid_name, error::Error, oid};

/// Names must be a descriptor or a numeric OID, anything else is malformed input
fn check_name(kind: &str, name: &str) -> Result<(), Error> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(Error::Protocol(format!("invalid {} name {:?}", kind, name)))
    }
}

fn hash_ignore_case<H: Hasher>(name: &str, state: &mut H) {
    for b in name.bytes() {
        state.write_u8(b.to_ascii_lowercase());
    }
}

/// Attribute type handle. Two handles are equal when their primary names match case-insensitively.
#[derive(Clone, Debug)]
pub struct AttributeType {
    name: String,
    oid: Option<String>,
    object_class: bool,
    operational: bool,
}

impl AttributeType {
    /// Create a user attribute type
    pub fn user<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            oid: None,
            object_class: false,
            operational: false,
        }
    }

    /// Create an operational attribute type
    pub fn operational<S: Into<String>>(name: S) -> Self {
        Self {
            operational: true,
            ..Self::user(name)
        }
    }

    /// The objectClass attribute type
    pub fn object_class() -> Self {
        Self {
            object_class: true,
            ..Self::user("objectClass").with_oid(oid::OBJECT_CLASS_OID)
        }
    }

    pub fn with_oid<S: Into<String>>(mut self, oid: S) -> Self {
        self.oid = Some(oid.into());
        self
    }

    /// Primary name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn oid(&self) -> Option<&str> {
        self.oid.as_deref()
    }

    pub fn is_object_class(&self) -> bool {
        self.object_class
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }
}

impl PartialEq for AttributeType {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for AttributeType {}

impl Hash for AttributeType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_ignore_case(&self.name, state);
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Object class handle, compared case-insensitively by primary name
#[derive(Clone, Debug)]
pub struct ObjectClass {
    name: String,
    oid: Option<String>,
}

impl ObjectClass {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            oid: None,
        }
    }

    pub fn with_oid<S: Into<String>>(mut self, oid: S) -> Self {
        self.oid = Some(oid.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn oid(&self) -> Option<&str> {
        self.oid.as_deref()
    }
}

impl PartialEq for ObjectClass {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for ObjectClass {}

impl Hash for ObjectClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_ignore_case(&self.name, state);
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Resolves names found in protocol messages into schema handles
pub trait Schema {
    /// Resolve an object class by name or OID
    fn object_class(&self, name: &str) -> Result<ObjectClass, Error>;

    /// Resolve an attribute type by name or OID
    fn attribute_type(&self, name: &str) -> Result<AttributeType, Error>;
}

impl<T: Schema + ?Sized> Schema for &T {
    fn object_class(&self, name: &str) -> Result<ObjectClass, Error> {
        (**self).object_class(name)
    }

    fn attribute_type(&self, name: &str) -> Result<AttributeType, Error> {
        (**self).attribute_type(name)
    }
}

#[derive(Clone, Copy)]
enum Usage {
    ObjectClass,
    User,
    Operational,
}

// (oid, names, usage); the first name is the primary one
const ATTRIBUTE_TYPES: &[(&str, &[&str], Usage)] = &[
    ("2.5.4.0", &["objectClass"], Usage::ObjectClass),
    ("2.5.4.1", &["aliasedObjectName", "aliasedEntryName"], Usage::User),
    ("2.5.4.3", &["cn", "commonName"], Usage::User),
    ("2.5.4.4", &["sn", "surname"], Usage::User),
    ("2.5.4.5", &["serialNumber"], Usage::User),
    ("2.5.4.6", &["c", "countryName"], Usage::User),
    ("2.5.4.7", &["l", "localityName"], Usage::User),
    ("2.5.4.8", &["st", "stateOrProvinceName"], Usage::User),
    ("2.5.4.9", &["street", "streetAddress"], Usage::User),
    ("2.5.4.10", &["o", "organizationName"], Usage::User),
    ("2.5.4.11", &["ou", "organizationalUnitName"], Usage::User),
    ("2.5.4.12", &["title"], Usage::User),
    ("2.5.4.13", &["description"], Usage::User),
    ("2.5.4.20", &["telephoneNumber"], Usage::User),
    ("2.5.4.31", &["member"], Usage::User),
    ("2.5.4.35", &["userPassword"], Usage::User),
    ("2.5.4.36", &["userCertificate"], Usage::User),
    ("2.5.4.42", &["givenName", "gn"], Usage::User),
    ("2.5.4.49", &["distinguishedName"], Usage::User),
    ("0.9.2342.19200300.100.1.1", &["uid", "userid"], Usage::User),
    ("0.9.2342.19200300.100.1.3", &["mail", "rfc822Mailbox"], Usage::User),
    ("0.9.2342.19200300.100.1.25", &["dc", "domainComponent"], Usage::User),
    ("2.5.18.1", &["createTimestamp"], Usage::Operational),
    ("2.5.18.2", &["modifyTimestamp"], Usage::Operational),
    ("2.5.18.3", &["creatorsName"], Usage::Operational),
    ("2.5.18.4", &["modifiersName"], Usage::Operational),
    ("2.5.18.10", &["subschemaSubentry"], Usage::Operational),
    ("2.5.21.9", &["structuralObjectClass"], Usage::Operational),
    ("1.3.6.1.1.16.4", &["entryUUID"], Usage::Operational),
    ("1.3.6.1.1.20", &["entryDN"], Usage::Operational),
    ("1.3.6.1.4.1.1466.101.120.5", &["namingContexts"], Usage::Operational),
    ("1.3.6.1.4.1.1466.101.120.15", &["supportedLDAPVersion"], Usage::Operational),
    ("1.3.6.1.4.1.1466.101.120.13", &["supportedControl"], Usage::Operational),
    ("1.3.6.1.4.1.1466.101.120.7", &["supportedExtension"], Usage::Operational),
];

const OBJECT_CLASSES: &[(&str, &[&str])] = &[
    ("2.5.6.0", &["top"]),
    ("2.5.6.1", &["alias"]),
    ("2.5.6.2", &["country"]),
    ("2.5.6.4", &["organization"]),
    ("2.5.6.5", &["organizationalUnit"]),
    ("2.5.6.6", &["person"]),
    ("2.5.6.7", &["organizationalPerson"]),
    ("2.5.6.9", &["groupOfNames"]),
    ("2.16.840.1.113730.3.2.2", &["inetOrgPerson"]),
    ("1.3.6.1.4.1.1466.344", &["dcObject"]),
    ("1.3.6.1.4.1.1466.101.120.111", &["extensibleObject"]),
];

fn build_attribute_types() -> HashMap<String, AttributeType> {
    let mut map = HashMap::new();
    for (oid, names, usage) in ATTRIBUTE_TYPES {
        let attr_type = match usage {
            Usage::ObjectClass => AttributeType::object_class(),
            Usage::User => AttributeType::user(names[0]).with_oid(*oid),
            Usage::Operational => AttributeType::operational(names[0]).with_oid(*oid),
        };
        map.insert(oid.to_string(), attr_type.clone());
        for name in names.iter() {
            map.insert(name.to_ascii_lowercase(), attr_type.clone());
        }
    }
    map
}

fn build_object_classes() -> HashMap<String, ObjectClass> {
    let mut map = HashMap::new();
    for (oid, names) in OBJECT_CLASSES {
        let class = ObjectClass::new(names[0]).with_oid(*oid);
        map.insert(oid.to_string(), class.clone());
        for name in names.iter() {
            map.insert(name.to_ascii_lowercase(), class.clone());
        }
    }
    map
}

static CORE_ATTRIBUTE_TYPES: Lazy<HashMap<String, AttributeType>> = Lazy::new(build_attribute_types);
static CORE_OBJECT_CLASSES: Lazy<HashMap<String, ObjectClass>> = Lazy::new(build_object_classes);

/// Built-in schema holding the common RFC 4512/4519 definitions.
///
/// In the default permissive mode unknown names resolve to a user attribute type or object class
/// carrying that name. Strict mode rejects them with [`Error::Schema`].
#[derive(Clone, Debug, Default)]
pub struct CoreSchema {
    strict: bool,
}

impl CoreSchema {
    pub fn permissive() -> Self {
        Self { strict: false }
    }

    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }
}

impl Schema for CoreSchema {
    fn object_class(&self, name: &str) -> Result<ObjectClass, Error> {
        check_name("object class", name)?;
        match CORE_OBJECT_CLASSES.get(&name.to_ascii_lowercase()) {
            Some(class) => Ok(class.clone()),
            None if self.strict => Err(Error::Schema(format!("unknown object class {:?}", name))),
            None => {
                trace!("Unknown object class {}, using default", name);
                Ok(ObjectClass::new(name))
            }
        }
    }

    fn attribute_type(&self, name: &str) -> Result<AttributeType, Error> {
        check_name("attribute type", name)?;
        match CORE_ATTRIBUTE_TYPES.get(&name.to_ascii_lowercase()) {
            Some(attr_type) => Ok(attr_type.clone()),
            None if self.strict => Err(Error::Schema(format!("unknown attribute type {:?}", name))),
            None => {
                trace!("Unknown attribute type {}, using default", name);
                Ok(AttributeType::user(name))
            }
        }
    }
}
