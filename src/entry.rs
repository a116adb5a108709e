//! Directory entries

use std::{borrow::Cow, collections::HashSet};

use bytes::Bytes;

use crate::{
    description::{write_description, AttributeDescription, OptionSet},
    error::Error,
    model::Dn,
    schema::{AttributeType, ObjectClass},
};

/// Attribute stored in an entry: a resolved type, an option set and the values.
///
/// The description keeps the spelling the attribute was created with and is what goes on the wire.
/// Equality only looks at the type, the option set and the values.
#[derive(Clone, Debug)]
pub struct EntryAttribute {
    attribute_type: AttributeType,
    options: OptionSet,
    description: String,
    values: Vec<Bytes>,
    seen: HashSet<Bytes>,
}

impl EntryAttribute {
    pub fn new<I, V>(attribute_type: AttributeType, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bytes>,
    {
        let mut attr = Self {
            description: attribute_type.name().to_owned(),
            attribute_type,
            options: OptionSet::new(),
            values: Vec::new(),
            seen: HashSet::new(),
        };
        attr.add_values(values.into_iter().map(Into::into));
        attr
    }

    /// Set the options, the description becomes the type name followed by the normalized options
    pub fn with_options(mut self, options: OptionSet) -> Self {
        let mut description = String::new();
        // writing into a String cannot fail
        let _ = write_description(&mut description, self.attribute_type.name(), &options);
        self.description = description;
        self.options = options;
        self
    }

    /// Take the options and the exact spelling from a parsed description
    pub fn with_description(mut self, description: AttributeDescription) -> Self {
        self.options = description.options().clone();
        self.description = description.as_str().to_owned();
        self
    }

    pub fn attribute_type(&self) -> &AttributeType {
        &self.attribute_type
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn values(&self) -> &[Bytes] {
        &self.values
    }

    /// Add values, skipping the ones already present and keeping first-seen order
    pub fn add_values<I: IntoIterator<Item = Bytes>>(&mut self, values: I) {
        for value in values {
            if self.seen.insert(value.clone()) {
                self.values.push(value);
            }
        }
    }

    /// Type name with options, e.g. `cn;lang-en`
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for EntryAttribute {
    fn eq(&self, other: &Self) -> bool {
        self.attribute_type == other.attribute_type && self.options == other.options && self.values == other.values
    }
}

impl Eq for EntryAttribute {}

type Bucket = (AttributeType, Vec<EntryAttribute>);

fn add_to_buckets(buckets: &mut Vec<Bucket>, attr: EntryAttribute) {
    match buckets.iter_mut().find(|(t, _)| *t == attr.attribute_type) {
        Some((_, variants)) => match variants.iter_mut().find(|v| v.options == attr.options) {
            Some(existing) => existing.add_values(attr.values),
            None => variants.push(attr),
        },
        None => buckets.push((attr.attribute_type.clone(), vec![attr])),
    }
}

fn bucket_iter(buckets: &[Bucket]) -> impl Iterator<Item = (&AttributeType, &[EntryAttribute])> {
    buckets.iter().map(|(t, variants)| (t, variants.as_slice()))
}

/// Directory entry: a DN, its object classes and the user and operational attributes.
///
/// Attributes are grouped in buckets by type, each bucket holding one attribute per distinct
/// option set. Buckets keep insertion order and are never empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Entry {
    dn: Dn,
    object_classes: Vec<(ObjectClass, String)>,
    user_attributes: Vec<Bucket>,
    operational_attributes: Vec<Bucket>,
}

impl Entry {
    pub fn new<D: Into<Dn>>(dn: D) -> Self {
        Self {
            dn: dn.into(),
            ..Default::default()
        }
    }

    pub fn dn(&self) -> &Dn {
        &self.dn
    }

    /// Add an object class with the name it was given by the user.
    /// If the class is already present the name is replaced.
    pub fn add_object_class<S: Into<String>>(&mut self, class: ObjectClass, name: S) {
        let name = name.into();
        match self.object_classes.iter_mut().find(|(c, _)| *c == class) {
            Some((_, existing)) => *existing = name,
            None => self.object_classes.push((class, name)),
        }
    }

    /// Add an attribute to the user or operational partition depending on its type.
    /// Values of an attribute with the same type and option set are merged into it.
    ///
    /// Values of objectClass attributes are registered as object classes by name only, without
    /// a schema lookup; use [`Entry::add_object_class`] to add resolved classes. A class name that
    /// is not valid UTF-8 fails with a protocol error and leaves the entry unchanged.
    pub fn add_attribute(&mut self, attr: EntryAttribute) -> Result<(), Error> {
        if attr.attribute_type.is_object_class() {
            let names = attr
                .values
                .into_iter()
                .map(|value| {
                    String::from_utf8(value.to_vec())
                        .map_err(|_| Error::Protocol("object class name is not valid UTF-8".to_owned()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            for name in names {
                self.add_object_class(ObjectClass::new(name.clone()), name);
            }
        } else if attr.attribute_type.is_operational() {
            add_to_buckets(&mut self.operational_attributes, attr);
        } else {
            add_to_buckets(&mut self.user_attributes, attr);
        }
        Ok(())
    }

    /// Object classes with their user-provided names, in insertion order
    pub fn object_classes(&self) -> impl Iterator<Item = (&ObjectClass, &str)> {
        self.object_classes.iter().map(|(c, n)| (c, n.as_str()))
    }

    pub fn has_object_class(&self, class: &ObjectClass) -> bool {
        self.object_classes.iter().any(|(c, _)| c == class)
    }

    pub fn user_attributes(&self) -> impl Iterator<Item = (&AttributeType, &[EntryAttribute])> {
        bucket_iter(&self.user_attributes)
    }

    pub fn operational_attributes(&self) -> impl Iterator<Item = (&AttributeType, &[EntryAttribute])> {
        bucket_iter(&self.operational_attributes)
    }

    /// All variants of the given type, from either partition
    pub fn attribute(&self, attribute_type: &AttributeType) -> Option<&[EntryAttribute]> {
        self.user_attributes
            .iter()
            .chain(self.operational_attributes.iter())
            .find(|(t, _)| t == attribute_type)
            .map(|(_, variants)| variants.as_slice())
    }

    /// The object classes as an objectClass attribute, if the entry has any
    pub fn object_class_attribute(&self) -> Option<EntryAttribute> {
        if self.object_classes.is_empty() {
            return None;
        }
        Some(EntryAttribute::new(
            AttributeType::object_class(),
            self.object_classes.iter().map(|(_, name)| Bytes::from(name.clone())),
        ))
    }

    /// Every attribute in canonical order: objectClass first, then user, then operational attributes
    pub fn all_attributes(&self) -> impl Iterator<Item = Cow<'_, EntryAttribute>> {
        self.object_class_attribute()
            .map(Cow::Owned)
            .into_iter()
            .chain(
                self.user_attributes
                    .iter()
                    .chain(self.operational_attributes.iter())
                    .flat_map(|(_, variants)| variants.iter().map(Cow::Borrowed)),
            )
    }
}
