//! Attribute descriptions and option sets

use std::{collections::BTreeSet, fmt, str::FromStr};

use pest::Parser;
use pest_derive::Parser;

use crate::error::Error;

#[derive(Parser)]
#[grammar = "description.pest"]
pub(crate) struct DescriptionParser;

/// Normalized set of attribute options. Options are case-insensitive, so they are
/// stored lowercased, sorted and deduplicated, which makes equality an exact set comparison.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionSet(BTreeSet<String>);

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option, returns false if it was already present
    pub fn insert<S: AsRef<str>>(&mut self, option: S) -> bool {
        self.0.insert(option.as_ref().to_ascii_lowercase())
    }

    pub fn contains<S: AsRef<str>>(&self, option: S) -> bool {
        self.0.contains(&option.as_ref().to_ascii_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for OptionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = OptionSet::new();
        for option in iter {
            set.insert(option);
        }
        set
    }
}

/// Returns true if the name is a descriptor or a numeric OID
pub(crate) fn is_valid_name(name: &str) -> bool {
    DescriptionParser::parse(Rule::name, name).is_ok()
}

/// Attribute description as carried on the wire: a type name or numeric OID followed by
/// zero or more `;option` suffixes, e.g. `cn;lang-en`.
///
/// The text is kept as given; equality compares the type name case-insensitively and the options as a set.
#[derive(Clone, Debug)]
pub struct AttributeDescription {
    text: String,
    name: String,
    options: OptionSet,
}

impl AttributeDescription {
    /// Parse an attribute description, failing with a protocol error if it is malformed
    pub fn parse<S: AsRef<str>>(description: S) -> Result<Self, Error> {
        let description = description.as_ref();
        let mut parsed = DescriptionParser::parse(Rule::description, description)
            .map_err(|e| Error::Protocol(format!("invalid attribute description {:?}: {}", description, e)))?;

        let mut name = String::new();
        let mut options = OptionSet::new();

        if let Some(pair) = parsed.next() {
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::oid => name = inner.as_str().to_owned(),
                    Rule::option => {
                        options.insert(inner.as_str());
                    }
                    _ => {}
                }
            }
        }

        if name.is_empty() {
            return Err(Error::Protocol(format!("missing attribute type in {:?}", description)));
        }

        Ok(Self {
            text: description.to_owned(),
            name,
            options,
        })
    }

    /// Attribute type name or OID exactly as given
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    /// The description exactly as parsed
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_parts(self) -> (String, OptionSet) {
        (self.name, self.options)
    }
}

impl FromStr for AttributeDescription {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Write a type name followed by its options in normalized order
pub(crate) fn write_description(f: &mut impl fmt::Write, name: &str, options: &OptionSet) -> fmt::Result {
    f.write_str(name)?;
    for option in options.iter() {
        f.write_char(';')?;
        f.write_str(option)?;
    }
    Ok(())
}

impl PartialEq for AttributeDescription {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name) && self.options == other.options
    }
}

impl Eq for AttributeDescription {}

impl fmt::Display for AttributeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
