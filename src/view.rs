//! Wire attribute views derived from an entry

use log::warn;

use crate::{
    entry::{Entry, EntryAttribute},
    model::{Attribute, Attributes, ProtocolVersion},
    schema::AttributeType,
};

impl ProtocolVersion {
    /// Build the wire attribute list for an entry according to this version's merge policy
    pub fn attribute_view(self, entry: &Entry) -> Attributes {
        match self {
            ProtocolVersion::V2 => merged_attributes(entry),
            ProtocolVersion::V3 => all_attributes(entry),
        }
    }
}

/// LDAPv2 view: one attribute per type, option variants merged and options dropped.
/// Only the user and operational partitions are visited.
pub(crate) fn merged_attributes(entry: &Entry) -> Attributes {
    let mut attributes = Attributes::new();
    merge_into(&mut attributes, entry.user_attributes());
    merge_into(&mut attributes, entry.operational_attributes());
    attributes
}

fn merge_into<'a, I>(attributes: &mut Attributes, buckets: I)
where
    I: Iterator<Item = (&'a AttributeType, &'a [EntryAttribute])>,
{
    for (attr_type, variants) in buckets {
        match variants {
            [] => warn!("Empty attribute bucket for {}, skipping", attr_type),
            [single] if !single.has_options() => attributes.push(single.into()),
            _ => {
                let values = variants.iter().flat_map(|v| v.values().iter().cloned());
                let merged = EntryAttribute::new(attr_type.clone(), values);
                attributes.push(Attribute::from(&merged));
            }
        }
    }
}

/// LDAPv3 view: every attribute of the entry as is, objectClass included
pub(crate) fn all_attributes(entry: &Entry) -> Attributes {
    entry.all_attributes().map(|attr| Attribute::from(&*attr)).collect()
}
