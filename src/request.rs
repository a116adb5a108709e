//! Search result entry protocol op

use std::{io, str, sync::Arc};

use bytes::Bytes;
use log::{debug, trace};

use crate::{
    codec::{self, AttributePdu, SearchResultEntryPdu},
    description::AttributeDescription,
    entry::{Entry, EntryAttribute},
    error::Error,
    ldif,
    model::{Attribute, Attributes, Dn, ProtocolVersion},
    oid,
    schema::Schema,
};

pub type Result<T> = std::result::Result<T, Error>;

/// Where the attributes of the op come from. Reading the attributes of an entry-backed op
/// turns it into a list-backed one, once and for all.
#[derive(Clone, Debug)]
enum AttributeSource {
    Entry(Arc<Entry>),
    Attributes(Attributes),
}

impl AttributeSource {
    fn materialize(&mut self, version: ProtocolVersion) -> &mut Attributes {
        match *self {
            AttributeSource::Attributes(ref mut attributes) => attributes,
            AttributeSource::Entry(ref entry) => {
                let attributes = version.attribute_view(entry);
                trace!(
                    "Materialized {} attributes for {} using {:?} policy",
                    attributes.len(),
                    entry.dn(),
                    version
                );
                *self = AttributeSource::Attributes(attributes);
                self.materialize(version)
            }
        }
    }
}

/// LDAP search result entry protocol op, returning one entry matched by a search
#[derive(Clone, Debug)]
pub struct SearchResultEntryOp {
    dn: Dn,
    version: ProtocolVersion,
    source: AttributeSource,
}

impl SearchResultEntryOp {
    /// Create an op with the given DN and no attributes
    pub fn new<D: Into<Dn>>(dn: D) -> Self {
        Self::with_attributes(dn, Attributes::new())
    }

    /// Create an op with the given DN and attributes
    pub fn with_attributes<D: Into<Dn>>(dn: D, attributes: Attributes) -> Self {
        Self {
            dn: dn.into(),
            version: ProtocolVersion::V3,
            source: AttributeSource::Attributes(attributes),
        }
    }

    /// Create an LDAPv3 op from a matched entry. Attributes are derived on first access.
    pub fn from_entry<E: Into<Arc<Entry>>>(entry: E) -> Self {
        Self::from_entry_with_version(entry, ProtocolVersion::V3)
    }

    /// Create an op from a matched entry for the given protocol version
    pub fn from_entry_with_version<E: Into<Arc<Entry>>>(entry: E, version: ProtocolVersion) -> Self {
        let entry = entry.into();
        Self {
            dn: entry.dn().clone(),
            version,
            source: AttributeSource::Entry(entry),
        }
    }

    /// Create op builder
    pub fn builder() -> SearchResultEntryBuilder {
        SearchResultEntryBuilder::new()
    }

    /// Decode a BER encoded `[APPLICATION 4]` search result entry
    pub fn decode(src: &[u8]) -> Result<Self> {
        codec::decode(src)?.try_into()
    }

    pub fn dn(&self) -> &Dn {
        &self.dn
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// BER type of this protocol op
    pub fn protocol_op_type(&self) -> u8 {
        oid::OP_TYPE_SEARCH_RESULT_ENTRY
    }

    pub fn protocol_op_name(&self) -> &'static str {
        "Search Result Entry"
    }

    /// Returns true if the attributes have not been derived from the source entry yet
    pub fn is_entry_backed(&self) -> bool {
        matches!(self.source, AttributeSource::Entry(_))
    }

    /// Return the wire attributes of this op, deriving them from the source entry on first call.
    /// The returned list may be altered by the caller.
    pub fn attributes(&mut self) -> &mut Attributes {
        self.source.materialize(self.version)
    }

    fn build_pdu(&mut self) -> SearchResultEntryPdu {
        let object_name = Bytes::from(self.dn.as_str().to_owned());

        if let (AttributeSource::Entry(entry), ProtocolVersion::V3) = (&self.source, self.version) {
            trace!("Encoding attributes of {} directly from the entry", self.dn);
            return SearchResultEntryPdu {
                object_name,
                attributes: entry.all_attributes().map(|attr| AttributePdu::from(&*attr)).collect(),
            };
        }

        SearchResultEntryPdu {
            object_name,
            attributes: self.attributes().iter().map(AttributePdu::from).collect(),
        }
    }

    /// BER encode this op into the sink. On failure the sink may hold a partial write.
    pub fn encode<W: io::Write>(&mut self, mut sink: W) -> Result<()> {
        let encoded = codec::encode(&self.build_pdu())?;
        sink.write_all(&encoded)?;
        Ok(())
    }

    /// BER encode this op into a buffer
    pub fn to_bytes(&mut self) -> Result<Bytes> {
        Ok(codec::encode(&self.build_pdu())?.into())
    }

    /// Convert this op into a directory entry, resolving names through the schema.
    ///
    /// An op created from an entry whose attributes were never read returns that same entry.
    pub fn to_entry<S: Schema + ?Sized>(&mut self, schema: &S) -> Result<Arc<Entry>> {
        if let AttributeSource::Entry(entry) = &self.source {
            return Ok(entry.clone());
        }

        let mut entry = Entry::new(self.dn.clone());

        for attribute in self.attributes().iter() {
            let description = AttributeDescription::parse(&attribute.name)?;
            let attr_type = schema.attribute_type(description.name())?;

            if attr_type.is_object_class() {
                for value in &attribute.values {
                    let class_name = str::from_utf8(value).map_err(|_| {
                        Error::Protocol(format!("object class name in {} is not valid UTF-8", description))
                    })?;
                    let class = schema.object_class(class_name)?;
                    entry.add_object_class(class, class_name);
                }
            } else {
                let values = attribute.values.iter().cloned();
                entry.add_attribute(EntryAttribute::new(attr_type, values).with_description(description))?;
            }
        }

        debug!(
            "Reconstructed entry {}: {} object classes, {} user and {} operational attribute types",
            entry.dn(),
            entry.object_classes().count(),
            entry.user_attributes().count(),
            entry.operational_attributes().count()
        );

        Ok(Arc::new(entry))
    }

    /// Render this op as an LDIF record, wrapping lines at the given column (0 disables wrapping).
    /// The record ends with a blank line.
    pub fn to_ldif(&mut self, wrap_column: usize) -> String {
        let mut buffer = String::new();
        ldif::write_line(&mut buffer, "dn", self.dn.as_bytes(), wrap_column);

        for attribute in self.attributes().iter() {
            for value in &attribute.values {
                ldif::write_line(&mut buffer, &attribute.name, value, wrap_column);
            }
        }

        buffer.push('\n');
        buffer
    }

    /// Write this op as an LDIF record into the sink
    pub fn write_ldif<W: io::Write>(&mut self, mut sink: W, wrap_column: usize) -> Result<()> {
        sink.write_all(self.to_ldif(wrap_column).as_bytes())?;
        Ok(())
    }

    /// Append a single-line representation of this op to the buffer
    pub fn to_debug_string(&mut self, buffer: &mut String) {
        buffer.push_str("SearchResultEntry(dn=");
        buffer.push_str(self.dn.as_str());
        buffer.push_str(", attrs={");

        let attributes = self
            .attributes()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        buffer.push_str(&attributes);

        buffer.push_str("})");
    }

    /// Append a multi-line representation of this op to the buffer, indented by the given number of spaces
    pub fn to_debug_string_indented(&mut self, buffer: &mut String, indent: usize) {
        let pad = " ".repeat(indent);

        buffer.push_str(&format!("{}Search Result Entry\n", pad));
        buffer.push_str(&format!("{}  DN:  {}\n", pad, self.dn));
        buffer.push_str(&format!("{}  Attributes:\n", pad));

        let attr_pad = " ".repeat(indent + 4);
        for attribute in self.attributes().iter() {
            buffer.push_str(&format!("{}LDAP Attribute\n", attr_pad));
            buffer.push_str(&format!("{}  Attribute Type:  {}\n", attr_pad, attribute.name));
            buffer.push_str(&format!("{}  Attribute Values:\n", attr_pad));
            for value in &attribute.values {
                buffer.push_str(&format!("{}    {}\n", attr_pad, String::from_utf8_lossy(value)));
            }
        }
    }
}

impl TryFrom<SearchResultEntryPdu> for SearchResultEntryOp {
    type Error = Error;

    fn try_from(pdu: SearchResultEntryPdu) -> Result<Self> {
        let dn = Dn::try_from(pdu.object_name)?;
        let attributes = pdu
            .attributes
            .into_iter()
            .map(Attribute::try_from)
            .collect::<Result<Attributes>>()?;
        Ok(Self::with_attributes(dn, attributes))
    }
}

impl TryFrom<rasn_ldap::SearchResultEntry> for SearchResultEntryOp {
    type Error = Error;

    fn try_from(raw: rasn_ldap::SearchResultEntry) -> Result<Self> {
        let dn = Dn::try_from(Bytes::from(raw.object_name.0))?;
        let attributes = raw
            .attributes
            .into_iter()
            .map(Attribute::try_from)
            .collect::<Result<Attributes>>()?;
        Ok(Self::with_attributes(dn, attributes))
    }
}

/// Search result entry op builder, for ops carrying an explicit attribute list
#[derive(Default)]
pub struct SearchResultEntryBuilder {
    dn: Dn,
    version: ProtocolVersion,
    attributes: Attributes,
}

impl SearchResultEntryBuilder {
    pub fn new() -> Self {
        SearchResultEntryBuilder::default()
    }

    pub fn dn<D: Into<Dn>>(mut self, dn: D) -> Self {
        self.dn = dn.into();
        self
    }

    pub fn version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attributes<I>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = Attribute>,
    {
        self.attributes.extend(attributes);
        self
    }

    pub fn build(self) -> SearchResultEntryOp {
        SearchResultEntryOp {
            dn: self.dn,
            version: self.version,
            source: AttributeSource::Attributes(self.attributes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeType, CoreSchema, ObjectClass};

    fn lang(tag: &str) -> crate::description::OptionSet {
        [format!("lang-{}", tag)].into_iter().collect()
    }

    fn sample_entry() -> Entry {
        let schema = CoreSchema::default();
        let cn = schema.attribute_type("cn").unwrap();
        let mut entry = Entry::new("cn=Babs Jensen,dc=example,dc=com");
        entry.add_object_class(schema.object_class("top").unwrap(), "top");
        entry.add_object_class(schema.object_class("person").unwrap(), "person");
        entry.add_attribute(EntryAttribute::new(cn.clone(), ["Babs Jensen"])).unwrap();
        entry.add_attribute(EntryAttribute::new(cn, ["Barbara"]).with_options(lang("en"))).unwrap();
        entry.add_attribute(EntryAttribute::new(schema.attribute_type("sn").unwrap(), ["Jensen"])).unwrap();
        entry.add_attribute(EntryAttribute::new(
            schema.attribute_type("modifiersName").unwrap(),
            ["cn=Directory Manager"],
        )).unwrap();
        entry
    }

    #[test]
    fn test_materialization_is_one_shot() {
        let mut op = SearchResultEntryOp::from_entry(sample_entry());
        assert!(op.is_entry_backed());

        let first = op.attributes().clone();
        assert!(!op.is_entry_backed());
        op.attributes().push(Attribute::new("description", ["added"]));

        let second = op.attributes();
        assert_eq!(second.len(), first.len() + 1);
        assert_eq!(&second[..first.len()], &first[..]);
    }

    #[test]
    fn test_to_entry_identity_shortcut() {
        let entry = Arc::new(sample_entry());
        let mut op = SearchResultEntryOp::from_entry(entry.clone());
        let result = op.to_entry(&CoreSchema::strict()).unwrap();
        assert!(Arc::ptr_eq(&entry, &result));
        assert!(op.is_entry_backed());
    }

    #[test]
    fn test_to_entry_round_trip_v3() {
        let entry = sample_entry();
        let mut op = SearchResultEntryOp::from_entry(entry.clone());
        op.attributes();
        let rebuilt = op.to_entry(&CoreSchema::default()).unwrap();
        assert_eq!(*rebuilt, entry);
    }

    #[test]
    fn test_to_entry_merges_same_options() {
        let mut op = SearchResultEntryOp::builder()
            .dn("cn=test")
            .attribute(Attribute::new("cn;lang-en", ["A"]))
            .attribute(Attribute::new("commonName;LANG-EN", ["B"]))
            .attribute(Attribute::new("cn", ["C"]))
            .attribute(Attribute::new("createTimestamp", ["20240101000000Z"]))
            .attribute(Attribute::new("objectClass", ["top", "Person"]))
            .build();
        let entry = op.to_entry(&CoreSchema::default()).unwrap();

        let cn = entry.attribute(&AttributeType::user("cn")).unwrap();
        assert_eq!(cn.len(), 2);
        assert_eq!(cn[0].values(), &[Bytes::from("A"), Bytes::from("B")]);
        assert_eq!(cn[1].values(), &[Bytes::from("C")]);

        assert_eq!(entry.operational_attributes().count(), 1);
        assert!(entry.has_object_class(&ObjectClass::new("person")));
        let names = entry.object_classes().map(|(_, n)| n).collect::<Vec<_>>();
        assert_eq!(names, vec!["top", "Person"]);
    }

    #[test]
    fn test_to_entry_rejects_bad_description() {
        let mut op = SearchResultEntryOp::with_attributes(
            "cn=test",
            vec![Attribute::new("cn", ["ok"]), Attribute::new("bad name;", ["x"])],
        );
        assert!(matches!(op.to_entry(&CoreSchema::default()), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_to_entry_unknown_type_strict() {
        let mut op = SearchResultEntryOp::with_attributes("cn=test", vec![Attribute::new("x-custom", ["v"])]);
        assert!(matches!(op.to_entry(&CoreSchema::strict()), Err(Error::Schema(_))));
    }

    #[test]
    fn test_v3_direct_encoding_matches_materialized() {
        let mut direct = SearchResultEntryOp::from_entry(sample_entry());
        let direct_bytes = direct.to_bytes().unwrap();
        assert!(direct.is_entry_backed());

        let mut materialized = SearchResultEntryOp::from_entry(sample_entry());
        materialized.attributes();
        assert_eq!(materialized.to_bytes().unwrap(), direct_bytes);
    }

    #[test]
    fn test_v2_encoding_materializes() {
        let mut op = SearchResultEntryOp::from_entry_with_version(sample_entry(), ProtocolVersion::V2);
        let bytes = op.to_bytes().unwrap();
        assert!(!op.is_entry_backed());

        let mut decoded = SearchResultEntryOp::decode(&bytes).unwrap();
        assert_eq!(decoded.dn().as_str(), "cn=Babs Jensen,dc=example,dc=com");
        assert_eq!(
            *decoded.attributes(),
            vec![
                Attribute::new("cn", ["Babs Jensen", "Barbara"]),
                Attribute::new("sn", ["Jensen"]),
                Attribute::new("modifiersName", ["cn=Directory Manager"]),
            ]
        );
    }

    #[test]
    fn test_encode_io_error() {
        struct FailingSink;

        impl io::Write for FailingSink {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut op = SearchResultEntryOp::from_entry(sample_entry());
        assert!(matches!(op.encode(FailingSink), Err(Error::Io(_))));

        let mut buf = Vec::new();
        op.encode(&mut buf).unwrap();
        assert_eq!(buf[0], op.protocol_op_type());
    }

    #[test]
    fn test_from_rasn_ldap_entry() {
        let bytes = SearchResultEntryOp::with_attributes("dc=example", vec![Attribute::new("dc", ["example"])])
            .to_bytes()
            .unwrap();
        let raw = rasn::ber::decode::<rasn_ldap::SearchResultEntry>(&bytes).unwrap();
        let mut op = SearchResultEntryOp::try_from(raw).unwrap();
        assert_eq!(op.dn().as_str(), "dc=example");
        assert_eq!(*op.attributes(), vec![Attribute::new("dc", ["example"])]);
    }

    fn raw_pdu(object_name: &'static [u8], attr_type: &'static [u8]) -> Vec<u8> {
        codec::encode(&SearchResultEntryPdu {
            object_name: Bytes::from_static(object_name),
            attributes: vec![AttributePdu {
                r#type: Bytes::from_static(attr_type),
                vals: vec![Bytes::from_static(b"x")],
            }],
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_utf8_rejected_on_every_decode_path() {
        for bytes in [raw_pdu(b"\xff", b"cn"), raw_pdu(b"dc=example", b"c\xffn")] {
            assert!(matches!(SearchResultEntryOp::decode(&bytes), Err(Error::Protocol(_))));

            let raw = rasn::ber::decode::<rasn_ldap::SearchResultEntry>(&bytes).unwrap();
            assert!(matches!(SearchResultEntryOp::try_from(raw), Err(Error::Protocol(_))));
        }
    }

    #[test]
    fn test_to_entry_malformed_object_class() {
        let mut op = SearchResultEntryOp::with_attributes("cn=test", vec![Attribute::new("objectClass", ["not a class"])]);
        assert!(matches!(op.to_entry(&CoreSchema::default()), Err(Error::Protocol(_))));

        let mut op = SearchResultEntryOp::with_attributes("cn=test", vec![Attribute::new("objectClass", [&b"\xff"[..]])]);
        assert!(matches!(op.to_entry(&CoreSchema::default()), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_debug_string() {
        let mut op = SearchResultEntryOp::with_attributes(
            "dc=example",
            vec![Attribute::new("dc", ["example"]), Attribute::new("ou", ["a", "b"])],
        );
        let mut buffer = String::new();
        op.to_debug_string(&mut buffer);
        assert_eq!(
            buffer,
            "SearchResultEntry(dn=dc=example, attrs={Attribute(type=dc, values={example}), \
             Attribute(type=ou, values={a, b})})"
        );

        let mut empty = String::new();
        SearchResultEntryOp::new("dc=example").to_debug_string(&mut empty);
        assert_eq!(empty, "SearchResultEntry(dn=dc=example, attrs={})");
    }

    #[test]
    fn test_debug_string_indented() {
        let mut op = SearchResultEntryOp::with_attributes("dc=example", vec![Attribute::new("ou", ["a", "b"])]);
        let mut buffer = String::new();
        op.to_debug_string_indented(&mut buffer, 2);
        assert_eq!(
            buffer,
            "  Search Result Entry\n\
             \x20   DN:  dc=example\n\
             \x20   Attributes:\n\
             \x20     LDAP Attribute\n\
             \x20       Attribute Type:  ou\n\
             \x20       Attribute Values:\n\
             \x20         a\n\
             \x20         b\n"
        );
    }
}
