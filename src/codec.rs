use log::{error, trace};
use rasn::{ber, prelude::*};

use crate::{
    entry::EntryAttribute,
    error::Error,
    model::{utf8_string, Attribute},
};

/// SearchResultEntry ::= [APPLICATION 4] SEQUENCE { objectName LDAPDN, attributes PartialAttributeList }
#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq, Eq)]
#[rasn(tag(application, 4))]
pub(crate) struct SearchResultEntryPdu {
    pub object_name: OctetString,
    pub attributes: Vec<AttributePdu>,
}

/// PartialAttribute ::= SEQUENCE { type AttributeDescription, vals SET OF AttributeValue }
#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttributePdu {
    pub r#type: OctetString,
    // SET OF on the wire, values are written in the order given
    #[rasn(tag(universal, 17))]
    pub vals: Vec<OctetString>,
}

impl From<&Attribute> for AttributePdu {
    fn from(attr: &Attribute) -> Self {
        AttributePdu {
            r#type: attr.name.clone().into(),
            vals: attr.values.clone(),
        }
    }
}

impl From<&EntryAttribute> for AttributePdu {
    fn from(attr: &EntryAttribute) -> Self {
        AttributePdu {
            r#type: OctetString::copy_from_slice(attr.description().as_bytes()),
            vals: attr.values().to_vec(),
        }
    }
}

impl TryFrom<AttributePdu> for Attribute {
    type Error = Error;

    fn try_from(raw: AttributePdu) -> Result<Self, Self::Error> {
        Ok(Attribute {
            name: utf8_string(raw.r#type, "attribute description")?,
            values: raw.vals,
        })
    }
}

pub(crate) fn encode(pdu: &SearchResultEntryPdu) -> Result<Vec<u8>, Error> {
    let encoded = ber::encode(pdu)?;
    trace!("Encoded search result entry: {} bytes", encoded.len());
    Ok(encoded)
}

pub(crate) fn decode(src: &[u8]) -> Result<SearchResultEntryPdu, Error> {
    match ber::decode::<SearchResultEntryPdu>(src) {
        Ok(pdu) => {
            trace!("Decoded search result entry with {} attributes", pdu.attributes.len());
            Ok(pdu)
        }
        Err(e) => {
            error!("Decoder error: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn sample() -> SearchResultEntryPdu {
        SearchResultEntryPdu {
            object_name: Bytes::from_static(b"dc=x"),
            attributes: vec![AttributePdu {
                r#type: Bytes::from_static(b"cn"),
                vals: vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")],
            }],
        }
    }

    const SAMPLE_BER: &[u8] = &[
        0x64, 0x16, // [APPLICATION 4]
        0x04, 0x04, b'd', b'c', b'=', b'x', // objectName
        0x30, 0x0e, // attributes
        0x30, 0x0c, // attribute
        0x04, 0x02, b'c', b'n', // type
        0x31, 0x06, 0x04, 0x01, b'a', 0x04, 0x01, b'b', // vals
    ];

    #[test]
    fn test_encode_layout() {
        assert_eq!(encode(&sample()).unwrap(), SAMPLE_BER);
        assert_eq!(SAMPLE_BER[0], crate::oid::OP_TYPE_SEARCH_RESULT_ENTRY);
    }

    #[test]
    fn test_decode_layout() {
        assert_eq!(decode(SAMPLE_BER).unwrap(), sample());
    }

    #[test]
    fn test_value_order_preserved() {
        let mut pdu = sample();
        pdu.attributes[0].vals.reverse();
        let decoded = decode(&encode(&pdu).unwrap()).unwrap();
        assert_eq!(decoded.attributes[0].vals, vec![Bytes::from_static(b"b"), Bytes::from_static(b"a")]);
    }

    #[test]
    fn test_decode_rasn_ldap_compatible() {
        let entry = ber::decode::<rasn_ldap::SearchResultEntry>(SAMPLE_BER).unwrap();
        assert_eq!(entry.object_name.as_bytes(), b"dc=x");
        assert_eq!(entry.attributes.len(), 1);
        assert_eq!(entry.attributes[0].r#type.as_bytes(), b"cn");
    }

    #[test]
    fn test_attribute_type_must_be_utf8() {
        let mut pdu = sample();
        assert_eq!(Attribute::try_from(pdu.attributes[0].clone()).unwrap(), Attribute::new("cn", ["a", "b"]));

        pdu.attributes[0].r#type = Bytes::from_static(b"c\xffn");
        let decoded = decode(&encode(&pdu).unwrap()).unwrap();
        assert!(matches!(
            Attribute::try_from(decoded.attributes[0].clone()),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn test_decode_truncated() {
        assert!(matches!(decode(&SAMPLE_BER[..10]), Err(Error::AsnDecode(_))));
    }
}
