//! OID definitions

/// objectClass attribute type
pub const OBJECT_CLASS_OID: &str = "2.5.4.0";

/// BER type of the search result entry protocol op, `[APPLICATION 4]` constructed
pub const OP_TYPE_SEARCH_RESULT_ENTRY: u8 = 0x64;
