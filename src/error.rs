//! Errors

use std::io;

use rasn::ber;
use thiserror::Error;

/// Errors raised while encoding, decoding or reconstructing a search result entry
#[derive(Debug, Error)]
pub enum Error {
    /// The byte sink rejected a write. Whatever was written so far must be discarded.
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0:?}")]
    AsnDecode(ber::de::DecodeError),
    #[error("{0:?}")]
    AsnEncode(ber::enc::EncodeError),
    /// An attribute type or object class name could not be resolved
    #[error("Schema error: {0}")]
    Schema(String),
    /// Malformed attribute description, DN or PDU shape
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl From<ber::de::DecodeError> for Error {
    fn from(e: ber::de::DecodeError) -> Self {
        Error::AsnDecode(e)
    }
}

impl From<ber::enc::EncodeError> for Error {
    fn from(e: ber::enc::EncodeError) -> Self {
        Error::AsnEncode(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
