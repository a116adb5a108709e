#![doc = include_str!("../README.md")]

pub use bytes;
pub use rasn_ldap;

pub use description::{AttributeDescription, OptionSet};
pub use entry::*;
pub use error::Error;
pub use ldif::DEFAULT_WRAP_COLUMN;
pub use model::*;
pub use request::*;
pub use schema::*;

pub(crate) mod codec;
pub(crate) mod view;

pub mod description;
pub mod entry;
pub mod error;
pub mod ldif;
pub mod model;
pub mod oid;
pub mod request;
pub mod schema;
