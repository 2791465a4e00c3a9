//! Schema model for JSON-described remote-debugging protocols.
//!
//! A protocol description is a list of *domains*, each grouping related type
//! definitions, commands, and events. This crate deserializes that
//! description into an immutable in-memory model and builds the
//! [`ProtocolIndex`] that later passes use to resolve cross-domain type
//! references.
//!
//! # Pipeline Position
//!
//! ```text
//! Parse → Index → Type Resolution → Binding Emission
//! ^^^^^^^^^^^^^
//! YOU ARE HERE
//! ```
//!
//! The raw description is expected to already be parsed JSON text; fetching
//! it from a live browser or a vendored pinning is the caller's concern.

mod index;
mod model;

pub use index::{ProtocolIndex, SchemaError};
pub use model::{Command, Domain, Event, Field, Items, TypeDef, TypeShape};

/// Result type alias for schema loading operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Parses a protocol description from JSON text.
///
/// Accepts either a bare array of domain records or the conventional
/// `{"version": …, "domains": [...]}` wrapper object.
pub fn parse_domains(json: &str) -> Result<Vec<Domain>> {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        domains: Vec<Domain>,
    }

    let value: serde_json::Value = serde_json::from_str(json)?;
    let domains = if value.is_array() {
        serde_json::from_value::<Vec<Domain>>(value)?
    } else {
        serde_json::from_value::<Wrapper>(value)?.domains
    };
    Ok(domains)
}
