//! Generation-time error reporting.
//!
//! Every variant is fatal to the generation run: the generator stops at the
//! first error and emits nothing, so a bad description can never produce
//! partial or invalid bindings. Each variant carries the owning domain and
//! field so the offending identifier can be found in the description.

use probe_schema::SchemaError;
use thiserror::Error;

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, GenError>;

/// Errors that abort a binding-generation run.
#[derive(Debug, Error)]
pub enum GenError {
    /// The description failed to load or index.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A `$ref` names a domain that does not exist in the description.
    #[error("unresolved domain '{target}' in $ref '{reference}' at {domain}.{field}")]
    UnresolvedDomain {
        /// Domain declaring the referencing field.
        domain: String,
        /// Field carrying the reference.
        field: String,
        /// Domain name the reference points at.
        target: String,
        /// The full reference string as written.
        reference: String,
    },

    /// A `$ref` names a type id that does not exist in its target domain.
    #[error("unresolved type in $ref '{reference}' at {domain}.{field}")]
    UnresolvedType {
        domain: String,
        field: String,
        reference: String,
    },

    /// An array field or array alias carries no usable element descriptor.
    #[error("array item for {domain}.{field} carries neither $ref nor type")]
    UnknownArrayItemShape { domain: String, field: String },

    /// A primitive kind tag outside the supported set.
    #[error("unmapped primitive kind '{kind}' at {domain}.{field}")]
    UnmappedPrimitiveKind {
        domain: String,
        field: String,
        kind: String,
    },

    /// A field carries neither a primitive kind nor a reference.
    #[error("field {domain}.{field} carries neither a type nor a $ref")]
    MissingTypeShape { domain: String, field: String },

    /// Two generated declarations would share one identifier.
    #[error("duplicate generated identifier '{ident}' in module '{module}'")]
    DuplicateGeneratedIdentifier { module: String, ident: String },
}
