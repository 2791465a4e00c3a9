//! # probe-codegen
//!
//! Schema-to-binding compiler for JSON-described remote-debugging
//! protocols.
//!
//! Walks a protocol description (domains containing type definitions,
//! commands, and events, with cross-domain type references) and produces
//! Rust source for typed data structures, typed command-invocation methods,
//! and typed event streams. The generated code executes against the
//! `probe-rpc` runtime.
//!
//! ## Architecture
//!
//! ```text
//! probe-schema     - data model + ProtocolIndex
//!     ↓
//! resolve          - field shape → concrete type descriptor
//!     ↓
//! emit             - descriptors → quote! token streams → source text
//! ```
//!
//! Generation is all-or-nothing: any unresolvable reference, unmapped kind,
//! or identifier collision aborts the run with a [`GenError`] naming the
//! offending domain and field, and nothing is emitted.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let domains = probe_schema::parse_domains(&json)?;
//! let source = probe_codegen::generate(&domains)?;
//! std::fs::write("bindings.rs", source)?;
//! ```

mod emit;
mod error;
mod idents;
mod resolve;

pub use emit::{emit_domain, generate};
pub use error::{GenError, Result};
pub use idents::{field_ident, method_ident, module_ident, type_ident, variant_ident};
pub use resolve::{resolve_field, resolve_reference, FieldType, ResolvedType};
