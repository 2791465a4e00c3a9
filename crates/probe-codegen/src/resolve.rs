//! Type resolution for protocol field shapes.
//!
//! Translates a field's declared primitive kind or `$ref` into a concrete
//! [`ResolvedType`] descriptor suitable for code emission. Resolution is a
//! pure function over the [`ProtocolIndex`]; it never re-scans the
//! description.
//!
//! # Pipeline Position
//!
//! ```text
//! Parse → Index → Type Resolution → Binding Emission
//!                 ^^^^^^^^^^^^^^^
//!                  YOU ARE HERE
//! ```

use probe_schema::{Domain, Field, Items, ProtocolIndex, TypeShape};

use crate::error::{GenError, Result};

/// Concrete type descriptor produced by resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedType {
    /// `number` — IEEE double on the wire.
    Float64,
    /// `string`.
    String,
    /// `integer` — 32-bit signed.
    Integer,
    /// `boolean`.
    Boolean,
    /// `any` — opaque JSON value.
    Any,
    /// `object` with no declared properties — string-keyed map of opaque
    /// JSON values.
    JsonMap,
    /// `array` with the resolved element type.
    Array(Box<ResolvedType>),
    /// Reference to a generated struct or enum declaration.
    Decl {
        /// Domain owning the declaration.
        domain: String,
        /// Type id within the owning domain.
        id: String,
        /// Whether the reference crosses domains and must be
        /// namespace-qualified at the use site.
        qualified: bool,
    },
}

/// A resolved field: the concrete type plus wire nullability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    pub ty: ResolvedType,
    /// Mirrors the source field's optional flag exactly.
    pub optional: bool,
}

/// Resolves a field declared in `current` into a concrete descriptor.
pub fn resolve_field(
    index: &ProtocolIndex<'_>,
    current: &Domain,
    field: &Field,
) -> Result<FieldType> {
    let ty = match field.shape() {
        Some(TypeShape::Reference(reference)) => {
            resolve_ref(index, current, current, &field.name, reference)?
        }
        Some(TypeShape::Primitive(kind)) => {
            resolve_primitive(index, current, current, &field.name, kind, field.items.as_ref())?
        }
        None => {
            return Err(GenError::MissingTypeShape {
                domain: current.domain.clone(),
                field: field.name.clone(),
            });
        }
    };

    Ok(FieldType {
        ty,
        optional: field.optional,
    })
}

/// Resolves a `$ref` target, bare or `Domain.TypeId`-qualified.
///
/// A reference to a struct or enum type becomes a [`ResolvedType::Decl`];
/// a reference to an alias chases the alias's own primitive mapping.
pub fn resolve_reference(
    index: &ProtocolIndex<'_>,
    current: &Domain,
    field_name: &str,
    reference: &str,
) -> Result<ResolvedType> {
    resolve_ref(index, current, current, field_name, reference)
}

/// Reference resolution with the declaring domain and the lookup scope
/// tracked separately.
///
/// `declaring` is the domain the original field lives in: it decides
/// namespace qualification and is named in error reports. `scope` is where
/// bare references are looked up; alias chasing moves the scope to the
/// alias's owning domain while the declaring domain stays put.
fn resolve_ref(
    index: &ProtocolIndex<'_>,
    declaring: &Domain,
    scope: &Domain,
    field_name: &str,
    reference: &str,
) -> Result<ResolvedType> {
    let (owner, type_id) = match reference.split_once('.') {
        Some((domain_name, type_id)) => {
            let owner = index.domain(domain_name).ok_or_else(|| GenError::UnresolvedDomain {
                domain: declaring.domain.clone(),
                field: field_name.to_string(),
                target: domain_name.to_string(),
                reference: reference.to_string(),
            })?;
            (owner, type_id)
        }
        None => (scope, reference),
    };

    let def = index
        .type_in(&owner.domain, type_id)
        .ok_or_else(|| GenError::UnresolvedType {
            domain: declaring.domain.clone(),
            field: field_name.to_string(),
            reference: reference.to_string(),
        })?;

    if def.is_struct() || def.is_enum() {
        return Ok(ResolvedType::Decl {
            domain: owner.domain.clone(),
            id: def.id.clone(),
            qualified: owner.domain != declaring.domain,
        });
    }

    // Alias: no declaration of its own; recurse into the alias's own
    // primitive mapping, resolving its bare references in its own domain.
    resolve_primitive(index, declaring, owner, field_name, &def.kind, def.items.as_ref())
}

/// Maps a primitive kind tag directly, resolving array element shapes.
fn resolve_primitive(
    index: &ProtocolIndex<'_>,
    declaring: &Domain,
    scope: &Domain,
    field_name: &str,
    kind: &str,
    items: Option<&Items>,
) -> Result<ResolvedType> {
    let ty = match kind {
        "number" => ResolvedType::Float64,
        "string" => ResolvedType::String,
        "integer" => ResolvedType::Integer,
        "boolean" => ResolvedType::Boolean,
        "any" => ResolvedType::Any,
        "object" => ResolvedType::JsonMap,
        "array" => {
            let element = match items {
                Some(Items {
                    reference: Some(reference),
                    ..
                }) => resolve_ref(index, declaring, scope, field_name, reference)?,
                Some(Items {
                    kind: Some(item_kind),
                    ..
                }) => resolve_primitive(index, declaring, scope, field_name, item_kind, None)?,
                _ => {
                    return Err(GenError::UnknownArrayItemShape {
                        domain: declaring.domain.clone(),
                        field: field_name.to_string(),
                    });
                }
            };
            ResolvedType::Array(Box::new(element))
        }
        other => {
            return Err(GenError::UnmappedPrimitiveKind {
                domain: declaring.domain.clone(),
                field: field_name.to_string(),
                kind: other.to_string(),
            });
        }
    };
    Ok(ty)
}
