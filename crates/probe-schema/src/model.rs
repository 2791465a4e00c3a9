//! In-memory representation of a parsed protocol description.
//!
//! Field names mirror the wire form of the description format exactly
//! (`domain`, `$ref`, `enum`, …); Rust-side names are renamed where the wire
//! name is a keyword or stylistically foreign. All entities are constructed
//! once by serde and are read-only for the remainder of the generation run.

use serde::Deserialize;

/// A named namespace grouping related types, commands, and events.
///
/// Domain names are the identity of the namespace and are unique across the
/// whole description set; [`ProtocolIndex::build`](crate::ProtocolIndex::build)
/// enforces the uniqueness.
#[derive(Debug, Clone, Deserialize)]
pub struct Domain {
    /// Namespace name, e.g. `"Page"` or `"Target"`.
    pub domain: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Names of domains this one references types from.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub commands: Vec<Command>,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// A named type definition belonging to exactly one domain.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeDef {
    /// Type identifier, unique within the owning domain.
    pub id: String,
    /// Primitive kind tag: one of `number`, `string`, `integer`, `boolean`,
    /// `any`, `object`, `array`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Enum literals; only meaningful when `kind` is `string`.
    #[serde(rename = "enum", default)]
    pub enum_values: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Struct fields, in declaration order.
    #[serde(default)]
    pub properties: Vec<Field>,
    /// Element descriptor when `kind` is `array`.
    #[serde(default)]
    pub items: Option<Items>,
}

impl TypeDef {
    /// A struct type carries composite fields and is emitted as a record
    /// declaration.
    pub fn is_struct(&self) -> bool {
        self.kind == "object" && !self.properties.is_empty()
    }

    /// An enum type enumerates fixed string literals and is emitted as a
    /// variant declaration.
    pub fn is_enum(&self) -> bool {
        self.kind == "string" && !self.enum_values.is_empty()
    }

    /// An alias produces no named declaration of its own; it resolves to a
    /// primitive, array, or map shape.
    pub fn is_alias(&self) -> bool {
        !self.is_struct() && !self.is_enum()
    }
}

/// The shared "type or reference" shape used by properties, command
/// parameters, command returns, and event parameters.
///
/// Exactly one of `kind` / `reference` is meaningful; [`Field::shape`] gives
/// the tagged view, with the reference taking precedence when both appear.
#[derive(Debug, Clone, Deserialize)]
pub struct Field {
    pub name: String,
    /// Primitive kind tag, when the field is not a reference.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Cross-reference: a bare type id (same domain) or `Domain.TypeId`.
    #[serde(rename = "$ref", default)]
    pub reference: Option<String>,
    /// Element descriptor when `kind` is `array`.
    #[serde(default)]
    pub items: Option<Items>,
    /// Optional fields are nullable/absent-capable on the wire.
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl Field {
    /// Tagged view over the "exactly one of kind/reference" invariant.
    ///
    /// Returns `None` when the description carries neither; the resolver
    /// reports that as a fatal generation error with field context.
    pub fn shape(&self) -> Option<TypeShape<'_>> {
        if let Some(reference) = &self.reference {
            Some(TypeShape::Reference(reference))
        } else {
            self.kind.as_deref().map(TypeShape::Primitive)
        }
    }
}

/// Either a primitive kind tag or a cross-reference target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeShape<'a> {
    /// A primitive kind tag such as `"string"` or `"array"`.
    Primitive(&'a str),
    /// A `$ref` target, bare or domain-qualified.
    Reference(&'a str),
}

/// Array element descriptor: a nested `$ref` or a nested primitive kind.
#[derive(Debug, Clone, Deserialize)]
pub struct Items {
    #[serde(rename = "$ref", default)]
    pub reference: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// An invokable operation within a domain.
#[derive(Debug, Clone, Deserialize)]
pub struct Command {
    /// Command name, unique within the owning domain.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Field>,
    #[serde(default)]
    pub returns: Vec<Field>,
    /// Domain this command has moved to, when set.
    #[serde(default)]
    pub redirect: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    /// Process classes that handle the command; carried for fidelity with
    /// the source description, not consulted by generation.
    #[serde(default)]
    pub handlers: Vec<String>,
}

/// An unsolicited notification emitted by a domain.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Event name, unique within the owning domain.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Field>,
}
