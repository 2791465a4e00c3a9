//! Immutable lookup index over a full protocol description.

use indexmap::IndexMap;
use std::collections::HashMap;
use thiserror::Error;

use crate::model::{Domain, TypeDef};

/// Errors raised while loading or indexing a protocol description.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The description text is not valid JSON or does not match the
    /// expected record shapes.
    #[error("malformed protocol description: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two domains share a name; domain names are the identity of the
    /// namespace and must be unique across the description set.
    #[error("duplicate domain '{0}' in protocol description")]
    DuplicateDomain(String),

    /// Two type definitions within one domain share an id.
    #[error("duplicate type id '{id}' in domain '{domain}'")]
    DuplicateTypeId { domain: String, id: String },
}

/// Index mapping `(domain name, type id)` to type definitions.
///
/// Built once from the full domain list before resolution begins; type
/// resolution is a pure function over this index, never a re-scan of the
/// description. Domains iterate in declaration order.
#[derive(Debug)]
pub struct ProtocolIndex<'a> {
    domains: IndexMap<&'a str, &'a Domain>,
    types: HashMap<(&'a str, &'a str), &'a TypeDef>,
}

impl<'a> ProtocolIndex<'a> {
    /// Builds the index, rejecting duplicate domain names and duplicate
    /// type ids within a domain.
    pub fn build(domains: &'a [Domain]) -> Result<Self, SchemaError> {
        let mut domain_map = IndexMap::with_capacity(domains.len());
        let mut types = HashMap::new();

        for domain in domains {
            if domain_map.insert(domain.domain.as_str(), domain).is_some() {
                return Err(SchemaError::DuplicateDomain(domain.domain.clone()));
            }
            for def in &domain.types {
                let key = (domain.domain.as_str(), def.id.as_str());
                if types.insert(key, def).is_some() {
                    return Err(SchemaError::DuplicateTypeId {
                        domain: domain.domain.clone(),
                        id: def.id.clone(),
                    });
                }
            }
        }

        Ok(Self {
            domains: domain_map,
            types,
        })
    }

    /// Looks up a domain by exact name.
    pub fn domain(&self, name: &str) -> Option<&'a Domain> {
        self.domains.get(name).copied()
    }

    /// Looks up a type definition by owning domain and id.
    pub fn type_in(&self, domain: &str, id: &str) -> Option<&'a TypeDef> {
        self.types.get(&(domain, id)).copied()
    }

    /// Iterates domains in declaration order.
    pub fn domains(&self) -> impl Iterator<Item = &'a Domain> + '_ {
        self.domains.values().copied()
    }

    /// Number of indexed domains.
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Tests whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_domains;

    fn sample() -> Vec<Domain> {
        parse_domains(
            r#"[
                {"domain": "Network", "types": [
                    {"id": "Cookie", "type": "object",
                     "properties": [{"name": "name", "type": "string"}]},
                    {"id": "Headers", "type": "object"}
                ]},
                {"domain": "Page", "dependencies": ["Network"], "types": [
                    {"id": "FrameId", "type": "string"}
                ]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn lookup_by_domain_and_id() {
        let domains = sample();
        let index = ProtocolIndex::build(&domains).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.domain("Network").unwrap().domain, "Network");
        assert!(index.domain("network").is_none(), "lookup is exact-name");
        assert_eq!(index.type_in("Network", "Cookie").unwrap().id, "Cookie");
        assert!(index.type_in("Page", "Cookie").is_none());
    }

    #[test]
    fn domains_iterate_in_declaration_order() {
        let domains = sample();
        let index = ProtocolIndex::build(&domains).unwrap();
        let names: Vec<_> = index.domains().map(|d| d.domain.as_str()).collect();
        assert_eq!(names, vec!["Network", "Page"]);
    }

    #[test]
    fn duplicate_domain_is_rejected() {
        let domains = parse_domains(r#"[{"domain": "Page"}, {"domain": "Page"}]"#).unwrap();
        let err = ProtocolIndex::build(&domains).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateDomain(name) if name == "Page"));
    }

    #[test]
    fn duplicate_type_id_is_rejected() {
        let domains = parse_domains(
            r#"[{"domain": "Page", "types": [
                {"id": "FrameId", "type": "string"},
                {"id": "FrameId", "type": "integer"}
            ]}]"#,
        )
        .unwrap();
        let err = ProtocolIndex::build(&domains).unwrap_err();
        assert!(
            matches!(err, SchemaError::DuplicateTypeId { domain, id } if domain == "Page" && id == "FrameId")
        );
    }
}
