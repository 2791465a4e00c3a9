//! Deterministic identifier transforms for generated declarations.
//!
//! Wire spellings are never changed by these transforms; serialized forms
//! are pinned with `#[serde(rename = …)]` at the emission site. The
//! transforms only pick the in-language identifier.

/// Rust keywords that cannot be used as raw field or module identifiers.
///
/// Colliding names take a trailing underscore; the wire name survives via a
/// serde rename.
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while",
    // reserved for future use; equally unusable as identifiers
    "abstract", "become", "box", "do", "final", "macro", "override", "priv", "try", "typeof",
    "unsized", "virtual", "yield",
];

fn escape_keyword(mut ident: String) -> String {
    if KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

/// Lower-snake-case transform: `createTarget` → `create_target`,
/// `targetURL` → `target_url`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if i > 0 && (prev_lower || next_lower) && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else if c.is_alphanumeric() || c == '_' {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out
}

/// Upper-camel-case transform; every non-alphanumeric character acts as a
/// segment separator: `before-unload` → `BeforeUnload`, `createTarget` →
/// `CreateTarget`.
pub fn upper_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for segment in name.split(|c: char| !c.is_alphanumeric()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Field identifier: snake-cased, keyword-escaped.
pub fn field_ident(name: &str) -> String {
    escape_keyword(snake_case(name))
}

/// Method identifier for a command or event accessor.
pub fn method_ident(name: &str) -> String {
    escape_keyword(snake_case(name))
}

/// Module identifier for a domain namespace.
pub fn module_ident(domain: &str) -> String {
    escape_keyword(snake_case(domain))
}

/// Type identifier for a generated declaration.
pub fn type_ident(name: &str) -> String {
    upper_camel(name)
}

/// Variant identifier for an enum literal. Digit-leading results take a `V`
/// prefix so the literal `"3d"` stays representable.
pub fn variant_ident(literal: &str) -> String {
    let camel = upper_camel(literal);
    if camel.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("V{camel}")
    } else {
        camel
    }
}
