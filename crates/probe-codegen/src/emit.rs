//! Binding emission for protocol domains.
//!
//! Each domain becomes one generated module holding its struct and enum
//! declarations, command parameter/return containers, a domain accessor with
//! invocation methods, and typed event accessors. A root `Client` struct
//! exposes one accessor method per domain. Declarations are built as
//! [`proc_macro2::TokenStream`]s with `quote!` and rendered to source text;
//! the emitter performs no I/O and never touches a live connection.
//!
//! # Pipeline Position
//!
//! ```text
//! Parse → Index → Type Resolution → Binding Emission
//!                                   ^^^^^^^^^^^^^^^
//!                                    YOU ARE HERE
//! ```

use indexmap::IndexSet;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use probe_schema::{Command, Domain, Event, Field, ProtocolIndex, TypeDef};

use crate::error::{GenError, Result};
use crate::idents;
use crate::resolve::{resolve_field, ResolvedType};

/// Tracks generated identifiers within one enclosing namespace.
///
/// Type declarations and accessor methods live in separate Rust namespaces,
/// so each is tracked on its own; a collision in either is a fatal
/// generation error rather than a silent rename.
struct Namespace {
    module: String,
    types: IndexSet<String>,
    methods: IndexSet<String>,
}

impl Namespace {
    fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            types: IndexSet::new(),
            methods: IndexSet::new(),
        }
    }

    fn claim_type(&mut self, ident: &str) -> Result<()> {
        if !self.types.insert(ident.to_string()) {
            return Err(GenError::DuplicateGeneratedIdentifier {
                module: self.module.clone(),
                ident: ident.to_string(),
            });
        }
        Ok(())
    }

    fn claim_method(&mut self, ident: &str) -> Result<()> {
        if !self.methods.insert(ident.to_string()) {
            return Err(GenError::DuplicateGeneratedIdentifier {
                module: self.module.clone(),
                ident: ident.to_string(),
            });
        }
        Ok(())
    }
}

/// Generates the complete bindings source for a protocol description.
///
/// Builds the [`ProtocolIndex`] once, emits every domain module plus the
/// root client, and renders the result. Any resolution or collision error
/// aborts the run with nothing emitted.
pub fn generate(domains: &[Domain]) -> Result<String> {
    let index = ProtocolIndex::build(domains)?;
    let mut root = Namespace::new("<root>");
    // Hand-written members of the client surface participate in collision
    // detection like everything else.
    root.claim_method("new")?;
    root.claim_method("connection")?;
    let mut modules = TokenStream::new();
    let mut accessor_methods = TokenStream::new();

    for domain in index.domains() {
        modules.extend(emit_domain(&index, domain)?);

        let module_name = idents::module_ident(&domain.domain);
        root.claim_type(&module_name)?;

        let method_name = idents::method_ident(&domain.domain);
        root.claim_method(&method_name)?;
        let module = format_ident!("{}", module_name);
        let method = format_ident!("{}", method_name);
        let accessor = format_ident!("{}", idents::type_ident(&domain.domain));
        let doc = format!("Accessor for the `{}` domain.", domain.domain);
        accessor_methods.extend(quote! {
            #[doc = #doc]
            pub fn #method(&self) -> #module::#accessor<'_> {
                #module::#accessor::new(&self.connection)
            }
        });
    }

    root.claim_type("Client")?;
    let client = quote! {
        /// Typed client over one protocol connection.
        pub struct Client {
            connection: std::sync::Arc<probe_rpc::Connection>,
        }

        impl Client {
            pub fn new(connection: std::sync::Arc<probe_rpc::Connection>) -> Self {
                Self { connection }
            }

            /// The underlying connection, for raw invocations.
            pub fn connection(&self) -> &probe_rpc::Connection {
                &self.connection
            }

            #accessor_methods
        }
    };

    let tokens = quote! {
        #modules
        #client
    };
    Ok(render(&tokens))
}

/// Emits one domain as a module of declarations plus its accessor.
pub fn emit_domain(index: &ProtocolIndex<'_>, domain: &Domain) -> Result<TokenStream> {
    let module_name = idents::module_ident(&domain.domain);
    let mut ns = Namespace::new(&module_name);
    // The accessor's constructor occupies its name before any command can.
    ns.claim_method("new")?;
    let mut decls = TokenStream::new();
    let mut methods = TokenStream::new();

    for def in &domain.types {
        decls.extend(emit_type(&mut ns, index, domain, def)?);
    }
    for command in &domain.commands {
        let (containers, method) = emit_command(&mut ns, index, domain, command)?;
        decls.extend(containers);
        methods.extend(method);
    }
    for event in &domain.events {
        let (container, method) = emit_event(&mut ns, index, domain, event)?;
        decls.extend(container);
        methods.extend(method);
    }

    let accessor_name = idents::type_ident(&domain.domain);
    ns.claim_type(&accessor_name)?;
    let accessor = format_ident!("{}", accessor_name);
    let accessor_doc = format!(
        "Commands and events of the `{}` domain, bound to one connection.",
        domain.domain
    );

    let module = format_ident!("{}", module_name);
    let module_doc = doc_attr(domain.description.as_deref());
    Ok(quote! {
        #module_doc
        pub mod #module {
            #decls

            #[doc = #accessor_doc]
            pub struct #accessor<'a> {
                connection: &'a probe_rpc::Connection,
            }

            impl<'a> #accessor<'a> {
                pub fn new(connection: &'a probe_rpc::Connection) -> Self {
                    Self { connection }
                }

                #methods
            }
        }
    })
}

/// Emits the declaration for one named type, if it produces one.
///
/// Aliases (anything that is neither a struct nor an enum type) resolve
/// structurally at their use sites and emit nothing here.
fn emit_type(
    ns: &mut Namespace,
    index: &ProtocolIndex<'_>,
    domain: &Domain,
    def: &TypeDef,
) -> Result<TokenStream> {
    if def.is_struct() {
        struct_decl(
            ns,
            index,
            domain,
            &idents::type_ident(&def.id),
            &def.properties,
            def.description.as_deref(),
        )
    } else if def.is_enum() {
        enum_decl(
            ns,
            &idents::type_ident(&def.id),
            &def.enum_values,
            def.description.as_deref(),
        )
    } else {
        Ok(TokenStream::new())
    }
}

fn emit_command(
    ns: &mut Namespace,
    index: &ProtocolIndex<'_>,
    domain: &Domain,
    command: &Command,
) -> Result<(TokenStream, TokenStream)> {
    let wire_method = format!("{}.{}", domain.domain, command.name);
    let camel = idents::type_ident(&command.name);
    let mut containers = TokenStream::new();

    let params_ident = if command.parameters.is_empty() {
        None
    } else {
        let name = format!("{camel}Params");
        let doc = format!("Input for `{wire_method}`.");
        containers.extend(struct_decl(
            ns,
            index,
            domain,
            &name,
            &command.parameters,
            Some(&doc),
        )?);
        Some(format_ident!("{}", name))
    };

    let returns_ident = if command.returns.is_empty() {
        None
    } else {
        let name = format!("{camel}Returns");
        let doc = format!("Output of `{wire_method}`.");
        containers.extend(struct_decl(
            ns,
            index,
            domain,
            &name,
            &command.returns,
            Some(&doc),
        )?);
        Some(format_ident!("{}", name))
    };

    let method_name = idents::method_ident(&command.name);
    ns.claim_method(&method_name)?;
    let method = format_ident!("{}", method_name);

    let mut doc_lines = doc_attr(command.description.as_deref());
    if let Some(redirect) = &command.redirect {
        let note = format!("Moved to the `{redirect}` domain.");
        doc_lines.extend(quote!(#[doc = #note]));
    }
    let deprecated = if command.deprecated {
        quote!(#[deprecated])
    } else {
        TokenStream::new()
    };

    let (output, map_result) = match &returns_ident {
        Some(returns) => (quote!(#returns), quote!(invoke)),
        None => (quote!(()), quote!(invoke_unit)),
    };

    let mut methods = match &params_ident {
        Some(params) => quote! {
            #doc_lines
            #deprecated
            pub async fn #method(
                &self,
                params: #params,
            ) -> Result<#output, probe_rpc::RpcError> {
                self.connection.#map_result(#wire_method, Some(params)).await
            }
        },
        None => quote! {
            #doc_lines
            #deprecated
            pub async fn #method(&self) -> Result<#output, probe_rpc::RpcError> {
                self.connection.#map_result(#wire_method, None::<()>).await
            }
        },
    };

    // Convenience overload: individual arguments mapped to declared
    // parameter order, building the container internally.
    if let Some(params) = &params_ident {
        let with_name = format!("{method_name}_with");
        ns.claim_method(&with_name)?;
        let with_method = format_ident!("{}", with_name);

        let mut args = TokenStream::new();
        let mut inits = TokenStream::new();
        for field in &command.parameters {
            let resolved = resolve_field(index, domain, field)?;
            let ident = format_ident!("{}", idents::field_ident(&field.name));
            let ty = type_tokens(&resolved.ty);
            let ty = if resolved.optional {
                quote!(Option<#ty>)
            } else {
                ty
            };
            args.extend(quote!(#ident: #ty,));
            inits.extend(quote!(#ident,));
        }

        let with_doc = format!("As [`Self::{method_name}`], taking the parameters directly.");
        methods.extend(quote! {
            #[doc = #with_doc]
            #deprecated
            pub async fn #with_method(
                &self,
                #args
            ) -> Result<#output, probe_rpc::RpcError> {
                self.#method(#params { #inits }).await
            }
        });
    }

    Ok((containers, methods))
}

fn emit_event(
    ns: &mut Namespace,
    index: &ProtocolIndex<'_>,
    domain: &Domain,
    event: &Event,
) -> Result<(TokenStream, TokenStream)> {
    let wire_name = format!("{}.{}", domain.domain, event.name);
    let mut container = TokenStream::new();

    let payload = if event.parameters.is_empty() {
        quote!(())
    } else {
        let name = format!("{}Event", idents::type_ident(&event.name));
        let doc = format!("Payload of the `{wire_name}` event.");
        container.extend(struct_decl(
            ns,
            index,
            domain,
            &name,
            &event.parameters,
            Some(&doc),
        )?);
        let ident = format_ident!("{}", name);
        quote!(#ident)
    };

    let method_name = format!("on_{}", idents::method_ident(&event.name));
    ns.claim_method(&method_name)?;
    let method = format_ident!("{}", method_name);
    let doc = doc_attr(event.description.as_deref());

    let methods = quote! {
        #doc
        pub fn #method(&self) -> probe_rpc::EventStream<#payload> {
            self.connection.subscribe(#wire_name)
        }
    };
    Ok((container, methods))
}

/// Emits one record declaration with wire-faithful serde attributes.
///
/// Fields keep declaration order; optional fields are `Option<T>` and stay
/// absent on the wire when unset.
fn struct_decl(
    ns: &mut Namespace,
    index: &ProtocolIndex<'_>,
    domain: &Domain,
    name: &str,
    fields: &[Field],
    description: Option<&str>,
) -> Result<TokenStream> {
    ns.claim_type(name)?;
    let ident = format_ident!("{}", name);

    let mut body = TokenStream::new();
    let mut field_names = IndexSet::new();
    for field in fields {
        let resolved = resolve_field(index, domain, field)?;
        let rust_name = idents::field_ident(&field.name);
        if !field_names.insert(rust_name.clone()) {
            return Err(GenError::DuplicateGeneratedIdentifier {
                module: format!("{}::{name}", ns.module),
                ident: rust_name,
            });
        }
        let field_ident = format_ident!("{}", rust_name);

        let ty = type_tokens(&resolved.ty);
        let ty = if resolved.optional {
            quote!(Option<#ty>)
        } else {
            ty
        };

        let mut attrs = TokenStream::new();
        if rust_name != field.name {
            let wire = &field.name;
            attrs.extend(quote!(#[serde(rename = #wire)]));
        }
        if resolved.optional {
            attrs.extend(quote!(#[serde(default, skip_serializing_if = "Option::is_none")]));
        }

        let doc = doc_attr(field.description.as_deref());
        body.extend(quote! {
            #doc
            #attrs
            pub #field_ident: #ty,
        });
    }

    let doc = doc_attr(description);
    Ok(quote! {
        #doc
        #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
        pub struct #ident {
            #body
        }
    })
}

/// Emits one variant declaration per enum literal.
///
/// The serialized form of every variant is the literal's exact wire
/// spelling, independent of the identifier transform.
fn enum_decl(
    ns: &mut Namespace,
    name: &str,
    literals: &[String],
    description: Option<&str>,
) -> Result<TokenStream> {
    ns.claim_type(name)?;
    let ident = format_ident!("{}", name);

    let mut body = TokenStream::new();
    let mut variant_names = IndexSet::new();
    for literal in literals {
        let variant_name = idents::variant_ident(literal);
        if !variant_names.insert(variant_name.clone()) {
            return Err(GenError::DuplicateGeneratedIdentifier {
                module: format!("{}::{name}", ns.module),
                ident: variant_name,
            });
        }
        let variant = format_ident!("{}", variant_name);
        body.extend(quote! {
            #[serde(rename = #literal)]
            #variant,
        });
    }

    let doc = doc_attr(description);
    Ok(quote! {
        #doc
        #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        pub enum #ident {
            #body
        }
    })
}

/// Renders a resolved descriptor as a Rust type.
fn type_tokens(ty: &ResolvedType) -> TokenStream {
    match ty {
        ResolvedType::Float64 => quote!(f64),
        ResolvedType::String => quote!(String),
        ResolvedType::Integer => quote!(i32),
        ResolvedType::Boolean => quote!(bool),
        ResolvedType::Any => quote!(serde_json::Value),
        ResolvedType::JsonMap => quote!(serde_json::Map<String, serde_json::Value>),
        ResolvedType::Array(element) => {
            let element = type_tokens(element);
            quote!(Vec<#element>)
        }
        ResolvedType::Decl {
            domain,
            id,
            qualified,
        } => {
            let ty = format_ident!("{}", idents::type_ident(id));
            if *qualified {
                let module = format_ident!("{}", idents::module_ident(domain));
                quote!(super::#module::#ty)
            } else {
                quote!(#ty)
            }
        }
    }
}

fn doc_attr(text: Option<&str>) -> TokenStream {
    match text {
        Some(text) => {
            let text = text.trim();
            quote!(#[doc = #text])
        }
        None => TokenStream::new(),
    }
}

fn render(tokens: &TokenStream) -> String {
    format!("// Generated by probe-codegen; do not edit.\n\n{tokens}\n")
}
