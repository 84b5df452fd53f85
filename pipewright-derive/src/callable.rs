//! Implementation of the `#[callable]` attribute.
//!
//! The annotated `fn` is moved, unchanged apart from its parameter
//! attributes, into the body of a zero-argument constructor of the same
//! name. The constructor registers it with a signature built from the
//! parameter attributes and a frame adapter that moves each parameter out of
//! the matched call frame.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{Attribute, Expr, FnArg, Ident, ItemFn, LitStr, Pat, PatType, Visibility};

#[derive(Debug)]
enum Kind {
    Required,
    WithDefault(Box<Expr>),
    Rest,
    Extra,
}

#[derive(Debug)]
struct Parameter {
    name: Ident,
    kind: Kind,
}

pub fn callable_impl(attribute: TokenStream, item: TokenStream) -> TokenStream {
    expand(attribute.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(attribute: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    let registered = parse_options(attribute)?;
    let mut function: ItemFn = syn::parse2(item)?;
    validate_signature(&function)?;

    let mut parameters = Vec::with_capacity(function.sig.inputs.len());
    for input in &mut function.sig.inputs {
        match input {
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new(
                    receiver.span(),
                    "#[callable] cannot be used on methods",
                ));
            }
            FnArg::Typed(typed) => parameters.push(parse_parameter(typed)?),
        }
    }
    check_order(&parameters)?;

    let outer_name = function.sig.ident.clone();
    let registered =
        registered.unwrap_or_else(|| LitStr::new(&outer_name.to_string(), outer_name.span()));
    let body_name = format_ident!("__pipewright_{}", outer_name);
    let attributes = std::mem::take(&mut function.attrs);
    let visibility = std::mem::replace(&mut function.vis, Visibility::Inherited);
    function.sig.ident = body_name.clone();

    let builders = parameters.iter().map(signature_builder);
    let adapter = if parameters.is_empty() {
        quote! { |_| #body_name() }
    } else {
        let arguments = parameters.iter().map(frame_argument);
        quote! { |mut frame: ::pipewright::function::Frame| #body_name(#(#arguments),*) }
    };

    Ok(quote! {
        #(#attributes)*
        #visibility fn #outer_name() -> ::pipewright::function::Function {
            #function

            ::pipewright::function::Function::new(
                #registered,
                ::pipewright::function::Signature::new() #(#builders)*,
                #adapter,
            )
        }
    })
}

fn parse_options(attribute: TokenStream2) -> syn::Result<Option<LitStr>> {
    let mut name = None;
    if attribute.is_empty() {
        return Ok(name);
    }
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            name = Some(meta.value()?.parse::<LitStr>()?);
            Ok(())
        } else {
            Err(meta.error("unsupported #[callable] option, expected `name = \"...\"`"))
        }
    });
    syn::parse::Parser::parse2(parser, attribute)?;
    Ok(name)
}

fn validate_signature(function: &ItemFn) -> syn::Result<()> {
    let signature = &function.sig;
    if let Some(asyncness) = &signature.asyncness {
        return Err(syn::Error::new(
            asyncness.span(),
            "#[callable] functions must be synchronous",
        ));
    }
    if !signature.generics.params.is_empty() {
        return Err(syn::Error::new(
            signature.generics.span(),
            "#[callable] functions cannot be generic",
        ));
    }
    if let Some(variadic) = &signature.variadic {
        return Err(syn::Error::new(
            variadic.span(),
            "#[callable] functions cannot be C-variadic",
        ));
    }
    Ok(())
}

fn parse_parameter(typed: &mut PatType) -> syn::Result<Parameter> {
    let name = match typed.pat.as_ref() {
        Pat::Ident(pattern) if pattern.subpat.is_none() && pattern.by_ref.is_none() => {
            pattern.ident.clone()
        }
        other => {
            return Err(syn::Error::new(
                other.span(),
                "#[callable] parameters must be plain identifiers",
            ));
        }
    };

    let mut kind = None;
    let mut kept = Vec::with_capacity(typed.attrs.len());
    for attribute in typed.attrs.drain(..) {
        match parse_kind(&attribute)? {
            Some(found) if kind.is_some() => {
                return Err(syn::Error::new(
                    attribute.span(),
                    format!("`{name}` has more than one parameter kind ({found:?})"),
                ));
            }
            Some(found) => kind = Some(found),
            None => kept.push(attribute),
        }
    }
    typed.attrs = kept;

    Ok(Parameter {
        name,
        kind: kind.unwrap_or(Kind::Required),
    })
}

fn parse_kind(attribute: &Attribute) -> syn::Result<Option<Kind>> {
    let path = attribute.path();
    if path.is_ident("default") {
        Ok(Some(Kind::WithDefault(Box::new(attribute.parse_args::<Expr>()?))))
    } else if path.is_ident("rest") {
        attribute.meta.require_path_only()?;
        Ok(Some(Kind::Rest))
    } else if path.is_ident("extra") {
        attribute.meta.require_path_only()?;
        Ok(Some(Kind::Extra))
    } else {
        Ok(None)
    }
}

fn check_order(parameters: &[Parameter]) -> syn::Result<()> {
    let mut seen_default = false;
    let mut seen_rest = false;
    let mut seen_extra = false;
    for parameter in parameters {
        let problem = match parameter.kind {
            _ if seen_extra => Some("no parameter may follow the #[extra] parameter"),
            Kind::Required | Kind::WithDefault(_) if seen_rest => {
                Some("named parameters must precede the #[rest] parameter")
            }
            Kind::Required if seen_default => {
                Some("a required parameter cannot follow a parameter with a default")
            }
            Kind::Rest if seen_rest => Some("only one #[rest] parameter is allowed"),
            _ => None,
        };
        if let Some(problem) = problem {
            return Err(syn::Error::new(parameter.name.span(), problem));
        }
        match parameter.kind {
            Kind::Required => {}
            Kind::WithDefault(_) => seen_default = true,
            Kind::Rest => seen_rest = true,
            Kind::Extra => seen_extra = true,
        }
    }
    Ok(())
}

fn signature_builder(parameter: &Parameter) -> TokenStream2 {
    let name = LitStr::new(&parameter.name.to_string(), parameter.name.span());
    match &parameter.kind {
        Kind::Required => quote! { .required(#name) },
        Kind::WithDefault(default) => quote! { .with_default(#name, #default) },
        Kind::Rest => quote! { .variadic_positional(#name) },
        Kind::Extra => quote! { .variadic_keyword(#name) },
    }
}

fn frame_argument(parameter: &Parameter) -> TokenStream2 {
    let name = LitStr::new(&parameter.name.to_string(), parameter.name.span());
    match parameter.kind {
        Kind::Required | Kind::WithDefault(_) => quote! { frame.take(#name) },
        Kind::Rest => quote! { frame.take_rest() },
        Kind::Extra => quote! { frame.take_extra() },
    }
}
