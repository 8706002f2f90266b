//! Implementation of the `#[julia]` attribute macro

use jlext_core::source::HostFunction;
use jlext_core::value::MAX_ARITY;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{FnArg, ItemFn, LitStr, Pat, PatType, ReturnType, Type, parse_macro_input, parse_quote};

pub fn julia_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input_fn = parse_macro_input!(item as ItemFn);

    let mut julia_name: Option<LitStr> = None;
    let attr_parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            julia_name = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("expected attribute format: #[julia] or #[julia(name = \"function_name\")]"))
        }
    });
    parse_macro_input!(attr with attr_parser);

    let sig_info = match parse_function_signature(&input_fn) {
        Ok(info) => info,
        Err(err) => return err.to_compile_error().into(),
    };

    match generate_code(julia_name.as_ref(), &sig_info, &input_fn) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Information extracted from the host function
struct SignatureInfo {
    /// Parameter names and types, in declaration order
    params: Vec<(syn::Ident, Box<Type>)>,
    /// Declared return type, `()` when omitted
    return_type: Box<Type>,
    /// Extracted Julia source
    source: String,
    /// Joined `///` documentation
    doc: Option<String>,
}

fn parse_function_signature(func: &ItemFn) -> syn::Result<SignatureInfo> {
    if !func.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &func.sig.generics,
            "#[julia] functions cannot be generic",
        ));
    }
    if let Some(asyncness) = &func.sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "#[julia] functions cannot be async",
        ));
    }

    if func.sig.inputs.len() > MAX_ARITY {
        return Err(syn::Error::new_spanned(
            &func.sig.inputs,
            format!("#[julia] functions take at most {MAX_ARITY} parameters"),
        ));
    }

    let mut params = Vec::new();
    for input in &func.sig.inputs {
        match input {
            FnArg::Typed(PatType { pat, ty, .. }) => match &**pat {
                Pat::Ident(pat_ident) => params.push((pat_ident.ident.clone(), ty.clone())),
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "parameters must be plain identifiers",
                    ));
                }
            },
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "#[julia] functions cannot take `self`",
                ));
            }
        }
    }

    let return_type = match &func.sig.output {
        ReturnType::Default => Box::new(parse_quote!(())),
        ReturnType::Type(_, ty) => ty.clone(),
    };

    let host = HostFunction::from_item(func.clone())
        .map_err(|err| syn::Error::new_spanned(&func.sig, err.to_string()))?;
    let source = host
        .source()
        .map_err(|err| syn::Error::new_spanned(&func.block, err.to_string()))?;

    Ok(SignatureInfo {
        params,
        return_type,
        source,
        doc: host.doc,
    })
}

fn generate_code(
    julia_name: Option<&LitStr>,
    sig_info: &SignatureInfo,
    input_fn: &ItemFn,
) -> syn::Result<TokenStream2> {
    let fn_name = &input_fn.sig.ident;
    let vis = &input_fn.vis;
    let attrs = &input_fn.attrs;
    let host_name = fn_name.unraw().to_string();

    let param_names: Vec<_> = sig_info.params.iter().map(|(name, _)| name).collect();
    let param_types: Vec<_> = sig_info.params.iter().map(|(_, ty)| ty).collect();
    let param_strings: Vec<_> = param_names
        .iter()
        .map(|name| name.unraw().to_string())
        .collect();
    let return_type = &sig_info.return_type;
    let source = &sig_info.source;

    let name = match julia_name {
        Some(lit) => quote! { ::core::option::Option::Some(::std::string::String::from(#lit)) },
        None => quote! { ::core::option::Option::None },
    };
    let doc = match &sig_info.doc {
        Some(doc) => quote! { ::core::option::Option::Some(::std::string::String::from(#doc)) },
        None => quote! { ::core::option::Option::None },
    };

    let module_doc = format!("Julia side of [`{host_name}`](fn@{fn_name}).");
    let function_static = format_ident!("{}", host_name.to_uppercase());

    Ok(quote! {
        #(#attrs)*
        #vis fn #fn_name(#(#param_names: #param_types),*) -> ::jlext::Result<#return_type> {
            #fn_name::function().call_as::<#return_type>((#(#param_names,)*))
        }

        #[doc = #module_doc]
        #vis mod #fn_name {
            #[allow(unused_imports)]
            use super::*;

            /// The wrapper behind the function, built on first use.
            pub fn function() -> &'static ::jlext::JuliaFunction {
                static #function_static: ::jlext::__private::Lazy<::jlext::JuliaFunction> =
                    ::jlext::__private::Lazy::new(|| {
                        ::jlext::JuliaFunction::new(
                            ::std::sync::Arc::clone(::jlext::Runtime::global()),
                            ::jlext::FunctionParts {
                                host_name: ::std::string::String::from(#host_name),
                                params: ::std::vec![#(::std::string::String::from(#param_strings)),*],
                                source: ::std::string::String::from(#source),
                                name: #name,
                                doc: #doc,
                            },
                        )
                    });
                &#function_static
            }

            /// Apply the function to every argument tuple in one round trip.
            pub fn map(
                batch: ::std::vec::Vec<(#(#param_types,)*)>,
            ) -> ::jlext::Result<::std::vec::Vec<#return_type>> {
                function().map_as::<#return_type, _>(batch)
            }
        }
    })
}
