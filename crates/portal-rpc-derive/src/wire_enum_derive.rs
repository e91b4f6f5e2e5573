//! Implementation of #[derive(WireEnum)]

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Lit, Result};

use crate::utils::extract_wire_meta;

struct VariantSpec {
    pattern: TokenStream,
    name: String,
    value: Option<TokenStream>,
    title: Option<String>,
}

pub fn derive_wire_enum_impl(input: DeriveInput) -> Result<TokenStream> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            ident,
            "WireEnum can only be derived for enums",
        ));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            ident,
            "WireEnum cannot be derived for an enum without variants",
        ));
    }

    let mut variants = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "WireEnum variants cannot carry data",
            ));
        }
        let meta = extract_wire_meta(&variant.attrs)?;
        let variant_ident = &variant.ident;

        let value = match (&meta.value, &variant.discriminant) {
            (Some(lit), _) => Some(literal_value(lit)),
            (None, Some(_)) => Some(quote! {
                ::portal_rpc_server::__private::serde_json::Value::from(#ident::#variant_ident as i64)
            }),
            (None, None) => None,
        };

        variants.push(VariantSpec {
            pattern: quote! { #ident::#variant_ident },
            name: meta.name.unwrap_or_else(|| variant_ident.to_string()),
            value,
            title: meta.title,
        });
    }

    let backed = variants.iter().filter(|v| v.value.is_some()).count();
    if backed != 0 && backed != variants.len() {
        return Err(syn::Error::new_spanned(
            ident,
            "every variant needs a value (discriminant or #[wire(value = ...)]) once any variant has one",
        ));
    }

    let name_arms = variants.iter().map(|v| {
        let pattern = &v.pattern;
        let name = &v.name;
        quote! { #pattern => #name }
    });

    let value_fn = if backed == 0 {
        quote! {}
    } else {
        let arms = variants.iter().map(|v| {
            let pattern = &v.pattern;
            let value = &v.value;
            quote! { #pattern => ::core::option::Option::Some(#value) }
        });
        quote! {
            fn wire_value(&self) -> ::core::option::Option<::portal_rpc_server::__private::serde_json::Value> {
                match self {
                    #(#arms,)*
                }
            }
        }
    };

    let title_fn = if variants.iter().all(|v| v.title.is_none()) {
        quote! {}
    } else {
        let arms = variants.iter().map(|v| {
            let pattern = &v.pattern;
            match &v.title {
                Some(title) => quote! {
                    #pattern => ::core::option::Option::Some(::std::borrow::Cow::Borrowed(#title))
                },
                None => quote! { #pattern => ::core::option::Option::None },
            }
        });
        quote! {
            fn wire_title(&self) -> ::core::option::Option<::std::borrow::Cow<'static, str>> {
                match self {
                    #(#arms,)*
                }
            }
        }
    };

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::portal_rpc_server::normalize::WireEnum for #ident #ty_generics #where_clause {
            fn wire_name(&self) -> &'static str {
                match self {
                    #(#name_arms,)*
                }
            }

            #value_fn

            #title_fn
        }

        #[automatically_derived]
        impl #impl_generics ::portal_rpc_server::__private::serde::Serialize for #ident #ty_generics #where_clause {
            fn serialize<__S>(&self, serializer: __S) -> ::core::result::Result<__S::Ok, __S::Error>
            where
                __S: ::portal_rpc_server::__private::serde::Serializer,
            {
                ::portal_rpc_server::normalize::serialize_wire_enum(self, serializer)
            }
        }
    })
}

fn literal_value(lit: &Lit) -> TokenStream {
    let value = quote! { ::portal_rpc_server::__private::serde_json::Value };
    match lit {
        Lit::Int(_) => quote! { #value::from(#lit as i64) },
        Lit::Float(_) => quote! { #value::from(#lit as f64) },
        _ => quote! { #value::from(#lit) },
    }
}
