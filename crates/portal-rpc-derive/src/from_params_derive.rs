//! Implementation of #[derive(FromParams)]

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{Data, DataStruct, DeriveInput, Fields, Result};

use crate::utils::{extract_param_container_meta, extract_param_field_meta};

pub fn derive_from_params_impl(input: DeriveInput) -> Result<TokenStream> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Struct(DataStruct {
        fields: Fields::Named(named),
        ..
    }) = &input.data
    else {
        return Err(syn::Error::new_spanned(
            ident,
            "FromParams can only be derived for structs with named fields",
        ));
    };
    let rename_rule = extract_param_container_meta(&input.attrs)?;

    let validate = quote! { ::portal_rpc_server::validate };
    let mut bindings = Vec::with_capacity(named.named.len());
    let mut locals = Vec::with_capacity(named.named.len());
    let mut members = Vec::with_capacity(named.named.len());

    for field in &named.named {
        let Some(member) = &field.ident else {
            return Err(syn::Error::new_spanned(field, "field has no name"));
        };
        let meta = extract_param_field_meta(&field.attrs)?;
        let raw_name = member.unraw().to_string();
        let key = meta.rename.unwrap_or_else(|| rename_rule.apply(&raw_name));
        let local = format_ident!("__field_{}", raw_name);
        let ty = &field.ty;

        let bind = if meta.default {
            quote! { bind_field_or_default }
        } else {
            quote! { bind_field }
        };
        bindings.push(quote! {
            let #local = #validate::#bind::<#ty>(params, #key, &mut violations);
        });

        if meta.min.is_some() || meta.max.is_some() {
            let min = bound_tokens(meta.min);
            let max = bound_tokens(meta.max);
            bindings.push(quote! {
                #validate::check_range(params, #key, #min, #max, &mut violations);
            });
        }

        locals.push(local);
        members.push(member);
    }

    let body = if locals.is_empty() {
        quote! {
            let _ = params;
            ::core::result::Result::Ok(Self {})
        }
    } else {
        quote! {
            let mut violations = ::std::vec::Vec::new();
            #(#bindings)*
            match (#(#locals,)*) {
                (#(::core::option::Option::Some(#locals),)*) if violations.is_empty() => {
                    ::core::result::Result::Ok(Self { #(#members: #locals),* })
                }
                _ => ::core::result::Result::Err(violations),
            }
        }
    };

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics #validate::FromParams for #ident #ty_generics #where_clause {
            fn from_params(
                params: &::portal_rpc_server::__private::serde_json::Map<
                    ::std::string::String,
                    ::portal_rpc_server::__private::serde_json::Value,
                >,
            ) -> ::core::result::Result<Self, ::std::vec::Vec<::portal_rpc_server::fault::Violation>> {
                #body
            }
        }
    })
}

fn bound_tokens(bound: Option<f64>) -> TokenStream {
    match bound {
        Some(value) => quote! { ::core::option::Option::Some(#value) },
        None => quote! { ::core::option::Option::None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    /// Expanded tokens with whitespace removed
    fn expand(input: DeriveInput) -> String {
        derive_from_params_impl(input)
            .unwrap()
            .to_string()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }

    fn error(input: DeriveInput) -> String {
        derive_from_params_impl(input).unwrap_err().to_string()
    }

    #[test]
    fn test_every_field_is_bound_on_its_own() {
        let output = expand(parse_quote! {
            struct Transfer {
                amount: i64,
                currency: String,
            }
        });
        assert!(output.contains("bind_field::<i64>(params,\"amount\",&mutviolations)"));
        assert!(output.contains("bind_field::<String>(params,\"currency\",&mutviolations)"));
        assert!(output.contains(
            "(::core::option::Option::Some(__field_amount),::core::option::Option::Some(__field_currency),)"
        ));
        assert!(output.contains("Self{amount:__field_amount,currency:__field_currency}"));
    }

    #[test]
    fn test_renames_defaults_and_bounds() {
        let output = expand(parse_quote! {
            #[param(rename_all = "camelCase")]
            struct LeaveRequest {
                employee_email: String,
                #[param(min = 1, max = 30)]
                days: i32,
                #[param(rename = "note", default)]
                comment: String,
                r#type: u8,
            }
        });
        assert!(output.contains("\"employeeEmail\""));
        assert!(output.contains("check_range(params,\"days\",::core::option::Option::Some(1f64),::core::option::Option::Some(30f64)"));
        assert!(output.contains("bind_field_or_default::<String>(params,\"note\""));
        assert!(output.contains("\"type\""));
        assert!(output.contains("__field_type"));
    }

    #[test]
    fn test_negative_bound() {
        let output = expand(parse_quote! {
            struct Adjustment {
                #[param(min = -10)]
                delta: i64,
            }
        });
        assert!(output.contains("Some(-10f64)"));
    }

    #[test]
    fn test_empty_struct() {
        let output = expand(parse_quote! {
            struct Ping {}
        });
        assert!(output.contains("Ok(Self{})"));
        assert!(!output.contains("violations"));
    }

    #[test]
    fn test_rejects_enums_tuples_and_unknown_keys() {
        assert!(error(parse_quote! { enum NotAStruct { A } }).contains("structs with named fields"));
        assert!(error(parse_quote! { struct Pair(u8, u8); }).contains("structs with named fields"));

        let message = error(parse_quote! {
            struct Typo {
                #[param(optional)]
                field: u8,
            }
        });
        assert!(message.contains("unsupported param attribute"));

        let message = error(parse_quote! {
            #[param(rename_all = "kebab-case")]
            struct Kebab {
                field: u8,
            }
        });
        assert!(message.contains("rename_all must be"));
    }
}
