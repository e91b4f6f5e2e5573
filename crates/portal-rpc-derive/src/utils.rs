//! Attribute parsing shared by the derives

use syn::meta::ParseNestedMeta;
use syn::{Attribute, Lit, LitStr, Result, Token};

/// Contents of `#[wire(...)]` on one variant
#[derive(Debug, Default)]
pub struct WireVariantMeta {
    pub name: Option<String>,
    pub value: Option<Lit>,
    pub title: Option<String>,
}

pub fn extract_wire_meta(attrs: &[Attribute]) -> Result<WireVariantMeta> {
    let mut meta = WireVariantMeta::default();

    for attr in attrs {
        if !attr.path().is_ident("wire") {
            continue;
        }
        attr.parse_nested_meta(|nested| {
            if nested.path.is_ident("name") {
                let s: LitStr = nested.value()?.parse()?;
                meta.name = Some(s.value());
            } else if nested.path.is_ident("title") {
                let s: LitStr = nested.value()?.parse()?;
                meta.title = Some(s.value());
            } else if nested.path.is_ident("value") {
                let lit = nested.value()?.parse::<Lit>()?;
                match lit {
                    Lit::Str(_) | Lit::Int(_) | Lit::Float(_) | Lit::Bool(_) => {
                        meta.value = Some(lit)
                    }
                    other => {
                        return Err(syn::Error::new_spanned(
                            other,
                            "wire value must be a string, integer, float or bool literal",
                        ));
                    }
                }
            } else {
                return Err(nested.error("unsupported wire attribute, expected name, value or title"));
            }
            Ok(())
        })?;
    }

    Ok(meta)
}

/// Contents of `#[param(...)]` on one field
#[derive(Debug, Default)]
pub struct ParamFieldMeta {
    pub rename: Option<String>,
    pub default: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

pub fn extract_param_field_meta(attrs: &[Attribute]) -> Result<ParamFieldMeta> {
    let mut meta = ParamFieldMeta::default();

    for attr in attrs {
        if !attr.path().is_ident("param") {
            continue;
        }
        attr.parse_nested_meta(|nested| {
            if nested.path.is_ident("rename") {
                let s: LitStr = nested.value()?.parse()?;
                meta.rename = Some(s.value());
            } else if nested.path.is_ident("default") {
                meta.default = true;
            } else if nested.path.is_ident("min") {
                meta.min = Some(parse_bound(&nested)?);
            } else if nested.path.is_ident("max") {
                meta.max = Some(parse_bound(&nested)?);
            } else {
                return Err(nested.error("unsupported param attribute, expected rename, default, min or max"));
            }
            Ok(())
        })?;
    }

    Ok(meta)
}

/// Field naming applied to a whole request struct
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    #[default]
    SnakeCase,
    CamelCase,
}

impl RenameRule {
    pub fn apply(self, field: &str) -> String {
        match self {
            RenameRule::SnakeCase => field.to_string(),
            RenameRule::CamelCase => {
                let mut parts = field.split('_').filter(|part| !part.is_empty());
                let mut out = parts.next().unwrap_or_default().to_string();
                for part in parts {
                    let mut chars = part.chars();
                    if let Some(first) = chars.next() {
                        out.extend(first.to_uppercase());
                        out.push_str(chars.as_str());
                    }
                }
                out
            }
        }
    }
}

/// `#[param(rename_all = "...")]` on the struct itself
pub fn extract_param_container_meta(attrs: &[Attribute]) -> Result<RenameRule> {
    let mut rule = RenameRule::default();

    for attr in attrs {
        if !attr.path().is_ident("param") {
            continue;
        }
        attr.parse_nested_meta(|nested| {
            if !nested.path.is_ident("rename_all") {
                return Err(nested.error("unsupported param attribute on a struct, expected rename_all"));
            }
            let s: LitStr = nested.value()?.parse()?;
            rule = match s.value().as_str() {
                "camelCase" => RenameRule::CamelCase,
                "snake_case" => RenameRule::SnakeCase,
                _ => {
                    return Err(syn::Error::new_spanned(
                        s,
                        "rename_all must be \"camelCase\" or \"snake_case\"",
                    ));
                }
            };
            Ok(())
        })?;
    }

    Ok(rule)
}

/// Numeric bound such as `min = 1`, `max = 99.5` or `min = -10`
fn parse_bound(nested: &ParseNestedMeta) -> Result<f64> {
    let input = nested.value()?;
    let negative = input.peek(Token![-]);
    if negative {
        input.parse::<Token![-]>()?;
    }
    let number: f64 = match input.parse::<Lit>()? {
        Lit::Int(lit) => lit.base10_parse()?,
        Lit::Float(lit) => lit.base10_parse()?,
        other => return Err(syn::Error::new_spanned(other, "bound must be a number")),
    };
    Ok(if negative { -number } else { number })
}
