use quote::ToTokens;
use syn::parse::{Parse, ParseStream, Parser};
use syn::punctuated::Punctuated;
use syn::{Attribute, Ident, LitStr, Token, Type};

// 提取非 derive 属性与已有 derive 列表
fn split_derives(attrs: &[Attribute]) -> (Vec<Attribute>, Vec<syn::Path>) {
    let mut retained = Vec::new();
    let mut existing = Vec::new();
    for attr in attrs.iter() {
        if attr.path().is_ident("derive") {
            if let Ok(list) =
                attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
            {
                existing.extend(list);
            }
        } else {
            retained.push(attr.clone());
        }
    }
    (retained, existing)
}

// 归一化 derive 的 key，避免 Serialize/serde::Serialize 重复
fn derive_key(p: &syn::Path) -> String {
    match p.segments.last() {
        Some(last) => {
            let last_ident = last.ident.to_string();
            match last_ident.as_str() {
                "Serialize" | "Deserialize" => format!("serde::{}", last_ident),
                _ => last_ident,
            }
        }
        None => p.to_token_stream().to_string(),
    }
}

/// 合并默认派生与已有派生（去重，required 在前），其余属性保持原顺序
pub(crate) fn apply_derives(attrs: &mut Vec<Attribute>, required: Vec<syn::Path>) {
    let (retained, existing) = split_derives(attrs);

    let mut seen = std::collections::HashSet::<String>::new();
    let merged: Vec<syn::Path> = required
        .into_iter()
        .chain(existing)
        .filter(|p| seen.insert(derive_key(p)))
        .collect();

    let derive: Attribute = syn::parse_quote!(#[derive(#(#merged),*)]);
    *attrs = std::iter::once(derive).chain(retained).collect();
}

/// 属性参数：`key = "literal"` 或 `key = Type`
pub(crate) enum AttrValue {
    Str(LitStr),
    Type(Box<Type>),
}

struct AttrKv {
    key: Ident,
    value: AttrValue,
}

impl Parse for AttrKv {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let key: Ident = input.parse()?;
        input.parse::<Token![=]>()?;
        let value = if input.peek(LitStr) {
            AttrValue::Str(input.parse()?)
        } else {
            AttrValue::Type(Box::new(input.parse()?))
        };
        Ok(Self { key, value })
    }
}

/// 解析后的属性配置：稳定名称与关联类型（`output` / `dto`）
#[derive(Default)]
pub(crate) struct AttrConfig {
    pub(crate) name: Option<LitStr>,
    pub(crate) assoc: Option<Type>,
}

/// 解析 `name = "..."` 与可选的类型参数 `type_key = Type`
pub(crate) fn parse_attr_config(
    attr: proc_macro::TokenStream,
    type_key: Option<&str>,
) -> syn::Result<AttrConfig> {
    let pairs = Punctuated::<AttrKv, Token![,]>::parse_terminated.parse(attr)?;
    let mut cfg = AttrConfig::default();

    for kv in pairs {
        let key = kv.key.to_string();
        match (key.as_str(), kv.value) {
            ("name", AttrValue::Str(lit)) => {
                if cfg.name.is_some() {
                    return Err(syn::Error::new(kv.key.span(), "duplicate key 'name'"));
                }
                cfg.name = Some(lit);
            }
            ("name", AttrValue::Type(ty)) => {
                return Err(syn::Error::new_spanned(
                    ty,
                    "expected string literal for 'name'",
                ));
            }
            (k, AttrValue::Type(ty)) if Some(k) == type_key => {
                if cfg.assoc.is_some() {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        format!("duplicate key '{k}'"),
                    ));
                }
                cfg.assoc = Some(*ty);
            }
            (k, AttrValue::Str(lit)) if Some(k) == type_key => {
                return Err(syn::Error::new(
                    lit.span(),
                    format!("expected a type for '{k}'"),
                ));
            }
            _ => {
                let expected = match type_key {
                    Some(t) => format!("unknown key; expected 'name' | '{t}'"),
                    None => "unknown key; expected 'name'".to_string(),
                };
                return Err(syn::Error::new(kv.key.span(), expected));
            }
        }
    }

    Ok(cfg)
}
