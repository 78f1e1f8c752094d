use crate::utils::parse_attr_config;
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, LitStr, parse_macro_input};

pub(crate) enum RequestKind {
    Command,
    Query,
}

impl RequestKind {
    fn macro_name(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Query => "query",
        }
    }

    fn type_key(&self) -> &'static str {
        match self {
            Self::Command => "output",
            Self::Query => "dto",
        }
    }
}

/// #[command] / #[query] 宏实现：为结构体或枚举实现对应的标记 trait
pub(crate) fn expand(kind: RequestKind, attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = match parse_attr_config(attr, Some(kind.type_key())) {
        Ok(cfg) => cfg,
        Err(err) => return err.to_compile_error().into(),
    };
    let input = parse_macro_input!(item as Item);

    let (ident, generics) = match &input {
        Item::Struct(s) => (&s.ident, &s.generics),
        Item::Enum(e) => (&e.ident, &e.generics),
        other => {
            return syn::Error::new(
                other.span(),
                format!("#[{}] only on struct or enum", kind.macro_name()),
            )
            .to_compile_error()
            .into();
        }
    };

    let name = cfg
        .name
        .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let marker_impl = match kind {
        RequestKind::Command => {
            let output = cfg.assoc.unwrap_or_else(|| syn::parse_quote! { () });
            quote! {
                impl #impl_generics ::seedwork_application::command::Command for #ident #ty_generics #where_clause {
                    const NAME: &'static str = #name;
                    type Output = #output;
                }
            }
        }
        RequestKind::Query => {
            let Some(dto) = cfg.assoc else {
                return syn::Error::new(ident.span(), "#[query] requires `dto = Type`")
                    .to_compile_error()
                    .into();
            };
            quote! {
                impl #impl_generics ::seedwork_application::query::Query for #ident #ty_generics #where_clause {
                    const NAME: &'static str = #name;
                    type Dto = #dto;
                }
            }
        }
    };

    let out = quote! {
        #input

        #marker_impl
    };

    TokenStream::from(out)
}
