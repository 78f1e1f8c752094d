use crate::utils::{apply_derives, parse_attr_config};
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, LitStr, parse_macro_input};

/// #[domain_event] 宏实现
/// - 仅支持具名字段结构体
/// - 生成 `::seedwork_domain::domain_event::DomainEvent` 实现（EVENT_TYPE）
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = match parse_attr_config(attr, None) {
        Ok(cfg) => cfg,
        Err(err) => return err.to_compile_error().into(),
    };
    let mut input = parse_macro_input!(item as Item);

    let st = match &mut input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(
                other.span(),
                "#[domain_event] can only be used on struct types",
            )
            .to_compile_error()
            .into();
        }
    };

    if !matches!(st.fields, syn::Fields::Named(_)) {
        return syn::Error::new(
            st.fields.span(),
            "#[domain_event] requires named fields, e.g., struct X { field: T }",
        )
        .to_compile_error()
        .into();
    }

    // 合并/追加默认派生：Debug, Clone, PartialEq, Serialize, Deserialize
    let required: Vec<syn::Path> = vec![
        syn::parse_quote!(Debug),
        syn::parse_quote!(Clone),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    apply_derives(&mut st.attrs, required);

    let ident = &st.ident;
    let event_type = cfg
        .name
        .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let out = quote! {
        #st

        impl #impl_generics ::seedwork_domain::domain_event::DomainEvent for #ident #ty_generics #where_clause {
            const EVENT_TYPE: &'static str = #event_type;
        }
    };

    TokenStream::from(out)
}
