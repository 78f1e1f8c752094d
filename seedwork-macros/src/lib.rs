//! seedwork 过程宏
//!
//! 为命令、查询与领域事件生成标记 trait 的实现，省去手写稳定名称的样板代码。
//! 生成的代码通过 `::seedwork_domain` / `::seedwork_application` 绝对路径引用 trait，
//! 使用方需要依赖对应的 crate。
use proc_macro::TokenStream;

mod domain_event;
mod request;
mod utils;

/// 领域事件宏
/// - 仅支持具名字段结构体：事件以扁平字段表的形式跨服务传输
/// - 合并/追加派生：`Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize`
/// - 实现 `::seedwork_domain::domain_event::DomainEvent`
/// - 支持参数：`#[domain_event(name = "PedidoConfirmado")]`，默认取结构体名
///
/// ```ignore
/// #[domain_event]
/// struct PedidoConfirmado {
///     pedido_id: String,
///     total: f64,
/// }
/// ```
#[proc_macro_attribute]
pub fn domain_event(attr: TokenStream, item: TokenStream) -> TokenStream {
    domain_event::expand(attr, item)
}

/// 命令宏
/// - 实现 `::seedwork_application::command::Command`
/// - 支持参数：`name = "..."`（默认取类型名）、`output = Type`（默认 `()`）
/// - 可用于结构体或枚举（封闭的命令变体集合）
#[proc_macro_attribute]
pub fn command(attr: TokenStream, item: TokenStream) -> TokenStream {
    request::expand(request::RequestKind::Command, attr, item)
}

/// 查询宏
/// - 实现 `::seedwork_application::query::Query`
/// - 参数：`dto = Type`（必填）、`name = "..."`（默认取类型名）
#[proc_macro_attribute]
pub fn query(attr: TokenStream, item: TokenStream) -> TokenStream {
    request::expand(request::RequestKind::Query, attr, item)
}
