use crate::{command::Command, context::AppContext, error::AppError, query::Query};
use crate::query_handler::QueryHandler;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

#[async_trait]
pub trait CommandHandler<C>: Send + Sync
where
    C: Command,
{
    async fn handle(&self, ctx: &AppContext, cmd: C) -> Result<C::Output, AppError>;
}

/// 以普通函数充当处理器，见 [`handler_fn`]
pub struct FnHandler<F>(F);

/// 把 `Fn(Request) -> Future` 包装为可注册的处理器（命令或查询均可）
///
/// 函数不接收 [`AppContext`]，适合无需上下文的纯函数式用例。
pub fn handler_fn<F>(f: F) -> Arc<FnHandler<F>> {
    Arc::new(FnHandler(f))
}

#[async_trait]
impl<C, F, Fut> CommandHandler<C> for FnHandler<F>
where
    C: Command,
    F: Fn(C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<C::Output, AppError>> + Send + 'static,
{
    async fn handle(&self, _ctx: &AppContext, cmd: C) -> Result<C::Output, AppError> {
        (self.0)(cmd).await
    }
}

#[async_trait]
impl<Q, F, Fut> QueryHandler<Q> for FnHandler<F>
where
    Q: Query,
    F: Fn(Q) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Q::Dto, AppError>> + Send + 'static,
{
    async fn handle(&self, _ctx: &AppContext, q: Q) -> Result<Q::Dto, AppError> {
        (self.0)(q).await
    }
}
