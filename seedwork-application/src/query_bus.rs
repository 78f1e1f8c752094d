use crate::{context::AppContext, error::AppError, query::Query};
use async_trait::async_trait;

/// 查询入口，与 [`CommandBus`](crate::command_bus::CommandBus) 对称
#[async_trait]
pub trait QueryBus: Send + Sync {
    /// 未绑定处理器时返回 `UnregisteredHandler(Q::NAME)`
    async fn execute<Q>(&self, ctx: &AppContext, q: Q) -> Result<Q::Dto, AppError>
    where
        Q: Query;
}
