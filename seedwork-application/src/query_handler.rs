use crate::{context::AppContext, error::AppError, query::Query};
use async_trait::async_trait;

/// 读路径处理器：每个 Query 类型在注册表中只绑定一个
///
/// 处理器只读取读模型，“未找到”等业务结果以 `AppError::NotFound` 返回。
#[async_trait]
pub trait QueryHandler<Q>: Send + Sync
where
    Q: Query,
{
    async fn handle(&self, ctx: &AppContext, query: Q) -> Result<Q::Dto, AppError>;
}
