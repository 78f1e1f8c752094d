use crate::{
    context::AppContext, error::AppError, query::Query, query_bus::QueryBus,
    query_handler::QueryHandler,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::{Any, TypeId, type_name, type_name_of_val};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type BoxAnySend = Box<dyn Any + Send>;

type QueryHandlerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<BoxAnySend, AppError>> + Send + 'a>>;

type QueryHandlerFn =
    Arc<dyn for<'a> Fn(BoxAnySend, &'a AppContext) -> QueryHandlerFuture<'a> + Send + Sync>;

fn erase<F>(f: F) -> QueryHandlerFn
where
    F: for<'a> Fn(BoxAnySend, &'a AppContext) -> QueryHandlerFuture<'a> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// 进程内的查询注册表
/// - 与 [`CommandRegistry`](crate::CommandRegistry) 同构，但只服务读路径
/// - 每个 Query 类型绑定唯一的 Handler，结果类型由 `Query::Dto` 决定
pub struct QueryRegistry {
    handlers: DashMap<TypeId, (&'static str, QueryHandlerFn)>,
}

impl Default for QueryRegistry {
    fn default() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }
}

impl QueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册查询处理器
    pub fn register<Q, H>(&self, handler: Arc<H>) -> Result<(), AppError>
    where
        Q: Query,
        H: QueryHandler<Q> + 'static,
    {
        let f = erase(move |boxed_q, ctx| {
            let handler = handler.clone();

            Box::pin(async move {
                match boxed_q.downcast::<Q>() {
                    Ok(q) => {
                        let dto = handler.handle(ctx, *q).await?;
                        Ok(Box::new(dto) as BoxAnySend)
                    }
                    Err(e) => Err(AppError::TypeMismatch {
                        expected: type_name::<Q>(),
                        found: type_name_of_val(&e),
                    }),
                }
            })
        });

        match self.handlers.entry(TypeId::of::<Q>()) {
            Entry::Occupied(_) => {
                tracing::warn!(query = Q::NAME, "duplicate query handler rejected");
                Err(AppError::AlreadyRegisteredQuery { query: Q::NAME })
            }
            Entry::Vacant(slot) => {
                slot.insert((Q::NAME, f));
                tracing::debug!(query = Q::NAME, "query handler registered");
                Ok(())
            }
        }
    }

    pub fn bind<Q, H>(self, handler: Arc<H>) -> Result<Self, AppError>
    where
        Q: Query,
        H: QueryHandler<Q> + 'static,
    {
        self.register::<Q, H>(handler)?;
        Ok(self)
    }

    pub fn contains<Q>(&self) -> bool
    where
        Q: Query,
    {
        self.handlers.contains_key(&TypeId::of::<Q>())
    }

    /// 获取已注册的查询类型名列表（只读视图）
    pub fn registered_queries(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|e| e.value().0).collect()
    }
}

#[async_trait]
impl QueryBus for QueryRegistry {
    async fn execute<Q>(&self, ctx: &AppContext, q: Q) -> Result<Q::Dto, AppError>
    where
        Q: Query,
    {
        let Some(f) = self
            .handlers
            .get(&TypeId::of::<Q>())
            .map(|h| h.value().1.clone())
        else {
            tracing::error!(query = Q::NAME, "no handler registered for query");
            return Err(AppError::UnregisteredHandler(Q::NAME));
        };

        tracing::debug!(query = Q::NAME, "dispatching query");

        let out = (f)(Box::new(q), ctx).await?;

        match out.downcast::<Q::Dto>() {
            Ok(dto) => Ok(*dto),
            Err(e) => Err(AppError::TypeMismatch {
                expected: type_name::<Q::Dto>(),
                found: type_name_of_val(&e),
            }),
        }
    }
}
