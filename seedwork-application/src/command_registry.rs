use crate::{
    command::Command, command_bus::CommandBus, command_handler::CommandHandler,
    context::AppContext, error::AppError,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::{Any, TypeId, type_name};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type BoxAnySend = Box<dyn Any + Send>;

type CmdHandlerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<BoxAnySend, AppError>> + Send + 'a>>;

type CmdHandlerFn =
    Arc<dyn for<'a> Fn(BoxAnySend, &'a AppContext) -> CmdHandlerFuture<'a> + Send + Sync>;

// 以显式的高阶生命周期约束固定闭包签名
fn erase<F>(f: F) -> CmdHandlerFn
where
    F: for<'a> Fn(BoxAnySend, &'a AppContext) -> CmdHandlerFuture<'a> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// 进程内的命令注册表
/// - 通过 TypeId 为每个 Command 绑定唯一的 Handler，重复绑定在注册时即被拒绝
/// - 运行时以类型擦除（Any）方式进行调度，处理器的结果与错误原样返回
/// - 注册表可在流量到达后继续注册（DashMap 保证并发安全）
///
/// ```rust,ignore
/// let commands = CommandRegistry::new()
///     .bind::<CrearCategoria, _>(Arc::new(CrearCategoriaHandler::new(repo)))?
///     .bind::<ConfirmarPedido, _>(Arc::new(ConfirmarPedidoHandler::new(pedidos, events)))?;
/// ```
pub struct CommandRegistry {
    handlers: DashMap<TypeId, (&'static str, CmdHandlerFn)>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册命令处理器；同一命令类型已绑定时返回 `AlreadyRegisteredCommand`，原绑定保持不变
    pub fn register<C, H>(&self, handler: Arc<H>) -> Result<(), AppError>
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let f = erase(move |boxed_cmd, ctx| {
            let handler = handler.clone();

            Box::pin(async move {
                // 正常情况下这里的 downcast 永远不会失败（键与闭包同一泛型 C）
                match boxed_cmd.downcast::<C>() {
                    Ok(cmd) => {
                        let out = handler.handle(ctx, *cmd).await?;
                        Ok(Box::new(out) as BoxAnySend)
                    }
                    Err(_) => Err(AppError::TypeMismatch {
                        expected: C::NAME,
                        found: "unknown",
                    }),
                }
            })
        });

        match self.handlers.entry(TypeId::of::<C>()) {
            Entry::Occupied(_) => {
                tracing::warn!(command = C::NAME, "duplicate command handler rejected");
                Err(AppError::AlreadyRegisteredCommand { command: C::NAME })
            }
            Entry::Vacant(slot) => {
                slot.insert((C::NAME, f));
                tracing::debug!(command = C::NAME, "command handler registered");
                Ok(())
            }
        }
    }

    /// 构建式注册：消费并返回注册表，便于在启动时链式装配
    pub fn bind<C, H>(self, handler: Arc<H>) -> Result<Self, AppError>
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        self.register::<C, H>(handler)?;
        Ok(self)
    }

    pub fn contains<C>(&self) -> bool
    where
        C: Command,
    {
        self.handlers.contains_key(&TypeId::of::<C>())
    }

    /// 获取已注册的命令名列表（只读视图）
    pub fn registered_commands(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|e| e.value().0).collect()
    }
}

#[async_trait]
impl CommandBus for CommandRegistry {
    async fn execute<C>(&self, ctx: &AppContext, cmd: C) -> Result<C::Output, AppError>
    where
        C: Command,
    {
        let Some(f) = self
            .handlers
            .get(&TypeId::of::<C>())
            .map(|h| h.value().1.clone())
        else {
            tracing::error!(command = C::NAME, "no handler registered for command");
            return Err(AppError::UnregisteredHandler(C::NAME));
        };

        tracing::debug!(
            command = C::NAME,
            correlation_id = ctx.biz.correlation_id(),
            "dispatching command"
        );

        let out = (f)(Box::new(cmd), ctx).await?;

        match out.downcast::<C::Output>() {
            Ok(output) => Ok(*output),
            Err(_) => Err(AppError::TypeMismatch {
                expected: type_name::<C::Output>(),
                found: "unknown",
            }),
        }
    }
}
