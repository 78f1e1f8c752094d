use async_trait::async_trait;
use seedwork_application::CommandRegistry;
use seedwork_application::command_bus::CommandBus;
use seedwork_application::command_handler::{CommandHandler, handler_fn};
use seedwork_application::context::AppContext;
use seedwork_application::error::AppError;
use seedwork_domain::domain_event::BusinessContext;
use seedwork_macros::command;
use std::sync::Arc;

#[command(output = u32)]
#[derive(Debug)]
struct CrearProducto {
    nombre: String,
    stock: u32,
}

struct CrearProductoHandler;

#[async_trait]
impl CommandHandler<CrearProducto> for CrearProductoHandler {
    async fn handle(&self, ctx: &AppContext, cmd: CrearProducto) -> Result<u32, AppError> {
        println!(
            "CrearProducto: nombre={} stock={} actor={:?}",
            cmd.nombre,
            cmd.stock,
            ctx.biz.actor_id()
        );
        Ok(7)
    }
}

#[command]
#[derive(Debug)]
struct EliminarProducto {
    id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let commands = CommandRegistry::new()
        .bind::<CrearProducto, _>(Arc::new(CrearProductoHandler))?
        .bind::<EliminarProducto, _>(handler_fn(|cmd: EliminarProducto| async move {
            println!("EliminarProducto: id={}", cmd.id);
            Ok::<_, AppError>(())
        }))?;

    let ctx = AppContext {
        biz: BusinessContext::builder()
            .maybe_correlation_id(Some("cor-1".into()))
            .maybe_actor_type(Some("user".into()))
            .maybe_actor_id(Some("u-1".into()))
            .build(),
        idempotency_key: Some("idem-1".into()),
    };

    let id = commands
        .execute(
            &ctx,
            CrearProducto {
                nombre: "Ibuprofeno".into(),
                stock: 40,
            },
        )
        .await?;
    commands.execute(&ctx, EliminarProducto { id }).await?;

    // 同一命令类型重复绑定 -> 注册时拒绝，原处理器保持不变
    if let Err(err) = commands.register::<CrearProducto, _>(Arc::new(CrearProductoHandler)) {
        eprintln!("rejected as expected: {err}");
    }

    // 未注册的命令 -> UnregisteredHandler
    #[command]
    #[derive(Debug)]
    struct AjustarStock;

    if let Err(AppError::UnregisteredHandler(name)) = commands.execute(&ctx, AjustarStock).await {
        eprintln!("no handler as expected for command: {name}");
    }

    println!("registered: {:?}", commands.registered_commands());
    Ok(())
}
