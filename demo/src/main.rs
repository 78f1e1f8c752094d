mod entregas;
mod eventos;
mod inventario;
mod pedidos;

use anyhow::Context as _;
use entregas::{EntregaDto, ObtenerEntrega, ServicioEntregas};
use inventario::{Almacen, ConsultarStock, ServicioInventario, StockDto};
use pedidos::{CambiarEstadoPedido, ConfirmarPedido, ObtenerPedido, ServicioPedidos};
use seedwork_application::command_bus::CommandBus;
use seedwork_application::context::AppContext;
use seedwork_application::error::AppError;
use seedwork_application::QueryRegistry;
use seedwork_application::query::Query;
use seedwork_application::query_bus::QueryBus;
use seedwork_domain::domain_event::BusinessContext;
use seedwork_domain::eventing::InMemoryBroker;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// 等待异步传播完成：轮询查询直到条件满足
async fn esperar<Q, F>(
    queries: &QueryRegistry,
    ctx: &AppContext,
    make: impl Fn() -> Q,
    listo: F,
) -> anyhow::Result<Q::Dto>
where
    Q: Query,
    F: Fn(&Q::Dto) -> bool,
{
    let poll = async {
        loop {
            match queries.execute(ctx, make()).await {
                Ok(dto) if listo(&dto) => return Ok(dto),
                Ok(_) | Err(AppError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    };
    let dto = tokio::time::timeout(Duration::from_secs(2), poll)
        .await
        .with_context(|| format!("timed out waiting for {}", Q::NAME))??;
    Ok(dto)
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("info,seedwork_domain=debug,seedwork_application=debug")
            }),
        )
        .init();

    tracing::info!("starting pedidos / inventario / entregas over an in-memory broker");

    let broker = Arc::new(InMemoryBroker::default());

    let pedidos = ServicioPedidos::new(broker.clone())?;
    let inventario = ServicioInventario::new(Almacen::con_stock([
        ("ibuprofeno", 3),
        ("paracetamol", 1),
    ]))?;
    let entregas = ServicioEntregas::new()?;

    let relays = vec![
        inventario.relay(broker.clone()).start().await,
        entregas.relay(broker.clone()).start().await,
    ];
    tracing::info!(
        subscribers = broker.subscriber_count(),
        pedidos_publishers = pedidos.events.publisher_count(),
        inventario_commands = ?inventario.commands.registered_commands(),
        entregas_commands = ?entregas.commands.registered_commands(),
        "services wired"
    );

    let ctx = AppContext {
        biz: BusinessContext::builder()
            .correlation_id("cor-demo-1".to_string())
            .actor_type("user".to_string())
            .actor_id("u-1".to_string())
            .build(),
        idempotency_key: None,
    };

    // pedidos: ConfirmarPedido -> PedidoConfirmado -> ReservarInventario + CrearEntrega
    let pedido = pedidos
        .commands
        .execute(
            &ctx,
            ConfirmarPedido {
                pedido_id: "p-1".into(),
                cliente: "Ana".into(),
                direccion: "Calle Mayor 1".into(),
                productos: vec!["ibuprofeno".into(), "paracetamol".into()],
            },
        )
        .await?;
    tracing::info!(pedido_id = %pedido.id, estado = %pedido.estado, "pedido confirmado");

    let entrega = esperar(
        &entregas.queries,
        &ctx,
        || ObtenerEntrega {
            pedido_id: "p-1".into(),
        },
        |_| true,
    )
    .await?;
    let stock = esperar(
        &inventario.queries,
        &ctx,
        || ConsultarStock {
            producto_id: "paracetamol".into(),
        },
        |s: &StockDto| s.reservado == 1,
    )
    .await?;
    tracing::info!(entrega_id = %entrega.id, estado = %entrega.estado, "entrega creada en entregas");
    tracing::info!(
        producto_id = %stock.producto_id,
        disponible = stock.disponible,
        reservado = stock.reservado,
        "stock en inventario"
    );

    // pedidos: CambiarEstadoPedido -> PedidoEstadoCambiado -> ActualizarEntrega
    pedidos
        .commands
        .execute(
            &ctx,
            CambiarEstadoPedido {
                pedido_id: "p-1".into(),
                estado: "enviado".into(),
            },
        )
        .await?;
    let entrega = esperar(
        &entregas.queries,
        &ctx,
        || ObtenerEntrega {
            pedido_id: "p-1".into(),
        },
        |e: &EntregaDto| e.estado == "en_ruta",
    )
    .await?;
    tracing::info!(estado = %entrega.estado, "entrega actualizada en entregas");

    // 业务失败原样返回给调用方
    if let Err(err) = pedidos
        .commands
        .execute(
            &ctx,
            CambiarEstadoPedido {
                pedido_id: "p-1".into(),
                estado: "perdido".into(),
            },
        )
        .await
    {
        tracing::warn!(error = %err, "cambio de estado rechazado");
    }

    let pedido = pedidos
        .queries
        .execute(
            &ctx,
            ObtenerPedido {
                pedido_id: "p-1".into(),
            },
        )
        .await?;
    tracing::info!(pedido_id = %pedido.id, estado = %pedido.estado, "estado final del pedido");

    for relay in relays {
        relay.shutdown();
        relay.join().await;
    }
    tracing::info!("demo finished");
    Ok(())
}
