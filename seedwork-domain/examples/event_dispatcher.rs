/// 事件分发器示例
/// 展示本地处理器扇出、转交内存 broker，以及另一服务经 relay 收到事件的完整闭环
use anyhow::Result as AnyResult;
use seedwork_domain::domain_event::{BusinessContext, SerializedEvent};
use seedwork_domain::eventing::{
    DomainEventHandler, EventDispatcher, EventHandler, EventRelay, InMemoryBroker,
};
use seedwork_macros::domain_event;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// 领域事件
// ============================================================================

#[domain_event]
struct PedidoConfirmado {
    pedido_id: String,
    cliente: String,
    total_centavos: u64,
}

#[domain_event(name = "PedidoEntregado")]
struct PedidoEntregado {
    pedido_id: String,
}

// ============================================================================
// 处理器
// ============================================================================

/// 强类型处理器：按 EVENT_TYPE 自动解码
struct Auditoria;

#[async_trait::async_trait]
impl DomainEventHandler<PedidoConfirmado> for Auditoria {
    async fn handle(&self, event: PedidoConfirmado, envelope: &SerializedEvent) -> AnyResult<()> {
        println!(
            "[pedidos] auditoria: pedido={} cliente={} total={} correlation={:?}",
            event.pedido_id,
            event.cliente,
            event.total_centavos,
            envelope.correlation_id()
        );
        Ok(())
    }
}

/// 信封级处理器：直接读取扁平 payload
struct Notificador {
    name: &'static str,
}

#[async_trait::async_trait]
impl EventHandler for Notificador {
    fn handler_name(&self) -> &str {
        self.name
    }

    async fn handle(&self, event: &SerializedEvent) -> AnyResult<()> {
        println!(
            "[{}] {} {} payload={}",
            self.name,
            event.event_type(),
            event.event_id(),
            event.payload()
        );
        if event.event_type() == "PedidoEntregado" {
            anyhow::bail!("{} no acepta entregas", self.name);
        }
        Ok(())
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> AnyResult<()> {
    println!("=== EventDispatcher 示例 ===\n");

    let broker = Arc::new(InMemoryBroker::default());

    // 消费方服务：只挂本地处理器，由 relay 投递
    let entregas = Arc::new(
        EventDispatcher::builder()
            .bind_handler(
                "PedidoConfirmado",
                Arc::new(Notificador { name: "entregas" }),
            )
            .build(),
    );
    let relay = Arc::new(
        EventRelay::builder()
            .source(broker.clone())
            .dispatcher(entregas)
            .build(),
    );
    let handle = relay.start().await;

    // 生产方服务：本地处理器 + broker
    let pedidos = EventDispatcher::builder()
        .subscribe::<PedidoConfirmado, _>(Auditoria)
        .bind_handler(
            "PedidoEntregado",
            Arc::new(Notificador { name: "pedidos" }),
        )
        .bind_publisher(broker.clone())
        .build();

    let biz = BusinessContext::builder()
        .correlation_id("cor-1".to_string())
        .actor_type("user".to_string())
        .actor_id("u-1".to_string())
        .build();

    let report = pedidos
        .publish_in(
            &biz,
            &PedidoConfirmado {
                pedido_id: "p-1".into(),
                cliente: "Ana".into(),
                total_centavos: 1250,
            },
        )
        .await;
    println!("PedidoConfirmado -> {report:?}");

    // 处理器失败只计入报告，不影响调用方
    let report = pedidos
        .publish(&PedidoEntregado {
            pedido_id: "p-1".into(),
        })
        .await;
    println!("PedidoEntregado -> {report:?}");

    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.shutdown();
    handle.join().await;

    println!("\n✅ 示例结束");
    Ok(())
}
