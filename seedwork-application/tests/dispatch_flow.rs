use anyhow::Result as AnyResult;
use async_trait::async_trait;
use seedwork_application::command_bus::CommandBus;
use seedwork_application::command_handler::CommandHandler;
use seedwork_application::context::AppContext;
use seedwork_application::error::AppError;
use seedwork_application::query_bus::QueryBus;
use seedwork_application::{CommandOnEvent, CommandRegistry, QueryRegistry};
use seedwork_domain::domain_event::{BusinessContext, SerializedEvent};
use seedwork_domain::error::DomainResult;
use seedwork_domain::eventing::{
    EventDispatcher, EventHandler, EventPublisher, EventRelay, InMemoryBroker,
};
use seedwork_macros::{command, domain_event, query};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ---------------------------------------------------------------------------
// 命令 / 查询
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
struct CategoriaDto {
    id: usize,
    nombre: String,
    descripcion: String,
}

impl seedwork_application::dto::Dto for CategoriaDto {}

#[command(output = CategoriaDto)]
#[derive(Debug, Clone)]
struct CrearCategoria {
    nombre: String,
    descripcion: String,
}

#[query(dto = Vec<CategoriaDto>)]
#[derive(Debug)]
struct ListarCategorias;

#[query(dto = CategoriaDto)]
#[derive(Debug)]
struct ObtenerCategoria {
    id: usize,
}

#[derive(Default)]
struct Categorias {
    rows: Mutex<Vec<CategoriaDto>>,
}

struct CrearCategoriaHandler {
    repo: Arc<Categorias>,
}

#[async_trait]
impl CommandHandler<CrearCategoria> for CrearCategoriaHandler {
    async fn handle(&self, _ctx: &AppContext, cmd: CrearCategoria) -> Result<CategoriaDto, AppError> {
        if cmd.nombre.trim().is_empty() {
            return Err(AppError::Validation("nombre is required".into()));
        }
        let mut rows = self.repo.rows.lock().unwrap();
        let dto = CategoriaDto {
            id: rows.len() + 1,
            nombre: cmd.nombre,
            descripcion: cmd.descripcion,
        };
        rows.push(dto.clone());
        Ok(dto)
    }
}

struct ListarCategoriasHandler {
    repo: Arc<Categorias>,
    calls: AtomicUsize,
}

#[async_trait]
impl seedwork_application::query_handler::QueryHandler<ListarCategorias> for ListarCategoriasHandler {
    async fn handle(&self, _ctx: &AppContext, _q: ListarCategorias) -> Result<Vec<CategoriaDto>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.repo.rows.lock().unwrap().clone())
    }
}

#[tokio::test]
async fn command_output_flows_back_unchanged() -> AnyResult<()> {
    let repo = Arc::new(Categorias::default());
    let commands = CommandRegistry::new().bind::<CrearCategoria, _>(Arc::new(CrearCategoriaHandler {
        repo: repo.clone(),
    }))?;

    let dto = commands
        .execute(
            &AppContext::default(),
            CrearCategoria {
                nombre: "Medicamentos".into(),
                descripcion: "Medicamentos de venta libre".into(),
            },
        )
        .await?;

    assert_eq!(
        dto,
        CategoriaDto {
            id: 1,
            nombre: "Medicamentos".into(),
            descripcion: "Medicamentos de venta libre".into(),
        }
    );
    assert_eq!(repo.rows.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn business_failure_is_returned_to_the_caller() -> AnyResult<()> {
    let repo = Arc::new(Categorias::default());
    let commands = CommandRegistry::new().bind::<CrearCategoria, _>(Arc::new(CrearCategoriaHandler {
        repo: repo.clone(),
    }))?;

    let err = commands
        .execute(
            &AppContext::default(),
            CrearCategoria {
                nombre: "  ".into(),
                descripcion: String::new(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(repo.rows.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn unregistered_query_is_named_and_touches_nothing() -> AnyResult<()> {
    let repo = Arc::new(Categorias::default());
    let listar = Arc::new(ListarCategoriasHandler {
        repo: repo.clone(),
        calls: AtomicUsize::new(0),
    });
    let queries = QueryRegistry::new().bind::<ListarCategorias, _>(listar.clone())?;

    let err = queries
        .execute(&AppContext::default(), ObtenerCategoria { id: 7 })
        .await
        .unwrap_err();

    assert!(err.to_string().contains("ObtenerCategoria"));
    match err {
        AppError::UnregisteredHandler(name) => assert_eq!(name, "ObtenerCategoria"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(listar.calls.load(Ordering::SeqCst), 0);
    assert!(repo.rows.lock().unwrap().is_empty());
    Ok(())
}

// ---------------------------------------------------------------------------
// 领域事件
// ---------------------------------------------------------------------------

#[domain_event]
struct PedidoConfirmado {
    pedido_id: String,
    productos: Vec<String>,
}

#[domain_event]
struct PedidoEntregado {
    pedido_id: String,
}

struct Contador {
    name: &'static str,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl EventHandler for Contador {
    fn handler_name(&self) -> &str {
        self.name
    }

    async fn handle(&self, _event: &SerializedEvent) -> AnyResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct Reenvios {
    sent: Mutex<Vec<SerializedEvent>>,
}

#[async_trait]
impl EventPublisher for Reenvios {
    async fn publish(&self, event: &SerializedEvent) -> DomainResult<()> {
        self.sent.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[tokio::test]
async fn every_local_handler_sees_the_event_once() {
    let inventario = Arc::new(AtomicUsize::new(0));
    let notificaciones = Arc::new(AtomicUsize::new(0));
    let dispatcher = EventDispatcher::builder()
        .bind_handler(
            "PedidoConfirmado",
            Arc::new(Contador {
                name: "inventario",
                calls: inventario.clone(),
            }),
        )
        .bind_handler(
            "PedidoConfirmado",
            Arc::new(Contador {
                name: "notificaciones",
                calls: notificaciones.clone(),
            }),
        )
        .build();

    let report = dispatcher
        .publish(&PedidoConfirmado {
            pedido_id: "p-1".into(),
            productos: vec!["ibuprofeno".into()],
        })
        .await;

    assert_eq!(inventario.load(Ordering::SeqCst), 1);
    assert_eq!(notificaciones.load(Ordering::SeqCst), 1);
    assert_eq!(report.handlers_invoked, 2);
    assert!(report.is_clean());
}

#[tokio::test]
async fn event_without_local_handlers_still_reaches_the_publisher() {
    let reenvios = Arc::new(Reenvios::default());
    let dispatcher = EventDispatcher::builder()
        .bind_publisher(reenvios.clone())
        .build();

    let report = dispatcher
        .publish(&PedidoEntregado {
            pedido_id: "p-9".into(),
        })
        .await;

    let sent = reenvios.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event_type(), "PedidoEntregado");
    assert_eq!(sent[0].payload()["pedido_id"], "p-9");

    // broker 上的消息体：信封 JSON，payload 只含事件字段
    let wire: serde_json::Value = serde_json::from_slice(&sent[0].to_bytes().unwrap()).unwrap();
    assert_eq!(wire["event_type"], "PedidoEntregado");
    assert_eq!(wire["payload"], serde_json::json!({ "pedido_id": "p-9" }));
    assert_eq!(report.handlers_invoked, 0);
    assert_eq!(report.publishers_invoked, 1);
}

// ---------------------------------------------------------------------------
// 跨服务：pedidos --broker--> inventario
// ---------------------------------------------------------------------------

#[command]
#[derive(Debug, Clone)]
struct ReservarInventario {
    pedido_id: String,
    producto_id: String,
}

#[derive(Default)]
struct Stock {
    reservas: Mutex<HashMap<String, Vec<String>>>,
    keys: Mutex<Vec<Option<String>>>,
    correlations: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl CommandHandler<ReservarInventario> for Stock {
    async fn handle(&self, ctx: &AppContext, cmd: ReservarInventario) -> Result<(), AppError> {
        self.reservas
            .lock()
            .unwrap()
            .entry(cmd.pedido_id)
            .or_default()
            .push(cmd.producto_id);
        self.keys.lock().unwrap().push(ctx.idempotency_key.clone());
        self.correlations
            .lock()
            .unwrap()
            .push(ctx.biz.correlation_id().map(str::to_string));
        Ok(())
    }
}

async fn wait_for<F: Fn() -> bool>(cond: F) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn remote_event_triggers_commands_in_consumer_service() -> AnyResult<()> {
    let broker = Arc::new(InMemoryBroker::default());

    // 消费方：inventario
    let stock = Arc::new(Stock::default());
    let inventario_commands =
        Arc::new(CommandRegistry::new().bind::<ReservarInventario, _>(stock.clone())?);
    let inventario_events = Arc::new(
        EventDispatcher::builder()
            .bind_handler(
                "PedidoConfirmado",
                CommandOnEvent::new(inventario_commands, |ev: PedidoConfirmado| {
                    ev.productos
                        .into_iter()
                        .map(|producto_id| ReservarInventario {
                            pedido_id: ev.pedido_id.clone(),
                            producto_id,
                        })
                        .collect::<Vec<_>>()
                })
                .into_handler(),
            )
            .build(),
    );
    let relay = Arc::new(
        EventRelay::builder()
            .source(broker.clone())
            .dispatcher(inventario_events)
            .build(),
    );
    let handle = relay.start().await;

    // 生产方：pedidos
    let pedidos_local = Arc::new(AtomicUsize::new(0));
    let pedidos_events = EventDispatcher::builder()
        .bind_handler(
            "PedidoConfirmado",
            Arc::new(Contador {
                name: "pedidos-auditoria",
                calls: pedidos_local.clone(),
            }),
        )
        .bind_publisher(broker.clone())
        .build();

    let biz = BusinessContext::builder()
        .correlation_id("cor-42".to_string())
        .build();
    let report = pedidos_events
        .publish_in(
            &biz,
            &PedidoConfirmado {
                pedido_id: "p-1".into(),
                productos: vec!["ibuprofeno".into(), "paracetamol".into()],
            },
        )
        .await;
    assert!(report.is_clean());

    wait_for(|| stock.keys.lock().unwrap().len() == 2).await;

    handle.shutdown();
    handle.join().await;

    let reservas = stock.reservas.lock().unwrap();
    assert_eq!(
        reservas.get("p-1"),
        Some(&vec!["ibuprofeno".to_string(), "paracetamol".to_string()])
    );
    let keys = stock.keys.lock().unwrap();
    assert!(keys.iter().all(|k| k.as_deref().is_some_and(|k| k.ends_with("#0") || k.ends_with("#1"))));
    assert!(
        stock
            .correlations
            .lock()
            .unwrap()
            .iter()
            .all(|c| c.as_deref() == Some("cor-42"))
    );
    assert_eq!(pedidos_local.load(Ordering::SeqCst), 1);
    Ok(())
}
