//! 服务间共享的事件契约（按事件类型名路由，payload 为扁平字段表）
use seedwork_macros::domain_event;

#[domain_event]
pub struct PedidoConfirmado {
    pub pedido_id: String,
    pub cliente: String,
    pub direccion: String,
    pub productos: Vec<String>,
}

#[domain_event]
pub struct PedidoEstadoCambiado {
    pub pedido_id: String,
    pub anterior: String,
    pub estado: String,
}
