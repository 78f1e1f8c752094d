use seedwork_domain::domain_event::DomainEvent;
use seedwork_macros::domain_event;
use serde::{Deserialize, Serialize};

#[domain_event]
struct PedidoConfirmado {
    pedido_id: String,
    total: u64,
}

#[domain_event(name = "inventario.reservado")]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InventarioReservado {
    producto_id: String,
    cantidad: u32,
}

fn main() {
    let ev = PedidoConfirmado {
        pedido_id: "p-1".into(),
        total: 10,
    };
    assert_eq!(ev.clone(), ev);
    assert_eq!(PedidoConfirmado::EVENT_TYPE, "PedidoConfirmado");
    assert_eq!(InventarioReservado::EVENT_TYPE, "inventario.reservado");
}
