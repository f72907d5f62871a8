mod common;

use common::*;
use compras_backend::models::{
    estoque::EstoqueItemResponse,
    purchase_order::{ItemStatus, TipoOrigem},
};
use rust_decimal::Decimal;

#[tokio::test]
async fn stock_served_items_never_become_lenders() {
    let lender = oc("OC-001", vec![credor(CODIGO, 20, 1)]);
    let consumer = oc("OC-002", vec![consumidor(CODIGO, 2)]);
    let consumer_id = consumer.id;
    let c = cenario(vec![lender, consumer], vec![]);

    c.state.allocation_service.usar_estoque(consumer_id, 0, dec(2)).await.unwrap();
    c.state
        .status_service
        .atualizar_status(consumer_id, 0, ItemStatus::Entregue)
        .await
        .unwrap();

    let entrada = c.state.ledger_service.verificar(CODIGO).await;
    assert_eq!(entrada.disponivel, dec(17));
    assert_eq!(entrada.origens.len(), 1);
    assert!(entrada.origens.iter().all(|o| o.po_id != Some(consumer_id)));
}

#[tokio::test]
async fn unknown_code_returns_an_empty_entry() {
    let c = cenario(vec![oc("OC-001", vec![credor(CODIGO, 20, 1)])], vec![]);

    let entrada = c.state.ledger_service.verificar("999999").await;
    assert_eq!(entrada.codigo_item, "999999");
    assert_eq!(entrada.disponivel, Decimal::ZERO);
    assert!(entrada.origens.is_empty());
}

#[tokio::test]
async fn list_and_map_agree_per_code() {
    let c = cenario(
        vec![
            oc("OC-001", vec![credor(CODIGO, 20, 1), credor("200300", 4, 4)]),
            oc("OC-002", vec![credor("200300", 7, 5)]),
        ],
        vec![manual("300400", 6, 1), manual(CODIGO, 2, 0)],
    );

    let listado = c.state.ledger_service.listar().await;
    let mapa = c.state.ledger_service.mapa().await;

    assert_eq!(listado.len(), 3);
    assert_eq!(mapa.len(), 3);
    for (codigo, entrada) in &listado {
        assert_eq!(mapa[codigo], entrada.disponivel);
        assert_eq!(
            c.state.ledger_service.verificar(codigo).await.disponivel,
            entrada.disponivel
        );
    }

    assert_eq!(mapa[CODIGO], dec(21));
    assert_eq!(mapa["200300"], dec(2));
    assert_eq!(mapa["300400"], dec(5));
}

#[tokio::test]
async fn response_shape_marks_mixed_origins() {
    let c = cenario(
        vec![oc("OC-001", vec![credor(CODIGO, 20, 1)])],
        vec![manual(CODIGO, 2, 0), manual("300400", 6, 1)],
    );

    let misto = EstoqueItemResponse::from(c.state.ledger_service.verificar(CODIGO).await);
    assert_eq!(misto.origem.as_deref(), Some("misto"));
    assert_eq!(misto.ocs_origem.len(), 2);
    assert_eq!(misto.ocs_origem[0].tipo, TipoOrigem::Pedido);
    assert_eq!(misto.ocs_origem[0].numero_oc.as_deref(), Some("OC-001"));
    assert_eq!(misto.descricao, "Cabo flexível 2,5mm");
    assert_eq!(misto.preco_unitario, Some(dec(10)));

    let manual = EstoqueItemResponse::from(c.state.ledger_service.verificar("300400").await);
    assert_eq!(manual.origem.as_deref(), Some("manual"));
    assert_eq!(manual.preco_unitario, Some(dec(8)));
}
