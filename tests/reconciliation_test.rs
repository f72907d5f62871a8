mod common;

use common::*;
use compras_backend::{
    common::error::AppError, db::PurchaseOrderStore, models::purchase_order::UsoEstoque,
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::test]
async fn heals_lender_drift_left_by_an_interrupted_use() {
    let lender = oc("OC-001", vec![credor(CODIGO, 20, 1)]);
    let consumer = oc("OC-002", vec![consumidor(CODIGO, 2)]);
    let (lender_id, consumer_id) = (lender.id, consumer.id);
    let c = cenario(vec![lender, consumer], vec![]);

    // Credor gravado, consumidor não
    c.pedidos.fail_writes_for(consumer_id);
    let erro = c.state.allocation_service.usar_estoque(consumer_id, 0, dec(2)).await;
    assert!(matches!(erro, Err(AppError::StorageWriteFailure(_))));
    c.pedidos.restore_writes_for(consumer_id);

    assert_eq!(item(&c.pedidos, lender_id, 0).await.quantidade_usada_estoque, dec(2));
    assert_eq!(c.state.ledger_service.verificar(CODIGO).await.disponivel, dec(17));

    let relatorio = c.state.reconciliation_service.reconciliar(false).await.unwrap();
    assert!(!relatorio.simulacao);
    assert_eq!(relatorio.itens_verificados, 2);
    assert_eq!(relatorio.correcoes.len(), 1);
    let correcao = &relatorio.correcoes[0];
    assert_eq!(correcao.po_id, lender_id);
    assert_eq!(correcao.valor_antigo, dec(2));
    assert_eq!(correcao.valor_novo, Decimal::ZERO);
    assert_eq!(correcao.registros_antigos, 1);
    assert_eq!(correcao.registros_novos, 0);
    assert!(relatorio.falhas_escrita.is_empty());

    let credor_item = item(&c.pedidos, lender_id, 0).await;
    assert_eq!(credor_item.quantidade_usada_estoque, Decimal::ZERO);
    assert!(credor_item.estoque_usado_em.is_empty());
    assert_eq!(c.state.ledger_service.verificar(CODIGO).await.disponivel, dec(19));
}

#[tokio::test]
async fn second_run_finds_nothing_to_fix() {
    let lender = oc("OC-001", vec![credor(CODIGO, 20, 1)]);
    let consumer = oc("OC-002", vec![consumidor(CODIGO, 2)]);
    let consumer_id = consumer.id;
    let c = cenario(vec![lender, consumer], vec![]);

    c.pedidos.fail_writes_for(consumer_id);
    let _ = c.state.allocation_service.usar_estoque(consumer_id, 0, dec(2)).await;
    c.pedidos.restore_writes_for(consumer_id);

    let primeira = c.state.reconciliation_service.reconciliar(false).await.unwrap();
    assert_eq!(primeira.correcoes.len(), 1);

    let antes = c.pedidos.read_all().await.unwrap();
    let segunda = c.state.reconciliation_service.reconciliar(false).await.unwrap();
    assert!(segunda.correcoes.is_empty());
    assert_eq!(c.pedidos.read_all().await.unwrap(), antes);
}

#[tokio::test]
async fn consistent_data_is_left_untouched() {
    let lender = oc("OC-001", vec![credor(CODIGO, 20, 1)]);
    let first = oc("OC-002", vec![consumidor(CODIGO, 5)]);
    let second = oc("OC-003", vec![consumidor(CODIGO, 3)]);
    let (first_id, second_id) = (first.id, second.id);
    let c = cenario(vec![lender, first, second], vec![]);

    c.state.allocation_service.usar_estoque(first_id, 0, dec(5)).await.unwrap();
    c.state.allocation_service.usar_estoque(second_id, 0, dec(3)).await.unwrap();
    let antes = c.pedidos.read_all().await.unwrap();

    let relatorio = c.state.reconciliation_service.reconciliar(false).await.unwrap();
    assert!(relatorio.correcoes.is_empty());
    assert!(relatorio.origens_orfas.is_empty());
    assert_eq!(c.pedidos.read_all().await.unwrap(), antes);
}

#[tokio::test]
async fn rebuilds_lender_records_from_consumer_origins() {
    let lender = oc("OC-001", vec![credor(CODIGO, 20, 1)]);
    let consumer = oc("OC-002", vec![consumidor(CODIGO, 4)]);
    let (lender_id, consumer_id) = (lender.id, consumer.id);
    let c = cenario(vec![lender, consumer], vec![]);

    c.state.allocation_service.usar_estoque(consumer_id, 0, dec(4)).await.unwrap();
    let data_original = item(&c.pedidos, lender_id, 0).await.estoque_usado_em[0].data;

    // Apaga a contabilidade do credor por fora do motor
    let mut adulterado = c.pedidos.read_one(lender_id).await.unwrap().unwrap();
    adulterado.itens[0].quantidade_usada_estoque = dec(9);
    adulterado.itens[0].estoque_usado_em.push(UsoEstoque {
        po_id: Uuid::new_v4(),
        numero_oc: Some("OC-777".into()),
        item_index: None,
        quantidade: dec(5),
        data: None,
    });
    c.pedidos.insert(adulterado).unwrap();
    assert_eq!(c.state.ledger_service.verificar(CODIGO).await.disponivel, dec(10));

    let relatorio = c.state.reconciliation_service.reconciliar(false).await.unwrap();
    assert_eq!(relatorio.correcoes.len(), 1);
    assert_eq!(relatorio.correcoes[0].valor_antigo, dec(9));
    assert_eq!(relatorio.correcoes[0].registros_antigos, 2);
    assert_eq!(relatorio.correcoes[0].valor_novo, dec(4));

    let credor_item = item(&c.pedidos, lender_id, 0).await;
    assert_eq!(credor_item.quantidade_usada_estoque, dec(4));
    assert_eq!(credor_item.estoque_usado_em.len(), 1);
    assert_eq!(credor_item.estoque_usado_em[0].po_id, consumer_id);
    assert_eq!(credor_item.estoque_usado_em[0].item_index, Some(0));
    assert_eq!(credor_item.estoque_usado_em[0].quantidade, dec(4));
    assert!(data_original.is_some());
    assert_eq!(credor_item.estoque_usado_em[0].data, data_original);
    assert_eq!(c.state.ledger_service.verificar(CODIGO).await.disponivel, dec(15));
}

#[tokio::test]
async fn missing_lenders_are_reported_as_orphans_only() {
    let lender = oc("OC-001", vec![credor(CODIGO, 20, 1)]);
    let consumer = oc("OC-002", vec![consumidor(CODIGO, 2)]);
    let (lender_id, consumer_id) = (lender.id, consumer.id);
    let c = cenario(vec![lender, consumer], vec![]);

    c.state.allocation_service.usar_estoque(consumer_id, 0, dec(2)).await.unwrap();
    c.pedidos.remove(lender_id).unwrap();
    let antes = c.pedidos.read_all().await.unwrap();

    let relatorio = c.state.reconciliation_service.reconciliar(false).await.unwrap();
    assert!(relatorio.correcoes.is_empty());
    assert_eq!(relatorio.origens_orfas.len(), 1);
    let orfa = &relatorio.origens_orfas[0];
    assert_eq!(orfa.consumidor_po_id, consumer_id);
    assert_eq!(orfa.consumidor_item_index, 0);
    assert_eq!(orfa.numero_oc_credor.as_deref(), Some("OC-001"));
    assert_eq!(orfa.quantidade, dec(2));

    assert_eq!(c.pedidos.read_all().await.unwrap(), antes);

    // A reversão ainda limpa o consumidor
    let reversao = c.state.allocation_service.reverter(consumer_id, 0).await.unwrap();
    assert_eq!(reversao.quantidade_revertida, Decimal::ZERO);
    assert!(item(&c.pedidos, consumer_id, 0).await.estoque_origem.is_empty());
}

#[tokio::test]
async fn dry_run_reports_without_writing() {
    let lender = oc("OC-001", vec![credor(CODIGO, 20, 1)]);
    let consumer = oc("OC-002", vec![consumidor(CODIGO, 2)]);
    let consumer_id = consumer.id;
    let c = cenario(vec![lender, consumer], vec![]);

    c.pedidos.fail_writes_for(consumer_id);
    let _ = c.state.allocation_service.usar_estoque(consumer_id, 0, dec(2)).await;
    c.pedidos.restore_writes_for(consumer_id);
    let antes = c.pedidos.read_all().await.unwrap();

    let relatorio = c.state.reconciliation_service.reconciliar(true).await.unwrap();
    assert!(relatorio.simulacao);
    assert_eq!(relatorio.correcoes.len(), 1);
    assert_eq!(c.pedidos.read_all().await.unwrap(), antes);
}

#[tokio::test]
async fn write_failures_are_collected_and_the_rest_continues() {
    let first = oc("OC-001", vec![credor(CODIGO, 20, 1)]);
    let second = oc("OC-002", vec![credor("200300", 9, 1)]);
    let (first_id, second_id) = (first.id, second.id);
    let c = cenario(vec![first, second], vec![]);

    for id in [first_id, second_id] {
        let mut adulterado = c.pedidos.read_one(id).await.unwrap().unwrap();
        adulterado.itens[0].quantidade_usada_estoque = dec(3);
        c.pedidos.insert(adulterado).unwrap();
    }
    c.pedidos.fail_writes_for(first_id);

    let relatorio = c.state.reconciliation_service.reconciliar(false).await.unwrap();
    assert_eq!(relatorio.correcoes.len(), 2);
    assert_eq!(relatorio.falhas_escrita, vec![first_id]);

    assert_eq!(item(&c.pedidos, first_id, 0).await.quantidade_usada_estoque, dec(3));
    assert_eq!(item(&c.pedidos, second_id, 0).await.quantidade_usada_estoque, Decimal::ZERO);
}
