// src/services/ledger_service.rs

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    db::{ManualStockStore, PurchaseOrderStore},
    models::{
        estoque::{EntradaLedger, EstoqueManual, OrigemLedger},
        purchase_order::{PurchaseOrder, TipoOrigem},
    },
};

/// Visão calculada do estoque disponível por código de item.
/// Nada aqui é gravado; toda consulta recalcula a partir dos stores.
#[derive(Clone)]
pub struct LedgerService {
    pedidos: Arc<dyn PurchaseOrderStore>,
    estoque_manual: Arc<dyn ManualStockStore>,
}

impl LedgerService {
    pub fn new(pedidos: Arc<dyn PurchaseOrderStore>, estoque_manual: Arc<dyn ManualStockStore>) -> Self {
        Self { pedidos, estoque_manual }
    }

    /// Ledger completo, ordenado por código.
    pub async fn listar(&self) -> BTreeMap<String, EntradaLedger> {
        let (pedidos, manuais) = self.carregar().await;
        calcular_ledger(&pedidos, &manuais, None)
    }

    /// Mesma regra de `listar`, restrita a um código. Código desconhecido
    /// devolve entrada zerada.
    pub async fn verificar(&self, codigo_item: &str) -> EntradaLedger {
        let (pedidos, manuais) = self.carregar().await;
        calcular_ledger(&pedidos, &manuais, Some(codigo_item))
            .remove(codigo_item)
            .unwrap_or_else(|| EntradaLedger::vazia(codigo_item))
    }

    /// `{codigo_item: disponivel}`.
    pub async fn mapa(&self) -> HashMap<String, Decimal> {
        self.listar()
            .await
            .into_iter()
            .map(|(codigo, entrada)| (codigo, entrada.disponivel))
            .collect()
    }

    // Falha de leitura vira lista vazia: o ledger sempre responde
    async fn carregar(&self) -> (Vec<PurchaseOrder>, Vec<EstoqueManual>) {
        let pedidos = self.pedidos.read_all().await.unwrap_or_else(|e| {
            tracing::warn!("Ledger: falha ao ler ordens de compra, considerando vazio: {}", e);
            Vec::new()
        });
        let manuais = self.estoque_manual.read_all().await.unwrap_or_else(|e| {
            tracing::warn!("Ledger: falha ao ler estoque manual, considerando vazio: {}", e);
            Vec::new()
        });
        (pedidos, manuais)
    }
}

/// Algoritmo do ledger. Função pura para ser usada também pelo motor de
/// alocação e pelos testes de propriedade.
pub fn calcular_ledger(
    pedidos: &[PurchaseOrder],
    manuais: &[EstoqueManual],
    filtro: Option<&str>,
) -> BTreeMap<String, EntradaLedger> {
    let mut ledger: BTreeMap<String, EntradaLedger> = BTreeMap::new();
    let aceita = |codigo: &str| filtro.is_none_or(|f| f == codigo);

    // 1. Excedente dos itens de OC já comprados
    for pedido in pedidos {
        for (item_index, item) in pedido.itens.iter().enumerate() {
            if !item.status.is_comprado_ou_alem() || !aceita(&item.codigo_item) {
                continue;
            }

            let excedente = item.excedente();
            if excedente <= Decimal::ZERO {
                continue;
            }

            let preco = item.preco_unitario_lote();
            let fornecedor = item.fornecedor_principal().map(str::to_string);

            let entrada = ledger
                .entry(item.codigo_item.clone())
                .or_insert_with(|| EntradaLedger::vazia(&item.codigo_item));

            if entrada.descricao.is_empty() {
                entrada.descricao = item.descricao.clone();
            }
            if entrada.unidade.is_none() {
                entrada.unidade = item.unidade.clone();
            }
            if entrada.imagem_url.is_none() {
                entrada.imagem_url = item.imagem_url.clone();
            }
            if entrada.fornecedor.is_none() {
                entrada.fornecedor = fornecedor.clone();
            }
            if entrada.preco_unitario.is_none() && preco > Decimal::ZERO {
                entrada.preco_unitario = Some(preco);
            }

            entrada.quantidade_estoque += item.quantidade_comprada_efetiva();
            entrada.disponivel += excedente;
            entrada.origens.push(OrigemLedger {
                tipo: TipoOrigem::Pedido,
                numero_oc: Some(pedido.numero_oc.clone()),
                po_id: Some(pedido.id),
                item_index: Some(item_index),
                quantidade: excedente,
                preco_unitario: preco,
                fornecedor,
            });
        }
    }

    // 2. Estoque manual
    for manual in manuais {
        if !aceita(&manual.codigo_item) {
            continue;
        }

        let disponivel = manual.disponivel();
        if disponivel <= Decimal::ZERO {
            continue;
        }

        let preco = manual.preco_unitario.unwrap_or(Decimal::ZERO);
        let entrada = ledger
            .entry(manual.codigo_item.clone())
            .or_insert_with(|| EntradaLedger::vazia(&manual.codigo_item));

        if entrada.descricao.is_empty() {
            entrada.descricao = manual.descricao.clone();
        }
        if entrada.unidade.is_none() {
            entrada.unidade = manual.unidade.clone();
        }
        if entrada.imagem_url.is_none() {
            entrada.imagem_url = manual.imagem_url.clone();
        }
        if entrada.fornecedor.is_none() {
            entrada.fornecedor = manual.fornecedor.clone();
        }
        if entrada.preco_unitario.is_none() {
            entrada.preco_unitario = manual.preco_unitario;
        }

        entrada.quantidade_estoque += manual.quantidade;
        entrada.disponivel += disponivel;
        entrada.origens.push(OrigemLedger {
            tipo: TipoOrigem::Manual,
            numero_oc: None,
            po_id: None,
            item_index: None,
            quantidade: disponivel,
            preco_unitario: preco,
            fornecedor: manual.fornecedor.clone(),
        });
    }

    ledger
}
