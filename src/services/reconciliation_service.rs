// src/services/reconciliation_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::PurchaseOrderStore,
    models::{
        purchase_order::{OrigemEstoque, PurchaseOrder, PurchaseOrderItem, TipoOrigem, UsoEstoque},
        reconciliacao::{CorrecaoCredor, OrigemOrfa, RelatorioReconciliacao},
    },
    services::travas::TravasEstoque,
};

/// Reparo sob demanda: recalcula a contabilidade dos credores a partir das
/// origens gravadas nos consumidores (que são tratadas como verdade).
#[derive(Clone)]
pub struct ReconciliationService {
    pedidos: Arc<dyn PurchaseOrderStore>,
    travas: Arc<TravasEstoque>,
}

type ChaveItem = (Uuid, usize);

impl ReconciliationService {
    pub fn new(pedidos: Arc<dyn PurchaseOrderStore>, travas: Arc<TravasEstoque>) -> Self {
        Self { pedidos, travas }
    }

    pub async fn reconciliar(&self, simular: bool) -> Result<RelatorioReconciliacao, AppError> {
        // Exclusivo: espera Use/Revert em andamento e bloqueia novos
        let _portao = self.travas.travar_tudo().await;

        let pedidos = self.pedidos.read_all().await?;
        let (mut esperado, origens_orfas) = usos_esperados(&pedidos);

        let mut relatorio = RelatorioReconciliacao {
            simulacao: simular,
            origens_orfas,
            ..Default::default()
        };

        for pedido in &pedidos {
            let mut itens = pedido.itens.clone();
            let mut alterado = false;

            for (item_index, item) in itens.iter_mut().enumerate() {
                relatorio.itens_verificados += 1;

                let esperados = esperado.remove(&(pedido.id, item_index)).unwrap_or_default();
                let valor_novo: Decimal = esperados.iter().map(|u| u.quantidade).sum();

                if contabilidade_confere(item, &esperados, valor_novo) {
                    continue;
                }

                relatorio.correcoes.push(CorrecaoCredor {
                    po_id: pedido.id,
                    numero_oc: pedido.numero_oc.clone(),
                    item_index,
                    codigo_item: item.codigo_item.clone(),
                    valor_antigo: item.quantidade_usada_estoque,
                    valor_novo,
                    registros_antigos: item.estoque_usado_em.len(),
                    registros_novos: esperados.len(),
                });

                item.estoque_usado_em = preservar_datas(&item.estoque_usado_em, esperados);
                item.quantidade_usada_estoque = valor_novo;
                alterado = true;
            }

            if !alterado || simular {
                continue;
            }

            // Uma falha não interrompe o restante: fica no relatório
            if let Err(e) = self.pedidos.replace_items(pedido.id, &itens, pedido.versao).await {
                tracing::error!("Reconciliação: falha ao gravar OC {}: {}", pedido.id, e);
                relatorio.falhas_escrita.push(pedido.id);
            }
        }

        tracing::info!(
            "Reconciliação{}: {} itens verificados, {} correções, {} origens órfãs",
            if simular { " (simulação)" } else { "" },
            relatorio.itens_verificados,
            relatorio.correcoes.len(),
            relatorio.origens_orfas.len()
        );

        Ok(relatorio)
    }
}

/// Monta, a partir dos consumidores, os registros de uso que cada credor
/// deveria ter. Origens sem credor localizável voltam como órfãs.
fn usos_esperados(pedidos: &[PurchaseOrder]) -> (HashMap<ChaveItem, Vec<UsoEstoque>>, Vec<OrigemOrfa>) {
    let mut esperado: HashMap<ChaveItem, Vec<UsoEstoque>> = HashMap::new();
    let mut orfas = Vec::new();

    for consumidor in pedidos {
        for (consumidor_index, item) in consumidor.itens.iter().enumerate() {
            for origem in item.estoque_origem.iter().filter(|o| o.tipo == TipoOrigem::Pedido) {
                let credor = resolver_credor(pedidos, origem, &item.codigo_item)
                    .filter(|chave| *chave != (consumidor.id, consumidor_index));

                match credor {
                    Some(chave) => esperado.entry(chave).or_default().push(UsoEstoque {
                        po_id: consumidor.id,
                        numero_oc: Some(consumidor.numero_oc.clone()),
                        item_index: Some(consumidor_index),
                        quantidade: origem.quantidade,
                        data: None,
                    }),
                    None => orfas.push(OrigemOrfa {
                        consumidor_po_id: consumidor.id,
                        consumidor_item_index: consumidor_index,
                        codigo_item: item.codigo_item.clone(),
                        numero_oc_credor: origem.numero_oc.clone(),
                        quantidade: origem.quantidade,
                    }),
                }
            }
        }
    }

    (esperado, orfas)
}

fn resolver_credor(pedidos: &[PurchaseOrder], origem: &OrigemEstoque, codigo_item: &str) -> Option<ChaveItem> {
    if let (Some(po_id), Some(item_index)) = (origem.po_id, origem.item_index) {
        let confere = pedidos
            .iter()
            .find(|p| p.id == po_id)
            .and_then(|p| p.itens.get(item_index))
            .is_some_and(|i| i.codigo_item == codigo_item);
        if confere {
            return Some((po_id, item_index));
        }
    }

    let numero_oc = origem.numero_oc.as_deref()?;
    pedidos
        .iter()
        .filter(|p| p.numero_oc == numero_oc)
        .find_map(|p| p.item_por_codigo(codigo_item).map(|(idx, _)| (p.id, idx)))
}

// Compara como multiconjunto de (po_id, quantidade): registros antigos
// podem não ter item_index.
fn contabilidade_confere(item: &PurchaseOrderItem, esperados: &[UsoEstoque], valor_novo: Decimal) -> bool {
    if item.quantidade_usada_estoque != valor_novo || item.estoque_usado_em.len() != esperados.len() {
        return false;
    }

    let mut atuais: Vec<(Uuid, Decimal)> = item
        .estoque_usado_em
        .iter()
        .map(|u| (u.po_id, u.quantidade.normalize()))
        .collect();
    let mut novos: Vec<(Uuid, Decimal)> = esperados
        .iter()
        .map(|u| (u.po_id, u.quantidade.normalize()))
        .collect();
    atuais.sort();
    novos.sort();
    atuais == novos
}

// Mantém a data de uso original quando o registro equivalente já existia
fn preservar_datas(atuais: &[UsoEstoque], mut novos: Vec<UsoEstoque>) -> Vec<UsoEstoque> {
    let mut disponiveis: Vec<&UsoEstoque> = atuais.iter().collect();
    for novo in novos.iter_mut() {
        if let Some(pos) = disponiveis
            .iter()
            .position(|u| u.po_id == novo.po_id && u.quantidade == novo.quantidade)
        {
            novo.data = disponiveis.remove(pos).data;
        }
    }
    novos
}
