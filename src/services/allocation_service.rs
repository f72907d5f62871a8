// src/services/allocation_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{atualizar_itens, ManualStockStore, PurchaseOrderStore},
    models::{
        estoque::{ResultadoReversao, ResultadoUsoEstoque},
        purchase_order::{
            FonteCompra, ItemStatus, OrigemEstoque, PurchaseOrder, PurchaseOrderItem, TipoOrigem,
            UsoEstoque, FORNECEDOR_ESTOQUE_INTERNO,
        },
    },
    services::{ledger_service::LedgerService, travas::TravasEstoque},
};

/// Motor de alocação: único lugar que altera os campos de empréstimo
/// (lado credor e lado consumidor). Todo `usar_estoque` tem um
/// `reverter` exato e idempotente.
#[derive(Clone)]
pub struct AllocationService {
    pedidos: Arc<dyn PurchaseOrderStore>,
    estoque_manual: Arc<dyn ManualStockStore>,
    ledger: LedgerService,
    travas: Arc<TravasEstoque>,
}

impl AllocationService {
    pub fn new(
        pedidos: Arc<dyn PurchaseOrderStore>,
        estoque_manual: Arc<dyn ManualStockStore>,
        ledger: LedgerService,
        travas: Arc<TravasEstoque>,
    ) -> Self {
        Self {
            pedidos,
            estoque_manual,
            ledger,
            travas,
        }
    }

    async fn carregar_item(
        &self,
        po_id: Uuid,
        item_index: usize,
    ) -> Result<(PurchaseOrder, PurchaseOrderItem), AppError> {
        let pedido = self
            .pedidos
            .read_one(po_id)
            .await?
            .ok_or(AppError::PurchaseOrderNotFound(po_id))?;
        let item = pedido
            .itens
            .get(item_index)
            .cloned()
            .ok_or(AppError::ItemNotFound { po_id, item_index })?;
        Ok((pedido, item))
    }

    // ---
    // USE: consome excedente de outras OCs
    // ---
    pub async fn usar_estoque(
        &self,
        po_id: Uuid,
        item_index: usize,
        quantidade: Decimal,
    ) -> Result<ResultadoUsoEstoque, AppError> {
        if quantidade <= Decimal::ZERO {
            return Err(AppError::InvalidQuantity(quantidade));
        }

        let (_, item) = self.carregar_item(po_id, item_index).await?;
        let _trava = self.travas.travar_codigo(&item.codigo_item).await;

        // Relê já com a trava: o estado pode ter mudado enquanto esperávamos
        let (consumidor, item_atual) = self.carregar_item(po_id, item_index).await?;
        if item_atual.codigo_item != item.codigo_item {
            return Err(AppError::ConcurrentModification(po_id));
        }
        validar_elegibilidade(&item_atual)?;

        let codigo = item_atual.codigo_item;
        let entrada = self.ledger.verificar(&codigo).await;

        let mut restante = quantidade;
        let mut origens: Vec<OrigemEstoque> = Vec::new();

        // 1. Retira dos credores, na ordem do ledger
        for origem in entrada.origens {
            if restante <= Decimal::ZERO {
                break;
            }
            // A própria OC do consumidor nunca empresta para ele
            if origem.po_id == Some(po_id) {
                continue;
            }

            let pedido_solicitado = origem.quantidade.min(restante);

            let retirado = match origem.tipo {
                TipoOrigem::Pedido => {
                    let (Some(credor_po_id), Some(credor_index)) = (origem.po_id, origem.item_index)
                    else {
                        continue;
                    };

                    let uso = UsoEstoque {
                        po_id,
                        numero_oc: Some(consumidor.numero_oc.clone()),
                        item_index: Some(item_index),
                        quantidade: Decimal::ZERO,
                        data: Some(Utc::now()),
                    };

                    let escrita = atualizar_itens(self.pedidos.as_ref(), credor_po_id, |pedido| {
                        let Some(credor) = pedido
                            .itens
                            .get_mut(credor_index)
                            .filter(|c| c.codigo_item == codigo && c.status.is_comprado_ou_alem())
                        else {
                            return Ok(None);
                        };

                        // Confere o excedente no documento recém-lido
                        let retirar = credor.excedente().min(pedido_solicitado);
                        if retirar <= Decimal::ZERO {
                            return Ok(None);
                        }

                        credor.quantidade_usada_estoque += retirar;
                        credor.estoque_usado_em.push(UsoEstoque {
                            quantidade: retirar,
                            ..uso.clone()
                        });
                        Ok(Some(retirar))
                    })
                    .await;

                    match escrita {
                        Ok(Some(retirado)) => retirado,
                        Ok(None) => continue,
                        Err(e) => return Err(falha_no_meio(e, po_id, &codigo, &origens)),
                    }
                }
                TipoOrigem::Manual => {
                    if let Err(e) = self.estoque_manual.update_usage(&codigo, pedido_solicitado).await {
                        return Err(falha_no_meio(e, po_id, &codigo, &origens));
                    }
                    pedido_solicitado
                }
            };

            tracing::info!(
                "Estoque: {} de '{}' retirado de {:?} ({}) para OC {} item {}",
                retirado,
                codigo,
                origem.numero_oc,
                match origem.tipo {
                    TipoOrigem::Pedido => "pedido",
                    TipoOrigem::Manual => "manual",
                },
                po_id,
                item_index
            );

            restante -= retirado;
            origens.push(OrigemEstoque {
                tipo: origem.tipo,
                numero_oc: origem.numero_oc,
                po_id: origem.po_id,
                item_index: origem.item_index,
                quantidade: retirado,
                preco_unitario: origem.preco_unitario,
            });
        }

        let total = quantidade - restante;
        if total <= Decimal::ZERO {
            tracing::info!("Estoque: nada disponível para '{}' (OC {})", codigo, po_id);
            return Ok(ResultadoUsoEstoque {
                quantidade_usada: Decimal::ZERO,
                atendido_totalmente: false,
                origens: Vec::new(),
            });
        }

        // 2. Grava o lado consumidor
        let atendido = total == quantidade;
        let preco_medio = preco_medio_ponderado(&origens);

        let escrita = atualizar_itens(self.pedidos.as_ref(), po_id, |pedido| {
            let item = pedido
                .itens
                .get_mut(item_index)
                .ok_or(AppError::ItemNotFound { po_id, item_index })?;

            item.quantidade_do_estoque += total;
            item.estoque_origem.extend(origens.iter().cloned());
            item.atendido_por_estoque = atendido;
            item.parcialmente_atendido_estoque = !atendido;
            item.preco_unitario_estoque = Some(preco_medio);

            if atendido {
                // Só avança: um item já em separação/trânsito não volta para comprado
                if item.status < ItemStatus::Comprado {
                    item.status = ItemStatus::Comprado;
                }
                item.fontes_compra.retain(|f| !f.origem_estoque);
                item.fontes_compra.push(FonteCompra {
                    quantidade: item.quantidade_do_estoque,
                    preco_unitario: preco_medio,
                    frete: Decimal::ZERO,
                    fornecedor: Some(FORNECEDOR_ESTOQUE_INTERNO.to_string()),
                    origem_estoque: true,
                });
            }
            Ok(Some(()))
        })
        .await;

        if let Err(e) = escrita {
            // A reconciliação só enxerga credores de pedido: o estoque manual volta aqui
            let pendentes = self.devolver_manuais(&codigo, origens).await;
            return Err(falha_no_meio(e, po_id, &codigo, &pendentes));
        }

        tracing::info!(
            "Estoque: OC {} item {} recebeu {} de '{}' (atendido: {})",
            po_id,
            item_index,
            total,
            codigo,
            atendido
        );

        Ok(ResultadoUsoEstoque {
            quantidade_usada: total,
            atendido_totalmente: atendido,
            origens,
        })
    }

    // ---
    // REVERT: devolve tudo que o consumidor pegou emprestado
    // ---
    pub async fn reverter(&self, po_id: Uuid, item_index: usize) -> Result<ResultadoReversao, AppError> {
        let (_, item) = self.carregar_item(po_id, item_index).await?;
        let _trava = self.travas.travar_codigo(&item.codigo_item).await;
        self.reverter_sem_trava(po_id, item_index).await
    }

    /// Reversão para quem já segura a trava do código do item.
    pub(crate) async fn reverter_sem_trava(
        &self,
        po_id: Uuid,
        item_index: usize,
    ) -> Result<ResultadoReversao, AppError> {
        let (_, item) = self.carregar_item(po_id, item_index).await?;
        let codigo = item.codigo_item.clone();
        let mut total = Decimal::ZERO;

        // 1. Devolve para cada credor
        for origem in &item.estoque_origem {
            match origem.tipo {
                TipoOrigem::Pedido => {
                    let Some((credor_po_id, credor_index)) = self.localizar_credor(origem, &codigo).await?
                    else {
                        tracing::warn!(
                            "Reversão: credor {:?} de '{}' não encontrado (OC consumidora {}), ignorando",
                            origem.numero_oc,
                            codigo,
                            po_id
                        );
                        continue;
                    };

                    let escrita = atualizar_itens(self.pedidos.as_ref(), credor_po_id, |pedido| {
                        let Some(credor) = pedido.itens.get_mut(credor_index) else {
                            return Ok(None);
                        };

                        // Por identidade, não por quantidade: nenhum registro fica órfão.
                        // Desconta só o que foi removido agora, assim uma nova tentativa
                        // após falha parcial não desconta o mesmo credor duas vezes.
                        let (removidos, mantidos): (Vec<UsoEstoque>, Vec<UsoEstoque>) =
                            credor.estoque_usado_em.drain(..).partition(|uso| {
                                uso.po_id == po_id && uso.item_index.is_none_or(|i| i == item_index)
                            });
                        credor.estoque_usado_em = mantidos;
                        if removidos.is_empty() {
                            return Ok(None);
                        }

                        let devolvido: Decimal = removidos.iter().map(|uso| uso.quantidade).sum();
                        credor.quantidade_usada_estoque =
                            (credor.quantidade_usada_estoque - devolvido).max(Decimal::ZERO);
                        Ok(Some(devolvido))
                    })
                    .await;

                    match escrita {
                        Ok(Some(devolvido)) => total += devolvido,
                        Ok(None) => tracing::warn!(
                            "Reversão: credor {:?} de '{}' já não tinha registros da OC {}",
                            origem.numero_oc,
                            codigo,
                            po_id
                        ),
                        Err(e) => return Err(falha_na_reversao(e, po_id, &codigo)),
                    }
                }
                TipoOrigem::Manual => {
                    if let Err(e) = self.estoque_manual.update_usage(&codigo, -origem.quantidade).await {
                        return Err(falha_na_reversao(e, po_id, &codigo));
                    }
                    total += origem.quantidade;
                }
            }
        }

        // 2. Limpa o consumidor (mesmo sem origens: limpeza defensiva)
        let escrita = atualizar_itens(self.pedidos.as_ref(), po_id, |pedido| {
            let item = pedido
                .itens
                .get_mut(item_index)
                .ok_or(AppError::ItemNotFound { po_id, item_index })?;

            let mut limpo = item.clone();
            limpo.limpar_emprestimo();
            if limpo == *item {
                return Ok(None);
            }
            *item = limpo;
            Ok(Some(()))
        })
        .await;

        if let Err(e) = escrita {
            return Err(falha_na_reversao(e, po_id, &codigo));
        }

        let revertido = !item.estoque_origem.is_empty();
        if revertido {
            tracing::info!(
                "Estoque: revertidos {} de '{}' da OC {} item {}",
                total,
                codigo,
                po_id,
                item_index
            );
        }

        Ok(ResultadoReversao {
            revertido,
            quantidade_revertida: total,
        })
    }

    /// Desfaz as retiradas de estoque manual de um `usar_estoque` que não
    /// chegou a gravar o consumidor. Devolve o que continua gravado.
    async fn devolver_manuais(&self, codigo: &str, origens: Vec<OrigemEstoque>) -> Vec<OrigemEstoque> {
        let mut pendentes = Vec::new();
        for origem in origens {
            if origem.tipo != TipoOrigem::Manual {
                pendentes.push(origem);
                continue;
            }
            if let Err(e) = self.estoque_manual.update_usage(codigo, -origem.quantidade).await {
                tracing::error!(
                    "Estoque manual '{}': falha ao devolver {} após erro no consumidor: {}",
                    codigo,
                    origem.quantidade,
                    e
                );
                pendentes.push(origem);
            }
        }
        pendentes
    }

    /// Acha o item credor: pelo `(po_id, item_index)` gravado se ainda tiver
    /// o mesmo código, senão por `(numero_oc, codigo_item)`.
    async fn localizar_credor(
        &self,
        origem: &OrigemEstoque,
        codigo_item: &str,
    ) -> Result<Option<(Uuid, usize)>, AppError> {
        if let (Some(credor_po_id), Some(credor_index)) = (origem.po_id, origem.item_index) {
            if let Some(pedido) = self.pedidos.read_one(credor_po_id).await? {
                let confere = pedido
                    .itens
                    .get(credor_index)
                    .is_some_and(|c| c.codigo_item == codigo_item);
                if confere {
                    return Ok(Some((credor_po_id, credor_index)));
                }
            }
        }

        let Some(numero_oc) = origem.numero_oc.as_deref() else {
            return Ok(None);
        };

        let pedidos = self.pedidos.read_all().await?;
        Ok(pedidos
            .iter()
            .filter(|p| p.numero_oc == numero_oc)
            .find_map(|p| p.item_por_codigo(codigo_item).map(|(idx, _)| (p.id, idx))))
    }
}

fn validar_elegibilidade(item: &PurchaseOrderItem) -> Result<(), AppError> {
    if item.atendido_por_estoque {
        return Err(AppError::ItemNotEligible(format!(
            "item '{}' já foi atendido por estoque",
            item.codigo_item
        )));
    }
    if item.is_autoatendido() {
        return Err(AppError::ItemNotEligible(format!(
            "item '{}' já é atendido pelas próprias compras",
            item.codigo_item
        )));
    }
    Ok(())
}

fn preco_medio_ponderado(origens: &[OrigemEstoque]) -> Decimal {
    let (qtd, total) = origens.iter().fold((Decimal::ZERO, Decimal::ZERO), |(q, t), o| {
        (q + o.quantidade, t + o.quantidade * o.preco_unitario)
    });
    if qtd > Decimal::ZERO { total / qtd } else { Decimal::ZERO }
}

// Sem nada gravado ainda: o erro volta como está. Com escritas já feitas,
// o estado ficou inconsistente e só a reconciliação corrige.
fn falha_no_meio(erro: AppError, po_id: Uuid, codigo: &str, ja_gravadas: &[OrigemEstoque]) -> AppError {
    if ja_gravadas.is_empty() {
        return erro;
    }
    let (manuais, pedidos): (Vec<&OrigemEstoque>, Vec<&OrigemEstoque>) =
        ja_gravadas.iter().partition(|o| o.tipo == TipoOrigem::Manual);
    tracing::error!(
        "🔥 Uso de estoque interrompido: OC {} código '{}', {} credor(es) de pedido já gravado(s). Rode a reconciliação. Erro: {}",
        po_id,
        codigo,
        pedidos.len(),
        erro
    );
    // Estoque manual não passa pela reconciliação: ajuste à mão
    for manual in manuais {
        tracing::error!(
            "🔥 Estoque manual '{}' ficou com {} a mais em quantidade_usada",
            codigo,
            manual.quantidade
        );
    }
    AppError::StorageWriteFailure(erro.to_string())
}

fn falha_na_reversao(erro: AppError, po_id: Uuid, codigo: &str) -> AppError {
    tracing::error!(
        "🔥 Reversão interrompida: OC {} código '{}'. Rode a reconciliação. Erro: {}",
        po_id,
        codigo,
        erro
    );
    AppError::StorageWriteFailure(erro.to_string())
}
