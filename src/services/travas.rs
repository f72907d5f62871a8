// src/services/travas.rs

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Serializa as escritas de empréstimo por `codigo_item`.
///
/// `Use`/`Revert`/mudança de status seguram a trava do código (e a leitura
/// do portão). A reconciliação pega o portão em modo exclusivo e espera
/// todas as operações em andamento terminarem.
#[derive(Debug, Default)]
pub struct TravasEstoque {
    // Só guarda códigos com trava em uso ou em espera
    por_codigo: DashMap<String, Arc<Mutex<()>>>,
    portao: RwLock<()>,
}

pub struct TravaCodigo<'a> {
    por_codigo: &'a DashMap<String, Arc<Mutex<()>>>,
    codigo_item: String,
    codigo: Option<OwnedMutexGuard<()>>,
    _portao: RwLockReadGuard<'a, ()>,
}

impl TravasEstoque {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn travar_codigo(&self, codigo_item: &str) -> TravaCodigo<'_> {
        // Portão primeiro, depois o código: mesma ordem em todo lugar
        let portao = self.portao.read().await;
        let mutex = self
            .por_codigo
            .entry(codigo_item.to_string())
            .or_default()
            .clone();
        let codigo = mutex.lock_owned().await;

        TravaCodigo {
            por_codigo: &self.por_codigo,
            codigo_item: codigo_item.to_string(),
            codigo: Some(codigo),
            _portao: portao,
        }
    }

    pub async fn travar_tudo(&self) -> RwLockWriteGuard<'_, ()> {
        self.portao.write().await
    }
}

impl Drop for TravaCodigo<'_> {
    fn drop(&mut self) {
        // Solta o mutex antes; a entrada sai do mapa se ninguém mais a referencia.
        // `remove_if` segura o shard, então não corre com um `entry().clone()`.
        drop(self.codigo.take());
        self.por_codigo
            .remove_if(&self.codigo_item, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn released_codes_leave_the_registry() {
        let travas = TravasEstoque::new();

        let trava = travas.travar_codigo("114641").await;
        assert!(travas.por_codigo.contains_key("114641"));
        drop(trava);
        assert!(travas.por_codigo.is_empty());

        let primeira = travas.travar_codigo("A").await;
        let segunda = travas.travar_codigo("B").await;
        assert_eq!(travas.por_codigo.len(), 2);
        drop(primeira);
        assert!(!travas.por_codigo.contains_key("A"));
        assert!(travas.por_codigo.contains_key("B"));
        drop(segunda);
        assert!(travas.por_codigo.is_empty());
    }

    #[tokio::test]
    async fn waiting_task_keeps_the_entry_alive() {
        let travas = Arc::new(TravasEstoque::new());
        let trava = travas.travar_codigo("114641").await;

        let outra = travas.clone();
        let espera = tokio::spawn(async move {
            let _trava = outra.travar_codigo("114641").await;
        });
        // Mapa + guarda atual + tarefa esperando
        while Arc::strong_count(&*travas.por_codigo.get("114641").unwrap()) < 3 {
            tokio::task::yield_now().await;
        }

        drop(trava);
        assert!(travas.por_codigo.contains_key("114641"));
        espera.await.unwrap();
        assert!(travas.por_codigo.is_empty());
    }
}
