pub mod purchase_order_repo;
pub use purchase_order_repo::{atualizar_itens, PurchaseOrderRepository, PurchaseOrderStore};
pub mod estoque_manual_repo;
pub use estoque_manual_repo::{EstoqueManualRepository, ManualStockStore};
pub mod memory_repo;
pub use memory_repo::{InMemoryManualStockStore, InMemoryPurchaseOrderStore};
