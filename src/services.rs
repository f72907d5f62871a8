pub mod allocation_service;
pub mod ledger_service;
pub mod reconciliation_service;
pub mod status_service;
pub mod travas;
