pub mod conversion_service;
pub mod ledger_service;
pub mod report_service;
