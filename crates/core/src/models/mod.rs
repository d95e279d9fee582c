pub mod balance;
pub mod currency;
pub mod ledger;
pub mod operation;
pub mod rates;
pub mod report;
pub mod settings;
