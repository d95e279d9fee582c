pub mod traits;

// Rate feed implementations
pub mod cbr;
