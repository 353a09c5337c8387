pub mod opts;
pub mod processor;
