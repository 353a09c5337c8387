pub mod digest;
pub mod error;
