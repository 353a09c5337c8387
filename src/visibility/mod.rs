pub mod check;
pub mod resolver;
