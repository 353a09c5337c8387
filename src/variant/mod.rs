pub mod encode;
pub mod verify;
