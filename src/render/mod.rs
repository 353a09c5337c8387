pub mod compositor;
pub mod flatten;
pub mod pixels;
pub mod placeholder;
