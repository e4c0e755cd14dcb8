pub mod compositor;
pub mod text;
