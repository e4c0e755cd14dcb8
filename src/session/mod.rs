pub mod editing;
pub mod selector;
