pub mod artifact;
pub mod backend;
