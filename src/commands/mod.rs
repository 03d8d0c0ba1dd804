pub mod key;
pub mod rewrite;
