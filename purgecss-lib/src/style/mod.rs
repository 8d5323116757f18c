pub mod filter;
pub mod selector;
pub mod stylesheet;
