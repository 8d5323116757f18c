pub mod content;
pub mod html;
pub mod token_set;
