pub mod bulk;
pub mod document;
pub mod scroll;
