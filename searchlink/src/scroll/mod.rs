//! Scroll pagination
//!
//! [`Scroll`] walks the complete result set of a search page by page using
//! server-side cursors, in either the standard or the legacy scan flavour.
//! [`parse_scroll_response`] validates each page before its cursor token is
//! trusted.

mod parser;
mod session;

pub use parser::{parse_scroll_response, ScrollPage, ScrollRejection};
pub use session::{
    Scroll, ScrollState, ScrollVariant, DEFAULT_SCROLL_SIZE, DEFAULT_SCROLL_TTL,
};
