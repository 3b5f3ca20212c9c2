//! Confluence API types.

mod page;

pub use page::{Page, PagesResponse};
