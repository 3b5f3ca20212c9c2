//! Confluence integration for wikipub.
//!
//! This crate provides [`ConfluenceClient`], a blocking REST API client for
//! Confluence Server/Data Center that implements
//! [`WikiGateway`](wikipub_sync::WikiGateway).
//!
//! # API Client
//!
//! ```ignore
//! use wikipub_confluence::{Auth, ConfluenceClient};
//! use wikipub_config::Representation;
//! use wikipub_sync::{PageLookup, WikiGateway};
//!
//! let client = ConfluenceClient::new(
//!     "https://confluence.example.com",
//!     Auth::basic("ci", "secret"),
//!     Representation::Wiki,
//! );
//!
//! if let PageLookup::Found(page) = client.find_page("DOC", "Home", "MyLib")? {
//!     println!("{}", client.page_url(page.id.as_deref().unwrap_or_default()));
//! }
//! ```

// API client
mod client;
pub use client::{Auth, ConfluenceClient};

// WikiGateway implementation
mod gateway;

// Types (internal)
mod types;

// Errors
pub mod error;
pub use error::ConfluenceError;
