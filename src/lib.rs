//! weclip: a content ingestion pipeline for a public article platform.
//!
//! Keyword and account searches are resolved through listing pages into full
//! article records: detail pages (or an account's embedded message feed) are
//! extracted, remote images in the body are rewritten to locally stored
//! assets, and deduplicated records are persisted to MySQL.

pub mod config;
pub mod fetcher;
pub mod images;
pub mod pipeline;
pub mod renderer;
pub mod scrape;
pub mod store;
