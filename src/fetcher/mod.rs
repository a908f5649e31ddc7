pub mod client;
pub mod decode;
pub mod errors;
pub mod types;

pub use client::{fetch, fetch_bytes, fetch_page_with};
pub use errors::FetchError;
pub use types::PageResponse;
