//! Extraction of article and account data from rendered platform markup.
//!
//! Everything in this module is a pure transform from markup (or an embedded
//! JSON document) to typed records. Network access and persistence live
//! elsewhere; fixture-based tests pin down the expected source shapes so
//! format drift surfaces as a failing test.

pub mod accounts;
pub mod detail;
pub mod errors;
pub mod feed;
pub mod listing;
pub mod types;
pub mod url;

pub use accounts::{extract_account_profiles, resolve_account_page_url};
pub use detail::extract_article_detail;
pub use errors::ScrapeError;
pub use feed::extract_feed;
pub use listing::extract_listing;
pub use types::{AccountProfile, ArticleDetail, ArticleRecord, FeedMessage, ListingCandidate};
pub use url::{SearchQuery, substitute};
