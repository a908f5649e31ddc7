/// One entry of a listing page, in page order. Transient: consumed by the
/// detail extractor immediately after listing extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCandidate {
    pub title: String,
    pub url: String,
    pub account_name: String,
    pub account_url: String,
    pub description: String,
    /// Epoch seconds from the inline time-conversion script, if one lined up
    /// with this item.
    pub publish_time: Option<i64>,
    /// Remote poster image URLs, zero or more.
    pub posters: Vec<String>,
}

/// Fields extracted from an article detail page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticleDetail {
    pub author_name: String,
    pub author_avatar: String,
    /// Raw inner markup of the content container; image references are
    /// rewritten later.
    pub content: String,
}

/// One message of an account's embedded feed, mapped to canonical names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMessage {
    pub title: String,
    pub url: String,
    pub poster: String,
    pub author_name: String,
    pub description: String,
    /// Epoch seconds.
    pub publish_time: i64,
}

/// The persisted article shape. `content` and `poster` hold local image
/// paths once the rewriter has run; `author_id` is always NULL from this
/// pipeline. tag/likes/type are fixed 0 defaults applied by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub title: String,
    pub poster: String,
    pub author_avatar: String,
    pub author_name: String,
    /// Collection/category tag, stored in the `col` column.
    pub column: String,
    pub description: String,
    pub content: String,
    /// Epoch-second offset for `updateTime`.
    pub publish_time: Option<i64>,
}

/// A publishing account's profile, persisted independently of articles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountProfile {
    pub title: String,
    pub wechat_id: String,
    pub avatar: String,
    pub qrcode: String,
    pub introduction: String,
    pub verification: String,
}
