//! Query-endpoint URL construction from placeholder templates.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

/// Replace every occurrence of each pair's token with its replacement text.
/// Tokens must be substring-unique within the template; an absent token is a
/// no-op. Replacements are inserted verbatim, so callers encode values first.
pub fn substitute(template: &str, pairs: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (token, replacement) in pairs {
        out = out.replace(token, replacement);
    }
    out
}

/// A keyword search against a listing endpoint. Pages are 1-based; pagination
/// is the endpoint's contract, not computed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub page: u32,
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>, page: u32) -> Self {
        Self {
            keyword: keyword.into(),
            page,
        }
    }

    /// Build the concrete URL from a template carrying `query` and `page`
    /// placeholder tokens.
    pub fn build_url(&self, template: &str) -> String {
        let keyword = utf8_percent_encode(&self.keyword, NON_ALPHANUMERIC);
        substitute(
            template,
            &[
                ("query", format!("query={}", keyword)),
                ("page", format!("page={}", self.page)),
            ],
        )
    }
}
