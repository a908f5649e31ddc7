//! Article detail-page extraction.

use crate::scrape::types::ArticleDetail;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

/// The author avatar is never rendered as an attribute; the page assigns it
/// to a script variable. Only the quoted value is kept.
static AVATAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"ori_head_img_url[^"]*"([^"]*)""#).unwrap());

/// Extract author name, author avatar and raw body markup from an article
/// page. Missing pieces come back as empty strings; the caller decides
/// whether an empty body is acceptable.
pub fn extract_article_detail(html: &str) -> ArticleDetail {
    let author_avatar = AVATAR_RE
        .captures(html)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    let document = Html::parse_document(html);

    // The meta list usually holds two <em> entries. The first is an
    // overloaded field whose meaning varies by page; the second is the one
    // that consistently carries the author name, so it is the canonical pick.
    let author_name = match Selector::parse(".rich_media_meta_list > em") {
        Ok(sel) => {
            let ems: Vec<_> = document.select(&sel).collect();
            if ems.len() > 1 {
                ems[1].text().collect::<String>().trim().to_string()
            } else {
                String::new()
            }
        }
        Err(_) => String::new(),
    };

    let content = Selector::parse("#js_content")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| el.inner_html())
        .unwrap_or_default();

    ArticleDetail {
        author_name,
        author_avatar,
        content,
    }
}
