//! Listing-page extraction: fixed-position list items plus the inline
//! time-conversion script calls that carry each item's publish time.

use crate::scrape::types::ListingCandidate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Publish times are not DOM attributes; the page writes them through
/// `document.write(timeConvert('<epoch>'))` calls, one per list item, in
/// document order. They are zipped positionally against the items below.
static TIME_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"document\.write\(timeConvert\('(\d{10})'\)\)").unwrap());

/// Extract listing candidates in the page's visual order. An empty result
/// page yields an empty vec; an item without a matching time entry gets
/// `publish_time: None`.
pub fn extract_listing(html: &str) -> Vec<ListingCandidate> {
    let times = extract_publish_times(html);
    let document = Html::parse_document(html);
    let Ok(item_sel) = Selector::parse(".news-list li") else {
        return Vec::new();
    };

    document
        .select(&item_sel)
        .enumerate()
        .map(|(i, item)| ListingCandidate {
            title: select_text(&item, "h3"),
            url: select_attr(&item, "h3 a", "href"),
            description: select_text(&item, ".txt-box > p"),
            account_name: select_text(&item, ".account"),
            account_url: select_attr(&item, ".account", "href"),
            publish_time: times.get(i).copied(),
            posters: extract_posters(&item),
        })
        .collect()
}

/// All inline time-conversion calls, in document order.
pub fn extract_publish_times(html: &str) -> Vec<i64> {
    TIME_CALL_RE
        .captures_iter(html)
        .filter_map(|c| c[1].parse().ok())
        .collect()
}

/// Poster URLs from an item's image elements. Lazy-loaded images carry their
/// real URL only in `data-src`, so that attribute is the fallback when `src`
/// is absent.
fn extract_posters(item: &ElementRef<'_>) -> Vec<String> {
    let Ok(img_sel) = Selector::parse("img") else {
        return Vec::new();
    };
    item.select(&img_sel)
        .filter_map(|img| {
            img.value()
                .attr("src")
                .or_else(|| img.value().attr("data-src"))
        })
        .filter(|src| src.starts_with("http"))
        .map(str::to_string)
        .collect()
}

pub(crate) fn select_text(scope: &ElementRef<'_>, selector: &str) -> String {
    let Ok(sel) = Selector::parse(selector) else {
        return String::new();
    };
    scope
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

pub(crate) fn select_attr(scope: &ElementRef<'_>, selector: &str, attr: &str) -> String {
    let Ok(sel) = Selector::parse(selector) else {
        return String::new();
    };
    scope
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, with_lazy_img: bool) -> String {
        let img = if with_lazy_img {
            r#"<img data-src="http://img.example.com/lazy.jpg">"#
        } else {
            r#"<img src="http://img.example.com/eager.jpg">"#
        };
        format!(
            r#"<li>
                 <div class="img-box">{img}</div>
                 <div class="txt-box">
                   <h3><a href="http://mp.example.com/s/{title}">{title}</a></h3>
                   <p>summary of {title}</p>
                   <a class="account" href="http://mp.example.com/profile/{title}">acct-{title}</a>
                 </div>
               </li>"#
        )
    }

    fn listing_page(items: &[String], times: &[&str]) -> String {
        let scripts: String = times
            .iter()
            .map(|t| format!("<script>document.write(timeConvert('{t}'))</script>"))
            .collect();
        format!(
            "<html><body><ul class=\"news-list\">{}</ul>{}</body></html>",
            items.concat(),
            scripts
        )
    }

    #[test]
    fn extracts_items_in_page_order() {
        let page = listing_page(
            &[item("first", false), item("second", true)],
            &["1499999990", "1499999991"],
        );
        let candidates = extract_listing(&page);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "first");
        assert_eq!(candidates[0].url, "http://mp.example.com/s/first");
        assert_eq!(candidates[0].account_name, "acct-first");
        assert_eq!(candidates[0].description, "summary of first");
        assert_eq!(candidates[1].title, "second");
    }

    #[test]
    fn lazy_image_falls_back_to_data_src() {
        let page = listing_page(&[item("a", true)], &["1400000000"]);
        let candidates = extract_listing(&page);
        assert_eq!(candidates[0].posters, vec!["http://img.example.com/lazy.jpg"]);
    }

    #[test]
    fn eager_image_prefers_src() {
        let page = listing_page(&[item("a", false)], &["1400000000"]);
        let candidates = extract_listing(&page);
        assert_eq!(
            candidates[0].posters,
            vec!["http://img.example.com/eager.jpg"]
        );
    }

    #[test]
    fn fewer_time_entries_than_items_leaves_tail_empty() {
        let page = listing_page(
            &[item("a", false), item("b", false), item("c", false)],
            &["1499142762", "1499142763"],
        );
        let candidates = extract_listing(&page);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].publish_time, Some(1499142762));
        assert_eq!(candidates[1].publish_time, Some(1499142763));
        assert_eq!(candidates[2].publish_time, None);
    }

    #[test]
    fn empty_page_yields_empty_vec() {
        let candidates = extract_listing("<html><body>nothing here</body></html>");
        assert!(candidates.is_empty());
    }
}
