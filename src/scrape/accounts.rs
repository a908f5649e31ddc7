//! Account-search page extraction: publishing-account profiles and the link
//! to an account's own message page.

use crate::scrape::listing::{select_attr, select_text};
use crate::scrape::types::AccountProfile;
use scraper::{Html, Selector};

const LABEL_INTRODUCTION: &str = "功能介绍";
const LABEL_VERIFICATION: &str = "微信认证";

/// Extract account profiles from an account-search listing page, in page
/// order. Unlabeled or absent `dl` blocks leave the matching field empty.
pub fn extract_account_profiles(html: &str) -> Vec<AccountProfile> {
    let document = Html::parse_document(html);
    let Ok(item_sel) = Selector::parse(".news-list2 li") else {
        return Vec::new();
    };
    let dl_sel = Selector::parse("dl").ok();

    document
        .select(&item_sel)
        .map(|item| {
            let mut profile = AccountProfile {
                title: select_text(&item, ".tit"),
                wechat_id: select_text(&item, r#"[name="em_weixinhao"]"#),
                avatar: select_attr(&item, ".img-box img", "src"),
                qrcode: select_attr(&item, ".ew-pop .pop img", "src"),
                ..AccountProfile::default()
            };
            if let Some(dl_sel) = &dl_sel {
                for dl in item.select(dl_sel) {
                    let label = select_text(&dl, "dt");
                    let value = select_text(&dl, "dd");
                    if label.starts_with(LABEL_INTRODUCTION) {
                        profile.introduction = value;
                    } else if label.starts_with(LABEL_VERIFICATION) {
                        profile.verification = value;
                    }
                }
            }
            profile
        })
        .collect()
}

/// Canonical message-page URL of the first account result, if any.
pub fn resolve_account_page_url(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let sel = Selector::parse(".news-list2 li .img-box a").ok()?;
    document
        .select(&sel)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}
