//! Share-intent URL building.
//!
//! Each supported platform exposes a web intent that can be pre-filled from
//! an idea. Instagram has no URL-based share intent, so it yields `None`.

use urlencoding::encode;

use crate::models::Platform;

/// Content to pre-fill into a platform share intent.
#[derive(Debug, Clone, Default)]
pub struct ShareConfig {
    /// Primary text (the idea title).
    pub text: String,
    /// Optional link to attach.
    pub url: Option<String>,
    /// Optional explicit title; falls back to `text` where the platform
    /// distinguishes the two.
    pub title: Option<String>,
    /// Hashtags, joined comma-separated where supported.
    pub tags: Vec<String>,
}

/// Build the share-intent URL for `platform`, or `None` when the platform
/// has no URL-based intent.
pub fn share_url(platform: Platform, config: &ShareConfig) -> Option<String> {
    let text = encode(&config.text);
    let url = config
        .url
        .as_deref()
        .map(|u| encode(u).into_owned())
        .unwrap_or_default();
    let title = config.title.as_deref().map(encode);
    let hashtags = config.tags.join(",");

    match platform {
        Platform::Twitter => {
            let mut intent = format!("https://twitter.com/intent/tweet?text={}", text);
            if config.url.is_some() {
                intent.push_str(&format!("&url={}", url));
            }
            if !hashtags.is_empty() {
                intent.push_str(&format!("&hashtags={}", hashtags));
            }
            Some(intent)
        }
        Platform::Reddit => Some(format!(
            "https://reddit.com/submit?title={}&url={}",
            title.unwrap_or(text),
            url
        )),
        Platform::Linkedin => Some(format!(
            "https://www.linkedin.com/sharing/share-offsite/?url={}&title={}",
            url,
            title.unwrap_or(text)
        )),
        Platform::Instagram => None,
    }
}
