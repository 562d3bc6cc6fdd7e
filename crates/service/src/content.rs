//! Rich-text helpers for blog content.

use std::borrow::Cow;

pub const EXCERPT_CHARS: usize = 200;

/// Video hosts an embedded `<iframe>` may point at.
pub const EMBED_HOSTS: &[&str] = &[
    "www.youtube.com",
    "youtube.com",
    "www.youtube-nocookie.com",
    "player.vimeo.com",
];

fn is_embed_src(src: &str) -> bool {
    let Some(rest) = src.trim().strip_prefix("https://") else { return false };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default().to_ascii_lowercase();
    EMBED_HOSTS.contains(&host.as_str())
}

/// Sanitize editor HTML: keeps formatting, links and images, drops scripts,
/// event handlers and unknown tags. Iframes keep `src` only for known video hosts.
pub fn sanitize_html(html: &str) -> String {
    ammonia::Builder::default()
        .add_tags(&["figure", "figcaption", "iframe"])
        .add_tag_attributes("iframe", &["src", "width", "height", "allowfullscreen"])
        .add_tag_attributes("img", &["width", "height", "loading"])
        .url_schemes(["http", "https", "mailto"].into_iter().collect())
        .attribute_filter(|element, attribute, value| match (element, attribute) {
            ("iframe", "src") if !is_embed_src(value) => None,
            _ => Some(Cow::Borrowed(value)),
        })
        .clean(html)
        .to_string()
}

/// Tags that break a line when rendered; inline tags join their text.
const BREAKING_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "iframe", "img", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Visible text of an HTML fragment with whitespace collapsed.
pub fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut tag: Option<String> = None;
    for ch in html.chars() {
        if let Some(t) = tag.as_mut() {
            if ch == '>' {
                let breaks = BREAKING_TAGS.contains(&tag_name(t).as_str());
                tag = None;
                if breaks {
                    text.push(' ');
                }
            } else {
                t.push(ch);
            }
        } else if ch == '<' {
            tag = Some(String::new());
        } else {
            text.push(ch);
        }
    }
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max` chars of the text, ellipsis appended when cut.
pub fn excerpt_from_html(html: &str, max: usize) -> String {
    let text = html_to_text(html);
    if text.chars().count() <= max {
        return text;
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}
