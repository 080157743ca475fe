//! Last-mile cleanup of user input before it is sent to the backend.
//!
//! Only applied to values that already passed `validation`. These are not a
//! substitute for escaping on the backend side.

use scraper::{Html, Node};
use url::Url;

use crate::validation::is_web_scheme;

/// Elements whose content is dropped together with the tag.
const DROP_CONTENT: [&str; 25] = [
    "annotation-xml", "audio", "colgroup", "desc", "foreignobject", "head", "iframe", "math", "mi",
    "mn", "mo", "ms", "mtext", "noembed", "noframes", "noscript", "plaintext", "script", "style",
    "svg", "template", "thead", "title", "video", "xmp",
];

/// Strip every tag and attribute, returning trimmed plain text.
///
/// Used for names, descriptions, goal titles and notes. `<`, `>` and `&` in
/// the remaining text come back entity-escaped, so the result never contains
/// live markup and a second pass leaves it unchanged.
pub fn text(input: &str) -> String {
    escape(strip_markup(input).trim())
}

/// Strip markup and keep the URL only when it is an absolute http(s) URL.
///
/// `None` means the caller must omit the field.
pub fn url(input: &str) -> Option<String> {
    let cleaned = strip_markup(input).trim().to_string();

    // Decoded entities may have produced angle brackets or quotes
    if cleaned.contains(['<', '>', '"']) {
        return None;
    }

    match Url::parse(&cleaned) {
        Ok(parsed) if is_web_scheme(&parsed) => Some(cleaned),
        _ => None,
    }
}

pub fn email(input: &str) -> String {
    escape(strip_markup(input).trim()).to_lowercase()
}

/// Keep ASCII digits and decimal points only.
pub fn number(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

fn strip_markup(input: &str) -> String {
    if !input.contains(['<', '&']) {
        return input.to_string();
    }

    let fragment = Html::parse_fragment(input);
    let mut out = String::with_capacity(input.len());

    for node in fragment.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let dropped = node.ancestors().any(|ancestor| {
            ancestor.value().as_element().is_some_and(|el| {
                DROP_CONTENT
                    .iter()
                    .any(|name| el.name().eq_ignore_ascii_case(name))
            })
        });

        if !dropped {
            out.push_str(&text.text);
        }
    }

    out
}

fn escape(text: &str) -> String {
    if !text.contains(['<', '>', '&']) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_drops_script_body() {
        assert_eq!(text("<script>x</script>hello"), "hello");
    }

    #[test]
    fn text_keeps_inner_text_of_plain_tags() {
        assert_eq!(text("  <b>Viaje</b> a <i onclick=\"x()\">Cancún</i> "), "Viaje a Cancún");
    }

    #[test]
    fn text_keeps_encoded_tags_escaped() {
        let once = text("&lt;script&gt;alert(1)&lt;/script&gt;");
        assert_eq!(once, "&lt;script&gt;alert(1)&lt;/script&gt;");
        assert_eq!(text(&once), once);

        let img = text("&lt;img src=x onerror=alert(1)&gt;hi");
        assert!(!img.contains('<'));
        assert_eq!(text(&img), img);
    }

    #[test]
    fn text_escapes_bare_ampersand() {
        assert_eq!(text("Ahorro & <b>viaje</b>"), "Ahorro &amp; viaje");
        assert_eq!(text("Ahorro &amp; viaje"), "Ahorro &amp; viaje");
    }

    #[test]
    fn text_drops_content_of_embedded_documents() {
        assert_eq!(text("<svg><desc>x</desc><text>y</text></svg>ok"), "ok");
        assert_eq!(text("<math><mi>x</mi></math>ok"), "ok");
        assert_eq!(text("<xmp>raw</xmp>ok"), "ok");
        assert_eq!(text("<video>v</video><audio>a</audio>ok"), "ok");
    }

    #[test]
    fn text_keeps_textarea_content() {
        assert_eq!(text("<textarea>nota</textarea>"), "nota");
    }

    #[test]
    fn text_without_markup_is_trimmed_only() {
        assert_eq!(text("  ahorro 2025 "), "ahorro 2025");
    }

    #[test]
    fn url_rejects_script_scheme() {
        assert_eq!(url("javascript:alert(1)"), None);
        assert_eq!(url("data:text/html,hi"), None);
        assert_eq!(url("https://a.com/&lt;script&gt;"), None);
    }

    #[test]
    fn url_keeps_query_ampersands() {
        assert_eq!(
            url("https://a.com/img?w=10&h=20").as_deref(),
            Some("https://a.com/img?w=10&h=20")
        );
    }

    #[test]
    fn url_keeps_web_urls_unchanged() {
        assert_eq!(
            url("https://a.com/b.png").as_deref(),
            Some("https://a.com/b.png")
        );
        assert_eq!(
            url("  http://a.com/b.png ").as_deref(),
            Some("http://a.com/b.png")
        );
    }

    #[test]
    fn email_is_lowercased() {
        assert_eq!(email(" Ana.Perez@Mail.COM "), "ana.perez@mail.com");
    }

    #[test]
    fn number_strips_non_numeric() {
        assert_eq!(number("$1,250.50"), "1250.50");
        assert_eq!(number("abc"), "");
    }
}
