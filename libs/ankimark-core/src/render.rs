//! Markdown rendering seam.

/// Converts card text to the HTML stored in note fields.
pub trait Renderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

/// Put rendered HTML on one line and trim it.
///
/// Line breaks next to a tag are dropped. A line break between two runs of
/// text is a soft break inside a paragraph and becomes a single space.
pub fn compact_html(html: &str) -> String {
    let html = html.replace('\r', "");
    let mut out = String::with_capacity(html.len());
    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\n' {
            out.push(c);
            continue;
        }
        let after_tag = out.is_empty() || out.ends_with('>');
        let before_tag = chars.peek().map_or(true, |next| matches!(next, '<' | '\n'));
        if !after_tag && !before_tag {
            out.push(' ');
        }
    }

    out.trim().to_string()
}
