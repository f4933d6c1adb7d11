//! Markdown to HTML rendering for note fields.

use pulldown_cmark::{html, Options, Parser};

use ankimark_core::Renderer;

/// CommonMark renderer with tables and strikethrough.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);

        let parser = Parser::new_ext(markdown, options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ankimark_core::compact_html;

    #[test]
    fn paragraph_with_emphasis() {
        assert_eq!(
            MarkdownRenderer.render("What is *perro*?"),
            "<p>What is <em>perro</em>?</p>\n"
        );
    }

    #[test]
    fn strikethrough_enabled() {
        assert_eq!(MarkdownRenderer.render("~~old~~"), "<p><del>old</del></p>\n");
    }

    #[test]
    fn multiline_compacts_to_one_line() {
        let html = compact_html(&MarkdownRenderer.render("- a\n- b"));
        assert_eq!(html, "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn multiline_answer_keeps_word_boundary() {
        let html = compact_html(
            &MarkdownRenderer.render("Each value has one owner.\nDropped at scope end."),
        );
        assert_eq!(html, "<p>Each value has one owner. Dropped at scope end.</p>");
    }

    #[test]
    fn cloze_braces_survive() {
        let html = compact_html(&MarkdownRenderer.render("The {{c1::sun}} is a star"));
        assert_eq!(html, "<p>The {{c1::sun}} is a star</p>");
    }
}
