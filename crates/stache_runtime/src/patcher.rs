use stache_core::is_pre_text_tag;

/// The UI-patching surface a render program drives.
///
/// `identity` is stable across renders of the same template against data
/// with the same logical ids: generation id, node ordinal and, inside
/// loops, the context id. A diffing implementation keys its nodes on it;
/// the [`HtmlWriter`] used in tests ignores it.
pub trait Patcher {
    /// An element whose attributes are fully known up front.
    fn open_node(&mut self, tag: &str, identity: &str, attrs: &[(String, String)]);
    /// Three-phase open for elements with per-render attributes.
    fn open_node_start(&mut self, tag: &str, identity: &str);
    fn attr(&mut self, name: &str, value: &str);
    fn open_node_end(&mut self, tag: &str);
    fn close_node(&mut self, tag: &str);
    fn text(&mut self, text: &str);
    fn void_node(&mut self, tag: &str, identity: &str, attrs: &[(String, String)]);
}

/// Renders the instruction stream to an HTML string. Test support only;
/// production embedders implement [`Patcher`] over their own node tree.
#[derive(Default)]
pub struct HtmlWriter {
    out: String,
    /// A `pre`-class element was just opened; a leading newline in the next
    /// text must be doubled per the HTML serialization convention.
    pending_pre: bool,
}

impl HtmlWriter {
    pub fn new() -> HtmlWriter {
        HtmlWriter::default()
    }

    pub fn html(self) -> String {
        self.out
    }

    fn push_attrs(&mut self, attrs: &[(String, String)]) {
        for (name, value) in attrs {
            self.push_attr(name, value);
        }
    }

    fn push_attr(&mut self, name: &str, value: &str) {
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        self.out.push_str(&escape_attr(value));
        self.out.push('"');
    }
}

impl Patcher for HtmlWriter {
    fn open_node(&mut self, tag: &str, _identity: &str, attrs: &[(String, String)]) {
        self.out.push('<');
        self.out.push_str(tag);
        self.push_attrs(attrs);
        self.out.push('>');
        self.pending_pre = is_pre_text_tag(tag);
    }

    fn open_node_start(&mut self, tag: &str, _identity: &str) {
        self.out.push('<');
        self.out.push_str(tag);
        self.pending_pre = false;
    }

    fn attr(&mut self, name: &str, value: &str) {
        self.push_attr(name, value);
    }

    fn open_node_end(&mut self, tag: &str) {
        self.out.push('>');
        self.pending_pre = is_pre_text_tag(tag);
    }

    fn close_node(&mut self, tag: &str) {
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
        self.pending_pre = false;
    }

    fn text(&mut self, text: &str) {
        if self.pending_pre && text.starts_with('\n') {
            self.out.push('\n');
        }
        self.pending_pre = false;
        self.out.push_str(&escape_text(text));
    }

    fn void_node(&mut self, tag: &str, _identity: &str, attrs: &[(String, String)]) {
        self.out.push('<');
        self.out.push_str(tag);
        self.push_attrs(attrs);
        self.out.push('>');
        self.pending_pre = false;
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_nested_markup() {
        let mut writer = HtmlWriter::new();
        writer.open_node("div", "g:0", &[("class".to_string(), "box".to_string())]);
        writer.text("a < b");
        writer.void_node("br", "g:1", &[]);
        writer.close_node("div");
        assert_eq!(writer.html(), "<div class=\"box\">a &lt; b<br></div>");
    }

    #[test]
    fn three_phase_open_collects_attrs() {
        let mut writer = HtmlWriter::new();
        writer.open_node_start("p", "g:0");
        writer.attr("id", "x");
        writer.attr("title", "say \"hi\"");
        writer.open_node_end("p");
        writer.close_node("p");
        assert_eq!(writer.html(), "<p id=\"x\" title=\"say &quot;hi&quot;\"></p>");
    }

    #[test]
    fn doubles_the_leading_newline_of_pre_text() {
        let mut writer = HtmlWriter::new();
        writer.open_node("pre", "g:0", &[]);
        writer.text("\nfoo");
        writer.close_node("pre");
        assert_eq!(writer.html(), "<pre>\n\nfoo</pre>");

        let mut writer = HtmlWriter::new();
        writer.open_node("div", "g:0", &[]);
        writer.text("\nfoo");
        writer.close_node("div");
        assert_eq!(writer.html(), "<div>\nfoo</div>");
    }
}
