//! HTML fragment parsing and serialization for the DOM arena.
//!
//! The parser is a forgiving single-pass tokenizer feeding a stack of open
//! elements. It never synthesizes elements (no implicit TBODY), which keeps
//! table sectioning under the control of the table normalizer.

use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};

use super::{Dom, NodeId, NodeKind};

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

#[derive(Debug, PartialEq)]
enum Token {
    StartTag {
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag(String),
    Comment(String),
    Text(String),
}

pub fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_rawtext_element(name: &str) -> bool {
    name == "script" || name == "style"
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b':'
}

/// Position of `</name` followed by optional whitespace and `>`, case-insensitive.
fn find_close_tag(haystack: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let needle = format!("</{name}");
    let needle = needle.as_bytes();
    let mut i = 0;
    while i + needle.len() <= bytes.len() {
        if bytes[i] == b'<' && bytes[i..i + needle.len()].eq_ignore_ascii_case(needle) {
            let mut k = i + needle.len();
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < bytes.len() && bytes[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        if bytes[i] != b'<' {
            let start = i;
            while i < len && bytes[i] != b'<' {
                i += 1;
            }
            let decoded = decode_html_entities(&input[start..i]);
            if !decoded.is_empty() {
                out.push(Token::Text(decoded.into_owned()));
            }
            continue;
        }

        if input[i..].starts_with(COMMENT_START) {
            let body_start = i + COMMENT_START.len();
            match input[body_start..].find(COMMENT_END) {
                Some(end) => {
                    out.push(Token::Comment(input[body_start..body_start + end].to_string()));
                    i = body_start + end + COMMENT_END.len();
                    continue;
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    break;
                }
            }
        }

        // Doctype and other markup declarations carry no content for a fragment
        if i + 1 < len && (bytes[i + 1] == b'!' || bytes[i + 1] == b'?') {
            match input[i..].find('>') {
                Some(end) => {
                    i += end + 1;
                    continue;
                }
                None => break,
            }
        }

        if i + 1 < len && bytes[i + 1] == b'/' {
            let start = i + 2;
            let mut j = start;
            while j < len && is_name_char(bytes[j]) {
                j += 1;
            }
            let name = input[start..j].to_ascii_lowercase();
            while j < len && bytes[j] != b'>' {
                j += 1;
            }
            if j < len {
                j += 1;
            }
            if !name.is_empty() {
                out.push(Token::EndTag(name));
            }
            i = j;
            continue;
        }

        let start = i + 1;
        let mut j = start;
        while j < len && is_name_char(bytes[j]) {
            j += 1;
        }
        if j == start {
            // A lone '<' is text
            out.push(Token::Text("<".to_string()));
            i += 1;
            continue;
        }

        let name = input[start..j].to_ascii_lowercase();
        let mut k = j;
        let mut attributes: Vec<(String, String)> = Vec::new();
        let mut self_closing = false;

        loop {
            while k < len && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k >= len {
                break;
            }
            if bytes[k] == b'>' {
                k += 1;
                break;
            }
            if bytes[k] == b'/' {
                if k + 1 < len && bytes[k + 1] == b'>' {
                    self_closing = true;
                    k += 2;
                    break;
                }
                k += 1;
                continue;
            }
            let name_start = k;
            while k < len && is_name_char(bytes[k]) {
                k += 1;
            }
            if name_start == k {
                k += 1;
                continue;
            }
            let attribute_name = input[name_start..k].to_ascii_lowercase();
            while k < len && bytes[k].is_ascii_whitespace() {
                k += 1;
            }

            let mut value = String::new();
            if k < len && bytes[k] == b'=' {
                k += 1;
                while k < len && bytes[k].is_ascii_whitespace() {
                    k += 1;
                }
                if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                    let quote = bytes[k];
                    k += 1;
                    let value_start = k;
                    while k < len && bytes[k] != quote {
                        k += 1;
                    }
                    value = decode_html_entities(&input[value_start..k]).into_owned();
                    if k < len {
                        k += 1;
                    }
                } else {
                    let value_start = k;
                    while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                        if bytes[k] == b'/' && k + 1 < len && bytes[k + 1] == b'>' {
                            break;
                        }
                        k += 1;
                    }
                    value = decode_html_entities(&input[value_start..k]).into_owned();
                }
            }
            if !attributes.iter().any(|(n, _)| *n == attribute_name) {
                attributes.push((attribute_name, value));
            }
        }

        if is_void_element(&name) {
            self_closing = true;
        }
        let rawtext = is_rawtext_element(&name) && !self_closing;
        out.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
        });
        i = k;

        if rawtext {
            match find_close_tag(&input[i..], &name) {
                Some((body_end, close_end)) => {
                    if body_end > 0 {
                        out.push(Token::Text(input[i..i + body_end].to_string()));
                    }
                    out.push(Token::EndTag(name));
                    i += close_end;
                }
                None => {
                    if i < len {
                        out.push(Token::Text(input[i..].to_string()));
                    }
                    break;
                }
            }
        }
    }

    out
}

/// Parses `html` into a new detached fragment and returns the fragment node.
pub fn parse_fragment(dom: &mut Dom, html: &str) -> NodeId {
    let fragment = dom.create_fragment();
    let mut open: Vec<(NodeId, String)> = Vec::new();

    for token in tokenize(html) {
        let parent = open.last().map(|(n, _)| *n).unwrap_or(fragment);
        match token {
            Token::Text(text) => {
                let node = dom.create_text(&text);
                attach(dom, parent, node);
            }
            Token::Comment(text) => {
                let node = dom.create_comment(&text);
                attach(dom, parent, node);
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let node = dom.create_element_with(&name, attributes);
                attach(dom, parent, node);
                if !self_closing {
                    open.push((node, name));
                }
            }
            Token::EndTag(name) => {
                if let Some(index) = open.iter().rposition(|(_, n)| *n == name) {
                    open.truncate(index);
                }
            }
        }
    }

    fragment
}

fn attach(dom: &mut Dom, parent: NodeId, node: NodeId) {
    // Fresh nodes under a fresh element or fragment: the insert cannot fail
    if let Err(err) = dom.append_child(parent, node) {
        log::warn!("dropping parsed node {node:?}: {err}");
    }
}

impl Dom {
    /// Replaces the children of `node` with the parsed `html`. The old
    /// children are released.
    pub fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<(), super::DomError> {
        self.set_inner_html_retaining(node, html, |_| false)
    }

    /// Like [`Dom::set_inner_html`], but old descendants for which `keep`
    /// returns true stay allocated (detached).
    pub fn set_inner_html_retaining(
        &mut self,
        node: NodeId,
        html: &str,
        keep: impl Fn(NodeId) -> bool,
    ) -> Result<(), super::DomError> {
        let fragment = parse_fragment(self, html);
        for child in self.children(node).to_vec() {
            self.release(child, &keep);
        }
        self.append_child(node, fragment)?;
        self.release(fragment, |_| false);
        Ok(())
    }
}

pub fn inner_html(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    let rawtext = dom.tag_name(node).is_some_and(is_rawtext_element);
    for &child in dom.children(node) {
        write_node(dom, child, rawtext, &mut out);
    }
    out
}

pub fn outer_html(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    let rawtext = dom
        .parent(node)
        .and_then(|p| dom.tag_name(p))
        .is_some_and(is_rawtext_element);
    write_node(dom, node, rawtext, &mut out);
    out
}

fn write_node(dom: &Dom, node: NodeId, rawtext: bool, out: &mut String) {
    match dom.kind(node) {
        NodeKind::Text(text) => {
            if rawtext {
                out.push_str(text);
            } else {
                out.push_str(&encode_text(text));
            }
        }
        NodeKind::Comment(text) => {
            out.push_str(COMMENT_START);
            out.push_str(text);
            out.push_str(COMMENT_END);
        }
        NodeKind::Fragment => out.push_str(&inner_html(dom, node)),
        NodeKind::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&encode_double_quoted_attribute(value));
                out.push('"');
            }
            out.push('>');
            if is_void_element(&element.tag) {
                return;
            }
            out.push_str(&inner_html(dom, node));
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn round_trip(html: &str) -> String {
        let mut dom = Dom::new();
        let fragment = parse_fragment(&mut dom, html);
        inner_html(&dom, fragment)
    }

    // ============ Tokenizer tests ============

    #[test]
    fn test_tokenize_attributes() {
        let tokens = tokenize(r#"<a href="x" data-v='1' hidden title=t>"#);
        assert_eq!(
            tokens,
            vec![Token::StartTag {
                name: "a".to_string(),
                attributes: vec![
                    ("href".to_string(), "x".to_string()),
                    ("data-v".to_string(), "1".to_string()),
                    ("hidden".to_string(), String::new()),
                    ("title".to_string(), "t".to_string()),
                ],
                self_closing: false,
            }]
        );
    }

    #[test]
    fn test_tokenize_skips_doctype_and_keeps_comments() {
        let tokens = tokenize("<!DOCTYPE html><!--c-->x");
        assert_eq!(
            tokens,
            vec![
                Token::Comment("c".to_string()),
                Token::Text("x".to_string())
            ]
        );
    }

    #[test]
    fn test_tokenize_rawtext_keeps_markup() {
        let tokens = tokenize("<style>a<b{}</STYLE >");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1], Token::Text("a<b{}".to_string()));
    }

    // ============ Tree building tests ============

    #[test]
    fn test_parse_nested_structure() {
        let mut dom = Dom::new();
        let fragment = parse_fragment(&mut dom, "<div><span>a</span>b</div><br>c");
        let top = dom.children(fragment).to_vec();
        assert_eq!(top.len(), 3);
        assert_eq!(dom.tag_name(top[0]), Some("div"));
        assert_eq!(dom.children(top[0]).len(), 2);
        assert_eq!(dom.tag_name(top[1]), Some("br"));
        assert_eq!(dom.text(top[2]), Some("c"));
    }

    #[test]
    fn test_parse_does_not_insert_tbody() {
        let mut dom = Dom::new();
        let fragment = parse_fragment(&mut dom, "<table><tr><td>1</td></tr></table>");
        let table = dom.children(fragment)[0];
        assert_eq!(dom.tag_name(dom.children(table)[0]), Some("tr"));
    }

    #[test]
    fn test_unmatched_end_tag_is_ignored() {
        assert_eq!(round_trip("<b>x</i>y</b>"), "<b>xy</b>");
    }

    #[test]
    fn test_unclosed_elements_are_closed_at_end() {
        assert_eq!(round_trip("<div><span>x"), "<div><span>x</span></div>");
    }

    #[test]
    fn test_entities_decode_and_encode() {
        let mut dom = Dom::new();
        let fragment = parse_fragment(&mut dom, "a &amp; b &lt;c&gt;");
        assert_eq!(dom.text(dom.children(fragment)[0]), Some("a & b <c>"));
        assert_eq!(inner_html(&dom, fragment), "a &amp; b &lt;c&gt;");
    }

    // ============ Serialization tests ============

    #[test]
    fn test_serialize_entity_markup() {
        assert_snapshot!(
            round_trip(r#"<span class="_Entity _EType_A _EId_B" contenteditable="false"></span><img src="a.png"/><hr>"#),
            @r#"<span class="_Entity _EType_A _EId_B" contenteditable="false"></span><img src="a.png"><hr>"#
        );
    }

    #[test]
    fn test_zero_width_space_survives_round_trip() {
        assert_eq!(
            round_trip("<span>&#8203;</span>"),
            "<span>\u{200B}</span>"
        );
    }

    #[test]
    fn test_set_inner_html_replaces_children() {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(root, "<p>1</p>").unwrap();
        let old = dom.children(root)[0];
        dom.set_inner_html(root, "<p>2</p><p>3</p>").unwrap();
        assert_eq!(dom.children(root).len(), 2);
        assert_eq!(dom.parent(old), None);
        assert_eq!(outer_html(&dom, root), "<div><p>2</p><p>3</p></div>");
    }

    #[test]
    fn test_set_inner_html_reuses_released_slots() {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(root, "<p>one</p>").unwrap();
        dom.set_inner_html(root, "<p>two</p>").unwrap();
        let len = dom.arena_len();
        for i in 0..100 {
            dom.set_inner_html(root, &format!("<p>{i}</p>")).unwrap();
        }
        assert_eq!(dom.arena_len(), len);
        assert_eq!(dom.live_node_count(), 3);
    }
}
