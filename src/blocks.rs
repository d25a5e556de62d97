//! Rich-text HTML to Portable Text conversion.
//!
//! The target schema is a single `array of block` field, so only text-bearing
//! markup survives: paragraphs, headings, quotes, list items, decorators and
//! links. Images, embeds and scripts are dropped. The HTML parser is lenient,
//! so malformed input still yields the most literal block sequence it can.

use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};

pub const BLOCK_TYPE: &str = "block";
pub const SPAN_TYPE: &str = "span";
pub const LINK_TYPE: &str = "link";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(rename = "_type")]
    pub block_type: String,
    #[serde(rename = "_key")]
    pub key: String,
    pub style: String,
    pub children: Vec<Span>,
    pub mark_defs: Vec<MarkDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

impl Block {
    /// Concatenated text of all spans.
    pub fn plain_text(&self) -> String {
        self.children.iter().map(|s| s.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    #[serde(rename = "_type")]
    pub span_type: String,
    #[serde(rename = "_key")]
    pub key: String,
    pub text: String,
    pub marks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "_type")]
    pub def_type: String,
    #[serde(rename = "_key")]
    pub key: String,
    pub href: String,
}

/// Sequential `_key` source. One per document, so re-running a migration
/// produces byte-identical bodies.
#[derive(Debug, Default)]
pub struct KeyGen {
    next: u64,
}

impl KeyGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_key(&mut self) -> String {
        let key = format!("k{:06x}", self.next);
        self.next += 1;
        key
    }
}

pub fn html_to_blocks(html: &str, keys: &mut KeyGen) -> Vec<Block> {
    let fragment = Html::parse_fragment(html);
    let mut conv = Converter {
        keys,
        blocks: Vec::new(),
        current: None,
        marks: Vec::new(),
        links: Vec::new(),
        lists: Vec::new(),
        items: Vec::new(),
        preformatted: 0,
    };
    conv.walk(fragment.root_element());
    conv.flush();
    conv.blocks
}

struct Converter<'k> {
    keys: &'k mut KeyGen,
    blocks: Vec<Block>,
    current: Option<Block>,
    marks: Vec<String>,
    // (mark key, href) for every open <a>
    links: Vec<(String, String)>,
    lists: Vec<&'static str>,
    items: Vec<(&'static str, u32)>,
    preformatted: usize,
}

impl Converter<'_> {
    fn walk(&mut self, el: ElementRef<'_>) {
        for child in el.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.visit(child_el);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit(&mut self, el: ElementRef<'_>) {
        let name = el.value().name();
        match name {
            "p" => self.block(el, "normal"),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => self.block(el, name),
            "blockquote" => self.block(el, "blockquote"),
            "pre" => {
                self.preformatted += 1;
                self.marks.push("code".to_string());
                self.block(el, "normal");
                self.marks.pop();
                self.preformatted -= 1;
            }
            "ul" => self.list(el, "bullet"),
            "ol" => self.list(el, "number"),
            "li" => self.list_item(el),
            "br" => self.push_break(),
            "strong" | "b" => self.marked(el, "strong"),
            "em" | "i" => self.marked(el, "em"),
            "u" => self.marked(el, "underline"),
            "s" | "strike" | "del" => self.marked(el, "strike-through"),
            "code" => self.marked(el, "code"),
            "a" => self.link(el),
            "img" | "figure" | "iframe" | "script" | "style" | "noscript" | "video" => {}
            "div" | "section" | "article" | "header" | "footer" | "main" | "aside" => {
                self.flush();
                self.walk(el);
                self.flush();
            }
            _ => self.walk(el),
        }
    }

    fn block(&mut self, el: ElementRef<'_>, style: &str) {
        self.flush();
        self.open(style);
        self.walk(el);
        self.flush();
    }

    fn list(&mut self, el: ElementRef<'_>, kind: &'static str) {
        self.flush();
        self.lists.push(kind);
        self.walk(el);
        self.lists.pop();
    }

    fn list_item(&mut self, el: ElementRef<'_>) {
        self.flush();
        let kind = self.lists.last().copied().unwrap_or("bullet");
        let level = self.lists.len().max(1) as u32;
        self.items.push((kind, level));
        self.open("normal");
        self.walk(el);
        self.flush();
        self.items.pop();
    }

    fn marked(&mut self, el: ElementRef<'_>, mark: &str) {
        let pushed = !self.marks.iter().any(|m| m == mark);
        if pushed {
            self.marks.push(mark.to_string());
        }
        self.walk(el);
        if pushed {
            self.marks.pop();
        }
    }

    fn link(&mut self, el: ElementRef<'_>) {
        let Some(href) = el.value().attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
            self.walk(el);
            return;
        };
        let key = self.keys.next_key();
        self.links.push((key.clone(), href.to_string()));
        self.marks.push(key);
        self.walk(el);
        self.marks.pop();
        self.links.pop();
    }

    fn open(&mut self, style: &str) {
        let (list_item, level) = match self.items.last() {
            Some((kind, level)) => (Some(kind.to_string()), Some(*level)),
            None => (None, None),
        };
        self.current = Some(Block {
            block_type: BLOCK_TYPE.to_string(),
            key: self.keys.next_key(),
            style: style.to_string(),
            children: Vec::new(),
            mark_defs: Vec::new(),
            list_item,
            level,
        });
    }

    fn push_break(&mut self) {
        if self.current.is_some() {
            self.append("\n");
        }
    }

    fn push_text(&mut self, raw: &str) {
        let collapsed;
        let mut text = if self.preformatted > 0 {
            raw
        } else {
            collapsed = collapse_whitespace(raw);
            collapsed.as_str()
        };
        if text.is_empty() {
            return;
        }
        if self.current.is_none() {
            if text.trim().is_empty() {
                return;
            }
            self.open("normal");
        }
        if self.preformatted == 0 && self.at_soft_boundary() {
            text = text.trim_start_matches(' ');
        }
        if !text.is_empty() {
            self.append(text);
        }
    }

    /// True when the block is empty or already ends in whitespace.
    fn at_soft_boundary(&self) -> bool {
        match self.current.as_ref().and_then(|b| b.children.last()) {
            Some(span) => span.text.ends_with(' ') || span.text.ends_with('\n'),
            None => true,
        }
    }

    fn append(&mut self, text: &str) {
        let Some(block) = self.current.as_mut() else { return };
        for (key, href) in &self.links {
            if self.marks.contains(key) && !block.mark_defs.iter().any(|d| &d.key == key) {
                block.mark_defs.push(MarkDef { def_type: LINK_TYPE.to_string(), key: key.clone(), href: href.clone() });
            }
        }
        if let Some(last) = block.children.last_mut() {
            if last.marks == self.marks {
                last.text.push_str(text);
                return;
            }
        }
        block.children.push(Span {
            span_type: SPAN_TYPE.to_string(),
            key: self.keys.next_key(),
            text: text.to_string(),
            marks: self.marks.clone(),
        });
    }

    fn flush(&mut self) {
        let Some(mut block) = self.current.take() else { return };
        block.children.retain(|s| !s.text.is_empty());
        if self.preformatted == 0 {
            trim_edges(&mut block.children);
        }
        if block.children.iter().all(|s| s.text.trim().is_empty()) {
            return;
        }
        let used: Vec<&String> = block.children.iter().flat_map(|s| s.marks.iter()).collect();
        block.mark_defs.retain(|d| used.contains(&&d.key));
        self.blocks.push(block);
    }
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

fn trim_edges(children: &mut Vec<Span>) {
    while let Some(last) = children.last_mut() {
        let len = last.text.trim_end().len();
        last.text.truncate(len);
        if last.text.is_empty() {
            children.pop();
        } else {
            break;
        }
    }
    while let Some(first) = children.first_mut() {
        let trimmed = first.text.trim_start();
        if trimmed.len() != first.text.len() {
            first.text = trimmed.to_string();
        }
        if first.text.is_empty() {
            children.remove(0);
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(html: &str) -> Vec<Block> {
        html_to_blocks(html, &mut KeyGen::new())
    }

    #[test]
    fn paragraphs_and_headings() {
        let blocks = convert("<h2>Title</h2><p>First</p><p>Second</p>");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].style, "h2");
        assert_eq!(blocks[0].plain_text(), "Title");
        assert_eq!(blocks[1].style, "normal");
        assert_eq!(blocks[2].plain_text(), "Second");
        assert!(blocks.iter().all(|b| b.block_type == "block"));
    }

    #[test]
    fn decorators_become_marks() {
        let blocks = convert("<p>plain <strong>bold <em>both</em></strong> end</p>");
        assert_eq!(blocks.len(), 1);
        let spans = &blocks[0].children;
        assert_eq!(spans[0].text, "plain ");
        assert!(spans[0].marks.is_empty());
        assert_eq!(spans[1].text, "bold ");
        assert_eq!(spans[1].marks, vec!["strong"]);
        assert_eq!(spans[2].text, "both");
        assert_eq!(spans[2].marks, vec!["strong", "em"]);
        assert_eq!(spans[3].text, " end");
    }

    #[test]
    fn links_register_mark_defs() {
        let blocks = convert(r#"<p>see <a href="https://example.com">here</a></p>"#);
        let block = &blocks[0];
        assert_eq!(block.mark_defs.len(), 1);
        let def = &block.mark_defs[0];
        assert_eq!(def.def_type, "link");
        assert_eq!(def.href, "https://example.com");
        assert_eq!(block.children[1].marks, vec![def.key.clone()]);
    }

    #[test]
    fn anchors_without_href_are_plain_text() {
        let blocks = convert("<p><a name=\"x\">anchor</a></p>");
        assert!(blocks[0].mark_defs.is_empty());
        assert!(blocks[0].children[0].marks.is_empty());
    }

    #[test]
    fn lists_carry_item_kind_and_level() {
        let blocks = convert("<ul><li>a</li><li>b<ol><li>c</li></ol></li></ul>");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].list_item.as_deref(), Some("bullet"));
        assert_eq!(blocks[0].level, Some(1));
        assert_eq!(blocks[2].list_item.as_deref(), Some("number"));
        assert_eq!(blocks[2].level, Some(2));
        assert_eq!(blocks[2].plain_text(), "c");
    }

    #[test]
    fn line_breaks_and_whitespace() {
        let blocks = convert("<p>  one\n   two<br>three  </p>");
        assert_eq!(blocks[0].plain_text(), "one two\nthree");
    }

    #[test]
    fn loose_text_and_empty_blocks() {
        let blocks = convert("stray text<p> </p><p>kept</p>");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].plain_text(), "stray text");
        assert_eq!(blocks[1].plain_text(), "kept");
    }

    #[test]
    fn images_are_dropped() {
        let blocks = convert(r#"<figure><div><img src="a.png"></div></figure><p>after</p>"#);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].plain_text(), "after");
    }

    #[test]
    fn malformed_html_degrades() {
        let blocks = convert("<p>unclosed <strong>bold<p>next");
        assert!(!blocks.is_empty());
        let all: String = blocks.iter().map(Block::plain_text).collect::<Vec<_>>().join("|");
        assert!(all.contains("unclosed"));
        assert!(all.contains("next"));
    }

    #[test]
    fn keys_are_deterministic() {
        let html = "<p>a <em>b</em></p><ul><li>c</li></ul>";
        assert_eq!(convert(html), convert(html));
    }

    #[test]
    fn serializes_portable_text_field_names() {
        let blocks = convert("<ul><li>x</li></ul>");
        let v = serde_json::to_value(&blocks[0]).unwrap();
        assert_eq!(v["_type"], "block");
        assert!(v["markDefs"].is_array());
        assert_eq!(v["listItem"], "bullet");
        assert_eq!(v["children"][0]["_type"], "span");
    }
}
