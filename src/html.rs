use super::dom::Dom;
use super::*;

const RAW_TEXT_TAGS: [&str; 2] = ["script", "style"];

const VOID_TAGS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

// Longest reference body decoded, e.g. `#x10FFFF`.
const MAX_REFERENCE_LEN: usize = 10;

pub(crate) fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// Parses host markup into a document.
///
/// `<script>` and `<style>` bodies are kept as raw text and never executed;
/// page behavior comes from [`PageScript`] implementations instead. A missing
/// `<body>` is synthesized so the page background always has a target.
pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut dom = Dom::new();
    let mut open = vec![dom.root];
    let mut cursor = Cursor { src: html, pos: 0 };

    while !cursor.is_done() {
        if cursor.eat("<!--") {
            cursor
                .skip_past("-->")
                .ok_or_else(|| Error::HtmlParse("unclosed HTML comment".into()))?;
        } else if cursor.eat("<!") {
            // <!DOCTYPE html> and friends carry nothing the page needs.
            cursor
                .skip_past(">")
                .ok_or_else(|| Error::HtmlParse("unclosed markup declaration".into()))?;
        } else if cursor.eat("</") {
            let name = cursor.end_tag()?;
            close_element(&dom, &mut open, &name);
        } else if cursor.at_start_tag() {
            let tag = cursor.start_tag()?;
            let node = dom.create_element(innermost(&open)?, tag.name.clone(), tag.attrs);
            if tag.self_closing || is_void_tag(&tag.name) {
                continue;
            }
            if RAW_TEXT_TAGS.contains(&tag.name.as_str()) {
                let body = cursor.raw_text(&tag.name)?;
                if !body.is_empty() {
                    dom.create_text(node, body.to_string());
                }
            } else {
                open.push(node);
            }
        } else {
            let text = cursor.text();
            dom.create_text(innermost(&open)?, decode_entities(text));
        }
    }

    ensure_body(&mut dom);
    Ok(dom)
}

fn innermost(open: &[NodeId]) -> Result<NodeId> {
    open.last()
        .copied()
        .ok_or_else(|| Error::HtmlParse("no open element".into()))
}

/// Closes the innermost open `name` and everything opened inside it. Stray
/// end tags are dropped.
fn close_element(dom: &Dom, open: &mut Vec<NodeId>, name: &str) {
    if let Some(depth) = open
        .iter()
        .skip(1)
        .rposition(|node| dom.tag_name(*node) == Some(name))
    {
        open.truncate(depth + 1);
    }
}

fn ensure_body(dom: &mut Dom) {
    if dom.body().is_some() {
        return;
    }

    let container = dom.find_first_by_tag("html").unwrap_or(dom.root);
    let movable: Vec<_> = dom
        .children(container)
        .iter()
        .copied()
        .filter(|child| {
            dom.tag_name(*child)
                .map(|tag| tag != "head" && tag != "html")
                .unwrap_or(true)
        })
        .collect();
    let body = dom.create_element(container, "body".into(), Vec::new());
    for child in movable {
        dom.append_child(body, child);
    }
}

struct StartTag {
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
}

/// Position in the markup. Always sits on a char boundary.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        self.src.get(self.pos..).unwrap_or_default()
    }

    fn is_done(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn eat(&mut self, token: &str) -> bool {
        let found = self.rest().starts_with(token);
        if found {
            self.pos += token.len();
        }
        found
    }

    fn at_start_tag(&self) -> bool {
        let mut chars = self.rest().chars();
        chars.next() == Some('<') && chars.next().is_some_and(|ch| ch.is_ascii_alphabetic())
    }

    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|ch| !accept(ch)).unwrap_or(rest.len());
        self.pos += len;
        rest.get(..len).unwrap_or_default()
    }

    fn skip_spaces(&mut self) {
        self.take_while(|ch| ch.is_ascii_whitespace());
    }

    /// Moves past the next `needle` and returns what came before it.
    fn skip_past(&mut self, needle: &str) -> Option<&'a str> {
        let rest = self.rest();
        let at = rest.find(needle)?;
        self.pos += at + needle.len();
        rest.get(..at)
    }

    /// A run of text up to the next `<`. A `<` that opened nothing is text.
    fn text(&mut self) -> &'a str {
        let start = self.pos;
        if let Some(first) = self.rest().chars().next() {
            self.pos += first.len_utf8();
        }
        self.take_while(|ch| ch != '<');
        self.src.get(start..self.pos).unwrap_or_default()
    }

    /// Reads `<name attr=...>`, starting at the `<`.
    fn start_tag(&mut self) -> Result<StartTag> {
        self.eat("<");
        let mut tag = StartTag {
            name: self.take_while(is_name_char).to_ascii_lowercase(),
            attrs: Vec::new(),
            self_closing: false,
        };

        loop {
            self.skip_spaces();
            if self.eat(">") {
                return Ok(tag);
            }
            if self.eat("/>") {
                tag.self_closing = true;
                return Ok(tag);
            }
            if self.is_done() {
                return Err(Error::HtmlParse(format!("unclosed start tag <{}>", tag.name)));
            }

            let attr = self.take_while(is_attr_name_char).to_ascii_lowercase();
            if attr.is_empty() {
                return Err(Error::HtmlParse(format!(
                    "invalid attribute name in <{}>",
                    tag.name
                )));
            }
            self.skip_spaces();
            let value = if self.eat("=") {
                self.skip_spaces();
                decode_entities(self.attr_value(&tag.name, &attr)?)
            } else {
                String::new()
            };

            // First occurrence of a repeated attribute wins.
            if !tag.attrs.iter().any(|(name, _)| *name == attr) {
                tag.attrs.push((attr, value));
            }
        }
    }

    fn attr_value(&mut self, tag: &str, attr: &str) -> Result<&'a str> {
        let unclosed = || Error::HtmlParse(format!("unclosed value for `{attr}` in <{tag}>"));
        if self.eat("\"") {
            return self.skip_past("\"").ok_or_else(unclosed);
        }
        if self.eat("'") {
            return self.skip_past("'").ok_or_else(unclosed);
        }
        if self.is_done() {
            return Err(Error::HtmlParse(format!(
                "missing value for `{attr}` in <{tag}>"
            )));
        }

        let value = self.take_while(|ch| !ch.is_ascii_whitespace() && ch != '>');
        // `<input value=x/>` closes the tag rather than ending the value in `/`.
        match value.strip_suffix('/') {
            Some(trimmed) if self.rest().starts_with('>') => {
                self.pos -= 1;
                Ok(trimmed)
            }
            _ => Ok(value),
        }
    }

    /// Reads `name>` after `</`.
    fn end_tag(&mut self) -> Result<String> {
        self.skip_spaces();
        let name = self.take_while(is_name_char).to_ascii_lowercase();
        self.skip_past(">")
            .ok_or_else(|| Error::HtmlParse(format!("unclosed end tag </{name}>")))?;
        Ok(name)
    }

    /// Body of a raw-text element up to its end tag, matched case-insensitively.
    fn raw_text(&mut self, tag: &str) -> Result<&'a str> {
        let rest = self.rest();
        let lowered = rest.to_ascii_lowercase();
        let closer = format!("</{tag}");
        let mut from = 0;
        while let Some(found) = lowered.get(from..).and_then(|tail| tail.find(&closer)) {
            let at = from + found;
            let boundary = lowered.as_bytes().get(at + closer.len());
            if boundary.is_none_or(|b| *b == b'>' || b.is_ascii_whitespace()) {
                self.pos += at + 2;
                self.end_tag()?;
                return Ok(rest.get(..at).unwrap_or_default());
            }
            from = at + closer.len();
        }
        Err(Error::HtmlParse(format!("unclosed <{tag}>")))
    }
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

fn is_attr_name_char(ch: char) -> bool {
    is_name_char(ch) || matches!(ch, ':' | '@' | '.')
}

/// Decodes the handful of character references real pages use in labels.
/// Unknown references are left untouched. Numeric references to NUL, a
/// surrogate or a code point past U+10FFFF become U+FFFD.
pub(crate) fn decode_entities(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp + 1..];
        let decoded = rest
            .find(';')
            .filter(|end| *end <= MAX_REFERENCE_LEN)
            .and_then(|end| Some((resolve_reference(&rest[..end])?, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &rest[end + 1..];
            }
            None => out.push('&'),
        }
    }
    out.push_str(rest);
    out
}

fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let (digits, radix) = match number.strip_prefix(['x', 'X']) {
                Some(hex) => (hex, 16),
                None => (number, 10),
            };
            if digits.is_empty() || !digits.chars().all(|ch| ch.is_digit(radix)) {
                return None;
            }
            let code = u32::from_str_radix(digits, radix).unwrap_or(u32::MAX);
            Some(
                char::from_u32(code)
                    .filter(|ch| *ch != '\0')
                    .unwrap_or(char::REPLACEMENT_CHARACTER),
            )
        }
    }
}
