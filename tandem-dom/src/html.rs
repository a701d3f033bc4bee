use crate::{Document, NodeData, NodeId};

/// Elements that never have children or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose content is not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

pub fn escape_text(s: &str) -> String {
    htmlize::escape_text(s).into_owned()
}

pub fn escape_attr(s: &str) -> String {
    htmlize::escape_attribute(s).into_owned()
}

pub fn unescape(s: &str) -> String {
    htmlize::unescape(s).into_owned()
}

/// Lenient HTML parser. Returns the top-level nodes, detached, in source order.
///
/// Unknown end tags are dropped; unclosed elements are closed at end of input.
pub(crate) fn parse_fragment(doc: &mut Document, src: &str) -> Vec<NodeId> {
    let bytes = src.as_bytes();
    let mut i = 0usize;
    let mut stack: Vec<NodeId> = Vec::new();
    let mut roots: Vec<NodeId> = Vec::new();

    fn push_child(doc: &mut Document, stack: &[NodeId], roots: &mut Vec<NodeId>, node: NodeId) {
        match stack.last() {
            Some(parent) => doc.append_child(*parent, node),
            None => roots.push(node),
        }
    }

    while i < bytes.len() {
        if bytes[i] != b'<' {
            let start = i;
            while i < bytes.len() && bytes[i] != b'<' {
                i += 1;
            }
            let text = doc.create_text(unescape(&src[start..i]));
            push_child(doc, &stack, &mut roots, text);
            continue;
        }

        if src[i..].starts_with("<!--") {
            let body = i + 4;
            let (data, next) = match src[body..].find("-->") {
                Some(end) => (&src[body..body + end], body + end + 3),
                None => (&src[body..], bytes.len()),
            };
            let c = doc.create_comment(data);
            push_child(doc, &stack, &mut roots, c);
            i = next;
            continue;
        }

        if src[i..].starts_with("<!") || src[i..].starts_with("<?") {
            // doctype and processing instructions carry nothing we keep
            i = src[i..].find('>').map(|p| i + p + 1).unwrap_or(bytes.len());
            continue;
        }

        if src[i..].starts_with("</") {
            let mut j = i + 2;
            let name = read_name(bytes, &mut j);
            i = src[j..].find('>').map(|p| j + p + 1).unwrap_or(bytes.len());
            if let Some(pos) = stack
                .iter()
                .rposition(|n| doc.tag(*n).is_some_and(|t| t.eq_ignore_ascii_case(&name)))
            {
                stack.truncate(pos);
            }
            continue;
        }

        if i + 1 < bytes.len() && bytes[i + 1].is_ascii_alphabetic() {
            let mut j = i + 1;
            let tag = read_name(bytes, &mut j);
            let (attrs, self_closing, next) = read_attrs(src, j);
            i = next;
            let el = doc.push(NodeData::Element {
                tag: tag.clone(),
                attrs,
            });
            push_child(doc, &stack, &mut roots, el);

            if self_closing || is_void(&tag) {
                continue;
            }
            if is_raw_text(&tag) {
                let close = format!("</{}", tag.to_ascii_lowercase());
                let end = src[i..]
                    .to_ascii_lowercase()
                    .find(&close)
                    .map(|p| i + p)
                    .unwrap_or(bytes.len());
                if end > i {
                    let t = doc.create_text(&src[i..end]);
                    doc.append_child(el, t);
                }
                i = src[end..].find('>').map(|p| end + p + 1).unwrap_or(bytes.len());
                continue;
            }
            stack.push(el);
            continue;
        }

        // a lone '<' is text
        let t = doc.create_text("<");
        push_child(doc, &stack, &mut roots, t);
        i += 1;
    }

    roots
}

fn read_name(bytes: &[u8], i: &mut usize) -> String {
    let start = *i;
    while *i < bytes.len() {
        let c = bytes[*i];
        if c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b':' {
            *i += 1;
        } else {
            break;
        }
    }
    String::from_utf8_lossy(&bytes[start..*i]).to_ascii_lowercase()
}

/// Parse attributes from `start` up to and including the closing `>`.
fn read_attrs(src: &str, start: usize) -> (Vec<(String, String)>, bool, usize) {
    let bytes = src.as_bytes();
    let mut i = start;
    let mut attrs = Vec::new();
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            return (attrs, false, i);
        }
        match bytes[i] {
            b'>' => return (attrs, false, i + 1),
            b'/' if bytes.get(i + 1) == Some(&b'>') => return (attrs, true, i + 2),
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }
        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let name = src[name_start..i].to_ascii_lowercase();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = String::new();
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i];
                let vstart = i + 1;
                let vend = bytes[vstart..]
                    .iter()
                    .position(|b| *b == quote)
                    .map(|p| vstart + p)
                    .unwrap_or(bytes.len());
                value = unescape(&src[vstart..vend]);
                i = (vend + 1).min(bytes.len());
            } else {
                let vstart = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                value = unescape(&src[vstart..i]);
            }
        }
        if !name.is_empty() {
            attrs.push((name, value));
        }
    }
}

pub(crate) fn serialize(doc: &Document, id: NodeId, out: &mut String) {
    match doc.data(id) {
        NodeData::Document => {
            for c in doc.children(id) {
                serialize(doc, *c, out);
            }
        }
        NodeData::Text(t) => {
            let raw = doc
                .parent(id)
                .and_then(|p| doc.tag(p))
                .is_some_and(is_raw_text);
            if raw {
                out.push_str(t);
            } else {
                out.push_str(&escape_text(t));
            }
        }
        NodeData::Comment(c) => {
            out.push_str("<!--");
            out.push_str(c);
            out.push_str("-->");
        }
        NodeData::Element { tag, attrs } => {
            out.push('<');
            out.push_str(tag);
            for (k, v) in attrs {
                out.push(' ');
                out.push_str(k);
                if !v.is_empty() {
                    out.push_str("=\"");
                    out.push_str(&escape_attr(v));
                    out.push('"');
                }
            }
            out.push('>');
            if is_void(tag) {
                return;
            }
            for c in doc.children(id) {
                serialize(doc, *c, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}
