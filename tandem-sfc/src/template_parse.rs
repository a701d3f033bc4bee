use tandem_core::Value;
use tandem_dom::html::{escape_text, is_void};

use crate::condition::Condition;
use crate::ids::number_blocks;
use crate::template_ast::{
    Arg, AttrBinding, AttrPart, BindProperty, Branch, ClassToggle, ComponentNode, EachBlock,
    Element, EventSpec, IfBlock, InputBinding, Interpolation, Modifier, ParseDiagnostic, Prop,
    PropValue, TemplateIR, TemplateNode,
};

/// Tags whose content is copied verbatim, with no directive processing.
const SKIP_TAGS: &[&str] = &["pre", "code", "script", "style"];

/// Parse template text into the binding IR.
///
/// Never fails: a malformed directive is kept as literal text and reported in
/// [`TemplateIR::diagnostics`].
pub fn parse_template(src: &str) -> TemplateIR {
    let mut p = TemplateParser {
        src,
        diagnostics: Vec::new(),
    };
    let mut nodes = p.parse_range(0, src.len());
    number_blocks(&mut nodes);
    TemplateIR {
        nodes,
        diagnostics: p.diagnostics,
    }
}

/// Substitute the caller's slot markup for `<slot/>` in a child template.
///
/// `<slot>fallback</slot>` keeps its fallback when the slot is blank.
pub fn expand_slot(template: &str, slot: &str) -> String {
    let mut out = String::with_capacity(template.len() + slot.len());
    let mut rest = template;
    while let Some(p) = rest.find("<slot") {
        out.push_str(&rest[..p]);
        let after = &rest[p + 5..];
        let trimmed = after.trim_start();
        if let Some(r) = trimmed.strip_prefix("/>") {
            out.push_str(slot);
            rest = r;
        } else if let Some(r) = trimmed.strip_prefix('>') {
            match r.find("</slot>") {
                Some(close) => {
                    let fallback = &r[..close];
                    out.push_str(if slot.trim().is_empty() { fallback } else { slot });
                    rest = &r[close + "</slot>".len()..];
                }
                None => {
                    out.push_str(slot);
                    rest = r;
                }
            }
        } else {
            out.push_str("<slot");
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

/// Nodes under construction, with a pending run of literal text.
#[derive(Default)]
struct Out {
    nodes: Vec<TemplateNode>,
    text: String,
}

impl Out {
    fn flush(&mut self) {
        if !self.text.is_empty() {
            self.nodes
                .push(TemplateNode::Text(std::mem::take(&mut self.text)));
        }
    }

    fn push(&mut self, node: TemplateNode) {
        self.flush();
        self.nodes.push(node);
    }

    fn finish(mut self) -> Vec<TemplateNode> {
        self.flush();
        self.nodes
    }
}

struct RawAttr {
    name: String,
    value: Option<String>,
    offset: usize,
}

/// `{:else}` or `{:else if cond}` found at depth zero inside a block.
struct Clause {
    start: usize,
    end: usize,
    rest: String,
}

struct BlockExtent {
    clauses: Vec<Clause>,
    close_start: usize,
    close_end: usize,
}

struct TemplateParser<'a> {
    src: &'a str,
    diagnostics: Vec<ParseDiagnostic>,
}

impl<'a> TemplateParser<'a> {
    fn warn(&mut self, offset: usize, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(offset, %message, "template diagnostic");
        self.diagnostics.push(ParseDiagnostic { offset, message });
    }

    fn parse_range(&mut self, start: usize, end: usize) -> Vec<TemplateNode> {
        let src = self.src;
        let mut out = Out::default();
        let mut i = start;
        while i < end {
            let rest = &src[i..end];
            if rest.starts_with('<') {
                i = self.tag(i, end, &mut out);
            } else if rest.starts_with('{') {
                i = self.brace(i, end, &mut out);
            } else {
                let stop = rest.find(['<', '{']).map_or(end, |p| i + p);
                out.text.push_str(&src[i..stop]);
                i = stop;
            }
        }
        out.finish()
    }

    // ---- markup --------------------------------------------------------------

    fn tag(&mut self, i: usize, end: usize, out: &mut Out) -> usize {
        let src = self.src;
        let rest = &src[i..end];
        if rest.starts_with("<!--") {
            let stop = rest.find("-->").map_or(end, |p| i + p + 3);
            out.text.push_str(&src[i..stop]);
            return stop;
        }
        if rest.starts_with("</") || rest.starts_with("<!") {
            let stop = rest.find('>').map_or(end, |p| i + p + 1);
            out.text.push_str(&src[i..stop]);
            return stop;
        }
        if !rest.as_bytes().get(1).is_some_and(u8::is_ascii_alphabetic) {
            out.text.push('<');
            return i + 1;
        }

        let name_end = i + 1 + name_len(&rest[1..]);
        let name = &src[i + 1..name_end];
        let Some(open_end) = scan_tag_end(src, name_end, end) else {
            self.warn(i, format!("unterminated tag `<{name}`"));
            out.text.push('<');
            return i + 1;
        };
        let self_closing = src[..open_end - 1].ends_with('/');
        let attrs_end = if self_closing { open_end - 2 } else { open_end - 1 };

        let lower = name.to_ascii_lowercase();
        if SKIP_TAGS.contains(&lower.as_str()) && !self_closing {
            return self.skip_region(i, open_end, end, &lower, out);
        }

        let attrs = read_attrs(src, name_end, attrs_end);
        if name.starts_with(|c: char| c.is_ascii_uppercase()) {
            return self.component(i, name, attrs, open_end, self_closing, end, out);
        }

        let directive = attrs.iter().any(|a| {
            a.name.starts_with('@')
                || a.name.starts_with("bind:")
                || a.name.starts_with("class:")
                || a.value.as_deref().is_some_and(|v| v.contains('{'))
        });
        if !directive {
            out.text.push_str(&src[i..open_end]);
            return open_end;
        }
        self.element(i, name, attrs, open_end, self_closing, end, out)
    }

    fn skip_region(
        &mut self,
        i: usize,
        open_end: usize,
        end: usize,
        lower: &str,
        out: &mut Out,
    ) -> usize {
        let src = self.src;
        let close = format!("</{lower}");
        let body_end = src[open_end..end]
            .to_ascii_lowercase()
            .find(&close)
            .map(|p| open_end + p);
        let (body_end, close_end) = match body_end {
            Some(be) => (be, src[be..end].find('>').map_or(end, |p| be + p + 1)),
            None => {
                self.warn(i, format!("unterminated `<{lower}>`"));
                (end, end)
            }
        };
        out.text.push_str(&src[i..open_end]);
        let body = &src[open_end..body_end];
        if lower == "pre" || lower == "code" {
            out.text.push_str(&escape_text(body));
        } else {
            out.text.push_str(body);
        }
        out.text.push_str(&src[body_end..close_end]);
        close_end
    }

    #[allow(clippy::too_many_arguments)]
    fn component(
        &mut self,
        i: usize,
        name: &str,
        attrs: Vec<RawAttr>,
        open_end: usize,
        self_closing: bool,
        end: usize,
        out: &mut Out,
    ) -> usize {
        let mut node = ComponentNode {
            id: String::new(),
            name: name.to_string(),
            props: Vec::new(),
            events: Vec::new(),
            slot: String::new(),
        };
        for a in attrs {
            if let Some(ev) = a.name.strip_prefix('@') {
                if let Some(spec) = self.event_spec(ev, a.value.as_deref(), a.offset) {
                    node.events.push(spec);
                }
                continue;
            }
            let raw = a.value.unwrap_or_default();
            let value = match braced_ident(&raw) {
                Some(field) => PropValue::Field(field.to_string()),
                None => PropValue::Literal(raw),
            };
            node.props.push(Prop {
                name: a.name,
                value,
            });
        }

        let next = if self_closing {
            open_end
        } else {
            match find_close(self.src, name, open_end, end, false) {
                Some((close_start, close_end)) => {
                    node.slot = self.src[open_end..close_start].to_string();
                    close_end
                }
                None => {
                    self.warn(i, format!("missing `</{name}>`"));
                    open_end
                }
            }
        };
        out.push(TemplateNode::Component(node));
        next
    }

    #[allow(clippy::too_many_arguments)]
    fn element(
        &mut self,
        i: usize,
        name: &str,
        attrs: Vec<RawAttr>,
        open_end: usize,
        self_closing: bool,
        end: usize,
        out: &mut Out,
    ) -> usize {
        let mut el = Element {
            tag: name.to_string(),
            ..Default::default()
        };
        for a in attrs {
            self.classify_attr(&mut el, a);
        }

        if el.needs_id() && el.attrs.iter().any(|(k, _)| k == "id") {
            self.warn(i, format!("static id on `<{name}>` replaced by a generated one"));
            el.attrs.retain(|(k, _)| k != "id");
        }
        if !el.attr_bindings.is_empty() {
            el.attrs.retain(|(k, _)| k != "data-attrbind");
        }

        let next = if self_closing || is_void(name) {
            open_end
        } else {
            match find_close(self.src, name, open_end, end, true) {
                Some((close_start, close_end)) => {
                    el.children = self.parse_range(open_end, close_start);
                    close_end
                }
                None => {
                    self.warn(i, format!("missing `</{name}>`"));
                    open_end
                }
            }
        };
        out.push(TemplateNode::Element(el));
        next
    }

    fn classify_attr(&mut self, el: &mut Element, a: RawAttr) {
        if let Some(ev) = a.name.strip_prefix('@') {
            if let Some(spec) = self.event_spec(ev, a.value.as_deref(), a.offset) {
                el.events.push(spec);
            }
        } else if let Some(prop) = a.name.strip_prefix("bind:") {
            let property = match prop {
                "value" => BindProperty::Value,
                "checked" => BindProperty::Checked,
                other => {
                    self.warn(a.offset, format!("unsupported binding `bind:{other}`"));
                    return;
                }
            };
            let raw = a.value.unwrap_or_default();
            let field = strip_braces(&raw);
            if !is_ident(field) {
                self.warn(a.offset, format!("`bind:{prop}` needs a field name, got `{raw}`"));
                return;
            }
            if el.bind.is_some() {
                self.warn(a.offset, "second two-way binding on one element ignored");
                return;
            }
            el.bind = Some(InputBinding {
                property,
                field: field.to_string(),
            });
        } else if let Some(class) = a.name.strip_prefix("class:") {
            let raw = a.value.unwrap_or_else(|| class.to_string());
            match Condition::parse(strip_braces(&raw)) {
                Ok(condition) => el.classes.push(ClassToggle {
                    class: class.to_string(),
                    condition,
                }),
                Err(e) => self.warn(a.offset, e.to_string()),
            }
        } else {
            let value = a.value.unwrap_or_default();
            if value.contains('{') {
                match parse_attr_template(&a.name, &value) {
                    Some(binding) => {
                        el.attr_bindings.push(binding);
                        return;
                    }
                    None => self.warn(
                        a.offset,
                        format!("attribute `{}` has a malformed `{{…}}`", a.name),
                    ),
                }
            }
            el.attrs.push((a.name, value));
        }
    }

    fn event_spec(&mut self, name: &str, value: Option<&str>, offset: usize) -> Option<EventSpec> {
        let mut parts = name.split('.');
        let event = parts.next().unwrap_or_default().to_string();
        if event.is_empty() {
            self.warn(offset, "event handler without an event name");
            return None;
        }
        let mut modifiers = Vec::new();
        for m in parts {
            match Modifier::parse(m) {
                Some(m) => modifiers.push(m),
                None => self.warn(offset, format!("unknown event modifier `{m}`")),
            }
        }

        let Some(value) = value else {
            self.warn(offset, format!("`@{name}` needs a handler"));
            return None;
        };
        let value = strip_braces(value);
        let (method, args) = match value.find('(') {
            Some(p) if value.ends_with(')') => {
                match parse_args(&value[p + 1..value.len() - 1]) {
                    Ok(args) => (value[..p].trim(), args),
                    Err(reason) => {
                        self.warn(offset, format!("handler `{value}`: {reason}"));
                        return None;
                    }
                }
            }
            Some(_) => {
                self.warn(offset, format!("handler `{value}` is missing `)`"));
                return None;
            }
            None => (value, Vec::new()),
        };
        if !is_ident(method) {
            self.warn(offset, format!("handler `{value}` is not a method call"));
            return None;
        }
        Some(EventSpec {
            event,
            modifiers,
            method: method.to_string(),
            args,
        })
    }

    // ---- directives ----------------------------------------------------------

    fn brace(&mut self, i: usize, end: usize, out: &mut Out) -> usize {
        let src = self.src;
        let rest = &src[i..end];
        let handled = if starts_with_word(rest, "{#if") {
            self.if_block(i, end, out)
        } else if starts_with_word(rest, "{#each") {
            self.each_block(i, end, out)
        } else if starts_with_word(rest, "{@html") {
            self.interpolation(i, "{@html".len(), true, end, out)
        } else if rest.starts_with("{#") || rest.starts_with("{:") || rest.starts_with("{/") {
            None
        } else {
            self.interpolation(i, 1, false, end, out)
        };
        match handled {
            Some(next) => next,
            None => {
                let preview: String = rest.chars().take(16).collect();
                self.warn(i, format!("malformed directive `{preview}` kept as text"));
                out.text.push('{');
                i + 1
            }
        }
    }

    fn interpolation(
        &mut self,
        i: usize,
        skip: usize,
        html: bool,
        end: usize,
        out: &mut Out,
    ) -> Option<usize> {
        let src = self.src;
        let close = i + src[i..end].find('}')?;
        let field = src[i + skip..close].trim();
        if !is_ident(field) {
            return None;
        }
        out.push(TemplateNode::Interpolation(Interpolation {
            field: field.to_string(),
            html,
        }));
        Some(close + 1)
    }

    fn if_block(&mut self, i: usize, end: usize, out: &mut Out) -> Option<usize> {
        let src = self.src;
        let header_end = i + src[i..end].find('}')?;
        let cond_src = &src[i + "{#if".len()..header_end];
        let first = match Condition::parse(cond_src.trim()) {
            Ok(c) => c,
            Err(e) => {
                self.warn(i, e.to_string());
                return None;
            }
        };
        let body_start = header_end + 1;
        let extent = self.block_extent(body_start, end, "if")?;

        // Check every clause before parsing any branch body.
        let mut conditions = vec![Some(first)];
        let mut seen_else = false;
        for clause in &extent.clauses {
            if seen_else {
                self.warn(clause.start, "clause after `{:else}`");
                return None;
            }
            let rest = clause.rest.trim();
            if rest.is_empty() {
                seen_else = true;
                conditions.push(None);
            } else if let Some(cond) = rest.strip_prefix("if ") {
                match Condition::parse(cond.trim()) {
                    Ok(c) => conditions.push(Some(c)),
                    Err(e) => {
                        self.warn(clause.start, e.to_string());
                        return None;
                    }
                }
            } else {
                self.warn(clause.start, format!("unknown clause `{{:else{rest}}}`"));
                return None;
            }
        }

        let mut bounds = Vec::with_capacity(conditions.len());
        let mut seg_start = body_start;
        for clause in &extent.clauses {
            bounds.push((seg_start, clause.start));
            seg_start = clause.end;
        }
        bounds.push((seg_start, extent.close_start));

        let mut block = IfBlock {
            id: String::new(),
            branches: Vec::new(),
            else_children: Vec::new(),
        };
        for (condition, (s, e)) in conditions.into_iter().zip(bounds) {
            let children = self.parse_range(s, e);
            match condition {
                Some(condition) => block.branches.push(Branch {
                    condition,
                    children,
                }),
                None => block.else_children = children,
            }
        }
        out.push(TemplateNode::If(block));
        Some(extent.close_end)
    }

    fn each_block(&mut self, i: usize, end: usize, out: &mut Out) -> Option<usize> {
        let src = self.src;
        let header_end = i + src[i..end].find('}')?;
        let header = src[i + "{#each".len()..header_end].trim();
        let Some((list, locals)) = parse_each_header(header) else {
            self.warn(i, format!("expected `{{#each List as item[, index]}}`, got `{header}`"));
            return None;
        };
        let body_start = header_end + 1;
        let extent = self.block_extent(body_start, end, "each")?;
        if extent.clauses.len() > 1 || extent.clauses.iter().any(|c| !c.rest.trim().is_empty()) {
            self.warn(i, "`{#each}` takes at most one plain `{:else}`");
            return None;
        }

        let (body, else_children) = match extent.clauses.first() {
            Some(clause) => (
                self.parse_range(body_start, clause.start),
                self.parse_range(clause.end, extent.close_start),
            ),
            None => (self.parse_range(body_start, extent.close_start), Vec::new()),
        };
        out.push(TemplateNode::Each(EachBlock {
            id: String::new(),
            list,
            item: locals.0,
            index: locals.1,
            body,
            else_children,
        }));
        Some(extent.close_end)
    }

    /// Find the `{/kind}` closing a block opened just before `from`, and the
    /// `{:else…}` clauses that belong to it. Nested blocks of either kind are
    /// skipped by depth.
    fn block_extent(&mut self, from: usize, end: usize, kind: &str) -> Option<BlockExtent> {
        let src = self.src;
        let mut depth = 0usize;
        let mut clauses = Vec::new();
        let mut j = from;
        while let Some(p) = src[j..end].find('{') {
            let at = j + p;
            let r = &src[at..end];
            if starts_with_word(r, "{#if") || starts_with_word(r, "{#each") {
                depth += 1;
                j = at + 1;
            } else if let Some(close_kind) = closing_kind(r) {
                let len = close_kind.len() + 3;
                if depth == 0 {
                    if close_kind != kind {
                        self.warn(at, format!("`{{/{close_kind}}}` closes a `{{#{kind}}}`"));
                        return None;
                    }
                    return Some(BlockExtent {
                        clauses,
                        close_start: at,
                        close_end: at + len,
                    });
                }
                depth -= 1;
                j = at + len;
            } else if depth == 0 && r.starts_with("{:else") {
                let close = r.find('}')?;
                clauses.push(Clause {
                    start: at,
                    end: at + close + 1,
                    rest: r["{:else".len()..close].to_string(),
                });
                j = at + close + 1;
            } else {
                j = at + 1;
            }
        }
        self.warn(from, format!("missing `{{/{kind}}}`"));
        None
    }
}

fn closing_kind(r: &str) -> Option<&'static str> {
    if r.starts_with("{/if}") {
        Some("if")
    } else if r.starts_with("{/each}") {
        Some("each")
    } else {
        None
    }
}

/// `prefix` followed by whitespace or `}`.
fn starts_with_word(s: &str, prefix: &str) -> bool {
    s.starts_with(prefix)
        && s[prefix.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_whitespace() || c == '}')
}

fn parse_each_header(header: &str) -> Option<(String, (String, Option<String>))> {
    let (list, locals) = header.split_once(" as ")?;
    let list = list.trim();
    let (item, index) = match locals.split_once(',') {
        Some((item, index)) => (item.trim(), Some(index.trim())),
        None => (locals.trim(), None),
    };
    if !is_ident(list) || !is_ident(item) || index.is_some_and(|i| !is_ident(i)) {
        return None;
    }
    Some((
        list.to_string(),
        (item.to_string(), index.map(str::to_string)),
    ))
}

fn parse_args(src: &str) -> Result<Vec<Arg>, String> {
    if src.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in src.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                current.push(c);
            }
            None if c == ',' => args.push(parse_arg(std::mem::take(&mut current).trim())?),
            None => current.push(c),
        }
    }
    if quote.is_some() {
        return Err("unterminated string argument".into());
    }
    args.push(parse_arg(current.trim())?);
    Ok(args)
}

fn parse_arg(s: &str) -> Result<Arg, String> {
    if s.is_empty() {
        return Err("empty argument".into());
    }
    let quoted = s.len() >= 2
        && ((s.starts_with('\'') && s.ends_with('\'')) || (s.starts_with('"') && s.ends_with('"')));
    if quoted {
        return Ok(Arg::Literal(Value::Str(s[1..s.len() - 1].to_string())));
    }
    match s {
        "true" => return Ok(Arg::Literal(Value::Bool(true))),
        "false" => return Ok(Arg::Literal(Value::Bool(false))),
        _ => {}
    }
    if let Ok(n) = s.parse::<i64>() {
        return Ok(Arg::Literal(Value::Int(n)));
    }
    if let Ok(f) = s.parse::<f64>() {
        return Ok(Arg::Literal(Value::Float(f)));
    }
    if is_ident(s) {
        return Ok(Arg::Name(s.to_string()));
    }
    Err(format!("cannot read argument `{s}`"))
}

fn parse_attr_template(name: &str, value: &str) -> Option<AttrBinding> {
    let mut parts = Vec::new();
    let mut fallback = String::new();
    let mut rest = value;
    while let Some(open) = rest.find('{') {
        if open > 0 {
            parts.push(AttrPart::Static(rest[..open].to_string()));
            fallback.push_str(&rest[..open]);
        }
        let close = rest[open..].find('}')? + open;
        let field = rest[open + 1..close].trim();
        if !is_ident(field) {
            return None;
        }
        parts.push(AttrPart::Field(field.to_string()));
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        parts.push(AttrPart::Static(rest.to_string()));
        fallback.push_str(rest);
    }
    Some(AttrBinding {
        name: name.to_string(),
        template: value.to_string(),
        parts,
        fallback,
    })
}

pub(crate) fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn strip_braces(s: &str) -> &str {
    let t = s.trim();
    t.strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .map_or(t, str::trim)
}

/// `{Name}` with nothing around it.
fn braced_ident(s: &str) -> Option<&str> {
    let t = s.trim();
    let inner = t.strip_prefix('{')?.strip_suffix('}')?.trim();
    is_ident(inner).then_some(inner)
}

fn name_len(s: &str) -> usize {
    s.find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')))
        .unwrap_or(s.len())
}

/// Index just past the `>` ending a start tag. Quotes and braces may contain `>`.
fn scan_tag_end(src: &str, from: usize, end: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut quote: Option<u8> = None;
    let mut depth = 0usize;
    for (k, &c) in bytes[from..end].iter().enumerate() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                b'"' | b'\'' if depth == 0 => quote = Some(c),
                b'>' if depth == 0 => return Some(from + k + 1),
                _ => {}
            },
        }
    }
    None
}

/// Split the attribute region of a start tag into raw name/value pairs.
fn read_attrs(src: &str, from: usize, to: usize) -> Vec<RawAttr> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut i = from;
    while i < to {
        while i < to && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= to {
            break;
        }
        let start = i;
        while i < to && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'=' | b'/') {
            i += 1;
        }
        if i == start {
            // stray '/' or '='
            i += 1;
            continue;
        }
        let name = src[start..i].to_string();
        let mut j = i;
        while j < to && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let mut value = None;
        if j < to && bytes[j] == b'=' {
            j += 1;
            while j < to && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            let vstart = j;
            match bytes.get(j) {
                Some(&q) if j < to && (q == b'"' || q == b'\'') => {
                    let vend = src[vstart + 1..to].find(q as char).map_or(to, |p| vstart + 1 + p);
                    value = Some(src[vstart + 1..vend].to_string());
                    j = (vend + 1).min(to);
                }
                Some(b'{') if j < to => {
                    let mut depth = 0usize;
                    let mut k = j;
                    while k < to {
                        match bytes[k] {
                            b'{' => depth += 1,
                            b'}' => {
                                depth -= 1;
                                if depth == 0 {
                                    k += 1;
                                    break;
                                }
                            }
                            _ => {}
                        }
                        k += 1;
                    }
                    value = Some(src[vstart..k].to_string());
                    j = k;
                }
                _ => {
                    while j < to && !bytes[j].is_ascii_whitespace() {
                        j += 1;
                    }
                    value = Some(src[vstart..j].to_string());
                }
            }
            i = j;
        }
        out.push(RawAttr {
            name,
            value,
            offset: start,
        });
    }
    out
}

/// Find the end tag matching a start tag named `name`, counting nested
/// same-name start tags. Returns `(end_tag_start, end_tag_end)`.
fn find_close(
    src: &str,
    name: &str,
    from: usize,
    end: usize,
    ignore_case: bool,
) -> Option<(usize, usize)> {
    let same = |a: &str| {
        if ignore_case {
            a.eq_ignore_ascii_case(name)
        } else {
            a == name
        }
    };
    let mut depth = 0usize;
    let mut j = from;
    while let Some(p) = src[j..end].find('<') {
        let at = j + p;
        let r = &src[at..end];
        if r.starts_with("<!--") {
            j = r.find("-->").map_or(end, |q| at + q + 3);
            continue;
        }
        if let Some(after) = r.strip_prefix("</") {
            let n = name_len(after);
            if same(&after[..n]) {
                let close_end = r.find('>').map_or(end, |q| at + q + 1);
                if depth == 0 {
                    return Some((at, close_end));
                }
                depth -= 1;
                j = close_end;
                continue;
            }
        } else {
            let n = name_len(&r[1..]);
            if n > 0 && same(&r[1..1 + n]) {
                if let Some(open_end) = scan_tag_end(src, at + 1 + n, end) {
                    if !src[..open_end - 1].ends_with('/') {
                        depth += 1;
                    }
                    j = open_end;
                    continue;
                }
            }
        }
        j = at + 1;
    }
    None
}
