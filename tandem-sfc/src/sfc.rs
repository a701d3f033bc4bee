use pest::Parser;
use pest::iterators::Pair;

use crate::error::SfcError;

#[derive(pest_derive::Parser)]
#[grammar = "grammar.pest"]
struct SfcParser;

#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: String,
    pub value: Option<String>, // boolean attrs allowed, e.g. `scoped`
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub attrs: Vec<Attr>,
    pub content: String,
}

impl Block {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_deref())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }
}

/// A component file split into its three blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sfc {
    pub template: Option<Block>,
    pub script: Option<Block>,
    pub style: Option<Block>,
}

impl Sfc {
    pub fn template_source(&self) -> &str {
        self.template.as_ref().map_or("", |b| b.content.as_str())
    }

    pub fn script_source(&self) -> &str {
        self.script.as_ref().map_or("", |b| b.content.as_str())
    }

    pub fn style_source(&self) -> &str {
        self.style.as_ref().map_or("", |b| b.content.as_str())
    }
}

pub fn parse_sfc(source: &str) -> Result<Sfc, SfcError> {
    let mut sfc = Sfc::default();

    let mut pairs =
        SfcParser::parse(Rule::file, source).map_err(|e| SfcError::Split(e.to_string()))?;
    let file = pairs
        .next()
        .ok_or_else(|| SfcError::Split("empty component file".to_string()))?;

    for node in file.into_inner() {
        if node.as_rule() == Rule::block {
            for inner in node.into_inner() {
                consume_top_level(inner, &mut sfc);
            }
        }
    }

    Ok(sfc)
}

fn consume_top_level(node: Pair<Rule>, sfc: &mut Sfc) {
    let slot = match node.as_rule() {
        Rule::template => &mut sfc.template,
        Rule::script => &mut sfc.script,
        Rule::style => &mut sfc.style,
        _ => return,
    };
    if slot.is_some() {
        tracing::warn!(block = ?node.as_rule(), "duplicate block; keeping the last one");
    }
    *slot = Some(parse_block(node));
}

fn parse_block(block: Pair<Rule>) -> Block {
    let mut out = Block::default();
    for p in block.into_inner() {
        match p.as_rule() {
            Rule::template_open | Rule::script_open | Rule::style_open => {
                // attributes are direct children of *_open
                for a in p.into_inner() {
                    if a.as_rule() == Rule::attribute {
                        out.attrs.push(parse_attr(a));
                    }
                }
            }
            Rule::template_body | Rule::script_body | Rule::style_body => {
                out.content = p.as_str().to_string()
            }
            _ => {}
        }
    }
    out
}

fn parse_attr(attr: Pair<Rule>) -> Attr {
    // attribute = ident ( "=" quoted )?
    let mut name = String::new();
    let mut value: Option<String> = None;

    for part in attr.into_inner() {
        match part.as_rule() {
            Rule::ident => name = part.as_str().to_string(),
            Rule::quoted => value = Some(strip_quotes(part.as_str())),
            _ => {}
        }
    }
    Attr { name, value }
}

fn strip_quotes(s: &str) -> String {
    let b = s.as_bytes();
    if b.len() >= 2
        && ((b[0] == b'"' && b[b.len() - 1] == b'"') || (b[0] == b'\'' && b[b.len() - 1] == b'\''))
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}
