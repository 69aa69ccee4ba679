//! Minimal CSS selector matcher for the in-memory host
//!
//! Supports what the controller's configuration uses: selector lists,
//! the descendant combinator, `*`, tag, `#id`, `.class`, `[attr]`,
//! `[attr="v"]`, `[attr^="v"]` and `:not(...)` over a single simple part.

use crate::error::{PageflowError, PageflowResult};
use crate::types::NodeId;

/// Element accessors the matcher needs
pub(crate) trait SelectorTarget {
    fn target_tag(&self, node: NodeId) -> &str;
    fn target_attr(&self, node: NodeId, name: &str) -> Option<String>;
    fn target_has_class(&self, node: NodeId, class: &str) -> bool;
    fn target_parent(&self, node: NodeId) -> Option<NodeId>;
}

#[derive(Clone, Debug, PartialEq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
}

#[derive(Clone, Debug, PartialEq)]
enum Simple {
    Tag(String),
    Id(String),
    Class(String),
    Attr { name: String, op: AttrOp },
    Not(Box<Simple>),
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Compound {
    parts: Vec<Simple>,
}

/// A parsed selector list
#[derive(Clone, Debug, PartialEq)]
pub struct Selector {
    /// Each alternative is a chain of compounds joined by descendant combinators
    alternatives: Vec<Vec<Compound>>,
}

impl Selector {
    /// Parse selector text.
    pub fn parse(text: &str) -> PageflowResult<Self> {
        let mut alternatives = Vec::new();
        for group in text.split(',') {
            let group = group.trim();
            if group.is_empty() {
                return Err(invalid(text, "empty selector in list"));
            }
            let mut chain = Vec::new();
            for token in group.split_whitespace() {
                chain.push(parse_compound(text, token)?);
            }
            alternatives.push(chain);
        }
        Ok(Self { alternatives })
    }

    pub(crate) fn matches<T: SelectorTarget + ?Sized>(&self, target: &T, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|chain| match_chain(target, chain, chain.len() - 1, node))
    }
}

fn invalid(text: &str, reason: &'static str) -> PageflowError {
    PageflowError::InvalidSelector {
        selector: text.to_string(),
        reason,
    }
}

fn parse_compound(text: &str, token: &str) -> PageflowResult<Compound> {
    let mut parts = Vec::new();
    let mut rest = token;

    while !rest.is_empty() {
        let (part, remaining) = parse_simple(text, rest)?;
        if let Some(part) = part {
            parts.push(part);
        }
        rest = remaining;
    }
    Ok(Compound { parts })
}

/// Parse one simple selector from the front of `input`. `*` yields `None`.
fn parse_simple<'a>(text: &str, input: &'a str) -> PageflowResult<(Option<Simple>, &'a str)> {
    if let Some(rest) = input.strip_prefix('*') {
        return Ok((None, rest));
    }
    if let Some(rest) = input.strip_prefix(":not(") {
        let end = rest.find(')').ok_or_else(|| invalid(text, "unterminated :not"))?;
        let (inner, remaining) = parse_simple(text, &rest[..end])?;
        if !remaining.is_empty() {
            return Err(invalid(text, ":not takes a single simple selector"));
        }
        let inner = inner.ok_or_else(|| invalid(text, ":not(*) is not supported"))?;
        return Ok((Some(Simple::Not(Box::new(inner))), &rest[end + 1..]));
    }
    if let Some(rest) = input.strip_prefix('[') {
        let end = rest.find(']').ok_or_else(|| invalid(text, "unterminated attribute"))?;
        let body = &rest[..end];
        let attr = if let Some((name, value)) = body.split_once("^=") {
            Simple::Attr {
                name: name.trim().to_ascii_lowercase(),
                op: AttrOp::Prefix(unquote(value)),
            }
        } else if let Some((name, value)) = body.split_once('=') {
            Simple::Attr {
                name: name.trim().to_ascii_lowercase(),
                op: AttrOp::Equals(unquote(value)),
            }
        } else {
            Simple::Attr {
                name: body.trim().to_ascii_lowercase(),
                op: AttrOp::Exists,
            }
        };
        if matches!(&attr, Simple::Attr { name, .. } if name.is_empty()) {
            return Err(invalid(text, "empty attribute name"));
        }
        return Ok((Some(attr), &rest[end + 1..]));
    }

    let (prefix, body) = match input.chars().next() {
        Some('#') => (Some('#'), &input[1..]),
        Some('.') => (Some('.'), &input[1..]),
        _ => (None, input),
    };
    let len = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(body.len());
    if len == 0 {
        return Err(invalid(text, "expected identifier"));
    }
    let ident = body[..len].to_string();
    let simple = match prefix {
        Some('#') => Simple::Id(ident),
        Some('.') => Simple::Class(ident),
        _ => Simple::Tag(ident.to_ascii_lowercase()),
    };
    Ok((Some(simple), &body[len..]))
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
        .to_string()
}

fn match_chain<T: SelectorTarget + ?Sized>(
    target: &T,
    chain: &[Compound],
    index: usize,
    node: NodeId,
) -> bool {
    if !match_compound(target, &chain[index], node) {
        return false;
    }
    if index == 0 {
        return true;
    }
    let mut ancestor = target.target_parent(node);
    while let Some(a) = ancestor {
        if match_chain(target, chain, index - 1, a) {
            return true;
        }
        ancestor = target.target_parent(a);
    }
    false
}

fn match_compound<T: SelectorTarget + ?Sized>(target: &T, compound: &Compound, node: NodeId) -> bool {
    compound.parts.iter().all(|part| match_simple(target, part, node))
}

fn match_simple<T: SelectorTarget + ?Sized>(target: &T, simple: &Simple, node: NodeId) -> bool {
    match simple {
        Simple::Tag(tag) => target.target_tag(node) == tag,
        Simple::Id(id) => target.target_attr(node, "id").as_deref() == Some(id.as_str()),
        Simple::Class(class) => target.target_has_class(node, class),
        Simple::Attr { name, op } => match (target.target_attr(node, name), op) {
            (None, _) => false,
            (Some(_), AttrOp::Exists) => true,
            (Some(v), AttrOp::Equals(expected)) => &v == expected,
            (Some(v), AttrOp::Prefix(prefix)) => v.starts_with(prefix.as_str()),
        },
        Simple::Not(inner) => !match_simple(target, inner, node),
    }
}
