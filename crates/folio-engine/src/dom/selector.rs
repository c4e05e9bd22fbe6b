//! Minimal CSS selector matching: `tag`, `.class`, `#id` compounds and comma lists.

use super::{Dom, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn parse(input: &str) -> Option<Self> {
        let mut compound = Compound::default();
        let mut rest = input.trim();
        if rest.is_empty() {
            return None;
        }

        let tag_end = rest.find(['.', '#']).unwrap_or(rest.len());
        if tag_end > 0 {
            let tag = &rest[..tag_end];
            if tag != "*" {
                compound.tag = Some(tag.to_ascii_lowercase());
            }
        }
        rest = &rest[tag_end..];

        while let Some(prefix) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['.', '#']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return None;
            }
            match prefix {
                '.' => compound.classes.push(name.to_string()),
                '#' => compound.id = Some(name.to_string()),
                _ => return None,
            }
            rest = &body[end..];
        }
        Some(compound)
    }

    fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        let Some(tag) = dom.tag_name(node) else {
            return false;
        };
        if self.tag.as_deref().is_some_and(|t| t != tag) {
            return false;
        }
        if let Some(id) = &self.id
            && dom.attribute(node, "id") != Some(id.as_str())
        {
            return false;
        }
        self.classes.iter().all(|c| dom.has_class(node, c))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

impl Selector {
    /// Parses a selector; unparseable alternatives are dropped and never match.
    pub fn parse(input: &str) -> Self {
        Self {
            alternatives: input.split(',').filter_map(Compound::parse).collect(),
        }
    }

    pub fn tag(tag: &str) -> Self {
        Self::parse(tag)
    }

    pub fn class(class: &str) -> Self {
        Self {
            alternatives: vec![Compound {
                classes: vec![class.to_string()],
                ..Compound::default()
            }],
        }
    }

    pub fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        self.alternatives.iter().any(|c| c.matches(dom, node))
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}
