//! Markup parsing seam.
//!
//! Discovery only needs the macro invocations of a document, so the tree
//! exposed here ([`Xdom`]) keeps macro blocks and drops everything else.

mod wiki;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub use wiki::{WikiParser, MAX_NESTING, XWIKI_2_0, XWIKI_2_1};

use crate::error::Result;

/// Parameter carrying a fragment's id
pub const ID_PARAMETER: &str = "id";

/// One macro invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacroBlock {
    pub name: String,
    pub parameters: BTreeMap<String, String>,
    /// Raw body; `None` for the self-closing form
    pub content: Option<String>,
    /// Macros found inside the body
    pub children: Vec<MacroBlock>,
}

impl MacroBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: BTreeMap::new(),
            content: None,
            children: Vec::new(),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.parameter(ID_PARAMETER)
    }

    /// Body, or the empty string for self-closing macros
    pub fn body(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Parsed document
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Xdom {
    pub blocks: Vec<MacroBlock>,
}

pub trait Parser: Send + Sync {
    /// Syntax id, e.g. `xwiki/2.1`
    fn syntax(&self) -> &str;

    fn parse(&self, content: &str) -> Result<Xdom>;
}

/// Parsers by syntax id
#[derive(Clone)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn Parser>>,
}

impl ParserRegistry {
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    pub fn register(&mut self, parser: Arc<dyn Parser>) {
        self.parsers.insert(parser.syntax().to_string(), parser);
    }

    pub fn get(&self, syntax: &str) -> Option<Arc<dyn Parser>> {
        self.parsers.get(syntax).cloned()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(WikiParser::new(XWIKI_2_0)));
        registry.register(Arc::new(WikiParser::new(XWIKI_2_1)));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_syntaxes() {
        let registry = ParserRegistry::default();
        assert_eq!(registry.get(XWIKI_2_0).unwrap().syntax(), XWIKI_2_0);
        assert_eq!(registry.get(XWIKI_2_1).unwrap().syntax(), XWIKI_2_1);
        assert!(registry.get("markdown/1.2").is_none());
    }

    #[test]
    fn test_tree_shape() {
        let xdom = registry_parse("{{box}}{{groovy id=\"a\"}}1{{/groovy}}{{/box}}{{velocity id=b/}}");
        let names: Vec<_> = xdom.blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["box", "velocity"]);
        assert_eq!(xdom.blocks[0].children[0].id(), Some("a"));
    }

    fn registry_parse(content: &str) -> Xdom {
        ParserRegistry::default()
            .get(XWIKI_2_1)
            .unwrap()
            .parse(content)
            .unwrap()
    }
}
