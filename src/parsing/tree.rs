//! Owned syntax trees handed out by a [`TreeParsingClient`](super::TreeParsingClient).
//!
//! The grammar behind a tree is not modelled here. Consumers see each node
//! only through [`SyntaxNode`]: its kind, whether it plays an identifier
//! role, its text and its children.

use super::Language;
use std::borrow::Cow;

/// Coarse role of a node, as far as token extraction is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// Names a function, variable, type, field, ...
    Identifier,
    Other,
}

/// Minimal capability view of a parsed node
pub trait SyntaxNode: Sized {
    /// Grammar-specific node kind
    fn kind(&self) -> &str;

    fn role(&self) -> NodeRole;

    /// Source text, kept only for identifier nodes
    fn text(&self) -> Option<&str>;

    fn children(&self) -> Vec<Self>;
}

/// Index of a node inside its [`ParsedTree`]
pub type NodeId = usize;

#[derive(Debug, Clone)]
struct TreeNode {
    kind: Cow<'static, str>,
    role: NodeRole,
    text: Option<String>,
    children: Vec<NodeId>,
}

/// Arena-backed syntax tree that owns all of its data
///
/// Owning the data keeps the tree `Send`, so it can be produced on a
/// blocking worker and consumed anywhere.
#[derive(Debug, Clone)]
pub struct ParsedTree {
    language: Language,
    nodes: Vec<TreeNode>,
}

impl ParsedTree {
    /// Create a tree containing only a root node of `root_kind`
    pub fn new(language: Language, root_kind: impl Into<Cow<'static, str>>) -> Self {
        Self {
            language,
            nodes: vec![TreeNode {
                kind: root_kind.into(),
                role: NodeRole::Other,
                text: None,
                children: Vec::new(),
            }],
        }
    }

    pub const ROOT: NodeId = 0;

    /// Append a child under `parent` and return its id
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this tree.
    pub fn push(
        &mut self,
        parent: NodeId,
        kind: impl Into<Cow<'static, str>>,
        role: NodeRole,
        text: Option<String>,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            kind: kind.into(),
            role,
            text,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Convenience for appending an identifier leaf
    pub fn push_identifier(
        &mut self,
        parent: NodeId,
        kind: impl Into<Cow<'static, str>>,
        text: impl Into<String>,
    ) -> NodeId {
        self.push(parent, kind, NodeRole::Identifier, Some(text.into()))
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // The root always exists
        false
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: Self::ROOT,
        }
    }
}

/// Borrowed handle to one node of a [`ParsedTree`]
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a ParsedTree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn node(&self) -> &'a TreeNode {
        &self.tree.nodes[self.id]
    }
}

impl SyntaxNode for NodeRef<'_> {
    fn kind(&self) -> &str {
        &self.node().kind
    }

    fn role(&self) -> NodeRole {
        self.node().role
    }

    fn text(&self) -> Option<&str> {
        self.node().text.as_deref()
    }

    fn children(&self) -> Vec<Self> {
        self.node()
            .children
            .iter()
            .map(|&id| NodeRef {
                tree: self.tree,
                id,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_walk() {
        let mut tree = ParsedTree::new(Language::Python, "module");
        let call = tree.push(ParsedTree::ROOT, "call", NodeRole::Other, None);
        tree.push_identifier(call, "identifier", "print");
        tree.push_identifier(ParsedTree::ROOT, "identifier", "value");

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.language(), Language::Python);

        let root = tree.root();
        assert_eq!(root.kind(), "module");
        assert_eq!(root.role(), NodeRole::Other);

        let children = root.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].kind(), "call");
        assert_eq!(children[0].children()[0].text(), Some("print"));
        assert_eq!(children[1].role(), NodeRole::Identifier);
    }
}
