//! Tree parsing client
//!
//! [`TreeParsingClient`] is the seam between the converter and whatever turns
//! source text into a syntax tree. [`TreeSitterClient`] is the in-process
//! implementation backed by the tree-sitter grammars.

use super::{Language, NodeRole, ParsedTree};
use crate::error::{ParseError, ParseResult};
use std::time::{Duration, Instant};
use tree_sitter::{ParseOptions, ParseState, Parser};

/// Turns file content into a [`ParsedTree`] within a bounded time
pub trait TreeParsingClient: Send + Sync {
    /// Parse `content` as `language`.
    ///
    /// Implementations should give up once `timeout` has elapsed and report
    /// [`ParseError::Timeout`]. Callers enforce the bound as well, so a
    /// client that overruns is abandoned rather than waited for. The thread
    /// it runs on stays busy until it returns, though, and a runtime shut
    /// down without a timeout blocks on it.
    fn parse(&self, content: &str, language: Language, timeout: Duration)
    -> ParseResult<ParsedTree>;
}

/// In-process parser using the bundled tree-sitter grammars
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeSitterClient;

impl TreeSitterClient {
    pub fn new() -> Self {
        Self
    }

    fn grammar(language: Language) -> tree_sitter::Language {
        match language {
            Language::Rust => tree_sitter_rust::LANGUAGE.into(),
            Language::Python => tree_sitter_python::LANGUAGE.into(),
            Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            // TSX is a superset of the TypeScript grammar
            Language::TypeScript => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Language::Php => tree_sitter_php::LANGUAGE_PHP.into(),
            Language::Go => tree_sitter_go::LANGUAGE.into(),
            Language::C => tree_sitter_c::LANGUAGE.into(),
            Language::Cpp => tree_sitter_cpp::LANGUAGE.into(),
            Language::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
            Language::Java => tree_sitter_java::LANGUAGE.into(),
            Language::Gdscript => tree_sitter_gdscript::LANGUAGE.into(),
        }
    }
}

impl TreeParsingClient for TreeSitterClient {
    fn parse(
        &self,
        content: &str,
        language: Language,
        timeout: Duration,
    ) -> ParseResult<ParsedTree> {
        let mut parser = Parser::new();
        parser
            .set_language(&Self::grammar(language))
            .map_err(|e| ParseError::Failure {
                language,
                reason: format!("Failed to set {language} grammar: {e}"),
            })?;

        let deadline = Instant::now() + timeout;
        let bytes = content.as_bytes();
        let mut cancel = |_: &ParseState| Instant::now() >= deadline;
        let options = ParseOptions::new().progress_callback(&mut cancel);

        let tree = parser.parse_with_options(
            &mut |offset, _| &bytes[offset.min(bytes.len())..],
            None,
            Some(options),
        );

        let Some(tree) = tree else {
            if Instant::now() >= deadline {
                return Err(ParseError::Timeout { language, timeout });
            }
            return Err(ParseError::Failure {
                language,
                reason: "parser returned no tree".to_string(),
            });
        };

        let root = tree.root_node();
        if root.has_error() {
            // Partial trees still carry the identifiers that did parse
            tracing::trace!(%language, "syntax errors in parsed tree");
        }

        Ok(convert_tree(root, bytes, language))
    }
}

/// Copy the named nodes of a tree-sitter tree into an owned [`ParsedTree`]
fn convert_tree(root: tree_sitter::Node, source: &[u8], language: Language) -> ParsedTree {
    let identifier_kinds = language.identifier_kinds();
    let mut parsed = ParsedTree::new(language, root.kind());
    let mut stack = vec![(root, ParsedTree::ROOT)];

    while let Some((node, parent_id)) = stack.pop() {
        let mut cursor = node.walk();
        let children: Vec<_> = node.named_children(&mut cursor).collect();

        // Reverse so that children are visited, and appended, in source order
        for child in children.into_iter().rev() {
            let kind = child.kind();
            let id = if identifier_kinds.contains(&kind) {
                let text = child.utf8_text(source).ok().map(str::to_string);
                parsed.push(parent_id, kind, NodeRole::Identifier, text)
            } else {
                parsed.push(parent_id, kind, NodeRole::Other, None)
            };
            stack.push((child, id));
        }
    }

    parsed
}
