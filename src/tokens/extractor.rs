//! Identifier token extraction from parsed files

use super::IdentifierSplitter;
use crate::error::ParseResult;
use crate::parsing::{Language, NodeRole, SyntaxNode, TreeParsingClient};
use std::sync::Arc;
use std::time::Duration;

/// Parses a file and yields the sub-tokens of its identifiers
#[derive(Clone)]
pub struct TokenExtractor {
    client: Arc<dyn TreeParsingClient>,
    splitter: IdentifierSplitter,
}

impl std::fmt::Debug for TokenExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenExtractor")
            .field("splitter", &self.splitter)
            .finish_non_exhaustive()
    }
}

impl TokenExtractor {
    pub fn new(client: Arc<dyn TreeParsingClient>, splitter: IdentifierSplitter) -> Self {
        Self { client, splitter }
    }

    /// Extract tokens, treating any parse failure as an empty file
    pub fn extract(&self, content: &str, language: Language, timeout: Duration) -> Vec<String> {
        self.try_extract(content, language, timeout)
            .unwrap_or_else(|e| {
                tracing::debug!(%language, "no tokens extracted: {e}");
                Vec::new()
            })
    }

    /// Extract tokens, reporting why parsing failed
    pub fn try_extract(
        &self,
        content: &str,
        language: Language,
        timeout: Duration,
    ) -> ParseResult<Vec<String>> {
        let tree = self.client.parse(content, language, timeout)?;
        Ok(self.extract_tree(&tree.root()))
    }

    /// Walk a tree and split every identifier-role node into sub-tokens
    ///
    /// Tokens come out in pre-order, so source order for well-formed trees.
    pub fn extract_tree<N: SyntaxNode>(&self, root: &N) -> Vec<String> {
        let mut tokens = Vec::new();

        if root.role() == NodeRole::Identifier {
            self.split_into(root, &mut tokens);
        }

        let mut stack: Vec<N> = root.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if node.role() == NodeRole::Identifier {
                self.split_into(&node, &mut tokens);
            }
            stack.extend(node.children().into_iter().rev());
        }

        tokens
    }

    fn split_into<N: SyntaxNode>(&self, node: &N, tokens: &mut Vec<String>) {
        if let Some(text) = node.text() {
            tokens.extend(self.splitter.split(text));
        }
    }
}
