//! Table formatting for batch summaries and inspected documents.

use crate::batch::{BatchStats, RepositoryOutcome};
use crate::models::VocabularyIndex;
use crate::nbow::NbowDocument;
use comfy_table::{
    Attribute, Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    pub fn build(self) -> String {
        self.table.to_string()
    }
}

/// One row per repository plus a totals row
pub fn create_batch_table(stats: &BatchStats) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);

    table.set_header(vec![
        Cell::new("Repository").add_attribute(Attribute::Bold),
        Cell::new("Result").add_attribute(Attribute::Bold),
        Cell::new("Files").add_attribute(Attribute::Bold),
        Cell::new("Entries").add_attribute(Attribute::Bold),
        Cell::new("Time").add_attribute(Attribute::Bold),
    ]);

    for report in &stats.reports {
        let (result, color, entries) = match &report.outcome {
            RepositoryOutcome::Written { entries, .. } => {
                ("written".to_string(), Color::Green, entries.to_string())
            }
            RepositoryOutcome::SkippedExisting { .. } => {
                ("exists".to_string(), Color::Cyan, "-".to_string())
            }
            RepositoryOutcome::Empty => ("empty".to_string(), Color::Yellow, "0".to_string()),
            RepositoryOutcome::Failed { reason } => {
                (format!("failed: {reason}"), Color::Red, "-".to_string())
            }
        };

        table.add_row(vec![
            Cell::new(&report.repository),
            Cell::new(result).fg(color),
            Cell::new(report.files),
            Cell::new(entries),
            Cell::new(format!("{:.2}s", report.elapsed.as_secs_f64())),
        ]);
    }

    table.add_row(vec![
        Cell::new("TOTAL").add_attribute(Attribute::Bold),
        Cell::new(format!(
            "{} written, {} existing, {} empty, {} failed",
            stats.written, stats.skipped_existing, stats.empty, stats.failed
        ))
        .add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(format!("{:.2}s", stats.elapsed.as_secs_f64())).add_attribute(Attribute::Bold),
    ]);

    table.to_string()
}

/// Metadata and heaviest entries of a persisted document
///
/// Token names are resolved when the vocabulary the document was built
/// with is available.
pub fn create_document_table(
    document: &NbowDocument,
    vocabulary: Option<&VocabularyIndex>,
    limit: usize,
) -> String {
    let mut builder = TableBuilder::new()
        .set_headers(vec!["Field", "Value"])
        .add_row(vec![
            "Repository".to_string(),
            document.meta.repository.clone(),
        ])
        .add_row(vec![
            "Format version".to_string(),
            document.meta.version.to_string(),
        ])
        .add_row(vec![
            "Entries".to_string(),
            document.nbow.len().to_string(),
        ])
        .add_row(vec![
            "Norm".to_string(),
            format!("{:.6}", document.nbow.norm()),
        ]);

    for dependency in &document.meta.dependencies {
        builder = builder.add_row(vec![
            dependency.model.clone(),
            format!("{} ({})", dependency.short(), dependency.source),
        ]);
    }

    let mut output = builder.build();

    if limit > 0 && !document.nbow.is_empty() {
        let mut top = TableBuilder::new().set_headers(vec!["Index", "Token", "Weight"]);
        for (index, weight) in document.nbow.top(limit) {
            let token = vocabulary
                .and_then(|v| v.token_at(index))
                .unwrap_or("?")
                .to_string();
            top = top.add_row(vec![index.to_string(), token, format!("{weight:.6}")]);
        }
        output.push('\n');
        output.push_str(&top.build());
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::RepositoryReport;
    use crate::models::ModelId;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_table_builder() {
        let table = TableBuilder::new()
            .set_headers(vec!["Column 1", "Column 2"])
            .add_row(vec!["Value 1".to_string(), "Value 2".to_string()])
            .build();

        assert!(table.contains("Column 1"));
        assert!(table.contains("Value 1"));
    }

    #[test]
    fn test_batch_table() {
        let mut stats = BatchStats::default();
        stats.record(RepositoryReport {
            repository: "alpha".to_string(),
            outcome: RepositoryOutcome::Written {
                path: PathBuf::from("nbow_alpha.json"),
                entries: 42,
            },
            files: 7,
            elapsed: Duration::from_millis(300),
        });

        let table = create_batch_table(&stats);
        assert!(table.contains("alpha"));
        assert!(table.contains("42"));
        assert!(table.contains("1 written"));
    }

    #[test]
    fn test_document_table_resolves_tokens() {
        let vocab = VocabularyIndex::from_tokens(["test", "user"]).unwrap();
        let docfreq = ModelId::new("docfreq", "memory", b"{}");
        let document = NbowDocument::new(
            "/src/project",
            vocab.id(),
            &docfreq,
            [(1, 1.0)].into_iter().collect(),
        );

        let table = create_document_table(&document, Some(&vocab), 10);
        assert!(table.contains("/src/project"));
        assert!(table.contains("user"));
    }
}
