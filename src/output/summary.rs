//! Run summaries
//!
//! Per-page transform reports are folded into one `SyncSummary`, which the
//! binary renders as markdown at the end of a run.

use std::fmt::Write;

/// What one page transform did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    /// Views fetched again from the remote
    pub views_refreshed: u32,

    /// Views whose artifacts were carried forward
    pub views_reused: u32,

    /// Views skipped because they could not be resolved
    pub views_skipped: u32,

    /// Page artifacts written
    pub artifacts_written: u32,

    /// Images downloaded
    pub images_written: u32,

    /// Records appended to the secondary index
    pub index_records: usize,
}

impl TransformReport {
    /// True if at least one view was fetched again
    pub fn changed(&self) -> bool {
        self.views_refreshed > 0
    }
}

/// Totals for a whole run
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub pages_transformed: u32,
    pub pages_failed: u32,
    pub views_refreshed: u32,
    pub views_reused: u32,
    pub views_skipped: u32,
    pub artifacts_written: u32,
    pub images_written: u32,
    pub index_records: usize,

    /// Documents in the catalog (None when no catalog was built)
    pub catalog_documents: Option<usize>,

    /// Template groups in the catalog
    pub catalog_templates: Vec<String>,
}

impl SyncSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one successful page transform into the totals
    pub fn add(&mut self, report: &TransformReport) {
        self.pages_transformed += 1;
        self.views_refreshed += report.views_refreshed;
        self.views_reused += report.views_reused;
        self.views_skipped += report.views_skipped;
        self.artifacts_written += report.artifacts_written;
        self.images_written += report.images_written;
        self.index_records += report.index_records;
    }

    pub fn record_failure(&mut self) {
        self.pages_failed += 1;
    }

    /// Share of views served from existing artifacts, as a percentage
    pub fn reuse_rate(&self) -> f64 {
        let total = self.views_refreshed + self.views_reused;
        if total == 0 {
            return 0.0;
        }
        (self.views_reused as f64 / total as f64) * 100.0
    }
}

/// Formats a summary as markdown
pub fn format_markdown_summary(summary: &SyncSummary) -> String {
    let mut md = String::new();

    md.push_str("# tei-sync Summary\n\n");

    md.push_str("## Pages\n\n");
    let _ = writeln!(md, "- **Transformed**: {}", summary.pages_transformed);
    let _ = writeln!(md, "- **Failed**: {}\n", summary.pages_failed);

    md.push_str("## Views\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    let _ = writeln!(md, "| Refreshed | {} |", summary.views_refreshed);
    let _ = writeln!(md, "| Reused | {} |", summary.views_reused);
    let _ = writeln!(md, "| Skipped | {} |", summary.views_skipped);
    let _ = writeln!(md, "\n- **Reuse Rate**: {:.2}%", summary.reuse_rate());
    let _ = writeln!(md, "- **Artifacts Written**: {}", summary.artifacts_written);
    let _ = writeln!(md, "- **Images Written**: {}", summary.images_written);
    let _ = writeln!(md, "- **Index Records**: {}\n", summary.index_records);

    if let Some(documents) = summary.catalog_documents {
        md.push_str("## Catalog\n\n");
        let _ = writeln!(md, "- **Documents**: {}", documents);
        if !summary.catalog_templates.is_empty() {
            let _ = writeln!(
                md,
                "- **Templates**: {}",
                summary.catalog_templates.join(", ")
            );
        }
        md.push('\n');
    }

    md
}
