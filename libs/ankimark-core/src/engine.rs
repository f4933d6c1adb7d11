//! Synchronization pass driver.

use chrono::Utc;

use crate::assembler::{Assembler, CardBlock, Step};
use crate::editor::Editor;
use crate::error::{Result, SyncError};
use crate::front_matter::FrontMatterDefaults;
use crate::render::Renderer;
use crate::rewriter::DocumentRewriter;
use crate::sync::{NoteStore, Synchronizer};
use crate::types::{CardError, CardOutcome, SyncReport, SyncSettings};

/// Run one synchronization pass over the editor's document.
///
/// Lines are processed in document order and every card is resolved before
/// the next line is classified. Remote failures are recorded per card in the
/// report; other errors abort the pass before the document is touched. The
/// document is replaced once, at the end, and only if its text changed.
pub async fn sync_document<E, S, R>(
    editor: &mut E,
    store: &S,
    renderer: &R,
    settings: &SyncSettings,
) -> Result<SyncReport>
where
    E: Editor,
    S: NoteStore,
    R: Renderer,
{
    let content = editor.text().ok_or(SyncError::NoActiveDocument)?;
    let lines: Vec<&str> = content.lines().collect();
    let (defaults, consumed) = FrontMatterDefaults::read(&lines);

    let mut pass = Pass {
        sync: Synchronizer::new(store, renderer, settings),
        defaults,
        rewriter: DocumentRewriter::for_document(&content),
        report: SyncReport::default(),
    };
    for line in &lines[..consumed] {
        pass.rewriter.keep(line);
    }
    pass.sync.load_catalog().await;

    let mut assembler = Assembler::new(settings);
    let mut steps = Vec::new();
    for (idx, line) in lines.iter().enumerate().skip(consumed) {
        assembler.feed(idx + 1, line, &mut steps);
        for step in steps.drain(..) {
            pass.apply(step).await?;
        }
    }
    assembler.finish(&mut steps);
    for step in steps.drain(..) {
        pass.apply(step).await?;
    }

    let Pass {
        rewriter,
        mut report,
        ..
    } = pass;
    let updated = rewriter.finish();
    report.document_changed = updated != content;
    if report.document_changed {
        editor.set_text(&updated)?;
    }
    report.finished_at = Utc::now();

    tracing::info!(
        added = report.added,
        updated = report.updated,
        deleted = report.deleted,
        skipped = report.skipped,
        errors = report.errors.len(),
        "sync pass complete"
    );
    Ok(report)
}

/// State threaded through one pass.
struct Pass<'a, S, R> {
    sync: Synchronizer<'a, S, R>,
    defaults: FrontMatterDefaults,
    rewriter: DocumentRewriter,
    report: SyncReport,
}

impl<S: NoteStore, R: Renderer> Pass<'_, S, R> {
    async fn apply(&mut self, step: Step) -> Result<()> {
        match step {
            Step::Passthrough(line) => self.rewriter.keep(&line),
            Step::Card(block) => {
                let outcome = self.resolve(&block).await?;
                self.rewriter.card(&block, &outcome);
            }
            Step::Delete { id, line, text } => {
                let result = self.sync.delete(id).await;
                let outcome = self.settle(result, line, Some(id))?;
                self.rewriter.delete_marker(&text, &outcome);
            }
        }
        Ok(())
    }

    async fn resolve(&mut self, block: &CardBlock) -> Result<CardOutcome> {
        let draft = &block.draft;
        let result = self.sync.resolve(draft, &self.defaults).await;
        self.settle(result, draft.line, draft.existing_id)
    }

    /// Count a card's outcome, or record its failure as a skip.
    /// Errors that are not scoped to one card abort the pass.
    fn settle(
        &mut self,
        result: Result<CardOutcome>,
        line: usize,
        note_id: Option<i64>,
    ) -> Result<CardOutcome> {
        match result {
            Ok(outcome) => {
                self.report.record(&outcome);
                Ok(outcome)
            }
            Err(e) if e.is_per_card() => {
                tracing::warn!(line, note_id = ?note_id, error = %e, "card not synchronized");
                self.report.errors.push(CardError {
                    line,
                    note_id,
                    message: e.to_string(),
                });
                Ok(CardOutcome::skip(note_id))
            }
            Err(e) => Err(e),
        }
    }
}
