//! Colored terminal rendering for bdaycal types.

use bdaycal_core::apply::ApplyFailure;
use bdaycal_core::diff::{BirthdayDiff, DiffKind, ReconciliationPlan};
use bdaycal_core::remote::SkippedEntry;
use bdaycal_core::sync::SyncReport;
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for DiffKind {
    fn render(&self) -> String {
        let symbol = self.symbol();
        match self {
            DiffKind::Create => symbol.green().to_string(),
            DiffKind::Replace => symbol.yellow().to_string(),
            DiffKind::Delete => symbol.red().to_string(),
        }
    }
}

fn colorize_diff(kind: DiffKind, text: &str) -> String {
    match kind {
        DiffKind::Create => text.green().to_string(),
        DiffKind::Replace => text.yellow().to_string(),
        DiffKind::Delete => text.red().to_string(),
    }
}

impl Render for BirthdayDiff {
    fn render(&self) -> String {
        let label = colorize_diff(self.kind, &self.label());
        let date = match self.previous_birthday() {
            Some(previous) => format!("{} → {}", previous, self.birthday()),
            None => self.birthday().to_string(),
        };

        format!("{} {} {}", self.kind.render(), label, date.dimmed())
    }
}

impl Render for ApplyFailure {
    fn render(&self) -> String {
        format!(
            "{} {} {}: {}",
            "!".red(),
            self.operation,
            self.href,
            self.error.red()
        )
    }
}

impl Render for SkippedEntry {
    fn render(&self) -> String {
        format!("{} {} {}", "?".yellow(), self.href, self.reason.dimmed())
    }
}

/// Above this many changes the plan is shown as counts.
const COMPACT_THRESHOLD: usize = 5;

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

pub trait PlanRender {
    fn render(&self, verbose: bool) -> String;
}

impl PlanRender for ReconciliationPlan {
    fn render(&self, verbose: bool) -> String {
        if self.is_empty() {
            return "   No changes".dimmed().to_string();
        }

        let mut lines = Vec::new();

        if verbose || self.len() <= COMPACT_THRESHOLD {
            for diff in self.diffs() {
                lines.push(format!("   {}", diff.render()));
            }
        } else {
            let counts = [
                (DiffKind::Create, self.to_create.len(), "new"),
                (DiffKind::Replace, self.to_replace.len(), "changed"),
                (DiffKind::Delete, self.to_delete.len(), "removed"),
            ];
            for (kind, count, adjective) in counts {
                if count == 0 {
                    continue;
                }
                let label = format!("({} {} {})", count, adjective, pluralize("birthday", count));
                lines.push(format!("   {} {}", kind.render(), colorize_diff(kind, &label)));
            }
        }

        lines.join("\n")
    }
}

impl Render for SyncReport {
    fn render(&self) -> String {
        let apply = &self.apply;
        let mut lines = Vec::new();

        if apply.succeeded() == 0 && !apply.has_failures() {
            lines.push(format!(
                "   {} ({} {} up to date)",
                "No changes".dimmed(),
                self.managed,
                pluralize("birthday", self.managed)
            ));
        } else {
            let counts = [
                (DiffKind::Create, apply.created.len(), "created"),
                (DiffKind::Replace, apply.replaced.len(), "updated"),
                (DiffKind::Delete, apply.deleted.len(), "deleted"),
            ];
            for (kind, count, verb) in counts {
                if count > 0 {
                    let label = format!("{} {}", count, verb);
                    lines.push(format!("   {} {}", kind.render(), colorize_diff(kind, &label)));
                }
            }
        }

        if apply.has_failures() {
            lines.push(format!("   {}", format!("{} failed", apply.failed.len()).red()));
            for failure in &apply.failed {
                lines.push(format!("      {}", failure.render()));
            }
        }

        if !self.skipped.is_empty() {
            let label = format!(
                "{} unreadable {} left untouched",
                self.skipped.len(),
                pluralize("resource", self.skipped.len())
            );
            lines.push(format!("   {}", label.yellow()));
            for skipped in &self.skipped {
                lines.push(format!("      {}", skipped.render()));
            }
        }

        lines.join("\n")
    }
}
