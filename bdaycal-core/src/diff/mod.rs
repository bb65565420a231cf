//! Reconciliation of the contact set against the managed events.

mod birthday_diff;
mod diff_kind;
mod plan;

pub use birthday_diff::BirthdayDiff;
pub use diff_kind::DiffKind;
pub use plan::{ReconciliationPlan, plan};
