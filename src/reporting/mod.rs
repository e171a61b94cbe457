//! Report rendering: the plain-text summary, the Markdown file, and the
//! coloured console view.

mod console;
mod markdown;
mod shared;
mod summary;

pub use console::{print_audit_report, print_quality_report, print_task_result};
pub use markdown::{render_markdown, write_report};
pub(crate) use shared::pluralize;
pub use summary::{render_summary, P1_DETAIL_LIMIT};
