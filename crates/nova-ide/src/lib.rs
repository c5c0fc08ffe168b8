//! IDE-facing queries over a [`nova_project::Workspace`]: code completion
//! and code select.
//!
//! Both queries read the file text the workspace holds for a path and the
//! declaration model (HIR) its projects carry. Neither fails: unknown paths,
//! malformed buffers and unresolvable names produce empty results.

pub mod completion;
mod lookup;
mod scan;
mod select;
mod text;

pub use completion::{complete, rank, CompletionKind, CompletionRequest, Proposal, ScopeHints};
pub use select::{code_select, SelectRequest, SelectedElement};
