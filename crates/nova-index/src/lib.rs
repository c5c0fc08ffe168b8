//! Java element search over a [`nova_project::Workspace`].
//!
//! A [`SearchPattern`] names a type, method, constructor, field, package or
//! module and says which occurrences are wanted ([`LimitTo`]). The
//! [`SearchEngine`] walks the workspace HIR and reports each occurrence with a
//! [`MatchAccuracy`] describing how well generic type arguments agree.

mod accuracy;
mod engine;
mod pattern;

pub use accuracy::{erasures_equal, sigs_equal, type_args_accuracy, Accuracy, MatchAccuracy};
pub use engine::{
    RequestorError, SearchEngine, SearchError, SearchMatch, SearchRequestor, SearchScope,
};
pub use pattern::{
    LimitTo, MatchMode, MatchRule, PatternError, PatternKind, SearchFor, SearchPattern,
};
