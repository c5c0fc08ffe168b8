//! Visibility and accessibility rules.
//!
//! Two layers decide whether a declaration can be proposed or bound from a
//! given location:
//! - module visibility ([`JpmsResolver`]): readability through `requires`
//!   and `requires transitive`, `exports` / qualified exports, and the
//!   classpath (unnamed module) rules
//! - Java access control ([`AccessContext`]): `private`, package access,
//!   `protected` and `public`
//!
//! Candidates that fail either check are excluded, never down-ranked.

mod access;
mod jpms;

pub use access::AccessContext;
pub use jpms::JpmsResolver;
