//! Workspace and project model for Nova.
//!
//! A [`Workspace`] is a set of [`Project`]s, each holding source texts and
//! the HIR of its compilation units. From them the workspace derives:
//! - the JPMS [`ModuleGraph`](nova_modules::ModuleGraph) (one named module
//!   per project that has a `module-info.java`)
//! - each project's build path (project dependencies, module path vs classpath)
//! - a type table with name resolution and subtyping queries
//!
//! Workspaces can be built in code or loaded from a JSON manifest.

mod manifest;
mod model;
mod types;
mod workspace;

pub use manifest::{load_manifest, parse_manifest, ManifestError};
pub use model::{BuildPathEntry, Project, ProjectDependency, ProjectKind};
pub use types::{TypeRef, TypeScope};
pub use workspace::Workspace;
