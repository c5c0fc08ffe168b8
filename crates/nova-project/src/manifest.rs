//! JSON workspace manifests.
//!
//! ```json
//! {
//!   "projects": [{
//!     "name": "App",
//!     "dependencies": [{ "project": "Lib", "module_path": true }],
//!     "files": {
//!       "/App/src/module-info.java": "module app { requires lib; }",
//!       "/App/src/app/Main.java": { "path": "sources/Main.java" }
//!     },
//!     "units": [{ "path": "/App/src/app/Main.java", "package": "app" }]
//!   }]
//! }
//! ```
//!
//! File contents are given inline or as a path relative to the manifest.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use nova_hir::CompilationUnit;
use serde::Deserialize;
use thiserror::Error;

use crate::model::{Project, ProjectDependency, ProjectKind};
use crate::workspace::Workspace;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate project `{name}`")]
    DuplicateProject { name: String },

    #[error("project `{project}` depends on unknown project `{dependency}`")]
    UnknownDependency { project: String, dependency: String },

    #[error("unit `{path}` in project `{project}` has no source file")]
    MissingSource { project: String, path: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    projects: Vec<ProjectEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectEntry {
    name: String,
    #[serde(default)]
    kind: ProjectKind,
    #[serde(default)]
    dependencies: Vec<ProjectDependency>,
    #[serde(default)]
    files: BTreeMap<String, FileEntry>,
    #[serde(default)]
    units: Vec<CompilationUnit>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileEntry {
    Inline(String),
    OnDisk { path: PathBuf },
}

/// Load a manifest from disk; relative file paths resolve against its directory.
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Workspace, ManifestError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let manifest: ManifestFile =
        serde_json::from_str(&text).map_err(|source| ManifestError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    build(manifest, base)
}

/// Parse a manifest held in memory. On-disk file entries resolve against the
/// current directory.
pub fn parse_manifest(text: &str) -> Result<Workspace, ManifestError> {
    let manifest: ManifestFile =
        serde_json::from_str(text).map_err(|source| ManifestError::Json {
            path: PathBuf::from("<memory>"),
            source,
        })?;
    build(manifest, Path::new("."))
}

fn build(manifest: ManifestFile, base: &Path) -> Result<Workspace, ManifestError> {
    let mut names = BTreeSet::new();
    for entry in &manifest.projects {
        if !names.insert(entry.name.as_str()) {
            return Err(ManifestError::DuplicateProject {
                name: entry.name.clone(),
            });
        }
    }
    for entry in &manifest.projects {
        if let Some(dep) = entry
            .dependencies
            .iter()
            .find(|dep| !names.contains(dep.project.as_str()))
        {
            return Err(ManifestError::UnknownDependency {
                project: entry.name.clone(),
                dependency: dep.project.clone(),
            });
        }
    }

    let mut projects = Vec::with_capacity(manifest.projects.len());
    for entry in manifest.projects {
        let mut files = BTreeMap::new();
        for (path, file) in entry.files {
            let text = match file {
                FileEntry::Inline(text) => text,
                FileEntry::OnDisk { path: rel } => {
                    let full = base.join(rel);
                    std::fs::read_to_string(&full)
                        .map_err(|source| ManifestError::Io { path: full, source })?
                }
            };
            files.insert(path, text);
        }

        if entry.kind == ProjectKind::Source {
            if let Some(unit) = entry.units.iter().find(|u| !files.contains_key(&u.path)) {
                return Err(ManifestError::MissingSource {
                    project: entry.name,
                    path: unit.path.clone(),
                });
            }
        }

        projects.push(Project {
            name: entry.name,
            kind: entry.kind,
            dependencies: entry.dependencies,
            files,
            units: entry.units,
        });
    }

    tracing::debug!(target: "nova.project", projects = projects.len(), "loaded manifest");
    Ok(Workspace::new(projects))
}
