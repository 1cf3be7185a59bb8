//! Class-list resolution.
//!
//! The class list fixes the network's output dimensionality, so it must
//! be settled before the session loads. Sources are tried in order:
//! training-directory subfolders, class names embedded in the
//! checkpoint, placeholders sized from a recognised final-layer shape.
//! Each source is a total fallback, never a merge; the first one that
//! yields a non-empty list wins. Exact label strings are preferred, but
//! the service still starts with anonymous placeholders rather than
//! refusing over missing names alone.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use leaflife_core::placeholder_classes;
use thiserror::Error;
use tracing::{info, warn};

use crate::checkpoint::Checkpoint;

#[derive(Error, Debug)]
pub enum ClassResolveError {
    #[error("failed to list training directory {path}: {source}")]
    TrainDir { path: String, source: io::Error },
    #[error("duplicate class name {name:?} in {origin}")]
    Duplicate { name: String, origin: &'static str },
    #[error(
        "unable to determine class names: supply a training directory with one subfolder per class, or embed a `classes` list in the checkpoint metadata"
    )]
    Unresolvable,
}

/// Which source produced the class list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassSource {
    TrainDir,
    Embedded,
    HeadShape,
}

/// Resolved class list plus the source that produced it.
#[derive(Debug)]
pub struct ResolvedClasses {
    pub names: Vec<String>,
    pub source: ClassSource,
}

/// Resolve the class list for a checkpoint.
pub fn resolve_classes(
    train_dir: Option<&Path>,
    checkpoint: &Checkpoint,
) -> Result<ResolvedClasses, ClassResolveError> {
    if let Some(dir) = train_dir
        && dir.is_dir()
    {
        let names = subfolder_names(dir)?;
        if names.is_empty() {
            warn!(dir = %dir.display(), "training directory has no class subfolders");
        } else {
            ensure_unique(&names, "training directory")?;
            info!(count = names.len(), dir = %dir.display(), "class names from training directory");
            return Ok(ResolvedClasses {
                names,
                source: ClassSource::TrainDir,
            });
        }
    }

    if let Some(names) = checkpoint.embedded_classes() {
        ensure_unique(&names, "checkpoint metadata")?;
        info!(count = names.len(), "class names embedded in checkpoint");
        return Ok(ResolvedClasses {
            names,
            source: ClassSource::Embedded,
        });
    }

    if let Some(n) = checkpoint.head_dim() {
        info!(count = n, "no class names available, using placeholders sized from the classification head");
        return Ok(ResolvedClasses {
            names: placeholder_classes(n),
            source: ClassSource::HeadShape,
        });
    }

    Err(ClassResolveError::Unresolvable)
}

/// Names of the immediate subdirectories of `dir`, lexicographically
/// sorted. Plain files are ignored.
fn subfolder_names(dir: &Path) -> Result<Vec<String>, ClassResolveError> {
    let listing_err = |source| ClassResolveError::TrainDir {
        path: dir.display().to_string(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(listing_err)? {
        let entry = entry.map_err(listing_err)?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

fn ensure_unique(names: &[String], origin: &'static str) -> Result<(), ClassResolveError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ClassResolveError::Duplicate {
                name: name.clone(),
                origin,
            });
        }
    }
    Ok(())
}
