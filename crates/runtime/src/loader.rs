//! Plugin archive discovery and the isolated loading context.
//!
//! Discovery is a directory scan filtered on the platform dynamic-library
//! suffix; loading maps each candidate into a [`LoadContext`] scoped to
//! exactly those archives, optionally chained to a parent context for
//! fallback symbol resolution. All the unsafe dylib handling lives in this
//! module.

use std::env::consts::DLL_EXTENSION;
use std::mem::ManuallyDrop;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;

use crate::aspect::{AspectDeclaration, CORE_VERSION, DECLARATION_SYMBOL, SystemAspect};
use crate::error::{BootstrapError, Result};

/// Lists candidate plugin archives: direct children of `dir` whose extension
/// matches the platform archive suffix, case-insensitively. No recursion.
///
/// A missing or empty directory yields zero candidates, not an error.
/// Candidates are sorted by path before canonicalization, so repeated scans
/// of an unchanged directory enumerate in the same order.
pub fn scan_archives(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_archive = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(DLL_EXTENSION));
        if is_archive {
            candidates.push(path);
        }
    }
    candidates.sort();

    // Conversion to a resolvable location is fail-fast: one malformed entry
    // blocks the whole bootstrap rather than activating a partial plugin set.
    candidates
        .into_iter()
        .map(|path| {
            std::fs::canonicalize(&path).map_err(|source| BootstrapError::PluginLocation {
                path,
                source: source.into(),
            })
        })
        .collect()
}

struct LoadedArchive {
    location: PathBuf,
    // Never dropped: aspects handed out by `declared_aspects` keep pointing
    // at code and vtables inside the mapping for the process lifetime, so
    // unloading on drop would leave them dangling.
    library: ManuallyDrop<Library>,
}

/// Isolated symbol-resolution boundary over a fixed set of plugin archives.
///
/// Created fresh per bootstrap call and valid for the entire activation
/// sequence; aspects commonly resolve dependent symbols through it while
/// configuring the container. [`LoadContext::close`] releases it exactly
/// once, after the last activation returns or fails.
pub struct LoadContext {
    archives: Vec<LoadedArchive>,
    parent: Option<Arc<LoadContext>>,
}

impl LoadContext {
    /// Context scoped to exactly `locations`, with no fallback.
    pub fn isolated(locations: Vec<PathBuf>) -> Result<Self> {
        Self::open(locations, None)
    }

    /// Context scoped to `locations`, falling back to `parent` for symbols
    /// its own archives do not provide. The parent never sees the child's
    /// symbols.
    pub fn chained(locations: Vec<PathBuf>, parent: Arc<LoadContext>) -> Result<Self> {
        Self::open(locations, Some(parent))
    }

    fn open(locations: Vec<PathBuf>, parent: Option<Arc<LoadContext>>) -> Result<Self> {
        let mut archives = Vec::with_capacity(locations.len());
        for location in locations {
            // Mapping is eager; an archive that cannot be opened aborts
            // discovery like any other unresolvable location.
            let library = unsafe { Library::new(&location) }.map_err(|source| {
                BootstrapError::PluginLocation {
                    path: location.clone(),
                    source: source.into(),
                }
            })?;
            tracing::debug!(archive = %location.display(), "mapped plugin archive");
            archives.push(LoadedArchive {
                location,
                library: ManuallyDrop::new(library),
            });
        }
        Ok(Self { archives, parent })
    }

    pub fn archive_count(&self) -> usize {
        self.archives.len()
    }

    /// Enumerates the aspect implementations declared by this context's own
    /// archives, in scan order.
    ///
    /// An archive without the declaration symbol declares zero aspects and
    /// contributes nothing. A declaration recorded against a different
    /// runtime version aborts enumeration.
    pub fn declared_aspects(&self) -> Result<Vec<Box<dyn SystemAspect>>> {
        let mut aspects = Vec::new();
        for archive in &self.archives {
            let declaration: &AspectDeclaration = match unsafe {
                archive
                    .library
                    .get::<*const AspectDeclaration>(DECLARATION_SYMBOL)
            } {
                Ok(symbol) => unsafe { &**symbol },
                Err(_) => {
                    tracing::debug!(
                        archive = %archive.location.display(),
                        "archive declares no aspects, skipping"
                    );
                    continue;
                }
            };

            let declared = declared_by(&archive.location, declaration)?;
            tracing::info!(
                archive = %archive.location.display(),
                count = declared.len(),
                "enumerated declared aspects"
            );
            aspects.extend(declared);
        }
        Ok(aspects)
    }

    /// Looks up `symbol` in this context's own archives first, then through
    /// the parent chain.
    ///
    /// # Safety
    ///
    /// The caller must supply the correct type for the symbol, as with
    /// [`Library::get`].
    pub unsafe fn symbol<T>(&self, name: &[u8]) -> Option<libloading::Symbol<'_, T>> {
        for archive in &self.archives {
            if let Ok(found) = unsafe { archive.library.get::<T>(name) } {
                return Some(found);
            }
        }
        match &self.parent {
            Some(parent) => unsafe { parent.symbol(name) },
            None => None,
        }
    }

    /// Marks the end of the activation sequence.
    ///
    /// Mapped archives stay resident with or without this call: bindings
    /// registered by their aspects keep referencing code inside them for the
    /// rest of the process lifetime, and there is no teardown of loaded
    /// extensions short of process exit. `close` exists as the semantic
    /// release point, not as an unload.
    pub fn close(self) {
        for archive in &self.archives {
            tracing::debug!(
                archive = %archive.location.display(),
                "context closed, archive stays resident"
            );
        }
    }
}

fn declared_by(
    location: &Path,
    declaration: &AspectDeclaration,
) -> Result<Vec<Box<dyn SystemAspect>>> {
    if declaration.core_version != CORE_VERSION {
        return Err(BootstrapError::IncompatibleArchive {
            path: location.to_path_buf(),
            expected: CORE_VERSION,
            found: declaration.core_version.to_string(),
        });
    }
    Ok((declaration.aspects)())
}
