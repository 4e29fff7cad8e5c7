use chrono::Local;
use flate2::{write::GzEncoder, Compression};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info};

use crate::error::ArchiveError;

pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// What a managed directory is used for. Purely informational, every role
/// behaves identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryRole {
    /// Images are ingested from here.
    Ingest,
    /// Finished archives are written here.
    Output,
    /// The canonical image tree.
    Data,
}

/// A managed filesystem directory. Guaranteed to exist on disk after
/// construction. Holds no cached state, every operation re-reads the
/// filesystem.
#[derive(Debug, Clone)]
pub struct Directory {
    path: PathBuf,
    role: DirectoryRole,
}

impl Directory {
    /// Create the directory at `path`, along with any missing parents.
    /// Succeeds silently if it already exists.
    pub fn create(path: impl Into<PathBuf>, role: DirectoryRole) -> Result<Self, ArchiveError> {
        let path = path.into();
        fs::create_dir_all(&path)?;
        Ok(Self { path, role })
    }

    /// Same as [`Self::create`], resolving `path` against the current working
    /// directory first.
    pub fn create_relative(
        path: impl AsRef<Path>,
        role: DirectoryRole,
    ) -> Result<Self, ArchiveError> {
        let path = std::env::current_dir()?.join(path);
        Self::create(path, role)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn role(&self) -> DirectoryRole {
        self.role
    }

    /// Remove every top-level entry, recursing into subdirectories.
    /// Individual failures are logged and the sweep continues.
    pub fn empty_all(&self) -> Result<(), ArchiveError> {
        for entry in fs::read_dir(&self.path)?.filter_map(Result::ok) {
            remove_entry(&entry.path());
        }
        Ok(())
    }

    /// Remove only the entries at the given paths, resolved against this
    /// directory's root, with the same per-entry semantics as
    /// [`Self::empty_all`]. All paths are validated before anything is
    /// removed.
    pub fn empty_some<I, P>(&self, paths: I) -> Result<(), ArchiveError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths = self.resolve_all(paths)?;

        for path in paths {
            remove_entry(&path);
        }

        Ok(())
    }

    /// Recursively copy everything under `source` into this directory,
    /// preserving relative structure. Existing files at the same relative
    /// path are overwritten. Aborts on the first failure.
    pub fn fetch_all_from(&self, source: &Directory) -> Result<(), ArchiveError> {
        debug!("Copying {} into {}", source, self);
        copy_tree(&source.path, &self.path)
    }

    /// Copy only the named entries from `source` into this directory's root.
    /// The copy is flat: each entry lands directly under the root, named by
    /// its final path component.
    pub fn fetch_some_from<I, P>(&self, source: &Directory, paths: I) -> Result<(), ArchiveError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths = source.resolve_all(paths)?;

        for src in paths {
            if !src.exists() {
                return Err(ArchiveError::NotFound(src.display().to_string()));
            }

            let Some(name) = src.file_name() else {
                return Err(ArchiveError::InvalidArgument(format!(
                    "{}: no file name to copy under",
                    src.display()
                )));
            };

            let dst = self.path.join(name);

            if src.is_dir() {
                copy_tree(&src, &dst)?;
            } else {
                fs::copy(&src, &dst)?;
            }
        }

        Ok(())
    }

    /// Bundle this directory's entire tree into a gzipped tar archive named
    /// `<YYYY-MM-DD-HHMMSS>-<basename>.tar.gz`, written into `outdir` or,
    /// when none is given, into this directory itself. The archive holds a
    /// single top-level folder with the same stem.
    ///
    /// Top-level entries are snapshotted before the archive file is opened,
    /// so an archive written into its own tree never lists itself.
    pub fn create_archive(&self, outdir: Option<&Directory>) -> Result<PathBuf, ArchiveError> {
        let outdir = outdir.unwrap_or(self);

        let basename = self.basename()?;
        let stamp = Local::now().format("%Y-%m-%d-%H%M%S");
        let root = format!("{stamp}-{basename}");

        let entries = fs::read_dir(&self.path)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .collect::<Vec<_>>();

        let archive_path = outdir.path.join(format!("{root}{ARCHIVE_SUFFIX}"));

        info!("Archiving {} to {}", self, archive_path.display());

        let file = BufWriter::new(File::create(&archive_path)?);
        let mut tar = tar::Builder::new(GzEncoder::new(file, Compression::default()));

        tar.append_dir(&root, &self.path)?;

        for path in entries {
            let Some(name) = path.file_name() else {
                continue;
            };

            let mount = Path::new(&root).join(name);

            if path.is_dir() {
                tar.append_dir_all(&mount, &path)?;
            } else {
                tar.append_path_with_name(&path, &mount)?;
            }
        }

        let mut file = tar.into_inner()?.finish()?;
        file.flush()?;

        Ok(archive_path)
    }

    /// Delete every top-level archive file, identified by the `.tar.gz`
    /// suffix. Does not recurse. Failures are logged and the sweep
    /// continues.
    pub fn remove_archives(&self) -> Result<(), ArchiveError> {
        for entry in fs::read_dir(&self.path)?.filter_map(Result::ok) {
            let path = entry.path();

            let is_archive = path
                .file_name()
                .and_then(OsStr::to_str)
                .is_some_and(|name| name.ends_with(ARCHIVE_SUFFIX));

            if !is_archive {
                continue;
            }

            if let Err(e) = fs::remove_file(&path) {
                error!("Failed to remove {}: {e}", path.display());
            }
        }

        Ok(())
    }

    fn basename(&self) -> Result<&str, ArchiveError> {
        self.path
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or_else(|| {
                ArchiveError::InvalidArgument(format!(
                    "{}: directory has no usable basename",
                    self.path.display()
                ))
            })
    }

    /// Resolve the given relative paths against this directory's root,
    /// rejecting any that are absolute or that climb out of it. Nothing is
    /// resolved unless every path is valid.
    fn resolve_all<I, P>(&self, paths: I) -> Result<Vec<PathBuf>, ArchiveError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut resolved = vec![];

        for path in paths {
            let path = path.as_ref();

            let escapes = path.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::RootDir | Component::Prefix(_)
                )
            });

            if escapes {
                return Err(ArchiveError::InvalidArgument(format!(
                    "{}: not a path relative to {}",
                    path.display(),
                    self.path.display()
                )));
            }

            resolved.push(self.path.join(path));
        }

        Ok(resolved)
    }
}

impl std::fmt::Display for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Unlink a file or symlink, remove a directory tree. Never fails, only
/// logs.
fn remove_entry(path: &Path) {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!("Failed to remove {}: {e}", path.display());
    }
}

fn copy_tree(src: &Path, dst: &Path) -> Result<(), ArchiveError> {
    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());

        if entry.path().is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}
