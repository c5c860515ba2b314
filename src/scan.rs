use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

mod targets;

pub use targets::{parse_targets, target_from_line};

/// The only file name recognized as a build recipe.
pub const MAKEFILE_NAME: &str = "Makefile";

/// A target name together with the Makefile that declared it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub name: String,
    pub makefile: PathBuf,
}

/// Result of a full scan
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Makefiles found, in visitation order
    pub makefiles: Vec<PathBuf>,

    /// Targets of all the makefiles, in discovery order
    pub targets: Vec<Target>,
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Failed to traverse {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Finds every file named `Makefile` under `root`.
///
/// Directory entries are visited in lexical order, so the result is stable for
/// a given tree.
pub fn find_makefiles(root: impl AsRef<Path>) -> Result<Vec<PathBuf>, ScanError> {
    let root = root.as_ref();
    let mut makefiles = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ScanError::Walk {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e,
        })?;

        if !entry.file_type().is_dir() && entry.file_name() == MAKEFILE_NAME {
            log::debug!("found {}", entry.path().display());
            makefiles.push(entry.into_path());
        }
    }

    Ok(makefiles)
}

/// Reads the targets declared in a single Makefile.
pub fn read_targets(makefile: impl AsRef<Path>) -> Result<Vec<String>, ScanError> {
    let makefile = makefile.as_ref();
    let read_error = |source: std::io::Error| ScanError::Read {
        path: makefile.to_path_buf(),
        source,
    };

    let file = File::open(makefile).map_err(read_error)?;
    parse_targets(BufReader::new(file)).map_err(read_error)
}

/// Scans `root` for Makefiles and collects their targets.
///
/// Any error aborts the whole scan, no partial report is returned.
pub fn scan(root: impl AsRef<Path>) -> Result<ScanReport, ScanError> {
    let makefiles = find_makefiles(root)?;

    let mut targets = Vec::new();
    for makefile in &makefiles {
        let names = read_targets(makefile)?;
        log::debug!("{}: {} targets", makefile.display(), names.len());
        targets.extend(names.into_iter().map(|name| Target {
            name,
            makefile: makefile.clone(),
        }));
    }

    log::info!(
        "scan found {} targets in {} makefiles",
        targets.len(),
        makefiles.len()
    );

    Ok(ScanReport { makefiles, targets })
}
