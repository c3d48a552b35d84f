//! Stem discovery - find playable stems in a folder

use std::fs;
use std::path::{Path, PathBuf};
use stemdeck_audio::display_label;
use thiserror::Error;

/// Extensions treated as stems
pub const STEM_EXTENSIONS: [&str; 4] = ["mp3", "wav", "flac", "ogg"];

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("No stems ({}) in {}", STEM_EXTENSIONS.join(", "), .0.display())]
    NoStems(PathBuf),
}

/// Broad stem category, used for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StemKind {
    Vocals,
    Drums,
    Bass,
    Other,
}

impl StemKind {
    /// Classify from a file name or label
    pub fn classify(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("vocal") {
            StemKind::Vocals
        } else if name.contains("drum") {
            StemKind::Drums
        } else if name.contains("bass") {
            StemKind::Bass
        } else {
            StemKind::Other
        }
    }

    /// Short tag for narrow layouts
    pub fn tag(self) -> &'static str {
        match self {
            StemKind::Vocals => "VOX",
            StemKind::Drums => "DRM",
            StemKind::Bass => "BAS",
            StemKind::Other => "OTH",
        }
    }
}

/// A stem file ready to load
#[derive(Debug, Clone, PartialEq)]
pub struct StemFile {
    pub path: PathBuf,
    pub label: String,
    pub kind: StemKind,
}

impl StemFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("stem");
        let label = display_label(stem);
        let kind = StemKind::classify(stem);
        Self { path, label, kind }
    }
}

/// Whether `path` has a stem extension (any case)
pub fn is_stem_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| STEM_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Playable stems directly inside `dir`, in file-name order
pub fn discover_stems(dir: &Path) -> Result<Vec<StemFile>, DiscoverError> {
    if !dir.is_dir() {
        return Err(DiscoverError::NotADirectory(dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_stem_file(path))
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(DiscoverError::NoStems(dir.to_path_buf()));
    }

    tracing::info!(dir = %dir.display(), count = paths.len(), "stems discovered");
    Ok(paths.into_iter().map(StemFile::from_path).collect())
}

/// Locate a separator's output folder for `song`
///
/// Separators write `<out>/<model>/<song>/`; when the model folder is not
/// the expected one, any `<out>/*/<song>/` is accepted.
pub fn find_separated_folder(out: &Path, model: &str, song: &str) -> Option<PathBuf> {
    let expected = out.join(model).join(song);
    if expected.is_dir() {
        return Some(expected);
    }

    let mut models: Vec<PathBuf> = fs::read_dir(out)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    models.sort();

    models
        .into_iter()
        .map(|model_dir| model_dir.join(song))
        .find(|candidate| candidate.is_dir())
}
