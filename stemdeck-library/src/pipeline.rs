//! External collaborators - acquisition, separation, transcoding
//!
//! Each tool sits behind a trait so the app can run the full
//! fetch -> separate -> transcode chain while tests substitute fakes.
//! The provided adapters shell out to `yt-dlp`, `demucs` and `ffmpeg`.

use crate::discover::find_separated_folder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{tool} failed ({status}): {stderr}")]
    Failed {
        tool: &'static str,
        status: String,
        stderr: String,
    },
    #[error("{tool} produced no output in {}", .dir.display())]
    MissingOutput { tool: &'static str, dir: PathBuf },
    #[error("Path exists but is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Fetches source audio from a locator (e.g. a video URL)
pub trait AcquisitionService {
    fn fetch(&self, locator: &str, out_dir: &Path) -> Result<PathBuf, PipelineError>;
}

/// Splits one recording into per-instrument files; returns their folder
pub trait SeparationService {
    fn separate(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, PipelineError>;
}

/// Re-encodes one file
pub trait TranscodingService {
    fn transcode(&self, input: &Path, output: &Path) -> Result<(), PipelineError>;
}

/// Run a tool to completion, capturing stderr for the error
fn run(tool: &'static str, command: &mut Command) -> Result<(), PipelineError> {
    tracing::info!(tool, ?command, "running");
    let output = command
        .output()
        .map_err(|source| PipelineError::Spawn { tool, source })?;
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.lines().last().unwrap_or("").trim().to_string();
    tracing::warn!(tool, status = %output.status, %stderr, "tool failed");
    Err(PipelineError::Failed {
        tool,
        status: output.status.to_string(),
        stderr,
    })
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Files in `dir` with extension `ext`, sorted by name
fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, PipelineError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, ext))
        .collect();
    files.sort();
    Ok(files)
}

/// `yt-dlp` audio extraction to MP3
#[derive(Debug, Clone)]
pub struct YtDlp {
    pub program: PathBuf,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self {
            program: PathBuf::from("yt-dlp"),
        }
    }
}

impl AcquisitionService for YtDlp {
    fn fetch(&self, locator: &str, out_dir: &Path) -> Result<PathBuf, PipelineError> {
        let template = out_dir.join("%(title)s.%(ext)s");
        run(
            "yt-dlp",
            Command::new(&self.program)
                .args(["-x", "--audio-format", "mp3", "--audio-quality", "0", "-o"])
                .arg(&template)
                .arg(locator),
        )?;

        // The newest MP3 in the folder is the one just written
        files_with_extension(out_dir, "mp3")?
            .into_iter()
            .max_by_key(|path| {
                fs::metadata(path)
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH)
            })
            .ok_or_else(|| PipelineError::MissingOutput {
                tool: "yt-dlp",
                dir: out_dir.to_path_buf(),
            })
    }
}

/// `demucs` source separation
#[derive(Debug, Clone)]
pub struct Demucs {
    pub program: PathBuf,
    /// Model name; also the first folder level of the output
    pub model: String,
}

impl Default for Demucs {
    fn default() -> Self {
        Self {
            program: PathBuf::from("demucs"),
            model: "htdemucs".to_string(),
        }
    }
}

impl SeparationService for Demucs {
    fn separate(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, PipelineError> {
        run(
            "demucs",
            Command::new(&self.program)
                .arg("-n")
                .arg(&self.model)
                .arg("--out")
                .arg(out_dir)
                .arg(input),
        )?;

        let song = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        find_separated_folder(out_dir, &self.model, song)
            .filter(|folder| {
                files_with_extension(folder, "wav")
                    .map(|files| !files.is_empty())
                    .unwrap_or(false)
            })
            .ok_or_else(|| PipelineError::MissingOutput {
                tool: "demucs",
                dir: out_dir.to_path_buf(),
            })
    }
}

/// `ffmpeg` MP3 encoder
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    pub program: PathBuf,
    pub bitrate: String,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            bitrate: "320k".to_string(),
        }
    }
}

impl TranscodingService for Ffmpeg {
    fn transcode(&self, input: &Path, output: &Path) -> Result<(), PipelineError> {
        run(
            "ffmpeg",
            Command::new(&self.program)
                .arg("-i")
                .arg(input)
                .args(["-acodec", "libmp3lame", "-b:a"])
                .arg(&self.bitrate)
                .arg("-y")
                .arg(output),
        )
    }
}

/// Result of preparing an output folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFolder {
    Created(PathBuf),
    Existing(PathBuf),
}

impl OutputFolder {
    pub fn path(&self) -> &Path {
        match self {
            OutputFolder::Created(path) | OutputFolder::Existing(path) => path,
        }
    }
}

/// Create `path` if missing; reject it if it exists as something else
pub fn prepare_output_dir(path: &Path) -> Result<OutputFolder, PipelineError> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        tracing::info!(dir = %path.display(), "created output folder");
        return Ok(OutputFolder::Created(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(PipelineError::NotADirectory(path.to_path_buf()));
    }
    Ok(OutputFolder::Existing(path.to_path_buf()))
}

/// Encode every WAV in `stems_folder` to `<out_dir>/<base_name>_<stem>.mp3`
///
/// A stem that fails to encode is skipped; the rest still come through.
pub fn transcode_stems(
    transcoder: &dyn TranscodingService,
    stems_folder: &Path,
    out_dir: &Path,
    base_name: &str,
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut encoded = Vec::new();
    for wav in files_with_extension(stems_folder, "wav")? {
        let stem = wav.file_stem().and_then(|s| s.to_str()).unwrap_or("stem");
        let output = out_dir.join(format!("{}_{}.mp3", base_name, stem));

        match transcoder.transcode(&wav, &output) {
            Ok(()) if output.exists() => encoded.push(output),
            Ok(()) => tracing::warn!(output = %output.display(), "encoder wrote nothing"),
            Err(e) => tracing::warn!(stem, error = %e, "skipping stem"),
        }
    }
    Ok(encoded)
}

/// Separate `input` into stems under `work_dir` and encode them into `out_dir`
pub fn separate_to_mp3(
    separator: &dyn SeparationService,
    transcoder: &dyn TranscodingService,
    input: &Path,
    work_dir: &Path,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, PipelineError> {
    prepare_output_dir(work_dir)?;
    prepare_output_dir(out_dir)?;

    let stems_folder = separator.separate(input, work_dir)?;
    let base_name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("song");
    let encoded = transcode_stems(transcoder, &stems_folder, out_dir, base_name)?;
    if encoded.is_empty() {
        return Err(PipelineError::MissingOutput {
            tool: "transcoder",
            dir: out_dir.to_path_buf(),
        });
    }
    tracing::info!(count = encoded.len(), "stems encoded");
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stemdeck-pipe-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Copies input to output, failing for names containing "bad"
    struct CopyTranscoder;

    impl TranscodingService for CopyTranscoder {
        fn transcode(&self, input: &Path, output: &Path) -> Result<(), PipelineError> {
            if input.to_string_lossy().contains("bad") {
                return Err(PipelineError::Failed {
                    tool: "copy",
                    status: "exit status: 1".into(),
                    stderr: "refused".into(),
                });
            }
            fs::copy(input, output)?;
            Ok(())
        }
    }

    /// Writes a fixed set of WAVs in the nested separator layout
    struct FakeSeparator;

    impl SeparationService for FakeSeparator {
        fn separate(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, PipelineError> {
            let song = input.file_stem().and_then(|s| s.to_str()).unwrap_or("song");
            let folder = out_dir.join("htdemucs").join(song);
            fs::create_dir_all(&folder)?;
            for stem in ["vocals", "drums", "bass", "other"] {
                fs::write(folder.join(format!("{}.wav", stem)), b"RIFF")?;
            }
            Ok(folder)
        }
    }

    #[test]
    fn test_prepare_output_dir() {
        let root = scratch("prepare");
        let fresh = root.join("a").join("b");
        assert_eq!(
            prepare_output_dir(&fresh).unwrap(),
            OutputFolder::Created(fresh.clone())
        );
        assert_eq!(
            prepare_output_dir(&fresh).unwrap(),
            OutputFolder::Existing(fresh.clone())
        );

        let file = root.join("file.txt");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            prepare_output_dir(&file),
            Err(PipelineError::NotADirectory(_))
        ));
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_transcode_names_and_skips_failures() {
        let root = scratch("transcode");
        let stems = root.join("stems");
        let out = root.join("out");
        fs::create_dir_all(&stems).unwrap();
        fs::create_dir_all(&out).unwrap();
        for name in ["vocals.wav", "bad_drums.wav", "bass.wav", "cover.jpg"] {
            fs::write(stems.join(name), b"data").unwrap();
        }

        let encoded = transcode_stems(&CopyTranscoder, &stems, &out, "My_Song").unwrap();

        let names: Vec<String> = encoded
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["My_Song_bass.mp3", "My_Song_vocals.mp3"]);
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_separate_to_mp3() {
        let root = scratch("chain");
        let input = root.join("track.mp3");
        fs::write(&input, b"ID3").unwrap();

        let encoded = separate_to_mp3(
            &FakeSeparator,
            &CopyTranscoder,
            &input,
            &root.join("work"),
            &root.join("out"),
        )
        .unwrap();

        assert_eq!(encoded.len(), 4);
        assert!(encoded.iter().all(|p| p.starts_with(root.join("out"))));
        assert!(root.join("out").join("track_vocals.mp3").exists());
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_missing_tool_is_spawn_error() {
        let ffmpeg = Ffmpeg {
            program: PathBuf::from("stemdeck-no-such-encoder"),
            ..Default::default()
        };
        let err = ffmpeg
            .transcode(Path::new("in.wav"), Path::new("out.mp3"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Spawn { tool: "ffmpeg", .. }));
    }
}
