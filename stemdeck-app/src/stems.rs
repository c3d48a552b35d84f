//! Resolve which stems to mix

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use stemdeck_library::{
    discover_stems, is_stem_file, prepare_output_dir, separate_to_mp3, AcquisitionService, Config,
    Demucs, Ffmpeg, StemFile, YtDlp,
};

use crate::cli::CliOptions;

/// Folder used when neither `--out` nor a remembered folder is set
fn fallback_out_dir() -> PathBuf {
    dirs::audio_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stemdeck")
}

/// Stems from the external tools, the command line, or the remembered folder
pub fn gather_stems(cli: &CliOptions, config: &mut Config) -> Result<Vec<StemFile>> {
    if cli.runs_pipeline() {
        return run_pipeline(cli, config);
    }

    match cli.inputs.as_slice() {
        [] => match config.default_folder.as_deref() {
            Some(folder) => discover_stems(folder)
                .with_context(|| format!("Opening remembered folder {}", folder.display())),
            None => bail!("No stems given (see --help)"),
        },
        [folder] if folder.is_dir() => discover_stems(folder)
            .with_context(|| format!("Opening folder {}", folder.display())),
        files => explicit_stems(files),
    }
}

fn explicit_stems(files: &[PathBuf]) -> Result<Vec<StemFile>> {
    files
        .iter()
        .map(|path| {
            if !path.is_file() {
                bail!("Not a file: {}", path.display());
            }
            if !is_stem_file(path) {
                bail!("Not a supported audio file: {}", path.display());
            }
            Ok(StemFile::from_path(path))
        })
        .collect()
}

fn run_pipeline(cli: &CliOptions, config: &mut Config) -> Result<Vec<StemFile>> {
    let out = cli
        .out
        .clone()
        .or_else(|| config.default_folder.clone())
        .unwrap_or_else(fallback_out_dir);
    prepare_output_dir(&out).with_context(|| format!("Preparing {}", out.display()))?;

    let input = match (&cli.fetch, &cli.separate) {
        (Some(url), _) => {
            let downloads = out.join("downloads");
            prepare_output_dir(&downloads)?;
            eprintln!("Downloading {} ...", url);
            YtDlp::default()
                .fetch(url, &downloads)
                .with_context(|| format!("Downloading {}", url))?
        }
        (None, Some(file)) => file.clone(),
        (None, None) => bail!("Nothing to separate"),
    };

    eprintln!("Separating {} (this can take a while) ...", input.display());
    let encoded = separate_to_mp3(
        &Demucs::default(),
        &Ffmpeg::default(),
        &input,
        &out.join("separated"),
        &out,
    )
    .with_context(|| format!("Separating {}", input.display()))?;

    remember_folder(config, &out);
    Ok(encoded.into_iter().map(StemFile::from_path).collect())
}

/// Save `folder` as the default, best effort
fn remember_folder(config: &mut Config, folder: &Path) {
    if config.default_folder.as_deref() == Some(folder) {
        return;
    }
    config.default_folder = Some(folder.to_path_buf());
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "could not save config");
    }
}
