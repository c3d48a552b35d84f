//! Command-line options

use anyhow::{bail, Result};
use std::path::PathBuf;

const USAGE: &str = "\
stemdeck - terminal stem mixer

Usage: stemdeck [OPTIONS] [STEMS... | FOLDER]

Options:
  --fetch URL        Download a track with yt-dlp, then separate it
  --separate FILE    Separate a local track into stems with demucs
  --out DIR          Folder for separated stems (remembered for next time)
  --theme NAME       green, amber or cyber
  -h, --help         Print this help message

With no stems or folder, the remembered stem folder is opened.
Logs go to the stemdeck data folder; STEMDECK_LOG sets the filter.";

/// Parsed command line
#[derive(Debug, Default, PartialEq)]
pub struct CliOptions {
    pub fetch: Option<String>,
    pub separate: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub theme: Option<String>,
    /// Stem files, or a single folder of stems
    pub inputs: Vec<PathBuf>,
}

impl CliOptions {
    pub fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        match Self::parse_from(&args)? {
            Some(options) => Ok(options),
            None => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
        }
    }

    /// `None` when help was requested
    fn parse_from(args: &[String]) -> Result<Option<Self>> {
        let mut options = Self::default();
        let mut i = 0;

        while i < args.len() {
            let arg = args[i].as_str();
            match arg {
                "--help" | "-h" => return Ok(None),
                "--fetch" | "--separate" | "--out" | "--theme" => {
                    i += 1;
                    let Some(value) = args.get(i) else {
                        bail!("{} requires a value (see --help)", arg);
                    };
                    match arg {
                        "--fetch" => options.fetch = Some(value.clone()),
                        "--separate" => options.separate = Some(PathBuf::from(value)),
                        "--out" => options.out = Some(PathBuf::from(value)),
                        _ => options.theme = Some(value.clone()),
                    }
                }
                other if other.starts_with('-') => {
                    bail!("Unknown option: {} (see --help)", other);
                }
                path => options.inputs.push(PathBuf::from(path)),
            }
            i += 1;
        }

        if options.fetch.is_some() && options.separate.is_some() {
            bail!("--fetch and --separate cannot be combined");
        }
        Ok(Some(options))
    }

    /// Whether stems come from the external tools
    pub fn runs_pipeline(&self) -> bool {
        self.fetch.is_some() || self.separate.is_some()
    }
}
