//! Stem library for stemdeck - decoding, discovery, preferences and the
//! external acquisition/separation/transcoding tools

mod config;
mod discover;
mod loader;
mod pipeline;

pub use config::Config;
pub use discover::{
    discover_stems, find_separated_folder, is_stem_file, DiscoverError, StemFile, StemKind,
    STEM_EXTENSIONS,
};
pub use loader::{LoadError, LoadedStem, TrackLoader};
pub use pipeline::{
    prepare_output_dir, separate_to_mp3, transcode_stems, AcquisitionService, Demucs, Ffmpeg,
    OutputFolder, PipelineError, SeparationService, TranscodingService, YtDlp,
};
