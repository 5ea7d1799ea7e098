use clap::{Args, Parser, Subcommand};
use hdsforge_media::PackagerConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hdsforge")]
#[command(author, version, about = "HTTP Dynamic Streaming packager")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Package a parsed source into fragments, bootstrap and manifest
    Package {
        /// Timeline JSON produced by the demuxer
        #[arg(long, required = true)]
        timeline: PathBuf,

        /// Source media file the timeline refers to
        #[arg(long, required = true)]
        src: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Run everything in memory and write nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Show what a timeline contains
    Inspect {
        /// Timeline JSON produced by the demuxer
        #[arg(long, required = true)]
        timeline: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the run tables of a bootstrap file
    DumpBootstrap {
        /// Bootstrap file to read
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

/// Per-run overrides of the configured output layout.
#[derive(Args, Debug, Default, Clone)]
pub struct LayoutArgs {
    /// Document root of the web server
    #[arg(long)]
    pub docroot: Option<PathBuf>,

    /// Directory under the docroot for manifest and bootstrap
    #[arg(long)]
    pub basedir: Option<PathBuf>,

    /// Directory under the basedir for fragment files
    #[arg(long)]
    pub fragments: Option<String>,

    /// Stream id written into the manifest
    #[arg(long)]
    pub video_id: Option<String>,

    /// Manifest file name
    #[arg(long)]
    pub manifest: Option<String>,

    /// Bootstrap file name
    #[arg(long)]
    pub bootstrap: Option<String>,

    /// Target fragment length in seconds
    #[arg(long)]
    pub window: Option<f64>,
}

impl LayoutArgs {
    /// Overwrite every field of `config` given on the command line.
    pub fn apply(self, config: &mut PackagerConfig) {
        if let Some(docroot) = self.docroot {
            config.docroot = docroot;
        }
        if let Some(basedir) = self.basedir {
            config.basedir = basedir;
        }
        if let Some(fragments) = self.fragments {
            config.fragments_dir = fragments;
        }
        if let Some(video_id) = self.video_id {
            config.video_id = video_id;
        }
        if let Some(manifest) = self.manifest {
            config.manifest_name = manifest;
        }
        if let Some(bootstrap) = self.bootstrap {
            config.bootstrap_name = bootstrap;
        }
        if let Some(window) = self.window {
            config.segment_window_secs = window;
        }
    }
}
