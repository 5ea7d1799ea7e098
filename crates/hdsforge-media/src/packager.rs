//! End-to-end packaging run.
//!
//! Output is produced in a fixed order: every fragment file, then the
//! bootstrap, then the manifest. The bootstrap can only be built once the
//! last fragment is closed, and the manifest references the bootstrap.
//!
//! A manifest and bootstrap left by an earlier run are removed before the
//! first fragment is flushed, so a run that fails at any step leaves no
//! manifest behind. Fragment files numbered past the new fragment count are
//! left in place; no bootstrap references them.

use crate::bootstrap::BootstrapIndex;
use crate::config::PackagerConfig;
use crate::fragment::{FileFragmentWriter, Fragment, FragmentSink, Fragmenter, MemorySink};
use crate::manifest::ManifestWriter;
use crate::source::SourceBuffer;
use crate::timeline::{ParseOutcome, Timeline};
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Summary of a finished packaging run.
#[derive(Debug, Clone)]
pub struct PackageReport {
    /// Fragments in timestamp order.
    pub fragments: Vec<Fragment>,
    /// The bootstrap index built from `fragments`.
    pub bootstrap: BootstrapIndex,
    pub bootstrap_path: PathBuf,
    pub manifest_path: PathBuf,
    /// Presentation length in seconds.
    pub duration: f64,
    /// Whether the bootstrap and manifest were written to disk.
    pub written: bool,
}

impl PackageReport {
    /// Total size of all fragment tag streams, excluding `mdat` headers.
    pub fn fragment_bytes(&self) -> u64 {
        self.fragments.iter().map(|f| f.data_size).sum()
    }
}

/// Drives Fragmenter, bootstrap and manifest generation for one config.
#[derive(Debug, Clone)]
pub struct Packager {
    config: PackagerConfig,
    fragmenter: Fragmenter,
}

impl Packager {
    /// Validate `config` and create a packager for it.
    pub fn new(config: PackagerConfig) -> Result<Self> {
        config.validate()?;
        let fragmenter = Fragmenter::new(config.segment_window_secs)?;
        Ok(Self { config, fragmenter })
    }

    pub fn config(&self) -> &PackagerConfig {
        &self.config
    }

    /// Package the result of an upstream parse.
    ///
    /// A failed parse is surfaced as [`Error::Upstream`] before anything is
    /// written.
    pub fn run(&self, outcome: ParseOutcome, source: &SourceBuffer) -> Result<PackageReport> {
        let timeline = outcome.into_timeline()?;
        self.package(&timeline, source)
    }

    /// Write fragments, bootstrap and manifest for `timeline`.
    pub fn package(&self, timeline: &Timeline, source: &SourceBuffer) -> Result<PackageReport> {
        let fragments_dir = self.config.fragments_path();
        if self.config.create_dirs {
            create_dir(&self.config.base_path())?;
            create_dir(&fragments_dir)?;
        }
        remove_stale(&self.config.manifest_path())?;
        remove_stale(&self.config.bootstrap_path())?;

        let mut writer = FileFragmentWriter::new(&fragments_dir);
        self.finish(timeline, source, &mut writer, true)
    }

    /// Run the whole pipeline without touching the filesystem.
    ///
    /// Fragments are collected in the returned [`MemorySink`]; the bootstrap
    /// is built but not written.
    pub fn dry_run(
        &self,
        timeline: &Timeline,
        source: &SourceBuffer,
    ) -> Result<(PackageReport, MemorySink)> {
        let mut sink = MemorySink::new();
        let report = self.finish(timeline, source, &mut sink, false)?;
        Ok((report, sink))
    }

    /// Manifest generator configured for this layout.
    pub fn manifest_writer(&self) -> ManifestWriter {
        ManifestWriter::new(
            self.config.video_id.clone(),
            self.config.bootstrap_name.clone(),
            self.config.fragments_dir.clone(),
        )
    }

    fn finish<S: FragmentSink>(
        &self,
        timeline: &Timeline,
        source: &SourceBuffer,
        sink: &mut S,
        write: bool,
    ) -> Result<PackageReport> {
        tracing::info!(
            samples = timeline.sample_count(),
            duration = timeline.duration,
            window = self.fragmenter.window(),
            video = timeline.capabilities.has_video(),
            audio = timeline.capabilities.has_audio(),
            "Packaging timeline"
        );

        let fragments = self.fragmenter.run(timeline, source, sink)?;
        if fragments.is_empty() {
            tracing::warn!("Timeline produced no fragments, bootstrap will be empty");
        }

        let bootstrap = BootstrapIndex::from_fragments(&fragments, timeline.duration)?;
        let bootstrap_path = self.config.bootstrap_path();
        let manifest_path = self.config.manifest_path();

        if write {
            bootstrap.write_to(&bootstrap_path)?;
            self.manifest_writer()
                .write_to(&manifest_path, timeline.duration)?;
        }

        Ok(PackageReport {
            fragments,
            bootstrap,
            bootstrap_path,
            manifest_path,
            duration: timeline.duration,
            written: write,
        })
    }
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

/// Delete an output file from a previous run, if there is one.
fn remove_stale(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed previous output");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}
