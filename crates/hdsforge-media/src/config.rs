//! Packaging configuration.
//!
//! [`PackagerConfig`] is an immutable value handed to the packager; every
//! field has a default so an empty config file is valid.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Output layout and segmentation settings for one packaging run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagerConfig {
    /// Document root of the serving web server.
    pub docroot: PathBuf,
    /// Directory under `docroot` holding the manifest and bootstrap.
    pub basedir: PathBuf,
    /// Directory under `basedir` holding the fragment files.
    pub fragments_dir: String,
    /// Stream id written into the manifest.
    pub video_id: String,
    /// Manifest file name.
    pub manifest_name: String,
    /// Bootstrap file name.
    pub bootstrap_name: String,
    /// Target fragment length in seconds.
    pub segment_window_secs: f64,
    /// Create missing output directories.
    pub create_dirs: bool,
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            docroot: PathBuf::from("."),
            basedir: PathBuf::from("."),
            fragments_dir: "samples".to_string(),
            video_id: "some_video".to_string(),
            manifest_name: "manifest.f4m".to_string(),
            bootstrap_name: "bootstrapinfo".to_string(),
            segment_window_secs: 10.0,
            create_dirs: true,
        }
    }
}

impl PackagerConfig {
    /// Check that the configuration can produce a valid output set.
    pub fn validate(&self) -> Result<()> {
        if !self.segment_window_secs.is_finite() || self.segment_window_secs <= 0.0 {
            return Err(Error::invalid_config(format!(
                "segment_window_secs must be positive, got {}",
                self.segment_window_secs
            )));
        }
        for (field, value) in [
            ("fragments_dir", &self.fragments_dir),
            ("video_id", &self.video_id),
            ("manifest_name", &self.manifest_name),
            ("bootstrap_name", &self.bootstrap_name),
        ] {
            if value.trim().is_empty() {
                return Err(Error::invalid_config(format!("{field} must not be empty")));
            }
        }
        // Everything below the docroot must stay below it.
        check_relative("basedir", &self.basedir)?;
        check_relative("fragments_dir", Path::new(&self.fragments_dir))?;
        for (field, value) in [
            ("manifest_name", &self.manifest_name),
            ("bootstrap_name", &self.bootstrap_name),
        ] {
            let mut components = Path::new(value).components();
            if !matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            ) {
                return Err(Error::invalid_config(format!(
                    "{field} must be a plain file name, got {value:?}"
                )));
            }
        }
        if self.manifest_name == self.bootstrap_name {
            return Err(Error::invalid_config(
                "manifest_name and bootstrap_name must differ",
            ));
        }
        Ok(())
    }

    /// `docroot/basedir`: location of the manifest and bootstrap.
    pub fn base_path(&self) -> PathBuf {
        self.docroot.join(&self.basedir)
    }

    /// `docroot/basedir/fragments_dir`.
    pub fn fragments_path(&self) -> PathBuf {
        self.base_path().join(&self.fragments_dir)
    }

    pub fn bootstrap_path(&self) -> PathBuf {
        self.base_path().join(&self.bootstrap_name)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.base_path().join(&self.manifest_name)
    }
}

/// Reject absolute paths and `..` components.
fn check_relative(field: &str, path: &Path) -> Result<()> {
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::Prefix(_) | Component::RootDir | Component::ParentDir
        )
    });
    if escapes {
        return Err(Error::invalid_config(format!(
            "{field} must be relative to the docroot without '..', got {}",
            path.display()
        )));
    }
    Ok(())
}
