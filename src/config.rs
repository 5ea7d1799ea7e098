//! Config file loading.

use anyhow::{Context, Result};
use hdsforge_media::PackagerConfig;
use std::path::Path;

/// Locations searched when no config file is given explicitly.
const DEFAULT_PATHS: [&str; 2] = ["./hdsforge.toml", "~/.config/hdsforge/config.toml"];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<PackagerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: PackagerConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<PackagerConfig> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(PackagerConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hdsforge.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_full_config() {
        let (_dir, path) = write_config(
            r#"
docroot = "/var/www"
basedir = "vod/movie"
fragments_dir = "frags"
video_id = "movie"
manifest_name = "movie.f4m"
bootstrap_name = "movie.bootstrap"
segment_window_secs = 6.0
create_dirs = false
"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.docroot, PathBuf::from("/var/www"));
        assert_eq!(config.fragments_dir, "frags");
        assert_eq!(config.segment_window_secs, 6.0);
        assert!(!config.create_dirs);
        assert_eq!(
            config.manifest_path(),
            PathBuf::from("/var/www/vod/movie/movie.f4m")
        );
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let (_dir, path) = write_config("video_id = \"clip\"\n");

        let config = load_config(&path).unwrap();
        assert_eq!(config.video_id, "clip");
        assert_eq!(config.fragments_dir, "samples");
        assert_eq!(config.bootstrap_name, "bootstrapinfo");
        assert_eq!(config.segment_window_secs, 10.0);
    }

    #[test]
    fn test_invalid_window_rejected() {
        let (_dir, path) = write_config("segment_window_secs = -1.0\n");

        let err = load_config(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("segment_window_secs"));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let (_dir, path) = write_config("video_id = \n");

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = load_config_or_default(Some(Path::new("/nonexistent/hdsforge.toml")));
        assert!(result.is_err());
    }
}
