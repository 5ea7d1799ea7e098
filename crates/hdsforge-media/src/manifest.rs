//! F4M manifest generation.

use crate::{Error, Result};
use std::borrow::Cow;
use std::path::Path;

/// XML namespace of F4M 1.0 manifests.
pub const F4M_NAMESPACE: &str = "http://ns.adobe.com/f4m/1.0";

/// Id linking the `media` element to its `bootstrapInfo`.
const BOOTSTRAP_INFO_ID: &str = "bt";

/// F4M manifest generator for a recorded presentation.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    /// Stream id, used for both `<id>` and `media@streamId`.
    pub video_id: String,
    /// Bootstrap file URL, relative to the manifest.
    pub bootstrap_url: String,
    /// Fragment directory, relative to the manifest.
    pub fragments_dir: String,
}

impl ManifestWriter {
    /// Create a new manifest generator.
    pub fn new(
        video_id: impl Into<String>,
        bootstrap_url: impl Into<String>,
        fragments_dir: impl Into<String>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            bootstrap_url: bootstrap_url.into(),
            fragments_dir: fragments_dir.into(),
        }
    }

    /// Render the manifest for a presentation of `duration_secs`.
    pub fn render(&self, duration_secs: f64) -> String {
        let id = escape_xml(&self.video_id);
        let bootstrap = escape_xml(&self.bootstrap_url);
        let media_url = escape_xml(self.fragments_dir.trim_end_matches('/'));

        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <manifest xmlns=\"{F4M_NAMESPACE}\">\n\
             <id>{id}</id>\n\
             <streamType>recorded</streamType>\n\
             <duration>{duration_secs}</duration>\n\
             <bootstrapInfo profile=\"named\" url=\"{bootstrap}\" id=\"{BOOTSTRAP_INFO_ID}\" />\n\
             <media streamId=\"{id}\" url=\"{media_url}/\" bootstrapinfoId=\"{BOOTSTRAP_INFO_ID}\" />\n\
             </manifest>\n"
        )
    }

    /// Write the manifest to `path`, replacing any existing file.
    pub fn write_to(&self, path: &Path, duration_secs: f64) -> Result<()> {
        let xml = self.render(duration_secs);
        std::fs::write(path, xml.as_bytes()).map_err(|e| Error::io(path, e))?;
        tracing::info!(path = %path.display(), duration = duration_secs, "Wrote manifest");
        Ok(())
    }
}

/// Escape the five XML special characters.
fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_manifest() {
        let writer = ManifestWriter::new("some_video", "bootstrapinfo", "samples");
        let xml = writer.render(15.5);

        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<manifest xmlns=\"http://ns.adobe.com/f4m/1.0\">\n\
<id>some_video</id>\n\
<streamType>recorded</streamType>\n\
<duration>15.5</duration>\n\
<bootstrapInfo profile=\"named\" url=\"bootstrapinfo\" id=\"bt\" />\n\
<media streamId=\"some_video\" url=\"samples/\" bootstrapinfoId=\"bt\" />\n\
</manifest>\n";
        assert_eq!(xml, expected);
    }

    #[test]
    fn test_whole_second_duration() {
        let writer = ManifestWriter::new("v", "b", "f");
        assert!(writer.render(120.0).contains("<duration>120</duration>"));
    }

    #[test]
    fn test_fragments_dir_single_trailing_slash() {
        let writer = ManifestWriter::new("v", "b", "frags/");
        assert!(writer.render(1.0).contains("url=\"frags/\""));
    }

    #[test]
    fn test_escapes_configured_strings() {
        let writer = ManifestWriter::new("a&b<c>", "boot\"strap", "it's");
        let xml = writer.render(1.0);
        assert!(xml.contains("<id>a&amp;b&lt;c&gt;</id>"));
        assert!(xml.contains("url=\"boot&quot;strap\""));
        assert!(xml.contains("url=\"it&apos;s/\""));
    }

    #[test]
    fn test_escape_borrows_plain_strings() {
        assert!(matches!(escape_xml("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.f4m");
        let writer = ManifestWriter::new("clip", "bootstrapinfo", "samples");

        writer.write_to(&path, 2.0).unwrap();
        let xml = std::fs::read_to_string(&path).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(F4M_NAMESPACE));
    }
}
