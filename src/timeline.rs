//! Timeline file loading.
//!
//! The demuxer hands its result over as a JSON document tagged with
//! `"status": "ready"` or `"status": "failed"`.

use anyhow::{Context, Result};
use hdsforge_media::ParseOutcome;
use std::path::Path;

/// Read a parse outcome from a timeline JSON file.
pub fn load_timeline(path: &Path) -> Result<ParseOutcome> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read timeline file: {:?}", path))?;

    let outcome: ParseOutcome = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse timeline file: {:?}", path))?;

    if let ParseOutcome::Ready(timeline) = &outcome {
        tracing::debug!(
            samples = timeline.sample_count(),
            duration = timeline.duration,
            "Loaded timeline {:?}",
            path
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdsforge_media::TrackKind;

    #[test]
    fn test_load_ready_timeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.json");
        std::fs::write(
            &path,
            r#"{
                "status": "ready",
                "duration": 4.0,
                "capabilities": { "audio": { "timescale": 44100, "extradata": "1210" } },
                "samples": [ { "timestamp": 0.0, "track": "audio", "offset": 0, "size": 10 } ]
            }"#,
        )
        .unwrap();

        let timeline = load_timeline(&path).unwrap().into_timeline().unwrap();
        assert_eq!(timeline.sample_count(), 1);
        assert_eq!(timeline.samples[0].track, TrackKind::Audio);
        assert!(timeline.capabilities.has_audio());
        assert!(!timeline.capabilities.has_video());
    }

    #[test]
    fn test_load_failed_timeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.json");
        std::fs::write(&path, r#"{ "status": "failed", "reason": "truncated file" }"#).unwrap();

        let outcome = load_timeline(&path).unwrap();
        assert_eq!(
            outcome,
            ParseOutcome::Failed {
                reason: "truncated file".into()
            }
        );
    }

    #[test]
    fn test_unknown_status_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.json");
        std::fs::write(&path, r#"{ "status": "pending" }"#).unwrap();

        let err = load_timeline(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse timeline file"));
    }
}
