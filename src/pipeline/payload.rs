//! Typed payloads handed between stages run as separate commands

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::etl::Transformed;
use crate::models::{composite_id, PlayEvent};

/// Write a stage output as pretty JSON
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).context("Failed to serialize payload")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write payload {}", path.display()))?;
    Ok(())
}

/// Read a stage input written by [`write_json`]
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read payload {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Payload {} has the wrong shape", path.display()))
}

pub fn read_play_events(path: &Path) -> Result<Vec<PlayEvent>> {
    read_json(path)
}

/// Read a transform payload and check every id matches its name and artist
pub fn read_transformed(path: &Path) -> Result<Transformed> {
    let transformed: Transformed = read_json(path)?;
    check_ids(&transformed)?;
    Ok(transformed)
}

fn check_ids(transformed: &Transformed) -> Result<()> {
    for song in &transformed.songs {
        if song.id != composite_id(&song.name, &song.artist) {
            bail!("Song id `{}` does not match its name and artist", song.id);
        }
    }
    for album in &transformed.albums {
        if album.id != composite_id(&album.name, &album.artist) {
            bail!("Album id `{}` does not match its name and artist", album.id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::transform_on;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample() -> Transformed {
        let events = vec![PlayEvent::new(
            "Song A",
            "Artist X",
            "Album Y",
            "https://open.spotify.com/track/1",
            "2024-06-01T10:00:00.000Z",
        )];
        transform_on(&events, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()).unwrap()
    }

    #[test]
    fn test_transformed_payload_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("transformed.json");

        let original = sample();
        write_json(&path, &original).unwrap();
        assert_eq!(read_transformed(&path).unwrap(), original);
    }

    #[test]
    fn test_tampered_id_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("transformed.json");

        let mut payload = sample();
        payload.songs[0].id = "something else".to_string();
        write_json(&path, &payload).unwrap();

        let err = read_transformed(&path).unwrap_err();
        assert!(err.to_string().contains("something else"));
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plays.json");
        std::fs::write(&path, r#"[{"name": "Song A"}]"#).unwrap();

        assert!(read_play_events(&path).is_err());
    }
}
