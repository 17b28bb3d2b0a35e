//! Reshape play events into song and album rows

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::TransformError;
use crate::models::{AlbumRecord, PlayEvent, SongRecord};
use crate::utils::dates::{parse_played_at, today_utc};

/// Output of the transform stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transformed {
    pub songs: Vec<SongRecord>,
    pub albums: Vec<AlbumRecord>,
}

/// Map every event to a song and an album
///
/// Albums get today's date as `release_date`; the play history carries no
/// release date.
pub fn transform(events: &[PlayEvent]) -> Result<Transformed, TransformError> {
    transform_on(events, today_utc())
}

pub fn transform_on(events: &[PlayEvent], today: NaiveDate) -> Result<Transformed, TransformError> {
    let mut out = Transformed {
        songs: Vec::with_capacity(events.len()),
        albums: Vec::with_capacity(events.len()),
    };

    for (index, event) in events.iter().enumerate() {
        let (song, album) = match transform_event(index, event, today) {
            Ok(records) => records,
            Err(e) => {
                error!("Error transforming data: {}", e);
                return Err(e);
            }
        };
        out.songs.push(song);
        out.albums.push(album);
    }

    info!(
        "Transformed {} songs and {} albums",
        out.songs.len(),
        out.albums.len()
    );
    Ok(out)
}

fn transform_event(
    index: usize,
    event: &PlayEvent,
    today: NaiveDate,
) -> Result<(SongRecord, AlbumRecord), TransformError> {
    let name = required(index, "track_name", &event.track_name)?;
    let artist = required(index, "artist_name", &event.artist_name)?;
    let album = required(index, "album_name", &event.album_name)?;
    let raw_played_at = required(index, "played_at", &event.played_at)?;

    let played_at =
        parse_played_at(raw_played_at).ok_or_else(|| TransformError::InvalidTimestamp {
            index,
            value: raw_played_at.to_string(),
        })?;

    Ok((
        SongRecord::new(name, artist, album, played_at),
        AlbumRecord::new(album, artist, today),
    ))
}

fn required<'e>(
    index: usize,
    field: &'static str,
    value: &'e str,
) -> Result<&'e str, TransformError> {
    if value.trim().is_empty() {
        Err(TransformError::MissingField { index, field })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn event(name: &str, artist: &str, album: &str, played_at: &str) -> PlayEvent {
        PlayEvent::new(name, artist, album, "", played_at)
    }

    #[test]
    fn test_composite_ids() {
        let events = vec![event("Song A", "Artist X", "Album Y", "2024-06-01T10:00:00")];

        let out = transform_on(&events, june_first()).unwrap();

        assert_eq!(out.songs.len(), 1);
        assert_eq!(out.albums.len(), 1);
        assert_eq!(out.songs[0].id, "Song A_Artist X");
        assert_eq!(out.albums[0].id, "Album Y_Artist X");
        assert_eq!(out.songs[0].album, "Album Y");
        assert_eq!(
            out.songs[0].played_at,
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(out.albums[0].release_date, june_first());
    }

    #[test]
    fn test_same_name_and_artist_same_id() {
        let events = vec![
            event("Song A", "Artist X", "Album Y", "2024-06-01T10:00:00Z"),
            event("Song A", "Artist X", "Album Y", "2024-06-01T18:30:00Z"),
        ];

        let out = transform_on(&events, june_first()).unwrap();

        assert_eq!(out.songs[0].id, out.songs[1].id);
        assert_eq!(out.albums[0].id, out.albums[1].id);
        assert_ne!(out.songs[0].played_at, out.songs[1].played_at);
    }

    #[test]
    fn test_empty_input() {
        let out = transform_on(&[], june_first()).unwrap();
        assert_eq!(out, Transformed::default());
    }

    #[test]
    fn test_missing_artist() {
        let events = vec![
            event("Song A", "Artist X", "Album Y", "2024-06-01T10:00:00Z"),
            event("Song B", "  ", "Album Y", "2024-06-01T11:00:00Z"),
        ];

        let err = transform_on(&events, june_first()).unwrap_err();
        assert_eq!(
            err,
            TransformError::MissingField {
                index: 1,
                field: "artist_name"
            }
        );
    }

    #[test]
    fn test_bad_timestamp() {
        let events = vec![event("Song A", "Artist X", "Album Y", "June 1st")];

        let err = transform_on(&events, june_first()).unwrap_err();
        assert!(matches!(err, TransformError::InvalidTimestamp { index: 0, .. }));
    }
}
