//! Songs returned by the proximity service, and the immutable set they form.

use glam::DVec2;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier of a song. The service emits either numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<u64> for CandidateId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for CandidateId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Str(String),
        }
        Ok(match Raw::deserialize(d)? {
            Raw::Int(n) => Self(n.to_string()),
            Raw::Float(n) => Self(n.to_string()),
            Raw::Str(s) => Self(s),
        })
    }
}

/// Display attributes carried with each candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SongAttributes {
    pub name: String,
    #[serde(deserialize_with = "string_or_list")]
    pub artists: String,
    pub album: Option<String>,
    pub year: Option<i32>,
    pub cover_url: Option<String>,
    pub energy: Option<f64>,
    pub danceability: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
    pub loudness: Option<f64>,
}

/// A hoverable song near the pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub data: SongAttributes,
}

impl Candidate {
    #[inline]
    pub fn world(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.data.cover_url.as_deref().filter(|s| !s.is_empty())
    }
}

/// Shared, immutable candidate list. Replaced wholesale, never edited.
pub type CandidateSet = Arc<[Candidate]>;

pub fn empty_set() -> CandidateSet {
    Arc::from(Vec::new())
}

/// Either a bare array of candidates or `{ "matches": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum QueryPayload {
    List(Vec<Candidate>),
    Matches { matches: Vec<Candidate> },
}

impl QueryPayload {
    pub fn into_candidates(self) -> Vec<Candidate> {
        match self {
            Self::List(v) | Self::Matches { matches: v } => v,
        }
    }
}

/// Parses a proximity-service response body.
pub fn parse_candidates(body: &[u8]) -> Result<Vec<Candidate>, serde_json::Error> {
    // Candidates with non-finite coordinates can never be hovered; drop them early.
    let mut candidates = serde_json::from_slice::<QueryPayload>(body)?.into_candidates();
    candidates.retain(|c| c.x.is_finite() && c.y.is_finite());
    Ok(candidates)
}

fn string_or_list<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }
    Ok(match Raw::deserialize(d)? {
        Raw::One(s) => s,
        Raw::Many(v) => v.join(", "),
        Raw::Nothing(()) => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_array_with_numeric_ids() {
        let body = br#"[
            {"id": 7, "x": 0.1, "y": -0.2, "data": {"name": "Song", "artists": ["A", "B"],
             "cover_url": "https://img/7.jpg", "energy": 0.5, "year": 1999}}
        ]"#;
        let c = parse_candidates(body).unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].id, CandidateId::from(7));
        assert_eq!(c[0].data.artists, "A, B");
        assert_eq!(c[0].cover_url(), Some("https://img/7.jpg"));
        assert_eq!(c[0].data.year, Some(1999));
    }

    #[test]
    fn parses_matches_envelope_and_missing_data() {
        let body = br#"{"matches": [{"id": "abc", "x": 1, "y": 2}]}"#;
        let c = parse_candidates(body).unwrap();
        assert_eq!(c[0].id.0, "abc");
        assert_eq!(c[0].world(), DVec2::new(1.0, 2.0));
        assert_eq!(c[0].cover_url(), None);
    }

    #[test]
    fn empty_results_are_valid() {
        assert!(parse_candidates(b"[]").unwrap().is_empty());
        assert!(parse_candidates(br#"{"matches": []}"#).unwrap().is_empty());
    }

    #[test]
    fn null_artists_becomes_empty() {
        let body = br#"[{"id": 1, "x": 0, "y": 0, "data": {"artists": null}}]"#;
        assert_eq!(parse_candidates(body).unwrap()[0].data.artists, "");
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_candidates(b"{\"detail\": \"oops\"}").is_err());
    }
}
