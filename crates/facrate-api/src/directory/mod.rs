use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub mod tui;

/// Opaque faculty identifier.
///
/// Kept as the raw JSON value the store returned (integer or uuid string) so
/// it round-trips unchanged into the `faculty_id` column of a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacultyId(serde_json::Value);

impl FacultyId {
    pub fn new(value: impl Into<serde_json::Value>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for FacultyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

/// One row of the `faculty` table. Owned by the store; never mutated here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Faculty {
    pub id: FacultyId,
    #[serde(default, deserialize_with = "nullable_text")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub cabin: String,
    #[serde(default)]
    pub mobile: Option<String>,
    /// Server-computed aggregate, absent until the first review lands
    #[serde(default)]
    pub teaching_rating: Option<f64>,
}

impl Faculty {
    /// Mobile number, or "N/A" when the column is null or blank
    pub fn mobile_display(&self) -> &str {
        self.mobile
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or("N/A")
    }

    /// Rating badge text. Zero is never a real average of 1-5 scores, so it
    /// reads as "New" just like a missing rating.
    pub fn rating_display(&self) -> String {
        match self.teaching_rating {
            Some(r) if r != 0.0 => format_rating(r),
            _ => "New".to_string(),
        }
    }
}

fn format_rating(r: f64) -> String {
    if r.fract() == 0.0 {
        format!("{}", r as i64)
    } else {
        let s = format!("{:.2}", r);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn nullable_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single rating value, always within `[Score::MIN, Score::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Clamp any integer into range
    pub fn new(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn increment(self) -> Self {
        Self::new(self.0 as i64 + 1)
    }

    pub fn decrement(self) -> Self {
        Self::new(self.0 as i64 - 1)
    }
}

impl Default for Score {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

/// The three axes a review scores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingAxis {
    Teaching,
    Grading,
    Behavior,
}

impl RatingAxis {
    pub const ALL: [RatingAxis; 3] = [
        RatingAxis::Teaching,
        RatingAxis::Grading,
        RatingAxis::Behavior,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RatingAxis::Teaching => "Teaching",
            RatingAxis::Grading => "Grading",
            RatingAxis::Behavior => "Behavior",
        }
    }

    pub fn next(self) -> Self {
        match self {
            RatingAxis::Teaching => RatingAxis::Grading,
            RatingAxis::Grading => RatingAxis::Behavior,
            RatingAxis::Behavior => RatingAxis::Teaching,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            RatingAxis::Teaching => RatingAxis::Behavior,
            RatingAxis::Grading => RatingAxis::Teaching,
            RatingAxis::Behavior => RatingAxis::Grading,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RatingScores {
    pub teaching: Score,
    pub grading: Score,
    pub behavior: Score,
}

impl RatingScores {
    pub fn get(&self, axis: RatingAxis) -> Score {
        match axis {
            RatingAxis::Teaching => self.teaching,
            RatingAxis::Grading => self.grading,
            RatingAxis::Behavior => self.behavior,
        }
    }

    pub fn set(&mut self, axis: RatingAxis, score: Score) {
        match axis {
            RatingAxis::Teaching => self.teaching = score,
            RatingAxis::Grading => self.grading = score,
            RatingAxis::Behavior => self.behavior = score,
        }
    }
}

/// Body of one insert into the `reviews` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSubmission {
    pub faculty_id: FacultyId,
    pub teaching: Score,
    pub grading: Score,
    pub behavior: Score,
}

impl ReviewSubmission {
    pub fn new(faculty_id: FacultyId, scores: RatingScores) -> Self {
        Self {
            faculty_id,
            teaching: scores.teaching,
            grading: scores.grading,
            behavior: scores.behavior,
        }
    }
}
