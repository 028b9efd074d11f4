//! Confidence score and its derived label

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scores at or above this are labelled [`ConfidenceLevel::Medium`]
pub const MEDIUM_THRESHOLD: f64 = 0.5;

/// Scores at or above this are labelled [`ConfidenceLevel::High`]
pub const HIGH_THRESHOLD: f64 = 0.8;

/// Coarse presentation label for a confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// score < 0.5
    Low,
    /// 0.5 <= score < 0.8
    Medium,
    /// score >= 0.8
    High,
}

impl ConfidenceLevel {
    /// Get the label as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric certainty of a relationship judgment, always within [0, 1]
///
/// The score is the unit of computation. The label is derived on demand and
/// never stored next to it, so the two cannot disagree.
///
/// # Examples
///
/// ```
/// use trellis_domain::{Confidence, ConfidenceLevel};
///
/// let c = Confidence::new(0.88);
/// assert_eq!(c.level(), ConfidenceLevel::High);
///
/// // Out-of-range derivations are clamped to the nearest bound
/// assert_eq!(Confidence::new(1.4).score(), 1.0);
/// assert_eq!(Confidence::new(-0.2).score(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Lowest possible confidence
    pub const MIN: Confidence = Confidence(0.0);

    /// Highest possible confidence
    pub const MAX: Confidence = Confidence(1.0);

    /// Create a confidence, clamping the score into [0, 1]
    ///
    /// NaN carries no evidence and maps to 0.
    pub fn new(score: f64) -> Self {
        if score.is_nan() {
            return Self::MIN;
        }
        Self(score.clamp(0.0, 1.0))
    }

    /// The numeric score
    pub fn score(&self) -> f64 {
        self.0
    }

    /// The coarse label derived from the score
    pub fn level(&self) -> ConfidenceLevel {
        if self.0 >= HIGH_THRESHOLD {
            ConfidenceLevel::High
        } else if self.0 >= MEDIUM_THRESHOLD {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    /// The weaker of two confidences
    pub fn min(self, other: Confidence) -> Confidence {
        if other.0 < self.0 {
            other
        } else {
            self
        }
    }

    /// The stronger of two confidences
    pub fn max(self, other: Confidence) -> Confidence {
        if other.0 > self.0 {
            other
        } else {
            self
        }
    }
}

impl From<f64> for Confidence {
    fn from(score: f64) -> Self {
        Self::new(score)
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} ({})", self.0, self.level())
    }
}
