//! Risk register entries.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::{MemberId, ProjectId, RiskId, UserId};
use crate::revision::Revision;
use crate::task::ParseEnumError;

/// Three-step scale used for both probability and impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Weight 1.
    Low,
    /// Weight 2.
    Medium,
    /// Weight 3.
    High,
}

impl Level {
    /// All levels from lowest to highest.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Numeric weight of the level (1..=3).
    #[must_use]
    pub const fn weight(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Zero-based index into a 3×3 matrix.
    #[must_use]
    pub const fn index(self) -> usize {
        self.weight() as usize - 1
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl FromStr for Level {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "1" => Ok(Self::Low),
            "medium" | "2" => Ok(Self::Medium),
            "high" | "3" => Ok(Self::High),
            _ => Err(ParseEnumError {
                kind: "level",
                input: s.to_string(),
            }),
        }
    }
}

/// Lifecycle of a risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskStatus {
    /// Identified, no response yet.
    Open,
    /// A mitigation is underway.
    Mitigating,
    /// No longer relevant.
    Closed,
}

impl RiskStatus {
    /// Open and mitigating risks still count against the project.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Closed)
    }
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Mitigating => write!(f, "mitigating"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for RiskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "mitigating" => Ok(Self::Mitigating),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseEnumError {
                kind: "risk status",
                input: s.to_string(),
            }),
        }
    }
}

/// Severity bucket derived from a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Score 1..=2.
    Low,
    /// Score 3..=5.
    Medium,
    /// Score 6..=9.
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// An entry in a project's risk register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    /// Unique risk identifier.
    pub id: RiskId,
    /// Project this risk belongs to.
    pub project_id: ProjectId,
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// How likely the risk is to materialise.
    pub probability: Level,
    /// How bad it would be.
    pub impact: Level,
    /// Current lifecycle state.
    pub status: RiskStatus,
    /// Member responsible for tracking the risk.
    pub owner: Option<MemberId>,
    /// Planned response.
    pub mitigation: String,
    /// Milliseconds since epoch when the risk was recorded.
    pub created_at: u64,
    /// Last write applied to this risk.
    pub revision: Revision,
}

impl Risk {
    /// Records a new open risk.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        title: impl Into<String>,
        probability: Level,
        impact: Level,
        author: &UserId,
    ) -> Self {
        let revision = Revision::now(author);
        Self {
            id: RiskId::new(),
            project_id,
            title: title.into(),
            description: String::new(),
            probability,
            impact,
            status: RiskStatus::Open,
            owner: None,
            mitigation: String::new(),
            created_at: revision.at,
            revision,
        }
    }

    /// Probability weight times impact weight (1..=9).
    #[must_use]
    pub const fn score(&self) -> u8 {
        self.probability.weight() * self.impact.weight()
    }

    /// Severity bucket for [`Risk::score`].
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self.score() {
            6.. => Severity::High,
            3..=5 => Severity::Medium,
            _ => Severity::Low,
        }
    }
}
