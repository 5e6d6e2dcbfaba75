use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobPostingId(pub u64);

impl fmt::Display for JobPostingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentType {
    #[serde(rename = "full-time")]
    FullTime,
    #[serde(rename = "part-time")]
    PartTime,
    #[serde(rename = "internship")]
    Internship,
    #[serde(rename = "freelance")]
    Freelance,
}

impl EmploymentType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::FullTime => "full-time",
            Self::PartTime => "part-time",
            Self::Internship => "internship",
            Self::Freelance => "freelance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full-time" | "fulltime" | "full_time" => Some(Self::FullTime),
            "part-time" | "parttime" | "part_time" => Some(Self::PartTime),
            "internship" => Some(Self::Internship),
            "freelance" => Some(Self::Freelance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkArrangement {
    Onsite,
    Remote,
    Hybrid,
}

impl WorkArrangement {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Onsite => "onsite",
            Self::Remote => "remote",
            Self::Hybrid => "hybrid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "onsite" | "on-site" => Some(Self::Onsite),
            "remote" => Some(Self::Remote),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobDescription {
    pub overview: String,
    pub responsibility: String,
    pub requirement: String,
    pub qualification: String,
}

/// A company's job opening as stored by the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobPostingId,
    pub owner: AccountId,
    pub title: String,
    pub categories: Vec<String>,
    pub location: String,
    pub employment_type: EmploymentType,
    pub arrangement: WorkArrangement,
    pub salary: SalaryRange,
    pub posted_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub published: bool,
    pub skills: Vec<String>,
    pub description: JobDescription,
}

/// Visibility state derived from the published flag and the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingStatus {
    Draft,
    Published,
    Expired,
}

impl PostingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Expired => "expired",
        }
    }
}

impl JobPosting {
    /// Expired once the deadline's calendar date is behind `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.deadline.date_naive() < today
    }

    pub fn status(&self, today: NaiveDate) -> PostingStatus {
        if !self.published {
            PostingStatus::Draft
        } else if self.is_expired(today) {
            PostingStatus::Expired
        } else {
            PostingStatus::Published
        }
    }

    /// Open postings accept applications and appear in search.
    pub fn is_open(&self, today: NaiveDate) -> bool {
        self.status(today) == PostingStatus::Published
    }
}

/// Posting contents before the repository assigns an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJobPosting {
    pub owner: AccountId,
    pub title: String,
    pub categories: Vec<String>,
    pub location: String,
    pub employment_type: EmploymentType,
    pub arrangement: WorkArrangement,
    pub salary: SalaryRange,
    pub posted_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub published: bool,
    pub skills: Vec<String>,
    pub description: JobDescription,
}

impl NewJobPosting {
    pub fn with_id(self, id: JobPostingId) -> JobPosting {
        JobPosting {
            id,
            owner: self.owner,
            title: self.title,
            categories: self.categories,
            location: self.location,
            employment_type: self.employment_type,
            arrangement: self.arrangement,
            salary: self.salary,
            posted_at: self.posted_at,
            deadline: self.deadline,
            published: self.published,
            skills: self.skills,
            description: self.description,
        }
    }
}

/// Public projection returned by the HTTP layer.
#[derive(Debug, Clone, Serialize)]
pub struct JobPostingView {
    #[serde(flatten)]
    pub posting: JobPosting,
    pub status: &'static str,
}

impl JobPostingView {
    pub fn new(posting: JobPosting, today: NaiveDate) -> Self {
        let status = posting.status(today).label();
        Self { posting, status }
    }
}
