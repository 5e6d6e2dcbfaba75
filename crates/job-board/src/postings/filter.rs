//! Search filters over job postings.
//!
//! Each criterion compiles into an independent [`JobPredicate`]; a posting is kept when every
//! active predicate accepts it. Criteria that are absent or empty compile to nothing, so an empty
//! [`FilterCriteria`] returns its input untouched. Filtering never reorders postings.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use super::domain::JobPosting;

/// Optional search constraints supplied by a job seeker.
///
/// Keys are accepted in snake_case, in the camelCase the web client sends, or by short name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default, alias = "category", alias = "jobCategory")]
    pub job_category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "type", alias = "jobType")]
    pub job_type: Option<String>,
    #[serde(default, alias = "arrangement", alias = "jobArrangement")]
    pub job_arrangement: Option<String>,
    #[serde(
        default,
        alias = "minSalary",
        deserialize_with = "deserialize_salary_bound"
    )]
    pub min_salary: Option<SalaryBound>,
    #[serde(
        default,
        alias = "maxSalary",
        deserialize_with = "deserialize_salary_bound"
    )]
    pub max_salary: Option<SalaryBound>,
    #[serde(default, alias = "datePost")]
    pub date_post: Option<String>,
}

/// Salary bound after numeric coercion. Unparseable input is kept as NaN, which no posting
/// satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SalaryBound(pub f64);

impl SalaryBound {
    /// Coerces raw input; blank and zero bounds disable the filter.
    pub fn coerce(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let value = trimmed.parse::<f64>().unwrap_or(f64::NAN);
        Self::from_number(value)
    }

    pub fn from_number(value: f64) -> Option<Self> {
        if value == 0.0 {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn is_nan(&self) -> bool {
        self.0.is_nan()
    }
}

fn deserialize_salary_bound<'de, D>(deserializer: D) -> Result<Option<SalaryBound>, D::Error>
where
    D: Deserializer<'de>,
{
    struct SalaryBoundVisitor;

    impl<'de> Visitor<'de> for SalaryBoundVisitor {
        type Value = Option<SalaryBound>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a salary amount as a number or string")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(SalaryBound::coerce(value))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(SalaryBound::from_number(value as f64))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(SalaryBound::from_number(value as f64))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(SalaryBound::from_number(value))
        }

        fn visit_bool<E: de::Error>(self, _value: bool) -> Result<Self::Value, E> {
            Ok(Some(SalaryBound(f64::NAN)))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(SalaryBoundVisitor)
}

/// Recency buckets accepted by the `date_post` criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePostBucket {
    Today,
    ThreeDays,
    FiveDays,
    Week,
    TwoWeeks,
}

impl DatePostBucket {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "today" => Some(Self::Today),
            "3days" => Some(Self::ThreeDays),
            "5days" => Some(Self::FiveDays),
            "week" => Some(Self::Week),
            "2weeks" => Some(Self::TwoWeeks),
            _ => None,
        }
    }

    pub const fn max_age_days(self) -> i64 {
        match self {
            Self::Today => 0,
            Self::ThreeDays => 3,
            Self::FiveDays => 5,
            Self::Week => 7,
            Self::TwoWeeks => 14,
        }
    }
}

/// A single search condition over postings.
pub trait JobPredicate: Send + Sync {
    fn matches(&self, job: &JobPosting) -> bool;
}

impl<F> JobPredicate for F
where
    F: Fn(&JobPosting) -> bool + Send + Sync,
{
    fn matches(&self, job: &JobPosting) -> bool {
        self(job)
    }
}

pub type BoxedPredicate = Box<dyn JobPredicate>;

fn active(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

pub fn keyword_predicate(keyword: Option<&str>) -> Option<BoxedPredicate> {
    let needle = active(keyword)?.to_lowercase();
    Some(Box::new(move |job: &JobPosting| {
        job.title.to_lowercase().contains(&needle)
    }))
}

pub fn category_predicate(category: Option<&str>) -> Option<BoxedPredicate> {
    let category = active(category)?.to_string();
    Some(Box::new(move |job: &JobPosting| {
        job.categories.iter().any(|tag| *tag == category)
    }))
}

pub fn location_predicate(location: Option<&str>) -> Option<BoxedPredicate> {
    let location = active(location)?.to_string();
    Some(Box::new(move |job: &JobPosting| job.location == location))
}

pub fn type_predicate(job_type: Option<&str>) -> Option<BoxedPredicate> {
    let job_type = active(job_type)?.to_string();
    Some(Box::new(move |job: &JobPosting| {
        job.employment_type.label() == job_type
    }))
}

pub fn arrangement_predicate(arrangement: Option<&str>) -> Option<BoxedPredicate> {
    let arrangement = active(arrangement)?.to_string();
    Some(Box::new(move |job: &JobPosting| {
        job.arrangement.label() == arrangement
    }))
}

pub fn min_salary_predicate(bound: Option<SalaryBound>) -> Option<BoxedPredicate> {
    let SalaryBound(min) = bound?;
    Some(Box::new(move |job: &JobPosting| f64::from(job.salary.min) >= min))
}

pub fn max_salary_predicate(bound: Option<SalaryBound>) -> Option<BoxedPredicate> {
    let SalaryBound(max) = bound?;
    Some(Box::new(move |job: &JobPosting| f64::from(job.salary.max) <= max))
}

/// Whole elapsed days between `posted_at` and `now` must not exceed the bucket; unknown buckets
/// are ignored.
pub fn date_post_predicate(bucket: Option<&str>, now: DateTime<Utc>) -> Option<BoxedPredicate> {
    let max_age = DatePostBucket::parse(active(bucket)?)?.max_age_days();
    Some(Box::new(move |job: &JobPosting| {
        (now - job.posted_at).num_days() <= max_age
    }))
}

/// Compiles criteria into predicates in their evaluation order.
pub fn compile(criteria: &FilterCriteria, now: DateTime<Utc>) -> Vec<BoxedPredicate> {
    [
        keyword_predicate(criteria.keyword.as_deref()),
        category_predicate(criteria.job_category.as_deref()),
        location_predicate(criteria.location.as_deref()),
        type_predicate(criteria.job_type.as_deref()),
        arrangement_predicate(criteria.job_arrangement.as_deref()),
        min_salary_predicate(criteria.min_salary),
        max_salary_predicate(criteria.max_salary),
        date_post_predicate(criteria.date_post.as_deref(), now),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn retain(jobs: &[JobPosting], predicate: Option<BoxedPredicate>) -> Vec<JobPosting> {
    match predicate {
        Some(predicate) => jobs
            .iter()
            .filter(|job| predicate.matches(job))
            .cloned()
            .collect(),
        None => jobs.to_vec(),
    }
}

pub fn filter_by_keyword(jobs: &[JobPosting], keyword: Option<&str>) -> Vec<JobPosting> {
    retain(jobs, keyword_predicate(keyword))
}

pub fn filter_by_category(jobs: &[JobPosting], category: Option<&str>) -> Vec<JobPosting> {
    retain(jobs, category_predicate(category))
}

pub fn filter_by_location(jobs: &[JobPosting], location: Option<&str>) -> Vec<JobPosting> {
    retain(jobs, location_predicate(location))
}

pub fn filter_by_type(jobs: &[JobPosting], job_type: Option<&str>) -> Vec<JobPosting> {
    retain(jobs, type_predicate(job_type))
}

pub fn filter_by_arrangement(jobs: &[JobPosting], arrangement: Option<&str>) -> Vec<JobPosting> {
    retain(jobs, arrangement_predicate(arrangement))
}

pub fn filter_by_min_salary(jobs: &[JobPosting], min: Option<SalaryBound>) -> Vec<JobPosting> {
    retain(jobs, min_salary_predicate(min))
}

pub fn filter_by_max_salary(jobs: &[JobPosting], max: Option<SalaryBound>) -> Vec<JobPosting> {
    retain(jobs, max_salary_predicate(max))
}

pub fn filter_by_date_post(
    jobs: &[JobPosting],
    bucket: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<JobPosting> {
    retain(jobs, date_post_predicate(bucket, now))
}

/// Keeps postings matching every active criterion, preserving input order.
pub fn filter_jobs(
    jobs: &[JobPosting],
    criteria: &FilterCriteria,
    now: DateTime<Utc>,
) -> Vec<JobPosting> {
    let predicates = compile(criteria, now);
    jobs.iter()
        .filter(|job| predicates.iter().all(|predicate| predicate.matches(job)))
        .cloned()
        .collect()
}
