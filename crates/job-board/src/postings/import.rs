use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{JobPosting, JobPostingId, NewJobPosting};
use super::validation::{
    DescriptionForm, JobPostForm, SalaryForm, ValidationErrors,
};
use crate::accounts::AccountId;

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read job catalog: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid job catalog CSV: {}", err),
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// A CSV row that failed form validation. Rows are numbered from 1, excluding the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub row: usize,
    pub errors: Vec<String>,
}

impl std::fmt::Display for RejectedRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: {}", self.row, self.errors.join("; "))
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogImport {
    pub accepted: Vec<NewJobPosting>,
    pub rejected: Vec<RejectedRow>,
}

impl CatalogImport {
    /// Assigns sequential ids starting at 1, for callers that filter without a repository.
    pub fn into_postings(self) -> Vec<JobPosting> {
        self.accepted
            .into_iter()
            .zip(1u64..)
            .map(|(draft, id)| draft.with_id(JobPostingId(id)))
            .collect()
    }
}

/// Loads job postings from a spreadsheet export.
pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        owner: AccountId,
        now: DateTime<Utc>,
    ) -> Result<CatalogImport, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, owner, now)
    }

    /// Each row is checked with the form validator against the import date `now`, so rows whose
    /// deadline has already passed are rejected; invalid rows are collected instead of aborting
    /// the import.
    pub fn from_reader<R: Read>(
        reader: R,
        owner: AccountId,
        now: DateTime<Utc>,
    ) -> Result<CatalogImport, CatalogImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut import = CatalogImport::default();

        for (index, record) in csv_reader.deserialize::<CatalogRow>().enumerate() {
            let row = record?;
            let posted_at = row.posted.as_deref().and_then(parse_posted).unwrap_or(now);
            let published = row.published.as_deref().map(truthy).unwrap_or(true);

            match row
                .into_form()
                .into_draft_as_of(owner, published, posted_at, now.date_naive())
            {
                Ok(draft) => import.accepted.push(draft),
                Err(ValidationErrors(errors)) => import.rejected.push(RejectedRow {
                    row: index + 1,
                    errors,
                }),
            }
        }

        Ok(import)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "Title", default, deserialize_with = "empty_string_as_none")]
    title: Option<String>,
    #[serde(rename = "Categories", default)]
    categories: String,
    #[serde(rename = "Location", default, deserialize_with = "empty_string_as_none")]
    location: Option<String>,
    #[serde(rename = "Type", default, deserialize_with = "empty_string_as_none")]
    job_type: Option<String>,
    #[serde(rename = "Arrangement", default, deserialize_with = "empty_string_as_none")]
    arrangement: Option<String>,
    #[serde(rename = "Min Salary", default, deserialize_with = "empty_string_as_none")]
    min_salary: Option<String>,
    #[serde(rename = "Max Salary", default, deserialize_with = "empty_string_as_none")]
    max_salary: Option<String>,
    #[serde(rename = "Posted", default, deserialize_with = "empty_string_as_none")]
    posted: Option<String>,
    #[serde(rename = "Deadline", default, deserialize_with = "empty_string_as_none")]
    deadline: Option<String>,
    #[serde(rename = "Skills", default)]
    skills: String,
    #[serde(rename = "Overview", default, deserialize_with = "empty_string_as_none")]
    overview: Option<String>,
    #[serde(rename = "Responsibility", default, deserialize_with = "empty_string_as_none")]
    responsibility: Option<String>,
    #[serde(rename = "Requirement", default, deserialize_with = "empty_string_as_none")]
    requirement: Option<String>,
    #[serde(rename = "Qualification", default, deserialize_with = "empty_string_as_none")]
    qualification: Option<String>,
    #[serde(rename = "Published", default, deserialize_with = "empty_string_as_none")]
    published: Option<String>,
}

impl CatalogRow {
    fn into_form(self) -> JobPostForm {
        let salary = SalaryForm {
            min: self.min_salary.as_deref().map(amount),
            max: self.max_salary.as_deref().map(amount),
        };

        JobPostForm {
            title: self.title,
            category: split_list(&self.categories),
            location: self.location,
            job_type: self.job_type,
            arrangement: self.arrangement,
            salary: Some(salary),
            deadline: self.deadline,
            skills: split_list(&self.skills),
            description: DescriptionForm {
                overview: self.overview,
                responsibility: self.responsibility,
                requirement: self.requirement,
                qualification: self.qualification,
            },
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

fn amount(raw: &str) -> f64 {
    raw.trim().replace(',', "").parse::<f64>().unwrap_or(f64::NAN)
}

fn truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1" | "published"
    )
}

fn parse_posted(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value.trim()) {
        return Some(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}
