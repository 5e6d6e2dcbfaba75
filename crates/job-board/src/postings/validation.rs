//! Job-post form validation.
//!
//! Every rule runs on every call so the form can show all problems at once. The result is a flat
//! list of messages; an empty list means the form can be accepted.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::domain::{
    EmploymentType, JobDescription, NewJobPosting, SalaryRange, WorkArrangement,
};
use crate::accounts::AccountId;

/// Candidate job post as submitted by a company, before any checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPostForm {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "categories")]
    pub category: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "type")]
    pub job_type: Option<String>,
    #[serde(default)]
    pub arrangement: Option<String>,
    #[serde(default, deserialize_with = "deserialize_salary")]
    pub salary: Option<SalaryForm>,
    /// Raw deadline text; parsed by the validator so a bad date is reported, not rejected.
    #[serde(default, deserialize_with = "deserialize_loose_text")]
    pub deadline: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub description: DescriptionForm,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SalaryForm {
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub min: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub max: Option<f64>,
}

impl SalaryForm {
    fn is_blank(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptionForm {
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub responsibility: Option<String>,
    #[serde(default)]
    pub requirement: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
}

// Amounts accept numbers or numeric text; anything else becomes NaN so the validator reports it.
fn amount_from_value(value: Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Number(number) => Some(number.as_f64().unwrap_or(f64::NAN)),
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text.trim().parse::<f64>().unwrap_or(f64::NAN)),
        _ => Some(f64::NAN),
    }
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(amount_from_value(Value::deserialize(deserializer)?))
}

fn deserialize_salary<'de, D>(deserializer: D) -> Result<Option<SalaryForm>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Object(mut fields) => Ok(Some(SalaryForm {
            min: fields.remove("min").and_then(amount_from_value),
            max: fields.remove("max").and_then(amount_from_value),
        })),
        _ => Ok(Some(SalaryForm {
            min: Some(f64::NAN),
            max: Some(f64::NAN),
        })),
    }
}

fn deserialize_loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp; only the date is kept.
pub fn parse_deadline(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|timestamp| timestamp.date_naive())
        })
}

/// Messages surfaced when a form fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{}", .0.join("; "))]
pub struct ValidationErrors(pub Vec<String>);

fn has_text(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(|text| !text.trim().is_empty())
        .unwrap_or(false)
}

fn has_entries(values: &[String]) -> bool {
    values.iter().any(|value| !value.trim().is_empty())
}

/// Declarative required-field rule.
struct RequiredField {
    label: &'static str,
    present: fn(&JobPostForm) -> bool,
}

const REQUIRED_FIELDS: &[RequiredField] = &[
    RequiredField {
        label: "Title",
        present: |form| has_text(&form.title),
    },
    RequiredField {
        label: "Location",
        present: |form| has_text(&form.location),
    },
    RequiredField {
        label: "Type",
        present: |form| has_text(&form.job_type),
    },
    RequiredField {
        label: "Arrangement",
        present: |form| has_text(&form.arrangement),
    },
    RequiredField {
        label: "Salary",
        present: |form| form.salary.map(|salary| !salary.is_blank()).unwrap_or(false),
    },
    RequiredField {
        label: "Deadline",
        present: |form| has_text(&form.deadline),
    },
    RequiredField {
        label: "Category",
        present: |form| has_entries(&form.category),
    },
];

fn required(label: &str) -> String {
    format!("{label} is required")
}

const MAX_SALARY: f64 = u32::MAX as f64;

fn check_amount(label: &str, amount: Option<f64>, errors: &mut Vec<String>) -> Option<f64> {
    match amount {
        None => {
            errors.push(required(label));
            None
        }
        Some(value) if !value.is_finite() => {
            errors.push(format!("{label} must be a number"));
            None
        }
        Some(value) => {
            if value < 0.0 {
                errors.push(format!("{label} cannot be negative"));
            }
            if value.fract() != 0.0 {
                errors.push(format!("{label} must be a whole number"));
            }
            if value > MAX_SALARY {
                errors.push(format!("{label} cannot exceed {}", u32::MAX));
            }
            Some(value)
        }
    }
}

fn validate_salary(salary: &SalaryForm, errors: &mut Vec<String>) {
    let min = check_amount("Min Salary", salary.min, errors);
    let max = check_amount("Max Salary", salary.max, errors);
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            errors.push("Min Salary should be less than Max Salary".to_string());
        }
    }
}

/// Checks the detail step: required fields, enum values, salary, deadline and skills.
pub fn validate_detail(form: &JobPostForm, today: NaiveDate) -> Vec<String> {
    let mut errors: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !(field.present)(form))
        .map(|field| required(field.label))
        .collect();

    if let Some(job_type) = form.job_type.as_deref().filter(|value| !value.trim().is_empty()) {
        if EmploymentType::parse(job_type).is_none() {
            errors.push(
                "Type must be one of full-time, part-time, internship, freelance".to_string(),
            );
        }
    }

    if let Some(arrangement) = form
        .arrangement
        .as_deref()
        .filter(|value| !value.trim().is_empty())
    {
        if WorkArrangement::parse(arrangement).is_none() {
            errors.push("Arrangement must be one of onsite, remote, hybrid".to_string());
        }
    }

    if let Some(salary) = form.salary.filter(|salary| !salary.is_blank()) {
        validate_salary(&salary, &mut errors);
    }

    if let Some(raw) = form.deadline.as_deref().filter(|value| !value.trim().is_empty()) {
        match parse_deadline(raw.trim()) {
            Some(deadline) if deadline < today => {
                errors.push("Deadline must be today or a future date".to_string());
            }
            Some(_) => {}
            None => errors.push("Deadline must be a valid date".to_string()),
        }
    }

    if !has_entries(&form.skills) {
        errors.push("At least one skill is required".to_string());
    }

    errors
}

/// Checks the description step; all four sections are required.
pub fn validate_description(description: &DescriptionForm) -> Vec<String> {
    [
        ("Overview", &description.overview),
        ("Responsibility", &description.responsibility),
        ("Requirement", &description.requirement),
        ("Qualification", &description.qualification),
    ]
    .into_iter()
    .filter(|(_, value)| !has_text(value))
    .map(|(label, _)| required(label))
    .collect()
}

pub fn validate_job_form(form: &JobPostForm, today: NaiveDate) -> Vec<String> {
    let mut errors = validate_detail(form, today);
    errors.extend(validate_description(&form.description));
    errors
}

fn clean_list(values: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for value in values {
        let trimmed = value.trim();
        if !trimmed.is_empty() && !cleaned.iter().any(|existing| existing == trimmed) {
            cleaned.push(trimmed.to_string());
        }
    }
    cleaned
}

fn text(value: &Option<String>) -> String {
    value.as_deref().unwrap_or_default().trim().to_string()
}

fn whole_amount(label: &str, value: Option<f64>) -> Result<u32, ValidationErrors> {
    value
        .filter(|amount| amount.fract() == 0.0 && (0.0..=MAX_SALARY).contains(amount))
        .map(|amount| amount as u32)
        .ok_or_else(|| ValidationErrors(vec![format!("{label} must be a whole number")]))
}

impl JobPostForm {
    /// Validates against `posted_at`'s date and converts into a storable posting.
    pub fn into_draft(
        self,
        owner: AccountId,
        published: bool,
        posted_at: DateTime<Utc>,
    ) -> Result<NewJobPosting, ValidationErrors> {
        let today = posted_at.date_naive();
        self.into_draft_as_of(owner, published, posted_at, today)
    }

    /// Like [`JobPostForm::into_draft`], but the deadline is checked against `today` rather than
    /// the posting date.
    pub fn into_draft_as_of(
        self,
        owner: AccountId,
        published: bool,
        posted_at: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<NewJobPosting, ValidationErrors> {
        let errors = validate_job_form(&self, today);
        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        let employment_type = self
            .job_type
            .as_deref()
            .and_then(EmploymentType::parse)
            .ok_or_else(|| ValidationErrors(vec![required("Type")]))?;
        let arrangement = self
            .arrangement
            .as_deref()
            .and_then(WorkArrangement::parse)
            .ok_or_else(|| ValidationErrors(vec![required("Arrangement")]))?;
        let deadline = self
            .deadline
            .as_deref()
            .and_then(|raw| parse_deadline(raw.trim()))
            .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
            .ok_or_else(|| ValidationErrors(vec![required("Deadline")]))?;
        let salary = self.salary.unwrap_or_default();

        Ok(NewJobPosting {
            owner,
            title: text(&self.title),
            categories: clean_list(&self.category),
            location: text(&self.location),
            employment_type,
            arrangement,
            salary: SalaryRange {
                min: whole_amount("Min Salary", salary.min)?,
                max: whole_amount("Max Salary", salary.max)?,
            },
            posted_at,
            deadline,
            published,
            skills: clean_list(&self.skills),
            description: JobDescription {
                overview: text(&self.description.overview),
                responsibility: text(&self.description.responsibility),
                requirement: text(&self.description.requirement),
                qualification: text(&self.description.qualification),
            },
        })
    }
}
