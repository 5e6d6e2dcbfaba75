use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::clock::FixedClock;
use crate::postings::{
    posting_router, DescriptionForm, JobPosting, JobPostingId, JobPostingRepository,
    JobPostingService, JobPostForm, NewJobPosting, RepositoryError, SalaryForm,
};

pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

pub(crate) fn valid_form() -> JobPostForm {
    JobPostForm {
        title: Some("Graphic Designer".to_string()),
        category: vec!["Design".to_string()],
        location: Some("Bangkok".to_string()),
        job_type: Some("internship".to_string()),
        arrangement: Some("onsite".to_string()),
        salary: Some(SalaryForm {
            min: Some(30000.0),
            max: Some(60000.0),
        }),
        deadline: Some("2026-04-01".to_string()),
        skills: vec!["Figma".to_string(), "Illustrator".to_string()],
        description: DescriptionForm {
            overview: Some("Brand and campaign design".to_string()),
            responsibility: Some("Produce social assets".to_string()),
            requirement: Some("Portfolio".to_string()),
            qualification: Some("Design student".to_string()),
        },
    }
}

/// In-memory posting store; ids continue from the highest stored id.
#[derive(Default, Clone)]
pub(crate) struct MemoryPostings {
    records: Arc<Mutex<BTreeMap<JobPostingId, JobPosting>>>,
}

impl MemoryPostings {
    pub(crate) fn seed(&self, posting: JobPosting) {
        self.records
            .lock()
            .expect("posting mutex poisoned")
            .insert(posting.id, posting);
    }
}

impl JobPostingRepository for MemoryPostings {
    fn insert(&self, posting: NewJobPosting) -> Result<JobPosting, RepositoryError> {
        let mut guard = self.records.lock().expect("posting mutex poisoned");
        let next = guard.keys().next_back().map(|id| id.0 + 1).unwrap_or(1);
        let stored = posting.with_id(JobPostingId(next));
        guard.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update(&self, posting: JobPosting) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("posting mutex poisoned");
        match guard.get_mut(&posting.id) {
            Some(existing) => {
                *existing = posting;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: JobPostingId) -> Result<Option<JobPosting>, RepositoryError> {
        let guard = self.records.lock().expect("posting mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn delete(&self, id: JobPostingId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("posting mutex poisoned");
        guard.remove(&id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn list(&self) -> Result<Vec<JobPosting>, RepositoryError> {
        let guard = self.records.lock().expect("posting mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

pub(crate) struct UnavailablePostings;

impl JobPostingRepository for UnavailablePostings {
    fn insert(&self, _posting: NewJobPosting) -> Result<JobPosting, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _posting: JobPosting) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: JobPostingId) -> Result<Option<JobPosting>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: JobPostingId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<JobPosting>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(crate) fn build_service() -> (Arc<JobPostingService<MemoryPostings>>, Arc<MemoryPostings>) {
    let repository = Arc::new(MemoryPostings::default());
    let service = JobPostingService::with_clock(repository.clone(), Arc::new(FixedClock(now())));
    (Arc::new(service), repository)
}

pub(crate) fn router_for(service: Arc<JobPostingService<MemoryPostings>>) -> axum::Router {
    posting_router(service)
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
