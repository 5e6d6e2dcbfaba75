use super::domain::{JobPosting, JobPostingId, NewJobPosting};

/// Storage abstraction for job postings; the repository assigns identifiers.
pub trait JobPostingRepository: Send + Sync {
    fn insert(&self, posting: NewJobPosting) -> Result<JobPosting, RepositoryError>;
    fn update(&self, posting: JobPosting) -> Result<(), RepositoryError>;
    fn fetch(&self, id: JobPostingId) -> Result<Option<JobPosting>, RepositoryError>;
    fn delete(&self, id: JobPostingId) -> Result<(), RepositoryError>;
    /// All postings ordered by id.
    fn list(&self) -> Result<Vec<JobPosting>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
