use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::ApplicationStatus;
use crate::accounts::AccountId;
use crate::documents::DocumentRef;
use crate::postings::{JobPostingId, RepositoryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub u64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Submission waiting for an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub posting_id: JobPostingId,
    pub student: AccountId,
    pub submitted_at: DateTime<Utc>,
    pub documents: Vec<DocumentRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub posting_id: JobPostingId,
    pub student: AccountId,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
}

impl ApplicationRecord {
    pub fn from_new(id: ApplicationId, application: NewApplication) -> Self {
        Self {
            id,
            posting_id: application.posting_id,
            student: application.student,
            status: ApplicationStatus::Pending,
            submitted_at: application.submitted_at,
            updated_at: application.submitted_at,
            documents: application.documents,
        }
    }

    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.id,
            posting_id: self.posting_id,
            student: self.student,
            status: self.status.label(),
            submitted_at: self.submitted_at,
            updated_at: self.updated_at,
            documents: self.documents.clone(),
            closed: self.status.is_terminal(),
            next_statuses: self
                .status
                .allowed_next()
                .iter()
                .map(|status| status.label())
                .collect(),
        }
    }
}

/// Storage for applications. `insert` rejects a second application by the same student
/// for the same posting with [`RepositoryError::Conflict`].
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: NewApplication) -> Result<ApplicationRecord, RepositoryError>;
    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn find_for(
        &self,
        student: AccountId,
        posting_id: JobPostingId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn for_posting(&self, posting_id: JobPostingId)
        -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn for_student(&self, student: AccountId) -> Result<Vec<ApplicationRecord>, RepositoryError>;
}

/// Application as exposed over HTTP, with the resolved status name.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub posting_id: JobPostingId,
    pub student: AccountId,
    pub status: &'static str,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<DocumentRef>,
    /// Offered and rejected applications accept no further status changes.
    pub closed: bool,
    pub next_statuses: Vec<&'static str>,
}
