use std::sync::Arc;

use tracing::info;

use super::domain::{JobPosting, JobPostingId};
use super::filter::{filter_jobs, FilterCriteria};
use super::repository::{JobPostingRepository, RepositoryError};
use super::validation::{validate_job_form, JobPostForm, ValidationErrors};
use crate::accounts::{AccountId, AccountRole, Actor};
use crate::clock::{Clock, SystemClock};

/// Service composing posting storage, form validation and search.
pub struct JobPostingService<P> {
    postings: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<P> JobPostingService<P>
where
    P: JobPostingRepository + 'static,
{
    pub fn new(postings: Arc<P>) -> Self {
        Self::with_clock(postings, Arc::new(SystemClock))
    }

    pub fn with_clock(postings: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self { postings, clock }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Validate and store a new posting owned by the acting company.
    pub fn create(
        &self,
        actor: &Actor,
        form: JobPostForm,
        publish: bool,
    ) -> Result<JobPosting, PostingServiceError> {
        if actor.role == AccountRole::Student {
            return Err(PostingServiceError::Forbidden(actor.account_id));
        }

        let draft = form.into_draft(actor.account_id, publish, self.clock.now())?;
        let stored = self.postings.insert(draft)?;
        info!(
            posting_id = %stored.id,
            owner = %stored.owner,
            published = stored.published,
            "job posting created"
        );
        Ok(stored)
    }

    /// Replace the editable fields of an existing posting, keeping owner and posting time.
    pub fn update(
        &self,
        actor: &Actor,
        id: JobPostingId,
        form: JobPostForm,
        publish: bool,
    ) -> Result<JobPosting, PostingServiceError> {
        let existing = self.owned(actor, id)?;
        let draft = form.into_draft(existing.owner, publish, self.clock.now())?;

        let mut updated = draft.with_id(existing.id);
        updated.posted_at = existing.posted_at;

        self.postings.update(updated.clone())?;
        info!(posting_id = %id, actor = %actor.account_id, "job posting updated");
        Ok(updated)
    }

    pub fn set_published(
        &self,
        actor: &Actor,
        id: JobPostingId,
        published: bool,
    ) -> Result<JobPosting, PostingServiceError> {
        let mut posting = self.owned(actor, id)?;
        posting.published = published;
        self.postings.update(posting.clone())?;
        Ok(posting)
    }

    pub fn delete(&self, actor: &Actor, id: JobPostingId) -> Result<(), PostingServiceError> {
        self.owned(actor, id)?;
        match self.postings.delete(id) {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => return Err(PostingServiceError::NotFound(id)),
            Err(other) => return Err(other.into()),
        }
        info!(posting_id = %id, actor = %actor.account_id, "job posting deleted");
        Ok(())
    }

    /// Fetch a posting; drafts are only visible to their owner and admins.
    pub fn get(
        &self,
        id: JobPostingId,
        actor: Option<&Actor>,
    ) -> Result<JobPosting, PostingServiceError> {
        let posting = self
            .postings
            .fetch(id)?
            .ok_or(PostingServiceError::NotFound(id))?;

        let may_manage = actor
            .map(|actor| actor.can_manage(posting.owner))
            .unwrap_or(false);
        if posting.published || may_manage {
            Ok(posting)
        } else {
            Err(PostingServiceError::NotFound(id))
        }
    }

    /// Open postings matching every supplied criterion.
    pub fn search(&self, criteria: &FilterCriteria) -> Result<Vec<JobPosting>, PostingServiceError> {
        let today = self.clock.today();
        let open: Vec<JobPosting> = self
            .postings
            .list()?
            .into_iter()
            .filter(|posting| posting.is_open(today))
            .collect();
        Ok(filter_jobs(&open, criteria, self.clock.now()))
    }

    /// Every posting owned by the actor, including drafts and expired ones.
    pub fn owned_by(&self, owner: AccountId) -> Result<Vec<JobPosting>, PostingServiceError> {
        Ok(self
            .postings
            .list()?
            .into_iter()
            .filter(|posting| posting.owner == owner)
            .collect())
    }

    pub fn validate(&self, form: &JobPostForm) -> Vec<String> {
        validate_job_form(form, self.clock.today())
    }

    fn owned(&self, actor: &Actor, id: JobPostingId) -> Result<JobPosting, PostingServiceError> {
        let posting = self
            .postings
            .fetch(id)?
            .ok_or(PostingServiceError::NotFound(id))?;
        if actor.can_manage(posting.owner) {
            Ok(posting)
        } else {
            Err(PostingServiceError::Forbidden(actor.account_id))
        }
    }
}

/// Error raised by the job posting service.
#[derive(Debug, thiserror::Error)]
pub enum PostingServiceError {
    #[error("job posting failed validation: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("job posting {0} not found")]
    NotFound(JobPostingId),
    #[error("account {0} may not manage this job posting")]
    Forbidden(AccountId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
