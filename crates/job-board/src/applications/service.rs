use std::sync::Arc;

use tracing::{info, warn};

use super::repository::{
    ApplicationId, ApplicationRecord, ApplicationRepository, NewApplication,
};
use super::status::ApplicationStatus;
use crate::accounts::{AccountId, AccountRole, Actor};
use crate::clock::{Clock, SystemClock};
use crate::documents::DocumentRef;
use crate::notifications::{NewNotification, NotificationSender};
use crate::postings::{JobPosting, JobPostingId, JobPostingRepository, RepositoryError};
use crate::throttle::{RateLimiter, Unlimited};

/// Service composing application storage, posting lookups, notifications and throttling.
pub struct ApplicationService<A, P, N> {
    applications: Arc<A>,
    postings: Arc<P>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    limiter: Arc<dyn RateLimiter>,
}

impl<A, P, N> ApplicationService<A, P, N>
where
    A: ApplicationRepository + 'static,
    P: JobPostingRepository + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(applications: Arc<A>, postings: Arc<P>, notifier: Arc<N>) -> Self {
        Self {
            applications,
            postings,
            notifier,
            clock: Arc::new(SystemClock),
            limiter: Arc::new(Unlimited),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Submit a student's application to an open posting and tell the company about it.
    pub fn submit(
        &self,
        actor: &Actor,
        posting_id: JobPostingId,
        documents: Vec<DocumentRef>,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        if actor.role != AccountRole::Student {
            return Err(ApplicationServiceError::Forbidden(actor.account_id));
        }

        let posting = self
            .postings
            .fetch(posting_id)?
            .filter(|posting| posting.is_open(self.clock.today()))
            .ok_or(ApplicationServiceError::PostingNotFound(posting_id))?;

        if self
            .applications
            .find_for(actor.account_id, posting_id)?
            .is_some()
        {
            return Err(ApplicationServiceError::Duplicate(posting_id));
        }

        let throttle_key = format!("application-submit:{}", actor.account_id);
        if !self.limiter.check_and_record(&throttle_key) {
            warn!(student = %actor.account_id, "application submission throttled");
            return Err(ApplicationServiceError::RateLimited(actor.account_id));
        }

        let record = match self.applications.insert(NewApplication {
            posting_id,
            student: actor.account_id,
            submitted_at: self.clock.now(),
            documents,
        }) {
            Ok(record) => record,
            Err(RepositoryError::Conflict) => {
                return Err(ApplicationServiceError::Duplicate(posting_id))
            }
            Err(other) => return Err(other.into()),
        };
        info!(
            application_id = %record.id,
            posting_id = %posting_id,
            student = %actor.account_id,
            "application submitted"
        );

        self.notify(NewNotification {
            recipient: posting.owner,
            message: format!("New application received for {}", posting.title),
            sender: Some(actor.account_id),
        });

        Ok(record)
    }

    /// Move an application to `new_status` on behalf of the posting's owner or an admin.
    ///
    /// Nothing is written and nobody is notified unless the actor is allowed, the status name
    /// is known and the transition is legal from the current status.
    pub fn update_status(
        &self,
        application_id: ApplicationId,
        new_status: &str,
        actor: &Actor,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let mut record = self
            .applications
            .fetch(application_id)?
            .ok_or(ApplicationServiceError::NotFound(application_id))?;
        let posting = self
            .postings
            .fetch(record.posting_id)?
            .ok_or(ApplicationServiceError::NotFound(application_id))?;

        if !actor.can_manage(posting.owner) {
            return Err(ApplicationServiceError::Forbidden(actor.account_id));
        }

        let next = ApplicationStatus::parse(new_status)
            .ok_or_else(|| ApplicationServiceError::InvalidStatus(new_status.to_string()))?;
        if !record.status.can_transition_to(next) {
            return Err(ApplicationServiceError::IllegalTransition {
                from: record.status,
                to: next,
            });
        }

        let previous = record.status;
        record.status = next;
        record.updated_at = self.clock.now();
        self.applications.update(record.clone())?;
        info!(
            application_id = %application_id,
            from = previous.label(),
            to = next.label(),
            actor = %actor.account_id,
            "application status updated"
        );

        self.notify(status_notification(&record, &posting, actor.account_id));

        Ok(record)
    }

    /// Visible to the applicant, the posting owner and admins.
    pub fn get(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let record = self
            .applications
            .fetch(application_id)?
            .ok_or(ApplicationServiceError::NotFound(application_id))?;

        if record.student == actor.account_id || actor.is_admin() {
            return Ok(record);
        }
        match self.postings.fetch(record.posting_id)? {
            Some(posting) if actor.can_manage(posting.owner) => Ok(record),
            _ => Err(ApplicationServiceError::Forbidden(actor.account_id)),
        }
    }

    pub fn list_for_posting(
        &self,
        actor: &Actor,
        posting_id: JobPostingId,
    ) -> Result<Vec<ApplicationRecord>, ApplicationServiceError> {
        let posting = self
            .postings
            .fetch(posting_id)?
            .ok_or(ApplicationServiceError::PostingNotFound(posting_id))?;
        if !actor.can_manage(posting.owner) {
            return Err(ApplicationServiceError::Forbidden(actor.account_id));
        }
        Ok(self.applications.for_posting(posting_id)?)
    }

    pub fn list_for_student(
        &self,
        actor: &Actor,
    ) -> Result<Vec<ApplicationRecord>, ApplicationServiceError> {
        Ok(self.applications.for_student(actor.account_id)?)
    }

    fn notify(&self, notification: NewNotification) {
        let recipient = notification.recipient;
        if let Err(err) = self.notifier.send(notification) {
            warn!(recipient = %recipient, error = %err, "notification delivery failed");
        }
    }
}

fn status_notification(
    record: &ApplicationRecord,
    posting: &JobPosting,
    sender: AccountId,
) -> NewNotification {
    NewNotification {
        recipient: record.student,
        message: format!(
            "Your application for {} is now {}",
            posting.title,
            record.status.label()
        ),
        sender: Some(sender),
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error("job posting {0} is not open for applications")]
    PostingNotFound(JobPostingId),
    #[error("account {0} may not act on this application")]
    Forbidden(AccountId),
    #[error("unknown application status `{0}`")]
    InvalidStatus(String),
    #[error("cannot move an application from {from} to {to}")]
    IllegalTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("already applied to job posting {0}")]
    Duplicate(JobPostingId),
    #[error("too many applications from account {0}, try again later")]
    RateLimited(AccountId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
