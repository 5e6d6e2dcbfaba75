use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::accounts::AccountId;
use crate::applications::repository::{
    ApplicationId, ApplicationRecord, ApplicationRepository, NewApplication,
};
use crate::applications::status::ApplicationStatus;
use crate::applications::{application_router, ApplicationService};
use crate::clock::FixedClock;
use crate::notifications::{
    NewNotification, Notification, NotificationError, NotificationId, NotificationSender,
};
use crate::postings::{
    EmploymentType, JobDescription, JobPosting, JobPostingId, RepositoryError, SalaryRange,
    WorkArrangement,
};

pub(super) use crate::postings::tests::common::{read_json_body, MemoryPostings};

pub(super) const COMPANY: u64 = 10;
pub(super) const OTHER_COMPANY: u64 = 11;
pub(super) const STUDENT: u64 = 20;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

pub(super) fn posting(id: u64, owner: u64) -> JobPosting {
    JobPosting {
        id: JobPostingId(id),
        owner: AccountId(owner),
        title: "Graphic Designer".to_string(),
        categories: vec!["Design".to_string()],
        location: "Bangkok".to_string(),
        employment_type: EmploymentType::Internship,
        arrangement: WorkArrangement::Onsite,
        salary: SalaryRange {
            min: 30000,
            max: 60000,
        },
        posted_at: now() - Duration::days(1),
        deadline: now() + Duration::days(30),
        published: true,
        skills: vec!["Figma".to_string()],
        description: JobDescription::default(),
    }
}

pub(super) fn pending_application(id: u64, posting_id: u64, student: u64) -> ApplicationRecord {
    ApplicationRecord {
        id: ApplicationId(id),
        posting_id: JobPostingId(posting_id),
        student: AccountId(student),
        status: ApplicationStatus::Pending,
        submitted_at: now() - Duration::hours(4),
        updated_at: now() - Duration::hours(4),
        documents: Vec::new(),
    }
}

pub(super) type TestService =
    ApplicationService<MemoryApplications, MemoryPostings, MemoryNotifier>;

pub(super) struct Fixture {
    pub(super) service: Arc<TestService>,
    pub(super) applications: Arc<MemoryApplications>,
    pub(super) postings: Arc<MemoryPostings>,
    pub(super) notifier: Arc<MemoryNotifier>,
}

/// Board with posting 1 owned by [`COMPANY`] and application 1 from [`STUDENT`], still pending.
pub(super) fn build_service() -> Fixture {
    let postings = Arc::new(MemoryPostings::default());
    postings.seed(posting(1, COMPANY));
    let applications = Arc::new(MemoryApplications::default());
    applications.seed(pending_application(1, 1, STUDENT));
    let notifier = Arc::new(MemoryNotifier::default());

    let service = ApplicationService::new(applications.clone(), postings.clone(), notifier.clone())
        .with_clock(Arc::new(FixedClock(now())));

    Fixture {
        service: Arc::new(service),
        applications,
        postings,
        notifier,
    }
}

pub(super) fn router_for(fixture: &Fixture) -> axum::Router {
    application_router(fixture.service.clone())
}

#[derive(Default, Clone)]
pub(super) struct MemoryApplications {
    records: Arc<Mutex<BTreeMap<ApplicationId, ApplicationRecord>>>,
}

impl MemoryApplications {
    pub(super) fn seed(&self, record: ApplicationRecord) {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .insert(record.id, record);
    }

    pub(super) fn stored(&self, id: u64) -> Option<ApplicationRecord> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(&ApplicationId(id))
            .cloned()
    }
}

impl ApplicationRepository for MemoryApplications {
    fn insert(&self, application: NewApplication) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.values().any(|record| {
            record.student == application.student && record.posting_id == application.posting_id
        }) {
            return Err(RepositoryError::Conflict);
        }
        let next = guard.keys().next_back().map(|id| id.0 + 1).unwrap_or(1);
        let record = ApplicationRecord::from_new(ApplicationId(next), application);
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        self.seed(record);
        Ok(())
    }

    fn fetch(&self, id: ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self.stored(id.0))
    }

    fn find_for(
        &self,
        student: AccountId,
        posting_id: JobPostingId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|record| record.student == student && record.posting_id == posting_id)
            .cloned())
    }

    fn for_posting(
        &self,
        posting_id: JobPostingId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.posting_id == posting_id)
            .cloned()
            .collect())
    }

    fn for_student(&self, student: AccountId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.student == student)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub(super) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationSender for MemoryNotifier {
    fn send(&self, notification: NewNotification) -> Result<Notification, NotificationError> {
        let mut guard = self.sent.lock().expect("notifier mutex poisoned");
        let stored = Notification {
            id: NotificationId(guard.len() as u64 + 1),
            recipient: notification.recipient,
            sender: notification.sender,
            message: notification.message,
            created_at: now(),
            read: false,
        };
        guard.push(stored.clone());
        Ok(stored)
    }
}

pub(super) struct OfflineNotifier;

impl NotificationSender for OfflineNotifier {
    fn send(&self, _notification: NewNotification) -> Result<Notification, NotificationError> {
        Err(NotificationError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) struct UnavailableApplications;

impl ApplicationRepository for UnavailableApplications {
    fn insert(&self, _application: NewApplication) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: ApplicationRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_for(
        &self,
        _student: AccountId,
        _posting_id: JobPostingId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_posting(
        &self,
        _posting_id: JobPostingId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_student(&self, _student: AccountId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
