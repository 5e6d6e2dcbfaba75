use chrono::{Duration, NaiveDate, Utc};
use job_board::accounts::AccountId;
use job_board::applications::{
    ApplicationId, ApplicationRecord, ApplicationRepository, ApplicationService, NewApplication,
};
use job_board::clock::Clock;
use job_board::config::BoardConfig;
use job_board::documents::{
    DocumentError, DocumentKey, DocumentService, DocumentStore, NewDocument, StoredDocument,
    UploadPolicy, UrlSigner,
};
use job_board::notifications::{
    NewNotification, Notification, NotificationError, NotificationFeed, NotificationId,
    NotificationSender,
};
use job_board::postings::{
    JobPosting, JobPostingId, JobPostingRepository, JobPostingService, NewJobPosting,
    RepositoryError,
};
use job_board::throttle::QuotaRateLimiter;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPostingRepository {
    records: Arc<Mutex<BTreeMap<JobPostingId, JobPosting>>>,
}

impl JobPostingRepository for InMemoryPostingRepository {
    fn insert(&self, posting: NewJobPosting) -> Result<JobPosting, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let next = guard.keys().next_back().map(|id| id.0 + 1).unwrap_or(1);
        let stored = posting.with_id(JobPostingId(next));
        guard.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update(&self, posting: JobPosting) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        match guard.get_mut(&posting.id) {
            Some(existing) => {
                *existing = posting;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: JobPostingId) -> Result<Option<JobPosting>, RepositoryError> {
        Ok(lock(&self.records)?.get(&id).cloned())
    }

    fn delete(&self, id: JobPostingId) -> Result<(), RepositoryError> {
        lock(&self.records)?
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn list(&self) -> Result<Vec<JobPosting>, RepositoryError> {
        Ok(lock(&self.records)?.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<BTreeMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, application: NewApplication) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let duplicate = guard.values().any(|record| {
            record.student == application.student && record.posting_id == application.posting_id
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        let next = guard.keys().next_back().map(|id| id.0 + 1).unwrap_or(1);
        let record = ApplicationRecord::from_new(ApplicationId(next), application);
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        match guard.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.records)?.get(&id).cloned())
    }

    fn find_for(
        &self,
        student: AccountId,
        posting_id: JobPostingId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .find(|record| record.student == student && record.posting_id == posting_id)
            .cloned())
    }

    fn for_posting(
        &self,
        posting_id: JobPostingId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|record| record.posting_id == posting_id)
            .cloned()
            .collect())
    }

    fn for_student(&self, student: AccountId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|record| record.student == student)
            .cloned()
            .collect())
    }
}

/// Notification table serving both the sender hook and the feed endpoints.
#[derive(Clone)]
pub(crate) struct InMemoryNotificationStore {
    records: Arc<Mutex<Vec<Notification>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryNotificationStore {
    pub(crate) fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            clock,
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, Vec<Notification>>, NotificationError> {
        self.records
            .lock()
            .map_err(|_| NotificationError::Transport("notification store poisoned".to_string()))
    }
}

impl NotificationSender for InMemoryNotificationStore {
    fn send(&self, notification: NewNotification) -> Result<Notification, NotificationError> {
        let mut guard = self.guard()?;
        let stored = Notification {
            id: NotificationId(guard.len() as u64 + 1),
            recipient: notification.recipient,
            sender: notification.sender,
            message: notification.message,
            created_at: self.clock.now(),
            read: false,
        };
        guard.push(stored.clone());
        Ok(stored)
    }
}

impl NotificationFeed for InMemoryNotificationStore {
    fn for_recipient(&self, recipient: AccountId) -> Result<Vec<Notification>, NotificationError> {
        Ok(self
            .guard()?
            .iter()
            .rev()
            .filter(|notification| notification.recipient == recipient)
            .cloned()
            .collect())
    }

    fn mark_read(&self, recipient: AccountId, id: NotificationId) -> Result<(), NotificationError> {
        let mut guard = self.guard()?;
        let notification = guard
            .iter_mut()
            .find(|notification| notification.id == id && notification.recipient == recipient)
            .ok_or(NotificationError::NotFound(id))?;
        notification.read = true;
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryDocumentStore {
    files: Arc<Mutex<BTreeMap<DocumentKey, (StoredDocument, Vec<u8>)>>>,
}

impl DocumentStore for InMemoryDocumentStore {
    fn store(&self, document: NewDocument) -> Result<StoredDocument, DocumentError> {
        let mut guard = self
            .files
            .lock()
            .map_err(|_| DocumentError::Unavailable("document store poisoned".to_string()))?;
        let key = DocumentKey(format!("doc-{:06}", guard.len() + 1));
        let stored = StoredDocument {
            key: key.clone(),
            owner: document.owner,
            kind: document.kind,
            content_type: document.content_type.essence_str().to_string(),
            size: document.bytes.len(),
            stored_at: document.stored_at,
        };
        guard.insert(key, (stored.clone(), document.bytes));
        Ok(stored)
    }

    fn open(&self, key: &DocumentKey) -> Result<Option<(StoredDocument, Vec<u8>)>, DocumentError> {
        let guard = self
            .files
            .lock()
            .map_err(|_| DocumentError::Unavailable("document store poisoned".to_string()))?;
        Ok(guard.get(key).cloned())
    }
}

pub(crate) type PostingService = JobPostingService<InMemoryPostingRepository>;
pub(crate) type Applications = ApplicationService<
    InMemoryApplicationRepository,
    InMemoryPostingRepository,
    InMemoryNotificationStore,
>;
pub(crate) type Documents = DocumentService<InMemoryDocumentStore>;

/// Every domain service wired to shared in-memory adapters.
#[derive(Clone)]
pub(crate) struct Board {
    pub(crate) postings: Arc<PostingService>,
    pub(crate) applications: Arc<Applications>,
    pub(crate) notifications: Arc<InMemoryNotificationStore>,
    pub(crate) documents: Arc<Documents>,
}

impl Board {
    pub(crate) fn in_memory(
        config: &BoardConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DocumentError> {
        let posting_repository = Arc::new(InMemoryPostingRepository::default());
        let notifications = Arc::new(InMemoryNotificationStore::new(clock.clone()));

        let limiter = QuotaRateLimiter::with_clock(
            config.submission_limit,
            seconds(config.submission_window_secs),
            clock.clone(),
        );
        let applications = ApplicationService::new(
            Arc::new(InMemoryApplicationRepository::default()),
            posting_repository.clone(),
            notifications.clone(),
        )
        .with_clock(clock.clone())
        .with_rate_limiter(Arc::new(limiter));

        let documents = DocumentService::with_clock(
            Arc::new(InMemoryDocumentStore::default()),
            UploadPolicy {
                max_bytes: config.document_max_bytes,
            },
            UrlSigner::new(&config.document_signing_secret)?,
            seconds(config.document_url_ttl_secs),
            clock.clone(),
        );

        Ok(Self {
            postings: Arc::new(JobPostingService::with_clock(posting_repository, clock)),
            applications: Arc::new(applications),
            notifications,
            documents: Arc::new(documents),
        })
    }
}

const MAX_WINDOW_SECS: u64 = 366 * 24 * 60 * 60;

/// Windows and link lifetimes are capped at a year.
fn seconds(value: u64) -> Duration {
    Duration::seconds(value.min(MAX_WINDOW_SECS) as i64)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
