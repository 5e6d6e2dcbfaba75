//! Job postings: search filters, form validation, storage and company management.

pub mod domain;
pub mod filter;
pub mod import;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
pub(crate) mod tests;

pub use domain::{
    EmploymentType, JobDescription, JobPosting, JobPostingId, JobPostingView, NewJobPosting,
    PostingStatus, SalaryRange, WorkArrangement,
};
pub use filter::{filter_jobs, DatePostBucket, FilterCriteria, JobPredicate, SalaryBound};
pub use import::{CatalogImport, CatalogImportError, CatalogImporter, RejectedRow};
pub use repository::{JobPostingRepository, RepositoryError};
pub use router::{posting_router, JobPostRequest};
pub use service::{JobPostingService, PostingServiceError};
pub use validation::{
    validate_description, validate_detail, validate_job_form, DescriptionForm, JobPostForm,
    SalaryForm, ValidationErrors,
};
