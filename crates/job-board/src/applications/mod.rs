//! Student applications and the status pipeline companies move them through.

pub mod repository;
pub mod router;
pub mod service;
pub mod status;

#[cfg(test)]
mod tests;

pub use repository::{
    ApplicationId, ApplicationRecord, ApplicationRepository, ApplicationStatusView,
    NewApplication,
};
pub use router::{application_router, StatusUpdateRequest, SubmitApplicationRequest};
pub use service::{ApplicationService, ApplicationServiceError};
pub use status::ApplicationStatus;
