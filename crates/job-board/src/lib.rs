pub mod accounts;
pub mod applications;
pub mod clock;
pub mod config;
pub mod documents;
pub mod error;
pub mod notifications;
pub mod postings;
pub mod telemetry;
pub mod throttle;
