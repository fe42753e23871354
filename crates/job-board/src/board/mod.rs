//! Job board: postings owned by providers and the application workflow seekers drive
//! against them.
//!
//! Services are generic over [`BoardStore`] and take the acting party explicitly; the
//! router narrows the authenticated [`crate::identity::Caller`] to the capability each
//! operation needs.

pub mod applications;
pub mod domain;
pub mod error;
pub mod jobs;
pub mod memory;
pub mod repository;
pub mod router;
pub mod users;
pub mod views;

#[cfg(test)]
mod tests;

pub use applications::{ApplicationRequest, ApplicationWorkflow};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, Job, JobDetails, JobId, JobUpdate, User,
    UserId,
};
pub use error::{BoardError, ErrorKind};
pub use jobs::JobService;
pub use memory::InMemoryStore;
pub use repository::{
    ApplicationQuery, ApplicationRepository, ApplicationScope, BoardStore, JobQuery,
    JobRepository, RepositoryError, UserRepository,
};
pub use router::{board_router, BoardState};
pub use users::{AuthResponse, SignupRequest, UserDirectory};
pub use views::{ApplicationView, DashboardStats, JobView, UserView};
