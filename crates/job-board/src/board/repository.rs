use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Job, JobId, NewApplication, NewJob, NewUser,
    User, UserId,
};

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("status changed concurrently (now {found})")]
    StaleStatus { found: ApplicationStatus },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Predicate over job postings. Every listing of the catalogue goes through
/// [`JobQuery::matches`], including the active-only filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobQuery {
    pub owner: Option<UserId>,
    pub active_only: bool,
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
}

impl JobQuery {
    /// Publicly listed postings.
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Self::default()
        }
    }

    /// Everything a provider owns, listed or not.
    pub fn owned_by(owner: UserId) -> Self {
        Self {
            owner: Some(owner),
            ..Self::default()
        }
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_job_type(mut self, job_type: impl Into<String>) -> Self {
        self.job_type = Some(job_type.into());
        self
    }

    pub fn with_experience_level(mut self, level: impl Into<String>) -> Self {
        self.experience_level = Some(level.into());
        self
    }

    pub fn matches(&self, job: &Job) -> bool {
        if self.active_only && !job.is_listed() {
            return false;
        }
        if self.owner.is_some_and(|owner| !job.is_owned_by(owner)) {
            return false;
        }

        let details = &job.details;
        if let Some(keyword) = &self.keyword {
            let haystacks = [
                Some(details.title.as_str()),
                Some(details.description.as_str()),
                details.company.as_deref(),
                details.location.as_deref(),
            ];
            if !haystacks
                .into_iter()
                .flatten()
                .any(|field| contains_ignore_case(field, keyword))
            {
                return false;
            }
        }
        if let Some(location) = &self.location {
            match details.location.as_deref() {
                Some(value) if contains_ignore_case(value, location) => {}
                _ => return false,
            }
        }
        if let Some(job_type) = &self.job_type {
            if details.job_type.as_deref() != Some(job_type.as_str()) {
                return false;
            }
        }
        if let Some(level) = &self.experience_level {
            if details.experience_level.as_deref() != Some(level.as_str()) {
                return false;
            }
        }
        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Whose applications a query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationScope {
    /// Applications submitted by a seeker.
    Applicant(UserId),
    /// Applications against any job owned by a provider.
    JobOwner(UserId),
    /// Applications against a single job.
    Job(JobId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplicationQuery {
    pub scope: ApplicationScope,
    pub status: Option<ApplicationStatus>,
    pub limit: Option<usize>,
}

impl ApplicationQuery {
    pub fn new(scope: ApplicationScope) -> Self {
        Self {
            scope,
            status: None,
            limit: None,
        }
    }

    pub fn with_status(mut self, status: Option<ApplicationStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `job_owner` is the owner of the job the application targets.
    pub fn matches(&self, application: &Application, job_owner: UserId) -> bool {
        let in_scope = match self.scope {
            ApplicationScope::Applicant(user) => application.applicant == user,
            ApplicationScope::JobOwner(user) => job_owner == user,
            ApplicationScope::Job(job) => application.job == job,
        };
        in_scope && self.status.map_or(true, |status| application.status == status)
    }
}

/// Per-status counts and the newest applications of one scope, read together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationTally {
    pub by_status: BTreeMap<ApplicationStatus, u64>,
    /// Most recently applied first.
    pub recent: Vec<Application>,
}

impl ApplicationTally {
    pub fn count(&self, status: ApplicationStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.by_status.values().sum()
    }
}

pub trait UserRepository: Send + Sync {
    /// Fails with [`RepositoryError::Conflict`] when the email is taken.
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError>;
    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
}

pub trait JobRepository: Send + Sync {
    fn insert_job(&self, job: NewJob) -> Result<Job, RepositoryError>;
    fn save_job(&self, job: Job) -> Result<Job, RepositoryError>;
    fn fetch_job(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;
    /// Matching jobs, newest first.
    fn query_jobs(&self, query: &JobQuery) -> Result<Vec<Job>, RepositoryError>;
    fn count_jobs(&self, query: &JobQuery) -> Result<u64, RepositoryError>;
}

pub trait ApplicationRepository: Send + Sync {
    /// Fails with [`RepositoryError::Conflict`] when the applicant already applied to the job.
    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError>;
    /// Moves an application from `expected` to `next`, failing with
    /// [`RepositoryError::StaleStatus`] if the stored status is no longer `expected`.
    fn transition_application(
        &self,
        id: ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
        at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError>;
    fn fetch_application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn find_application(
        &self,
        job: JobId,
        applicant: UserId,
    ) -> Result<Option<Application>, RepositoryError>;
    /// Matching applications, most recently applied first.
    fn query_applications(
        &self,
        query: &ApplicationQuery,
    ) -> Result<Vec<Application>, RepositoryError>;
    fn count_applications(&self, query: &ApplicationQuery) -> Result<u64, RepositoryError>;
    /// Counts for every status in `scope` plus its `recent` newest applications, taken
    /// from one consistent view of the store.
    fn tally_applications(
        &self,
        scope: ApplicationScope,
        recent: usize,
    ) -> Result<ApplicationTally, RepositoryError>;
}

/// Everything the board services need from persistence.
pub trait BoardStore: UserRepository + JobRepository + ApplicationRepository {}

impl<T> BoardStore for T where T: UserRepository + JobRepository + ApplicationRepository {}
