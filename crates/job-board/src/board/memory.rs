//! Mutex-guarded in-memory tables implementing every repository trait.
//!
//! Each trait method takes the lock once, so a single call is the unit of work: the
//! (job, applicant) uniqueness check and the insert, or the status compare and the write,
//! can never interleave with another request.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Job, JobId, NewApplication, NewJob, NewUser,
    User, UserId,
};
use super::repository::{
    ApplicationQuery, ApplicationRepository, ApplicationScope, ApplicationTally, JobQuery,
    JobRepository, RepositoryError, UserRepository,
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    jobs: BTreeMap<JobId, Job>,
    applications: BTreeMap<ApplicationId, Application>,
    user_sequence: u64,
    job_sequence: u64,
    application_sequence: u64,
}

impl Tables {
    fn job_owner(&self, job: JobId) -> Option<UserId> {
        self.jobs.get(&job).map(|job| job.owner)
    }

    fn matching_applications<'a>(
        &'a self,
        query: &'a ApplicationQuery,
    ) -> impl Iterator<Item = &'a Application> + 'a {
        self.applications.values().filter(move |application| {
            self.job_owner(application.job)
                .is_some_and(|owner| query.matches(application, owner))
        })
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl UserRepository for InMemoryStore {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|existing| existing.email == user.email) {
            return Err(RepositoryError::Conflict);
        }

        tables.user_sequence += 1;
        let record = User {
            id: UserId(tables.user_sequence),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            created_at: user.created_at,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }
}

impl JobRepository for InMemoryStore {
    fn insert_job(&self, job: NewJob) -> Result<Job, RepositoryError> {
        let mut tables = self.lock()?;
        tables.job_sequence += 1;
        let record = Job {
            id: JobId(tables.job_sequence),
            owner: job.owner,
            details: job.details,
            is_active: true,
            created_at: job.created_at,
            updated_at: None,
        };
        tables.jobs.insert(record.id, record.clone());
        Ok(record)
    }

    fn save_job(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut tables = self.lock()?;
        let slot = tables.jobs.get_mut(&job.id).ok_or(RepositoryError::NotFound)?;
        if slot.owner != job.owner {
            return Err(RepositoryError::Conflict);
        }
        *slot = job.clone();
        Ok(job)
    }

    fn fetch_job(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.lock()?.jobs.get(&id).cloned())
    }

    fn query_jobs(&self, query: &JobQuery) -> Result<Vec<Job>, RepositoryError> {
        let tables = self.lock()?;
        let mut jobs: Vec<Job> = tables
            .jobs
            .values()
            .filter(|job| query.matches(job))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(jobs)
    }

    fn count_jobs(&self, query: &JobQuery) -> Result<u64, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables.jobs.values().filter(|job| query.matches(job)).count() as u64)
    }
}

impl ApplicationRepository for InMemoryStore {
    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        let mut tables = self.lock()?;
        if !tables.jobs.contains_key(&application.job) {
            return Err(RepositoryError::NotFound);
        }
        if tables.applications.values().any(|existing| {
            existing.job == application.job && existing.applicant == application.applicant
        }) {
            return Err(RepositoryError::Conflict);
        }

        tables.application_sequence += 1;
        let record = Application {
            id: ApplicationId(tables.application_sequence),
            job: application.job,
            applicant: application.applicant,
            status: ApplicationStatus::Applied,
            applied_at: application.applied_at,
            updated_at: None,
            cover_letter: application.cover_letter,
            resume_url: application.resume_url,
        };
        tables.applications.insert(record.id, record.clone());
        Ok(record)
    }

    fn transition_application(
        &self,
        id: ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
        at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError> {
        let mut tables = self.lock()?;
        let record = tables
            .applications
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        if record.status != expected {
            return Err(RepositoryError::StaleStatus {
                found: record.status,
            });
        }
        record.status = next;
        record.updated_at = Some(at);
        Ok(record.clone())
    }

    fn fetch_application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock()?.applications.get(&id).cloned())
    }

    fn find_application(
        &self,
        job: JobId,
        applicant: UserId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .find(|application| application.job == job && application.applicant == applicant)
            .cloned())
    }

    fn query_applications(
        &self,
        query: &ApplicationQuery,
    ) -> Result<Vec<Application>, RepositoryError> {
        let tables = self.lock()?;
        let mut applications: Vec<&Application> = tables.matching_applications(query).collect();
        applications.sort_by(|a, b| newest_first(a, b));
        if let Some(limit) = query.limit {
            applications.truncate(limit);
        }
        Ok(applications.into_iter().cloned().collect())
    }

    fn count_applications(&self, query: &ApplicationQuery) -> Result<u64, RepositoryError> {
        let tables = self.lock()?;
        let total = tables.matching_applications(query).count();
        let total = query.limit.map_or(total, |limit| total.min(limit));
        Ok(total as u64)
    }

    fn tally_applications(
        &self,
        scope: ApplicationScope,
        recent: usize,
    ) -> Result<ApplicationTally, RepositoryError> {
        let tables = self.lock()?;
        let query = ApplicationQuery::new(scope);
        let mut by_status = BTreeMap::new();
        let mut matching = Vec::new();
        for application in tables.matching_applications(&query) {
            *by_status.entry(application.status).or_insert(0) += 1;
            matching.push(application);
        }
        matching.sort_by(|a, b| newest_first(a, b));
        matching.truncate(recent);

        Ok(ApplicationTally {
            by_status,
            recent: matching.into_iter().cloned().collect(),
        })
    }
}

fn newest_first(a: &Application, b: &Application) -> std::cmp::Ordering {
    b.applied_at.cmp(&a.applied_at).then(b.id.cmp(&a.id))
}
