use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{Job, JobDetails, JobId, JobUpdate, NewJob};
use super::error::BoardError;
use super::repository::{BoardStore, JobQuery};
use super::views::JobView;
use crate::identity::Provider;

const TITLE_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 2000;
const COMPANY_MAX: usize = 100;
const LOCATION_MAX: usize = 100;
const CATEGORY_MAX: usize = 50;

/// Job catalogue: provider-owned postings plus the public listings.
pub struct JobService<S> {
    store: Arc<S>,
}

impl<S> JobService<S>
where
    S: BoardStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create(&self, provider: Provider, details: JobDetails) -> Result<JobView, BoardError> {
        validate_details(&details)?;

        let job = self.store.insert_job(NewJob {
            owner: provider.id,
            details,
            created_at: Utc::now(),
        })?;
        info!(job_id = %job.id, owner = %provider.id, "job posted");
        self.view(job)
    }

    /// Replace every editable field of an owned posting.
    pub fn update(
        &self,
        provider: Provider,
        job_id: JobId,
        update: JobUpdate,
    ) -> Result<JobView, BoardError> {
        validate_details(&update.details)?;

        let mut job = self.owned_job(provider, job_id)?;
        job.details = update.details;
        if let Some(is_active) = update.is_active {
            job.is_active = is_active;
        }
        job.updated_at = Some(Utc::now());

        let saved = self.store.save_job(job)?;
        self.view(saved)
    }

    /// Soft delete: the posting stays in the owner's listings but leaves the public ones.
    pub fn delete(&self, provider: Provider, job_id: JobId) -> Result<(), BoardError> {
        let mut job = self.owned_job(provider, job_id)?;
        job.is_active = false;
        job.updated_at = Some(Utc::now());
        self.store.save_job(job)?;
        info!(job_id = %job_id, owner = %provider.id, "job deactivated");
        Ok(())
    }

    pub fn my_jobs(&self, provider: Provider) -> Result<Vec<JobView>, BoardError> {
        self.list(&JobQuery::owned_by(provider.id))
    }

    /// Number of the provider's postings that are still listed.
    pub fn my_jobs_count(&self, provider: Provider) -> Result<u64, BoardError> {
        let mut query = JobQuery::owned_by(provider.id);
        query.active_only = true;
        Ok(self.store.count_jobs(&query)?)
    }

    pub fn active(&self) -> Result<Vec<JobView>, BoardError> {
        self.list(&JobQuery::active())
    }

    /// Single public posting; soft-deleted postings are reported as inactive.
    pub fn get(&self, job_id: JobId) -> Result<JobView, BoardError> {
        let job = self
            .store
            .fetch_job(job_id)?
            .ok_or(BoardError::JobNotFound)?;
        if !job.is_listed() {
            return Err(BoardError::JobInactive);
        }
        self.view(job)
    }

    pub fn search(&self, keyword: &str) -> Result<Vec<JobView>, BoardError> {
        self.list(&JobQuery::active().with_keyword(keyword.trim()))
    }

    pub fn by_location(&self, location: &str) -> Result<Vec<JobView>, BoardError> {
        self.list(&JobQuery::active().with_location(location.trim()))
    }

    pub fn by_type(&self, job_type: &str) -> Result<Vec<JobView>, BoardError> {
        self.list(&JobQuery::active().with_job_type(job_type.trim()))
    }

    pub fn by_experience(&self, level: &str) -> Result<Vec<JobView>, BoardError> {
        self.list(&JobQuery::active().with_experience_level(level.trim()))
    }

    fn list(&self, query: &JobQuery) -> Result<Vec<JobView>, BoardError> {
        self.store
            .query_jobs(query)?
            .into_iter()
            .map(|job| self.view(job))
            .collect()
    }

    fn owned_job(&self, provider: Provider, job_id: JobId) -> Result<Job, BoardError> {
        let job = self
            .store
            .fetch_job(job_id)?
            .ok_or(BoardError::JobNotFound)?;
        if !job.is_owned_by(provider.id) {
            return Err(BoardError::NotJobOwner);
        }
        Ok(job)
    }

    fn view(&self, job: Job) -> Result<JobView, BoardError> {
        let owner = self.store.fetch_user(job.owner)?;
        Ok(JobView::new(job, owner.as_ref()))
    }
}

pub(crate) fn validate_details(details: &JobDetails) -> Result<(), BoardError> {
    require_text("Job title", &details.title, TITLE_MAX)?;
    require_text("Job description", &details.description, DESCRIPTION_MAX)?;
    limit_text("Company", details.company.as_deref(), COMPANY_MAX)?;
    limit_text("Location", details.location.as_deref(), LOCATION_MAX)?;
    limit_text("Job type", details.job_type.as_deref(), CATEGORY_MAX)?;
    limit_text(
        "Experience level",
        details.experience_level.as_deref(),
        CATEGORY_MAX,
    )?;

    if let Some(salary) = details.salary {
        if salary.is_zero() || !salary.is_sign_positive() {
            return Err(BoardError::invalid("Salary must be positive"));
        }
    }
    Ok(())
}

fn require_text(field: &str, value: &str, max: usize) -> Result<(), BoardError> {
    if value.trim().is_empty() {
        return Err(BoardError::invalid(format!("{field} is required")));
    }
    limit_text(field, Some(value), max)
}

pub(crate) fn limit_text(field: &str, value: Option<&str>, max: usize) -> Result<(), BoardError> {
    match value {
        Some(text) if text.chars().count() > max => Err(BoardError::invalid(format!(
            "{field} cannot exceed {max} characters"
        ))),
        _ => Ok(()),
    }
}
