use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::domain::{Application, ApplicationId, ApplicationStatus, Job, JobId, NewApplication};
use super::error::BoardError;
use super::jobs::limit_text;
use super::repository::{ApplicationQuery, ApplicationScope, BoardStore, RepositoryError};
use super::views::{ApplicationView, DashboardStats};
use crate::identity::{Caller, Provider, Seeker};

const COVER_LETTER_MAX: usize = 1000;
const RESUME_URL_MAX: usize = 255;
const RECENT_LIMIT: usize = 10;
const DASHBOARD_RECENT_LIMIT: usize = 5;

/// Body of a seeker's application request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRequest {
    pub job_id: JobId,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
}

impl ApplicationRequest {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            cover_letter: None,
            resume_url: None,
        }
    }

    pub fn with_cover_letter(mut self, cover_letter: impl Into<String>) -> Self {
        self.cover_letter = Some(cover_letter.into());
        self
    }

    pub fn with_resume_url(mut self, resume_url: impl Into<String>) -> Self {
        self.resume_url = Some(resume_url.into());
        self
    }
}

/// The only surface that creates applications or changes their status.
///
/// Every operation takes the acting party explicitly. Seeker-only and provider-only
/// operations accept the narrowed capability, so role checks happen once, where a
/// [`Caller`] is turned into a [`Seeker`] or [`Provider`].
pub struct ApplicationWorkflow<S> {
    store: Arc<S>,
}

impl<S> ApplicationWorkflow<S>
where
    S: BoardStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn submit(
        &self,
        seeker: Seeker,
        request: ApplicationRequest,
    ) -> Result<ApplicationView, BoardError> {
        limit_text(
            "Cover letter",
            request.cover_letter.as_deref(),
            COVER_LETTER_MAX,
        )?;
        limit_text("Resume URL", request.resume_url.as_deref(), RESUME_URL_MAX)?;

        let job = self
            .store
            .fetch_job(request.job_id)?
            .ok_or(BoardError::JobNotFound)?;
        if !job.is_listed() {
            return Err(BoardError::JobInactive);
        }
        if self.store.find_application(job.id, seeker.id)?.is_some() {
            return Err(BoardError::DuplicateApplication);
        }
        if job.is_owned_by(seeker.id) {
            return Err(BoardError::SelfApplicationForbidden);
        }

        // The pre-check above gives the friendly error; the store's uniqueness on
        // (job, applicant) is what holds under concurrent submissions.
        let application = self
            .store
            .insert_application(NewApplication {
                job: job.id,
                applicant: seeker.id,
                applied_at: Utc::now(),
                cover_letter: request.cover_letter,
                resume_url: request.resume_url,
            })
            .map_err(|err| match err {
                RepositoryError::Conflict => BoardError::DuplicateApplication,
                RepositoryError::NotFound => BoardError::JobNotFound,
                other => BoardError::from(other),
            })?;

        info!(
            application_id = %application.id,
            job_id = %job.id,
            applicant = %seeker.id,
            "application submitted"
        );
        self.view_with_job(application, Some(&job))
    }

    pub fn withdraw(
        &self,
        seeker: Seeker,
        application_id: ApplicationId,
    ) -> Result<ApplicationView, BoardError> {
        let application = self.application(application_id)?;
        if application.applicant != seeker.id {
            return Err(BoardError::NotOwner);
        }
        match application.status {
            ApplicationStatus::Withdrawn => return Err(BoardError::AlreadyWithdrawn),
            status if status.blocks_withdrawal() => return Err(BoardError::TerminalStatus(status)),
            _ => {}
        }

        let updated = self.store.transition_application(
            application_id,
            application.status,
            ApplicationStatus::Withdrawn,
            Utc::now(),
        )?;
        info!(
            application_id = %application_id,
            from = %application.status,
            "application withdrawn"
        );
        self.view_application(updated)
    }

    /// Provider adjudication. Any non-withdrawn status may move to any other
    /// non-withdrawn status; `WITHDRAWN` is never a valid target here.
    pub fn update_status(
        &self,
        provider: Provider,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationView, BoardError> {
        reject_withdrawal_target(status)?;

        let application = self.application(application_id)?;
        let job = self.store.fetch_job(application.job)?;
        if !job.as_ref().is_some_and(|job| job.is_owned_by(provider.id)) {
            return Err(BoardError::NotJobOwner);
        }
        if application.status == ApplicationStatus::Withdrawn {
            return Err(BoardError::WithdrawnImmutable);
        }

        let updated = self.store.transition_application(
            application_id,
            application.status,
            status,
            Utc::now(),
        )?;
        info!(
            application_id = %application_id,
            from = %application.status,
            to = %status,
            "application status updated"
        );
        self.view_with_job(updated, job.as_ref())
    }

    /// [`Self::update_status`] for a caller whose role has not been narrowed yet. A
    /// `WITHDRAWN` target is refused before the role check.
    pub fn update_status_as(
        &self,
        caller: Caller,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationView, BoardError> {
        reject_withdrawal_target(status)?;
        self.update_status(caller.provider()?, application_id, status)
    }

    /// Visible to the applicant and to the owner of the job applied to.
    pub fn view(
        &self,
        caller: Caller,
        application_id: ApplicationId,
    ) -> Result<ApplicationView, BoardError> {
        let application = self.application(application_id)?;
        let job = self.store.fetch_job(application.job)?;

        let is_applicant = application.applicant == caller.id();
        let is_job_owner = job.as_ref().is_some_and(|job| job.is_owned_by(caller.id()));
        if !is_applicant && !is_job_owner {
            debug!(application_id = %application_id, caller = %caller.id(), "view refused");
            return Err(BoardError::Forbidden);
        }
        self.view_with_job(application, job.as_ref())
    }

    /// Seekers see their own applications, providers see applications across every job
    /// they own. Most recently applied first.
    pub fn list_mine(
        &self,
        caller: Caller,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationView>, BoardError> {
        self.list(&mine(caller).with_status(status))
    }

    /// Always equal to the length of [`Self::list_mine`] under the same filter.
    pub fn count(
        &self,
        caller: Caller,
        status: Option<ApplicationStatus>,
    ) -> Result<u64, BoardError> {
        Ok(self
            .store
            .count_applications(&mine(caller).with_status(status))?)
    }

    pub fn recent(&self, caller: Caller) -> Result<Vec<ApplicationView>, BoardError> {
        self.list(&mine(caller).limit(RECENT_LIMIT))
    }

    /// Providers never apply, and unknown jobs have no applications.
    pub fn has_applied(&self, caller: Caller, job_id: JobId) -> Result<bool, BoardError> {
        match caller {
            Caller::Seeker(seeker) => Ok(self.store.find_application(job_id, seeker.id)?.is_some()),
            Caller::Provider(_) => Ok(false),
        }
    }

    pub fn list_for_job(
        &self,
        provider: Provider,
        job_id: JobId,
    ) -> Result<Vec<ApplicationView>, BoardError> {
        let job = self.owned_job(provider, job_id)?;
        let query = ApplicationQuery::new(ApplicationScope::Job(job.id));
        self.store
            .query_applications(&query)?
            .into_iter()
            .map(|application| self.view_with_job(application, Some(&job)))
            .collect()
    }

    pub fn count_for_job(&self, provider: Provider, job_id: JobId) -> Result<u64, BoardError> {
        let job = self.owned_job(provider, job_id)?;
        let query = ApplicationQuery::new(ApplicationScope::Job(job.id));
        Ok(self.store.count_applications(&query)?)
    }

    /// Counts and the recent prefix come from a single store snapshot, so the per-status
    /// counts always add up to the total.
    pub fn dashboard(&self, caller: Caller) -> Result<DashboardStats, BoardError> {
        let tally = self
            .store
            .tally_applications(mine(caller).scope, DASHBOARD_RECENT_LIMIT)?;
        let applications_by_status = ApplicationStatus::ordered()
            .into_iter()
            .map(|status| (status.label().to_lowercase(), tally.count(status)))
            .collect();

        Ok(DashboardStats {
            total_applications: tally.total(),
            applications_by_status,
            recent_applications: self.views(tally.recent)?,
        })
    }

    fn application(&self, application_id: ApplicationId) -> Result<Application, BoardError> {
        self.store
            .fetch_application(application_id)?
            .ok_or(BoardError::ApplicationNotFound)
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

    fn list(&self, query: &ApplicationQuery) -> Result<Vec<ApplicationView>, BoardError> {
        self.views(self.store.query_applications(query)?)
    }

    fn views(&self, applications: Vec<Application>) -> Result<Vec<ApplicationView>, BoardError> {
        let mut jobs: BTreeMap<JobId, Option<Job>> = BTreeMap::new();
        let mut views = Vec::with_capacity(applications.len());
        for application in applications {
            let job = match jobs.get(&application.job) {
                Some(job) => job.clone(),
                None => {
                    let job = self.store.fetch_job(application.job)?;
                    jobs.insert(application.job, job.clone());
                    job
                }
            };
            views.push(self.view_with_job(application, job.as_ref())?);
        }
        Ok(views)
    }

    fn view_application(&self, application: Application) -> Result<ApplicationView, BoardError> {
        let job = self.store.fetch_job(application.job)?;
        self.view_with_job(application, job.as_ref())
    }

    fn view_with_job(
        &self,
        application: Application,
        job: Option<&Job>,
    ) -> Result<ApplicationView, BoardError> {
        let applicant = self.store.fetch_user(application.applicant)?;
        Ok(ApplicationView::new(application, job, applicant.as_ref()))
    }
}

fn mine(caller: Caller) -> ApplicationQuery {
    let scope = match caller {
        Caller::Seeker(seeker) => ApplicationScope::Applicant(seeker.id),
        Caller::Provider(provider) => ApplicationScope::JobOwner(provider.id),
    };
    ApplicationQuery::new(scope)
}

fn reject_withdrawal_target(status: ApplicationStatus) -> Result<(), BoardError> {
    if status == ApplicationStatus::Withdrawn {
        return Err(BoardError::SeekerOnlyTransition);
    }
    Ok(())
}
