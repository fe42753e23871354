use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::board::domain::{
    Application, ApplicationId, ApplicationStatus, Job, JobDetails, JobId, NewApplication, NewJob,
    NewUser, User, UserId,
};
use crate::board::memory::InMemoryStore;
use crate::board::repository::{
    ApplicationQuery, ApplicationRepository, ApplicationScope, ApplicationTally, JobQuery,
    JobRepository, RepositoryError, UserRepository,
};
use crate::board::router::{board_router, BoardState};
use crate::board::{ApplicationWorkflow, JobService, UserDirectory};
use crate::identity::{Caller, Provider, Role, Seeker, TokenKeys};

pub(super) fn token_keys() -> Arc<TokenKeys> {
    Arc::new(TokenKeys::from_secret(
        b"board-test-secret",
        Duration::minutes(30),
    ))
}

pub(super) struct Fixture<S = InMemoryStore> {
    pub(super) store: Arc<S>,
    pub(super) jobs: JobService<S>,
    pub(super) workflow: ApplicationWorkflow<S>,
    pub(super) users: UserDirectory<S>,
}

pub(super) fn fixture() -> Fixture {
    fixture_with(InMemoryStore::new())
}

/// Services over a clone of `store`; clones share the same tables.
pub(super) fn fixture_with_shared(store: Arc<InMemoryStore>) -> Fixture {
    fixture_with(store.as_ref().clone())
}

pub(super) fn fixture_with<S>(store: S) -> Fixture<S>
where
    S: crate::board::BoardStore + 'static,
{
    let store = Arc::new(store);
    Fixture {
        jobs: JobService::new(store.clone()),
        workflow: ApplicationWorkflow::new(store.clone()),
        users: UserDirectory::new(store.clone(), token_keys()),
        store,
    }
}

pub(super) fn account<S: UserRepository>(store: &S, email: &str, role: Role) -> User {
    store
        .insert_user(NewUser {
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: email.split('@').next().unwrap_or_default().to_string(),
            role,
            created_at: Utc::now(),
        })
        .expect("user inserted")
}

pub(super) fn provider<S: UserRepository>(store: &S, email: &str) -> Provider {
    Provider {
        id: account(store, email, Role::JobProvider).id,
    }
}

pub(super) fn seeker<S: UserRepository>(store: &S, email: &str) -> Seeker {
    Seeker {
        id: account(store, email, Role::JobSeeker).id,
    }
}

pub(super) fn details(title: &str) -> JobDetails {
    JobDetails {
        title: title.to_string(),
        description: format!("{title} working on the hiring platform"),
        company: Some("Acme".to_string()),
        location: Some("Berlin, Germany".to_string()),
        salary: Some(Decimal::new(85_000, 0)),
        job_type: Some("FULL_TIME".to_string()),
        experience_level: Some("SENIOR".to_string()),
    }
}

pub(super) fn post_job<S>(fixture: &Fixture<S>, owner: Provider, title: &str) -> JobId
where
    S: crate::board::BoardStore + 'static,
{
    fixture
        .jobs
        .create(owner, details(title))
        .expect("job created")
        .id
}

pub(super) fn caller(capability: impl Into<Caller>) -> Caller {
    capability.into()
}

pub(super) fn router_with_store(store: InMemoryStore) -> (axum::Router, Arc<InMemoryStore>) {
    let store = Arc::new(store);
    let router = board_router(BoardState::new(store.clone(), token_keys()));
    (router, store)
}

pub(super) fn bearer(caller: Caller) -> String {
    bearer_for(caller.id(), caller.role())
}

/// Signed token for any subject and role, whether or not such an account exists.
pub(super) fn bearer_for(id: UserId, role: Role) -> String {
    let token = token_keys()
        .issue(id, role, Utc::now())
        .expect("token issued");
    format!("Bearer {token}")
}

pub(super) fn json_request(method: &str, uri: &str, auth: Option<String>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("json body")))
        .expect("request builds")
}

pub(super) fn get_request(uri: &str, auth: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Every call fails as if the backing database were down.
pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl UserRepository for UnavailableStore {
    fn insert_user(&self, _user: NewUser) -> Result<User, RepositoryError> {
        offline()
    }

    fn fetch_user(&self, _id: UserId) -> Result<Option<User>, RepositoryError> {
        offline()
    }

    fn find_user_by_email(&self, _email: &str) -> Result<Option<User>, RepositoryError> {
        offline()
    }
}

impl JobRepository for UnavailableStore {
    fn insert_job(&self, _job: NewJob) -> Result<Job, RepositoryError> {
        offline()
    }

    fn save_job(&self, _job: Job) -> Result<Job, RepositoryError> {
        offline()
    }

    fn fetch_job(&self, _id: JobId) -> Result<Option<Job>, RepositoryError> {
        offline()
    }

    fn query_jobs(&self, _query: &JobQuery) -> Result<Vec<Job>, RepositoryError> {
        offline()
    }

    fn count_jobs(&self, _query: &JobQuery) -> Result<u64, RepositoryError> {
        offline()
    }
}

impl ApplicationRepository for UnavailableStore {
    fn insert_application(
        &self,
        _application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        offline()
    }

    fn transition_application(
        &self,
        _id: ApplicationId,
        _expected: ApplicationStatus,
        _next: ApplicationStatus,
        _at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError> {
        offline()
    }

    fn fetch_application(&self, _id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        offline()
    }

    fn find_application(
        &self,
        _job: JobId,
        _applicant: UserId,
    ) -> Result<Option<Application>, RepositoryError> {
        offline()
    }

    fn query_applications(
        &self,
        _query: &ApplicationQuery,
    ) -> Result<Vec<Application>, RepositoryError> {
        offline()
    }

    fn count_applications(&self, _query: &ApplicationQuery) -> Result<u64, RepositoryError> {
        offline()
    }

    fn tally_applications(
        &self,
        _scope: ApplicationScope,
        _recent: usize,
    ) -> Result<ApplicationTally, RepositoryError> {
        offline()
    }
}

/// Delegates to an in-memory store, but lets the applicant withdraw just before any
/// status change lands, so the compare-and-set observes a stale status.
#[derive(Default)]
pub(super) struct WithdrawingStore {
    pub(super) inner: InMemoryStore,
}

impl UserRepository for WithdrawingStore {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        self.inner.insert_user(user)
    }

    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.inner.fetch_user(id)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.inner.find_user_by_email(email)
    }
}

impl JobRepository for WithdrawingStore {
    fn insert_job(&self, job: NewJob) -> Result<Job, RepositoryError> {
        self.inner.insert_job(job)
    }

    fn save_job(&self, job: Job) -> Result<Job, RepositoryError> {
        self.inner.save_job(job)
    }

    fn fetch_job(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        self.inner.fetch_job(id)
    }

    fn query_jobs(&self, query: &JobQuery) -> Result<Vec<Job>, RepositoryError> {
        self.inner.query_jobs(query)
    }

    fn count_jobs(&self, query: &JobQuery) -> Result<u64, RepositoryError> {
        self.inner.count_jobs(query)
    }
}

impl ApplicationRepository for WithdrawingStore {
    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        self.inner.insert_application(application)
    }

    fn transition_application(
        &self,
        id: ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
        at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError> {
        self.inner
            .transition_application(id, expected, ApplicationStatus::Withdrawn, at)?;
        self.inner.transition_application(id, expected, next, at)
    }

    fn fetch_application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch_application(id)
    }

    fn find_application(
        &self,
        job: JobId,
        applicant: UserId,
    ) -> Result<Option<Application>, RepositoryError> {
        self.inner.find_application(job, applicant)
    }

    fn query_applications(
        &self,
        query: &ApplicationQuery,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.query_applications(query)
    }

    fn count_applications(&self, query: &ApplicationQuery) -> Result<u64, RepositoryError> {
        self.inner.count_applications(query)
    }

    fn tally_applications(
        &self,
        scope: ApplicationScope,
        recent: usize,
    ) -> Result<ApplicationTally, RepositoryError> {
        self.inner.tally_applications(scope, recent)
    }
}

/// Delegates to an in-memory store but never reports an existing application, as if a
/// second submission slipped in between the duplicate check and the insert.
#[derive(Default)]
pub(super) struct RacingSubmitStore {
    pub(super) inner: InMemoryStore,
}

impl UserRepository for RacingSubmitStore {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        self.inner.insert_user(user)
    }

    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.inner.fetch_user(id)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.inner.find_user_by_email(email)
    }
}

impl JobRepository for RacingSubmitStore {
    fn insert_job(&self, job: NewJob) -> Result<Job, RepositoryError> {
        self.inner.insert_job(job)
    }

    fn save_job(&self, job: Job) -> Result<Job, RepositoryError> {
        self.inner.save_job(job)
    }

    fn fetch_job(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        self.inner.fetch_job(id)
    }

    fn query_jobs(&self, query: &JobQuery) -> Result<Vec<Job>, RepositoryError> {
        self.inner.query_jobs(query)
    }

    fn count_jobs(&self, query: &JobQuery) -> Result<u64, RepositoryError> {
        self.inner.count_jobs(query)
    }
}

impl ApplicationRepository for RacingSubmitStore {
    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        self.inner.insert_application(application)
    }

    fn transition_application(
        &self,
        id: ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
        at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError> {
        self.inner.transition_application(id, expected, next, at)
    }

    fn fetch_application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch_application(id)
    }

    fn find_application(
        &self,
        _job: JobId,
        _applicant: UserId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(None)
    }

    fn query_applications(
        &self,
        query: &ApplicationQuery,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.query_applications(query)
    }

    fn count_applications(&self, query: &ApplicationQuery) -> Result<u64, RepositoryError> {
        self.inner.count_applications(query)
    }

    fn tally_applications(
        &self,
        scope: ApplicationScope,
        recent: usize,
    ) -> Result<ApplicationTally, RepositoryError> {
        self.inner.tally_applications(scope, recent)
    }
}
