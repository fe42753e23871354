use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequest, FromRequestParts, Path, Query, Request, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::applications::{ApplicationRequest, ApplicationWorkflow};
use super::domain::{ApplicationId, ApplicationStatus, JobDetails, JobId, JobUpdate};
use super::error::BoardError;
use super::jobs::JobService;
use super::repository::BoardStore;
use super::users::{SignupRequest, UserDirectory};
use crate::identity::{AccountLookup, Caller, TokenKeys};

/// Shared handles for every board endpoint.
pub struct BoardState<S> {
    pub jobs: Arc<JobService<S>>,
    pub applications: Arc<ApplicationWorkflow<S>>,
    pub users: Arc<UserDirectory<S>>,
    pub keys: Arc<TokenKeys>,
}

impl<S> BoardState<S>
where
    S: BoardStore + 'static,
{
    pub fn new(store: Arc<S>, keys: Arc<TokenKeys>) -> Self {
        Self {
            jobs: Arc::new(JobService::new(store.clone())),
            applications: Arc::new(ApplicationWorkflow::new(store.clone())),
            users: Arc::new(UserDirectory::new(store, keys.clone())),
            keys,
        }
    }
}

impl<S> Clone for BoardState<S> {
    fn clone(&self) -> Self {
        Self {
            jobs: self.jobs.clone(),
            applications: self.applications.clone(),
            users: self.users.clone(),
            keys: self.keys.clone(),
        }
    }
}

impl<S> FromRef<BoardState<S>> for Arc<TokenKeys> {
    fn from_ref(state: &BoardState<S>) -> Self {
        state.keys.clone()
    }
}

impl<S> FromRef<BoardState<S>> for Arc<dyn AccountLookup>
where
    S: BoardStore + 'static,
{
    fn from_ref(state: &BoardState<S>) -> Self {
        state.users.clone()
    }
}

/// Router builder exposing the auth, job, seeker and provider endpoints.
///
/// Every `/api/job-seeker` route admits only seekers and every `/api/provider` route
/// admits only providers; the other role gets `WrongRole`.
pub fn board_router<S>(state: BoardState<S>) -> Router
where
    S: BoardStore + 'static,
{
    Router::new()
        .route("/api/auth/signup", post(signup::<S>))
        .route("/api/auth/me", get(me::<S>))
        .route("/api/jobs/create", post(create_job::<S>))
        .route("/api/jobs/my-jobs", get(my_jobs::<S>))
        .route("/api/jobs/my-jobs/count", get(my_jobs_count::<S>))
        .route(
            "/api/jobs/:job_id",
            put(update_job::<S>).delete(delete_job::<S>),
        )
        .route("/api/jobs/public/all", get(active_jobs::<S>))
        .route("/api/jobs/public/search", get(search_jobs::<S>))
        .route("/api/jobs/public/location", get(jobs_by_location::<S>))
        .route("/api/jobs/public/type", get(jobs_by_type::<S>))
        .route("/api/jobs/public/experience", get(jobs_by_experience::<S>))
        .route("/api/jobs/public/:job_id", get(public_job::<S>))
        .route("/api/job-seeker/apply", post(apply::<S>))
        .route(
            "/api/job-seeker/applications",
            get(list_mine::<S, SeekerRoutes>),
        )
        .route(
            "/api/job-seeker/applications/status/:status",
            get(list_mine_by_status::<S, SeekerRoutes>),
        )
        .route(
            "/api/job-seeker/applications/count",
            get(count_mine::<S, SeekerRoutes>),
        )
        .route(
            "/api/job-seeker/applications/count/:status",
            get(count_mine_by_status::<S, SeekerRoutes>),
        )
        .route(
            "/api/job-seeker/applications/recent",
            get(recent::<S, SeekerRoutes>),
        )
        .route(
            "/api/job-seeker/applications/:application_id",
            get(view_application::<S, SeekerRoutes>),
        )
        .route(
            "/api/job-seeker/applications/:application_id/withdraw",
            put(withdraw::<S>),
        )
        .route("/api/job-seeker/jobs/:job_id/applied", get(has_applied::<S>))
        .route(
            "/api/job-seeker/dashboard/stats",
            get(dashboard::<S, SeekerRoutes>),
        )
        .route(
            "/api/provider/applications",
            get(list_mine::<S, ProviderRoutes>),
        )
        .route(
            "/api/provider/applications/status/:status",
            get(list_mine_by_status::<S, ProviderRoutes>),
        )
        .route(
            "/api/provider/applications/count",
            get(count_mine::<S, ProviderRoutes>),
        )
        .route(
            "/api/provider/applications/count/:status",
            get(count_mine_by_status::<S, ProviderRoutes>),
        )
        .route(
            "/api/provider/applications/recent",
            get(recent::<S, ProviderRoutes>),
        )
        .route(
            "/api/provider/applications/:application_id",
            get(view_application::<S, ProviderRoutes>),
        )
        .route(
            "/api/provider/applications/:application_id/status",
            put(update_status::<S>),
        )
        .route(
            "/api/provider/jobs/:job_id/applications",
            get(job_applications::<S>),
        )
        .route(
            "/api/provider/jobs/:job_id/applications/count",
            get(job_applications_count::<S>),
        )
        .route(
            "/api/provider/dashboard/stats",
            get(dashboard::<S, ProviderRoutes>),
        )
        .with_state(state)
}

/// The role a group of routes is reserved for.
trait Audience: Send + Sync + 'static {
    fn admit(caller: Caller) -> Result<Caller, BoardError>;
}

struct SeekerRoutes;

impl Audience for SeekerRoutes {
    fn admit(caller: Caller) -> Result<Caller, BoardError> {
        Ok(caller.seeker()?.into())
    }
}

struct ProviderRoutes;

impl Audience for ProviderRoutes {
    fn admit(caller: Caller) -> Result<Caller, BoardError> {
        Ok(caller.provider()?.into())
    }
}

/// [`Json`] whose rejections are reported as [`BoardError::Invalid`].
pub(crate) struct JsonBody<T>(pub(crate) T);

#[axum::async_trait]
impl<T, St> FromRequest<St> for JsonBody<T>
where
    T: DeserializeOwned,
    St: Send + Sync,
{
    type Rejection = BoardError;

    async fn from_request(request: Request, state: &St) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(request, state)
            .await
            .map(|Json(value)| JsonBody(value))
            .map_err(|rejection| BoardError::invalid(rejection.body_text()))
    }
}

/// [`Query`] whose rejections are reported as [`BoardError::Invalid`].
pub(crate) struct QueryParams<T>(pub(crate) T);

#[axum::async_trait]
impl<T, St> FromRequestParts<St> for QueryParams<T>
where
    T: DeserializeOwned,
    St: Send + Sync,
{
    type Rejection = BoardError;

    async fn from_request_parts(parts: &mut Parts, state: &St) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| QueryParams(value))
            .map_err(|rejection| BoardError::invalid(rejection.body_text()))
    }
}

/// [`Path`] whose rejections are reported as [`BoardError::Invalid`].
pub(crate) struct PathParam<T>(pub(crate) T);

#[axum::async_trait]
impl<T, St> FromRequestParts<St> for PathParam<T>
where
    T: DeserializeOwned + Send,
    St: Send + Sync,
{
    type Rejection = BoardError;

    async fn from_request_parts(parts: &mut Parts, state: &St) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| PathParam(value))
            .map_err(|rejection| BoardError::invalid(rejection.body_text()))
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusFilter {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KeywordQuery {
    keyword: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocationQuery {
    location: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobTypeQuery {
    job_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExperienceQuery {
    experience_level: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChange {
    status: String,
}

fn parse_status(raw: &str) -> Result<ApplicationStatus, BoardError> {
    raw.parse::<ApplicationStatus>()
        .map_err(|err| BoardError::invalid(err.to_string()))
}

fn optional_status(filter: StatusFilter) -> Result<Option<ApplicationStatus>, BoardError> {
    filter
        .status
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .map(parse_status)
        .transpose()
}

async fn signup<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    JsonBody(request): JsonBody<SignupRequest>,
) -> Result<Response, BoardError> {
    let response = state.users.register(request)?;
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

async fn me<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    caller: Caller,
) -> Result<Response, BoardError> {
    Ok(Json(state.users.me(caller)?).into_response())
}

async fn create_job<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    caller: Caller,
    JsonBody(details): JsonBody<JobDetails>,
) -> Result<Response, BoardError> {
    let view = state.jobs.create(caller.provider()?, details)?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

async fn update_job<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    caller: Caller,
    PathParam(job_id): PathParam<JobId>,
    JsonBody(update): JsonBody<JobUpdate>,
) -> Result<Response, BoardError> {
    let view = state.jobs.update(caller.provider()?, job_id, update)?;
    Ok(Json(view).into_response())
}

async fn delete_job<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    caller: Caller,
    PathParam(job_id): PathParam<JobId>,
) -> Result<Response, BoardError> {
    state.jobs.delete(caller.provider()?, job_id)?;
    Ok(Json(json!({ "message": "Job deleted successfully" })).into_response())
}

async fn my_jobs<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    caller: Caller,
) -> Result<Response, BoardError> {
    Ok(Json(state.jobs.my_jobs(caller.provider()?)?).into_response())
}

async fn my_jobs_count<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    caller: Caller,
) -> Result<Response, BoardError> {
    let count = state.jobs.my_jobs_count(caller.provider()?)?;
    Ok(Json(json!({ "count": count })).into_response())
}

async fn active_jobs<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
) -> Result<Response, BoardError> {
    Ok(Json(state.jobs.active()?).into_response())
}

async fn search_jobs<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    QueryParams(query): QueryParams<KeywordQuery>,
) -> Result<Response, BoardError> {
    Ok(Json(state.jobs.search(&query.keyword)?).into_response())
}

async fn jobs_by_location<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    QueryParams(query): QueryParams<LocationQuery>,
) -> Result<Response, BoardError> {
    Ok(Json(state.jobs.by_location(&query.location)?).into_response())
}

async fn jobs_by_type<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    QueryParams(query): QueryParams<JobTypeQuery>,
) -> Result<Response, BoardError> {
    Ok(Json(state.jobs.by_type(&query.job_type)?).into_response())
}

async fn jobs_by_experience<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    QueryParams(query): QueryParams<ExperienceQuery>,
) -> Result<Response, BoardError> {
    Ok(Json(state.jobs.by_experience(&query.experience_level)?).into_response())
}

async fn public_job<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    PathParam(job_id): PathParam<JobId>,
) -> Result<Response, BoardError> {
    Ok(Json(state.jobs.get(job_id)?).into_response())
}

async fn apply<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    caller: Caller,
    JsonBody(request): JsonBody<ApplicationRequest>,
) -> Result<Response, BoardError> {
    let view = state.applications.submit(caller.seeker()?, request)?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

async fn list_mine<S: BoardStore + 'static, A: Audience>(
    State(state): State<BoardState<S>>,
    caller: Caller,
    QueryParams(filter): QueryParams<StatusFilter>,
) -> Result<Response, BoardError> {
    let caller = A::admit(caller)?;
    let status = optional_status(filter)?;
    Ok(Json(state.applications.list_mine(caller, status)?).into_response())
}

async fn list_mine_by_status<S: BoardStore + 'static, A: Audience>(
    State(state): State<BoardState<S>>,
    caller: Caller,
    PathParam(status): PathParam<String>,
) -> Result<Response, BoardError> {
    let caller = A::admit(caller)?;
    let status = parse_status(&status)?;
    Ok(Json(state.applications.list_mine(caller, Some(status))?).into_response())
}

async fn count_mine<S: BoardStore + 'static, A: Audience>(
    State(state): State<BoardState<S>>,
    caller: Caller,
    QueryParams(filter): QueryParams<StatusFilter>,
) -> Result<Response, BoardError> {
    let caller = A::admit(caller)?;
    let status = optional_status(filter)?;
    let count = state.applications.count(caller, status)?;
    Ok(Json(json!({ "count": count })).into_response())
}

async fn count_mine_by_status<S: BoardStore + 'static, A: Audience>(
    State(state): State<BoardState<S>>,
    caller: Caller,
    PathParam(status): PathParam<String>,
) -> Result<Response, BoardError> {
    let caller = A::admit(caller)?;
    let status = parse_status(&status)?;
    let count = state.applications.count(caller, Some(status))?;
    Ok(Json(json!({ "count": count, "status": status })).into_response())
}

async fn recent<S: BoardStore + 'static, A: Audience>(
    State(state): State<BoardState<S>>,
    caller: Caller,
) -> Result<Response, BoardError> {
    let caller = A::admit(caller)?;
    Ok(Json(state.applications.recent(caller)?).into_response())
}

async fn view_application<S: BoardStore + 'static, A: Audience>(
    State(state): State<BoardState<S>>,
    caller: Caller,
    PathParam(application_id): PathParam<ApplicationId>,
) -> Result<Response, BoardError> {
    let caller = A::admit(caller)?;
    Ok(Json(state.applications.view(caller, application_id)?).into_response())
}

async fn withdraw<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    caller: Caller,
    PathParam(application_id): PathParam<ApplicationId>,
) -> Result<Response, BoardError> {
    let view = state
        .applications
        .withdraw(caller.seeker()?, application_id)?;
    Ok(Json(view).into_response())
}

async fn update_status<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    caller: Caller,
    PathParam(application_id): PathParam<ApplicationId>,
    JsonBody(change): JsonBody<StatusChange>,
) -> Result<Response, BoardError> {
    let status = parse_status(&change.status)?;
    let view = state
        .applications
        .update_status_as(caller, application_id, status)?;
    Ok(Json(view).into_response())
}

async fn has_applied<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    caller: Caller,
    PathParam(job_id): PathParam<JobId>,
) -> Result<Response, BoardError> {
    let seeker = caller.seeker()?;
    let applied = state.applications.has_applied(seeker.into(), job_id)?;
    Ok(Json(json!({ "hasApplied": applied })).into_response())
}

async fn dashboard<S: BoardStore + 'static, A: Audience>(
    State(state): State<BoardState<S>>,
    caller: Caller,
) -> Result<Response, BoardError> {
    let caller = A::admit(caller)?;
    Ok(Json(state.applications.dashboard(caller)?).into_response())
}

async fn job_applications<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    caller: Caller,
    PathParam(job_id): PathParam<JobId>,
) -> Result<Response, BoardError> {
    let views = state
        .applications
        .list_for_job(caller.provider()?, job_id)?;
    Ok(Json(views).into_response())
}

async fn job_applications_count<S: BoardStore + 'static>(
    State(state): State<BoardState<S>>,
    caller: Caller,
    PathParam(job_id): PathParam<JobId>,
) -> Result<Response, BoardError> {
    let count = state
        .applications
        .count_for_job(caller.provider()?, job_id)?;
    Ok(Json(json!({ "count": count })).into_response())
}
