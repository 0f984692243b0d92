use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::{debug, warn};

use flux_job::SubmitOptions;
use flux_model::{JobId, JobQuery, Priority, SubmitFlags};

use crate::{
    error::ApiError,
    handler::ApiHandler,
    types::{ErrorResponse, GetJobResponse, ListJobsResponse, SubmitJobRequest, SubmitJobResponse},
};

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - POST /api/v1/jobs - Submit job
    /// - GET /api/v1/jobs - List jobs (`?userid=`, `?limit=`)
    /// - GET /api/v1/jobs/{id} - Look up job
    pub fn router(self) -> Router {
        Router::new()
            .route("/api/v1/jobs", get(list_jobs::<H>).post(submit_job::<H>))
            .route("/api/v1/jobs/{id}", get(get_job::<H>))
            .with_state(self.handler)
    }
}

#[derive(Debug, Deserialize)]
struct ListJobsParams {
    userid: Option<u32>,
    /// Max items (default 100, max 1000)
    limit: Option<usize>,
}

/// POST /api/v1/jobs
async fn submit_job<H>(
    State(handler): State<Arc<H>>,
    Json(req): Json<SubmitJobRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let mut opts = SubmitOptions::default();
    if let Some(priority) = req.priority {
        let priority = Priority::new(priority).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        opts = opts.with_priority(priority);
    }
    if let Some(flags) = req.flags {
        opts = opts.with_flags(SubmitFlags::from_bits(flags));
    }

    let id = handler.submit_job(req.jobspec, opts).await?;
    debug!(%id, "job submitted");

    Ok((StatusCode::CREATED, Json(SubmitJobResponse { id })))
}

/// GET /api/v1/jobs/{id}
async fn get_job<H>(
    State(handler): State<Arc<H>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let id = parse_id(&id)?;
    let job = handler.get_job(id).await?;

    Ok(Json(GetJobResponse { job }))
}

/// GET /api/v1/jobs
async fn list_jobs<H>(
    State(handler): State<Arc<H>>,
    Query(params): Query<ListJobsParams>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let mut query = JobQuery::new();
    if let Some(userid) = params.userid {
        query = query.with_userid(userid);
    }
    if let Some(limit) = params.limit {
        if limit == 0 {
            return Err(ApiError::InvalidRequest("limit must be positive".into()));
        }
        query = query.with_limit(limit);
    }

    let jobs = handler.list_jobs(query).await?;
    debug!(count = jobs.len(), "jobs listed");

    Ok(Json(ListJobsResponse { jobs }))
}

fn parse_id(s: &str) -> Result<JobId, ApiError> {
    let id = s
        .trim()
        .parse::<u64>()
        .map(JobId::new)
        .map_err(|_| ApiError::InvalidRequest(format!("invalid job id: '{s}'")))?;
    if !id.is_valid() {
        return Err(ApiError::InvalidRequest("job id must be positive".into()));
    }
    Ok(id)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            errnum: self.errno(),
        };
        (status, Json(body)).into_response()
    }
}
