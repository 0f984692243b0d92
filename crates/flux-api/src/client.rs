use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use flux_model::{JobEntry, JobId, JobQuery};

use crate::{
    error::ApiError,
    types::{ErrorResponse, GetJobResponse, ListJobsResponse, SubmitJobRequest, SubmitJobResponse},
};

/// Client for the routes mounted by [`HttpApi`](crate::HttpApi).
#[derive(Debug, Clone)]
pub struct HttpClient {
    base: String,
    http: Client,
}

impl HttpClient {
    /// `base` is the server root, e.g. `http://127.0.0.1:8080`.
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_client(base, Client::new())
    }

    pub fn with_client(base: impl Into<String>, http: Client) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self { base, http }
    }

    /// Submit an encoded jobspec with default priority and no flags.
    pub async fn submit(&self, jobspec: &str) -> Result<JobId, ApiError> {
        self.submit_request(&SubmitJobRequest {
            jobspec: Some(Value::String(jobspec.to_string())),
            ..Default::default()
        })
        .await
    }

    pub async fn submit_request(&self, req: &SubmitJobRequest) -> Result<JobId, ApiError> {
        let resp = self
            .http
            .post(format!("{}/api/v1/jobs", self.base))
            .json(req)
            .send()
            .await?;
        let body: SubmitJobResponse = decode(resp).await?;
        debug!(id = %body.id, "job submitted");
        Ok(body.id)
    }

    pub async fn get_job(&self, id: JobId) -> Result<Option<JobEntry>, ApiError> {
        let resp = self
            .http
            .get(format!("{}/api/v1/jobs/{}", self.base, id))
            .send()
            .await?;
        let body: GetJobResponse = decode(resp).await?;
        Ok(body.job)
    }

    pub async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<JobEntry>, ApiError> {
        let mut url = format!("{}/api/v1/jobs?limit={}", self.base, query.limit());
        if let Some(userid) = query.userid {
            url.push_str(&format!("&userid={userid}"));
        }
        let resp = self.http.get(url).send().await?;
        let body: ListJobsResponse = decode(resp).await?;
        Ok(body.jobs)
    }
}

async fn decode<T>(resp: Response) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let text = resp.text().await?;
    let (message, errnum) = match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(err) => (err.error, err.errnum),
        Err(_) => (text, None),
    };
    Err(ApiError::Remote {
        status: status.as_u16(),
        message,
        errnum,
    })
}
