use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::error::JwError;
use crate::core::job::StatusMap;

#[derive(Debug, Clone)]
pub struct QueueClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct StartJobResponse {
    #[serde(rename = "jobId")]
    job_id: RawJobId,
}

// The server answers with either a number or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawJobId {
    Number(u64),
    Text(String),
}

impl QueueClient {
    pub fn new(base_url: &str) -> Result<Self, JwError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| JwError::RequestFailed {
                url: base_url.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn query_jobs(&self) -> Result<StatusMap, JwError> {
        self.get_json("query-job")
    }

    pub fn start_job(&self) -> Result<u64, JwError> {
        let response: StartJobResponse = self.get_json("start-job")?;
        resolve_job_id(response.job_id, &self.url("start-job"))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, JwError> {
        let url = self.url(path);
        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|e| JwError::RequestFailed {
                url: url.clone(),
                message: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(JwError::BadStatus {
                status: response.status().as_u16(),
                url,
            });
        }
        response.json::<T>().map_err(|e| JwError::MalformedResponse {
            url,
            message: e.to_string(),
        })
    }
}

fn resolve_job_id(raw: RawJobId, url: &str) -> Result<u64, JwError> {
    match raw {
        RawJobId::Number(id) => Ok(id),
        RawJobId::Text(text) => {
            text.trim()
                .parse::<u64>()
                .map_err(|_| JwError::MalformedResponse {
                    url: url.to_string(),
                    message: format!("jobId is not numeric: {text:?}"),
                })
        }
    }
}
