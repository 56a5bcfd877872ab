//! HTTPS control plane client
//!
//! Blocking `reqwest` client speaking the hosting platform's JSON API with
//! token authentication.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::entities::Webapp;
use crate::domain::ports::{ApiError, ApiResult, ControlPlane, TaskId, TaskKind, TaskStatus};
use crate::domain::value_objects::{Credentials, Environment, SiteType};

const CLIENT_AGENT: &str = concat!("crship/", env!("CARGO_PKG_VERSION"));

pub struct HttpControlPlane {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct WebappDto {
    id: u64,
    #[serde(default)]
    name: String,
    app_type: String,
    #[serde(default)]
    django_project: Option<String>,
    #[serde(default)]
    primary_url: Option<String>,
    sftp_prod_domain: String,
    #[serde(default)]
    sftp_staging_domain: Option<String>,
}

#[derive(Debug, Serialize)]
struct NewTask<'a> {
    webapp: u64,
    env: &'a str,
    task_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct TaskDto {
    id: u64,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    returned_data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl WebappDto {
    fn into_webapp(self, handle: &str) -> ApiResult<Webapp> {
        let site_type: SiteType = self.app_type.parse().map_err(|e| ApiError::Decode {
            resource: format!("webapp '{}'", handle),
            message: e,
        })?;
        Ok(Webapp {
            handle: handle.to_string(),
            id: self.id,
            name: self.name,
            site_type,
            django_project: non_empty(self.django_project),
            primary_url: non_empty(self.primary_url),
            sftp_prod_domain: self.sftp_prod_domain,
            sftp_staging_domain: non_empty(self.sftp_staging_domain),
        })
    }
}

/// Pull a human-readable message out of an error body
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// SFTP password from a `resetpassword` task answer
fn password_from(task: &TaskDto) -> Result<String, String> {
    let data = task.returned_data.as_ref();
    if let Some(password) = data
        .and_then(|d| d.get("password"))
        .and_then(Value::as_str)
    {
        return Ok(password.to_string());
    }
    if let Some(error) = &task.error {
        return Err(format!("host error: {}", error));
    }
    if let Some(error) = data.and_then(|d| d.get("error")).and_then(Value::as_str) {
        return Err(format!("host error: {}", error));
    }
    Err("SFTP password not available".to_string())
}

impl HttpControlPlane {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Token {}", token))
            .map_err(|_| ApiError::Transport("token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Turn a response into its body, mapping non-2xx codes
    fn check(resource: &str, response: Response) -> ApiResult<String> {
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        debug!(resource, status = status.as_u16(), "response");

        if status.is_success() {
            return Ok(body);
        }
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized {
                resource: resource.to_string(),
                message,
            }),
            _ => Err(ApiError::Status {
                resource: resource.to_string(),
                status: status.as_u16(),
                message,
            }),
        }
    }

    fn decode<T: for<'de> Deserialize<'de>>(resource: &str, body: &str) -> ApiResult<T> {
        serde_json::from_str(body).map_err(|e| ApiError::Decode {
            resource: resource.to_string(),
            message: e.to_string(),
        })
    }

    fn post_task(&self, webapp: &Webapp, env: Environment, kind: TaskKind) -> ApiResult<TaskDto> {
        let resource = format!("{} task for '{}'", kind, webapp.handle);
        let response = self
            .client
            .post(self.url("api/tasks/"))
            .json(&NewTask {
                webapp: webapp.id,
                env: env.as_str(),
                task_type: kind.as_str(),
            })
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let body = Self::check(&resource, response)?;
        Self::decode(&resource, &body)
    }
}

impl ControlPlane for HttpControlPlane {
    fn webapp(&self, handle: &str) -> ApiResult<Webapp> {
        let resource = format!("webapp '{}'", handle);
        let response = self
            .client
            .get(self.url(&format!("api/webapps/{}/", handle)))
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let body = Self::check(&resource, response)?;
        let dto: WebappDto = Self::decode(&resource, &body)?;
        dto.into_webapp(handle)
    }

    fn issue_credentials(&self, webapp: &Webapp, env: Environment) -> ApiResult<Credentials> {
        let task = self.post_task(webapp, env, TaskKind::ResetPassword)?;
        let password = password_from(&task).map_err(|message| ApiError::Decode {
            resource: format!("SFTP password for '{}'", webapp.handle),
            message,
        })?;
        Ok(Credentials::new(webapp.handle.clone(), password))
    }

    fn queue_task(&self, webapp: &Webapp, env: Environment, kind: TaskKind) -> ApiResult<TaskId> {
        let task = self.post_task(webapp, env, kind)?;
        info!(task = task.id, kind = %kind, "task created");
        Ok(TaskId(task.id))
    }

    fn task_status(&self, task: TaskId) -> ApiResult<TaskStatus> {
        let resource = format!("task {}", task);
        let response = self
            .client
            .get(self.url(&format!("api/tasks/{}/", task.0)))
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let body = Self::check(&resource, response)?;
        let dto: TaskDto = Self::decode(&resource, &body)?;
        let status = dto.status.as_deref().unwrap_or("pending");
        Ok(TaskStatus::from_api(status, dto.error.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_webapp_description() {
        let body = r#"{
            "id": 42,
            "name": "My Site",
            "app_type": "wagtail",
            "app_type_info": {"name": "Wagtail"},
            "django_project": "mysite",
            "primary_url": "https://mysite.example/",
            "sftp_prod_domain": "mysite.codered.cloud",
            "sftp_staging_domain": "",
            "databases": []
        }"#;
        let dto: WebappDto = serde_json::from_str(body).unwrap();
        let app = dto.into_webapp("mysite").unwrap();
        assert_eq!(app.id, 42);
        assert_eq!(app.site_type, SiteType::Wagtail);
        assert_eq!(app.django_project.as_deref(), Some("mysite"));
        assert_eq!(app.sftp_staging_domain, None);
    }

    #[test]
    fn unknown_app_type_is_a_decode_error() {
        let body = r#"{"id": 1, "app_type": "cobol", "sftp_prod_domain": "x"}"#;
        let dto: WebappDto = serde_json::from_str(body).unwrap();
        assert!(matches!(
            dto.into_webapp("x"),
            Err(ApiError::Decode { .. })
        ));
    }

    #[test]
    fn password_comes_from_returned_data() {
        let task: TaskDto =
            serde_json::from_str(r#"{"id": 9, "returned_data": {"password": "s3cret"}}"#).unwrap();
        assert_eq!(password_from(&task).unwrap(), "s3cret");
    }

    #[test]
    fn password_errors_are_reported() {
        let task: TaskDto =
            serde_json::from_str(r#"{"id": 9, "returned_data": {"error": "host down"}}"#).unwrap();
        assert_eq!(password_from(&task).unwrap_err(), "host error: host down");

        let task: TaskDto = serde_json::from_str(r#"{"id": 9}"#).unwrap();
        assert!(password_from(&task).is_err());
    }

    #[test]
    fn error_message_prefers_detail() {
        assert_eq!(
            error_message(r#"{"detail": "Invalid token.", "error": "x"}"#).as_deref(),
            Some("Invalid token.")
        );
        assert_eq!(error_message(r#"{"error": "nope"}"#).as_deref(), Some("nope"));
        assert_eq!(error_message("<html>"), None);
    }

    #[test]
    fn joins_urls_without_double_slashes() {
        let api = HttpControlPlane::new("https://app.example/", "t", Duration::from_secs(1)).unwrap();
        assert_eq!(api.url("/api/tasks/"), "https://app.example/api/tasks/");
    }

    #[test]
    fn rejects_token_with_newline() {
        assert!(HttpControlPlane::new("https://app.example", "a\nb", Duration::from_secs(1)).is_err());
    }
}
