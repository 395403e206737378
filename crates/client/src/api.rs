//! REST API client for the HarmoLyze HTTP endpoints.

use std::collections::BTreeMap;

use harmolyze_core::signup::{SignupForm, MSG_NAME_TAKEN, MSG_UNKNOWN_ERROR};
use harmolyze_core::types::DbId;
use harmolyze_editor::TuneUpdate;
use reqwest::{redirect, StatusCode};
use serde::{Deserialize, Serialize};

/// HTTP client for one HarmoLyze server.
///
/// Redirects are not followed: a `303` to the sign-in page surfaces as
/// [`ClientError::SigninRequired`].
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Tokens and identity returned by signup, login and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: UserInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    pub id: DbId,
    pub name: String,
    pub image: Option<String>,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TuneSummary {
    pub id: DbId,
    pub title: String,
    pub difficulty: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tunebook {
    pub id: DbId,
    pub name: String,
    pub tunes: Vec<TuneSummary>,
}

/// Errors from the API client layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    ApiError {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The server redirected to its sign-in page.
    #[error("sign-in required (redirected to {location})")]
    SigninRequired { location: String },
}

/// Outcome of a failed signup, displayed the way the signup form shows it.
#[derive(Debug, thiserror::Error)]
pub enum SignupError {
    #[error("{}", MSG_NAME_TAKEN)]
    NameTaken,

    /// Field name to message.
    #[error("invalid signup form: {0:?}")]
    Invalid(BTreeMap<String, String>),

    /// Any other failure; the detail is for logs only.
    #[error("{}", MSG_UNKNOWN_ERROR)]
    Unknown(String),
}

/// Error body rendered by the server.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    code: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct DataResponse<T> {
    data: T,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    name: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct DeleteTuneRequest {
    id: DbId,
}

impl ApiClient {
    /// * `base_url` - Server root, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Use `token` as Bearer token on subsequent requests.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Create an account and sign it in.
    pub async fn signup(&self, form: &SignupForm) -> Result<AuthSession, SignupError> {
        let response = self
            .client
            .post(self.url("/api/v1/auth/signup"))
            .json(form)
            .send()
            .await
            .map_err(|e| SignupError::Unknown(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<AuthSession>()
                .await
                .map_err(|e| SignupError::Unknown(e.to_string()));
        }

        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        match status {
            StatusCode::CONFLICT => Err(SignupError::NameTaken),
            StatusCode::BAD_REQUEST if !body.fields.is_empty() => {
                Err(SignupError::Invalid(body.fields))
            }
            _ => {
                tracing::warn!(status = status.as_u16(), error = %body.error, "Signup failed");
                Err(SignupError::Unknown(format!("{status}: {}", body.error)))
            }
        }
    }

    /// Sign in with name and password.
    pub async fn login(&self, name: &str, password: &str) -> Result<AuthSession, ClientError> {
        let response = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&LoginRequest { name, password })
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn list_tunebooks(&self) -> Result<Vec<Tunebook>, ClientError> {
        let response = self
            .authorized(self.client.get(self.url("/api/v1/tunebooks")))
            .send()
            .await?;
        let body: DataResponse<Vec<Tunebook>> = Self::parse_response(response).await?;
        Ok(body.data)
    }

    /// Persist a tune body with `PUT /tunes/{id}`.
    pub async fn update_tune(&self, update: &TuneUpdate) -> Result<(), ClientError> {
        let response = self
            .authorized(
                self.client
                    .put(self.url(&format!("/api/v1/tunes/{}", update.tune_id))),
            )
            .json(update)
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Remove a tune (admin only).
    pub async fn delete_tune(&self, id: DbId) -> Result<(), ClientError> {
        let response = self
            .authorized(self.client.delete(self.url("/api/v1/admin/tunes")))
            .json(&DeleteTuneRequest { id })
            .send()
            .await?;
        Self::check_status(response).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Return the response unchanged on any 2xx status.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status.is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            return Err(ClientError::SigninRequired { location });
        }
        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        Err(ClientError::ApiError {
            status: status.as_u16(),
            code: body.code,
            message: body.error,
        })
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), ClientError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
