use reqwest::{header, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::fmt;
use uuid::Uuid;

/// Error reported by the backend service or by the transport to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Human-readable message as the backend phrased it.
    pub message: String,
}

impl BackendError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn transport(err: reqwest::Error) -> Self {
        Self::new(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {})", self.message, status),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for BackendError {}

/// A row filter, rendered as `column=eq.value`.
#[derive(Debug, Clone)]
pub struct Filter {
    column: &'static str,
    value: String,
}

impl Filter {
    pub fn eq(column: &'static str, value: impl fmt::Display) -> Self {
        Self {
            column,
            value: format!("eq.{}", value),
        }
    }
}

/// Result ordering, rendered as `order=column.desc`.
#[derive(Debug, Clone, Copy)]
pub struct Order {
    column: &'static str,
    ascending: bool,
}

impl Order {
    pub fn desc(column: &'static str) -> Self {
        Self {
            column,
            ascending: false,
        }
    }

    pub fn asc(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    fn render(self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{}", self.column, direction)
    }
}

/// Outcome of a sign-up call.
#[derive(Debug, Clone)]
pub struct SignUp {
    /// Identity id, when the backend returned a user.
    pub user_id: Option<Uuid>,
    /// Session token, present when the project auto-confirms new users.
    pub access_token: Option<String>,
}

/// Client for the backend-as-a-service: auth, rows and remote procedures.
#[derive(Clone)]
pub struct SupabaseClient {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl SupabaseClient {
    /// Creates a new `SupabaseClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Project URL, e.g. `https://xyz.supabase.co`.
    /// * `anon_key` - Public anon key sent as `apikey` on every request.
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| BackendError::new(None, format!("Failed to create backend client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            access_token: None,
        })
    }

    /// Same client, authenticated as the user owning `token`.
    pub fn with_access_token(&self, token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..self.clone()
        }
    }

    /// Creates an auth identity.
    ///
    /// # Arguments
    ///
    /// * `email` - Already sanitized email.
    /// * `password` - Raw password.
    /// * `metadata` - Stored as the identity's user metadata.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<SignUp, BackendError> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        tracing::debug!("POST {}", url);

        let body = json!({
            "email": email,
            "password": password,
            "data": metadata,
        });

        let response = self.send(self.authorized(self.client.post(&url)).json(&body)).await?;
        let data: Value = response.json().await.map_err(|e| {
            BackendError::new(None, format!("Failed to parse sign-up response: {}", e))
        })?;

        // Auto-confirmed projects answer with a session wrapping the user;
        // otherwise the body is the user itself.
        let user_id = data
            .get("user")
            .and_then(|u| u.get("id"))
            .or_else(|| data.get("id"))
            .and_then(|id| id.as_str())
            .and_then(|id| Uuid::parse_str(id).ok());

        let access_token = data
            .get("access_token")
            .and_then(|t| t.as_str())
            .map(str::to_string);

        Ok(SignUp {
            user_id,
            access_token,
        })
    }

    /// Reads rows of `table`.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        columns: &str,
        filters: &[Filter],
        order: Option<Order>,
    ) -> Result<Vec<T>, BackendError> {
        let mut params = vec![("select".to_string(), columns.to_string())];
        params.extend(Self::filter_params(filters));
        if let Some(order) = order {
            params.push(("order".to_string(), order.render()));
        }

        let url = self.rest_url(table, &params)?;
        tracing::debug!("GET rows from {}", table);

        let response = self.send(self.authorized(self.client.get(url))).await?;
        Self::parse_rows(response, table).await
    }

    /// Inserts one row and returns what the backend stored.
    pub async fn insert<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        row: &B,
    ) -> Result<Vec<T>, BackendError> {
        let url = self.rest_url(table, &[])?;
        tracing::debug!("POST row into {}", table);

        let request = self
            .authorized(self.client.post(url))
            .header("Prefer", "return=representation")
            .json(row);

        let response = self.send(request).await?;
        Self::parse_rows(response, table).await
    }

    /// Updates the rows matching `filters` and returns the affected rows.
    pub async fn update<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[Filter],
        changes: &B,
    ) -> Result<Vec<T>, BackendError> {
        let params: Vec<(String, String)> = Self::filter_params(filters).collect();
        let url = self.rest_url(table, &params)?;
        tracing::debug!("PATCH rows in {}", table);

        let request = self
            .authorized(self.client.patch(url))
            .header("Prefer", "return=representation")
            .json(changes);

        let response = self.send(request).await?;
        Self::parse_rows(response, table).await
    }

    /// Calls a remote procedure.
    pub async fn rpc<B: Serialize, T: DeserializeOwned>(
        &self,
        function: &str,
        args: &B,
    ) -> Result<T, BackendError> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, function);
        tracing::debug!("RPC {}", function);

        let response = self.send(self.authorized(self.client.post(&url)).json(args)).await?;

        // Void functions answer 204 with no body.
        if response.status() == StatusCode::NO_CONTENT {
            return serde_json::from_value(Value::Null).map_err(|e| {
                BackendError::new(None, format!("Unexpected empty result from {}: {}", function, e))
            });
        }

        response.json().await.map_err(|e| {
            BackendError::new(None, format!("Failed to parse {} result: {}", function, e))
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        request
            .header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
    }

    fn rest_url(&self, table: &str, params: &[(String, String)]) -> Result<reqwest::Url, BackendError> {
        reqwest::Url::parse_with_params(&format!("{}/rest/v1/{}", self.base_url, table), params)
            .map_err(|e| BackendError::new(None, format!("Failed to build URL: {}", e)))
    }

    fn filter_params(filters: &[Filter]) -> impl Iterator<Item = (String, String)> + '_ {
        filters
            .iter()
            .map(|f| (f.column.to_string(), f.value.clone()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(BackendError::transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::debug!("Backend returned {}", status);
            return Err(BackendError::new(
                Some(status.as_u16()),
                extract_message(&error_text),
            ));
        }

        Ok(response)
    }

    async fn parse_rows<T: DeserializeOwned>(
        response: Response,
        table: &str,
    ) -> Result<Vec<T>, BackendError> {
        response.json().await.map_err(|e| {
            BackendError::new(None, format!("Failed to parse {} rows: {}", table, e))
        })
    }
}

/// Pulls the human message out of an auth or rows error body.
fn extract_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return if body.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            body.trim().to_string()
        };
    };

    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}
