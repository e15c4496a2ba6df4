//! Signup, login and logout against the auth API.
//!
//! # Flow
//!
//! 1. [`SignupForm::validate`] rejects incomplete or mismatched input before
//!    any request is made
//! 2. [`AuthClient::login`] stores the returned user id and token through
//!    [`Session`]
//! 3. [`AuthClient::logout`] revokes the token server-side, then clears it
//!
//! The token is sent as `Authorization: Token <token>`.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

use crate::config::AuthConfig;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::store::{PersistentStore, StoreError, keys};

/// Shown when any signup field is blank.
pub const MISSING_FIELDS_MESSAGE: &str = "All fields are required.";

/// Shown when the two password fields differ.
pub const PASSWORD_MISMATCH_MESSAGE: &str = "Passwords do not match.";

const REGISTRATION_FAILED_MESSAGE: &str = "Registration failed.";
const LOGIN_FAILED_MESSAGE: &str = "Login failed";
const LOGOUT_FAILED_MESSAGE: &str = "Failed to log out.";

/// Account type every storefront signup registers as.
const CUSTOMER_USER_TYPE: &str = "CUSTOMER";

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Input rejected before contacting the server.
    #[error("{0}")]
    Validation(String),

    /// Server refused the request.
    #[error("{0}")]
    Rejected(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// No token is stored.
    #[error("Not logged in")]
    NotLoggedIn,

    /// Session could not be persisted.
    #[error("Session store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Whether the failure is ours rather than the user's.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Parse(_) | Self::Store(_))
    }

    /// Message safe to show the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::Rejected(msg) => msg.clone(),
            Self::NotLoggedIn => "You are not logged in.".to_string(),
            Self::Http(_) | Self::Parse(_) => {
                "Authentication service unavailable. Please try again.".to_string()
            }
            Self::Store(_) => "Could not save your session.".to_string(),
        }
    }
}

// =============================================================================
// Signup Form
// =============================================================================

/// Signup form input.
///
/// Implements `Debug` manually to redact the passwords.
#[derive(Clone)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

impl SignupForm {
    /// Check the form is complete and the passwords match.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` with the message to show the user.
    pub fn validate(&self) -> Result<(), AuthError> {
        let text_fields = [&self.first_name, &self.last_name, &self.email, &self.phone];
        let blank_text = text_fields.iter().any(|field| field.trim().is_empty());
        let blank_password = self.password.expose_secret().is_empty()
            || self.confirm_password.expose_secret().is_empty();

        if blank_text || blank_password {
            return Err(AuthError::Validation(MISSING_FIELDS_MESSAGE.to_string()));
        }

        if self.password.expose_secret() != self.confirm_password.expose_secret() {
            return Err(AuthError::Validation(PASSWORD_MISMATCH_MESSAGE.to_string()));
        }

        Ok(())
    }

    /// Registration request body.
    fn to_request_body(&self) -> Value {
        serde_json::json!({
            "email": self.email.trim(),
            "first_name": self.first_name.trim(),
            "last_name": self.last_name.trim(),
            "phone": self.phone.trim(),
            "user_type": CUSTOMER_USER_TYPE,
            "password": self.password.expose_secret(),
            "password2": self.confirm_password.expose_secret(),
        })
    }
}

impl std::fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupForm")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .finish()
    }
}

// =============================================================================
// Session
// =============================================================================

/// Logged-in user's id and token, persisted under [`keys::USER_ID`] and
/// [`keys::TOKEN`].
#[derive(Debug, Clone)]
pub struct Session {
    store: PersistentStore,
}

impl Session {
    /// Session over `store`.
    #[must_use]
    pub const fn new(store: PersistentStore) -> Self {
        Self { store }
    }

    /// Stored auth token.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.store
            .read::<String>(keys::TOKEN)
            .filter(|token| !token.is_empty())
            .map(SecretString::from)
    }

    /// Stored user id.
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        self.store.read(keys::USER_ID)
    }

    /// Whether a token is stored.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    /// Persist the user id and token.
    ///
    /// # Errors
    ///
    /// Returns error if either value cannot be written.
    pub fn save(&self, user_id: &str, token: &SecretString) -> Result<(), StoreError> {
        self.store.write(keys::USER_ID, user_id)?;
        self.store.write(keys::TOKEN, token.expose_secret())
    }

    /// Forget the user id and token.
    ///
    /// # Errors
    ///
    /// Returns error if either key cannot be removed.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.clear(keys::TOKEN)?;
        self.store.clear(keys::USER_ID)
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct AuthResponse {
    user: AuthUserWire,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthUserWire {
    id: Value,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

/// A logged-in user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Opaque user id.
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<&AuthUserWire> for AuthUser {
    fn from(wire: &AuthUserWire) -> Self {
        Self {
            id: opaque_id(&wire.id),
            email: wire.email.clone(),
            first_name: wire.first_name.clone(),
            last_name: wire.last_name.clone(),
        }
    }
}

/// Ids arrive as UUID strings; anything else is kept in its JSON form.
fn opaque_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten an error body into one message.
///
/// Every string found in the body (including inside field error lists) is
/// joined with spaces, in document order.
fn flatten_messages(body: &Value) -> String {
    fn collect<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
        match value {
            Value::String(s) if !s.trim().is_empty() => out.push(s.trim()),
            Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
            Value::Object(map) => map.values().for_each(|v| collect(v, out)),
            _ => {}
        }
    }

    let mut parts = Vec::new();
    collect(body, &mut parts);
    parts.join(" ")
}

/// `message`, then `detail`, then every string in the body.
fn login_failure_message(body: &Value) -> Option<String> {
    ["message", "detail"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .or_else(|| Some(flatten_messages(body)).filter(|m| !m.is_empty()))
}

// =============================================================================
// AuthClient
// =============================================================================

/// Auth API client.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl AuthClient {
    /// Create a new auth client that persists logins into `session`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &AuthConfig, session: Session) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            session,
        })
    }

    /// The session logins are stored in.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// `<base>/<name>/`.
    fn endpoint(&self, name: &str) -> Result<Url, AuthError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AuthError::Parse(format!("Invalid auth base URL: {}", self.base_url)))?
            .pop_if_empty()
            .push(name)
            .push("");
        Ok(url)
    }

    /// Register a new customer account.
    ///
    /// Returns the server's confirmation message. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for an invalid form without making a
    /// request, `AuthError::Rejected` if the server refuses the signup.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &SignupForm) -> Result<String, AuthError> {
        form.validate()?;

        let response = self
            .client
            .post(self.endpoint("register")?)
            .json(&form.to_request_body())
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = flatten_messages(&body);
            warn!(status = %status, "Registration rejected");
            return Err(AuthError::Rejected(if message.is_empty() {
                REGISTRATION_FAILED_MESSAGE.to_string()
            } else {
                message
            }));
        }

        info!("Registered new account");
        Ok(body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Registration successful.")
            .to_string())
    }

    /// Log in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Rejected` with the server's message if the
    /// credentials are refused.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthUser, AuthError> {
        if email.trim().is_empty() || password.expose_secret().is_empty() {
            return Err(AuthError::Validation(
                "Email and password are required.".to_string(),
            ));
        }

        let response = self
            .client
            .post(self.endpoint("login")?)
            .json(&serde_json::json!({
                "email": email.trim(),
                "password": password.expose_secret(),
            }))
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            warn!(status = %status, "Login rejected");
            return Err(AuthError::Rejected(
                login_failure_message(&body).unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string()),
            ));
        }

        let body: AuthResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Parse(e.to_string()))?;
        let token = body
            .user
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| SecretString::from(t.to_string()))
            .ok_or_else(|| AuthError::Parse("Login response carried no token".to_string()))?;

        let user = AuthUser::from(&body.user);
        self.session.save(&user.id, &token)?;
        set_sentry_user(&user.id);

        info!(
            user_id = %user.id,
            server_message = body.message.as_deref().unwrap_or_default(),
            "Logged in"
        );
        Ok(user)
    }

    /// Revoke the stored token and clear the session.
    ///
    /// A token the server no longer recognizes is cleared locally.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` without a request when no token is
    /// stored, `AuthError::Rejected` if the server refuses, leaving the
    /// session in place.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        let token = self.session.token().ok_or(AuthError::NotLoggedIn)?;

        let response = self
            .client
            .post(self.endpoint("logout")?)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Token {}", token.expose_secret()),
            )
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() && status != StatusCode::UNAUTHORIZED {
            warn!(status = %status, "Logout rejected");
            return Err(AuthError::Rejected(LOGOUT_FAILED_MESSAGE.to_string()));
        }

        self.session.clear()?;
        clear_sentry_user();
        info!("Logged out");
        Ok(())
    }
}
