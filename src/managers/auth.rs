use crate::errors::ApiError;
use crate::managers::presence::PresenceManager;
use crate::managers::or_null;
use crate::services::api_client::ApiClient;
use crate::services::logger::Logger;
use crate::services::session::UserProfile;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub user: Option<UserProfile>,
    pub presence_registered: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Clone)]
pub struct AuthManager {
    logger: Logger,
    api: ApiClient,
    presence: PresenceManager,
}

impl AuthManager {
    pub fn new(logger: Logger, api: ApiClient, presence: PresenceManager) -> Self {
        Self {
            logger: logger.child("auth"),
            api,
            presence,
        }
    }

    /// Exchanges credentials for a token, stores it, then tries to load the
    /// profile and mark the user online. Only the token exchange can fail
    /// the login.
    pub async fn login(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> Result<LoginOutcome, ApiError> {
        let response = self
            .api
            .post(
                "/users/login",
                Some(serde_json::json!({
                    "username_or_email": username_or_email,
                    "password": password,
                })),
                None,
            )
            .await?;
        let token = response
            .as_ref()
            .and_then(|v| v.get("access_token"))
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::auth("Login failed: gateway returned no access_token"))?;
        self.api.session().set_token(Some(token))?;
        self.logger.info("logged in", None);

        let user = match self.fetch_profile().await {
            Ok(user) => Some(user),
            Err(err) => {
                self.logger.warn(
                    "Failed to fetch user profile after login",
                    Some(&serde_json::json!({ "kind": err.kind, "status": err.status })),
                );
                None
            }
        };

        let mut presence_registered = false;
        if let Some(user) = user.as_ref() {
            match self.presence.go_online(&user.id).await {
                Ok(_) => presence_registered = true,
                Err(err) => self.logger.warn(
                    "Failed to update presence after login",
                    Some(&serde_json::json!({ "kind": err.kind, "status": err.status })),
                ),
            }
        }

        Ok(LoginOutcome {
            user,
            presence_registered,
        })
    }

    pub async fn register(&self, registration: &Registration) -> Result<Value, ApiError> {
        let body = crate::managers::to_body(registration)?;
        Ok(or_null(self.api.post("/users/register", Some(body), None).await?))
    }

    /// Fetches `/users/me` and stores it as the session profile.
    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        let payload = self.api.get("/users/me", None).await?;
        let user = parse_profile(payload)?;
        self.api.session().set_user(Some(&user))?;
        Ok(user)
    }

    pub async fn update_profile(&self, changes: Value) -> Result<UserProfile, ApiError> {
        let payload = self.api.patch("/users/me", Some(changes)).await?;
        let user = parse_profile(payload)?;
        self.api.session().set_user(Some(&user))?;
        Ok(user)
    }

    /// Loads the profile when a token is stored without one. Any failure
    /// leaves the session untouched and is not reported.
    pub async fn hydrate(&self) -> Option<UserProfile> {
        let state = self.api.session().snapshot().ok()?;
        if state.token.is_none() {
            return None;
        }
        if state.user.is_some() {
            return state.user;
        }
        match self.fetch_profile().await {
            Ok(user) => Some(user),
            Err(err) => {
                self.logger.debug(
                    "profile hydration skipped",
                    Some(&serde_json::json!({ "kind": err.kind, "status": err.status })),
                );
                None
            }
        }
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.api.session().clear()?;
        self.logger.info("logged out", None);
        Ok(())
    }
}

fn parse_profile(payload: Option<Value>) -> Result<UserProfile, ApiError> {
    let payload = payload.ok_or_else(|| ApiError::decode("Gateway returned an empty user profile"))?;
    let user: UserProfile = serde_json::from_value(payload)
        .map_err(|err| ApiError::decode(format!("Unexpected user profile shape: {}", err)))?;
    if user.id.is_empty() {
        return Err(ApiError::decode("User profile has no id"));
    }
    Ok(user)
}
