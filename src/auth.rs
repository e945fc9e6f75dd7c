use crate::error::{AppError, AppResult};
use crate::models::{Identity, Role};
use crate::repositories::RoleStore;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{error, info};
use uuid::Uuid;

/// Minimum password length accepted at sign-up
const MIN_PASSWORD_LEN: usize = 6;

/// Signed-in identity and its role, passed explicitly to every engine call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub role: Role,
}

impl Session {
    pub fn new(identity: Identity, role: Role) -> Self {
        Self { identity, role }
    }

    pub fn uid(&self) -> &str {
        &self.identity.uid
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail unless the session belongs to an administrator
    pub fn require_admin(&self) -> AppResult<()> {
        if !self.is_admin() {
            return Err(AppError::Unauthorized(format!(
                "{} is not an administrator",
                self.identity.label()
            )));
        }
        Ok(())
    }
}

/// Credentials accepted by an identity provider
#[derive(Debug, Clone)]
pub enum Credentials {
    EmailPassword {
        email: String,
        password: String,
    },
    /// Create the account, then sign in
    SignUp {
        email: String,
        password: String,
        display_name: Option<String>,
    },
}

/// External identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> AppResult<Identity>;

    async fn sign_out(&self, identity: &Identity) -> AppResult<()>;
}

/// Display name used when none is given at sign-up: the part of the email before `@`
pub fn default_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

struct Account {
    identity: Identity,
    password_digest: String,
}

/// Identity provider holding accounts in memory, for local development and tests
#[derive(Default)]
pub struct StaticIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn digest(email: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(email.as_bytes());
        hasher.update(b":");
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Register an account and return its identity
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> AppResult<Identity> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation(format!("Invalid email: {}", email)));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&email) {
            return Err(AppError::Validation(format!("Email already in use: {}", email)));
        }

        let identity = Identity {
            uid: Uuid::new_v4().simple().to_string(),
            display_name: Some(
                display_name
                    .map(str::to_string)
                    .unwrap_or_else(|| default_display_name(&email)),
            ),
            email: Some(email.clone()),
        };
        accounts.insert(
            email.clone(),
            Account {
                identity: identity.clone(),
                password_digest: Self::digest(&email, password),
            },
        );
        Ok(identity)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn sign_in(&self, credentials: &Credentials) -> AppResult<Identity> {
        match credentials {
            Credentials::EmailPassword { email, password } => {
                let email = email.trim().to_lowercase();
                let accounts = self.accounts.read().await;
                match accounts.get(&email) {
                    Some(account) if account.password_digest == Self::digest(&email, password) => {
                        Ok(account.identity.clone())
                    }
                    _ => Err(AppError::Unauthorized("Invalid email or password".to_string())),
                }
            }
            Credentials::SignUp {
                email,
                password,
                display_name,
            } => self.register(email, password, display_name.as_deref()).await,
        }
    }

    async fn sign_out(&self, _identity: &Identity) -> AppResult<()> {
        Ok(())
    }
}

/// Tracks the current session and publishes every change to watchers
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    roles: Arc<dyn RoleStore>,
    current: watch::Sender<Option<Session>>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn IdentityProvider>, roles: Arc<dyn RoleStore>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            provider,
            roles,
            current,
        }
    }

    /// Authenticate, make sure a role record exists, and publish the session
    pub async fn sign_in(&self, credentials: &Credentials) -> AppResult<Session> {
        let identity = self.provider.sign_in(credentials).await?;

        let role = self
            .roles
            .ensure_default_role(&identity)
            .await
            .map_err(|e| {
                error!("Error bootstrapping role for {}: {}", identity.uid, e);
                AppError::StoreOperationFailed {
                    operation: "sign in",
                    reason: e.to_string(),
                }
            })?;

        let session = Session::new(identity, role);
        info!("Signed in {} as {}", session.identity.label(), role.as_str());
        self.current.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// Re-read the role of the current identity, e.g. after an operator promoted it
    pub async fn refresh_role(&self) -> AppResult<Option<Session>> {
        let Some(session) = self.session() else {
            return Ok(None);
        };

        let lookup = match self.roles.get_role(session.uid()).await {
            Ok(Some(role)) => Ok(role),
            Ok(None) => self.roles.ensure_default_role(&session.identity).await,
            Err(e) => Err(e),
        };
        let role = lookup.map_err(|e| {
            error!("Error getting user role for {}: {}", session.uid(), e);
            AppError::StoreOperationFailed {
                operation: "look up role",
                reason: e.to_string(),
            }
        })?;

        let refreshed = Session::new(session.identity, role);
        self.current.send_replace(Some(refreshed.clone()));
        Ok(Some(refreshed))
    }

    pub async fn sign_out(&self) -> AppResult<()> {
        if let Some(session) = self.session() {
            self.provider.sign_out(&session.identity).await?;
            info!("Signed out {}", session.identity.label());
        }
        self.current.send_replace(None);
        Ok(())
    }

    pub fn session(&self) -> Option<Session> {
        self.current.borrow().clone()
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.current.borrow().as_ref().map(|s| s.identity.clone())
    }

    /// Current session, or `Unauthorized` when nobody is signed in
    pub fn require_session(&self) -> AppResult<Session> {
        self.session()
            .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))
    }

    /// Receiver notified on every sign-in, sign-out and role refresh
    pub fn watch(&self) -> watch::Receiver<Option<Session>> {
        self.current.subscribe()
    }
}
