//! Service wiring and the user-management operations behind the routes.

use std::sync::Arc;

use gatekeeper_auth::{
    AccessToken, Authenticator, JwtCodec, NewUser, PasswordError, Role, User, UserStore,
    hash_password, verify_password,
};
use gatekeeper_core::{LoginInput, RegistrationInput, UserId, validation};
use gatekeeper_infra::InMemoryUserStore;

use crate::app::errors::ApiError;
use crate::app::StartupError;
use crate::config::ApiConfig;
use crate::middleware::AuthState;

pub struct AppServices {
    store: Arc<dyn UserStore>,
    tokens: Arc<JwtCodec>,
    authenticator: Arc<Authenticator<Arc<dyn UserStore>>>,
}

impl AppServices {
    pub fn new(store: Arc<dyn UserStore>, tokens: JwtCodec) -> Self {
        let tokens = Arc::new(tokens);
        let authenticator = Arc::new(Authenticator::new(tokens.clone(), store.clone()));

        Self {
            store,
            tokens,
            authenticator,
        }
    }

    pub fn auth_state(&self) -> AuthState {
        AuthState {
            authenticator: self.authenticator.clone(),
        }
    }

    pub fn tokens(&self) -> &JwtCodec {
        &self.tokens
    }

    pub async fn register(&self, input: RegistrationInput) -> Result<User, ApiError> {
        let errors = validation::validate_registration(&input);
        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        let (Some(full_name), Some(date_of_birth), Some(email), Some(password)) =
            (input.full_name, input.date_of_birth, input.email, input.password)
        else {
            return Err(ApiError::internal("validated registration is missing fields"));
        };

        let date_of_birth = validation::parse_date_of_birth(&date_of_birth)
            .ok_or_else(|| ApiError::internal("validated date of birth failed to parse"))?
            .date_naive();

        let role = match input.role.as_deref() {
            None | Some("") => Role::default(),
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|e| ApiError::internal(e.to_string()))?,
        };

        let password_hash = hash_off_thread(password).await?;

        let user = self
            .store
            .create(NewUser {
                full_name,
                date_of_birth,
                email,
                role,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    pub async fn login(&self, input: LoginInput) -> Result<(AccessToken, User), ApiError> {
        let errors = validation::validate_login(&input);
        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        let (Some(email), Some(password)) = (input.email, input.password) else {
            return Err(ApiError::bad_request("Email and password are required"));
        };

        let Some(user) = self.store.find_by_email(&email).await? else {
            tracing::debug!("login for unknown email");
            return Err(ApiError::bad_request("Invalid credentials"));
        };

        verify_off_thread(password, user.password_hash.clone()).await?;

        if !user.is_active {
            return Err(ApiError::bad_request("User account is deactivated"));
        }

        let token = self.tokens.issue(&user)?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok((token, user))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.store.list().await?)
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<User>, ApiError> {
        Ok(self.store.search(query).await?)
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, ApiError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(ApiError::NotFound("User not found"))
    }

    pub async fn block_user(&self, id: UserId) -> Result<User, ApiError> {
        let user = self
            .store
            .set_active(id, false)
            .await?
            .ok_or(ApiError::NotFound("User not found"))?;

        tracing::info!(user_id = %user.id, "user blocked");
        Ok(user)
    }
}

// Argon2 is CPU-bound; keep it off the async workers.
async fn hash_off_thread(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal(format!("password hashing task failed: {e}")))?
        .map_err(ApiError::from)
}

async fn verify_off_thread(password: String, password_hash: String) -> Result<(), ApiError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| ApiError::internal(format!("password verification task failed: {e}")))?
        .map_err(|e| match e {
            PasswordError::Mismatch => {
                tracing::debug!("login with wrong password");
                ApiError::bad_request("Invalid credentials")
            }
            other => other.into(),
        })
}

pub async fn build_services(config: &ApiConfig) -> Result<AppServices, StartupError> {
    let tokens = JwtCodec::new(&config.jwt_secret, config.token_ttl)?;

    let store: Arc<dyn UserStore> = if config.use_persistent_stores {
        build_persistent_store(config).await?
    } else {
        Arc::new(InMemoryUserStore::new())
    };

    Ok(AppServices::new(store, tokens))
}

#[cfg(feature = "postgres")]
async fn build_persistent_store(config: &ApiConfig) -> Result<Arc<dyn UserStore>, StartupError> {
    let url = config
        .database_url
        .as_deref()
        .ok_or(crate::config::ConfigError::MissingDatabaseUrl)?;

    let store = gatekeeper_infra::PostgresUserStore::connect(url).await?;
    store.ensure_schema().await?;
    tracing::info!("using postgres user store");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn build_persistent_store(_config: &ApiConfig) -> Result<Arc<dyn UserStore>, StartupError> {
    tracing::warn!(
        "USE_PERSISTENT_STORES=true but postgres feature not enabled, falling back to in-memory"
    );
    Ok(Arc::new(InMemoryUserStore::new()))
}
