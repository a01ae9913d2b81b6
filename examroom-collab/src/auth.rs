use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use log::info;
use rand::rngs::OsRng;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::spawn_blocking;

use crate::{
    util::random_string, Database, DatabaseError, NewSession, NewUser, SessionData, UserData,
    UserRole,
};

pub struct Auth<Db> {
    db: Arc<Db>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password is incorrect
    #[error("Invalid username or password")]
    InvalidCredentials,
    /// The session is valid but its user lacks the required role
    #[error("Admin access required")]
    Forbidden,
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
}

impl<Db> Auth<Db>
where
    Db: Database,
{
    const SESSION_DURATION_IN_HOURS: i64 = 24;
    const TOKEN_LENGTH: usize = 32;

    pub fn new(db: &Arc<Db>) -> Self {
        Self { db: db.clone() }
    }

    /// Creates a new user, returning a session for it.
    ///
    /// The store assigns the role, so the first user ever registered becomes
    /// an admin.
    pub async fn register(&self, new_user: NewPlainUser) -> Result<SessionData, AuthError> {
        let hashed_password = hash_password(new_user.password).await?;

        let user = self
            .db
            .create_user(NewUser {
                username: new_user.username,
                email: new_user.email,
                password: hashed_password,
            })
            .await
            .map_err(AuthError::Db)?;

        info!(
            "New {} account registered: {}",
            user.role.as_str(),
            user.username
        );

        self.issue_session(user).await
    }

    /// Logs in a user, returning a new session.
    ///
    /// An unknown username and a failed verification produce the same error,
    /// so a caller can't probe which usernames exist.
    pub async fn login(&self, credentials: Credentials) -> Result<SessionData, AuthError> {
        self.clear_expired().await?;

        let user = match self.db.user_by_username(&credentials.username).await {
            Ok(user) => Some(user),
            Err(DatabaseError::NotFound { .. }) => None,
            Err(e) => return Err(AuthError::Db(e)),
        };

        let verified = match &user {
            Some(user) => verify_password(credentials.password, user.password.clone()).await?,
            None => false,
        };

        let user = user
            .filter(|_| verified)
            .ok_or(AuthError::InvalidCredentials)?;

        self.issue_session(user).await
    }

    /// Deletes the associated session, if it exists
    pub async fn logout(&self, token: &str) -> Result<(), DatabaseError> {
        self.db.delete_session_by_token(token).await
    }

    /// Returns a session if it exists and hasn't expired
    pub async fn session(&self, token: &str) -> Result<SessionData, DatabaseError> {
        self.db.session_by_token(token).await
    }

    async fn issue_session(&self, user: UserData) -> Result<SessionData, AuthError> {
        let expires_at = Utc::now() + Duration::hours(Self::SESSION_DURATION_IN_HOURS);

        let new_session = NewSession {
            token: random_string(Self::TOKEN_LENGTH),
            user_id: user.id,
            expires_at,
        };

        self.db
            .create_session(new_session)
            .await
            .map_err(AuthError::Db)
    }

    async fn clear_expired(&self) -> Result<(), AuthError> {
        self.db
            .clear_expired_sessions()
            .await
            .map_err(AuthError::Db)
    }
}

impl SessionData {
    /// Decides if the session's user may perform an operation requiring
    /// `required`. Pure with respect to session and role data.
    pub fn authorize(&self, required: UserRole) -> Result<(), AuthError> {
        if self.user.role.grants(required) {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

/// Hashes a password on the blocking pool, since argon2 is CPU-bound
async fn hash_password(plaintext: String) -> Result<String, AuthError> {
    spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::HashError(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::HashError(e.to_string()))?
}

/// Verifies a password against a stored hash on the blocking pool
async fn verify_password(plaintext: String, stored: String) -> Result<bool, AuthError> {
    spawn_blocking(move || {
        let parsed = PasswordHash::parse(&stored, Encoding::default())
            .map_err(|e| AuthError::HashError(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AuthError::HashError(e.to_string()))?
}

#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug)]
pub struct NewPlainUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod test {
    use crate::MemoryDatabase;

    use super::*;

    fn auth() -> Auth<MemoryDatabase> {
        let db = Arc::new(MemoryDatabase::new());
        Auth::new(&db)
    }

    fn alice() -> NewPlainUser {
        NewPlainUser {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "correct horse".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_issues_a_valid_session() {
        let auth = auth();

        let session = auth.register(alice()).await.unwrap();
        assert_eq!(session.user.role, UserRole::Admin);

        let validated = auth.session(&session.token).await.unwrap();
        assert_eq!(validated.user.username, "alice");
        assert_eq!(validated.user.email, "alice@x.com");
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let auth = auth();
        auth.register(alice()).await.unwrap();

        let wrong_password = auth
            .login(Credentials {
                username: "alice".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();

        let unknown_user = auth
            .login(Credentials {
                username: "nobody".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_login_returns_a_fresh_session() {
        let auth = auth();

        let registered = auth.register(alice()).await.unwrap();

        let logged_in = auth
            .login(Credentials {
                username: "alice".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();

        assert_ne!(registered.token, logged_in.token);
        assert!(auth.session(&logged_in.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_revokes_the_session() {
        let auth = auth();

        let session = auth.register(alice()).await.unwrap();
        auth.logout(&session.token).await.unwrap();

        assert!(auth.session(&session.token).await.is_err());
        assert!(auth.logout(&session.token).await.is_err());
    }

    #[tokio::test]
    async fn test_authorization_gate() {
        let auth = auth();

        let admin = auth.register(alice()).await.unwrap();
        let candidate = auth
            .register(NewPlainUser {
                username: "bob".to_string(),
                email: "bob@x.com".to_string(),
                password: "some password".to_string(),
            })
            .await
            .unwrap();

        assert!(admin.authorize(UserRole::Admin).is_ok());
        assert!(admin.authorize(UserRole::Candidate).is_ok());
        assert!(candidate.authorize(UserRole::Candidate).is_ok());

        let denied = candidate.authorize(UserRole::Admin).unwrap_err();
        assert!(matches!(denied, AuthError::Forbidden));
    }
}
