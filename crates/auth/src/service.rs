use crate::clock::Clock;
use crate::error::{AuthError, Result};
use crate::jwt::{Claims, JwtService};
use crate::password::PasswordHasher;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use usercore_database::{CredentialStore, SessionStore};
use usercore_models::{NewSession, NewUser, SessionState, User, UserProfile};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8))]
    pub password: String,

    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub birthdate: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,

    // Device context recorded on the session
    pub user_agent: String,
    pub client_ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Registration, login, refresh-token rotation and logout.
///
/// Holds no per-call state. Every mutation goes through the stores, and
/// the engine itself never logs; callers decide what to report.
pub struct AuthService {
    pub jwt: JwtService,
    users: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
    // Verified against on unknown emails so both login failures cost the same
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        jwt: JwtService,
        hasher: PasswordHasher,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let dummy_hash = hasher.hash("usercore-dummy-password")?;

        Ok(Self {
            jwt,
            users,
            sessions,
            hasher,
            clock,
            dummy_hash,
        })
    }

    /// Register a new user
    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile> {
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = self.hasher.hash(&request.password)?;

        let new_user = NewUser {
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            phone: request.phone,
            birthdate: request.birthdate,
        };

        // A concurrent registration can still win the unique index
        let user = self
            .users
            .create(&new_user, &password_hash)
            .await
            .map_err(|e| {
                if e.is_duplicate() {
                    AuthError::EmailAlreadyExists
                } else {
                    AuthError::RepositoryError(e)
                }
            })?;

        Ok(user.into())
    }

    /// Login with email and password, opening a new session
    pub async fn login(&self, request: LoginRequest) -> Result<TokenPair> {
        let Some(user) = self.users.find_by_email(&request.email).await? else {
            self.hasher.verify(&self.dummy_hash, &request.password);
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(&user.password_hash, &request.password) {
            return Err(AuthError::InvalidCredentials);
        }

        let (tokens, expires_at) = self.issue_token_pair(&user)?;

        // No session, no tokens: a refresh token without a row is useless
        self.sessions
            .create(&NewSession {
                user_id: user.id,
                refresh_token: tokens.refresh_token.clone(),
                user_agent: request.user_agent,
                client_ip: request.client_ip,
                expires_at,
            })
            .await?;

        Ok(tokens)
    }

    /// Exchange a refresh token for a new pair, revoking the presented one.
    ///
    /// A revoked token being presented again is treated as replay: it is
    /// refused and nothing else is touched. The old session is revoked
    /// before anything new is issued and stays revoked even if a later step
    /// fails.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair> {
        self.jwt.validate_refresh_token(refresh_token)?;

        let session = self
            .sessions
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::InvalidSession)?;

        match session.state(self.clock.now()) {
            SessionState::Revoked => return Err(AuthError::SessionRevoked),
            SessionState::Expired => return Err(AuthError::SessionExpired),
            SessionState::Active => {}
        }

        // Lost a race with a concurrent rotation of the same token
        if !self.sessions.revoke(session.id).await? {
            return Err(AuthError::SessionRevoked);
        }

        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let (tokens, expires_at) = self.issue_token_pair(&user)?;

        self.sessions
            .create(&NewSession {
                user_id: user.id,
                refresh_token: tokens.refresh_token.clone(),
                user_agent: session.user_agent,
                client_ip: session.client_ip,
                expires_at,
            })
            .await?;

        Ok(tokens)
    }

    /// Logout (revoke the session bound to this refresh token).
    ///
    /// Unknown tokens succeed without touching the store.
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        let Some(session) = self.sessions.find_by_refresh_token(refresh_token).await? else {
            return Ok(());
        };

        if !session.revoked {
            self.sessions.revoke(session.id).await?;
        }

        Ok(())
    }

    /// Revoke every session of a user. Issued access tokens stay valid until
    /// they expire.
    pub async fn logout_all(&self, user_id: i64) -> Result<u64> {
        Ok(self.sessions.revoke_all_for_user(user_id).await?)
    }

    /// Validate an access token without consulting any store
    pub fn authenticate(&self, access_token: &str) -> Result<Claims> {
        self.jwt.validate_access_token(access_token)
    }

    fn issue_token_pair(&self, user: &User) -> Result<(TokenPair, DateTime<Utc>)> {
        let access = self.jwt.generate_access_token(user)?;
        let refresh = self.jwt.generate_refresh_token(user)?;

        Ok((
            TokenPair {
                access_token: access.token,
                refresh_token: refresh.token,
            },
            refresh.expires_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::jwt::JwtConfig;
    use async_trait::async_trait;
    use chrono::Duration;
    use usercore_database::{DatabaseError, MemoryCredentialStore, MemorySessionStore};
    use usercore_models::{Session, UserUpdate};

    const SECRET: &str = "test-secret-key-for-unit-tests-0123456789";

    struct Harness {
        service: AuthService,
        users: Arc<MemoryCredentialStore>,
        sessions: Arc<MemorySessionStore>,
        clock: Arc<ManualClock>,
    }

    fn build_service(
        users: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        clock: Arc<ManualClock>,
    ) -> AuthService {
        let jwt = JwtService::new(JwtConfig::new(SECRET), clock.clone()).unwrap();
        AuthService::new(
            users,
            sessions,
            jwt,
            PasswordHasher::new(crate::password::MIN_COST).unwrap(),
            clock,
        )
        .unwrap()
    }

    fn harness() -> Harness {
        let users = Arc::new(MemoryCredentialStore::new());
        let sessions = Arc::new(MemorySessionStore::new());
        let clock = Arc::new(ManualClock::default());
        let service = build_service(users.clone(), sessions.clone(), clock.clone());

        Harness {
            service,
            users,
            sessions,
            clock,
        }
    }

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            first_name: None,
            last_name: None,
            phone: None,
            birthdate: None,
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            user_agent: "TestAgent/1.0".to_string(),
            client_ip: "127.0.0.1".to_string(),
        }
    }

    async fn register_and_login(h: &Harness, email: &str) -> TokenPair {
        h.service
            .register(register_request(email, "password123"))
            .await
            .expect("register failed");
        h.service
            .login(login_request(email, "password123"))
            .await
            .expect("login failed")
    }

    async fn session_for(h: &Harness, refresh_token: &str) -> Session {
        h.sessions
            .find_by_refresh_token(refresh_token)
            .await
            .unwrap()
            .expect("session missing")
    }

    /// Memory credential store with injectable faults.
    #[derive(Default)]
    struct FaultyCredentialStore {
        inner: MemoryCredentialStore,
        fail_lookup: bool,
        duplicate_on_create: bool,
    }

    #[async_trait]
    impl CredentialStore for FaultyCredentialStore {
        async fn create(
            &self,
            new_user: &NewUser,
            password_hash: &str,
        ) -> usercore_database::Result<User> {
            if self.duplicate_on_create {
                return Err(DatabaseError::duplicate("User", "email"));
            }
            self.inner.create(new_user, password_hash).await
        }

        async fn find_by_email(&self, email: &str) -> usercore_database::Result<Option<User>> {
            if self.fail_lookup {
                return Err(DatabaseError::Other("database connection failed".to_string()));
            }
            self.inner.find_by_email(email).await
        }

        async fn find_by_id(&self, id: i64) -> usercore_database::Result<Option<User>> {
            self.inner.find_by_id(id).await
        }

        async fn update(
            &self,
            id: i64,
            update: &UserUpdate,
        ) -> usercore_database::Result<Option<User>> {
            self.inner.update(id, update).await
        }

        async fn delete(&self, id: i64) -> usercore_database::Result<bool> {
            self.inner.delete(id).await
        }

        async fn list(&self, offset: i64, limit: i64) -> usercore_database::Result<(Vec<User>, i64)> {
            self.inner.list(offset, limit).await
        }
    }

    /// Memory session store with injectable faults.
    #[derive(Default)]
    struct FaultySessionStore {
        inner: MemorySessionStore,
        fail_create: bool,
        lose_revoke_race: bool,
    }

    #[async_trait]
    impl SessionStore for FaultySessionStore {
        async fn create(&self, new_session: &NewSession) -> usercore_database::Result<Session> {
            if self.fail_create {
                return Err(DatabaseError::Other("session insert failed".to_string()));
            }
            self.inner.create(new_session).await
        }

        async fn find_by_refresh_token(
            &self,
            refresh_token: &str,
        ) -> usercore_database::Result<Option<Session>> {
            self.inner.find_by_refresh_token(refresh_token).await
        }

        async fn revoke(&self, session_id: i64) -> usercore_database::Result<bool> {
            if self.lose_revoke_race {
                // Someone else flipped it between our read and our update
                self.inner.revoke(session_id).await?;
                return Ok(false);
            }
            self.inner.revoke(session_id).await
        }

        async fn revoke_all_for_user(&self, user_id: i64) -> usercore_database::Result<u64> {
            self.inner.revoke_all_for_user(user_id).await
        }
    }

    #[test]
    fn test_dummy_hash_uses_configured_cost() {
        let h = harness();

        assert!(h.service.dummy_hash.starts_with("$2b$04$"));
        assert!(!h.service.hasher.verify(&h.service.dummy_hash, "password123"));
    }

    // --- Register ---

    #[tokio::test]
    async fn test_register_then_login() {
        let h = harness();

        let profile = h
            .service
            .register(register_request("test@example.com", "password123"))
            .await
            .unwrap();
        assert_eq!(profile.email, "test@example.com");

        let tokens = h
            .service
            .login(login_request("test@example.com", "password123"))
            .await
            .unwrap();
        assert!(!tokens.access_token.is_empty());
        assert!(!tokens.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let h = harness();
        h.service
            .register(register_request("test@example.com", "password123"))
            .await
            .unwrap();

        let user = h
            .users
            .find_by_email("test@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(user.password_hash, "password123");
        assert!(user.password_hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_register_keeps_profile_fields() {
        let h = harness();
        let mut request = register_request("test@example.com", "password123");
        request.first_name = Some("Test".to_string());
        request.birthdate = NaiveDate::from_ymd_opt(2000, 1, 31);

        let profile = h.service.register(request).await.unwrap();

        assert_eq!(profile.first_name.as_deref(), Some("Test"));
        assert_eq!(profile.birthdate, NaiveDate::from_ymd_opt(2000, 1, 31));
    }

    #[tokio::test]
    async fn test_register_email_already_exists() {
        let h = harness();
        h.service
            .register(register_request("test@example.com", "password123"))
            .await
            .unwrap();
        assert_eq!(h.users.write_count(), 1);

        let err = h
            .service
            .register(register_request("test@example.com", "different-password"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::EmailAlreadyExists));
        assert_eq!(h.users.write_count(), 1);
    }

    #[tokio::test]
    async fn test_register_lookup_failure_is_repository_error() {
        let users = Arc::new(FaultyCredentialStore {
            fail_lookup: true,
            ..Default::default()
        });
        let service = build_service(
            users.clone(),
            Arc::new(MemorySessionStore::new()),
            Arc::new(ManualClock::default()),
        );

        let err = service
            .register(register_request("test@example.com", "password123"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::RepositoryError(_)));
        assert_eq!(users.inner.write_count(), 0);
    }

    #[tokio::test]
    async fn test_register_race_on_unique_index() {
        let users = Arc::new(FaultyCredentialStore {
            duplicate_on_create: true,
            ..Default::default()
        });
        let service = build_service(
            users,
            Arc::new(MemorySessionStore::new()),
            Arc::new(ManualClock::default()),
        );

        let err = service
            .register(register_request("test@example.com", "password123"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::EmailAlreadyExists));
    }

    // --- Login ---

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let h = harness();
        h.service
            .register(register_request("test@example.com", "correct-password"))
            .await
            .unwrap();

        let unknown = h
            .service
            .login(login_request("nonexistent@example.com", "correct-password"))
            .await
            .unwrap_err();
        let wrong = h
            .service
            .login(login_request("test@example.com", "wrong-password"))
            .await
            .unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(h.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_login_creates_session() {
        let h = harness();
        let tokens = register_and_login(&h, "test@example.com").await;

        let session = session_for(&h, &tokens.refresh_token).await;
        assert_eq!(session.user_agent, "TestAgent/1.0");
        assert_eq!(session.client_ip, "127.0.0.1");
        assert!(!session.revoked);

        let expected_expiry = h.clock.now() + Duration::hours(7 * 24);
        assert_eq!(session.expires_at, expected_expiry);

        let claims = h.service.authenticate(&tokens.access_token).unwrap();
        assert_eq!(claims.sub, session.user_id);
        assert_eq!(claims.email.as_deref(), Some("test@example.com"));
    }

    #[tokio::test]
    async fn test_login_session_create_failure() {
        let users = Arc::new(MemoryCredentialStore::new());
        let sessions = Arc::new(FaultySessionStore {
            fail_create: true,
            ..Default::default()
        });
        let service = build_service(users, sessions, Arc::new(ManualClock::default()));
        service
            .register(register_request("test@example.com", "password123"))
            .await
            .unwrap();

        let err = service
            .login(login_request("test@example.com", "password123"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::RepositoryError(_)));
    }

    // --- RefreshToken ---

    #[tokio::test]
    async fn test_refresh_rotates_session() {
        let h = harness();
        let tokens = register_and_login(&h, "test@example.com").await;
        h.clock.advance(Duration::minutes(1));

        let rotated = h.service.refresh_token(&tokens.refresh_token).await.unwrap();

        assert_ne!(rotated.refresh_token, tokens.refresh_token);
        assert_ne!(rotated.access_token, tokens.access_token);

        let old = session_for(&h, &tokens.refresh_token).await;
        let new = session_for(&h, &rotated.refresh_token).await;
        assert!(old.revoked);
        assert!(!new.revoked);
        assert_eq!(new.user_agent, old.user_agent);
        assert_eq!(new.client_ip, old.client_ip);
        assert!(new.expires_at > old.expires_at);
    }

    #[tokio::test]
    async fn test_refresh_replay_is_rejected() {
        let h = harness();
        let tokens = register_and_login(&h, "test@example.com").await;

        h.service.refresh_token(&tokens.refresh_token).await.unwrap();
        assert_eq!(h.sessions.len().await, 2);

        let err = h
            .service
            .refresh_token(&tokens.refresh_token)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::SessionRevoked));
        assert_eq!(h.sessions.len().await, 2);
    }

    #[tokio::test]
    async fn test_refresh_replay_does_not_revoke_other_sessions() {
        let h = harness();
        let tokens = register_and_login(&h, "test@example.com").await;
        let rotated = h.service.refresh_token(&tokens.refresh_token).await.unwrap();

        let _ = h.service.refresh_token(&tokens.refresh_token).await;

        assert!(!session_for(&h, &rotated.refresh_token).await.revoked);
        assert!(h.service.refresh_token(&rotated.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_invalid_token() {
        let h = harness();
        let tokens = register_and_login(&h, "test@example.com").await;

        let err = h
            .service
            .refresh_token("invalid-token-string")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));

        // Access tokens cannot be used to refresh
        let err = h
            .service
            .refresh_token(&tokens.access_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_refresh_expired_token() {
        let h = harness();
        let tokens = register_and_login(&h, "test@example.com").await;

        h.clock.advance(Duration::hours(7 * 24) + Duration::seconds(1));

        let err = h
            .service
            .refresh_token(&tokens.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
        assert!(!session_for(&h, &tokens.refresh_token).await.revoked);
    }

    #[tokio::test]
    async fn test_refresh_without_session() {
        let h = harness();
        let profile = h
            .service
            .register(register_request("test@example.com", "password123"))
            .await
            .unwrap();
        let user = h.users.find_by_id(profile.id).await.unwrap().unwrap();

        // Correctly signed, but never bound to a session
        let orphan = h.service.jwt.generate_refresh_token(&user).unwrap();

        let err = h.service.refresh_token(&orphan.token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSession));
    }

    #[tokio::test]
    async fn test_refresh_expired_session() {
        let h = harness();
        let profile = h
            .service
            .register(register_request("test@example.com", "password123"))
            .await
            .unwrap();
        let user = h.users.find_by_id(profile.id).await.unwrap().unwrap();
        let refresh = h.service.jwt.generate_refresh_token(&user).unwrap();

        h.sessions
            .create(&NewSession {
                user_id: user.id,
                refresh_token: refresh.token.clone(),
                user_agent: String::new(),
                client_ip: String::new(),
                expires_at: h.clock.now() - Duration::seconds(1),
            })
            .await
            .unwrap();

        let err = h.service.refresh_token(&refresh.token).await.unwrap_err();

        assert!(matches!(err, AuthError::SessionExpired));
        assert!(!session_for(&h, &refresh.token).await.revoked);
        assert_eq!(h.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_refresh_user_deleted() {
        let h = harness();
        let tokens = register_and_login(&h, "test@example.com").await;
        let session = session_for(&h, &tokens.refresh_token).await;
        assert!(h.users.delete(session.user_id).await.unwrap());

        let err = h
            .service
            .refresh_token(&tokens.refresh_token)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::UserNotFound));
        // Revocation is not rolled back
        assert!(session_for(&h, &tokens.refresh_token).await.revoked);
        assert_eq!(h.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_refresh_loses_concurrent_rotation() {
        let sessions = Arc::new(FaultySessionStore {
            lose_revoke_race: true,
            ..Default::default()
        });
        let service = build_service(
            Arc::new(MemoryCredentialStore::new()),
            sessions.clone(),
            Arc::new(ManualClock::default()),
        );
        service
            .register(register_request("test@example.com", "password123"))
            .await
            .unwrap();
        let tokens = service
            .login(login_request("test@example.com", "password123"))
            .await
            .unwrap();

        let err = service
            .refresh_token(&tokens.refresh_token)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::SessionRevoked));
        assert_eq!(sessions.inner.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_has_single_winner() {
        let h = harness();
        let tokens = register_and_login(&h, "test@example.com").await;
        let service = Arc::new(h.service);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let service = Arc::clone(&service);
                let token = tokens.refresh_token.clone();
                tokio::spawn(async move { service.refresh_token(&token).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(e) => assert!(matches!(e, AuthError::SessionRevoked)),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(h.sessions.len().await, 2);
    }

    // --- Logout ---

    #[tokio::test]
    async fn test_logout_unknown_token_is_noop() {
        let h = harness();
        register_and_login(&h, "test@example.com").await;
        let writes = h.sessions.write_count();

        h.service.logout("unknown-refresh-token").await.unwrap();

        assert_eq!(h.sessions.write_count(), writes);
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let h = harness();
        let tokens = register_and_login(&h, "test@example.com").await;

        h.service.logout(&tokens.refresh_token).await.unwrap();
        assert!(session_for(&h, &tokens.refresh_token).await.revoked);

        // Idempotent
        h.service.logout(&tokens.refresh_token).await.unwrap();

        let err = h
            .service
            .refresh_token(&tokens.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::SessionRevoked));
    }

    #[tokio::test]
    async fn test_access_token_survives_logout_until_expiry() {
        let h = harness();
        let tokens = register_and_login(&h, "test@example.com").await;

        h.service.logout(&tokens.refresh_token).await.unwrap();
        assert!(h.service.authenticate(&tokens.access_token).is_ok());

        h.clock.advance(Duration::minutes(15));
        assert!(h.service.authenticate(&tokens.access_token).is_err());
    }

    #[tokio::test]
    async fn test_logout_all_revokes_every_session() {
        let h = harness();
        let first = register_and_login(&h, "test@example.com").await;
        let second = h
            .service
            .login(login_request("test@example.com", "password123"))
            .await
            .unwrap();
        let other = register_and_login(&h, "other@example.com").await;

        let user_id = h.service.authenticate(&first.access_token).unwrap().sub;
        assert_eq!(h.service.logout_all(user_id).await.unwrap(), 2);

        for token in [&first.refresh_token, &second.refresh_token] {
            let err = h.service.refresh_token(token).await.unwrap_err();
            assert!(matches!(err, AuthError::SessionRevoked));
        }
        assert!(h.service.refresh_token(&other.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_refresh_token() {
        let h = harness();
        let tokens = register_and_login(&h, "test@example.com").await;

        let err = h.service.authenticate(&tokens.refresh_token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_rotation_replay_scenario() {
        let h = harness();
        h.service
            .register(register_request("alice@example.com", "password123"))
            .await
            .unwrap();

        let first = h
            .service
            .login(login_request("alice@example.com", "password123"))
            .await
            .unwrap();
        let second = h.service.refresh_token(&first.refresh_token).await.unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);

        let err = h
            .service
            .refresh_token(&first.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::SessionRevoked));
    }
}
