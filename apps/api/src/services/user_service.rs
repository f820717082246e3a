use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::errors::{ServiceError, ServiceResult};
use crate::auth::google::GoogleIdentityProvider;
use crate::auth::jwt::create_token;
use crate::auth::password::{hash_password, verify_password};
use crate::domain::errors::Violations;
use crate::domain::repositories::{Page, PageRequest, UserRepository, UserSortField};
use crate::domain::user::value_objects::{validate_phone_number, validate_username};
use crate::domain::user::{Email, User, UserRole};
use crate::infrastructure::cache::UserCache;

const MIN_PASSWORD_LEN: usize = 8;

/// Token settings and hashing cost used when issuing credentials
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub bcrypt_cost: u32,
}

/// Input for self-registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: String,
    pub full_name: String,
    pub role: Option<UserRole>,
    pub phone_number: Option<String>,
}

/// Fields a user may change on their own profile
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

/// A user with a freshly issued access token
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Accounts, credentials and role administration
///
/// Lookups by id and username go through a TTL cache that every write
/// invalidates.
pub struct UserService {
    users: Arc<dyn UserRepository>,
    cache: UserCache,
    google: Arc<dyn GoogleIdentityProvider>,
    settings: AuthSettings,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        cache: UserCache,
        google: Arc<dyn GoogleIdentityProvider>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            users,
            cache,
            google,
            settings,
        }
    }

    /// Creates an account; the role defaults to DLTEAM
    pub async fn register(&self, registration: Registration) -> ServiceResult<User> {
        let mut violations = Violations::new();
        if let Err(message) = validate_username(&registration.username) {
            violations.add("username", message);
        }
        violations.check(
            registration.password.chars().count() >= MIN_PASSWORD_LEN,
            "password",
            "Password must be at least 8 characters",
        );
        let email = Email::new(registration.email.as_str());
        if let Err(message) = &email {
            violations.add("email", message.as_str());
        }
        violations.check(
            !registration.full_name.trim().is_empty(),
            "full_name",
            "Full name is required",
        );
        if let Some(phone) = &registration.phone_number {
            if let Err(message) = validate_phone_number(phone) {
                violations.add("phone_number", message);
            }
        }
        violations.into_result()?;
        let email = email.map_err(|message| ServiceError::field("email", message))?;

        if self.users.exists_by_username(&registration.username).await? {
            return Err(ServiceError::field("username", "Username is already taken"));
        }
        if self.users.exists_by_email(&email).await? {
            return Err(ServiceError::field("email", "Email is already in use"));
        }

        let password_hash = hash_password(&registration.password, self.settings.bcrypt_cost)
            .map_err(|e| ServiceError::Internal(format!("Failed to hash password: {}", e)))?;

        let user = User::new(
            registration.username,
            password_hash,
            email,
            registration.full_name.trim().to_string(),
            registration.role.unwrap_or(UserRole::DlTeam),
            registration.phone_number,
        );
        self.users.create(&user).await?;

        info!(user_id = %user.id, username = %user.username, role = %user.role, "user registered");
        Ok(user)
    }

    /// Checks username and password and issues a token
    pub async fn authenticate(&self, username: &str, password: &str) -> ServiceResult<Session> {
        let invalid = || ServiceError::Unauthorized("Invalid username or password".to_string());

        let user = self.users.find_by_username(username).await?.ok_or_else(|| {
            warn!(username, "login attempt for unknown user");
            invalid()
        })?;

        let valid = verify_password(password, &user.password_hash).map_err(|e| {
            ServiceError::Internal(format!("Password verification failed: {}", e))
        })?;
        if !valid {
            warn!(username, "login attempt with wrong password");
            return Err(invalid());
        }
        if !user.enabled {
            warn!(username, "login attempt for disabled account");
            return Err(ServiceError::Unauthorized("Account is disabled".to_string()));
        }

        self.issue(user)
    }

    /// Completes Google sign-in, provisioning a DLTEAM account for new emails
    pub async fn login_with_google(&self, code: &str) -> ServiceResult<Session> {
        let profile = self.google.exchange_code(code).await?;
        let email = Email::new(profile.email.as_str())
            .map_err(ServiceError::Unauthorized)?;

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                if self.users.exists_by_username(email.as_str()).await? {
                    warn!(email = %email, "Google sign-in email is another account's username");
                    return Err(ServiceError::Conflict(format!(
                        "Username {} is already taken by another account",
                        email
                    )));
                }
                let random_password = Uuid::new_v4().to_string();
                let password_hash = hash_password(&random_password, self.settings.bcrypt_cost)
                    .map_err(|e| ServiceError::Internal(format!("Failed to hash password: {}", e)))?;
                let user = User::new(
                    email.as_str().to_string(),
                    password_hash,
                    email.clone(),
                    profile.name.unwrap_or_else(|| email.as_str().to_string()),
                    UserRole::DlTeam,
                    None,
                );
                self.users.create(&user).await?;
                info!(user_id = %user.id, email = %email, "user provisioned from Google sign-in");
                user
            }
        };

        if !user.enabled {
            return Err(ServiceError::Unauthorized("Account is disabled".to_string()));
        }
        self.issue(user)
    }

    fn issue(&self, user: User) -> ServiceResult<Session> {
        let token = create_token(&user, &self.settings.jwt_secret, self.settings.jwt_expiry_hours)
            .map_err(|e| ServiceError::Internal(format!("Failed to create token: {}", e)))?;
        info!(user_id = %user.id, "token issued");
        Ok(Session { user, token })
    }

    pub async fn get_by_id(&self, id: Uuid) -> ServiceResult<User> {
        if let Some(user) = self.cache.get_by_id(id).await {
            return Ok(user);
        }
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", "id", id))?;
        self.cache.put(&user).await;
        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> ServiceResult<User> {
        if let Some(user) = self.cache.get_by_username(username).await {
            return Ok(user);
        }
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", "username", username))?;
        self.cache.put(&user).await;
        Ok(user)
    }

    /// One page of users, optionally restricted to a role
    pub async fn list(
        &self,
        role: Option<UserRole>,
        request: &PageRequest<UserSortField>,
    ) -> ServiceResult<Page<User>> {
        Ok(self.users.find_page(role, request).await?)
    }

    pub async fn set_enabled(&self, id: Uuid, enabled: bool) -> ServiceResult<User> {
        let mut user = self.load(id).await?;
        user.enabled = enabled;
        user.touch();
        self.save(&user).await?;
        info!(user_id = %id, enabled, "user enabled flag changed");
        Ok(user)
    }

    pub async fn set_role(&self, id: Uuid, role: UserRole) -> ServiceResult<User> {
        let mut user = self.load(id).await?;
        user.role = role;
        user.touch();
        self.save(&user).await?;
        info!(user_id = %id, role = %role, "user role changed");
        Ok(user)
    }

    /// Applies the given profile fields; absent fields stay unchanged
    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> ServiceResult<User> {
        let mut user = self.load(id).await?;

        let mut violations = Violations::new();
        if let Some(full_name) = &update.full_name {
            violations.check(!full_name.trim().is_empty(), "full_name", "Full name is required");
        }
        let email = match update.email.as_deref().map(|e| Email::new(e)).transpose() {
            Ok(email) => email,
            Err(message) => {
                violations.add("email", message);
                None
            }
        };
        if let Some(phone) = &update.phone_number {
            if let Err(message) = validate_phone_number(phone) {
                violations.add("phone_number", message);
            }
        }
        violations.into_result()?;

        if let Some(email) = email {
            if email != user.email && self.users.exists_by_email(&email).await? {
                return Err(ServiceError::field("email", "Email is already in use"));
            }
            user.email = email;
        }
        if let Some(full_name) = update.full_name {
            user.full_name = full_name.trim().to_string();
        }
        if update.phone_number.is_some() {
            user.phone_number = update.phone_number;
        }
        user.touch();
        self.save(&user).await?;
        info!(user_id = %id, "profile updated");
        Ok(user)
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let user = self.load(id).await?;
        self.users.delete(id).await?;
        self.cache.invalidate(&user).await;
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// Reads straight from the repository, bypassing the cache
    async fn load(&self, id: Uuid) -> ServiceResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", "id", id))
    }

    async fn save(&self, user: &User) -> ServiceResult<()> {
        let result = self.users.update(user).await;
        self.cache.invalidate(user).await;
        Ok(result?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::google::{GoogleAuthError, GoogleProfile};
    use crate::infrastructure::repositories::InMemoryStore;
    use async_trait::async_trait;
    use std::time::Duration;

    struct FixedGoogle(Option<GoogleProfile>);

    #[async_trait]
    impl GoogleIdentityProvider for FixedGoogle {
        async fn exchange_code(&self, _code: &str) -> Result<GoogleProfile, GoogleAuthError> {
            self.0
                .clone()
                .ok_or_else(|| GoogleAuthError::InvalidToken("rejected".to_string()))
        }
    }

    fn service_with(google: Option<GoogleProfile>) -> UserService {
        UserService::new(
            Arc::new(InMemoryStore::new()),
            UserCache::new(Duration::from_secs(60)),
            Arc::new(FixedGoogle(google)),
            AuthSettings {
                jwt_secret: "unit-test-secret".to_string(),
                jwt_expiry_hours: 1,
                bcrypt_cost: 4,
            },
        )
    }

    fn registration(username: &str, email: &str) -> Registration {
        Registration {
            username: username.to_string(),
            password: "password123".to_string(),
            email: email.to_string(),
            full_name: "Kasun Silva".to_string(),
            role: None,
            phone_number: Some("+94771234567".to_string()),
        }
    }

    #[tokio::test]
    async fn register_defaults_to_dlteam_and_is_retrievable() {
        let service = service_with(None);
        let user = service.register(registration("kasun", "kasun@dlvery.io")).await.unwrap();

        assert_eq!(user.role, UserRole::DlTeam);
        assert!(user.enabled);
        assert_eq!(service.get_by_id(user.id).await.unwrap().username, "kasun");
        assert_eq!(service.get_by_username("kasun").await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn register_rejects_duplicates() {
        let service = service_with(None);
        service.register(registration("kasun", "kasun@dlvery.io")).await.unwrap();

        let same_name = service.register(registration("kasun", "other@dlvery.io")).await;
        assert!(matches!(same_name, Err(ServiceError::Validation(v)) if v[0].field == "username"));

        let same_email = service.register(registration("nimal", "kasun@dlvery.io")).await;
        assert!(matches!(same_email, Err(ServiceError::Validation(v)) if v[0].field == "email"));
    }

    #[tokio::test]
    async fn register_reports_every_invalid_field() {
        let service = service_with(None);
        let result = service
            .register(Registration {
                username: "a b".to_string(),
                password: "short".to_string(),
                email: "nope".to_string(),
                full_name: " ".to_string(),
                role: None,
                phone_number: Some("123".to_string()),
            })
            .await;

        match result {
            Err(ServiceError::Validation(list)) => {
                let fields: Vec<_> = list.iter().map(|v| v.field.as_str()).collect();
                assert_eq!(
                    fields,
                    vec!["username", "password", "email", "full_name", "phone_number"]
                );
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn authenticate_checks_password_and_enabled() {
        let service = service_with(None);
        let user = service.register(registration("kasun", "kasun@dlvery.io")).await.unwrap();

        let session = service.authenticate("kasun", "password123").await.unwrap();
        assert!(!session.token.is_empty());

        assert!(matches!(
            service.authenticate("kasun", "wrong-password").await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            service.authenticate("nobody", "password123").await,
            Err(ServiceError::Unauthorized(_))
        ));

        service.set_enabled(user.id, false).await.unwrap();
        assert!(matches!(
            service.authenticate("kasun", "password123").await,
            Err(ServiceError::Unauthorized(m)) if m == "Account is disabled"
        ));
    }

    #[tokio::test]
    async fn writes_invalidate_cached_user() {
        let service = service_with(None);
        let user = service.register(registration("kasun", "kasun@dlvery.io")).await.unwrap();
        assert_eq!(service.get_by_id(user.id).await.unwrap().role, UserRole::DlTeam);

        service.set_role(user.id, UserRole::InvTeam).await.unwrap();
        assert_eq!(service.get_by_id(user.id).await.unwrap().role, UserRole::InvTeam);

        service.delete(user.id).await.unwrap();
        assert!(matches!(
            service.get_by_id(user.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn profile_update_changes_only_given_fields() {
        let service = service_with(None);
        let user = service.register(registration("kasun", "kasun@dlvery.io")).await.unwrap();

        let updated = service
            .update_profile(
                user.id,
                ProfileUpdate {
                    full_name: Some("Kasun P. Silva".to_string()),
                    email: None,
                    phone_number: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.full_name, "Kasun P. Silva");
        assert_eq!(updated.email.as_str(), "kasun@dlvery.io");
        assert_eq!(updated.phone_number.as_deref(), Some("+94771234567"));
    }

    #[tokio::test]
    async fn google_sign_in_provisions_dlteam_user_once() {
        let service = service_with(Some(GoogleProfile {
            email: "rider@gmail.com".to_string(),
            name: Some("Rider".to_string()),
        }));

        let first = service.login_with_google("code-1").await.unwrap();
        let second = service.login_with_google("code-2").await.unwrap();

        assert_eq!(first.user.id, second.user.id);
        assert_eq!(first.user.username, "rider@gmail.com");
        assert_eq!(first.user.role, UserRole::DlTeam);
    }

    #[tokio::test]
    async fn google_email_taken_as_username_is_conflict() {
        let service = service_with(Some(GoogleProfile {
            email: "rider@gmail.com".to_string(),
            name: None,
        }));
        service
            .register(registration("rider@gmail.com", "rider.local@dlvery.io"))
            .await
            .unwrap();

        assert!(matches!(
            service.login_with_google("code-1").await,
            Err(ServiceError::Conflict(_))
        ));
        assert_eq!(
            service.get_by_username("rider@gmail.com").await.unwrap().email.as_str(),
            "rider.local@dlvery.io"
        );
    }

    #[tokio::test]
    async fn google_rejection_is_unauthorized() {
        let service = service_with(None);
        assert!(matches!(
            service.login_with_google("bad").await,
            Err(ServiceError::Unauthorized(_))
        ));
    }
}
