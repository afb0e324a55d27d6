// ============================================================================
// QRest Core - Authentication Service
// File: crates/qrest-core/src/services/auth_service.rs
// ============================================================================
//! Registration, login and token lifecycle

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use qrest_security::password::PasswordService;
use qrest_security::token::hash_token;
use qrest_security::{JwtError, JwtService, TokenSubject};
use qrest_shared::utils::normalize_email;

use crate::domain::{Membership, MembershipWithOrg, Organization, RefreshToken, Role, User};
use crate::error::DomainError;
use crate::repositories::{
    AuthTokenRepository, MembershipRepository, OrganizationRepository, UserRepository,
};

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub name: String,
    pub organization_name: String,
    pub organization_slug: String,
}

/// Organization placed in the caller's tokens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationContext {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub user: User,
    pub organization: Option<OrganizationContext>,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResult {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(flatten)]
    pub user: User,
    pub organizations: Vec<MembershipWithOrg>,
}

/// Authentication service for register/login/refresh/logout flows
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    memberships: Arc<dyn MembershipRepository>,
    tokens: Arc<dyn AuthTokenRepository>,
    jwt: Arc<JwtService>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        memberships: Arc<dyn MembershipRepository>,
        tokens: Arc<dyn AuthTokenRepository>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            users,
            organizations,
            memberships,
            tokens,
            jwt,
        }
    }

    /// Register a user together with a new organization they own
    pub async fn register(&self, input: RegisterInput) -> Result<AuthResult, DomainError> {
        let email = normalize_email(&input.email);
        info!("Registration attempt for email: {}", email);

        // 1. Email and slug must be free
        if self.users.find_by_email(&email).await?.is_some() {
            warn!("Registration failed: email already exists: {}", email);
            return Err(DomainError::EmailAlreadyExists(email));
        }
        if self
            .organizations
            .find_by_slug(&input.organization_slug)
            .await?
            .is_some()
        {
            warn!("Registration failed: slug taken: {}", input.organization_slug);
            return Err(DomainError::SlugAlreadyExists(input.organization_slug));
        }

        // 2. Build entities
        let password_hash = PasswordService::hash(&input.password)
            .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;
        let user = User::new(&email, password_hash, Some(input.name))?;
        let org = Organization::new(&input.organization_name, &input.organization_slug)?;
        let membership = Membership::new_owner(user.id, org.id);

        // 3. Persist atomically
        self.organizations
            .create_with_owner(&org, &user, &membership)
            .await?;

        // 4. Issue tokens
        let context = OrganizationContext {
            id: org.id,
            name: org.name.clone(),
            slug: org.slug.clone(),
            role: Role::Owner,
        };
        let (access_token, refresh_token) = self.issue_tokens(&user, Some(&context)).await?;

        info!("Registration successful for: {} (org {})", email, org.slug);

        Ok(AuthResult {
            user,
            organization: Some(context),
            access_token,
            refresh_token,
        })
    }

    /// Login with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult, DomainError> {
        let email = normalize_email(email);
        info!("Login attempt for email: {}", email);

        // 1. Find user by email
        let mut user = self.users.find_by_email(&email).await?.ok_or_else(|| {
            warn!("Login failed: email not found: {}", email);
            DomainError::InvalidCredentials
        })?;

        // 2. Verify password
        let valid = PasswordService::verify(password, &user.password_hash)
            .map_err(|_| DomainError::InvalidCredentials)?;
        if !valid {
            warn!("Login failed: invalid password for: {}", email);
            return Err(DomainError::InvalidCredentials);
        }

        // 3. Upgrade legacy hashes
        if PasswordService::needs_rehash(&user.password_hash) {
            match PasswordService::hash(password) {
                Ok(hash) => {
                    user.set_password_hash(hash);
                    if let Err(e) = self.users.update(&user).await {
                        error!("Failed to upgrade password hash: {}", e);
                    }
                }
                Err(e) => error!("Failed to upgrade password hash: {}", e),
            }
        }

        // 4. Token organization is the first membership
        let context = self.organization_context(&user.id).await?;
        let (access_token, refresh_token) = self.issue_tokens(&user, context.as_ref()).await?;

        info!("Login successful for: {}", email);

        Ok(AuthResult {
            user,
            organization: context,
            access_token,
            refresh_token,
        })
    }

    /// Exchange a stored, unrevoked refresh token for a new access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResult, DomainError> {
        let claims = self.jwt.verify_refresh_token(refresh_token).map_err(|e| match e {
            JwtError::TokenExpired => DomainError::Unauthenticated("Refresh token has expired".into()),
            _ => DomainError::Unauthenticated("Invalid refresh token".into()),
        })?;

        let stored = self
            .tokens
            .find_refresh_token(&hash_token(refresh_token))
            .await?
            .ok_or_else(|| DomainError::Unauthenticated("Invalid refresh token".into()))?;

        if stored.revoked {
            warn!("Refresh rejected: revoked token for user {}", stored.user_id);
            return Err(DomainError::Unauthenticated("Refresh token has been revoked".into()));
        }
        if stored.is_expired() {
            return Err(DomainError::Unauthenticated("Refresh token has expired".into()));
        }

        let user = self
            .users
            .find_by_id(&claims.user_id)
            .await?
            .ok_or_else(|| DomainError::Unauthenticated("User no longer exists".into()))?;

        let context = self.organization_context(&user.id).await?;
        let access_token = self
            .jwt
            .generate_access_token(&subject(&user, context.as_ref()))
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))?;

        Ok(RefreshResult { access_token })
    }

    /// Revoke a refresh token. Unknown tokens are ignored.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), DomainError> {
        let revoked = self
            .tokens
            .revoke_refresh_token(&hash_token(refresh_token))
            .await?;
        if revoked {
            info!("Refresh token revoked");
        }
        Ok(())
    }

    pub async fn current_user(&self, user_id: &Uuid) -> Result<CurrentUser, DomainError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::NotFound("User"))?;
        let organizations = self.memberships.list_for_user(user_id).await?;
        Ok(CurrentUser { user, organizations })
    }

    async fn organization_context(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<OrganizationContext>, DomainError> {
        let Some(membership) = self.memberships.first_for_user(user_id).await? else {
            return Ok(None);
        };
        let org = self.organizations.find_by_id(&membership.org_id).await?;
        Ok(org.map(|org| OrganizationContext {
            id: org.id,
            name: org.name,
            slug: org.slug,
            role: membership.role,
        }))
    }

    async fn issue_tokens(
        &self,
        user: &User,
        context: Option<&OrganizationContext>,
    ) -> Result<(String, String), DomainError> {
        let subject = subject(user, context);
        let access_token = self
            .jwt
            .generate_access_token(&subject)
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))?;
        let refresh_token = self
            .jwt
            .generate_refresh_token(&subject)
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))?;

        let record = RefreshToken::new(
            user.id,
            hash_token(&refresh_token),
            self.jwt.refresh_token_expiry(),
        );
        self.tokens.create_refresh_token(&record).await?;

        Ok((access_token, refresh_token))
    }
}

fn subject(user: &User, context: Option<&OrganizationContext>) -> TokenSubject {
    TokenSubject {
        user_id: user.id,
        email: user.email.clone(),
        org_id: context.map(|c| c.id),
        role: context.map(|c| c.role.as_str().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{
        MockAuthTokenRepository, MockMembershipRepository, MockOrganizationRepository,
        MockUserRepository,
    };
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;
    use qrest_shared::config::JwtSettings;

    fn jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new(&JwtSettings {
            access_secret: "test-access-secret-test-access-secret".into(),
            refresh_secret: "test-refresh-secret-test-refresh-secret".into(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
            preview_token_expiry: 86400,
        }))
    }

    fn input(email: &str) -> RegisterInput {
        RegisterInput {
            email: email.to_string(),
            password: "Password123!".into(),
            name: "Owner".into(),
            organization_name: "Demo Restaurant".into(),
            organization_slug: "demo-restaurant".into(),
        }
    }

    fn service(
        users: MockUserRepository,
        orgs: MockOrganizationRepository,
        memberships: MockMembershipRepository,
        tokens: MockAuthTokenRepository,
    ) -> AuthService {
        AuthService::new(
            Arc::new(users),
            Arc::new(orgs),
            Arc::new(memberships),
            Arc::new(tokens),
            jwt(),
        )
    }

    #[tokio::test]
    async fn test_register_success() {
        let email: String = SafeEmail().fake();
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        let mut orgs = MockOrganizationRepository::new();
        orgs.expect_find_by_slug().returning(|_| Ok(None));
        orgs.expect_create_with_owner()
            .withf(|org, user, m| m.org_id == org.id && m.user_id == user.id && m.is_owner())
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut tokens = MockAuthTokenRepository::new();
        tokens.expect_create_refresh_token().times(1).returning(|_| Ok(()));

        let svc = service(users, orgs, MockMembershipRepository::new(), tokens);
        let result = svc.register(input(&email)).await.unwrap();

        assert_eq!(result.user.email, email.to_lowercase());
        let org = result.organization.unwrap();
        assert_eq!(org.role, Role::Owner);
        let claims = jwt().verify_access_token(&result.access_token).unwrap();
        assert_eq!(claims.org_id, Some(org.id));
        assert_eq!(claims.role.as_deref(), Some("OWNER"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|email| {
            Ok(Some(User::new(email, "hash".into(), None).unwrap()))
        });
        let svc = service(
            users,
            MockOrganizationRepository::new(),
            MockMembershipRepository::new(),
            MockAuthTokenRepository::new(),
        );
        let err = svc.register(input("taken@demo.com")).await.unwrap_err();
        assert!(matches!(err, DomainError::EmailAlreadyExists(_)));
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[tokio::test]
    async fn test_register_duplicate_slug() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        let mut orgs = MockOrganizationRepository::new();
        orgs.expect_find_by_slug()
            .returning(|slug| Ok(Some(Organization::new("Other", slug).unwrap())));
        let svc = service(
            users,
            orgs,
            MockMembershipRepository::new(),
            MockAuthTokenRepository::new(),
        );
        let err = svc.register(input("new@demo.com")).await.unwrap_err();
        assert_eq!(err.to_string(), "Organization slug already taken");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let hash = PasswordService::hash("Password123!").unwrap();
        let mut users = MockUserRepository::new();
        users.expect_find_by_email()
            .returning(move |email| Ok(Some(User::new(email, hash.clone(), None).unwrap())));
        let svc = service(
            users,
            MockOrganizationRepository::new(),
            MockMembershipRepository::new(),
            MockAuthTokenRepository::new(),
        );
        let err = svc.login("owner@demo.com", "nope").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        let svc = service(
            users,
            MockOrganizationRepository::new(),
            MockMembershipRepository::new(),
            MockAuthTokenRepository::new(),
        );
        let err = svc.login("ghost@demo.com", "whatever").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_login_uses_first_membership() {
        let hash = PasswordService::hash("Password123!").unwrap();
        let user = User::new("owner@demo.com", hash, None).unwrap();
        let org = Organization::new("Demo", "demo").unwrap();
        let membership = Membership::new(user.id, org.id, Role::Editor);

        let mut users = MockUserRepository::new();
        let found = user.clone();
        users.expect_find_by_email().returning(move |_| Ok(Some(found.clone())));
        let mut memberships = MockMembershipRepository::new();
        memberships.expect_first_for_user()
            .returning(move |_| Ok(Some(membership.clone())));
        let mut orgs = MockOrganizationRepository::new();
        let org_clone = org.clone();
        orgs.expect_find_by_id().returning(move |_| Ok(Some(org_clone.clone())));
        let mut tokens = MockAuthTokenRepository::new();
        tokens.expect_create_refresh_token().returning(|_| Ok(()));

        let svc = service(users, orgs, memberships, tokens);
        let result = svc.login("owner@demo.com", "Password123!").await.unwrap();
        let claims = jwt().verify_access_token(&result.access_token).unwrap();
        assert_eq!(claims.org_id, Some(org.id));
        assert_eq!(claims.role.as_deref(), Some("EDITOR"));
    }

    #[tokio::test]
    async fn test_refresh_rejects_revoked_token() {
        let jwt = jwt();
        let user = User::new("owner@demo.com", "hash".into(), None).unwrap();
        let token = jwt
            .generate_refresh_token(&subject(&user, None))
            .unwrap();
        let user_id = user.id;

        let mut tokens = MockAuthTokenRepository::new();
        tokens.expect_find_refresh_token().returning(move |hash| {
            let mut record = RefreshToken::new(user_id, hash.to_string(), 3600);
            record.revoked = true;
            Ok(Some(record))
        });

        let svc = AuthService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockOrganizationRepository::new()),
            Arc::new(MockMembershipRepository::new()),
            Arc::new(tokens),
            jwt,
        );
        let err = svc.refresh(&token).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let jwt = jwt();
        let user = User::new("owner@demo.com", "hash".into(), None).unwrap();
        let access = jwt.generate_access_token(&subject(&user, None)).unwrap();
        let svc = AuthService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockOrganizationRepository::new()),
            Arc::new(MockMembershipRepository::new()),
            Arc::new(MockAuthTokenRepository::new()),
            jwt,
        );
        assert!(matches!(
            svc.refresh(&access).await,
            Err(DomainError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_issues_access_token() {
        let jwt = jwt();
        let user = User::new("owner@demo.com", "hash".into(), None).unwrap();
        let token = jwt.generate_refresh_token(&subject(&user, None)).unwrap();
        let user_id = user.id;

        let mut tokens = MockAuthTokenRepository::new();
        tokens.expect_find_refresh_token()
            .returning(move |hash| Ok(Some(RefreshToken::new(user_id, hash.to_string(), 3600))));
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));
        let mut memberships = MockMembershipRepository::new();
        memberships.expect_first_for_user().returning(|_| Ok(None));

        let svc = AuthService::new(
            Arc::new(users),
            Arc::new(MockOrganizationRepository::new()),
            Arc::new(memberships),
            Arc::new(tokens),
            jwt.clone(),
        );
        let result = svc.refresh(&token).await.unwrap();
        let claims = jwt.verify_access_token(&result.access_token).unwrap();
        assert_eq!(claims.user_id, user_id);
    }
}
