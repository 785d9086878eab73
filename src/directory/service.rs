use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::guards::AuthUser;
use crate::auth::jwt::TokenIdentity;
use crate::auth::responses::{AuthPayload, LoginRequest, RegisterRequest};
use crate::auth::{AuthState, JwtService, PasswordService};
use crate::directory::access::AccessControl;
use crate::directory::store::{DirectoryStore, StoreError};
use crate::directory::validation::{
    validate_add_member, validate_login, validate_new_organisation, validate_registration,
};
use crate::directory::{DirectoryError, DirectoryResult};
use crate::models::{
    AddMemberRequest, CreateOrganisationRequest, Organisation, OrganisationView, User,
    UserProfile,
};

const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Orchestrates registration, login and membership on top of a store.
#[derive(Clone)]
pub struct DirectoryService {
    store: Arc<dyn DirectoryStore>,
    access: AccessControl,
    password_service: Arc<PasswordService>,
    jwt_service: Arc<JwtService>,
    /// Verified against when an email is unknown so both login failures cost the same.
    decoy_hash: Arc<str>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn DirectoryStore>, auth: &AuthState) -> DirectoryResult<Self> {
        let decoy_hash = auth
            .password_service
            .hash_password(&Uuid::new_v4().to_string())?;

        Ok(Self {
            access: AccessControl::new(store.clone()),
            store,
            password_service: auth.password_service.clone(),
            jwt_service: auth.jwt_service.clone(),
            decoy_hash: Arc::from(decoy_hash),
        })
    }

    /// Whether the backing store answers.
    pub async fn store_reachable(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(err) => {
                log::warn!("directory store ping failed: {}", err);
                false
            }
        }
    }

    pub async fn register(&self, request: &RegisterRequest) -> DirectoryResult<AuthPayload> {
        let registration = validate_registration(request)?;

        // Best-effort early answer; the unique constraint below is authoritative.
        if self
            .store
            .find_user_by_email(&registration.email)
            .await?
            .is_some()
        {
            return Err(DirectoryError::DuplicateEmail);
        }

        let password_hash = self.hash(registration.password).await?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            first_name: registration.first_name,
            last_name: registration.last_name,
            email: registration.email,
            password_hash,
            phone: registration.phone,
            created_at: now,
        };
        let default_org = Organisation {
            id: Uuid::new_v4(),
            name: format!("{}'s Organisation", user.first_name),
            description: Some(format!("{}'s personal organisation", user.first_name)),
            created_at: now,
        };

        match self.store.create_user(&user, &default_org).await {
            Ok(()) => {}
            Err(StoreError::Conflict { constraint }) if constraint == EMAIL_CONSTRAINT => {
                return Err(DirectoryError::DuplicateEmail);
            }
            Err(err) => return Err(err.into()),
        }

        log::info!("registered user {} with organisation {}", user.id, default_org.id);
        self.auth_payload(&user)
    }

    pub async fn login(&self, request: &LoginRequest) -> DirectoryResult<AuthPayload> {
        let credentials = validate_login(request)?;

        let user = self.store.find_user_by_email(&credentials.email).await?;
        let encoded = match &user {
            Some(user) => user.password_hash.clone(),
            None => self.decoy_hash.to_string(),
        };
        let verified = self.verify(credentials.password, encoded).await?;

        match user {
            Some(user) if verified => self.auth_payload(&user),
            _ => Err(DirectoryError::AuthenticationFailed),
        }
    }

    pub async fn get_user(&self, caller: &AuthUser, user_id: Uuid) -> DirectoryResult<UserProfile> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(DirectoryError::NotFound("User"))?;

        if !self.access.can_view_user(caller.id, user.id).await? {
            return Err(DirectoryError::Forbidden);
        }

        Ok(UserProfile::from(&user))
    }

    /// Organisations the caller belongs to.
    pub async fn list_organisations(&self, caller: &AuthUser) -> DirectoryResult<Vec<OrganisationView>> {
        let orgs = self.store.list_organisations_for(caller.id).await?;
        Ok(orgs.iter().map(OrganisationView::from).collect())
    }

    pub async fn get_organisation(
        &self,
        caller: &AuthUser,
        org_id: Uuid,
    ) -> DirectoryResult<OrganisationView> {
        let org = self.find_organisation(org_id).await?;
        self.access.require_organisation_access(caller.id, org.id).await?;
        Ok(OrganisationView::from(&org))
    }

    pub async fn create_organisation(
        &self,
        caller: &AuthUser,
        request: &CreateOrganisationRequest,
    ) -> DirectoryResult<OrganisationView> {
        let new_org = validate_new_organisation(request)?;
        let org = Organisation {
            id: Uuid::new_v4(),
            name: new_org.name,
            description: new_org.description,
            created_at: Utc::now(),
        };

        self.store.create_organisation(&org, caller.id).await?;
        log::info!("user {} created organisation {}", caller.id, org.id);
        Ok(OrganisationView::from(&org))
    }

    /// Add a user to an organisation the caller belongs to. Repeats are a
    /// successful no-op.
    pub async fn add_member(
        &self,
        caller: &AuthUser,
        org_id: Uuid,
        request: &AddMemberRequest,
    ) -> DirectoryResult<()> {
        let raw_target = validate_add_member(request)?;
        let org = self.find_organisation(org_id).await?;
        self.access.require_organisation_access(caller.id, org.id).await?;

        let target = match Uuid::parse_str(&raw_target) {
            Ok(target_id) => self.store.find_user_by_id(target_id).await?,
            Err(_) => None,
        }
        .ok_or(DirectoryError::NotFound("User"))?;

        if self.store.append_member(org.id, target.id).await? {
            log::info!("user {} added {} to organisation {}", caller.id, target.id, org.id);
        } else {
            log::debug!("user {} already a member of organisation {}", target.id, org.id);
        }
        Ok(())
    }

    async fn find_organisation(&self, org_id: Uuid) -> DirectoryResult<Organisation> {
        self.store
            .find_organisation_by_id(org_id)
            .await?
            .ok_or(DirectoryError::NotFound("Organisation"))
    }

    fn auth_payload(&self, user: &User) -> DirectoryResult<AuthPayload> {
        let token = self.jwt_service.issue_access_token(&TokenIdentity {
            user_id: user.id,
            email: user.email.clone(),
        })?;

        Ok(AuthPayload {
            access_token: token.token,
            user: UserProfile::from(user),
        })
    }

    async fn hash(&self, password: String) -> DirectoryResult<String> {
        let hasher = self.password_service.clone();
        let hash = tokio::task::spawn_blocking(move || hasher.hash_password(&password)).await??;
        Ok(hash)
    }

    async fn verify(&self, password: String, encoded: String) -> DirectoryResult<bool> {
        let hasher = self.password_service.clone();
        let verified =
            tokio::task::spawn_blocking(move || hasher.verify_password(&password, &encoded))
                .await?;
        Ok(verified)
    }
}
