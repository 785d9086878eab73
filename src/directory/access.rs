//! Membership-based authorization.
//!
//! Membership is the only authorization signal: there is no owner role, and
//! an organisation's creator is simply its first member.

use std::sync::Arc;

use uuid::Uuid;

use crate::directory::store::DirectoryStore;
use crate::directory::{DirectoryError, DirectoryResult};

#[derive(Clone)]
pub struct AccessControl {
    store: Arc<dyn DirectoryStore>,
}

impl AccessControl {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    pub async fn can_access_organisation(
        &self,
        user_id: Uuid,
        org_id: Uuid,
    ) -> DirectoryResult<bool> {
        Ok(self.store.is_member(org_id, user_id).await?)
    }

    /// A caller may see a user profile when it is their own or when they
    /// share an organisation with that user.
    pub async fn can_view_user(&self, caller_id: Uuid, target_id: Uuid) -> DirectoryResult<bool> {
        if caller_id == target_id {
            return Ok(true);
        }
        Ok(self.store.shares_organisation(caller_id, target_id).await?)
    }

    pub async fn require_organisation_access(
        &self,
        user_id: Uuid,
        org_id: Uuid,
    ) -> DirectoryResult<()> {
        if self.can_access_organisation(user_id, org_id).await? {
            Ok(())
        } else {
            log::debug!("user {} denied access to organisation {}", user_id, org_id);
            Err(DirectoryError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectoryStore;
    use crate::models::{Organisation, User};
    use chrono::Utc;

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            first_name: "Test".into(),
            last_name: "User".into(),
            email: email.into(),
            password_hash: "hash".into(),
            phone: None,
            created_at: Utc::now(),
        }
    }

    fn org() -> Organisation {
        Organisation {
            id: Uuid::new_v4(),
            name: "Test's Organisation".into(),
            description: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn only_members_pass_the_organisation_check() {
        let store = Arc::new(InMemoryDirectoryStore::new());
        let (member, outsider) = (user("m@x.com"), user("o@x.com"));
        let owned = org();
        store.create_user(&member, &owned).await.expect("member");
        store.create_user(&outsider, &org()).await.expect("outsider");

        let access = AccessControl::new(store);
        assert!(access.can_access_organisation(member.id, owned.id).await.unwrap());
        assert!(!access.can_access_organisation(outsider.id, owned.id).await.unwrap());
        assert!(matches!(
            access.require_organisation_access(outsider.id, owned.id).await,
            Err(DirectoryError::Forbidden)
        ));
        assert!(access.can_view_user(outsider.id, outsider.id).await.unwrap());
        assert!(!access.can_view_user(outsider.id, member.id).await.unwrap());
    }
}
