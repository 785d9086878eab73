use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLock;
use uuid::Uuid;

use crate::directory::store::{DirectoryStore, StoreError, StoreResult};
use crate::models::{Organisation, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    users_by_email: HashMap<String, Uuid>,
    organisations: HashMap<Uuid, Organisation>,
    memberships: BTreeSet<(Uuid, Uuid)>,
}

impl Tables {
    fn insert_organisation(&mut self, org: &Organisation, creator_id: Uuid) -> StoreResult<()> {
        if self.organisations.contains_key(&org.id) {
            return Err(StoreError::conflict("organisations_pkey"));
        }
        self.organisations.insert(org.id, org.clone());
        self.memberships.insert((org.id, creator_id));
        Ok(())
    }

    fn orgs_of(&self, user_id: Uuid) -> impl Iterator<Item = Uuid> + '_ {
        self.memberships
            .iter()
            .filter(move |(_, member)| *member == user_id)
            .map(|(org_id, _)| *org_id)
    }
}

/// In-process store. All tables sit behind one lock so every check-and-insert
/// is atomic, matching the transactional guarantees of the Postgres adapter.
#[derive(Default)]
pub struct InMemoryDirectoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.tables.read().users.len()
    }

    pub fn organisation_count(&self) -> usize {
        self.tables.read().organisations.len()
    }

    pub fn member_count(&self, org_id: Uuid) -> usize {
        self.tables
            .read()
            .memberships
            .iter()
            .filter(|(org, _)| *org == org_id)
            .count()
    }
}

#[rocket::async_trait]
impl DirectoryStore for InMemoryDirectoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read();
        Ok(tables
            .users_by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().users.get(&user_id).cloned())
    }

    async fn create_user(&self, user: &User, default_org: &Organisation) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if tables.users_by_email.contains_key(&user.email) {
            return Err(StoreError::conflict("users_email_key"));
        }
        if tables.users.contains_key(&user.id) {
            return Err(StoreError::conflict("users_pkey"));
        }
        if tables.organisations.contains_key(&default_org.id) {
            return Err(StoreError::conflict("organisations_pkey"));
        }

        tables.users.insert(user.id, user.clone());
        tables.users_by_email.insert(user.email.clone(), user.id);
        tables.insert_organisation(default_org, user.id)
    }

    async fn find_organisation_by_id(&self, org_id: Uuid) -> StoreResult<Option<Organisation>> {
        Ok(self.tables.read().organisations.get(&org_id).cloned())
    }

    async fn create_organisation(&self, org: &Organisation, creator_id: Uuid) -> StoreResult<()> {
        self.tables.write().insert_organisation(org, creator_id)
    }

    async fn append_member(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.write().memberships.insert((org_id, user_id)))
    }

    async fn is_member(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.read().memberships.contains(&(org_id, user_id)))
    }

    async fn list_organisations_for(&self, user_id: Uuid) -> StoreResult<Vec<Organisation>> {
        let tables = self.tables.read();
        let mut orgs: Vec<Organisation> = tables
            .orgs_of(user_id)
            .filter_map(|org_id| tables.organisations.get(&org_id).cloned())
            .collect();
        orgs.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(orgs)
    }

    async fn shares_organisation(&self, first: Uuid, second: Uuid) -> StoreResult<bool> {
        let tables = self.tables.read();
        Ok(tables
            .orgs_of(first)
            .any(|org_id| tables.memberships.contains(&(org_id, second))))
    }
}
