//! In-process store backing all three repositories.
//!
//! Selected with `STORAGE_BACKEND=memory`; the test suite runs on it too.
//! One mutex guards every table, so the user cascade and the uniqueness
//! checks happen atomically.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::auth::{
    repo::TokenRepo,
    repo_types::{AccessToken, NewAccessToken},
};
use crate::clock::Clock;
use crate::db::{StoreError, StoreResult};
use crate::jobs::{
    repo::JobRepo,
    repo_types::{Job, JobChanges, NewJob},
};
use crate::users::{
    repo::UserRepo,
    repo_types::{NewUser, User, UserChanges},
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    jobs: BTreeMap<i64, Job>,
    tokens: BTreeMap<i64, AccessToken>,
    last_user_id: i64,
    last_job_id: i64,
    last_token_id: i64,
}

impl Tables {
    fn check_unique(&self, except: Option<i64>, username: &str, email: &str) -> StoreResult<()> {
        for user in self.users.values().filter(|u| Some(u.id) != except) {
            if user.username == username {
                return Err(StoreError::Duplicate("username"));
            }
            if user.email == email {
                return Err(StoreError::Duplicate("email"));
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            clock,
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Other(anyhow::anyhow!("memory store lock poisoned")))
    }

    fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<User>> {
        Ok(self.lock()?.users.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.lock()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, new: NewUser) -> StoreResult<User> {
        let now = self.now();
        let mut t = self.lock()?;
        t.check_unique(None, &new.username, &new.email)?;
        t.last_user_id += 1;
        let user = User {
            id: t.last_user_id,
            name: new.name,
            surname: new.surname,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> StoreResult<Option<User>> {
        let now = self.now();
        let mut t = self.lock()?;
        let Some(current) = t.users.get(&id) else {
            return Ok(None);
        };
        let username = changes.username.as_deref().unwrap_or(&current.username);
        let email = changes.email.as_deref().unwrap_or(&current.email);
        t.check_unique(Some(id), username, email)?;

        let Some(user) = t.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = changes.name {
            user.name = v;
        }
        if let Some(v) = changes.surname {
            user.surname = v;
        }
        if let Some(v) = changes.username {
            user.username = v;
        }
        if let Some(v) = changes.email {
            user.email = v;
        }
        if let Some(v) = changes.password_hash {
            user.password_hash = v;
        }
        user.updated_at = now;
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut t = self.lock()?;
        if t.users.remove(&id).is_none() {
            return Ok(false);
        }
        t.jobs.retain(|_, job| job.user_id != id);
        t.tokens.retain(|_, token| token.user_id != id);
        Ok(true)
    }
}

#[async_trait]
impl JobRepo for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Job>> {
        Ok(self.lock()?.jobs.values().cloned().collect())
    }

    async fn list_by_user(&self, user_id: i64) -> StoreResult<Vec<Job>> {
        Ok(self
            .lock()?
            .jobs
            .values()
            .filter(|j| j.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Job>> {
        Ok(self.lock()?.jobs.get(&id).cloned())
    }

    async fn create(&self, new: NewJob) -> StoreResult<Job> {
        let now = self.now();
        let mut t = self.lock()?;
        if !t.users.contains_key(&new.user_id) {
            return Err(StoreError::Other(anyhow::anyhow!(
                "user {} does not exist",
                new.user_id
            )));
        }
        t.last_job_id += 1;
        let job = Job {
            id: t.last_job_id,
            title: new.title,
            description: new.description,
            user_id: new.user_id,
            location: new.location,
            job_type: new.job_type,
            salary: new.salary,
            created_at: now,
            updated_at: now,
        };
        t.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn update(&self, id: i64, changes: JobChanges) -> StoreResult<Option<Job>> {
        let now = self.now();
        let mut t = self.lock()?;
        if let Some(user_id) = changes.user_id {
            if !t.users.contains_key(&user_id) {
                return Err(StoreError::Other(anyhow::anyhow!(
                    "user {user_id} does not exist"
                )));
            }
        }
        let Some(job) = t.jobs.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = changes.title {
            job.title = v;
        }
        if let Some(v) = changes.description {
            job.description = v;
        }
        if let Some(v) = changes.user_id {
            job.user_id = v;
        }
        if let Some(v) = changes.location {
            job.location = v;
        }
        if let Some(v) = changes.job_type {
            job.job_type = v;
        }
        if let Some(v) = changes.salary {
            job.salary = v;
        }
        job.updated_at = now;
        Ok(Some(job.clone()))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.lock()?.jobs.remove(&id).is_some())
    }
}

#[async_trait]
impl TokenRepo for MemoryStore {
    async fn create(&self, new: NewAccessToken) -> StoreResult<AccessToken> {
        let now = self.now();
        let mut t = self.lock()?;
        t.last_token_id += 1;
        let token = AccessToken {
            id: t.last_token_id,
            user_id: new.user_id,
            name: new.name,
            token_hash: new.token_hash,
            expires_at: new.expires_at,
            last_used_at: None,
            created_at: now,
        };
        t.tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn find_by_hash(&self, token_hash: &str) -> StoreResult<Option<AccessToken>> {
        Ok(self
            .lock()?
            .tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn touch(&self, id: i64, at: OffsetDateTime) -> StoreResult<()> {
        if let Some(token) = self.lock()?.tokens.get_mut(&id) {
            token.last_used_at = Some(at);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.lock()?.tokens.remove(&id).is_some())
    }
}
