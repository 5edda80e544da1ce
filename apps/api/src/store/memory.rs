use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::application::{Application, ApplicationLookup, NewApplication};
use crate::models::job::Job;
use crate::models::user::User;
use crate::store::{ApplicationFilter, DocumentStore, StoreError, Window};

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    jobs: Vec<Job>,
    applications: Vec<Application>,
}

/// In-process [`DocumentStore`] for tests.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: Mutex<Collections>,
    fail_inserts: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn add_user(&self, user: User) {
        self.collections.lock().unwrap().users.push(user);
    }

    pub fn add_job(&self, job: Job) {
        self.collections.lock().unwrap().jobs.push(job);
    }

    pub fn remove_job(&self, id: Uuid) {
        self.collections.lock().unwrap().jobs.retain(|job| job.id != id);
    }

    pub fn applications(&self) -> Vec<Application> {
        self.collections.lock().unwrap().applications.clone()
    }

    /// Makes every following insert fail with a database error.
    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let collections = self.collections.lock().unwrap();
        Ok(collections.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        let collections = self.collections.lock().unwrap();
        Ok(collections.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn job_ids_owned_by(&self, employer_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .jobs
            .iter()
            .filter(|j| j.employer_id == employer_id)
            .map(|j| j.id)
            .collect())
    }

    async fn find_application(&self, id: Uuid) -> Result<Option<Application>, StoreError> {
        let collections = self.collections.lock().unwrap();
        Ok(collections.applications.iter().find(|a| a.id == id).cloned())
    }

    async fn find_applications(
        &self,
        filter: &ApplicationFilter,
        window: Option<Window>,
    ) -> Result<Vec<Application>, StoreError> {
        let collections = self.collections.lock().unwrap();
        let matching = collections
            .applications
            .iter()
            .filter(|a| filter.matches(a))
            .cloned();
        Ok(match window {
            Some(Window { skip, limit }) => matching
                .skip(skip as usize)
                .take(limit as usize)
                .collect(),
            None => matching.collect(),
        })
    }

    async fn count_applications(&self, filter: &ApplicationFilter) -> Result<u64, StoreError> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .applications
            .iter()
            .filter(|a| filter.matches(a))
            .count() as u64)
    }

    async fn insert_application(&self, new: NewApplication) -> Result<Application, StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let application = Application {
            id: new.id,
            user_id: new.user_id,
            job_id: new.job_id,
            resume_path: new.resume_path,
            cover_letter_path: new.cover_letter_path,
            created_at: Utc::now(),
        };
        self.collections
            .lock()
            .unwrap()
            .applications
            .push(application.clone());
        Ok(application)
    }

    async fn delete_application(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut collections = self.collections.lock().unwrap();
        let before = collections.applications.len();
        collections.applications.retain(|a| a.id != id);
        Ok(collections.applications.len() < before)
    }

    async fn aggregate_applications(&self) -> Result<Vec<ApplicationLookup>, StoreError> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .applications
            .iter()
            .map(|a| ApplicationLookup {
                application: a.clone(),
                user_name: collections
                    .users
                    .iter()
                    .find(|u| u.id == a.user_id)
                    .map(|u| u.name.clone()),
                job_title: collections
                    .jobs
                    .iter()
                    .find(|j| j.id == a.job_id)
                    .map(|j| j.title.clone()),
            })
            .collect())
    }
}
