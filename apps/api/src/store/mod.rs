//! Document store adapter over the `users`, `jobs` and `applications` collections.
//!
//! The application service only talks to `Arc<dyn DocumentStore>`; the Postgres
//! implementation is wired in at startup and tests use the in-memory one.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::application::{Application, ApplicationLookup, NewApplication};
use crate::models::job::Job;
use crate::models::user::User;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored document did not have the expected shape.
    #[error("malformed {collection} document {id}: {reason}")]
    Malformed {
        collection: &'static str,
        id: Uuid,
        reason: String,
    },
}

/// Equality and in-set filter over applications. Unset fields match everything;
/// an empty `job_ids` set matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub job_ids: Option<Vec<Uuid>>,
    pub user_id: Option<Uuid>,
}

impl ApplicationFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        ApplicationFilter {
            job_ids: None,
            user_id: Some(user_id),
        }
    }

    pub fn for_user_and_job(user_id: Uuid, job_id: Uuid) -> Self {
        ApplicationFilter {
            job_ids: Some(vec![job_id]),
            user_id: Some(user_id),
        }
    }

    pub fn matches(&self, application: &Application) -> bool {
        let job_ok = self
            .job_ids
            .as_ref()
            .map_or(true, |ids| ids.contains(&application.job_id));
        let user_ok = self.user_id.map_or(true, |id| id == application.user_id);
        job_ok && user_ok
    }
}

/// Skip/limit window applied after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub limit: u64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_job(&self, id: Uuid) -> Result<Option<Job>, StoreError>;

    /// Identifiers of every job posted by `employer_id`.
    async fn job_ids_owned_by(&self, employer_id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    async fn find_application(&self, id: Uuid) -> Result<Option<Application>, StoreError>;

    /// Applications matching `filter` in insertion order, optionally windowed.
    async fn find_applications(
        &self,
        filter: &ApplicationFilter,
        window: Option<Window>,
    ) -> Result<Vec<Application>, StoreError>;

    async fn count_applications(&self, filter: &ApplicationFilter) -> Result<u64, StoreError>;

    async fn insert_application(&self, new: NewApplication) -> Result<Application, StoreError>;

    /// Returns whether a record was removed.
    async fn delete_application(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Every application left-joined against `users` and `jobs`.
    async fn aggregate_applications(&self) -> Result<Vec<ApplicationLookup>, StoreError>;
}
