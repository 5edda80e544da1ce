//! Application repository: submission, role-scoped listing, deletion and
//! document retrieval on top of the document store and the object store.
//!
//! Every operation is a plain sequence of store calls. Nothing here locks, so
//! two concurrent submissions for the same (user, job) pair can both pass the
//! duplicate check; the store is the only source of consistency.

use std::sync::Arc;

use bytes::Bytes;
use futures::future::try_join_all;
use tracing::{info, warn};
use uuid::Uuid;

use crate::applications::documents::{content_type, Disposition, StoredDocument};
use crate::applications::pagination::Pagination;
use crate::auth::guard::require_role;
use crate::auth::CurrentUser;
use crate::blobs::{blob_key, file_name, DocumentKind, ObjectStore};
use crate::errors::AppError;
use crate::models::application::{
    AggregatedApplication, Application, ApplicationPage, ApplicationView, NewApplication,
};
use crate::models::parse_id;
use crate::models::user::Role;
use crate::store::{ApplicationFilter, DocumentStore};

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Bytes,
}

/// Optional caller-supplied filters for [`ApplicationRepository::list`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ListFilters {
    pub job_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct ApplicationRepository {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn ObjectStore>,
}

impl ApplicationRepository {
    pub fn new(store: Arc<dyn DocumentStore>, blobs: Arc<dyn ObjectStore>) -> Self {
        ApplicationRepository { store, blobs }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Submit
    // ────────────────────────────────────────────────────────────────────────

    /// Stores the uploaded documents and records the application.
    ///
    /// Blobs are written before the record. If the insert fails they stay
    /// behind unreferenced; that is logged, not rolled back.
    pub async fn submit(
        &self,
        submitter: &CurrentUser,
        user_id: Uuid,
        job_id: Uuid,
        resume: Upload,
        cover_letter: Option<Upload>,
    ) -> Result<Application, AppError> {
        require_role(submitter, &[Role::Jobseeker])?;
        if resume.bytes.is_empty() {
            return Err(AppError::Validation("resume file must not be empty".to_string()));
        }

        let existing = self
            .store
            .count_applications(&ApplicationFilter::for_user_and_job(user_id, job_id))
            .await?;
        if existing > 0 {
            info!(%user_id, %job_id, "duplicate application rejected");
            return Err(AppError::DuplicateSubmission);
        }

        let id = Uuid::new_v4();
        let resume_path = blob_key(id, &submitter.name, DocumentKind::Resume, &resume.filename);
        self.blobs.put(&resume_path, resume.bytes).await?;

        let cover_letter_path = match cover_letter {
            Some(upload) => {
                let path = blob_key(
                    id,
                    &submitter.name,
                    DocumentKind::CoverLetter,
                    &upload.filename,
                );
                if let Err(e) = self.blobs.put(&path, upload.bytes).await {
                    warn!(application_id = %id, orphaned = %resume_path, "cover letter upload failed");
                    return Err(e.into());
                }
                Some(path)
            }
            None => None,
        };

        let new = NewApplication {
            id,
            user_id,
            job_id,
            resume_path: resume_path.clone(),
            cover_letter_path: cover_letter_path.clone(),
        };
        let application = match self.store.insert_application(new).await {
            Ok(application) => application,
            Err(e) => {
                warn!(
                    application_id = %id,
                    resume = %resume_path,
                    cover_letter = ?cover_letter_path,
                    "application insert failed; uploaded blobs are orphaned"
                );
                return Err(e.into());
            }
        };

        info!(application_id = %application.id, %user_id, %job_id, "application submitted");
        Ok(application)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Listing
    // ────────────────────────────────────────────────────────────────────────

    /// Applications to jobs posted by `caller`, narrowed by `filters`, one page
    /// at a time and enriched with user and job display fields.
    pub async fn list(
        &self,
        caller: &CurrentUser,
        filters: ListFilters,
        pagination: Pagination,
    ) -> Result<ApplicationPage, AppError> {
        let owned_job_ids = self.store.job_ids_owned_by(caller.id).await?;
        let filter = scoped_filter(owned_job_ids, filters);

        let total = self.store.count_applications(&filter).await?;
        let applications = self
            .store
            .find_applications(&filter, Some(pagination.window()))
            .await?;
        let items = try_join_all(applications.into_iter().map(|a| self.enrich(a))).await?;

        Ok(ApplicationPage {
            total,
            total_pages: pagination.total_pages(total),
            page: pagination.page,
            items,
        })
    }

    /// Everything `caller` has submitted, unpaginated and not enriched.
    pub async fn list_mine(&self, caller: &CurrentUser) -> Result<Vec<Application>, AppError> {
        Ok(self
            .store
            .find_applications(&ApplicationFilter::for_user(caller.id), None)
            .await?)
    }

    /// Every application joined against users and jobs. Admin only.
    pub async fn list_all_enriched(
        &self,
        caller: &CurrentUser,
    ) -> Result<Vec<AggregatedApplication>, AppError> {
        require_role(caller, &[Role::Admin])?;
        let lookups = self.store.aggregate_applications().await?;
        Ok(lookups.into_iter().map(AggregatedApplication::from).collect())
    }

    async fn enrich(&self, application: Application) -> Result<ApplicationView, AppError> {
        let user = self.store.find_user(application.user_id).await?;
        let job = self.store.find_job(application.job_id).await?;
        let (user_name, user_email) = match user {
            Some(user) => (Some(user.name), Some(user.email)),
            None => (None, None),
        };
        Ok(ApplicationView {
            application,
            user_name,
            user_email,
            job_title: job.map(|job| job.title),
        })
    }

    // ────────────────────────────────────────────────────────────────────────
    // Delete
    // ────────────────────────────────────────────────────────────────────────

    /// Removes the record, then its blobs. Blob removal is best-effort.
    pub async fn delete(&self, caller: &CurrentUser, application_id: Uuid) -> Result<(), AppError> {
        require_role(caller, &[Role::Admin])?;

        let application = self
            .store
            .find_application(application_id)
            .await?
            .ok_or(AppError::ApplicationNotFound(application_id))?;

        if !self.store.delete_application(application_id).await? {
            // Deleted concurrently between the lookup and now.
            return Err(AppError::ApplicationNotFound(application_id));
        }
        info!(%application_id, deleted_by = %caller.id, "application deleted");

        let paths = std::iter::once(application.resume_path)
            .chain(application.cover_letter_path)
            .collect::<Vec<_>>();
        for path in paths {
            if let Err(e) = self.blobs.delete(&path).await {
                warn!(%application_id, blob = %path, "failed to remove document: {e}");
            }
        }
        Ok(())
    }

    // ────────────────────────────────────────────────────────────────────────
    // Document retrieval
    // ────────────────────────────────────────────────────────────────────────

    /// Opens the resume or cover letter of an application as a stream.
    pub async fn fetch_document(
        &self,
        application_id: &str,
        kind: DocumentKind,
    ) -> Result<StoredDocument, AppError> {
        let id = parse_id(application_id)?;
        let application = self
            .store
            .find_application(id)
            .await?
            .ok_or(AppError::ApplicationNotFound(id))?;

        let path = match kind {
            DocumentKind::Resume => Some(application.resume_path),
            DocumentKind::CoverLetter => application.cover_letter_path,
        }
        .ok_or_else(|| AppError::FileNotFound(format!("{id} has no {}", kind.slug())))?;

        let body = self.blobs.get(&path).await?;
        Ok(StoredDocument {
            content_type: content_type(kind, &path),
            disposition: Disposition::for_kind(kind),
            filename: file_name(&path).to_string(),
            body,
        })
    }
}

/// Restricts a listing to the caller's own jobs. An explicit `job_id` outside
/// that set yields an empty result rather than widening it.
fn scoped_filter(owned_job_ids: Vec<Uuid>, filters: ListFilters) -> ApplicationFilter {
    let job_ids = match filters.job_id {
        Some(job_id) if owned_job_ids.contains(&job_id) => vec![job_id],
        Some(_) => Vec::new(),
        None => owned_job_ids,
    };
    ApplicationFilter {
        job_ids: Some(job_ids),
        user_id: filters.user_id,
    }
}
