use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Placeholder used by the admin listing when a joined user or job is missing.
pub const MISSING_REFERENCE: &str = "N/A";

/// A persisted job application. Created once, never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub resume_path: String,
    pub cover_letter_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to insert an application. The id is generated by the
/// caller before any blob is written so blob keys can be derived from it.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub resume_path: String,
    pub cover_letter_path: Option<String>,
}

/// An application with display fields copied from the referenced user and job.
/// Fields whose reference could not be resolved are left out of the JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
}

/// Result row of the users/jobs lookup join: first match or nothing.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationLookup {
    #[sqlx(flatten)]
    pub application: Application,
    pub user_name: Option<String>,
    pub job_title: Option<String>,
}

/// Admin view of an application where missing references read as `"N/A"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub resume_path: String,
    pub cover_letter_path: Option<String>,
    pub user_name: String,
    pub job_title: String,
}

impl From<ApplicationLookup> for AggregatedApplication {
    fn from(lookup: ApplicationLookup) -> Self {
        let ApplicationLookup {
            application,
            user_name,
            job_title,
        } = lookup;
        AggregatedApplication {
            id: application.id,
            user_id: application.user_id,
            job_id: application.job_id,
            resume_path: application.resume_path,
            cover_letter_path: application.cover_letter_path,
            user_name: user_name.unwrap_or_else(|| MISSING_REFERENCE.to_string()),
            job_title: job_title.unwrap_or_else(|| MISSING_REFERENCE.to_string()),
        }
    }
}

/// One page of a role-scoped application listing.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationPage {
    pub total: u64,
    pub total_pages: u64,
    pub page: u64,
    pub items: Vec<ApplicationView>,
}
