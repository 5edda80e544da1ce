use axum::{
    async_trait,
    extract::{FromRequestParts, Multipart, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::applications::pagination::{Pagination, PaginationQuery};
use crate::applications::repository::{ListFilters, Upload};
use crate::auth::guard::require_role;
use crate::auth::CurrentUser;
use crate::blobs::DocumentKind;
use crate::errors::AppError;
use crate::models::application::{AggregatedApplication, Application, ApplicationPage};
use crate::models::user::Role;
use crate::models::{parse_id, parse_optional_id};
use crate::state::AppState;

/// [`Query`] whose rejection renders as an [`AppError::Validation`] body.
pub struct AppQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(AppQuery(value))
    }
}

/// Required parameters are optional at the extractor so that role checks run
/// before presence checks.
fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .ok_or_else(|| AppError::Validation(format!("missing query parameter '{name}'")))
}

#[derive(Debug, Deserialize)]
pub struct ApplyQuery {
    pub user_id: Option<String>,
    pub job_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub job_id: Option<String>,
    pub user_id: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub application_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Pulls `resume` (required) and `cover_letter` (optional) out of the form.
/// A cover-letter part without content counts as absent.
async fn read_uploads(mut multipart: Multipart) -> Result<(Upload, Option<Upload>), AppError> {
    let mut resume = None;
    let mut cover_letter = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != "resume" && name != "cover_letter" {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read '{name}': {e}")))?;
        let upload = Upload { filename, bytes };
        if name == "resume" {
            resume = Some(upload);
        } else if !upload.bytes.is_empty() {
            cover_letter = Some(upload);
        }
    }

    let resume =
        resume.ok_or_else(|| AppError::Validation("resume file is required".to_string()))?;
    Ok((resume, cover_letter))
}

/// POST /api/apply?user_id=&job_id=
pub async fn handle_apply(
    State(state): State<AppState>,
    user: CurrentUser,
    AppQuery(query): AppQuery<ApplyQuery>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Application>), AppError> {
    // Reject before reading the uploads.
    require_role(&user, &[Role::Jobseeker])?;
    let user_id = parse_id(required(&query.user_id, "user_id")?)?;
    let job_id = parse_id(required(&query.job_id, "job_id")?)?;

    let (resume, cover_letter) = read_uploads(multipart).await?;
    let application = state
        .applications
        .submit(&user, user_id, job_id, resume, cover_letter)
        .await?;

    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/application?job_id=&user_id=&page=&limit=
pub async fn handle_list_applications(
    State(state): State<AppState>,
    user: CurrentUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<ApplicationPage>, AppError> {
    let filters = ListFilters {
        job_id: parse_optional_id(query.job_id.as_deref())?,
        user_id: parse_optional_id(query.user_id.as_deref())?,
    };
    let pagination = Pagination::from_query(
        &PaginationQuery {
            page: query.page,
            limit: query.limit,
        },
        state.config.default_page_limit,
    )?;

    let page = state.applications.list(&user, filters, pagination).await?;
    Ok(Json(page))
}

/// GET /api/my_applicants?page=&limit=
///
/// Applicants to the caller's own job postings.
pub async fn handle_my_applicants(
    State(state): State<AppState>,
    user: CurrentUser,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> Result<Json<ApplicationPage>, AppError> {
    let pagination = Pagination::from_query(&query, state.config.default_page_limit)?;
    let page = state
        .applications
        .list(&user, ListFilters::default(), pagination)
        .await?;
    Ok(Json(page))
}

/// GET /api/applications/me
pub async fn handle_my_applications(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Application>>, AppError> {
    Ok(Json(state.applications.list_mine(&user).await?))
}

/// GET /api/applications/aggregation_data
pub async fn handle_aggregation_data(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<AggregatedApplication>>, AppError> {
    Ok(Json(state.applications.list_all_enriched(&user).await?))
}

/// DELETE /api/delete_application?application_id=
pub async fn handle_delete_application(
    State(state): State<AppState>,
    user: CurrentUser,
    AppQuery(query): AppQuery<DeleteQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    require_role(&user, &[Role::Admin])?;
    let application_id = parse_id(required(&query.application_id, "application_id")?)?;
    state.applications.delete(&user, application_id).await?;
    Ok(Json(MessageResponse {
        message: "Application deleted successfully",
    }))
}

/// GET /api/application/resume/:application_id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(application_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .applications
        .fetch_document(&application_id, DocumentKind::Resume)
        .await
}

/// GET /api/application/cover_letter/:application_id
pub async fn handle_get_cover_letter(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(application_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .applications
        .fetch_document(&application_id, DocumentKind::CoverLetter)
        .await
}
