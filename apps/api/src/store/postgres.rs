use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::application::{Application, ApplicationLookup, NewApplication};
use crate::models::job::Job;
use crate::models::user::{Role, User};
use crate::store::{ApplicationFilter, DocumentStore, StoreError, Window};

const APPLICATION_COLUMNS: &str =
    "id, user_id, job_id, resume_path, cover_letter_path, created_at";

/// Raw `users` row; the role column is free text until it is checked here.
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|reason| StoreError::Malformed {
                collection: "users",
                id: row.id,
                reason,
            })?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
        })
    }
}

/// [`DocumentStore`] backed by PostgreSQL tables of the same names.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        PgDocumentStore { pool }
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ApplicationFilter) {
    builder.push(" WHERE TRUE");
    if let Some(job_ids) = &filter.job_ids {
        builder
            .push(" AND job_id = ANY(")
            .push_bind(job_ids.clone())
            .push(")");
    }
    if let Some(user_id) = filter.user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, name, email, role FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        Ok(
            sqlx::query_as::<_, Job>("SELECT id, employer_id, title FROM jobs WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn job_ids_owned_by(&self, employer_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(
            sqlx::query_scalar("SELECT id FROM jobs WHERE employer_id = $1 ORDER BY created_at")
                .bind(employer_id)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn find_application(&self, id: Uuid) -> Result<Option<Application>, StoreError> {
        Ok(sqlx::query_as::<_, Application>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_applications(
        &self,
        filter: &ApplicationFilter,
        window: Option<Window>,
    ) -> Result<Vec<Application>, StoreError> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {APPLICATION_COLUMNS} FROM applications"));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at, id");
        if let Some(Window { skip, limit }) = window {
            builder
                .push(" OFFSET ")
                .push_bind(to_i64(skip))
                .push(" LIMIT ")
                .push_bind(to_i64(limit));
        }

        Ok(builder
            .build_query_as::<Application>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count_applications(&self, filter: &ApplicationFilter) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM applications");
        push_filter(&mut builder, filter);
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn insert_application(&self, new: NewApplication) -> Result<Application, StoreError> {
        Ok(sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO applications (id, user_id, job_id, resume_path, cover_letter_path)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(new.id)
        .bind(new.user_id)
        .bind(new.job_id)
        .bind(&new.resume_path)
        .bind(&new.cover_letter_path)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_application(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn aggregate_applications(&self) -> Result<Vec<ApplicationLookup>, StoreError> {
        // users.id and jobs.id are primary keys, so each join yields at most one row.
        Ok(sqlx::query_as::<_, ApplicationLookup>(
            r#"
            SELECT a.id, a.user_id, a.job_id, a.resume_path, a.cover_letter_path, a.created_at,
                   u.name AS user_name,
                   j.title AS job_title
            FROM applications a
            LEFT JOIN users u ON u.id = a.user_id
            LEFT JOIN jobs j ON j.id = a.job_id
            ORDER BY a.created_at, a.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_sql_with_both_constraints() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM applications");
        push_filter(
            &mut builder,
            &ApplicationFilter {
                job_ids: Some(vec![Uuid::new_v4()]),
                user_id: Some(Uuid::new_v4()),
            },
        );
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM applications WHERE TRUE AND job_id = ANY($1) AND user_id = $2"
        );
    }

    #[test]
    fn test_filter_sql_without_constraints() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM applications");
        push_filter(&mut builder, &ApplicationFilter::default());
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM applications WHERE TRUE");
    }

    #[test]
    fn test_unknown_role_in_row_is_malformed() {
        let row = UserRow {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: "SUPERUSER".to_string(),
        };
        assert!(matches!(
            User::try_from(row),
            Err(StoreError::Malformed { collection: "users", .. })
        ));
    }
}
