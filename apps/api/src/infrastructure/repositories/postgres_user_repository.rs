use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::repositories::{
    Page, PageRequest, RepositoryError, RepositoryResult, SortDirection, UserRepository,
    UserSortField,
};
use crate::domain::user::{Email, User, UserRole};

const USER_COLUMNS: &str = "id, username, password_hash, email, full_name, role, \
                            phone_number, enabled, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    email: String,
    full_name: String,
    role: UserRole,
    phone_number: Option<String>,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::new(r.email)
            .map_err(|e| RepositoryError::Database(format!("Invalid email from database: {}", e)))?;
        Ok(User {
            id: r.id,
            username: r.username,
            password_hash: r.password_hash,
            email,
            full_name: r.full_name,
            role: r.role,
            phone_number: r.phone_number,
            enabled: r.enabled,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn sort_column(field: UserSortField) -> &'static str {
    match field {
        UserSortField::Username => "username",
        UserSortField::Email => "email",
        UserSortField::FullName => "full_name",
        UserSortField::Role => "role",
        UserSortField::CreatedAt => "created_at",
    }
}

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new PostgresUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, password_hash, email, full_name, role,
                phone_number, enabled, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.email.as_str())
        .bind(&user.full_name)
        .bind(user.role)
        .bind(&user.phone_number)
        .bind(user.enabled)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, user: &User) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, email = $3, full_name = $4, role = $5,
                phone_number = $6, enabled = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.password_hash)
        .bind(user.email.as_str())
        .bind(&user.full_name)
        .bind(user.role)
        .bind(&user.phone_number)
        .bind(user.enabled)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "User",
                id: user.id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "User",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &Email) -> RepositoryResult<Option<User>> {
        self.find_one("email", email.as_str()).await
    }

    async fn exists_by_username(&self, username: &str) -> RepositoryResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn exists_by_email(&self, email: &Email) -> RepositoryResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn find_page(
        &self,
        role: Option<UserRole>,
        request: &PageRequest<UserSortField>,
    ) -> RepositoryResult<Page<User>> {
        let total: i64 = match role {
            Some(role) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
                    .bind(role)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM users")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM users", USER_COLUMNS));
        if let Some(role) = role {
            query.push(" WHERE role = ").push_bind(role);
        }
        let direction = match request.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        query.push(format!(
            " ORDER BY {} {}, id ASC",
            sort_column(request.sort_by),
            direction
        ));
        query
            .push(" LIMIT ")
            .push_bind(i64::from(request.size))
            .push(" OFFSET ")
            .push_bind(request.offset() as i64);

        let rows: Vec<UserRow> = query
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await?;
        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(users, request, total.max(0) as u64))
    }
}
