use crate::domain::{models::dependent::Dependent, ports::DependentRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresDependentRepo {
    pool: PgPool,
}

impl PostgresDependentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DependentRepository for PostgresDependentRepo {
    async fn create(&self, dependent: &Dependent) -> Result<Dependent, AppError> {
        sqlx::query_as::<_, Dependent>("INSERT INTO dependents (id, user_id, name, created_at) VALUES ($1, $2, $3, $4) RETURNING *")
            .bind(&dependent.id).bind(&dependent.user_id).bind(&dependent.name).bind(dependent.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Dependent>, AppError> {
        sqlx::query_as::<_, Dependent>("SELECT * FROM dependents WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Dependent>, AppError> {
        sqlx::query_as::<_, Dependent>("SELECT * FROM dependents WHERE user_id = $1 ORDER BY name ASC").bind(user_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn delete(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM dependents WHERE id = $1 AND user_id = $2").bind(id).bind(user_id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Dependent not found".into())); }
        Ok(())
    }
}
