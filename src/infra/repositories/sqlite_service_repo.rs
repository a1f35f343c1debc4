use crate::domain::models::service::ServiceOffering;
use crate::domain::ports::ServiceRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteServiceRepo {
    pool: SqlitePool,
}

impl SqliteServiceRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRepository for SqliteServiceRepo {
    async fn create(&self, service: &ServiceOffering) -> Result<ServiceOffering, AppError> {
        sqlx::query_as::<_, ServiceOffering>(
            "INSERT INTO services (id, name, duration_min, buffer_before_min, buffer_after_min, required_capability, price_cents, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&service.id).bind(&service.name).bind(service.duration_min).bind(service.buffer_before_min)
            .bind(service.buffer_after_min).bind(&service.required_capability).bind(service.price_cents).bind(service.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ServiceOffering>, AppError> {
        sqlx::query_as::<_, ServiceOffering>("SELECT * FROM services WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<ServiceOffering>, AppError> {
        sqlx::query_as::<_, ServiceOffering>("SELECT * FROM services ORDER BY name").fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
