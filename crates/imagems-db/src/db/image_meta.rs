use super::error::StoreError;
use chrono::{DateTime, Utc};
use imagems_core::models::{ImageMeta, ImageType};
use sqlx::{PgPool, Postgres};

/// Image metadata persistence.
///
/// `save_meta` assigns the id; `delete_meta` is a soft delete that must touch
/// exactly one row.
#[async_trait::async_trait]
pub trait MetadataStore: Send + Sync {
    async fn save_meta(&self, meta: &ImageMeta) -> Result<i64, StoreError>;

    async fn delete_meta(&self, id: i64) -> Result<(), StoreError>;

    async fn get_meta(&self, id: i64) -> Result<Option<ImageMeta>, StoreError>;
}

#[derive(sqlx::FromRow)]
struct ImageMetaRow {
    id: i64,
    user_id: String,
    #[sqlx(rename = "type")]
    image_type: String,
    mime_type: String,
    width: i32,
    height: i32,
    create_date: DateTime<Utc>,
    update_date: DateTime<Utc>,
    deleted: bool,
}

impl TryFrom<ImageMetaRow> for ImageMeta {
    type Error = StoreError;

    fn try_from(row: ImageMetaRow) -> Result<Self, Self::Error> {
        let image_type = row
            .image_type
            .parse::<ImageType>()
            .map_err(StoreError::InvalidRecord)?;

        Ok(ImageMeta {
            id: Some(row.id),
            user_id: row.user_id,
            image_type,
            mime_type: row.mime_type,
            width: u32::try_from(row.width)
                .map_err(|_| StoreError::InvalidRecord(format!("negative width {}", row.width)))?,
            height: u32::try_from(row.height).map_err(|_| {
                StoreError::InvalidRecord(format!("negative height {}", row.height))
            })?,
            create_date: Some(row.create_date),
            update_date: Some(row.update_date),
            deleted: row.deleted,
        })
    }
}

fn dimension(value: u32, name: &str) -> Result<i32, StoreError> {
    i32::try_from(value)
        .map_err(|_| StoreError::InvalidRecord(format!("{} {} out of range", name, value)))
}

/// PostgreSQL-backed image metadata repository
#[derive(Clone)]
pub struct ImageMetaRepository {
    pool: PgPool,
}

impl ImageMetaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MetadataStore for ImageMetaRepository {
    #[tracing::instrument(skip(self, meta), fields(
        db.system = "postgresql",
        db.table = "image_meta",
        db.operation = "insert",
        user_id = %meta.user_id
    ))]
    async fn save_meta(&self, meta: &ImageMeta) -> Result<i64, StoreError> {
        let id = sqlx::query_scalar::<Postgres, i64>(
            r#"
            INSERT INTO image_meta
                (user_id, type, mime_type, width, height, create_date, update_date)
            VALUES ($1, $2, $3, $4, $5, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            RETURNING id
            "#,
        )
        .bind(&meta.user_id)
        .bind(meta.image_type.to_string())
        .bind(&meta.mime_type)
        .bind(dimension(meta.width, "width")?)
        .bind(dimension(meta.height, "height")?)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "Failed to insert image metadata");
            StoreError::from(e)
        })?;

        tracing::debug!(id = id, "Image metadata saved");
        Ok(id)
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = "image_meta",
        db.operation = "update",
        db.record_id = id
    ))]
    async fn delete_meta(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE image_meta
            SET deleted = TRUE, update_date = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        let actual = result.rows_affected();
        if actual != 1 {
            return Err(StoreError::RowsAffected {
                expected: 1,
                actual,
            });
        }

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = "image_meta",
        db.operation = "select",
        db.record_id = id
    ))]
    async fn get_meta(&self, id: i64) -> Result<Option<ImageMeta>, StoreError> {
        let row = sqlx::query_as::<Postgres, ImageMetaRow>(
            r#"
            SELECT id, user_id, type, mime_type, width, height, create_date, update_date, deleted
            FROM image_meta
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ImageMeta::try_from).transpose()
    }
}
