//! SQLite-backed repository implementations for local development.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, Transaction, query, query_as, query_scalar, sqlite::SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreatePostParams, PostQueryFilter, PostsRepo,
    PostsWriteRepo, RepoError, SeedPost, SeedReport, SeedRepo, UpdatePostParams,
};
use crate::domain::entities::{CommentRecord, PostRecord};

use super::schema::SQLITE_SCHEMA;
use super::util::map_sqlx_error;

const POST_COLUMNS: &str = "id, slug, title, summary, body, category, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteRepositories {
    pool: Arc<SqlitePool>,
}

impl SqliteRepositories {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'_, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    pub async fn ensure_created(&self) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;
        for statement in SQLITE_SCHEMA {
            query(*statement)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }
        tx.commit().await.map_err(map_sqlx_error)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    async fn insert_post(
        tx: &mut Transaction<'_, Sqlite>,
        params: CreatePostParams,
        now: OffsetDateTime,
    ) -> Result<PostRecord, sqlx::Error> {
        query_as::<_, PostRecord>(
            r#"
            INSERT INTO posts (id, slug, title, summary, body, category, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, slug, title, summary, body, category, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.slug)
        .bind(params.title)
        .bind(params.summary)
        .bind(params.body)
        .bind(params.category)
        .bind(now)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
    }

    async fn insert_comment(
        tx: &mut Transaction<'_, Sqlite>,
        params: CreateCommentParams,
        now: OffsetDateTime,
    ) -> Result<CommentRecord, sqlx::Error> {
        query_as::<_, CommentRecord>(
            r#"
            INSERT INTO comments (id, post_id, author, body, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, post_id, author, body, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.post_id)
        .bind(params.author)
        .bind(params.body)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
    }
}

#[async_trait]
impl PostsRepo for SqliteRepositories {
    async fn list_posts(&self, filter: &PostQueryFilter) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
        qb.push(POST_COLUMNS);
        qb.push(" FROM posts WHERE 1=1 ");

        if let Some(category) = filter.category.as_ref() {
            qb.push(" AND lower(category) = lower(");
            qb.push_bind(category);
            qb.push(")");
        }

        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        qb.push_bind(i64::from(filter.limit.clamp(1, 100)));

        qb.build_query_as::<PostRecord>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        query_as::<_, PostRecord>(
            "SELECT id, slug, title, summary, body, category, created_at, updated_at \
             FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        query_as::<_, PostRecord>(
            "SELECT id, slug, title, summary, body, category, created_at, updated_at \
             FROM posts WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl PostsWriteRepo for SqliteRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;
        let record = Self::insert_post(&mut tx, params, OffsetDateTime::now_utc())
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(record)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let UpdatePostParams {
            id,
            title,
            summary,
            body,
            category,
        } = params;

        query_as::<_, PostRecord>(
            r#"
            UPDATE posts
            SET title = ?,
                summary = ?,
                body = ?,
                category = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING id, slug, title, summary, body, category, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(summary)
        .bind(body)
        .bind(category)
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentsRepo for SqliteRepositories {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        query_as::<_, CommentRecord>(
            "SELECT id, post_id, author, body, created_at FROM comments \
             WHERE post_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;
        let record = Self::insert_comment(&mut tx, params, OffsetDateTime::now_utc())
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(record)
    }
}

#[async_trait]
impl SeedRepo for SqliteRepositories {
    async fn seed_if_empty(&self, batch: Vec<SeedPost>) -> Result<SeedReport, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let existing: i64 = query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        if existing > 0 {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Ok(SeedReport::default());
        }

        let mut report = SeedReport::default();
        let mut now = OffsetDateTime::now_utc();
        for entry in batch {
            let post = Self::insert_post(&mut tx, entry.post, now)
                .await
                .map_err(map_sqlx_error)?;
            report.posts += 1;

            for comment in entry.comments {
                Self::insert_comment(
                    &mut tx,
                    CreateCommentParams {
                        post_id: post.id,
                        author: comment.author,
                        body: comment.body,
                    },
                    now,
                )
                .await
                .map_err(map_sqlx_error)?;
                report.comments += 1;
            }

            now += time::Duration::seconds(1);
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(report)
    }
}
