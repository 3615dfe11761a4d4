use super::{Store, StoreError, StoreResult, Visibility};
use crate::models::{
    Advice, BlogPost, BlogPostPatch, Contact, Faq, FaqPatch, NewAdvice, NewBlogPost, NewContact,
    NewFaq, NewProject, Project, ProjectPatch,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const CONTACT_COLUMNS: &str = "id, name, email, subject, message, is_read, created_at";
const ADVICE_COLUMNS: &str = "id, name, message, is_approved, created_at";
const FAQ_COLUMNS: &str = "id, question, answer, sort_order, updated_at";
const PROJECT_COLUMNS: &str = "id, title, description, image_url, project_url, repo_url, \
                               technologies, sort_order, created_at";
const POST_COLUMNS: &str = "id, slug, title, excerpt, content, published, created_at, updated_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and apply pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("failed to connect to PostgreSQL")?;

        Self::new(pool).await
    }

    pub async fn new(pool: PgPool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;
        info!("Database migrations applied");
        Ok(Self { pool })
    }
}

fn conflict_on_unique(e: sqlx::Error, slug: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(format!("a post with slug '{}' already exists", slug))
        }
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_contact(&self, contact: NewContact) -> StoreResult<Contact> {
        let sql = format!(
            "INSERT INTO contacts (name, email, subject, message) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            CONTACT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Contact>(&sql)
            .bind(contact.name)
            .bind(contact.email)
            .bind(contact.subject)
            .bind(contact.message)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_contacts(&self) -> StoreResult<Vec<Contact>> {
        let sql = format!(
            "SELECT {} FROM contacts ORDER BY created_at DESC, id DESC",
            CONTACT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Contact>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn mark_contact_read(&self, id: i64) -> StoreResult<Option<Contact>> {
        let sql = format!(
            "UPDATE contacts SET is_read = TRUE WHERE id = $1 RETURNING {}",
            CONTACT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Contact>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_contact(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_advice(&self, advice: NewAdvice) -> StoreResult<Advice> {
        let sql = format!(
            "INSERT INTO advice (name, message) VALUES ($1, $2) RETURNING {}",
            ADVICE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Advice>(&sql)
            .bind(advice.name)
            .bind(advice.message)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_advice(&self, visibility: Visibility) -> StoreResult<Vec<Advice>> {
        let sql = format!(
            "SELECT {} FROM advice WHERE ($1 OR is_approved) ORDER BY created_at DESC, id DESC",
            ADVICE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Advice>(&sql)
            .bind(visibility == Visibility::All)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn approve_advice(&self, id: i64) -> StoreResult<Option<Advice>> {
        let sql = format!(
            "UPDATE advice SET is_approved = TRUE WHERE id = $1 RETURNING {}",
            ADVICE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Advice>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_advice(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM advice WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_faqs(&self) -> StoreResult<Vec<Faq>> {
        let sql = format!("SELECT {} FROM faqs ORDER BY sort_order, id", FAQ_COLUMNS);
        Ok(sqlx::query_as::<_, Faq>(&sql).fetch_all(&self.pool).await?)
    }

    async fn create_faq(&self, faq: NewFaq) -> StoreResult<Faq> {
        let sql = format!(
            "INSERT INTO faqs (question, answer, sort_order) VALUES ($1, $2, $3) RETURNING {}",
            FAQ_COLUMNS
        );
        Ok(sqlx::query_as::<_, Faq>(&sql)
            .bind(faq.question)
            .bind(faq.answer)
            .bind(faq.sort_order)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_faq(&self, id: i64, patch: FaqPatch) -> StoreResult<Option<Faq>> {
        let sql = format!(
            "UPDATE faqs SET question = COALESCE($2, question), answer = COALESCE($3, answer), \
             sort_order = COALESCE($4, sort_order), updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            FAQ_COLUMNS
        );
        Ok(sqlx::query_as::<_, Faq>(&sql)
            .bind(id)
            .bind(patch.question)
            .bind(patch.answer)
            .bind(patch.sort_order)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_faq(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM faqs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let sql = format!(
            "SELECT {} FROM projects ORDER BY sort_order, id",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_project(&self, project: NewProject) -> StoreResult<Project> {
        let sql = format!(
            "INSERT INTO projects \
             (title, description, image_url, project_url, repo_url, technologies, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(project.title)
            .bind(project.description)
            .bind(project.image_url)
            .bind(project.project_url)
            .bind(project.repo_url)
            .bind(project.technologies)
            .bind(project.sort_order)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_project(&self, id: i64, patch: ProjectPatch) -> StoreResult<Option<Project>> {
        let sql = format!(
            "UPDATE projects SET title = COALESCE($2, title), \
             description = COALESCE($3, description), image_url = COALESCE($4, image_url), \
             project_url = COALESCE($5, project_url), repo_url = COALESCE($6, repo_url), \
             technologies = COALESCE($7, technologies), sort_order = COALESCE($8, sort_order) \
             WHERE id = $1 RETURNING {}",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(patch.title)
            .bind(patch.description)
            .bind(patch.image_url)
            .bind(patch.project_url)
            .bind(patch.repo_url)
            .bind(patch.technologies)
            .bind(patch.sort_order)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_project(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(&self, visibility: Visibility) -> StoreResult<Vec<BlogPost>> {
        let sql = format!(
            "SELECT {} FROM blog_posts WHERE ($1 OR published) \
             ORDER BY created_at DESC, id DESC",
            POST_COLUMNS
        );
        Ok(sqlx::query_as::<_, BlogPost>(&sql)
            .bind(visibility == Visibility::All)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_post(&self, slug: &str, visibility: Visibility) -> StoreResult<Option<BlogPost>> {
        let sql = format!(
            "SELECT {} FROM blog_posts WHERE slug = $1 AND ($2 OR published)",
            POST_COLUMNS
        );
        Ok(sqlx::query_as::<_, BlogPost>(&sql)
            .bind(slug)
            .bind(visibility == Visibility::All)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_post(&self, post: NewBlogPost) -> StoreResult<BlogPost> {
        let sql = format!(
            "INSERT INTO blog_posts (slug, title, excerpt, content, published) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            POST_COLUMNS
        );
        sqlx::query_as::<_, BlogPost>(&sql)
            .bind(&post.slug)
            .bind(post.title)
            .bind(post.excerpt)
            .bind(post.content)
            .bind(post.published)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, &post.slug))
    }

    async fn update_post(&self, id: i64, patch: BlogPostPatch) -> StoreResult<Option<BlogPost>> {
        let sql = format!(
            "UPDATE blog_posts SET slug = COALESCE($2, slug), title = COALESCE($3, title), \
             excerpt = COALESCE($4, excerpt), content = COALESCE($5, content), \
             published = COALESCE($6, published), updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            POST_COLUMNS
        );
        let slug = patch.slug.clone().unwrap_or_default();
        sqlx::query_as::<_, BlogPost>(&sql)
            .bind(id)
            .bind(patch.slug)
            .bind(patch.title)
            .bind(patch.excerpt)
            .bind(patch.content)
            .bind(patch.published)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, &slug))
    }

    async fn delete_post(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn visitor_count(&self) -> StoreResult<i64> {
        let count: Option<i64> =
            sqlx::query_scalar::<_, i64>("SELECT count FROM visitor_counter WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(count.unwrap_or(0))
    }

    async fn increment_visitors(&self) -> StoreResult<i64> {
        // The seed row may be missing on a hand-built database.
        Ok(sqlx::query_scalar::<_, i64>(
            "INSERT INTO visitor_counter (id, count) VALUES (1, 1) \
             ON CONFLICT (id) DO UPDATE SET count = visitor_counter.count + 1 \
             RETURNING count",
        )
        .fetch_one(&self.pool)
        .await?)
    }
}
