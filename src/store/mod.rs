//! Persistence for site content.
//!
//! `PgStore` is the production backend; `MemoryStore` backs local runs
//! without `DATABASE_URL` and the test suite.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::models::{
    Advice, BlogPost, BlogPostPatch, Contact, Faq, FaqPatch, NewAdvice, NewBlogPost, NewContact,
    NewFaq, NewProject, Project, ProjectPatch,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Whether a listing includes unpublished/unapproved rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    All,
}

#[async_trait]
pub trait Store: Send + Sync {
    // Contacts
    async fn create_contact(&self, contact: NewContact) -> StoreResult<Contact>;
    async fn list_contacts(&self) -> StoreResult<Vec<Contact>>;
    async fn mark_contact_read(&self, id: i64) -> StoreResult<Option<Contact>>;
    async fn delete_contact(&self, id: i64) -> StoreResult<bool>;

    // Advice wall
    async fn create_advice(&self, advice: NewAdvice) -> StoreResult<Advice>;
    /// Newest first
    async fn list_advice(&self, visibility: Visibility) -> StoreResult<Vec<Advice>>;
    async fn approve_advice(&self, id: i64) -> StoreResult<Option<Advice>>;
    async fn delete_advice(&self, id: i64) -> StoreResult<bool>;

    // FAQ
    /// Ordered by `sort_order`, then id
    async fn list_faqs(&self) -> StoreResult<Vec<Faq>>;
    async fn create_faq(&self, faq: NewFaq) -> StoreResult<Faq>;
    async fn update_faq(&self, id: i64, patch: FaqPatch) -> StoreResult<Option<Faq>>;
    async fn delete_faq(&self, id: i64) -> StoreResult<bool>;

    // Projects
    async fn list_projects(&self) -> StoreResult<Vec<Project>>;
    async fn create_project(&self, project: NewProject) -> StoreResult<Project>;
    async fn update_project(&self, id: i64, patch: ProjectPatch) -> StoreResult<Option<Project>>;
    async fn delete_project(&self, id: i64) -> StoreResult<bool>;

    // Blog
    /// Newest first
    async fn list_posts(&self, visibility: Visibility) -> StoreResult<Vec<BlogPost>>;
    async fn get_post(&self, slug: &str, visibility: Visibility) -> StoreResult<Option<BlogPost>>;
    async fn create_post(&self, post: NewBlogPost) -> StoreResult<BlogPost>;
    async fn update_post(&self, id: i64, patch: BlogPostPatch) -> StoreResult<Option<BlogPost>>;
    async fn delete_post(&self, id: i64) -> StoreResult<bool>;

    // Visitor counter
    async fn visitor_count(&self) -> StoreResult<i64>;
    /// Returns the count after the increment
    async fn increment_visitors(&self) -> StoreResult<i64>;
}
