//! Site content records and the request payloads that create or change them.
//!
//! Request payloads deserialize with every field optional so that missing
//! fields surface as field-level validation errors instead of a body
//! rejection.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_CONTACT_MESSAGE_LEN: usize = 5000;
pub const MAX_ADVICE_MESSAGE_LEN: usize = 500;

// ==================== Records ====================

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Advice {
    pub id: i64,
    pub name: String,
    pub message: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Faq {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub sort_order: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub project_url: Option<String>,
    pub repo_url: Option<String>,
    pub technologies: Vec<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct BlogPost {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==================== Validation ====================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
static SLUG_REGEX: OnceLock<Regex> = OnceLock::new();

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"))
        .is_match(email)
}

fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX
        .get_or_init(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid regex"))
        .is_match(slug)
}

/// Collects field errors while pulling required and optional values out of a
/// payload.
#[derive(Debug, Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn required(&mut self, field: &'static str, value: Option<String>, max: Option<usize>) -> String {
        match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            Some(v) => {
                self.max_len(field, &v, max);
                v
            }
            None => {
                self.errors
                    .push(FieldError::new(field, format!("{} is required", field)));
                String::new()
            }
        }
    }

    /// A field that may be omitted, but not sent blank.
    fn present(&mut self, field: &'static str, value: Option<String>, max: Option<usize>) -> Option<String> {
        let value = value?;
        Some(self.required(field, Some(value), max))
    }

    fn optional(value: Option<String>) -> Option<String> {
        value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn max_len(&mut self, field: &'static str, value: &str, max: Option<usize>) {
        if let Some(max) = max {
            if value.chars().count() > max {
                self.errors.push(FieldError::new(
                    field,
                    format!("{} must be at most {} characters", field, max),
                ));
            }
        }
    }

    fn fail(&mut self, field: &'static str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

// ==================== Contact ====================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

impl ContactRequest {
    pub fn validate(self) -> Result<NewContact, Vec<FieldError>> {
        let mut check = Checker::default();
        let name = check.required("name", self.name, Some(MAX_NAME_LEN));
        let email = check.required("email", self.email, None);
        if !email.is_empty() && !is_valid_email(&email) {
            check.fail("email", "email must be a valid email address");
        }
        let message = check.required("message", self.message, Some(MAX_CONTACT_MESSAGE_LEN));

        check.finish(NewContact {
            name,
            email,
            subject: Checker::optional(self.subject),
            message,
        })
    }
}

// ==================== Advice ====================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdviceRequest {
    pub name: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdvice {
    pub name: String,
    pub message: String,
}

impl AdviceRequest {
    pub fn validate(self) -> Result<NewAdvice, Vec<FieldError>> {
        let mut check = Checker::default();
        let name = check.required("name", self.name, Some(MAX_NAME_LEN));
        let message = check.required("message", self.message, Some(MAX_ADVICE_MESSAGE_LEN));
        check.finish(NewAdvice { name, message })
    }
}

// ==================== FAQ ====================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FaqRequest {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFaq {
    pub question: String,
    pub answer: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaqPatch {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub sort_order: Option<i32>,
}

impl FaqRequest {
    pub fn validate_new(self) -> Result<NewFaq, Vec<FieldError>> {
        let mut check = Checker::default();
        let question = check.required("question", self.question, None);
        let answer = check.required("answer", self.answer, None);
        check.finish(NewFaq {
            question,
            answer,
            sort_order: self.sort_order.unwrap_or(0),
        })
    }

    pub fn validate_patch(self) -> Result<FaqPatch, Vec<FieldError>> {
        let mut check = Checker::default();
        let question = check.present("question", self.question, None);
        let answer = check.present("answer", self.answer, None);
        check.finish(FaqPatch {
            question,
            answer,
            sort_order: self.sort_order,
        })
    }
}

// ==================== Projects ====================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub project_url: Option<String>,
    pub repo_url: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub project_url: Option<String>,
    pub repo_url: Option<String>,
    pub technologies: Vec<String>,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub project_url: Option<String>,
    pub repo_url: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub sort_order: Option<i32>,
}

fn clean_technologies(technologies: Vec<String>) -> Vec<String> {
    technologies
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

impl ProjectRequest {
    pub fn validate_new(self) -> Result<NewProject, Vec<FieldError>> {
        let mut check = Checker::default();
        let title = check.required("title", self.title, Some(200));
        let description = check.required("description", self.description, None);
        check.finish(NewProject {
            title,
            description,
            image_url: Checker::optional(self.image_url),
            project_url: Checker::optional(self.project_url),
            repo_url: Checker::optional(self.repo_url),
            technologies: clean_technologies(self.technologies.unwrap_or_default()),
            sort_order: self.sort_order.unwrap_or(0),
        })
    }

    pub fn validate_patch(self) -> Result<ProjectPatch, Vec<FieldError>> {
        let mut check = Checker::default();
        let title = check.present("title", self.title, Some(200));
        let description = check.present("description", self.description, None);
        check.finish(ProjectPatch {
            title,
            description,
            image_url: Checker::optional(self.image_url),
            project_url: Checker::optional(self.project_url),
            repo_url: Checker::optional(self.repo_url),
            technologies: self.technologies.map(clean_technologies),
            sort_order: self.sort_order,
        })
    }
}

// ==================== Blog ====================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BlogPostRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBlogPost {
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub published: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogPostPatch {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

impl BlogPostRequest {
    pub fn validate_new(self) -> Result<NewBlogPost, Vec<FieldError>> {
        let mut check = Checker::default();
        let slug = check.required("slug", self.slug, Some(200));
        if !slug.is_empty() && !is_valid_slug(&slug) {
            check.fail("slug", "slug must be lowercase words separated by hyphens");
        }
        let title = check.required("title", self.title, Some(200));
        let content = check.required("content", self.content, None);
        check.finish(NewBlogPost {
            slug,
            title,
            excerpt: Checker::optional(self.excerpt),
            content,
            published: self.published.unwrap_or(false),
        })
    }

    pub fn validate_patch(self) -> Result<BlogPostPatch, Vec<FieldError>> {
        let mut check = Checker::default();
        let slug = check.present("slug", self.slug, Some(200));
        if let Some(slug) = &slug {
            if !slug.is_empty() && !is_valid_slug(slug) {
                check.fail("slug", "slug must be lowercase words separated by hyphens");
            }
        }
        let title = check.present("title", self.title, Some(200));
        let content = check.present("content", self.content, None);
        check.finish(BlogPostPatch {
            slug,
            title,
            excerpt: Checker::optional(self.excerpt),
            content,
            published: self.published,
        })
    }
}
