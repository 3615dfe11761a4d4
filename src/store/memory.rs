use super::{Store, StoreError, StoreResult, Visibility};
use crate::models::{
    Advice, BlogPost, BlogPostPatch, Contact, Faq, FaqPatch, NewAdvice, NewBlogPost, NewContact,
    NewFaq, NewProject, Project, ProjectPatch,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    contacts: Vec<Contact>,
    advice: Vec<Advice>,
    faqs: Vec<Faq>,
    projects: Vec<Project>,
    posts: Vec<BlogPost>,
    visitors: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the visitor counter at a given value.
    pub fn with_visitors(self, count: i64) -> Self {
        self.lock().visitors = count;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn remove_by_id<T>(rows: &mut Vec<T>, id: i64, id_of: impl Fn(&T) -> i64) -> bool {
    let before = rows.len();
    rows.retain(|row| id_of(row) != id);
    rows.len() != before
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_contact(&self, contact: NewContact) -> StoreResult<Contact> {
        let mut tables = self.lock();
        let row = Contact {
            id: tables.next_id(),
            name: contact.name,
            email: contact.email,
            subject: contact.subject,
            message: contact.message,
            is_read: false,
            created_at: Utc::now(),
        };
        tables.contacts.push(row.clone());
        Ok(row)
    }

    async fn list_contacts(&self) -> StoreResult<Vec<Contact>> {
        let mut rows = self.lock().contacts.clone();
        rows.reverse();
        Ok(rows)
    }

    async fn mark_contact_read(&self, id: i64) -> StoreResult<Option<Contact>> {
        let mut tables = self.lock();
        Ok(tables.contacts.iter_mut().find(|c| c.id == id).map(|c| {
            c.is_read = true;
            c.clone()
        }))
    }

    async fn delete_contact(&self, id: i64) -> StoreResult<bool> {
        Ok(remove_by_id(&mut self.lock().contacts, id, |c| c.id))
    }

    async fn create_advice(&self, advice: NewAdvice) -> StoreResult<Advice> {
        let mut tables = self.lock();
        let row = Advice {
            id: tables.next_id(),
            name: advice.name,
            message: advice.message,
            is_approved: false,
            created_at: Utc::now(),
        };
        tables.advice.push(row.clone());
        Ok(row)
    }

    async fn list_advice(&self, visibility: Visibility) -> StoreResult<Vec<Advice>> {
        Ok(self
            .lock()
            .advice
            .iter()
            .rev()
            .filter(|a| visibility == Visibility::All || a.is_approved)
            .cloned()
            .collect())
    }

    async fn approve_advice(&self, id: i64) -> StoreResult<Option<Advice>> {
        let mut tables = self.lock();
        Ok(tables.advice.iter_mut().find(|a| a.id == id).map(|a| {
            a.is_approved = true;
            a.clone()
        }))
    }

    async fn delete_advice(&self, id: i64) -> StoreResult<bool> {
        Ok(remove_by_id(&mut self.lock().advice, id, |a| a.id))
    }

    async fn list_faqs(&self) -> StoreResult<Vec<Faq>> {
        let mut rows = self.lock().faqs.clone();
        rows.sort_by_key(|f| (f.sort_order, f.id));
        Ok(rows)
    }

    async fn create_faq(&self, faq: NewFaq) -> StoreResult<Faq> {
        let mut tables = self.lock();
        let row = Faq {
            id: tables.next_id(),
            question: faq.question,
            answer: faq.answer,
            sort_order: faq.sort_order,
            updated_at: Utc::now(),
        };
        tables.faqs.push(row.clone());
        Ok(row)
    }

    async fn update_faq(&self, id: i64, patch: FaqPatch) -> StoreResult<Option<Faq>> {
        let mut tables = self.lock();
        Ok(tables.faqs.iter_mut().find(|f| f.id == id).map(|f| {
            if let Some(question) = patch.question {
                f.question = question;
            }
            if let Some(answer) = patch.answer {
                f.answer = answer;
            }
            if let Some(sort_order) = patch.sort_order {
                f.sort_order = sort_order;
            }
            f.updated_at = Utc::now();
            f.clone()
        }))
    }

    async fn delete_faq(&self, id: i64) -> StoreResult<bool> {
        Ok(remove_by_id(&mut self.lock().faqs, id, |f| f.id))
    }

    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let mut rows = self.lock().projects.clone();
        rows.sort_by_key(|p| (p.sort_order, p.id));
        Ok(rows)
    }

    async fn create_project(&self, project: NewProject) -> StoreResult<Project> {
        let mut tables = self.lock();
        let row = Project {
            id: tables.next_id(),
            title: project.title,
            description: project.description,
            image_url: project.image_url,
            project_url: project.project_url,
            repo_url: project.repo_url,
            technologies: project.technologies,
            sort_order: project.sort_order,
            created_at: Utc::now(),
        };
        tables.projects.push(row.clone());
        Ok(row)
    }

    async fn update_project(&self, id: i64, patch: ProjectPatch) -> StoreResult<Option<Project>> {
        let mut tables = self.lock();
        Ok(tables.projects.iter_mut().find(|p| p.id == id).map(|p| {
            if let Some(title) = patch.title {
                p.title = title;
            }
            if let Some(description) = patch.description {
                p.description = description;
            }
            if patch.image_url.is_some() {
                p.image_url = patch.image_url;
            }
            if patch.project_url.is_some() {
                p.project_url = patch.project_url;
            }
            if patch.repo_url.is_some() {
                p.repo_url = patch.repo_url;
            }
            if let Some(technologies) = patch.technologies {
                p.technologies = technologies;
            }
            if let Some(sort_order) = patch.sort_order {
                p.sort_order = sort_order;
            }
            p.clone()
        }))
    }

    async fn delete_project(&self, id: i64) -> StoreResult<bool> {
        Ok(remove_by_id(&mut self.lock().projects, id, |p| p.id))
    }

    async fn list_posts(&self, visibility: Visibility) -> StoreResult<Vec<BlogPost>> {
        Ok(self
            .lock()
            .posts
            .iter()
            .rev()
            .filter(|p| visibility == Visibility::All || p.published)
            .cloned()
            .collect())
    }

    async fn get_post(&self, slug: &str, visibility: Visibility) -> StoreResult<Option<BlogPost>> {
        Ok(self
            .lock()
            .posts
            .iter()
            .find(|p| p.slug == slug && (visibility == Visibility::All || p.published))
            .cloned())
    }

    async fn create_post(&self, post: NewBlogPost) -> StoreResult<BlogPost> {
        let mut tables = self.lock();
        if tables.posts.iter().any(|p| p.slug == post.slug) {
            return Err(StoreError::Conflict(format!(
                "a post with slug '{}' already exists",
                post.slug
            )));
        }

        let now = Utc::now();
        let row = BlogPost {
            id: tables.next_id(),
            slug: post.slug,
            title: post.title,
            excerpt: post.excerpt,
            content: post.content,
            published: post.published,
            created_at: now,
            updated_at: now,
        };
        tables.posts.push(row.clone());
        Ok(row)
    }

    async fn update_post(&self, id: i64, patch: BlogPostPatch) -> StoreResult<Option<BlogPost>> {
        let mut tables = self.lock();
        if let Some(slug) = &patch.slug {
            if tables.posts.iter().any(|p| &p.slug == slug && p.id != id) {
                return Err(StoreError::Conflict(format!(
                    "a post with slug '{}' already exists",
                    slug
                )));
            }
        }

        Ok(tables.posts.iter_mut().find(|p| p.id == id).map(|p| {
            if let Some(slug) = patch.slug {
                p.slug = slug;
            }
            if let Some(title) = patch.title {
                p.title = title;
            }
            if patch.excerpt.is_some() {
                p.excerpt = patch.excerpt;
            }
            if let Some(content) = patch.content {
                p.content = content;
            }
            if let Some(published) = patch.published {
                p.published = published;
            }
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    async fn delete_post(&self, id: i64) -> StoreResult<bool> {
        Ok(remove_by_id(&mut self.lock().posts, id, |p| p.id))
    }

    async fn visitor_count(&self) -> StoreResult<i64> {
        Ok(self.lock().visitors)
    }

    async fn increment_visitors(&self) -> StoreResult<i64> {
        let mut tables = self.lock();
        tables.visitors += 1;
        Ok(tables.visitors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(slug: &str, published: bool) -> NewBlogPost {
        NewBlogPost {
            slug: slug.to_string(),
            title: "Title".to_string(),
            excerpt: None,
            content: "Body".to_string(),
            published,
        }
    }

    #[tokio::test]
    async fn test_advice_visibility() {
        let store = MemoryStore::new();
        let first = store
            .create_advice(NewAdvice {
                name: "Ken".to_string(),
                message: "Ship it".to_string(),
            })
            .await
            .unwrap();
        store
            .create_advice(NewAdvice {
                name: "Mia".to_string(),
                message: "Write tests".to_string(),
            })
            .await
            .unwrap();

        assert!(store.list_advice(Visibility::Public).await.unwrap().is_empty());
        store.approve_advice(first.id).await.unwrap();

        let public = store.list_advice(Visibility::Public).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].name, "Ken");

        let all = store.list_advice(Visibility::All).await.unwrap();
        assert_eq!(all[0].name, "Mia");
    }

    #[tokio::test]
    async fn test_faq_update_and_order() {
        let store = MemoryStore::new();
        let a = store
            .create_faq(NewFaq {
                question: "A?".to_string(),
                answer: "a".to_string(),
                sort_order: 2,
            })
            .await
            .unwrap();
        store
            .create_faq(NewFaq {
                question: "B?".to_string(),
                answer: "b".to_string(),
                sort_order: 1,
            })
            .await
            .unwrap();

        let updated = store
            .update_faq(
                a.id,
                FaqPatch {
                    sort_order: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.answer, "a");

        let order: Vec<_> = store
            .list_faqs()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.question)
            .collect();
        assert_eq!(order, vec!["A?", "B?"]);

        assert!(store.update_faq(999, FaqPatch::default()).await.unwrap().is_none());
        assert!(store.delete_faq(a.id).await.unwrap());
        assert!(!store.delete_faq(a.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_post_slug_conflict_and_visibility() {
        let store = MemoryStore::new();
        store.create_post(new_post("draft", false)).await.unwrap();
        let live = store.create_post(new_post("live", true)).await.unwrap();

        assert!(matches!(
            store.create_post(new_post("live", false)).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(store.get_post("draft", Visibility::Public).await.unwrap().is_none());
        assert!(store.get_post("draft", Visibility::All).await.unwrap().is_some());

        let renamed = BlogPostPatch {
            slug: Some("draft".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_post(live.id, renamed).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.list_posts(Visibility::Public).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_visitor_counter() {
        let store = MemoryStore::new().with_visitors(41);
        assert_eq!(store.increment_visitors().await.unwrap(), 42);
        assert_eq!(store.visitor_count().await.unwrap(), 42);
    }
}
