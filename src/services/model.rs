//! Model profile service
//!
//! Business logic for managing model profiles: slug uniqueness, publishing,
//! and the admin listing. Gallery resolution lives in the gallery service;
//! this service only manages the profiles themselves.

use crate::db::repositories::ModelRepository;
use crate::models::{CreateModelInput, Model, UpdateModelInput};
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

/// Error types for model profile operations
#[derive(Debug, thiserror::Error)]
pub enum ModelServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Model with slug '{0}' already exists")]
    SlugExists(String),

    #[error("Model not found")]
    NotFound,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Generate a URL-friendly slug from a display name.
///
/// Lowercases, replaces runs of non-alphanumeric characters with a single
/// dash and trims dashes from both ends.
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

/// Model profile service
pub struct ModelService {
    repo: Arc<dyn ModelRepository>,
}

impl ModelService {
    pub fn new(repo: Arc<dyn ModelRepository>) -> Self {
        Self { repo }
    }

    /// Create a new model profile.
    ///
    /// An empty slug is derived from the name. Slugs must be unique and
    /// URL-friendly.
    pub async fn create(&self, input: CreateModelInput) -> Result<Model, ModelServiceError> {
        if input.name.trim().is_empty() {
            return Err(ModelServiceError::ValidationError(
                "Name must not be empty".to_string(),
            ));
        }

        let slug = if input.slug.trim().is_empty() {
            generate_slug(&input.name)
        } else {
            input.slug.trim().to_string()
        };

        if slug.is_empty() || !SLUG_RE.is_match(&slug) {
            return Err(ModelServiceError::ValidationError(format!(
                "Invalid slug: '{}'",
                slug
            )));
        }

        if self
            .repo
            .exists_by_slug(&slug)
            .await
            .context("Failed to check slug")?
        {
            return Err(ModelServiceError::SlugExists(slug));
        }

        let mut model = Model::new(slug, input.name.trim().to_string());
        model.tagline = input.tagline;
        model.bio = input.bio;
        model.profile_image_url = input.profile_image_url;
        model.members_only = input.members_only;
        model.all_photos_public = input.all_photos_public;
        model.published = input.published;
        model.sort_order = input.sort_order;

        Ok(self
            .repo
            .create(&model)
            .await
            .context("Failed to create model")?)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Model>> {
        self.repo.get_by_id(id).await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Model>> {
        self.repo.get_by_slug(slug).await
    }

    /// Get a published model for the public site
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Option<Model>> {
        let model = self.repo.get_by_slug(slug).await?;
        Ok(model.filter(|m| m.published))
    }

    pub async fn list(&self) -> Result<Vec<Model>> {
        self.repo.list().await
    }

    pub async fn list_published(&self) -> Result<Vec<Model>> {
        self.repo.list_published().await
    }

    pub async fn update(&self, id: i64, input: UpdateModelInput) -> Result<Model, ModelServiceError> {
        let mut model = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load model")?
            .ok_or(ModelServiceError::NotFound)?;

        if let Some(new_slug) = input.slug {
            let new_slug = new_slug.trim().to_string();
            if !SLUG_RE.is_match(&new_slug) {
                return Err(ModelServiceError::ValidationError(format!(
                    "Invalid slug: '{}'",
                    new_slug
                )));
            }
            if new_slug != model.slug
                && self
                    .repo
                    .exists_by_slug(&new_slug)
                    .await
                    .context("Failed to check slug")?
            {
                return Err(ModelServiceError::SlugExists(new_slug));
            }
            model.slug = new_slug;
        }

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(ModelServiceError::ValidationError(
                    "Name must not be empty".to_string(),
                ));
            }
            model.name = name.trim().to_string();
        }
        if let Some(tagline) = input.tagline {
            model.tagline = Some(tagline);
        }
        if let Some(bio) = input.bio {
            model.bio = Some(bio);
        }
        if let Some(profile_image_url) = input.profile_image_url {
            model.profile_image_url = Some(profile_image_url);
        }
        if let Some(members_only) = input.members_only {
            model.members_only = members_only;
        }
        if let Some(all_photos_public) = input.all_photos_public {
            model.all_photos_public = all_photos_public;
        }
        if let Some(published) = input.published {
            model.published = published;
        }
        if let Some(sort_order) = input.sort_order {
            model.sort_order = sort_order;
        }

        Ok(self
            .repo
            .update(&model)
            .await
            .context("Failed to update model")?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ModelServiceError> {
        if self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load model")?
            .is_none()
        {
            return Err(ModelServiceError::NotFound);
        }
        self.repo.delete(id).await.context("Failed to delete model")?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        self.repo.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxModelRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> ModelService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        ModelService::new(Arc::new(SqlxModelRepository::new(pool)))
    }

    fn input(name: &str, slug: &str) -> CreateModelInput {
        CreateModelInput {
            slug: slug.to_string(),
            name: name.to_string(),
            tagline: None,
            bio: None,
            profile_image_url: None,
            members_only: false,
            all_photos_public: false,
            published: false,
            sort_order: 0,
        }
    }

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("Ava Laurent"), "ava-laurent");
        assert_eq!(generate_slug("  Zoé  !! "), "zo");
        assert_eq!(generate_slug("Mia-Rose"), "mia-rose");
        assert_eq!(generate_slug("123"), "123");
    }

    #[tokio::test]
    async fn test_create_derives_slug_from_name() {
        let service = setup().await;
        let model = service.create(input("Ava Laurent", "")).await.unwrap();
        assert_eq!(model.slug, "ava-laurent");
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let service = setup().await;
        service.create(input("Ava", "ava")).await.unwrap();

        let result = service.create(input("Other Ava", "ava")).await;
        assert!(matches!(result, Err(ModelServiceError::SlugExists(_))));
    }

    #[tokio::test]
    async fn test_invalid_slug_rejected() {
        let service = setup().await;
        let result = service.create(input("Ava", "Not A Slug!")).await;
        assert!(matches!(result, Err(ModelServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let service = setup().await;
        let result = service.create(input("   ", "ava")).await;
        assert!(matches!(result, Err(ModelServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_published_lookup_hides_drafts() {
        let service = setup().await;
        service.create(input("Ava", "ava")).await.unwrap();

        assert!(service.get_published_by_slug("ava").await.unwrap().is_none());
        assert!(service.get_by_slug("ava").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_flags() {
        let service = setup().await;
        let model = service.create(input("Ava", "ava")).await.unwrap();

        let updated = service
            .update(
                model.id,
                UpdateModelInput {
                    members_only: Some(true),
                    published: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.members_only);
        assert!(updated.published);

        assert!(service.get_published_by_slug("ava").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_missing_model() {
        let service = setup().await;
        let result = service.update(999, UpdateModelInput::default()).await;
        assert!(matches!(result, Err(ModelServiceError::NotFound)));
    }
}
