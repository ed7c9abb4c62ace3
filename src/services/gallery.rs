//! Gallery service
//!
//! Single home of the gallery visibility policy. Every rendering surface
//! (public site, admin preview, live refresh) resolves a gallery through
//! `resolve_visible_photos`; no caller re-implements the tier rules.
//!
//! The policy, evaluated top-down with first match winning:
//!
//! - `all_photos_public` overrides everything: every photo, any tier.
//! - Members-only models show nothing to anonymous and regular viewers.
//! - Admins and members see the members-only tagged set; when a model has no
//!   exclusive photos yet, the public set is substituted so the gallery is
//!   never needlessly empty.
//! - On unrestricted models anonymous and regular viewers see the public set.
//!
//! Admins get the same restricted set as members on mixed-visibility
//! models, so a preview never shows near-duplicate public+exclusive copies
//! of the same shot. Product decision, not a technical constraint.
//!
//! Results are ordered by `(order_index, id)` and de-duplicated by image URL,
//! keeping the first occurrence. A gallery that still resolves to nothing is
//! substituted (by the caller-facing `load` methods) with a single synthetic
//! entry built from the model's profile image; that entry is a display
//! fallback and never passes through the visibility filter.

use crate::db::repositories::{ModelRepository, PhotoRepository};
use crate::models::{
    AccessContext, AccessTier, CreatePhotoInput, GalleryPhoto, Model, PhotoVisibility,
    UpdatePhotoInput,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Error types for gallery operations
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    /// The requested model does not exist
    #[error("Model not found")]
    ModelNotFound,

    /// The requested photo does not exist
    #[error("Photo not found")]
    PhotoNotFound,

    /// A model or photo lookup failed; no partial result is produced
    #[error("Gallery lookup failed: {0}")]
    Lookup(#[from] anyhow::Error),
}

/// A resolved, ready-to-render gallery.
///
/// Transient: recomputed on every load and on gallery-updated signals,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedGallery {
    /// The model this gallery belongs to
    pub model_id: i64,
    /// Ordered, de-duplicated photos the viewer may see
    pub photos: Vec<GalleryPhoto>,
    /// True when `photos` holds the synthetic profile-image entry
    pub placeholder: bool,
}

/// Apply the visibility policy to a photo set.
///
/// Pure: reads the model's flags and the viewer tier, returns the subset the
/// viewer may see, ordered by `(order_index, id)` and de-duplicated by image
/// URL. Never produces the synthetic placeholder; that substitution happens
/// at the load boundary.
pub fn resolve_visible_photos(
    tier: AccessTier,
    model: &Model,
    photos: &[GalleryPhoto],
) -> Vec<GalleryPhoto> {
    let mut selected: Vec<GalleryPhoto> = if model.all_photos_public {
        photos.to_vec()
    } else {
        match tier {
            AccessTier::Admin | AccessTier::Member => {
                let exclusive: Vec<GalleryPhoto> = photos
                    .iter()
                    .filter(|p| p.visibility == PhotoVisibility::MembersOnly)
                    .cloned()
                    .collect();
                if exclusive.is_empty() {
                    photos
                        .iter()
                        .filter(|p| p.visibility == PhotoVisibility::Public)
                        .cloned()
                        .collect()
                } else {
                    exclusive
                }
            }
            AccessTier::Anonymous | AccessTier::Regular => {
                if model.members_only {
                    Vec::new()
                } else {
                    photos
                        .iter()
                        .filter(|p| p.visibility == PhotoVisibility::Public)
                        .cloned()
                        .collect()
                }
            }
        }
    };

    selected.sort_by_key(|p| (p.order_index, p.id));

    let mut seen = HashSet::new();
    selected.retain(|p| seen.insert(p.image_url.clone()));

    selected
}

/// Broadcast channel for gallery-updated signals.
///
/// Photo mutations publish the owning model id; any number of listeners
/// re-run resolution from scratch. There is no incremental patching.
#[derive(Clone)]
pub struct GalleryNotifier {
    tx: broadcast::Sender<i64>,
}

impl GalleryNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Announce that a model's gallery contents changed
    pub fn notify(&self, model_id: i64) {
        // Send only fails when no listener exists, which is fine
        let _ = self.tx.send(model_id);
    }

    /// Subscribe to gallery-updated signals
    pub fn subscribe(&self) -> broadcast::Receiver<i64> {
        self.tx.subscribe()
    }
}

impl Default for GalleryNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Gallery service: resolution plus admin photo management.
pub struct GalleryService {
    model_repo: Arc<dyn ModelRepository>,
    photo_repo: Arc<dyn PhotoRepository>,
    notifier: GalleryNotifier,
}

impl GalleryService {
    pub fn new(model_repo: Arc<dyn ModelRepository>, photo_repo: Arc<dyn PhotoRepository>) -> Self {
        Self {
            model_repo,
            photo_repo,
            notifier: GalleryNotifier::new(),
        }
    }

    /// The notifier carrying this service's gallery-updated signals
    pub fn notifier(&self) -> &GalleryNotifier {
        &self.notifier
    }

    /// Resolve the gallery of a model for the given viewer.
    ///
    /// One fetch sequence per call: model flags, then photos (with the
    /// visibility filter pushed down where the policy allows), then the
    /// policy. Any lookup failure aborts with `GalleryError::Lookup`; no
    /// partial result is produced and no retry is attempted here.
    pub async fn load(
        &self,
        ctx: &AccessContext,
        model_id: i64,
    ) -> Result<ResolvedGallery, GalleryError> {
        let model = self
            .model_repo
            .get_by_id(model_id)
            .await?
            .ok_or(GalleryError::ModelNotFound)?;

        self.resolve_for(ctx, &model).await
    }

    /// Resolve the gallery of a model addressed by slug.
    pub async fn load_by_slug(
        &self,
        ctx: &AccessContext,
        slug: &str,
    ) -> Result<ResolvedGallery, GalleryError> {
        let model = self
            .model_repo
            .get_by_slug(slug)
            .await?
            .ok_or(GalleryError::ModelNotFound)?;

        self.resolve_for(ctx, &model).await
    }

    async fn resolve_for(
        &self,
        ctx: &AccessContext,
        model: &Model,
    ) -> Result<ResolvedGallery, GalleryError> {
        let candidates = self.fetch_candidates(ctx.tier, model).await?;
        let visible = resolve_visible_photos(ctx.tier, model, &candidates);

        if visible.is_empty() {
            // Display fallback only; not subject to the visibility filter
            if let Some(placeholder) = GalleryPhoto::placeholder(model) {
                return Ok(ResolvedGallery {
                    model_id: model.id,
                    photos: vec![placeholder],
                    placeholder: true,
                });
            }
        }

        Ok(ResolvedGallery {
            model_id: model.id,
            photos: visible,
            placeholder: false,
        })
    }

    /// Fetch the photo candidates for one resolution, pushing the visibility
    /// filter into the query where the policy's outcome only depends on one
    /// tag. The fallback re-query uses a different filter value.
    async fn fetch_candidates(
        &self,
        tier: AccessTier,
        model: &Model,
    ) -> Result<Vec<GalleryPhoto>, GalleryError> {
        if model.all_photos_public {
            return Ok(self.photo_repo.list_by_model(model.id, None).await?);
        }

        match tier {
            AccessTier::Admin | AccessTier::Member => {
                let exclusive = self
                    .photo_repo
                    .list_by_model(model.id, Some(PhotoVisibility::MembersOnly))
                    .await?;
                if exclusive.is_empty() {
                    Ok(self
                        .photo_repo
                        .list_by_model(model.id, Some(PhotoVisibility::Public))
                        .await?)
                } else {
                    Ok(exclusive)
                }
            }
            AccessTier::Anonymous | AccessTier::Regular => {
                if model.members_only {
                    Ok(Vec::new())
                } else {
                    Ok(self
                        .photo_repo
                        .list_by_model(model.id, Some(PhotoVisibility::Public))
                        .await?)
                }
            }
        }
    }

    /// Total number of photos across all galleries (dashboard counter)
    pub async fn photo_count(&self) -> Result<i64, GalleryError> {
        Ok(self.photo_repo.count().await?)
    }

    /// List every photo of a model regardless of visibility, for the admin
    /// management screen.
    pub async fn list_all(&self, model_id: i64) -> Result<Vec<GalleryPhoto>, GalleryError> {
        if self.model_repo.get_by_id(model_id).await?.is_none() {
            return Err(GalleryError::ModelNotFound);
        }
        Ok(self.photo_repo.list_by_model(model_id, None).await?)
    }

    /// Add a photo to a model's gallery and signal listeners.
    ///
    /// Without an explicit `order_index` the photo lands at the end of the
    /// gallery.
    pub async fn add_photo(
        &self,
        model_id: i64,
        input: CreatePhotoInput,
    ) -> Result<GalleryPhoto, GalleryError> {
        if self.model_repo.get_by_id(model_id).await?.is_none() {
            return Err(GalleryError::ModelNotFound);
        }

        let order_index = match input.order_index {
            Some(idx) => idx,
            None => self
                .photo_repo
                .max_order_index(model_id)
                .await?
                .map_or(0, |max| max + 1),
        };

        let mut photo = GalleryPhoto::new(model_id, input.image_url, order_index, input.visibility);
        photo.caption = input.caption;

        let created = self.photo_repo.create(&photo).await?;
        self.notifier.notify(model_id);
        Ok(created)
    }

    /// Update a photo and signal listeners.
    pub async fn update_photo(
        &self,
        photo_id: i64,
        input: UpdatePhotoInput,
    ) -> Result<GalleryPhoto, GalleryError> {
        let mut photo = self
            .photo_repo
            .get_by_id(photo_id)
            .await?
            .ok_or(GalleryError::PhotoNotFound)?;

        if let Some(image_url) = input.image_url {
            photo.image_url = image_url;
        }
        if let Some(caption) = input.caption {
            photo.caption = Some(caption);
        }
        if let Some(order_index) = input.order_index {
            photo.order_index = order_index;
        }
        if let Some(visibility) = input.visibility {
            photo.visibility = visibility;
        }

        let updated = self.photo_repo.update(&photo).await?;
        self.notifier.notify(updated.model_id);
        Ok(updated)
    }

    /// Delete a photo and signal listeners.
    pub async fn delete_photo(&self, photo_id: i64) -> Result<(), GalleryError> {
        let photo = self
            .photo_repo
            .get_by_id(photo_id)
            .await?
            .ok_or(GalleryError::PhotoNotFound)?;

        self.photo_repo.delete(photo_id).await?;
        self.notifier.notify(photo.model_id);
        Ok(())
    }
}

/// State holder for a live gallery rendering surface.
///
/// Tracks which model the surface currently shows and guards against stale
/// resolutions: a result arriving after the surface switched to another
/// model is dropped, keyed by model id.
pub struct GalleryView {
    state: Mutex<ViewState>,
}

struct ViewState {
    focused: Option<i64>,
    displayed: Option<ResolvedGallery>,
}

impl GalleryView {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ViewState {
                focused: None,
                displayed: None,
            }),
        }
    }

    /// Switch the surface to another model. Clears the displayed gallery;
    /// any in-flight resolution for the previous model will be dropped on
    /// arrival.
    pub fn focus(&self, model_id: i64) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.focused != Some(model_id) {
            state.focused = Some(model_id);
            state.displayed = None;
        }
    }

    /// The model the surface currently shows
    pub fn focused(&self) -> Option<i64> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .focused
    }

    /// Apply a completed resolution. Returns false (and leaves the display
    /// untouched) when the result no longer matches the focused model.
    pub fn apply(&self, gallery: ResolvedGallery) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.focused != Some(gallery.model_id) {
            tracing::debug!(
                "Dropping stale gallery resolution for model {}",
                gallery.model_id
            );
            return false;
        }
        state.displayed = Some(gallery);
        true
    }

    /// The gallery the surface currently displays
    pub fn displayed(&self) -> Option<ResolvedGallery> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .displayed
            .clone()
    }
}

impl Default for GalleryView {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep a view current: re-resolve whenever a gallery-updated signal for the
/// focused model arrives, applying results through the view's stale guard.
/// Every applied gallery is also forwarded on `events` for streaming
/// consumers.
///
/// Used by the live gallery stream; the task ends when the notifier is
/// dropped, the event receiver goes away, or the returned handle is aborted.
pub fn spawn_gallery_watcher(
    service: Arc<GalleryService>,
    view: Arc<GalleryView>,
    ctx: AccessContext,
    events: tokio::sync::mpsc::Sender<ResolvedGallery>,
) -> tokio::task::JoinHandle<()> {
    let mut rx = service.notifier().subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(model_id) => {
                    if view.focused() != Some(model_id) {
                        continue;
                    }
                    match service.load(&ctx, model_id).await {
                        Ok(gallery) => {
                            if view.apply(gallery.clone())
                                && events.send(gallery).await.is_err()
                            {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::error!(
                                "Gallery refresh failed for model {}: {:#}",
                                model_id,
                                e
                            );
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Gallery watcher lagged, skipped {} signals", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
