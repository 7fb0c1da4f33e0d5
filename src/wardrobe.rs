//! The signed-in user's wardrobe, kept in memory and synchronized with the
//! remote table
//!
//! [`WardrobeManager`] owns the authoritative item list. Callers observe it
//! through [`WardrobeManager::subscribe`] and change it only through the
//! manager's operations. Every fetch takes a new generation number; a
//! response that arrives after a newer fetch started, or after
//! [`WardrobeManager::close`], is dropped instead of applied.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, warn};
use tokio::sync::watch;

use outfit_auth::Auth;

use crate::error::Error;
use crate::images::ImageStore;
use crate::models::{
    Category, NewWardrobeItem, WardrobeFilters, WardrobeItem, WardrobeItemUpdate,
    WardrobeSortOptions, WarmthLevel,
};
use crate::repository::{UserScope, WardrobeRepository};
use crate::store::Store;
use crate::validation::{FieldSchema, RequiredSchema, ValidationErrors, ITEM_NAME_REQUIRED};

/// Everything a wardrobe screen renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WardrobeState {
    /// Ordered by the sort of the last fetch; added items are prepended
    pub items: Vec<WardrobeItem>,
    pub filters: WardrobeFilters,
    pub sort_options: WardrobeSortOptions,
    pub is_loading: bool,
    /// Message of the last failed fetch
    pub error: Option<String>,
}

impl WardrobeState {
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Items per category; categories without items are absent
    pub fn category_count(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for item in &self.items {
            *counts.entry(item.category).or_insert(0) += 1;
        }
        counts
    }

    /// Items passing the current filters, in the current sort order
    pub fn filtered_items(&self) -> Vec<WardrobeItem> {
        let mut items: Vec<WardrobeItem> = self
            .items
            .iter()
            .filter(|item| self.filters.matches(item))
            .cloned()
            .collect();
        items.sort_by(|a, b| self.sort_options.compare(a, b));
        items
    }

    pub fn find(&self, id: &str) -> Option<&WardrobeItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

pub struct WardrobeManager {
    repository: Arc<dyn WardrobeRepository>,
    images: Option<Arc<dyn ImageStore>>,
    auth: Auth,
    state: Store<WardrobeState>,
    generation: AtomicU64,
    closed: AtomicBool,
}

impl WardrobeManager {
    pub fn new(repository: Arc<dyn WardrobeRepository>, auth: Auth) -> Self {
        Self {
            repository,
            images: None,
            auth,
            state: Store::default(),
            generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Remove stored photos of deleted items through `images`
    pub fn with_images(mut self, images: Arc<dyn ImageStore>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn state(&self) -> WardrobeState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<WardrobeState> {
        self.state.subscribe()
    }

    pub fn items(&self) -> Vec<WardrobeItem> {
        self.state.read(|s| s.items.clone())
    }

    pub fn item_count(&self) -> usize {
        self.state.read(WardrobeState::item_count)
    }

    pub fn category_count(&self) -> BTreeMap<Category, usize> {
        self.state.read(WardrobeState::category_count)
    }

    pub fn filtered_items(&self) -> Vec<WardrobeItem> {
        self.state.read(WardrobeState::filtered_items)
    }

    pub fn is_loading(&self) -> bool {
        self.state.read(|s| s.is_loading)
    }

    pub fn error(&self) -> Option<String> {
        self.state.read(|s| s.error.clone())
    }

    /// Replace the filters; takes effect on the next fetch
    pub fn set_filters(&self, filters: WardrobeFilters) {
        self.state.update(|s| s.filters = filters);
    }

    /// Replace the sort; takes effect on the next fetch
    pub fn set_sort_options(&self, sort_options: WardrobeSortOptions) {
        self.state.update(|s| s.sort_options = sort_options);
    }

    /// Stop applying responses to the state
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn scope(&self) -> Option<UserScope> {
        let session = match self.auth.ensure_fresh_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("[wardrobe] session refresh failed: {}", e);
                self.auth.get_session()
            }
        }?;
        Some(UserScope::new(&session.user.id, Some(&session.access_token)))
    }

    async fn require_scope(&self) -> Result<UserScope, Error> {
        self.scope().await.ok_or(Error::NotAuthenticated)
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.is_closed() && self.generation.load(Ordering::SeqCst) == generation
    }

    /// Apply `f` only while `generation` is the latest fetch
    fn apply_fetch(&self, generation: u64, f: impl FnOnce(&mut WardrobeState)) -> bool {
        if !self.is_current(generation) {
            debug!("[wardrobe] discarding response of superseded fetch {}", generation);
            return false;
        }
        self.state.update(f);
        true
    }

    fn apply_mutation(&self, f: impl FnOnce(&mut WardrobeState)) {
        if self.is_closed() {
            debug!("[wardrobe] manager closed, not applying mutation");
            return;
        }
        self.state.update(f);
    }

    /// Reload every item matching the current filters and sort.
    ///
    /// Without a signed-in user the list is cleared. A failure keeps the
    /// previous items and records the message in `error`.
    pub async fn fetch(&self) -> Result<(), Error> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let scope = match self.scope().await {
            Some(scope) => scope,
            None => {
                self.apply_fetch(generation, |s| {
                    s.items.clear();
                    s.is_loading = false;
                    s.error = None;
                });
                return Ok(());
            }
        };

        let (filters, sort_options) = self.state.read(|s| (s.filters.clone(), s.sort_options));
        self.apply_fetch(generation, |s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.repository.list(&scope, &filters, &sort_options).await {
            Ok(items) => {
                self.apply_fetch(generation, |s| {
                    s.items = items;
                    s.is_loading = false;
                });
                Ok(())
            }
            Err(e) => {
                error!("[wardrobe] fetch failed: {}", e);
                let message = e.to_string();
                self.apply_fetch(generation, |s| {
                    s.error = Some(message);
                    s.is_loading = false;
                });
                Err(e)
            }
        }
    }

    pub async fn refetch(&self) -> Result<(), Error> {
        self.fetch().await
    }

    /// Insert a new item owned by the signed-in user and prepend it
    pub async fn add(&self, item: NewWardrobeItem) -> Result<WardrobeItem, Error> {
        let scope = self.require_scope().await?;
        if let Err(violation) = RequiredSchema::new(ITEM_NAME_REQUIRED).parse(&item.name) {
            return Err(ValidationErrors::single("name", violation).into());
        }

        let created = self.repository.insert(&scope, &item).await.map_err(|e| {
            error!("[wardrobe] insert failed: {}", e);
            e
        })?;

        let prepended = created.clone();
        self.apply_mutation(|s| s.items.insert(0, prepended));
        Ok(created)
    }

    /// Change fields of one of the signed-in user's items
    pub async fn update(
        &self,
        id: &str,
        changes: WardrobeItemUpdate,
    ) -> Result<WardrobeItem, Error> {
        let scope = self.require_scope().await?;

        if let Some(times_worn) = changes.times_worn {
            let known = self.state.read(|s| s.find(id).map(|item| item.times_worn));
            if let Some(known) = known.filter(|known| times_worn < *known) {
                return Err(Error::InvalidUpdate(format!(
                    "times_worn cannot decrease from {} to {}",
                    known, times_worn
                )));
            }
        }

        let updated = self
            .repository
            .update(&scope, id, &changes, Utc::now())
            .await
            .map_err(|e| {
                error!("[wardrobe] update of {} failed: {}", id, e);
                e
            })?;

        let replacement = updated.clone();
        self.apply_mutation(|s| {
            if let Some(slot) = s.items.iter_mut().find(|item| item.id == replacement.id) {
                *slot = replacement;
            }
        });
        Ok(updated)
    }

    /// Delete one of the signed-in user's items.
    ///
    /// The stored photo is removed afterwards on a best-effort basis; a
    /// failure there is logged and does not fail the delete.
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        let scope = self.require_scope().await?;
        let image_url = self
            .state
            .read(|s| s.find(id).and_then(|item| item.image_url.clone()));

        self.repository.delete(&scope, id).await.map_err(|e| {
            error!("[wardrobe] delete of {} failed: {}", id, e);
            e
        })?;

        self.apply_mutation(|s| s.items.retain(|item| item.id != id));

        if let (Some(images), Some(url)) = (&self.images, image_url) {
            if !images.delete_wardrobe_image(&url).await {
                warn!("[wardrobe] could not delete image of item {}", id);
            }
        }
        Ok(())
    }

    /// Fresh remote lookup; `None` when absent, not owned, or on any failure
    pub async fn get_item(&self, id: &str) -> Option<WardrobeItem> {
        let scope = self.scope().await?;
        match self.repository.get(&scope, id).await {
            Ok(item) => item,
            Err(e) => {
                error!("[wardrobe] get item {} failed: {}", id, e);
                None
            }
        }
    }

    /// Items of one category, newest first, without touching the state
    pub async fn fetch_by_category(&self, category: Category) -> Result<Vec<WardrobeItem>, Error> {
        self.fetch_matching(WardrobeFilters::default().category(category))
            .await
    }

    /// Items of one warmth level, newest first, without touching the state
    pub async fn fetch_by_warmth_level(
        &self,
        level: WarmthLevel,
    ) -> Result<Vec<WardrobeItem>, Error> {
        self.fetch_matching(WardrobeFilters::default().warmth_level(level))
            .await
    }

    async fn fetch_matching(&self, filters: WardrobeFilters) -> Result<Vec<WardrobeItem>, Error> {
        let scope = self.require_scope().await?;
        self.repository
            .list(&scope, &filters, &WardrobeSortOptions::default())
            .await
            .map_err(|e| {
                error!("[wardrobe] filtered fetch failed: {}", e);
                e
            })
    }

    /// Flip the favorite flag of a loaded item
    pub async fn toggle_favorite(&self, id: &str) -> Result<WardrobeItem, Error> {
        let current = self
            .state
            .read(|s| s.find(id).map(|item| item.is_favorite))
            .ok_or_else(|| Error::not_found(format!("wardrobe item {}", id)))?;
        self.update(id, WardrobeItemUpdate::favorite(!current)).await
    }

    /// Count one more wear of a loaded item, as of now
    pub async fn mark_worn(&self, id: &str) -> Result<WardrobeItem, Error> {
        let times_worn = self
            .state
            .read(|s| s.find(id).map(|item| item.times_worn))
            .ok_or_else(|| Error::not_found(format!("wardrobe item {}", id)))?;
        let changes = WardrobeItemUpdate {
            times_worn: Some(times_worn.saturating_add(1)),
            last_worn_at: Some(Utc::now()),
            ..WardrobeItemUpdate::default()
        };
        self.update(id, changes).await
    }
}
