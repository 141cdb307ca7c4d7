#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use tracing::warn;

use crate::error::ClientError;
use crate::model::Resource;
use crate::net::gateway::ApiClient;

/// Client-held cache of one entity collection, fetched from the server.
#[derive(Clone, Debug)]
pub struct ResourceStore<T> {
    pub items: Vec<T>,
    pub loading: bool,
    /// Set once the first successful fetch has landed.
    pub loaded: bool,
    /// Message of the most recent failed fetch, cleared on success.
    pub error: Option<String>,
}

impl<T> Default for ResourceStore<T> {
    fn default() -> Self {
        Self { items: Vec::new(), loading: false, loaded: false, error: None }
    }
}

impl<T: Resource> ResourceStore<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding `items`, as if fetched.
    #[must_use]
    pub fn with_items(items: Vec<T>) -> Self {
        Self { items, loading: false, loaded: true, error: None }
    }

    /// Replace the cached items with the server's current collection.
    ///
    /// On failure the previous items stay in place and `error` is set.
    ///
    /// # Errors
    ///
    /// Returns the gateway error (already notified) when the fetch fails.
    pub async fn refresh(&mut self, api: &ApiClient) -> Result<(), ClientError> {
        self.loading = true;
        let result = api.get::<Vec<T>>(&T::collection_path()).await;
        self.loading = false;

        match result {
            Ok(items) => {
                self.items = items;
                self.loaded = true;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                warn!(collection = T::COLLECTION, error = %e, "store refresh failed");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch only when nothing has been loaded yet.
    ///
    /// # Errors
    ///
    /// Returns the gateway error when the initial fetch fails.
    pub async fn ensure_loaded(&mut self, api: &ApiClient) -> Result<(), ClientError> {
        if self.loaded {
            return Ok(());
        }
        self.refresh(api).await
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    /// Insert `item`, replacing any entry with the same id in place.
    pub fn upsert(&mut self, item: T) {
        match self.items.iter().position(|existing| existing.id() == item.id()) {
            Some(index) => self.items[index] = item,
            None => self.items.push(item),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    /// Items whose search fields contain `query`, ignoring case.
    /// A blank query returns everything.
    #[must_use]
    pub fn filter(&self, query: &str) -> Vec<&T> {
        self.items
            .iter()
            .filter(|item| matches_query(&item.search_fields(), query))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Case-insensitive substring match of `query` against any of `fields`.
#[must_use]
pub fn matches_query(fields: &[&str], query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields.iter().any(|field| field.to_lowercase().contains(&needle))
}
