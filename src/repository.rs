//! Data access for the wardrobe table

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use serde_json::Value;

use outfit_postgrest::{quote_value, PostgrestClient, SortOrder};

use crate::error::Error;
use crate::models::{
    NewWardrobeItem, SortDirection, WardrobeFilters, WardrobeItem, WardrobeItemUpdate,
    WardrobeSortOptions,
};
use crate::tables::TableFactory;

/// The signed-in user every statement is scoped to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserScope {
    pub user_id: String,
    /// Bearer token for row level security; the anon key is used without one
    pub access_token: Option<String>,
}

impl UserScope {
    pub fn new(user_id: &str, access_token: Option<&str>) -> Self {
        Self {
            user_id: user_id.to_string(),
            access_token: access_token.map(str::to_string),
        }
    }
}

/// Remote wardrobe rows.
///
/// Every statement is limited to the rows of `scope.user_id`; statements on
/// one item are additionally limited by its id.
#[async_trait]
pub trait WardrobeRepository: Send + Sync {
    async fn list(
        &self,
        scope: &UserScope,
        filters: &WardrobeFilters,
        sort: &WardrobeSortOptions,
    ) -> Result<Vec<WardrobeItem>, Error>;

    /// `Ok(None)` when no row of this user has the id
    async fn get(&self, scope: &UserScope, id: &str) -> Result<Option<WardrobeItem>, Error>;

    async fn insert(&self, scope: &UserScope, item: &NewWardrobeItem)
        -> Result<WardrobeItem, Error>;

    /// Fails with [`Error::NotFound`] when no row of this user matched
    async fn update(
        &self,
        scope: &UserScope,
        id: &str,
        changes: &WardrobeItemUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<WardrobeItem, Error>;

    /// Fails with [`Error::NotFound`] when no row of this user matched
    async fn delete(&self, scope: &UserScope, id: &str) -> Result<(), Error>;
}

/// [`WardrobeRepository`] over the hosted table API
#[derive(Debug, Clone)]
pub struct PostgrestWardrobeRepository {
    tables: TableFactory,
    table: String,
}

impl PostgrestWardrobeRepository {
    pub fn new(tables: TableFactory, table: &str) -> Self {
        Self {
            tables,
            table: table.to_string(),
        }
    }

    fn table(&self, scope: &UserScope) -> Result<PostgrestClient, Error> {
        Ok(self
            .tables
            .table(&self.table, scope.access_token.as_deref())?)
    }

    fn query(&self, scope: &UserScope) -> Result<PostgrestClient, Error> {
        Ok(self.table(scope)?.eq("user_id", &scope.user_id))
    }

    fn item_query(&self, scope: &UserScope, id: &str) -> Result<PostgrestClient, Error> {
        Ok(self.query(scope)?.eq("id", id))
    }
}

/// Apply the wardrobe filters as table predicates
pub fn apply_filters(mut query: PostgrestClient, filters: &WardrobeFilters) -> PostgrestClient {
    if let Some(category) = filters.category {
        query = query.eq("category", category.as_str());
    }
    if let Some(level) = filters.warmth_level {
        query = query.eq("warmth_level", level.as_str());
    }
    if let Some(resistance) = filters.weather_resistance {
        query = query.eq("weather_resistance", resistance.as_str());
    }
    if let Some(is_favorite) = filters.is_favorite {
        query = query.eq("is_favorite", if is_favorite { "true" } else { "false" });
    }
    if let Some(color) = &filters.color {
        let quoted = quote_value(color);
        query = query.or(&format!(
            "primary_color.eq.{},secondary_color.eq.{}",
            quoted, quoted
        ));
    }
    if let Some(term) = filters.search_term() {
        query = query.ilike("name", &format!("*{}*", term));
    }
    query
}

fn sort_order(sort: &WardrobeSortOptions) -> SortOrder {
    match sort.order {
        SortDirection::Asc => SortOrder::Ascending,
        SortDirection::Desc => SortOrder::Descending,
    }
}

#[async_trait]
impl WardrobeRepository for PostgrestWardrobeRepository {
    async fn list(
        &self,
        scope: &UserScope,
        filters: &WardrobeFilters,
        sort: &WardrobeSortOptions,
    ) -> Result<Vec<WardrobeItem>, Error> {
        let query = apply_filters(self.query(scope)?.select("*"), filters)
            .order(sort.sort_by.column(), sort_order(sort));

        let rows: Vec<Value> = query.execute().await?;
        debug!("[wardrobe] fetched {} rows", rows.len());
        Ok(WardrobeItem::decode_rows(Value::Array(rows))?)
    }

    async fn get(&self, scope: &UserScope, id: &str) -> Result<Option<WardrobeItem>, Error> {
        let rows: Vec<Value> = self.item_query(scope, id)?.select("*").limit(1).execute().await?;
        Ok(WardrobeItem::decode_single(Value::Array(rows))?)
    }

    async fn insert(
        &self,
        scope: &UserScope,
        item: &NewWardrobeItem,
    ) -> Result<WardrobeItem, Error> {
        let mut row = serde_json::to_value(item).map_err(Error::general)?;
        if let Value::Object(fields) = &mut row {
            fields.insert("user_id".to_string(), Value::String(scope.user_id.clone()));
        }

        let body = self.table(scope)?.insert(&row).await?;
        WardrobeItem::decode_single(body)?
            .ok_or_else(|| Error::general("Insert returned no row"))
    }

    async fn update(
        &self,
        scope: &UserScope,
        id: &str,
        changes: &WardrobeItemUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<WardrobeItem, Error> {
        let mut row = serde_json::to_value(changes).map_err(Error::general)?;
        if let Value::Object(fields) = &mut row {
            fields.insert("updated_at".to_string(), Value::String(updated_at.to_rfc3339()));
        }

        let body = self.item_query(scope, id)?.update(&row).await?;
        WardrobeItem::decode_single(body)?
            .ok_or_else(|| Error::not_found(format!("wardrobe item {}", id)))
    }

    async fn delete(&self, scope: &UserScope, id: &str) -> Result<(), Error> {
        let body = self.item_query(scope, id)?.delete().await?;
        match body {
            Value::Array(rows) if rows.is_empty() => {
                Err(Error::not_found(format!("wardrobe item {}", id)))
            }
            _ => Ok(()),
        }
    }
}
