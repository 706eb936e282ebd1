//! # List Query Parameters
//!
//! The parameters a list view sends to the backend. A `ListQuery` is also
//! the usual input for key derivation, so two views showing the same
//! filters, sort and page share one cache entry.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::key::{CacheKey, KeyDeriver};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::Desc
    }
}

/// Query for one page of a paginated collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,

    /// Entity specific filters (`organizationId`, `cityId`,
    /// `vehicleTypeId`, `location`, ...)
    #[serde(flatten)]
    pub filters: Map<String, Value>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the search text; blank input clears it
    pub fn search<S: Into<String>>(mut self, search: S) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() { None } else { Some(search) };
        self
    }

    pub fn status<S: Into<String>>(mut self, status: S) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn sort<S: Into<String>>(mut self, field: S, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = Some(order);
        self
    }

    /// Add an entity specific filter. A `null` value removes the filter.
    pub fn filter<K: Into<String>, V: Into<Value>>(mut self, name: K, value: V) -> Self {
        let name = name.into();
        match value.into() {
            Value::Null => {
                self.filters.remove(&name);
            }
            value => {
                self.filters.insert(name, value);
            }
        }
        self
    }

    /// Parameter object as sent to the backend
    pub fn to_params(&self) -> Value {
        let mut params = self.filters.clone();
        let mut put = |name: &str, value: Option<Value>| {
            if let Some(value) = value {
                params.insert(name.to_string(), value);
            }
        };

        put("page", self.page.map(Value::from));
        put("limit", self.limit.map(Value::from));
        put("search", self.search.clone().map(Value::from));
        put("status", self.status.clone().map(Value::from));
        put("sortBy", self.sort_by.clone().map(Value::from));
        put(
            "sortOrder",
            self.sort_order.map(|order| {
                Value::from(match order {
                    SortOrder::Asc => "asc",
                    SortOrder::Desc => "desc",
                })
            }),
        );

        Value::Object(params)
    }

    /// Un-namespaced key for this query
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::from_params(&self.to_params())
    }

    /// Namespaced, length bounded key for this query
    pub fn cache_key_with(&self, deriver: &KeyDeriver) -> CacheKey {
        deriver.derive(&self.to_params())
    }
}
