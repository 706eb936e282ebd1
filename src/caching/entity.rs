//! # Entities
//!
//! What a cache store needs to know about the records it holds: a stable id
//! and how to merge a partial update into an existing record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record that can live in a list cache
pub trait Entity: Clone + Send + Sync + 'static {
    /// Partial update applied by `update_entity`
    type Patch: Send + Sync;

    /// Name of the array in the backend's list payload (`data.<COLLECTION>`)
    const COLLECTION: &'static str;

    /// Stable identifier
    fn id(&self) -> &str;

    /// Shallow merge: fields present in `patch` replace the current ones
    fn apply_patch(&mut self, patch: &Self::Patch);
}

/// Untyped record: an id plus arbitrary JSON fields.
///
/// The patch is a JSON object whose members overwrite the record's members
/// one level deep. An `id` member in the patch is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with<K: Into<String>, V: Into<Value>>(mut self, name: K, value: V) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl Entity for Record {
    type Patch = Map<String, Value>;
    const COLLECTION: &'static str = "records";

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: &Self::Patch) {
        for (name, value) in patch {
            if name == "id" {
                continue;
            }
            self.fields.insert(name.clone(), value.clone());
        }
    }
}

// Copies every `Some` field of a patch onto the target. Nullable fields are
// patched with `Option<Option<_>>`, so `Some(None)` clears them.
macro_rules! merge_fields {
    ($target:expr, $patch:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = &$patch.$field {
                $target.$field = value.clone().into();
            }
        )*
    };
}

/// Lifecycle of a scrap pickup order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

/// Scrap pickup order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub scrap_type: Option<String>,
    #[serde(default)]
    pub pickup_address: Option<String>,
    #[serde(default)]
    pub collector_id: Option<String>,
    #[serde(default)]
    pub estimated_amount: Option<f64>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    pub customer_name: Option<String>,
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub scrap_type: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub pickup_address: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub collector_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub estimated_amount: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub scheduled_at: Option<Option<DateTime<Utc>>>,
}

impl Entity for Order {
    type Patch = OrderPatch;
    const COLLECTION: &'static str = "orders";

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: &OrderPatch) {
        merge_fields!(
            self,
            patch,
            [customer_name, status, scrap_type, pickup_address, collector_id, estimated_amount, scheduled_at]
        );
    }
}

/// Sales lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub status: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub city_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub source: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub city_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub notes: Option<Option<String>>,
}

impl Entity for Lead {
    type Patch = LeadPatch;
    const COLLECTION: &'static str = "leads";

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: &LeadPatch) {
        merge_fields!(self, patch, [name, phone, status, source, city_id, notes]);
    }
}

/// Registered customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub organization_id: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl Entity for Customer {
    type Patch = CustomerPatch;
    const COLLECTION: &'static str = "customers";

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: &CustomerPatch) {
        merge_fields!(self, patch, [name, phone, email, address, organization_id, is_active]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order() -> Order {
        Order {
            id: "o-1".to_string(),
            customer_name: "Asha".to_string(),
            status: OrderStatus::Pending,
            scrap_type: Some("metal".to_string()),
            pickup_address: None,
            collector_id: None,
            estimated_amount: Some(120.0),
            scheduled_at: None,
        }
    }

    #[test]
    fn test_order_patch_only_touches_set_fields() {
        let mut order = order();
        order.apply_patch(&OrderPatch {
            status: Some(OrderStatus::Assigned),
            collector_id: Some(Some("c-7".to_string())),
            ..Default::default()
        });

        assert_eq!(order.status, OrderStatus::Assigned);
        assert_eq!(order.collector_id.as_deref(), Some("c-7"));
        assert_eq!(order.customer_name, "Asha");
        assert_eq!(order.scrap_type.as_deref(), Some("metal"));
        assert_eq!(order.estimated_amount, Some(120.0));
    }

    #[test]
    fn test_order_patch_clears_nullable_fields() {
        let mut order = order();
        order.collector_id = Some("c-7".to_string());
        order.status = OrderStatus::Assigned;

        order.apply_patch(&OrderPatch {
            status: Some(OrderStatus::Pending),
            collector_id: Some(None),
            ..Default::default()
        });

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.collector_id, None);
        assert_eq!(order.scrap_type.as_deref(), Some("metal"));
    }

    #[test]
    fn test_patch_wire_format_distinguishes_null_from_absent() {
        let patch: OrderPatch = serde_json::from_value(json!({"collectorId": null, "status": "pending"})).unwrap();
        assert_eq!(patch.collector_id, Some(None));
        assert_eq!(patch.scrap_type, None);

        let mut order = order();
        order.collector_id = Some("c-7".to_string());
        order.apply_patch(&patch);
        assert_eq!(order.collector_id, None);
        assert_eq!(order.scrap_type.as_deref(), Some("metal"));

        let patch: LeadPatch = serde_json::from_value(json!({"notes": "call back"})).unwrap();
        assert_eq!(patch.notes, Some(Some("call back".to_string())));
        assert_eq!(
            serde_json::to_value(&CustomerPatch {
                email: Some(None),
                ..Default::default()
            })
            .unwrap()["email"],
            Value::Null
        );
    }

    #[test]
    fn test_customer_patch_bool() {
        let mut customer = Customer {
            id: "cu-1".to_string(),
            name: "Ravi".to_string(),
            phone: "+911234567890".to_string(),
            email: None,
            address: None,
            organization_id: None,
            is_active: true,
        };
        customer.apply_patch(&CustomerPatch {
            is_active: Some(false),
            email: Some(Some("ravi@example.com".to_string())),
            ..Default::default()
        });
        assert!(!customer.is_active);
        assert_eq!(customer.email.as_deref(), Some("ravi@example.com"));
    }

    #[test]
    fn test_record_patch_is_shallow_and_keeps_id() {
        let mut record = Record::new("a")
            .with("name", "X")
            .with("address", json!({"city": "Pune", "zip": "411001"}));

        let patch = json!({"id": "zzz", "name": "Y", "address": {"city": "Mumbai"}});
        record.apply_patch(patch.as_object().unwrap());

        assert_eq!(record.id, "a");
        assert_eq!(record.get("name"), Some(&json!("Y")));
        assert_eq!(record.get("address"), Some(&json!({"city": "Mumbai"})));
    }

    #[test]
    fn test_order_wire_format() {
        let order: Order = serde_json::from_value(json!({
            "id": "o-9",
            "customerName": "Meera",
            "status": "in_progress",
            "estimatedAmount": 99.5
        }))
        .unwrap();
        assert_eq!(order.status, OrderStatus::InProgress);
        assert_eq!(order.scrap_type, None);
    }
}
