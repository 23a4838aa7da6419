//! Candidate SKUs and the uniqueness check that guards product creation.

use crate::cache::RecordCache;
use crate::error::{CoreError, CoreResult};
use crate::gateway::{Payload, RemoteCollection};
use crate::record::Record;
use std::collections::HashMap;

const PREFIX_LEN: usize = 3;

/// Proposes SKUs from per-category counters and checks them remotely.
///
/// Counters live only as long as the allocator and start at zero, so two
/// sessions can propose the same key. The remote store decides uniqueness:
/// [`reserve`](Self::reserve) asks it before every create, and a `Conflict`
/// from the create itself is still possible and is returned to the caller.
#[derive(Debug, Default, Clone)]
pub struct SkuAllocator {
    counters: HashMap<String, u32>,
}

impl SkuAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `propose("Sarees", 4) == "SAR005"`.
    ///
    /// Categories shorter than three characters use what they have.
    pub fn propose(category: &str, local_counter: u32) -> String {
        let prefix: String = category
            .chars()
            .take(PREFIX_LEN)
            .flat_map(char::to_uppercase)
            .collect();
        format!("{prefix}{:03}", local_counter.saturating_add(1))
    }

    pub fn counter(&self, category: &str) -> u32 {
        self.counters.get(category).copied().unwrap_or(0)
    }

    /// The candidate for `category` without consuming it.
    pub fn next_for(&self, category: &str) -> String {
        Self::propose(category, self.counter(category))
    }

    /// Called whenever the selected category changes: proposes the next key
    /// and advances that category's counter.
    pub fn on_category_change(&mut self, category: &str) -> String {
        let counter = self.counters.entry(category.to_owned()).or_insert(0);
        let candidate = Self::propose(category, *counter);
        *counter = counter.saturating_add(1);
        candidate
    }

    /// Fail with `Conflict` if the remote store already holds `key`.
    pub async fn reserve<G>(gateway: &G, key: &str) -> CoreResult<()>
    where
        G: RemoteCollection + ?Sized,
    {
        if gateway.exists(key).await? {
            tracing::debug!(kind = gateway.schema().kind(), key, "key already taken");
            return Err(CoreError::Conflict(format!(
                "{}: `{key}` is already in use",
                gateway.schema().kind()
            )));
        }
        Ok(())
    }

    /// Create a record whose unique key is set in `payload`.
    ///
    /// The key is re-checked immediately before the create, whatever was
    /// proposed earlier. The cache is only touched once the create succeeds.
    pub async fn create_with_key<G>(
        gateway: &G,
        cache: &mut RecordCache,
        payload: &Payload,
    ) -> CoreResult<Record>
    where
        G: RemoteCollection + ?Sized,
    {
        let schema = gateway.schema();
        let key_field = schema.unique_key().ok_or_else(|| {
            CoreError::Config(format!("{}: no unique key to allocate", schema.kind()))
        })?;
        let key = payload
            .fields
            .get(key_field)
            .and_then(|value| value.as_str())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                CoreError::InvalidField(format!("{}: `{key_field}` must be set", schema.kind()))
            })?;
        schema.validate(&payload.fields)?;

        Self::reserve(gateway, key).await?;
        let record = gateway.create(payload).await.inspect_err(|err| {
            if matches!(err, CoreError::Conflict(_)) {
                tracing::warn!(kind = schema.kind(), key, "key taken between check and create");
            }
        })?;
        cache.apply_create(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{InMemoryGateway, Operation};
    use crate::schema::RecordSchema;
    use crate::values::{FieldValue, Fields};

    fn product(name: &str, sku: &str) -> Payload {
        Payload::new(Fields::from([
            ("name".to_string(), FieldValue::from(name)),
            ("category".to_string(), FieldValue::from("Sarees")),
            ("sku".to_string(), FieldValue::from(sku)),
        ]))
    }

    #[test]
    fn proposes_prefix_and_padded_sequence() {
        assert_eq!(SkuAllocator::propose("Sarees", 4), "SAR005");
        assert_eq!(SkuAllocator::propose("kurtis", 0), "KUR001");
        assert_eq!(SkuAllocator::propose("Ox", 41), "OX042");
        assert_eq!(SkuAllocator::propose("Lehenga", 999), "LEH1000");
        assert_eq!(SkuAllocator::propose("", 0), "001");
    }

    #[test]
    fn category_changes_advance_per_category_counters() {
        let mut alloc = SkuAllocator::new();
        assert_eq!(alloc.on_category_change("Sarees"), "SAR001");
        assert_eq!(alloc.on_category_change("Kurtis"), "KUR001");
        assert_eq!(alloc.on_category_change("Sarees"), "SAR002");
        assert_eq!(alloc.counter("Sarees"), 2);
        assert_eq!(alloc.next_for("Sarees"), "SAR003");
        assert_eq!(alloc.next_for("Dupattas"), "DUP001");
    }

    #[tokio::test]
    async fn reserve_conflicts_on_existing_key() {
        let gw = InMemoryGateway::new(RecordSchema::product());
        gw.create(&product("Banarasi", "SAR005")).await.unwrap();

        let candidate = SkuAllocator::propose("Sarees", 4);
        let err = SkuAllocator::reserve(&gw, &candidate).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        SkuAllocator::reserve(&gw, "SAR006").await.unwrap();
    }

    #[tokio::test]
    async fn conflict_blocks_creation() {
        let gw = InMemoryGateway::new(RecordSchema::product());
        gw.create(&product("Banarasi", "SAR005")).await.unwrap();
        let mut cache = RecordCache::new();

        let err = SkuAllocator::create_with_key(&gw, &mut cache, &product("Kanjivaram", "SAR005"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert_eq!(gw.calls(Operation::Create), 1);
        assert!(cache.is_empty());
    }

    /// Lets a competing session write the key right after our check.
    struct Racing {
        inner: InMemoryGateway,
        competitor: Payload,
    }

    #[async_trait::async_trait]
    impl RemoteCollection for Racing {
        fn schema(&self) -> &RecordSchema {
            self.inner.schema()
        }

        async fn list(&self) -> CoreResult<Vec<Record>> {
            self.inner.list().await
        }

        async fn create(&self, payload: &Payload) -> CoreResult<Record> {
            self.inner.create(payload).await
        }

        async fn update(&self, id: &crate::values::RecordId, payload: &Payload) -> CoreResult<Record> {
            self.inner.update(id, payload).await
        }

        async fn remove(&self, id: &crate::values::RecordId) -> CoreResult<()> {
            self.inner.remove(id).await
        }

        async fn exists(&self, key: &str) -> CoreResult<bool> {
            let taken = self.inner.exists(key).await?;
            self.inner.create(&self.competitor).await?;
            Ok(taken)
        }
    }

    #[tokio::test]
    async fn conflict_from_create_is_returned_after_a_passed_check() {
        let gw = Racing {
            inner: InMemoryGateway::new(RecordSchema::product()),
            competitor: product("Banarasi", "SAR005"),
        };
        let mut cache = RecordCache::new();

        let err = SkuAllocator::create_with_key(&gw, &mut cache, &product("Kanjivaram", "SAR005"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert!(cache.is_empty());
        assert_eq!(gw.inner.snapshot().len(), 1);
        assert_eq!(gw.inner.calls(Operation::Create), 2);
    }

    #[tokio::test]
    async fn successful_create_lands_in_cache() {
        let gw = InMemoryGateway::new(RecordSchema::product());
        let mut cache = RecordCache::new();
        let mut alloc = SkuAllocator::new();
        let sku = alloc.on_category_change("Sarees");

        let record = SkuAllocator::create_with_key(&gw, &mut cache, &product("Banarasi", &sku))
            .await
            .unwrap();
        assert_eq!(record.get("sku"), Some(&FieldValue::from("SAR001")));
        assert!(cache.contains(record.id()));
        assert_eq!(gw.calls(Operation::Exists), 1);
    }

    #[tokio::test]
    async fn missing_key_is_rejected_before_any_remote_call() {
        let gw = InMemoryGateway::new(RecordSchema::product());
        let mut cache = RecordCache::new();
        let err = SkuAllocator::create_with_key(&gw, &mut cache, &product("Banarasi", " "))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidField(_)));
        assert_eq!(gw.calls(Operation::Exists), 0);
        assert_eq!(gw.calls(Operation::Create), 0);
    }

    #[tokio::test]
    async fn kinds_without_unique_key_cannot_allocate() {
        let gw = InMemoryGateway::new(RecordSchema::customer());
        let mut cache = RecordCache::new();
        let err = SkuAllocator::create_with_key(&gw, &mut cache, &Payload::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
