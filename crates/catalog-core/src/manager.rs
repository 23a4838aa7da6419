use crate::cache::RecordCache;
use crate::error::{CoreError, CoreResult};
use crate::filter::filter;
use crate::gateway::{Payload, RemoteCollection};
use crate::pagination::{paginate, PageWindow};
use crate::record::Record;
use crate::schema::RecordSchema;
use crate::session::EditSession;
use crate::sku::SkuAllocator;
use crate::values::RecordId;
use std::num::NonZeroUsize;

/// One row of the visible page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Row<'a> {
    /// 1-based position in the filtered sequence, continuing across pages.
    pub serial: usize,
    pub record: &'a Record,
}

/// The visible page plus the numbers a pager needs.
#[derive(Debug, Clone, PartialEq)]
pub struct View<'a> {
    pub rows: Vec<Row<'a>>,
    pub page_index: usize,
    pub total_pages: usize,
    pub filtered_len: usize,
}

/// Search, paging and edits for one record kind.
///
/// Owns the cache for its kind and is the only thing that patches it, and
/// only after the matching gateway call succeeded. A failed list, save or
/// delete leaves the cache exactly as it was.
pub struct RecordManager<G> {
    gateway: G,
    cache: RecordCache,
    query: String,
    window: PageWindow,
    seen_generation: u64,
}

impl<G: RemoteCollection> RecordManager<G> {
    pub fn new(gateway: G, page_size: NonZeroUsize) -> Self {
        Self {
            gateway,
            cache: RecordCache::new(),
            query: String::new(),
            window: PageWindow::new(page_size),
            seen_generation: 0,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn schema(&self) -> &RecordSchema {
        self.gateway.schema()
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// Replace the cache with a fresh fetch.
    pub async fn refresh(&mut self) -> CoreResult<usize> {
        let records = self.gateway.list().await.inspect_err(|err| {
            tracing::warn!(kind = self.gateway.schema().kind(), error = %err, "refresh failed, keeping cache");
        })?;
        self.cache.hydrate(records);
        self.sync_window();
        tracing::info!(
            kind = self.gateway.schema().kind(),
            records = self.cache.len(),
            "collection loaded"
        );
        Ok(self.cache.len())
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Change the search text. Any change sends the pager back to page 1.
    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.query {
            self.query = query;
            self.window.first();
        }
    }

    pub fn page_index(&self) -> usize {
        self.window.page_index()
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.window.page_size()
    }

    pub fn set_page(&mut self, page_index: usize) {
        self.window.set_page(page_index);
        let len = self.filtered_len();
        self.window.reclamp(len);
    }

    pub fn next_page(&mut self) {
        let len = self.filtered_len();
        self.window.next(len);
    }

    pub fn prev_page(&mut self) {
        self.window.prev();
    }

    pub fn first_page(&mut self) {
        self.window.first();
    }

    pub fn last_page(&mut self) {
        let len = self.filtered_len();
        self.window.last(len);
    }

    /// Reclamp the pager if the cache changed since the last look.
    fn sync_window(&mut self) {
        let generation = self.cache.generation();
        if generation != self.seen_generation {
            self.seen_generation = generation;
            let len = self.filtered_len();
            self.window.reclamp(len);
        }
    }

    /// Every cached record matching the current query, in cache order.
    pub fn filtered(&self) -> Vec<&Record> {
        filter(self.cache.records(), &self.query, self.gateway.schema())
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered().len()
    }

    /// Derive the visible page, clamping the page index to the current
    /// filtered count first.
    pub fn view(&mut self) -> View<'_> {
        let filtered = filter(self.cache.records(), &self.query, self.gateway.schema());
        let page_index = self.window.reclamp(filtered.len());
        let page = paginate(&filtered, self.window.page_size(), page_index);
        let offset = self.window.row_offset();
        View {
            rows: page
                .items
                .iter()
                .enumerate()
                .map(|(i, &record)| Row {
                    serial: offset + i + 1,
                    record,
                })
                .collect(),
            page_index: page.page_index,
            total_pages: page.total_pages,
            filtered_len: filtered.len(),
        }
    }

    pub fn visible_rows(&mut self) -> Vec<Row<'_>> {
        self.view().rows
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.cache.get(id)
    }

    pub fn open_for_edit(&self, id: &RecordId) -> CoreResult<EditSession> {
        let record = self.cache.get(id).ok_or_else(|| {
            CoreError::NotFound(format!("{}/{id} is not cached", self.gateway.schema().kind()))
        })?;
        Ok(EditSession::open_for_edit(record.clone(), self.gateway.schema()))
    }

    /// Save `session` and apply the canonical record to the cache.
    pub async fn save(&mut self, session: &mut EditSession) -> CoreResult<Record> {
        let record = session.save(&self.gateway).await?;
        self.cache.apply_update(record.clone());
        self.sync_window();
        Ok(record)
    }

    pub async fn delete(&mut self, id: &RecordId) -> CoreResult<()> {
        self.gateway.remove(id).await.inspect_err(|err| {
            tracing::warn!(kind = self.gateway.schema().kind(), %id, error = %err, "delete failed");
        })?;
        self.cache.apply_remove(id);
        self.sync_window();
        tracing::info!(kind = self.gateway.schema().kind(), %id, "record deleted");
        Ok(())
    }

    /// Create a record. Kinds with a unique key go through the SKU check
    /// first.
    pub async fn create(&mut self, payload: &Payload) -> CoreResult<Record> {
        let schema = self.gateway.schema();
        let record = if schema.unique_key().is_some() {
            SkuAllocator::create_with_key(&self.gateway, &mut self.cache, payload).await?
        } else {
            schema.validate(&payload.fields)?;
            let record = self.gateway.create(payload).await?;
            self.cache.apply_create(record.clone());
            record
        };
        tracing::info!(kind = schema.kind(), id = %record.id(), "record created");
        self.sync_window();
        Ok(record)
    }
}
