use crate::error::{CoreError, CoreResult};
use crate::gateway::{Attachment, Payload, RemoteCollection};
use crate::record::Record;
use crate::schema::{LineItemSpec, LineItemStatus, RecordSchema};
use crate::values::{FieldPath, FieldValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    /// An update call is in flight.
    Saving,
    Closed,
}

/// Edits to one record, tracked against the snapshot taken when it was
/// opened.
///
/// `working` is owned by the session and nobody else sees it until a save
/// succeeds. The dirty flag is recomputed after every edit by comparing the
/// whole working copy with the snapshot, so editing a field back to its
/// original value makes the session clean again.
///
/// A failed save leaves the session `Open` with the working copy and dirty
/// flag untouched, ready for a retry.
#[derive(Debug, Clone)]
pub struct EditSession {
    id_field: String,
    line_items: Option<LineItemSpec>,
    original: Record,
    working: Record,
    attachments: Vec<Attachment>,
    state: SessionState,
    dirty: bool,
}

impl EditSession {
    pub fn open_for_edit(record: Record, schema: &RecordSchema) -> Self {
        Self {
            id_field: schema.id_field().to_owned(),
            line_items: schema.line_items().cloned(),
            working: record.clone(),
            original: record,
            attachments: Vec::new(),
            state: SessionState::Open,
            dirty: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn original(&self) -> &Record {
        &self.original
    }

    pub fn working(&self) -> &Record {
        &self.working
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn set_field(&mut self, path: &FieldPath, value: impl Into<FieldValue>) -> CoreResult<()> {
        self.ensure_open()?;
        if path.root() == self.id_field {
            return Err(CoreError::InvalidField(format!(
                "`{}` is the record id and cannot be edited",
                self.id_field
            )));
        }
        self.working.set_path(path, value.into())?;
        self.recompute_dirty();
        Ok(())
    }

    /// Set the status of line item `index`.
    pub fn set_line_item_status(&mut self, index: usize, status: LineItemStatus) -> CoreResult<()> {
        let path = self.line_item_path(index)?;
        self.set_field(&path, status)
    }

    pub fn line_item_status(&self, index: usize) -> Option<LineItemStatus> {
        let path = self.line_item_path(index).ok()?;
        self.working
            .get_path(&path)
            .map(|value| LineItemStatus::parse_lenient(Some(value)))
    }

    /// Indexes of line items whose status differs from the snapshot.
    pub fn changed_line_items(&self) -> Vec<usize> {
        let Some(spec) = &self.line_items else {
            return Vec::new();
        };
        let items = |record: &Record| -> Vec<FieldValue> {
            record
                .get(&spec.field)
                .and_then(FieldValue::as_array)
                .map(<[FieldValue]>::to_vec)
                .unwrap_or_default()
        };
        let before = items(&self.original);
        let after = items(&self.working);
        (0..after.len().max(before.len()))
            .filter(|&i| {
                let status = |list: &[FieldValue]| {
                    list.get(i)
                        .and_then(FieldValue::as_object)
                        .and_then(|item| item.get(&spec.status_field))
                        .cloned()
                };
                status(&before) != status(&after)
            })
            .collect()
    }

    /// Queue a file to upload with the next save. Counts as an edit.
    pub fn attach(&mut self, attachment: Attachment) -> CoreResult<()> {
        self.ensure_open()?;
        self.attachments.push(attachment);
        self.recompute_dirty();
        Ok(())
    }

    /// The full replacement body for an update: every working field plus
    /// queued attachments.
    pub fn payload(&self) -> Payload {
        Payload {
            fields: self.working.fields().clone(),
            attachments: self.attachments.clone(),
        }
    }

    /// Submit the working copy.
    ///
    /// On success the session closes and the canonical record returned by
    /// the backend is handed back for the cache. On failure nothing about
    /// the session changes except that it is `Open` again.
    pub async fn save<G>(&mut self, gateway: &G) -> CoreResult<Record>
    where
        G: RemoteCollection + ?Sized,
    {
        self.ensure_open()?;
        if !self.dirty {
            return Err(CoreError::NotDirty);
        }
        let payload = self.payload();
        let in_flight = InFlight::begin(&mut self.state);
        match gateway.update(self.original.id(), &payload).await {
            Ok(record) => {
                tracing::info!(kind = gateway.schema().kind(), id = %record.id(), "record saved");
                in_flight.close();
                self.attachments.clear();
                self.dirty = false;
                Ok(record)
            }
            Err(err) => {
                tracing::warn!(
                    kind = gateway.schema().kind(),
                    id = %self.original.id(),
                    error = %err,
                    "save failed, edits kept"
                );
                drop(in_flight);
                Err(err)
            }
        }
    }

    /// Drop all edits and close without calling the backend.
    pub fn cancel(&mut self) {
        self.working = self.original.clone();
        self.attachments.clear();
        self.dirty = false;
        self.state = SessionState::Closed;
    }

    fn ensure_open(&self) -> CoreResult<()> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Saving | SessionState::Closed => Err(CoreError::SessionClosed),
        }
    }

    fn line_item_path(&self, index: usize) -> CoreResult<FieldPath> {
        let spec = self.line_items.as_ref().ok_or_else(|| {
            CoreError::InvalidField("this record kind has no line items".into())
        })?;
        Ok(FieldPath::line_item(&spec.field, index, &spec.status_field))
    }

    fn recompute_dirty(&mut self) {
        self.dirty = self.working != self.original || !self.attachments.is_empty();
    }
}

/// Holds the session in `Saving` while an update is awaited. Dropping it
/// without [`close`](Self::close), including when the save future itself is
/// dropped, reopens the session.
struct InFlight<'a> {
    state: &'a mut SessionState,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a mut SessionState) -> Self {
        *state = SessionState::Saving;
        Self { state }
    }

    fn close(self) {
        *self.state = SessionState::Closed;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if *self.state == SessionState::Saving {
            *self.state = SessionState::Open;
        }
    }
}
