use super::{Payload, RemoteCollection};
use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use crate::schema::RecordSchema;
use crate::values::{FieldValue, RecordId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Gateway operations, used to script failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Update,
    Remove,
    Exists,
}

#[derive(Debug, Default)]
struct State {
    records: Vec<Record>,
    failures: HashMap<Operation, VecDeque<CoreError>>,
    calls: HashMap<Operation, usize>,
}

impl State {
    fn enter(&mut self, op: Operation) -> CoreResult<()> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn position(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }
}

/// A [`RemoteCollection`] held entirely in memory.
///
/// It enforces the schema's unique key on write, the way the real backend
/// does, so check-then-act races can be reproduced. Failures can be queued
/// per operation to exercise error paths.
#[derive(Debug)]
pub struct InMemoryGateway {
    schema: RecordSchema,
    state: Mutex<State>,
}

impl InMemoryGateway {
    pub fn new(schema: RecordSchema) -> Self {
        Self {
            schema,
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_records(schema: RecordSchema, records: Vec<Record>) -> Self {
        let gateway = Self::new(schema);
        gateway.state.lock().records = records;
        gateway
    }

    /// Make the next call of `op` fail with `error`. Queued errors are used
    /// in order.
    pub fn fail_next(&self, op: Operation, error: CoreError) {
        self.state
            .lock()
            .failures
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// How many times `op` has been called, failed calls included.
    pub fn calls(&self, op: Operation) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Copy of the stored records, in order.
    pub fn snapshot(&self) -> Vec<Record> {
        self.state.lock().records.clone()
    }

    fn key_of<'a>(&self, fields: &'a crate::values::Fields) -> Option<&'a FieldValue> {
        self.schema.unique_key().and_then(|key| fields.get(key))
    }

    fn key_taken(&self, state: &State, key: &FieldValue, except: Option<&RecordId>) -> bool {
        state.records.iter().any(|r| {
            Some(r.id()) != except && self.key_of(r.fields()) == Some(key)
        })
    }
}

#[async_trait]
impl RemoteCollection for InMemoryGateway {
    fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    async fn list(&self) -> CoreResult<Vec<Record>> {
        let mut state = self.state.lock();
        state.enter(Operation::List)?;
        Ok(state.records.clone())
    }

    async fn create(&self, payload: &Payload) -> CoreResult<Record> {
        let mut state = self.state.lock();
        state.enter(Operation::Create)?;
        if let Some(key) = self.key_of(&payload.fields) {
            if self.key_taken(&state, key, None) {
                return Err(CoreError::Conflict(format!(
                    "{}: `{}` already holds {:?}",
                    self.schema.kind(),
                    self.schema.unique_key().unwrap_or_default(),
                    key.search_text().unwrap_or_default()
                )));
            }
        }
        let mut fields = payload.fields.clone();
        self.schema.normalize(&mut fields);
        let record = Record::new(RecordId::generate(), fields);
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &RecordId, payload: &Payload) -> CoreResult<Record> {
        let mut state = self.state.lock();
        state.enter(Operation::Update)?;
        let index = state
            .position(id)
            .ok_or_else(|| CoreError::NotFound(format!("{}/{id}", self.schema.kind())))?;
        if let Some(key) = self.key_of(&payload.fields) {
            if self.key_taken(&state, key, Some(id)) {
                return Err(CoreError::Conflict(format!(
                    "{}: unique key already in use",
                    self.schema.kind()
                )));
            }
        }
        let mut fields = payload.fields.clone();
        self.schema.normalize(&mut fields);
        let record = Record::new(id.clone(), fields);
        state.records[index] = record.clone();
        Ok(record)
    }

    async fn remove(&self, id: &RecordId) -> CoreResult<()> {
        let mut state = self.state.lock();
        state.enter(Operation::Remove)?;
        let index = state
            .position(id)
            .ok_or_else(|| CoreError::NotFound(format!("{}/{id}", self.schema.kind())))?;
        state.records.remove(index);
        Ok(())
    }

    async fn exists(&self, key: &str) -> CoreResult<bool> {
        let mut state = self.state.lock();
        state.enter(Operation::Exists)?;
        if self.schema.unique_key().is_none() {
            return Err(CoreError::Config(format!(
                "{}: no unique key to check",
                self.schema.kind()
            )));
        }
        Ok(self.key_taken(&state, &FieldValue::from(key), None))
    }
}
