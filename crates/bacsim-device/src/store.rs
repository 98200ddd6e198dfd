//! Per-object property storage and the `Set`/`Update` flow pipeline.
//!
//! A [`PropertyStore`] never commits a [`FlowKind::Set`] event itself. The
//! handler registered for `(Set, property)` decides what becomes visible,
//! usually by calling [`PropertyStore::update`], possibly after rewriting
//! the value or setting other properties first. `Update` handlers observe
//! values that are already committed.
//!
//! Events raised while a handler runs are queued and processed after it
//! returns, so every object sees its events strictly in publish order.

use crate::error::StoreError;
use crate::property::{FlowKind, Property};
use bacsim_core::types::{ObjectId, PropertyId, PropertyValue, TypedValue};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Reacts to one `(FlowKind, PropertyId)` event stream of a store.
pub trait FlowHandler: Send + Sync {
    fn handle(&self, store: &mut PropertyStore, property: Property) -> Result<(), StoreError>;
}

impl<F> FlowHandler for F
where
    F: Fn(&mut PropertyStore, Property) -> Result<(), StoreError> + Send + Sync,
{
    fn handle(&self, store: &mut PropertyStore, property: Property) -> Result<(), StoreError> {
        self(store, property)
    }
}

#[derive(Debug)]
struct FlowEvent {
    kind: FlowKind,
    property: Property,
}

pub struct PropertyStore {
    object_id: ObjectId,
    properties: HashMap<PropertyId, PropertyValue>,
    handlers: HashMap<(FlowKind, PropertyId), Arc<dyn FlowHandler>>,
    queue: VecDeque<FlowEvent>,
    draining: bool,
    cov: watch::Sender<u64>,
}

impl PropertyStore {
    pub fn new(object_id: ObjectId) -> Self {
        let (cov, _) = watch::channel(0);
        Self {
            object_id,
            properties: HashMap::new(),
            handlers: HashMap::new(),
            queue: VecDeque::new(),
            draining: false,
            cov,
        }
    }

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// Registers `handler` for one event stream. A later registration for
    /// the same key replaces the earlier one.
    pub fn on(&mut self, kind: FlowKind, id: PropertyId, handler: Arc<dyn FlowHandler>) {
        if self.handlers.insert((kind, id), handler).is_some() {
            log::debug!("{}: replaced {kind:?} handler for {id:?}", self.object_id);
        }
    }

    pub fn has_handler(&self, kind: FlowKind, id: PropertyId) -> bool {
        self.handlers.contains_key(&(kind, id))
    }

    /// An owned snapshot of a property. Unset properties read as Null.
    pub fn get(&self, id: PropertyId) -> Property {
        Property {
            id,
            payload: self.properties.get(&id).cloned().unwrap_or_default(),
            priority: None,
        }
    }

    /// The scalar value of a property, or Null when it is unset or a list.
    pub fn value(&self, id: PropertyId) -> TypedValue {
        self.properties
            .get(&id)
            .and_then(PropertyValue::value)
            .cloned()
            .unwrap_or(TypedValue::Null)
    }

    /// Reads a property, or one element of an array property. Index 0 is
    /// the element count; elements are numbered from 1.
    pub fn read_element(
        &self,
        id: PropertyId,
        index: Option<u32>,
    ) -> Result<PropertyValue, StoreError> {
        let payload = self.get(id).payload;
        let Some(index) = index else {
            return Ok(payload);
        };
        let PropertyValue::List(values) = payload else {
            return Err(StoreError::PropertyIsNotAnArray(id));
        };
        if index == 0 {
            return Ok(TypedValue::UnsignedInt(values.len() as u32).into());
        }
        values
            .into_iter()
            .nth(index as usize - 1)
            .map(PropertyValue::Value)
            .ok_or(StoreError::InvalidArrayIndex(index))
    }

    pub fn contains(&self, id: PropertyId) -> bool {
        self.properties.contains_key(&id)
    }

    /// Identifiers of every property that holds a value, in ascending order.
    pub fn property_ids(&self) -> Vec<PropertyId> {
        let mut ids: Vec<_> = self.properties.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Publishes a requested value on the `Set` stream.
    ///
    /// Fails with [`StoreError::WriteAccessDenied`] when no handler accepts
    /// writes to the property, or with whatever the handler chain rejects.
    pub fn set(&mut self, property: Property) -> Result<(), StoreError> {
        if !self.has_handler(FlowKind::Set, property.id) {
            return Err(StoreError::WriteAccessDenied(property.id));
        }
        self.queue.push_back(FlowEvent {
            kind: FlowKind::Set,
            property,
        });
        self.drain()
    }

    /// Commits a value and, when `emit` is set, publishes it on the
    /// `Update` stream.
    pub fn update(&mut self, property: Property, emit: bool) -> Result<(), StoreError> {
        self.properties.insert(property.id, property.payload.clone());
        if !emit {
            return Ok(());
        }
        self.queue.push_back(FlowEvent {
            kind: FlowKind::Update,
            property,
        });
        self.drain()
    }

    /// Signals COV observers. The tick carries no payload; observers read
    /// the properties they report.
    pub fn dispatch(&self) {
        self.cov.send_modify(|tick| *tick = tick.wrapping_add(1));
    }

    /// A receiver that changes on every [`dispatch`](Self::dispatch).
    pub fn watch_cov(&self) -> watch::Receiver<u64> {
        self.cov.subscribe()
    }

    fn drain(&mut self) -> Result<(), StoreError> {
        if self.draining {
            return Ok(());
        }
        self.draining = true;
        while let Some(event) = self.queue.pop_front() {
            let key = (event.kind, event.property.id);
            let Some(handler) = self.handlers.get(&key).cloned() else {
                continue;
            };
            if let Err(err) = handler.handle(self, event.property) {
                self.queue.clear();
                self.draining = false;
                return Err(err);
            }
        }
        self.draining = false;
        Ok(())
    }
}

impl fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyStore")
            .field("object_id", &self.object_id)
            .field("properties", &self.properties)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Commits every `Set` unchanged.
pub fn commit_handler() -> Arc<dyn FlowHandler> {
    Arc::new(|store: &mut PropertyStore, property: Property| store.update(property, true))
}
