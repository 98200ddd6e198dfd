//! Derives `statusFlags` from `eventState`, `reliability` and
//! `outOfService`.

use crate::error::StoreError;
use crate::property::{FlowKind, Property};
use crate::store::{FlowHandler, PropertyStore};
use bacsim_core::types::{EventState, PropertyId, Reliability, StatusFlags, TypedValue};
use std::sync::Arc;

const INPUTS: [PropertyId; 3] = [
    PropertyId::EventState,
    PropertyId::Reliability,
    PropertyId::OutOfService,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFlagsMiddleware;

impl StatusFlagsMiddleware {
    /// Registers the `Update` handlers for every input and stores the
    /// initial flags.
    pub fn attach(self, store: &mut PropertyStore) -> Result<(), StoreError> {
        let handler: Arc<dyn FlowHandler> = Arc::new(self);
        for id in INPUTS {
            store.on(FlowKind::Update, id, handler.clone());
        }
        store.update(
            Property::new(PropertyId::StatusFlags, Self::derive(store)),
            false,
        )
    }

    /// The flags implied by the store's current inputs.
    pub fn derive(store: &PropertyStore) -> StatusFlags {
        let in_alarm = match store.value(PropertyId::EventState) {
            TypedValue::Enumerated(v) => EventState::from_u32(v) != EventState::Normal,
            _ => false,
        };
        let fault = match store.value(PropertyId::Reliability) {
            TypedValue::Enumerated(v) => Reliability::from_u32(v) != Reliability::NoFaultDetected,
            _ => false,
        };
        let out_of_service = store.value(PropertyId::OutOfService).as_bool() == Some(true);
        StatusFlags {
            in_alarm,
            fault,
            overridden: in_alarm || fault || out_of_service,
            out_of_service,
        }
    }
}

impl FlowHandler for StatusFlagsMiddleware {
    fn handle(&self, store: &mut PropertyStore, _: Property) -> Result<(), StoreError> {
        let derived = Self::derive(store);
        if store.value(PropertyId::StatusFlags).as_status_flags() == Some(derived) {
            return Ok(());
        }
        store.update(Property::new(PropertyId::StatusFlags, derived), true)
    }
}
