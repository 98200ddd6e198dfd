use bacsim_core::types::{PropertyId, PropertyValue, TypedValue};

/// One property of a simulated object, as it travels through the flow
/// pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: PropertyId,
    pub payload: PropertyValue,
    /// Command priority of a write, as requested. Commandable properties
    /// accept 1..=16.
    pub priority: Option<u32>,
}

impl Property {
    pub fn new(id: PropertyId, value: impl Into<TypedValue>) -> Self {
        Self {
            id,
            payload: PropertyValue::Value(value.into()),
            priority: None,
        }
    }

    pub fn list(id: PropertyId, values: Vec<TypedValue>) -> Self {
        Self {
            id,
            payload: PropertyValue::List(values),
            priority: None,
        }
    }

    pub fn null(id: PropertyId) -> Self {
        Self::new(id, TypedValue::Null)
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// The scalar payload, or `None` for list payloads.
    pub fn value(&self) -> Option<&TypedValue> {
        self.payload.value()
    }
}

/// The two event streams of a property store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    /// A requested value that handlers may transform before committing.
    Set,
    /// A committed value, already visible in the store.
    Update,
}
