use super::ValueRule;
use crate::error::StoreError;
use crate::property::{FlowKind, Property};
use crate::store::{FlowHandler, PropertyStore};
use bacsim_core::types::{PropertyId, PropertyValue};
use std::sync::Arc;

/// Commits writes to a non-commandable property.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CommitMiddleware {
    rule: Option<ValueRule>,
    out_of_service_only: bool,
}

impl CommitMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: ValueRule) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Only accept writes while `outOfService` is true, as for the
    /// `presentValue` of an input.
    pub fn out_of_service_only(mut self) -> Self {
        self.out_of_service_only = true;
        self
    }

    pub fn attach(self, store: &mut PropertyStore, id: PropertyId) {
        store.on(FlowKind::Set, id, Arc::new(self));
    }
}

impl FlowHandler for CommitMiddleware {
    fn handle(&self, store: &mut PropertyStore, mut property: Property) -> Result<(), StoreError> {
        if self.out_of_service_only && store.value(PropertyId::OutOfService).as_bool() != Some(true)
        {
            return Err(StoreError::WriteAccessDenied(property.id));
        }
        if let Some(rule) = &self.rule {
            match &property.payload {
                PropertyValue::Value(value) => rule.check(value)?,
                PropertyValue::List(_) => return Err(StoreError::InvalidDataType),
            }
        }
        property.priority = None;
        store.update(property, true)
    }
}

#[cfg(test)]
mod tests {
    use super::CommitMiddleware;
    use crate::error::StoreError;
    use crate::middleware::ValueRule;
    use crate::property::Property;
    use crate::store::PropertyStore;
    use bacsim_core::types::{ObjectId, ObjectType, PropertyId, TypedValue};

    #[test]
    fn input_present_value_needs_out_of_service() {
        let mut store = PropertyStore::new(ObjectId::new(ObjectType::AnalogInput, 1));
        CommitMiddleware::new()
            .with_rule(ValueRule::Real {
                min: None,
                max: None,
            })
            .out_of_service_only()
            .attach(&mut store, PropertyId::PresentValue);
        CommitMiddleware::new()
            .with_rule(ValueRule::Boolean)
            .attach(&mut store, PropertyId::OutOfService);

        assert_eq!(
            store.set(Property::new(PropertyId::PresentValue, 1.0f32)),
            Err(StoreError::WriteAccessDenied(PropertyId::PresentValue))
        );
        store
            .set(Property::new(PropertyId::OutOfService, true))
            .unwrap();
        store
            .set(Property::new(PropertyId::PresentValue, 1.0f32).with_priority(3))
            .unwrap();
        assert_eq!(store.value(PropertyId::PresentValue), TypedValue::Real(1.0));
    }

    #[test]
    fn rule_violations_are_not_committed() {
        let mut store = PropertyStore::new(ObjectId::new(ObjectType::AnalogInput, 1));
        CommitMiddleware::new()
            .with_rule(ValueRule::Boolean)
            .attach(&mut store, PropertyId::OutOfService);
        assert_eq!(
            store.set(Property::new(PropertyId::OutOfService, TypedValue::UnsignedInt(1))),
            Err(StoreError::InvalidDataType)
        );
        assert!(!store.contains(PropertyId::OutOfService));
    }
}
