//! Priority arbitration for commandable `presentValue`s.
//!
//! A write to `presentValue` at priority `p` lands in slot `p - 1` of the
//! 16-slot `priorityArray`; writing Null relinquishes the slot. The
//! effective value is the lowest-indexed non-Null slot, falling back to
//! `relinquishDefault` when every slot is vacant.

use super::ValueRule;
use crate::error::StoreError;
use crate::property::{FlowKind, Property};
use crate::store::{FlowHandler, PropertyStore};
use bacsim_core::types::{PropertyId, PropertyValue, TypedValue};
use std::sync::Arc;

pub const PRIORITY_LEVELS: usize = 16;

/// Priority used when a write names none.
pub const DEFAULT_PRIORITY: u32 = PRIORITY_LEVELS as u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityArrayMiddleware {
    rule: ValueRule,
}

impl PriorityArrayMiddleware {
    pub fn new(rule: ValueRule) -> Self {
        Self { rule }
    }

    /// Seeds an empty priority array and registers the `Set` handlers for
    /// `presentValue` and `priorityArray`.
    pub fn attach(self, store: &mut PropertyStore) -> Result<(), StoreError> {
        store.update(
            Property::list(
                PropertyId::PriorityArray,
                vec![TypedValue::Null; PRIORITY_LEVELS],
            ),
            false,
        )?;
        store.update(Property::null(PropertyId::CurrentCommandPriority), false)?;

        let handler: Arc<dyn FlowHandler> = Arc::new(self);
        store.on(FlowKind::Set, PropertyId::PresentValue, handler.clone());
        store.on(FlowKind::Set, PropertyId::PriorityArray, handler);
        Ok(())
    }

    fn command(&self, store: &mut PropertyStore, property: Property) -> Result<(), StoreError> {
        let priority = property.priority.unwrap_or(DEFAULT_PRIORITY);
        if !(1..=DEFAULT_PRIORITY).contains(&priority) {
            return Err(StoreError::InvalidPriority(priority));
        }
        let value = match property.payload {
            PropertyValue::Value(value) => value,
            PropertyValue::List(_) => return Err(StoreError::InvalidDataType),
        };
        if !value.is_null() {
            self.rule.check(&value)?;
        }

        let mut slots = slots(store)?;
        slots[priority as usize - 1] = value;
        store.set(Property::list(PropertyId::PriorityArray, slots))
    }

    fn resolve(&self, store: &mut PropertyStore, property: Property) -> Result<(), StoreError> {
        match &property.payload {
            PropertyValue::List(slots) if slots.len() == PRIORITY_LEVELS => {}
            _ => return Err(StoreError::InvalidDataType),
        }
        store.update(property, true)?;

        let slots = slots(store)?;
        let (value, level) = match slots.iter().position(|slot| !slot.is_null()) {
            Some(index) => (
                slots[index].clone(),
                TypedValue::UnsignedInt(index as u32 + 1),
            ),
            None => {
                let fallback = store.value(PropertyId::RelinquishDefault);
                if fallback.is_null() {
                    log::warn!(
                        "{}: all priorities relinquished and relinquishDefault is unset",
                        store.object_id()
                    );
                }
                (fallback, TypedValue::Null)
            }
        };

        store.update(Property::new(PropertyId::CurrentCommandPriority, level), true)?;
        store.update(Property::new(PropertyId::PresentValue, value), true)
    }
}

impl FlowHandler for PriorityArrayMiddleware {
    fn handle(&self, store: &mut PropertyStore, property: Property) -> Result<(), StoreError> {
        match property.id {
            PropertyId::PresentValue => self.command(store, property),
            PropertyId::PriorityArray => self.resolve(store, property),
            other => Err(StoreError::WriteAccessDenied(other)),
        }
    }
}

fn slots(store: &PropertyStore) -> Result<Vec<TypedValue>, StoreError> {
    match store.get(PropertyId::PriorityArray).payload {
        PropertyValue::List(slots) if slots.len() == PRIORITY_LEVELS => Ok(slots),
        _ => Err(StoreError::InvalidDataType),
    }
}

#[cfg(test)]
mod tests {
    use super::{PriorityArrayMiddleware, PRIORITY_LEVELS};
    use crate::error::StoreError;
    use crate::middleware::ValueRule;
    use crate::property::Property;
    use crate::store::PropertyStore;
    use bacsim_core::types::{ObjectId, ObjectType, PropertyId, PropertyValue, TypedValue};
    use proptest::prelude::*;

    fn analog_output(relinquish_default: f32) -> PropertyStore {
        let mut store = PropertyStore::new(ObjectId::new(ObjectType::AnalogOutput, 1));
        store
            .update(
                Property::new(PropertyId::RelinquishDefault, relinquish_default),
                false,
            )
            .unwrap();
        store
            .update(
                Property::new(PropertyId::PresentValue, relinquish_default),
                false,
            )
            .unwrap();
        PriorityArrayMiddleware::new(ValueRule::Real {
            min: Some(0.0),
            max: Some(100.0),
        })
        .attach(&mut store)
        .unwrap();
        store
    }

    fn write(store: &mut PropertyStore, value: TypedValue, priority: u32) -> Result<(), StoreError> {
        store.set(Property::new(PropertyId::PresentValue, value).with_priority(priority))
    }

    #[test]
    fn command_and_relinquish() {
        let mut store = analog_output(20.0);
        write(&mut store, TypedValue::real(75.0), 8).unwrap();
        assert_eq!(store.value(PropertyId::PresentValue), TypedValue::Real(75.0));
        assert_eq!(
            store.value(PropertyId::CurrentCommandPriority),
            TypedValue::UnsignedInt(8)
        );

        write(&mut store, TypedValue::Null, 8).unwrap();
        assert_eq!(store.value(PropertyId::PresentValue), TypedValue::Real(20.0));
        assert_eq!(
            store.value(PropertyId::CurrentCommandPriority),
            TypedValue::Null
        );
    }

    #[test]
    fn higher_priority_wins_until_relinquished() {
        let mut store = analog_output(0.0);
        write(&mut store, TypedValue::real(75.0), 8).unwrap();
        write(&mut store, TypedValue::real(50.0), 3).unwrap();
        assert_eq!(store.value(PropertyId::PresentValue), TypedValue::Real(50.0));
        write(&mut store, TypedValue::real(10.0), 12).unwrap();
        assert_eq!(store.value(PropertyId::PresentValue), TypedValue::Real(50.0));
        write(&mut store, TypedValue::Null, 3).unwrap();
        assert_eq!(store.value(PropertyId::PresentValue), TypedValue::Real(75.0));
    }

    #[test]
    fn missing_priority_uses_slot_sixteen() {
        let mut store = analog_output(0.0);
        store
            .set(Property::new(PropertyId::PresentValue, 5.0f32))
            .unwrap();
        let slots = store.get(PropertyId::PriorityArray).payload;
        assert_eq!(slots.as_list().unwrap()[15], TypedValue::Real(5.0));
        assert_eq!(
            store.value(PropertyId::CurrentCommandPriority),
            TypedValue::UnsignedInt(16)
        );
    }

    #[test]
    fn rejected_writes_leave_the_array_untouched() {
        let mut store = analog_output(0.0);
        let before = store.get(PropertyId::PriorityArray);
        assert_eq!(
            write(&mut store, TypedValue::real(1.0), 0),
            Err(StoreError::InvalidPriority(0))
        );
        assert_eq!(
            write(&mut store, TypedValue::real(1.0), 17),
            Err(StoreError::InvalidPriority(17))
        );
        assert_eq!(
            write(&mut store, TypedValue::real(101.0), 8),
            Err(StoreError::ValueOutOfRange)
        );
        assert_eq!(
            write(&mut store, TypedValue::Boolean(true), 8),
            Err(StoreError::InvalidDataType)
        );
        assert_eq!(store.get(PropertyId::PriorityArray), before);
    }

    #[test]
    fn direct_array_writes_must_be_full_arrays() {
        let mut store = analog_output(0.0);
        assert_eq!(
            store.set(Property::new(PropertyId::PriorityArray, 1.0f32)),
            Err(StoreError::InvalidDataType)
        );
    }

    #[test]
    fn unset_relinquish_default_resolves_to_null() {
        let mut store = PropertyStore::new(ObjectId::new(ObjectType::MultiStateValue, 1));
        PriorityArrayMiddleware::new(ValueRule::MultiState { states: 3 })
            .attach(&mut store)
            .unwrap();
        write(&mut store, TypedValue::UnsignedInt(2), 10).unwrap();
        write(&mut store, TypedValue::Null, 10).unwrap();
        assert_eq!(store.value(PropertyId::PresentValue), TypedValue::Null);
    }

    proptest! {
        #[test]
        fn present_value_follows_lowest_occupied_slot(
            slots in prop::collection::vec(prop::option::of(0u32..100), PRIORITY_LEVELS)
        ) {
            let mut store = analog_output(42.0);
            for (index, slot) in slots.iter().enumerate() {
                let value = match slot {
                    Some(v) => TypedValue::real(*v as f32),
                    None => TypedValue::Null,
                };
                write(&mut store, value, index as u32 + 1).unwrap();
            }

            let winner = slots.iter().position(Option::is_some);
            let expected_value = match winner {
                Some(index) => TypedValue::real(slots[index].unwrap() as f32),
                None => TypedValue::Real(42.0),
            };
            let expected_level = match winner {
                Some(index) => TypedValue::UnsignedInt(index as u32 + 1),
                None => TypedValue::Null,
            };
            prop_assert_eq!(store.value(PropertyId::PresentValue), expected_value);
            prop_assert_eq!(store.value(PropertyId::CurrentCommandPriority), expected_level);
            prop_assert!(matches!(
                store.get(PropertyId::PriorityArray).payload,
                PropertyValue::List(ref l) if l.len() == PRIORITY_LEVELS
            ));
        }
    }
}
