//! Flow handlers attached to object stores at construction time.

pub mod commit;
pub mod priority_array;
pub mod status_flags;

pub use commit::CommitMiddleware;
pub use priority_array::{PriorityArrayMiddleware, PRIORITY_LEVELS};
pub use status_flags::StatusFlagsMiddleware;

use crate::error::StoreError;
use bacsim_core::types::{BinaryPv, TypedValue};

/// What a writable value property accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRule {
    /// A real, optionally bounded by `minPresValue`/`maxPresValue`.
    Real { min: Option<f32>, max: Option<f32> },
    /// An enumerated `inactive` (0) or `active` (1).
    Binary,
    /// An unsigned state number in `1..=states`.
    MultiState { states: u32 },
    Boolean,
}

impl ValueRule {
    pub fn check(&self, value: &TypedValue) -> Result<(), StoreError> {
        match (self, value) {
            (Self::Real { min, max }, TypedValue::Real(v)) => {
                if v.is_nan() || min.is_some_and(|m| *v < m) || max.is_some_and(|m| *v > m) {
                    return Err(StoreError::ValueOutOfRange);
                }
                Ok(())
            }
            (Self::Binary, TypedValue::Enumerated(v)) => {
                if *v > BinaryPv::Active as u32 {
                    return Err(StoreError::ValueOutOfRange);
                }
                Ok(())
            }
            (Self::MultiState { states }, TypedValue::UnsignedInt(v)) => {
                if *v == 0 || v > states {
                    return Err(StoreError::ValueOutOfRange);
                }
                Ok(())
            }
            (Self::Boolean, TypedValue::Boolean(_)) => Ok(()),
            _ => Err(StoreError::InvalidDataType),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ValueRule;
    use crate::error::StoreError;
    use bacsim_core::types::TypedValue;

    #[test]
    fn real_bounds_are_inclusive() {
        let rule = ValueRule::Real {
            min: Some(0.0),
            max: Some(100.0),
        };
        assert_eq!(rule.check(&TypedValue::real(100.0)), Ok(()));
        assert_eq!(rule.check(&TypedValue::real(0.0)), Ok(()));
        assert_eq!(
            rule.check(&TypedValue::real(100.5)),
            Err(StoreError::ValueOutOfRange)
        );
        assert_eq!(
            rule.check(&TypedValue::Enumerated(1)),
            Err(StoreError::InvalidDataType)
        );
    }

    #[test]
    fn unbounded_real_accepts_anything_but_nan() {
        let rule = ValueRule::Real {
            min: None,
            max: None,
        };
        assert_eq!(rule.check(&TypedValue::real(-1e6)), Ok(()));
        assert_eq!(
            rule.check(&TypedValue::Real(f32::NAN)),
            Err(StoreError::ValueOutOfRange)
        );
    }

    #[test]
    fn binary_and_multi_state_ranges() {
        assert_eq!(ValueRule::Binary.check(&TypedValue::Enumerated(1)), Ok(()));
        assert_eq!(
            ValueRule::Binary.check(&TypedValue::Enumerated(2)),
            Err(StoreError::ValueOutOfRange)
        );
        let ms = ValueRule::MultiState { states: 3 };
        assert_eq!(ms.check(&TypedValue::UnsignedInt(3)), Ok(()));
        assert_eq!(
            ms.check(&TypedValue::UnsignedInt(0)),
            Err(StoreError::ValueOutOfRange)
        );
        assert_eq!(
            ms.check(&TypedValue::UnsignedInt(4)),
            Err(StoreError::ValueOutOfRange)
        );
        assert_eq!(
            ValueRule::Boolean.check(&TypedValue::UnsignedInt(1)),
            Err(StoreError::InvalidDataType)
        );
    }
}
