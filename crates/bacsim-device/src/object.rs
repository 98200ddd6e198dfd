//! Builds object stores from configuration records.
//!
//! Every object is a [`PropertyStore`] seeded with its standard properties
//! and composed with the middlewares its type needs:
//!
//! | object            | `presentValue` writes            | value rule       |
//! |-------------------|----------------------------------|------------------|
//! | commandable       | [`PriorityArrayMiddleware`]      | per type         |
//! | input             | committed while out of service   | per type         |
//! | other             | committed                        | per type         |
//!
//! All of them derive `statusFlags` and tick COV observers when
//! `presentValue` or `statusFlags` change.

use crate::config::{DeviceConfig, ObjectConfig};
use crate::error::{ConfigError, DeviceError, StoreError};
use crate::middleware::{
    CommitMiddleware, PriorityArrayMiddleware, StatusFlagsMiddleware, ValueRule,
};
use crate::property::{FlowKind, Property};
use crate::store::PropertyStore;
use bacsim_core::types::{
    BinaryPv, DeviceStatus, EventState, ObjectId, ObjectType, Polarity, PropertyId, Reliability,
    Segmentation, TypedValue, MAX_APDU_LENGTH_ACCEPTED,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const PROTOCOL_VERSION: u32 = 1;
pub const PROTOCOL_REVISION: u32 = 14;

/// `units` reported when the record names none.
pub const NO_UNITS: u32 = 95;

const DEFAULT_NUMBER_OF_STATES: u32 = 3;

pub fn build_object(
    config: &ObjectConfig,
    state_texts: &BTreeMap<String, Vec<String>>,
) -> Result<PropertyStore, DeviceError> {
    let id = config.object_id();
    let object_type = config.object_type;
    let mut store = PropertyStore::new(id);

    seed_common(&mut store, id, &config.name(), &config.description)?;
    for (prop, value) in [
        (
            PropertyId::EventState,
            TypedValue::Enumerated(EventState::Normal.to_u32()),
        ),
        (
            PropertyId::Reliability,
            TypedValue::Enumerated(Reliability::NoFaultDetected.to_u32()),
        ),
        (PropertyId::OutOfService, TypedValue::Boolean(false)),
    ] {
        store.update(Property::new(prop, value), false)?;
    }

    let (rule, default) = if object_type.is_analog() {
        seed_analog(&mut store, config)?
    } else if object_type.is_binary() {
        seed_binary(&mut store, config)?
    } else if object_type.is_multi_state() {
        seed_multi_state(&mut store, config, state_texts)?
    } else {
        return Err(ConfigError::UnsupportedObjectType(object_type).into());
    };
    store.update(Property::new(PropertyId::PresentValue, default.clone()), false)?;

    if config.is_commandable() {
        store.update(Property::new(PropertyId::RelinquishDefault, default), false)?;
        PriorityArrayMiddleware::new(rule).attach(&mut store)?;
    } else if object_type.is_input() {
        CommitMiddleware::new()
            .with_rule(rule)
            .out_of_service_only()
            .attach(&mut store, PropertyId::PresentValue);
    } else {
        CommitMiddleware::new()
            .with_rule(rule)
            .attach(&mut store, PropertyId::PresentValue);
    }
    CommitMiddleware::new()
        .with_rule(ValueRule::Boolean)
        .attach(&mut store, PropertyId::OutOfService);
    StatusFlagsMiddleware.attach(&mut store)?;

    let tick = Arc::new(
        |store: &mut PropertyStore, _: Property| -> Result<(), StoreError> {
            store.dispatch();
            Ok(())
        },
    );
    store.on(FlowKind::Update, PropertyId::PresentValue, tick.clone());
    store.on(FlowKind::Update, PropertyId::StatusFlags, tick);

    log::debug!("built {id} ({})", config.name());
    Ok(store)
}

/// The device object. `object_list` should name every hosted object; the
/// device itself is listed first.
pub fn build_device(
    config: &DeviceConfig,
    object_list: &[ObjectId],
) -> Result<PropertyStore, DeviceError> {
    let id = config.device_id();
    let mut store = PropertyStore::new(id);
    seed_common(&mut store, id, &config.name(), &config.description)?;

    let scalars = [
        (
            PropertyId::SystemStatus,
            TypedValue::Enumerated(DeviceStatus::Operational as u32),
        ),
        (
            PropertyId::VendorName,
            TypedValue::string(config.vendor_name.as_str()),
        ),
        (
            PropertyId::VendorIdentifier,
            TypedValue::UnsignedInt(config.vendor_id),
        ),
        (
            PropertyId::ModelName,
            TypedValue::string(config.model_name.as_str()),
        ),
        (
            PropertyId::FirmwareRevision,
            TypedValue::string(config.firmware_revision.as_str()),
        ),
        (
            PropertyId::ApplicationSoftwareVersion,
            TypedValue::string(config.application_software_version.as_str()),
        ),
        (
            PropertyId::ProtocolVersion,
            TypedValue::UnsignedInt(PROTOCOL_VERSION),
        ),
        (
            PropertyId::ProtocolRevision,
            TypedValue::UnsignedInt(PROTOCOL_REVISION),
        ),
        (
            PropertyId::MaxApduLengthAccepted,
            TypedValue::UnsignedInt(MAX_APDU_LENGTH_ACCEPTED),
        ),
        (
            PropertyId::SegmentationSupported,
            TypedValue::Enumerated(Segmentation::NoSegmentation.to_u32()),
        ),
    ];
    for (prop, value) in scalars {
        store.update(Property::new(prop, value), false)?;
    }

    let mut list = vec![TypedValue::ObjectId(id)];
    list.extend(
        object_list
            .iter()
            .filter(|oid| **oid != id)
            .map(|oid| TypedValue::ObjectId(*oid)),
    );
    store.update(Property::list(PropertyId::ObjectList, list), false)?;
    Ok(store)
}

fn seed_common(
    store: &mut PropertyStore,
    id: ObjectId,
    name: &str,
    description: &str,
) -> Result<(), StoreError> {
    store.update(Property::new(PropertyId::ObjectIdentifier, id), false)?;
    store.update(
        Property::new(PropertyId::ObjectName, TypedValue::string(name)),
        false,
    )?;
    store.update(
        Property::new(
            PropertyId::ObjectType,
            TypedValue::Enumerated(u32::from(id.object_type().to_u16())),
        ),
        false,
    )?;
    store.update(
        Property::new(PropertyId::Description, TypedValue::string(description)),
        false,
    )
}

fn seed_analog(
    store: &mut PropertyStore,
    config: &ObjectConfig,
) -> Result<(ValueRule, TypedValue), StoreError> {
    let units = config.unit_code.unwrap_or(NO_UNITS);
    store.update(
        Property::new(PropertyId::Units, TypedValue::Enumerated(units)),
        false,
    )?;
    for (prop, value) in [
        (PropertyId::MinPresValue, config.min_present_value),
        (PropertyId::MaxPresValue, config.max_present_value),
        (PropertyId::CovIncrement, config.cov_increment),
    ] {
        if let Some(v) = value {
            store.update(Property::new(prop, v), false)?;
        }
    }
    let rule = ValueRule::Real {
        min: config.min_present_value,
        max: config.max_present_value,
    };
    let default = TypedValue::real(config.default_present_value.unwrap_or(0.0));
    Ok((rule, default))
}

fn seed_binary(
    store: &mut PropertyStore,
    config: &ObjectConfig,
) -> Result<(ValueRule, TypedValue), StoreError> {
    store.update(
        Property::new(
            PropertyId::Polarity,
            TypedValue::Enumerated(Polarity::Normal as u32),
        ),
        false,
    )?;
    let texts = [
        (PropertyId::ActiveText, config.active_text.as_deref(), "active"),
        (
            PropertyId::InactiveText,
            config.inactive_text.as_deref(),
            "inactive",
        ),
    ];
    for (prop, text, fallback) in texts {
        store.update(
            Property::new(prop, TypedValue::string(text.unwrap_or(fallback))),
            false,
        )?;
    }
    let pv = match config.default_present_value {
        Some(v) if v > 0.0 => BinaryPv::Active,
        _ => BinaryPv::Inactive,
    };
    Ok((ValueRule::Binary, TypedValue::Enumerated(pv as u32)))
}

fn seed_multi_state(
    store: &mut PropertyStore,
    config: &ObjectConfig,
    state_texts: &BTreeMap<String, Vec<String>>,
) -> Result<(ValueRule, TypedValue), DeviceError> {
    let texts: Vec<String> = match &config.state_text_reference {
        Some(reference) => state_texts
            .get(reference)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownStateText(reference.clone()))?,
        None => {
            let states = config.number_of_states.unwrap_or(DEFAULT_NUMBER_OF_STATES);
            (1..=states).map(|i| format!("State {i}")).collect()
        }
    };
    let states = texts.len() as u32;
    if states == 0 {
        return Err(StoreError::ValueOutOfRange.into());
    }
    store.update(
        Property::new(PropertyId::NumberOfStates, TypedValue::UnsignedInt(states)),
        false,
    )?;
    store.update(
        Property::list(
            PropertyId::StateText,
            texts.into_iter().map(TypedValue::CharacterString).collect(),
        ),
        false,
    )?;

    let default = config
        .default_present_value
        .map(|v| (v.max(1.0) as u32).min(states))
        .unwrap_or(1);
    Ok((
        ValueRule::MultiState { states },
        TypedValue::UnsignedInt(default),
    ))
}
