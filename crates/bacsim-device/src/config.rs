//! Device and object definitions.
//!
//! Records arrive from an external engineering export (typically an EDE
//! sheet converted to JSON). Field names follow that export, so the JSON is
//! camelCase:
//!
//! ```json
//! {
//!   "instance": 260001,
//!   "objects": [
//!     { "objectType": "analog-output", "objectInstance": 1,
//!       "objectName": "AHU1 Valve", "minPresentValue": 0, "maxPresentValue": 100,
//!       "defaultPresentValue": 20, "unitCode": 98 },
//!     { "objectType": "multi-state-value", "objectInstance": 1,
//!       "stateTextReference": "modes" }
//!   ],
//!   "stateTexts": { "modes": ["Off", "Auto", "Manual"] }
//! }
//! ```

use crate::error::ConfigError;
use bacsim_core::types::object_id::MAX_INSTANCE;
use bacsim_core::types::{ObjectId, ObjectType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

pub const DEFAULT_VENDOR_ID: u32 = 260;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    pub instance: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "DeviceConfig::vendor_id_default")]
    pub vendor_id: u32,
    #[serde(default = "DeviceConfig::vendor_name_default")]
    pub vendor_name: String,
    #[serde(default = "DeviceConfig::model_name_default")]
    pub model_name: String,
    #[serde(default = "DeviceConfig::version_default")]
    pub application_software_version: String,
    #[serde(default = "DeviceConfig::version_default")]
    pub firmware_revision: String,
    #[serde(default)]
    pub objects: Vec<ObjectConfig>,
    /// Named state-text tables referenced by multi-state objects.
    #[serde(default)]
    pub state_texts: BTreeMap<String, Vec<String>>,
}

impl DeviceConfig {
    pub fn new(instance: u32) -> Self {
        Self {
            instance,
            name: None,
            description: String::new(),
            vendor_id: Self::vendor_id_default(),
            vendor_name: Self::vendor_name_default(),
            model_name: Self::model_name_default(),
            application_software_version: Self::version_default(),
            firmware_revision: Self::version_default(),
            objects: Vec::new(),
            state_texts: BTreeMap::new(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// A device with `counts` objects of each type, numbered from 1.
    pub fn generated(instance: u32, counts: &ObjectCounts) -> Self {
        let mut config = Self::new(instance);
        for (object_type, count) in counts.iter() {
            config
                .objects
                .extend((1..=count).map(|i| ObjectConfig::new(object_type, i)));
        }
        config
    }

    pub fn device_id(&self) -> ObjectId {
        ObjectId::new(ObjectType::Device, self.instance)
    }

    pub fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("bacsim-{}", self.instance))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instance > MAX_INSTANCE {
            return Err(ConfigError::InvalidInstance(self.instance));
        }
        let mut seen = HashSet::new();
        for object in &self.objects {
            if object.object_instance > MAX_INSTANCE {
                return Err(ConfigError::InvalidInstance(object.object_instance));
            }
            let t = object.object_type;
            if !(t.is_analog() || t.is_binary() || t.is_multi_state()) {
                return Err(ConfigError::UnsupportedObjectType(t));
            }
            if !seen.insert(object.object_id()) {
                return Err(ConfigError::DuplicateObject(object.object_id()));
            }
            if let Some(reference) = &object.state_text_reference {
                if !self.state_texts.contains_key(reference) {
                    return Err(ConfigError::UnknownStateText(reference.clone()));
                }
            }
        }
        Ok(())
    }

    fn vendor_id_default() -> u32 {
        DEFAULT_VENDOR_ID
    }

    fn vendor_name_default() -> String {
        "bacsim".into()
    }

    fn model_name_default() -> String {
        "bacsim simulated device".into()
    }

    fn version_default() -> String {
        env!("CARGO_PKG_VERSION").into()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectConfig {
    pub object_type: ObjectType,
    pub object_instance: u32,
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub min_present_value: Option<f32>,
    #[serde(default)]
    pub max_present_value: Option<f32>,
    #[serde(default)]
    pub default_present_value: Option<f32>,
    #[serde(default)]
    pub unit_code: Option<u32>,
    #[serde(default)]
    pub cov_increment: Option<f32>,
    /// Key into [`DeviceConfig::state_texts`].
    #[serde(default)]
    pub state_text_reference: Option<String>,
    /// Used when no state text table is referenced.
    #[serde(default)]
    pub number_of_states: Option<u32>,
    #[serde(default)]
    pub active_text: Option<String>,
    #[serde(default)]
    pub inactive_text: Option<String>,
    /// Overrides the per-type default: outputs and values are commandable,
    /// inputs are not.
    #[serde(default)]
    pub commandable: Option<bool>,
}

impl ObjectConfig {
    pub fn new(object_type: ObjectType, object_instance: u32) -> Self {
        Self {
            object_type,
            object_instance,
            object_name: None,
            description: String::new(),
            min_present_value: None,
            max_present_value: None,
            default_present_value: None,
            unit_code: None,
            cov_increment: None,
            state_text_reference: None,
            number_of_states: None,
            active_text: None,
            inactive_text: None,
            commandable: None,
        }
    }

    pub fn object_id(&self) -> ObjectId {
        ObjectId::new(self.object_type, self.object_instance)
    }

    pub fn name(&self) -> String {
        self.object_name
            .clone()
            .unwrap_or_else(|| format!("{:?}-{}", self.object_type, self.object_instance))
    }

    pub fn is_commandable(&self) -> bool {
        self.commandable
            .unwrap_or_else(|| !self.object_type.is_input())
    }
}

/// Object counts for a generated device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectCounts {
    pub analog_inputs: u32,
    pub analog_outputs: u32,
    pub analog_values: u32,
    pub binary_inputs: u32,
    pub binary_outputs: u32,
    pub binary_values: u32,
    pub multi_state_inputs: u32,
    pub multi_state_outputs: u32,
    pub multi_state_values: u32,
}

impl ObjectCounts {
    fn iter(&self) -> impl Iterator<Item = (ObjectType, u32)> {
        [
            (ObjectType::AnalogInput, self.analog_inputs),
            (ObjectType::AnalogOutput, self.analog_outputs),
            (ObjectType::AnalogValue, self.analog_values),
            (ObjectType::BinaryInput, self.binary_inputs),
            (ObjectType::BinaryOutput, self.binary_outputs),
            (ObjectType::BinaryValue, self.binary_values),
            (ObjectType::MultiStateInput, self.multi_state_inputs),
            (ObjectType::MultiStateOutput, self.multi_state_outputs),
            (ObjectType::MultiStateValue, self.multi_state_values),
        ]
        .into_iter()
    }
}
