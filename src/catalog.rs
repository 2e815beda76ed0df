use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use log::info;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{Store, StoreError};

/// A supported device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    pub model: String,
    /// Device family, e.g. "Hair Dryer".
    pub core_device: String,
    pub brand_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Search and filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    CoreDevice,
    BrandName,
}

impl Field {
    fn of(self, device: &Device) -> &str {
        match self {
            Field::CoreDevice => &device.core_device,
            Field::BrandName => &device.brand_name,
        }
    }
}

/// Narrow the list to one device family or one brand.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    CoreDevice(String),
    Brand(String),
}

impl Filter {
    /// Values compare case-insensitively, so `brand:armani` finds "Armani".
    fn matches(&self, device: &Device) -> bool {
        let same = |v: &str, field: Field| {
            v.is_empty() || field.of(device).to_lowercase() == v.to_lowercase()
        };
        match self {
            Filter::All => true,
            Filter::CoreDevice(v) => same(v, Field::CoreDevice),
            Filter::Brand(v) => same(v, Field::BrandName),
        }
    }
}

/// Devices whose name or model contains `term` (case-insensitive) and that
/// pass `filter`. The term is matched as given, surrounding spaces included.
/// An empty term matches everything.
pub fn search<'a>(devices: &'a [Device], term: &str, filter: &Filter) -> Vec<&'a Device> {
    let matcher = RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build();

    devices
        .iter()
        .filter(|d| match &matcher {
            Ok(re) => re.is_match(&d.name) || re.is_match(&d.model),
            // Oversized terms fail to compile; match everything.
            Err(_) => true,
        })
        .filter(|d| filter.matches(d))
        .collect()
}

/// Sorted distinct values of `field` across `devices`.
pub fn unique_values(devices: &[Device], field: Field) -> Vec<String> {
    devices
        .iter()
        .map(|d| field.of(d).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ---------------------------------------------------------------------------
// Device form
// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("please fill in all required fields (missing {0})")]
    MissingField(&'static str),
}

/// Unvalidated device input, as typed into a form. Empty strings mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDraft {
    pub id: String,
    pub name: String,
    pub model: String,
    pub core_device: String,
    pub brand_name: String,
    pub image_url: String,
}

impl DeviceDraft {
    /// Validate the draft. A blank id is generated from the device family,
    /// the brand and the current time.
    pub fn into_device(self) -> Result<Device, DeviceError> {
        let required = [
            ("name", &self.name),
            ("model", &self.model),
            ("coreDevice", &self.core_device),
            ("brandName", &self.brand_name),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(DeviceError::MissingField(*field));
        }

        let id = if self.id.trim().is_empty() {
            generate_id(&self.core_device, &self.brand_name, epoch_millis())
        } else {
            self.id
        };

        Ok(Device {
            id,
            name: self.name,
            model: self.model,
            core_device: self.core_device,
            brand_name: self.brand_name,
            image_url: Some(self.image_url).filter(|u| !u.trim().is_empty()),
        })
    }
}

fn slug(text: &str) -> String {
    let whitespace = Regex::new(r"\s+").unwrap();
    whitespace.replace_all(&text.to_lowercase(), "-").into_owned()
}

fn generate_id(core_device: &str, brand_name: &str, millis: u128) -> String {
    format!("{}-{}-{}", slug(core_device), slug(brand_name), millis)
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Cascading delete
// ---------------------------------------------------------------------------

/// Remove a device and then its decision tree. These are two separate
/// store calls; if the second fails the device is already gone.
pub fn delete_device_cascade<S: Store>(store: &mut S, device_id: &str) -> Result<(), StoreError> {
    store.delete_device(device_id)?;
    store.delete_tree(device_id)?;
    info!("Deleted device {device_id} and its procedures");
    Ok(())
}
