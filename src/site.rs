use std::fmt;

use serde::Deserialize;

use crate::extract::DetailFields;

pub const NO_NAME: &str = "no name";
pub const NO_ADDRESS: &str = "no address";
pub const NO_ZIPCODE: &str = "no zipcode";
pub const NO_PHONE: &str = "no phone";
pub const NO_CATEGORY: &str = "no category";
pub const NO_CITY: &str = "no city";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRecord {
    pub category: String,
    pub name: String,
    pub address: String,
    pub postal_code: String,
    pub phone: String,
}

impl SiteRecord {
    /// Absent fields get their sentinel; fields present with empty text stay empty.
    pub fn from_detail(fields: DetailFields) -> Self {
        let address = match (fields.locality, fields.region) {
            (Some(city), Some(state)) => Some(format!("{}, {}", city, state)),
            (Some(part), None) | (None, Some(part)) => Some(part),
            (None, None) => None,
        };

        Self {
            category: fields.designation.unwrap_or_default(),
            name: fields.title.unwrap_or_else(|| NO_NAME.to_string()),
            address: address.unwrap_or_else(|| NO_ADDRESS.to_string()),
            postal_code: fields.postal_code.unwrap_or_else(|| NO_ZIPCODE.to_string()),
            phone: fields.telephone.unwrap_or_else(|| NO_PHONE.to_string()),
        }
    }
}

impl fmt::Display for SiteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} {}",
            self.name, self.category, self.address, self.postal_code
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearbyRecord {
    pub category: String,
    pub name: String,
    pub address: String,
    pub city: String,
}

// One entry of `searchResults`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResult {
    #[serde(default)]
    name: Option<String>,
    // Present as `null` on some entries
    #[serde(default)]
    fields: Option<SearchFields>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchFields {
    #[serde(default)]
    group_sic_code_name: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    city: Option<String>,
}

impl From<SearchResult> for NearbyRecord {
    fn from(result: SearchResult) -> Self {
        let fields = result.fields.unwrap_or_default();

        Self {
            category: or_sentinel(fields.group_sic_code_name, NO_CATEGORY),
            name: or_sentinel(result.name, NO_NAME),
            address: or_sentinel(fields.address, NO_ADDRESS),
            city: or_sentinel(fields.city, NO_CITY),
        }
    }
}

fn or_sentinel(value: Option<String>, sentinel: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => sentinel.to_string(),
    }
}

impl fmt::Display for NearbyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}, {}",
            self.name, self.category, self.address, self.city
        )
    }
}
