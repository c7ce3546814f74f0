use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Kind of point of sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PosType {
    Cafe,
    VendingMachine,
    Bakery,
    Unknown,
}

/// Campus a POS belongs to, inferred from its postal code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampusType {
    Altstadt,
    Bergheim,
    Inf,
    Unknown,
}

static POS_TYPE_BY_TAG: Lazy<HashMap<&'static str, PosType>> = Lazy::new(|| {
    HashMap::from([
        ("cafe", PosType::Cafe),
        ("vending_machine", PosType::VendingMachine),
        ("bakery", PosType::Bakery),
    ])
});

static CAMPUS_BY_POSTCODE: Lazy<HashMap<&'static str, CampusType>> = Lazy::new(|| {
    HashMap::from([
        ("69117", CampusType::Altstadt),
        ("69115", CampusType::Bergheim),
        ("69120", CampusType::Inf),
    ])
});

impl PosType {
    /// Exact-match lookup of an OSM `amenity`/`shop` value.
    pub fn from_tag(value: &str) -> Self {
        POS_TYPE_BY_TAG
            .get(value)
            .copied()
            .unwrap_or(PosType::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PosType::Cafe => "CAFE",
            PosType::VendingMachine => "VENDING_MACHINE",
            PosType::Bakery => "BAKERY",
            PosType::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CAFE" => Some(PosType::Cafe),
            "VENDING_MACHINE" => Some(PosType::VendingMachine),
            "BAKERY" => Some(PosType::Bakery),
            "UNKNOWN" => Some(PosType::Unknown),
            _ => None,
        }
    }
}

impl CampusType {
    /// Exact-match lookup of a raw postcode string. Numerically valid but
    /// unmapped codes stay `Unknown`.
    pub fn from_postcode(postcode: &str) -> Self {
        CAMPUS_BY_POSTCODE
            .get(postcode)
            .copied()
            .unwrap_or(CampusType::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CampusType::Altstadt => "ALTSTADT",
            CampusType::Bergheim => "BERGHEIM",
            CampusType::Inf => "INF",
            CampusType::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ALTSTADT" => Some(CampusType::Altstadt),
            "BERGHEIM" => Some(CampusType::Bergheim),
            "INF" => Some(CampusType::Inf),
            "UNKNOWN" => Some(CampusType::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for PosType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CampusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point of sale in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pos {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub pos_type: PosType,
    pub campus: CampusType,
    pub street: String,
    pub house_number: String,
    pub postal_code: i32,
    pub city: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Arguments for building a POS that has not been persisted yet
#[derive(Debug, Clone)]
pub struct PosArgs {
    pub name: String,
    pub description: String,
    pub pos_type: PosType,
    pub campus: CampusType,
    pub street: String,
    pub house_number: String,
    pub postal_code: i32,
    pub city: String,
}

impl Pos {
    pub fn new(args: PosArgs) -> Self {
        Self {
            id: None,
            name: args.name,
            description: args.description,
            pos_type: args.pos_type,
            campus: args.campus,
            street: args.street,
            house_number: args.house_number,
            postal_code: args.postal_code,
            city: args.city,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pos_type_lookup_is_exact() {
        assert_eq!(PosType::from_tag("cafe"), PosType::Cafe);
        assert_eq!(PosType::from_tag("vending_machine"), PosType::VendingMachine);
        assert_eq!(PosType::from_tag("bakery"), PosType::Bakery);
        assert_eq!(PosType::from_tag("Cafe"), PosType::Unknown);
        assert_eq!(PosType::from_tag("cafe "), PosType::Unknown);
        assert_eq!(PosType::from_tag("Unknown"), PosType::Unknown);
    }

    #[test]
    fn campus_lookup_ignores_unmapped_numeric_codes() {
        assert_eq!(CampusType::from_postcode("69117"), CampusType::Altstadt);
        assert_eq!(CampusType::from_postcode("69115"), CampusType::Bergheim);
        assert_eq!(CampusType::from_postcode("69120"), CampusType::Inf);
        assert_eq!(CampusType::from_postcode("69118"), CampusType::Unknown);
        assert_eq!(CampusType::from_postcode("0"), CampusType::Unknown);
    }

    #[test]
    fn enum_names_round_trip_through_storage_form() {
        for t in [PosType::Cafe, PosType::VendingMachine, PosType::Bakery, PosType::Unknown] {
            assert_eq!(PosType::parse(t.as_str()), Some(t));
        }
        for c in [CampusType::Altstadt, CampusType::Bergheim, CampusType::Inf, CampusType::Unknown] {
            assert_eq!(CampusType::parse(c.as_str()), Some(c));
        }
    }

    #[test]
    fn pos_json_uses_camel_case_and_type_key() {
        let json = serde_json::json!({
            "name": "Cafe Botanik",
            "description": "Near the botanical garden",
            "type": "CAFE",
            "campus": "INF",
            "street": "Im Neuenheimer Feld",
            "houseNumber": "304",
            "postalCode": 69120,
            "city": "Heidelberg"
        });
        let pos: Pos = serde_json::from_value(json).unwrap();
        assert_eq!(pos.id, None);
        assert_eq!(pos.pos_type, PosType::Cafe);
        assert_eq!(pos.campus, CampusType::Inf);
        assert_eq!(pos.house_number, "304");
        assert_eq!(pos.postal_code, 69120);
    }
}
