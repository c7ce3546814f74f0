/// Defaults and tag keys used when turning OpenStreetMap nodes into POS records

pub const DEFAULT_OSM_API_BASE_URL: &str = "https://api.openstreetmap.org/api/0.6";

// Sentinels written into fields the upstream node does not carry
pub const NOT_AVAILABLE: &str = "N/A";
pub const UNKNOWN: &str = "Unknown";
pub const DEFAULT_HOUSE_NUMBER: &str = "0";
pub const DEFAULT_POSTCODE: &str = "0";

// OSM tag keys
pub const TAG_NAME: &str = "name";
pub const TAG_DESCRIPTION: &str = "description";
pub const TAG_STREET: &str = "addr:street";
pub const TAG_HOUSE_NUMBER: &str = "addr:housenumber";
pub const TAG_CITY: &str = "addr:city";
pub const TAG_POSTCODE: &str = "addr:postcode";
pub const TAG_AMENITY: &str = "amenity";
pub const TAG_SHOP: &str = "shop";

/// Build the lookup URL for a single node
pub fn osm_node_url(api_base_url: &str, node_id: i64) -> String {
    format!("{}/node/{}.json", api_base_url.trim_end_matches('/'), node_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_url_uses_json_endpoint() {
        assert_eq!(
            osm_node_url(DEFAULT_OSM_API_BASE_URL, 5589879349),
            "https://api.openstreetmap.org/api/0.6/node/5589879349.json"
        );
        assert_eq!(
            osm_node_url("http://localhost:8080/api/", 1),
            "http://localhost:8080/api/node/1.json"
        );
    }
}
