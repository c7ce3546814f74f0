use crate::app::ports::HttpClientPort;
use crate::constants::{
    osm_node_url, DEFAULT_HOUSE_NUMBER, DEFAULT_POSTCODE, NOT_AVAILABLE, TAG_AMENITY, TAG_CITY,
    TAG_DESCRIPTION, TAG_HOUSE_NUMBER, TAG_NAME, TAG_POSTCODE, TAG_SHOP, TAG_STREET, UNKNOWN,
};
use crate::error::{PosError, Result};
use crate::observability::metrics;
use crate::types::{CampusType, Pos, PosArgs, PosType};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Fetches OpenStreetMap nodes and turns their tags into candidate POS records.
///
/// The importer never persists anything; callers hand the candidate to the
/// upsert path themselves.
pub struct OsmNodeImporter {
    http: Arc<dyn HttpClientPort>,
    api_base_url: String,
}

impl OsmNodeImporter {
    pub fn new(http: Arc<dyn HttpClientPort>, api_base_url: impl Into<String>) -> Self {
        Self {
            http,
            api_base_url: api_base_url.into(),
        }
    }

    /// Fetch a node and build an unsaved `Pos` from it.
    ///
    /// Every transport problem is reported as `OsmNodeNotFound`, including
    /// non-success statuses and empty bodies.
    #[instrument(skip(self))]
    pub async fn fetch_candidate(&self, node_id: i64) -> Result<Pos> {
        let url = osm_node_url(&self.api_base_url, node_id);
        debug!("Fetching {}", url);

        let response = match self.http.get(&url).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Request for OSM node {} failed: {}", node_id, e);
                metrics::import::node_not_found();
                return Err(PosError::OsmNodeNotFound { node_id });
            }
        };

        if !response.is_success() {
            warn!("OSM node {} lookup returned HTTP {}", node_id, response.status);
            metrics::import::node_not_found();
            return Err(PosError::OsmNodeNotFound { node_id });
        }

        if response.bytes.iter().all(u8::is_ascii_whitespace) {
            warn!("OSM node {} lookup returned an empty body", node_id);
            metrics::import::node_not_found();
            return Err(PosError::OsmNodeNotFound { node_id });
        }

        let result = normalize_node_document(node_id, &response.bytes);
        match &result {
            Err(PosError::OsmNodeNotFound { .. }) => metrics::import::node_not_found(),
            Err(PosError::OsmNodeMissingFields { .. }) => metrics::import::missing_fields(),
            _ => {}
        }
        result
    }
}

/// Read a tag as text. JSON `null` counts as absent; other scalars use their
/// textual form.
fn tag(tags: &Map<String, Value>, key: &str) -> Option<String> {
    match tags.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn tag_or(tags: &Map<String, Value>, key: &str, default: &str) -> String {
    tag(tags, key).unwrap_or_else(|| default.to_string())
}

/// `amenity` wins unless it is missing, in which case `shop` is consulted.
pub fn classify_pos_type(amenity: &str, shop: &str) -> PosType {
    let type_tag = if amenity == UNKNOWN { shop } else { amenity };
    PosType::from_tag(type_tag)
}

/// Turn a node lookup document into an unsaved `Pos`.
///
/// Fails with `OsmNodeNotFound` for a `null` document or an empty
/// `elements` array, and with `OsmNodeMissingFields` for anything else that
/// cannot be interpreted, including missing `tags` or `name`.
pub fn normalize_node_document(node_id: i64, payload: &[u8]) -> Result<Pos> {
    let missing = || PosError::OsmNodeMissingFields { node_id };

    let document: Value = serde_json::from_slice(payload).map_err(|e| {
        warn!("Failed to parse OSM node data for node ID {}: {}", node_id, e);
        missing()
    })?;

    if document.is_null() {
        return Err(PosError::OsmNodeNotFound { node_id });
    }

    let elements = document
        .get("elements")
        .and_then(Value::as_array)
        .ok_or_else(missing)?;

    let Some(element) = elements.first() else {
        return Err(PosError::OsmNodeNotFound { node_id });
    };

    let tags = element
        .as_object()
        .ok_or_else(missing)?
        .get("tags")
        .and_then(Value::as_object)
        .ok_or_else(missing)?;

    let name = tag(tags, TAG_NAME).ok_or_else(missing)?;

    let description = tag_or(tags, TAG_DESCRIPTION, NOT_AVAILABLE);
    let street = tag_or(tags, TAG_STREET, UNKNOWN);
    let mut house_number = tag_or(tags, TAG_HOUSE_NUMBER, NOT_AVAILABLE);
    if house_number == NOT_AVAILABLE {
        house_number = DEFAULT_HOUSE_NUMBER.to_string();
    }
    let city = tag_or(tags, TAG_CITY, UNKNOWN);
    let postcode = tag_or(tags, TAG_POSTCODE, DEFAULT_POSTCODE);

    let amenity = tag_or(tags, TAG_AMENITY, UNKNOWN);
    let shop = tag_or(tags, TAG_SHOP, UNKNOWN);
    let pos_type = classify_pos_type(&amenity, &shop);
    let campus = CampusType::from_postcode(&postcode);

    let postal_code = postcode.parse::<i32>().unwrap_or_else(|_| {
        warn!(
            "Could not parse postcode '{}' for OSM node {}. Using default 0.",
            postcode, node_id
        );
        metrics::import::postcode_defaulted();
        0
    });

    Ok(Pos::new(PosArgs {
        name,
        description,
        pos_type,
        campus,
        street,
        house_number,
        postal_code,
        city,
    }))
}
