use crate::app::osm_import::OsmNodeImporter;
use crate::app::ports::HttpClientPort;
use crate::error::{PosError, Result};
use crate::observability::metrics;
use crate::storage::PosStorage;
use crate::types::Pos;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Catalog operations: create-or-update decisions, lookups and OSM import.
pub struct PosService {
    storage: Arc<dyn PosStorage>,
    importer: OsmNodeImporter,
    allow_clear: bool,
}

impl std::fmt::Debug for PosService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosService")
            .field("storage", &"<Arc<dyn PosStorage>>")
            .field("allow_clear", &self.allow_clear)
            .finish()
    }
}

impl PosService {
    pub fn new(
        storage: Arc<dyn PosStorage>,
        http: Arc<dyn HttpClientPort>,
        osm_api_base_url: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            importer: OsmNodeImporter::new(http, osm_api_base_url),
            allow_clear: false,
        }
    }

    /// Enable the administrative `clear` operation
    pub fn with_clear_enabled(mut self, allow_clear: bool) -> Self {
        self.allow_clear = allow_clear;
        self
    }

    /// Delete every POS. Irreversible; refused unless enabled.
    pub async fn clear(&self) -> Result<()> {
        if !self.allow_clear {
            warn!("Refusing to clear POS data: clearing is disabled");
            return Err(PosError::ClearDisabled);
        }
        warn!("Clearing all POS data");
        self.storage.clear().await?;
        metrics::catalog_cleared();
        Ok(())
    }

    pub async fn get_all(&self) -> Result<Vec<Pos>> {
        debug!("Retrieving all POS");
        self.storage.get_all().await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Pos> {
        debug!("Retrieving POS with ID: {}", id);
        self.storage.get_by_id(id).await
    }

    /// Create the POS when it has no id, otherwise overwrite the existing one.
    ///
    /// Updates check existence first and never write when the id is unknown.
    /// Name collisions come back from storage as `DuplicateName`.
    #[instrument(skip(self, pos), fields(name = %pos.name, id = ?pos.id))]
    pub async fn upsert(&self, pos: Pos) -> Result<Pos> {
        match pos.id {
            None => {
                info!("Creating new POS: {}", pos.name);
                let saved = self.perform_upsert(pos).await?;
                metrics::upsert::created();
                Ok(saved)
            }
            Some(id) => {
                info!("Updating POS with ID: {}", id);
                if let Err(e) = self.storage.get_by_id(id).await {
                    if matches!(e, PosError::PosNotFound { .. }) {
                        metrics::upsert::not_found();
                    }
                    return Err(e);
                }
                let saved = self.perform_upsert(pos).await?;
                metrics::upsert::updated();
                Ok(saved)
            }
        }
    }

    /// Import a node from OpenStreetMap and create it as a new POS.
    ///
    /// Duplicate names from the create step are returned unchanged.
    #[instrument(skip(self))]
    pub async fn import_from_osm_node(&self, node_id: i64) -> Result<Pos> {
        info!("Importing POS from OpenStreetMap node {}...", node_id);
        let candidate = match self.importer.fetch_candidate(node_id).await {
            Ok(candidate) => candidate,
            Err(e) => {
                error!("Failed to import OSM node {}: {}", node_id, e);
                return Err(e);
            }
        };

        let saved = self.upsert(candidate).await?;
        metrics::import::success();
        info!("Successfully imported POS '{}' from OSM node {}", saved.name, node_id);
        Ok(saved)
    }

    async fn perform_upsert(&self, pos: Pos) -> Result<Pos> {
        let name = pos.name.clone();
        match self.storage.upsert(pos).await {
            Ok(saved) => {
                info!("Successfully upserted POS with ID: {:?}", saved.id);
                Ok(saved)
            }
            Err(e @ PosError::DuplicateName { .. }) => {
                error!("Error upserting POS '{}': {}", name, e);
                metrics::upsert::duplicate_name();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpGetResult;
    use crate::storage::InMemoryPosStorage;
    use crate::types::{CampusType, PosArgs, PosType};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Storage wrapper that records which operations were called
    struct RecordingStorage {
        inner: InMemoryPosStorage,
        calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingStorage {
        fn new() -> Self {
            Self {
                inner: InMemoryPosStorage::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl PosStorage for RecordingStorage {
        async fn get_all(&self) -> Result<Vec<Pos>> {
            self.record("get_all");
            self.inner.get_all().await
        }

        async fn get_by_id(&self, id: i64) -> Result<Pos> {
            self.record("get_by_id");
            self.inner.get_by_id(id).await
        }

        async fn upsert(&self, pos: Pos) -> Result<Pos> {
            self.record("upsert");
            self.inner.upsert(pos).await
        }

        async fn clear(&self) -> Result<()> {
            self.record("clear");
            self.inner.clear().await
        }
    }

    struct NoHttp;

    #[async_trait]
    impl HttpClientPort for NoHttp {
        async fn get(&self, _url: &str) -> std::result::Result<HttpGetResult, String> {
            Err("offline".to_string())
        }
    }

    fn service(storage: Arc<RecordingStorage>) -> PosService {
        PosService::new(storage, Arc::new(NoHttp), "https://osm.test")
    }

    fn pos(name: &str) -> Pos {
        Pos::new(PosArgs {
            name: name.to_string(),
            description: "Bakery chain".to_string(),
            pos_type: PosType::Bakery,
            campus: CampusType::Bergheim,
            street: "Bergheimer Straße".to_string(),
            house_number: "58".to_string(),
            postal_code: 69115,
            city: "Heidelberg".to_string(),
        })
    }

    #[tokio::test]
    async fn create_skips_existence_check() {
        let storage = Arc::new(RecordingStorage::new());
        let service = service(storage.clone());

        let saved = service.upsert(pos("Grimminger")).await.unwrap();
        assert_eq!(saved.id, Some(1));
        assert_eq!(storage.calls(), vec!["upsert"]);
    }

    #[tokio::test]
    async fn update_checks_existence_before_writing() {
        let storage = Arc::new(RecordingStorage::new());
        let service = service(storage.clone());
        let created = service.upsert(pos("Grimminger")).await.unwrap();

        let mut changed = created.clone();
        changed.description = "Now with coffee".to_string();
        let updated = service.upsert(changed).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.description, "Now with coffee");
        assert_eq!(storage.calls(), vec!["upsert", "get_by_id", "upsert"]);
    }

    #[tokio::test]
    async fn update_of_unknown_id_never_writes() {
        let storage = Arc::new(RecordingStorage::new());
        let service = service(storage.clone());

        let err = service.upsert(pos("X").with_id(42)).await.unwrap_err();
        assert!(matches!(err, PosError::PosNotFound { id: 42 }));
        assert_eq!(storage.calls(), vec!["get_by_id"]);
        assert!(storage.inner.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_name_propagates_from_both_branches() {
        let storage = Arc::new(RecordingStorage::new());
        let service = service(storage.clone());
        service.upsert(pos("Grimminger")).await.unwrap();
        let other = service.upsert(pos("Mantei")).await.unwrap();

        let err = service.upsert(pos("Grimminger")).await.unwrap_err();
        assert!(matches!(err, PosError::DuplicateName { ref name } if name == "Grimminger"));

        let mut renamed = other.clone();
        renamed.name = "Grimminger".to_string();
        let err = service.upsert(renamed).await.unwrap_err();
        assert!(matches!(err, PosError::DuplicateName { .. }));

        let stored = storage.inner.get_by_id(other.id.unwrap()).await.unwrap();
        assert_eq!(stored.name, "Mantei");
    }

    #[tokio::test]
    async fn returns_record_from_storage() {
        let storage = Arc::new(RecordingStorage::new());
        let service = service(storage.clone());

        let saved = service.upsert(pos("Grimminger")).await.unwrap();
        assert!(saved.created_at.is_some());
        assert_eq!(service.get_by_id(1).await.unwrap(), saved);
        assert_eq!(service.get_all().await.unwrap(), vec![saved]);
    }

    #[tokio::test]
    async fn clear_is_gated() {
        let storage = Arc::new(RecordingStorage::new());
        let locked = service(storage.clone());
        locked.upsert(pos("Grimminger")).await.unwrap();

        assert!(matches!(locked.clear().await, Err(PosError::ClearDisabled)));
        assert_eq!(locked.get_all().await.unwrap().len(), 1);

        let unlocked = service(storage.clone()).with_clear_enabled(true);
        unlocked.clear().await.unwrap();
        assert!(unlocked.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn import_failure_does_not_touch_storage() {
        let storage = Arc::new(RecordingStorage::new());
        let service = service(storage.clone());

        let err = service.import_from_osm_node(123).await.unwrap_err();
        assert!(matches!(err, PosError::OsmNodeNotFound { node_id: 123 }));
        assert!(storage.calls().is_empty());
    }
}
