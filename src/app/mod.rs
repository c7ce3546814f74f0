pub mod ports;
pub mod osm_import;
pub mod pos_service;
