//! Portable import/export of the route set.
//!
//! Routes are configuration, not history: the document carries the ordered
//! route sequence (including `enabled` flags) and nothing from the ledger.
//! Route ids are not preserved across the export boundary; fresh ids are
//! assigned when the imported routes are inserted into a store.

use crate::route::{RouteConfig, RouteStore, ValidationError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Version stamped into every exported document so future field additions
/// stay backward compatible.
pub const FORMAT_VERSION: u32 = 1;

/// The portable route document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDocument {
    pub format_version: u32,
    pub routes: Vec<RouteConfig>,
}

/// Error types for route import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("malformed route document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported format version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("route {index}: {source}")]
    Entry {
        index: usize,
        source: ValidationError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Serialize the full ordered route sequence into a portable document.
pub fn export_routes(store: &RouteStore) -> RouteDocument {
    RouteDocument {
        format_version: FORMAT_VERSION,
        routes: store.list().iter().map(|r| r.to_config()).collect(),
    }
}

/// Validate every entry before any route is handed back: import is
/// all-or-nothing, and the first failure names the offending entry index
/// and field.
pub fn import_routes(document: &RouteDocument) -> Result<Vec<RouteConfig>, ImportError> {
    if document.format_version > FORMAT_VERSION {
        return Err(ImportError::UnsupportedVersion {
            found: document.format_version,
            supported: FORMAT_VERSION,
        });
    }
    for (index, route) in document.routes.iter().enumerate() {
        route
            .validate()
            .map_err(|source| ImportError::Entry { index, source })?;
    }
    Ok(document.routes.clone())
}

pub fn parse_document(json: &str) -> Result<RouteDocument, ImportError> {
    Ok(serde_json::from_str(json)?)
}

pub fn to_json(document: &RouteDocument) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(document)
}

/// Save the current route set to a JSON document on disk.
pub fn write_routes_file(store: &RouteStore, path: &Path) -> Result<(), std::io::Error> {
    let document = export_routes(store);
    let json = serde_json::to_string_pretty(&document)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    fs::write(path, json)?;
    info!("Saved {} routes to {:?}", document.routes.len(), path);
    Ok(())
}

/// Load and validate a route document from disk.
pub fn read_routes_file(path: &Path) -> Result<Vec<RouteConfig>, ImportError> {
    let json = fs::read_to_string(path)?;
    let document = parse_document(&json)?;
    let routes = import_routes(&document)?;
    info!("Loaded {} routes from {:?}", routes.len(), path);
    Ok(routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::headers::Headers;
    use crate::route::RequestMethod;

    fn config(url: &str, status: u16) -> RouteConfig {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "application/json");
        RouteConfig {
            request_url: url.to_string(),
            request_method: RequestMethod::Get,
            response_data: Body::from("{\"ok\":true}"),
            response_headers: headers,
            response_status: status,
            enabled: true,
        }
    }

    #[test]
    fn test_round_trip_preserves_order_and_fields() {
        let store = RouteStore::new();
        store.add(config("/b", 200)).unwrap();
        let mut disabled = config("/a", 404);
        disabled.enabled = false;
        disabled.response_data = Body::Binary(vec![1, 2, 3]);
        store.add(disabled).unwrap();

        let exported = export_routes(&store);
        let json = to_json(&exported).unwrap();
        let imported = import_routes(&parse_document(&json).unwrap()).unwrap();

        // Ids are not carried across the boundary; everything else is,
        // in the original order
        let original: Vec<RouteConfig> = store.list().iter().map(|r| r.to_config()).collect();
        assert_eq!(imported, original);
        assert!(!imported[1].enabled);
        assert_eq!(imported[1].response_data, Body::Binary(vec![1, 2, 3]));
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let document = RouteDocument {
            format_version: FORMAT_VERSION,
            routes: vec![config("/ok", 200), config("/bad", 9000), config("/also-ok", 200)],
        };

        let err = import_routes(&document).unwrap_err();
        match err {
            ImportError::Entry { index, source } => {
                assert_eq!(index, 1);
                assert_eq!(source.field, "responseStatus");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_newer_format_version_rejected() {
        let document = RouteDocument {
            format_version: FORMAT_VERSION + 1,
            routes: vec![],
        };
        assert!(matches!(
            import_routes(&document),
            Err(ImportError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            parse_document("{not json"),
            Err(ImportError::Parse(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let store = RouteStore::new();
        store.add(config("/a", 200)).unwrap();
        store.add(config("/b", 503)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.json");
        write_routes_file(&store, &path).unwrap();

        let loaded = read_routes_file(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].request_url, "/a");
        assert_eq!(loaded[1].response_status, 503);

        // Imported routes land in a store with fresh ids
        let target = RouteStore::new();
        let ids = target.extend(loaded).unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            read_routes_file(Path::new("/nonexistent/routes.json")),
            Err(ImportError::Io(_))
        ));
    }
}
