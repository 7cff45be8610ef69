use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::portal::GridCell;
use crate::storage::{PageStorage, StorageError};

pub const LAST_PORTAL_USED_KEY: &str = "lastPortalUsed";
pub const RETURN_FROM_PAGE_KEY: &str = "returnFromPage";

/// Record of the portal the player left through, used to place them next to
/// it when they come back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub x: f32,
    pub y: f32,
    pub position: GridCell,
    #[serde(rename = "portalIndex")]
    pub portal_index: usize,
}

#[derive(Debug, Error)]
pub enum BreadcrumbError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("stored {key} value is malformed: {source}")]
    Malformed {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode breadcrumb: {0}")]
    Encode(#[source] serde_json::Error),
}

pub fn write_breadcrumb(
    storage: &dyn PageStorage,
    breadcrumb: &Breadcrumb,
) -> Result<(), BreadcrumbError> {
    let json = serde_json::to_string(breadcrumb).map_err(BreadcrumbError::Encode)?;
    storage.set_item(LAST_PORTAL_USED_KEY, &json)?;
    debug!(portal_index = breadcrumb.portal_index, "breadcrumb_written");
    Ok(())
}

/// Flags that the next world page is a return trip from `page`.
pub fn mark_return_from_page(storage: &dyn PageStorage, page: &str) -> Result<(), StorageError> {
    storage.set_item(RETURN_FROM_PAGE_KEY, page)
}

/// Reads the breadcrumb for a return trip and clears both keys, so it is
/// consumed at most once. Without the return flag nothing is read or cleared;
/// storage that cannot be read is cleared and the error returned.
pub fn consume_return_breadcrumb(
    storage: &dyn PageStorage,
) -> Result<Option<Breadcrumb>, BreadcrumbError> {
    let read = storage.get_item(RETURN_FROM_PAGE_KEY).and_then(|flag| match flag {
        Some(from_page) => Ok(Some((from_page, storage.get_item(LAST_PORTAL_USED_KEY)?))),
        None => Ok(None),
    });
    let (from_page, stored) = match read {
        Ok(Some(found)) => found,
        Ok(None) => return Ok(None),
        Err(error) => {
            // Clearing rewrites unreadable storage, so the failure is reported once.
            let _ = clear_return_keys(storage);
            return Err(error.into());
        }
    };
    clear_return_keys(storage)?;

    let Some(json) = stored else {
        debug!(from_page = %from_page, "return_without_breadcrumb");
        return Ok(None);
    };
    let breadcrumb = serde_json::from_str(&json).map_err(|source| BreadcrumbError::Malformed {
        key: LAST_PORTAL_USED_KEY,
        source,
    })?;
    debug!(from_page = %from_page, "breadcrumb_consumed");
    Ok(Some(breadcrumb))
}

fn clear_return_keys(storage: &dyn PageStorage) -> Result<(), StorageError> {
    storage.remove_item(RETURN_FROM_PAGE_KEY)?;
    storage.remove_item(LAST_PORTAL_USED_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, MemoryStorage};

    fn sample() -> Breadcrumb {
        Breadcrumb {
            x: 412.5,
            y: 230.0,
            position: GridCell::TopLeft,
            portal_index: 3,
        }
    }

    #[test]
    fn stored_json_uses_browser_field_names() {
        let storage = MemoryStorage::new();
        write_breadcrumb(&storage, &sample()).expect("write");
        let raw = storage
            .get_item(LAST_PORTAL_USED_KEY)
            .expect("get")
            .expect("present");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["position"], "top-left");
        assert_eq!(value["portalIndex"], 3);
        assert_eq!(value["x"], 412.5);
    }

    #[test]
    fn breadcrumb_is_consumed_exactly_once() {
        let storage = MemoryStorage::new();
        write_breadcrumb(&storage, &sample()).expect("write");
        mark_return_from_page(&storage, "about.html").expect("mark");

        let first = consume_return_breadcrumb(&storage).expect("consume");
        assert_eq!(first, Some(sample()));
        assert_eq!(consume_return_breadcrumb(&storage).expect("consume"), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn fresh_visit_leaves_breadcrumb_untouched() {
        let storage = MemoryStorage::new();
        write_breadcrumb(&storage, &sample()).expect("write");

        assert_eq!(consume_return_breadcrumb(&storage).expect("consume"), None);
        assert!(storage
            .get_item(LAST_PORTAL_USED_KEY)
            .expect("get")
            .is_some());
    }

    #[test]
    fn malformed_breadcrumb_errors_and_is_cleared() {
        let storage = MemoryStorage::new();
        storage
            .set_item(LAST_PORTAL_USED_KEY, "{\"x\": \"nope\"}")
            .expect("set");
        mark_return_from_page(&storage, "team.html").expect("mark");

        assert!(matches!(
            consume_return_breadcrumb(&storage),
            Err(BreadcrumbError::Malformed { .. })
        ));
        assert!(storage.is_empty());
    }

    #[test]
    fn corrupt_storage_file_falls_back_once_then_recovers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FileStorage::in_dir(dir.path());
        std::fs::write(storage.path(), "{not json").expect("write");

        assert!(matches!(
            consume_return_breadcrumb(&storage),
            Err(BreadcrumbError::Storage(StorageError::Parse { .. }))
        ));
        assert_eq!(consume_return_breadcrumb(&storage).expect("repaired"), None);

        std::fs::write(storage.path(), "{not json").expect("write");
        write_breadcrumb(&storage, &sample()).expect("write repairs file");
        mark_return_from_page(&storage, "about.html").expect("mark");
        assert_eq!(
            consume_return_breadcrumb(&storage).expect("consume"),
            Some(sample())
        );
        assert_eq!(consume_return_breadcrumb(&storage).expect("consume"), None);
    }
}
