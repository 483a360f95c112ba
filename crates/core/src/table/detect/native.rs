use tracing::warn;

use crate::page::PageSource;
use crate::table::settings::TableSettings;
use crate::table::types::TableRegion;

use super::{DetectorKind, TableDetector};

/// Tables reported by the page engine's own extraction facility.
pub struct NativeDetector;

impl TableDetector for NativeDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Native
    }

    fn detect(&self, page: &dyn PageSource, _settings: &TableSettings) -> Vec<TableRegion> {
        match page.native_tables() {
            Ok(tables) => tables
                .into_iter()
                .filter(|t| !t.cells.is_empty() || t.matrix.as_ref().is_some_and(|m| !m.is_empty()))
                .map(|t| {
                    let mut region = TableRegion::from(t);
                    region.origin = Some(DetectorKind::Native);
                    region
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "native table extraction failed");
                Vec::new()
            }
        }
    }
}
