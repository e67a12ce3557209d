//! Loading the LUT catalog.

use filmsim_color::{load_lut, LutGrid};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// A catalog item as supplied by the catalog provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub name: String,
    pub path: PathBuf,
}

impl CatalogItem {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// A successfully parsed catalog LUT.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: String,
    pub lut: Arc<LutGrid>,
}

/// Parse every item in parallel. Items that fail to load are logged and
/// left out; the rest keep their order.
pub fn load_catalog(items: &[CatalogItem]) -> Vec<CatalogEntry> {
    let entries: Vec<CatalogEntry> = items
        .par_iter()
        .filter_map(|item| match load_lut(&item.path) {
            Ok(lut) => Some(CatalogEntry {
                name: item.name.clone(),
                lut: Arc::new(lut),
            }),
            Err(e) => {
                warn!(name = %item.name, path = %item.path.display(), error = %e, "skipping LUT");
                None
            }
        })
        .collect();
    info!(loaded = entries.len(), skipped = items.len() - entries.len(), "catalog loaded");
    entries
}
