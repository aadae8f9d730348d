//! Resolución de datasets de ubicaciones
//!
//! Cada selector apunta a un archivo JSON predefinido (`{"Locations": [...]}`).
//! El contenido no se valida aquí; eso queda entre el archivo y el solver.

use std::path::PathBuf;

use crate::models::LocationsSelector;
use crate::utils::errors::{AppError, AppResult};

pub trait DatasetResolver: Send + Sync {
    fn path_for(&self, selector: LocationsSelector) -> AppResult<PathBuf>;
}

/// Busca `locations_{small,medium,large}.json` dentro de un directorio
#[derive(Debug, Clone)]
pub struct DirectoryDatasetResolver {
    base_dir: PathBuf,
}

impl DirectoryDatasetResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn file_name(selector: LocationsSelector) -> &'static str {
        match selector {
            LocationsSelector::Small => "locations_small.json",
            LocationsSelector::Medium => "locations_medium.json",
            LocationsSelector::Large => "locations_large.json",
        }
    }
}

impl DatasetResolver for DirectoryDatasetResolver {
    fn path_for(&self, selector: LocationsSelector) -> AppResult<PathBuf> {
        let path = self.base_dir.join(Self::file_name(selector));
        if !path.is_file() {
            return Err(AppError::Internal(format!(
                "Dataset for selector {} not found at {}",
                selector.value(),
                path.display()
            )));
        }
        Ok(path)
    }
}
