//! Process-wide dataset cache.
//!
//! The dataset is loaded at most once per process, on first access, and is
//! read-only from then on. There is no invalidation: a later call with a
//! different source gets the dataset that was loaded first.

use std::path::PathBuf;

use once_cell::sync::OnceCell;

use crate::demo::demo_dataset;
use crate::error::{Result, SalescopeError};
use crate::loader::load_file;
use crate::models::Dataset;
use crate::settings::{shellexpand_path, Settings};

static DATASET: OnceCell<Dataset> = OnceCell::new();

/// Where the dataset comes from for this process.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Demo,
    File {
        path: PathBuf,
        sheet: Option<String>,
    },
}

impl DataSource {
    /// Resolve the source from command-line overrides, then settings.
    pub fn resolve(
        demo: bool,
        dataset: Option<&str>,
        sheet: Option<&str>,
        settings: &Settings,
    ) -> Result<Self> {
        if demo {
            return Ok(DataSource::Demo);
        }
        let path = dataset
            .map(str::to_string)
            .or_else(|| settings.dataset_path.clone())
            .ok_or(SalescopeError::NoDataset)?;
        Ok(DataSource::File {
            path: PathBuf::from(shellexpand_path(&path)),
            sheet: sheet.map(str::to_string).or_else(|| settings.sheet.clone()),
        })
    }

    pub fn load(&self, settings: &Settings) -> Result<Dataset> {
        match self {
            DataSource::Demo => Ok(demo_dataset()),
            DataSource::File { path, sheet } => {
                if !path.exists() {
                    return Err(SalescopeError::Other(format!(
                        "Dataset not found: {}",
                        path.display()
                    )));
                }
                load_file(path, sheet.as_deref(), &settings.columns)
            }
        }
    }
}

/// The shared dataset, loading it from `source` on first use.
pub fn shared(source: &DataSource, settings: &Settings) -> Result<&'static Dataset> {
    DATASET.get_or_try_init(|| {
        tracing::debug!(?source, "initialising dataset cache");
        source.load(settings)
    })
}
