/// Importer seam.
///
/// The asset format parser lives outside this crate; the host plugs it
/// in through [`SceneImporter`].

use std::path::Path;
use crate::error::Result;
use super::imported::ImportedScene;

/// Turns a scene file into an [`ImportedScene`].
///
/// Errors are reported as `Error::LoadFailed`; `Level::load` aborts on
/// them.
pub trait SceneImporter: Send + Sync {
    fn import(&self, path: &Path) -> Result<ImportedScene>;
}
