//! Workspace file layout and input checks
//!
//! Everything mqgo reads or writes lives inside one workspace directory
//! (default `meqa_data`), except where the user points `-s`/`-p`/`-r` elsewhere.

use std::path::{Path, PathBuf};

use super::{Error, Result};

/// Default workspace directory name
pub const DEFAULT_WORKSPACE: &str = "meqa_data";

/// Credential document, created on first use
pub const CONFIG_FILE: &str = ".config";

/// Raw spec submitted by `generate` when `-s` isn't given
pub const SOURCE_SPEC_FILE: &str = "swagger.yaml";

/// Annotated spec written by `generate` and read by `run`
pub const ANNOTATED_SPEC_FILE: &str = "swagger_meqa.yaml";

/// Run results
pub const RESULT_FILE: &str = "result.yaml";

/// Log file, appended to on every invocation
pub const LOG_FILE: &str = "mqgo.log";

pub fn config_path(workspace: &Path) -> PathBuf {
    workspace.join(CONFIG_FILE)
}

pub fn annotated_spec_path(workspace: &Path) -> PathBuf {
    workspace.join(ANNOTATED_SPEC_FILE)
}

/// Path of a generated plan, `<workspace>/<name>.yaml`
pub fn plan_path(workspace: &Path, plan_name: &str) -> PathBuf {
    workspace.join(format!("{plan_name}.yaml"))
}

/// Whether `name` can be used as a plan file stem without leaving the workspace
pub fn is_plain_file_stem(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

/// Check that `path` exists
///
/// `what` is used in the message, e.g. "swagger file"
pub fn require_file(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        return Err(Error::validation(format!(
            "can't load {} at the following location {}",
            what,
            path.display()
        )));
    }
    Ok(())
}

/// Check that the workspace exists and is a directory
pub fn require_workspace(workspace: &Path) -> Result<()> {
    match std::fs::metadata(workspace) {
        Err(_) => Err(Error::validation(format!(
            "specified meqa directory {} doesn't exist.",
            workspace.display()
        ))),
        Ok(meta) if !meta.is_dir() => Err(Error::validation(format!(
            "specified meqa directory {} is not a directory.",
            workspace.display()
        ))),
        Ok(_) => Ok(()),
    }
}
