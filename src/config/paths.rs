//! Project root discovery and conventional locations under it.
//!
//! ## Discovery order
//!
//! | Source | Condition |
//! |--------|-----------|
//! | `PROJECT_ROOT` env var | set and non-empty |
//! | `/opt` | exists (production images) |
//! | walk up from the executable | a `project.marker` file is found |
//! | current directory | fallback |

use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Environment variable naming the project root explicitly
pub const PROJECT_ROOT_ENV: &str = "PROJECT_ROOT";

/// Fixed root used by production deployments
pub const PRODUCTION_ROOT: &str = "/opt";

/// Marker file identifying the project root during the upward walk
pub const MARKER_FILE: &str = "project.marker";

/// Configuration document looked up when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "app-config.yaml";

/// Directory holding discoverable process modules
pub const MODULES_DIR: &str = "modules";

/// Find the project root from the environment, the filesystem and the
/// location of the running executable.
pub fn find_project_root() -> PathBuf {
    let env_root = std::env::var(PROJECT_ROOT_ENV).ok();
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    locate_root(env_root.as_deref(), Path::new(PRODUCTION_ROOT), exe_dir.as_deref())
}

/// Discovery with every input made explicit.
pub fn locate_root(
    env_root: Option<&str>,
    production_root: &Path,
    search_from: Option<&Path>,
) -> PathBuf {
    if let Some(root) = env_root.filter(|r| !r.is_empty()) {
        info!(root, "Using {} from environment", PROJECT_ROOT_ENV);
        let root = PathBuf::from(root);
        return root.canonicalize().unwrap_or(root);
    }

    if production_root.exists() {
        info!(root = %production_root.display(), "Using production project root");
        return production_root.to_path_buf();
    }

    if let Some(start) = search_from {
        if let Some(root) = start.ancestors().find(|dir| dir.join(MARKER_FILE).exists()) {
            info!(root = %root.display(), marker = MARKER_FILE, "Found project root via marker");
            return root.to_path_buf();
        }
    }

    warn!("No project root marker found, falling back to current working directory");
    std::env::current_dir()
        .and_then(|cwd| cwd.canonicalize())
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// `<root>/app-config.yaml`
pub fn default_config_path(project_root: &Path) -> PathBuf {
    project_root.join(DEFAULT_CONFIG_FILE)
}

/// `<root>/modules`
pub fn modules_dir(project_root: &Path) -> PathBuf {
    project_root.join(MODULES_DIR)
}
