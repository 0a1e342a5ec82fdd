//! Workspace inventory model.
//!
//! Walks the workspace root and summarizes what is on disk. A walk over a
//! large tree can take a while, so the cancellation token is checked before
//! every entry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tooling_protocol::ModelIdentifier;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::producer::{BuildContext, BuildError, ModelProducer};

/// Model name served by [`WorkspaceInventoryProducer`].
pub const WORKSPACE_INVENTORY_MODEL: &str = "tooling.model.WorkspaceInventory";

const OPTION_MAX_DEPTH: &str = "max-depth";
const OPTION_INCLUDE_HIDDEN: &str = "include-hidden";

#[derive(Debug, Default, Serialize)]
struct WorkspaceInventory {
    root: String,
    files: u64,
    directories: u64,
    total_bytes: u64,
    /// File counts keyed by extension ("" for none).
    extensions: BTreeMap<String, u64>,
}

/// Produces the workspace inventory model.
#[derive(Debug, Clone)]
pub struct WorkspaceInventoryProducer {
    root: PathBuf,
}

impl WorkspaceInventoryProducer {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ModelProducer for WorkspaceInventoryProducer {
    fn matches(&self, model: &str) -> bool {
        model == WORKSPACE_INVENTORY_MODEL
    }

    fn models(&self) -> Vec<String> {
        vec![WORKSPACE_INVENTORY_MODEL.to_string()]
    }

    fn accepts_option(&self, name: &str) -> bool {
        matches!(name, OPTION_MAX_DEPTH | OPTION_INCLUDE_HIDDEN)
    }

    fn build(&self, model: &ModelIdentifier, context: &BuildContext<'_>) -> Result<Value, BuildError> {
        if !self.matches(model.name()) {
            return Err(BuildError::UnexpectedModel(model.name().to_string()));
        }

        let max_depth = max_depth(context)?;
        let include_hidden = include_hidden(context)?;
        let token = context.cancellation();

        let mut walker = WalkDir::new(&self.root);
        if let Some(depth) = max_depth {
            walker = walker.max_depth(depth);
        }

        let mut inventory = WorkspaceInventory {
            root: self.root.display().to_string(),
            ..WorkspaceInventory::default()
        };

        let entries = walker
            .into_iter()
            .filter_entry(|entry| include_hidden || entry.depth() == 0 || !is_hidden(entry));

        for entry in entries {
            token.ensure_not_cancelled()?;

            let entry = entry.map_err(|e| BuildError::caused_by("failed to walk workspace", e))?;
            if entry.depth() == 0 {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                inventory.directories += 1;
            } else if file_type.is_file() {
                inventory.files += 1;
                let metadata = entry
                    .metadata()
                    .map_err(|e| BuildError::caused_by("failed to read file metadata", e))?;
                inventory.total_bytes += metadata.len();

                let extension = entry
                    .path()
                    .extension()
                    .map(|e| e.to_string_lossy().to_string())
                    .unwrap_or_default();
                *inventory.extensions.entry(extension).or_default() += 1;
            }
        }

        debug!(
            root = %inventory.root,
            files = inventory.files,
            directories = inventory.directories,
            "workspace inventory complete"
        );

        serde_json::to_value(inventory).map_err(|e| BuildError::caused_by("failed to serialize inventory", e))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}

fn max_depth(context: &BuildContext<'_>) -> Result<Option<usize>, BuildError> {
    let Some(value) = context.parameters().option(OPTION_MAX_DEPTH) else {
        return Ok(None);
    };
    let depth = match &value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse::<u64>().ok(),
        _ => None,
    };
    depth
        .map(|d| Some(d as usize))
        .ok_or_else(|| BuildError::failed(format!("invalid value for {}: {}", OPTION_MAX_DEPTH, value)))
}

fn include_hidden(context: &BuildContext<'_>) -> Result<bool, BuildError> {
    match context.parameters().option(OPTION_INCLUDE_HIDDEN) {
        None => Ok(false),
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::String(s)) => s
            .parse::<bool>()
            .map_err(|_| BuildError::failed(format!("invalid value for {}: {}", OPTION_INCLUDE_HIDDEN, s))),
        Some(other) => Err(BuildError::failed(format!(
            "invalid value for {}: {}",
            OPTION_INCLUDE_HIDDEN, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use serde_json::json;
    use tempfile::TempDir;
    use tooling_protocol::{BuildParameters, CancellationHandler, CrossVersionCancellationHandle, NeverCancelled};

    use crate::adapter::BuildCancellationTokenAdapter;

    struct AlreadyCancelled(AtomicBool);

    impl CrossVersionCancellationHandle for AlreadyCancelled {
        fn can_be_cancelled(&self) -> bool {
            true
        }

        fn is_cancellation_requested(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }

        fn add_callback(&self, handler: CancellationHandler) -> bool {
            let _ = handler();
            true
        }
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]\n").unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "pub fn a() {}\n").unwrap();
        fs::write(dir.path().join("src/nested/mod.rs"), "").unwrap();
        fs::write(dir.path().join("README"), "readme").unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        dir
    }

    fn build_with(
        root: &Path,
        handle: Arc<dyn CrossVersionCancellationHandle>,
        params: BuildParameters,
    ) -> Result<Value, BuildError> {
        let producer = WorkspaceInventoryProducer::new(root);
        let token = BuildCancellationTokenAdapter::new(handle);
        let context = BuildContext::new(&token, &params);
        producer.build(&ModelIdentifier::new(WORKSPACE_INVENTORY_MODEL), &context)
    }

    #[test]
    fn test_inventory_counts() {
        let dir = fixture();
        let value = build_with(dir.path(), Arc::new(NeverCancelled), BuildParameters::new()).unwrap();

        assert_eq!(value["files"], 4);
        assert_eq!(value["directories"], 2);
        assert_eq!(value["extensions"]["rs"], 2);
        assert_eq!(value["extensions"]["toml"], 1);
        assert_eq!(value["extensions"][""], 1);
    }

    #[test]
    fn test_include_hidden() {
        let dir = fixture();
        let params = BuildParameters::new().with_argument("--include-hidden");
        let value = build_with(dir.path(), Arc::new(NeverCancelled), params).unwrap();

        assert_eq!(value["files"], 5);
        assert_eq!(value["directories"], 3);
    }

    #[test]
    fn test_max_depth() {
        let dir = fixture();
        let params = BuildParameters::new().with_option(OPTION_MAX_DEPTH, json!(1));
        let value = build_with(dir.path(), Arc::new(NeverCancelled), params).unwrap();

        assert_eq!(value["files"], 2);
        assert_eq!(value["directories"], 1);
    }

    #[test]
    fn test_invalid_max_depth() {
        let dir = fixture();
        let params = BuildParameters::new().with_argument("--max-depth=deep");
        let err = build_with(dir.path(), Arc::new(NeverCancelled), params).unwrap_err();
        assert!(err.to_string().contains("max-depth"));
    }

    #[test]
    fn test_cancelled_walk_stops() {
        let dir = fixture();
        let handle = Arc::new(AlreadyCancelled(AtomicBool::new(true)));
        let err = build_with(dir.path(), handle, BuildParameters::new()).unwrap_err();
        assert!(matches!(err, BuildError::Cancelled));
    }

    #[test]
    fn test_accepts_only_known_options() {
        let producer = WorkspaceInventoryProducer::new(".");
        assert!(producer.accepts_option("max-depth"));
        assert!(producer.accepts_option("include-hidden"));
        assert!(!producer.accepts_option("offline"));
    }
}
