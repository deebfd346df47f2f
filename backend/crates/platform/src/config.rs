//! Configuration Tree
//!
//! A hierarchical, JSON-shaped configuration store with change
//! notification. Handles ([`Topics`]) are cheap to clone and may point at
//! any node of the shared tree; paths are always relative to the handle.
//!
//! Every mutation bumps a version counter published through a
//! `tokio::sync::watch` channel. Subscribers re-read whatever they need
//! after a change; no diff is delivered.

use serde_json::{Map, Value};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::watch;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration root must be a JSON object")]
    NotAnObject,
}

struct TopicsInner {
    root: RwLock<Value>,
    version: watch::Sender<u64>,
}

/// Handle to a node of the shared configuration tree
#[derive(Clone)]
pub struct Topics {
    inner: Arc<TopicsInner>,
    path: Vec<String>,
}

impl Topics {
    /// Empty tree
    pub fn new() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }

    /// Tree initialised from `root`
    pub fn from_value(root: Value) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(TopicsInner {
                root: RwLock::new(root),
                version,
            }),
            path: Vec::new(),
        }
    }

    /// Load a tree from a JSON file
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let root = read_json_object(path.as_ref()).await?;
        Ok(Self::from_value(root))
    }

    /// Replace this node's subtree with the contents of a JSON file
    pub async fn reload_json_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let root = read_json_object(path.as_ref()).await?;
        self.replace(root);
        Ok(())
    }

    /// Handle to the child node `name`
    ///
    /// The node does not need to exist yet.
    pub fn child(&self, name: &str) -> Topics {
        let mut path = self.path.clone();
        path.push(name.to_string());
        Topics {
            inner: Arc::clone(&self.inner),
            path,
        }
    }

    /// Absolute path of this handle
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Value at `path`, relative to this node
    pub fn lookup(&self, path: &[&str]) -> Option<Value> {
        let root = self.inner.root.read().unwrap_or_else(PoisonError::into_inner);
        let node = descend(&root, &self.path)?;
        path.iter()
            .try_fold(node, |node, segment| node.get(*segment))
            .cloned()
    }

    /// String value at `path`; empty strings read as absent
    pub fn lookup_str(&self, path: &[&str]) -> Option<String> {
        match self.lookup(path)? {
            Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Names of the child nodes of this node
    pub fn children(&self) -> Vec<String> {
        let root = self.inner.root.read().unwrap_or_else(PoisonError::into_inner);
        match descend(&root, &self.path) {
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Set the value at `path`, creating intermediate nodes, and notify
    pub fn update(&self, path: &[&str], value: impl Into<Value>) {
        {
            let mut root = self.inner.root.write().unwrap_or_else(PoisonError::into_inner);
            let segments = self
                .path
                .iter()
                .map(String::as_str)
                .chain(path.iter().copied());
            let slot = segments.fold(&mut *root, |node, segment| {
                if !node.is_object() {
                    *node = Value::Object(Map::new());
                }
                match node {
                    Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
                    _ => unreachable!("node was just made an object"),
                }
            });
            *slot = value.into();
        }
        self.notify();
    }

    /// Replace this node's whole subtree and notify
    pub fn replace(&self, value: Value) {
        if self.path.is_empty() {
            *self.inner.root.write().unwrap_or_else(PoisonError::into_inner) = value;
            self.notify();
        } else {
            let segments: Vec<&str> = Vec::new();
            self.update(&segments, value);
        }
    }

    /// Copy of this node's subtree
    pub fn snapshot(&self) -> Value {
        self.lookup(&[]).unwrap_or(Value::Null)
    }

    /// Receiver that is marked changed after every mutation of the tree
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }

    /// Current version of the tree
    pub fn version(&self) -> u64 {
        *self.inner.version.borrow()
    }

    fn notify(&self) {
        self.inner.version.send_modify(|version| *version += 1);
        tracing::debug!(path = ?self.path, version = self.version(), "Configuration changed");
    }
}

impl Default for Topics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Topics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topics")
            .field("path", &self.path)
            .field("version", &self.version())
            .finish()
    }
}

fn descend<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, segment| node.get(segment.as_str()))
}

async fn read_json_object(path: &Path) -> Result<Value, ConfigError> {
    let contents = tokio::fs::read_to_string(path).await?;
    let value: Value = serde_json::from_str(&contents)?;
    if !value.is_object() {
        return Err(ConfigError::NotAnObject);
    }
    Ok(value)
}
