//! Injection journal
//!
//! An append-only record of every injection the container performs during a
//! build. The handle is cheap to clone; clones share the same log, so a caller
//! can hand one to the builder and inspect it after `build()` returns.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

/// One resolved argument of a constructor or method call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectedArgument {
    pub index: usize,
    pub declared_type: String,
    pub value: String,
}

/// A single injection event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalEntry {
    ConstructorCall {
        target: String,
        arguments: Vec<InjectedArgument>,
    },
    MethodCall {
        target: String,
        method: String,
        arguments: Vec<InjectedArgument>,
    },
    FieldSet {
        target: String,
        field: String,
        declared_type: String,
        value: String,
    },
}

impl fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JournalEntry::ConstructorCall { target, arguments } => {
                writeln!(f, "Constructor being injected: {}", target)?;
                for arg in arguments {
                    writeln!(
                        f,
                        "  arg[{}] type:{}, with: {}",
                        arg.index, arg.declared_type, arg.value
                    )?;
                }
                Ok(())
            }
            JournalEntry::MethodCall {
                method, arguments, ..
            } => {
                let values: Vec<&str> = arguments.iter().map(|a| a.value.as_str()).collect();
                writeln!(
                    f,
                    "Method being injected: '{}' with: {}",
                    method,
                    values.join(", ")
                )
            }
            JournalEntry::FieldSet { field, value, .. } => {
                writeln!(f, "Field being injected: '{}' with: {}", field, value)
            }
        }
    }
}

/// Shared, append-only injection log
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<RwLock<Vec<JournalEntry>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Entries are never removed or rewritten.
    pub fn append(&self, entry: JournalEntry) {
        debug!(target: "mockwire::journal", "{}", entry.to_string().trim_end());
        self.entries.write().push(entry);
    }

    /// Snapshot of all entries in append order
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// True when both handles point at the same log
    pub fn shares_log_with(&self, other: &Journal) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    /// Human-readable rendering, one block per entry
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// JSON array of entries
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&*self.entries.read())
    }
}

impl fmt::Display for Journal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.entries.read().iter() {
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Journal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Journal")
            .field("entries", &self.len())
            .finish()
    }
}
