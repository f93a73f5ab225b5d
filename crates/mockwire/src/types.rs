//! Type identity used as the component key
//!
//! A `TypeKey` pairs a `TypeId` with the compiler-provided type name so that
//! keys compare by identity but still render readably in the journal and in
//! error messages.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Type-erased component value shared across the object graph.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Fallback category of a requested type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Integer,
    Float,
    Boolean,
    Character,
    Text,
    /// Anything that is not a primitive: structs, handles, trait objects
    Object,
}

impl TypeCategory {
    pub fn is_primitive(&self) -> bool {
        !matches!(self, TypeCategory::Object)
    }
}

/// Identity of a requested type
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for a Rust type
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name as reported by the compiler
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name with module paths stripped, e.g. `Arc<dyn Store>`
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }

    /// Fallback category, decided by the primitive table
    pub fn category(&self) -> TypeCategory {
        crate::fallback::category_of(self)
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&self.name).finish()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// Strip module paths from every path segment of a type name.
///
/// `alloc::sync::Arc<dyn my_crate::store::Store>` becomes `Arc<dyn Store>`.
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();

    let flush = |segment: &mut String, out: &mut String| {
        match segment.rfind("::") {
            Some(pos) => out.push_str(&segment[pos + 2..]),
            None => out.push_str(segment),
        }
        segment.clear();
    };

    for ch in full.chars() {
        match ch {
            '<' | '>' | ',' | '(' | ')' | '[' | ']' | '&' | ';' | ' ' | '*' => {
                flush(&mut segment, &mut out);
                out.push(ch);
            }
            _ => segment.push(ch),
        }
    }
    flush(&mut segment, &mut out);
    out
}
