//! Auto-mocking dependency resolution for tests
//!
//! This crate builds fully wired test subjects. Given a target type it
//! resolves every declared collaborator, preferring instances supplied by the
//! caller and otherwise synthesizing a recording mock proxy or a zero-value
//! primitive. Every injection is recorded in an inspectable journal.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mockwire::MockDeps;
//!
//! // Descriptors and mock bindings submitted via inventory are discovered
//! let wired = MockDeps::<Checkout>::new().build()?;
//!
//! wired.subject().pay(1200);
//! wired.verify_no_more_interactions_for_all()?;
//! ```
//!
//! See [`usage`] module for detailed usage examples.

pub mod builder;
pub mod config;
pub mod container;
pub mod error;
pub mod fallback;
pub mod introspect;
pub mod journal;
pub mod marker;
pub mod mock;
pub mod registration;
pub mod strategy;
pub mod sweep;
pub mod types;
pub mod usage;

pub use builder::{MockDeps, Wired};
pub use crate::config::{ConfigError, EngineConfig, PrimitiveMode, PrimitivesConfig, StrategyKind};
pub use container::{Container, ContainerBuilder, Origin};
pub use error::{InvocationError, MockError, MockResult, ResolveError, ResolveResult};
pub use fallback::{AutoMockFallback, PrimitivePolicy, SynthesisKind};
pub use introspect::{
    Args, Built, ConstructorInfo, FieldInfo, Introspection, Member, MethodInfo, TypeDescriptor,
    TypeRegistry, TypedDescriptor,
};
pub use journal::{InjectedArgument, Journal, JournalEntry};
pub use marker::{default_markers, markers, Marker, MarkerSet};
pub use mock::{Invocation, MockBinding, MockProxy, MockSynthesis, RecordingMocks};
pub use registration::{DescriptorFactory, MockBindingFactory};
pub use strategy::{default_strategies, ConstructorSelection, InjectionStrategy};
pub use sweep::{sweep, SweepOperation, SweepReport};
pub use types::{Instance, TypeCategory, TypeKey};

/// Convenience macro for resolving a type from a container
#[macro_export]
macro_rules! resolve {
    ($container:expr, $ty:ty) => {
        $container.resolve::<$ty>()
    };
}
