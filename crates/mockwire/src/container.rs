//! The component container
//!
//! A `Container` caches one value per type. Values are supplied explicitly,
//! built on demand from a pending registration, or synthesized by the
//! auto-mock fallback the first time nobody can provide them. Every value is
//! shared: once a type is cached, each later request returns the same `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::config::{ConfigError, EngineConfig};
use crate::error::{ResolveError, ResolveResult};
use crate::fallback::{describe_primitive, AutoMockFallback, PrimitivePolicy, SynthesisKind};
use crate::introspect::{Introspection, TypeRegistry};
use crate::journal::Journal;
use crate::mock::{MockSynthesis, RecordingMocks};
use crate::strategy::{self, default_strategies, ConstructorSelection, InjectionStrategy};
use crate::sweep::{sweep, SweepOperation, SweepReport};
use crate::types::{Instance, TypeKey};

/// Where a cached value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Supplied by the caller
    Explicit,
    /// Built by the container from a pending registration
    Built,
    /// Produced by the auto-mock fallback
    Synthesized(SynthesisKind),
}

enum Component {
    Pending,
    Resolved { value: Instance, origin: Origin },
}

/// Type-keyed component cache and resolution engine
pub struct Container {
    components: HashMap<TypeKey, Component>,
    synthesized: Vec<TypeKey>,
    strategies: Vec<InjectionStrategy>,
    selection: ConstructorSelection,
    introspection: Arc<dyn Introspection>,
    fallback: AutoMockFallback,
    journal: Journal,
}

fn same_value(a: &Instance, b: &Instance) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

impl Container {
    /// Create an empty container with the default strategies
    pub fn new(introspection: Arc<dyn Introspection>, mocks: Arc<dyn MockSynthesis>) -> Self {
        Self {
            components: HashMap::new(),
            synthesized: Vec::new(),
            strategies: default_strategies(),
            selection: ConstructorSelection::default(),
            introspection,
            fallback: AutoMockFallback::new(mocks),
            journal: Journal::new(),
        }
    }

    /// Container backed by every descriptor and binding submitted via `inventory`
    pub fn discover() -> Self {
        Self::new(
            Arc::new(TypeRegistry::discover()),
            Arc::new(RecordingMocks::discover()),
        )
    }

    /// Container configured from an `EngineConfig`
    pub fn from_config(
        introspection: Arc<dyn Introspection>,
        mocks: Arc<dyn MockSynthesis>,
        config: &EngineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut container = Self::new(introspection, mocks);
        container.set_strategies(config.to_strategies());
        container.set_constructor_selection(config.constructor_selection);
        container.set_primitive_policy(config.primitives.policy());
        Ok(container)
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Bind an explicit value for `T`
    pub fn register_instance<T: Send + Sync + 'static>(&mut self, value: T) -> ResolveResult<()> {
        self.register_shared(Arc::new(value))
    }

    /// Bind an already shared value for `T`, keeping its identity
    pub fn register_shared<T: Send + Sync + 'static>(&mut self, value: Arc<T>) -> ResolveResult<()> {
        self.register_component(TypeKey::of::<T>(), value)
    }

    /// Bind an explicit type-erased value under `key`.
    ///
    /// Rebinding the identical value is a no-op and a pending registration is
    /// replaced. Anything else already cached under `key` is a conflict.
    pub fn register_component(&mut self, key: TypeKey, value: Instance) -> ResolveResult<()> {
        match self.components.get(&key) {
            None | Some(Component::Pending) => {}
            Some(Component::Resolved {
                value: existing,
                origin: Origin::Explicit,
            }) => {
                if same_value(existing, &value) {
                    return Ok(());
                }
                return Err(ResolveError::ConfigurationConflict {
                    type_name: key.short_name(),
                    reason: "already bound to a different explicit instance".to_string(),
                });
            }
            Some(Component::Resolved { origin, .. }) => {
                return Err(ResolveError::ConfigurationConflict {
                    type_name: key.short_name(),
                    reason: format!("already resolved ({:?}) and possibly shared", origin),
                });
            }
        }

        debug!("Registered instance: {}", key);
        self.components.insert(
            key,
            Component::Resolved {
                value,
                origin: Origin::Explicit,
            },
        );
        Ok(())
    }

    /// Mark `T` as buildable on first request
    pub fn register_type<T: Send + Sync + 'static>(&mut self) {
        self.register_key(TypeKey::of::<T>());
    }

    /// Mark `key` as buildable on first request; no-op when already registered
    pub fn register_key(&mut self, key: TypeKey) {
        if self.components.contains_key(&key) {
            trace!("Type already registered: {}", key);
            return;
        }
        debug!("Registered type: {}", key);
        self.components.insert(key, Component::Pending);
    }

    /// Resolve `T`, building or synthesizing it when needed
    pub fn resolve<T: Send + Sync + 'static>(&mut self) -> ResolveResult<Arc<T>> {
        let key = TypeKey::of::<T>();
        self.resolve_key(&key)?
            .downcast::<T>()
            .map_err(|_| ResolveError::TypeMismatch {
                type_name: key.short_name(),
            })
    }

    /// Resolve the value cached under `key`.
    ///
    /// Order: cached value, then a pending build (constructor followed by the
    /// member strategies), then the auto-mock fallback. Parameters resolve
    /// depth-first before the owning constructor runs.
    ///
    /// Dependency cycles are not detected. A type that transitively requires
    /// itself recurses until the stack is exhausted.
    pub fn resolve_key(&mut self, key: &TypeKey) -> ResolveResult<Instance> {
        match self.components.get(key) {
            Some(Component::Resolved { value, .. }) => {
                trace!("Cache hit: {}", key);
                return Ok(Arc::clone(value));
            }
            Some(Component::Pending) => return self.build(key),
            None => {}
        }

        let (value, kind) = self.fallback.synthesize(key)?;
        self.components.insert(
            *key,
            Component::Resolved {
                value: Arc::clone(&value),
                origin: Origin::Synthesized(kind),
            },
        );
        self.synthesized.push(*key);
        Ok(value)
    }

    fn build(&mut self, key: &TypeKey) -> ResolveResult<Instance> {
        debug!("Building {}", key);
        let mut built = strategy::construct(self, key)?;
        strategy::inject_members(self, key, &mut *built)?;

        let value: Instance = Arc::from(built);
        self.components.insert(
            *key,
            Component::Resolved {
                value: Arc::clone(&value),
                origin: Origin::Built,
            },
        );
        info!("Built {}", key);
        Ok(value)
    }

    /// Every fallback-synthesized value, in synthesis order
    pub fn enumerate_fallback_synthesized(&self) -> Vec<(TypeKey, Instance)> {
        self.synthesized
            .iter()
            .filter_map(|key| self.cached(key).map(|value| (*key, value)))
            .collect()
    }

    pub fn cached(&self, key: &TypeKey) -> Option<Instance> {
        match self.components.get(key) {
            Some(Component::Resolved { value, .. }) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    pub fn origin_of(&self, key: &TypeKey) -> Option<Origin> {
        match self.components.get(key) {
            Some(Component::Resolved { origin, .. }) => Some(*origin),
            _ => None,
        }
    }

    /// True for any registration, pending or resolved
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.components.contains_key(key)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Human-readable description of a value, as written to the journal
    pub fn describe_value(&self, key: &TypeKey, value: &Instance) -> String {
        self.fallback
            .mocks()
            .describe(value)
            .or_else(|| describe_primitive(key, value))
            .or_else(|| self.introspection.describe(key, value))
            .unwrap_or_else(|| format!("{}@{:p}", key, Arc::as_ptr(value)))
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Redirect subsequent entries to `journal`
    pub fn set_journal(&mut self, journal: Journal) {
        self.journal = journal;
    }

    pub fn strategies(&self) -> &[InjectionStrategy] {
        &self.strategies
    }

    pub fn set_strategies(&mut self, strategies: Vec<InjectionStrategy>) {
        debug!(
            "Strategies: {}",
            strategies
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.strategies = strategies;
    }

    pub fn constructor_selection(&self) -> ConstructorSelection {
        self.selection
    }

    pub fn set_constructor_selection(&mut self, selection: ConstructorSelection) {
        self.selection = selection;
    }

    pub fn primitive_policy(&self) -> PrimitivePolicy {
        self.fallback.policy()
    }

    /// Replace the primitive policy; restarts the placeholder sequence
    pub fn set_primitive_policy(&mut self, policy: PrimitivePolicy) {
        self.fallback = AutoMockFallback::with_policy(Arc::clone(self.fallback.mocks()), policy);
    }

    pub fn introspection(&self) -> &Arc<dyn Introspection> {
        &self.introspection
    }

    pub fn mocks(&self) -> &Arc<dyn MockSynthesis> {
        self.fallback.mocks()
    }

    /// Forget recorded calls on every synthesized proxy
    pub fn reset_all(&self) -> ResolveResult<SweepReport> {
        sweep(self, SweepOperation::Reset)
    }

    /// Fail on the first synthesized proxy with unverified calls
    pub fn verify_no_more_interactions_for_all(&self) -> ResolveResult<SweepReport> {
        sweep(self, SweepOperation::VerifyNoFurtherInteractions)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("components", &self.components.len())
            .field("synthesized", &self.synthesized)
            .field("strategies", &self.strategies)
            .field("selection", &self.selection)
            .field("fallback", &self.fallback)
            .field("journal", &self.journal)
            .finish()
    }
}

/// Step-wise configuration of a `Container`
#[derive(Default)]
pub struct ContainerBuilder {
    introspection: Option<Arc<dyn Introspection>>,
    mocks: Option<Arc<dyn MockSynthesis>>,
    strategies: Option<Vec<InjectionStrategy>>,
    selection: ConstructorSelection,
    policy: PrimitivePolicy,
    journal: Option<Journal>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn introspection(mut self, introspection: Arc<dyn Introspection>) -> Self {
        self.introspection = Some(introspection);
        self
    }

    pub fn mocks(mut self, mocks: Arc<dyn MockSynthesis>) -> Self {
        self.mocks = Some(mocks);
        self
    }

    pub fn strategies(mut self, strategies: Vec<InjectionStrategy>) -> Self {
        self.strategies = Some(strategies);
        self
    }

    pub fn constructor_selection(mut self, selection: ConstructorSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn primitive_policy(mut self, policy: PrimitivePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Build the container; missing backends are discovered via `inventory`
    pub fn build(self) -> Container {
        let introspection = self
            .introspection
            .unwrap_or_else(|| Arc::new(TypeRegistry::discover()) as Arc<dyn Introspection>);
        let mocks = self
            .mocks
            .unwrap_or_else(|| Arc::new(RecordingMocks::discover()) as Arc<dyn MockSynthesis>);

        let mut container = Container::new(introspection, mocks);
        if let Some(strategies) = self.strategies {
            container.set_strategies(strategies);
        }
        container.set_constructor_selection(self.selection);
        if self.policy != PrimitivePolicy::Zero {
            container.set_primitive_policy(self.policy);
        }
        if let Some(journal) = self.journal {
            container.set_journal(journal);
        }
        container
    }
}
