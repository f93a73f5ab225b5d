//! Builder façade
//!
//! `MockDeps` collects what a test wants wired and hands it to a container in
//! one go:
//!
//! ```rust,ignore
//! let wired = MockDeps::<Checkout>::new()
//!     .using(container)
//!     .with_instance(Arc::new(FixedClock) as Arc<dyn Clock>)
//!     .with_setters()
//!     .build()?;
//!
//! wired.subject().pay(10);
//! wired.verify_no_more_interactions_for_all()?;
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::info;

use crate::container::Container;
use crate::error::ResolveResult;
use crate::journal::Journal;
use crate::marker::MarkerSet;
use crate::strategy::InjectionStrategy;
use crate::sweep::{sweep, SweepOperation, SweepReport};
use crate::types::{Instance, TypeKey};

/// Wiring request for a subject of type `T`
pub struct MockDeps<T> {
    container: Option<Container>,
    strategies: Option<Vec<InjectionStrategy>>,
    markers: Option<MarkerSet>,
    instances: Vec<(TypeKey, Instance)>,
    types: Vec<TypeKey>,
    journal: Option<Journal>,
    _subject: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> MockDeps<T> {
    pub fn new() -> Self {
        Self {
            container: None,
            strategies: None,
            markers: None,
            instances: Vec::new(),
            types: Vec::new(),
            journal: None,
            _subject: PhantomData,
        }
    }

    /// Build inside `container` instead of a discovered one
    pub fn using(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    /// Replace the strategy list
    pub fn with_strategies(mut self, strategies: Vec<InjectionStrategy>) -> Self {
        self.strategies = Some(strategies);
        self
    }

    /// Constructor plus setter injection only; marked members are left alone
    pub fn with_setters(mut self) -> Self {
        self.strategies = Some(vec![InjectionStrategy::Constructor, InjectionStrategy::Setters]);
        self
    }

    /// Markers recognized by the field and method strategies
    pub fn with_injection_types(mut self, markers: MarkerSet) -> Self {
        self.markers = Some(markers);
        self
    }

    /// Supply an explicit value for `V`
    pub fn with_instance<V: Send + Sync + 'static>(self, value: V) -> Self {
        self.with_shared(Arc::new(value))
    }

    /// Supply an explicit shared value for `V`, keeping its identity
    pub fn with_shared<V: Send + Sync + 'static>(mut self, value: Arc<V>) -> Self {
        self.instances.push((TypeKey::of::<V>(), value as Instance));
        self
    }

    /// Build `V` from its descriptor instead of mocking it
    pub fn with_type<V: Send + Sync + 'static>(mut self) -> Self {
        self.types.push(TypeKey::of::<V>());
        self
    }

    /// Record injections into `journal` instead of the container's own
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Register everything in the container and resolve the subject
    pub fn build(self) -> ResolveResult<Wired<T>> {
        let mut container = self.container.unwrap_or_else(Container::discover);

        let mut strategies = self
            .strategies
            .unwrap_or_else(|| container.strategies().to_vec());
        if let Some(markers) = self.markers {
            for strategy in strategies.iter_mut() {
                if let InjectionStrategy::MarkedField(set) | InjectionStrategy::MarkedMethod(set) = strategy {
                    *set = markers.clone();
                }
            }
        }
        container.set_strategies(strategies);

        if let Some(journal) = self.journal {
            container.set_journal(journal);
        }
        let journal = container.journal().clone();

        for (key, value) in self.instances {
            container.register_component(key, value)?;
        }
        for key in self.types {
            container.register_key(key);
        }
        container.register_type::<T>();

        let subject = container.resolve::<T>()?;
        info!(
            "Wired {} with {} journal entries",
            TypeKey::of::<T>(),
            journal.len()
        );

        Ok(Wired {
            subject,
            container,
            journal,
        })
    }
}

impl<T: Send + Sync + 'static> Default for MockDeps<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for MockDeps<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDeps")
            .field("subject", &std::any::type_name::<T>())
            .field("strategies", &self.strategies)
            .field("markers", &self.markers)
            .field("instances", &self.instances.len())
            .field("types", &self.types)
            .finish()
    }
}

/// A built subject together with the container that wired it
pub struct Wired<T> {
    subject: Arc<T>,
    container: Container,
    journal: Journal,
}

impl<T: Send + Sync + 'static> Wired<T> {
    pub fn subject(&self) -> &Arc<T> {
        &self.subject
    }

    pub fn into_subject(self) -> Arc<T> {
        self.subject
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// The value the container shares for `V`, resolving it if needed
    pub fn collaborator<V: Send + Sync + 'static>(&mut self) -> ResolveResult<Arc<V>> {
        self.container.resolve::<V>()
    }

    pub fn sweep(&self, operation: SweepOperation) -> ResolveResult<SweepReport> {
        sweep(&self.container, operation)
    }

    pub fn reset_all(&self) -> ResolveResult<SweepReport> {
        self.container.reset_all()
    }

    pub fn verify_no_more_interactions_for_all(&self) -> ResolveResult<SweepReport> {
        self.container.verify_no_more_interactions_for_all()
    }

    pub fn into_parts(self) -> (Arc<T>, Container, Journal) {
        (self.subject, self.container, self.journal)
    }
}

impl<T> fmt::Debug for Wired<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wired")
            .field("subject", &std::any::type_name::<T>())
            .field("container", &self.container)
            .finish()
    }
}
