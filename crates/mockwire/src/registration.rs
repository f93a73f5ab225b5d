//! Auto-discovery of type descriptors and mock bindings using the inventory crate
//!
//! Any linked crate can describe its types, or teach the mock backend a new
//! collaborator handle, with `inventory::submit!`. `Container::discover()`
//! collects every submission at runtime.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mockwire::registration::{DescriptorFactory, MockBindingFactory};
//! use mockwire::{params, MockBinding, MockProxy, TypeDescriptor};
//! use std::sync::Arc;
//!
//! inventory::submit! {
//!     DescriptorFactory::new("checkout", || {
//!         TypeDescriptor::of::<Checkout>()
//!             .constructor(params![Arc<dyn Payments>], |args| {
//!                 Ok(Checkout::new(args.cloned(0)?))
//!             })
//!             .build()
//!     })
//! }
//!
//! inventory::submit! {
//!     MockBindingFactory::new("payments", || {
//!         MockBinding::new(|proxy: Arc<MockProxy>| proxy as Arc<dyn Payments>)
//!     })
//! }
//! ```

use tracing::{debug, info};

use crate::introspect::TypeDescriptor;
use crate::mock::MockBinding;

/// A type descriptor submission collected via inventory
pub struct DescriptorFactory {
    /// Name used in diagnostics
    pub name: &'static str,

    /// Produces the descriptor
    pub factory_fn: fn() -> TypeDescriptor,
}

impl DescriptorFactory {
    pub const fn new(name: &'static str, factory_fn: fn() -> TypeDescriptor) -> Self {
        Self { name, factory_fn }
    }
}

/// A mock binding submission collected via inventory
pub struct MockBindingFactory {
    /// Name used in diagnostics
    pub name: &'static str,

    /// Produces the binding
    pub factory_fn: fn() -> MockBinding,
}

impl MockBindingFactory {
    pub const fn new(name: &'static str, factory_fn: fn() -> MockBinding) -> Self {
        Self { name, factory_fn }
    }
}

inventory::collect!(DescriptorFactory);
inventory::collect!(MockBindingFactory);

/// Run every submitted descriptor factory.
///
/// Factories run in name order so that a later submission for the same type
/// deterministically replaces an earlier one.
pub fn collect_all_descriptors() -> Vec<TypeDescriptor> {
    let mut factories: Vec<&DescriptorFactory> = inventory::iter::<DescriptorFactory>().collect();
    factories.sort_by_key(|f| f.name);

    info!("Discovered {} descriptor factories via inventory", factories.len());

    factories
        .into_iter()
        .map(|factory| {
            debug!("Collecting descriptor from '{}'", factory.name);
            (factory.factory_fn)()
        })
        .collect()
}

/// Run every submitted mock binding factory, in name order
pub fn collect_all_bindings() -> Vec<MockBinding> {
    let mut factories: Vec<&MockBindingFactory> = inventory::iter::<MockBindingFactory>().collect();
    factories.sort_by_key(|f| f.name);

    info!("Discovered {} mock binding factories via inventory", factories.len());

    factories
        .into_iter()
        .map(|factory| {
            debug!("Collecting mock binding from '{}'", factory.name);
            (factory.factory_fn)()
        })
        .collect()
}

/// Names of all discovered descriptor factories.
///
/// Useful for debugging and diagnostics.
pub fn list_discovered_descriptors() -> Vec<&'static str> {
    inventory::iter::<DescriptorFactory>()
        .map(|f| f.name)
        .collect()
}

/// Names of all discovered mock binding factories
pub fn list_discovered_bindings() -> Vec<&'static str> {
    inventory::iter::<MockBindingFactory>()
        .map(|f| f.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::introspect::{Introspection, TypeRegistry};
    use crate::mock::{MockProxy, MockSynthesis, RecordingMocks};
    use crate::types::TypeKey;

    struct Thermostat {
        target: u8,
    }

    trait Sensor: Send + Sync {
        fn read(&self) -> f32;
    }

    impl Sensor for MockProxy {
        fn read(&self) -> f32 {
            self.invoke("read", &[])
        }
    }

    // Collected by inventory
    inventory::submit! {
        DescriptorFactory::new("test_thermostat", || {
            TypeDescriptor::of::<Thermostat>()
                .constructor(crate::params![u8], |args| {
                    Ok(Thermostat { target: *args.get::<u8>(0)? })
                })
                .build()
        })
    }

    inventory::submit! {
        MockBindingFactory::new("test_sensor", || {
            MockBinding::new(|proxy: Arc<MockProxy>| proxy as Arc<dyn Sensor>)
        })
    }

    #[test]
    fn test_discovered_descriptors_include_test() {
        let names = list_discovered_descriptors();
        assert!(
            names.contains(&"test_thermostat"),
            "Should discover test_thermostat descriptor"
        );
        assert!(collect_all_descriptors()
            .iter()
            .any(|d| d.key() == TypeKey::of::<Thermostat>()));
    }

    #[test]
    fn test_discovered_bindings_include_test() {
        assert!(list_discovered_bindings().contains(&"test_sensor"));
        assert!(collect_all_bindings()
            .iter()
            .any(|b| b.key() == TypeKey::of::<Arc<dyn Sensor>>()));
    }

    #[test]
    fn test_discovered_backends_are_usable() {
        let registry = TypeRegistry::discover();
        let constructors = registry.constructors_of(&TypeKey::of::<Thermostat>());
        assert_eq!(constructors.len(), 1);

        let mocks = RecordingMocks::discover();
        let sensor = mocks.create(&TypeKey::of::<Arc<dyn Sensor>>()).unwrap();
        let sensor = sensor.downcast::<Arc<dyn Sensor>>().unwrap();
        assert_eq!(sensor.read(), 0.0);

        let built = constructors[0]
            .invoke(&crate::introspect::Args::new(vec![Arc::new(21u8) as crate::types::Instance]))
            .unwrap();
        assert_eq!(built.downcast::<Thermostat>().unwrap().target, 21);
    }
}
