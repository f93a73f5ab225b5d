//! Mock-synthesis capability
//!
//! The fallback asks a `MockSynthesis` backend for a stand-in whenever a
//! non-primitive type has no registration. `RecordingMocks` is the bundled
//! backend. It hands out `MockProxy` handles that record calls, and adapts
//! them to collaborator handle types through bindings:
//!
//! ```rust,ignore
//! trait Store: Send + Sync {
//!     fn add(&self, item: &str) -> bool;
//! }
//!
//! impl Store for MockProxy {
//!     fn add(&self, item: &str) -> bool {
//!         self.invoke("add", &[&item])
//!     }
//! }
//!
//! let mocks = RecordingMocks::new().bind::<Arc<dyn Store>, _>(|proxy| proxy as Arc<dyn Store>);
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace};

use crate::error::{MockError, MockResult};
use crate::types::{Instance, TypeKey};

/// Mock-synthesis backend consumed by the fallback and by sweeps
pub trait MockSynthesis: Send + Sync {
    /// Produce a proxy usable as a value of `ty`
    fn create(&self, ty: &TypeKey) -> MockResult<Instance>;

    /// Forget recorded calls and stubs
    fn reset(&self, proxy: &Instance) -> MockResult<()>;

    /// Fail if the proxy received calls that were never verified
    fn verify_no_further_interactions(&self, proxy: &Instance) -> MockResult<()>;

    fn is_proxy(&self, value: &Instance) -> bool;

    /// Journal description of a proxy
    #[allow(unused_variables)]
    fn describe(&self, proxy: &Instance) -> Option<String> {
        None
    }
}

/// One recorded call on a proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub method: String,
    pub arguments: Vec<String>,
    pub verified: bool,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.method, self.arguments.join(", "))
    }
}

/// Invocation-recording stand-in for a collaborator
pub struct MockProxy {
    id: u64,
    mocked: TypeKey,
    invocations: Mutex<Vec<Invocation>>,
    stubs: Mutex<HashMap<String, Instance>>,
}

impl MockProxy {
    pub fn new(id: u64, mocked: TypeKey) -> Self {
        Self {
            id,
            mocked,
            invocations: Mutex::new(Vec::new()),
            stubs: Mutex::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The type this proxy stands in for
    pub fn mocked_type(&self) -> TypeKey {
        self.mocked
    }

    /// Record a call and produce its return value.
    ///
    /// Returns the stubbed value for `method` when one was programmed and
    /// `R::default()` otherwise.
    pub fn invoke<R>(&self, method: &str, arguments: &[&dyn fmt::Debug]) -> R
    where
        R: Default + Clone + Send + Sync + 'static,
    {
        let arguments = arguments.iter().map(|arg| format!("{:?}", arg)).collect();
        self.invocations.lock().push(Invocation {
            method: method.to_string(),
            arguments,
            verified: false,
        });
        trace!("{} received {}", self, method);

        self.stubs
            .lock()
            .get(method)
            .and_then(|value| value.downcast_ref::<R>().cloned())
            .unwrap_or_default()
    }

    /// Program the value returned by every later call to `method`
    pub fn stub<R: Send + Sync + 'static>(&self, method: &str, value: R) {
        self.stubs
            .lock()
            .insert(method.to_string(), Arc::new(value) as Instance);
    }

    /// Mark every call to `method` as accounted for; returns how many there were
    pub fn verify(&self, method: &str) -> usize {
        let mut invocations = self.invocations.lock();
        let mut count = 0;
        for invocation in invocations.iter_mut().filter(|i| i.method == method) {
            invocation.verified = true;
            count += 1;
        }
        count
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }

    pub fn unverified(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .iter()
            .filter(|i| !i.verified)
            .cloned()
            .collect()
    }

    pub fn reset(&self) {
        self.invocations.lock().clear();
        self.stubs.lock().clear();
    }
}

impl fmt::Display for MockProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mock[{}]#{}", self.mocked, self.id)
    }
}

impl fmt::Debug for MockProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProxy")
            .field("id", &self.id)
            .field("mocked", &self.mocked)
            .field("invocations", &self.invocations.lock().len())
            .finish()
    }
}

type BindFn = dyn Fn(Arc<MockProxy>) -> Instance + Send + Sync;

/// Adapter presenting a proxy as a value of one handle type
#[derive(Clone)]
pub struct MockBinding {
    key: TypeKey,
    bind: Arc<BindFn>,
}

impl MockBinding {
    pub fn new<T, F>(bind: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<MockProxy>) -> T + Send + Sync + 'static,
    {
        Self {
            key: TypeKey::of::<T>(),
            bind: Arc::new(move |proxy| Arc::new(bind(proxy)) as Instance),
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }
}

impl fmt::Debug for MockBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MockBinding").field(&self.key).finish()
    }
}

/// Address of the value behind an instance, used to find its proxy
fn address_of(value: &Instance) -> usize {
    Arc::as_ptr(value) as *const () as usize
}

/// Bundled mock backend
#[derive(Default)]
pub struct RecordingMocks {
    bindings: RwLock<HashMap<TypeKey, Arc<BindFn>>>,
    // weak so a dropped container releases its proxies; dead entries are
    // pruned on the next create, and an address is only trusted while live
    proxies: RwLock<HashMap<usize, (Weak<dyn Any + Send + Sync>, Arc<MockProxy>)>>,
    next_id: AtomicU64,
}

impl RecordingMocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with every binding submitted via `inventory`
    pub fn discover() -> Self {
        let mocks = Self::new();
        for binding in crate::registration::collect_all_bindings() {
            mocks.add_binding(binding);
        }
        info!("Mock backend discovered {} bindings", mocks.binding_count());
        mocks
    }

    /// Teach the backend to present a proxy as a `T`
    pub fn bind<T, F>(self, bind: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<MockProxy>) -> T + Send + Sync + 'static,
    {
        self.add_binding(MockBinding::new::<T, F>(bind));
        self
    }

    pub fn add_binding(&self, binding: MockBinding) {
        debug!("Registered mock binding: {}", binding.key);
        self.bindings.write().insert(binding.key, binding.bind);
    }

    pub fn is_bound(&self, ty: &TypeKey) -> bool {
        self.bindings.read().contains_key(ty)
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.read().len()
    }

    /// Proxy behind a value created by this backend
    pub fn proxy_of(&self, value: &Instance) -> Option<Arc<MockProxy>> {
        self.proxies
            .read()
            .get(&address_of(value))
            .filter(|(handle, _)| handle.strong_count() > 0)
            .map(|(_, proxy)| Arc::clone(proxy))
    }

    /// Number of proxies whose values are still alive
    pub fn proxy_count(&self) -> usize {
        self.proxies
            .read()
            .values()
            .filter(|(handle, _)| handle.strong_count() > 0)
            .count()
    }

    fn require_proxy(&self, value: &Instance) -> MockResult<Arc<MockProxy>> {
        self.proxy_of(value).ok_or(MockError::NotAProxy)
    }
}

impl MockSynthesis for RecordingMocks {
    fn create(&self, ty: &TypeKey) -> MockResult<Instance> {
        let bind = self
            .bindings
            .read()
            .get(ty)
            .cloned()
            .ok_or_else(|| MockError::Unmockable {
                type_name: ty.short_name(),
            })?;

        let proxy = Arc::new(MockProxy::new(
            self.next_id.fetch_add(1, Ordering::SeqCst),
            *ty,
        ));
        let instance = bind(Arc::clone(&proxy));
        debug!("Created {}", proxy);
        let mut proxies = self.proxies.write();
        proxies.retain(|_, (handle, _)| handle.strong_count() > 0);
        proxies.insert(address_of(&instance), (Arc::downgrade(&instance), proxy));
        drop(proxies);
        Ok(instance)
    }

    fn reset(&self, proxy: &Instance) -> MockResult<()> {
        self.require_proxy(proxy)?.reset();
        Ok(())
    }

    fn verify_no_further_interactions(&self, proxy: &Instance) -> MockResult<()> {
        let proxy = self.require_proxy(proxy)?;
        let unverified = proxy.unverified();
        if unverified.is_empty() {
            Ok(())
        } else {
            Err(MockError::UnexpectedInteractions {
                proxy: proxy.to_string(),
                calls: unverified.iter().map(ToString::to_string).collect(),
            })
        }
    }

    fn is_proxy(&self, value: &Instance) -> bool {
        self.proxy_of(value).is_some()
    }

    fn describe(&self, proxy: &Instance) -> Option<String> {
        self.proxy_of(proxy).map(|proxy| proxy.to_string())
    }
}
