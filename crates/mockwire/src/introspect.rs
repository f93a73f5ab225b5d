//! Introspection capability
//!
//! The container never inspects Rust types itself. It asks an `Introspection`
//! backend for the constructors, fields and methods of a type, each carrying
//! the declared types of its injection points and a closure that performs the
//! construction, assignment or call on type-erased values.
//!
//! `TypeRegistry` is the bundled backend: a map of `TypeDescriptor`s written
//! by hand or submitted through [`crate::registration`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::InvocationError;
use crate::marker::{Marker, MarkerSet};
use crate::types::{Instance, TypeKey};

/// Owned, not yet shared, instance under construction
pub type Built = Box<dyn Any + Send + Sync>;

type ConstructFn = dyn Fn(&Args) -> Result<Built, InvocationError> + Send + Sync;
type SetFn = dyn Fn(&mut (dyn Any + Send + Sync), Instance) -> Result<(), InvocationError> + Send + Sync;
type InvokeFn = dyn Fn(&mut (dyn Any + Send + Sync), &Args) -> Result<(), InvocationError> + Send + Sync;
type DescribeFn = dyn Fn(&(dyn Any + Send + Sync)) -> Option<String> + Send + Sync;

/// Resolved argument values handed to constructor and method closures
pub struct Args {
    values: Vec<Instance>,
}

impl Args {
    pub fn new(values: Vec<Instance>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value at `index`
    pub fn raw(&self, index: usize) -> Result<&Instance, InvocationError> {
        self.values
            .get(index)
            .ok_or(InvocationError::MissingArgument { index })
    }

    /// Shared value at `index`, keeping its identity
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>, InvocationError> {
        self.raw(index)?
            .clone()
            .downcast::<T>()
            .map_err(|_| InvocationError::ArgumentType {
                index,
                expected: std::any::type_name::<T>(),
            })
    }

    /// Clone of the value at `index`; for `Arc<dyn Trait>` handles this
    /// yields the handle itself
    pub fn cloned<T: Clone + Send + Sync + 'static>(&self, index: usize) -> Result<T, InvocationError> {
        self.get::<T>(index).map(|value| (*value).clone())
    }
}

/// A constructor and the declared types of its parameters
#[derive(Clone)]
pub struct ConstructorInfo {
    parameters: Vec<TypeKey>,
    construct: Arc<ConstructFn>,
}

impl ConstructorInfo {
    pub fn parameters(&self) -> &[TypeKey] {
        &self.parameters
    }

    pub fn invoke(&self, args: &Args) -> Result<Built, InvocationError> {
        (self.construct)(args)
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// An injectable field
#[derive(Clone)]
pub struct FieldInfo {
    name: &'static str,
    declared: TypeKey,
    markers: MarkerSet,
    set: Arc<SetFn>,
}

impl FieldInfo {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declared_type(&self) -> TypeKey {
        self.declared
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    pub fn set(&self, target: &mut (dyn Any + Send + Sync), value: Instance) -> Result<(), InvocationError> {
        (self.set)(target, value)
    }
}

impl fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("markers", &self.markers)
            .finish()
    }
}

/// A method and the declared types of its parameters
#[derive(Clone)]
pub struct MethodInfo {
    name: &'static str,
    parameters: Vec<TypeKey>,
    markers: MarkerSet,
    invoke: Arc<InvokeFn>,
}

impl MethodInfo {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parameters(&self) -> &[TypeKey] {
        &self.parameters
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// Single-parameter method whose name starts with `set`
    pub fn is_setter(&self) -> bool {
        self.name.starts_with("set") && self.parameters.len() == 1
    }

    pub fn invoke(&self, target: &mut (dyn Any + Send + Sync), args: &Args) -> Result<(), InvocationError> {
        (self.invoke)(target, args)
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("markers", &self.markers)
            .finish()
    }
}

/// A member that may carry markers
#[derive(Debug, Clone, Copy)]
pub enum Member<'a> {
    Field(&'a FieldInfo),
    Method(&'a MethodInfo),
}

impl Member<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Member::Field(field) => field.name(),
            Member::Method(method) => method.name(),
        }
    }

    pub fn markers(&self) -> &MarkerSet {
        match self {
            Member::Field(field) => field.markers(),
            Member::Method(method) => method.markers(),
        }
    }
}

/// Source of structural information about injectable types
pub trait Introspection: Send + Sync {
    /// Constructors in declaration order
    fn constructors_of(&self, ty: &TypeKey) -> Vec<ConstructorInfo>;

    /// Fields in declaration order
    fn fields_of(&self, ty: &TypeKey) -> Vec<FieldInfo>;

    /// Methods in declaration order
    fn methods_of(&self, ty: &TypeKey) -> Vec<MethodInfo>;

    fn has_marker(&self, member: &Member<'_>, marker: &Marker) -> bool {
        member.markers().contains(marker)
    }

    /// Journal description of a value of type `ty`, if the backend knows one
    #[allow(unused_variables)]
    fn describe(&self, ty: &TypeKey, value: &Instance) -> Option<String> {
        None
    }
}

/// Everything the container needs to know about one type
#[derive(Clone)]
pub struct TypeDescriptor {
    key: TypeKey,
    constructors: Vec<ConstructorInfo>,
    fields: Vec<FieldInfo>,
    methods: Vec<MethodInfo>,
    describe: Option<Arc<DescribeFn>>,
}

impl TypeDescriptor {
    /// Start describing `T`
    pub fn of<T: Send + Sync + 'static>() -> TypedDescriptor<T> {
        TypedDescriptor {
            inner: TypeDescriptor {
                key: TypeKey::of::<T>(),
                constructors: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                describe: None,
            },
            _type: std::marker::PhantomData,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn constructors(&self) -> &[ConstructorInfo] {
        &self.constructors
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("constructors", &self.constructors.len())
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .finish()
    }
}

/// Typed step builder for a `TypeDescriptor`
pub struct TypedDescriptor<T> {
    inner: TypeDescriptor,
    _type: std::marker::PhantomData<fn() -> T>,
}

fn receiver<T: 'static>(target: &mut (dyn Any + Send + Sync)) -> Result<&mut T, InvocationError> {
    target
        .downcast_mut::<T>()
        .ok_or(InvocationError::ReceiverType {
            expected: std::any::type_name::<T>(),
        })
}

impl<T: Send + Sync + 'static> TypedDescriptor<T> {
    /// Add a constructor taking `parameters` in order
    pub fn constructor<F>(mut self, parameters: Vec<TypeKey>, construct: F) -> Self
    where
        F: Fn(&Args) -> Result<T, InvocationError> + Send + Sync + 'static,
    {
        self.inner.constructors.push(ConstructorInfo {
            parameters,
            construct: Arc::new(move |args: &Args| {
                construct(args).map(|value| Box::new(value) as Built)
            }),
        });
        self
    }

    /// Add a field of declared type `V`
    pub fn field<V, F>(mut self, name: &'static str, markers: MarkerSet, set: F) -> Self
    where
        V: Send + Sync + 'static,
        F: Fn(&mut T, Arc<V>) -> Result<(), InvocationError> + Send + Sync + 'static,
    {
        self.inner.fields.push(FieldInfo {
            name,
            declared: TypeKey::of::<V>(),
            markers,
            set: Arc::new(move |target: &mut (dyn Any + Send + Sync), value: Instance| {
                let value = value.downcast::<V>().map_err(|_| InvocationError::ArgumentType {
                    index: 0,
                    expected: std::any::type_name::<V>(),
                })?;
                set(receiver::<T>(target)?, value)
            }),
        });
        self
    }

    /// Add a method taking `parameters` in order
    pub fn method<F>(
        mut self,
        name: &'static str,
        parameters: Vec<TypeKey>,
        markers: MarkerSet,
        invoke: F,
    ) -> Self
    where
        F: Fn(&mut T, &Args) -> Result<(), InvocationError> + Send + Sync + 'static,
    {
        self.inner.methods.push(MethodInfo {
            name,
            parameters,
            markers,
            invoke: Arc::new(move |target: &mut (dyn Any + Send + Sync), args: &Args| {
                invoke(receiver::<T>(target)?, args)
            }),
        });
        self
    }

    /// How values of `T` appear in the journal
    pub fn describe_with<F>(mut self, describe: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.inner.describe = Some(Arc::new(move |value: &(dyn Any + Send + Sync)| {
            value.downcast_ref::<T>().map(&describe)
        }));
        self
    }

    pub fn build(self) -> TypeDescriptor {
        self.inner
    }
}

impl<T: Send + Sync + 'static> From<TypedDescriptor<T>> for TypeDescriptor {
    fn from(typed: TypedDescriptor<T>) -> Self {
        typed.build()
    }
}

/// Introspection backend holding registered descriptors
#[derive(Default)]
pub struct TypeRegistry {
    descriptors: RwLock<HashMap<TypeKey, TypeDescriptor>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry filled from every descriptor submitted via `inventory`
    pub fn discover() -> Self {
        let registry = Self::new();
        for descriptor in crate::registration::collect_all_descriptors() {
            registry.register(descriptor);
        }
        info!(
            "Type registry discovered {} descriptors",
            registry.descriptor_count()
        );
        registry
    }

    /// Add or replace the descriptor for its type
    pub fn register(&self, descriptor: impl Into<TypeDescriptor>) {
        let descriptor = descriptor.into();
        debug!("Registered descriptor: {}", descriptor.key);
        self.descriptors.write().insert(descriptor.key, descriptor);
    }

    /// Chaining form of [`TypeRegistry::register`]
    pub fn with(self, descriptor: impl Into<TypeDescriptor>) -> Self {
        self.register(descriptor);
        self
    }

    pub fn is_described(&self, ty: &TypeKey) -> bool {
        self.descriptors.read().contains_key(ty)
    }

    pub fn descriptor_count(&self) -> usize {
        self.descriptors.read().len()
    }

    fn with_descriptor<R>(&self, ty: &TypeKey, f: impl FnOnce(&TypeDescriptor) -> R) -> Option<R> {
        self.descriptors.read().get(ty).map(f)
    }
}

impl Introspection for TypeRegistry {
    fn constructors_of(&self, ty: &TypeKey) -> Vec<ConstructorInfo> {
        self.with_descriptor(ty, |d| d.constructors.clone())
            .unwrap_or_default()
    }

    fn fields_of(&self, ty: &TypeKey) -> Vec<FieldInfo> {
        self.with_descriptor(ty, |d| d.fields.clone())
            .unwrap_or_default()
    }

    fn methods_of(&self, ty: &TypeKey) -> Vec<MethodInfo> {
        self.with_descriptor(ty, |d| d.methods.clone())
            .unwrap_or_default()
    }

    fn describe(&self, ty: &TypeKey, value: &Instance) -> Option<String> {
        self.with_descriptor(ty, |d| d.describe.clone())
            .flatten()
            .and_then(|describe| describe(&**value))
    }
}

/// Declared parameter list, e.g. `params![Arc<dyn Store>, i32]`
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::TypeKey>::new()
    };
    ($($ty:ty),+ $(,)?) => {
        vec![$($crate::TypeKey::of::<$ty>()),+]
    };
}
