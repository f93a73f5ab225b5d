//! Auto-mock fallback
//!
//! Produces a value for a type nobody registered: a zero-equivalent (or a
//! seeded placeholder) for primitives, a mock proxy for everything else.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MockError, ResolveError, ResolveResult};
use crate::mock::MockSynthesis;
use crate::types::{Instance, TypeCategory, TypeKey};

/// How unresolved primitives are filled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PrimitivePolicy {
    /// `0`, `0.0`, `false`, `'\0'`, empty text
    #[default]
    Zero,
    /// Seeded pseudo-random non-zero values, reproducible per seed
    Placeholder { seed: u64 },
}

/// What the fallback produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisKind {
    Primitive,
    Proxy,
}

struct Primitive {
    category: TypeCategory,
    zero: fn() -> Instance,
    placeholder: fn(&mut dyn RngCore) -> Instance,
    describe: fn(&(dyn Any + Send + Sync)) -> Option<String>,
}

fn debug_of<T: fmt::Debug + 'static>(value: &(dyn Any + Send + Sync)) -> Option<String> {
    value.downcast_ref::<T>().map(|v| format!("{:?}", v))
}

macro_rules! primitives {
    ($table:ident, $category:expr, [$($ty:ty),+], $zero:expr, |$rng:ident| $placeholder:expr) => {
        $(
            $table.insert(
                TypeId::of::<$ty>(),
                Primitive {
                    category: $category,
                    zero: || Arc::new({ let value: $ty = $zero; value }) as Instance,
                    placeholder: |$rng: &mut dyn RngCore| {
                        Arc::new({ let value: $ty = $placeholder; value }) as Instance
                    },
                    describe: debug_of::<$ty>,
                },
            );
        )+
    };
}

static PRIMITIVES: Lazy<HashMap<TypeId, Primitive>> = Lazy::new(|| {
    let mut table = HashMap::new();
    primitives!(table, TypeCategory::Integer, [i8, i16, i32, i64, i128, isize], 0,
        |rng| rng.gen_range(1..=i8::MAX).into());
    primitives!(table, TypeCategory::Integer, [u8, u16, u32, u64, u128, usize], 0,
        |rng| rng.gen_range(1..=u8::MAX).into());
    primitives!(table, TypeCategory::Float, [f32, f64], 0.0,
        |rng| rng.gen_range(0.5f32..1.0).into());
    primitives!(table, TypeCategory::Boolean, [bool], false, |_rng| true);
    primitives!(table, TypeCategory::Character, [char], '\0',
        |rng| rng.gen_range('a'..='z'));
    primitives!(table, TypeCategory::Text, [String], String::new(),
        |rng| format!("random:{}", rng.gen::<u32>()));
    primitives!(table, TypeCategory::Text, [Arc<str>, Box<str>], "".into(),
        |rng| format!("random:{}", rng.gen::<u32>()).into());
    primitives!(table, TypeCategory::Text, [&'static str], "", |rng| {
        const PLACEHOLDERS: [&str; 4] = ["random:alpha", "random:bravo", "random:charlie", "random:delta"];
        PLACEHOLDERS[rng.gen_range(0..PLACEHOLDERS.len())]
    });
    table
});

pub(crate) fn category_of(ty: &TypeKey) -> TypeCategory {
    PRIMITIVES
        .get(&ty.id())
        .map(|p| p.category)
        .unwrap_or(TypeCategory::Object)
}

/// Journal rendering of a primitive value, `None` for anything else
pub(crate) fn describe_primitive(ty: &TypeKey, value: &Instance) -> Option<String> {
    PRIMITIVES
        .get(&ty.id())
        .and_then(|p| (p.describe)(&**value))
}

/// Fallback invoked by the container for unregistered types
pub struct AutoMockFallback {
    mocks: Arc<dyn MockSynthesis>,
    policy: PrimitivePolicy,
    rng: Option<StdRng>,
}

impl AutoMockFallback {
    pub fn new(mocks: Arc<dyn MockSynthesis>) -> Self {
        Self::with_policy(mocks, PrimitivePolicy::Zero)
    }

    pub fn with_policy(mocks: Arc<dyn MockSynthesis>, policy: PrimitivePolicy) -> Self {
        let rng = match policy {
            PrimitivePolicy::Zero => None,
            PrimitivePolicy::Placeholder { seed } => Some(StdRng::seed_from_u64(seed)),
        };
        Self { mocks, policy, rng }
    }

    pub fn policy(&self) -> PrimitivePolicy {
        self.policy
    }

    pub fn mocks(&self) -> &Arc<dyn MockSynthesis> {
        &self.mocks
    }

    /// Produce a value for `ty`
    pub fn synthesize(&mut self, ty: &TypeKey) -> ResolveResult<(Instance, SynthesisKind)> {
        if let Some(primitive) = PRIMITIVES.get(&ty.id()) {
            let value = match self.rng.as_mut() {
                Some(rng) => (primitive.placeholder)(rng),
                None => (primitive.zero)(),
            };
            debug!("Synthesized primitive default for {}", ty);
            return Ok((value, SynthesisKind::Primitive));
        }

        match self.mocks.create(ty) {
            Ok(proxy) => {
                debug!("Synthesized mock proxy for {}", ty);
                Ok((proxy, SynthesisKind::Proxy))
            }
            Err(MockError::Unmockable { type_name }) => Err(ResolveError::UnresolvedDependency {
                type_name,
                reason: "no registration and the mock backend cannot proxy it".to_string(),
            }),
            Err(other) => Err(other.into()),
        }
    }
}

impl fmt::Debug for AutoMockFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoMockFallback")
            .field("policy", &self.policy)
            .finish()
    }
}
