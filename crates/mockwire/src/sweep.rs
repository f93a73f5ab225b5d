//! Bulk operations over fallback-synthesized proxies

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::container::{Container, Origin};
use crate::error::{MockError, ResolveError, ResolveResult};
use crate::fallback::SynthesisKind;
use crate::types::TypeKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepOperation {
    Reset,
    VerifyNoFurtherInteractions,
}

impl fmt::Display for SweepOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepOperation::Reset => f.write_str("reset"),
            SweepOperation::VerifyNoFurtherInteractions => f.write_str("verify"),
        }
    }
}

/// Proxies a sweep visited, in synthesis order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub operation: SweepOperation,
    pub visited: Vec<TypeKey>,
}

impl SweepReport {
    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}

/// Apply `operation` to every proxy the fallback synthesized in `container`.
///
/// Primitive defaults and explicit or built values are never touched. A
/// verify sweep stops at the first proxy with unverified calls.
pub fn sweep(container: &Container, operation: SweepOperation) -> ResolveResult<SweepReport> {
    let mocks = container.mocks();
    let mut visited = Vec::new();

    for (key, value) in container.enumerate_fallback_synthesized() {
        if container.origin_of(&key) != Some(Origin::Synthesized(SynthesisKind::Proxy)) {
            continue;
        }
        match operation {
            SweepOperation::Reset => mocks.reset(&value)?,
            SweepOperation::VerifyNoFurtherInteractions => mocks
                .verify_no_further_interactions(&value)
                .map_err(|err| match err {
                    MockError::UnexpectedInteractions { proxy, calls } => {
                        warn!("Unexpected interactions on {}: {}", proxy, calls.join(", "));
                        ResolveError::VerificationFailure {
                            type_name: key.short_name(),
                            proxy,
                            interactions: calls,
                        }
                    }
                    other => other.into(),
                })?,
        }
        visited.push(key);
    }

    debug!("Sweep {} visited {} proxies", operation, visited.len());
    Ok(SweepReport { operation, visited })
}
