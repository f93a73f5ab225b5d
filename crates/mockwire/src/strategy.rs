//! Injection strategies
//!
//! A container carries an ordered list of strategies. The constructor
//! strategy decides how an instance comes into existence; the member
//! strategies run afterwards, in list order, against the freshly built value.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::container::Container;
use crate::error::{ResolveError, ResolveResult};
use crate::introspect::{Args, Built, ConstructorInfo, Introspection, Member};
use crate::journal::{InjectedArgument, JournalEntry};
use crate::marker::{default_markers, MarkerSet};
use crate::types::{Instance, TypeKey};

/// One way of injecting dependencies into a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectionStrategy {
    /// Resolve every parameter of the selected constructor
    Constructor,
    /// Set fields carrying any of the markers
    MarkedField(MarkerSet),
    /// Call methods carrying any of the markers
    MarkedMethod(MarkerSet),
    /// Call every single-parameter `set*` method
    Setters,
}

impl InjectionStrategy {
    pub fn is_constructor(&self) -> bool {
        matches!(self, InjectionStrategy::Constructor)
    }
}

impl fmt::Display for InjectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |markers: &MarkerSet| {
            markers
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join("|")
        };
        match self {
            InjectionStrategy::Constructor => f.write_str("constructor"),
            InjectionStrategy::MarkedField(markers) => write!(f, "field[{}]", join(markers)),
            InjectionStrategy::MarkedMethod(markers) => write!(f, "method[{}]", join(markers)),
            InjectionStrategy::Setters => f.write_str("setter"),
        }
    }
}

/// Constructor, marked fields, marked methods with `inject` and `autowired`
pub fn default_strategies() -> Vec<InjectionStrategy> {
    strategies_with_markers(default_markers())
}

/// The default strategy order using a custom marker set
pub fn strategies_with_markers(markers: MarkerSet) -> Vec<InjectionStrategy> {
    vec![
        InjectionStrategy::Constructor,
        InjectionStrategy::MarkedField(markers.clone()),
        InjectionStrategy::MarkedMethod(markers),
    ]
}

/// Which constructor to use when a type describes several
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructorSelection {
    /// Greediest constructor wins; ties go to the one declared first
    #[default]
    MostParameters,
    /// More than one eligible constructor is an error
    Strict,
}

/// Pick the constructor to invoke for `ty`.
///
/// With `constructor_injection` off only zero-parameter constructors are
/// eligible, since nothing would resolve their arguments.
pub fn select_constructor(
    ty: &TypeKey,
    candidates: &[ConstructorInfo],
    selection: ConstructorSelection,
    constructor_injection: bool,
) -> ResolveResult<ConstructorInfo> {
    let eligible: Vec<&ConstructorInfo> = candidates
        .iter()
        .filter(|c| constructor_injection || c.parameters().is_empty())
        .collect();

    if eligible.is_empty() {
        let reason = if candidates.is_empty() {
            "no constructor is described".to_string()
        } else {
            "constructor injection is disabled and no zero-parameter constructor exists".to_string()
        };
        return Err(ResolveError::UnresolvedDependency {
            type_name: ty.short_name(),
            reason,
        });
    }

    if selection == ConstructorSelection::Strict && eligible.len() > 1 {
        return Err(ResolveError::AmbiguousConstructor {
            type_name: ty.short_name(),
            candidates: eligible.len(),
        });
    }

    let mut chosen = eligible[0];
    for candidate in &eligible[1..] {
        if candidate.parameters().len() > chosen.parameters().len() {
            chosen = candidate;
        }
    }
    Ok(chosen.clone())
}

fn resolve_arguments(
    container: &mut Container,
    parameters: &[TypeKey],
) -> ResolveResult<(Args, Vec<InjectedArgument>)> {
    let mut values = Vec::with_capacity(parameters.len());
    let mut injected = Vec::with_capacity(parameters.len());
    for (index, parameter) in parameters.iter().enumerate() {
        let value = container.resolve_key(parameter)?;
        injected.push(InjectedArgument {
            index,
            declared_type: parameter.short_name(),
            value: container.describe_value(parameter, &value),
        });
        values.push(value);
    }
    Ok((Args::new(values), injected))
}

/// Create a new, not yet shared, instance of `ty`
pub(crate) fn construct(container: &mut Container, ty: &TypeKey) -> ResolveResult<Built> {
    let constructor_injection = container.strategies().iter().any(InjectionStrategy::is_constructor);
    let candidates = container.introspection().constructors_of(ty);
    let constructor = select_constructor(
        ty,
        &candidates,
        container.constructor_selection(),
        constructor_injection,
    )?;

    trace!(
        "Selected constructor of {} with {} parameters",
        ty,
        constructor.parameters().len()
    );
    let (args, injected) = resolve_arguments(container, constructor.parameters())?;

    let built = constructor
        .invoke(&args)
        .map_err(|source| ResolveError::MemberInvocationFailure {
            type_name: ty.short_name(),
            member: "constructor".to_string(),
            source,
        })?;

    if constructor_injection {
        container.journal().append(JournalEntry::ConstructorCall {
            target: ty.short_name(),
            arguments: injected,
        });
    }
    Ok(built)
}

fn carries_any(introspection: &dyn Introspection, member: &Member<'_>, markers: &MarkerSet) -> bool {
    markers
        .iter()
        .any(|marker| introspection.has_marker(member, marker))
}

/// Run every post-construction strategy against `target`
pub(crate) fn inject_members(
    container: &mut Container,
    ty: &TypeKey,
    target: &mut (dyn Any + Send + Sync),
) -> ResolveResult<()> {
    let strategies = container.strategies().to_vec();
    let introspection: Arc<dyn Introspection> = Arc::clone(container.introspection());
    let fields = introspection.fields_of(ty);
    let methods = introspection.methods_of(ty);

    let mut fields_set = HashSet::new();
    let mut methods_called = HashSet::new();

    for strategy in &strategies {
        match strategy {
            InjectionStrategy::Constructor => {}
            InjectionStrategy::MarkedField(markers) => {
                for (position, field) in fields.iter().enumerate() {
                    if fields_set.contains(&position)
                        || !carries_any(introspection.as_ref(), &Member::Field(field), markers)
                    {
                        continue;
                    }
                    let declared = field.declared_type();
                    let value: Instance = container.resolve_key(&declared)?;
                    let description = container.describe_value(&declared, &value);
                    field
                        .set(target, value)
                        .map_err(|source| ResolveError::MemberInvocationFailure {
                            type_name: ty.short_name(),
                            member: field.name().to_string(),
                            source,
                        })?;
                    container.journal().append(JournalEntry::FieldSet {
                        target: ty.short_name(),
                        field: field.name().to_string(),
                        declared_type: declared.short_name(),
                        value: description,
                    });
                    fields_set.insert(position);
                }
            }
            InjectionStrategy::MarkedMethod(_) | InjectionStrategy::Setters => {
                for (position, method) in methods.iter().enumerate() {
                    let selected = match strategy {
                        InjectionStrategy::MarkedMethod(markers) => {
                            carries_any(introspection.as_ref(), &Member::Method(method), markers)
                        }
                        _ => method.is_setter(),
                    };
                    if !selected || methods_called.contains(&position) {
                        continue;
                    }
                    let (args, injected) = resolve_arguments(container, method.parameters())?;
                    method
                        .invoke(target, &args)
                        .map_err(|source| ResolveError::MemberInvocationFailure {
                            type_name: ty.short_name(),
                            member: method.name().to_string(),
                            source,
                        })?;
                    container.journal().append(JournalEntry::MethodCall {
                        target: ty.short_name(),
                        method: method.name().to_string(),
                        arguments: injected,
                    });
                    methods_called.insert(position);
                }
            }
        }
    }

    debug!(
        "Injected {} fields and {} methods into {}",
        fields_set.len(),
        methods_called.len(),
        ty
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::TypeDescriptor;
    use crate::params;

    struct Pair;

    fn constructors() -> Vec<ConstructorInfo> {
        TypeDescriptor::of::<Pair>()
            .constructor(params![], |_| Ok(Pair))
            .constructor(params![i32, bool], |_| Ok(Pair))
            .constructor(params![String, u8], |_| Ok(Pair))
            .constructor(params![char], |_| Ok(Pair))
            .build()
            .constructors()
            .to_vec()
    }

    #[test]
    fn test_most_parameters_prefers_first_declared_on_tie() {
        let key = TypeKey::of::<Pair>();
        let chosen =
            select_constructor(&key, &constructors(), ConstructorSelection::MostParameters, true)
                .unwrap();
        assert_eq!(chosen.parameters(), params![i32, bool].as_slice());
    }

    #[test]
    fn test_strict_rejects_multiple_constructors() {
        let key = TypeKey::of::<Pair>();
        let result = select_constructor(&key, &constructors(), ConstructorSelection::Strict, true);
        assert!(matches!(
            result,
            Err(ResolveError::AmbiguousConstructor { candidates: 4, .. })
        ));
    }

    #[test]
    fn test_without_constructor_injection_only_nullary_is_eligible() {
        let key = TypeKey::of::<Pair>();
        let chosen =
            select_constructor(&key, &constructors(), ConstructorSelection::Strict, false).unwrap();
        assert!(chosen.parameters().is_empty());

        let only_greedy = &constructors()[1..];
        let result =
            select_constructor(&key, only_greedy, ConstructorSelection::MostParameters, false);
        assert!(matches!(
            result,
            Err(ResolveError::UnresolvedDependency { .. })
        ));
    }

    #[test]
    fn test_no_constructors_is_unresolved() {
        let key = TypeKey::of::<Pair>();
        let result = select_constructor(&key, &[], ConstructorSelection::MostParameters, true);
        assert!(matches!(
            result,
            Err(ResolveError::UnresolvedDependency { ref reason, .. }) if reason.contains("no constructor")
        ));
    }

    #[test]
    fn test_strategy_display() {
        let rendered: Vec<String> = default_strategies().iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["constructor", "field[autowired|inject]", "method[autowired|inject]"]
        );
        assert_eq!(InjectionStrategy::Setters.to_string(), "setter");
    }
}
