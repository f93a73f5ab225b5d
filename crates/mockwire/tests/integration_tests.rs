//! Integration tests for wiring a subject graph end to end

use mockwire::{
    default_markers, markers, params, Container, InjectionStrategy, Journal, MarkerSet,
    MockDeps, MockProxy, Origin, RecordingMocks, ResolveError, ResolveResult, SynthesisKind,
    TypeDescriptor, TypeKey, TypeRegistry,
};
use std::sync::Arc;

trait Inbox: Send + Sync {
    fn deliver(&self, message: &str) -> bool;
}

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

trait Spooler: Send + Sync {
    fn spool(&self, id: u32);
}

impl Inbox for MockProxy {
    fn deliver(&self, message: &str) -> bool {
        self.invoke("deliver", &[&message])
    }
}

impl Clock for MockProxy {
    fn now(&self) -> u64 {
        self.invoke("now", &[])
    }
}

impl Spooler for MockProxy {
    fn spool(&self, id: u32) {
        self.invoke::<()>("spool", &[&id])
    }
}

struct Courier {
    inbox: Arc<dyn Inbox>,
    clock: Arc<dyn Clock>,
    spooler: Option<Arc<dyn Spooler>>,
    backup: Option<Arc<dyn Inbox>>,
    retries: u32,
}

struct Dispatcher {
    courier: Arc<Courier>,
    clock: Arc<dyn Clock>,
}

fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with(
            TypeDescriptor::of::<Courier>()
                .constructor(params![Arc<dyn Inbox>], |args| {
                    Ok(Courier {
                        inbox: args.cloned(0)?,
                        clock: Arc::new(SystemClock),
                        spooler: None,
                        backup: None,
                        retries: 0,
                    })
                })
                .constructor(params![Arc<dyn Inbox>, Arc<dyn Clock>], |args| {
                    Ok(Courier {
                        inbox: args.cloned(0)?,
                        clock: args.cloned(1)?,
                        spooler: None,
                        backup: None,
                        retries: 0,
                    })
                })
                .field::<Arc<dyn Inbox>, _>("backup", markers(["autowired"]), |courier, inbox| {
                    courier.backup = Some((*inbox).clone());
                    Ok(())
                })
                .method("set_spooler", params![Arc<dyn Spooler>], default_markers(), |courier, args| {
                    courier.spooler = Some(args.cloned(0)?);
                    Ok(())
                })
                .method("set_retries", params![u32], MarkerSet::new(), |courier, args| {
                    courier.retries = *args.get::<u32>(0)?;
                    Ok(())
                }),
        )
        .with(
            TypeDescriptor::of::<Dispatcher>().constructor(
                params![Courier, Arc<dyn Clock>],
                |args| {
                    Ok(Dispatcher {
                        courier: args.get::<Courier>(0)?,
                        clock: args.cloned(1)?,
                    })
                },
            ),
        )
}

struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        1_700_000_000
    }
}

fn mocks() -> RecordingMocks {
    RecordingMocks::new()
        .bind::<Arc<dyn Inbox>, _>(|p| p as Arc<dyn Inbox>)
        .bind::<Arc<dyn Clock>, _>(|p| p as Arc<dyn Clock>)
        .bind::<Arc<dyn Spooler>, _>(|p| p as Arc<dyn Spooler>)
}

fn container() -> Container {
    Container::new(Arc::new(registry()), Arc::new(mocks()))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

#[test]
fn test_most_parameters_constructor_is_used() -> ResolveResult<()> {
    init_tracing();
    let wired = MockDeps::<Courier>::new().using(container()).build()?;

    assert_eq!(wired.subject().clock.now(), 0);
    let entries = wired.journal().entries();
    assert!(matches!(
        &entries[0],
        mockwire::JournalEntry::ConstructorCall { arguments, .. } if arguments.len() == 2
    ));
    Ok(())
}

#[test]
fn test_nested_types_share_synthesized_collaborators() -> ResolveResult<()> {
    let wired = MockDeps::<Dispatcher>::new()
        .using(container())
        .with_type::<Courier>()
        .build()?;

    let dispatcher = wired.subject();
    assert!(Arc::ptr_eq(&dispatcher.clock, &dispatcher.courier.clock));
    assert!(Arc::ptr_eq(
        dispatcher.courier.backup.as_ref().unwrap(),
        &dispatcher.courier.inbox
    ));
    assert_eq!(
        wired.container().origin_of(&TypeKey::of::<Courier>()),
        Some(Origin::Built)
    );
    Ok(())
}

#[test]
fn test_nested_constructor_entry_precedes_outer() -> ResolveResult<()> {
    let wired = MockDeps::<Dispatcher>::new()
        .using(container())
        .with_type::<Courier>()
        .build()?;

    let rendered = wired.journal().render();
    let inner = rendered.find("Constructor being injected: Courier").unwrap();
    let outer = rendered.find("Constructor being injected: Dispatcher").unwrap();
    assert!(inner < outer);
    assert!(rendered.contains("Method being injected: 'set_spooler' with: mock[Arc<dyn Spooler>]#2"));
    assert!(rendered.contains("Field being injected: 'backup' with: mock[Arc<dyn Inbox>]#0"));
    Ok(())
}

#[test]
fn test_unregistered_concrete_type_is_unresolved() {
    let result = MockDeps::<Dispatcher>::new().using(container()).build();
    assert!(matches!(
        result,
        Err(ResolveError::UnresolvedDependency { ref type_name, .. }) if type_name == "Courier"
    ));
}

#[test]
fn test_strict_selection_surfaces_ambiguity() {
    let mut container = container();
    container.set_constructor_selection(mockwire::ConstructorSelection::Strict);

    let result = MockDeps::<Courier>::new().using(container).build();
    assert!(matches!(
        result,
        Err(ResolveError::AmbiguousConstructor { candidates: 2, .. })
    ));
}

#[test]
fn test_setters_with_explicit_primitive() -> ResolveResult<()> {
    let wired = MockDeps::<Courier>::new()
        .using(container())
        .with_setters()
        .with_instance(3u32)
        .build()?;

    assert_eq!(wired.subject().retries, 3);
    let methods: Vec<String> = wired
        .journal()
        .entries()
        .into_iter()
        .filter_map(|entry| match entry {
            mockwire::JournalEntry::MethodCall { method, .. } => Some(method),
            _ => None,
        })
        .collect();
    assert_eq!(methods, vec!["set_spooler".to_string(), "set_retries".to_string()]);
    Ok(())
}

#[test]
fn test_constructor_only_strategy_skips_members() -> ResolveResult<()> {
    let wired = MockDeps::<Courier>::new()
        .using(container())
        .with_strategies(vec![InjectionStrategy::Constructor])
        .build()?;

    assert!(wired.subject().spooler.is_none());
    assert!(wired.subject().backup.is_none());
    assert_eq!(wired.journal().len(), 1);
    Ok(())
}

#[test]
fn test_supplied_journal_sees_every_entry() -> ResolveResult<()> {
    let journal = Journal::new();
    let wired = MockDeps::<Courier>::new()
        .using(container())
        .with_journal(journal.clone())
        .build()?;

    assert!(journal.shares_log_with(wired.journal()));
    assert_eq!(journal.len(), 3);

    let json: serde_json::Value = serde_json::from_str(&journal.to_json().unwrap()).unwrap();
    assert_eq!(json[0]["kind"], "constructor_call");
    assert_eq!(json[1]["kind"], "field_set");
    assert_eq!(json[2]["kind"], "method_call");
    Ok(())
}

#[test]
fn test_sweeps_cover_every_synthesized_proxy() -> ResolveResult<()> {
    let wired = MockDeps::<Courier>::new().using(container()).build()?;
    let courier = wired.subject();

    courier.inbox.deliver("hello");
    courier.spooler.as_ref().unwrap().spool(7);

    let err = wired.verify_no_more_interactions_for_all().unwrap_err();
    assert!(matches!(
        err,
        ResolveError::VerificationFailure { ref type_name, .. } if type_name == "Arc<dyn Inbox>"
    ));

    let report = wired.reset_all()?;
    assert_eq!(report.len(), 3);
    assert!(wired.verify_no_more_interactions_for_all().is_ok());

    let synthesized = wired.container().enumerate_fallback_synthesized();
    assert!(synthesized.iter().all(|(key, _)| wired.container().origin_of(key)
        == Some(Origin::Synthesized(SynthesisKind::Proxy))));
    Ok(())
}

#[test]
fn test_resolve_macro() {
    let mut container = container();
    let clock = mockwire::resolve!(container, Arc<dyn Clock>).unwrap();
    assert_eq!(clock.now(), 0);
}
