//! Property tests over supplied instances and setter injection

use mockwire::{params, Container, MarkerSet, MockDeps, MockProxy, RecordingMocks, TypeDescriptor, TypeRegistry};
use proptest::prelude::*;
use std::sync::Arc;

trait Outbox: Send + Sync {
    fn push(&self, line: &str);
}

impl Outbox for MockProxy {
    fn push(&self, line: &str) {
        self.invoke::<()>("push", &[&line])
    }
}

struct Relay {
    outbox: Arc<dyn Outbox>,
    label: String,
    retries: u32,
}

fn container() -> Container {
    let registry = TypeRegistry::new().with(
        TypeDescriptor::of::<Relay>()
            .constructor(params![Arc<dyn Outbox>], |args| {
                Ok(Relay {
                    outbox: args.cloned(0)?,
                    label: String::new(),
                    retries: 0,
                })
            })
            .method("set_label", params![String], MarkerSet::new(), |relay, args| {
                relay.label = args.cloned(0)?;
                Ok(())
            })
            .method("set_retries", params![u32], MarkerSet::new(), |relay, args| {
                relay.retries = args.cloned(0)?;
                Ok(())
            }),
    );
    let mocks = RecordingMocks::new().bind::<Arc<dyn Outbox>, _>(|p| p as Arc<dyn Outbox>);
    Container::new(Arc::new(registry), Arc::new(mocks))
}

proptest! {
    #[test]
    fn test_supplied_values_reach_setters_and_journal(label in "[a-z ]{0,12}", retries in any::<u32>()) {
        let wired = MockDeps::<Relay>::new()
            .using(container())
            .with_setters()
            .with_instance(label.clone())
            .with_instance(retries)
            .build()
            .unwrap();

        prop_assert_eq!(&wired.subject().label, &label);
        prop_assert_eq!(wired.subject().retries, retries);

        let rendered = wired.journal().render();
        let label_line = format!("Method being injected: 'set_label' with: {:?}", label);
        let retries_line = format!("Method being injected: 'set_retries' with: {}", retries);
        prop_assert!(rendered.contains(&label_line));
        prop_assert!(rendered.contains(&retries_line));
    }

    #[test]
    fn test_only_unsupplied_collaborators_are_swept(pushes in 0usize..8) {
        let wired = MockDeps::<Relay>::new()
            .using(container())
            .with_setters()
            .build()
            .unwrap();

        for i in 0..pushes {
            wired.subject().outbox.push(&i.to_string());
        }

        prop_assert_eq!(wired.verify_no_more_interactions_for_all().is_err(), pushes > 0);
        prop_assert_eq!(wired.reset_all().unwrap().len(), 1);
        prop_assert!(wired.verify_no_more_interactions_for_all().is_ok());
    }
}
