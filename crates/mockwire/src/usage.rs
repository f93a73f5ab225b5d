//! # mockwire Usage Guide
//!
//! mockwire builds a test subject with every collaborator wired in. Whatever
//! the test does not supply is replaced by a recording mock proxy, or by a
//! zero value for primitives. The test can then inspect the injection journal
//! and verify or reset every proxy in one sweep.
//!
//! ## Describing Types
//!
//! Rust has no runtime reflection, so each injectable type is described once:
//!
//! ```rust,ignore
//! use mockwire::{default_markers, params, TypeDescriptor, TypeRegistry};
//! use std::sync::Arc;
//!
//! let registry = TypeRegistry::new().with(
//!     TypeDescriptor::of::<Checkout>()
//!         .constructor(params![Arc<dyn Payments>, Arc<dyn Inventory>], |args| {
//!             Ok(Checkout::new(args.cloned(0)?, args.cloned(1)?))
//!         })
//!         .field::<Arc<dyn Audit>, _>("audit", default_markers(), |checkout, audit| {
//!             checkout.audit = Some((*audit).clone());
//!             Ok(())
//!         })
//!         .method("set_currency", params![String], Default::default(), |checkout, args| {
//!             checkout.currency = args.cloned(0)?;
//!             Ok(())
//!         }),
//! );
//! ```
//!
//! Descriptors can also be submitted from anywhere with `inventory`; see
//! [`crate::registration`].
//!
//! ## Teaching the Mock Backend
//!
//! A proxy only stands in for a collaborator whose handle type has a binding:
//!
//! ```rust,ignore
//! use mockwire::{MockProxy, RecordingMocks};
//!
//! impl Payments for MockProxy {
//!     fn charge(&self, cents: u64) -> bool {
//!         self.invoke("charge", &[&cents])
//!     }
//! }
//!
//! let mocks = RecordingMocks::new()
//!     .bind::<Arc<dyn Payments>, _>(|proxy| proxy as Arc<dyn Payments>)
//!     .bind::<Arc<dyn Inventory>, _>(|proxy| proxy as Arc<dyn Inventory>);
//! ```
//!
//! ## Building a Subject
//!
//! ```rust,ignore
//! use mockwire::{Container, MockDeps};
//!
//! let container = Container::new(Arc::new(registry), Arc::new(mocks));
//! let wired = MockDeps::<Checkout>::new()
//!     .using(container)
//!     .with_instance(Arc::new(InMemoryInventory::default()) as Arc<dyn Inventory>)
//!     .with_setters()
//!     .build()?;
//!
//! wired.subject().pay(1200);
//! print!("{}", wired.journal());
//! ```
//!
//! `with_setters()` switches to constructor plus setter injection, so the
//! marked `audit` field is left alone. The journal reads:
//!
//! ```text
//! Constructor being injected: Checkout
//!   arg[0] type:Arc<dyn Payments>, with: mock[Arc<dyn Payments>]#0
//!   arg[1] type:Arc<dyn Inventory>, with: Arc<dyn Inventory>@0x...
//! Method being injected: 'set_currency' with: ""
//! ```
//!
//! ## Sweeps
//!
//! ```rust,ignore
//! // fails with VerificationFailure naming the payments proxy
//! assert!(wired.verify_no_more_interactions_for_all().is_err());
//!
//! wired.reset_all()?;
//! wired.verify_no_more_interactions_for_all()?;
//! ```
//!
//! ## Configuration
//!
//! ```rust,ignore
//! use mockwire::{Container, EngineConfig};
//!
//! // mockwire.toml plus MOCKWIRE__* environment variables
//! let config = EngineConfig::load("mockwire.toml")?;
//! let container = Container::from_config(Arc::new(registry), Arc::new(mocks), &config)?;
//! ```
//!
//! ## Best Practices
//!
//! 1. **Key trait collaborators by their handle**, e.g. `Arc<dyn Payments>`
//! 2. **Use one container per build**; `build()` consumes it
//! 3. **Supply real instances** only for what the test is about
//! 4. **Verify after acting**, then reset before the next phase
//! 5. **Avoid dependency cycles**; they are not detected and overflow the stack
