use masonry_composition::{
    BoundarySet, CONTROLLER_CONVENTION, CompositionError, CompositionHost, ContainerConfiguration,
    Conventions, PartAssembly, PartBuilder, PartDefinition, SharingBoundary,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

trait Counter: Send + Sync {
    fn id(&self) -> usize;
}

#[derive(Debug)]
struct Numbered(usize);

impl Counter for Numbered {
    fn id(&self) -> usize {
        self.0
    }
}

fn counting_part(sequence: &Arc<AtomicUsize>) -> PartBuilder<dyn Counter> {
    let sequence = Arc::clone(sequence);
    PartDefinition::export::<dyn Counter, _>(move |_| {
        Ok(Arc::new(Numbered(sequence.fetch_add(1, Ordering::SeqCst))))
    })
}

fn host(assembly: PartAssembly) -> CompositionHost {
    ContainerConfiguration::new()
        .with_default_conventions()
        .with_assembly(assembly)
        .create_container()
        .expect("container")
}

#[test]
fn request_shared_parts_are_reused_within_one_scope_only() {
    let sequence = Arc::new(AtomicUsize::new(0));
    let host = host(
        PartAssembly::builder("Test")
            .part(counting_part(&sequence).shared_within(SharingBoundary::Request))
            .build(),
    );
    let factory = host.scope_factory(BoundarySet::WEB_REQUEST).expect("factory");

    let first = factory.create_export();
    let a = first.get_export::<dyn Counter>().expect("export");
    let b = first.get_export::<dyn Counter>().expect("export");
    assert_eq!(a.id(), b.id());

    let second = factory.create_export();
    let c = second.get_export::<dyn Counter>().expect("export");
    assert_ne!(a.id(), c.id());
}

#[test]
fn non_shared_parts_are_fresh_and_process_parts_are_global() {
    let fresh = Arc::new(AtomicUsize::new(0));
    let global = Arc::new(AtomicUsize::new(100));
    let host = host(
        PartAssembly::builder("Test")
            .part(counting_part(&fresh))
            .part(
                PartDefinition::export::<Numbered, _>({
                    let global = Arc::clone(&global);
                    move |_| Ok(Arc::new(Numbered(global.fetch_add(1, Ordering::SeqCst))))
                })
                .shared_within(SharingBoundary::Process),
            )
            .build(),
    );
    let factory = host.scope_factory(BoundarySet::WEB_REQUEST).expect("factory");
    let one = factory.create_export();
    let two = factory.create_export();

    assert_ne!(
        one.get_export::<dyn Counter>().expect("export").id(),
        one.get_export::<dyn Counter>().expect("export").id()
    );
    assert_eq!(
        one.get_export::<Numbered>().expect("export").0,
        two.get_export::<Numbered>().expect("export").0
    );
}

#[test]
fn teardown_runs_in_reverse_creation_order_exactly_once() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let outer_log = Arc::clone(&log);
    let inner_log = Arc::clone(&log);
    let host = host(
        PartAssembly::builder("Test")
            .part(
                PartDefinition::export::<String, _>(|_| Ok(Arc::new("session".to_owned())))
                    .shared_within(SharingBoundary::ConsistencyUnit)
                    .on_teardown(move |value: &String| inner_log.lock().push(value.clone())),
            )
            .part(
                PartDefinition::export::<Vec<u8>, _>(|ctx| {
                    let session = ctx.get_export::<String>()?;
                    Ok(Arc::new(session.as_bytes().to_vec()))
                })
                .shared_within(SharingBoundary::Request)
                .on_teardown(move |_| outer_log.lock().push("repository".to_owned())),
            )
            .build(),
    );

    let scope = host.scope_factory(BoundarySet::WEB_REQUEST).expect("factory").create_export();
    assert_eq!(scope.get_export::<Vec<u8>>().expect("export").as_slice(), b"session");

    scope.dispose();
    scope.dispose();
    assert!(scope.is_disposed());
    assert_eq!(*log.lock(), vec!["repository".to_owned(), "session".to_owned()]);
}

#[test]
fn dropping_the_last_handle_disposes_the_scope() {
    let released = Arc::new(AtomicUsize::new(0));
    let hook = Arc::clone(&released);
    let host = host(
        PartAssembly::builder("Test")
            .part(
                PartDefinition::export::<u32, _>(|_| Ok(Arc::new(7)))
                    .shared_within(SharingBoundary::Identity)
                    .on_teardown(move |_| {
                        hook.fetch_add(1, Ordering::SeqCst);
                    }),
            )
            .build(),
    );

    let scope = host.scope_factory(BoundarySet::WEB_REQUEST).expect("factory").create_export();
    let clone = scope.clone();
    assert_eq!(*scope.get_export::<u32>().expect("export"), 7);
    drop(scope);
    assert_eq!(released.load(Ordering::SeqCst), 0);
    drop(clone);
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn disposed_scopes_refuse_to_resolve() {
    let host = host(
        PartAssembly::builder("Test").part(PartDefinition::export::<u8, _>(|_| Ok(Arc::new(1)))).build(),
    );
    let scope = host.scope_factory(BoundarySet::WEB_REQUEST).expect("factory").create_export();
    scope.dispose();

    let err = scope.get_export::<u8>().unwrap_err();
    assert!(matches!(err, CompositionError::ScopeDisposed { .. }));
}

#[test]
fn boundary_parts_need_a_scope_that_opens_the_boundary() {
    let host = host(
        PartAssembly::builder("Test")
            .part(
                PartDefinition::export::<String, _>(|_| Ok(Arc::new("per-request".to_owned())))
                    .shared_within(SharingBoundary::Request),
            )
            .part(
                PartDefinition::export::<usize, _>(|ctx| Ok(Arc::new(ctx.get_export::<String>()?.len())))
                    .shared_within(SharingBoundary::Process),
            )
            .build(),
    );

    let err = host.root().get_export::<String>().unwrap_err();
    assert!(matches!(
        err,
        CompositionError::BoundaryUnavailable { boundary: SharingBoundary::Request, .. }
    ));

    let scope = host.scope_factory(BoundarySet::WEB_REQUEST).expect("factory").create_export();
    assert!(scope.get_export::<String>().is_ok());
    let err = scope.get_export::<usize>().unwrap_err();
    assert_eq!(err.kind(), "BoundaryUnavailable");
}

#[test]
fn missing_ambiguous_and_named_exports() {
    let host = host(
        PartAssembly::builder("Test")
            .part(PartDefinition::export::<String, _>(|_| Ok(Arc::new("a".to_owned()))))
            .part(PartDefinition::export::<String, _>(|_| Ok(Arc::new("b".to_owned()))))
            .part(PartDefinition::export::<String, _>(|_| Ok(Arc::new("c".to_owned()))).named("third"))
            .build(),
    );
    let root = host.root();

    assert!(matches!(root.get_export::<u64>().unwrap_err(), CompositionError::MissingExport { .. }));
    assert!(root.try_get_export::<u64>().expect("no error").is_none());
    assert!(matches!(
        root.get_export::<String>().unwrap_err(),
        CompositionError::AmbiguousExport { count: 2, .. }
    ));
    assert_eq!(root.get_named_export::<String>("third").expect("named").as_str(), "c");

    let all: Vec<_> = root.get_exports::<String>().expect("exports").iter().map(|s| s.to_string()).collect();
    assert_eq!(all, vec!["a", "b"]);
}

#[test]
fn circular_dependencies_are_reported() {
    let host = host(
        PartAssembly::builder("Test")
            .part(
                PartDefinition::export::<u16, _>(|ctx| Ok(Arc::new(u16::from(*ctx.get_export::<u8>()?))))
                    .implemented_by("Left"),
            )
            .part(
                PartDefinition::export::<u8, _>(|ctx| {
                    let wide = *ctx.get_export::<u16>()?;
                    Ok(Arc::new(u8::try_from(wide).unwrap_or(u8::MAX)))
                })
                    .implemented_by("Right"),
            )
            .build(),
    );

    match host.root().get_export::<u16>().unwrap_err() {
        CompositionError::CircularDependency { chain, .. } => {
            assert_eq!(chain, "Left -> Right -> Left");
        },
        other => panic!("expected a cycle, got {other}"),
    }
}

#[test]
fn candidate_parts_follow_conventions() {
    let assembly = Arc::new(
        PartAssembly::builder("Test")
            .part(
                PartDefinition::export::<String, _>(|_| Ok(Arc::new("home".to_owned())))
                    .candidate(CONTROLLER_CONVENTION),
            )
            .build(),
    );

    let without = ContainerConfiguration::new()
        .with_conventions(Conventions::none())
        .with_assembly(Arc::clone(&assembly))
        .create_container()
        .expect("container");
    assert!(without.root().try_get_export::<String>().expect("lookup").is_none());

    let with = ContainerConfiguration::new()
        .with_default_conventions()
        .with_assembly(assembly)
        .create_container()
        .expect("container");
    assert_eq!(with.root().get_export::<String>().expect("export").as_str(), "home");
}

#[test]
fn scope_factories_reject_process_and_empty_sets() {
    let host = host(PartAssembly::builder("Empty").build());
    assert!(host.scope_factory(BoundarySet::empty()).is_err());
    assert!(host.scope_factory(BoundarySet::PROCESS | BoundarySet::REQUEST).is_err());
    assert!(host.scope_factory(BoundarySet::REQUEST).is_ok());
}

#[test]
fn blank_assembly_names_are_rejected_when_building() {
    let err = ContainerConfiguration::new()
        .with_assembly(PartAssembly::builder("  ").build())
        .create_container()
        .unwrap_err();
    assert!(matches!(err, CompositionError::InvalidArgument { .. }));
}
