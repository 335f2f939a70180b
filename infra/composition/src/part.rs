use crate::boundary::SharingBoundary;
use crate::error::CompositionError;
use crate::scope::ResolutionContext;
use std::any::{Any, TypeId, type_name};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A type-erased export: always an `Arc<T>` wrapped once more so trait objects survive erasure.
pub type SharedInstance = Arc<dyn Any + Send + Sync>;
pub(crate) type Teardown = Box<dyn FnOnce() + Send>;
type ErasedFactory =
    Arc<dyn Fn(&ResolutionContext<'_>) -> Result<Activation, CompositionError> + Send + Sync>;
type TypedFactory<T> =
    Arc<dyn Fn(&ResolutionContext<'_>) -> Result<Arc<T>, CompositionError> + Send + Sync>;

pub(crate) struct Activation {
    pub(crate) instance: SharedInstance,
    pub(crate) teardown: Option<Teardown>,
}

pub(crate) fn downcast<T: ?Sized + 'static>(instance: &SharedInstance) -> Option<Arc<T>> {
    instance.downcast_ref::<Arc<T>>().cloned()
}

/// The identity of an export: the exported type plus an optional contract name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Contract {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<Cow<'static, str>>,
}

impl Contract {
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self { type_id: TypeId::of::<T>(), type_name: type_name::<T>(), name: None }
    }

    #[must_use]
    pub fn named<T: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: Some(name.into()), ..Self::of::<T>() }
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} (\"{name}\")", self.type_name),
            None => f.write_str(self.type_name),
        }
    }
}

/// How many consumers see the same instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sharing {
    /// A fresh instance for every resolution.
    NonShared,
    /// One instance per open boundary.
    Shared(SharingBoundary),
}

/// Whether a part is exported unconditionally or only when a convention accepts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    Export,
    Candidate(Cow<'static, str>),
}

/// One exported capability: a contract, its sharing policy and a factory.
pub struct PartDefinition {
    contract: Contract,
    sharing: Sharing,
    kind: PartKind,
    implementation: Cow<'static, str>,
    factory: ErasedFactory,
}

impl PartDefinition {
    /// Starts a part exporting `T` (usually a `dyn Trait`) built by `factory`.
    ///
    /// The factory receives a [`ResolutionContext`] to resolve its own dependencies.
    pub fn export<T, F>(factory: F) -> PartBuilder<T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolutionContext<'_>) -> Result<Arc<T>, CompositionError> + Send + Sync + 'static,
    {
        PartBuilder {
            contract: Contract::of::<T>(),
            sharing: Sharing::NonShared,
            kind: PartKind::Export,
            implementation: Cow::Borrowed(type_name::<T>()),
            factory: Arc::new(factory),
            teardown: None,
        }
    }

    /// Exports a ready-made value shared for the whole process.
    pub fn instance<T>(value: Arc<T>) -> PartBuilder<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self::export(move |_| Ok(Arc::clone(&value))).shared_within(SharingBoundary::Process)
    }

    #[must_use]
    pub const fn contract(&self) -> &Contract {
        &self.contract
    }

    #[must_use]
    pub const fn sharing(&self) -> Sharing {
        self.sharing
    }

    #[must_use]
    pub const fn kind(&self) -> &PartKind {
        &self.kind
    }

    #[must_use]
    pub fn implementation(&self) -> &str {
        &self.implementation
    }

    pub(crate) fn activate(&self, ctx: &ResolutionContext<'_>) -> Result<Activation, CompositionError> {
        (self.factory)(ctx)
    }
}

impl fmt::Debug for PartDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartDefinition")
            .field("contract", &self.contract)
            .field("sharing", &self.sharing)
            .field("kind", &self.kind)
            .field("implementation", &self.implementation)
            .finish_non_exhaustive()
    }
}

/// Typed builder for a [`PartDefinition`]; erases `T` on [`PartBuilder::build`].
#[must_use = "builders do nothing unless added to an assembly"]
pub struct PartBuilder<T: ?Sized> {
    contract: Contract,
    sharing: Sharing,
    kind: PartKind,
    implementation: Cow<'static, str>,
    factory: TypedFactory<T>,
    teardown: Option<Arc<dyn Fn(&T) + Send + Sync>>,
}

impl<T> PartBuilder<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.contract = Contract::named::<T>(name);
        self
    }

    pub const fn shared_within(mut self, boundary: SharingBoundary) -> Self {
        self.sharing = Sharing::Shared(boundary);
        self
    }

    /// Exports the part only when the container conventions accept `convention`.
    pub fn candidate(mut self, convention: impl Into<Cow<'static, str>>) -> Self {
        self.kind = PartKind::Candidate(convention.into());
        self
    }

    /// Names the implementing type for diagnostics.
    pub fn implemented_by(mut self, implementation: impl Into<Cow<'static, str>>) -> Self {
        self.implementation = implementation.into();
        self
    }

    /// Runs `teardown` when the owning scope (or the host, for process parts) is disposed.
    pub fn on_teardown(mut self, teardown: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.teardown = Some(Arc::new(teardown));
        self
    }

    pub fn build(self) -> PartDefinition {
        let Self { contract, sharing, kind, implementation, factory, teardown } = self;

        let factory: ErasedFactory = Arc::new(move |ctx: &ResolutionContext<'_>| {
            let instance = factory(ctx)?;
            let teardown = teardown.as_ref().map(|hook| {
                let hook = Arc::clone(hook);
                let target = Arc::clone(&instance);
                Box::new(move || hook(target.as_ref())) as Teardown
            });
            Ok(Activation { instance: Arc::new(instance), teardown })
        });

        PartDefinition { contract, sharing, kind, implementation, factory }
    }
}

impl<T> From<PartBuilder<T>> for PartDefinition
where
    T: ?Sized + Send + Sync + 'static,
{
    fn from(builder: PartBuilder<T>) -> Self {
        builder.build()
    }
}

impl<T: ?Sized> fmt::Debug for PartBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartBuilder")
            .field("contract", &self.contract)
            .field("sharing", &self.sharing)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
