use crate::part::PartDefinition;
use parking_lot::RwLock;
use std::borrow::Cow;
use std::sync::Arc;

/// A named, immutable group of part definitions; the unit the catalog grows by.
#[derive(Debug)]
pub struct PartAssembly {
    name: Cow<'static, str>,
    parts: Vec<Arc<PartDefinition>>,
}

impl PartAssembly {
    pub fn builder(name: impl Into<Cow<'static, str>>) -> PartAssemblyBuilder {
        PartAssemblyBuilder { name: name.into(), parts: Vec::new() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parts(&self) -> &[Arc<PartDefinition>] {
        &self.parts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[must_use = "call .build() to obtain the assembly"]
#[derive(Debug)]
pub struct PartAssemblyBuilder {
    name: Cow<'static, str>,
    parts: Vec<Arc<PartDefinition>>,
}

impl PartAssemblyBuilder {
    pub fn part(mut self, part: impl Into<PartDefinition>) -> Self {
        self.parts.push(Arc::new(part.into()));
        self
    }

    pub fn parts<I>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = PartDefinition>,
    {
        self.parts.extend(parts.into_iter().map(Arc::new));
        self
    }

    pub fn build(self) -> PartAssembly {
        PartAssembly { name: self.name, parts: self.parts }
    }
}

/// Append-only list of assemblies known to the provider.
#[derive(Debug, Default)]
pub struct PartCatalog {
    assemblies: RwLock<Vec<Arc<PartAssembly>>>,
}

impl PartCatalog {
    pub(crate) fn push(&self, assembly: Arc<PartAssembly>) {
        self.assemblies.write().push(assembly);
    }

    /// Copies the current assembly list in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<PartAssembly>> {
        self.assemblies.read().clone()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.assemblies.read().iter().any(|a| a.name() == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assemblies.read().len()
    }
}
