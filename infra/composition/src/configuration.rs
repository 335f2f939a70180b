use crate::assembly::PartAssembly;
use crate::error::CompositionError;
use crate::host::CompositionHost;
use crate::part::PartKind;
use std::borrow::Cow;
use std::sync::Arc;

/// Convention under which web controllers are exported.
pub const CONTROLLER_CONVENTION: &str = "controller";

/// The candidate categories a container exports in addition to explicit exports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conventions {
    accepted: Vec<Cow<'static, str>>,
}

impl Conventions {
    /// No conventions: only explicit exports are visible.
    #[must_use]
    pub const fn none() -> Self {
        Self { accepted: Vec::new() }
    }

    /// The defaults for a web host: controllers are exported by convention.
    #[must_use]
    pub fn web() -> Self {
        Self::none().accept(CONTROLLER_CONVENTION)
    }

    #[must_use]
    pub fn accept(mut self, convention: impl Into<Cow<'static, str>>) -> Self {
        let convention = convention.into();
        if !self.accepted.contains(&convention) {
            self.accepted.push(convention);
        }
        self
    }

    #[must_use]
    pub fn exports(&self, kind: &PartKind) -> bool {
        match kind {
            PartKind::Export => true,
            PartKind::Candidate(category) => self.accepted.iter().any(|c| c == category),
        }
    }
}

/// The set of assemblies and conventions a container is built from.
///
/// Assemblies are de-duplicated by name; the first registration wins.
#[must_use = "call .create_container() or hand the configuration to a provider"]
#[derive(Debug, Clone, Default)]
pub struct ContainerConfiguration {
    assemblies: Vec<Arc<PartAssembly>>,
    conventions: Conventions,
}

impl ContainerConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assembly(mut self, assembly: impl Into<Arc<PartAssembly>>) -> Self {
        let assembly = assembly.into();
        if !self.assemblies.iter().any(|a| a.name() == assembly.name()) {
            self.assemblies.push(assembly);
        }
        self
    }

    pub fn with_assemblies<I>(self, assemblies: I) -> Self
    where
        I: IntoIterator<Item = Arc<PartAssembly>>,
    {
        assemblies.into_iter().fold(self, Self::with_assembly)
    }

    pub fn with_conventions(mut self, conventions: Conventions) -> Self {
        self.conventions = conventions;
        self
    }

    pub fn with_default_conventions(self) -> Self {
        self.with_conventions(Conventions::web())
    }

    #[must_use]
    pub fn assemblies(&self) -> &[Arc<PartAssembly>] {
        &self.assemblies
    }

    #[must_use]
    pub const fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    /// Builds the export index.
    ///
    /// # Errors
    /// Returns [`CompositionError::InvalidArgument`] when an assembly has a blank name.
    pub fn create_container(self) -> Result<CompositionHost, CompositionError> {
        if let Some(blank) = self.assemblies.iter().find(|a| a.name().trim().is_empty()) {
            return Err(CompositionError::InvalidArgument {
                message: format!("assembly with {} parts has no name", blank.len()).into(),
                context: None,
            });
        }
        Ok(CompositionHost::new(&self.assemblies, &self.conventions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_conventions_export_controllers_only() {
        let conventions = Conventions::web();
        assert!(conventions.exports(&PartKind::Export));
        assert!(conventions.exports(&PartKind::Candidate(CONTROLLER_CONVENTION.into())));
        assert!(!conventions.exports(&PartKind::Candidate("repository".into())));
        assert!(!Conventions::none().exports(&PartKind::Candidate(CONTROLLER_CONVENTION.into())));
    }

    #[test]
    fn assemblies_are_deduplicated_by_name() {
        let config = ContainerConfiguration::new()
            .with_assembly(PartAssembly::builder("Masonry.Web").build())
            .with_assembly(PartAssembly::builder("Masonry.Help").build())
            .with_assembly(PartAssembly::builder("Masonry.Web").build());

        let names: Vec<_> = config.assemblies().iter().map(|a| a.name().to_owned()).collect();
        assert_eq!(names, vec!["Masonry.Web", "Masonry.Help"]);
    }
}
