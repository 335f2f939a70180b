//! UI contributions ("verbs") exported by the host and its extensions.
//!
//! Verbs are ordinary composition exports; the [`VerbRegistry`] queries them from the request
//! scope on every call and filters them for the caller.

use masonry_composition::{CompositionError, CompositionScope};
use masonry_domain::identity::Identity;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;

/// An entry of the page header navigation.
pub trait HeaderActionVerb: Debug + Send + Sync {
    fn text(&self) -> &str;

    fn url(&self) -> &str;

    /// Verbs sharing a group name render as one drop-down. `None` or blank means ungrouped.
    fn group_name(&self) -> Option<&str> {
        None
    }

    /// `true` for verbs shown to anonymous callers only, `false` for authenticated ones only.
    fn is_public(&self) -> bool {
        false
    }
}

/// An entry of the page sidebar.
pub trait SidebarActionVerb: Debug + Send + Sync {
    fn text(&self) -> &str;

    fn url(&self) -> &str;

    fn icon(&self) -> Option<&str> {
        None
    }
}

/// Header verbs sharing one group name, in discovery order.
#[derive(Debug, Clone)]
pub struct HeaderActionGroup {
    name: String,
    verbs: Vec<Arc<dyn HeaderActionVerb>>,
}

impl HeaderActionGroup {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn verbs(&self) -> &[Arc<dyn HeaderActionVerb>] {
        &self.verbs
    }
}

/// Plain view of a verb for templates and JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerbLink {
    pub text: String,
    pub url: String,
}

impl From<&dyn HeaderActionVerb> for VerbLink {
    fn from(verb: &dyn HeaderActionVerb) -> Self {
        Self { text: verb.text().to_owned(), url: verb.url().to_owned() }
    }
}

impl From<&dyn SidebarActionVerb> for VerbLink {
    fn from(verb: &dyn SidebarActionVerb) -> Self {
        Self { text: verb.text().to_owned(), url: verb.url().to_owned() }
    }
}

/// Verb queries for one request.
#[derive(Debug, Clone, Copy)]
pub struct VerbRegistry<'a> {
    scope: &'a CompositionScope,
    identity: &'a Identity,
}

impl<'a> VerbRegistry<'a> {
    #[must_use]
    pub const fn new(scope: &'a CompositionScope, identity: &'a Identity) -> Self {
        Self { scope, identity }
    }

    /// Header verbs meant for the caller: public ones when anonymous, the others when
    /// authenticated.
    ///
    /// # Errors
    /// Propagates composition failures while resolving the exports.
    pub fn header_verbs(&self) -> Result<Vec<Arc<dyn HeaderActionVerb>>, CompositionError> {
        let anonymous = !self.identity.is_authenticated();
        let mut verbs = self.scope.get_exports::<dyn HeaderActionVerb>()?;
        verbs.retain(|verb| verb.is_public() == anonymous);
        Ok(verbs)
    }

    /// Visible header verbs without a group.
    ///
    /// # Errors
    /// Propagates composition failures while resolving the exports.
    pub fn header_actions(&self) -> Result<Vec<Arc<dyn HeaderActionVerb>>, CompositionError> {
        let mut verbs = self.header_verbs()?;
        verbs.retain(|verb| group_of(verb.as_ref()).is_none());
        Ok(verbs)
    }

    /// Visible grouped header verbs, groups ordered by their first member.
    ///
    /// # Errors
    /// Propagates composition failures while resolving the exports.
    pub fn header_action_groups(&self) -> Result<Vec<HeaderActionGroup>, CompositionError> {
        let mut groups: Vec<HeaderActionGroup> = Vec::new();

        for verb in self.header_verbs()? {
            let Some(name) = group_of(verb.as_ref()) else {
                continue;
            };
            match groups.iter_mut().find(|g| g.name == name) {
                Some(group) => group.verbs.push(verb),
                None => {
                    let name = name.to_owned();
                    groups.push(HeaderActionGroup { name, verbs: vec![verb] });
                },
            }
        }
        Ok(groups)
    }

    /// # Errors
    /// Propagates composition failures while resolving the exports.
    pub fn sidebar_actions(&self) -> Result<Vec<Arc<dyn SidebarActionVerb>>, CompositionError> {
        self.scope.get_exports::<dyn SidebarActionVerb>()
    }

    /// # Errors
    /// Propagates composition failures while resolving the exports.
    pub fn has_sidebar_actions(&self) -> Result<bool, CompositionError> {
        Ok(!self.sidebar_actions()?.is_empty())
    }
}

fn group_of(verb: &dyn HeaderActionVerb) -> Option<&str> {
    verb.group_name().filter(|name| !name.trim().is_empty())
}
