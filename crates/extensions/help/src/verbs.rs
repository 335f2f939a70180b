use masonry_kernel::verbs::{HeaderActionVerb, SidebarActionVerb};

/// Header link to the help pages, registered once for anonymous and once for signed-in
/// callers.
#[derive(Debug, Clone, Copy)]
pub struct HelpHeaderVerb {
    public: bool,
}

impl HelpHeaderVerb {
    #[must_use]
    pub const fn new(public: bool) -> Self {
        Self { public }
    }
}

impl HeaderActionVerb for HelpHeaderVerb {
    fn text(&self) -> &str {
        "Help"
    }

    fn url(&self) -> &str {
        "/help"
    }

    fn is_public(&self) -> bool {
        self.public
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HelpSidebarVerb;

impl SidebarActionVerb for HelpSidebarVerb {
    fn text(&self) -> &str {
        "Help"
    }

    fn url(&self) -> &str {
        "/help"
    }

    fn icon(&self) -> Option<&str> {
        Some("question-circle")
    }
}
