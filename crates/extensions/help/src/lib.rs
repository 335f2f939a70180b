//! # Masonry Help
//!
//! The help pages as an extension module: a controller, its embedded view and markdown topics,
//! and header and sidebar verbs pointing at it. Activate it with a manifest:
//!
//! ```toml
//! # extensions/help.extension.toml
//! module = "Masonry.Help"
//! ```

mod controller;
mod verbs;

pub use controller::HelpController;
pub use verbs::{HelpHeaderVerb, HelpSidebarVerb};

use masonry_kernel::composition::{CONTROLLER_CONVENTION, PartDefinition};
use masonry_kernel::extensibility::{ExtensionModule, PartLoadError};
use masonry_kernel::mvc::Controller;
use masonry_kernel::verbs::{HeaderActionVerb, SidebarActionVerb};
use masonry_kernel::vfs::{AggregateVirtualPathProvider, EmbeddedResource};
use std::sync::Arc;

pub const MODULE_NAME: &str = "Masonry.Help";

static RESOURCES: [EmbeddedResource; 4] = [
    EmbeddedResource::new(
        "Masonry.Help.Views.Help.Index.cshtml",
        include_bytes!("../resources/Views/Help/Index.cshtml"),
    ),
    EmbeddedResource::new("Masonry.Help.Content.help.css", include_bytes!("../resources/Content/help.css")),
    EmbeddedResource::new(
        "Masonry.Help.Content.Help.Index.md",
        include_bytes!("../resources/Content/Help/Index.md"),
    ),
    EmbeddedResource::new(
        "Masonry.Help.Content.Help.Extensions.md",
        include_bytes!("../resources/Content/Help/Extensions.md"),
    ),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct HelpModule;

impl ExtensionModule for HelpModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn parts(&self) -> Vec<Result<PartDefinition, PartLoadError>> {
        vec![
            Ok(PartDefinition::export::<dyn Controller, _>(|ctx| {
                let vfs = ctx.get_export::<AggregateVirtualPathProvider>()?;
                Ok(Arc::new(HelpController::new(vfs)))
            })
            .candidate(CONTROLLER_CONVENTION)
            .implemented_by("Masonry.Help.HelpController")
            .build()),
            Ok(PartDefinition::instance::<dyn HeaderActionVerb>(Arc::new(HelpHeaderVerb::new(true)))
                .build()),
            Ok(PartDefinition::instance::<dyn HeaderActionVerb>(Arc::new(HelpHeaderVerb::new(false)))
                .build()),
            Ok(PartDefinition::instance::<dyn SidebarActionVerb>(Arc::new(HelpSidebarVerb)).build()),
        ]
    }

    fn resources(&self) -> &'static [EmbeddedResource] {
        &RESOURCES
    }

    fn model_types(&self) -> &'static [&'static str] {
        &["Masonry.Help.HelpTopic"]
    }
}
