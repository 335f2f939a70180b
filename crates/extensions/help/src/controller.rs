use masonry_kernel::mvc::{ActionContext, ActionResult, Controller, MvcError, ViewData};
use masonry_kernel::vfs::AggregateVirtualPathProvider;
use std::sync::Arc;
use tracing::debug;

pub(crate) const INDEX_TOPIC: &str = "Index";
const TOPIC_ROOT: &str = "/Content/Help";

/// Serves `/help` and `/help/page/{topic}` from markdown topics in the virtual file system.
#[derive(Debug)]
pub struct HelpController {
    vfs: Arc<AggregateVirtualPathProvider>,
}

impl HelpController {
    #[must_use]
    pub const fn new(vfs: Arc<AggregateVirtualPathProvider>) -> Self {
        Self { vfs }
    }

    /// Raw markdown of `/Content/Help/{topic}.md`, if present.
    ///
    /// # Errors
    /// [`MvcError::Vfs`] when the topic exists but cannot be read.
    pub fn topic(&self, topic: &str) -> Result<Option<String>, MvcError> {
        if !is_topic_name(topic) {
            return Ok(None);
        }
        let Some(file) = self.vfs.get_file(&format!("{TOPIC_ROOT}/{topic}.md")) else {
            debug!(topic, "Help topic not found");
            return Ok(None);
        };
        let bytes = file.read_to_end()?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn index(&self) -> Result<ActionResult, MvcError> {
        Ok(ActionResult::view(self.topic(INDEX_TOPIC)?))
    }

    /// Drill-down pages render with the index view and fall back to the index topic.
    fn page(&self, page: Option<&str>) -> Result<ActionResult, MvcError> {
        let page = page.unwrap_or_default();
        let data = ViewData::new().with("HelpPage", page);
        let model = match self.topic(page)? {
            Some(content) => Some(content),
            None => self.topic(INDEX_TOPIC)?,
        };
        Ok(ActionResult::named_view(INDEX_TOPIC, model, data))
    }
}

impl Controller for HelpController {
    fn name(&self) -> &'static str {
        "Help"
    }

    fn execute(&self, context: &ActionContext<'_>) -> Result<ActionResult, MvcError> {
        match context.action.to_ascii_lowercase().as_str() {
            "" | "index" => self.index(),
            "page" => self.page(context.param("id").or_else(|| context.param("page"))),
            _ => Ok(ActionResult::NotFound),
        }
    }
}

fn is_topic_name(topic: &str) -> bool {
    !topic.trim().is_empty()
        && topic.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
