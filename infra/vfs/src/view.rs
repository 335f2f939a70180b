//! Rewrites embedded templates so they render like templates authored in the host application.

use crate::error::VfsError;
use crate::path::VirtualPath;
use masonry_domain::constants::{DEFAULT_START_PAGE, DEFAULT_VIEW_IMPORTS, DEFAULT_VIEW_PAGE};
use std::fmt;
use std::io::{Cursor, Read};

const MODEL_DIRECTIVE: &str = "@model";
const VIEW_START_MARKER: &str = "_viewstart";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Transforms a template before the host template engine sees it.
pub trait ViewGenerator: fmt::Debug + Send + Sync {
    /// Consumes `stream` and returns the rewritten template, positioned at the start.
    ///
    /// # Errors
    /// Fails when the stream cannot be read or is not valid UTF-8.
    fn generate_view(
        &self,
        virtual_path: &str,
        stream: Box<dyn Read + Send + '_>,
    ) -> Result<Cursor<Vec<u8>>, VfsError>;
}

/// Injects the import block, one `@inherits` line and the layout binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedViewGenerator {
    base_page: String,
    start_page: String,
    layout: Option<String>,
    imports: Vec<String>,
}

impl Default for EmbeddedViewGenerator {
    fn default() -> Self {
        Self {
            base_page: DEFAULT_VIEW_PAGE.to_owned(),
            start_page: DEFAULT_START_PAGE.to_owned(),
            layout: None,
            imports: DEFAULT_VIEW_IMPORTS.iter().map(|&s| s.to_owned()).collect(),
        }
    }
}

impl EmbeddedViewGenerator {
    pub fn builder() -> EmbeddedViewGeneratorBuilder {
        EmbeddedViewGeneratorBuilder { inner: Self::default() }
    }

    #[must_use]
    pub fn base_page(&self) -> &str {
        &self.base_page
    }

    #[must_use]
    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    /// The string form of the rewrite, shared by [`ViewGenerator::generate_view`].
    #[must_use]
    pub fn rewrite(&self, virtual_path: &str, template: &str) -> String {
        let (model, body) = split_model(template);

        let mut out = String::with_capacity(template.len() + 256);
        for namespace in &self.imports {
            out.push_str("@using ");
            out.push_str(namespace);
            out.push('\n');
        }

        let base = &self.base_page;
        let inherits = if virtual_path.to_ascii_lowercase().contains(VIEW_START_MARKER) {
            self.start_page.clone()
        } else {
            match model {
                Some("object" | "dynamic") => format!("{base}<dynamic>"),
                Some(model) => format!("{base}<{model}>"),
                None => base.clone(),
            }
        };
        out.push_str("@inherits ");
        out.push_str(&inherits);
        out.push('\n');

        let partial = VirtualPath::parse(virtual_path).is_ok_and(|path| path.is_partial());
        if let Some(layout) = self.layout.as_deref().filter(|l| !l.is_empty())
            && !partial
        {
            out.push_str("@{ Layout = \"");
            out.push_str(layout);
            out.push_str("\"; }\n");
        }

        out.push_str(body);
        out
    }
}

impl ViewGenerator for EmbeddedViewGenerator {
    fn generate_view(
        &self,
        virtual_path: &str,
        mut stream: Box<dyn Read + Send + '_>,
    ) -> Result<Cursor<Vec<u8>>, VfsError> {
        let mut raw = Vec::new();
        let read = stream.read_to_end(&mut raw);
        drop(stream);
        read?;

        if raw.starts_with(UTF8_BOM) {
            raw.drain(..UTF8_BOM.len());
        }
        let template = String::from_utf8(raw)?;
        Ok(Cursor::new(self.rewrite(virtual_path, &template).into_bytes()))
    }
}

#[must_use = "call .build() to obtain the generator"]
#[derive(Debug)]
pub struct EmbeddedViewGeneratorBuilder {
    inner: EmbeddedViewGenerator,
}

impl EmbeddedViewGeneratorBuilder {
    pub fn base_page(mut self, class: impl Into<String>) -> Self {
        self.inner.base_page = class.into();
        self
    }

    pub fn start_page(mut self, class: impl Into<String>) -> Self {
        self.inner.start_page = class.into();
        self
    }

    pub fn layout(mut self, layout: Option<impl Into<String>>) -> Self {
        self.inner.layout = layout.map(Into::into);
        self
    }

    pub fn imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.imports = imports.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> EmbeddedViewGenerator {
        self.inner
    }
}

/// Splits off a leading `@model` line. Blank lines before it go with it.
fn split_model(template: &str) -> (Option<&str>, &str) {
    let mut offset = 0;
    for line in template.split_inclusive('\n') {
        let content = line.trim();
        if content.is_empty() {
            offset += line.len();
            continue;
        }

        let model = content
            .strip_prefix(MODEL_DIRECTIVE)
            .filter(|rest| rest.starts_with(char::is_whitespace))
            .map(str::trim)
            .filter(|model| !model.is_empty());

        return match model {
            Some(model) => (Some(model), &template[offset + line.len()..]),
            None => (None, template),
        };
    }
    (None, template)
}
