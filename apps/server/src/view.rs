use masonry::composition::CompositionError;
use masonry::kernel::extensibility::ReferencedModules;
use masonry::kernel::mvc::{MvcError, ViewData};
use masonry::kernel::verbs::{VerbLink, VerbRegistry};
use masonry::vfs::AggregateVirtualPathProvider;
use std::fmt::Debug;
use tracing::debug;

/// Everything a view engine needs to render one template.
#[derive(Debug)]
pub struct ViewRequest<'a> {
    /// Virtual path of the template, e.g. `/Views/Help/Index.cshtml`.
    pub path: &'a str,
    pub model: Option<&'a str>,
    pub data: &'a ViewData,
    pub verbs: VerbRegistry<'a>,
    /// Modules whose model types templates may declare.
    pub references: &'a ReferencedModules,
}

/// Turns a template from the virtual file system into HTML.
pub trait ViewEngine: Debug + Send + Sync {
    /// # Errors
    /// [`MvcError::NotFound`] for a missing template, otherwise any rendering failure.
    fn render(&self, vfs: &AggregateVirtualPathProvider, request: &ViewRequest<'_>) -> Result<String, MvcError>;
}

/// A minimal engine that understands just enough of the template syntax to display pages.
///
/// Directive lines (`@using`, `@inherits`, `@model`) are dropped. A model type declared by
/// `@model T` or `@inherits Base<T>` must belong to a referenced module unless it is `dynamic`
/// or `object`. A `@{ Layout = "..."; }` line wraps the output in that layout at `@RenderBody()`, and the following tokens are
/// substituted with HTML-escaped values: `@Model`, `@ViewBag.Name`, `@Html.HeaderActions()`,
/// `@Html.HeaderActionGroups()` and `@Html.SidebarActions()`. Each header group becomes one
/// `action-group` block; the sidebar block is omitted when no sidebar verb is exported. Everything else is copied verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughViewEngine;

const MAX_LAYOUT_DEPTH: usize = 4;

impl ViewEngine for PassthroughViewEngine {
    fn render(&self, vfs: &AggregateVirtualPathProvider, request: &ViewRequest<'_>) -> Result<String, MvcError> {
        let mut path = request.path.to_owned();
        let mut body: Option<String> = None;

        for _ in 0..MAX_LAYOUT_DEPTH {
            let source = read_template(vfs, &path)?;
            let template = Template::parse(&source);
            check_model(template.model, request.references, &path)?;
            let rendered = substitute(template.body, request, body.as_deref())?;
            match template.layout {
                Some(layout) => {
                    path = layout.to_owned();
                    body = Some(rendered);
                },
                None => return Ok(rendered),
            }
        }

        Err(MvcError::Internal {
            message: format!("layouts nested deeper than {MAX_LAYOUT_DEPTH}").into(),
            context: Some(request.path.to_owned().into()),
        })
    }
}

fn read_template(vfs: &AggregateVirtualPathProvider, path: &str) -> Result<String, MvcError> {
    let file = vfs.get_file(path).ok_or_else(|| MvcError::NotFound {
        message: format!("view {path}").into(),
        context: None,
    })?;
    let bytes = file.read_to_end()?;
    String::from_utf8(bytes).map_err(|e| MvcError::Internal {
        message: e.to_string().into(),
        context: Some(path.to_owned().into()),
    })
}

/// A template with its leading directive lines split off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Template<'a> {
    layout: Option<&'a str>,
    model: Option<&'a str>,
    body: &'a str,
}

impl<'a> Template<'a> {
    fn parse(source: &'a str) -> Self {
        let mut template = Self { layout: None, model: None, body: source };
        let mut offset = 0;

        for line in source.split_inclusive('\n') {
            let trimmed = line.trim();
            if let Some(model) = trimmed.strip_prefix("@model ") {
                template.model = Some(model.trim());
            } else if let Some(base) = trimmed.strip_prefix("@inherits ") {
                template.model = template.model.or_else(|| generic_argument(base));
            } else if let Some(path) = layout_of(trimmed) {
                template.layout = Some(path);
            } else if !trimmed.starts_with("@using ") {
                break;
            }
            offset += line.len();
        }
        template.body = &source[offset..];
        template
    }
}

/// `Base<T>` yields `T`.
fn generic_argument(base: &str) -> Option<&str> {
    let (_, argument) = base.trim().split_once('<')?;
    argument.strip_suffix('>').map(str::trim).filter(|a| !a.is_empty())
}

fn check_model(model: Option<&str>, references: &ReferencedModules, path: &str) -> Result<(), MvcError> {
    let Some(model) = model.filter(|m| !matches!(*m, "dynamic" | "object")) else {
        return Ok(());
    };
    match references.resolve_model(model) {
        Some(module) => {
            debug!(path, model, module, "Model type resolved");
            Ok(())
        },
        None => Err(MvcError::Internal {
            message: format!("model type {model} is not declared by any referenced module").into(),
            context: Some(path.to_owned().into()),
        }),
    }
}

fn layout_of(line: &str) -> Option<&str> {
    let inner = line.strip_prefix("@{")?.strip_suffix('}')?.trim();
    let value = inner.strip_prefix("Layout")?.trim_start().strip_prefix('=')?.trim();
    let value = value.strip_suffix(';').unwrap_or(value).trim();
    value.strip_prefix('"')?.strip_suffix('"')
}

fn substitute(content: &str, request: &ViewRequest<'_>, body: Option<&str>) -> Result<String, MvcError> {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(at) = rest.find('@') {
        out.push_str(&rest[..at]);
        let token = &rest[at..];

        let consumed = if let Some(after) = token.strip_prefix("@RenderBody()") {
            out.push_str(body.unwrap_or_default());
            token.len() - after.len()
        } else if let Some(after) = token.strip_prefix("@Html.HeaderActions()") {
            let verbs = request.verbs.header_actions().map_err(composition)?;
            links(&mut out, verbs.iter().map(|v| VerbLink::from(v.as_ref())));
            token.len() - after.len()
        } else if let Some(after) = token.strip_prefix("@Html.HeaderActionGroups()") {
            for group in request.verbs.header_action_groups().map_err(composition)? {
                out.push_str("<div class=\"action-group\" data-group=\"");
                escape_into(&mut out, group.name());
                out.push_str("\">");
                links(&mut out, group.verbs().iter().map(|v| VerbLink::from(v.as_ref())));
                out.push_str("</div>");
            }
            token.len() - after.len()
        } else if let Some(after) = token.strip_prefix("@Html.SidebarActions()") {
            if request.verbs.has_sidebar_actions().map_err(composition)? {
                let verbs = request.verbs.sidebar_actions().map_err(composition)?;
                out.push_str("<nav class=\"sidebar-actions\">");
                links(&mut out, verbs.iter().map(|v| VerbLink::from(v.as_ref())));
                out.push_str("</nav>");
            }
            token.len() - after.len()
        } else if let Some(after) = token.strip_prefix("@ViewBag.") {
            let name_len = after.find(|c: char| !c.is_ascii_alphanumeric() && c != '_').unwrap_or(after.len());
            escape_into(&mut out, request.data.get(&after[..name_len]).unwrap_or_default());
            "@ViewBag.".len() + name_len
        } else if let Some(after) = token.strip_prefix("@Model") {
            if after.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
                out.push('@');
                1
            } else {
                escape_into(&mut out, request.model.unwrap_or_default());
                "@Model".len()
            }
        } else {
            out.push('@');
            1
        };
        rest = &token[consumed..];
    }
    out.push_str(rest);
    Ok(out)
}

fn links(out: &mut String, verbs: impl Iterator<Item = VerbLink>) {
    for verb in verbs {
        out.push_str("<a href=\"");
        escape_into(out, &verb.url);
        out.push_str("\">");
        escape_into(out, &verb.text);
        out.push_str("</a>");
    }
}

fn escape_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

fn composition(source: CompositionError) -> MvcError {
    MvcError::Composition { source, context: Some("resolving verbs".into()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use masonry::composition::{
        CompositionHost, CompositionProvider, ContainerConfiguration, PartAssembly, PartDefinition, RequestItems,
    };
    use masonry::domain::identity::Identity;
    use masonry::kernel::extensibility::{ExtensionModule, PartLoadError};
    use masonry::kernel::verbs::HeaderActionVerb;
    use masonry::vfs::{EmbeddedFileProvider, EmbeddedResource, NamespaceMapping, NullFileProvider, VirtualPath};
    use std::sync::Arc;

    static VIEWS: [EmbeddedResource; 5] = [
        EmbeddedResource::new(
            "Site.Views.Home.Index.cshtml",
            b"@using Masonry.Views\n@inherits Masonry.Views.ViewPage<Demo>\n@{ Layout = \"/Views/Shared/_Layout.cshtml\"; }\n<p>@Model</p><i>@ViewBag.Who</i>@Model.Text me@example.org",
        ),
        EmbeddedResource::new(
            "Site.Views.Shared._Layout.cshtml",
            b"<title>@ViewBag.Brand</title><main>@RenderBody()</main>",
        ),
        EmbeddedResource::new(
            "Site.Views.Shared.Header.cshtml",
            b"<nav>@Html.HeaderActions()</nav><menu>@Html.HeaderActionGroups()</menu>",
        ),
        EmbeddedResource::new("Site.Views.Home.Foreign.cshtml", b"@model Other.Report\n<p>typed</p>"),
        EmbeddedResource::new(
            "Site.Views.Home.Loose.cshtml",
            b"@inherits Masonry.Views.ViewPage<dynamic>\n<p>loose</p>",
        ),
    ];

    #[derive(Debug)]
    struct DemoModule;

    impl ExtensionModule for DemoModule {
        fn name(&self) -> &'static str {
            "Sample.Demo"
        }

        fn parts(&self) -> Vec<Result<PartDefinition, PartLoadError>> {
            Vec::new()
        }

        fn model_types(&self) -> &'static [&'static str] {
            &["Demo"]
        }
    }

    fn references() -> ReferencedModules {
        let references = ReferencedModules::new();
        references.add(Arc::new(DemoModule));
        references
    }

    #[derive(Debug)]
    struct Link {
        text: &'static str,
        url: &'static str,
        group: Option<&'static str>,
    }

    impl HeaderActionVerb for Link {
        fn text(&self) -> &str {
            self.text
        }

        fn url(&self) -> &str {
            self.url
        }

        fn group_name(&self) -> Option<&str> {
            self.group
        }

        fn is_public(&self) -> bool {
            true
        }
    }

    fn link(text: &'static str, url: &'static str, group: Option<&'static str>) -> PartDefinition {
        PartDefinition::instance::<dyn HeaderActionVerb>(Arc::new(Link { text, url, group })).build()
    }

    fn vfs() -> AggregateVirtualPathProvider {
        let views = EmbeddedFileProvider::new(VirtualPath::root());
        views.add(NamespaceMapping::new("Site", "Site", &VIEWS));
        let vfs = AggregateVirtualPathProvider::new(NullFileProvider);
        vfs.add(Arc::new(views));
        vfs
    }

    fn host() -> CompositionHost {
        ContainerConfiguration::new().create_container().unwrap()
    }

    #[test]
    fn renders_into_the_layout_with_escaped_values() {
        let host = host();
        let scope = host.root();
        let identity = Identity::anonymous();
        let references = references();
        let data = ViewData::new().with("Who", "<b>ada</b>").with("Brand", "Masonry");
        let request = ViewRequest {
            path: "/Views/Home/Index.cshtml",
            model: Some("a & b"),
            data: &data,
            verbs: VerbRegistry::new(&scope, &identity),
            references: &references,
        };

        let html = PassthroughViewEngine.render(&vfs(), &request).unwrap();
        assert_eq!(
            html,
            "<title>Masonry</title><main><p>a &amp; b</p><i>&lt;b&gt;ada&lt;/b&gt;</i>@Model.Text me@example.org</main>"
        );
    }

    #[test]
    fn grouped_header_verbs_render_as_action_groups() {
        let provider = CompositionProvider::default();
        let parts = vec![
            link("Help", "/help", None),
            link("Sign in", "/account/login", Some("Account")),
            link("Register", "/account/register?a=1&b=2", Some("Account")),
            link("Blank", "/blank", Some(" ")),
        ];
        provider.add_assembly(PartAssembly::builder("Site").parts(parts).build()).unwrap();
        let items = RequestItems::new();
        let scope = provider.current(&items).unwrap();
        let identity = Identity::anonymous();
        let references = references();
        let data = ViewData::new();
        let request = ViewRequest {
            path: "/Views/Shared/Header.cshtml",
            model: None,
            data: &data,
            verbs: VerbRegistry::new(&scope, &identity),
            references: &references,
        };

        let html = PassthroughViewEngine.render(&vfs(), &request).unwrap();
        assert_eq!(
            html,
            "<nav><a href=\"/help\">Help</a><a href=\"/blank\">Blank</a></nav>\
             <menu><div class=\"action-group\" data-group=\"Account\">\
             <a href=\"/account/login\">Sign in</a>\
             <a href=\"/account/register?a=1&amp;b=2\">Register</a></div></menu>"
        );
    }

    #[test]
    fn missing_view_is_not_found() {
        let host = host();
        let scope = host.root();
        let identity = Identity::anonymous();
        let references = references();
        let data = ViewData::new();
        let request = ViewRequest {
            path: "/Views/Home/Missing.cshtml",
            model: None,
            data: &data,
            verbs: VerbRegistry::new(&scope, &identity),
            references: &references,
        };
        let err = PassthroughViewEngine.render(&vfs(), &request).unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[test]
    fn model_types_must_come_from_a_referenced_module() {
        let host = host();
        let scope = host.root();
        let identity = Identity::anonymous();
        let references = references();
        let data = ViewData::new();
        let render = |path: &'static str| {
            let request = ViewRequest {
                path,
                model: None,
                data: &data,
                verbs: VerbRegistry::new(&scope, &identity),
                references: &references,
            };
            PassthroughViewEngine.render(&vfs(), &request)
        };

        let err = render("/Views/Home/Foreign.cshtml").unwrap_err();
        assert_eq!(err.kind(), "Internal");
        assert!(err.to_string().contains("Other.Report"), "{err}");
        assert_eq!(render("/Views/Home/Loose.cshtml").unwrap(), "<p>loose</p>");

        let unreferenced = ReferencedModules::new();
        let request = ViewRequest {
            path: "/Views/Home/Index.cshtml",
            model: None,
            data: &data,
            verbs: VerbRegistry::new(&scope, &identity),
            references: &unreferenced,
        };
        assert_eq!(PassthroughViewEngine.render(&vfs(), &request).unwrap_err().kind(), "Internal");
    }

    #[test]
    fn directives_are_split_off() {
        let template = Template::parse(
            "@using A\n@inherits Base<Foo.Bar>\n@{ Layout = \"/L.cshtml\"; }\n<p>@using</p>",
        );
        assert_eq!(template.layout, Some("/L.cshtml"));
        assert_eq!(template.model, Some("Foo.Bar"));
        assert_eq!(template.body, "<p>@using</p>");
        assert_eq!(Template::parse("@model Foo\n@inherits Base<Bar>\nx").model, Some("Foo"));
        assert_eq!(Template::parse("@inherits Base\nx").model, None);
    }

    #[test]
    fn layout_directive_parsing() {
        assert_eq!(layout_of("@{ Layout = \"~/Views/Shared/_Layout.cshtml\"; }"), Some("~/Views/Shared/_Layout.cshtml"));
        assert_eq!(layout_of("@{ Title = \"x\"; }"), None);
        assert_eq!(layout_of("<p>"), None);
    }
}
