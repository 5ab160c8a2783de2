//! Discovery of embedded `<pb-view>` references in a page

use crate::client::DocumentMeta;
use crate::page::params::{ParamSet, ParamsBuilder};
use crate::ParamError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

/// Attributes that contribute to view parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ElementParams {
    odd: Option<String>,
    view: Option<String>,
    xpath: Option<String>,
}

impl ElementParams {
    fn read(element: &ElementRef<'_>, with_xpath: bool) -> Self {
        let attr = |name: &str| element.value().attr(name).map(str::to_string);
        Self {
            odd: attr("odd"),
            view: attr("view"),
            xpath: if with_xpath { attr("xpath") } else { None },
        }
    }

    fn apply(&self, mut builder: ParamsBuilder) -> ParamsBuilder {
        if let Some(view) = &self.view {
            builder = builder.view(view.clone());
        }
        if let Some(odd) = &self.odd {
            builder = builder.odd_attribute(odd);
        }
        if let Some(xpath) = &self.xpath {
            builder = builder.xpath(xpath.clone());
        }
        builder
    }
}

/// One embedded view, resolved against its document declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewReference {
    /// Element id, or `_v<n>` by position in the page
    pub id: String,
    /// Id of the document declaration named by `src`
    pub document_id: String,
    /// Remote document path taken from the declaration's `path`
    pub document_path: String,
    document_params: ElementParams,
    view_params: ElementParams,
    user_params: Vec<(String, String)>,
}

impl ViewReference {
    /// Assembles the request parameters for this view
    ///
    /// Later sources override earlier ones: metadata `odd`/`view`, then the
    /// document declaration's attributes, then the view's own attributes, then
    /// nested `<pb-param>` elements as `user.<name>`.
    pub fn parameters(&self, meta: &DocumentMeta) -> Result<ParamSet, ParamError> {
        let mut builder = ParamsBuilder::new();

        if let Some(odd) = meta.odd.as_deref().filter(|s| !s.is_empty()) {
            builder = builder.odd(odd);
        }
        if let Some(view) = meta.view.as_deref().filter(|s| !s.is_empty()) {
            builder = builder.view(view);
        }

        builder = self.document_params.apply(builder);
        builder = self.view_params.apply(builder);

        for (name, value) in &self.user_params {
            builder = builder.user(name, value.clone())?;
        }

        Ok(builder.build())
    }
}

/// The views found in one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageViews {
    /// Resolvable views in document order
    pub views: Vec<ViewReference>,
    /// `<pb-view>` elements that could not be resolved
    pub skipped: u32,
}

impl PageViews {
    /// True if the page has no `<pb-view>` at all
    pub fn is_empty(&self) -> bool {
        self.views.is_empty() && self.skipped == 0
    }
}

/// Finds every resolvable `<pb-view>` in a page
///
/// Views without a `src`, or whose `src` does not name an element carrying a
/// `path`, are logged and skipped. Positional ids count skipped views too.
pub fn find_views(content: &str) -> PageViews {
    let html = Html::parse_document(content);
    let mut found = PageViews::default();

    let (Ok(view_selector), Ok(id_selector), Ok(param_selector)) = (
        Selector::parse("pb-view"),
        Selector::parse("[id]"),
        Selector::parse("pb-param"),
    ) else {
        return found;
    };

    let declarations: HashMap<&str, ElementRef<'_>> = html
        .select(&id_selector)
        .filter_map(|el| el.value().id().map(|id| (id, el)))
        .collect();

    for (i, element) in html.select(&view_selector).enumerate() {
        let id = element
            .value()
            .id()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("_v{}", i + 1));

        let Some(src) = element.value().attr("src") else {
            tracing::warn!("No src attribute set for component {}", id);
            found.skipped += 1;
            continue;
        };

        let Some(document) = declarations.get(src) else {
            tracing::warn!("Component {} refers to unknown document {}", id, src);
            found.skipped += 1;
            continue;
        };

        let Some(path) = document.value().attr("path").filter(|p| !p.is_empty()) else {
            tracing::warn!("Document {} used by {} has no path", src, id);
            found.skipped += 1;
            continue;
        };

        let user_params = element
            .select(&param_selector)
            .map(|param| {
                let attr = |name| param.value().attr(name).unwrap_or_default().to_string();
                (attr("name"), attr("value"))
            })
            .collect();

        found.views.push(ViewReference {
            id,
            document_id: src.to_string(),
            document_path: path.to_string(),
            document_params: ElementParams::read(document, false),
            view_params: ElementParams::read(&element, true),
            user_params,
        });
    }

    found
}
