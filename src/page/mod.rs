//! Page processing module
//!
//! This module contains the HTML-facing parts of the page transform:
//! - Typed view parameters and their builder
//! - Discovery of `<pb-view>` references in a page
//! - Rewriting of fetched fragments (links, images, element ids)

mod fragment;
mod params;
mod views;

pub use fragment::{transform_fragment, TransformedFragment};
pub use params::{ParamSet, ParamsBuilder, ID_KEY, PAGINATION_KEY, USER_PREFIX};
pub use views::{find_views, PageViews, ViewReference};
