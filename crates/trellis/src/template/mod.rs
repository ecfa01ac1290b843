//! Layout rendering on top of MiniJinja.
//!
//! - [`engine`]: [`Engine`], its loaded state and `load`/`exists`.
//! - [`renderer`]: the render pipeline, `render`/`compile`.
//! - [`functions`]: `view`, `exists`, `include` and `require`.
//!
//! ## Template Names
//!
//! Inside a template set, templates are registered under these names:
//!
//! | Template | Name |
//! |----------|------|
//! | The view | `view::<id>` |
//! | The layout | `layout::<id>` |
//! | A global partial | `@partials/<id>` |
//! | A per-call partial | `<id>` |
//!
//! Ids are file paths with the root (or partials directory) and the
//! extension stripped: `views/partials/nav/menu.tpl` is `@partials/nav/menu`.

pub mod engine;
pub mod functions;
pub mod renderer;

pub use engine::{Engine, PARTIALS_NAMESPACE};
pub use functions::{register_builtins, render_scope, VIEW_SLOT};
pub use renderer::{layout_name, view_name};
