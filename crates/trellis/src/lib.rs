//! # Trellis - Layouts and Partials for MiniJinja HTML Templates
//!
//! `trellis` is a thin layer over [MiniJinja](minijinja) for rendering HTML
//! pages from a directory of template files. It adds:
//!
//! - Named layouts: a view renders first, then a layout wraps it with `view()`
//! - Global partials: every file under the partials directory is available
//!   as `@partials/<name>`
//! - A template set cache keyed by `view:layout:partials`
//! - Pipes: helper functions from [`trellis_pipes`] or your own
//! - A development mode that reloads every template on each call
//!
//! ## Quick Start
//!
//! ```rust
//! use trellis::{ctx, Engine, MemoryFs, Options};
//!
//! let fs = MemoryFs::from_entries(&[
//!     ("views/layout.tpl", "<html>{{ require(\"@partials/nav\") }}{{ view() }}</html>"),
//!     ("views/partials/nav.tpl", "<nav></nav>"),
//!     ("views/pages/home.tpl", "<h1>{{ Title }}</h1>"),
//! ]);
//!
//! let engine = Engine::new(
//!     fs,
//!     Options::new().root("views").partials("views/partials").cache(true),
//! );
//! engine.load().unwrap();
//!
//! let page = engine
//!     .compile("pages/home", "layout", &ctx().add("Title", "Hi"), &[])
//!     .unwrap();
//! assert_eq!(page, b"<html><nav></nav><h1>Hi</h1></html>");
//! ```
//!
//! ## Names and Paths
//!
//! Templates are addressed by name: the path relative to the root, without
//! extension. With root `views` and extension `.tpl`, `pages/home` is the
//! file `views/pages/home.tpl`. See [`path`].
//!
//! ## Template Syntax
//!
//! Templates use Jinja2 syntax. Output is HTML-escaped, and markup returned
//! by `view()`, `include()` and `require()` is not escaped again. Variable
//! delimiters can be changed with [`Options::delimiters`].
//!
//! ## Files
//!
//! The engine reads templates through a [`FileSystem`]: [`DirFs`] for a
//! directory on disk, [`MemoryFs`] for templates held in memory.

pub mod context;
mod error;
pub mod file_loader;
pub mod options;
pub mod path;
pub mod prelude;
pub mod template;

pub use context::{ctx, Context};
pub use error::{Error, Result, TemplateKind};
pub use file_loader::{DirFs, FileSystem, MemoryFs};
pub use options::{DelimiterConfig, EngineConfig, Options};
pub use template::{Engine, PARTIALS_NAMESPACE};

pub use trellis_pipes as pipes;
