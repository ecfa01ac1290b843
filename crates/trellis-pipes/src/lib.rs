//! # Trellis Pipes - Helper Functions for Templates
//!
//! A pipe is a named function that template authors can call from inside
//! template syntax. Every pipe in this crate is built as a callable
//! [`minijinja::Value`], so an engine can keep an open registry of pipes in a
//! single map and register them as globals on its environment.
//!
//! ## Available Pipes
//!
//! | Name | Constructor | Usage |
//! |------|-------------|-------|
//! | `uuid` | [`uuid`] | `{{ uuid() }}` |
//! | `iif` | [`iif`] | `{{ iif(user.admin, "Admin", "Member") }}` |
//! | `numberFmt` | [`number_fmt`] | `{{ numberFmt("%d views", count) }}` |
//! | `regexpFmt` | [`regexp_fmt`] | `{{ regexpFmt(phone, "^(\d{3})(\d+)$", "$1-$2") }}` |
//! | `toJson` | [`to_json`] | `{{ toJson(user) }}` |
//! | `dict` | [`dict`] | `{{ include("card", dict("title", page.title)) }}` |
//! | `isSet` | [`is_set`] | `{% if isSet(meta, "title") %}` |
//! | `alter` | [`alter`] | `{{ alter(meta.title, "Untitled") }}` |
//! | `deepAlter` | [`deep_alter`] | `{{ deepAlter(meta.tags, "none") }}` |
//! | `br` | [`br`] | `{{ br(comment) }}` |
//!
//! `isSet` returns a boolean, which prints as `True` or `False`. Use it as a
//! test rather than as output.
//!
//! ## Example
//!
//! ```rust
//! use minijinja::Environment;
//!
//! let mut env = Environment::new();
//! for (name, pipe) in trellis_pipes::all() {
//!     env.add_global(name, pipe);
//! }
//!
//! let out = env
//!     .render_str(r#"{{ numberFmt("%d items", 1234) }}"#, minijinja::context! {})
//!     .unwrap();
//! assert_eq!(out, "1,234 items");
//! ```

pub mod number;
pub mod pipe;
pub mod value;

pub use number::{format_number, group_thousands};
pub use pipe::{
    alter, br, deep_alter, dict, iif, is_set, number_fmt, regexp_fmt, to_json, uuid, PipeError,
};
pub use value::{is_empty, is_nil};

use minijinja::Value;

/// Names of every pipe this crate provides, as seen from templates.
pub const PIPE_NAMES: &[&str] = &[
    "uuid",
    "iif",
    "numberFmt",
    "regexpFmt",
    "toJson",
    "dict",
    "isSet",
    "alter",
    "deepAlter",
    "br",
];

/// Builds the pipe registered under `name`, if there is one.
pub fn lookup(name: &str) -> Option<Value> {
    let pipe = match name {
        "uuid" => uuid(),
        "iif" => iif(),
        "numberFmt" => number_fmt(),
        "regexpFmt" => regexp_fmt(),
        "toJson" => to_json(),
        "dict" => dict(),
        "isSet" => is_set(),
        "alter" => alter(),
        "deepAlter" => deep_alter(),
        "br" => br(),
        _ => return None,
    };
    Some(pipe)
}

/// Returns every pipe paired with its template-facing name.
pub fn all() -> Vec<(&'static str, Value)> {
    PIPE_NAMES
        .iter()
        .filter_map(|name| lookup(name).map(|pipe| (*name, pipe)))
        .collect()
}
