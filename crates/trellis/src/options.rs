//! Engine configuration.
//!
//! [`Options`] is a consuming builder. Every setter ignores blank input and
//! keeps the previous value, so defaults survive partially filled
//! configuration. Once an [`Options`] is handed to
//! [`Engine::new`](crate::Engine::new) it is never changed again.
//!
//! [`EngineConfig`] is the same surface in deserializable form, for engines
//! configured from a YAML file:
//!
//! ```yaml
//! root: views
//! partials: views/partials
//! extension: .tpl
//! delimiters:
//!   left: "[["
//!   right: "]]"
//! cache: true
//! pipes: [numberFmt, br]
//! ```

use std::collections::BTreeMap;

use minijinja::Value;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::path::dir_prefix;

pub const DEFAULT_EXTENSION: &str = ".tpl";
pub const DEFAULT_LEFT_DELIMITER: &str = "{{";
pub const DEFAULT_RIGHT_DELIMITER: &str = "}}";

/// Engine configuration builder.
///
/// # Example
///
/// ```rust
/// use trellis::Options;
///
/// let options = Options::new()
///     .root("views")
///     .partials("views/partials")
///     .cache(true)
///     .with_number_fmt_pipe();
///
/// assert_eq!(options.root_prefix(), "views/");
/// assert_eq!(options.partials_prefix(), Some("views/partials/"));
/// assert!(options.caching());
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    root: String,
    partials: Option<String>,
    extension: String,
    delimiters: (String, String),
    dev: bool,
    cache: bool,
    pipes: BTreeMap<String, Value>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            root: String::new(),
            partials: None,
            extension: DEFAULT_EXTENSION.to_string(),
            delimiters: (
                DEFAULT_LEFT_DELIMITER.to_string(),
                DEFAULT_RIGHT_DELIMITER.to_string(),
            ),
            dev: false,
            cache: false,
            pipes: BTreeMap::new(),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the template root, relative to the filesystem base.
    pub fn root(mut self, dir: &str) -> Self {
        if !dir.trim().is_empty() {
            self.root = dir_prefix(dir);
        }
        self
    }

    /// Sets the directory of global partials, relative to the filesystem base.
    ///
    /// The base directory itself is ignored: it would turn every template
    /// into a partial.
    pub fn partials(mut self, dir: &str) -> Self {
        let prefix = dir_prefix(dir);
        if !prefix.is_empty() {
            self.partials = Some(prefix);
        }
        self
    }

    /// Sets the template file extension. A missing leading dot is added.
    pub fn extension(mut self, ext: &str) -> Self {
        let ext = ext.trim();
        if !ext.is_empty() {
            self.extension = if ext.starts_with('.') {
                ext.to_string()
            } else {
                format!(".{}", ext)
            };
        }
        self
    }

    /// Sets the variable delimiters. Block delimiters stay `{%`/`%}`.
    ///
    /// The pair is applied only when both sides are non-blank.
    pub fn delimiters(mut self, left: &str, right: &str) -> Self {
        let (left, right) = (left.trim(), right.trim());
        if !left.is_empty() && !right.is_empty() {
            self.delimiters = (left.to_string(), right.to_string());
        }
        self
    }

    /// Enables development mode: templates are reloaded on every call and
    /// nothing is cached.
    pub fn dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    /// Enables the template set cache. Has no effect in development mode.
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Registers a custom function callable from templates.
    ///
    /// Blank names and undefined or none values are ignored. A later
    /// registration under the same name replaces the earlier one.
    pub fn pipe(mut self, name: &str, value: Value) -> Self {
        let name = name.trim();
        if !name.is_empty() && !value.is_undefined() && !value.is_none() {
            self.pipes.insert(name.to_string(), value);
        }
        self
    }

    pub fn with_uuid_pipe(self) -> Self {
        self.pipe("uuid", trellis_pipes::uuid())
    }

    pub fn with_ternary_pipe(self) -> Self {
        self.pipe("iif", trellis_pipes::iif())
    }

    pub fn with_number_fmt_pipe(self) -> Self {
        self.pipe("numberFmt", trellis_pipes::number_fmt())
    }

    pub fn with_regexp_fmt_pipe(self) -> Self {
        self.pipe("regexpFmt", trellis_pipes::regexp_fmt())
    }

    pub fn with_json_pipe(self) -> Self {
        self.pipe("toJson", trellis_pipes::to_json())
    }

    pub fn with_dict_pipe(self) -> Self {
        self.pipe("dict", trellis_pipes::dict())
    }

    pub fn with_is_set_pipe(self) -> Self {
        self.pipe("isSet", trellis_pipes::is_set())
    }

    pub fn with_alter_pipe(self) -> Self {
        self.pipe("alter", trellis_pipes::alter())
    }

    pub fn with_deep_alter_pipe(self) -> Self {
        self.pipe("deepAlter", trellis_pipes::deep_alter())
    }

    pub fn with_br_pipe(self) -> Self {
        self.pipe("br", trellis_pipes::br())
    }

    /// Registers every pipe of the standard library.
    pub fn with_all_pipes(self) -> Self {
        trellis_pipes::all()
            .into_iter()
            .fold(self, |options, (name, value)| options.pipe(name, value))
    }

    /// Template root as a prefix (`"views/"`), empty for the filesystem base.
    pub fn root_prefix(&self) -> &str {
        &self.root
    }

    /// Partials directory as a prefix (`"views/partials/"`).
    pub fn partials_prefix(&self) -> Option<&str> {
        self.partials.as_deref()
    }

    pub fn ext(&self) -> &str {
        &self.extension
    }

    pub fn delimiter_pair(&self) -> (&str, &str) {
        (&self.delimiters.0, &self.delimiters.1)
    }

    pub fn is_dev(&self) -> bool {
        self.dev
    }

    /// True when assembled template sets are kept between calls.
    pub fn caching(&self) -> bool {
        self.cache && !self.dev
    }

    pub fn pipes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.pipes.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Delimiter pair as written in a configuration file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DelimiterConfig {
    #[serde(default)]
    pub left: String,
    #[serde(default)]
    pub right: String,
}

/// Deserializable engine configuration.
///
/// Pipes are referenced by name from the standard pipe library, see
/// [`trellis_pipes::PIPE_NAMES`].
///
/// ```rust
/// use trellis::EngineConfig;
///
/// let config = EngineConfig::from_yaml("root: views\ncache: true\npipes: [br]\n").unwrap();
/// let options = config.into_options().unwrap();
/// assert_eq!(options.root_prefix(), "views/");
/// assert!(options.caching());
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub root: Option<String>,
    pub partials: Option<String>,
    pub extension: Option<String>,
    pub delimiters: Option<DelimiterConfig>,
    pub dev: Option<bool>,
    pub cache: Option<bool>,
    pub pipes: Vec<String>,
}

impl EngineConfig {
    pub fn from_yaml(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Applies this configuration on top of the default [`Options`].
    pub fn into_options(self) -> Result<Options> {
        self.apply(Options::new())
    }

    /// Applies this configuration on top of `options`.
    pub fn apply(self, mut options: Options) -> Result<Options> {
        if let Some(root) = &self.root {
            options = options.root(root);
        }
        if let Some(partials) = &self.partials {
            options = options.partials(partials);
        }
        if let Some(ext) = &self.extension {
            options = options.extension(ext);
        }
        if let Some(delimiters) = &self.delimiters {
            options = options.delimiters(&delimiters.left, &delimiters.right);
        }
        if let Some(dev) = self.dev {
            options = options.dev(dev);
        }
        if let Some(cache) = self.cache {
            options = options.cache(cache);
        }

        for name in &self.pipes {
            let value = trellis_pipes::lookup(name)
                .ok_or_else(|| Error::Config(format!("unknown pipe {:?}", name)))?;
            options = options.pipe(name, value);
        }
        Ok(options)
    }
}
