//! Engine state and loading.
//!
//! An [`Engine`] owns an immutable [`Snapshot`] behind a lock: the base
//! environment (global partials, pipes and built-ins registered), the partial
//! matcher and the template set cache. [`Engine::load`] builds a complete new
//! snapshot and swaps it in, so a reader sees either the old state or the new
//! one, never a half-built mix.
//!
//! Calls hold the lock only long enough to clone the snapshot handle. A render
//! that started before a reload finishes against the snapshot it started with.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, PoisonError, RwLock};

use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use regex::Regex;

use super::functions::register_builtins;
use crate::error::{Error, Result, TemplateKind};
use crate::file_loader::FileSystem;
use crate::options::{Options, DEFAULT_LEFT_DELIMITER, DEFAULT_RIGHT_DELIMITER};
use crate::path::{ext_pattern, to_key, to_name, to_path};

/// Name prefix of globally registered partials.
pub const PARTIALS_NAMESPACE: &str = "@partials/";

/// Loaded state of an engine.
pub(crate) struct Snapshot {
    pub(crate) base: Environment<'static>,
    pub(crate) partials: Option<Regex>,
    sets: RwLock<HashMap<String, Arc<Environment<'static>>>>,
}

impl Snapshot {
    pub(crate) fn cached(&self, key: &str) -> Option<Arc<Environment<'static>>> {
        self.sets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub(crate) fn store(&self, key: String, set: Arc<Environment<'static>>) {
        self.sets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, set);
    }

    fn len(&self) -> usize {
        self.sets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when `path` lies in the global partials directory.
    pub(crate) fn is_partial(&self, path: &str) -> bool {
        self.partials
            .as_ref()
            .is_some_and(|matcher| matcher.is_match(path))
    }
}

/// Template engine with layouts, global partials and a template set cache.
///
/// # Example
///
/// ```rust
/// use trellis::{ctx, Engine, MemoryFs, Options};
///
/// let fs = MemoryFs::from_entries(&[
///     ("views/pages/home.tpl", "{{ Title }}"),
///     ("views/layout.tpl", "<html>{{ view() }}</html>"),
/// ]);
/// let engine = Engine::new(fs, Options::new().root("views"));
/// engine.load().unwrap();
///
/// let mut out = Vec::new();
/// engine
///     .render(&mut out, "pages/home", &ctx().add("Title", "Hi"), &["layout"])
///     .unwrap();
/// assert_eq!(out, b"<html>Hi</html>");
/// ```
pub struct Engine {
    pub(crate) fs: Box<dyn FileSystem>,
    pub(crate) options: Options,
    state: RwLock<Option<Arc<Snapshot>>>,
}

impl Engine {
    /// Creates an unloaded engine. Call [`load`](Self::load) before use.
    pub fn new(fs: impl FileSystem + 'static, options: Options) -> Self {
        Self {
            fs: Box::new(fs),
            options,
            state: RwLock::new(None),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// (Re)loads global partials and clears the template set cache.
    ///
    /// On failure the engine is left unloaded and every call returns
    /// [`Error::NotLoaded`] until a later `load` succeeds.
    pub fn load(&self) -> Result<()> {
        let result = self.build_snapshot();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(snapshot) => {
                *state = Some(Arc::new(snapshot));
                Ok(())
            }
            Err(err) => {
                *state = None;
                Err(err)
            }
        }
    }

    /// True once a `load` has succeeded, and no later one has failed.
    pub fn is_loaded(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of template sets in the cache.
    pub fn cached_len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, |snapshot| snapshot.len())
    }

    /// Checks whether the view `name` exists.
    ///
    /// A cached template set answers first; otherwise the file is read to
    /// test its presence.
    pub fn exists(&self, name: &str) -> Result<bool> {
        self.reload_in_dev()?;
        let snapshot = self.snapshot()?;

        let (root, ext) = (self.options.root_prefix(), self.options.ext());
        let path = to_path(name, root, ext);
        if path.is_empty() {
            return Ok(false);
        }
        if snapshot.cached(&to_key([to_name(&path, root, ext)])).is_some() {
            return Ok(true);
        }
        match self.fs.read_file(&path) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(Error::Io { path, source }),
        }
    }

    /// Development mode reloads everything before each call.
    pub(crate) fn reload_in_dev(&self) -> Result<()> {
        if self.options.is_dev() {
            tracing::debug!("Development mode, reloading templates");
            self.load()?;
        }
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> Result<Arc<Snapshot>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::NotLoaded)
    }

    /// Reads a template file as UTF-8 source.
    pub(crate) fn read_template(&self, path: &str, kind: TemplateKind) -> Result<String> {
        let not_found = || Error::NotFound {
            path: path.to_string(),
            kind,
        };
        if path.is_empty() {
            return Err(not_found());
        }
        let bytes = match self.fs.read_file(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(source) => {
                return Err(Error::Io {
                    path: path.to_string(),
                    source,
                })
            }
        };
        String::from_utf8(bytes).map_err(|source| Error::Encoding {
            path: path.to_string(),
            source,
        })
    }

    fn build_snapshot(&self) -> Result<Snapshot> {
        let mut base = self.base_environment()?;
        let (root, ext) = (self.options.root_prefix(), self.options.ext());

        let partials = match self.options.partials_prefix() {
            Some(prefix) => Some(Regex::new(&ext_pattern(prefix, ext))?),
            None => None,
        };

        let lookup_root = if root.is_empty() { "." } else { root };
        let files = self
            .fs
            .lookup(lookup_root, &Regex::new(&ext_pattern("", ext))?)
            .map_err(|source| Error::Io {
                path: lookup_root.to_string(),
                source,
            })?;

        let mut count = 0;
        if let (Some(matcher), Some(prefix)) = (&partials, self.options.partials_prefix()) {
            for path in files.iter().filter(|path| matcher.is_match(path)) {
                let source = self.read_template(path, TemplateKind::Partial)?;
                let name = format!("{}{}", PARTIALS_NAMESPACE, to_name(path, prefix, ext));
                base.add_template_owned(name, source)?;
                count += 1;
            }
        }

        tracing::debug!(
            "Loaded {} global partials from {} template files under {:?}",
            count,
            files.len(),
            lookup_root
        );

        Ok(Snapshot {
            base,
            partials,
            sets: RwLock::new(HashMap::new()),
        })
    }

    fn base_environment(&self) -> Result<Environment<'static>> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.set_undefined_behavior(UndefinedBehavior::Chainable);

        let (left, right) = self.options.delimiter_pair();
        if (left, right) != (DEFAULT_LEFT_DELIMITER, DEFAULT_RIGHT_DELIMITER) {
            env.set_syntax(
                SyntaxConfig::builder()
                    .variable_delimiters(left.to_string(), right.to_string())
                    .build()?,
            );
        }

        for (name, pipe) in self.options.pipes() {
            env.add_global(name.to_string(), pipe.clone());
        }
        register_builtins(&mut env);
        Ok(env)
    }
}
