//! Render pipeline.
//!
//! A render call names a view, and optionally a layout and extra partials:
//!
//! ```text
//! engine.render(&mut out, "pages/home", &data, &["layout", "forms/contact"])
//!                         ^ view                 ^ layout  ^ per-call partials
//! ```
//!
//! The call resolves to a template set keyed by `view:layout:partials`, with
//! the layout slot left empty (`view::partials`) when partials come without a
//! layout. On a miss the base environment is cloned and the view (as
//! `view::<id>`), the layout (as `layout::<id>`) and each partial (under its
//! own id) are added.
//! With caching on, the set is kept for the next identical call.
//!
//! Without a layout the view renders directly. With one, the view renders
//! first and its markup is handed to the layout through `view()`. Output is
//! buffered, so a failing render writes nothing.

use std::io::Write;
use std::sync::Arc;

use minijinja::{Environment, Value};
use serde::Serialize;

use super::engine::{Engine, Snapshot};
use super::functions::render_scope;
use crate::error::{Error, Result, TemplateKind};
use crate::options::Options;
use crate::path::{to_key, to_name, to_path, KEY_SEPARATOR};

/// Name of the view template inside a template set.
pub fn view_name(id: &str) -> String {
    format!("view::{}", id)
}

/// Name of the layout template inside a template set.
pub fn layout_name(id: &str) -> String {
    format!("layout::{}", id)
}

#[derive(Debug, Clone, PartialEq)]
struct Resolved {
    path: String,
    id: String,
}

impl Resolved {
    fn new(name: &str, options: &Options) -> Self {
        let (root, ext) = (options.root_prefix(), options.ext());
        let path = to_path(name, root, ext);
        let id = to_name(&path, root, ext);
        Self { path, id }
    }
}

/// The templates one render call needs, and their cache key.
#[derive(Debug, Clone, PartialEq)]
struct RenderPlan {
    view: Resolved,
    layout: Option<Resolved>,
    partials: Vec<Resolved>,
    key: String,
}

impl RenderPlan {
    /// `layouts[0]` is the layout (empty for none); the rest are partials.
    fn new(options: &Options, name: &str, layouts: &[&str]) -> Self {
        let view = Resolved::new(name, options);
        let layout = layouts
            .first()
            .map(|layout| Resolved::new(layout, options))
            .filter(|layout| !layout.path.is_empty());
        let partials: Vec<Resolved> = layouts
            .iter()
            .skip(1)
            .map(|partial| Resolved::new(partial, options))
            .filter(|partial| !partial.path.is_empty())
            .collect();

        let layout_id = layout.as_ref().map_or("", |layout| layout.id.as_str());
        let mut key = to_key([view.id.as_str(), layout_id]);
        if !partials.is_empty() {
            // Keep the layout slot, or `a` with partial `b` would share a set
            // with `a` in layout `b`.
            if layout.is_none() {
                key.push(KEY_SEPARATOR);
            }
            key.push(KEY_SEPARATOR);
            key.push_str(&to_key(partials.iter().map(|partial| partial.id.as_str())));
        }

        Self {
            view,
            layout,
            partials,
            key,
        }
    }

    /// Partial files are reachable only through `@partials/` or
    /// `include`/`require`.
    fn check_partials(&self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.is_partial(&self.view.path) {
            return Err(Error::PartialRender(self.view.path.clone()));
        }
        if let Some(layout) = self.layout.as_ref().filter(|l| snapshot.is_partial(&l.path)) {
            return Err(Error::PartialRender(layout.path.clone()));
        }
        if let Some(partial) = self.partials.iter().find(|p| snapshot.is_partial(&p.path)) {
            return Err(Error::PartialLoaded(partial.path.clone()));
        }
        Ok(())
    }
}

impl Engine {
    /// Renders the view `name` into `w`.
    ///
    /// `layouts[0]`, when present and non-empty, names the layout. Further
    /// entries name partials added to the template set of this call only.
    ///
    /// # Errors
    ///
    /// Missing files, partial files used as view or layout, template errors
    /// and a failing sink. Nothing is written to `w` unless the render
    /// succeeds.
    pub fn render<W, S>(&self, w: &mut W, name: &str, data: &S, layouts: &[&str]) -> Result<()>
    where
        W: Write + ?Sized,
        S: Serialize + ?Sized,
    {
        let output = self.render_to_string(name, data, layouts)?;
        w.write_all(output.as_bytes()).map_err(Error::Write)
    }

    /// Renders into a buffer. Same as [`render`](Self::render) with `layout`
    /// followed by `partials`.
    pub fn compile<S>(&self, name: &str, layout: &str, data: &S, partials: &[&str]) -> Result<Vec<u8>>
    where
        S: Serialize + ?Sized,
    {
        let layouts: Vec<&str> = std::iter::once(layout)
            .chain(partials.iter().copied())
            .collect();
        Ok(self.render_to_string(name, data, &layouts)?.into_bytes())
    }

    fn render_to_string<S>(&self, name: &str, data: &S, layouts: &[&str]) -> Result<String>
    where
        S: Serialize + ?Sized,
    {
        self.reload_in_dev()?;
        let snapshot = self.snapshot()?;

        let plan = RenderPlan::new(&self.options, name, layouts);
        plan.check_partials(&snapshot)?;
        let set = self.template_set(&snapshot, &plan)?;

        let data = Value::from_serialize(data);
        let view = set.get_template(&view_name(&plan.view.id))?;
        let Some(layout) = &plan.layout else {
            return Ok(view.render(render_scope(&data, None))?);
        };

        let markup = Value::from_safe_string(view.render(render_scope(&data, None))?);
        let layout = set.get_template(&layout_name(&layout.id))?;
        Ok(layout.render(render_scope(&data, Some(markup)))?)
    }

    fn template_set(&self, snapshot: &Snapshot, plan: &RenderPlan) -> Result<Arc<Environment<'static>>> {
        if let Some(set) = snapshot.cached(&plan.key) {
            tracing::trace!("Template set cache hit for {:?}", plan.key);
            return Ok(set);
        }

        let mut set = snapshot.base.clone();
        let source = self.read_template(&plan.view.path, TemplateKind::View)?;
        set.add_template_owned(view_name(&plan.view.id), source)?;
        if let Some(layout) = &plan.layout {
            let source = self.read_template(&layout.path, TemplateKind::Layout)?;
            set.add_template_owned(layout_name(&layout.id), source)?;
        }
        for partial in &plan.partials {
            let source = self.read_template(&partial.path, TemplateKind::Partial)?;
            set.add_template_owned(partial.id.clone(), source)?;
        }

        let set = Arc::new(set);
        if self.options.caching() {
            tracing::debug!("Caching template set {:?}", plan.key);
            snapshot.store(plan.key.clone(), Arc::clone(&set));
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Options {
        Options::new().root("views").partials("views/partials")
    }

    #[test]
    fn test_plan_view_only() {
        let plan = RenderPlan::new(&options(), "pages/home", &[]);
        assert_eq!(plan.view.path, "views/pages/home.tpl");
        assert_eq!(plan.view.id, "pages/home");
        assert!(plan.layout.is_none());
        assert!(plan.partials.is_empty());
        assert_eq!(plan.key, "pages/home");
    }

    #[test]
    fn test_plan_layout_and_partials() {
        let plan = RenderPlan::new(
            &options(),
            "pages/home",
            &["layout", "", "forms/contact", "views/widgets/map.tpl"],
        );
        assert_eq!(plan.layout.as_ref().unwrap().path, "views/layout.tpl");
        let ids: Vec<&str> = plan.partials.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["forms/contact", "widgets/map"]);
        assert_eq!(plan.key, "pages/home:layout:forms/contact:widgets/map");
    }

    #[test]
    fn test_plan_partials_without_layout() {
        let plan = RenderPlan::new(&options(), "pages/home", &["", "forms/contact"]);
        assert!(plan.layout.is_none());
        assert_eq!(plan.key, "pages/home::forms/contact");

        let layout = RenderPlan::new(&options(), "pages/home", &["forms/contact"]);
        assert_eq!(layout.key, "pages/home:forms/contact");
        assert_ne!(plan.key, layout.key);
    }

    #[test]
    fn test_plan_key_distinguishes_order() {
        let a = RenderPlan::new(&options(), "x", &["l", "p1", "p2"]);
        let b = RenderPlan::new(&options(), "x", &["l", "p2", "p1"]);
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn test_template_names() {
        assert_eq!(view_name("pages/home"), "view::pages/home");
        assert_eq!(layout_name("layout"), "layout::layout");
    }
}
