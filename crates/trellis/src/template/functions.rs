//! Built-in template functions.
//!
//! | Function | Behavior |
//! |----------|----------|
//! | `view()` | Rendered markup of the child view, inside a layout |
//! | `exists(name)` | Whether a template of that name is in the current set (prints as `True`/`False`) |
//! | `include(name, data?)` | Renders a template, empty output if it is missing |
//! | `require(name, data?)` | Renders a template, error if it is missing |
//!
//! The functions are registered once on the base environment and shared by
//! every template set cloned from it. The only per-render state, the child
//! view markup, travels in the render scope under [`VIEW_SLOT`], so a cached
//! set is never touched by a render call.

use std::collections::BTreeMap;

use minijinja::value::{Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind, State};

/// Scope key holding the rendered child view during a layout render.
pub const VIEW_SLOT: &str = "__trellis_view";

/// Scope key under which non-map render data is exposed.
pub const DATA_KEY: &str = "data";

/// Registers the built-in functions on `env`.
///
/// Registered after the custom pipes, so a pipe cannot shadow a built-in.
pub fn register_builtins(env: &mut Environment<'static>) {
    env.add_function("view", view);
    env.add_function("exists", exists);
    env.add_function("include", include);
    env.add_function("require", require);
}

fn view(state: &State) -> Result<Value, Error> {
    match state.lookup(VIEW_SLOT) {
        Some(markup) if !markup.is_undefined() => Ok(markup),
        _ => Err(Error::new(
            ErrorKind::InvalidOperation,
            "layout template called without view",
        )),
    }
}

fn exists(state: &State, name: &str) -> bool {
    state.env().get_template(name).is_ok()
}

fn include(state: &State, name: &str, data: Option<Value>) -> Result<Value, Error> {
    execute(state, name, data, false)
}

fn require(state: &State, name: &str, data: Option<Value>) -> Result<Value, Error> {
    execute(state, name, data, true)
}

fn execute(state: &State, name: &str, data: Option<Value>, required: bool) -> Result<Value, Error> {
    let template = match state.env().get_template(name) {
        Ok(template) => template,
        Err(err) if err.kind() == ErrorKind::TemplateNotFound && !required => {
            return Ok(Value::from_safe_string(String::new()));
        }
        Err(err) => return Err(err),
    };
    let data = data.unwrap_or(Value::UNDEFINED);
    let scope = render_scope(&data, state.lookup(VIEW_SLOT));
    Ok(Value::from_safe_string(template.render(scope)?))
}

/// Builds the root scope for a template execution.
///
/// Map data is spread into the scope. Other data is exposed as `data`, and
/// none or undefined gives an empty scope. Only `view` fills [`VIEW_SLOT`];
/// a data key of that name is dropped.
pub fn render_scope(data: &Value, view: Option<Value>) -> Value {
    let mut scope = BTreeMap::new();
    match data.kind() {
        ValueKind::Undefined | ValueKind::None => {}
        ValueKind::Map => {
            if let Ok(keys) = data.try_iter() {
                for key in keys {
                    if key.as_str() == Some(VIEW_SLOT) {
                        continue;
                    }
                    if let Ok(value) = data.get_item(&key) {
                        scope.insert(key.to_string(), value);
                    }
                }
            }
        }
        _ => {
            scope.insert(DATA_KEY.to_string(), data.clone());
        }
    }
    if let Some(view) = view.filter(|view| !view.is_undefined()) {
        scope.insert(VIEW_SLOT.to_string(), view);
    }
    Value::from(scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::AutoEscape;
    use serde_json::json;

    fn env(templates: &[(&'static str, &'static str)]) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        register_builtins(&mut env);
        for &(name, source) in templates {
            env.add_template(name, source).unwrap();
        }
        env
    }

    fn data() -> Value {
        Value::from_serialize(json!({ "Title": "Hi", "Items": ["a", "b"] }))
    }

    #[test]
    fn test_render_scope_spreads_maps() {
        let scope = render_scope(&data(), None);
        assert_eq!(scope.get_attr("Title").unwrap().as_str(), Some("Hi"));
        assert!(scope.get_attr(VIEW_SLOT).unwrap().is_undefined());
    }

    #[test]
    fn test_render_scope_wraps_other_values() {
        let scope = render_scope(&Value::from(42), None);
        assert_eq!(scope.get_attr(DATA_KEY).unwrap().as_i64(), Some(42));

        let scope = render_scope(&Value::from(()), None);
        assert_eq!(scope.len(), Some(0));
    }

    #[test]
    fn test_view_returns_markup_unescaped() {
        let env = env(&[("layout", "<main>{{ view() }}</main>")]);
        let scope = render_scope(&data(), Some(Value::from_safe_string("<p>x</p>".into())));
        let out = env.get_template("layout").unwrap().render(scope).unwrap();
        assert_eq!(out, "<main><p>x</p></main>");
    }

    #[test]
    fn test_view_without_layout_render_fails() {
        let env = env(&[("page", "{{ view() }}")]);
        let err = env
            .get_template("page")
            .unwrap()
            .render(render_scope(&data(), None))
            .unwrap_err();
        assert!(err.to_string().contains("layout template called without view"));
    }

    #[test]
    fn test_exists() {
        let env = env(&[
            ("@partials/nav", "nav"),
            (
                "page",
                r#"{% if exists("@partials/nav") %}y{% endif %}{% if not exists("nope") %}n{% endif %}"#,
            ),
        ]);
        let out = env.get_template("page").unwrap().render(render_scope(&data(), None));
        assert_eq!(out.unwrap(), "yn");
    }

    #[test]
    fn test_payload_cannot_fill_view_slot() {
        let env = env(&[("page", "[{{ view() }}]")]);
        let data = Value::from_serialize(json!({ "__trellis_view": "spoof", "Title": "Hi" }));
        let scope = render_scope(&data, None);
        assert!(scope.get_attr(VIEW_SLOT).unwrap().is_undefined());
        assert_eq!(scope.get_attr("Title").unwrap().as_str(), Some("Hi"));

        let err = env.get_template("page").unwrap().render(scope).unwrap_err();
        assert!(err.to_string().contains("layout template called without view"));
    }

    #[test]
    fn test_include_missing_is_empty() {
        let env = env(&[("page", r#"[{{ include("missing") }}]"#)]);
        let out = env.get_template("page").unwrap().render(render_scope(&data(), None));
        assert_eq!(out.unwrap(), "[]");
    }

    #[test]
    fn test_require_missing_fails() {
        let env = env(&[("page", r#"[{{ require("missing") }}]"#)]);
        let out = env.get_template("page").unwrap().render(render_scope(&data(), None));
        assert!(out.is_err());
    }

    #[test]
    fn test_include_with_data_is_not_escaped_twice() {
        let env = env(&[
            ("item", "<li>{{ data }}</li>"),
            (
                "page",
                r#"<ul>{% for item in Items %}{{ include("item", item) }}{% endfor %}</ul>"#,
            ),
        ]);
        let out = env.get_template("page").unwrap().render(render_scope(&data(), None));
        assert_eq!(out.unwrap(), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn test_include_without_data_has_empty_scope() {
        let env = env(&[("title", "[{{ Title }}]"), ("page", r#"{{ include("title") }}"#)]);
        let out = env.get_template("page").unwrap().render(render_scope(&data(), None));
        assert_eq!(out.unwrap(), "[]");
    }

    #[test]
    fn test_view_slot_carried_into_partials() {
        let env = env(&[
            ("@partials/frame", "<div>{{ view() }}</div>"),
            ("layout", r#"{{ require("@partials/frame", Items) }}"#),
        ]);
        let scope = render_scope(&data(), Some(Value::from_safe_string("body".into())));
        let out = env.get_template("layout").unwrap().render(scope).unwrap();
        assert_eq!(out, "<div>body</div>");
    }
}
