//! Construction options for a [`State`](super::State).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Extra field holding the lower width bound set by `width_range`.
pub const MIN_WIDTH: &str = "min_width";
/// Extra field holding the upper width bound set by `width_range`.
pub const MAX_WIDTH: &str = "max_width";

/// Zero-argument lifecycle callback.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Ordered list of lifecycle callbacks.
///
/// A single closure converts into a one-element list.
#[derive(Clone, Default)]
pub struct Callbacks(Vec<Callback>);

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a callback.
    pub fn push<F>(&mut self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.0.push(Arc::new(callback));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Invokes every callback in order.
    pub fn fire(&self) {
        for callback in &self.0 {
            callback();
        }
    }
}

impl<F> From<F> for Callbacks
where
    F: Fn() + Send + Sync + 'static,
{
    fn from(callback: F) -> Self {
        Self(vec![Arc::new(callback)])
    }
}

impl FromIterator<Callback> for Callbacks {
    fn from_iter<I: IntoIterator<Item = Callback>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callbacks({})", self.0.len())
    }
}

/// Definition of a responsive state.
///
/// `id` and `query` are optional: a random id is generated and the query
/// defaults to `all`. Any other field lands in `extra`, where config options
/// look for the field that opts a state into their rule.
///
/// ```rust
/// use responsive_states::core::state::StateOptions;
///
/// let options = StateOptions::new()
///     .id("sm")
///     .width_range(Some(768), Some(991))
///     .option("colorbox", false)
///     .on_enter(|| println!("entered sm"));
///
/// assert_eq!(
///     options.query.as_deref(),
///     Some("(min-width: 768px) and (max-width: 991px)")
/// );
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip)]
    pub on_enter: Callbacks,
    #[serde(skip)]
    pub on_leave: Callbacks,
    #[serde(skip)]
    pub on_resize: Callbacks,
    #[serde(skip)]
    pub on_first_run: Callbacks,
    /// Extra fields consumed by config option predicates.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Sets the query to a viewport width range in pixels.
    ///
    /// The bounds are also kept as `min_width`/`max_width` extra fields, so
    /// config options can key on them. With neither bound the query is left
    /// untouched.
    pub fn width_range(mut self, min_width: Option<u32>, max_width: Option<u32>) -> Self {
        if let Some(query) = width_query(min_width, max_width) {
            self.query = Some(query);
        }
        self.insert_width_bounds(min_width, max_width);
        self
    }

    pub(crate) fn insert_width_bounds(&mut self, min_width: Option<u32>, max_width: Option<u32>) {
        if let Some(min) = min_width {
            self.extra.insert(MIN_WIDTH.to_string(), Value::from(min));
        }
        if let Some(max) = max_width {
            self.extra.insert(MAX_WIDTH.to_string(), Value::from(max));
        }
    }

    /// Adds an extra field for config options to key on.
    pub fn option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn on_enter<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_enter.push(callback);
        self
    }

    pub fn on_leave<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_leave.push(callback);
        self
    }

    pub fn on_resize<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_resize.push(callback);
        self
    }

    pub fn on_first_run<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_first_run.push(callback);
        self
    }
}

/// Builds a `min-width`/`max-width` query, or `None` without bounds.
pub fn width_query(min_width: Option<u32>, max_width: Option<u32>) -> Option<String> {
    match (min_width, max_width) {
        (Some(min), Some(max)) => Some(format!(
            "(min-width: {}px) and (max-width: {}px)",
            min, max
        )),
        (Some(min), None) => Some(format!("(min-width: {}px)", min)),
        (None, Some(max)) => Some(format!("(max-width: {}px)", max)),
        (None, None) => None,
    }
}
