/// Knobs for a single `KdTree::build` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildConfig {
    /// Deepest allowed leaf, counted in edges from the root. `None` lets
    /// clustered inputs grow as deep as they need.
    pub max_depth: Option<usize>,
    /// Re-check the hierarchy invariants after linearization.
    pub validate: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            validate: cfg!(debug_assertions),
        }
    }
}

impl BuildConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}
