//! `StateBuilder` for creating states with various configurations.

use std::rc::Rc;

use super::{Evaluator, LibraryLoader, State};
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::Object;

/// Tunables fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateConfig {
    /// Calls nested deeper than this raise a recursion error.
    pub max_call_depth: usize,
    /// Buffer size bounding `"LINE"` stream reads.
    pub line_chunk: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        StateConfig {
            max_call_depth: 1024,
            line_chunk: 4096,
        }
    }
}

/// Builder for [`State`].
///
/// ```text
/// let output = buffer_handler();
/// let state = StateBuilder::new()
///     .print_handler(output.clone())
///     .evaluator(Rc::new(MyEvaluator))
///     .build();
/// ```
#[derive(Default)]
pub struct StateBuilder {
    config: StateConfig,
    print_handler: Option<SharedPrintHandler>,
    evaluator: Option<Rc<dyn Evaluator>>,
    loader: Option<Rc<dyn LibraryLoader>>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.config.max_call_depth = depth;
        self
    }

    #[must_use]
    pub fn line_chunk(mut self, chunk: usize) -> Self {
        self.config.line_chunk = chunk;
        self
    }

    /// Set where `print` and `prepr` write. Default is stdout.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn evaluator(mut self, evaluator: Rc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    #[must_use]
    pub fn library_loader(mut self, loader: Rc<dyn LibraryLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Build the state and install the builtin library into its globals.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn build(self) -> State {
        let globals = Object::map();
        let mut state = State {
            none: Object::singlet("None"),
            globals: globals.clone(),
            scopes: vec![globals],
            fnstack: Vec::new(),
            delegations: 0,
            error: None,
            traceback: None,
            methods: Object::map(),
            pins: Default::default(),
            seen: None,
            config: self.config,
            print: self.print_handler.unwrap_or_else(stdout_handler),
            evaluator: self.evaluator,
            loader: self.loader,
        };
        crate::builtins::install(&mut state);
        tracing::debug!(
            max_call_depth = state.config.max_call_depth,
            line_chunk = state.config.line_chunk,
            "state ready"
        );
        state
    }
}
