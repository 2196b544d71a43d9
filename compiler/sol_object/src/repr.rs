//! Cycle-safe rendering of containers.
//!
//! Lists, maps and map cells render their contents recursively. Once one
//! has been rendered its identity stays in the state's seen set; meeting it
//! again anywhere in the same render produces a placeholder, so cycles
//! cannot recurse forever. The set belongs to whichever entry point
//! installed it and is torn down when that entry point returns.

use rustc_hash::FxHashSet;

use crate::{Object, SolResult, State};

/// Text standing in for a container already rendered.
pub fn placeholder(obj: &Object) -> String {
    format!("... ({:#x})", obj.id())
}

impl State {
    /// Run `f` with a seen set installed, reusing the current one if a
    /// render is already in progress.
    pub fn with_seen<T>(&mut self, f: impl FnOnce(&mut State) -> T) -> T {
        let owner = self.seen.is_none();
        if owner {
            self.seen = Some(FxHashSet::default());
        }
        let result = f(self);
        if owner {
            self.seen = None;
        }
        result
    }

    /// Render `obj` through `render`, or as a placeholder when `obj` was
    /// already rendered by the current entry point.
    pub(crate) fn guarded(
        &mut self,
        obj: &Object,
        render: impl FnOnce(&mut State) -> SolResult<String>,
    ) -> SolResult<String> {
        self.with_seen(|state| {
            let id = obj.id();
            let fresh = state.seen.as_mut().is_some_and(|seen| seen.insert(id));
            if !fresh {
                return Ok(placeholder(obj));
            }
            sol_stack::with_stack_headroom(|| render(state))
        })
    }

    /// Whether a render is in progress.
    pub fn is_rendering(&self) -> bool {
        self.seen.is_some()
    }
}
