//! The interpreter context.
//!
//! A [`State`] owns everything a running Sol program shares: the `None`
//! sentinel, the scope chain, the call stack, the pending-error slot, the
//! per-type method tables and the attached collaborators. Every operation
//! takes it explicitly.

mod builder;

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::ast::{Expr, Stmt};
use crate::errors::{self, Raised, RuntimeError, SolResult};
use crate::object::{ObjType, Object, Payload};
use crate::ops::Op;
use crate::print_handler::SharedPrintHandler;

pub use builder::{StateBuilder, StateConfig};

/// Executes AST nodes on behalf of the runtime.
///
/// The parser and the evaluation loop live outside this crate; function
/// calls and AST node calls reach them through this trait.
pub trait Evaluator {
    /// Run `stmt`. Returns the value of a `return`, or `None`.
    fn exec(&self, state: &mut State, stmt: &Stmt) -> SolResult;

    fn eval(&self, state: &mut State, expr: &Expr) -> SolResult;
}

/// Resolves native libraries and symbols for `ffi.open` and `dylib[name]`.
pub trait LibraryLoader {
    /// Open the library at `path`, returning an opaque handle.
    fn open(&self, path: &str) -> Option<usize>;

    /// Address of `name` in the library behind `handle`.
    fn symbol(&self, handle: usize, name: &str) -> Option<usize>;
}

pub struct State {
    none: Object,
    globals: Object,
    /// Scope maps, outermost (the globals) first.
    scopes: Vec<Object>,
    /// Executing callables, outermost first.
    fnstack: Vec<Object>,
    /// Nested `__index` / `__setindex` delegations in progress.
    delegations: usize,
    error: Option<Object>,
    traceback: Option<Object>,
    /// Type name to method map.
    methods: Object,
    /// Extra references held on behalf of `debug.setref`.
    pins: FxHashMap<usize, Vec<Object>>,
    /// Containers currently being rendered, while a render is in progress.
    pub(crate) seen: Option<FxHashSet<usize>>,
    config: StateConfig,
    print: SharedPrintHandler,
    evaluator: Option<Rc<dyn Evaluator>>,
    loader: Option<Rc<dyn LibraryLoader>>,
}

impl State {
    /// A state with default configuration and the full builtin library.
    pub fn new() -> State {
        StateBuilder::new().build()
    }

    pub fn builder() -> StateBuilder {
        StateBuilder::new()
    }

    /// The `None` sentinel.
    pub fn none(&self) -> Object {
        self.none.clone()
    }

    pub fn is_none(&self, obj: &Object) -> bool {
        obj.ptr_eq(&self.none)
    }

    pub fn globals(&self) -> Object {
        self.globals.clone()
    }

    pub fn config(&self) -> &StateConfig {
        &self.config
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print
    }

    pub fn evaluator(&self) -> Option<Rc<dyn Evaluator>> {
        self.evaluator.clone()
    }

    pub fn loader(&self) -> Option<Rc<dyn LibraryLoader>> {
        self.loader.clone()
    }

    /// Method map for `ty`, if the type has one.
    pub fn methods_for(&self, ty: ObjType) -> Option<Object> {
        self.map_get_name(&self.methods, ty.name())
    }

    /// The method-table registry, keyed by type name.
    pub fn method_tables(&self) -> Object {
        self.methods.clone()
    }

    // Error slot

    /// Install `err` as the pending error, capturing the call stack as the
    /// traceback (innermost callable first).
    pub fn set_error(&mut self, err: Object) -> Raised {
        let frames = self.fnstack.iter().rev().cloned().collect();
        self.traceback = Some(Object::list(frames));
        self.error = Some(err);
        Raised(())
    }

    /// Install the message of a runtime error as the pending error.
    pub fn raise(&mut self, err: RuntimeError) -> Raised {
        tracing::trace!(error = %err, "raising runtime error");
        self.set_error(Object::string(err.to_string()))
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<Object> {
        self.error.clone()
    }

    pub fn traceback(&self) -> Option<Object> {
        self.traceback.clone()
    }

    /// Empty the slot, returning the error and its traceback.
    pub fn take_error(&mut self) -> Option<(Object, Object)> {
        let err = self.error.take()?;
        let traceback = self
            .traceback
            .take()
            .unwrap_or_else(|| Object::list(Vec::new()));
        Some((err, traceback))
    }

    pub fn clear_error(&mut self) {
        self.error = None;
        self.traceback = None;
    }

    /// Collapse a result to a plain object: the value, or `None` with the
    /// error left pending.
    pub fn settle(&self, result: SolResult) -> Object {
        result.unwrap_or_else(|Raised(())| self.none())
    }

    // Call stack

    /// Record `callable` as executing. Fails past the configured depth.
    pub fn push_frame(&mut self, callable: &Object) -> SolResult<()> {
        self.check_depth()?;
        self.fnstack.push(callable.clone());
        Ok(())
    }

    /// Run a metamethod delegation from one container to another. Chains of
    /// delegation nest like calls and share their depth limit.
    pub(crate) fn delegate(&mut self, run: impl FnOnce(&mut State) -> SolResult) -> SolResult {
        self.check_depth()?;
        self.delegations += 1;
        let result = sol_stack::with_stack_headroom(|| run(self));
        self.delegations -= 1;
        result
    }

    fn check_depth(&mut self) -> SolResult<()> {
        let limit = self.config.max_call_depth;
        if self.fnstack.len() + self.delegations >= limit {
            return Err(self.raise(errors::recursion_limit(limit)));
        }
        Ok(())
    }

    /// Pop the frame pushed for `callable`.
    pub fn pop_frame(&mut self, callable: &Object) -> SolResult<()> {
        match self.fnstack.pop() {
            Some(top) if top.ptr_eq(callable) => Ok(()),
            popped => {
                tracing::error!(
                    expected = callable.id(),
                    popped = popped.as_ref().map(Object::id),
                    "function stack imbalance"
                );
                Err(self.raise(errors::stack_imbalance()))
            }
        }
    }

    /// Executing callables, innermost first.
    pub fn fnstack(&self) -> Object {
        Object::list(self.fnstack.iter().rev().cloned().collect())
    }

    pub fn call_depth(&self) -> usize {
        self.fnstack.len()
    }

    // Scopes

    pub fn push_scope(&mut self, scope: Object) {
        self.scopes.push(scope);
    }

    /// Pop the innermost scope. The globals are never popped.
    pub fn pop_scope(&mut self) -> Option<Object> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    /// Innermost scope map.
    pub fn locals(&self) -> Object {
        self.scopes
            .last()
            .cloned()
            .unwrap_or_else(|| self.globals.clone())
    }

    /// Scope maps, innermost first.
    pub fn scopes(&self) -> Object {
        Object::list(self.scopes.iter().rev().cloned().collect())
    }

    /// Look `name` up from the innermost scope outwards.
    pub fn get_var(&self, name: &str) -> Object {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| self.map_get_name(scope, name))
            .unwrap_or_else(|| self.none())
    }

    /// Assign `name` in the innermost scope that binds it, else the
    /// innermost scope.
    pub fn set_var(&self, name: &str, value: Object) {
        let scope = self
            .scopes
            .iter()
            .rev()
            .find(|scope| self.map_get_name(scope, name).is_some())
            .cloned()
            .unwrap_or_else(|| self.locals());
        self.map_set_name(&scope, name, value);
    }

    // Pins

    /// Hold `count` extra references to `obj`.
    pub(crate) fn pin(&mut self, obj: &Object, count: usize) {
        let pins = self.pins.entry(obj.id()).or_default();
        pins.extend(std::iter::repeat_with(|| obj.clone()).take(count));
    }

    /// Release up to `count` references previously pinned for `obj`.
    pub(crate) fn unpin(&mut self, obj: &Object, count: usize) {
        let id = obj.id();
        if let Some(pins) = self.pins.get_mut(&id) {
            let keep = pins.len().saturating_sub(count);
            pins.truncate(keep);
            if pins.is_empty() {
                self.pins.remove(&id);
            }
        }
    }

    // Dispatch

    /// Invoke `op` for the type of `args[0]` (the subject).
    pub fn dispatch(&mut self, op: Op, args: &[Object]) -> SolResult {
        let ty = args.first().map_or(ObjType::Singlet, Object::ty);
        match crate::ops::handler(ty, op) {
            Some(handler) => handler(self, args),
            None => {
                tracing::debug!(op = op.name(), ty = ty.name(), "operation not implemented");
                Err(self.raise(errors::not_implemented(op, ty)))
            }
        }
    }

    pub fn unary(&mut self, op: Op, obj: &Object) -> SolResult {
        self.dispatch(op, std::slice::from_ref(obj))
    }

    pub fn binary(&mut self, op: Op, lhs: &Object, rhs: &Object) -> SolResult {
        self.dispatch(op, &[lhs.clone(), rhs.clone()])
    }

    /// Three-way comparison, always in {-1, 0, 1}.
    pub fn cmp(&mut self, lhs: &Object, rhs: &Object) -> SolResult<i64> {
        let result = sol_stack::with_stack_headroom(|| self.binary(Op::Cmp, lhs, rhs))?;
        Ok(result.as_int().map_or(1, i64::signum))
    }

    pub fn index(&mut self, obj: &Object, key: &Object) -> SolResult {
        self.binary(Op::Index, obj, key)
    }

    pub fn set_index(&mut self, obj: &Object, key: &Object, value: &Object) -> SolResult<()> {
        self.dispatch(Op::SetIndex, &[obj.clone(), key.clone(), value.clone()])?;
        Ok(())
    }

    /// Call `callable` with `args`.
    pub fn call(&mut self, callable: &Object, args: &[Object]) -> SolResult {
        let mut full: SmallVec<[Object; 8]> = SmallVec::with_capacity(args.len() + 1);
        full.push(callable.clone());
        full.extend(args.iter().cloned());
        sol_stack::with_stack_headroom(|| self.dispatch(Op::Call, &full))
    }

    pub fn len(&mut self, obj: &Object) -> SolResult<i64> {
        let len = self.unary(Op::Len, obj)?;
        self.expect_int(&len)
    }

    /// The stepping function for iterating `obj`.
    pub fn iter(&mut self, obj: &Object) -> SolResult {
        self.unary(Op::Iter, obj)
    }

    pub fn to_int(&mut self, obj: &Object) -> SolResult<i64> {
        if let Some(value) = obj.as_int() {
            return Ok(value);
        }
        let converted = self.unary(Op::ToInt, obj)?;
        self.expect_int(&converted)
    }

    pub fn to_float(&mut self, obj: &Object) -> SolResult<f64> {
        if let Some(value) = obj.as_float() {
            return Ok(value);
        }
        let converted = self.unary(Op::ToFloat, obj)?;
        match converted.as_float() {
            Some(value) => Ok(value),
            None => Err(self.raise(errors::type_mismatch(ObjType::Float, converted.ty()))),
        }
    }

    pub fn to_string(&mut self, obj: &Object) -> SolResult<String> {
        if let Some(value) = obj.as_string() {
            return Ok(value);
        }
        let converted = self.unary(Op::ToString, obj)?;
        self.expect_text(&converted)
    }

    pub fn to_buffer(&mut self, obj: &Object) -> SolResult {
        self.unary(Op::ToBuffer, obj)
    }

    pub fn repr(&mut self, obj: &Object) -> SolResult<String> {
        let converted = self.unary(Op::Repr, obj)?;
        self.expect_text(&converted)
    }

    fn expect_int(&mut self, obj: &Object) -> SolResult<i64> {
        match obj.as_int() {
            Some(value) => Ok(value),
            None => Err(self.raise(errors::type_mismatch(ObjType::Int, obj.ty()))),
        }
    }

    /// Text of a conversion result: a string, or a name-like buffer.
    fn expect_text(&mut self, obj: &Object) -> SolResult<String> {
        if let Some(value) = obj.as_string() {
            return Ok(value);
        }
        match obj.name_bytes() {
            Some(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            None => Err(self.raise(errors::type_mismatch(ObjType::Str, obj.ty()))),
        }
    }
}

impl Default for State {
    fn default() -> Self {
        State::new()
    }
}

impl Drop for State {
    /// Empty the global and scope maps so closures that captured them do
    /// not keep each other alive.
    fn drop(&mut self) {
        let mut doomed = Vec::new();
        for scope in std::iter::once(&self.globals).chain(&self.scopes) {
            if let Ok(mut payload) = scope.try_borrow_mut() {
                if let Payload::Map(cells) = &mut *payload {
                    doomed.append(cells);
                }
            }
        }
        self.pins.clear();
        drop(doomed);
    }
}
