//! Helpers shared by the unit tests.

use std::cell::Cell;
use std::rc::Rc;

use crate::ast::{Expr, ExprKind, Stmt, StmtKind};
use crate::object::Function;
use crate::print_handler::{buffer_handler, SharedPrintHandler};
use crate::{Evaluator, Object, SolResult, State};

/// A minimal evaluator: `return` statements, variable references and
/// integer literals. Counts how many statements it ran.
#[derive(Default)]
pub(crate) struct MiniEvaluator {
    pub(crate) executed: Cell<usize>,
}

impl Evaluator for MiniEvaluator {
    fn exec(&self, state: &mut State, stmt: &Stmt) -> SolResult {
        self.executed.set(self.executed.get() + 1);
        match &stmt.kind {
            StmtKind::Ret { ret: Some(expr) } | StmtKind::Expr { expr: Some(expr) } => {
                let value = self.eval(state, expr)?;
                if matches!(stmt.kind, StmtKind::Ret { .. }) {
                    Ok(value)
                } else {
                    Ok(state.none())
                }
            }
            StmtKind::List { stmts } => {
                for stmt in stmts {
                    self.exec(state, stmt)?;
                }
                Ok(state.none())
            }
            _ => Ok(state.none()),
        }
    }

    fn eval(&self, state: &mut State, expr: &Expr) -> SolResult {
        match &expr.kind {
            ExprKind::Ref { ident } => Ok(state.get_var(ident)),
            ExprKind::Lit(lit) => Ok(Object::int(lit.ival)),
            _ => Ok(state.none()),
        }
    }
}

/// A state with [`MiniEvaluator`] attached and printing captured.
pub(crate) fn evaluating_state() -> (State, Rc<MiniEvaluator>, SharedPrintHandler) {
    let evaluator = Rc::new(MiniEvaluator::default());
    let output = buffer_handler();
    let state = State::builder()
        .evaluator(evaluator.clone())
        .print_handler(output.clone())
        .build();
    (state, evaluator, output)
}

/// A function returning the variable `result`.
pub(crate) fn returning(params: &[&str], result: &str) -> Function {
    Function {
        name: Some("f".to_owned()),
        params: params.iter().map(|param| (*param).to_owned()).collect(),
        rest: None,
        body: Rc::new(Stmt::ret(Expr::ident(result))),
        closure: Object::map(),
        udata: Object::map(),
        annos: Object::map(),
    }
}

/// Text of the pending error, clearing it.
pub(crate) fn take_message(state: &mut State) -> Option<String> {
    state.take_error().and_then(|(err, _)| err.as_string())
}
