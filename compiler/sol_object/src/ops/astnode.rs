//! `stmtnode` and `exprnode` handlers: field access, rewriting and calls.
//!
//! Reads hand out deep copies, so a script holding a child node never
//! aliases the tree it came from. Writes deep-replace a field and quietly
//! ignore values of the wrong shape.

use super::{arg, opt_arg, Handler, Op};
use crate::ast::{Expr, ExprKind, Loc, Stmt, StmtKind};
use crate::errors;
use crate::map::map_of;
use crate::object::{ObjType, Object, Payload};
use crate::{SolResult, State};

pub(super) fn handler(op: Op) -> Option<Handler> {
    match op {
        Op::Call => Some(call),
        Op::Index => Some(index),
        Op::SetIndex => Some(setindex),
        Op::ToString => Some(tostring),
        Op::Add
        | Op::Sub
        | Op::Mul
        | Op::Div
        | Op::Mod
        | Op::Pow
        | Op::TBang
        | Op::BAnd
        | Op::BOr
        | Op::BXor
        | Op::BLsh
        | Op::BRsh
        | Op::BNot
        | Op::Cmp
        | Op::Len
        | Op::Iter
        | Op::ToInt
        | Op::ToFloat
        | Op::ToBuffer
        | Op::Repr
        | Op::Init
        | Op::Free => None,
    }
}

/// Node kinds for `kind` reads.
const STMT_KIND: i64 = -1;
const EXPR_KIND: i64 = -2;

/// A node copied out of its object.
enum Node {
    Stmt(Stmt),
    Expr(Expr),
}

/// Copy the node out of `obj`, raising for absent nodes and non-nodes.
fn node_of(state: &mut State, obj: &Object) -> SolResult<Node> {
    let node = match &*obj.borrow() {
        Payload::Stmt(Some(stmt)) => Ok(Node::Stmt((**stmt).clone())),
        Payload::Expr(Some(expr)) => Ok(Node::Expr((**expr).clone())),
        Payload::Stmt(None) | Payload::Expr(None) => Err(errors::null_ast_node()),
        other => Err(errors::type_mismatch(ObjType::Expr, other.ty())),
    };
    node.map_err(|err| state.raise(err))
}

fn call(state: &mut State, args: &[Object]) -> SolResult {
    let target = arg(state, args, 0);
    let node = node_of(state, &target)?;
    let Some(evaluator) = state.evaluator() else {
        return Err(state.raise(errors::no_evaluator()));
    };
    let env = opt_arg(state, args, 1);
    if let Some(env) = &env {
        state.push_scope(env.clone());
    }
    let result = sol_stack::with_stack_headroom(|| match &node {
        Node::Stmt(stmt) => {
            evaluator.exec(state, stmt)?;
            Ok(state.none())
        }
        Node::Expr(expr) => evaluator.eval(state, expr),
    });
    if env.is_some() {
        state.pop_scope();
    }
    result
}

fn tostring(state: &mut State, args: &[Object]) -> SolResult {
    let text = match &*arg(state, args, 0).borrow() {
        Payload::Stmt(Some(stmt)) => format!("<Stmt[{}]>", stmt.kind.name()),
        Payload::Stmt(None) => "<NULL Stmt>".to_owned(),
        Payload::Expr(Some(expr)) => format!("<Expr[{}]>", expr.kind.name()),
        Payload::Expr(None) => "<NULL Expr>".to_owned(),
        _ => "<Invalid Node>".to_owned(),
    };
    Ok(Object::string(text))
}

// Reads

fn index(state: &mut State, args: &[Object]) -> SolResult {
    let target = arg(state, args, 0);
    let node = node_of(state, &target)?;
    let field = state.to_string(&arg(state, args, 1))?;
    let value = match &node {
        Node::Stmt(stmt) => read_common(STMT_KIND, stmt.kind.discriminant(), stmt.loc, &field)
            .or_else(|| read_stmt(&stmt.kind, &field)),
        Node::Expr(expr) => read_common(EXPR_KIND, expr.kind.discriminant(), expr.loc, &field)
            .or_else(|| read_expr(&expr.kind, &field)),
    };
    Ok(value.unwrap_or_else(|| state.none()))
}

fn read_common(kind: i64, discriminant: i64, loc: Loc, field: &str) -> Option<Object> {
    match field {
        "kind" => Some(Object::int(kind)),
        "type" => Some(Object::int(discriminant)),
        "loc" => Some(map_of([
            ("line", Object::int(loc.line)),
            ("col", Object::int(loc.col)),
        ])),
        _ => None,
    }
}

fn expr_obj(expr: Option<&Expr>) -> Object {
    Object::expr(expr.cloned())
}

fn stmt_obj(stmt: Option<&Stmt>) -> Object {
    Object::stmt(stmt.cloned())
}

fn exprs_obj(exprs: &[Expr]) -> Object {
    Object::list(exprs.iter().map(|expr| expr_obj(Some(expr))).collect())
}

fn read_stmt(kind: &StmtKind, field: &str) -> Option<Object> {
    let value = match (kind, field) {
        (StmtKind::Expr { expr }, "expr") => expr_obj(expr.as_deref()),
        (StmtKind::List { stmts }, "stmtlist") => Object::list(
            stmts.iter().map(|stmt| stmt_obj(Some(stmt))).collect(),
        ),
        (StmtKind::Ret { ret }, "ret") => expr_obj(ret.as_deref()),
        (StmtKind::Cont { val } | StmtKind::Break { val }, "val") => expr_obj(val.as_deref()),
        _ => return None,
    };
    Some(value)
}

fn read_expr(kind: &ExprKind, field: &str) -> Option<Object> {
    let value = match (kind, field) {
        (ExprKind::Lit(lit), "littype") => Object::int(lit.littype),
        (ExprKind::Lit(lit), "ival") => Object::int(lit.ival),
        (ExprKind::Lit(lit), "fval") => Object::float(lit.fval),
        (ExprKind::Lit(lit), "str") => Object::string(lit.str.as_str()),
        (ExprKind::ListGen { list }, "list") => exprs_obj(list),
        (ExprKind::MapGen { map }, "map") => Object::list(
            map.iter()
                .map(|(key, value)| {
                    Object::list(vec![expr_obj(Some(key)), expr_obj(Some(value))])
                })
                .collect(),
        ),
        (ExprKind::BinOp { op, .. }, "binoptype") | (ExprKind::UnOp { op, .. }, "unoptype") => {
            Object::int(*op)
        }
        (ExprKind::BinOp { left, .. }, "left") => expr_obj(left.as_deref()),
        (ExprKind::BinOp { right, .. }, "right") => expr_obj(right.as_deref()),
        (
            ExprKind::UnOp { expr, .. }
            | ExprKind::Index { expr, .. }
            | ExprKind::SetIndex { expr, .. }
            | ExprKind::Call { expr, .. },
            "expr",
        ) => expr_obj(expr.as_deref()),
        (ExprKind::Index { index, .. } | ExprKind::SetIndex { index, .. }, "index") => {
            expr_obj(index.as_deref())
        }
        (ExprKind::SetIndex { value, .. } | ExprKind::Assign { value, .. }, "value") => {
            expr_obj(value.as_deref())
        }
        (ExprKind::Assign { ident, .. } | ExprKind::Ref { ident }, "ident") => {
            Object::string(ident.as_str())
        }
        (ExprKind::Call { args, .. }, "args") => exprs_obj(args),
        (ExprKind::FuncDecl { name, .. }, "name") => {
            Object::string(name.as_deref().unwrap_or_default())
        }
        (ExprKind::FuncDecl { args, .. }, "args") => {
            Object::list(args.iter().map(|arg| Object::string(arg.as_str())).collect())
        }
        (ExprKind::FuncDecl { body, .. }, "body") => stmt_obj(body.as_deref()),
        (
            ExprKind::IfElse { cond, .. } | ExprKind::Loop { cond, .. },
            "cond",
        ) => expr_obj(cond.as_deref()),
        (ExprKind::IfElse { iftrue, .. }, "iftrue") => stmt_obj(iftrue.as_deref()),
        (ExprKind::IfElse { iffalse, .. }, "iffalse") => stmt_obj(iffalse.as_deref()),
        (ExprKind::Loop { body, .. } | ExprKind::Iter { body, .. }, "loop") => {
            stmt_obj(body.as_deref())
        }
        (ExprKind::Iter { var, .. }, "var") => Object::string(var.as_str()),
        (ExprKind::Iter { iter, .. }, "iter") => expr_obj(iter.as_deref()),
        _ => return None,
    };
    Some(value)
}

// Writes

/// A converted field value, ready to store.
enum Patch {
    Reshape(i64),
    Loc(Loc),
    Int(i64),
    Float(f64),
    Text(String),
    Name(Option<String>),
    Expr(Option<Expr>),
    Stmt(Option<Stmt>),
    Exprs(Vec<Expr>),
    Stmts(Vec<Stmt>),
    Names(Vec<String>),
    Pairs(Vec<(Expr, Expr)>),
}

fn setindex(state: &mut State, args: &[Object]) -> SolResult {
    let target = arg(state, args, 0);
    let is_funcdecl = match node_of(state, &target)? {
        Node::Expr(expr) => matches!(expr.kind, ExprKind::FuncDecl { .. }),
        Node::Stmt(_) => false,
    };
    let field = state.to_string(&arg(state, args, 1))?;
    let value = arg(state, args, 2);
    if let Some(patch) = convert(state, &field, &value, is_funcdecl)? {
        apply(&target, &field, patch);
    }
    Ok(state.none())
}

/// The node inside `value`: `Some(None)` for an absent node, `None` when
/// `value` is not a node of that kind.
fn expr_in(value: &Object) -> Option<Option<Expr>> {
    match &*value.borrow() {
        Payload::Expr(node) => Some(node.as_deref().cloned()),
        _ => None,
    }
}

fn stmt_in(value: &Object) -> Option<Option<Stmt>> {
    match &*value.borrow() {
        Payload::Stmt(node) => Some(node.as_deref().cloned()),
        _ => None,
    }
}

/// Convert `value` for `field`. `None` when the field is unknown or the
/// value has the wrong shape.
fn convert(
    state: &mut State,
    field: &str,
    value: &Object,
    is_funcdecl: bool,
) -> SolResult<Option<Patch>> {
    let patch = match field {
        "type" => Patch::Reshape(state.to_int(value)?),
        "loc" => {
            if value.ty() != ObjType::Map {
                return Ok(None);
            }
            let line = state.map_get_name(value, "line");
            let col = state.map_get_name(value, "col");
            let line = line.map_or(Ok(0), |line| state.to_int(&line))?;
            let col = col.map_or(Ok(0), |col| state.to_int(&col))?;
            Patch::Loc(Loc { line, col })
        }
        "littype" | "ival" | "binoptype" | "unoptype" => Patch::Int(state.to_int(value)?),
        "fval" => Patch::Float(state.to_float(value)?),
        "str" | "ident" | "var" => Patch::Text(state.to_string(value)?),
        "name" if state.is_none(value) => Patch::Name(None),
        "name" => Patch::Name(Some(state.to_string(value)?)),
        "args" if is_funcdecl => {
            let mut names = Vec::new();
            for item in value.items().unwrap_or_default() {
                names.push(state.to_string(&item)?);
            }
            Patch::Names(names)
        }
        "args" | "list" => Patch::Exprs(
            value
                .items()
                .unwrap_or_default()
                .iter()
                .filter_map(expr_in)
                .flatten()
                .collect(),
        ),
        "stmtlist" => Patch::Stmts(
            value
                .items()
                .unwrap_or_default()
                .iter()
                .filter_map(stmt_in)
                .flatten()
                .collect(),
        ),
        "map" => Patch::Pairs(
            value
                .items()
                .unwrap_or_default()
                .iter()
                .filter_map(|pair| {
                    let parts = pair.items()?;
                    let key = expr_in(parts.first()?)??;
                    let value = expr_in(parts.get(1)?)??;
                    Some((key, value))
                })
                .collect(),
        ),
        "body" | "iftrue" | "iffalse" | "loop" => match stmt_in(value) {
            Some(stmt) => Patch::Stmt(stmt),
            None => return Ok(None),
        },
        "expr" | "left" | "right" | "ret" | "val" | "index" | "value" | "cond" | "iter" => {
            match expr_in(value) {
                Some(expr) => Patch::Expr(expr),
                None => return Ok(None),
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(patch))
}

fn apply(target: &Object, field: &str, patch: Patch) {
    let mut payload = target.borrow_mut();
    match &mut *payload {
        Payload::Stmt(Some(stmt)) => match patch {
            Patch::Reshape(discriminant) => {
                if discriminant != stmt.kind.discriminant() {
                    if let Some(kind) = StmtKind::empty(discriminant) {
                        stmt.kind = kind;
                    }
                }
            }
            Patch::Loc(loc) => stmt.loc = loc,
            patch => apply_stmt(&mut stmt.kind, field, patch),
        },
        Payload::Expr(Some(expr)) => match patch {
            Patch::Reshape(discriminant) => {
                if discriminant != expr.kind.discriminant() {
                    if let Some(kind) = ExprKind::empty(discriminant) {
                        expr.kind = kind;
                    }
                }
            }
            Patch::Loc(loc) => expr.loc = loc,
            patch => apply_expr(&mut expr.kind, field, patch),
        },
        _ => {}
    }
}

fn apply_stmt(kind: &mut StmtKind, field: &str, patch: Patch) {
    match (kind, field, patch) {
        (StmtKind::Expr { expr: slot }, "expr", Patch::Expr(expr))
        | (StmtKind::Ret { ret: slot }, "ret", Patch::Expr(expr))
        | (StmtKind::Cont { val: slot } | StmtKind::Break { val: slot }, "val", Patch::Expr(expr)) => {
            *slot = expr.map(Box::new);
        }
        (StmtKind::List { stmts }, "stmtlist", Patch::Stmts(list)) => *stmts = list,
        _ => {}
    }
}

fn apply_expr(kind: &mut ExprKind, field: &str, patch: Patch) {
    match (kind, field, patch) {
        (ExprKind::Lit(lit), "littype", Patch::Int(value)) => lit.littype = value,
        (ExprKind::Lit(lit), "ival", Patch::Int(value)) => lit.ival = value,
        (ExprKind::Lit(lit), "fval", Patch::Float(value)) => lit.fval = value,
        (ExprKind::Lit(lit), "str", Patch::Text(value)) => lit.str = value,
        (ExprKind::ListGen { list: slot }, "list", Patch::Exprs(list))
        | (ExprKind::Call { args: slot, .. }, "args", Patch::Exprs(list)) => *slot = list,
        (ExprKind::MapGen { map }, "map", Patch::Pairs(pairs)) => *map = pairs,
        (ExprKind::BinOp { op, .. }, "binoptype", Patch::Int(value))
        | (ExprKind::UnOp { op, .. }, "unoptype", Patch::Int(value)) => *op = value,
        (ExprKind::BinOp { left: slot, .. }, "left", Patch::Expr(expr))
        | (ExprKind::BinOp { right: slot, .. }, "right", Patch::Expr(expr))
        | (
            ExprKind::UnOp { expr: slot, .. }
            | ExprKind::Index { expr: slot, .. }
            | ExprKind::SetIndex { expr: slot, .. }
            | ExprKind::Call { expr: slot, .. },
            "expr",
            Patch::Expr(expr),
        )
        | (
            ExprKind::Index { index: slot, .. } | ExprKind::SetIndex { index: slot, .. },
            "index",
            Patch::Expr(expr),
        )
        | (
            ExprKind::SetIndex { value: slot, .. } | ExprKind::Assign { value: slot, .. },
            "value",
            Patch::Expr(expr),
        )
        | (
            ExprKind::IfElse { cond: slot, .. } | ExprKind::Loop { cond: slot, .. },
            "cond",
            Patch::Expr(expr),
        )
        | (ExprKind::Iter { iter: slot, .. }, "iter", Patch::Expr(expr)) => {
            *slot = expr.map(Box::new);
        }
        (
            ExprKind::Assign { ident: slot, .. } | ExprKind::Ref { ident: slot },
            "ident",
            Patch::Text(text),
        )
        | (ExprKind::Iter { var: slot, .. }, "var", Patch::Text(text)) => *slot = text,
        (ExprKind::FuncDecl { name, .. }, "name", Patch::Name(value)) => *name = value,
        (ExprKind::FuncDecl { args, .. }, "args", Patch::Names(names)) => *args = names,
        (ExprKind::FuncDecl { body: slot, .. }, "body", Patch::Stmt(stmt))
        | (ExprKind::IfElse { iftrue: slot, .. }, "iftrue", Patch::Stmt(stmt))
        | (ExprKind::IfElse { iffalse: slot, .. }, "iffalse", Patch::Stmt(stmt))
        | (
            ExprKind::Loop { body: slot, .. } | ExprKind::Iter { body: slot, .. },
            "loop",
            Patch::Stmt(stmt),
        ) => *slot = stmt.map(Box::new),
        _ => {}
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
