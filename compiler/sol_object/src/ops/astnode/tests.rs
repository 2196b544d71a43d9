use pretty_assertions::assert_eq;

use crate::ast::{Expr, ExprKind, Lit, Stmt, StmtKind};
use crate::map::map_of;
use crate::testing::{evaluating_state, take_message};
use crate::{Object, Payload, State};

fn field(state: &mut State, node: &Object, name: &str) -> Object {
    state.index(node, &Object::string(name)).unwrap()
}

fn set(state: &mut State, node: &Object, name: &str, value: &Object) {
    state.set_index(node, &Object::string(name), value).unwrap();
}

fn binop() -> Expr {
    Expr::new(ExprKind::BinOp {
        op: 1,
        left: Some(Box::new(Expr::int(2))),
        right: Some(Box::new(Expr::ident("x"))),
    })
}

#[test]
fn common_fields() {
    let mut state = State::new();
    let stmt = Object::stmt(Some(Stmt::expr(Expr::int(1))));
    assert_eq!(field(&mut state, &stmt, "kind").as_int(), Some(-1));
    assert_eq!(field(&mut state, &stmt, "type").as_int(), Some(0));
    let expr = Object::expr(Some(binop()));
    assert_eq!(field(&mut state, &expr, "kind").as_int(), Some(-2));
    assert_eq!(field(&mut state, &expr, "type").as_int(), Some(3));
    let loc = field(&mut state, &expr, "loc");
    assert_eq!(state.map_get_name(&loc, "line").unwrap().as_int(), Some(0));
}

#[test]
fn reads_are_copies() {
    let mut state = State::new();
    let expr = Object::expr(Some(binop()));
    let left = field(&mut state, &expr, "left");
    set(&mut state, &left, "ival", &Object::int(99));
    let left_again = field(&mut state, &expr, "left");
    assert_eq!(field(&mut state, &left_again, "ival").as_int(), Some(2));
    assert_eq!(field(&mut state, &left, "ival").as_int(), Some(99));
}

#[test]
fn writes_replace_fields() {
    let mut state = State::new();
    let expr = Object::expr(Some(binop()));
    let replacement = Object::expr(Some(Expr::ident("y")));
    set(&mut state, &expr, "right", &replacement);
    set(&mut state, &expr, "binoptype", &Object::string("7"));
    let right = field(&mut state, &expr, "right");
    assert_eq!(field(&mut state, &right, "ident").as_string().unwrap(), "y");
    assert_eq!(field(&mut state, &expr, "binoptype").as_int(), Some(7));
}

#[test]
fn wrong_shapes_are_ignored() {
    let mut state = State::new();
    let expr = Object::expr(Some(binop()));
    set(&mut state, &expr, "left", &Object::int(5));
    set(&mut state, &expr, "left", &Object::stmt(Some(Stmt::expr(Expr::int(0)))));
    let left = field(&mut state, &expr, "left");
    assert_eq!(field(&mut state, &left, "ival").as_int(), Some(2));
}

#[test]
fn absent_node_value_clears_the_field() {
    let mut state = State::new();
    let expr = Object::expr(Some(binop()));
    set(&mut state, &expr, "left", &Object::expr(None));
    let left = field(&mut state, &expr, "left");
    assert_eq!(state.to_string(&left).unwrap(), "<NULL Expr>");
}

#[test]
fn type_writes_reshape() {
    let mut state = State::new();
    let expr = Object::expr(Some(binop()));
    set(&mut state, &expr, "type", &Object::int(99));
    assert_eq!(state.to_string(&expr).unwrap(), "<Expr[BINOP]>");
    set(&mut state, &expr, "type", &Object::int(3));
    assert_eq!(field(&mut state, &expr, "binoptype").as_int(), Some(1));
    set(&mut state, &expr, "type", &Object::int(8));
    assert_eq!(state.to_string(&expr).unwrap(), "<Expr[REF]>");
    assert_eq!(field(&mut state, &expr, "ident").as_string().unwrap(), "");
}

#[test]
fn list_fields() {
    let mut state = State::new();
    let call = Object::expr(Some(Expr::new(ExprKind::Call {
        expr: Some(Box::new(Expr::ident("f"))),
        args: vec![Expr::int(1)],
    })));
    let args = field(&mut state, &call, "args");
    assert_eq!(args.items().unwrap().len(), 1);
    let new_args = Object::list(vec![
        Object::expr(Some(Expr::int(4))),
        Object::int(0),
        Object::expr(Some(Expr::int(5))),
    ]);
    set(&mut state, &call, "args", &new_args);
    assert_eq!(field(&mut state, &call, "args").items().unwrap().len(), 2);

    let decl = Object::expr(Some(Expr::new(ExprKind::FuncDecl {
        name: None,
        args: vec!["a".to_owned()],
        body: None,
    })));
    assert_eq!(field(&mut state, &decl, "name").as_string().unwrap(), "");
    set(&mut state, &decl, "args", &Object::list(vec![Object::string("p"), Object::string("q")]));
    let names = field(&mut state, &decl, "args").items().unwrap();
    assert_eq!(names[1].as_string().unwrap(), "q");
}

#[test]
fn mapgen_pairs() {
    let mut state = State::new();
    let mapgen = Object::expr(Some(Expr::new(ExprKind::MapGen { map: Vec::new() })));
    let pair = Object::list(vec![
        Object::expr(Some(Expr::int(1))),
        Object::expr(Some(Expr::int(2))),
    ]);
    let short = Object::list(vec![Object::expr(Some(Expr::int(1)))]);
    set(&mut state, &mapgen, "map", &Object::list(vec![pair, short]));
    let pairs = field(&mut state, &mapgen, "map").items().unwrap();
    assert_eq!(pairs.len(), 1);
}

#[test]
fn loc_writes_take_a_map() {
    let mut state = State::new();
    let stmt = Object::stmt(Some(Stmt::new(StmtKind::Break { val: None })));
    let loc = map_of([("line", Object::int(4)), ("col", Object::int(2))]);
    set(&mut state, &stmt, "loc", &loc);
    let payload = stmt.borrow();
    let Payload::Stmt(Some(node)) = &*payload else {
        panic!("expected a statement node");
    };
    assert_eq!((node.loc.line, node.loc.col), (4, 2));
}

#[test]
fn literal_fields() {
    let mut state = State::new();
    let lit = Object::expr(Some(Expr::new(ExprKind::Lit(Lit {
        littype: 2,
        ival: 0,
        fval: 0.5,
        str: "s".to_owned(),
    }))));
    assert_eq!(field(&mut state, &lit, "fval").as_float(), Some(0.5));
    set(&mut state, &lit, "str", &Object::int(12));
    assert_eq!(field(&mut state, &lit, "str").as_string().unwrap(), "12");
}

#[test]
fn null_nodes() {
    let mut state = State::new();
    let empty = Object::stmt(None);
    assert_eq!(state.to_string(&empty).unwrap(), "<NULL Stmt>");
    assert!(state.index(&empty, &Object::string("type")).is_err());
    assert_eq!(take_message(&mut state).unwrap(), "Access NULL AST node");
}

#[test]
fn calling_nodes_runs_the_evaluator() {
    let (mut state, evaluator, _) = evaluating_state();
    let expr = Object::expr(Some(Expr::ident("v")));
    let env = map_of([("v", Object::int(11))]);
    let value = state.call(&expr, &[env]).unwrap();
    assert_eq!(value.as_int(), Some(11));
    assert_eq!(state.scopes().items().unwrap().len(), 1);

    let stmt = Object::stmt(Some(Stmt::ret(Expr::int(3))));
    let result = state.call(&stmt, &[]).unwrap();
    assert!(state.is_none(&result));
    assert_eq!(evaluator.executed.get(), 1);
}

#[test]
fn calling_nodes_without_evaluator_fails() {
    let mut state = State::new();
    let expr = Object::expr(Some(Expr::int(1)));
    assert!(state.call(&expr, &[]).is_err());
    assert_eq!(take_message(&mut state).unwrap(), "No evaluator attached");
}
