//! The universal object handle.
//!
//! Every Sol value is an [`Object`]: a shared, reference-counted cell holding
//! a [`Payload`]. Cloning a handle takes a reference, dropping it releases
//! one, and the payload is destroyed exactly once when the last handle goes.
//!
//! # Borrow discipline
//!
//! Payloads sit in a `RefCell`. Code in this crate never holds a payload
//! borrow across a dispatch or a call into user code: handlers snapshot what
//! they need (cloning the handles out of a list, say) and release the borrow
//! before re-entering the runtime.

use std::cell::{BorrowMutError, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::ast::{Expr, Stmt};
use crate::buffer::Buffer;
use crate::ops::Op;
use crate::stream::Stream;
use crate::{SolResult, State};

/// Runtime type discriminant of an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjType {
    Singlet,
    Int,
    Float,
    Str,
    List,
    Map,
    MCell,
    Function,
    CFunction,
    Stmt,
    Expr,
    Buffer,
    DyLib,
    DySym,
    Stream,
}

impl ObjType {
    pub const ALL: [ObjType; 15] = [
        ObjType::Singlet,
        ObjType::Int,
        ObjType::Float,
        ObjType::Str,
        ObjType::List,
        ObjType::Map,
        ObjType::MCell,
        ObjType::Function,
        ObjType::CFunction,
        ObjType::Stmt,
        ObjType::Expr,
        ObjType::Buffer,
        ObjType::DyLib,
        ObjType::DySym,
        ObjType::Stream,
    ];

    /// The name scripts see from `type(x)`.
    pub fn name(self) -> &'static str {
        match self {
            ObjType::Singlet => "singlet",
            ObjType::Int => "int",
            ObjType::Float => "float",
            ObjType::Str => "string",
            ObjType::List => "list",
            ObjType::Map => "map",
            ObjType::MCell => "mcell",
            ObjType::Function => "function",
            ObjType::CFunction => "cfunction",
            ObjType::Stmt => "stmtnode",
            ObjType::Expr => "exprnode",
            ObjType::Buffer => "buffer",
            ObjType::DyLib => "dylib",
            ObjType::DySym => "dysym",
            ObjType::Stream => "stream",
        }
    }
}

impl fmt::Display for ObjType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signature of every native function body and every type handler.
///
/// `args` is borrowed; a handler clones whatever it keeps. The returned
/// object is a fresh reference owned by the caller.
pub type NativeFn = fn(&mut State, &[Object]) -> SolResult;

/// What a native function runs when called.
#[derive(Clone, Copy)]
pub enum NativeKind {
    /// A plain builtin.
    Builtin(NativeFn),
    /// The handler for `op` on `ty`, as exposed by `debug.getops`.
    Handler(ObjType, Op),
}

/// Payload of a `cfunction`.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub kind: NativeKind,
}

/// Payload of a user-defined `function`.
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<String>,
    /// Parameter receiving surplus arguments as a list.
    pub rest: Option<String>,
    pub body: Rc<Stmt>,
    /// Captured scope, a map.
    pub closure: Object,
    /// Free-form attribute map.
    pub udata: Object,
    /// Annotation map.
    pub annos: Object,
}

/// Type-specific contents of an object.
pub enum Payload {
    /// A named sentinel such as `None`.
    Singlet(&'static str),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Object>),
    /// Ordered map cells; every element is an `MCell` object.
    Map(Vec<Object>),
    MCell { key: Object, val: Object },
    Function(Box<Function>),
    CFunction(NativeFunction),
    /// A statement node, or an absent one.
    Stmt(Option<Box<Stmt>>),
    /// An expression node, or an absent one.
    Expr(Option<Box<Expr>>),
    Buffer(Buffer),
    DyLib { handle: usize, path: String },
    DySym { address: usize, name: String },
    Stream(Stream),
}

impl Payload {
    pub fn ty(&self) -> ObjType {
        match self {
            Payload::Singlet(_) => ObjType::Singlet,
            Payload::Int(_) => ObjType::Int,
            Payload::Float(_) => ObjType::Float,
            Payload::Str(_) => ObjType::Str,
            Payload::List(_) => ObjType::List,
            Payload::Map(_) => ObjType::Map,
            Payload::MCell { .. } => ObjType::MCell,
            Payload::Function(_) => ObjType::Function,
            Payload::CFunction(_) => ObjType::CFunction,
            Payload::Stmt(_) => ObjType::Stmt,
            Payload::Expr(_) => ObjType::Expr,
            Payload::Buffer(_) => ObjType::Buffer,
            Payload::DyLib { .. } => ObjType::DyLib,
            Payload::DySym { .. } => ObjType::DySym,
            Payload::Stream(_) => ObjType::Stream,
        }
    }
}

/// A counted reference to a Sol value.
#[derive(Clone)]
pub struct Object(Rc<RefCell<Payload>>);

impl Object {
    pub fn new(payload: Payload) -> Object {
        Object(Rc::new(RefCell::new(payload)))
    }

    pub fn singlet(name: &'static str) -> Object {
        Object::new(Payload::Singlet(name))
    }

    pub fn int(value: i64) -> Object {
        Object::new(Payload::Int(value))
    }

    pub fn float(value: f64) -> Object {
        Object::new(Payload::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Object {
        Object::new(Payload::Str(value.into()))
    }

    pub fn list(items: Vec<Object>) -> Object {
        Object::new(Payload::List(items))
    }

    /// An empty map.
    pub fn map() -> Object {
        Object::new(Payload::Map(Vec::new()))
    }

    pub fn mcell(key: Object, val: Object) -> Object {
        Object::new(Payload::MCell { key, val })
    }

    pub fn function(function: Function) -> Object {
        Object::new(Payload::Function(Box::new(function)))
    }

    pub fn cfunction(name: impl Into<String>, body: NativeFn) -> Object {
        Object::new(Payload::CFunction(NativeFunction {
            name: name.into(),
            kind: NativeKind::Builtin(body),
        }))
    }

    pub fn stmt(node: Option<Stmt>) -> Object {
        Object::new(Payload::Stmt(node.map(Box::new)))
    }

    pub fn expr(node: Option<Expr>) -> Object {
        Object::new(Payload::Expr(node.map(Box::new)))
    }

    pub fn buffer(buffer: Buffer) -> Object {
        Object::new(Payload::Buffer(buffer))
    }

    pub fn stream(stream: Stream) -> Object {
        Object::new(Payload::Stream(stream))
    }

    pub fn ty(&self) -> ObjType {
        self.0.borrow().ty()
    }

    /// Shared access to the payload. Release before re-entering the runtime.
    pub fn borrow(&self) -> Ref<'_, Payload> {
        self.0.borrow()
    }

    /// Exclusive access to the payload. Release before re-entering the runtime.
    pub fn borrow_mut(&self) -> RefMut<'_, Payload> {
        self.0.borrow_mut()
    }

    pub(crate) fn try_borrow_mut(&self) -> Result<RefMut<'_, Payload>, BorrowMutError> {
        self.0.try_borrow_mut()
    }

    /// Identity: the address of the shared cell.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of live handles to this object.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub fn downgrade(&self) -> WeakObject {
        WeakObject(Rc::downgrade(&self.0))
    }

    /// Exchange payloads with `other`. Both objects keep their identity and
    /// their reference counts; every handle observes the swapped value.
    pub fn swap(&self, other: &Object) {
        if !self.ptr_eq(other) {
            self.0.swap(&other.0);
        }
    }

    // Snapshot accessors. Each returns an owned copy, so no borrow escapes.

    pub fn as_int(&self) -> Option<i64> {
        match &*self.borrow() {
            Payload::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match &*self.borrow() {
            Payload::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match &*self.borrow() {
            Payload::Str(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Elements of a list.
    pub fn items(&self) -> Option<Vec<Object>> {
        match &*self.borrow() {
            Payload::List(items) => Some(items.clone()),
            _ => None,
        }
    }

    /// Cells of a map.
    pub fn cells(&self) -> Option<Vec<Object>> {
        match &*self.borrow() {
            Payload::Map(cells) => Some(cells.clone()),
            _ => None,
        }
    }

    /// Key and value of a map cell.
    pub fn cell_parts(&self) -> Option<(Object, Object)> {
        match &*self.borrow() {
            Payload::MCell { key, val } => Some((key.clone(), val.clone())),
            _ => None,
        }
    }

    /// Bytes of a value usable as an attribute name: a string, or a sized
    /// buffer read up to its first NUL.
    pub fn name_bytes(&self) -> Option<Vec<u8>> {
        match &*self.borrow() {
            Payload::Str(value) => Some(value.as_bytes().to_vec()),
            Payload::Buffer(buffer) => buffer.c_bytes().map(<[u8]>::to_vec),
            _ => None,
        }
    }

    /// Whether this is a name equal to `name`.
    pub fn is_name(&self, name: &str) -> bool {
        match &*self.borrow() {
            Payload::Str(value) => value == name,
            Payload::Buffer(buffer) => buffer.c_bytes() == Some(name.as_bytes()),
            _ => false,
        }
    }

    /// Functions and native functions.
    pub fn is_callable(&self) -> bool {
        matches!(self.ty(), ObjType::Function | ObjType::CFunction)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(payload) => match &*payload {
                Payload::Singlet(name) => write!(f, "{name}"),
                Payload::Int(value) => write!(f, "Int({value})"),
                Payload::Float(value) => write!(f, "Float({value})"),
                Payload::Str(value) => write!(f, "Str({value:?})"),
                other => write!(f, "<{} @ {:#x}>", other.ty(), self.id()),
            },
            Err(_) => write!(f, "<borrowed @ {:#x}>", self.id()),
        }
    }
}

/// A reference to an object that does not keep it alive.
#[derive(Clone)]
pub struct WeakObject(Weak<RefCell<Payload>>);

impl WeakObject {
    /// The object, if any strong handle remains.
    pub fn upgrade(&self) -> Option<Object> {
        self.0.upgrade().map(Object)
    }

    /// Whether this refers to `obj`, alive or not.
    pub fn points_to(&self, obj: &Object) -> bool {
        std::ptr::eq(self.0.as_ptr(), Rc::as_ptr(&obj.0))
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
