//! Operand values and the dense id newtypes.

use std::fmt;

// ── ID newtypes ─────────────────────────────────────────────────────

/// Variable ID within a single [`Function`](crate::Function).
///
/// Variables are interned by name when first mentioned. IDs are allocated
/// sequentially starting from 0; fresh temporaries share the same space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct VarId(u32);

impl VarId {
    /// Create a new variable ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Label ID, unique across the whole [`Program`](crate::Program).
///
/// Labels share one program-wide counter because call sites mint their
/// return labels from it as well.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct LabelId(u32);

impl LabelId {
    /// Create a new label ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Sequence number of an instruction within its function.
///
/// Assigned at creation, dense and monotonically increasing. Sequence order
/// is the function's linear control-flow order, so dataflow sets are plain
/// vectors indexed by [`SeqId::index`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SeqId(u32);

impl SeqId {
    /// Create a new sequence ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ── Callees ─────────────────────────────────────────────────────────

/// Runtime entry points callable from L3 without an `@` name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Runtime {
    Print,
    Input,
    Allocate,
    TensorError,
}

impl Runtime {
    /// Look up a runtime entry point by its L3 keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "print" => Some(Runtime::Print),
            "input" => Some(Runtime::Input),
            "allocate" => Some(Runtime::Allocate),
            "tensor-error" => Some(Runtime::TensorError),
            _ => None,
        }
    }

    /// The keyword spelling used in both L3 and L2.
    pub fn keyword(self) -> &'static str {
        match self {
            Runtime::Print => "print",
            Runtime::Input => "input",
            Runtime::Allocate => "allocate",
            Runtime::TensorError => "tensor-error",
        }
    }

    /// Whether a call to this entry point never returns.
    ///
    /// Liveness treats a diverging call like `return`: it has no
    /// intra-function successor.
    pub fn diverges(self) -> bool {
        matches!(self, Runtime::TensorError)
    }
}

/// A function referenced by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FuncRef {
    /// A user-defined `@name` (stored without the `@`).
    User(String),
    /// A runtime entry point.
    Runtime(Runtime),
}

impl FuncRef {
    /// Whether a call through this reference never returns.
    pub fn diverges(&self) -> bool {
        match self {
            FuncRef::User(_) => false,
            FuncRef::Runtime(rt) => rt.diverges(),
        }
    }
}

// ── Items ───────────────────────────────────────────────────────────

/// An operand value.
///
/// Equality is by kind and value: `Var(v1) != Num(1)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Item {
    Var(VarId),
    Num(i64),
    Label(LabelId),
    Func(FuncRef),
}

impl Item {
    /// The variable this item names, if it is one.
    #[inline]
    pub fn as_var(&self) -> Option<VarId> {
        match self {
            Item::Var(v) => Some(*v),
            _ => None,
        }
    }

    /// The constant this item holds, if it is one.
    #[inline]
    pub fn as_num(&self) -> Option<i64> {
        match self {
            Item::Num(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<VarId> for Item {
    fn from(var: VarId) -> Self {
        Item::Var(var)
    }
}

impl From<LabelId> for Item {
    fn from(label: LabelId) -> Self {
        Item::Label(label)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Var(v) => write!(f, "%v{}", v.raw()),
            Item::Num(n) => write!(f, "{n}"),
            Item::Label(l) => write!(f, ":l{}", l.raw()),
            Item::Func(FuncRef::User(name)) => write!(f, "@{name}"),
            Item::Func(FuncRef::Runtime(rt)) => f.write_str(rt.keyword()),
        }
    }
}
