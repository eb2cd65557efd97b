//! Program construction.
//!
//! [`ProgramBuilder`] hands out one [`FunctionBuilder`] at a time. The
//! function builder interns names, numbers instructions, splits basic
//! blocks at control transfers and normalizes arithmetic as it goes, so a
//! finished [`Program`] already satisfies every structural invariant the
//! optimizer relies on.
//!
//! # Normalizations
//!
//! - Arithmetic on two constants folds to a plain assignment.
//! - `>` and `>=` swap operands and become `<` and `<=`.
//! - Commutative ops move a constant, or a read of the destination, to the
//!   right-hand side / left-hand side respectively.
//! - `v <- 3 - v` goes through a fresh temporary so the destination never
//!   appears as a right operand of a non-commutative op.
//! - `v <- v + 0` and `v <- v * 1` vanish; `* 2|4|8` becomes `<< 1|2|3`.
//! - `br N :l` on a constant becomes `br :l` (non-zero) or nothing.

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::trace;

use crate::function::{Context, Function, Program};
use crate::item::{FuncRef, Item, LabelId, SeqId, VarId};
use crate::op::{ArithOp, CmpOp, Op};
use crate::tree::{Instruction, Tree};

/// Errors raised while constructing a program.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("label :{label} is referenced in @{function} but never defined")]
    UnresolvedLabel { function: String, label: String },
    #[error("label :{label} is defined more than once in @{function}")]
    DuplicateLabel { function: String, label: String },
    #[error("function @{function} has no instructions")]
    EmptyFunction { function: String },
    #[error("function @{function} is defined more than once")]
    DuplicateFunction { function: String },
}

/// Operators as written in L3 source, before normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceOp {
    Add,
    Sub,
    Mul,
    And,
    Shl,
    Shr,
    Lt,
    Le,
    Eq,
    Gt,
    Ge,
}

impl SourceOp {
    fn arith(self) -> Option<ArithOp> {
        match self {
            SourceOp::Add => Some(ArithOp::Add),
            SourceOp::Sub => Some(ArithOp::Sub),
            SourceOp::Mul => Some(ArithOp::Mul),
            SourceOp::And => Some(ArithOp::And),
            SourceOp::Shl => Some(ArithOp::Shl),
            SourceOp::Shr => Some(ArithOp::Shr),
            _ => None,
        }
    }
}

// ── Program builder ─────────────────────────────────────────────────

/// Collects functions into a [`Program`].
///
/// Owns the program-wide label counter so labels minted in different
/// functions (including call return labels) never collide.
pub struct ProgramBuilder {
    functions: Vec<Function>,
    names: FxHashSet<String>,
    label_count: u32,
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramBuilder {
    pub fn new() -> Self {
        ProgramBuilder {
            functions: Vec::new(),
            names: FxHashSet::default(),
            label_count: 0,
        }
    }

    /// Start a new function named `name` (without the `@`).
    pub fn function(&mut self, name: &str) -> Result<FunctionBuilder<'_>, BuildError> {
        if !self.names.insert(name.to_owned()) {
            return Err(BuildError::DuplicateFunction {
                function: name.to_owned(),
            });
        }
        Ok(FunctionBuilder::new(self, name.to_owned()))
    }

    /// Number of functions finished so far.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn finish(self) -> Program {
        Program {
            functions: self.functions,
            entry: "main".to_owned(),
            label_count: self.label_count,
        }
    }

    fn mint_label(&mut self) -> LabelId {
        let id = LabelId::new(self.label_count);
        self.label_count += 1;
        id
    }
}

// ── Function builder ────────────────────────────────────────────────

/// Builds one [`Function`].
///
/// Instructions are appended in program order. The function only becomes
/// part of the program once [`finish`](Self::finish) succeeds.
pub struct FunctionBuilder<'p> {
    program: &'p mut ProgramBuilder,
    name: String,
    params: Vec<VarId>,
    contexts: Vec<Context>,
    current: Vec<Instruction>,
    vars: FxHashMap<String, VarId>,
    labels: FxHashMap<String, LabelId>,
    label_defs: FxHashMap<LabelId, SeqId>,
    duplicate_label: Option<String>,
    var_count: u32,
    tree_count: u32,
}

impl<'p> FunctionBuilder<'p> {
    fn new(program: &'p mut ProgramBuilder, name: String) -> Self {
        FunctionBuilder {
            program,
            name,
            params: Vec::new(),
            contexts: Vec::new(),
            current: Vec::new(),
            vars: FxHashMap::default(),
            labels: FxHashMap::default(),
            label_defs: FxHashMap::default(),
            duplicate_label: None,
            var_count: 0,
            tree_count: 0,
        }
    }

    // ── Names ───────────────────────────────────────────────────

    /// Intern a variable name (without `%`).
    pub fn var(&mut self, name: &str) -> VarId {
        if let Some(&id) = self.vars.get(name) {
            return id;
        }
        let id = self.fresh_var();
        self.vars.insert(name.to_owned(), id);
        id
    }

    /// Allocate an anonymous variable.
    pub fn fresh_var(&mut self) -> VarId {
        let id = VarId::new(self.var_count);
        self.var_count += 1;
        id
    }

    /// Intern a parameter and append it to the parameter list.
    pub fn param(&mut self, name: &str) -> VarId {
        let id = self.var(name);
        self.params.push(id);
        id
    }

    /// Intern a label name (without `:`). Ids come from the program-wide
    /// counter.
    pub fn label(&mut self, name: &str) -> LabelId {
        if let Some(&id) = self.labels.get(name) {
            return id;
        }
        let id = self.program.mint_label();
        self.labels.insert(name.to_owned(), id);
        id
    }

    // ── Instructions ────────────────────────────────────────────

    /// `dst <- src`
    pub fn assign(&mut self, dst: VarId, src: Item) {
        self.push(Tree::new(Some(dst.into()), Op::Assign, vec![Tree::leaf(src)]));
    }

    /// `dst <- lhs op rhs`, normalized.
    pub fn op_assign(&mut self, dst: VarId, lhs: Item, op: SourceOp, rhs: Item) {
        let dst_item = Item::Var(dst);

        let Some(arith) = op.arith() else {
            let (cmp, lhs, rhs) = match op {
                SourceOp::Lt => (CmpOp::Lt, lhs, rhs),
                SourceOp::Le => (CmpOp::Le, lhs, rhs),
                SourceOp::Eq => (CmpOp::Eq, lhs, rhs),
                SourceOp::Gt => (CmpOp::Lt, rhs, lhs),
                _ => (CmpOp::Le, rhs, lhs),
            };
            self.push(Tree::new(
                Some(dst_item),
                Op::Cmp(cmp),
                vec![Tree::leaf(lhs), Tree::leaf(rhs)],
            ));
            return;
        };

        if let (Some(a), Some(b)) = (lhs.as_num(), rhs.as_num()) {
            self.assign(dst, Item::Num(arith.apply(a, b)));
            return;
        }

        let (lhs, rhs) = if arith.is_commutative() {
            if lhs.as_num().is_some() || rhs == dst_item {
                (rhs, lhs)
            } else {
                (lhs, rhs)
            }
        } else if rhs == dst_item {
            let tmp = self.fresh_var();
            self.assign(tmp, dst_item.clone());
            (lhs, Item::Var(tmp))
        } else {
            (lhs, rhs)
        };

        let Some(n) = rhs.as_num() else {
            self.push(Tree::new(
                Some(dst_item),
                Op::Arith(arith),
                vec![Tree::leaf(lhs), Tree::leaf(rhs)],
            ));
            return;
        };

        let identity = match arith {
            ArithOp::Add => n == 0,
            ArithOp::Mul => n == 1,
            _ => false,
        };
        if identity && lhs == dst_item {
            trace!(function = %self.name, "dropping identity update");
            return;
        }

        let (arith, n) = match (arith, n) {
            (ArithOp::Mul, 2) => (ArithOp::Shl, 1),
            (ArithOp::Mul, 4) => (ArithOp::Shl, 2),
            (ArithOp::Mul, 8) => (ArithOp::Shl, 3),
            other => other,
        };
        self.push(Tree::new(
            Some(dst_item),
            Op::ArithImm(arith),
            vec![Tree::leaf(lhs), Tree::leaf(Item::Num(n))],
        ));
    }

    /// `dst <- load addr`
    pub fn load(&mut self, dst: VarId, addr: VarId) {
        self.push(Tree::new(Some(dst.into()), Op::Load, vec![Tree::leaf(addr)]));
    }

    /// `store addr <- value`
    pub fn store(&mut self, addr: VarId, value: Item) {
        self.push(Tree::new(
            None,
            Op::Store,
            vec![Tree::leaf(addr), Tree::leaf(value)],
        ));
    }

    /// `return` or `return t`. Ends the current block.
    pub fn ret(&mut self, value: Option<Item>) {
        let children = value.map(Tree::leaf).into_iter().collect();
        self.push(Tree::new(None, Op::Return, children));
        self.end_block();
    }

    /// `br :target`. Ends the current block.
    pub fn branch(&mut self, target: LabelId) {
        self.push(Tree::new(Some(target.into()), Op::Branch, Vec::new()));
        self.end_block();
    }

    /// `br cond :target`. Ends the current block.
    ///
    /// A constant condition resolves statically: non-zero becomes an
    /// unconditional branch, zero emits nothing.
    pub fn cond_branch(&mut self, cond: Item, target: LabelId) {
        match cond.as_num() {
            Some(0) => {}
            Some(_) => self.branch(target),
            None => {
                self.push(Tree::new(
                    Some(target.into()),
                    Op::CondBranch,
                    vec![Tree::leaf(cond)],
                ));
                self.end_block();
            }
        }
    }

    /// `:label`. Sits alone in its own block.
    pub fn define_label(&mut self, label: LabelId) -> Result<(), BuildError> {
        if self.label_defs.contains_key(&label) {
            let name = self.label_name(label);
            self.duplicate_label.get_or_insert(name.clone());
            return Err(BuildError::DuplicateLabel {
                function: self.name.clone(),
                label: name,
            });
        }
        self.end_block();
        let seq = self.push(Tree::new(Some(label.into()), Op::Label, Vec::new()));
        self.label_defs.insert(label, seq);
        self.end_block();
        Ok(())
    }

    /// `[dst <-] call callee(args)`. Sits alone in its own block.
    ///
    /// The call tree's children are the arguments, a freshly minted return
    /// label and the callee.
    pub fn call(&mut self, dst: Option<VarId>, callee: Item, args: Vec<Item>) {
        let ret_label = self.program.mint_label();
        let mut children: Vec<Tree> = args.into_iter().map(Tree::leaf).collect();
        children.push(Tree::leaf(ret_label));
        children.push(Tree::leaf(callee));

        self.end_block();
        self.push(Tree::new(dst.map(Item::Var), Op::Call, children));
        self.end_block();
    }

    /// Convenience for calling a user function by name.
    pub fn call_user(&mut self, dst: Option<VarId>, name: &str, args: Vec<Item>) {
        self.call(dst, Item::Func(FuncRef::User(name.to_owned())), args);
    }

    /// Validate and add the function to the program.
    pub fn finish(mut self) -> Result<(), BuildError> {
        self.end_block();

        if let Some(label) = self.duplicate_label.take() {
            return Err(BuildError::DuplicateLabel {
                function: self.name,
                label,
            });
        }
        if self.tree_count == 0 {
            return Err(BuildError::EmptyFunction { function: self.name });
        }
        let unresolved = self
            .labels
            .iter()
            .filter(|(_, id)| !self.label_defs.contains_key(id))
            .min_by_key(|(_, id)| **id);
        if let Some((label, _)) = unresolved {
            return Err(BuildError::UnresolvedLabel {
                function: self.name.clone(),
                label: label.clone(),
            });
        }

        trace!(
            function = %self.name,
            instructions = self.tree_count,
            contexts = self.contexts.len(),
            "function built"
        );
        self.program.functions.push(Function {
            name: self.name,
            params: self.params,
            contexts: self.contexts,
            vars: self.vars,
            labels: self.labels,
            label_defs: self.label_defs,
            var_count: self.var_count,
            tree_count: self.tree_count,
        });
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────

    fn push(&mut self, tree: Tree) -> SeqId {
        let id = SeqId::new(self.tree_count);
        self.tree_count += 1;
        self.current.push(Instruction::new(id, tree));
        id
    }

    fn end_block(&mut self) {
        if !self.current.is_empty() {
            let instructions = std::mem::take(&mut self.current);
            self.contexts.push(Context { instructions });
        }
    }

    fn label_name(&self, label: LabelId) -> String {
        self.labels
            .iter()
            .find(|(_, id)| **id == label)
            .map_or_else(|| format!("l{}", label.raw()), |(name, _)| name.clone())
    }
}
