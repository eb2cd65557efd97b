//! The selector: rewrite catalog plus tile catalog.

use std::sync::OnceLock;

use l3_ir::{Function, Program, Tree};

use crate::pattern::Pattern;
use crate::rewrite::{self, Rewrite};
use crate::tiles::{self, Tile};

/// Global selector singleton with the built-in catalogs registered.
static GLOBAL_SELECTOR: OnceLock<Selector> = OnceLock::new();

/// Owns the ordered rewrite and tile catalogs.
///
/// Both catalogs are ordered: rewrites run in registration order, and
/// covering picks the first registered tile that matches.
pub struct Selector {
    rewrites: Vec<Box<dyn Rewrite>>,
    tiles: Vec<Box<dyn Tile>>,
}

impl Selector {
    /// A selector with the built-in catalogs.
    pub fn new() -> Self {
        let mut selector = Selector::empty();
        register_builtins(&mut selector);
        selector
    }

    /// A selector with no rewrites and no tiles.
    pub fn empty() -> Self {
        Selector {
            rewrites: Vec::new(),
            tiles: Vec::new(),
        }
    }

    /// Append a rewrite to the end of the rewrite catalog.
    pub fn register_rewrite<R: Rewrite + 'static>(&mut self, rewrite: R) {
        self.rewrites.push(Box::new(rewrite));
    }

    /// Append a tile to the end of the tile catalog (lowest priority).
    pub fn register_tile<T: Tile + 'static>(&mut self, tile: T) {
        self.tiles.push(Box::new(tile));
    }

    /// Rewrite names, in application order.
    pub fn rewrite_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rewrites.iter().map(|r| r.name())
    }

    /// Tile names, in priority order.
    pub fn tile_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tiles.iter().map(|t| t.name())
    }

    /// Apply every rewrite to `tree`, in order.
    pub fn rewrite(&self, tree: &mut Tree) {
        for rewrite in &self.rewrites {
            rewrite.apply(tree);
        }
    }

    /// Cover `tree` with the first matching tile, if any.
    pub fn try_cover(&self, tree: &Tree) -> Option<Pattern> {
        self.tiles.iter().find_map(|tile| {
            let pattern = tile.try_cover(tree, self)?;
            tracing::trace!(tile = tile.name(), op = ?tree.op, "covered");
            Some(pattern)
        })
    }

    /// Cover `tree`.
    ///
    /// # Panics
    ///
    /// Panics if no tile matches. Every tree the optimizer can produce is
    /// coverable by the built-in catalog.
    pub fn cover(&self, tree: &Tree) -> Pattern {
        match self.try_cover(tree) {
            Some(pattern) => pattern,
            None => panic!("no tile covers {:?} node rooted at {:?}", tree.op, tree.root),
        }
    }

    /// Cover each non-leaf operand. Leaves are terminal and yield nothing.
    pub fn cover_operands<'t>(&self, operands: impl IntoIterator<Item = &'t Tree>) -> Vec<Pattern> {
        operands
            .into_iter()
            .filter(|operand| !operand.is_leaf())
            .map(|operand| self.cover(operand))
            .collect()
    }

    /// Rewrite and cover every instruction of `func`, in block order.
    pub fn select_function(&self, func: &mut Function) -> Vec<Pattern> {
        let mut patterns = Vec::with_capacity(func.instruction_count());
        for ctx in &mut func.contexts {
            for instr in &mut ctx.instructions {
                self.rewrite(&mut instr.tree);
                patterns.push(self.cover(&instr.tree));
            }
        }

        tracing::debug!(
            function = %func.name,
            patterns = patterns.len(),
            tiles = patterns.iter().map(Pattern::tile_count).sum::<usize>(),
            "instructions selected"
        );
        patterns
    }

    /// Select every function of `program`, in program order.
    pub fn select_program(&self, program: &mut Program) -> Vec<Vec<Pattern>> {
        program
            .functions
            .iter_mut()
            .map(|func| self.select_function(func))
            .collect()
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

/// The shared selector with the built-in catalogs.
pub fn global_selector() -> &'static Selector {
    GLOBAL_SELECTOR.get_or_init(Selector::new)
}

/// Register the built-in catalogs, highest priority first.
fn register_builtins(selector: &mut Selector) {
    selector.register_rewrite(rewrite::CollapseEncodeDecode);
    selector.register_rewrite(rewrite::InlineAssign);
    selector.register_rewrite(rewrite::CanonicalizeOperands);
    selector.register_rewrite(rewrite::FoldMultiplications);
    selector.register_rewrite(rewrite::StrengthReduce);

    // Multi-instruction idioms
    selector.register_tile(tiles::LeaTile);
    selector.register_tile(tiles::CondJumpTile);
    selector.register_tile(tiles::LoadTile);
    selector.register_tile(tiles::StoreTile);
    selector.register_tile(tiles::SelfUpdateTile);

    // In-place arithmetic
    selector.register_tile(tiles::IncDecTile);
    selector.register_tile(tiles::CompoundTile);
    selector.register_tile(tiles::BinaryTile);

    // One-to-one
    selector.register_tile(tiles::MoveTile);
    selector.register_tile(tiles::CompareTile);
    selector.register_tile(tiles::ReturnTile);
    selector.register_tile(tiles::LabelTile);
    selector.register_tile(tiles::CallTile);
}
