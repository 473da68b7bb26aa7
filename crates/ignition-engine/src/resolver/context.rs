//! Lexical contexts and the arena that owns them.

use rustc_hash::FxHashMap;

use crate::lexer::SourceLocation;

/// Index of a variable slot inside its context.
pub type SlotIndex = u32;

/// Index into the global constant pool.
pub type ConstantIndex = u32;

/// Handle to a [`Context`] inside a [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u32);

impl ContextId {
    /// The global context always has this id.
    pub const ROOT: ContextId = ContextId(0);

    /// Returns the arena index of this context.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a resolved identifier's slot lives at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingScope {
    /// The slot is in the global slot array
    Global,
    /// The slot is in a scope frame, `depth` frames below the top
    Context {
        /// 0 for the innermost (current) frame
        depth: u32,
    },
}

/// The result of resolving an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// The declaring context
    pub context: ContextId,
    /// Slot index inside the declaring context
    pub slot: SlotIndex,
    /// Global or frame-relative addressing
    pub scope: BindingScope,
}

/// A literal that lives in the constant pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstantValue {
    /// A floating-point literal
    Float(f64),
    /// An integer literal too wide for a small-integer operand
    Integer(i64),
}

impl ConstantValue {
    fn same_bits(&self, other: &ConstantValue) -> bool {
        match (self, other) {
            (ConstantValue::Float(a), ConstantValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ConstantValue::Integer(a), ConstantValue::Integer(b)) => a == b,
            _ => false,
        }
    }
}

/// An index-stamped entry of the constant pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant {
    /// Position in the pool
    pub index: ConstantIndex,
    /// The literal value
    pub value: ConstantValue,
}

/// One lexical scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    id: ContextId,
    is_global: bool,
    parent: Option<ContextId>,
    /// Location of the block that owns this context
    owner: SourceLocation,
    next_slot_index: SlotIndex,
    declared_variables: FxHashMap<String, SlotIndex>,
    /// Only ever populated on the global context
    constant_pool: Vec<Constant>,
}

impl Context {
    fn new(id: ContextId, parent: Option<ContextId>, owner: SourceLocation) -> Self {
        Self {
            id,
            is_global: parent.is_none(),
            parent,
            owner,
            next_slot_index: 0,
            declared_variables: FxHashMap::default(),
            constant_pool: Vec::new(),
        }
    }

    /// This context's handle.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// True only for the root context.
    pub fn is_global(&self) -> bool {
        self.is_global
    }

    /// The enclosing context.
    pub fn parent(&self) -> Option<ContextId> {
        self.parent
    }

    /// Location of the owning block.
    pub fn owner(&self) -> &SourceLocation {
        &self.owner
    }

    /// Number of slots allocated so far.
    pub fn slot_count(&self) -> u32 {
        self.next_slot_index
    }

    /// Declares `name`, reusing its slot if it was already declared here.
    pub fn declare(&mut self, name: &str) -> SlotIndex {
        if let Some(&slot) = self.declared_variables.get(name) {
            return slot;
        }
        let slot = self.next_slot_index;
        self.next_slot_index += 1;
        self.declared_variables.insert(name.to_string(), slot);
        slot
    }

    /// Looks `name` up in this context only.
    pub fn slot_of(&self, name: &str) -> Option<SlotIndex> {
        self.declared_variables.get(name).copied()
    }

    /// Declared names with their slots, in slot order.
    pub fn variables(&self) -> Vec<(&str, SlotIndex)> {
        let mut vars: Vec<_> = self
            .declared_variables
            .iter()
            .map(|(name, &slot)| (name.as_str(), slot))
            .collect();
        vars.sort_by_key(|&(_, slot)| slot);
        vars
    }

    /// The constant pool (empty unless this is the global context).
    pub fn constants(&self) -> &[Constant] {
        &self.constant_pool
    }
}

/// Arena of contexts. Contexts only point upward, through parent ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeTree {
    contexts: Vec<Context>,
}

impl ScopeTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a context. The first context pushed becomes the global one.
    pub fn push(&mut self, parent: Option<ContextId>, owner: SourceLocation) -> ContextId {
        let id = ContextId(self.contexts.len() as u32);
        let parent = if self.contexts.is_empty() { None } else { parent };
        self.contexts.push(Context::new(id, parent, owner));
        id
    }

    /// Number of contexts.
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// True if no context has been created.
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Returns a context by id.
    pub fn get(&self, id: ContextId) -> &Context {
        &self.contexts[id.index()]
    }

    /// Returns a context by id, or `None` for an id from another tree.
    pub fn find(&self, id: ContextId) -> Option<&Context> {
        self.contexts.get(id.index())
    }

    /// Returns a context by id, mutably.
    pub fn get_mut(&mut self, id: ContextId) -> &mut Context {
        &mut self.contexts[id.index()]
    }

    /// The global context, if the tree is non-empty.
    pub fn global(&self) -> Option<&Context> {
        self.contexts.first()
    }

    /// All contexts in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Context> {
        self.contexts.iter()
    }

    /// The global constant pool.
    pub fn constants(&self) -> &[Constant] {
        self.global().map_or(&[], Context::constants)
    }

    /// Slot of a name declared in the global context.
    pub fn global_slot(&self, name: &str) -> Option<SlotIndex> {
        self.global().and_then(|global| global.slot_of(name))
    }

    /// Walks from `from` outward to the first context that declares `name`.
    pub fn lookup(&self, from: ContextId, name: &str) -> Option<Binding> {
        let mut depth = 0;
        let mut current = Some(from);

        while let Some(id) = current {
            let context = self.get(id);
            if let Some(slot) = context.slot_of(name) {
                let scope = if context.is_global {
                    BindingScope::Global
                } else {
                    BindingScope::Context { depth }
                };
                return Some(Binding {
                    context: id,
                    slot,
                    scope,
                });
            }
            depth += 1;
            current = context.parent;
        }

        None
    }

    /// Appends `value` to the constant pool of the global context reached
    /// from `from`. With `dedupe`, a bit-identical entry is reused.
    pub fn register_constant(
        &mut self,
        from: ContextId,
        value: ConstantValue,
        dedupe: bool,
    ) -> ConstantIndex {
        let mut id = from;
        while let Some(parent) = self.get(id).parent {
            id = parent;
        }

        let pool = &mut self.get_mut(id).constant_pool;
        if dedupe {
            if let Some(existing) = pool.iter().find(|c| c.value.same_bits(&value)) {
                return existing.index;
            }
        }

        let index = pool.len() as ConstantIndex;
        pool.push(Constant { index, value });
        index
    }
}
