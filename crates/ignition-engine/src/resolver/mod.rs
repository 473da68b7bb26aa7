//! Scope resolution.
//!
//! A single pre-order walk over the tree that builds the context tree,
//! assigns a slot to every declared variable, binds every identifier to the
//! innermost declaring context and hoists pool-resident literals into the
//! global constant pool. All results are written back into the tree.
//!
//! ```rust
//! use ignition_engine::parser::Parser;
//! use ignition_engine::resolver::Resolver;
//!
//! let mut program = Parser::new("var a = 1.5; { var b = a; }").parse_program().unwrap();
//! let scopes = Resolver::new().resolve(&mut program).unwrap();
//! assert_eq!(scopes.len(), 2);
//! assert_eq!(scopes.constants().len(), 1);
//! ```

mod context;

pub use context::{
    Binding, BindingScope, Constant, ConstantIndex, ConstantValue, Context, ContextId, ScopeTree,
    SlotIndex,
};

use tracing::{debug, instrument, trace};

use crate::ast::{BinaryOp, Block, Identifier, Node, Number, NumberLiteral, VarDecl};
use crate::config::EngineConfig;
use crate::error::ResolutionError;

/// Walks a syntax tree once and annotates it with scope information.
#[derive(Debug, Default)]
pub struct Resolver {
    scopes: ScopeTree,
    active: Option<ContextId>,
    dedupe_constants: bool,
}

impl Resolver {
    /// Creates a resolver with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver honoring the relevant `config` options.
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            dedupe_constants: config.dedupe_constants,
            ..Self::default()
        }
    }

    /// Resolves `root`, which becomes the global context.
    ///
    /// On error the tree may be partially annotated and must not be compiled.
    #[instrument(skip_all)]
    pub fn resolve(mut self, root: &mut Block) -> Result<ScopeTree, ResolutionError> {
        self.resolve_block(root)?;

        debug!(
            contexts = self.scopes.len(),
            constants = self.scopes.constants().len(),
            globals = self.scopes.global().map_or(0, Context::slot_count),
            "resolved program"
        );

        Ok(self.scopes)
    }

    fn resolve_node(&mut self, node: &mut Node) -> Result<(), ResolutionError> {
        match node {
            Node::Block(block) => self.resolve_block(block),
            Node::VarDecl(decl) => self.resolve_var_decl(decl),
            Node::BinaryOp(bin) => self.resolve_binary(bin),
            Node::Identifier(ident) => self.resolve_identifier(ident),
            Node::NumberLiteral(lit) => {
                self.resolve_number(lit);
                Ok(())
            }
        }
    }

    fn resolve_block(&mut self, block: &mut Block) -> Result<(), ResolutionError> {
        let context = self.push_context(block);
        block.context = Some(context);

        for statement in &mut block.body {
            self.resolve_node(statement)?;
        }

        self.pop_context();
        Ok(())
    }

    fn resolve_var_decl(&mut self, decl: &mut VarDecl) -> Result<(), ResolutionError> {
        let context = self.active_context();
        let slot = self.scopes.get_mut(context).declare(&decl.name);
        trace!(name = %decl.name, slot, context = context.index(), "declared variable");

        decl.context = Some(context);
        decl.slot = Some(slot);

        self.resolve_node(&mut decl.init)
    }

    fn resolve_binary(&mut self, bin: &mut BinaryOp) -> Result<(), ResolutionError> {
        bin.context = Some(self.active_context());
        self.resolve_node(&mut bin.left)?;
        self.resolve_node(&mut bin.right)
    }

    fn resolve_identifier(&mut self, ident: &mut Identifier) -> Result<(), ResolutionError> {
        let context = self.active_context();
        ident.context = Some(context);

        let binding = self.scopes.lookup(context, &ident.name).ok_or_else(|| {
            ResolutionError::UndeclaredIdentifier {
                name: ident.name.clone(),
                location: ident.location.clone(),
            }
        })?;
        ident.binding = Some(binding);
        Ok(())
    }

    fn resolve_number(&mut self, lit: &mut NumberLiteral) {
        let context = self.active_context();
        lit.context = Some(context);

        let value = match lit.value {
            Number::Integer(n) if i32::try_from(n).is_ok() => return,
            Number::Integer(n) => ConstantValue::Integer(n),
            Number::Float(f) => ConstantValue::Float(f),
        };

        let index = self
            .scopes
            .register_constant(context, value, self.dedupe_constants);
        trace!(index, ?value, "hoisted constant");
        lit.constant = Some(index);
    }

    fn push_context(&mut self, owner: &Block) -> ContextId {
        let id = self.scopes.push(self.active, owner.location.clone());
        self.active = Some(id);
        id
    }

    fn pop_context(&mut self) {
        self.active = self
            .active
            .and_then(|id| self.scopes.get(id).parent());
    }

    fn active_context(&self) -> ContextId {
        // The walk always starts at the root block, so a context is active
        // for every non-block node.
        self.active.unwrap_or(ContextId::ROOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::SourceLocation;
    use crate::parser::Parser;

    fn resolve(src: &str) -> (Block, Result<ScopeTree, ResolutionError>) {
        let mut program = Parser::new(src).parse_program().expect("should parse");
        let result = Resolver::new().resolve(&mut program);
        (program, result)
    }

    fn resolve_ok(src: &str) -> (Block, ScopeTree) {
        let (program, result) = resolve(src);
        (program, result.expect("should resolve"))
    }

    fn decl(node: &Node) -> &VarDecl {
        match node {
            Node::VarDecl(decl) => decl,
            other => panic!("expected declaration, got {:?}", other),
        }
    }

    fn block(node: &Node) -> &Block {
        match node {
            Node::Block(block) => block,
            other => panic!("expected block, got {:?}", other),
        }
    }

    fn ident(node: &Node) -> &Identifier {
        match node {
            Node::Identifier(ident) => ident,
            other => panic!("expected identifier, got {:?}", other),
        }
    }

    #[test]
    fn test_root_is_global() {
        let (program, scopes) = resolve_ok("var a = 1;");
        let global = scopes.global().unwrap();
        assert!(global.is_global());
        assert_eq!(program.context, Some(global.id()));
        assert_eq!(scopes.global_slot("a"), Some(0));
    }

    #[test]
    fn test_empty_program_still_has_global_context() {
        let (_, scopes) = resolve_ok("");
        assert_eq!(scopes.len(), 1);
        assert!(scopes.constants().is_empty());
    }

    #[test]
    fn test_contexts_are_created_in_block_order() {
        let (program, scopes) = resolve_ok("var a = 1;\n{ var b = 2; }\n{ { } }");
        let owners: Vec<_> = scopes
            .iter()
            .map(|context| {
                let owner = context.owner();
                (owner.line, owner.column)
            })
            .collect();
        assert_eq!(owners, vec![(1, 1), (2, 1), (3, 1), (3, 3)]);

        let first = &program.body[1];
        assert_eq!(first.context(), Some(scopes.iter().nth(1).unwrap().id()));
        assert_eq!(program.body[0].context(), program.context);
    }

    #[test]
    fn test_slots_in_declaration_order() {
        let (program, _) = resolve_ok("var a = 1; var b = 2; var c = 3;");
        let slots: Vec<_> = program.body.iter().map(|n| decl(n).slot).collect();
        assert_eq!(slots, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_redeclaration_reuses_slot() {
        let (program, scopes) = resolve_ok("var a = 1; var b = 2; var a = 3;");
        assert_eq!(decl(&program.body[0]).slot, decl(&program.body[2]).slot);
        assert_eq!(scopes.global().unwrap().slot_count(), 2);
    }

    #[test]
    fn test_nested_block_gets_child_context() {
        let (program, scopes) = resolve_ok("var a = 1; { var b = a; }");
        let inner = block(&program.body[1]);
        let inner_ctx = scopes.get(inner.context.unwrap());
        assert!(!inner_ctx.is_global());
        assert_eq!(inner_ctx.parent(), program.context);

        let b = decl(&inner.body[0]);
        assert_eq!(b.context, inner.context);
        assert_eq!(b.slot, Some(0));

        let a_ref = ident(&b.init);
        let binding = a_ref.binding.unwrap();
        assert_eq!(binding.scope, BindingScope::Global);
        assert_eq!(binding.slot, 0);
    }

    #[test]
    fn test_identifier_in_nested_context_uses_depth() {
        let (program, _) = resolve_ok("{ var x = 1; { var y = x; } }");
        let outer = block(&program.body[0]);
        let inner = block(&outer.body[1]);
        let y = decl(&inner.body[0]);
        let binding = ident(&y.init).binding.unwrap();
        assert_eq!(binding.scope, BindingScope::Context { depth: 1 });
        assert_eq!(binding.context, outer.context.unwrap());
    }

    #[test]
    fn test_sibling_block_variables_are_invisible() {
        let (_, result) = resolve("{ var x = 1; } { var y = x; }");
        assert!(matches!(
            result,
            Err(ResolutionError::UndeclaredIdentifier { ref name, .. }) if name == "x"
        ));
    }

    #[test]
    fn test_inner_variable_invisible_to_parent() {
        let (_, result) = resolve("{ var x = 1; } var y = x;");
        assert!(result.is_err());
    }

    #[test]
    fn test_undeclared_identifier_reports_location() {
        let (_, result) = resolve("var x = y;");
        match result {
            Err(ResolutionError::UndeclaredIdentifier { name, location }) => {
                assert_eq!(name, "y");
                assert_eq!((location.line, location.column), (1, 9));
            }
            other => panic!("expected resolution error, got {:?}", other),
        }
    }

    #[test]
    fn test_self_reference_resolves_to_new_slot() {
        let (program, _) = resolve_ok("var x = 1; { var x = x; }");
        let inner = block(&program.body[1]);
        let binding = ident(&decl(&inner.body[0]).init).binding.unwrap();
        assert_eq!(binding.context, inner.context.unwrap());
    }

    #[test]
    fn test_float_literals_hoisted_in_order() {
        let (_, scopes) = resolve_ok("var a = 1.5 * 2.5; { var b = 3.5 + 1.5; }");
        let values: Vec<_> = scopes.constants().iter().map(|c| c.value).collect();
        assert_eq!(
            values,
            vec![
                ConstantValue::Float(1.5),
                ConstantValue::Float(2.5),
                ConstantValue::Float(3.5),
                ConstantValue::Float(1.5),
            ]
        );
        let indices: Vec<_> = scopes.constants().iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_small_integers_stay_out_of_pool() {
        let (_, scopes) = resolve_ok("var a = 2147483647; var b = 0;");
        assert!(scopes.constants().is_empty());
    }

    #[test]
    fn test_wide_integers_are_hoisted() {
        let (program, scopes) = resolve_ok("var a = 2147483648;");
        assert_eq!(
            scopes.constants()[0].value,
            ConstantValue::Integer(2_147_483_648)
        );
        match decl(&program.body[0]).init.as_ref() {
            Node::NumberLiteral(lit) => assert_eq!(lit.constant, Some(0)),
            other => panic!("expected literal, got {:?}", other),
        }
    }

    #[test]
    fn test_dedupe_config() {
        let config = EngineConfig {
            dedupe_constants: true,
            ..EngineConfig::default()
        };
        let mut program = Parser::new("var a = 1.5; var b = 1.5;").parse_program().unwrap();
        let scopes = Resolver::with_config(&config).resolve(&mut program).unwrap();
        assert_eq!(scopes.constants().len(), 1);
    }

    #[test]
    fn test_hand_built_tree() {
        let loc = SourceLocation::default();
        let mut root = Block::new(
            vec![VarDecl::new("n", NumberLiteral::float(0.5, loc.clone()).into(), loc.clone()).into()],
            loc,
        );
        let scopes = Resolver::new().resolve(&mut root).unwrap();
        assert_eq!(scopes.global_slot("n"), Some(0));
        assert_eq!(scopes.constants().len(), 1);
    }
}
