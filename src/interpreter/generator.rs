use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use compact_str::{CompactString, ToCompactString};

use super::environment::Environment;
use super::error::{RuntimeError, RuntimeErrorKind};
use super::resumable::{
    AssignNode, BlockNode, DefineNode, ExpressionNode, IfNode, Node, NodeRef, NodeState,
    ResumableTree, ReturnNode, TreeCursor, Unwind, WhileNode, YieldNode,
};
use super::value::Value;
use super::SystemContext;
use crate::lexer::Span;
use crate::parser::statement::{Block, Declaration, FunctionDecl, FunctionKind, Statement};

/// Lowers a `gen` declaration into its resumable tree. Runs once per
/// declaration; every instance afterwards shares the result.
pub fn compile_generator(declaration: &FunctionDecl) -> Result<CompiledGenerator, RuntimeErrorKind> {
    if declaration.kind != FunctionKind::Gen {
        return Err(RuntimeErrorKind::NotAGenerator(
            declaration.name.name.clone(),
        ));
    }
    let mut tree = ResumableTree::new();
    // The body block reuses the instance environment directly so parameters
    // and top-level variables live side by side.
    let root = compile_block(&mut tree, &declaration.body, "function", false)?;
    tree.set_root(root);
    Ok(CompiledGenerator {
        name: declaration.name.name.clone(),
        parameters: declaration
            .parameters
            .iter()
            .map(|parameter| parameter.name.clone())
            .collect(),
        tree,
        span: declaration.span,
    })
}

fn compile_block(
    tree: &mut ResumableTree,
    block: &Block,
    label: &str,
    own_scope: bool,
) -> Result<NodeRef, RuntimeErrorKind> {
    let mut statements = Vec::with_capacity(block.declarations.len());
    for declaration in &block.declarations {
        match declaration {
            Declaration::Function(_) => return Err(RuntimeErrorKind::NestedFunctionInGenerator),
            Declaration::Statement(statement) => {
                statements.push(compile_statement(tree, statement)?);
            }
        }
    }
    let state = tree.next_state();
    Ok(tree.push(Node::Block(BlockNode {
        label: label.to_compact_string(),
        statements,
        own_scope,
        state,
        span: block.span,
    })))
}

fn compile_statement(
    tree: &mut ResumableTree,
    statement: &Statement,
) -> Result<NodeRef, RuntimeErrorKind> {
    match statement {
        Statement::Block(block) => compile_block(tree, block, "block", true),
        Statement::VariableDecl(decl) => Ok(tree.push(Node::Define(DefineNode {
            name: decl.name.name.clone(),
            initializer: decl.initializer.clone(),
        }))),
        Statement::Assignment(assignment) => Ok(tree.push(Node::Assign(AssignNode {
            name: assignment.name.name.clone(),
            value: assignment.value.clone(),
            span: assignment.span,
        }))),
        Statement::Expression(stmt) => Ok(tree.push(Node::Expression(ExpressionNode {
            expr: stmt.expr.clone(),
        }))),
        Statement::If(stmt) => {
            let then_branch = compile_statement(tree, &stmt.then_branch)?;
            let else_branch = match &stmt.else_branch {
                Some(branch) => Some(compile_statement(tree, branch)?),
                None => None,
            };
            let state = tree.next_state();
            Ok(tree.push(Node::If(IfNode {
                condition: stmt.condition.clone(),
                then_branch,
                else_branch,
                state,
                span: stmt.span,
            })))
        }
        Statement::While(stmt) => {
            let body = compile_statement(tree, &stmt.body)?;
            let state = tree.next_state();
            Ok(tree.push(Node::While(WhileNode {
                condition: stmt.condition.clone(),
                body,
                state,
                span: stmt.span,
            })))
        }
        Statement::Return(stmt) => Ok(tree.push(Node::Return(ReturnNode {
            value: stmt.value.clone(),
        }))),
        Statement::Yield(stmt) => Ok(tree.push(Node::Yield(YieldNode {
            value: stmt.value.clone(),
        }))),
    }
}

#[derive(Debug)]
pub struct CompiledGenerator {
    name: CompactString,
    parameters: Vec<CompactString>,
    tree: ResumableTree,
    span: Span,
}

impl CompiledGenerator {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[CompactString] {
        &self.parameters
    }

    /// Binds named arguments and produces a fresh paused instance. All
    /// parameters must be supplied and no extras tolerated; argument
    /// problems surface here, before the body runs at all.
    pub fn instantiate(
        self: &Arc<Self>,
        arguments: HashMap<CompactString, Value>,
    ) -> Result<GeneratorInstance, RuntimeErrorKind> {
        let mut missing: Vec<CompactString> = self
            .parameters
            .iter()
            .filter(|parameter| !arguments.contains_key(*parameter))
            .cloned()
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(RuntimeErrorKind::MissingArguments(missing));
        }
        let mut extra: Vec<CompactString> = arguments
            .keys()
            .filter(|name| !self.parameters.contains(name))
            .cloned()
            .collect();
        if !extra.is_empty() {
            extra.sort_unstable();
            return Err(RuntimeErrorKind::UnexpectedArguments(extra));
        }
        let environment = Environment::with_bindings(&self.name, arguments);
        Ok(GeneratorInstance {
            states: self.tree.fresh_states(),
            environment,
            exhausted: false,
            generator: self.clone(),
        })
    }
}

/// One step of a resumed generator.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Yielded(Value),
    /// The instance finished, with the terminal `return` value if it had one.
    Done(Option<Value>),
}

#[derive(Debug)]
pub struct GeneratorInstance {
    generator: Arc<CompiledGenerator>,
    states: Vec<NodeState>,
    environment: Environment,
    exhausted: bool,
}

impl GeneratorInstance {
    pub fn resume(
        &mut self,
        caller_environment: &Environment,
        context: &mut dyn SystemContext,
    ) -> Result<Step, RuntimeError> {
        if self.exhausted {
            return Err(RuntimeError {
                kind: RuntimeErrorKind::InvalidState("resumed an exhausted generator"),
                span: self.generator.span,
            });
        }
        // Rechained on every resumption: the same instance may be driven
        // from different scopes over its lifetime.
        self.environment
            .chain_to(Some(caller_environment.clone()));
        context.trace(&format!("resuming `{}`", self.generator.name));
        let environment = self.environment.clone();
        let root = self.generator.tree.root();
        let outcome = {
            let mut cursor = TreeCursor::new(&self.generator.tree, &mut self.states);
            cursor.resume(root, &environment, context)
        };
        match outcome {
            Err(Unwind::Yielded { value, .. }) => {
                context.trace(&format!("`{}` yielded {value}", self.generator.name));
                Ok(Step::Yielded(value))
            }
            Err(Unwind::Returned(value)) => {
                self.exhausted = true;
                context.trace(&format!("`{}` returned", self.generator.name));
                Ok(Step::Done(
                    value.filter(|value| !matches!(value, Value::Nil)),
                ))
            }
            Err(Unwind::Finished) => {
                self.exhausted = true;
                context.trace(&format!("`{}` finished", self.generator.name));
                Ok(Step::Done(None))
            }
            Err(Unwind::Fault(error)) => Err(error),
            Ok(()) => Err(RuntimeError {
                kind: RuntimeErrorKind::InvalidState("pass ended without a signal"),
                span: self.generator.span,
            }),
        }
    }
}

/// Shared, language-visible handle to a generator instance.
#[derive(Debug, Clone)]
pub struct GeneratorHandle {
    name: CompactString,
    span: Span,
    instance: Arc<Mutex<GeneratorInstance>>,
    environment: Environment,
}

impl GeneratorHandle {
    pub fn new(name: CompactString, instance: GeneratorInstance, environment: Environment) -> Self {
        let span = instance.generator.span;
        Self {
            name,
            span,
            instance: Arc::new(Mutex::new(instance)),
            environment,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_same_instance(&self, other: &GeneratorHandle) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }

    pub fn resume(&self, context: &mut dyn SystemContext) -> Result<Step, RuntimeError> {
        // try_lock doubles as re-entrancy detection: a generator that ends
        // up resuming itself mid-pass trips here instead of deadlocking.
        let mut instance = self.instance.try_lock().map_err(|_| RuntimeError {
            kind: RuntimeErrorKind::InvalidState("generator is already being resumed"),
            span: self.span,
        })?;
        instance.resume(&self.environment, context)
    }

    /// Drains the instance, appending the terminal return value when the
    /// generator ends with one.
    pub fn collect(&self, context: &mut dyn SystemContext) -> Result<Vec<Value>, RuntimeError> {
        let mut items = Vec::new();
        loop {
            match self.resume(context)? {
                Step::Yielded(value) => items.push(value),
                Step::Done(terminal) => {
                    if let Some(value) = terminal {
                        items.push(value);
                    }
                    return Ok(items);
                }
            }
        }
    }
}
