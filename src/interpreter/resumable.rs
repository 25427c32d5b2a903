//! Resumable statement trees.
//!
//! A generator body compiles into a flat arena of [`Node`]s. The arena is
//! immutable and shared between instances; everything that changes while an
//! instance runs (cursors, private scopes, cached conditions) lives in a
//! per-instance [`NodeState`] slice addressed through [`StateRef`] handles.
//!
//! Control flow is signalled through [`Unwind`] rather than by threading
//! return values: a yield, a return, a finished subtree and a runtime fault
//! all travel up the `Err` channel, and each parent decides from the signal
//! whether its own cursor moves.

use compact_str::CompactString;

use super::environment::Environment;
use super::error::{RuntimeError, RuntimeErrorKind};
use super::expression::evaluate;
use super::value::Value;
use super::SystemContext;
use crate::lexer::Span;
use crate::parser::expression::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef(u32);

impl NodeRef {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateRef(u32);

impl StateRef {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub enum Node {
    Block(BlockNode),
    If(IfNode),
    While(WhileNode),
    Yield(YieldNode),
    Return(ReturnNode),
    Define(DefineNode),
    Assign(AssignNode),
    Expression(ExpressionNode),
}

#[derive(Debug)]
pub struct BlockNode {
    pub label: CompactString,
    pub statements: Vec<NodeRef>,
    pub own_scope: bool,
    pub state: StateRef,
    pub span: Span,
}

#[derive(Debug)]
pub struct IfNode {
    pub condition: Expr,
    pub then_branch: NodeRef,
    pub else_branch: Option<NodeRef>,
    pub state: StateRef,
    pub span: Span,
}

#[derive(Debug)]
pub struct WhileNode {
    pub condition: Expr,
    pub body: NodeRef,
    pub state: StateRef,
    pub span: Span,
}

#[derive(Debug)]
pub struct YieldNode {
    pub value: Expr,
}

#[derive(Debug)]
pub struct ReturnNode {
    pub value: Option<Expr>,
}

#[derive(Debug)]
pub struct DefineNode {
    pub name: CompactString,
    pub initializer: Expr,
}

#[derive(Debug)]
pub struct AssignNode {
    pub name: CompactString,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug)]
pub struct ExpressionNode {
    pub expr: Expr,
}

/// Where a stateful node picks up on its next resumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    At(u32),
    Done,
}

/// Mutable per-instance state for one stateful node. Blocks use `scope`,
/// conditionals use `condition`; both are `None` until first touched.
#[derive(Debug, Clone)]
pub struct NodeState {
    cursor: Cursor,
    scope: Option<Environment>,
    condition: Option<Value>,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            cursor: Cursor::At(0),
            scope: None,
            condition: None,
        }
    }
}

#[derive(Debug)]
pub struct ResumableTree {
    nodes: Vec<Node>,
    state_count: u32,
    root: NodeRef,
}

impl ResumableTree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            state_count: 0,
            root: NodeRef(0),
        }
    }

    pub fn push(&mut self, node: Node) -> NodeRef {
        let reference = NodeRef(self.nodes.len() as u32);
        self.nodes.push(node);
        reference
    }

    pub fn next_state(&mut self) -> StateRef {
        let reference = StateRef(self.state_count);
        self.state_count += 1;
        reference
    }

    pub fn set_root(&mut self, root: NodeRef) {
        self.root = root;
    }

    pub fn root(&self) -> NodeRef {
        self.root
    }

    pub fn get(&self, node: NodeRef) -> &Node {
        &self.nodes[node.index()]
    }

    /// Initial state slice for a fresh instance.
    pub fn fresh_states(&self) -> Vec<NodeState> {
        vec![NodeState::default(); self.state_count as usize]
    }
}

impl Default for ResumableTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Control signal travelling up through `Err` while a tree runs.
#[derive(Debug)]
pub enum Unwind {
    /// A `yield` fired. `source` identifies the yielding node so each parent
    /// can tell a direct child's yield from a deeper one.
    Yielded { value: Value, source: NodeRef },
    /// A `return` fired. Propagates to the instance unmodified.
    Returned(Option<Value>),
    /// The resumed subtree ran off its end.
    Finished,
    Fault(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        Self::Fault(error)
    }
}

pub type Resumption = Result<(), Unwind>;

fn fault(span: Span, what: &'static str) -> Unwind {
    Unwind::Fault(RuntimeError {
        kind: RuntimeErrorKind::InvalidState(what),
        span,
    })
}

/// A borrowed view pairing the shared tree with one instance's states.
pub struct TreeCursor<'t> {
    tree: &'t ResumableTree,
    states: &'t mut [NodeState],
}

impl<'t> TreeCursor<'t> {
    pub fn new(tree: &'t ResumableTree, states: &'t mut [NodeState]) -> Self {
        Self { tree, states }
    }

    pub fn resume(
        &mut self,
        node: NodeRef,
        environment: &Environment,
        context: &mut dyn SystemContext,
    ) -> Resumption {
        let tree = self.tree;
        match tree.get(node) {
            Node::Block(block) => self.resume_block(block, environment, context),
            Node::If(if_node) => self.resume_if(if_node, environment, context),
            Node::While(while_node) => self.resume_while(while_node, environment, context),
            Node::Yield(yield_node) => {
                let value = evaluate(&yield_node.value, environment, context)?;
                Err(Unwind::Yielded {
                    value,
                    source: node,
                })
            }
            Node::Return(return_node) => {
                let value = match &return_node.value {
                    Some(expr) => Some(evaluate(expr, environment, context)?),
                    None => None,
                };
                Err(Unwind::Returned(value))
            }
            Node::Define(define) => {
                let value = evaluate(&define.initializer, environment, context)?;
                environment.define(&define.name, value);
                Ok(())
            }
            Node::Assign(assign) => {
                let value = evaluate(&assign.value, environment, context)?;
                environment
                    .assign(&assign.name, value)
                    .map_err(|_| RuntimeError {
                        kind: RuntimeErrorKind::UndefinedVariable(assign.name.clone()),
                        span: assign.span,
                    })?;
                Ok(())
            }
            Node::Expression(expression) => {
                let _ = evaluate(&expression.expr, environment, context)?;
                Ok(())
            }
        }
    }

    fn resume_block(
        &mut self,
        block: &'t BlockNode,
        environment: &Environment,
        context: &mut dyn SystemContext,
    ) -> Resumption {
        if self.states[block.state.index()].cursor == Cursor::Done {
            return Err(fault(block.span, "resumed a finished block"));
        }
        // The private scope survives across resumptions but is rechained on
        // every entry; the enclosing environment may differ between calls.
        let scope = if block.own_scope {
            let scope = self.states[block.state.index()]
                .scope
                .get_or_insert_with(|| Environment::new(&block.label))
                .clone();
            scope.chain_to(Some(environment.clone()));
            context.trace(&format!("entering scope `{}`", scope.label()));
            scope
        } else {
            environment.clone()
        };
        loop {
            let index = match self.states[block.state.index()].cursor {
                Cursor::At(index) => index as usize,
                Cursor::Done => return Err(fault(block.span, "resumed a finished block")),
            };
            if index >= block.statements.len() {
                self.states[block.state.index()].cursor = Cursor::Done;
                return Err(Unwind::Finished);
            }
            let child = block.statements[index];
            self.advance(child, &scope, context, block.state, (index + 1) as u32, None)?;
        }
    }

    fn resume_if(
        &mut self,
        if_node: &'t IfNode,
        environment: &Environment,
        context: &mut dyn SystemContext,
    ) -> Resumption {
        loop {
            match self.states[if_node.state.index()].cursor {
                Cursor::At(0) => {
                    // The decided condition is cached so a branch that parks
                    // on a yield does not re-run condition side effects.
                    let condition = match self.states[if_node.state.index()].condition.clone() {
                        Some(value) => value,
                        None => {
                            let value = evaluate(&if_node.condition, environment, context)?;
                            self.states[if_node.state.index()].condition = Some(value.clone());
                            value
                        }
                    };
                    let branch = if condition.is_truthy() {
                        Some(if_node.then_branch)
                    } else {
                        if_node.else_branch
                    };
                    match branch {
                        Some(child) => {
                            self.advance(child, environment, context, if_node.state, 1, None)?
                        }
                        None => {
                            self.states[if_node.state.index()].cursor = Cursor::Done;
                            return Err(Unwind::Finished);
                        }
                    }
                }
                Cursor::At(_) => {
                    self.states[if_node.state.index()].cursor = Cursor::Done;
                    return Err(Unwind::Finished);
                }
                Cursor::Done => {
                    return Err(fault(if_node.span, "resumed a finished conditional"));
                }
            }
        }
    }

    fn resume_while(
        &mut self,
        while_node: &'t WhileNode,
        environment: &Environment,
        context: &mut dyn SystemContext,
    ) -> Resumption {
        loop {
            match self.states[while_node.state.index()].cursor {
                // Unlike a conditional, the condition re-evaluates on every
                // iteration, so it is never cached.
                Cursor::At(0) => {
                    let condition = evaluate(&while_node.condition, environment, context)?;
                    if condition.is_truthy() {
                        self.states[while_node.state.index()].cursor = Cursor::At(1);
                    } else {
                        self.states[while_node.state.index()].cursor = Cursor::Done;
                        return Err(Unwind::Finished);
                    }
                }
                Cursor::At(_) => {
                    self.advance(
                        while_node.body,
                        environment,
                        context,
                        while_node.state,
                        0,
                        Some(while_node.body),
                    )?;
                }
                Cursor::Done => {
                    return Err(fault(while_node.span, "resumed a finished loop"));
                }
            }
        }
    }

    /// Runs `child` and moves the parent cursor according to the outcome:
    ///
    /// * plain completion or a finished subtree moves it to `next_cursor`,
    /// * a yield from `child` itself moves it too and keeps unwinding, so
    ///   the next resumption starts after the yield,
    /// * a yield from deeper down leaves it alone so the next resumption
    ///   re-enters `child` at its own cursor,
    /// * returns and faults pass through untouched.
    fn advance(
        &mut self,
        child: NodeRef,
        environment: &Environment,
        context: &mut dyn SystemContext,
        parent: StateRef,
        next_cursor: u32,
        reset_on_finished: Option<NodeRef>,
    ) -> Resumption {
        match self.resume(child, environment, context) {
            Ok(()) => {
                self.states[parent.index()].cursor = Cursor::At(next_cursor);
                Ok(())
            }
            Err(Unwind::Yielded { value, source }) => {
                if source == child {
                    self.states[parent.index()].cursor = Cursor::At(next_cursor);
                }
                Err(Unwind::Yielded { value, source })
            }
            Err(Unwind::Finished) => {
                self.states[parent.index()].cursor = Cursor::At(next_cursor);
                if let Some(node) = reset_on_finished {
                    self.reset(node);
                }
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    /// Rewinds a subtree to its pristine state. Loop bodies go through this
    /// between iterations so cursors, private scopes and cached conditions
    /// start over.
    fn reset(&mut self, node: NodeRef) {
        let tree = self.tree;
        match tree.get(node) {
            Node::Block(block) => {
                let state = &mut self.states[block.state.index()];
                state.cursor = Cursor::At(0);
                state.scope = None;
                for &child in &block.statements {
                    self.reset(child);
                }
            }
            Node::If(if_node) => {
                let state = &mut self.states[if_node.state.index()];
                state.cursor = Cursor::At(0);
                state.condition = None;
                self.reset(if_node.then_branch);
                if let Some(else_branch) = if_node.else_branch {
                    self.reset(else_branch);
                }
            }
            Node::While(while_node) => {
                self.states[while_node.state.index()].cursor = Cursor::At(0);
                self.reset(while_node.body);
            }
            Node::Yield(_)
            | Node::Return(_)
            | Node::Define(_)
            | Node::Assign(_)
            | Node::Expression(_) => {}
        }
    }
}
