use log::trace;

use crate::ast::{BlockStatement, Expression, ExpressionKind, Node, Program, Statement, StatementKind};

type Transform<'a> = dyn FnMut(Node) -> Node + 'a;

/// Rewrites a tree bottom-up.
///
/// Every node's children are rewritten first, then the node itself is handed
/// to `transform` and replaced by whatever comes back. A child slot only
/// accepts a node of its own capability: if `transform` turns an expression
/// into a statement, say, the slot keeps the value it had before `transform`
/// saw it. The root is returned as `transform` left it.
pub fn modify(node: Node, mut transform: impl FnMut(Node) -> Node) -> Node {
    modify_node(node, &mut transform)
}

fn modify_node(node: Node, transform: &mut Transform) -> Node {
    let node = match node {
        Node::Program(program) => Node::Program(Program {
            statements: modify_statements(program.statements, transform),
        }),
        Node::Statement(statement) => Node::Statement(statement_children(statement, transform)),
        Node::Block(block) => Node::Block(block_children(block, transform)),
        Node::Expression(expression) => Node::Expression(expression_children(expression, transform)),
    };

    transform(node)
}

fn rewrite_slot<T: Clone>(
    value: T,
    wrap: fn(T) -> Node,
    unwrap: fn(Node) -> Option<T>,
    transform: &mut Transform,
) -> T {
    match unwrap(transform(wrap(value.clone()))) {
        Some(rewritten) => rewritten,
        None => {
            trace!("rewrite produced a node of the wrong kind for its slot, keeping the original");
            value
        }
    }
}

fn as_statement(node: Node) -> Option<Statement> {
    match node {
        Node::Statement(statement) => Some(statement),
        _ => None,
    }
}

fn as_block(node: Node) -> Option<BlockStatement> {
    match node {
        Node::Block(block) => Some(block),
        _ => None,
    }
}

fn as_expression(node: Node) -> Option<Expression> {
    match node {
        Node::Expression(expression) => Some(expression),
        _ => None,
    }
}

fn as_identifier(node: Node) -> Option<String> {
    match node {
        Node::Expression(Expression { kind: ExpressionKind::Identifier(name), .. }) => Some(name),
        _ => None,
    }
}

fn identifier_node(name: String) -> Node {
    Node::Expression(ExpressionKind::Identifier(name).into())
}

fn modify_statements(statements: Vec<Statement>, transform: &mut Transform) -> Vec<Statement> {
    statements
        .into_iter()
        .map(|statement| modify_statement(statement, transform))
        .collect()
}

fn modify_statement(statement: Statement, transform: &mut Transform) -> Statement {
    let statement = statement_children(statement, transform);
    rewrite_slot(statement, Node::Statement, as_statement, transform)
}

fn modify_block(block: BlockStatement, transform: &mut Transform) -> BlockStatement {
    let block = block_children(block, transform);
    rewrite_slot(block, Node::Block, as_block, transform)
}

fn modify_expression(expression: Expression, transform: &mut Transform) -> Expression {
    let expression = expression_children(expression, transform);
    rewrite_slot(expression, Node::Expression, as_expression, transform)
}

fn modify_boxed(expression: Box<Expression>, transform: &mut Transform) -> Box<Expression> {
    Box::new(modify_expression(*expression, transform))
}

fn modify_expressions(expressions: Vec<Expression>, transform: &mut Transform) -> Vec<Expression> {
    expressions
        .into_iter()
        .map(|expression| modify_expression(expression, transform))
        .collect()
}

fn modify_parameters(parameters: Vec<String>, transform: &mut Transform) -> Vec<String> {
    parameters
        .into_iter()
        .map(|name| rewrite_slot(name, identifier_node, as_identifier, transform))
        .collect()
}

fn statement_children(statement: Statement, transform: &mut Transform) -> Statement {
    let Statement { token, kind } = statement;

    let kind = match kind {
        StatementKind::Let { name, value } => StatementKind::Let {
            name,
            value: modify_expression(value, transform),
        },
        StatementKind::Return(value) => StatementKind::Return(modify_expression(value, transform)),
        StatementKind::Expression(expression) => StatementKind::Expression(modify_expression(expression, transform)),
    };

    Statement::new(token, kind)
}

fn block_children(block: BlockStatement, transform: &mut Transform) -> BlockStatement {
    BlockStatement::new(block.token, modify_statements(block.statements, transform))
}

fn expression_children(expression: Expression, transform: &mut Transform) -> Expression {
    let Expression { token, kind } = expression;

    let kind = match kind {
        ExpressionKind::Identifier(_)
        | ExpressionKind::Integer(_)
        | ExpressionKind::String(_)
        | ExpressionKind::Boolean(_) => kind,
        ExpressionKind::Prefix { operator, right } => ExpressionKind::Prefix {
            operator,
            right: modify_boxed(right, transform),
        },
        ExpressionKind::Infix { left, operator, right } => ExpressionKind::Infix {
            left: modify_boxed(left, transform),
            operator,
            right: modify_boxed(right, transform),
        },
        ExpressionKind::If { condition, consequence, alternative } => ExpressionKind::If {
            condition: modify_boxed(condition, transform),
            consequence: modify_block(consequence, transform),
            alternative: alternative.map(|block| modify_block(block, transform)),
        },
        ExpressionKind::Function { parameters, body } => ExpressionKind::Function {
            parameters: modify_parameters(parameters, transform),
            body: modify_block(body, transform),
        },
        ExpressionKind::Macro { parameters, body } => ExpressionKind::Macro {
            parameters: modify_parameters(parameters, transform),
            body: modify_block(body, transform),
        },
        ExpressionKind::Call { function, arguments } => ExpressionKind::Call {
            function: modify_boxed(function, transform),
            arguments: modify_expressions(arguments, transform),
        },
        ExpressionKind::Array(elements) => ExpressionKind::Array(modify_expressions(elements, transform)),
        ExpressionKind::Index { left, index } => ExpressionKind::Index {
            left: modify_boxed(left, transform),
            index: modify_boxed(index, transform),
        },
        // Rebuilt, since a rewritten key is a different key.
        ExpressionKind::Dict(pairs) => ExpressionKind::Dict(
            pairs
                .into_iter()
                .map(|(key, value)| (modify_expression(key, transform), modify_expression(value, transform)))
                .collect(),
        ),
    };

    Expression::new(token, kind)
}
