//! # 打印
//!
//! 两种输出形式：
//!
//! - `Display`：可重新解析的源码。重新解析打印结果得到结构相同的 AST
//! - `to_sexpr`：紧凑的 S 表达式，用于测试与调试

use std::fmt::{self, Write};

use super::ast::{Block, Expression, FunctionDecl, LiteralValue, Statement};
use super::operators::UnaryOp;

const INDENT: &str = "    ";

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn join<T>(items: &[T], separator: &str, render: impl Fn(&T) -> String) -> String {
    items.iter().map(render).collect::<Vec<_>>().join(separator)
}

/// 跨行的模板文本只能以模板块的形式写回
fn template_text(statement: &Statement) -> Option<&str> {
    let Statement::Expression(statement) = statement else {
        return None;
    };
    let Expression::Call(call) = &statement.expression else {
        return None;
    };
    let Expression::Variable(callee) = call.callee.as_ref() else {
        return None;
    };
    let is_write = callee.path.len() == 2
        && callee.path[0].eq_ignore_ascii_case("response")
        && callee.path[1].eq_ignore_ascii_case("write");
    match call.args.as_slice() {
        [Expression::Literal(literal)] if is_write => match &literal.value {
            LiteralValue::String(text) if text.contains(['\n', '\r']) && !text.contains("<%") => {
                Some(text)
            }
            _ => None,
        },
        _ => None,
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, block: &Block, depth: usize) -> fmt::Result {
    for statement in &block.statements {
        write_statement(f, statement, depth)?;
    }
    Ok(())
}

fn write_function(f: &mut fmt::Formatter<'_>, decl: &FunctionDecl, depth: usize) -> fmt::Result {
    let indent = INDENT.repeat(depth);
    let params = join(&decl.params, ", ", |param| {
        let mode = match param.by_ref {
            Some(true) => "byref ",
            Some(false) => "byval ",
            None => "",
        };
        format!("{}{}", mode, param.name)
    });
    writeln!(f, "{}{} {}({})", indent, decl.kind.keyword(), decl.name, params)?;
    write_block(f, &decl.body, depth + 1)?;
    writeln!(f, "{}end {}", indent, decl.kind.keyword())
}

fn write_statement(f: &mut fmt::Formatter<'_>, statement: &Statement, depth: usize) -> fmt::Result {
    let indent = INDENT.repeat(depth);

    if let Some(text) = template_text(statement) {
        return writeln!(f, "{}%>{}<%", indent, text);
    }

    match statement {
        Statement::Function(decl) => write_function(f, decl, depth),
        Statement::Class(decl) => {
            writeln!(f, "{}class {}", indent, decl.name)?;
            for field in &decl.fields {
                writeln!(f, "{}{}dim {}", indent, INDENT, field.name)?;
            }
            for method in &decl.methods {
                write_function(f, method, depth + 1)?;
            }
            writeln!(f, "{}end class", indent)
        }
        Statement::Dim(dim) => writeln!(f, "{}dim {}", indent, dim.name),
        Statement::Assignment(assignment) => {
            writeln!(f, "{}{} = {}", indent, assignment.target, assignment.value)
        }
        Statement::If(statement) => {
            writeln!(f, "{}if {} then", indent, statement.condition)?;
            write_block(f, &statement.then_block, depth + 1)?;
            let mut else_block = &statement.else_block;
            // else 块只含一个条件时写成 elseif
            while let [Statement::If(nested)] = else_block.statements.as_slice() {
                writeln!(f, "{}elseif {} then", indent, nested.condition)?;
                write_block(f, &nested.then_block, depth + 1)?;
                else_block = &nested.else_block;
            }
            if !else_block.is_empty() {
                writeln!(f, "{}else", indent)?;
                write_block(f, else_block, depth + 1)?;
            }
            writeln!(f, "{}end if", indent)
        }
        Statement::Expression(statement) => match &statement.expression {
            Expression::Call(call) if matches!(call.callee.as_ref(), Expression::Variable(_)) => {
                if call.args.is_empty() {
                    writeln!(f, "{}{}", indent, call.callee)
                } else {
                    let args = join(&call.args, ", ", ToString::to_string);
                    writeln!(f, "{}{} {}", indent, call.callee, args)
                }
            }
            expression => writeln!(f, "{}call {}", indent, expression),
        },
        Statement::OptionExplicit { .. } => writeln!(f, "{}option explicit", indent),
        Statement::Exit { kind, .. } => writeln!(f, "{}exit {}", indent, kind.keyword()),
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_block(f, self, 0)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_statement(f, self, 0)
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{}", value),
            Self::String(value) => f.write_str(&quote(value)),
            Self::Boolean(value) => write!(f, "{}", value),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(node) => write!(f, "{}", node.value),
            Self::Variable(node) => f.write_str(&node.dotted()),
            Self::Binary(node) => write!(f, "{} {} {}", node.left, node.op.symbol(), node.right),
            Self::Unary(node) => match node.op {
                UnaryOp::Neg => write!(f, "-{}", node.operand),
                UnaryOp::Not => write!(f, "not {}", node.operand),
            },
            Self::Call(node) => {
                let args = join(&node.args, ", ", ToString::to_string);
                write!(f, "{}({})", node.callee, args)
            }
            Self::New(node) => write!(f, "new {}", node.class_name),
            Self::Parenthesis(node) => write!(f, "({})", node.inner),
        }
    }
}

impl Expression {
    /// S 表达式形式，如 `(+ 1 (* 2 3))`
    pub fn to_sexpr(&self) -> String {
        match self {
            Self::Literal(node) => node.value.to_string(),
            Self::Variable(node) => node.dotted(),
            Self::Binary(node) => format!(
                "({} {} {})",
                node.op.symbol(),
                node.left.to_sexpr(),
                node.right.to_sexpr()
            ),
            Self::Unary(node) => format!("({} {})", node.op.symbol(), node.operand.to_sexpr()),
            Self::Call(node) => {
                let mut out = format!("(call {}", node.callee.to_sexpr());
                for arg in &node.args {
                    let _ = write!(out, " {}", arg.to_sexpr());
                }
                out.push(')');
                out
            }
            Self::New(node) => format!("(new {})", node.class_name),
            Self::Parenthesis(node) => format!("(paren {})", node.inner.to_sexpr()),
        }
    }
}

impl Statement {
    /// S 表达式形式
    pub fn to_sexpr(&self) -> String {
        match self {
            Self::Function(decl) => function_sexpr(decl),
            Self::Class(decl) => {
                let mut out = format!("(class {}", decl.name);
                for field in &decl.fields {
                    let _ = write!(out, " (dim {})", field.name);
                }
                for method in &decl.methods {
                    let _ = write!(out, " {}", function_sexpr(method));
                }
                out.push(')');
                out
            }
            Self::Dim(dim) => format!("(dim {})", dim.name),
            Self::Assignment(assignment) => format!(
                "(assign {} {})",
                assignment.target.to_sexpr(),
                assignment.value.to_sexpr()
            ),
            Self::If(statement) => format!(
                "(if {} {} {})",
                statement.condition.to_sexpr(),
                statement.then_block.to_sexpr(),
                statement.else_block.to_sexpr()
            ),
            Self::Expression(statement) => statement.expression.to_sexpr(),
            Self::OptionExplicit { .. } => "(option explicit)".to_string(),
            Self::Exit { kind, .. } => format!("(exit {})", kind.keyword()),
        }
    }
}

impl Block {
    /// S 表达式形式，如 `(block (dim x) (assign x 1))`
    pub fn to_sexpr(&self) -> String {
        let mut out = "(block".to_string();
        for statement in &self.statements {
            let _ = write!(out, " {}", statement.to_sexpr());
        }
        out.push(')');
        out
    }
}

fn function_sexpr(decl: &FunctionDecl) -> String {
    let params = join(&decl.params, " ", |param| match param.by_ref {
        Some(true) => format!("byref {}", param.name),
        Some(false) => format!("byval {}", param.name),
        None => param.name.clone(),
    });
    format!(
        "({} {} ({}) {})",
        decl.kind.keyword(),
        decl.name,
        params,
        decl.body.to_sexpr()
    )
}
