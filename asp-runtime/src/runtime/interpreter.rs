//! # Interpreter 模块
//!
//! 在 [`Context`] 链上遍历执行 AST。
//!
//! ## 求值规则
//!
//! - 变量作为实参时传递它的格子本身，其他表达式（含括号）传递新格子
//! - 变量的值是函数时，作为值使用即以零个实参调用
//! - 以调用为目标的赋值把右值追加为最后一个实参去调用被调用者
//! - 运算直接调用节点上捕获的运算实现

use std::rc::Rc;

use tracing::{debug, trace};

use crate::config::RuntimeConfig;
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::script::Location;
use crate::script::ast::{Block, Call, Expression, FunctionDecl, FunctionKind, New, Statement};

use super::context::Context;
use super::function::InterpretedFunc;
use super::ops::truthy;
use super::value::{Func, Object, Slot, Value};

/// 语句执行后的控制流
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// 继续执行下一条语句
    Normal,
    /// `exit function` / `exit sub`：结束当前函数
    Exit,
}

/// 解释器
///
/// 只保存执行预算与配置；所有变量状态都在 [`Context`] 中。
#[derive(Debug)]
pub struct Interpreter {
    config: RuntimeConfig,
    depth: usize,
    steps: u64,
}

impl Interpreter {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            depth: 0,
            steps: 0,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// 已执行的语句数
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// 提升并执行顶层语句块
    pub fn run(&mut self, block: &Block, context: &Rc<Context>) -> Result<(), RuntimeError> {
        debug!(statements = block.statements.len(), "开始执行");
        context.hoist(block);
        self.exec_block(block, context)?;
        debug!(steps = self.steps, "执行完成");
        Ok(())
    }

    /// 执行语句块，遇到 `exit` 时提前返回
    pub fn exec_block(
        &mut self,
        block: &Block,
        context: &Rc<Context>,
    ) -> Result<Flow, RuntimeError> {
        for statement in &block.statements {
            if self.exec(statement, context)? == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(
        &mut self,
        statement: &Statement,
        context: &Rc<Context>,
    ) -> Result<Flow, RuntimeError> {
        self.step(statement.location())?;
        match statement {
            // 声明在提升阶段已经处理
            Statement::Function(_)
            | Statement::Class(_)
            | Statement::Dim(_)
            | Statement::OptionExplicit { .. } => {}
            Statement::Assignment(assignment) => {
                let value = self.eval(&assignment.value, context)?;
                self.assign(&assignment.target, value, &assignment.location, context)?;
            }
            Statement::If(statement) => {
                let condition = self.eval(&statement.condition, context)?;
                let taken = truthy(&condition).map_err(|e| e.at(statement.condition.location()))?;
                let block = if taken {
                    &statement.then_block
                } else {
                    &statement.else_block
                };
                return self.exec_block(block, context);
            }
            Statement::Expression(statement) => {
                self.eval_slot(&statement.expression, context)?;
            }
            Statement::Exit { .. } => return Ok(Flow::Exit),
        }
        Ok(Flow::Normal)
    }

    fn step(&mut self, at: &Location) -> Result<(), RuntimeError> {
        self.steps += 1;
        match self.config.max_steps {
            Some(limit) if self.steps > limit => {
                Err(RuntimeErrorKind::StepLimitExceeded { limit }.at(at))
            }
            _ => Ok(()),
        }
    }

    /// 执行一次脚本函数调用
    ///
    /// 在声明作用域下创建活动作用域，按参数模式绑定实参，提升并执行函数体，
    /// 返回返回值格子。
    pub(crate) fn invoke(
        &mut self,
        decl: &FunctionDecl,
        scope: &Rc<Context>,
        args: Vec<Slot>,
        at: &Location,
    ) -> Result<Slot, RuntimeError> {
        if self.depth >= self.config.max_call_depth {
            return Err(RuntimeErrorKind::CallDepthExceeded {
                limit: self.config.max_call_depth,
            }
            .at(at));
        }
        trace!(function = %decl.name, depth = self.depth, "调用函数");

        let function_name = match decl.kind {
            FunctionKind::Function => Some(decl.name.as_str()),
            FunctionKind::Sub => None,
        };
        let activation = Context::activation(scope, function_name);
        for (param, arg) in decl.params.iter().zip(args) {
            let by_ref = param.by_ref.unwrap_or(self.config.default_by_ref);
            let slot = if by_ref { arg } else { Slot::new(arg.get()) };
            activation.bind(&param.name, slot);
        }
        activation.hoist(&decl.body);

        self.depth += 1;
        let result = self.exec_block(&decl.body, &activation);
        self.depth -= 1;
        result?;

        Ok(activation.return_slot())
    }

    /// 求值表达式
    pub fn eval(
        &mut self,
        expression: &Expression,
        context: &Rc<Context>,
    ) -> Result<Value, RuntimeError> {
        match expression {
            Expression::Literal(node) => Ok(node.value.to_value()),
            Expression::Variable(_) => Ok(self.eval_slot(expression, context)?.get()),
            Expression::Binary(node) => {
                let left = self.eval(&node.left, context)?;
                let right = self.eval(&node.right, context)?;
                (node.combine)(&left, &right).map_err(|e| e.at(&node.location))
            }
            Expression::Unary(node) => {
                let operand = self.eval(&node.operand, context)?;
                (node.combine)(&operand).map_err(|e| e.at(&node.location))
            }
            Expression::Call(node) => Ok(self.call(node, context)?.get()),
            Expression::New(node) => self.instantiate(node, context),
            Expression::Parenthesis(node) => self.eval(&node.inner, context),
        }
    }

    /// 求值为格子：变量得到共享的格子，其他表达式得到新格子
    pub fn eval_slot(
        &mut self,
        expression: &Expression,
        context: &Rc<Context>,
    ) -> Result<Slot, RuntimeError> {
        match expression {
            Expression::Variable(node) => {
                let slot = self.resolve_path(&node.path, &node.location, context)?;
                self.implicit_call(slot, &node.location)
            }
            Expression::Call(node) => self.call(node, context),
            _ => Ok(Slot::new(self.eval(expression, context)?)),
        }
    }

    /// 格子中是函数时以零个实参调用它
    fn implicit_call(&mut self, slot: Slot, at: &Location) -> Result<Slot, RuntimeError> {
        match slot.get() {
            Value::Func(func) => func.call(self, Vec::new(), at),
            _ => Ok(slot),
        }
    }

    /// 解析点号路径：第一段在作用域链中查找，其余各段是对象字段
    fn resolve_path(
        &mut self,
        path: &[String],
        at: &Location,
        context: &Rc<Context>,
    ) -> Result<Slot, RuntimeError> {
        let (first, members) = path
            .split_first()
            .ok_or_else(|| RuntimeErrorKind::InvalidAssignmentTarget.at(at))?;
        let mut slot = context.resolve(first).map_err(|e| e.at(at))?;
        for (index, member) in members.iter().enumerate() {
            let object = self.object_in(slot, &path[..=index], at)?;
            slot = object.field(member).ok_or_else(|| {
                RuntimeErrorKind::UnknownMember {
                    member: member.clone(),
                }
                .at(at)
            })?;
        }
        Ok(slot)
    }

    /// 取出格子中的对象（必要时先做隐式调用）
    fn object_in(
        &mut self,
        slot: Slot,
        path: &[String],
        at: &Location,
    ) -> Result<Rc<Object>, RuntimeError> {
        let value = self.implicit_call(slot, at)?.get();
        match value {
            Value::Object(object) => Ok(object),
            _ => Err(RuntimeErrorKind::NotAnObject {
                name: path.join("."),
            }
            .at(at)),
        }
    }

    /// 求值被调用者
    fn callee(
        &mut self,
        expression: &Expression,
        context: &Rc<Context>,
    ) -> Result<Rc<dyn Func>, RuntimeError> {
        let (value, name) = match expression {
            Expression::Variable(node) if node.path.len() == 1 => {
                let name = &node.path[0];
                let slot = context
                    .lookup_callee(name)
                    .map_err(|e| e.at(&node.location))?;
                let value = match slot {
                    Some(slot) => slot.get(),
                    None if context.is_explicit() => {
                        return Err(RuntimeErrorKind::Undeclared { name: name.clone() }
                            .at(&node.location));
                    }
                    None => Value::Empty,
                };
                (value, name.clone())
            }
            Expression::Variable(node) => {
                let slot = self.resolve_path(&node.path, &node.location, context)?;
                (slot.get(), node.dotted())
            }
            other => (self.eval(other, context)?, other.to_string()),
        };
        match value {
            Value::Func(func) => Ok(func),
            _ => Err(RuntimeErrorKind::NotCallable { name }.at(expression.location())),
        }
    }

    /// 求值实参：变量传格子本身（byref 的基础），其他表达式传新格子
    fn args(
        &mut self,
        args: &[Expression],
        context: &Rc<Context>,
    ) -> Result<Vec<Slot>, RuntimeError> {
        args.iter()
            .map(|arg| match arg {
                Expression::Variable(_) => self.eval_slot(arg, context),
                _ => Ok(Slot::new(self.eval(arg, context)?)),
            })
            .collect()
    }

    fn call(&mut self, node: &Call, context: &Rc<Context>) -> Result<Slot, RuntimeError> {
        let func = self.callee(&node.callee, context)?;
        let args = self.args(&node.args, context)?;
        func.call(self, args, &node.location)
    }

    /// 赋值
    fn assign(
        &mut self,
        target: &Expression,
        value: Value,
        at: &Location,
        context: &Rc<Context>,
    ) -> Result<(), RuntimeError> {
        match target {
            Expression::Variable(node) => match node.path.split_last() {
                Some((name, [])) => context.set(name, value).map_err(|e| e.at(&node.location)),
                Some((member, owner)) => {
                    let slot = self.resolve_path(owner, &node.location, context)?;
                    let object = self.object_in(slot, owner, &node.location)?;
                    match object.field(member) {
                        // 属性赋值：调用方法并把值作为唯一实参
                        Some(slot) => match slot.get() {
                            Value::Func(func) => {
                                func.call(self, vec![Slot::new(value)], at)?;
                            }
                            _ => slot.set(value),
                        },
                        None if !object.is_instance() => {
                            object.define(member, value);
                        }
                        None => {
                            return Err(RuntimeErrorKind::UnknownMember {
                                member: member.clone(),
                            }
                            .at(&node.location));
                        }
                    }
                    Ok(())
                }
                None => Err(RuntimeErrorKind::InvalidAssignmentTarget.at(at)),
            },
            // `f(1) = 2`：以 (1, 2) 调用 f
            Expression::Call(node) => {
                let func = self.callee(&node.callee, context)?;
                let mut args = self.args(&node.args, context)?;
                args.push(Slot::new(value));
                func.call(self, args, at)?;
                Ok(())
            }
            _ => Err(RuntimeErrorKind::InvalidAssignmentTarget.at(at)),
        }
    }

    /// `new C`：创建实例作用域，声明字段与方法，运行 `class_initialize`
    fn instantiate(&mut self, node: &New, context: &Rc<Context>) -> Result<Value, RuntimeError> {
        let (decl, home) = context
            .resolve_class(&node.class_name)
            .map_err(|e| e.at(&node.location))?
            .ok_or_else(|| {
                RuntimeErrorKind::UnknownClass {
                    name: node.class_name.clone(),
                }
                .at(&node.location)
            })?;

        let scope = Context::child(&home);
        let object = Rc::new(Object::instance(&decl.name, Rc::clone(&scope)));
        scope.set_owner(&object);

        for field in &decl.fields {
            let slot = scope.declare(&field.name, Value::Empty);
            object.insert(&field.name, slot);
        }
        for method in &decl.methods {
            let func: Rc<dyn Func> = Rc::new(InterpretedFunc::new(Rc::clone(method), &scope));
            let slot = scope.declare(&method.name, Value::Func(func));
            object.insert(&method.name, slot);
        }
        trace!(class = %decl.name, "创建实例");

        let initialize = object.field("class_initialize").map(|slot| slot.get());
        if let Some(Value::Func(initialize)) = initialize {
            initialize.call(self, Vec::new(), &node.location)?;
        }
        Ok(Value::Object(object))
    }
}
