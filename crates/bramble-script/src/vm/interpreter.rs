//! The tree-walking interpreter.

use crate::ast::*;
use crate::error::{Error, Result};
use crate::runtime::environment::Environment;
use crate::runtime::function::Callable;
use crate::runtime::object::ObjectRef;
use crate::runtime::value::Value;

/// Services the embedding host provides to running code.
pub trait Host {
    /// Loads `specifier` on behalf of the module whose filename is `owner`
    /// (the `require` binding that was called).
    fn require(&mut self, owner: &str, specifier: &str) -> Result<Value>;
}

/// Executes a parsed program against one module scope.
pub struct Interpreter<'h> {
    env: Environment,
    this: Value,
    globals: ObjectRef,
    host: Option<&'h mut dyn Host>,
}

impl<'h> Interpreter<'h> {
    /// Creates an interpreter. Without a host, calls to `require` fail.
    pub fn new(globals: ObjectRef, this: Value, host: Option<&'h mut dyn Host>) -> Self {
        Self {
            env: Environment::new(),
            this,
            globals,
            host,
        }
    }

    /// The module scope, for binding wrapper parameters before `run`.
    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Runs the program; the result is the value of the last expression statement.
    pub fn run(&mut self, program: &Program) -> Result<Value> {
        let mut completion = Value::Undefined;
        for statement in &program.body {
            if let Some(value) = self.execute(statement)? {
                completion = value;
            }
        }
        Ok(completion)
    }

    fn execute(&mut self, statement: &Statement) -> Result<Option<Value>> {
        match statement {
            Statement::VariableDeclaration(decl) => {
                for declarator in &decl.declarations {
                    let value = match &declarator.init {
                        Some(init) => self.evaluate(init)?,
                        None => Value::Undefined,
                    };
                    self.env.declare(&declarator.name, decl.kind, value)?;
                }
                Ok(None)
            }
            Statement::Expression(expr) => self.evaluate(expr).map(Some),
            Statement::Empty => Ok(None),
        }
    }

    fn evaluate(&mut self, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::Number(n) => Ok(Value::Number(*n)),
            Expression::String(s) => Ok(Value::String(s.clone())),
            Expression::Boolean(b) => Ok(Value::Boolean(*b)),
            Expression::Null => Ok(Value::Null),
            Expression::This => Ok(self.this.clone()),
            Expression::Identifier(name) => self.lookup(name),
            Expression::Array(elements) => {
                let values = elements
                    .iter()
                    .map(|e| self.evaluate(e))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Array(crate::runtime::ArrayRef::new(values)))
            }
            Expression::Object(properties) => {
                let obj = ObjectRef::new();
                for property in properties {
                    let value = self.evaluate(&property.value)?;
                    obj.set(property.key.clone(), value);
                }
                Ok(Value::Object(obj))
            }
            Expression::Member(member) => {
                let object = self.evaluate(&member.object)?;
                let key = self.property_key(&member.property)?;
                get_property(&object, &key)
            }
            Expression::Call(call) => {
                let callee = self.evaluate(&call.callee)?;
                let args = call
                    .arguments
                    .iter()
                    .map(|a| self.evaluate(a))
                    .collect::<Result<Vec<_>>>()?;
                if !callee.is_function() {
                    return Err(Error::type_error(format!(
                        "{} is not a function",
                        describe(&call.callee)
                    )));
                }
                self.call(&callee, &args)
            }
            Expression::Assign(assign) => {
                let value = self.evaluate(&assign.value)?;
                self.assign(&assign.target, value.clone())?;
                Ok(value)
            }
            Expression::Unary(unary) => self.evaluate_unary(unary),
            Expression::Binary(binary) => {
                let left = self.evaluate(&binary.left)?;
                let right = self.evaluate(&binary.right)?;
                Ok(binary_op(binary.operator, &left, &right))
            }
            Expression::Logical(logical) => {
                let left = self.evaluate(&logical.left)?;
                let short_circuit = match logical.operator {
                    LogicalOperator::And => !left.to_boolean(),
                    LogicalOperator::Or => left.to_boolean(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(&logical.right)
                }
            }
        }
    }

    /// Calls a function value.
    pub fn call(&mut self, callee: &Value, args: &[Value]) -> Result<Value> {
        let Value::Function(callable) = callee else {
            return Err(Error::type_error(format!("{} is not a function", callee.inspect())));
        };
        match callable.as_ref() {
            Callable::Native { func, .. } => func(args),
            Callable::Require { owner } => {
                let specifier = match args.first() {
                    Some(Value::String(s)) if !s.is_empty() => s.clone(),
                    Some(Value::String(_)) => {
                        return Err(Error::type_error(
                            "The argument 'id' must be a non-empty string",
                        ));
                    }
                    _ => {
                        return Err(Error::type_error(
                            "The \"id\" argument must be of type string",
                        ));
                    }
                };
                match self.host.as_deref_mut() {
                    Some(host) => host.require(owner, &specifier),
                    None => Err(Error::type_error("require is not available outside a module")),
                }
            }
        }
    }

    fn evaluate_unary(&mut self, unary: &UnaryExpression) -> Result<Value> {
        if unary.operator == UnaryOperator::Typeof {
            if let Expression::Identifier(name) = unary.argument.as_ref() {
                if !self.is_bound(name) {
                    return Ok(Value::from("undefined"));
                }
            }
        }

        let argument = self.evaluate(&unary.argument)?;
        Ok(match unary.operator {
            UnaryOperator::Not => Value::Boolean(!argument.to_boolean()),
            UnaryOperator::Negate => Value::Number(-argument.to_number()),
            UnaryOperator::Typeof => Value::from(argument.type_of()),
        })
    }

    fn property_key(&mut self, property: &MemberProperty) -> Result<String> {
        match property {
            MemberProperty::Static(name) => Ok(name.clone()),
            MemberProperty::Computed(expr) => Ok(self.evaluate(expr)?.to_string()),
        }
    }

    fn is_bound(&self, name: &str) -> bool {
        self.env.get(name).is_some() || self.globals.has(name)
    }

    fn lookup(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.env.get(name) {
            return Ok(value);
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(value);
        }
        match name {
            "undefined" => Ok(Value::Undefined),
            "NaN" => Ok(Value::Number(f64::NAN)),
            "Infinity" => Ok(Value::Number(f64::INFINITY)),
            _ => Err(Error::ReferenceError(name.to_string())),
        }
    }

    fn assign(&mut self, target: &Expression, value: Value) -> Result<()> {
        match target {
            Expression::Identifier(name) => {
                if self.env.assign(name, value.clone())? {
                    return Ok(());
                }
                if self.globals.has(name) {
                    self.globals.set(name.clone(), value);
                    return Ok(());
                }
                // sloppy-mode implicit declaration, scoped to the module
                self.env.declare(name, VariableKind::Var, value)
            }
            Expression::Member(member) => {
                let object = self.evaluate(&member.object)?;
                let key = self.property_key(&member.property)?;
                set_property(&object, key, value)
            }
            _ => Err(Error::type_error("Invalid assignment target")),
        }
    }
}

fn get_property(object: &Value, key: &str) -> Result<Value> {
    match object {
        Value::Undefined | Value::Null => Err(Error::type_error(format!(
            "Cannot read properties of {} (reading '{}')",
            object, key
        ))),
        Value::Object(obj) => Ok(obj.get(key).unwrap_or_default()),
        Value::Array(arr) => {
            if key == "length" {
                return Ok(Value::Number(arr.len() as f64));
            }
            Ok(key
                .parse::<usize>()
                .ok()
                .and_then(|i| arr.get(i))
                .unwrap_or_default())
        }
        Value::String(s) => {
            if key == "length" {
                return Ok(Value::Number(s.chars().count() as f64));
            }
            Ok(key
                .parse::<usize>()
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::String(c.to_string()))
                .unwrap_or_default())
        }
        Value::Function(callable) if key == "name" => Ok(Value::from(callable.name())),
        _ => Ok(Value::Undefined),
    }
}

fn set_property(object: &Value, key: String, value: Value) -> Result<()> {
    match object {
        Value::Undefined | Value::Null => Err(Error::type_error(format!(
            "Cannot set properties of {} (setting '{}')",
            object, key
        ))),
        Value::Object(obj) => {
            obj.set(key, value);
            Ok(())
        }
        Value::Array(arr) => match key.parse::<usize>() {
            Ok(index) => arr.set(index, value),
            Err(_) => Err(Error::type_error(format!(
                "Cannot set property '{}' on an array",
                key
            ))),
        },
        // primitives silently drop writes
        _ => Ok(()),
    }
}

fn binary_op(operator: BinaryOperator, left: &Value, right: &Value) -> Value {
    match operator {
        BinaryOperator::Add => {
            let stringy = |v: &Value| !matches!(v, Value::Undefined | Value::Null | Value::Boolean(_) | Value::Number(_));
            if stringy(left) || stringy(right) {
                Value::String(format!("{}{}", left, right))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOperator::Subtract => Value::Number(left.to_number() - right.to_number()),
        BinaryOperator::Multiply => Value::Number(left.to_number() * right.to_number()),
        BinaryOperator::Divide => Value::Number(left.to_number() / right.to_number()),
        BinaryOperator::Equal => Value::Boolean(left.loose_eq(right)),
        BinaryOperator::NotEqual => Value::Boolean(!left.loose_eq(right)),
        BinaryOperator::StrictEqual => Value::Boolean(left == right),
        BinaryOperator::StrictNotEqual => Value::Boolean(left != right),
    }
}

/// Source-like rendering of a callee for error messages.
fn describe(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(name) => name.clone(),
        Expression::This => "this".to_string(),
        Expression::Member(member) => match &member.property {
            MemberProperty::Static(name) => format!("{}.{}", describe(&member.object), name),
            MemberProperty::Computed(_) => format!("{}[...]", describe(&member.object)),
        },
        Expression::Call(call) => format!("{}(...)", describe(&call.callee)),
        _ => "expression".to_string(),
    }
}
