// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # bramble-script
//!
//! The script engine behind the bramble module loader.
//!
//! ## Overview
//!
//! This crate executes the CommonJS subset that module bodies are written in:
//! - Lexer and parser producing a serializable AST
//! - A tree-walking interpreter with shared object handles
//! - Module wrapping (`exports`, `require`, `module`, `__filename`, `__dirname`)
//! - Snapshot artifacts: pre-parsed module bodies stored on disk
//!
//! ## Quick Start
//!
//! ```rust
//! use bramble_script::{Engine, Value};
//!
//! let engine = Engine::new();
//! let result = engine.eval("1 + 2").unwrap();
//! assert_eq!(result, Value::Number(3.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod snapshot;
pub mod vm;

use std::sync::Arc;

pub use error::{Error, HostError, Result};
pub use runtime::object::{ArrayRef, ObjectRef};
pub use runtime::value::Value;
pub use runtime::function::Callable;
pub use vm::Host;

use ast::Program;
use parser::Parser;
use snapshot::Artifact;
use vm::Interpreter;

/// Parameter names of the module wrapper, in binding order.
pub const WRAPPER_PARAMS: [&str; 5] = ["exports", "require", "module", "__filename", "__dirname"];

/// The engine instance.
///
/// Holds the global object shared by every unit it compiles. Compilation
/// and invocation are separate steps so the loader can register a module
/// before its body runs.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    globals: ObjectRef,
}

impl Engine {
    /// Creates an engine with an empty global object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine around an existing global object.
    pub fn with_globals(globals: ObjectRef) -> Self {
        Self { globals }
    }

    /// The global object.
    pub fn globals(&self) -> &ObjectRef {
        &self.globals
    }

    /// Compiles module source into a unit taking the wrapper parameters.
    pub fn compile(&self, source: &str, filename: &str) -> Result<CompiledUnit> {
        let program = Parser::new(source).parse_program()?;
        Ok(self.unit(
            filename,
            WRAPPER_PARAMS.iter().map(|p| p.to_string()).collect(),
            program,
        ))
    }

    /// Turns snapshot bytes into a unit.
    ///
    /// Fails with [`Error::InvalidSnapshot`] when the bytes are not a
    /// snapshot or the artifact is not callable.
    pub fn compile_snapshot(&self, bytes: &[u8], filename: &str) -> Result<CompiledUnit> {
        match snapshot::decode(bytes)? {
            Artifact::Function { params, program } => Ok(self.unit(filename, params, program)),
            Artifact::Value { .. } => Err(Error::InvalidSnapshot(format!(
                "{} does not contain a function",
                filename
            ))),
        }
    }

    /// Parses module source and encodes it as a snapshot artifact.
    pub fn make_snapshot(&self, source: &str) -> Result<Vec<u8>> {
        let program = Parser::new(source).parse_program()?;
        snapshot::encode(&Artifact::Function {
            params: WRAPPER_PARAMS.iter().map(|p| p.to_string()).collect(),
            program,
        })
    }

    /// Evaluates a standalone script with no module bindings and no `require`.
    pub fn eval(&self, source: &str) -> Result<Value> {
        let program = Parser::new(source).parse_program()?;
        Interpreter::new(self.globals.clone(), Value::Undefined, None).run(&program)
    }

    /// Calls a function value outside any module body, e.g. a deferred
    /// callback. A `require` reference called this way goes to `host`.
    pub fn call(&self, callee: &Value, args: &[Value], host: &mut dyn Host) -> Result<Value> {
        Interpreter::new(self.globals.clone(), Value::Undefined, Some(host)).call(callee, args)
    }

    fn unit(&self, filename: &str, params: Vec<String>, program: Program) -> CompiledUnit {
        CompiledUnit {
            filename: filename.to_string(),
            params,
            program: Arc::new(program),
            globals: self.globals.clone(),
        }
    }
}

/// Values bound to the wrapper parameters when a unit runs.
#[derive(Debug, Clone)]
pub struct ModuleBindings {
    /// The initial `exports` object (also `this`)
    pub exports: Value,
    /// The `module` object
    pub module: Value,
    /// `__filename`
    pub filename: String,
    /// `__dirname`
    pub dirname: String,
}

/// A compiled module body, ready to invoke.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    filename: String,
    params: Vec<String>,
    program: Arc<Program>,
    globals: ObjectRef,
}

impl CompiledUnit {
    /// The filename the unit was compiled for.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Parameter names, bound positionally.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Runs the body. The `require` binding is owned by `bindings.filename`;
    /// calls to it go to `host`.
    pub fn invoke(&self, bindings: ModuleBindings, host: &mut dyn Host) -> Result<Value> {
        let arguments = [
            bindings.exports.clone(),
            Callable::require(bindings.filename.clone()),
            bindings.module,
            Value::String(bindings.filename),
            Value::String(bindings.dirname),
        ];

        let mut interpreter = Interpreter::new(self.globals.clone(), bindings.exports, Some(host));
        let env = interpreter.environment_mut();
        for (i, param) in self.params.iter().enumerate() {
            env.bind_parameter(param.clone(), arguments.get(i).cloned().unwrap_or_default());
        }
        interpreter.run(&self.program)
    }
}
