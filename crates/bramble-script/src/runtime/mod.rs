//! Runtime types: values, objects, callables and scopes.

pub mod environment;
pub mod function;
pub mod object;
pub mod value;

pub use environment::Environment;
pub use function::{Callable, NativeFunction};
pub use object::{ArrayRef, ObjectRef};
