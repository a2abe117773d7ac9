pub mod printer;
pub mod template;
pub mod value;

pub use printer::print;
pub use template::{Lookup, Record, resolve};
pub use value::{Callable, ErrorObject, ObjectKind, ObjectRef, Value};
