//! Builtin runtime functions
//!
//! The only builtin is `printf`. It is variadic, so analysis skips the usual
//! arity and type checks, and lowering passes a format string built from the
//! argument types in front of the arguments.

use crate::ir::ExternFunction;
use crate::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFunction {
    Print,
}

impl BuiltinFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "printf" => Some(Self::Print),
            _ => None,
        }
    }

    /// Name of the symbol in the link environment
    pub fn symbol(self) -> &'static str {
        match self {
            BuiltinFunction::Print => "printf",
        }
    }

    pub fn return_type(self) -> Type {
        match self {
            BuiltinFunction::Print => Type::Int,
        }
    }

    pub fn prototype(self) -> ExternFunction {
        ExternFunction {
            name: String::from(self.symbol()),
            params: Vec::new(),
            variadic: true,
            return_type: self.return_type(),
        }
    }
}

/// printf format string for arguments of the given types
///
/// `int` prints as `%lld`, `float` as `%f` and `bool` as `%d`, separated by
/// spaces and terminated by a newline.
pub fn format_string(types: &[Type]) -> String {
    let mut format = types
        .iter()
        .map(|typ| match typ {
            Type::Int => "%lld",
            Type::Float => "%f",
            Type::Bool => "%d",
            Type::Void => "",
        })
        .collect::<Vec<_>>()
        .join(" ");
    format.push('\n');
    format
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        assert_eq!(BuiltinFunction::from_name("printf"), Some(BuiltinFunction::Print));
        assert_eq!(BuiltinFunction::from_name("print"), None);
    }

    #[test]
    fn formats() {
        assert_eq!(format_string(&[]), "\n");
        assert_eq!(
            format_string(&[Type::Int, Type::Float, Type::Bool]),
            "%lld %f %d\n"
        );
    }
}
