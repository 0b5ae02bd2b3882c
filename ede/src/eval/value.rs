use std::fmt;

use itertools::Itertools;

use crate::types::{EdeType, Primitive};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Unit,
    Int(i64),
    Str(String),
    Char(char),
    Bool(bool),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
    Object(String, Vec<(String, Value)>),
}

impl Value {
    /// Zero value of a type.
    pub fn default_of(ty: &EdeType) -> Value {
        match ty {
            EdeType::Prim(p) => match p {
                Primitive::Unit => Value::Unit,
                Primitive::Int => Value::Int(0),
                Primitive::Str => Value::Str(String::new()),
                Primitive::Char => Value::Char('\0'),
                Primitive::Bool => Value::Bool(false),
            },
            EdeType::Array(_) => Value::Array(vec![]),
            EdeType::Tuple(elems) => Value::Tuple(elems.iter().map(Value::default_of).collect()),
            EdeType::Object(name, fields) => Value::Object(
                name.clone(),
                fields
                    .iter()
                    .map(|(n, t)| (n.clone(), Value::default_of(t)))
                    .collect(),
            ),
            EdeType::Func(..) => Value::Unit,
        }
    }

    /// Status a program ending in this value exits with on the VM.
    pub fn exit_code(&self) -> i64 {
        match self {
            Value::Int(v) => *v,
            Value::Bool(b) => *b as i64,
            Value::Char(c) => *c as i64,
            _ => 0,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Char(c) => write!(f, "{:?}", c),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Array(elems) => write!(f, "[{}]", elems.iter().join(", ")),
            Value::Tuple(elems) => write!(f, "({})", elems.iter().join(", ")),
            Value::Object(name, fields) => write!(
                f,
                "{}{{{}}}",
                name,
                fields
                    .iter()
                    .map(|(n, v)| format!("{} = {}", n, v))
                    .join(", ")
            ),
        }
    }
}
