use std::fmt;

use itertools::Itertools;
use strum::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Primitive {
    Unit,
    Int,
    #[strum(serialize = "string")]
    Str,
    Char,
    Bool,
}

/// Resolved, structural type.
#[derive(Debug, Clone)]
pub enum EdeType {
    Prim(Primitive),
    Array(Box<EdeType>),
    Tuple(Vec<EdeType>),
    /// Named object, or an anonymous record when the name is empty. Two objects
    /// are equal only if both the name and the fields match.
    Object(String, Vec<(String, EdeType)>),
    Func(Vec<(String, EdeType)>, Box<EdeType>),
}

impl EdeType {
    pub const UNIT: EdeType = EdeType::Prim(Primitive::Unit);
    pub const INT: EdeType = EdeType::Prim(Primitive::Int);
    pub const STRING: EdeType = EdeType::Prim(Primitive::Str);
    pub const CHAR: EdeType = EdeType::Prim(Primitive::Char);
    pub const BOOL: EdeType = EdeType::Prim(Primitive::Bool);

    /// Fits in a single word and can serve as an exit status.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            EdeType::Prim(Primitive::Int | Primitive::Bool | Primitive::Char)
        )
    }

    pub fn field(&self, name: &str) -> Option<&EdeType> {
        match self {
            EdeType::Object(_, fields) => fields.iter().find(|(n, _)| n == name).map(|(_, t)| t),
            _ => None,
        }
    }
}

impl PartialEq for EdeType {
    fn eq(&self, other: &Self) -> bool {
        use EdeType::*;
        match (self, other) {
            (Prim(a), Prim(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Tuple(a), Tuple(b)) => a == b,
            (Object(na, a), Object(nb, b)) => na == nb && a == b,
            (Func(pa, ra), Func(pb, rb)) => {
                ra == rb
                    && pa.len() == pb.len()
                    && pa.iter().zip(pb).all(|((_, a), (_, b))| a == b)
            }
            _ => false,
        }
    }
}

impl Eq for EdeType {}

impl fmt::Display for EdeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = |items: &[(String, EdeType)]| {
            items
                .iter()
                .map(|(n, t)| format!("{}: {}", n, t))
                .join(", ")
        };
        match self {
            EdeType::Prim(p) => write!(f, "{}", p),
            EdeType::Array(inner) => write!(f, "[{}]", inner),
            EdeType::Tuple(inner) => write!(f, "({})", inner.iter().join(", ")),
            EdeType::Object(name, _) if !name.is_empty() => write!(f, "{}", name),
            EdeType::Object(_, fields) => write!(f, "{{{}}}", items(fields)),
            EdeType::Func(params, ret) => write!(f, "func({}): {}", items(params), ret),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(name: &str) -> EdeType {
        EdeType::Object(
            name.to_string(),
            vec![("x".to_string(), EdeType::INT), ("y".to_string(), EdeType::INT)],
        )
    }

    #[test]
    fn structural_equality() {
        assert_eq!(point("Point"), point("Point"));
        assert_eq!(point(""), point(""));
        assert_ne!(point("Point"), point(""));
        assert_ne!(point("Point"), point("Vec2"));
        assert_ne!(
            point("Point"),
            EdeType::Object("Point".to_string(), vec![("x".to_string(), EdeType::INT)])
        );
        assert_eq!(
            EdeType::Array(Box::new(EdeType::CHAR)),
            EdeType::Array(Box::new(EdeType::CHAR))
        );
        assert_ne!(EdeType::Tuple(vec![EdeType::INT, EdeType::BOOL]), EdeType::Tuple(vec![EdeType::BOOL, EdeType::INT]));
        assert_ne!(EdeType::STRING, EdeType::Array(Box::new(EdeType::CHAR)));
    }

    #[test]
    fn names() {
        assert_eq!("string".parse::<Primitive>(), Ok(Primitive::Str));
        assert_eq!(EdeType::UNIT.to_string(), "unit");
        assert_eq!(point("").to_string(), "{x: int, y: int}");
        assert_eq!(point("Point").to_string(), "Point");
        assert_eq!(
            EdeType::Tuple(vec![EdeType::INT, EdeType::Array(Box::new(EdeType::STRING))]).to_string(),
            "(int, [string])"
        );
    }
}
