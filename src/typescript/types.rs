//! The slice of the TypeScript type system the checker reasons about.
//!
//! Anything the checker cannot model becomes [`Ty::Any`], which is assignable
//! in both directions, so an unmodelled construct never produces a diagnostic.

use std::fmt;
use std::rc::Rc;

use crate::typescript::globals::{member, Member};

/// A checker type.
#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Any,
    Unknown,
    Number,
    String,
    Boolean,
    BigInt,
    Symbol,
    Null,
    Undefined,
    Void,
    Never,
    Object,
    Record(Rc<Shape>),
    Library(Library),
    Array(Box<Ty>),
    Union(Vec<Ty>),
    Function(Rc<Signature>),
}

/// Built-in namespace objects with a fixed set of members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Library {
    Math,
    Json,
    Console,
}

/// A named member of an object type.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub ty: Ty,
    pub optional: bool,
}

impl Property {
    /// Type seen when the property is read.
    pub fn read_type(&self) -> Ty {
        if self.optional {
            Ty::union([self.ty.clone(), Ty::Undefined])
        } else {
            self.ty.clone()
        }
    }
}

/// A structural object type: a type literal, an interface, or the type of an
/// object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Interface or alias name, shown instead of the members.
    pub name: Option<String>,
    pub properties: Vec<Property>,
}

impl Shape {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Required properties of `self` that `source` does not have.
    pub fn missing_from(&self, source: &Shape) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|p| !p.optional && source.property(&p.name).is_none())
            .map(|p| p.name.as_str())
            .collect()
    }

    /// First property both shapes declare whose types do not fit.
    pub fn incompatible_with<'s>(&'s self, source: &'s Shape, strict: bool) -> Option<(&'s Ty, &'s Property)> {
        self.properties.iter().find_map(|target| {
            let found = source.property(&target.name)?;
            (!found.ty.is_assignable_to(&target.read_type(), strict)).then_some((&found.ty, target))
        })
    }
}

/// One parameter of a local function signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Ty,
    pub optional: bool,
}

/// Signature of a function declared in the checked file.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<Param>,
    pub rest: Option<Ty>,
    pub ret: Ty,
}

impl Signature {
    /// Number of arguments a call must supply.
    pub fn required(&self) -> usize {
        self.params.iter().take_while(|p| !p.optional).count()
    }

    /// Arity rendered the way tsc words it in TS2554.
    pub fn expected_arity(&self) -> String {
        let required = self.required();
        if self.rest.is_some() {
            format!("at least {}", required)
        } else if required == self.params.len() {
            required.to_string()
        } else {
            format!("{}-{}", required, self.params.len())
        }
    }

    /// Check if `count` arguments satisfy this signature.
    pub fn accepts_arity(&self, count: usize) -> bool {
        count >= self.required() && (self.rest.is_some() || count <= self.params.len())
    }
}

impl Ty {
    /// Build a union, flattening nested unions and dropping duplicates.
    pub fn union(members: impl IntoIterator<Item = Ty>) -> Ty {
        let mut flat: Vec<Ty> = Vec::new();
        for member in members {
            let parts = match member {
                Ty::Union(inner) => inner,
                other => vec![other],
            };
            for part in parts {
                if !flat.contains(&part) {
                    flat.push(part);
                }
            }
        }
        if flat.contains(&Ty::Any) {
            return Ty::Any;
        }
        match flat.len() {
            0 => Ty::Never,
            1 => flat.remove(0),
            _ => Ty::Union(flat),
        }
    }

    /// Check if the type is `any` or `unknown` (accepts every value).
    pub fn is_top(&self) -> bool {
        matches!(self, Ty::Any | Ty::Unknown)
    }

    /// Check if arithmetic on a value of this type is allowed.
    ///
    /// Only types that are known to be non-numeric answer `false`.
    pub fn is_arithmetic_operand(&self) -> bool {
        match self {
            Ty::String
            | Ty::Boolean
            | Ty::Object
            | Ty::Record(_)
            | Ty::Library(_)
            | Ty::Array(_)
            | Ty::Function(_) => false,
            Ty::Union(members) => members.iter().all(Ty::is_arithmetic_operand),
            _ => true,
        }
    }

    /// Check if a value of type `self` can be assigned to `target`.
    pub fn is_assignable_to(&self, target: &Ty, strict: bool) -> bool {
        if target.is_top() || matches!(self, Ty::Any | Ty::Never) {
            return true;
        }
        if let Ty::Union(members) = self {
            return members.iter().all(|m| m.is_assignable_to(target, strict));
        }
        if let Ty::Union(members) = target {
            return members.iter().any(|m| self.is_assignable_to(m, strict));
        }

        match (self, target) {
            (Ty::Null | Ty::Undefined, _) if !strict => true,
            (Ty::Undefined, Ty::Void) => true,
            (Ty::Array(source), Ty::Array(target)) => source.is_assignable_to(target, strict),
            (Ty::Object | Ty::Record(_) | Ty::Library(_) | Ty::Array(_) | Ty::Function(_), Ty::Object) => {
                true
            }
            (Ty::Record(source), Ty::Record(target)) => {
                target.missing_from(source).is_empty()
                    && target.incompatible_with(source, strict).is_none()
            }
            (Ty::Array(_) | Ty::Function(_) | Ty::Library(_), Ty::Record(_)) => true,
            (Ty::Object, Ty::Record(target)) => target.properties.iter().all(|p| p.optional),
            (
                Ty::String | Ty::Number | Ty::Boolean | Ty::BigInt | Ty::Symbol,
                Ty::Record(target),
            ) => target.properties.iter().all(|p| match member(self, &p.name) {
                Member::Known(ty) => ty.is_assignable_to(&p.read_type(), strict),
                Member::Missing => p.optional,
                Member::Unknown => true,
            }),
            (Ty::Function(_), Ty::Function(_)) => true,
            (source, target) => source == target,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Any => f.write_str("any"),
            Ty::Unknown => f.write_str("unknown"),
            Ty::Number => f.write_str("number"),
            Ty::String => f.write_str("string"),
            Ty::Boolean => f.write_str("boolean"),
            Ty::BigInt => f.write_str("bigint"),
            Ty::Symbol => f.write_str("symbol"),
            Ty::Null => f.write_str("null"),
            Ty::Undefined => f.write_str("undefined"),
            Ty::Void => f.write_str("void"),
            Ty::Never => f.write_str("never"),
            Ty::Object => f.write_str("object"),
            Ty::Record(shape) => match &shape.name {
                Some(name) => f.write_str(name),
                None if shape.properties.is_empty() => f.write_str("{}"),
                None => {
                    f.write_str("{ ")?;
                    for property in &shape.properties {
                        let mark = if property.optional { "?" } else { "" };
                        write!(f, "{}{}: {}; ", property.name, mark, property.ty)?;
                    }
                    f.write_str("}")
                }
            },
            Ty::Library(Library::Math) => f.write_str("Math"),
            Ty::Library(Library::Json) => f.write_str("JSON"),
            Ty::Library(Library::Console) => f.write_str("Console"),
            Ty::Array(element) => match element.as_ref() {
                Ty::Union(_) | Ty::Function(_) => write!(f, "({})[]", element),
                _ => write!(f, "{}[]", element),
            },
            Ty::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
            Ty::Function(signature) => {
                f.write_str("(")?;
                for (i, param) in signature.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    let mark = if param.optional { "?" } else { "" };
                    write!(f, "{}{}: {}", param.name, mark, param.ty)?;
                }
                if let Some(rest) = &signature.rest {
                    if !signature.params.is_empty() {
                        f.write_str(", ")?;
                    }
                    write!(f, "...args: {}", rest)?;
                }
                write!(f, ") => {}", signature.ret)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_assignability() {
        assert!(Ty::Number.is_assignable_to(&Ty::Number, true));
        assert!(!Ty::String.is_assignable_to(&Ty::Number, true));
        assert!(Ty::String.is_assignable_to(&Ty::Any, true));
        assert!(Ty::Any.is_assignable_to(&Ty::Boolean, true));
    }

    #[test]
    fn test_strict_null_checks() {
        assert!(!Ty::Null.is_assignable_to(&Ty::Number, true));
        assert!(Ty::Null.is_assignable_to(&Ty::Number, false));
        assert!(Ty::Undefined.is_assignable_to(&Ty::Void, true));
    }

    #[test]
    fn test_union_assignability() {
        let maybe = Ty::union([Ty::Number, Ty::Null]);
        assert!(Ty::Null.is_assignable_to(&maybe, true));
        assert!(!maybe.is_assignable_to(&Ty::Number, true));
        assert!(!Ty::String.is_assignable_to(&maybe, true));
    }

    #[test]
    fn test_array_assignability() {
        let numbers = Ty::Array(Box::new(Ty::Number));
        let strings = Ty::Array(Box::new(Ty::String));
        assert!(!strings.is_assignable_to(&numbers, true));
        assert!(numbers.is_assignable_to(&Ty::Object, true));
    }

    fn point(name: Option<&str>, y: Ty, optional: bool) -> Ty {
        Ty::Record(Rc::new(Shape {
            name: name.map(str::to_string),
            properties: vec![
                Property {
                    name: "x".into(),
                    ty: Ty::Number,
                    optional: false,
                },
                Property {
                    name: "y".into(),
                    ty: y,
                    optional,
                },
            ],
        }))
    }

    #[test]
    fn test_record_assignability() {
        let target = point(Some("Point"), Ty::Number, false);
        assert!(point(None, Ty::Number, false).is_assignable_to(&target, true));
        assert!(!point(None, Ty::String, false).is_assignable_to(&target, true));

        let only_x = Ty::Record(Rc::new(Shape {
            name: None,
            properties: vec![Property {
                name: "x".into(),
                ty: Ty::Number,
                optional: false,
            }],
        }));
        assert!(!only_x.is_assignable_to(&target, true));
        assert!(only_x.is_assignable_to(&point(None, Ty::Number, true), true));
        assert!(only_x.is_assignable_to(&Ty::Object, true));
    }

    #[test]
    fn test_primitive_against_record() {
        let with_length = Ty::Record(Rc::new(Shape {
            name: None,
            properties: vec![Property {
                name: "length".into(),
                ty: Ty::Number,
                optional: false,
            }],
        }));
        assert!(Ty::String.is_assignable_to(&with_length, true));
        assert!(!Ty::Boolean.is_assignable_to(&with_length, true));
    }

    #[test]
    fn test_record_display() {
        assert_eq!(point(None, Ty::String, true).to_string(), "{ x: number; y?: string; }");
        assert_eq!(point(Some("Point"), Ty::Number, false).to_string(), "Point");
        assert_eq!(Ty::Library(Library::Math).to_string(), "Math");
    }

    #[test]
    fn test_union_collapses() {
        assert_eq!(Ty::union([Ty::Number, Ty::Number]), Ty::Number);
        assert_eq!(Ty::union([Ty::Number, Ty::Any]), Ty::Any);
        assert_eq!(Ty::union([]), Ty::Never);
    }

    #[test]
    fn test_display() {
        let mixed = Ty::Array(Box::new(Ty::union([Ty::String, Ty::Number])));
        assert_eq!(mixed.to_string(), "(string | number)[]");

        let signature = Signature {
            params: vec![
                Param {
                    name: "a".into(),
                    ty: Ty::Number,
                    optional: false,
                },
                Param {
                    name: "b".into(),
                    ty: Ty::String,
                    optional: true,
                },
            ],
            rest: None,
            ret: Ty::Void,
        };
        assert_eq!(signature.expected_arity(), "1-2");
        assert!(signature.accepts_arity(1));
        assert!(!signature.accepts_arity(3));
        assert_eq!(
            Ty::Function(Rc::new(signature)).to_string(),
            "(a: number, b?: string) => void"
        );
    }
}
