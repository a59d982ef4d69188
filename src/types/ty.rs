use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::ast::Element;

/// Round `n` up to the next multiple of the 4-byte target word. Frame
/// slots and struct field positions advance by this, raw sizes do not.
pub fn word_bytes(n: i32) -> i32 {
    (n + 3) / 4 * 4
}

/// A named slot with a byte offset. Used both for struct fields (offset
/// from the struct base) and for frame variables (offset from SP).
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: Ty,
    pub position: i32,
}

#[derive(Debug, Clone)]
pub enum TyKind {
    Void,
    Int,
    Float,
    Char,
    Ptr(Ty),
    Array { item: Ty, count: i32 },
    Struct { fields: Vec<Field> },
    /// Placeholder for a pointer target that was not known when the
    /// pointer was constructed. Carries the raw type expression so the
    /// resolver can complete the graph once every declaration is in the
    /// table.
    UnresolvedPtr(Element),
}

#[derive(Debug)]
pub struct TyData {
    pub name: Option<String>,
    pub kind: TyKind,
}

/// Shared handle to a type.
///
/// Cloning the handle aliases the same type; [`Ty::deep_clone`] copies the
/// definition. A pointer target is rewritten through the handle exactly
/// once, by the resolver, and every alias observes the rewrite.
#[derive(Debug, Clone)]
pub struct Ty(Rc<RefCell<TyData>>);

impl Ty {
    pub fn new(kind: TyKind) -> Ty {
        Ty(Rc::new(RefCell::new(TyData { name: None, kind })))
    }

    pub fn named(name: &str, kind: TyKind) -> Ty {
        Ty(Rc::new(RefCell::new(TyData {
            name: Some(name.to_string()),
            kind,
        })))
    }

    pub fn data(&self) -> Ref<'_, TyData> {
        self.0.borrow()
    }

    pub fn name(&self) -> Option<String> {
        self.0.borrow().name.clone()
    }

    pub fn set_name(&self, name: &str) {
        self.0.borrow_mut().name = Some(name.to_string());
    }

    /// Stable address of the shared cell, for identity sets.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn is_int(&self) -> bool {
        matches!(self.data().kind, TyKind::Int)
    }

    pub fn is_char(&self) -> bool {
        matches!(self.data().kind, TyKind::Char)
    }

    pub fn is_void(&self) -> bool {
        matches!(self.data().kind, TyKind::Void)
    }

    pub fn is_ptr(&self) -> bool {
        matches!(self.data().kind, TyKind::Ptr(_))
    }

    /// The type expression saved in an unresolved pointer target.
    pub fn unresolved_expr(&self) -> Option<Element> {
        match &self.data().kind {
            TyKind::UnresolvedPtr(expr) => Some(expr.clone()),
            _ => None,
        }
    }

    /// The target of a pointer type.
    pub fn ptr_value(&self) -> Option<Ty> {
        match &self.data().kind {
            TyKind::Ptr(target) => Some(target.clone()),
            _ => None,
        }
    }

    /// Rewrite the pointer target in place. Every alias of this handle
    /// observes the new target.
    pub fn set_ptr_target(&self, target: Ty) {
        self.0.borrow_mut().kind = TyKind::Ptr(target);
    }

    /// Byte size of a value of this type. Pointers are one word no matter
    /// what they target, so recursion through them terminates.
    pub fn size(&self) -> i32 {
        match &self.data().kind {
            TyKind::Void => 0,
            TyKind::Int | TyKind::Float => 4,
            TyKind::Char => 1,
            TyKind::Ptr(_) => 4,
            TyKind::Array { item, count } => item.size() * count,
            TyKind::Struct { fields } => fields.iter().map(|f| f.ty.size()).sum(),
            TyKind::UnresolvedPtr(_) => 0,
        }
    }

    /// Type equivalence: handle identity, then shared non-empty name, then
    /// same variant with pairwise-equal contents. Struct field names and
    /// positions do not participate; an unresolved placeholder never
    /// compares equal. Recursive types always cut over to the name rule
    /// before the structural walk can loop.
    pub fn equals(&self, other: &Ty) -> bool {
        if Rc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        {
            let (a, b) = (self.data(), other.data());
            if let (Some(na), Some(nb)) = (&a.name, &b.name) {
                if !na.is_empty() && na == nb {
                    return true;
                }
            }
        }
        let a = self.data();
        let b = other.data();
        match (&a.kind, &b.kind) {
            (TyKind::Void, TyKind::Void)
            | (TyKind::Int, TyKind::Int)
            | (TyKind::Float, TyKind::Float)
            | (TyKind::Char, TyKind::Char) => true,
            (TyKind::Ptr(x), TyKind::Ptr(y)) => x.equals(y),
            (
                TyKind::Array { item: x, count: n },
                TyKind::Array { item: y, count: m },
            ) => n == m && x.equals(y),
            (TyKind::Struct { fields: x }, TyKind::Struct { fields: y }) => {
                x.len() == y.len()
                    && x.iter().zip(y.iter()).all(|(fx, fy)| fx.ty.equals(&fy.ty))
            }
            _ => false,
        }
    }

    /// Copy the definition into a fresh cell so two declarations with
    /// identical bodies never alias. Only called while pointer targets are
    /// still placeholders, so the walk cannot loop.
    pub fn deep_clone(&self) -> Ty {
        let data = self.data();
        let kind = match &data.kind {
            TyKind::Void => TyKind::Void,
            TyKind::Int => TyKind::Int,
            TyKind::Float => TyKind::Float,
            TyKind::Char => TyKind::Char,
            TyKind::Ptr(target) => TyKind::Ptr(target.deep_clone()),
            TyKind::Array { item, count } => TyKind::Array {
                item: item.deep_clone(),
                count: *count,
            },
            TyKind::Struct { fields } => TyKind::Struct {
                fields: fields
                    .iter()
                    .map(|f| Field {
                        name: f.name.clone(),
                        ty: f.ty.deep_clone(),
                        position: f.position,
                    })
                    .collect(),
            },
            TyKind::UnresolvedPtr(expr) => TyKind::UnresolvedPtr(expr.clone()),
        };
        Ty(Rc::new(RefCell::new(TyData {
            name: data.name.clone(),
            kind,
        })))
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data();
        if let Some(name) = &data.name {
            if !name.is_empty() {
                return write!(f, "{name}");
            }
        }
        match &data.kind {
            TyKind::Void => write!(f, "void"),
            TyKind::Int => write!(f, "int"),
            TyKind::Float => write!(f, "float"),
            TyKind::Char => write!(f, "char"),
            TyKind::Ptr(target) => write!(f, "ptr {target}"),
            TyKind::Array { item, count } => write!(f, "array {item} {count}"),
            TyKind::Struct { fields } => write!(f, "struct({} fields)", fields.len()),
            TyKind::UnresolvedPtr(_) => write!(f, "ptr ?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn word_bytes_rounds_up() {
        assert_eq!(word_bytes(0), 0);
        assert_eq!(word_bytes(1), 4);
        assert_eq!(word_bytes(4), 4);
        assert_eq!(word_bytes(5), 8);
        assert_eq!(word_bytes(9), 12);
    }

    #[test]
    fn sizes() {
        let int = Ty::new(TyKind::Int);
        let ch = Ty::new(TyKind::Char);
        assert_eq!(int.size(), 4);
        assert_eq!(ch.size(), 1);
        assert_eq!(Ty::new(TyKind::Ptr(ch.clone())).size(), 4);
        let arr = Ty::new(TyKind::Array {
            item: ch.clone(),
            count: 6,
        });
        assert_eq!(arr.size(), 6);
        // struct size is the raw sum of field sizes, positions are padded
        let st = Ty::new(TyKind::Struct {
            fields: vec![
                Field {
                    name: "a".into(),
                    ty: ch,
                    position: 0,
                },
                Field {
                    name: "b".into(),
                    ty: int,
                    position: 4,
                },
            ],
        });
        assert_eq!(st.size(), 5);
    }

    #[test]
    fn equality_by_name_and_structure() {
        let a = Ty::named("Node", TyKind::Int);
        let b = Ty::named("Node", TyKind::Char);
        assert!(a.equals(&b)); // same non-empty name wins

        let x = Ty::new(TyKind::Ptr(Ty::new(TyKind::Int)));
        let y = Ty::new(TyKind::Ptr(Ty::new(TyKind::Int)));
        assert!(x.equals(&y));

        let z = Ty::new(TyKind::Ptr(Ty::new(TyKind::Char)));
        assert!(!x.equals(&z));
    }

    #[test]
    fn unresolved_never_equal() {
        let expr = crate::ast::Element::Word("T".into());
        let a = Ty::new(TyKind::UnresolvedPtr(expr.clone()));
        let b = Ty::new(TyKind::UnresolvedPtr(expr));
        assert!(!a.equals(&b));
    }

    #[test]
    fn deep_clone_does_not_alias() {
        let a = Ty::named("int", TyKind::Int);
        let b = a.deep_clone();
        b.set_name("MyInt");
        assert_eq!(a.name().as_deref(), Some("int"));
        assert!(a.equals(&b)); // still structurally equal
    }
}
