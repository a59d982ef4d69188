use std::collections::HashMap;

use super::{Ty, TyKind};

/// Name → type table for the whole compile.
///
/// Seeded with the primitive types; the resolver installs every declared
/// type exactly once and nothing is removed afterwards.
pub struct TypeTable {
    map: HashMap<String, Ty>,
    void: Ty,
    int: Ty,
    float: Ty,
    char_ty: Ty,
}

impl TypeTable {
    pub fn seeded() -> TypeTable {
        let void = Ty::named("void", TyKind::Void);
        let int = Ty::named("int", TyKind::Int);
        let float = Ty::named("float", TyKind::Float);
        let char_ty = Ty::named("char", TyKind::Char);
        let mut map = HashMap::new();
        map.insert("void".to_string(), void.clone());
        map.insert("int".to_string(), int.clone());
        map.insert("float".to_string(), float.clone());
        map.insert("char".to_string(), char_ty.clone());
        TypeTable {
            map,
            void,
            int,
            float,
            char_ty,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Ty> {
        self.map.get(name).cloned()
    }

    /// Install a type under its declared name. Returns false when the name
    /// is already taken.
    pub fn insert(&mut self, name: String, ty: Ty) -> bool {
        if self.map.contains_key(&name) {
            return false;
        }
        self.map.insert(name, ty);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Ty)> {
        self.map.iter()
    }

    pub fn void(&self) -> Ty {
        self.void.clone()
    }

    pub fn int(&self) -> Ty {
        self.int.clone()
    }

    pub fn float(&self) -> Ty {
        self.float.clone()
    }

    pub fn char(&self) -> Ty {
        self.char_ty.clone()
    }
}
