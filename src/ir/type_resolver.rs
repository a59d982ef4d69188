use std::collections::HashSet;

use crate::ast::Element;
use crate::types::{word_bytes, Field, Ty, TyKind, TypeTable};

use super::types::{ResolveError, ResolveResult};

/// Builds the name→type table from the type-declaration section.
///
/// A declaration may mention a pointer target that is not defined yet, so
/// construction runs as a fixpoint: pointers keep an unresolved
/// placeholder carrying the target expression, and a second pass rewrites
/// every placeholder once the table is complete. The rewrite is the only
/// mutation a type sees after construction.
pub struct TypeResolver {
    pub types: TypeTable,
}

impl TypeResolver {
    pub fn new() -> TypeResolver {
        TypeResolver {
            types: TypeTable::seeded(),
        }
    }

    /// Run the declaration fixpoint, then resolve dangling pointer targets.
    ///
    /// Each pass walks the declarations that have not been installed yet;
    /// a pass that installs nothing while failures remain aborts.
    pub fn resolve_declarations(&mut self, section: &Element) -> ResolveResult<()> {
        let decls = section.as_list().ok_or_else(|| {
            ResolveError::MalformedDeclaration("type declaration section must be a list".into())
        })?;

        let mut pending: Vec<(&str, &Element)> = Vec::with_capacity(decls.len());
        for decl in decls {
            let items = decl.as_list().ok_or_else(|| {
                ResolveError::MalformedDeclaration(format!(
                    "type declaration must be a [name type] list, found {decl}"
                ))
            })?;
            match items {
                [name, expr] => {
                    let name = name.as_word().ok_or_else(|| {
                        ResolveError::MalformedDeclaration(format!(
                            "type name must be a word, found {name}"
                        ))
                    })?;
                    pending.push((name, expr));
                }
                _ => {
                    return Err(ResolveError::MalformedDeclaration(format!(
                        "type declaration must be a [name type] list, found {decl}"
                    )))
                }
            }
        }

        while !pending.is_empty() {
            let before = pending.len();
            let mut failed = Vec::new();
            for (name, expr) in pending {
                match self.construct_type(expr, false, false)? {
                    Some(ty) => {
                        ty.set_name(name);
                        if self.types.contains(name) {
                            return Err(ResolveError::DuplicateType(name.to_string()));
                        }
                        self.types.insert(name.to_string(), ty);
                    }
                    None => failed.push((name, expr)),
                }
            }
            if failed.len() == before {
                return Err(ResolveError::TooManyFailures(failed.len()));
            }
            pending = failed;
        }

        self.resolve_ptr_types()
    }

    /// Construct a type in immediate mode: every name must already be in
    /// the table, and the stored types are returned without cloning.
    pub fn construct(&self, expr: &Element) -> ResolveResult<Ty> {
        self.construct_type(expr, true, true)?
            .ok_or_else(|| ResolveError::UnknownType(expr.to_string()))
    }

    /// Build a type from its expression.
    ///
    /// `resolve_immediately` turns a missing name into a hard error and
    /// makes pointers recurse into their target; otherwise a missing name
    /// is reported as `None` (the fixpoint retries it) and pointer targets
    /// are left as placeholders. `no_clones` returns stored types as-is
    /// instead of deep-cloning them.
    fn construct_type(
        &self,
        expr: &Element,
        resolve_immediately: bool,
        no_clones: bool,
    ) -> ResolveResult<Option<Ty>> {
        if let Some(word) = expr.as_word() {
            return self.lookup(word, resolve_immediately, no_clones);
        }
        let items = expr.as_list().ok_or_else(|| {
            ResolveError::MalformedDeclaration(format!("malformed type expression {expr}"))
        })?;
        let head = items.first().and_then(Element::as_word).ok_or_else(|| {
            ResolveError::MalformedDeclaration(format!(
                "type expression must start with a word, found {expr}"
            ))
        })?;

        if self.types.contains(head) {
            return self.lookup(head, resolve_immediately, no_clones);
        }

        match head {
            "ptr" => {
                let target_expr = items.get(1).ok_or_else(|| {
                    ResolveError::MalformedDeclaration("ptr needs a target type".into())
                })?;
                if resolve_immediately {
                    let target = self
                        .construct_type(target_expr, true, no_clones)?
                        .ok_or_else(|| ResolveError::UnknownType(target_expr.to_string()))?;
                    Ok(Some(Ty::new(TyKind::Ptr(target))))
                } else {
                    let placeholder = Ty::new(TyKind::UnresolvedPtr(target_expr.clone()));
                    Ok(Some(Ty::new(TyKind::Ptr(placeholder))))
                }
            }
            "array" => {
                let item_expr = items.get(1).ok_or_else(|| {
                    ResolveError::MalformedDeclaration("array needs an item type".into())
                })?;
                let count = items.get(2).and_then(Element::as_int).ok_or_else(|| {
                    ResolveError::MalformedDeclaration("array needs an integer count".into())
                })?;
                match self.construct_type(item_expr, resolve_immediately, no_clones)? {
                    Some(item) => Ok(Some(Ty::new(TyKind::Array { item, count }))),
                    None => Ok(None),
                }
            }
            "struct" => {
                let field_list = items.get(1).and_then(Element::as_list).ok_or_else(|| {
                    ResolveError::MalformedDeclaration("struct needs a field list".into())
                })?;
                let mut fields = Vec::with_capacity(field_list.len());
                let mut position = 0;
                for field in field_list {
                    let parts = field.as_list().ok_or_else(|| {
                        ResolveError::MalformedDeclaration(format!(
                            "struct field must be a [type name] list, found {field}"
                        ))
                    })?;
                    let (ty_expr, name) = match parts {
                        [ty_expr, name] => (ty_expr, name),
                        _ => {
                            return Err(ResolveError::MalformedDeclaration(format!(
                                "struct field must be a [type name] list, found {field}"
                            )))
                        }
                    };
                    let ty = match self.construct_type(ty_expr, resolve_immediately, no_clones)? {
                        Some(ty) => ty,
                        None => return Ok(None),
                    };
                    let name = name.as_word().ok_or_else(|| {
                        ResolveError::MalformedDeclaration(format!(
                            "field name must be a word, found {name}"
                        ))
                    })?;
                    let size = ty.size();
                    fields.push(Field {
                        name: name.to_string(),
                        ty,
                        position,
                    });
                    position += word_bytes(size);
                }
                Ok(Some(Ty::new(TyKind::Struct { fields })))
            }
            _ => {
                if resolve_immediately {
                    Err(ResolveError::UnknownType(head.to_string()))
                } else {
                    Ok(None)
                }
            }
        }
    }

    fn lookup(
        &self,
        name: &str,
        resolve_immediately: bool,
        no_clones: bool,
    ) -> ResolveResult<Option<Ty>> {
        match self.types.get(name) {
            Some(ty) if no_clones => Ok(Some(ty)),
            Some(ty) => Ok(Some(ty.deep_clone())),
            None if resolve_immediately => Err(ResolveError::UnknownType(name.to_string())),
            None => Ok(None),
        }
    }

    /// Walk every named type and rewrite each pointer whose target is
    /// still a placeholder. After this pass no reachable pointer dangles.
    fn resolve_ptr_types(&self) -> ResolveResult<()> {
        let mut visited = HashSet::new();
        for (_, ty) in self.types.iter() {
            self.resolve_ty(ty, &mut visited)?;
        }
        Ok(())
    }

    fn resolve_ty(&self, ty: &Ty, visited: &mut HashSet<usize>) -> ResolveResult<()> {
        if !visited.insert(ty.addr()) {
            return Ok(());
        }

        let pending = match &ty.data().kind {
            TyKind::Ptr(target) => target.unresolved_expr(),
            _ => None,
        };
        if let Some(expr) = pending {
            let target = self
                .construct_type(&expr, true, true)?
                .ok_or_else(|| ResolveError::UnknownType(expr.to_string()))?;
            ty.set_ptr_target(target);
        }

        let children: Vec<Ty> = match &ty.data().kind {
            TyKind::Ptr(target) => vec![target.clone()],
            TyKind::Array { item, .. } => vec![item.clone()],
            TyKind::Struct { fields } => fields.iter().map(|f| f.ty.clone()).collect(),
            _ => Vec::new(),
        };
        for child in &children {
            self.resolve_ty(child, visited)?;
        }
        Ok(())
    }
}

impl Default for TypeResolver {
    fn default() -> Self {
        TypeResolver::new()
    }
}
