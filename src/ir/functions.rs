use std::collections::HashMap;

use crate::asm::Label;
use crate::ast::Element;
use crate::types::{word_bytes, Field, Ty};

use super::type_resolver::TypeResolver;
use super::types::{ResolveError, ResolveResult};

/// A registered function: signature, parameter frame layout, raw body.
///
/// The body stays an untyped tree; nothing inside it is checked until the
/// code generator compiles it.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub return_type: Ty,
    pub params: Vec<Field>,
    pub body: Element,
    pub entry: Label,
}

impl Function {
    /// Raw sum of parameter sizes. Deliberately not word-aligned, even
    /// though the parameter positions themselves step by aligned slots.
    pub fn total_parameter_size(&self) -> i32 {
        self.params.iter().map(|p| p.ty.size()).sum()
    }
}

/// Name → function table, kept in declaration order so emission is
/// deterministic.
pub struct FunctionRegistry {
    funcs: Vec<Function>,
    index: HashMap<String, usize>,
}

impl FunctionRegistry {
    /// Register every `[type name [params] body]` declaration.
    ///
    /// Parameter positions start past the return-value slot and the saved
    /// return address, stepping one aligned slot per parameter.
    pub fn from_declarations(
        resolver: &TypeResolver,
        section: &Element,
    ) -> ResolveResult<FunctionRegistry> {
        let decls = section.as_list().ok_or_else(|| {
            ResolveError::MalformedDeclaration("function declaration section must be a list".into())
        })?;

        let mut funcs = Vec::with_capacity(decls.len());
        let mut index = HashMap::new();
        for decl in decls {
            let items = decl.as_list().ok_or_else(|| {
                ResolveError::MalformedDeclaration(format!(
                    "function declaration must be a list, found {decl}"
                ))
            })?;
            let (ret_expr, name, param_list, body) = match items {
                [ret_expr, name, param_list, body] => (ret_expr, name, param_list, body),
                _ => {
                    return Err(ResolveError::MalformedDeclaration(format!(
                        "function declaration must be [type name [params] body], found {decl}"
                    )))
                }
            };
            let return_type = resolver.construct(ret_expr)?;
            let name = name.as_word().ok_or_else(|| {
                ResolveError::MalformedDeclaration(format!(
                    "function name must be a word, found {name}"
                ))
            })?;
            let param_items = param_list.as_list().ok_or_else(|| {
                ResolveError::MalformedDeclaration(format!(
                    "parameter list of '{name}' must be a list"
                ))
            })?;

            let mut params = Vec::with_capacity(param_items.len());
            let mut position = return_type.size() + 4;
            for param in param_items {
                let parts = param.as_list().ok_or_else(|| {
                    ResolveError::MalformedDeclaration(format!(
                        "parameter of '{name}' must be a [type name] list, found {param}"
                    ))
                })?;
                let (ty_expr, param_name) = match parts {
                    [ty_expr, param_name] => (ty_expr, param_name),
                    _ => {
                        return Err(ResolveError::MalformedDeclaration(format!(
                            "parameter of '{name}' must be a [type name] list, found {param}"
                        )))
                    }
                };
                let ty = resolver.construct(ty_expr)?;
                let param_name = param_name.as_word().ok_or_else(|| {
                    ResolveError::MalformedDeclaration(format!(
                        "parameter name in '{name}' must be a word, found {param_name}"
                    ))
                })?;
                let size = ty.size();
                params.push(Field {
                    name: param_name.to_string(),
                    ty,
                    position,
                });
                position += word_bytes(size);
            }

            if index.contains_key(name) {
                return Err(ResolveError::DuplicateFunction(name.to_string()));
            }
            index.insert(name.to_string(), funcs.len());
            funcs.push(Function {
                name: name.to_string(),
                return_type,
                params,
                body: body.clone(),
                entry: Label::fresh(),
            });
        }
        Ok(FunctionRegistry { funcs, index })
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.index.get(name).map(|&i| &self.funcs[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Function> {
        self.funcs.iter()
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}
