use std::collections::HashMap;

use crate::ast::{Param, Sexpr, Value};
use crate::error::{AniseError, WARN_TAG};
use crate::runtime::Interpret;
use crate::types::{parse_type, Type};

/// Infer the type a body evaluates to, given the declared types of the
/// variables in scope. `set`/`set'` prefix statements extend the variable
/// map; the result is the type of the last statement (or of a trailing
/// type ascription).
pub fn body_type(
    interp: &Interpret,
    fname: &str,
    body: &[Param],
    mut vars: HashMap<String, Type>,
) -> Result<Type, AniseError> {
    if body.is_empty() {
        return Ok(Type::list());
    }
    let mut last = body.len() - 1;
    let mut ascription = None;
    if last >= 1 {
        if let Value::Ident(id) = &body[last].value {
            if let Some(ty) = parse_type(id) {
                last -= 1;
                ascription = Some(ty);
            }
        }
    }

    for stmt in body.iter().take(last) {
        let items = match &stmt.value {
            Value::List(s) if !s.quoted && !s.items.is_empty() => &s.items,
            _ => continue,
        };
        let head = match &items[0].value {
            Value::Ident(id) => id.as_str(),
            other => {
                return Err(AniseError::type_err(format!(
                    "{}: expected identifier at call position, found {:?}",
                    fname, other
                )))
            }
        };
        if head != "set" && head != "set'" {
            continue;
        }
        let varname = match items.get(1).map(|p| &p.value) {
            Some(Value::Ident(name)) => name.clone(),
            _ => {
                return Err(AniseError::type_err(format!(
                    "{}: {} expects a variable name, found {:?}",
                    fname, head, stmt
                )))
            }
        };
        match items.len() {
            4 => {
                let ty = match &items[3].value {
                    Value::Ident(id) => parse_type(id),
                    _ => None,
                };
                let ty = ty.ok_or_else(|| {
                    AniseError::type_err(format!(
                        "{}: fourth argument of {} must be a type identifier, found {:?}",
                        fname, head, items[3]
                    ))
                })?;
                vars.insert(varname, ty);
            }
            3 => {
                let ty = expr_type(interp, fname, &items[2], &vars)?;
                vars.insert(varname, ty);
            }
            _ => {
                return Err(AniseError::arity(format!(
                    "{}: incorrect number of arguments to {}",
                    fname, head
                )))
            }
        }
    }

    if let Some(ty) = ascription {
        return Ok(ty);
    }
    expr_type(interp, fname, &body[last], &vars)
}

/// Per-expression inference. Special forms are recognised by their head
/// identifier; a call to a registered function yields its declared return
/// type; an unknown callee is a diagnostic, not a hard error.
pub fn expr_type(
    interp: &Interpret,
    fname: &str,
    expr: &Param,
    vars: &HashMap<String, Type>,
) -> Result<Type, AniseError> {
    match &expr.value {
        Value::Int(_) => Ok(Type::int()),
        Value::Str(_) => Ok(Type::str_()),
        Value::Bool(_) => Ok(Type::bool_()),
        Value::Lazy(_) | Value::Input(_) => Ok(Type::list()),
        Value::Ident(id) => {
            if let Some(ty) = vars.get(id) {
                return Ok(ty.clone());
            }
            if interp.lookup_func(id).is_some() {
                return Ok(Type::func());
            }
            Err(AniseError::name(format!(
                "{}: undefined variable: {}",
                fname, id
            )))
        }
        Value::List(s) => {
            if s.quoted || s.items.is_empty() {
                return Ok(Type::list());
            }
            if s.lambda {
                return Ok(Type::func());
            }
            let head = match &s.items[0].value {
                Value::Ident(id) => id.as_str(),
                other => {
                    return Err(AniseError::type_err(format!(
                        "{}: expected identifier at call position, found {:?}",
                        fname, other
                    )))
                }
            };
            match head {
                "set" | "set'" => Err(AniseError::type_err(format!(
                    "{}: unexpected {} at the end of the function",
                    fname, head
                ))),
                "lambda" => Ok(Type::func()),
                "and" | "or" => Ok(Type::bool_()),
                "gen" | "gen'" => Ok(Type::list()),
                "apply" => {
                    let mut items = s.items.clone();
                    items.pop_front();
                    let tail = Param::new(Value::List(Sexpr::new(items)));
                    expr_type(interp, fname, &tail, vars)
                }
                "if" => {
                    if s.items.len() != 4 {
                        return Err(AniseError::arity(format!(
                            "{}: incorrect number of arguments to 'if'",
                            fname
                        )));
                    }
                    let then_ty = expr_type(interp, fname, &s.items[2], vars)?;
                    let else_ty = expr_type(interp, fname, &s.items[3], vars)?;
                    if then_ty != else_ty {
                        return Err(AniseError::type_err(format!(
                            "{}: different types in if branches: {} != {}",
                            fname, then_ty, else_ty
                        )));
                    }
                    Ok(then_ty)
                }
                "do" => {
                    let body: Vec<Param> = s.items.iter().skip(1).cloned().collect();
                    body_type(interp, fname, &body, vars.clone())
                }
                name if name == "self" => enclosing_return_type(interp, fname),
                name => match interp.lookup_func(name) {
                    Some(callable) => Ok(callable.return_type()),
                    None => {
                        eprintln!(
                            "{} {}: cannot detect return type of function {}",
                            WARN_TAG, fname, name
                        );
                        Ok(Type::any())
                    }
                },
            }
        }
    }
}

fn enclosing_return_type(interp: &Interpret, fname: &str) -> Result<Type, AniseError> {
    match interp.lookup_func(fname) {
        Some(callable) => Ok(callable.return_type()),
        None => {
            eprintln!(
                "{} {}: cannot detect return type of self-call",
                WARN_TAG, fname
            );
            Ok(Type::any())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reader;
    use crate::runtime::Interpret;
    use std::sync::Arc;

    fn parse_body(interp: &Arc<Interpret>, src: &str) -> Vec<Param> {
        let mut reader = Reader::new(src, interp);
        let mut out = Vec::new();
        while let Some(expr) = reader.next_expr().unwrap() {
            out.push(expr);
        }
        out
    }

    fn infer(src: &str) -> Result<Type, AniseError> {
        let interp = Interpret::new(Box::new(Vec::new()));
        let body = parse_body(&interp, src);
        body_type(&interp, "test", &body, HashMap::new())
    }

    #[test]
    fn literals_and_intrinsic_calls() {
        assert_eq!(infer("5").unwrap(), Type::int());
        assert_eq!(infer("\"s\"").unwrap(), Type::str_());
        assert_eq!(infer("true").unwrap(), Type::bool_());
        assert_eq!(infer("'(1 2)").unwrap(), Type::list());
        assert_eq!(infer("(+ 1 2)").unwrap(), Type::int());
        assert_eq!(infer("(< 1 2)").unwrap(), Type::bool_());
    }

    #[test]
    fn set_extends_the_variable_map() {
        assert_eq!(infer("(set x 5) x").unwrap(), Type::int());
        assert_eq!(infer("(set x (list 1) :list) x").unwrap(), Type::list());
        assert!(infer("x").is_err());
    }

    #[test]
    fn if_branches_must_agree() {
        assert_eq!(infer("(if (< 1 2) 1 2)").unwrap(), Type::int());
        assert!(infer("(if true 1 \"s\")").is_err());
    }

    #[test]
    fn special_forms_have_fixed_types() {
        assert_eq!(infer("(and true false)").unwrap(), Type::bool_());
        assert_eq!(infer("(gen f 0)").unwrap(), Type::list());
        assert_eq!(infer("(do 1 \"x\")").unwrap(), Type::str_());
        assert!(infer("(set x 5)").is_err());
    }

    #[test]
    fn trailing_type_identifier_ascribes() {
        assert_eq!(infer("(head '(1)) :int").unwrap(), Type::int());
        assert_eq!(infer("(do (head '(1)) :int)").unwrap(), Type::int());
    }

    #[test]
    fn unknown_callee_is_a_warning_only() {
        assert_eq!(infer("(mystery 1)").unwrap(), Type::any());
    }
}
