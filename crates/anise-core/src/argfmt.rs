use std::collections::HashMap;
use std::fmt;

use crate::ast::{equal, Param, Value};
use crate::error::AniseError;
use crate::types::{parse_type, Type, TypeBindings, TypeRegistry};

/// One slot of a parameter pattern: a type constraint, an optional name to
/// bind, and an optional literal the argument must equal.
#[derive(Clone)]
pub struct Arg {
    pub name: String,
    pub ty: Type,
    pub value: Option<Value>,
}

/// A function body's parameter pattern: either a single wildcard name that
/// captures the whole argument tuple as a quoted list, or a finite ordered
/// sequence of `Arg`s.
#[derive(Clone)]
pub struct ArgFmt {
    pub wildcard: Option<String>,
    pub args: Vec<Arg>,
}

impl ArgFmt {
    /// Declared types per bound name, the variable map seeded into the
    /// return-type walker.
    pub fn values(&self) -> HashMap<String, Type> {
        let mut vars = HashMap::new();
        if let Some(name) = &self.wildcard {
            vars.insert(name.clone(), Type::list());
            return vars;
        }
        for arg in &self.args {
            if !arg.name.is_empty() {
                vars.insert(arg.name.clone(), arg.ty.clone());
            }
        }
        vars
    }
}

impl fmt::Display for ArgFmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.wildcard {
            return write!(f, "{}", name);
        }
        write!(f, "(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i != 0 {
                write!(f, " ")?;
            }
            match (&arg.value, arg.name.is_empty()) {
                (Some(value), _) => write!(f, "{}", value)?,
                (None, false) if arg.ty.is_any() => write!(f, "{}", arg.name)?,
                // Colon-prefixed keys already carry their separator;
                // generic letters do not.
                (None, false) if arg.ty.is_generic() => {
                    write!(f, "{}:{}", arg.name, arg.ty)?
                }
                (None, false) => write!(f, "{}{}", arg.name, arg.ty)?,
                (None, true) => write!(f, "{}", arg.ty)?,
            }
        }
        write!(f, ")")
    }
}

/// Parse the parameter-pattern expression of a function definition.
///
/// A bare identifier is a wildcard. Inside a list: literals constrain by
/// value, `name:type` constrains by type, a bare type token is an anonymous
/// type-only binder, and a bare name matches anything.
pub fn parse_arg_fmt(expr: &Param) -> Result<ArgFmt, AniseError> {
    match &expr.value {
        Value::Ident(name) => Ok(ArgFmt {
            wildcard: Some(name.clone()),
            args: Vec::new(),
        }),
        Value::List(s) => {
            let mut args = Vec::new();
            for item in &s.items {
                args.push(parse_arg(item)?);
            }
            Ok(ArgFmt {
                wildcard: None,
                args,
            })
        }
        other => Err(AniseError::parse(format!(
            "parameter pattern must be a name or a list, found {:?}",
            other
        ))),
    }
}

fn parse_arg(item: &Param) -> Result<Arg, AniseError> {
    match &item.value {
        Value::Int(_) => Ok(Arg {
            name: String::new(),
            ty: Type::int(),
            value: Some(item.value.clone()),
        }),
        Value::Str(_) => Ok(Arg {
            name: String::new(),
            ty: Type::str_(),
            value: Some(item.value.clone()),
        }),
        Value::Bool(_) => Ok(Arg {
            name: String::new(),
            ty: Type::bool_(),
            value: Some(item.value.clone()),
        }),
        Value::List(s) if s.quoted => Ok(Arg {
            name: String::new(),
            ty: Type::list(),
            value: Some(item.value.clone()),
        }),
        Value::Ident(id) => {
            if let Some(ty) = parse_type(id) {
                return Ok(Arg {
                    name: String::new(),
                    ty,
                    value: None,
                });
            }
            if let Some((name, rest)) = id.split_once(':') {
                if name.is_empty() || rest.is_empty() {
                    return Err(AniseError::parse(format!(
                        "malformed parameter declaration: {}",
                        id
                    )));
                }
                let token = if rest.len() == 1 && rest.as_bytes()[0].is_ascii_uppercase() {
                    rest.to_string()
                } else {
                    format!(":{}", rest)
                };
                let ty = parse_type(&token).ok_or_else(|| {
                    AniseError::parse(format!("unknown type in parameter declaration: {}", id))
                })?;
                return Ok(Arg {
                    name: name.to_string(),
                    ty,
                    value: None,
                });
            }
            Ok(Arg {
                name: id.clone(),
                ty: Type::any(),
                value: None,
            })
        }
        other => Err(AniseError::parse(format!(
            "unexpected form in parameter pattern: {:?}",
            other
        ))),
    }
}

/// Test whether an argument tuple satisfies a pattern. `None` means no
/// match; a successful match yields the generic bindings collected along
/// the way. A missing pattern matches anything and binds nothing.
pub fn match_parameters(
    registry: &TypeRegistry,
    argfmt: Option<&ArgFmt>,
    params: &[Param],
) -> Option<TypeBindings> {
    let argfmt = match argfmt {
        Some(argfmt) => argfmt,
        None => return Some(TypeBindings::new()),
    };
    if argfmt.wildcard.is_some() {
        return Some(TypeBindings::new());
    }
    if argfmt.args.len() != params.len() {
        return None;
    }

    let mut type_binds = TypeBindings::new();
    let mut binds: HashMap<&str, &Value> = HashMap::new();
    for (arg, param) in argfmt.args.iter().zip(params.iter()) {
        match registry.match_type(&arg.ty, &param.ty, &mut type_binds) {
            Ok(true) => {}
            _ => return None,
        }
        if let Some(literal) = &arg.value {
            if !equal(literal, &param.value) {
                return None;
            }
        }
        if arg.name.is_empty() {
            continue;
        }
        if let Some(bound) = binds.get(arg.name.as_str()) {
            if !equal(bound, &param.value) {
                return None;
            }
        }
        binds.insert(arg.name.as_str(), &param.value);
    }
    Some(type_binds)
}
