use std::collections::HashMap;
use std::fs::File;

use im::Vector;

use crate::ast::{equal, Param, Sexpr, Value};
use crate::error::AniseError;
use crate::func::{Callable, NativeFn};
use crate::io_reader::CharInput;
use crate::number::Number;
use crate::runtime::Interpret;
use crate::types::Type;

/// The intrinsic function table. Every entry is a native callable with an
/// advertised return type for the static checker; runtime results carry
/// the constructor type of the value the intrinsic built.
pub fn install() -> HashMap<String, Callable> {
    let mut funcs = HashMap::new();
    let mut add = |name: &str, ret: Type,
                   f: fn(&Interpret, &[Param]) -> Result<Param, AniseError>| {
        funcs.insert(
            name.to_string(),
            Callable::Native(NativeFn::new(name, ret, f)),
        );
    };

    add("+", Type::int(), fn_plus);
    add("-", Type::int(), fn_minus);
    add("*", Type::int(), fn_multiply);
    add("/", Type::int(), fn_div);
    add("mod", Type::int(), fn_mod);
    add("<", Type::bool_(), fn_less);
    add("<=", Type::bool_(), fn_less_eq);
    add(">", Type::bool_(), fn_more);
    add(">=", Type::bool_(), fn_more_eq);
    add("=", Type::bool_(), fn_eq);
    add("not", Type::bool_(), fn_not);
    add("head", Type::any(), fn_head);
    add("tail", Type::list(), fn_tail);
    add("append", Type::list(), fn_append);
    add("list", Type::list(), fn_list);
    add("empty", Type::bool_(), fn_empty);
    add("length", Type::int(), fn_length);
    add("nth", Type::any(), fn_nth);
    add("int", Type::int(), fn_int);
    add("open", Type::str_(), fn_open);
    add("space", Type::bool_(), fn_space);
    add("eol", Type::bool_(), fn_eol);
    add("print", Type::any(), fn_print);
    funcs
}

fn int_arg<'a>(name: &str, pos: usize, param: &'a Param) -> Result<&'a Number, AniseError> {
    match &param.value {
        Value::Int(n) => Ok(n),
        other => Err(AniseError::type_err(format!(
            "{}: expected integer argument at position {}, found {:?}",
            name,
            pos + 1,
            other
        ))),
    }
}

fn str_arg<'a>(name: &str, param: &'a Param) -> Result<&'a str, AniseError> {
    match &param.value {
        Value::Str(s) => Ok(s),
        other => Err(AniseError::type_err(format!(
            "{}: expected string argument, found {:?}",
            name, other
        ))),
    }
}

fn exactly<'a>(name: &str, count: usize, args: &'a [Param]) -> Result<&'a [Param], AniseError> {
    if args.len() != count {
        return Err(AniseError::arity(format!(
            "{}: expected {} argument(s), found {:?}",
            name, count, args
        )));
    }
    Ok(args)
}

fn fn_plus(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let mut result = Number::from(0);
    for (i, arg) in args.iter().enumerate() {
        result = result.checked_add(int_arg("+", i, arg)?)?;
    }
    Ok(Param::new(Value::Int(result)))
}

fn fn_minus(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let mut result = Number::from(0);
    for (i, arg) in args.iter().enumerate() {
        let value = int_arg("-", i, arg)?;
        if i == 0 {
            result = value.clone();
        } else {
            result = result.checked_sub(value)?;
        }
    }
    Ok(Param::new(Value::Int(result)))
}

fn fn_multiply(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let mut result = Number::from(1);
    for (i, arg) in args.iter().enumerate() {
        result = result.checked_mul(int_arg("*", i, arg)?)?;
    }
    Ok(Param::new(Value::Int(result)))
}

fn fn_div(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    if args.is_empty() {
        return Err(AniseError::arity("/: expected at least one argument"));
    }
    let mut result = int_arg("/", 0, &args[0])?.clone();
    for (i, arg) in args.iter().enumerate().skip(1) {
        result = result.checked_div(int_arg("/", i, arg)?)?;
    }
    Ok(Param::new(Value::Int(result)))
}

fn fn_mod(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let args = exactly("mod", 2, args)?;
    let a = int_arg("mod", 0, &args[0])?;
    let b = int_arg("mod", 1, &args[1])?;
    Ok(Param::new(Value::Int(a.checked_rem(b)?)))
}

fn compare(
    name: &str,
    args: &[Param],
    pick: fn(std::cmp::Ordering) -> bool,
) -> Result<Param, AniseError> {
    let args = exactly(name, 2, args)?;
    let a = int_arg(name, 0, &args[0])?;
    let b = int_arg(name, 1, &args[1])?;
    Ok(Param::bool_(pick(a.cmp(b))))
}

fn fn_less(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    compare("<", args, std::cmp::Ordering::is_lt)
}

fn fn_less_eq(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    compare("<=", args, std::cmp::Ordering::is_le)
}

fn fn_more(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    compare(">", args, std::cmp::Ordering::is_gt)
}

fn fn_more_eq(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    compare(">=", args, std::cmp::Ordering::is_ge)
}

fn fn_eq(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let args = exactly("=", 2, args)?;
    Ok(Param::bool_(equal(&args[0].value, &args[1].value)))
}

fn fn_not(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let args = exactly("not", 1, args)?;
    match &args[0].value {
        Value::Bool(b) => Ok(Param::bool_(!b)),
        other => Err(AniseError::type_err(format!(
            "not: expected a boolean argument, found {:?}",
            other
        ))),
    }
}

fn fn_head(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let args = exactly("head", 1, args)?;
    args[0].value.head()
}

fn fn_tail(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let args = exactly("tail", 1, args)?;
    Ok(Param::new(args[0].value.tail()?))
}

fn fn_append(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    if args.is_empty() {
        return Err(AniseError::arity("append: expected at least one argument"));
    }
    args[0].value.append(&args[1..])
}

fn fn_list(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let items: Vector<Param> = args.iter().cloned().collect();
    Ok(Param::new(Value::List(Sexpr::quoted_from(items))))
}

fn fn_empty(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let args = exactly("empty", 1, args)?;
    Ok(Param::bool_(args[0].value.is_empty()?))
}

fn fn_length(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let args = exactly("length", 1, args)?;
    let len = args[0].value.length()?;
    Ok(Param::int(len as i64))
}

fn fn_nth(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let args = exactly("nth", 2, args)?;
    let n = int_arg("nth", 0, &args[0])?
        .to_usize()
        .ok_or_else(|| AniseError::structural(format!("index is out of range: {}", args[0])))?;
    args[1].value.nth(n)
}

fn fn_int(interp: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let args = exactly("int", 1, args)?;
    let token = str_arg("int", &args[0])?;
    match interp.parse_int(token) {
        Some(number) => Ok(Param::new(Value::Int(number))),
        None => Err(AniseError::type_err(format!(
            "int: cannot convert argument into an integer: {:?}",
            token
        ))),
    }
}

fn fn_open(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let args = exactly("open", 1, args)?;
    let path = str_arg("open", &args[0])?;
    let file = File::open(path)
        .map_err(|err| AniseError::io(format!("open: cannot open {}: {}", path, err)))?;
    Ok(Param::typed(
        Value::Input(CharInput::new(file)),
        Type::list(),
    ))
}

fn fn_space(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let args = exactly("space", 1, args)?;
    let s = str_arg("space", &args[0])?;
    Ok(Param::bool_(
        !s.is_empty() && s.chars().all(|ch| ch == ' ' || ch == '\t'),
    ))
}

fn fn_eol(_: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let args = exactly("eol", 1, args)?;
    let s = str_arg("eol", &args[0])?;
    Ok(Param::bool_(s == "\n"))
}

fn fn_print(interp: &Interpret, args: &[Param]) -> Result<Param, AniseError> {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i != 0 {
            out.push(' ');
        }
        arg.value.print_to(&mut out)?;
    }
    out.push('\n');
    interp.write_output(&out)?;
    Ok(Param::quoted_empty())
}
