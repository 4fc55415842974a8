use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use im::Vector;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::argfmt::{match_parameters, parse_arg_fmt, ArgFmt};
use crate::ast::{Param, Sexpr, Value};
use crate::check::body_type;
use crate::error::{AniseError, WARN_TAG};
use crate::runtime::Interpret;
use crate::seq::LazyList;
use crate::types::{parse_type, Type};

pub const LAMBDA_PREFIX: &str = "__lambda__";

/// Implicit bindings every activation receives; they are never captured
/// into a lambda because the lambda's own activation rebinds them.
static IMPLICIT_ARG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(_[0-9]+|__args)$").unwrap());

/// A native callable with its advertised return type (used by the static
/// checker; the runtime result carries the constructor type of the value
/// the intrinsic actually built).
#[derive(Clone)]
pub struct NativeFn {
    name: String,
    ret: Type,
    func: Arc<dyn Fn(&Interpret, &[Param]) -> Result<Param, AniseError> + Send + Sync>,
}

impl NativeFn {
    pub fn new(
        name: impl Into<String>,
        ret: Type,
        func: impl Fn(&Interpret, &[Param]) -> Result<Param, AniseError> + Send + Sync + 'static,
    ) -> NativeFn {
        NativeFn {
            name: name.into(),
            ret,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Anything callable by name: an intrinsic or a user-defined function.
#[derive(Clone)]
pub enum Callable {
    Native(NativeFn),
    User(Arc<FuncInterpret>),
}

impl Callable {
    pub fn eval(&self, interp: &Arc<Interpret>, args: Vec<Param>) -> Result<Param, AniseError> {
        match self {
            Callable::Native(f) => (f.func)(interp.as_ref(), &args),
            Callable::User(f) => f.eval(interp, args),
        }
    }

    pub fn return_type(&self) -> Type {
        match self {
            Callable::Native(f) => f.ret.clone(),
            Callable::User(f) => f.return_type(),
        }
    }
}

/// One body variant of a function. The memo cache maps the hash of an
/// argument tuple to the produced result and lives for the whole program.
pub struct FuncImpl {
    pub(crate) argfmt: Option<ArgFmt>,
    pub(crate) body: Vec<Param>,
    pub(crate) memo: bool,
    pub(crate) return_type: Type,
    results: Mutex<HashMap<String, Param>>,
}

impl FuncImpl {
    fn new(argfmt: Option<ArgFmt>, body: Vec<Param>, memo: bool, return_type: Type) -> FuncImpl {
        FuncImpl {
            argfmt,
            body,
            memo,
            return_type,
            results: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, key: &str) -> Option<Param> {
        self.results.lock().unwrap().get(key).cloned()
    }

    fn remember(&self, fname: &str, args: &[Param], result: &Param) {
        match key_of_args(args) {
            Ok(key) => {
                self.results.lock().unwrap().insert(key, result.clone());
            }
            Err(err) => {
                eprintln!(
                    "{} {}: cannot remember result for {:?}: {}",
                    WARN_TAG, fname, args, err
                );
            }
        }
    }
}

fn key_of_args(args: &[Param]) -> Result<String, AniseError> {
    let mut key = String::new();
    for arg in args {
        key.push_str(&arg.value.hash_key()?);
        key.push(' ');
    }
    Ok(key)
}

/// A named user function: ordered implementation bodies sharing one
/// declared return type, plus by-value captures when it is a lambda.
pub struct FuncInterpret {
    name: String,
    impls: RwLock<Vec<Arc<FuncImpl>>>,
    return_type: RwLock<Type>,
    captured: HashMap<String, Param>,
}

impl FuncInterpret {
    pub fn new(name: impl Into<String>) -> FuncInterpret {
        FuncInterpret::with_captured(name, HashMap::new())
    }

    pub fn with_captured(name: impl Into<String>, captured: HashMap<String, Param>) -> FuncInterpret {
        FuncInterpret {
            name: name.into(),
            impls: RwLock::new(Vec::new()),
            return_type: RwLock::new(Type::unknown()),
            captured,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> Type {
        self.return_type.read().unwrap().clone()
    }

    pub(crate) fn impls_snapshot(&self) -> Vec<Arc<FuncImpl>> {
        self.impls.read().unwrap().clone()
    }

    /// Register one more body. Every body of a function must declare the
    /// same return type.
    pub fn add_impl(
        &self,
        argfmt: Option<&Param>,
        body: Vec<Param>,
        memo: bool,
        return_type: Type,
    ) -> Result<(), AniseError> {
        let mut impls = self.impls.write().unwrap();
        if !impls.is_empty() && return_type != *self.return_type.read().unwrap() {
            return Err(AniseError::type_err(format!(
                "{}: cannot redefine return type: previous {}, current {}",
                self.name,
                self.return_type.read().unwrap(),
                return_type
            )));
        }
        let argfmt = match argfmt {
            Some(expr) => Some(parse_arg_fmt(expr)?),
            None => None,
        };
        impls.push(Arc::new(FuncImpl::new(argfmt, body, memo, return_type.clone())));
        *self.return_type.write().unwrap() = return_type;
        Ok(())
    }

    /// Scan implementations in declaration order; the first whose pattern
    /// matches wins. Generic bindings concretise the declared return type,
    /// and when any binding was made, the body's inferred return type must
    /// agree with the declared one.
    pub fn try_bind(
        &self,
        interp: &Arc<Interpret>,
        params: &[Param],
    ) -> Result<(Arc<FuncImpl>, Type), AniseError> {
        let impls = self.impls_snapshot();
        for imp in impls {
            let binds = match match_parameters(interp.types(), imp.argfmt.as_ref(), params) {
                Some(binds) => binds,
                None => continue,
            };
            let mut ret = imp.return_type.clone();
            if let Some(bound) = binds.get(ret.basic()) {
                ret = bound.clone();
            }
            if !binds.is_empty() {
                let mut vars: HashMap<String, Type> = HashMap::new();
                if let Some(argfmt) = &imp.argfmt {
                    for (arg, param) in argfmt.args.iter().zip(params.iter()) {
                        if !arg.name.is_empty() {
                            vars.insert(arg.name.clone(), param.ty.clone());
                        }
                    }
                }
                let mut inferred = body_type(interp, &self.name, &imp.body, vars)?;
                if let Some(bound) = binds.get(inferred.basic()) {
                    inferred = bound.clone();
                }
                if ret != inferred {
                    return Err(AniseError::dispatch(format!(
                        "{}: mismatched return type: {} != {}",
                        self.name, ret, inferred
                    )));
                }
            }
            return Ok((imp, ret));
        }
        Err(AniseError::dispatch(format!(
            "{}: no matching implementation found for {:?}",
            self.name, params
        )))
    }

    /// Evaluate one call. Scope cleanup runs on normal return and on error
    /// unwind alike, and is skipped on memo hits (the cached call produced
    /// no bindings and no side effects).
    pub fn eval(&self, interp: &Arc<Interpret>, params: Vec<Param>) -> Result<Param, AniseError> {
        if interp.trace_enabled() {
            eprintln!("trace: call {} {:?}", self.name, params);
        }
        let mut run = FuncRuntime {
            interp,
            fi: self,
            vars: HashMap::new(),
            args: Vec::new(),
            scoped_vars: Vec::new(),
        };
        let bound = match run.bind(params) {
            Ok(bound) => bound,
            Err(err) => {
                run.cleanup();
                return Err(err);
            }
        };
        let (imp, ret) = match bound {
            Bound::Cached(res) => return Ok(res),
            Bound::Selected(imp, ret) => (imp, ret),
        };
        let result = run.eval_loop(imp);
        run.cleanup();
        let mut res = result?;
        res.ty = ret;
        Ok(res)
    }
}

enum Bound {
    Cached(Param),
    Selected(Arc<FuncImpl>, Type),
}

/// One activation. A tail call reuses the activation after cleanup and
/// rebinding; everything else is ordinary host-stack recursion.
struct FuncRuntime<'a> {
    interp: &'a Arc<Interpret>,
    fi: &'a FuncInterpret,
    vars: HashMap<String, Param>,
    args: Vec<Param>,
    scoped_vars: Vec<String>,
}

impl<'a> FuncRuntime<'a> {
    /// Select an implementation for the argument tuple and populate the
    /// frame: named pattern binders, the whole tuple as `__args`, and the
    /// positional `_1, _2, ...` views. A memo hit short-circuits before
    /// any binding happens.
    fn bind(&mut self, params: Vec<Param>) -> Result<Bound, AniseError> {
        self.cleanup();
        self.vars.clear();
        let (imp, ret) = self.fi.try_bind(self.interp, &params)?;
        if imp.memo {
            match key_of_args(&params) {
                Ok(key) => {
                    if let Some(res) = imp.cached(&key) {
                        return Ok(Bound::Cached(res));
                    }
                }
                Err(err) => {
                    eprintln!(
                        "{} {}: cannot compute hash of arguments {:?}: {}",
                        WARN_TAG,
                        self.fi.name(),
                        params,
                        err
                    );
                }
            }
        }

        if let Some(argfmt) = &imp.argfmt {
            if let Some(wildcard) = &argfmt.wildcard {
                self.vars.insert(
                    wildcard.clone(),
                    Param::typed(
                        Value::List(Sexpr::quoted_from(params.iter().cloned().collect())),
                        Type::list(),
                    ),
                );
            } else {
                if argfmt.args.len() != params.len() {
                    return Err(AniseError::arity(format!(
                        "incorrect number of arguments to {}: expected {}, found {}",
                        self.fi.name(),
                        argfmt.args.len(),
                        params.len()
                    )));
                }
                for (arg, param) in argfmt.args.iter().zip(params.iter()) {
                    if arg.value.is_none() && !arg.name.is_empty() {
                        self.vars.insert(arg.name.clone(), param.clone());
                    }
                }
            }
        }
        self.vars.insert(
            "__args".to_string(),
            Param::typed(
                Value::List(Sexpr::quoted_from(params.iter().cloned().collect())),
                Type::list(),
            ),
        );
        for (i, param) in params.iter().enumerate() {
            self.vars.insert(format!("_{}", i + 1), param.clone());
        }
        self.args = params;
        Ok(Bound::Selected(imp, ret))
    }

    /// The trampoline: evaluate body statements; when the last form is a
    /// call back into this function (by name or `self`), rebind and loop
    /// instead of recursing. Results are memoised only when this
    /// activation actually produced one.
    fn eval_loop(&mut self, start: Arc<FuncImpl>) -> Result<Param, AniseError> {
        let memo_impl = start.clone();
        let memo_args = self.args.clone();
        let mut cur = start;
        loop {
            if cur.body.is_empty() {
                return Ok(self.finalize(Param::quoted_empty(), None, None, &memo_impl, &memo_args));
            }
            let mut last = cur.body.len() - 1;
            let mut body_force: Option<Type> = None;
            if last >= 1 {
                if let Value::Ident(id) = &cur.body[last].value {
                    if let Some(ty) = parse_type(id) {
                        last -= 1;
                        body_force = Some(ty);
                    }
                }
            }
            for stmt in cur.body.iter().take(last) {
                self.eval_parameter(stmt)?;
            }
            let (mut e, force) = self.last_parameter(&cur.body[last])?;

            let call = match &e.value {
                Value::List(s) if !s.quoted && !s.items.is_empty() => s.clone(),
                _ => {
                    if matches!(&e.value, Value::List(s) if s.quoted || s.items.is_empty()) {
                        e.ty = Type::list();
                    }
                    return Ok(self.finalize(e, force, body_force, &memo_impl, &memo_args));
                }
            };

            let self_call = matches!(
                &call.items[0].value,
                Value::Ident(id) if id == self.fi.name() || id == "self"
            );
            if !self_call {
                let result = self.eval_func(&call)?;
                return Ok(self.finalize(result, force, body_force, &memo_impl, &memo_args));
            }

            let mut args = Vec::with_capacity(call.items.len() - 1);
            for arg in call.items.iter().skip(1) {
                args.push(self.eval_parameter(arg)?);
            }
            match self.bind(args)? {
                Bound::Cached(res) => return Ok(res),
                Bound::Selected(next, _) => cur = next,
            }
        }
    }

    fn finalize(
        &self,
        mut result: Param,
        force: Option<Type>,
        body_force: Option<Type>,
        memo_impl: &FuncImpl,
        memo_args: &[Param],
    ) -> Param {
        if let Some(ty) = force {
            result.ty = ty;
        }
        if let Some(ty) = body_force {
            result.ty = ty;
        }
        if memo_impl.memo {
            memo_impl.remember(self.fi.name(), memo_args, &result);
        }
        result
    }

    /// Resolve one expression to either a ready value or an unevaluated
    /// call form, handling every special form. The optional returned type
    /// is a pending ascription the caller applies to the final value.
    fn last_parameter(&mut self, expr: &Param) -> Result<(Param, Option<Type>), AniseError> {
        match &expr.value {
            Value::Int(_) => Ok((Param::typed(expr.value.clone(), Type::int()), None)),
            Value::Str(_) => Ok((Param::typed(expr.value.clone(), Type::str_()), None)),
            Value::Bool(_) => Ok((Param::typed(expr.value.clone(), Type::bool_()), None)),
            Value::Lazy(_) | Value::Input(_) => {
                Ok((Param::typed(expr.value.clone(), Type::list()), None))
            }
            Value::Ident(id) => match self.find_var(id) {
                Some(value) => Ok((value, None)),
                None => Ok((Param::typed(expr.value.clone(), Type::unknown()), None)),
            },
            Value::List(s) => {
                if s.quoted {
                    return Ok((Param::typed(expr.value.clone(), Type::list()), None));
                }
                if s.items.is_empty() {
                    return Err(AniseError::structural(format!(
                        "{}: unexpected empty s-expression",
                        self.fi.name()
                    )));
                }
                let name = match &s.items[0].value {
                    Value::Ident(id) => id.clone(),
                    _ => return Ok((Param::typed(expr.value.clone(), Type::unknown()), None)),
                };
                if s.lambda {
                    let lm = self.eval_lambda(None, std::slice::from_ref(expr))?;
                    return Ok((Param::typed(lm, Type::func()), None));
                }
                match name.as_str() {
                    "lambda" => {
                        if s.items.len() < 3 {
                            return Err(AniseError::arity(format!(
                                "{}: lambda wants a parameter pattern and a body",
                                self.fi.name()
                            )));
                        }
                        let body: Vec<Param> = s.items.iter().skip(2).cloned().collect();
                        let lm = self.eval_lambda(Some(&s.items[1]), &body)?;
                        Ok((Param::typed(lm, Type::func()), None))
                    }
                    "if" => {
                        if s.items.len() != 4 {
                            return Err(AniseError::arity(format!(
                                "expected 3 arguments to if, found {:?}",
                                &s.items.iter().skip(1).collect::<Vec<_>>()
                            )));
                        }
                        let cond = self.eval_parameter(&s.items[1])?;
                        match cond.value {
                            Value::Bool(true) => self.last_parameter(&s.items[2]),
                            Value::Bool(false) => self.last_parameter(&s.items[3]),
                            other => Err(AniseError::type_err(format!(
                                "if condition must evaluate to a boolean, found {:?}",
                                other
                            ))),
                        }
                    }
                    "do" => {
                        let mut last = s.items.len() - 1;
                        let mut ret_type: Option<Type> = None;
                        if let Value::Ident(id) = &s.items[last].value {
                            if let Some(ty) = parse_type(id) {
                                last -= 1;
                                ret_type = Some(ty);
                            }
                        }
                        if last == 0 {
                            return Err(AniseError::arity("do: empty body"));
                        }
                        for stmt in s.items.iter().take(last).skip(1) {
                            self.eval_parameter(stmt)?;
                        }
                        let (mut ret, mut force) = self.last_parameter(&s.items[last])?;
                        if let Some(ty) = ret_type {
                            ret.ty = ty.clone();
                            force = Some(ty);
                        }
                        Ok((ret, force))
                    }
                    "and" | "or" => {
                        let stop_on = name == "or";
                        for arg in s.items.iter().skip(1) {
                            let res = self.eval_parameter(arg)?;
                            let flag = match res.value {
                                Value::Bool(b) => b,
                                other => {
                                    return Err(AniseError::type_err(format!(
                                        "{}: argument {} should evaluate to a boolean, found {:?}",
                                        name, arg, other
                                    )))
                                }
                            };
                            if flag == stop_on {
                                return Ok((Param::bool_(stop_on), None));
                            }
                        }
                        Ok((Param::bool_(!stop_on), None))
                    }
                    "set" | "set'" => {
                        let items: Vec<Param> = s.items.iter().skip(1).cloned().collect();
                        self.set_var(&items, name == "set'")?;
                        Ok((
                            Param::typed(Value::List(Sexpr::quoted_empty()), Type::any()),
                            None,
                        ))
                    }
                    "gen" | "gen'" => {
                        let items: Vec<Param> = s.items.iter().skip(1).cloned().collect();
                        let gen = self.eval_gen(&items, name == "gen'")?;
                        Ok((Param::typed(gen, Type::list()), None))
                    }
                    "apply" => {
                        let items: Vec<Param> = s.items.iter().skip(1).cloned().collect();
                        let res = self.eval_apply(&items)?;
                        Ok((Param::typed(res, Type::unknown()), None))
                    }
                    _ => Ok((Param::typed(expr.value.clone(), Type::unknown()), None)),
                }
            }
        }
    }

    /// Evaluate an expression fully: resolve it, then run it if it turned
    /// out to be a call form.
    fn eval_parameter(&mut self, expr: &Param) -> Result<Param, AniseError> {
        let (e, force) = self.last_parameter(expr)?;
        let mut res = match &e.value {
            Value::List(s) if !s.quoted && !s.items.is_empty() => self.eval_func(&s.clone())?,
            _ => e,
        };
        if let Some(ty) = force {
            res.ty = ty;
        }
        Ok(res)
    }

    /// `(name value [:type])`
    fn set_var(&mut self, items: &[Param], scoped: bool) -> Result<(), AniseError> {
        if items.len() != 2 && items.len() != 3 {
            return Err(AniseError::arity(format!(
                "set wants 2 or 3 arguments, found {:?}",
                items
            )));
        }
        let name = match &items[0].value {
            Value::Ident(id) => id.clone(),
            other => {
                return Err(AniseError::type_err(format!(
                    "set expects an identifier first, found {:?}",
                    other
                )))
            }
        };
        let mut value = self.eval_parameter(&items[1])?;
        if items.len() == 3 {
            let ty = match &items[2].value {
                Value::Ident(id) => parse_type(id),
                _ => None,
            };
            let ty = ty.ok_or_else(|| {
                AniseError::type_err(format!(
                    "{}: set expects a type identifier, found {:?}",
                    self.fi.name(),
                    items[2]
                ))
            })?;
            value.ty = ty;
        }
        self.vars.insert(name.clone(), value);
        if scoped {
            self.scoped_vars.push(name);
        }
        Ok(())
    }

    fn find_var(&self, name: &str) -> Option<Param> {
        if let Some(param) = self.vars.get(name) {
            return Some(param.clone());
        }
        self.fi.captured.get(name).cloned()
    }

    /// `(stepper init...)` — build a lazy sequence over the stepper.
    fn eval_gen(&mut self, items: &[Param], hashable: bool) -> Result<Value, AniseError> {
        if items.len() < 2 {
            return Err(AniseError::arity(format!(
                "gen wants at least 2 arguments, found {:?}",
                items
            )));
        }
        let stepper = self.eval_parameter(&items[0])?;
        let fname = match &stepper.value {
            Value::Ident(id) => id.clone(),
            other => {
                return Err(AniseError::type_err(format!(
                    "gen expects its first argument to be a function, found {:?}",
                    other
                )))
            }
        };
        let stepper = self.find_func(&fname)?;
        let mut state = Vec::new();
        for arg in &items[1..] {
            state.push(self.eval_parameter(arg)?);
        }
        Ok(Value::Lazy(LazyList::new(
            stepper,
            state,
            hashable,
            Arc::downgrade(self.interp),
        )))
    }

    /// Ability to pass a function name through a variable: a local of type
    /// `:func` holding an identifier substitutes its name before the
    /// registry lookup.
    fn find_func(&self, fname: &str) -> Result<Callable, AniseError> {
        let mut fname = fname.to_string();
        if let Some(var) = self.find_var(&fname) {
            if var.ty != Type::func() && !var.ty.is_unknown() {
                return Err(AniseError::type_err(format!(
                    "{}: incorrect type of '{}', expected :func, found {:?}",
                    self.fi.name(),
                    fname,
                    var
                )));
            }
            match &var.value {
                Value::Ident(id) => fname = id.clone(),
                other => {
                    return Err(AniseError::type_err(format!(
                        "{}: cannot use {:?} as a function",
                        self.fi.name(),
                        other
                    )))
                }
            }
        }
        self.interp.lookup_func(&fname).ok_or_else(|| {
            AniseError::name(format!("{}: unknown function: {}", self.fi.name(), fname))
        })
    }

    /// `(name args...)` — evaluate the arguments and call.
    fn eval_func(&mut self, call: &Sexpr) -> Result<Param, AniseError> {
        let name = match &call.items[0].value {
            Value::Ident(id) => id.clone(),
            other => {
                return Err(AniseError::name(format!(
                    "wanted an identifier at call position, found {:?}",
                    other
                )))
            }
        };
        let callable = self.find_func(&name)?;
        let mut args = Vec::with_capacity(call.items.len() - 1);
        for arg in call.items.iter().skip(1) {
            args.push(self.eval_parameter(arg)?);
        }
        callable.eval(self.interp, args)
    }

    /// Create a fresh `__lambda__NNN` function, capturing by value every
    /// free identifier of the body that resolves in the current frame.
    /// The produced value is the generated name.
    fn eval_lambda(&mut self, argfmt: Option<&Param>, body: &[Param]) -> Result<Value, AniseError> {
        let name = self.interp.new_lambda_name();
        let mut captured = HashMap::new();
        let body = self.capture_free_vars(body, &mut captured);
        let fi = FuncInterpret::with_captured(name.clone(), captured);
        fi.add_impl(argfmt, body, false, Type::unknown())?;
        self.interp.register_func(&name, Callable::User(Arc::new(fi)));
        Ok(Value::Ident(name))
    }

    fn capture_free_vars(
        &self,
        stmts: &[Param],
        captured: &mut HashMap<String, Param>,
    ) -> Vec<Param> {
        stmts
            .iter()
            .map(|stmt| match &stmt.value {
                Value::List(s) => {
                    let items: Vec<Param> = s.items.iter().cloned().collect();
                    let walked = self.capture_free_vars(&items, captured);
                    Param::typed(
                        Value::List(Sexpr {
                            items: walked.into_iter().collect(),
                            quoted: s.quoted,
                            lambda: false,
                        }),
                        stmt.ty.clone(),
                    )
                }
                Value::Ident(id) => {
                    if !IMPLICIT_ARG_RE.is_match(id) {
                        if let Some(value) = self.find_var(id) {
                            captured.insert(id.clone(), value);
                        }
                    }
                    stmt.clone()
                }
                _ => stmt.clone(),
            })
            .collect()
    }

    /// `(fn listExpr)` — evaluate the list and splice its elements as the
    /// arguments of an unevaluated call form.
    fn eval_apply(&mut self, items: &[Param]) -> Result<Value, AniseError> {
        if items.len() != 2 {
            return Err(AniseError::arity(
                "apply expects a function and a list of arguments",
            ));
        }
        let res = self.eval_parameter(&items[1])?;
        if !res.value.is_container() {
            return Err(AniseError::type_err(format!(
                "apply expects a list of arguments, found {:?}",
                res
            )));
        }
        let mut cmd: Vector<Param> = Vector::new();
        cmd.push_back(items[0].clone());
        let mut cur = res.value;
        while !cur.is_empty()? {
            cmd.push_back(cur.head()?);
            cur = cur.tail()?;
        }
        Ok(Value::List(Sexpr {
            items: cmd,
            quoted: false,
            lambda: false,
        }))
    }

    /// Release `set'`-bound values in reverse bind order: lambda handles
    /// leave the registry, input handles close, anything else is
    /// diagnosed.
    fn cleanup(&mut self) {
        let scoped = std::mem::take(&mut self.scoped_vars);
        for name in scoped.into_iter().rev() {
            let param = match self.vars.get(&name) {
                Some(param) => param,
                None => continue,
            };
            match &param.value {
                Value::Ident(id) => self.interp.delete_lambda(id),
                Value::Input(input) => input.close(),
                other => eprintln!(
                    "{} don't know how to clean variable {}: {:?}",
                    WARN_TAG, name, other
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::Number;

    fn test_interp() -> Arc<Interpret> {
        Interpret::new(Box::new(Vec::new()))
    }

    fn flagged_call(items: Vec<Param>) -> Param {
        Param::new(Value::List(Sexpr {
            items: items.into_iter().collect(),
            quoted: false,
            lambda: true,
        }))
    }

    #[test]
    fn lambda_flagged_lists_become_functions() {
        let interp = test_interp();
        let body = flagged_call(vec![Param::ident("+"), Param::ident("_1"), Param::int(1)]);
        let fi = FuncInterpret::new("host");
        fi.add_impl(None, vec![body], false, Type::unknown()).unwrap();

        let res = fi.eval(&interp, Vec::new()).unwrap();
        let name = match &res.value {
            Value::Ident(id) => id.clone(),
            other => panic!("expected a lambda name, found {:?}", other),
        };
        assert!(name.starts_with(LAMBDA_PREFIX));
        // The host's declared return type (unknown here) wins over the
        // lambda literal's own type.
        assert!(res.ty.is_unknown());

        let lambda = interp.lookup_func(&name).unwrap();
        let out = lambda.eval(&interp, vec![Param::int(41)]).unwrap();
        assert!(matches!(out.value, Value::Int(Number::Small(42))));
    }

    #[test]
    fn missing_pattern_binds_positionals_only() {
        let interp = test_interp();
        let body = Param::ident("__args");
        let fi = FuncInterpret::new("host");
        fi.add_impl(None, vec![body], false, Type::unknown()).unwrap();

        let out = fi
            .eval(&interp, vec![Param::int(1), Param::int(2)])
            .unwrap();
        match &out.value {
            Value::List(s) => {
                assert!(s.quoted);
                assert_eq!(s.len(), 2);
            }
            other => panic!("expected the argument tuple, found {:?}", other),
        }
    }
}
