use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::ast::{Param, Sexpr, Value};
use crate::builtins;
use crate::check::body_type;
use crate::error::AniseError;
use crate::func::{Callable, FuncInterpret, LAMBDA_PREFIX};
use crate::io_reader::CharInput;
use crate::number::Number;
use crate::reader::Reader;
use crate::types::{parse_type, Type, TypeRegistry};

/// Knobs the embedder or the CLI can set before loading a program.
#[derive(Default)]
pub struct RunOptions {
    pub trace: bool,
    pub big_int: bool,
    pub builtin_dir: Option<PathBuf>,
}

/// One interpreter instance: the function registry, the implicit
/// `__main__` body, the type relations, and the output sink. A single run
/// has exclusive access; the interior locks only serve the shared-handle
/// plumbing.
pub struct Interpret {
    output: Mutex<Box<dyn Write + Send>>,
    funcs: RwLock<HashMap<String, Callable>>,
    main_body: RwLock<Vec<Param>>,
    main: RwLock<Option<Arc<FuncInterpret>>>,
    types: TypeRegistry,
    builtin_dir: RwLock<Option<PathBuf>>,
    big_int: AtomicBool,
    trace: AtomicBool,
    lambda_count: AtomicUsize,
}

impl Interpret {
    pub fn new(output: Box<dyn Write + Send>) -> Arc<Interpret> {
        Interpret::with_options(output, RunOptions::default())
    }

    pub fn with_options(output: Box<dyn Write + Send>, options: RunOptions) -> Arc<Interpret> {
        Arc::new(Interpret {
            output: Mutex::new(output),
            funcs: RwLock::new(builtins::install()),
            main_body: RwLock::new(Vec::new()),
            main: RwLock::new(None),
            types: TypeRegistry::new(),
            builtin_dir: RwLock::new(options.builtin_dir),
            big_int: AtomicBool::new(options.big_int),
            trace: AtomicBool::new(options.trace),
            lambda_count: AtomicUsize::new(0),
        })
    }

    pub fn use_big_int(&self, on: bool) {
        self.big_int.store(on, Ordering::Relaxed);
    }

    pub fn set_trace(&self, on: bool) {
        self.trace.store(on, Ordering::Relaxed);
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace.load(Ordering::Relaxed)
    }

    pub fn set_builtin_dir(&self, dir: Option<PathBuf>) {
        *self.builtin_dir.write().unwrap() = dir;
    }

    /// Integer parsing for the reader and the `int` intrinsic; precision
    /// follows the `bigmath` switch.
    pub fn parse_int(&self, token: &str) -> Option<Number> {
        Number::parse(token, self.big_int.load(Ordering::Relaxed))
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn add_type_alias(&self, name: Type, target: Type) {
        self.types.add_alias(name, target);
    }

    pub fn add_type_parent(&self, child: impl Into<String>, parent: Type) {
        self.types.add_parent(child, parent);
    }

    pub fn lookup_func(&self, name: &str) -> Option<Callable> {
        self.funcs.read().unwrap().get(name).cloned()
    }

    pub fn register_func(&self, name: &str, callable: Callable) {
        self.funcs.write().unwrap().insert(name.to_string(), callable);
    }

    pub fn new_lambda_name(&self) -> String {
        let n = self.lambda_count.fetch_add(1, Ordering::Relaxed);
        format!("{}{:03}", LAMBDA_PREFIX, n)
    }

    /// Remove a lambda's registry entry when its owning scope ends. Names
    /// without the lambda prefix are left alone.
    pub fn delete_lambda(&self, name: &str) {
        if !name.starts_with(LAMBDA_PREFIX) {
            return;
        }
        self.funcs.write().unwrap().remove(name);
    }

    pub fn write_output(&self, text: &str) -> Result<(), AniseError> {
        let mut output = self.output.lock().unwrap();
        output
            .write_all(text.as_bytes())
            .map_err(|err| AniseError::io(format!("cannot write output: {}", err)))
    }

    /// Parse a program: `func`/`def` forms (and their memoising primed
    /// variants) go to the registry, `use` directives apply immediately,
    /// everything else is appended to the implicit `__main__` body. The
    /// builtin library is loaded after the user program, then `__main__`
    /// is assembled.
    pub fn load_program(self: &Arc<Self>, source: &str) -> Result<(), AniseError> {
        self.parse_source(source)?;
        let builtin_dir = self.builtin_dir.read().unwrap().clone();
        if let Some(dir) = builtin_dir {
            self.load_builtin(&dir)?;
        }

        let main = FuncInterpret::new("__main__");
        let argfmt = Param::new(Value::List(Sexpr::quoted_from(
            vec![Param::ident("__stdin")].into_iter().collect(),
        )));
        let body = std::mem::take(&mut *self.main_body.write().unwrap());
        main.add_impl(Some(&argfmt), body, false, Type::any())?;
        *self.main.write().unwrap() = Some(Arc::new(main));
        Ok(())
    }

    fn parse_source(self: &Arc<Self>, source: &str) -> Result<(), AniseError> {
        let mut reader = Reader::new(source, self);
        while let Some(expr) = reader.next_expr()? {
            let list = match &expr.value {
                Value::List(s) => s.clone(),
                _ => {
                    self.main_body.write().unwrap().push(expr);
                    continue;
                }
            };
            if list.quoted {
                return Err(AniseError::parse(format!(
                    "unexpected quoted s-expression at top level: {}",
                    expr
                )));
            }
            if list.items.is_empty() {
                return Err(AniseError::parse(
                    "unexpected empty s-expression at top level",
                ));
            }
            if let Value::Ident(name) = &list.items[0].value {
                let items: Vec<Param> = list.items.iter().skip(1).cloned().collect();
                match name.as_str() {
                    "func" | "def" => {
                        self.define_func(&items, false)?;
                        continue;
                    }
                    "func'" | "def'" => {
                        self.define_func(&items, true)?;
                        continue;
                    }
                    "use" => {
                        self.use_directive(&items)?;
                        continue;
                    }
                    _ => {}
                }
            }
            self.main_body.write().unwrap().push(expr);
        }
        Ok(())
    }

    fn load_builtin(self: &Arc<Self>, dir: &Path) -> Result<(), AniseError> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|err| AniseError::io(format!("error while loading builtins: {}", err)))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().map(|ext| ext == "lisp").unwrap_or(false))
            .collect();
        if files.is_empty() {
            return Err(AniseError::io(format!(
                "builtin source files not found in {}",
                dir.display()
            )));
        }
        files.sort();
        for file in files {
            let source = fs::read_to_string(&file).map_err(|err| {
                AniseError::io(format!("error while loading {}: {}", file.display(), err))
            })?;
            self.parse_source(&source).map_err(|err| {
                AniseError::parse(format!("error while loading {}: {}", file.display(), err))
            })?;
        }
        Ok(())
    }

    /// `(name argfmt [:retType] body...)` after the `func`/`def` head.
    fn define_func(&self, items: &[Param], memo: bool) -> Result<(), AniseError> {
        if items.len() < 3 {
            return Err(AniseError::arity(format!(
                "not enough arguments for function definition: {:?}",
                items
            )));
        }
        let name = match &items[0].value {
            Value::Ident(id) => id.clone(),
            other => {
                return Err(AniseError::type_err(format!(
                    "func expects an identifier first, found {:?}",
                    other
                )))
            }
        };

        let fi = match self.lookup_func(&name) {
            Some(Callable::User(fi)) => fi,
            Some(Callable::Native(_)) => {
                return Err(AniseError::name(format!(
                    "cannot redefine builtin function {}",
                    name
                )))
            }
            None => {
                let fi = Arc::new(FuncInterpret::new(name.clone()));
                self.register_func(&name, Callable::User(fi.clone()));
                fi
            }
        };

        let mut body_index = 2;
        let mut return_type = Type::any();
        if let Value::Ident(id) = &items[2].value {
            if let Some(ty) = parse_type(id) {
                return_type = ty;
                body_index = 3;
            }
        }
        if items.len() <= body_index {
            return Err(AniseError::arity(format!("function {} has no body", name)));
        }
        fi.add_impl(
            Some(&items[1]),
            items[body_index..].to_vec(),
            memo,
            return_type,
        )
    }

    /// `(use "path")` parses another file in place; `(use bigmath)`
    /// switches integer parsing for the rest of the stream.
    fn use_directive(self: &Arc<Self>, args: &[Param]) -> Result<(), AniseError> {
        if args.len() != 1 {
            return Err(AniseError::arity(format!(
                "'use' expected one argument, found {:?}",
                args
            )));
        }
        match &args[0].value {
            Value::Str(path) => {
                let source = fs::read_to_string(path)
                    .map_err(|err| AniseError::io(format!("use: cannot read {}: {}", path, err)))?;
                self.parse_source(&source)
            }
            Value::Ident(id) if id == "bigmath" => {
                self.use_big_int(true);
                Ok(())
            }
            Value::Ident(other) => Err(AniseError::name(format!(
                "unknown use directive: {}",
                other
            ))),
            other => Err(AniseError::type_err(format!(
                "unexpected argument to 'use': {:?}",
                other
            ))),
        }
    }

    /// Verify that every body of every user function with a declared
    /// return type actually yields it, given the pattern's declared
    /// argument types.
    pub fn check(self: &Arc<Self>) -> Result<(), AniseError> {
        let mut entries: Vec<(String, Arc<FuncInterpret>)> = self
            .funcs
            .read()
            .unwrap()
            .iter()
            .filter_map(|(name, callable)| match callable {
                Callable::User(fi) => Some((name.clone(), fi.clone())),
                Callable::Native(_) => None,
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        for (name, fi) in entries {
            let return_type = fi.return_type();
            if return_type.is_any() || return_type.is_unknown() {
                continue;
            }
            for imp in fi.impls_snapshot() {
                let vars = imp
                    .argfmt
                    .as_ref()
                    .map(|argfmt| argfmt.values())
                    .unwrap_or_default();
                let inferred = body_type(self, &name, &imp.body, vars)?;
                if inferred != return_type {
                    return Err(AniseError::type_err(format!(
                        "incorrect return value in function {}{}: expected {} actual {}",
                        name,
                        imp.argfmt
                            .as_ref()
                            .map(|a| format!("{}", a))
                            .unwrap_or_default(),
                        return_type,
                        inferred
                    )));
                }
            }
        }
        Ok(())
    }

    /// Invoke `__main__` with the process standard input as a lazy
    /// character list.
    pub fn run(self: &Arc<Self>) -> Result<Param, AniseError> {
        self.run_with_input(std::io::stdin())
    }

    pub fn run_with_input<R>(self: &Arc<Self>, input: R) -> Result<Param, AniseError>
    where
        R: Read + Send + 'static,
    {
        let main = self
            .main
            .read()
            .unwrap()
            .clone()
            .ok_or_else(|| AniseError::internal("program is not loaded"))?;
        let stdin = Param::typed(Value::Input(CharInput::new(input)), Type::list());
        let result = main.eval(self, vec![stdin]);
        if let Ok(result) = &result {
            // The value of the last top-level expression is echoed, unless
            // the program ended in an effect (an empty-list result).
            let silent =
                result.value.is_container() && result.value.is_empty().unwrap_or(true);
            if !silent {
                let mut out = String::new();
                result.value.print_to(&mut out)?;
                out.push('\n');
                self.write_output(&out)?;
            }
        }
        let _ = self.output.lock().unwrap().flush();
        result
    }

    /// Dump the function registry to stderr.
    pub fn stat(&self) {
        let mut names: Vec<String> = self.funcs.read().unwrap().keys().cloned().collect();
        names.sort();
        eprintln!("Functions:");
        for name in names {
            eprintln!("{}", name);
        }
    }
}

/// An output sink tests can share with the interpreter and read back.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
