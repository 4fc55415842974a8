use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::error::AniseError;

/// A type key: `:int`, `:list`, parameterised forms like `:list[:int]`, or a
/// single uppercase letter for a generic. The empty key is the pre-inference
/// placeholder.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Type(Arc<str>);

impl Type {
    pub fn int() -> Type {
        Type::from(":int")
    }

    pub fn str_() -> Type {
        Type::from(":str")
    }

    pub fn bool_() -> Type {
        Type::from(":bool")
    }

    pub fn list() -> Type {
        Type::from(":list")
    }

    pub fn func() -> Type {
        Type::from(":func")
    }

    pub fn any() -> Type {
        Type::from(":any")
    }

    pub fn unknown() -> Type {
        Type::from("")
    }

    pub fn is_unknown(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_any(&self) -> bool {
        self.0.as_ref() == ":any"
    }

    /// The key with any bracketed parameter list stripped.
    pub fn basic(&self) -> &str {
        match self.0.find('[') {
            Some(idx) => &self.0[..idx],
            None => &self.0,
        }
    }

    /// Generics are a single uppercase ASCII letter.
    pub fn is_generic(&self) -> bool {
        let basic = self.basic();
        basic.len() == 1 && basic.as_bytes()[0].is_ascii_uppercase()
    }

    /// Parameter list from the bracketed suffix, split on top-level commas.
    /// `:list[:int]` yields `[:int]`; `:map[:str,:list[:int]]` yields two.
    pub fn arguments(&self) -> Vec<Type> {
        let open = match self.0.find('[') {
            Some(idx) => idx,
            None => return Vec::new(),
        };
        let suffix = &self.0[open + 1..];
        let inner = suffix.strip_suffix(']').unwrap_or(suffix);
        let mut args = Vec::new();
        let mut depth = 0usize;
        let mut start = 0usize;
        for (i, ch) in inner.char_indices() {
            match ch {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    args.push(Type::from(inner[start..i].trim()));
                    start = i + 1;
                }
                _ => {}
            }
        }
        let rest = inner[start..].trim();
        if !rest.is_empty() {
            args.push(Type::from(rest));
        }
        args
    }
}

impl From<&str> for Type {
    fn from(s: &str) -> Self {
        Type(Arc::from(s))
    }
}

impl From<String> for Type {
    fn from(s: String) -> Self {
        Type(Arc::from(s.as_str()))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, ":unknown")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Recognise a type token: a colon-prefixed name (optionally parameterised)
/// or a bare uppercase letter.
pub fn parse_type(token: &str) -> Option<Type> {
    if token.len() == 1 && token.as_bytes()[0].is_ascii_uppercase() {
        return Some(Type::from(token));
    }
    if !token.starts_with(':') || token.len() < 2 {
        return None;
    }
    let mut depth = 0i32;
    for ch in token.chars() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    Some(Type::from(token))
}

/// Generic-letter bindings collected while matching one argument tuple.
pub type TypeBindings = HashMap<String, Type>;

/// Aliases and parent links between type keys. Owned by the interpreter;
/// the builtin library installs entries before user code runs.
#[derive(Default)]
pub struct TypeRegistry {
    aliases: RwLock<HashMap<Type, Type>>,
    parents: RwLock<HashMap<String, Type>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_alias(&self, name: Type, target: Type) {
        self.aliases.write().unwrap().insert(name, target);
    }

    /// Register `parent` as the immediate parent of every type whose basic
    /// key is `child`.
    pub fn add_parent(&self, child: impl Into<String>, parent: Type) {
        self.parents.write().unwrap().insert(child.into(), parent);
    }

    /// One-level alias follow.
    pub fn resolve_alias(&self, t: &Type) -> Type {
        self.aliases
            .read()
            .unwrap()
            .get(t)
            .cloned()
            .unwrap_or_else(|| t.clone())
    }

    fn alias_eq(&self, a: &Type, b: &Type) -> bool {
        let aliases = self.aliases.read().unwrap();
        aliases.get(a) == Some(b) || aliases.get(b) == Some(a)
    }

    /// Walk the parent chain of `val` until a type whose basic key equals
    /// `base`. Absence is an error.
    pub fn to_parent(&self, val: &Type, base: &str) -> Result<Type, AniseError> {
        let mut cur = val.clone();
        loop {
            if cur.basic() == base {
                return Ok(cur);
            }
            let next = self.parents.read().unwrap().get(cur.basic()).cloned();
            match next {
                Some(parent) => cur = parent,
                None => {
                    return Err(AniseError::type_err(format!(
                        "cannot convert type {} into {}",
                        val, base
                    )))
                }
            }
        }
    }

    /// True when a value of type `src` is acceptable where `dst` is declared.
    pub fn can_convert(&self, src: &Type, dst: &Type) -> Result<bool, AniseError> {
        if src == dst || dst.is_any() || src.is_unknown() || dst.is_unknown() {
            return Ok(true);
        }
        match self.to_parent(src, dst.basic()) {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    /// Match a declared type against an actual one, recording generic
    /// bindings. An inconsistent re-bind rejects the match.
    pub fn match_type(
        &self,
        decl: &Type,
        actual: &Type,
        binds: &mut TypeBindings,
    ) -> Result<bool, AniseError> {
        let decl = self.resolve_alias(decl);
        let actual = self.resolve_alias(actual);

        if decl.is_generic() {
            if let Some(bound) = binds.get(decl.basic()) {
                if bound != &actual {
                    return Ok(false);
                }
            }
            binds.insert(decl.basic().to_string(), actual);
            return Ok(true);
        }
        if decl.is_unknown() || actual.is_unknown() {
            return Ok(true);
        }
        // :any accepts anything without binding.
        if decl.is_any() {
            return Ok(true);
        }
        if self.alias_eq(&decl, &actual) {
            return Ok(true);
        }

        let parent = match self.to_parent(&actual, decl.basic()) {
            Ok(parent) => parent,
            Err(_) => return Ok(false),
        };
        let decl_args = decl.arguments();
        let parent_args = parent.arguments();
        if decl_args.len() != parent_args.len() {
            return Ok(false);
        }
        for (d, p) in decl_args.iter().zip(parent_args.iter()) {
            if !self.match_type(d, p, binds)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
