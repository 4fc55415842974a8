use std::sync::{Arc, Mutex, Weak};

use crate::ast::{Param, Value};
use crate::error::AniseError;
use crate::func::Callable;
use crate::runtime::Interpret;

/// A generator-backed sequence node. The stepper is invoked at most once
/// per node; `tail` shares the stepper and carries the successor state.
/// Cloning a `LazyList` shares the node and its cached step.
#[derive(Clone)]
pub struct LazyList {
    node: Arc<LazyNode>,
    hashable: bool,
}

struct LazyNode {
    stepper: Callable,
    interp: Weak<Interpret>,
    state: Vec<Param>,
    step: Mutex<Option<StepOutcome>>,
}

#[derive(Clone)]
enum StepOutcome {
    Done,
    Yield(Param, Param),
}

impl LazyList {
    pub fn new(
        stepper: Callable,
        state: Vec<Param>,
        hashable: bool,
        interp: Weak<Interpret>,
    ) -> LazyList {
        LazyList {
            node: Arc::new(LazyNode {
                stepper,
                interp,
                state,
                step: Mutex::new(None),
            }),
            hashable,
        }
    }

    pub fn is_hashable(&self) -> bool {
        self.hashable
    }

    /// Run the stepper for this node (once) and validate the result shape:
    /// an empty quoted list ends the sequence, a two-element quoted list
    /// carries `(value next-state)`.
    fn force(&self) -> Result<StepOutcome, AniseError> {
        if let Some(out) = self.node.step.lock().unwrap().as_ref() {
            return Ok(out.clone());
        }
        let interp = self
            .node
            .interp
            .upgrade()
            .ok_or_else(|| AniseError::internal("interpreter is gone while forcing a sequence"))?;
        let res = self.node.stepper.eval(&interp, self.node.state.clone())?;
        let out = match &res.value {
            Value::List(s) if s.quoted || s.is_empty() => match s.len() {
                0 => StepOutcome::Done,
                2 => StepOutcome::Yield(s.items[0].clone(), s.items[1].clone()),
                n => {
                    return Err(AniseError::structural(format!(
                        "stepper must yield an empty list or a (value next-state) pair, found {} elements",
                        n
                    )))
                }
            },
            other => {
                return Err(AniseError::structural(format!(
                    "stepper must yield a quoted list, found {:?}",
                    other
                )))
            }
        };
        *self.node.step.lock().unwrap() = Some(out.clone());
        Ok(out)
    }

    pub fn head(&self) -> Result<Param, AniseError> {
        match self.force()? {
            StepOutcome::Yield(value, _) => Ok(value),
            StepOutcome::Done => Err(AniseError::structural(
                "cannot perform head on empty sequence",
            )),
        }
    }

    pub fn head_opt(&self) -> Result<Option<Param>, AniseError> {
        match self.force()? {
            StepOutcome::Yield(value, _) => Ok(Some(value)),
            StepOutcome::Done => Ok(None),
        }
    }

    pub fn tail(&self) -> Result<LazyList, AniseError> {
        match self.force()? {
            StepOutcome::Yield(_, next) => Ok(LazyList {
                node: Arc::new(LazyNode {
                    stepper: self.node.stepper.clone(),
                    interp: self.node.interp.clone(),
                    state: vec![next],
                    step: Mutex::new(None),
                }),
                hashable: self.hashable,
            }),
            StepOutcome::Done => Err(AniseError::structural(
                "cannot perform tail on empty sequence",
            )),
        }
    }

    pub fn is_empty(&self) -> Result<bool, AniseError> {
        Ok(matches!(self.force()?, StepOutcome::Done))
    }

    /// Hash like a quoted list of the materialised elements. Only defined
    /// when the sequence was created hashable.
    pub fn hash_key(&self) -> Result<String, AniseError> {
        if !self.hashable {
            return Err(AniseError::internal(
                "hash is not defined for this lazy list",
            ));
        }
        let mut out = String::from("{S':");
        let mut cur = self.clone();
        while let Some(head) = cur.head_opt()? {
            out.push(' ');
            out.push_str(&head.value.hash_key()?);
            cur = cur.tail()?;
        }
        out.push('}');
        Ok(out)
    }

    /// The materialised print form, used as the sequence's debug form too.
    pub fn materialised_print(&self) -> Result<String, AniseError> {
        let mut out = String::from("'(");
        let mut cur = self.clone();
        let mut first = true;
        while let Some(head) = cur.head_opt()? {
            if !first {
                out.push(' ');
            }
            first = false;
            head.value.print_to(&mut out)?;
            cur = cur.tail()?;
        }
        out.push(')');
        Ok(out)
    }
}
