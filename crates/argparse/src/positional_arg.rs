use std::fmt;
use std::rc::Rc;

use crate::argument::{Argument, ArgumentBase, ArgumentKind};
use crate::error::{Error, Result};
use crate::option::{SharedOption, SharedValues};
use crate::parser::ArgumentParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionalArgId(pub(crate) usize);

/// Number of tokens (`nvals`) or repetitions (`nrepeats`) of a positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgCount {
    Exactly(usize),
    /// Zero or one.
    Optional,
    /// Any number, greedy.
    Unlimited,
    /// One or more, greedy.
    AtLeastOne,
}

impl ArgCount {
    /// `Exactly(0)` means the same as `Optional`.
    pub(crate) fn normalized(self) -> Self {
        match self {
            Self::Exactly(0) => Self::Optional,
            other => other,
        }
    }

    /// Tokens one occurrence consumes when `usable` non-dash tokens are available.
    pub(crate) fn tokens(self, usable: usize) -> usize {
        match self {
            Self::Exactly(n) if n > 0 => n,
            Self::Exactly(_) | Self::Optional => 1,
            Self::Unlimited | Self::AtLeastOne => usable,
        }
    }
}

/// Called after a positional argument was parsed with the tokens it consumed.
pub type PositionalArgParseHook =
    Rc<dyn Fn(&ArgumentParser, PositionalArgId, &[String]) -> Result<()>>;

/// Produces completion candidates for the word being completed.
pub type CompleteHook = Rc<dyn Fn(&str) -> Vec<String>>;

/// Bare values such as package specs.
pub struct PositionalArg {
    base: ArgumentBase,
    pub(crate) nvals: ArgCount,
    pub(crate) nrepeats: ArgCount,
    pub(crate) init_value: Option<SharedOption>,
    pub(crate) values: Option<SharedValues>,
    pub(crate) store_value: bool,
    pub(crate) parse_hook: Option<PositionalArgParseHook>,
    pub(crate) complete_hook: Option<CompleteHook>,
}

impl PositionalArg {
    /// Storage list filled in place; `nvals` equals its length.
    pub(crate) fn with_values(id: &str, values: SharedValues) -> Result<Self> {
        let nvals = values.borrow().len();
        if nvals == 0 {
            return Err(Error::InvalidPositionalArgument {
                argument: id.to_string(),
                reason: "the value list is empty",
            });
        }
        Ok(Self {
            base: ArgumentBase::new(id)?,
            nvals: ArgCount::Exactly(nvals),
            nrepeats: ArgCount::Exactly(1),
            init_value: None,
            values: Some(values),
            store_value: true,
            parse_hook: None,
            complete_hook: None,
        })
    }

    /// Storage list grown on demand by cloning `init_value`.
    pub(crate) fn with_init_value(
        id: &str,
        nvals: ArgCount,
        init_value: Option<SharedOption>,
        values: Option<SharedValues>,
    ) -> Result<Self> {
        if values.is_some() && init_value.is_none() {
            return Err(Error::InvalidPositionalArgument {
                argument: id.to_string(),
                reason: "a value list requires an init value",
            });
        }
        let store_value = values.is_some();
        Ok(Self {
            base: ArgumentBase::new(id)?,
            nvals: nvals.normalized(),
            nrepeats: ArgCount::Exactly(1),
            init_value,
            values,
            store_value,
            parse_hook: None,
            complete_hook: None,
        })
    }

    pub fn nvals(&self) -> ArgCount {
        self.nvals
    }

    pub fn nrepeats(&self) -> ArgCount {
        self.nrepeats
    }

    /// How many times the argument may occur before the next positional is tried.
    pub fn set_nrepeats(&mut self, nrepeats: ArgCount) {
        self.nrepeats = nrepeats.normalized();
    }

    pub fn values(&self) -> Option<&SharedValues> {
        self.values.as_ref()
    }

    pub fn store_value(&self) -> bool {
        self.store_value
    }

    pub fn set_store_value(&mut self, store_value: bool) -> Result<()> {
        if store_value && self.values.is_none() {
            return Err(Error::InvalidPositionalArgument {
                argument: self.id().to_string(),
                reason: "storing values requires a value list",
            });
        }
        self.store_value = store_value;
        Ok(())
    }

    pub fn set_parse_hook_func<F>(&mut self, hook: F)
    where
        F: Fn(&ArgumentParser, PositionalArgId, &[String]) -> Result<()> + 'static,
    {
        self.parse_hook = Some(Rc::new(hook));
    }

    pub fn set_complete_hook_func<F>(&mut self, hook: F)
    where
        F: Fn(&str) -> Vec<String> + 'static,
    {
        self.complete_hook = Some(Rc::new(hook));
    }

    /// Whether the argument must appear at least once.
    pub(crate) fn is_required(&self) -> bool {
        let repeats_required = matches!(self.nrepeats, ArgCount::Exactly(_) | ArgCount::AtLeastOne);
        let vals_required = !matches!(self.nvals, ArgCount::Unlimited | ArgCount::Optional);
        repeats_required && vals_required
    }

    /// Whether the scan should move on to the next positional argument.
    pub(crate) fn is_exhausted(&self) -> bool {
        match self.nrepeats {
            ArgCount::Exactly(n) => self.base.parse_count >= n,
            ArgCount::Optional => true,
            ArgCount::Unlimited | ArgCount::AtLeastOne => false,
        }
    }
}

impl Argument for PositionalArg {
    fn base(&self) -> &ArgumentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ArgumentBase {
        &mut self.base
    }

    fn kind(&self) -> ArgumentKind {
        ArgumentKind::Positional
    }
}

impl fmt::Debug for PositionalArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionalArg")
            .field("base", &self.base)
            .field("nvals", &self.nvals)
            .field("nrepeats", &self.nrepeats)
            .field("store_value", &self.store_value)
            .finish_non_exhaustive()
    }
}
