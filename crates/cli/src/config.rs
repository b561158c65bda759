//! Main configuration: typed options shared with the argument parser.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context as _, Result, anyhow};
use dnf5_argparse::option::{
    self, ConfigOption, OptionBool, OptionNumber, OptionString, Priority, SharedOption,
};
use indexmap::IndexMap;

/// Global options. Cloning shares the underlying values.
#[derive(Debug, Clone)]
pub struct ConfigMain {
    pub assumeyes: Rc<RefCell<OptionBool>>,
    pub assumeno: Rc<RefCell<OptionBool>>,
    pub best: Rc<RefCell<OptionBool>>,
    pub refresh: Rc<RefCell<OptionBool>>,
    pub installroot: Rc<RefCell<OptionString>>,
    pub debuglevel: Rc<RefCell<OptionNumber>>,
}

impl Default for ConfigMain {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigMain {
    pub fn new() -> Self {
        Self {
            assumeyes: option::shared(OptionBool::new(false)),
            assumeno: option::shared(OptionBool::new(false)),
            best: option::shared(OptionBool::new(false)),
            refresh: option::shared(OptionBool::new(false)),
            installroot: option::shared(OptionString::new("/")),
            debuglevel: option::shared(OptionNumber::with_range(2, 0, 10)),
        }
    }

    /// Options addressable by name from `--setopt`.
    pub fn opt_binds(&self) -> IndexMap<&'static str, SharedOption> {
        let mut binds: IndexMap<&'static str, SharedOption> = IndexMap::new();
        binds.insert("assumeyes", self.assumeyes.clone());
        binds.insert("assumeno", self.assumeno.clone());
        binds.insert("best", self.best.clone());
        binds.insert("installroot", self.installroot.clone());
        binds.insert("debuglevel", self.debuglevel.clone());
        binds
    }

    /// Set a global option by name.
    pub fn set_option(&self, key: &str, value: &str, priority: Priority) -> Result<()> {
        let binds = self.opt_binds();
        let option = binds
            .get(key)
            .ok_or_else(|| anyhow!("unknown configuration option \"{key}\""))?;
        option
            .borrow_mut()
            .set_from_str(priority, value)
            .with_context(|| format!("invalid value for option \"{key}\""))
    }

    pub fn assumeyes(&self) -> bool {
        self.assumeyes.borrow().value()
    }

    pub fn assumeno(&self) -> bool {
        self.assumeno.borrow().value()
    }

    pub fn best(&self) -> bool {
        self.best.borrow().value()
    }

    pub fn refresh(&self) -> bool {
        self.refresh.borrow().value()
    }

    pub fn installroot(&self) -> String {
        self.installroot.borrow().value().to_string()
    }

    pub fn debuglevel(&self) -> i64 {
        self.debuglevel.borrow().value()
    }
}

/// Split a `--setopt` value into key and value. The key may not be empty.
pub fn split_setopt(input: &str) -> Option<(&str, &str)> {
    let first = input.chars().next()?.len_utf8();
    let eq = input[first..].find('=')? + first;
    Some((&input[..eq], &input[eq + 1..]))
}
