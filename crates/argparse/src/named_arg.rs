use std::fmt;
use std::rc::Rc;

use crate::argument::{Argument, ArgumentBase, ArgumentKind};
use crate::error::Result;
use crate::option::SharedOption;
use crate::parser::ArgumentParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamedArgId(pub(crate) usize);

/// Called after a named argument was parsed with `(parser, arg, option, value)`.
///
/// `option` is the matched text without leading dashes (for example `setopt=a=b`
/// or `y`), `value` is the effective value (the const value for flags).
pub type NamedArgParseHook = Rc<dyn Fn(&ArgumentParser, NamedArgId, &str, &str) -> Result<()>>;

/// A named argument parsed automatically after its owner.
///
/// `value` is a template; every `${}` in it is replaced by the owner's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedNamedArg {
    pub id_path: String,
    pub value: String,
}

/// Option such as `--installroot=/mnt` or `-y`.
pub struct NamedArg {
    base: ArgumentBase,
    pub(crate) long_name: String,
    pub(crate) short_name: Option<char>,
    pub(crate) has_value: bool,
    pub(crate) const_value: String,
    pub(crate) value: Option<SharedOption>,
    pub(crate) store_value: bool,
    pub(crate) parse_hook: Option<NamedArgParseHook>,
    pub(crate) arg_value_help: String,
    pub(crate) attached_named_args: Vec<AttachedNamedArg>,
}

impl NamedArg {
    pub(crate) fn new(id: &str) -> Result<Self> {
        Ok(Self {
            base: ArgumentBase::new(id)?,
            long_name: String::new(),
            short_name: None,
            has_value: false,
            const_value: String::new(),
            value: None,
            store_value: true,
            parse_hook: None,
            arg_value_help: String::new(),
            attached_named_args: Vec::new(),
        })
    }

    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    /// Set the long form, given without the leading `--`.
    pub fn set_long_name(&mut self, long_name: &str) {
        self.long_name = long_name.to_string();
    }

    pub fn short_name(&self) -> Option<char> {
        self.short_name
    }

    pub fn set_short_name(&mut self, short_name: char) {
        self.short_name = Some(short_name);
    }

    pub fn has_value(&self) -> bool {
        self.has_value
    }

    pub fn set_has_value(&mut self, has_value: bool) {
        self.has_value = has_value;
    }

    pub fn const_value(&self) -> &str {
        &self.const_value
    }

    /// Value stored for a flag that takes no value (`"true"` for a switch).
    pub fn set_const_value(&mut self, const_value: &str) {
        self.const_value = const_value.to_string();
    }

    pub fn linked_value(&self) -> Option<&SharedOption> {
        self.value.as_ref()
    }

    /// Parsed values are written into `value` at command-line priority.
    pub fn link_value(&mut self, value: SharedOption) {
        self.value = Some(value);
    }

    pub fn store_value(&self) -> bool {
        self.store_value
    }

    pub fn set_store_value(&mut self, store_value: bool) {
        self.store_value = store_value;
    }

    pub fn arg_value_help(&self) -> &str {
        &self.arg_value_help
    }

    pub fn set_arg_value_help(&mut self, text: &str) {
        self.arg_value_help = text.to_string();
    }

    pub fn parse_hook(&self) -> Option<&NamedArgParseHook> {
        self.parse_hook.as_ref()
    }

    pub fn set_parse_hook_func<F>(&mut self, hook: F)
    where
        F: Fn(&ArgumentParser, NamedArgId, &str, &str) -> Result<()> + 'static,
    {
        self.parse_hook = Some(Rc::new(hook));
    }

    pub(crate) fn set_parse_hook(&mut self, hook: Option<NamedArgParseHook>) {
        self.parse_hook = hook;
    }

    pub fn attached_named_args(&self) -> &[AttachedNamedArg] {
        &self.attached_named_args
    }

    /// Parse the named argument at `id_path` whenever this one is parsed.
    pub fn attach_named_arg(&mut self, id_path: &str, value: &str) {
        self.attached_named_args.push(AttachedNamedArg {
            id_path: id_path.to_string(),
            value: value.to_string(),
        });
    }

    /// Names as shown in conflict messages, e.g. `--assumeyes/-y`.
    pub fn display_names(&self) -> String {
        let mut names = String::new();
        if !self.long_name.is_empty() {
            names.push_str("--");
            names.push_str(&self.long_name);
        }
        if let Some(short) = self.short_name {
            if !names.is_empty() {
                names.push('/');
            }
            names.push('-');
            names.push(short);
        }
        names
    }

    /// Placeholder shown for the value in help and completion output.
    pub(crate) fn value_placeholder(&self) -> &str {
        if self.arg_value_help.is_empty() {
            "VALUE"
        } else {
            &self.arg_value_help
        }
    }
}

impl Argument for NamedArg {
    fn base(&self) -> &ArgumentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ArgumentBase {
        &mut self.base
    }

    fn kind(&self) -> ArgumentKind {
        ArgumentKind::Named
    }
}

impl fmt::Debug for NamedArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedArg")
            .field("base", &self.base)
            .field("long_name", &self.long_name)
            .field("short_name", &self.short_name)
            .field("has_value", &self.has_value)
            .field("attached_named_args", &self.attached_named_args)
            .finish_non_exhaustive()
    }
}
