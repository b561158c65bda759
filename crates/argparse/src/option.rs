//! Typed option values the parser writes into.
//!
//! Every option remembers the [`Priority`] of its last assignment. A write with a
//! lower priority than the current one is ignored, so command-line values win over
//! configuration defaults no matter in which order the sources are applied.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

/// Source of an option value, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    #[default]
    Empty = 0,
    Default = 10,
    MainConfig = 20,
    AutomaticConfig = 30,
    RepoConfig = 40,
    PluginDefault = 50,
    PluginConfig = 60,
    DropInConfig = 65,
    CommandLine = 70,
    Runtime = 80,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("invalid boolean value \"{0}\"")]
    InvalidBool(String),
    #[error("invalid number \"{0}\"")]
    InvalidNumber(String),
    #[error("number {value} is out of range [{min}, {max}]")]
    OutOfRange { value: i64, min: i64, max: i64 },
    #[error("\"{value}\" is not one of: {allowed}")]
    NotAllowed { value: String, allowed: String },
}

/// Type-erased view of an option used by the parser.
pub trait ConfigOption: Any + fmt::Debug {
    fn priority(&self) -> Priority;

    /// Convert `input` and store it, unless `priority` is below the current one.
    fn set_from_str(&mut self, priority: Priority, input: &str) -> Result<(), OptionError>;

    /// The current value rendered back to text.
    fn value_string(&self) -> String;

    fn clone_box(&self) -> Box<dyn ConfigOption>;

    fn as_any(&self) -> &dyn Any;
}

impl dyn ConfigOption {
    pub fn downcast_ref<T: ConfigOption>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Option shared between the host and the parser.
pub type SharedOption = Rc<RefCell<dyn ConfigOption>>;

/// Growable list of options filled by a positional argument.
pub type OptionList = Vec<Box<dyn ConfigOption>>;
pub type SharedValues = Rc<RefCell<OptionList>>;

/// Wrap an option so it can be linked to an argument while the caller keeps typed access.
pub fn shared<T: ConfigOption>(option: T) -> Rc<RefCell<T>> {
    Rc::new(RefCell::new(option))
}

/// Read back a typed value out of a positional storage list.
pub fn values_as<T: ConfigOption, R>(values: &SharedValues, read: impl Fn(&T) -> R) -> Vec<R> {
    values
        .borrow()
        .iter()
        .filter_map(|value| value.downcast_ref::<T>().map(&read))
        .collect()
}

macro_rules! config_option_impl {
    ($ty:ty) => {
        impl ConfigOption for $ty {
            fn priority(&self) -> Priority {
                self.priority
            }

            fn set_from_str(&mut self, priority: Priority, input: &str) -> Result<(), OptionError> {
                let value = self.from_str(input)?;
                self.set(priority, value);
                Ok(())
            }

            fn value_string(&self) -> String {
                self.to_string(&self.value)
            }

            fn clone_box(&self) -> Box<dyn ConfigOption> {
                Box::new(self.clone())
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionBool {
    default: bool,
    value: bool,
    priority: Priority,
}

impl OptionBool {
    const TRUE_NAMES: [&'static str; 4] = ["1", "yes", "true", "on"];
    const FALSE_NAMES: [&'static str; 4] = ["0", "no", "false", "off"];

    pub fn new(default: bool) -> Self {
        Self {
            default,
            value: default,
            priority: Priority::Default,
        }
    }

    pub fn value(&self) -> bool {
        self.value
    }

    pub fn default_value(&self) -> bool {
        self.default
    }

    pub fn set(&mut self, priority: Priority, value: bool) {
        if priority >= self.priority {
            self.value = value;
            self.priority = priority;
        }
    }

    pub fn from_str(&self, input: &str) -> Result<bool, OptionError> {
        let lower = input.to_ascii_lowercase();
        if Self::TRUE_NAMES.contains(&lower.as_str()) {
            Ok(true)
        } else if Self::FALSE_NAMES.contains(&lower.as_str()) {
            Ok(false)
        } else {
            Err(OptionError::InvalidBool(input.to_string()))
        }
    }

    pub fn to_string(&self, value: &bool) -> String {
        if *value { "1" } else { "0" }.to_string()
    }
}

config_option_impl!(OptionBool);

#[derive(Debug, Clone, PartialEq)]
pub struct OptionString {
    value: String,
    priority: Priority,
}

impl OptionString {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            value: default.into(),
            priority: Priority::Default,
        }
    }

    /// An option with no default; its priority stays `Empty` until set.
    pub fn empty() -> Self {
        Self {
            value: String::new(),
            priority: Priority::Empty,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set(&mut self, priority: Priority, value: String) {
        if priority >= self.priority {
            self.value = value;
            self.priority = priority;
        }
    }

    pub fn from_str(&self, input: &str) -> Result<String, OptionError> {
        Ok(input.to_string())
    }

    pub fn to_string(&self, value: &str) -> String {
        value.to_string()
    }
}

config_option_impl!(OptionString);

/// A string restricted to a fixed set of allowed values.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionEnum {
    value: String,
    allowed: Vec<String>,
    priority: Priority,
}

impl OptionEnum {
    pub fn new<I, S>(default: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            value: default.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
            priority: Priority::Default,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn set(&mut self, priority: Priority, value: String) {
        if priority >= self.priority {
            self.value = value;
            self.priority = priority;
        }
    }

    pub fn from_str(&self, input: &str) -> Result<String, OptionError> {
        if self.allowed.iter().any(|allowed| allowed == input) {
            Ok(input.to_string())
        } else {
            Err(OptionError::NotAllowed {
                value: input.to_string(),
                allowed: self.allowed.join(", "),
            })
        }
    }

    pub fn to_string(&self, value: &str) -> String {
        value.to_string()
    }
}

config_option_impl!(OptionEnum);

#[derive(Debug, Clone, PartialEq)]
pub struct OptionNumber {
    value: i64,
    min: i64,
    max: i64,
    priority: Priority,
}

impl OptionNumber {
    pub fn new(default: i64) -> Self {
        Self::with_range(default, i64::MIN, i64::MAX)
    }

    pub fn with_range(default: i64, min: i64, max: i64) -> Self {
        Self {
            value: default,
            min,
            max,
            priority: Priority::Default,
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn set(&mut self, priority: Priority, value: i64) {
        if priority >= self.priority {
            self.value = value;
            self.priority = priority;
        }
    }

    pub fn from_str(&self, input: &str) -> Result<i64, OptionError> {
        let value: i64 = input
            .trim()
            .parse()
            .map_err(|_| OptionError::InvalidNumber(input.to_string()))?;
        if value < self.min || value > self.max {
            return Err(OptionError::OutOfRange {
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(value)
    }

    pub fn to_string(&self, value: &i64) -> String {
        value.to_string()
    }
}

config_option_impl!(OptionNumber);

/// List of strings; one assignment replaces the whole list.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionStringList {
    value: Vec<String>,
    priority: Priority,
}

impl OptionStringList {
    pub fn new<I, S>(default: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            value: default.into_iter().map(Into::into).collect(),
            priority: Priority::Default,
        }
    }

    pub fn value(&self) -> &[String] {
        &self.value
    }

    pub fn set(&mut self, priority: Priority, value: Vec<String>) {
        if priority >= self.priority {
            self.value = value;
            self.priority = priority;
        }
    }

    pub fn from_str(&self, input: &str) -> Result<Vec<String>, OptionError> {
        Ok(input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn to_string(&self, value: &[String]) -> String {
        value.join(", ")
    }
}

config_option_impl!(OptionStringList);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_priority_writes_are_ignored() {
        let mut opt = OptionBool::new(false);
        opt.set(Priority::CommandLine, true);
        opt.set(Priority::MainConfig, false);
        assert!(opt.value());
        assert_eq!(opt.priority(), Priority::CommandLine);

        opt.set_from_str(Priority::CommandLine, "off").unwrap();
        assert!(!opt.value());
    }

    #[test]
    fn bool_accepts_common_spellings() {
        let opt = OptionBool::new(false);
        for input in ["1", "YES", "True", "on"] {
            assert_eq!(opt.from_str(input), Ok(true), "{input}");
        }
        for input in ["0", "no", "FALSE", "Off"] {
            assert_eq!(opt.from_str(input), Ok(false), "{input}");
        }
        assert_eq!(
            opt.from_str("maybe"),
            Err(OptionError::InvalidBool("maybe".to_string()))
        );
    }

    #[test]
    fn number_enforces_range() {
        let mut opt = OptionNumber::with_range(2, 0, 10);
        opt.set_from_str(Priority::CommandLine, "7").unwrap();
        assert_eq!(opt.value(), 7);

        let err = opt.set_from_str(Priority::CommandLine, "11").unwrap_err();
        assert_eq!(
            err,
            OptionError::OutOfRange {
                value: 11,
                min: 0,
                max: 10
            }
        );
        assert!(matches!(
            opt.set_from_str(Priority::CommandLine, "x"),
            Err(OptionError::InvalidNumber(_))
        ));
        assert_eq!(opt.value(), 7);
    }

    #[test]
    fn enum_rejects_unknown_values() {
        let mut opt = OptionEnum::new("auto", ["auto", "always", "never"]);
        opt.set_from_str(Priority::CommandLine, "never").unwrap();
        assert_eq!(opt.value(), "never");
        let err = opt.set_from_str(Priority::CommandLine, "sometimes").unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"sometimes\" is not one of: auto, always, never"
        );
    }

    #[test]
    fn string_list_replaces_whole_list() {
        let mut opt = OptionStringList::new(["a"]);
        opt.set_from_str(Priority::CommandLine, "b, c d").unwrap();
        assert_eq!(opt.value(), &["b", "c", "d"]);
        assert_eq!(opt.value_string(), "b, c, d");
    }

    #[test]
    fn type_erased_option_downcasts_back() {
        let typed = shared(OptionString::empty());
        let erased: SharedOption = typed.clone();
        assert_eq!(erased.borrow().priority(), Priority::Empty);
        erased
            .borrow_mut()
            .set_from_str(Priority::CommandLine, "x86_64")
            .unwrap();
        assert_eq!(typed.borrow().value(), "x86_64");

        let boxed = erased.borrow().clone_box();
        assert_eq!(
            boxed.downcast_ref::<OptionString>().map(|o| o.value().to_string()),
            Some("x86_64".to_string())
        );
    }
}
