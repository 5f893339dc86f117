//! Command parameters, parsed arguments and command results

use serde::{Deserialize, Serialize};

use super::entry::{ConsoleEntry, ConsoleEntryType};

/// Declared type of a command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    Bool,
    Int,
    UInt,
    Float,
    Str,
}

impl ParamType {
    /// Primitive alias shown in usage strings.
    pub fn alias(&self) -> &'static str {
        match self {
            ParamType::Bool => "bool",
            ParamType::Int => "int",
            ParamType::UInt => "uint",
            ParamType::Float => "float",
            ParamType::Str => "string",
        }
    }

    /// Convert one raw argument. `None` if it doesn't parse as this type.
    pub fn parse(&self, raw: &str) -> Option<ArgValue> {
        match self {
            ParamType::Bool => {
                if raw.eq_ignore_ascii_case("true") {
                    Some(ArgValue::Bool(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Some(ArgValue::Bool(false))
                } else {
                    None
                }
            }
            ParamType::Int => raw.parse::<i64>().ok().map(ArgValue::Int),
            ParamType::UInt => raw.parse::<u64>().ok().map(ArgValue::UInt),
            ParamType::Float => raw
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .map(ArgValue::Float),
            ParamType::Str => Some(ArgValue::Str(raw.to_string())),
        }
    }
}

/// A named, typed command parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
        }
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Bool)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Int)
    }

    pub fn uint(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::UInt)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Float)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f32),
    Str(String),
}

/// Arguments converted to the declared parameter types of the matched overload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandArgs {
    values: Vec<ArgValue>,
}

impl CommandArgs {
    pub fn new(values: Vec<ArgValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The arguments after the first `count`.
    pub fn skip(&self, count: usize) -> CommandArgs {
        CommandArgs::new(self.values.iter().skip(count).cloned().collect())
    }

    pub fn get(&self, index: usize) -> Option<&ArgValue> {
        self.values.get(index)
    }

    pub fn bool(&self, index: usize) -> Option<bool> {
        match self.values.get(index) {
            Some(ArgValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn int(&self, index: usize) -> Option<i64> {
        match self.values.get(index) {
            Some(ArgValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn uint(&self, index: usize) -> Option<u64> {
        match self.values.get(index) {
            Some(ArgValue::UInt(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn float(&self, index: usize) -> Option<f32> {
        match self.values.get(index) {
            Some(ArgValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn str(&self, index: usize) -> Option<&str> {
        match self.values.get(index) {
            Some(ArgValue::Str(v)) => Some(v.as_str()),
            _ => None,
        }
    }
}

/// What a command handler hands back to the console.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CommandOutput {
    #[default]
    None,
    Entry(ConsoleEntry),
}

impl From<()> for CommandOutput {
    fn from(_: ()) -> Self {
        CommandOutput::None
    }
}

impl From<String> for CommandOutput {
    fn from(message: String) -> Self {
        CommandOutput::Entry(ConsoleEntry::message(message))
    }
}

impl From<&str> for CommandOutput {
    fn from(message: &str) -> Self {
        CommandOutput::Entry(ConsoleEntry::message(message))
    }
}

impl From<ConsoleEntry> for CommandOutput {
    fn from(entry: ConsoleEntry) -> Self {
        CommandOutput::Entry(entry)
    }
}

impl From<(String, ConsoleEntryType)> for CommandOutput {
    fn from((message, entry_type): (String, ConsoleEntryType)) -> Self {
        CommandOutput::Entry(ConsoleEntry::new(message, entry_type))
    }
}
