use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

// Defines a new type that wraps a String for use as an ID.
macro_rules! idtype {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn from(s: String) -> Self {
                Self(s)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

pub(crate) use idtype;

idtype!(SectionName);

/// The label printed next to a bubble column, e.g. `"B"` on a multiple-choice
/// row or `3` on a roll number column.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionLabel {
    Number(u32),
    Text(String),
}

impl Display for OptionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionLabel::Number(n) => write!(f, "{}", n),
            OptionLabel::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u32> for OptionLabel {
    fn from(n: u32) -> Self {
        OptionLabel::Number(n)
    }
}

impl From<&str> for OptionLabel {
    fn from(s: &str) -> Self {
        OptionLabel::Text(s.to_string())
    }
}

/// A bubble classified as filled: the 1-based row it sits on and the option
/// label of its column.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Detection {
    pub row: u32,
    pub option: OptionLabel,
}

impl Detection {
    pub fn new(row: u32, option: impl Into<OptionLabel>) -> Self {
        Self {
            row,
            option: option.into(),
        }
    }
}

impl Display for Detection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.option)
    }
}
