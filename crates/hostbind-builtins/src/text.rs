//! Text helpers

use hostbind_sdk::{script_methods, script_type, Value};

#[script_type]
pub struct Label {
    #[script_property]
    pub text: String,
}

#[script_methods]
impl Label {
    #[script_constructor]
    pub fn new(text: String) -> Self {
        Label { text }
    }

    #[script_method(name = "firstWord")]
    pub fn first_word(&self) -> &str {
        self.text.split_whitespace().next().unwrap_or("")
    }

    #[script_method]
    pub fn initial(&self) -> Option<char> {
        self.text.chars().next()
    }

    #[script_method]
    pub fn greet(&self, name: &str, #[script_default("!")] suffix: String) -> String {
        format!("{}, {}{}", self.text, name, suffix)
    }

    #[script_method]
    pub fn repeat(&mut self, #[script_default(2)] times: usize, #[script_default(' ')] separator: char) {
        self.text = vec![self.text.as_str(); times].join(&separator.to_string());
    }
}

/// String utilities; type-level only
#[script_type(is_static)]
pub struct Strings;

#[script_methods]
impl Strings {
    /// Concatenate every argument's text form
    #[script_method]
    pub fn concat(parts: Vec<Value>) -> String {
        parts
            .iter()
            .map(|part| match part {
                Value::Str(s) => s.to_string(),
                Value::Int(i) => i.to_string(),
                Value::Float(f) => f.to_string(),
                Value::Bool(b) => b.to_string(),
                other => format!("<{}>", other.kind()),
            })
            .collect()
    }

    #[script_method]
    pub fn parse_int(text: &str) -> Result<i64, std::num::ParseIntError> {
        text.trim().parse()
    }
}
