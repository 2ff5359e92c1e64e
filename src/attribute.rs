use std::fmt;

/// A `name="value"` pair, used both for attributes and namespace declarations.
///
/// Both fields can be changed after construction.
/// Nothing stops a node from holding two attributes with the same name;
/// lookups on [`Node`](crate::Node) always use the first match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    name: String,
    value: String,
}

impl Attribute {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Attribute {
        Attribute {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub fn set_value<S: Into<String>>(&mut self, value: S) {
        self.value = value.into();
    }
}

impl<N: Into<String>, V: Into<String>> From<(N, V)> for Attribute {
    fn from((name, value): (N, V)) -> Attribute {
        Attribute::new(name, value)
    }
}

/// Writes `name="value"` without escaping the value.
impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=\"{}\"", self.name, self.value)
    }
}
