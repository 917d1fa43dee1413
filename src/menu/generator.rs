//! Value lists for int options

use super::element::OptionDecl;
use anyhow::{Result, bail};

/// Accumulates int option values with their display strings
///
/// ```
/// use preference_system::menu::{IntValues, OptionDecl};
///
/// # fn main() -> anyhow::Result<()> {
/// let mut values = IntValues::new();
/// values.add(0, Some("Off"));
/// values.add_range(10, 30, 10, "volume", |_, v| format!("{}%", v))?;
/// assert_eq!(values.strings(), ["Off", "10%", "20%", "30%"]);
///
/// let decl = OptionDecl::new("volume", 0).generated(values);
/// assert_eq!(decl.key(), "volume");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntValues {
    values: Vec<i32>,
    strings: Vec<String>,
}

impl IntValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.strings.clear();
    }

    /// Append one value; without a representation it is shown as its number
    pub fn add(&mut self, value: i32, representation: Option<&str>) -> &mut Self {
        let text = representation.map_or_else(|| value.to_string(), str::to_string);
        self.values.push(value);
        self.strings.push(text);
        self
    }

    /// Append `min..=max` in steps of `step`, labelled by `to_string(pref_key, value)`
    pub fn add_range(
        &mut self,
        min: i32,
        max: i32,
        step: i32,
        pref_key: &str,
        to_string: impl Fn(&str, i32) -> String,
    ) -> Result<&mut Self> {
        if step <= 0 {
            bail!("Range step for {} must be positive, got {}", pref_key, step);
        }
        let mut value = min;
        while value <= max {
            let text = to_string(pref_key, value);
            self.add(value, Some(text.as_str()));
            match value.checked_add(step) {
                Some(next) => value = next,
                None => break,
            }
        }
        Ok(self)
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_parts(self) -> (Vec<i32>, Vec<String>) {
        (self.values, self.strings)
    }
}

impl OptionDecl<i32> {
    /// Take values and display strings from a generator
    pub fn generated(self, values: IntValues) -> Self {
        let (values, strings) = values.into_parts();
        self.values(values).strings(strings)
    }
}
