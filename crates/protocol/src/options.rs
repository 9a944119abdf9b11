//! Vardict (`a{sv}`) options passed as the trailing argument of portal calls.

use std::collections::BTreeMap;
use std::collections::HashMap;

use bitflags::bitflags;
use zvariant::Value;

/// A single option value.
///
/// Only the variant types the camera and screen cast calls actually send are
/// representable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
	Bool(bool),
	U32(u32),
	Str(String),
}

impl OptionValue {
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			OptionValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_u32(&self) -> Option<u32> {
		match self {
			OptionValue::U32(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			OptionValue::Str(s) => Some(s),
			_ => None,
		}
	}

	fn to_variant(&self) -> Value<'_> {
		match self {
			OptionValue::Bool(b) => Value::from(*b),
			OptionValue::U32(v) => Value::from(*v),
			OptionValue::Str(s) => Value::from(s.as_str()),
		}
	}
}

impl From<bool> for OptionValue {
	fn from(value: bool) -> Self {
		OptionValue::Bool(value)
	}
}

impl From<u32> for OptionValue {
	fn from(value: u32) -> Self {
		OptionValue::U32(value)
	}
}

impl From<String> for OptionValue {
	fn from(value: String) -> Self {
		OptionValue::Str(value)
	}
}

impl From<&str> for OptionValue {
	fn from(value: &str) -> Self {
		OptionValue::Str(value.to_string())
	}
}

/// Ordered options map. Ordering keeps logs and test assertions stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(BTreeMap<String, OptionValue>);

impl Options {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style insert.
	pub fn with(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
		self.insert(key, value);
		self
	}

	pub fn insert(&mut self, key: &str, value: impl Into<OptionValue>) {
		self.0.insert(key.to_string(), value.into());
	}

	pub fn get(&self, key: &str) -> Option<&OptionValue> {
		self.0.get(key)
	}

	pub fn contains(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Borrowed `a{sv}` view suitable as a D-Bus message argument.
	pub fn to_vardict(&self) -> HashMap<&str, Value<'_>> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.to_variant())).collect()
	}
}

bitflags! {
	/// Source kinds accepted by `SelectSources` in the `types` option.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct SourceTypes: u32 {
		const CAMERA = 1;
		const MONITOR = 2;
	}
}

impl Default for SourceTypes {
	fn default() -> Self {
		SourceTypes::CAMERA | SourceTypes::MONITOR
	}
}

/// Cursor rendering requested through the `cursor_mode` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CursorMode {
	Hidden = 1,
	Embedded = 2,
	Metadata = 4,
}

impl CursorMode {
	pub fn bits(self) -> u32 {
		self as u32
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_source_types_match_camera_and_monitor() {
		assert_eq!(SourceTypes::default().bits(), 3);
	}

	#[test]
	fn options_keep_typed_values() {
		let options = Options::new()
			.with("multiple", false)
			.with("types", SourceTypes::default().bits())
			.with("handle_token", "u1");

		assert_eq!(options.len(), 3);
		assert_eq!(options.get("multiple").and_then(OptionValue::as_bool), Some(false));
		assert_eq!(options.get("types").and_then(OptionValue::as_u32), Some(3));
		assert_eq!(options.get("handle_token").and_then(OptionValue::as_str), Some("u1"));
		assert!(options.get("missing").is_none());
	}

	#[test]
	fn vardict_view_carries_every_key() {
		let options = Options::new().with("multiple", true).with("cursor_mode", CursorMode::Embedded.bits());
		let dict = options.to_vardict();

		assert_eq!(dict.len(), 2);
		assert_eq!(dict.get("multiple"), Some(&Value::from(true)));
		assert_eq!(dict.get("cursor_mode"), Some(&Value::from(2u32)));
	}
}
