use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Everything that can go wrong during a soft navigation.
///
/// None of these reach the user: the [`Navigator`](`crate::Navigator`) answers each of them with a full page load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavError {
	#[error("Network request failed: {0}")]
	Network(String),

	#[error("Unexpected HTTP status {0}")]
	Status(u16),

	#[error("Request timed out")]
	Timeout,

	#[error("Response from {url} does not look like an HTML document")]
	NotADocument { url: String },

	#[error("No candidate URL yielded a usable document (tried {tried:?})")]
	Unresolved { tried: Vec<String> },

	#[error("Could not parse HTML: {0}")]
	Parse(String),

	#[error("The live page has no mount point #{0}")]
	NoMountPoint(String),

	#[error("The fetched document contains no usable content fragment")]
	NoFragment,

	#[error("Could not attach page asset: {0}")]
	Asset(String),

	#[error("Invalid URL: {0}")]
	InvalidUrl(#[from] url::ParseError),

	#[error("JavaScript error: {0}")]
	Js(String),
}

impl From<JsValue> for NavError {
	fn from(value: JsValue) -> Self {
		Self::Js(describe(&value))
	}
}

/// Prefers the `message` of thrown `Error`s over the full debug representation.
pub(crate) fn describe(value: &JsValue) -> String {
	if let Some(error) = value.dyn_ref::<js_sys::Error>() {
		return String::from(error.message());
	}
	value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

pub type Result<T> = core::result::Result<T, NavError>;
