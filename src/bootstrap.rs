use crate::{Config, Interceptor, Navigator, WindowBrowser, WindowLoader};
use std::rc::Rc;
use wasm_bindgen::{prelude::wasm_bindgen, JsValue, UnwrapThrowExt};

/// Installs soft navigation with the default [`Config`] as soon as the module is instantiated.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
	let window = web_sys::window().expect_throw("softnav-dom: No window found.");
	let document = window.document().expect_throw("softnav-dom: No document found.");

	let config = Config::default();
	let loader = WindowLoader::new(window.clone(), &config);
	let navigator = Rc::new(Navigator::new(document, config, loader, WindowBrowser::new(window)));

	Interceptor::install(navigator).map_err(|error| JsValue::from_str(&error.to_string()))?.forget();
	Ok(())
}
