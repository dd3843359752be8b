use core::time::Duration;
use js_sys::Promise;
use wasm_bindgen_futures::JsFuture;
use web_sys::Window;

/// Resolves after `duration` via `setTimeout`. If the timer can't be scheduled, it never resolves.
pub(crate) fn sleep(window: &Window, duration: Duration) -> JsFuture {
	let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
	JsFuture::from(Promise::new(&mut |resolve, _reject| {
		if let Err(error) = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis) {
			tracing::error!("Failed to schedule timer: {:?}", error);
		}
	}))
}
