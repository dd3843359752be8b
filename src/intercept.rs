//! The delegated click and `popstate` listeners that feed the [`Navigator`].

use crate::{
	candidates::{resolve, same_origin, same_page},
	contract::Contract,
	error::{NavError, Result},
	fetch::Loader,
	navigator::{NavigationRequest, Navigator},
	state::Browser,
};
use std::rc::Rc;
use tracing::{debug, error, instrument, trace};
use url::Url;
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, HtmlAnchorElement, MouseEvent, Node, Window};

/// Button and modifier keys of a click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modality {
	pub button: i16,
	pub ctrl: bool,
	pub meta: bool,
	pub shift: bool,
	pub alt: bool,
}

impl Modality {
	#[must_use]
	pub fn from_event(event: &MouseEvent) -> Self {
		Self {
			button: event.button(),
			ctrl: event.ctrl_key(),
			meta: event.meta_key(),
			shift: event.shift_key(),
			alt: event.alt_key(),
		}
	}

	/// Anything else means "new tab", "new window", "download" or similar, which stays with the browser.
	#[must_use]
	pub fn is_plain_primary(&self) -> bool {
		self.button == 0 && !(self.ctrl || self.meta || self.shift || self.alt)
	}
}

/// The attributes of a clicked anchor that decide whether it is intercepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkFacts {
	pub href: String,
	pub opted_in: bool,
	pub opted_out: bool,
	pub target: String,
	pub download: bool,
}

impl LinkFacts {
	#[must_use]
	pub fn read(anchor: &Element, contract: &Contract) -> Self {
		let href = match anchor.dyn_ref::<HtmlAnchorElement>() {
			Some(anchor) => anchor.href(),
			None => anchor.get_attribute("href").unwrap_or_default(),
		};
		Self {
			href,
			opted_in: anchor.has_attribute(&contract.link_opt_in),
			opted_out: anchor.has_attribute(&contract.link_opt_out),
			target: anchor.get_attribute("target").unwrap_or_default(),
			download: anchor.has_attribute("download"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickDecision {
	/// Left to the browser.
	Ignore,
	/// The link points at the current page: default prevented, nothing fetched.
	Suppress { fragment: Option<String> },
	Navigate(NavigationRequest),
}

/// Decides what happens to a click on `link` while `current` is shown.
#[must_use]
pub fn classify(link: &LinkFacts, modality: Modality, current: &Url) -> ClickDecision {
	if !link.opted_in || link.opted_out {
		return ClickDecision::Ignore;
	}
	if !modality.is_plain_primary() {
		trace!("Ignoring click with {:?}", modality);
		return ClickDecision::Ignore;
	}
	if link.download || !(link.target.is_empty() || link.target.eq_ignore_ascii_case("_self")) {
		return ClickDecision::Ignore;
	}

	let url = match resolve(current, &link.href) {
		Ok(url) => url,
		Err(error) => {
			debug!("Ignoring unresolvable link {:?}: {}", link.href, error);
			return ClickDecision::Ignore;
		}
	};
	if !matches!(url.scheme(), "http" | "https") || !same_origin(&url, current) {
		return ClickDecision::Ignore;
	}

	if same_page(&url, current) {
		ClickDecision::Suppress {
			fragment: url.fragment().filter(|fragment| !fragment.is_empty()).map(str::to_owned),
		}
	} else {
		ClickDecision::Navigate(NavigationRequest::click(url, modality))
	}
}

fn anchor_for(event: &Event) -> Option<Element> {
	let target = event.target()?;
	let element = match target.dyn_into::<Element>() {
		Ok(element) => element,
		Err(target) => target.dyn_into::<Node>().ok()?.parent_element()?,
	};
	element.closest("a[href]").ok().flatten()
}

/// Classifies `event` and acts on it: prevents the default and, for [`ClickDecision::Navigate`],
/// schedules the navigation on the event loop.
pub fn handle_click<L, B>(navigator: &Rc<Navigator<L, B>>, event: &Event) -> ClickDecision
where
	L: Loader + 'static,
	B: Browser + 'static,
{
	if event.default_prevented() {
		return ClickDecision::Ignore;
	}
	let (mouse, anchor) = match (event.dyn_ref::<MouseEvent>(), anchor_for(event)) {
		(Some(mouse), Some(anchor)) => (mouse, anchor),
		_ => return ClickDecision::Ignore,
	};
	let current = match navigator.browser().location() {
		Ok(current) => current,
		Err(error) => {
			error!("Could not read the current location: {}", error);
			return ClickDecision::Ignore;
		}
	};

	let config = navigator.config();
	let decision = classify(&LinkFacts::read(&anchor, &config.contract), Modality::from_event(mouse), &current);
	match &decision {
		ClickDecision::Ignore => (),
		ClickDecision::Suppress { fragment } => {
			event.prevent_default();
			navigator.supersede();
			if let Some(target) = fragment.as_deref().filter(|_| config.honor_hash).and_then(|id| navigator.document().get_element_by_id(id)) {
				navigator.browser().scroll_into_view(&target);
			}
		}
		ClickDecision::Navigate(request) => {
			event.prevent_default();
			let navigator = Rc::clone(navigator);
			let request = request.clone();
			spawn_local(async move {
				navigator.navigate(request).await;
			});
		}
	}
	decision
}

/// Re-enters the pipeline for a back/forward step, without pushing history.
pub fn handle_popstate<L, B>(navigator: &Rc<Navigator<L, B>>)
where
	L: Loader + 'static,
	B: Browser + 'static,
{
	let url = match navigator.browser().location() {
		Ok(url) => url,
		Err(error) => {
			error!("Could not read the location after popstate: {}", error);
			return;
		}
	};
	if navigator.follow_fragment(&url) {
		debug!("History moved within the page to {}", url);
		return;
	}
	debug!("History moved to {}", url);
	let navigator = Rc::clone(navigator);
	spawn_local(async move {
		navigator.navigate(NavigationRequest::history(url)).await;
	});
}

/// One delegated `click` listener on the document and one `popstate` listener on its window.
///
/// Both are removed when this is dropped. Use [`Interceptor::forget`] to keep them for the lifetime of the page.
pub struct Interceptor {
	document: Document,
	window: Window,
	click: Closure<dyn FnMut(Event)>,
	popstate: Closure<dyn FnMut(Event)>,
}

impl Interceptor {
	/// # Errors
	///
	/// Fails if the navigator's document has no window or a listener can't be added.
	#[instrument(skip(navigator))]
	pub fn install<L, B>(navigator: Rc<Navigator<L, B>>) -> Result<Self>
	where
		L: Loader + 'static,
		B: Browser + 'static,
	{
		let document = navigator.document().clone();
		let window = document.default_view().ok_or_else(|| NavError::Js("Document has no window".to_owned()))?;

		let click = {
			let navigator = Rc::clone(&navigator);
			Closure::wrap(Box::new(move |event: Event| {
				let decision = handle_click(&navigator, &event);
				trace!("Click: {:?}", decision);
			}) as Box<dyn FnMut(Event)>)
		};
		let popstate = Closure::wrap(Box::new(move |_: Event| handle_popstate(&navigator)) as Box<dyn FnMut(Event)>);

		document.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
		if let Err(error) = window.add_event_listener_with_callback("popstate", popstate.as_ref().unchecked_ref()) {
			let _ = document.remove_event_listener_with_callback("click", click.as_ref().unchecked_ref());
			return Err(error.into());
		}

		debug!("Installed navigation listeners");
		Ok(Self { document, window, click, popstate })
	}

	/// Leaks the listeners, so they stay active for as long as the page exists.
	pub fn forget(self) {
		core::mem::forget(self);
	}
}

impl Drop for Interceptor {
	fn drop(&mut self) {
		if let Err(error) = self.document.remove_event_listener_with_callback("click", self.click.as_ref().unchecked_ref()) {
			error!("Failed to remove click listener: {:?}", error);
		}
		if let Err(error) = self.window.remove_event_listener_with_callback("popstate", self.popstate.as_ref().unchecked_ref()) {
			error!("Failed to remove popstate listener: {:?}", error);
		}
	}
}
