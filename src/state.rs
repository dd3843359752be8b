//! Visible navigation state: the visual lock, active-link marking, entrance animations and scrolling,
//! plus the [`Browser`] seam for history and full page loads.

use crate::{
	candidates::{normalize_path, same_origin},
	contract::Contract,
	error::{describe, NavError, Result},
};
use tracing::{debug, error, trace, warn};
use url::Url;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlAnchorElement, HtmlElement, Window};

/// Everything the navigation pipeline needs from the browser outside the document itself.
pub trait Browser {
	/// The URL currently shown in the address bar.
	fn location(&self) -> Result<Url>;

	/// Adds a history entry for `url` without loading it.
	fn push(&self, url: &Url) -> Result<()>;

	/// Leaves the soft-navigation path and lets the browser load `url` normally.
	fn hard_navigate(&self, url: &Url);

	fn scroll_to_top(&self);

	fn scroll_into_view(&self, target: &Element) {
		target.scroll_into_view();
	}
}

#[derive(Debug, Clone)]
pub struct WindowBrowser {
	window: Window,
}

impl WindowBrowser {
	#[must_use]
	pub fn new(window: Window) -> Self {
		Self { window }
	}
}

impl Browser for WindowBrowser {
	fn location(&self) -> Result<Url> {
		Ok(Url::parse(&self.window.location().href()?)?)
	}

	fn push(&self, url: &Url) -> Result<()> {
		let history = self.window.history()?;
		history.push_state_with_url(&JsValue::NULL, "", Some(url.as_str()))?;
		Ok(())
	}

	fn hard_navigate(&self, url: &Url) {
		if let Err(error) = self.window.location().assign(url.as_str()) {
			// Nothing left to fall back to.
			error!("Full navigation to {} failed: {}", url, describe(&error));
		}
	}

	fn scroll_to_top(&self) {
		self.window.scroll_to_with_x_and_y(0.0, 0.0);
	}
}

/// Hides the swap from the user until [`unlock`].
pub fn lock(document: &Document, contract: &Contract) {
	if let Some(root) = document.document_element() {
		if let Err(error) = root.class_list().add_1(&contract.navigating_class) {
			warn!("Could not lock: {:?}", error);
		}
	}
	if let Some(mount) = document.get_element_by_id(&contract.mount_id) {
		if let Err(error) = mount.set_attribute("aria-busy", "true") {
			warn!("Could not mark #{} busy: {:?}", contract.mount_id, error);
		}
	}
}

pub fn unlock(document: &Document, contract: &Contract) {
	if let Some(root) = document.document_element() {
		if let Err(error) = root.class_list().remove_1(&contract.navigating_class) {
			warn!("Could not unlock: {:?}", error);
		}
	}
	if let Some(mount) = document.get_element_by_id(&contract.mount_id) {
		if let Err(error) = mount.remove_attribute("aria-busy") {
			warn!("Could not clear aria-busy on #{}: {:?}", contract.mount_id, error);
		}
	}
}

#[must_use]
pub fn is_locked(document: &Document, contract: &Contract) -> bool {
	document.document_element().map_or(false, |root| root.class_list().contains(&contract.navigating_class))
}

/// Marks the first navigation link pointing at `current` as active and clears all others.
///
/// Returns the marked link, if any.
pub fn mark_active_links(document: &Document, contract: &Contract, current: &Url) -> Result<Option<HtmlAnchorElement>> {
	let links = document.query_selector_all(&contract.nav_link_selector())?;
	let current_path = normalize_path(current.path());

	let mut active = None;
	for i in 0..links.length() {
		let link = match links.item(i).and_then(|node| node.dyn_into::<HtmlAnchorElement>().ok()) {
			Some(link) => link,
			None => continue,
		};

		let matches = active.is_none()
			&& Url::parse(&link.href()).map_or(false, |href| same_origin(&href, current) && normalize_path(href.path()) == current_path);

		let classes = link.class_list();
		if matches {
			classes.add_1(&contract.active_class)?;
			link.set_attribute("aria-current", "page")?;
			active = Some(link);
		} else {
			classes.remove_1(&contract.active_class)?;
			link.remove_attribute("aria-current")?;
		}
	}

	trace!("Active link: {:?}", active.as_ref().map(HtmlAnchorElement::href));
	Ok(active)
}

/// Restarts the entrance animation of every entrance container below (and including) `mount`.
///
/// The class is removed and re-added with a forced layout in between, so the animation replays
/// even where the class was already present.
pub fn restart_entrance(mount: &Element, contract: &Contract) -> usize {
	let mut containers = Vec::new();
	if mount.class_list().contains(&contract.enter_class) {
		containers.push(mount.clone());
	}
	match mount.query_selector_all(&contract.enter_selector()) {
		Ok(list) => containers.extend((0..list.length()).filter_map(|i| list.item(i)).filter_map(|node| node.dyn_into::<Element>().ok())),
		Err(error) => warn!("Invalid entrance selector: {:?}", error),
	}

	for container in &containers {
		let classes = container.class_list();
		if let Err(error) = classes.remove_1(&contract.enter_class) {
			warn!("Could not reset entrance animation: {:?}", error);
			continue;
		}
		if let Some(container) = container.dyn_ref::<HtmlElement>() {
			// Reading layout flushes the style change.
			container.offset_width();
		}
		if let Err(error) = classes.add_1(&contract.enter_class) {
			warn!("Could not restart entrance animation: {:?}", error);
		}
	}
	containers.len()
}

/// Scrolls to the element named by `url`'s fragment, or to the top of the page.
pub fn scroll_into_place<B: Browser + ?Sized>(document: &Document, browser: &B, url: &Url, honor_hash: bool) {
	let target = url
		.fragment()
		.filter(|fragment| honor_hash && !fragment.is_empty())
		.and_then(|fragment| document.get_element_by_id(fragment));
	match target {
		Some(target) => {
			debug!("Scrolling to #{}", target.id());
			browser.scroll_into_view(&target);
		}
		None => browser.scroll_to_top(),
	}
}

/// Finds the single mount point of the live page.
pub fn mount(document: &Document, contract: &Contract) -> Result<Element> {
	document.get_element_by_id(&contract.mount_id).ok_or_else(|| NavError::NoMountPoint(contract.mount_id.clone()))
}
