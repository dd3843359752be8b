//! Replacing the live mount point's content with a fragment of a fetched document.

use crate::{
	contract::Contract,
	error::{describe, NavError, Result},
	fetch::FetchedDocument,
	timer,
};
use core::time::Duration;
use futures::future::{self, Either};
use js_sys::{Array, Promise};
use tracing::{debug, error, instrument, trace, trace_span, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AddEventListenerOptions, Document, Element, HtmlImageElement, HtmlScriptElement, NamedNodeMap, Node, NodeList, Window};

/// The part of a fetched document that ends up inside the live mount point.
#[derive(Debug, Clone)]
pub enum ContentFragment {
	/// A non-empty entrance container, inserted as a whole.
	Enter(Element),
	/// The fetched mount point, whose children are inserted.
	Mount(Element),
}

impl ContentFragment {
	#[must_use]
	pub fn root(&self) -> &Element {
		match self {
			ContentFragment::Enter(element) | ContentFragment::Mount(element) => element,
		}
	}
}

/// What a successful [`swap`] did.
#[derive(Debug, Clone, Default)]
pub struct SwapReport {
	pub title: Option<String>,
	pub scripts: usize,
	pub assets_added: usize,
	pub assets_removed: usize,
	/// Settle once each newly attached stylesheet has loaded or failed. See [`settle`].
	pub pending_styles: Vec<Promise>,
}

fn has_content(element: &Element) -> bool {
	element.child_element_count() > 0 || element.text_content().map_or(false, |text| !text.trim().is_empty())
}

/// Prefers the narrower entrance container inside the fetched mount point (or anywhere, if there is no mount point),
/// then falls back to the mount point itself. Empty candidates don't count.
#[must_use]
pub fn select_fragment(document: &Document, contract: &Contract) -> Option<ContentFragment> {
	let mount = document.get_element_by_id(&contract.mount_id);
	let enter_selector = contract.enter_selector();
	let enter = match &mount {
		Some(mount) => mount.query_selector(&enter_selector),
		None => document.query_selector(&enter_selector),
	};
	match enter {
		Ok(Some(enter)) if has_content(&enter) => return Some(ContentFragment::Enter(enter)),
		Ok(_) => (),
		Err(error) => warn!("Invalid entrance selector {:?}: {:?}", enter_selector, error),
	}

	mount.filter(has_content).map(ContentFragment::Mount)
}

fn elements(list: &NodeList) -> impl Iterator<Item = Element> + '_ {
	(0..list.length()).filter_map(move |i| list.item(i)).filter_map(|node| node.dyn_into::<Element>().ok())
}

/// Page-scoped assets of `document` that don't live inside `exclude`.
fn page_assets(document: &Document, contract: &Contract, exclude: &Element) -> Result<Vec<Element>> {
	let list = document.query_selector_all(&contract.asset_selector())?;
	Ok(elements(&list).filter(|asset| !exclude.contains(Some(&**asset))).collect())
}

fn copy_attributes(target: &Element, attributes: &NamedNodeMap) -> Result<()> {
	for i in 0..attributes.length() {
		if let Some(attribute) = attributes.item(i) {
			target.set_attribute(&attribute.name(), &attribute.value())?;
		}
	}
	Ok(())
}

/// Builds an executable copy of `script` owned by `document`.
///
/// Scripts that arrive through parsing or node import are inert; only freshly created ones run when inserted.
/// External scripts keep document order unless they ask for `async` themselves.
pub fn recreate_script(document: &Document, script: &Element) -> Result<Element> {
	let fresh = document.create_element("script")?;
	copy_attributes(&fresh, &script.attributes())?;
	if let Some(fresh) = fresh.dyn_ref::<HtmlScriptElement>() {
		if !script.has_attribute("async") {
			fresh.set_async(false);
		}
	}
	fresh.set_text_content(script.text_content().as_deref());
	Ok(fresh)
}

fn is_script(element: &Element) -> bool {
	element.tag_name().eq_ignore_ascii_case("script")
}

fn is_stylesheet(element: &Element) -> bool {
	element.tag_name().eq_ignore_ascii_case("link")
		&& element
			.get_attribute("rel")
			.map_or(false, |rel| rel.split_ascii_whitespace().any(|token| token.eq_ignore_ascii_case("stylesheet")))
}

/// Resolves with the first `load` or `error` event of `target`.
///
/// Must be created before `target` can start loading, or the event may be missed.
fn loaded(target: &Element) -> Promise {
	let once = AddEventListenerOptions::new();
	once.set_once(true);
	Promise::new(&mut |resolve, _reject| {
		for event in ["load", "error"] {
			if let Err(error) = target.add_event_listener_with_callback_and_add_event_listener_options(event, &resolve, &once) {
				warn!("Could not watch {} of <{}>: {:?}", event, target.tag_name(), error);
			}
		}
	})
}

fn asset_parent(document: &Document) -> Result<Node> {
	match document.head() {
		Some(head) => Ok(head.into()),
		None => Ok(document.body().ok_or_else(|| NavError::Asset("Document has neither head nor body".to_owned()))?.into()),
	}
}

/// Attaches copies of the style assets in `assets` (everything but scripts).
///
/// All or nothing: on failure, the copies attached so far are removed again.
/// Returns the attached nodes and the load promises of attached stylesheets.
fn attach_styles(document: &Document, assets: &[Element]) -> Result<(Vec<Node>, Vec<Promise>)> {
	let parent = asset_parent(document)?;

	let mut attached = Vec::with_capacity(assets.len());
	let mut pending = Vec::new();
	for asset in assets.iter().filter(|asset| !is_script(asset)) {
		let attempt = document.import_node_with_deep(asset, true).map_err(NavError::from).and_then(|node| {
			if let Some(element) = node.dyn_ref::<Element>() {
				if is_stylesheet(element) {
					pending.push(loaded(element));
				}
			}
			Ok(parent.append_child(&node)?)
		});
		match attempt {
			Ok(node) => attached.push(node),
			Err(error) => {
				for node in &attached {
					if let Some(element) = node.dyn_ref::<Element>() {
						element.remove();
					}
				}
				return Err(NavError::Asset(error.to_string()));
			}
		}
	}
	Ok((attached, pending))
}

/// Runs the script assets in `assets`, in document order. Failures are logged, since the content is already in place.
fn attach_scripts(document: &Document, assets: &[Element]) -> usize {
	let parent = match asset_parent(document) {
		Ok(parent) => parent,
		Err(error) => {
			error!("{}", error);
			return 0;
		}
	};

	let mut count = 0;
	for asset in assets.iter().filter(|asset| is_script(asset)) {
		match recreate_script(document, asset).and_then(|fresh| Ok(parent.append_child(&fresh)?)) {
			Ok(_) => count += 1,
			Err(error) => warn!("Failed to run page script: {}", error),
		}
	}
	count
}

/// Re-creates every `<script>` below `mount` in place. Failures are logged, since the content is already in place.
fn activate_scripts(document: &Document, mount: &Element) -> usize {
	let list = match mount.query_selector_all("script") {
		Ok(list) => list,
		Err(error) => {
			error!("Could not look up scripts: {}", describe(&error));
			return 0;
		}
	};

	let mut count = 0;
	for script in elements(&list) {
		let replaced = recreate_script(document, &script).and_then(|fresh| {
			let parent = script.parent_node().ok_or_else(|| NavError::Js("Detached script".to_owned()))?;
			parent.replace_child(&fresh, &script)?;
			Ok(())
		});
		match replaced {
			Ok(()) => count += 1,
			Err(error) => warn!("Failed to activate script: {}", error),
		}
	}
	count
}

/// Replaces the content of the live mount point with the fetched page's fragment.
///
/// Order of operations: new page styles are attached, then content is replaced and its scripts re-created,
/// then the previous page's assets are removed, and finally the new page's script assets run,
/// so scripts always see the markup they belong to.
///
/// New stylesheets may still be loading when this returns. Keep the page hidden until [`SwapReport::pending_styles`] settle.
///
/// # Errors
///
/// Fails without touching the live mount point if it doesn't exist, if no fragment can be extracted,
/// or if the new page styles can't be attached.
#[instrument(skip(live, fetched, contract), fields(url = %fetched.url))]
pub fn swap(live: &Document, fetched: &FetchedDocument, contract: &Contract) -> Result<SwapReport> {
	let mount = live.get_element_by_id(&contract.mount_id).ok_or_else(|| NavError::NoMountPoint(contract.mount_id.clone()))?;
	let fragment = select_fragment(&fetched.document, contract).ok_or(NavError::NoFragment)?;
	trace!("Selected fragment: {:?}", fragment);

	// Deep copies, so nothing keeps the fetched document alive.
	let content = live.create_document_fragment();
	match &fragment {
		ContentFragment::Enter(element) => {
			content.append_child(&live.import_node_with_deep(element, true)?)?;
		}
		ContentFragment::Mount(element) => {
			let child_nodes = element.child_nodes();
			for i in 0..child_nodes.length() {
				if let Some(child) = child_nodes.item(i) {
					content.append_child(&live.import_node_with_deep(&child, true)?)?;
				}
			}
		}
	}

	let old_assets = page_assets(live, contract, &mount)?;
	let new_assets = page_assets(&fetched.document, contract, fragment.root())?;

	let (added, pending_styles) = {
		let span = trace_span!("Attaching page styles", count = new_assets.len());
		let _enter = span.enter();
		attach_styles(live, &new_assets)?
	};

	mount.set_text_content(None);
	mount.append_child(&content)?;
	let mut scripts = activate_scripts(live, &mount);

	for asset in &old_assets {
		asset.remove();
	}

	let page_scripts = attach_scripts(live, &new_assets);
	scripts += page_scripts;

	let title = fetched.document.title();
	let title = if title.trim().is_empty() {
		None
	} else {
		live.set_title(&title);
		Some(title)
	};

	let report = SwapReport {
		title,
		scripts,
		assets_added: added.len() + page_scripts,
		assets_removed: old_assets.len(),
		pending_styles,
	};
	debug!("Swapped content: {:?}", report);
	Ok(report)
}

/// Waits until every promise in `pending` has settled, but no longer than `timeout`.
pub async fn settle(window: &Window, pending: &[Promise], timeout: Duration) {
	if pending.is_empty() {
		return;
	}
	trace!("Waiting for {} resource(s)", pending.len());
	let all = Promise::all(&pending.iter().collect::<Array>());
	match future::select(JsFuture::from(all), timer::sleep(window, timeout)).await {
		Either::Left(_) => trace!("Resources settled"),
		Either::Right(_) => debug!("Gave up waiting for resources after {:?}", timeout),
	}
}

/// Waits until every image below `root` has loaded or failed, but no longer than `timeout`.
pub async fn settle_images(window: &Window, root: &Element, timeout: Duration) {
	let list = match root.query_selector_all("img") {
		Ok(list) => list,
		Err(_) => return,
	};

	let pending = elements(&list)
		.filter(|element| element.dyn_ref::<HtmlImageElement>().map_or(false, |image| !image.complete()))
		.map(|image| loaded(&image))
		.collect::<Vec<_>>();
	settle(window, &pending, timeout).await;
}
