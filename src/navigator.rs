use crate::{
	candidates::{display_url, same_page},
	contract::Config,
	error::{NavError, Result},
	fetch::{self, Loader},
	intercept::Modality,
	state::{self, Browser},
	swap,
};
use core::cell::{Cell, RefCell};
use tracing::{debug, error, info, instrument, trace_span, warn};
use url::Url;
use web_sys::Document;

/// What started a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
	Click(Modality),
	/// Back/forward.
	History,
	Programmatic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
	pub url: Url,
	pub push_history: bool,
	pub trigger: Trigger,
}

impl NavigationRequest {
	#[must_use]
	pub fn click(url: Url, modality: Modality) -> Self {
		Self {
			url,
			push_history: true,
			trigger: Trigger::Click(modality),
		}
	}

	/// Replays a history entry. Never pushes.
	#[must_use]
	pub fn history(url: Url) -> Self {
		Self {
			url,
			push_history: false,
			trigger: Trigger::History,
		}
	}

	#[must_use]
	pub fn programmatic(url: Url) -> Self {
		Self {
			url,
			push_history: true,
			trigger: Trigger::Programmatic,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
	/// The page now shows `url` (the spelling written to history).
	Swapped { url: Url },
	/// The target is the current page. Nothing was fetched.
	Unchanged,
	/// A newer navigation started before this one finished; its result was discarded.
	Superseded,
	/// Soft navigation failed and the browser was told to load `url` normally.
	HardNavigation { url: Url, reason: NavError },
}

/// Owns the navigation pipeline: lock, fetch, swap, finalize, reveal.
///
/// Navigations may overlap. Each one draws a sequence number when it starts,
/// and only the most recently started one may swap content, write history or reveal the page.
#[derive(Debug)]
pub struct Navigator<L, B> {
	config: Config,
	document: Document,
	loader: L,
	browser: B,
	sequence: Cell<u64>,
	/// The last sequence number that finished or was abandoned.
	settled: Cell<u64>,
	displayed: RefCell<Option<Url>>,
}

impl<L: Loader, B: Browser> Navigator<L, B> {
	#[must_use]
	pub fn new(document: Document, config: Config, loader: L, browser: B) -> Self {
		let displayed = browser.location().ok();
		Self {
			config,
			document,
			loader,
			browser,
			sequence: Cell::new(0),
			settled: Cell::new(0),
			displayed: RefCell::new(displayed),
		}
	}

	#[must_use]
	pub fn config(&self) -> &Config {
		&self.config
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	#[must_use]
	pub fn loader(&self) -> &L {
		&self.loader
	}

	#[must_use]
	pub fn browser(&self) -> &B {
		&self.browser
	}

	fn begin(&self) -> u64 {
		let sequence = self.sequence.get() + 1;
		self.sequence.set(sequence);
		sequence
	}

	fn is_latest(&self, sequence: u64) -> bool {
		self.sequence.get() == sequence
	}

	/// Whether a navigation has started but not yet finished.
	#[must_use]
	pub fn is_pending(&self) -> bool {
		self.settled.get() < self.sequence.get()
	}

	/// The URL of the content currently on screen, as far as this navigator knows.
	#[must_use]
	pub fn displayed(&self) -> Option<Url> {
		self.displayed.borrow().clone()
	}

	/// Abandons the pending navigation, if any, and reveals the page as it is.
	///
	/// Returns whether there was anything to abandon.
	pub fn supersede(&self) -> bool {
		if !self.is_pending() {
			return false;
		}
		let sequence = self.begin();
		self.settled.set(sequence);
		state::unlock(&self.document, &self.config.contract);
		debug!("Pending navigation superseded by #{}", sequence);
		true
	}

	/// Follows a history move that stays on the displayed page (only the fragment differs) without fetching.
	///
	/// Returns `false` if `url` shows a different page, which then needs a real navigation.
	pub fn follow_fragment(&self, url: &Url) -> bool {
		let on_page = self.displayed.borrow().as_ref().map_or(false, |displayed| same_page(displayed, url));
		if !on_page {
			return false;
		}
		self.supersede();
		state::scroll_into_place(&self.document, &self.browser, url, self.config.honor_hash);
		*self.displayed.borrow_mut() = Some(url.clone());
		true
	}

	/// Runs one navigation to completion.
	///
	/// Failures never leave the page half-updated: they end in [`Browser::hard_navigate`] to the requested URL.
	#[instrument(skip(self), fields(url = %request.url, push = request.push_history))]
	pub async fn navigate(&self, request: NavigationRequest) -> Outcome {
		if request.push_history {
			if let Ok(current) = self.browser.location() {
				if same_page(&current, &request.url) {
					debug!("Already showing {}", request.url);
					self.supersede();
					return Outcome::Unchanged;
				}
			}
		}

		let sequence = self.begin();
		let contract = &self.config.contract;
		state::lock(&self.document, contract);

		match self.run(sequence, &request).await {
			Ok(Some(url)) => {
				self.settled.set(sequence);
				*self.displayed.borrow_mut() = Some(url.clone());
				state::unlock(&self.document, contract);
				info!("Navigated to {}", url);
				Outcome::Swapped { url }
			}
			Ok(None) => {
				debug!("Navigation #{} superseded", sequence);
				Outcome::Superseded
			}
			Err(_) if !self.is_latest(sequence) => {
				debug!("Navigation #{} failed after being superseded", sequence);
				Outcome::Superseded
			}
			Err(reason) => {
				self.settled.set(sequence);
				error!("Soft navigation to {} failed ({}); loading it normally.", request.url, reason);
				self.browser.hard_navigate(&request.url);
				Outcome::HardNavigation { url: request.url, reason }
			}
		}
	}

	/// `Ok(None)` means a newer navigation took over.
	async fn run(&self, sequence: u64, request: &NavigationRequest) -> Result<Option<Url>> {
		let contract = &self.config.contract;

		let fetched = fetch::resolve(&self.loader, contract, &request.url).await?;
		if !self.is_latest(sequence) {
			return Ok(None);
		}

		let report = {
			let span = trace_span!("Swapping", url = %fetched.url);
			let _enter = span.enter();
			swap::swap(&self.document, &fetched, contract)?
		};

		let shown = display_url(&fetched.url, &request.url);
		if request.push_history {
			self.browser.push(&shown)?;
		}

		self.finalize(&shown);

		// The page stays hidden until its styles (and, optionally, images) are in.
		if let Some(window) = self.document.default_view() {
			swap::settle(&window, &report.pending_styles, self.config.style_timeout).await;
			if self.config.preload_images {
				if let Ok(mount) = state::mount(&self.document, contract) {
					swap::settle_images(&window, &mount, self.config.image_timeout).await;
				}
			}
		}
		if !self.is_latest(sequence) {
			return Ok(None);
		}

		Ok(Some(shown))
	}

	/// Bookkeeping after content is in place. Failures here are cosmetic and only logged.
	fn finalize(&self, shown: &Url) {
		let contract = &self.config.contract;
		state::scroll_into_place(&self.document, &self.browser, shown, self.config.honor_hash);

		if let Err(error) = state::mark_active_links(&self.document, contract, shown) {
			warn!("Could not update active links: {}", error);
		}

		match state::mount(&self.document, contract) {
			Ok(mount) => {
				state::restart_entrance(&mount, contract);
			}
			Err(error) => warn!("{}", error),
		}
	}
}
