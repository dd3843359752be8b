//! The markup contract shared between the navigation core and page content, and runtime configuration.
//!
//! Page content only needs to know about [`Contract`]:
//!
//! - exactly one mount point, `id="app"` by default, whose children are replaced on navigation,
//! - links opt in with `data-soft-nav` and can opt out again with `data-no-soft-nav`,
//! - navigation links live inside `[data-nav]` and the current one receives `class="active"` and `aria-current="page"`,
//! - page-scoped `<style>`, `<link rel="stylesheet">` and `<script>` elements carry `data-page-asset`,
//! - containers with the `page-enter` class have their entrance animation restarted after each swap.

use core::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
	pub mount_id: String,
	pub link_opt_in: String,
	pub link_opt_out: String,
	pub nav_container: String,
	pub active_class: String,
	pub asset_marker: String,
	pub enter_class: String,
	pub navigating_class: String,
}

impl Default for Contract {
	fn default() -> Self {
		Self {
			mount_id: "app".to_owned(),
			link_opt_in: "data-soft-nav".to_owned(),
			link_opt_out: "data-no-soft-nav".to_owned(),
			nav_container: "[data-nav]".to_owned(),
			active_class: "active".to_owned(),
			asset_marker: "data-page-asset".to_owned(),
			enter_class: "page-enter".to_owned(),
			navigating_class: "is-navigating".to_owned(),
		}
	}
}

impl Contract {
	#[must_use]
	pub fn asset_selector(&self) -> String {
		format!("[{}]", self.asset_marker)
	}

	#[must_use]
	pub fn enter_selector(&self) -> String {
		format!(".{}", self.enter_class)
	}

	/// Matches navigation links, which are only looked up inside [`Contract::nav_container`].
	#[must_use]
	pub fn nav_link_selector(&self) -> String {
		format!("{} a[href]", self.nav_container)
	}
}

/// [`Contract`] plus the tunables of the navigation pipeline.
#[derive(Debug, Clone)]
pub struct Config {
	pub contract: Contract,
	/// Applies to each candidate fetch separately. `None` waits indefinitely.
	pub timeout: Option<Duration>,
	/// Sent with every navigation fetch so servers may tell them apart from full page loads.
	pub navigation_header: Option<(String, String)>,
	/// How long new page stylesheets may take to load before the page is revealed anyway.
	pub style_timeout: Duration,
	pub preload_images: bool,
	pub image_timeout: Duration,
	/// Scroll to the `#fragment` target after a swap instead of to the top, if the target exists.
	pub honor_hash: bool,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			contract: Contract::default(),
			timeout: Some(Duration::from_secs(8)),
			navigation_header: Some(("X-Soft-Navigation".to_owned(), "1".to_owned())),
			style_timeout: Duration::from_secs(3),
			preload_images: true,
			image_timeout: Duration::from_millis(1500),
			honor_hash: true,
		}
	}
}

impl Config {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_contract(mut self, contract: Contract) -> Self {
		self.contract = contract;
		self
	}

	#[must_use]
	pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.timeout = timeout;
		self
	}

	#[must_use]
	pub fn with_navigation_header(mut self, header: Option<(String, String)>) -> Self {
		self.navigation_header = header;
		self
	}

	#[must_use]
	pub fn with_style_timeout(mut self, style_timeout: Duration) -> Self {
		self.style_timeout = style_timeout;
		self
	}

	#[must_use]
	pub fn with_preload_images(mut self, preload_images: bool) -> Self {
		self.preload_images = preload_images;
		self
	}

	#[must_use]
	pub fn with_image_timeout(mut self, image_timeout: Duration) -> Self {
		self.image_timeout = image_timeout;
		self
	}

	#[must_use]
	pub fn with_honor_hash(mut self, honor_hash: bool) -> Self {
		self.honor_hash = honor_hash;
		self
	}
}
