//! URL arithmetic that doesn't touch the DOM.
//!
//! Static hosts often serve a page under only one of several equivalent spellings
//! (`/blog/post`, `/blog/post/`, `/blog/post/index.html`),
//! so a navigation target is expanded into a [`CandidateUrlSet`] that is tried in order.

use crate::error::Result;
use hashbrown::HashSet;
use url::Url;

const INDEX_FILE: &str = "index.html";

/// Ordered, duplicate-free URL spellings for one navigation target. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateUrlSet(Vec<Url>);

impl CandidateUrlSet {
	/// Expands `target` into: the exact URL, its trailing-slash counterpart, and the directory index form.
	///
	/// Fragments are dropped (they are never sent to the server) and the query is kept on every candidate.
	/// Paths whose last segment already names an HTML file only yield the exact URL.
	#[must_use]
	pub fn for_target(target: &Url) -> Self {
		let mut exact = target.clone();
		exact.set_fragment(None);

		let path = exact.path().to_owned();
		let mut spellings = vec![path.clone()];
		if !names_html_file(&path) {
			let directory = if path.ends_with('/') { path.clone() } else { format!("{}/", path) };
			let bare = directory.trim_end_matches('/');
			if !bare.is_empty() {
				spellings.push(if path.ends_with('/') { bare.to_owned() } else { directory.clone() });
			}
			spellings.push(format!("{}{}", directory, INDEX_FILE));
		}

		let mut seen = HashSet::new();
		Self(
			spellings
				.into_iter()
				.filter(|spelling| seen.insert(spelling.clone()))
				.map(|spelling| {
					let mut candidate = exact.clone();
					candidate.set_path(&spelling);
					candidate
				})
				.collect(),
		)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Always `false`, but clippy wants it next to [`CandidateUrlSet::len`].
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> core::slice::Iter<'_, Url> {
		self.0.iter()
	}
}

impl<'a> IntoIterator for &'a CandidateUrlSet {
	type Item = &'a Url;
	type IntoIter = core::slice::Iter<'a, Url>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

fn names_html_file(path: &str) -> bool {
	let last = path.rsplit('/').next().unwrap_or_default().to_ascii_lowercase();
	last.ends_with(".html") || last.ends_with(".htm")
}

/// Resolves `href` against `base` the way the browser resolves link targets.
pub fn resolve(base: &Url, href: &str) -> Result<Url> {
	Ok(base.join(href)?)
}

/// Collapses the spellings of [`CandidateUrlSet`] into one: no trailing slash (except for the root) and no `index.html`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
	let path = path.strip_suffix(INDEX_FILE).unwrap_or(path);
	let path = path.trim_end_matches('/');
	if path.is_empty() {
		"/".to_owned()
	} else {
		path.to_owned()
	}
}

/// The spelling that is written to history for a URL that resolved as `matched`.
///
/// A directory index is shown as its directory, everything else as-is.
#[must_use]
pub fn display_url(matched: &Url, requested: &Url) -> Url {
	let mut url = matched.clone();
	if let Some(directory) = matched.path().strip_suffix(INDEX_FILE) {
		if !requested.path().ends_with(INDEX_FILE) {
			let directory = directory.to_owned();
			url.set_path(&directory);
		}
	}
	url.set_fragment(requested.fragment());
	url
}

#[must_use]
pub fn same_origin(a: &Url, b: &Url) -> bool {
	a.origin() == b.origin()
}

/// Whether `a` and `b` show the same page, ignoring fragments and path spelling differences.
#[must_use]
pub fn same_page(a: &Url, b: &Url) -> bool {
	same_origin(a, b) && normalize_path(a.path()) == normalize_path(b.path()) && a.query() == b.query()
}
