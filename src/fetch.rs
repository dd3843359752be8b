//! Candidate resolution and retrieval of target pages.

use crate::{
	candidates::CandidateUrlSet,
	contract::{Config, Contract},
	error::{describe, NavError, Result},
	timer,
};
use core::time::Duration;
use futures::future::{self, Either, FutureExt, LocalBoxFuture};
use tracing::{debug, instrument, trace, warn};
use url::Url;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, DomParser, Headers, Request, RequestCache, RequestInit, Response, SupportedType, Window};

/// Retrieves the body text behind a URL.
///
/// Implementations should fail with [`NavError::Status`] for non-success responses and honor their own timeout, if any.
pub trait Loader {
	fn load<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<String>>;
}

/// [`Loader`] backed by the window's `fetch`.
///
/// Requests bypass the HTTP cache (`cache: "no-store"`) and are aborted once the timeout elapses.
#[derive(Debug, Clone)]
pub struct WindowLoader {
	window: Window,
	timeout: Option<Duration>,
	header: Option<(String, String)>,
}

impl WindowLoader {
	#[must_use]
	pub fn new(window: Window, config: &Config) -> Self {
		Self {
			window,
			timeout: config.timeout,
			header: config.navigation_header.clone(),
		}
	}

	async fn fetch_text(&self, url: &Url, controller: Option<&AbortController>) -> Result<String> {
		let init = RequestInit::new();
		init.set_method("GET");
		init.set_cache(RequestCache::NoStore);
		if let Some((name, value)) = &self.header {
			let headers = Headers::new()?;
			headers.set(name, value)?;
			init.set_headers(&headers);
		}
		if let Some(controller) = controller {
			init.set_signal(Some(&controller.signal()));
		}

		let request = Request::new_with_str_and_init(url.as_str(), &init)?;
		let response = JsFuture::from(self.window.fetch_with_request(&request))
			.await
			.map_err(|error| NavError::Network(describe(&error)))?;
		let response: Response = response.dyn_into()?;
		if !response.ok() {
			return Err(NavError::Status(response.status()));
		}

		let text = JsFuture::from(response.text()?).await.map_err(|error| NavError::Network(describe(&error)))?;
		text.as_string().ok_or_else(|| NavError::Js("Response body is not a string".to_owned()))
	}
}

impl Loader for WindowLoader {
	fn load<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<String>> {
		async move {
			let controller = self.timeout.and_then(|_| AbortController::new().ok());
			let result = with_deadline(&self.window, self.fetch_text(url, controller.as_ref()).boxed_local(), self.timeout).await;
			if let (Err(NavError::Timeout), Some(controller)) = (&result, &controller) {
				controller.abort();
			}
			result
		}
		.boxed_local()
	}
}

/// Fails `work` with [`NavError::Timeout`] once `timeout` elapses. `work` is dropped at that point.
pub async fn with_deadline<T>(window: &Window, work: LocalBoxFuture<'_, Result<T>>, timeout: Option<Duration>) -> Result<T> {
	let timeout = match timeout {
		Some(timeout) => timeout,
		None => return work.await,
	};
	match future::select(work, timer::sleep(window, timeout)).await {
		Either::Left((result, _)) => result,
		Either::Right(_) => Err(NavError::Timeout),
	}
}

/// A parsed target page, together with the candidate URL it was found under.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
	pub url: Url,
	pub document: web_sys::Document,
}

/// Whether `body` is worth parsing: it must be non-blank and contain either an HTML document marker or the mount point.
#[must_use]
pub fn looks_like_document(body: &str, contract: &Contract) -> bool {
	if body.trim().is_empty() {
		return false;
	}

	let lower = body.to_ascii_lowercase();
	if lower.contains("<!doctype html") || lower.contains("<html") {
		return true;
	}

	let id = contract.mount_id.to_ascii_lowercase();
	[format!("id=\"{}\"", id), format!("id='{}'", id), format!("id={}", id)]
		.iter()
		.any(|marker| lower.contains(marker.as_str()))
}

pub fn parse(body: &str) -> Result<web_sys::Document> {
	DomParser::new()
		.and_then(|parser| parser.parse_from_string(body, SupportedType::TextHtml))
		.map_err(|error| NavError::Parse(describe(&error)))
}

/// Tries each spelling of `target` in order and returns the first usable document.
///
/// A candidate is skipped on any transport failure, non-success status or implausible body, and never retried.
#[instrument(skip(loader, contract, target), fields(target = %target))]
pub async fn resolve<L: Loader + ?Sized>(loader: &L, contract: &Contract, target: &Url) -> Result<FetchedDocument> {
	let candidates = CandidateUrlSet::for_target(target);
	let mut tried = Vec::with_capacity(candidates.len());

	for candidate in &candidates {
		tried.push(candidate.to_string());
		trace!("Trying candidate {}", candidate);

		let body = match loader.load(candidate).await {
			Ok(body) => body,
			Err(error) => {
				debug!("Candidate {} failed: {}", candidate, error);
				continue;
			}
		};

		if !looks_like_document(&body, contract) {
			debug!("{}", NavError::NotADocument { url: candidate.to_string() });
			continue;
		}

		match parse(&body) {
			Ok(document) => {
				debug!("Resolved {} as {}", target, candidate);
				return Ok(FetchedDocument {
					url: candidate.clone(),
					document,
				});
			}
			Err(error) => warn!("Candidate {} could not be parsed: {}", candidate, error),
		}
	}

	Err(NavError::Unresolved { tried })
}
