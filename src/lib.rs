//! Soft navigation for static multi-page sites.
//!
//! An [`Interceptor`] listens for clicks on opted-in links, the [`Navigator`] fetches the target page
//! (trying a few equivalent path spellings), swaps its content region into the live document,
//! re-runs its scripts, exchanges page-scoped styles and updates history and navigation highlighting.
//!
//! Any failure along the way turns into an ordinary full page load of the requested URL.

#![doc(html_root_url = "https://docs.rs/softnav-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod candidates;
pub mod contract;
pub mod error;
pub mod fetch;
pub mod intercept;
pub mod navigator;
pub mod state;
pub mod swap;

mod timer;

#[cfg(feature = "bootstrap")]
mod bootstrap;

pub use contract::{Config, Contract};
pub use error::{NavError, Result};
pub use fetch::{FetchedDocument, Loader, WindowLoader};
pub use intercept::{ClickDecision, Interceptor, Modality};
pub use navigator::{NavigationRequest, Navigator, Outcome, Trigger};
pub use state::{Browser, WindowBrowser};
