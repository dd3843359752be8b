use softnav_dom::{state, Contract, Modality, NavError, NavigationRequest, Navigator, Outcome};
use std::rc::Rc;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

wasm_bindgen_test_configure!(run_in_browser);

use web_fakes_::*;

fn home() -> String {
	page("Home", "", r#"<div class="page-enter"><p>Home content</p></div>"#)
}

fn portfolio() -> String {
	page(
		"Portfolio",
		r#"<style data-page-asset id="portfolio-style">.grid{}</style>"#,
		r#"<div class="page-enter"><p>Portfolio content</p></div>"#,
	)
}

fn click(path: &str) -> NavigationRequest {
	NavigationRequest::click(at(path), Modality::default())
}

#[wasm_bindgen_test]
async fn portfolio_from_home() {
	let document = fixture();
	let loader = FakeLoader::new().serve("/portfolio", portfolio());
	let navigator = navigator(document.clone(), loader, RecordingBrowser::at("/"));

	let outcome = navigator.navigate(click("/portfolio")).await;

	assert_eq!(outcome, Outcome::Swapped { url: at("/portfolio") });
	assert_eq!(navigator.loader().calls(), ["/portfolio"]);
	assert_eq!(mount_text(&document), "Portfolio content");
	assert_eq!(navigator.browser().pushed_paths(), ["/portfolio"]);
	assert_eq!(active_links(&document), ["/portfolio"]);
	assert!(document.get_element_by_id("portfolio-style").is_some());
	assert_eq!(navigator.browser().scrolls.get(), 1);
	assert!(!state::is_locked(&document, &navigator.config().contract));
	assert!(mount(&document).first_element_child().unwrap().class_list().contains("page-enter"));
}

#[wasm_bindgen_test]
async fn directory_index_is_shown_as_directory() {
	let document = fixture();
	let loader = FakeLoader::new()
		.serve("/blog/post-1", "")
		.serve("/blog/post-1/", "{\"error\":404}")
		.serve("/blog/post-1/index.html", page("Post 1", "", "<article>First post</article>"));
	let navigator = navigator(document.clone(), loader, RecordingBrowser::at("/"));

	let outcome = navigator.navigate(click("/blog/post-1")).await;

	assert_eq!(outcome, Outcome::Swapped { url: at("/blog/post-1/") });
	assert_eq!(navigator.loader().calls().len(), 3);
	assert_eq!(mount_text(&document), "First post");
	assert_eq!(navigator.browser().pushed_paths(), ["/blog/post-1/"]);
	assert_eq!(active_links(&document), ["/blog/post-1"]);
}

#[wasm_bindgen_test]
async fn history_replay_does_not_push() {
	let document = fixture();
	let loader = FakeLoader::new().serve("/", home()).serve("/portfolio", portfolio());
	let navigator = navigator(document.clone(), loader, RecordingBrowser::at("/"));

	navigator.navigate(click("/portfolio")).await;
	assert_eq!(navigator.browser().pushed.borrow().len(), 1);

	navigator.browser().go("/");
	let outcome = navigator.navigate(NavigationRequest::history(at("/"))).await;

	assert_eq!(outcome, Outcome::Swapped { url: at("/") });
	assert_eq!(navigator.browser().pushed.borrow().len(), 1);
	assert_eq!(mount_text(&document), "Home content");
	assert_eq!(active_links(&document), ["/"]);
	// Page assets of the portfolio don't outlive it.
	assert!(document.get_element_by_id("portfolio-style").is_none());
}

#[wasm_bindgen_test]
async fn unreachable_target_falls_back_to_full_load() {
	let document = fixture();
	let navigator = navigator(document.clone(), FakeLoader::new(), RecordingBrowser::at("/"));

	let outcome = navigator.navigate(click("/portfolio")).await;

	match outcome {
		Outcome::HardNavigation { url, reason: NavError::Unresolved { tried } } => {
			assert_eq!(url, at("/portfolio"));
			assert_eq!(tried.len(), 3);
		}
		other => panic!("unexpected {:?}", other),
	}
	assert_eq!(*navigator.browser().hard.borrow(), [at("/portfolio")]);
	assert!(navigator.browser().pushed.borrow().is_empty());
}

#[wasm_bindgen_test]
async fn structural_failure_falls_back_to_full_load() {
	let document = fixture();
	let loader = FakeLoader::new().serve("/portfolio", "<!DOCTYPE html><html><body><p>No mount point here</p></body></html>");
	let navigator = navigator(document.clone(), loader, RecordingBrowser::at("/"));

	let outcome = navigator.navigate(click("/portfolio")).await;

	assert!(matches!(outcome, Outcome::HardNavigation { reason: NavError::NoFragment, .. }));
	assert_eq!(*navigator.browser().hard.borrow(), [at("/portfolio")]);
	assert_eq!(mount_text(&document), "Home content");
}

#[wasm_bindgen_test]
async fn current_page_is_not_fetched() {
	let document = fixture();
	let navigator = navigator(document.clone(), FakeLoader::new(), RecordingBrowser::at("/"));

	assert_eq!(navigator.navigate(click("/index.html")).await, Outcome::Unchanged);
	assert!(navigator.loader().calls().is_empty());
	assert!(navigator.browser().hard.borrow().is_empty());
}

#[wasm_bindgen_test]
async fn stale_navigation_is_discarded() {
	let document = fixture();
	let loader = FakeLoader::new()
		.respond("/portfolio", 50, Ok(portfolio()))
		.serve("/blog/post-1", page("Post 1", "", "<article>First post</article>"));
	let navigator = navigator(document.clone(), loader, RecordingBrowser::at("/"));

	let (slow, fast) = futures::join!(navigator.navigate(click("/portfolio")), navigator.navigate(click("/blog/post-1")));

	assert_eq!(slow, Outcome::Superseded);
	assert_eq!(fast, Outcome::Swapped { url: at("/blog/post-1") });
	assert_eq!(mount_text(&document), "First post");
	assert_eq!(navigator.browser().pushed_paths(), ["/blog/post-1"]);
	assert_eq!(active_links(&document), ["/blog/post-1"]);
	assert!(!state::is_locked(&document, &navigator.config().contract));
}

#[wasm_bindgen_test]
async fn images_are_awaited_before_reveal() {
	let document = fixture();
	let loader = FakeLoader::new().serve(
		"/gallery",
		page("Gallery", "", r#"<p>Gallery</p><img src="data:image/gif;base64,R0lGODlhAQABAAAAACw=" alt="">"#),
	);
	let navigator = Rc::new(Navigator::new(
		document.clone(),
		config().with_preload_images(true).with_image_timeout(IMAGE_TIMEOUT),
		loader,
		RecordingBrowser::at("/"),
	));

	let outcome = navigator.navigate(click("/gallery")).await;

	assert_eq!(outcome, Outcome::Swapped { url: at("/gallery") });
	assert_eq!(active_links(&document), Vec::<String>::new());
	assert!(!state::is_locked(&document, &navigator.config().contract));
}

#[wasm_bindgen_test]
async fn lock_covers_the_pending_fetch() {
	let document = fixture();
	let loader = FakeLoader::new().respond("/portfolio", 50, Ok(portfolio()));
	let navigator = navigator(document.clone(), loader, RecordingBrowser::at("/"));
	let contract = &navigator.config().contract;

	let (outcome, during) = futures::join!(navigator.navigate(click("/portfolio")), async {
		(state::is_locked(&document, contract), mount_text(&document))
	});

	assert_eq!(during, (true, "Home content".to_owned()));
	assert_eq!(outcome, Outcome::Swapped { url: at("/portfolio") });
	assert!(!state::is_locked(&document, contract));
}

#[wasm_bindgen_test]
async fn styles_are_awaited_before_reveal() {
	let document = fixture();
	let loader = FakeLoader::new().serve(
		"/styled",
		page("Styled", r#"<link data-page-asset rel="stylesheet" href="/softnav-missing.css">"#, "<p>Styled content</p>"),
	);
	let navigator = Rc::new(Navigator::new(
		document.clone(),
		config().with_style_timeout(IMAGE_TIMEOUT),
		loader,
		RecordingBrowser::at("/"),
	));
	let contract = &navigator.config().contract;

	// The load is served at once, so by the time the second future runs the content is in and the stylesheet in flight.
	let (outcome, during) = futures::join!(navigator.navigate(click("/styled")), async {
		(state::is_locked(&document, contract), mount_text(&document))
	});

	assert_eq!(during, (true, "Styled content".to_owned()));
	assert_eq!(outcome, Outcome::Swapped { url: at("/styled") });
	assert!(!state::is_locked(&document, contract));
}

#[wasm_bindgen_test]
async fn current_page_supersedes_pending_navigation() {
	let document = fixture();
	let loader = FakeLoader::new().respond("/portfolio", 50, Ok(portfolio()));
	let navigator = navigator(document.clone(), loader, RecordingBrowser::at("/"));

	let (slow, home) = futures::join!(navigator.navigate(click("/portfolio")), navigator.navigate(click("/")));

	assert_eq!(home, Outcome::Unchanged);
	assert_eq!(slow, Outcome::Superseded);
	assert!(!navigator.is_pending());
	assert_eq!(navigator.loader().calls(), ["/portfolio"]);
	assert_eq!(mount_text(&document), "Home content");
	assert!(navigator.browser().pushed.borrow().is_empty());
	assert!(!state::is_locked(&document, &navigator.config().contract));
}

#[wasm_bindgen_test]
async fn failed_push_falls_back_to_full_load() {
	let document = fixture();
	let loader = FakeLoader::new().serve("/portfolio", portfolio());
	let navigator = navigator(document.clone(), loader, RecordingBrowser::at("/"));
	navigator.browser().fail_push.set(true);

	let outcome = navigator.navigate(click("/portfolio")).await;

	assert!(matches!(outcome, Outcome::HardNavigation { reason: NavError::Js(_), .. }), "{:?}", outcome);
	assert_eq!(*navigator.browser().hard.borrow(), [at("/portfolio")]);
	assert!(navigator.browser().pushed.borrow().is_empty());
}

#[wasm_bindgen_test]
async fn fragment_target_is_scrolled_into_view() {
	let document = fixture();
	let loader = FakeLoader::new().serve("/portfolio", page("Portfolio", "", r#"<p>Portfolio</p><section id="contact">Contact</section>"#));
	let navigator = navigator(document.clone(), loader, RecordingBrowser::at("/"));

	let outcome = navigator.navigate(click("/portfolio#contact")).await;

	assert!(matches!(outcome, Outcome::Swapped { .. }));
	assert_eq!(*navigator.browser().scrolled_to.borrow(), ["contact"]);
	assert_eq!(navigator.browser().scrolls.get(), 0);
}

#[wasm_bindgen_test]
fn entrance_restarts_where_already_present() {
	let document = fixture_with(&format!(
		r#"{}<main id="app" class="page-enter"><div class="page-enter"><p>Home content</p></div></main>"#,
		NAV
	));
	let contract = Contract::default();

	assert_eq!(state::restart_entrance(&mount(&document), &contract), 2);

	assert!(mount(&document).class_list().contains("page-enter"));
	assert!(mount(&document).first_element_child().unwrap().class_list().contains("page-enter"));
}
