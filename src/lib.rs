//! Arakawa tribute site — in-browser WASM server.
//!
//! Exports `handle_request(method, path, query, body)` for the Service Worker
//! bridge to call. Uses `matchit` for URL routing — the same router engine
//! that powers Axum.
//!
//! The site is a single page with five progressively unlocked sections, each
//! gated by a mini-game. This crate owns all progression and game-session
//! state (thread-local, alive for the worker's lifetime) and returns HTML
//! fragments for HTMX to swap into the page. Persistence goes through a
//! localStorage bridge: restore on load, persist scripts on every unlock.

use wasm_bindgen::prelude::*;

pub mod game;
pub mod routes;
pub mod sections;

/// Process an HTTP-like request and return an HTML fragment.
///
/// Called from JavaScript (Web Worker) via wasm-bindgen.
///
/// # Arguments
/// * `method` — HTTP method (e.g., "GET", "POST")
/// * `path`   — URL path (e.g., "/api/progress/unlock")
/// * `query`  — Query string (e.g., "?action=open&seed=173")
/// * `body`   — Request body (e.g., POST form data). Empty string for GET requests.
///
/// # Returns
/// An HTML string fragment suitable for HTMX to swap into the DOM (or JSON
/// for the state route).
#[wasm_bindgen]
pub fn handle_request(method: &str, path: &str, query: &str, body: &str) -> String {
    // Build the router. matchit compiles route patterns into a radix tree.
    let mut router = matchit::Router::new();

    // Register routes — the value is a &str tag we match on below
    router.insert("/api/progress/state", "progress_state").ok();
    router
        .insert("/api/progress/restore", "progress_restore")
        .ok();
    router.insert("/api/progress/unlock", "progress_unlock").ok();
    router.insert("/api/progress/reset", "progress_reset").ok();
    router
        .insert("/api/progress/sections", "progress_sections")
        .ok();
    router.insert("/api/progress/rail", "progress_rail").ok();

    router.insert("/api/game/puzzle", "puzzle").ok();
    router.insert("/api/game/quiz-terre", "quiz_terre").ok();
    router
        .insert("/api/game/transmutation", "transmutation")
        .ok();
    router.insert("/api/game/matching", "matching").ok();
    router.insert("/api/game/quiz-final", "quiz_final").ok();

    router.insert("/api/certificate", "certificate").ok();
    router
        .insert("/api/certificate/export", "certificate_export")
        .ok();

    match router.at(path) {
        Ok(matched) => match (*matched.value, method) {
            // Progression
            ("progress_state", "GET") => routes::progress::handle_state_get(query),
            ("progress_restore", "POST") => routes::progress::handle_restore_post(body),
            ("progress_unlock", "POST") => routes::progress::handle_unlock_post(body),
            ("progress_reset", "POST") => routes::progress::handle_reset_post(body),
            ("progress_sections", "GET") => routes::progress::handle_sections_get(query),
            ("progress_rail", "GET") => routes::progress::handle_rail_get(query),

            // Mini-games
            ("puzzle", "GET") => routes::games::handle_puzzle_get(query),
            ("puzzle", "POST") => routes::games::handle_puzzle_post(body),
            ("quiz_terre", "GET") => routes::games::handle_quiz_terre_get(query),
            ("quiz_terre", "POST") => routes::games::handle_quiz_terre_post(body),
            ("transmutation", "GET") => routes::games::handle_transmutation_get(query),
            ("transmutation", "POST") => routes::games::handle_transmutation_post(body),
            ("matching", "GET") => routes::games::handle_matching_get(query),
            ("matching", "POST") => routes::games::handle_matching_post(body),
            ("quiz_final", "GET") => routes::games::handle_quiz_final_get(query),
            ("quiz_final", "POST") => routes::games::handle_quiz_final_post(body),

            // Certificate
            ("certificate", "GET") => routes::certificate::handle_certificate_get(query),
            ("certificate", "POST") => routes::certificate::handle_certificate_post(body),
            ("certificate_export", "POST") => routes::certificate::handle_export_post(body),

            _ => method_not_allowed(),
        },
        Err(_) => not_found(),
    }
}

fn not_found() -> String {
    r#"<span class="game-error">404 — route not found</span>"#.to_string()
}

fn method_not_allowed() -> String {
    r#"<span class="game-error">405 — method not allowed</span>"#.to_string()
}
