//! `/api/progress/*` routes — progression state, persistence bridge, and
//! section/rail rendering.
//!
//! The page worker calls these on load (restore + reconcile) and the game
//! engines call `unlock` on completion. All state logic lives in
//! `game::progress`; handlers only parse parameters.

use crate::game::progress;
use crate::routes::util::{get_param, parse_form_body};
use crate::sections;

// ── GET /api/progress/state ────────────────────────────────────────

/// Handle GET /api/progress/state
/// Returns the current progress record as JSON.
pub fn handle_state_get(_query: &str) -> String {
    progress::export_state_json()
}

// ── POST /api/progress/restore ─────────────────────────────────────

/// Handle POST /api/progress/restore
/// Body: the raw localStorage value of the progress key (possibly empty).
/// Called by the page bridge on load, before anything else. Malformed data
/// degrades to the default record; this route never fails.
pub fn handle_restore_post(body: &str) -> String {
    let unlocked = progress::restore_from_json(body);
    format!("<!-- [arakawa-debug] restored unlocked={} -->ok", unlocked)
}

// ── POST /api/progress/unlock ──────────────────────────────────────

/// Handle POST /api/progress/unlock
/// Body params:
///   - section={n} → advance the unlock state to section n
///
/// The only path that increases the unlock state. Duplicate or out-of-order
/// requests return a no-op comment; a real advance returns the full effect
/// chain (persist script, visuals, toast, deferred scroll).
pub fn handle_unlock_post(body: &str) -> String {
    let params = parse_form_body(body);
    let requested: u8 = match get_param(&params, "section").and_then(|s| s.parse().ok()) {
        Some(n) => n,
        None => {
            return r#"<span class="game-error">Missing or invalid section parameter</span>"#
                .to_string();
        }
    };

    if !progress::unlock_section(requested) {
        return progress::render_unlock_ignored(requested);
    }
    // unlock_section clamps, so the section lookup cannot miss here.
    match sections::find_section(progress::unlocked_sections()) {
        Some(section) => progress::render_unlock_effects(section),
        None => progress::render_unlock_ignored(requested),
    }
}

// ── POST /api/progress/reset ───────────────────────────────────────

/// Handle POST /api/progress/reset
/// Clears the stored record and starts the session over from section 1.
pub fn handle_reset_post(_body: &str) -> String {
    progress::init_progress();
    let mut html = String::from("<!-- [arakawa-debug] progress reset -->");
    html.push_str(&progress::clear_script());
    html.push_str(&progress::render_sections_state());
    html
}

// ── GET /api/progress/sections ─────────────────────────────────────

/// Handle GET /api/progress/sections
/// Reconciliation fragment applied at startup: locked/unlocked visuals for
/// sections 2..=5 derived from the loaded state.
pub fn handle_sections_get(_query: &str) -> String {
    progress::render_sections_state()
}

// ── GET /api/progress/rail ─────────────────────────────────────────

/// Handle GET /api/progress/rail
/// The progress rail (liquid fill + markers), refreshed after every unlock.
pub fn handle_rail_get(_query: &str) -> String {
    progress::render_rail()
}
