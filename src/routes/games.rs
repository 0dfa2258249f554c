//! `/api/game/*` routes — one GET/POST pair per mini-game.
//!
//! GET carries an `action` query param (`open` re-initializes the session and
//! reshuffles from the optional `seed`; `view` re-renders the settled current
//! state). POST carries the game-specific input. All session state and
//! rendering live in the `game::*` engine modules.

use crate::game::{matching, puzzle, quiz_final, quiz_terre, transmutation};
use crate::routes::util::{get_param, parse_form_body, parse_query};

fn parse_seed(params: &[(String, String)]) -> Option<u64> {
    get_param(params, "seed").and_then(|s| s.parse().ok())
}

fn unknown_action(action: &str) -> String {
    format!(
        r#"<span class="game-error">Unknown action: {}</span>"#,
        action
    )
}

// ── /api/game/puzzle ───────────────────────────────────────────────

/// Handle GET /api/game/puzzle?action=open|view[&seed=N]
pub fn handle_puzzle_get(query: &str) -> String {
    let params = parse_query(query);
    match get_param(&params, "action").unwrap_or("open") {
        "open" => puzzle::open(parse_seed(&params)),
        "view" => puzzle::view(),
        other => unknown_action(other),
    }
}

/// Handle POST /api/game/puzzle
/// Body params: `from={slot}&to={slot}` — swap the pieces on two grid slots.
pub fn handle_puzzle_post(body: &str) -> String {
    let params = parse_form_body(body);
    let from = get_param(&params, "from").and_then(|s| s.parse::<usize>().ok());
    let to = get_param(&params, "to").and_then(|s| s.parse::<usize>().ok());
    match (from, to) {
        (Some(from), Some(to)) => puzzle::swap_pieces(from, to),
        _ => r#"<span class="game-error">Missing or invalid from/to parameters</span>"#.to_string(),
    }
}

// ── /api/game/quiz-terre ───────────────────────────────────────────

/// Handle GET /api/game/quiz-terre?action=open|view
/// `open` doubles as the retry path.
pub fn handle_quiz_terre_get(query: &str) -> String {
    let params = parse_query(query);
    match get_param(&params, "action").unwrap_or("open") {
        "open" => quiz_terre::open(),
        "view" => quiz_terre::view(),
        other => unknown_action(other),
    }
}

/// Handle POST /api/game/quiz-terre
/// Body params:
///   - action=answer&value=true|false → judge the current question
///   - action=advance                 → move past the reveal (deferred)
pub fn handle_quiz_terre_post(body: &str) -> String {
    let params = parse_form_body(body);
    match get_param(&params, "action").unwrap_or("") {
        "answer" => match get_param(&params, "value") {
            Some("true") => quiz_terre::answer(true),
            Some("false") => quiz_terre::answer(false),
            _ => r#"<span class="game-error">Missing or invalid value parameter</span>"#.to_string(),
        },
        "advance" => quiz_terre::advance(),
        other => unknown_action(other),
    }
}

// ── /api/game/transmutation ────────────────────────────────────────

/// Handle GET /api/game/transmutation?action=open|view[&seed=N]
pub fn handle_transmutation_get(query: &str) -> String {
    let params = parse_query(query);
    match get_param(&params, "action").unwrap_or("open") {
        "open" => transmutation::open(parse_seed(&params)),
        "view" => transmutation::view(),
        other => unknown_action(other),
    }
}

/// Handle POST /api/game/transmutation
/// Body params: `symbol={id}` — click one circle symbol.
pub fn handle_transmutation_post(body: &str) -> String {
    let params = parse_form_body(body);
    match get_param(&params, "symbol") {
        Some(id) if !id.is_empty() => transmutation::click_symbol(id),
        _ => r#"<span class="game-error">Missing symbol parameter</span>"#.to_string(),
    }
}

// ── /api/game/matching ─────────────────────────────────────────────

/// Handle GET /api/game/matching?action=open|view[&seed=N]
pub fn handle_matching_get(query: &str) -> String {
    let params = parse_query(query);
    match get_param(&params, "action").unwrap_or("open") {
        "open" => matching::open(parse_seed(&params)),
        "view" => matching::view(),
        other => unknown_action(other),
    }
}

/// Handle POST /api/game/matching
/// Body params: `type=symbol|work&id={pair}` — select one card.
pub fn handle_matching_post(body: &str) -> String {
    let params = parse_form_body(body);
    let side = get_param(&params, "type").unwrap_or("");
    match get_param(&params, "id") {
        Some(id) if !id.is_empty() => matching::select_card(side, id),
        _ => r#"<span class="game-error">Missing id parameter</span>"#.to_string(),
    }
}

// ── /api/game/quiz-final ───────────────────────────────────────────

/// Handle GET /api/game/quiz-final?action=open|view
pub fn handle_quiz_final_get(query: &str) -> String {
    let params = parse_query(query);
    match get_param(&params, "action").unwrap_or("open") {
        "open" => quiz_final::open(),
        "view" => quiz_final::view(),
        other => unknown_action(other),
    }
}

/// Handle POST /api/game/quiz-final
/// Body params:
///   - action=choose&option={0..3} → pick an option
///   - action=advance              → move past the reveal (deferred)
pub fn handle_quiz_final_post(body: &str) -> String {
    let params = parse_form_body(body);
    match get_param(&params, "action").unwrap_or("") {
        "choose" => match get_param(&params, "option").and_then(|s| s.parse::<usize>().ok()) {
            Some(option) => quiz_final::choose(option),
            None => {
                r#"<span class="game-error">Missing or invalid option parameter</span>"#.to_string()
            }
        },
        "advance" => quiz_final::advance(),
        other => unknown_action(other),
    }
}
