//! Symbol/work matching game — the gate of section 4 (Le Multivers).
//!
//! Four symbols and the four works they stand for, in two shuffled columns.
//! The player selects one card per column; matching ids commit the pair for
//! good, a mismatch flashes both cards and only clears the pending
//! selections. All four pairs matched unlocks section 5.

use std::cell::RefCell;

use crate::game::rng;

/// One id-linked pair: a symbol card and a work card.
#[derive(Debug, Clone, Copy)]
pub struct MatchPair {
    pub id: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
    pub work: &'static str,
}

pub static PAIRS: [MatchPair; 4] = [
    MatchPair {
        id: "fma",
        symbol: "\u{2699}\u{FE0F}",
        name: "Bras d'acier",
        work: "Fullmetal Alchemist",
    },
    MatchPair {
        id: "spoon",
        symbol: "\u{1F944}",
        name: "Cuillère",
        work: "Silver Spoon",
    },
    MatchPair {
        id: "arslan",
        symbol: "\u{2694}\u{FE0F}",
        name: "Épée",
        work: "Arslan Senki",
    },
    MatchPair {
        id: "tsugai",
        symbol: "\u{1F465}",
        name: "Jumeaux",
        work: "Tsugai",
    },
];

/// How long mismatched cards keep their penalty flag.
pub const MISMATCH_FLASH_MS: u32 = 600;

/// Delay before the finished game closes its modal and unlocks section 5.
pub const COMPLETE_DELAY_MS: u32 = 1500;

/// Which column a card belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSide {
    Symbol,
    Work,
}

impl CardSide {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "symbol" => Some(Self::Symbol),
            "work" => Some(Self::Work),
            _ => None,
        }
    }
}

/// One matching attempt. `matched` only grows; pending selections are the
/// only state a mismatch resets.
#[derive(Debug, Clone)]
pub struct MatchingSession {
    symbol_layout: Vec<u8>,
    work_layout: Vec<u8>,
    selected_symbol: Option<&'static str>,
    selected_work: Option<&'static str>,
    matched: Vec<&'static str>,
    /// Transient: ids of the last mismatched (symbol, work) selection.
    mismatch: Option<(&'static str, &'static str)>,
    is_complete: bool,
}

impl MatchingSession {
    pub fn new(symbol_layout: Vec<u8>, work_layout: Vec<u8>) -> Self {
        Self {
            symbol_layout,
            work_layout,
            selected_symbol: None,
            selected_work: None,
            matched: Vec::new(),
            mismatch: None,
            is_complete: false,
        }
    }

    pub fn shuffled(rng: &mut rng::Lcg) -> Self {
        let mut symbols: Vec<u8> = (0..PAIRS.len() as u8).collect();
        let mut works: Vec<u8> = (0..PAIRS.len() as u8).collect();
        rng::shuffle(rng, &mut symbols);
        rng::shuffle(rng, &mut works);
        Self::new(symbols, works)
    }

    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }

    pub fn is_matched(&self, id: &str) -> bool {
        self.matched.iter().any(|&m| m == id)
    }

    pub fn selected(&self, side: CardSide) -> Option<&'static str> {
        match side {
            CardSide::Symbol => self.selected_symbol,
            CardSide::Work => self.selected_work,
        }
    }

    pub fn mismatch(&self) -> Option<(&'static str, &'static str)> {
        self.mismatch
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    /// Drop the transient mismatch flags (settled view re-render).
    pub fn settle(&mut self) {
        self.mismatch = None;
    }

    /// Select a card. Re-selecting the pending card deselects it; selecting
    /// another card on the same side replaces the pending one. When both
    /// sides are pending the pair resolves immediately.
    ///
    /// Returns `true` exactly once: on the match that completes the game.
    pub fn select(&mut self, side: CardSide, id: &str) -> bool {
        if self.is_complete {
            return false;
        }
        let Some(pair) = PAIRS.iter().find(|p| p.id == id) else {
            return false;
        };
        if self.is_matched(pair.id) {
            return false;
        }
        self.mismatch = None;

        let slot = match side {
            CardSide::Symbol => &mut self.selected_symbol,
            CardSide::Work => &mut self.selected_work,
        };
        if *slot == Some(pair.id) {
            *slot = None;
            return false;
        }
        *slot = Some(pair.id);

        if let (Some(symbol_id), Some(work_id)) = (self.selected_symbol, self.selected_work) {
            self.selected_symbol = None;
            self.selected_work = None;
            if symbol_id == work_id {
                self.matched.push(symbol_id);
                if self.matched.len() == PAIRS.len() {
                    self.is_complete = true;
                    return true;
                }
            } else {
                self.mismatch = Some((symbol_id, work_id));
            }
        }
        false
    }
}

thread_local! {
    static SESSION: RefCell<Option<MatchingSession>> = const { RefCell::new(None) };
}

pub fn reset_session() {
    SESSION.with(|cell| *cell.borrow_mut() = None);
}

pub fn with_session<F, R>(f: F) -> R
where
    F: FnOnce(Option<&MatchingSession>) -> R,
{
    SESSION.with(|cell| f(cell.borrow().as_ref()))
}

// ── Route-facing operations ────────────────────────────────────────

/// (Re)initialize both columns with fresh shuffles and render the board.
pub fn open(seed: Option<u64>) -> String {
    if let Some(seed) = seed {
        rng::reseed(seed);
    }
    let session = rng::with_rng(MatchingSession::shuffled);
    let html = render_board(&session, false);
    SESSION.with(|cell| *cell.borrow_mut() = Some(session));
    html
}

/// Render the settled current state (also clears mismatch flags).
pub fn view() -> String {
    SESSION.with(|cell| match cell.borrow_mut().as_mut() {
        Some(session) => {
            session.settle();
            render_board(session, false)
        }
        None => not_open(),
    })
}

/// Apply one card selection and render the result.
pub fn select_card(side_raw: &str, id: &str) -> String {
    let Some(side) = CardSide::parse(side_raw) else {
        return format!(
            r#"<span class="game-error">Type de carte inconnu : {}</span>"#,
            side_raw
        );
    };
    SESSION.with(|cell| match cell.borrow_mut().as_mut() {
        Some(session) => {
            let just_completed = session.select(side, id);
            render_board(session, just_completed)
        }
        None => not_open(),
    })
}

// ── Rendering ──────────────────────────────────────────────────────

fn not_open() -> String {
    r#"<span class="game-error">Le jeu d'association n'est pas encore ouvert.</span>"#.to_string()
}

fn card_classes(session: &MatchingSession, side: CardSide, pair: &MatchPair) -> String {
    let mut classes = format!(
        "matching-card matching-card--{}",
        match side {
            CardSide::Symbol => "symbol",
            CardSide::Work => "work",
        }
    );
    if session.is_matched(pair.id) {
        classes.push_str(" is-matched");
    }
    if session.selected(side) == Some(pair.id) {
        classes.push_str(" is-selected");
    }
    if let Some((symbol_id, work_id)) = session.mismatch() {
        let flagged = match side {
            CardSide::Symbol => symbol_id,
            CardSide::Work => work_id,
        };
        if flagged == pair.id {
            classes.push_str(" is-wrong");
        }
    }
    classes
}

fn render_card(session: &MatchingSession, side: CardSide, pair: &MatchPair) -> String {
    let side_name = match side {
        CardSide::Symbol => "symbol",
        CardSide::Work => "work",
    };
    let onclick = if session.is_matched(pair.id) || session.is_complete() {
        String::new()
    } else {
        format!(
            r#" onclick="htmx.ajax('POST', '/api/game/matching', {{values: {{type: '{side}', id: '{id}'}}, target: '#matching-game-area', swap: 'innerHTML'}})""#,
            side = side_name,
            id = pair.id,
        )
    };
    let body = match side {
        CardSide::Symbol => format!(
            r#"<span class="matching-card__icon">{}</span><span class="matching-card__label">{}</span>"#,
            pair.symbol, pair.name
        ),
        CardSide::Work => pair.work.to_string(),
    };
    format!(
        r#"<button class="{classes}" data-id="{id}" data-type="{side}"{onclick}>{body}</button>"#,
        classes = card_classes(session, side, pair),
        id = pair.id,
        side = side_name,
        onclick = onclick,
        body = body,
    )
}

fn render_board(session: &MatchingSession, just_completed: bool) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str(r#"<div class="matching-container">"#);

    html.push_str(r#"<div class="matching-column matching-symbols"><h4>Symboles</h4>"#);
    for &idx in session.symbol_layout.iter() {
        html.push_str(&render_card(session, CardSide::Symbol, &PAIRS[idx as usize]));
    }
    html.push_str("</div>");

    html.push_str(r#"<div class="matching-column matching-works"><h4>Œuvres</h4>"#);
    for &idx in session.work_layout.iter() {
        html.push_str(&render_card(session, CardSide::Work, &PAIRS[idx as usize]));
    }
    html.push_str("</div></div>");

    if session.is_complete() {
        html.push_str(
            r#"<p id="matching-status" class="game-status is-won">&#x1F389; Toutes les paires trouvées !</p>"#,
        );
    } else {
        html.push_str(&format!(
            r#"<p id="matching-status" class="game-status">{}/{} paires trouvées</p>"#,
            session.matched_count(),
            PAIRS.len(),
        ));
    }

    if session.mismatch().is_some() {
        // Flash the two wrong cards, then settle the board.
        html.push_str(&format!(
            "<script>setTimeout(function() {{\n\
             var area = document.getElementById('matching-game-area');\n\
             if (area) {{ htmx.ajax('GET', '/api/game/matching?action=view', {{target: '#matching-game-area', swap: 'innerHTML'}}); }}\n\
             }}, {delay});</script>",
            delay = MISMATCH_FLASH_MS,
        ));
    }

    if just_completed {
        html.push_str(&format!(
            "<script>setTimeout(function() {{\n\
             if (window.arakawaUi) {{ arakawaUi.closeModal('modal-matching'); }}\n\
             htmx.ajax('POST', '/api/progress/unlock', {{values: {{section: '5'}}, target: '#unlock-effects', swap: 'innerHTML'}});\n\
             }}, {delay});</script>",
            delay = COMPLETE_DELAY_MS,
        ));
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reset_state() {
        reset_session();
    }

    fn plain() -> MatchingSession {
        MatchingSession::new(vec![0, 1, 2, 3], vec![0, 1, 2, 3])
    }

    #[test]
    fn matching_pair_commits() {
        let mut session = plain();
        assert!(!session.select(CardSide::Symbol, "fma"));
        assert_eq!(session.selected(CardSide::Symbol), Some("fma"));
        assert!(!session.select(CardSide::Work, "fma"));
        assert_eq!(session.matched_count(), 1);
        assert!(session.is_matched("fma"));
        // Pending selections cleared by the commit.
        assert!(session.selected(CardSide::Symbol).is_none());
        assert!(session.selected(CardSide::Work).is_none());
    }

    #[test]
    fn mismatch_clears_selections_without_penalty() {
        let mut session = plain();
        session.select(CardSide::Symbol, "fma");
        session.select(CardSide::Work, "spoon");
        assert_eq!(session.matched_count(), 0);
        assert_eq!(session.mismatch(), Some(("fma", "spoon")));
        assert!(session.selected(CardSide::Symbol).is_none());
        assert!(session.selected(CardSide::Work).is_none());
        // Settled view drops the transient flags.
        session.settle();
        assert!(session.mismatch().is_none());
    }

    #[test]
    fn reselecting_deselects() {
        let mut session = plain();
        session.select(CardSide::Symbol, "arslan");
        assert_eq!(session.selected(CardSide::Symbol), Some("arslan"));
        session.select(CardSide::Symbol, "arslan");
        assert!(session.selected(CardSide::Symbol).is_none());
    }

    #[test]
    fn same_side_selection_replaces() {
        let mut session = plain();
        session.select(CardSide::Symbol, "fma");
        session.select(CardSide::Symbol, "spoon");
        assert_eq!(session.selected(CardSide::Symbol), Some("spoon"));
        // Work side still empty, nothing resolved.
        assert_eq!(session.matched_count(), 0);
        assert!(session.mismatch().is_none());
    }

    #[test]
    fn matched_cards_ignore_further_clicks() {
        let mut session = plain();
        session.select(CardSide::Symbol, "fma");
        session.select(CardSide::Work, "fma");
        assert!(!session.select(CardSide::Symbol, "fma"));
        assert!(session.selected(CardSide::Symbol).is_none());
        assert_eq!(session.matched_count(), 1);
    }

    #[test]
    fn mismatch_never_rolls_back_committed_pairs() {
        let mut session = plain();
        session.select(CardSide::Symbol, "fma");
        session.select(CardSide::Work, "fma");
        session.select(CardSide::Symbol, "spoon");
        session.select(CardSide::Work, "tsugai");
        assert_eq!(session.matched_count(), 1);
        assert!(session.is_matched("fma"));
    }

    #[test]
    fn four_matches_complete_exactly_once() {
        let mut session = plain();
        let mut completions = 0;
        for pair in PAIRS.iter() {
            session.select(CardSide::Symbol, pair.id);
            if session.select(CardSide::Work, pair.id) {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert!(session.is_complete());
        // Frozen afterwards.
        assert!(!session.select(CardSide::Symbol, "fma"));
    }

    #[test]
    fn unknown_id_is_ignored() {
        let mut session = plain();
        assert!(!session.select(CardSide::Symbol, "hagaren"));
        assert!(session.selected(CardSide::Symbol).is_none());
    }

    #[test]
    fn open_renders_both_columns() {
        reset_state();
        let html = open(Some(5));
        assert!(html.contains("Symboles"));
        assert!(html.contains("Œuvres"));
        for pair in PAIRS.iter() {
            assert!(html.contains(pair.id));
            assert!(html.contains(pair.work));
        }
        assert!(html.contains("0/4 paires trouvées"));
        reset_state();
    }

    #[test]
    fn mismatch_renders_flash_and_settle_refresh() {
        reset_state();
        open(Some(5));
        select_card("symbol", "fma");
        let html = select_card("work", "spoon");
        assert!(html.contains("is-wrong"));
        assert!(html.contains("action=view"));
        assert!(html.contains("600"));
        let settled = view();
        assert!(!settled.contains("is-wrong"));
        reset_state();
    }

    #[test]
    fn selection_renders_selected_class() {
        reset_state();
        open(Some(5));
        let html = select_card("symbol", "tsugai");
        assert!(html.contains("is-selected"));
        reset_state();
    }

    #[test]
    fn full_game_fires_unlock_once() {
        reset_state();
        open(Some(5));
        let mut last = String::new();
        for pair in PAIRS.iter() {
            select_card("symbol", pair.id);
            last = select_card("work", pair.id);
        }
        assert!(last.contains("Toutes les paires trouvées"));
        assert!(last.contains("modal-matching"));
        assert!(last.contains("section: '5'"));
        assert!(!view().contains("/api/progress/unlock"));
        reset_state();
    }

    #[test]
    fn bad_side_is_an_error_fragment() {
        reset_state();
        open(Some(5));
        let html = select_card("relic", "fma");
        assert!(html.contains("Type de carte inconnu"));
        reset_state();
    }
}
