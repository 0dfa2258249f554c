//! Transmutation circle — the gate of section 3 (Le Métal).
//!
//! Five alchemical symbols are laid out on a circle in shuffled display
//! order; the player must click them in their fixed ritual order. A correct
//! click locks the symbol in; any out-of-order click flags the clicked symbol
//! for a moment and resets progress to zero. Five correct clicks complete the
//! ritual and unlock section 4.

use std::cell::RefCell;

use crate::game::rng;

/// One symbol on the circle, with its required click order.
#[derive(Debug, Clone, Copy)]
pub struct RitualSymbol {
    pub id: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
    pub order: u8,
}

pub static SYMBOLS: [RitualSymbol; 5] = [
    RitualSymbol {
        id: "ouroboros",
        name: "Ouroboros",
        emoji: "\u{1F40D}",
        order: 0,
    },
    RitualSymbol {
        id: "sun",
        name: "Soleil",
        emoji: "\u{2600}\u{FE0F}",
        order: 1,
    },
    RitualSymbol {
        id: "moon",
        name: "Lune",
        emoji: "\u{1F319}",
        order: 2,
    },
    RitualSymbol {
        id: "flame",
        name: "Flamme",
        emoji: "\u{1F525}",
        order: 3,
    },
    RitualSymbol {
        id: "cross",
        name: "Croix de Flamel",
        emoji: "\u{271A}",
        order: 4,
    },
];

/// How long a wrongly clicked symbol keeps its penalty flag.
pub const WRONG_FLASH_MS: u32 = 500;

/// Delay before the completed ritual closes its modal and unlocks section 4.
pub const COMPLETE_DELAY_MS: u32 = 2000;

/// One ritual attempt. Progress is the count of correctly clicked symbols;
/// wrong clicks reset it but never undo a completed ritual.
#[derive(Debug, Clone)]
pub struct RitualSession {
    /// Display order of the symbols around the circle (indices into SYMBOLS).
    layout: Vec<u8>,
    /// Count of correct clicks so far; doubles as the next expected order.
    clicked: u8,
    /// Transient: the symbol flagged by the last wrong click, cleared on the
    /// next render of a settled view.
    wrong: Option<u8>,
    is_complete: bool,
}

impl RitualSession {
    pub fn new(layout: Vec<u8>) -> Self {
        Self {
            layout,
            clicked: 0,
            wrong: None,
            is_complete: false,
        }
    }

    pub fn shuffled(rng: &mut rng::Lcg) -> Self {
        let mut layout: Vec<u8> = (0..SYMBOLS.len() as u8).collect();
        rng::shuffle(rng, &mut layout);
        Self::new(layout)
    }

    pub fn layout(&self) -> &[u8] {
        &self.layout
    }

    pub fn progress(&self) -> u8 {
        self.clicked
    }

    pub fn wrong(&self) -> Option<u8> {
        self.wrong
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    /// Drop the transient penalty flag (settled view re-render).
    pub fn settle(&mut self) {
        self.wrong = None;
    }

    /// Click the symbol with the given order value.
    ///
    /// Returns `true` exactly once: on the click that completes the ritual.
    /// Frozen after completion; clicks on already-activated symbols are
    /// no-ops rather than penalties (they are unclickable on the page).
    pub fn click(&mut self, order: u8) -> bool {
        if self.is_complete || order as usize >= SYMBOLS.len() {
            return false;
        }
        if order < self.clicked {
            return false;
        }
        if order == self.clicked {
            self.wrong = None;
            self.clicked += 1;
            if self.clicked as usize == SYMBOLS.len() {
                self.is_complete = true;
                return true;
            }
        } else {
            // Out of order: reset the whole progression, flag the symbol.
            self.clicked = 0;
            self.wrong = Some(order);
        }
        false
    }
}

thread_local! {
    static SESSION: RefCell<Option<RitualSession>> = const { RefCell::new(None) };
}

pub fn reset_session() {
    SESSION.with(|cell| *cell.borrow_mut() = None);
}

pub fn with_session<F, R>(f: F) -> R
where
    F: FnOnce(Option<&RitualSession>) -> R,
{
    SESSION.with(|cell| f(cell.borrow().as_ref()))
}

// ── Route-facing operations ────────────────────────────────────────

/// (Re)initialize the circle with a fresh shuffled layout and render it.
pub fn open(seed: Option<u64>) -> String {
    if let Some(seed) = seed {
        rng::reseed(seed);
    }
    let session = rng::with_rng(RitualSession::shuffled);
    let html = render_circle(&session, false);
    SESSION.with(|cell| *cell.borrow_mut() = Some(session));
    html
}

/// Render the settled current state (also clears the penalty flag).
pub fn view() -> String {
    SESSION.with(|cell| match cell.borrow_mut().as_mut() {
        Some(session) => {
            session.settle();
            render_circle(session, false)
        }
        None => not_open(),
    })
}

/// Apply one symbol click (by symbol id) and render the result.
pub fn click_symbol(symbol_id: &str) -> String {
    let Some(symbol) = SYMBOLS.iter().find(|s| s.id == symbol_id) else {
        return format!(
            r#"<span class="game-error">Symbole inconnu : {}</span>"#,
            symbol_id
        );
    };
    SESSION.with(|cell| match cell.borrow_mut().as_mut() {
        Some(session) => {
            let just_completed = session.click(symbol.order);
            render_circle(session, just_completed)
        }
        None => not_open(),
    })
}

// ── Rendering ──────────────────────────────────────────────────────

fn not_open() -> String {
    r#"<span class="game-error">Le cercle n'est pas encore tracé.</span>"#.to_string()
}

fn render_circle(session: &RitualSession, just_completed: bool) -> String {
    let mut html = String::with_capacity(2048);
    let circle_class = if session.is_complete() {
        "transmutation-circle transmutation-effect is-active"
    } else {
        "transmutation-circle"
    };
    html.push_str(&format!(r#"<div class="{}">"#, circle_class));
    html.push_str(r#"<div class="transmutation-inner"></div>"#);

    for (pos, &idx) in session.layout().iter().enumerate() {
        let symbol = &SYMBOLS[idx as usize];
        let mut classes = String::from("transmutation-symbol");
        let active = symbol.order < session.progress() || session.is_complete();
        if active {
            classes.push_str(" is-active");
        }
        if session.wrong() == Some(symbol.order) {
            classes.push_str(" is-wrong");
        }
        let onclick = if active || session.is_complete() {
            String::new()
        } else {
            format!(
                r#" onclick="htmx.ajax('POST', '/api/game/transmutation', {{values: {{symbol: '{}'}}, target: '#transmutation-game-area', swap: 'innerHTML'}})""#,
                symbol.id
            )
        };
        html.push_str(&format!(
            r#"<button class="{classes}" data-symbol="{id}" data-order="{order}" style="--angle: {angle}deg"{onclick}><span class="transmutation-symbol__emoji">{emoji}</span><span class="transmutation-symbol__name">{name}</span></button>"#,
            classes = classes,
            id = symbol.id,
            order = symbol.order,
            angle = (pos as i32) * 72 - 90,
            onclick = onclick,
            emoji = symbol.emoji,
            name = symbol.name,
        ));
    }

    html.push_str("</div>");

    if session.is_complete() {
        html.push_str(
            r#"<p id="transmutation-status" class="game-status is-won">&#x2728; Transmutation réussie !</p>"#,
        );
    } else if session.wrong().is_some() {
        html.push_str(
            r#"<p id="transmutation-status" class="game-status is-lost">Mauvais ordre ! Réessayez depuis le début.</p>"#,
        );
        // Let the flagged symbol flash, then settle the board.
        html.push_str(&format!(
            "<script>setTimeout(function() {{\n\
             var area = document.getElementById('transmutation-game-area');\n\
             if (area) {{ htmx.ajax('GET', '/api/game/transmutation?action=view', {{target: '#transmutation-game-area', swap: 'innerHTML'}}); }}\n\
             }}, {delay});</script>",
            delay = WRONG_FLASH_MS,
        ));
    } else {
        html.push_str(&format!(
            r#"<p id="transmutation-status" class="game-status">{}/{} symboles activés</p>"#,
            session.progress(),
            SYMBOLS.len(),
        ));
        html.push_str(
            r#"<p class="transmutation-hint accent-text">Cliquez les symboles dans l'ordre : Ouroboros &#x2192; Soleil &#x2192; Lune &#x2192; Flamme &#x2192; Croix</p>"#,
        );
    }

    if just_completed {
        html.push_str(&format!(
            "<script>setTimeout(function() {{\n\
             if (window.arakawaUi) {{ arakawaUi.closeModal('modal-transmutation'); }}\n\
             htmx.ajax('POST', '/api/progress/unlock', {{values: {{section: '4'}}, target: '#unlock-effects', swap: 'innerHTML'}});\n\
             }}, {delay});</script>",
            delay = COMPLETE_DELAY_MS,
        ));
    }

    html
}
