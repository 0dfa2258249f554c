//! Compiled-in catalog of the five site sections.
//!
//! Sections are numbered 1..=5 and gate on each other in order: the
//! mini-game of section N unlocks section N+1 (the final quiz gates the
//! certificate instead). Slugs double as the anchor ids used by the page.

/// One chapter of the tribute site.
#[derive(Debug, Clone, Copy)]
pub struct Section {
    /// 1-based section number.
    pub number: u8,
    /// Anchor id of the `<section>` element, also used for nav/marker ids.
    pub slug: &'static str,
    /// Display title shown in toasts and navigation.
    pub title: &'static str,
    /// Game id served under `/api/game/{game_id}`.
    pub game_id: &'static str,
    /// Id of the modal that presents the game.
    pub modal_id: &'static str,
}

pub static SECTIONS: [Section; 5] = [
    Section {
        number: 1,
        slug: "atelier",
        title: "L'Atelier",
        game_id: "puzzle",
        modal_id: "modal-puzzle",
    },
    Section {
        number: 2,
        slug: "terre",
        title: "La Terre",
        game_id: "quiz-terre",
        modal_id: "modal-quiz-terre",
    },
    Section {
        number: 3,
        slug: "metal",
        title: "Le Métal",
        game_id: "transmutation",
        modal_id: "modal-transmutation",
    },
    Section {
        number: 4,
        slug: "multivers",
        title: "Le Multivers",
        game_id: "matching",
        modal_id: "modal-matching",
    },
    Section {
        number: 5,
        slug: "heritage",
        title: "L'Héritage",
        game_id: "quiz-final",
        modal_id: "modal-quiz-final",
    },
];

/// Look up a section by its 1-based number.
pub fn find_section(number: u8) -> Option<&'static Section> {
    SECTIONS.iter().find(|s| s.number == number)
}

/// Look up the section whose mini-game has the given id.
pub fn find_by_game(game_id: &str) -> Option<&'static Section> {
    SECTIONS.iter().find(|s| s.game_id == game_id)
}
