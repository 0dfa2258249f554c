//! Final quiz — section 5's trial (L'Héritage).
//!
//! Five four-option questions spanning the whole site. No explanations here:
//! the chosen option is judged, the right one highlighted, and the quiz
//! advances after a short delay. Passing (3/5) does not unlock a section —
//! it grants access to the State Alchemist certificate instead.

use std::cell::RefCell;

/// One multiple-choice question; `answer` indexes into `options`.
#[derive(Debug, Clone, Copy)]
pub struct ChoiceQuestion {
    pub prompt: &'static str,
    pub options: [&'static str; 4],
    pub answer: usize,
}

pub static QUESTIONS: [ChoiceQuestion; 5] = [
    ChoiceQuestion {
        prompt: "Quel est le vrai prénom d'Hiromu Arakawa ?",
        options: ["Hiromi", "Hiroko", "Hitomi", "Haruka"],
        answer: 0,
    },
    ChoiceQuestion {
        prompt: "Combien d'années Arakawa a travaillé à la ferme avant Tokyo ?",
        options: ["3 ans", "5 ans", "7 ans", "10 ans"],
        answer: 2,
    },
    ChoiceQuestion {
        prompt: "Quel manga se déroule dans un lycée agricole ?",
        options: [
            "Fullmetal Alchemist",
            "Silver Spoon",
            "Arslan Senki",
            "Tsugai",
        ],
        answer: 1,
    },
    ChoiceQuestion {
        prompt: "Combien de copies de FMA ont été vendues dans le monde ?",
        options: ["30 millions", "50 millions", "80 millions", "100 millions"],
        answer: 2,
    },
    ChoiceQuestion {
        prompt: "Sous quelle forme Arakawa se représente-t-elle ?",
        options: ["Un chat", "Une vache", "Un ours", "Un lapin"],
        answer: 1,
    },
];

/// Minimum correct answers to earn the certificate.
pub const PASS_THRESHOLD: u8 = 3;

/// Reveal time before auto-advancing (shorter than the terre quiz: no
/// explanation to read).
pub const ADVANCE_DELAY_MS: u32 = 1500;

/// One quiz run.
#[derive(Debug, Clone)]
pub struct FinalQuizSession {
    current: usize,
    score: u8,
    /// Index chosen for the current question, pending the deferred advance.
    chosen: Option<usize>,
    is_complete: bool,
}

impl FinalQuizSession {
    pub fn new() -> Self {
        Self {
            current: 0,
            score: 0,
            chosen: None,
            is_complete: false,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn chosen(&self) -> Option<usize> {
        self.chosen
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn is_finished(&self) -> bool {
        self.current >= QUESTIONS.len()
    }

    pub fn passed(&self) -> bool {
        self.is_finished() && self.score >= PASS_THRESHOLD
    }

    pub fn current_question(&self) -> Option<&'static ChoiceQuestion> {
        QUESTIONS.get(self.current)
    }

    /// Choose an option on the current question. Ignored while a reveal is
    /// pending, after the last question, or for an out-of-range index.
    pub fn choose(&mut self, option: usize) -> Option<bool> {
        if self.chosen.is_some() || self.is_finished() {
            return None;
        }
        let question = &QUESTIONS[self.current];
        if option >= question.options.len() {
            return None;
        }
        let correct = option == question.answer;
        if correct {
            self.score += 1;
        }
        self.chosen = Some(option);
        Some(correct)
    }

    /// Move past a revealed question; no-op unless one is pending. Sets the
    /// completion latch on a passing finish.
    pub fn advance(&mut self) -> bool {
        if self.chosen.is_none() || self.is_finished() {
            return false;
        }
        self.chosen = None;
        self.current += 1;
        if self.is_finished() && self.score >= PASS_THRESHOLD {
            self.is_complete = true;
        }
        true
    }
}

thread_local! {
    static SESSION: RefCell<Option<FinalQuizSession>> = const { RefCell::new(None) };
}

pub fn reset_session() {
    SESSION.with(|cell| *cell.borrow_mut() = None);
}

pub fn with_session<F, R>(f: F) -> R
where
    F: FnOnce(Option<&FinalQuizSession>) -> R,
{
    SESSION.with(|cell| f(cell.borrow().as_ref()))
}

/// Whether the final quiz has been passed this session — the certificate
/// routes gate on this.
pub fn is_passed() -> bool {
    with_session(|s| s.is_some_and(|s| s.passed()))
}

// ── Route-facing operations ────────────────────────────────────────

/// (Re)start the quiz and render the first question. Also the retry path.
pub fn open() -> String {
    let session = FinalQuizSession::new();
    let html = render(&session, false);
    SESSION.with(|cell| *cell.borrow_mut() = Some(session));
    html
}

pub fn view() -> String {
    SESSION.with(|cell| match cell.borrow().as_ref() {
        Some(session) => render(session, false),
        None => not_open(),
    })
}

/// Apply one option choice and render the reveal.
pub fn choose(option: usize) -> String {
    SESSION.with(|cell| match cell.borrow_mut().as_mut() {
        Some(session) => {
            session.choose(option);
            render(session, false)
        }
        None => not_open(),
    })
}

/// Advance past the revealed question (deferred callback target).
pub fn advance() -> String {
    SESSION.with(|cell| match cell.borrow_mut().as_mut() {
        Some(session) => {
            let moved = session.advance();
            let just_finished = moved && session.is_finished();
            render(session, just_finished)
        }
        None => not_open(),
    })
}

// ── Rendering ──────────────────────────────────────────────────────

fn not_open() -> String {
    r#"<span class="game-error">Le quiz final n'est pas encore ouvert.</span>"#.to_string()
}

fn render(session: &FinalQuizSession, just_finished: bool) -> String {
    if session.is_finished() {
        render_result(session, just_finished)
    } else {
        render_question(session)
    }
}

fn render_question(session: &FinalQuizSession) -> String {
    let question = match session.current_question() {
        Some(q) => q,
        None => return render_result(session, false),
    };
    let chosen = session.chosen();

    let mut html = String::with_capacity(2048);
    html.push_str(&format!(
        r#"<p class="final-quiz-question">{}</p>"#,
        question.prompt
    ));
    html.push_str(r#"<div class="final-quiz-options">"#);
    for (i, option) in question.options.iter().enumerate() {
        let mut classes = String::from("final-quiz-option");
        let mut disabled = "";
        if chosen.is_some() {
            disabled = " disabled";
            if i == question.answer {
                classes.push_str(" is-correct");
            } else if Some(i) == chosen {
                classes.push_str(" is-wrong");
            }
        }
        html.push_str(&format!(
            r#"<button class="{classes}" data-index="{i}"{disabled} onclick="htmx.ajax('POST', '/api/game/quiz-final', {{values: {{action: 'choose', option: '{i}'}}, target: '#final-quiz-area', swap: 'innerHTML'}})">{option}</button>"#,
            classes = classes,
            i = i,
            disabled = disabled,
            option = option,
        ));
    }
    html.push_str("</div>");

    if chosen.is_some() {
        html.push_str(&format!(
            "<script>setTimeout(function() {{\n\
             var area = document.getElementById('final-quiz-area');\n\
             if (area) {{ htmx.ajax('POST', '/api/game/quiz-final', {{values: {{action: 'advance'}}, target: '#final-quiz-area', swap: 'innerHTML'}}); }}\n\
             }}, {delay});</script>",
            delay = ADVANCE_DELAY_MS,
        ));
    }

    html.push_str(&format!(
        r#"<p class="final-quiz-progress">Question {} / {}</p>"#,
        session.current_index() + 1,
        QUESTIONS.len(),
    ));
    html.push_str(&format!(
        r#"<p id="final-quiz-score" class="quiz-score">Score : {} / {}</p>"#,
        session.score(),
        QUESTIONS.len(),
    ));
    html
}

fn render_result(session: &FinalQuizSession, _just_finished: bool) -> String {
    let passed = session.passed();
    let mut html = String::with_capacity(1024);
    html.push_str(r#"<div class="quiz-result">"#);
    if passed {
        html.push_str(
            r#"<h3 class="quiz-result__title is-won">&#x1F3C6; Félicitations, Alchimiste !</h3>"#,
        );
    } else {
        html.push_str(
            r#"<h3 class="quiz-result__title is-lost">&#x1F4DA; Continuez à étudier !</h3>"#,
        );
    }
    html.push_str(&format!(
        r#"<p>Votre score : <strong>{} / {}</strong></p>"#,
        session.score(),
        QUESTIONS.len(),
    ));
    if passed {
        html.push_str(
            r#"<p class="quiz-result__hint">Vous êtes digne du titre d'Alchimiste d'État !</p>"#,
        );
        // No section to unlock here: the reward is the certificate modal.
        html.push_str(
            "<button class=\"btn btn-primary\" id=\"get-certificate\" onclick=\"\
             if (window.arakawaUi) { arakawaUi.closeModal('modal-quiz-final'); arakawaUi.openModal('modal-certificate'); }\n\
             htmx.ajax('GET', '/api/certificate?action=form', {target: '#certificate-area', swap: 'innerHTML'});\
             \">Obtenir mon Certificat</button>",
        );
    } else {
        html.push_str(&format!(
            r#"<p class="quiz-result__hint">Il vous faut au moins {} bonnes réponses pour obtenir le certificat.</p>"#,
            PASS_THRESHOLD,
        ));
        html.push_str(
            r#"<button class="btn btn-secondary" id="retry-final-quiz" onclick="htmx.ajax('GET', '/api/game/quiz-final?action=open', {target: '#final-quiz-area', swap: 'innerHTML'})">Réessayer</button>"#,
        );
    }
    html.push_str("</div>");
    html
}
