//! True/false quiz — the gate of section 2 (La Terre).
//!
//! Five fixed questions about Arakawa's farm years. Each answer is revealed
//! immediately with an explanation, then the quiz advances after a fixed
//! delay regardless of correctness. Three correct answers out of five pass;
//! a failed run offers a retry that starts the session over.

use std::cell::RefCell;

/// One statement to judge, with the explanation shown after answering.
#[derive(Debug, Clone, Copy)]
pub struct QuizQuestion {
    pub prompt: &'static str,
    pub answer: bool,
    pub explanation: &'static str,
}

pub static QUESTIONS: [QuizQuestion; 5] = [
    QuizQuestion {
        prompt: "Les enfants Arakawa conduisaient des tracteurs dès leur plus jeune âge.",
        answer: true,
        explanation: "Par nécessité pratique, les enfants de la ferme aidaient aux travaux dès qu'ils le pouvaient.",
    },
    QuizQuestion {
        prompt: "Hiromu Arakawa a travaillé 5 ans à la ferme avant de partir pour Tokyo.",
        answer: false,
        explanation: "Elle a travaillé 7 ans à la ferme, comme promis à ses parents.",
    },
    QuizQuestion {
        prompt: "Les agriculteurs de Hokkaido jettent parfois des tonnes de lait à cause des quotas.",
        answer: true,
        explanation: "Une réalité amère qu'Arakawa traite avec humour dans Nobles Paysans.",
    },
    QuizQuestion {
        prompt: "Le manga 'Silver Spoon' se déroule dans un lycée classique de Tokyo.",
        answer: false,
        explanation: "Silver Spoon se déroule dans un lycée agricole de Hokkaido.",
    },
    QuizQuestion {
        prompt: "La philosophie de l'Échange Équivalent vient de l'expérience agricole d'Arakawa.",
        answer: true,
        explanation: "Le principe 'si tu ne travailles pas, tu ne manges pas' est devenu la base de cette loi alchimique.",
    },
];

/// Minimum correct answers to pass.
pub const PASS_THRESHOLD: u8 = 3;

/// Reveal time before auto-advancing to the next question.
pub const ADVANCE_DELAY_MS: u32 = 2500;

/// Delay before a passed quiz closes its modal and unlocks section 3.
pub const RESULT_DELAY_MS: u32 = 2000;

/// Feedback held between an answer and the deferred advance.
#[derive(Debug, Clone, Copy)]
pub struct AnswerOutcome {
    pub chosen: bool,
    pub correct: bool,
}

/// One quiz run. The cursor only moves forward; `is_complete` latches on a
/// passing finish and freezes the session.
#[derive(Debug, Clone)]
pub struct QuizSession {
    current: usize,
    score: u8,
    outcome: Option<AnswerOutcome>,
    is_complete: bool,
}

impl QuizSession {
    pub fn new() -> Self {
        Self {
            current: 0,
            score: 0,
            outcome: None,
            is_complete: false,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    /// The cursor has run past the last question.
    pub fn is_finished(&self) -> bool {
        self.current >= QUESTIONS.len()
    }

    pub fn passed(&self) -> bool {
        self.is_finished() && self.score >= PASS_THRESHOLD
    }

    pub fn current_question(&self) -> Option<&'static QuizQuestion> {
        QUESTIONS.get(self.current)
    }

    pub fn outcome(&self) -> Option<AnswerOutcome> {
        self.outcome
    }

    /// Judge the current question. Ignored (returns `None`) while the reveal
    /// of a previous answer is pending or after the last question.
    pub fn answer(&mut self, chosen: bool) -> Option<AnswerOutcome> {
        if self.outcome.is_some() || self.is_finished() {
            return None;
        }
        let question = &QUESTIONS[self.current];
        let correct = chosen == question.answer;
        if correct {
            self.score += 1;
        }
        let outcome = AnswerOutcome { chosen, correct };
        self.outcome = Some(outcome);
        Some(outcome)
    }

    /// Move past an answered question (the deferred advance callback).
    ///
    /// Only legal when the current question has been answered, so a replayed
    /// or duplicated timer is a no-op. On finishing with a passing score the
    /// completion latch is set, exactly once.
    pub fn advance(&mut self) -> bool {
        if self.outcome.is_none() || self.is_finished() {
            return false;
        }
        self.outcome = None;
        self.current += 1;
        if self.is_finished() && self.score >= PASS_THRESHOLD {
            self.is_complete = true;
        }
        true
    }
}

thread_local! {
    static SESSION: RefCell<Option<QuizSession>> = const { RefCell::new(None) };
}

pub fn reset_session() {
    SESSION.with(|cell| *cell.borrow_mut() = None);
}

pub fn with_session<F, R>(f: F) -> R
where
    F: FnOnce(Option<&QuizSession>) -> R,
{
    SESSION.with(|cell| f(cell.borrow().as_ref()))
}

// ── Route-facing operations ────────────────────────────────────────

/// (Re)start the quiz and render the first question. Also the retry path.
pub fn open() -> String {
    let session = QuizSession::new();
    let html = render(&session, false);
    SESSION.with(|cell| *cell.borrow_mut() = Some(session));
    html
}

/// Render the current state without touching it.
pub fn view() -> String {
    SESSION.with(|cell| match cell.borrow().as_ref() {
        Some(session) => render(session, false),
        None => not_open(),
    })
}

/// Apply one true/false answer and render the reveal.
pub fn answer(chosen: bool) -> String {
    SESSION.with(|cell| match cell.borrow_mut().as_mut() {
        Some(session) => {
            session.answer(chosen);
            render(session, false)
        }
        None => not_open(),
    })
}

/// Advance past the revealed answer (deferred callback target).
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
    r#"<span class="game-error">Le quiz n'est pas encore ouvert.</span>"#.to_string()
}

fn render(session: &QuizSession, just_finished: bool) -> String {
    if session.is_finished() {
        render_result(session, just_finished)
    } else {
        render_question(session)
    }
}

fn answer_button(label: &str, value: bool, outcome: Option<AnswerOutcome>, correct_answer: bool) -> String {
    let mut classes = String::from("quiz-answer");
    let mut disabled = "";
    if let Some(outcome) = outcome {
        disabled = " disabled";
        if value == correct_answer {
            classes.push_str(" is-correct");
        } else if value == outcome.chosen {
            classes.push_str(" is-wrong");
        }
    }
    let post = format!(
        "htmx.ajax('POST', '/api/game/quiz-terre', {{values: {{action: 'answer', value: '{}'}}, target: '#quiz-terre-area', swap: 'innerHTML'}})",
        value
    );
    format!(
        r#"<button class="{classes}" data-answer="{value}"{disabled} onclick="{post}">{label}</button>"#,
        classes = classes,
        value = value,
        disabled = disabled,
        post = post,
        label = label,
    )
}

fn render_question(session: &QuizSession) -> String {
    let question = match session.current_question() {
        Some(q) => q,
        None => return render_result(session, false),
    };
    let outcome = session.outcome();

    let mut html = String::with_capacity(2048);
    html.push_str(&format!(
        r#"<p class="quiz-question">{}</p>"#,
        question.prompt
    ));
    html.push_str(r#"<div class="quiz-answers">"#);
    html.push_str(&answer_button("VRAI", true, outcome, question.answer));
    html.push_str(&answer_button("FAUX", false, outcome, question.answer));
    html.push_str("</div>");

    if let Some(outcome) = outcome {
        let verdict = if outcome.correct {
            "&#x2705; Correct !"
        } else {
            "&#x274C; Faux !"
        };
        html.push_str(&format!(
            r#"<div class="quiz-explanation"><strong>{verdict}</strong><br>{explanation}</div>"#,
            verdict = verdict,
            explanation = question.explanation,
        ));
        // Deferred advance; the transition itself rejects replays.
        html.push_str(&format!(
            "<script>setTimeout(function() {{\n\
             var area = document.getElementById('quiz-terre-area');\n\
             if (area) {{ htmx.ajax('POST', '/api/game/quiz-terre', {{values: {{action: 'advance'}}, target: '#quiz-terre-area', swap: 'innerHTML'}}); }}\n\
             }}, {delay});</script>",
            delay = ADVANCE_DELAY_MS,
        ));
    }

    html.push_str(&format!(
        r#"<p class="quiz-progress">Question {} / {}</p>"#,
        session.current_index() + 1,
        QUESTIONS.len(),
    ));
    html.push_str(&format!(
        r#"<p id="quiz-terre-score" class="quiz-score">Score : {} / {}</p>"#,
        session.score(),
        QUESTIONS.len(),
    ));
    html
}

fn render_result(session: &QuizSession, just_finished: bool) -> String {
    let passed = session.passed();
    let mut html = String::with_capacity(1024);
    html.push_str(r#"<div class="quiz-result">"#);
    if passed {
        html.push_str(r#"<h3 class="quiz-result__title is-won">&#x1F389; Félicitations !</h3>"#);
    } else {
        html.push_str(r#"<h3 class="quiz-result__title is-lost">&#x1F622; Pas encore...</h3>"#);
    }
    html.push_str(&format!(
        r#"<p>Votre score : <strong>{} / {}</strong></p>"#,
        session.score(),
        QUESTIONS.len(),
    ));
    if passed {
        html.push_str(
            r#"<p class="quiz-result__hint">Vous avez prouvé votre connaissance de la vie rurale !</p>"#,
        );
    } else {
        html.push_str(&format!(
            r#"<p class="quiz-result__hint">Il faut au moins {} bonnes réponses pour débloquer la suite.</p>"#,
            PASS_THRESHOLD,
        ));
        html.push_str(
            r#"<button class="btn btn-secondary" id="retry-quiz-terre" onclick="htmx.ajax('GET', '/api/game/quiz-terre?action=open', {target: '#quiz-terre-area', swap: 'innerHTML'})">Réessayer</button>"#,
        );
    }
    html.push_str("</div>");

    if passed && just_finished {
        html.push_str(&format!(
            "<script>setTimeout(function() {{\n\
             if (window.arakawaUi) {{ arakawaUi.closeModal('modal-quiz-terre'); }}\n\
             htmx.ajax('POST', '/api/progress/unlock', {{values: {{section: '3'}}, target: '#unlock-effects', swap: 'innerHTML'}});\n\
             }}, {delay});</script>",
            delay = RESULT_DELAY_MS,
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

    fn run(session: &mut QuizSession, answers: &[bool]) {
        for &a in answers {
            assert!(session.answer(a).is_some());
            assert!(session.advance());
        }
    }

    #[test]
    fn all_correct_passes_with_full_score() {
        let mut session = QuizSession::new();
        let answers: Vec<bool> = QUESTIONS.iter().map(|q| q.answer).collect();
        run(&mut session, &answers);
        assert_eq!(session.score(), 5);
        assert!(session.is_finished());
        assert!(session.passed());
        assert!(session.is_complete());
    }

    #[test]
    fn two_correct_fails_and_retry_resets() {
        let mut session = QuizSession::new();
        // First two right, last three wrong.
        let answers: Vec<bool> = QUESTIONS
            .iter()
            .enumerate()
            .map(|(i, q)| if i < 2 { q.answer } else { !q.answer })
            .collect();
        run(&mut session, &answers);
        assert_eq!(session.score(), 2);
        assert!(!session.passed());
        assert!(!session.is_complete());

        // Retry path: a fresh session starts at question 0 with score 0.
        let retry = QuizSession::new();
        assert_eq!(retry.current_index(), 0);
        assert_eq!(retry.score(), 0);
    }

    #[test]
    fn answer_is_ignored_while_reveal_pending() {
        let mut session = QuizSession::new();
        assert!(session.answer(true).is_some());
        // A second click before the advance must not double-count.
        assert!(session.answer(true).is_none());
        assert!(session.answer(false).is_none());
        assert!(session.score() <= 1);
    }

    #[test]
    fn advance_requires_an_answer() {
        let mut session = QuizSession::new();
        assert!(!session.advance());
        session.answer(true);
        assert!(session.advance());
        // Duplicated deferred callback: second advance is a no-op.
        assert!(!session.advance());
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn finished_session_is_frozen() {
        let mut session = QuizSession::new();
        let answers: Vec<bool> = QUESTIONS.iter().map(|q| q.answer).collect();
        run(&mut session, &answers);
        assert!(session.answer(true).is_none());
        assert!(!session.advance());
        assert_eq!(session.score(), 5);
    }

    #[test]
    fn wrong_answer_still_reveals_and_advances() {
        let mut session = QuizSession::new();
        let outcome = session.answer(!QUESTIONS[0].answer).unwrap();
        assert!(!outcome.correct);
        assert_eq!(session.score(), 0);
        assert!(session.advance());
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn open_renders_first_question() {
        reset_state();
        let html = open();
        assert!(html.contains(QUESTIONS[0].prompt));
        assert!(html.contains("VRAI"));
        assert!(html.contains("FAUX"));
        assert!(html.contains("Question 1 / 5"));
        assert!(html.contains("Score : 0 / 5"));
        reset_state();
    }

    #[test]
    fn answer_renders_explanation_and_deferred_advance() {
        reset_state();
        open();
        let html = answer(QUESTIONS[0].answer);
        assert!(html.contains("Correct !"));
        assert!(html.contains(QUESTIONS[0].explanation));
        assert!(html.contains("is-correct"));
        assert!(html.contains("action: 'advance'"));
        assert!(html.contains("2500"));
        reset_state();
    }

    #[test]
    fn wrong_answer_marks_both_buttons() {
        reset_state();
        open();
        let html = answer(!QUESTIONS[0].answer);
        assert!(html.contains("Faux !"));
        assert!(html.contains("is-wrong"));
        assert!(html.contains("is-correct")); // right answer highlighted too
        reset_state();
    }

    #[test]
    fn passing_run_fires_unlock_once() {
        reset_state();
        open();
        let mut last = String::new();
        for q in QUESTIONS.iter() {
            answer(q.answer);
            last = advance();
        }
        assert!(last.contains("Félicitations"));
        assert!(last.contains("modal-quiz-terre"));
        assert!(last.contains("section: '3'"));
        assert!(last.contains("2000"));
        // Re-rendering the result must not re-fire the unlock.
        assert!(!view().contains("/api/progress/unlock"));
        reset_state();
    }

    #[test]
    fn failing_run_offers_retry_without_unlock() {
        reset_state();
        open();
        let mut last = String::new();
        for q in QUESTIONS.iter() {
            answer(!q.answer);
            last = advance();
        }
        assert!(last.contains("Pas encore"));
        assert!(last.contains("retry-quiz-terre"));
        assert!(!last.contains("/api/progress/unlock"));
        // Retry restarts from scratch.
        let html = open();
        assert!(html.contains("Question 1 / 5"));
        assert!(html.contains("Score : 0 / 5"));
        reset_state();
    }
}
