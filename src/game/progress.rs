//! Progression state — the single writer for section unlocks.
//!
//! Uses `thread_local!` + `RefCell` for safe mutable access in single-threaded
//! WASM. The Web Worker keeps the WASM module alive, so unlock state persists
//! across `handle_request` calls for the entire browser session.
//!
//! ## Lifecycle
//!
//! - **Page load:** the bridge POSTs the raw localStorage value of
//!   `hiromu_arakawa_progress` to `/api/progress/restore`; malformed or absent
//!   data degrades to the default (section 1 only).
//! - **Every unlock:** `unlock_section` advances the in-memory value and the
//!   rendered response embeds a persist `<script>` that rewrites the whole
//!   record, so stored and displayed state always match after the call.
//! - **Reset:** explicit action; removes the record and starts over.
//!
//! `unlock_section` is the only path that increases `unlocked_sections`.
//! Storage failures never reach the user: the persist script wraps
//! `localStorage` in try/catch and only warns on the console.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use crate::sections::{SECTIONS, Section};

/// localStorage key holding the persisted record.
pub const STORAGE_KEY: &str = "hiromu_arakawa_progress";

/// Schema tag written into every record.
pub const SCHEMA_VERSION: &str = "1.0";

/// Delay before the page scrolls to a freshly unlocked section.
pub const SCROLL_DELAY_MS: u32 = 1500;

fn default_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// The durable progress record, as stored under [`STORAGE_KEY`].
///
/// `last_visit` is informational only; no invariant is enforced on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(rename = "sectionUnlocked")]
    pub section_unlocked: u8,
    #[serde(rename = "lastVisit")]
    pub last_visit: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            section_unlocked: 1,
            last_visit: None,
            version: SCHEMA_VERSION.to_string(),
        }
    }
}

/// In-memory session state mirroring the persisted record.
#[derive(Debug, Clone)]
pub struct ProgressState {
    /// Highest section number the user may access, 1..=5, non-decreasing.
    pub unlocked_sections: u8,
    /// Carried over from the restored record, rewritten on each persist.
    pub last_visit: Option<String>,
    /// Latch against re-entrant restore on the same session.
    pub initialized: bool,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            unlocked_sections: 1,
            last_visit: None,
            initialized: false,
        }
    }
}

thread_local! {
    static STATE: RefCell<ProgressState> = RefCell::new(ProgressState::default());
}

/// Execute a closure with read access to the progression state.
pub fn with_progress<F, R>(f: F) -> R
where
    F: FnOnce(&ProgressState) -> R,
{
    STATE.with(|s| f(&s.borrow()))
}

/// Execute a closure with mutable access to the progression state.
pub fn with_progress_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut ProgressState) -> R,
{
    STATE.with(|s| f(&mut s.borrow_mut()))
}

/// Reset to a pristine session (tests and the explicit reset action).
pub fn init_progress() {
    STATE.with(|s| *s.borrow_mut() = ProgressState::default());
}

/// Highest unlocked section number.
pub fn unlocked_sections() -> u8 {
    with_progress(|s| s.unlocked_sections)
}

/// Whether section `n` may be accessed.
pub fn is_unlocked(n: u8) -> bool {
    n >= 1 && n <= unlocked_sections()
}

// ── Record parsing / export ────────────────────────────────────────

/// Parse a raw localStorage value into a record.
///
/// Absent, unparsable, or out-of-domain data degrades to the default record
/// (section 1, no last visit). Never panics, never returns an error: the
/// gate must not brick the site over a corrupt store.
pub fn parse_record(raw: &str) -> ProgressRecord {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ProgressRecord::default();
    }
    match serde_json::from_str::<ProgressRecord>(trimmed) {
        Ok(record) if (1..=5).contains(&record.section_unlocked) => record,
        _ => ProgressRecord::default(),
    }
}

/// The current state as a record (what the next persist will write).
pub fn current_record() -> ProgressRecord {
    with_progress(|s| ProgressRecord {
        section_unlocked: s.unlocked_sections,
        last_visit: s.last_visit.clone(),
        version: SCHEMA_VERSION.to_string(),
    })
}

/// Export the current record as JSON.
pub fn export_state_json() -> String {
    serde_json::to_string(&current_record()).unwrap_or_else(|_| "{}".to_string())
}

/// Restore session state from a raw localStorage value.
///
/// Idempotent per session: once the latch is set, later calls are no-ops so a
/// duplicated load event cannot regress state mid-session. Returns the number
/// of sections unlocked after the call.
pub fn restore_from_json(raw: &str) -> u8 {
    with_progress_mut(|s| {
        if s.initialized {
            return s.unlocked_sections;
        }
        let record = parse_record(raw);
        s.unlocked_sections = record.section_unlocked;
        s.last_visit = record.last_visit;
        s.initialized = true;
        s.unlocked_sections
    })
}

// ── Unlocking ──────────────────────────────────────────────────────

/// Advance the unlock state to section `n`.
///
/// Returns `true` only when the state actually changed. `n <= current` is a
/// defined no-op (duplicate or replayed completion signals); `n > 5` clamps
/// to 5. Jumps above `current + 1` set directly — callers only ever request
/// `current + 1`, and no intermediate back-fill is needed because access
/// checks compare against the highest unlocked number.
pub fn unlock_section(n: u8) -> bool {
    let n = n.min(5);
    with_progress_mut(|s| {
        if n <= s.unlocked_sections {
            return false;
        }
        s.unlocked_sections = n;
        true
    })
}

// ── Persist / clear scripts ────────────────────────────────────────

/// `<script>` that rewrites the whole record in localStorage.
///
/// `lastVisit` is stamped by the page at write time so the core needs no
/// clock. Failure (private mode, quota, disabled storage) is caught and
/// warned, never propagated.
pub fn persist_script() -> String {
    format!(
        "<script>try {{ localStorage.setItem('{key}', JSON.stringify({{sectionUnlocked: {n}, lastVisit: new Date().toISOString(), version: '{v}'}})); }} catch (e) {{ console.warn('[arakawa] localStorage indisponible:', e); }}</script>",
        key = STORAGE_KEY,
        n = unlocked_sections(),
        v = SCHEMA_VERSION,
    )
}

/// `<script>` that removes the record (reset action).
pub fn clear_script() -> String {
    format!(
        "<script>try {{ localStorage.removeItem('{key}'); }} catch (e) {{ console.warn('[arakawa] localStorage indisponible:', e); }}</script>",
        key = STORAGE_KEY,
    )
}

// ── HTML rendering ─────────────────────────────────────────────────

/// Script statements that flip one section's DOM to its unlocked look.
/// Every element access is existence-checked; a headless page is a no-op.
fn section_unlock_js(section: &Section) -> String {
    format!(
        "var sec = document.getElementById('{slug}');\n\
         if (sec) {{ sec.classList.remove('section-locked'); sec.classList.add('section-unlocked', 'unlock-animation'); }}\n\
         var overlay = document.getElementById('lock-overlay-{slug}');\n\
         if (overlay) {{ overlay.remove(); }}\n\
         var nav = document.getElementById('nav-{slug}');\n\
         if (nav) {{ nav.classList.remove('is-locked'); }}\n",
        slug = section.slug,
    )
}

/// Render the full effect chain of a successful unlock.
///
/// Order matters and is part of the contract: persist first, then visual
/// state, then the toast naming the section, then the deferred scroll.
pub fn render_unlock_effects(section: &Section) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str(&format!(
        "<!-- [arakawa-debug] unlocked section={} slug={} -->",
        section.number, section.slug
    ));
    html.push_str(&persist_script());

    html.push_str("<script>\n");
    html.push_str(&section_unlock_js(section));
    html.push_str(
        "htmx.ajax('GET', '/api/progress/rail', {target: '#progress-rail', swap: 'innerHTML'});\n",
    );
    html.push_str(&format!(
        "if (window.arakawaUi) {{ arakawaUi.showToast(\"\u{1F513} Section \\\"{title}\\\" déverrouillée !\"); }}\n",
        title = section.title.replace('"', "\\\""),
    ));
    html.push_str(&format!(
        "setTimeout(function() {{\n\
         var target = document.getElementById('{slug}');\n\
         if (target) {{ target.scrollIntoView({{behavior: 'smooth'}}); }}\n\
         }}, {delay});\n",
        slug = section.slug,
        delay = SCROLL_DELAY_MS,
    ));
    html.push_str("</script>");
    html
}

/// Render the no-op response for a duplicate or out-of-order unlock request.
pub fn render_unlock_ignored(requested: u8) -> String {
    format!(
        "<!-- [arakawa-debug] unlock section={} ignored (current={}) -->",
        requested,
        unlocked_sections()
    )
}

/// Reconciliation script applied at startup: locked/unlocked visuals for
/// sections 2..=5 derived purely from session state. Overlays of unlocked
/// sections are removed for good; they are never re-rendered from here.
pub fn render_sections_state() -> String {
    let unlocked = unlocked_sections();
    let mut html = String::with_capacity(2048);
    html.push_str(&format!(
        "<!-- [arakawa-debug] sections state unlocked={} -->",
        unlocked
    ));
    html.push_str("<script>\n");
    for section in SECTIONS.iter().skip(1) {
        if section.number <= unlocked {
            html.push_str(&section_unlock_js(section));
        } else {
            html.push_str(&format!(
                "var sec = document.getElementById('{slug}');\n\
                 if (sec) {{ sec.classList.add('section-locked'); sec.classList.remove('section-unlocked'); }}\n\
                 var nav = document.getElementById('nav-{slug}');\n\
                 if (nav) {{ nav.classList.add('is-locked'); }}\n",
                slug = section.slug,
            ));
        }
    }
    html.push_str("</script>");
    html
}

/// Render the progress rail: liquid fill plus one marker per section.
///
/// The `is-active` (currently scrolled) marker class is the page's concern;
/// only completion state is derived here.
pub fn render_rail() -> String {
    let unlocked = unlocked_sections();
    let percentage = (unlocked.saturating_sub(1) as u32) * 100 / 4;

    let mut html = String::with_capacity(2048);
    html.push_str(r#"<div class="progress-track">"#);
    html.push_str(&format!(
        r#"<div id="progress-liquid" class="progress-liquid" style="height: {}%"></div>"#,
        percentage
    ));
    html.push_str("</div>");

    for section in SECTIONS.iter() {
        let completed = if section.number < unlocked {
            " is-completed"
        } else {
            ""
        };
        let onclick = if section.number <= unlocked {
            format!(
                "var el = document.getElementById('{slug}'); if (el) {{ el.scrollIntoView({{behavior: 'smooth'}}); }}",
                slug = section.slug
            )
        } else {
            "if (window.arakawaUi) { arakawaUi.shake(this); }".to_string()
        };
        html.push_str(&format!(
            r#"<button id="marker-{slug}" class="progress-marker{completed}" aria-label="{title}" onclick="{onclick}">{number}</button>"#,
            slug = section.slug,
            completed = completed,
            title = section.title,
            onclick = onclick,
            number = section.number,
        ));
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::find_section;

    fn reset_state() {
        init_progress();
    }

    #[test]
    fn default_state_starts_at_section_one() {
        reset_state();
        with_progress(|s| {
            assert_eq!(s.unlocked_sections, 1);
            assert!(s.last_visit.is_none());
            assert!(!s.initialized);
        });
        reset_state();
    }

    #[test]
    fn unlock_advances_and_is_monotonic() {
        reset_state();
        assert!(unlock_section(2));
        assert_eq!(unlocked_sections(), 2);
        assert!(unlock_section(3));
        assert!(unlock_section(4));
        assert!(unlock_section(5));
        assert_eq!(unlocked_sections(), 5);
        reset_state();
    }

    #[test]
    fn duplicate_unlock_is_a_noop() {
        reset_state();
        assert!(unlock_section(2));
        assert!(!unlock_section(2));
        assert!(!unlock_section(1));
        assert_eq!(unlocked_sections(), 2);
        // Persisted view unchanged too.
        assert_eq!(current_record().section_unlocked, 2);
        reset_state();
    }

    #[test]
    fn unlock_clamps_above_five() {
        reset_state();
        assert!(unlock_section(99));
        assert_eq!(unlocked_sections(), 5);
        assert!(!unlock_section(99));
        reset_state();
    }

    #[test]
    fn unlock_zero_is_a_noop() {
        reset_state();
        assert!(!unlock_section(0));
        assert_eq!(unlocked_sections(), 1);
        reset_state();
    }

    #[test]
    fn jump_unlock_sets_directly() {
        reset_state();
        assert!(unlock_section(4));
        assert_eq!(unlocked_sections(), 4);
        assert!(is_unlocked(2)); // access checks compare against the maximum
        assert!(is_unlocked(4));
        assert!(!is_unlocked(5));
        reset_state();
    }

    #[test]
    fn write_then_read_consistency() {
        reset_state();
        unlock_section(3);
        let record = parse_record(&export_state_json());
        assert_eq!(record.section_unlocked, 3);
        reset_state();
    }

    #[test]
    fn parse_empty_returns_default() {
        let record = parse_record("");
        assert_eq!(record.section_unlocked, 1);
        assert!(record.last_visit.is_none());
    }

    #[test]
    fn parse_garbage_returns_default() {
        assert_eq!(parse_record("not json {{{").section_unlocked, 1);
        assert_eq!(parse_record("42").section_unlocked, 1);
        assert_eq!(parse_record("null").section_unlocked, 1);
    }

    #[test]
    fn parse_out_of_domain_returns_default() {
        assert_eq!(
            parse_record(r#"{"sectionUnlocked":0,"lastVisit":null,"version":"1.0"}"#)
                .section_unlocked,
            1
        );
        assert_eq!(
            parse_record(r#"{"sectionUnlocked":9,"lastVisit":null,"version":"1.0"}"#)
                .section_unlocked,
            1
        );
        assert_eq!(
            parse_record(r#"{"sectionUnlocked":-3,"lastVisit":null}"#).section_unlocked,
            1
        );
    }

    #[test]
    fn parse_valid_record() {
        let record = parse_record(
            r#"{"sectionUnlocked":4,"lastVisit":"2024-11-02T10:00:00.000Z","version":"1.0"}"#,
        );
        assert_eq!(record.section_unlocked, 4);
        assert_eq!(
            record.last_visit.as_deref(),
            Some("2024-11-02T10:00:00.000Z")
        );
        assert_eq!(record.version, "1.0");
    }

    #[test]
    fn parse_missing_version_defaults_it() {
        let record = parse_record(r#"{"sectionUnlocked":2,"lastVisit":null}"#);
        assert_eq!(record.section_unlocked, 2);
        assert_eq!(record.version, SCHEMA_VERSION);
    }

    #[test]
    fn restore_sets_state_and_latch() {
        reset_state();
        let unlocked =
            restore_from_json(r#"{"sectionUnlocked":3,"lastVisit":"2025-01-01T00:00:00.000Z"}"#);
        assert_eq!(unlocked, 3);
        with_progress(|s| {
            assert!(s.initialized);
            assert_eq!(s.last_visit.as_deref(), Some("2025-01-01T00:00:00.000Z"));
        });
        reset_state();
    }

    #[test]
    fn restore_is_latched_per_session() {
        reset_state();
        restore_from_json(r#"{"sectionUnlocked":3,"lastVisit":null}"#);
        unlock_section(4);
        // A replayed load event must not regress mid-session state.
        let unlocked = restore_from_json(r#"{"sectionUnlocked":2,"lastVisit":null}"#);
        assert_eq!(unlocked, 4);
        reset_state();
    }

    #[test]
    fn restore_malformed_degrades_to_default() {
        reset_state();
        assert_eq!(restore_from_json("corrupted###"), 1);
        reset_state();
    }

    #[test]
    fn export_roundtrip() {
        reset_state();
        unlock_section(2);
        let json = export_state_json();
        assert!(json.contains(r#""sectionUnlocked":2"#));
        assert!(json.contains(r#""version":"1.0""#));
        reset_state();
    }

    #[test]
    fn persist_script_writes_whole_record() {
        reset_state();
        unlock_section(3);
        let script = persist_script();
        assert!(script.contains("localStorage.setItem"));
        assert!(script.contains(STORAGE_KEY));
        assert!(script.contains("sectionUnlocked: 3"));
        assert!(script.contains("new Date().toISOString()"));
        assert!(script.contains("catch"));
        reset_state();
    }

    #[test]
    fn clear_script_removes_record() {
        let script = clear_script();
        assert!(script.contains("localStorage.removeItem"));
        assert!(script.contains(STORAGE_KEY));
        assert!(script.contains("catch"));
    }

    #[test]
    fn unlock_effects_order_persist_before_visuals_before_toast_before_scroll() {
        reset_state();
        unlock_section(2);
        let html = render_unlock_effects(find_section(2).unwrap());
        let persist = html.find("localStorage.setItem").unwrap();
        let visuals = html.find("section-unlocked").unwrap();
        let toast = html.find("showToast").unwrap();
        let scroll = html.find("setTimeout").unwrap();
        assert!(persist < visuals);
        assert!(visuals < toast);
        assert!(toast < scroll);
        assert!(html.contains("La Terre"));
        assert!(html.contains("1500"));
        reset_state();
    }

    #[test]
    fn unlock_effects_guard_missing_elements() {
        reset_state();
        unlock_section(2);
        let html = render_unlock_effects(find_section(2).unwrap());
        assert!(html.contains("if (sec)"));
        assert!(html.contains("if (overlay)"));
        assert!(html.contains("if (nav)"));
        assert!(html.contains("if (target)"));
        assert!(html.contains("if (window.arakawaUi)"));
        reset_state();
    }

    #[test]
    fn sections_state_reflects_unlocked_value() {
        reset_state();
        unlock_section(3);
        let html = render_sections_state();
        // terre + metal unlocked, multivers + heritage locked
        assert!(html.contains("lock-overlay-terre"));
        assert!(html.contains("lock-overlay-metal"));
        assert!(!html.contains("lock-overlay-multivers"));
        assert!(html.contains("nav-multivers"));
        assert!(html.contains("nav-heritage"));
        reset_state();
    }

    #[test]
    fn rail_fill_matches_unlocked_sections() {
        reset_state();
        assert!(render_rail().contains("height: 0%"));
        unlock_section(3);
        assert!(render_rail().contains("height: 50%"));
        unlock_section(5);
        assert!(render_rail().contains("height: 100%"));
        reset_state();
    }

    #[test]
    fn rail_markers_complete_and_shake() {
        reset_state();
        unlock_section(2);
        let html = render_rail();
        assert!(html.contains(r#"id="marker-atelier" class="progress-marker is-completed""#));
        assert!(html.contains(r#"id="marker-terre" class="progress-marker""#));
        // Locked markers shake instead of scrolling.
        assert!(html.contains("arakawaUi.shake(this)"));
        assert!(html.contains("scrollIntoView"));
        reset_state();
    }
}
