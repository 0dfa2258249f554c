//! `/api/certificate/*` routes — the State Alchemist certificate.
//!
//! Gated on a passed final quiz. The certificate is rendered as an inline
//! SVG mirroring the site's canvas layout (dark parchment, golden double
//! border, alchemical seal) and exported through a Blob download script.
//!
//! Query params for /api/certificate (GET):
//!   action — "form" (name entry, or the locked notice)
//!
//! Body params for /api/certificate (POST):
//!   name — free text, required
//!   date — preformatted issue date from the page locale, optional
//!
//! Body params for /api/certificate/export (POST):
//!   name — used for the download filename

use crate::game::quiz_final;
use crate::routes::util::{get_param, parse_form_body, parse_query};

const SVG_WIDTH: u32 = 500;
const SVG_HEIGHT: u32 = 420;

/// Escape user text for embedding in HTML/SVG.
fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Filename-safe version of the alchemist name.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().to_lowercase().chars() {
        if c.is_whitespace() {
            if !slug.ends_with('-') {
                slug.push('-');
            }
        } else if c.is_alphanumeric() || c == '-' {
            slug.push(c);
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "alchimiste".to_string()
    } else {
        slug
    }
}

// ── Route handlers ─────────────────────────────────────────────────

/// Handle GET /api/certificate — the name-entry form, or the locked notice
/// when the final quiz has not been passed this session.
pub fn handle_certificate_get(query: &str) -> String {
    let params = parse_query(query);
    match get_param(&params, "action").unwrap_or("form") {
        "form" => {
            if !quiz_final::is_passed() {
                locked_notice()
            } else {
                name_form()
            }
        }
        other => format!(
            r#"<span class="game-error">Unknown action: {}</span>"#,
            other
        ),
    }
}

/// Handle POST /api/certificate — render the certificate for a name.
pub fn handle_certificate_post(body: &str) -> String {
    if !quiz_final::is_passed() {
        return locked_notice();
    }
    let params = parse_form_body(body);
    let name = get_param(&params, "name").unwrap_or("").trim().to_string();
    if name.is_empty() {
        return empty_name_fragment();
    }
    let date = get_param(&params, "date").unwrap_or("").trim().to_string();
    certificate_html(&name, &date)
}

/// Handle POST /api/certificate/export — Blob download of the rendered SVG.
pub fn handle_export_post(body: &str) -> String {
    if !quiz_final::is_passed() {
        return locked_notice();
    }
    let params = parse_form_body(body);
    let name = get_param(&params, "name").unwrap_or("");
    format!(
        "<script>\n\
         (function() {{\n\
         var display = document.getElementById('certificate-display');\n\
         if (!display) {{ return; }}\n\
         var b = new Blob([display.innerHTML], {{type: 'image/svg+xml'}});\n\
         var a = document.createElement('a');\n\
         a.href = URL.createObjectURL(b);\n\
         a.download = 'certificat-alchimiste-{slug}.svg';\n\
         a.click();\n\
         URL.revokeObjectURL(a.href);\n\
         console.log('[arakawa] Certificat exporté');\n\
         }})();\n\
         </script>",
        slug = slugify(name),
    )
}

// ── HTML fragment builders ─────────────────────────────────────────

fn locked_notice() -> String {
    r#"<p class="certificate-locked">Réussissez le quiz final pour obtenir votre certificat.</p>"#
        .to_string()
}

fn empty_name_fragment() -> String {
    String::from(
        "<span class=\"game-error\">Entrez votre nom d'alchimiste.</span>\n\
         <script>\n\
         var input = document.getElementById('certificate-name-input');\n\
         if (input && window.arakawaUi) { arakawaUi.shake(input); }\n\
         </script>",
    )
}

fn name_form() -> String {
    let generate = "htmx.ajax('POST', '/api/certificate', {values: {\
        name: (document.getElementById('certificate-name-input') || {}).value || '', \
        date: new Date().toLocaleDateString('fr-FR', {year: 'numeric', month: 'long', day: 'numeric'})\
        }, target: '#certificate-area', swap: 'innerHTML'})";
    format!(
        r#"<div class="certificate-form"><label for="certificate-name-input">Votre nom d'alchimiste</label><input type="text" id="certificate-name-input" maxlength="30" placeholder="Edward Elric"><button class="btn btn-primary" id="btn-generate-certificate" onclick="{generate}">Générer mon Certificat</button></div>"#,
        generate = generate,
    )
}

fn certificate_html(name: &str, date: &str) -> String {
    // Backslash-escape for the JS string literal first, then HTML-escape for
    // the attribute; the browser decodes entities before evaluating onclick.
    let js_name = escape_text(&name.replace('\\', "\\\\").replace('\'', "\\'"));
    let mut html = String::with_capacity(4096);
    html.push_str(r#"<div id="certificate-display" class="certificate">"#);
    html.push_str(&certificate_svg(name, date));
    html.push_str("</div>");
    html.push_str(&format!(
        r#"<button class="btn btn-secondary" id="btn-download-certificate" onclick="htmx.ajax('POST', '/api/certificate/export', {{values: {{name: '{name}'}}, target: '#certificate-export', swap: 'innerHTML'}})">Télécharger</button><div id="certificate-export"></div>"#,
        name = js_name,
    ));
    html
}

fn certificate_svg(name: &str, date: &str) -> String {
    let center = SVG_WIDTH / 2;
    let name_upper = escape_text(&name.to_uppercase());

    let mut svg = String::with_capacity(4096);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}" role="img">"#,
        w = SVG_WIDTH,
        h = SVG_HEIGHT,
    ));

    // Parchment and double golden border.
    svg.push_str(&format!(
        r##"<rect width="{w}" height="{h}" fill="#1a1a1a"/>"##,
        w = SVG_WIDTH,
        h = SVG_HEIGHT,
    ));
    svg.push_str(&format!(
        r##"<rect x="10" y="10" width="{w}" height="{h}" fill="none" stroke="#DBB448" stroke-width="4"/>"##,
        w = SVG_WIDTH - 20,
        h = SVG_HEIGHT - 20,
    ));
    svg.push_str(&format!(
        r##"<rect x="20" y="20" width="{w}" height="{h}" fill="none" stroke="#DBB448" stroke-width="1"/>"##,
        w = SVG_WIDTH - 40,
        h = SVG_HEIGHT - 40,
    ));

    // Headings.
    svg.push_str(&format!(
        r##"<text x="{cx}" y="70" text-anchor="middle" fill="#DBB448" font-family="Cinzel, serif" font-size="28" font-weight="bold">CERTIFICAT</text>"##,
        cx = center,
    ));
    svg.push_str(&format!(
        r##"<text x="{cx}" y="100" text-anchor="middle" fill="#DBB448" font-family="Cinzel, serif" font-size="18">D'ALCHIMISTE D'ÉTAT</text>"##,
        cx = center,
    ));

    // Body text around the name.
    svg.push_str(&format!(
        r##"<text x="{cx}" y="160" text-anchor="middle" fill="#b5b5b4" font-family="Roboto, sans-serif" font-size="14">Ce document certifie que la nation d'Amestris nomme</text>"##,
        cx = center,
    ));
    svg.push_str(&format!(
        r##"<text x="{cx}" y="200" text-anchor="middle" fill="#DBB448" font-family="'Special Elite', monospace" font-size="24" font-weight="bold">{name}</text>"##,
        cx = center,
        name = name_upper,
    ));
    svg.push_str(&format!(
        r##"<text x="{cx}" y="240" text-anchor="middle" fill="#b5b5b4" font-family="Roboto, sans-serif" font-size="14">en tant qu'Alchimiste d'État</text>"##,
        cx = center,
    ));
    svg.push_str(&format!(
        r##"<text x="{cx}" y="265" text-anchor="middle" fill="#b5b5b4" font-family="Roboto, sans-serif" font-size="14">pour services rendus dans la compréhension</text>"##,
        cx = center,
    ));
    svg.push_str(&format!(
        r##"<text x="{cx}" y="290" text-anchor="middle" fill="#b5b5b4" font-family="Roboto, sans-serif" font-size="14">de l'œuvre de Hiromu Arakawa</text>"##,
        cx = center,
    ));

    // Alchemical seal: circle with inscribed triangle.
    svg.push_str(&format!(
        r##"<circle cx="{cx}" cy="345" r="30" fill="none" stroke="#70CBFF" stroke-width="2"/>"##,
        cx = center,
    ));
    svg.push_str(&format!(
        r##"<path d="M {tip} 320 L {left} 360 L {right} 360 Z" fill="none" stroke="#70CBFF" stroke-width="2"/>"##,
        tip = center,
        left = center - 20,
        right = center + 20,
    ));

    if !date.is_empty() {
        svg.push_str(&format!(
            r##"<text x="{cx}" y="395" text-anchor="middle" fill="#8E8E8D" font-family="'Special Elite', monospace" font-size="12">Délivré le {date}</text>"##,
            cx = center,
            date = escape_text(date),
        ));
    }

    svg.push_str("</svg>");
    svg
}
