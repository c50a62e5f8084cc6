//! Detekce anti-bot interstitialu (Cloudflare "Just a moment..." apod.)

/// Title interstitialu; `captcha` jen tady, v body ho mívá i login formulář
const TITLE_MARKERS: &[&str] = &[
    "just a moment",
    "attention required",
    "checking your browser",
    "captcha",
];

/// DOM, který existuje jen na challenge stránce. `challenge-platform` sem nepatří:
/// Cloudflare beacon (`/cdn-cgi/challenge-platform/...`) je i na odbavených stránkách.
const BODY_MARKERS: &[&str] = &[
    "cf-challenge",
    "id=\"challenge-form\"",
    "cf-chl-",
];

pub fn looks_like_challenge(title: &str, html: &str) -> bool {
    let title = title.to_lowercase();
    if TITLE_MARKERS.iter().any(|m| title.contains(m)) {
        return true;
    }
    let lower = html.to_lowercase();
    BODY_MARKERS.iter().any(|m| lower.contains(m))
}

/// Title z HTML pro zdroje, které nemají živý tab (fixtures)
pub fn html_title(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let Some(start) = lower.find("<title>") else { return String::new() };
    let rest = &html[start + "<title>".len()..];
    let end = rest.to_ascii_lowercase().find("</title>").unwrap_or(rest.len());
    rest[..end].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_cloudflare_interstitial() {
        let html = "<html><head><title>Just a moment...</title></head><body><div id=\"cf-challenge-running\"></div></body></html>";
        assert!(looks_like_challenge(&html_title(html), html));
    }

    #[test]
    fn regular_page_is_not_a_challenge() {
        let html = "<html><head><title>CS2 Events | HLTV.org</title></head><body><a class=\"ongoing-event\"></a></body></html>";
        assert_eq!(html_title(html), "CS2 Events | HLTV.org");
        assert!(!looks_like_challenge(&html_title(html), html));
    }

    #[test]
    fn cloudflare_beacon_on_cleared_page_is_not_a_challenge() {
        let html = r#"<html><head><title>CS2 Events | HLTV.org</title></head><body>
            <a class="ongoing-event"></a>
            <script src="/cdn-cgi/challenge-platform/scripts/jsd/main.js"></script>
            <script src="https://www.google.com/recaptcha/api.js"></script>
        </body></html>"#;
        assert!(!looks_like_challenge(&html_title(html), html));
    }

    #[test]
    fn challenge_form_and_captcha_title_are_detected() {
        let form = r#"<html><head><title>hltv.org</title></head><body><form id="challenge-form" action="/?__cf_chl_f_tk=x"></form></body></html>"#;
        assert!(looks_like_challenge(&html_title(form), form));

        let chl = r#"<html><head><title>hltv.org</title></head><body><script src="/cdn-cgi/challenge-platform/h/g/orchestrate/chl_page/v1"></script><div class="cf-chl-widget"></div></body></html>"#;
        assert!(looks_like_challenge(&html_title(chl), chl));

        assert!(looks_like_challenge("Captcha check", "<body></body>"));
    }
}
