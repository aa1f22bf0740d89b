//! Section renderers: splice a section's stored JSON document into the
//! live site's HTML.
//!
//! Each section owns a set of regex substitutions over the page(s) it
//! appears on. `SectionContent::parse` validates the document shape up
//! front; `apply` is pure text splicing and cannot fail. A page missing
//! the targeted markup comes back unchanged, which the publisher then
//! treats as nothing-to-commit.

use std::sync::LazyLock;

use regex::{NoExpand, Regex};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::errors::RenderError;

/// Pages that carry the shared footer; a footer publish rewrites all of
/// them in one commit.
pub const FOOTER_PAGES: &[&str] = &[
    "index.html",
    "about.html",
    "coaching.html",
    "contact.html",
    "system.html",
];

// ── Section document shapes (owned by the dashboard editors) ──────────

#[derive(Debug, Clone, Deserialize)]
pub struct HeroData {
    pub label: String,
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AboutData {
    pub label: String,
    pub title: String,
    pub intro: String,
    pub story: String,
    pub mission: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachingData {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub cta_text: String,
    pub cta_link: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FooterData {
    pub description: String,
    pub copyright: String,
    pub instagram: String,
    pub twitter: String,
    pub linkedin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Testimonial {
    #[serde(default)]
    pub id: String,
    pub badge: String,
    pub text: String,
    pub author: String,
    pub position: String,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageData {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub description: String,
    pub price: String,
    pub duration: String,
    pub features: Vec<String>,
    pub cta_text: String,
    pub cta_link: String,
    #[serde(default)]
    pub recommended: bool,
    #[serde(default = "default_true")]
    pub active: bool,
}

// ── Substitution targets ──────────────────────────────────────────────

static HERO_TAGLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<p class="hero-tagline">.*?</p>"#).unwrap());
static HERO_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<h1 class="hero-title">.*?</h1>"#).unwrap());
static HERO_SUBTITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<p class="hero-subtitle">.*?</p>"#).unwrap());

static ABOUT_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<span class="about-label">.*?</span>"#).unwrap());
static ABOUT_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<h2 class="about-title">.*?</h2>"#).unwrap());
static ABOUT_INTRO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<p class="about-intro">.*?</p>"#).unwrap());
static ABOUT_STORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<p class="about-story">.*?</p>"#).unwrap());
static ABOUT_MISSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<p class="about-mission">.*?</p>"#).unwrap());

static COACHING_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<h1 class="coaching-title">.*?</h1>"#).unwrap());
static COACHING_SUBTITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<p class="coaching-subtitle">.*?</p>"#).unwrap());
static COACHING_DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<p class="coaching-description">.*?</p>"#).unwrap());
static COACHING_CTA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<a class="coaching-cta" href="[^"]*">.*?</a>"#).unwrap());

static FOOTER_DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<p class="footer-description">.*?</p>"#).unwrap());
static FOOTER_COPYRIGHT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<p class="footer-copyright">.*?</p>"#).unwrap());
static FOOTER_INSTAGRAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(<a class="footer-social footer-instagram" href=")[^"]*(")"#).unwrap()
});
static FOOTER_TWITTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(<a class="footer-social footer-twitter" href=")[^"]*(")"#).unwrap()
});
static FOOTER_LINKEDIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(<a class="footer-social footer-linkedin" href=")[^"]*(")"#).unwrap()
});

// The grids nest divs, so the block end is matched by the marker comment
// the site templates carry rather than by tag counting.
static TESTIMONIALS_GRID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<div class="testimonials-grid">.*?</div><!-- /testimonials-grid -->"#)
        .unwrap()
});
static PACKAGES_GRID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<div class="packages-grid">.*?</div><!-- /packages-grid -->"#).unwrap()
});

/// Replace the first match with literal text (`$` in copy stays `$`).
fn splice(re: &Regex, html: &str, replacement: &str) -> String {
    re.replace(html, NoExpand(replacement)).into_owned()
}

/// Rewrite only the href attribute matched by `re`'s two capture groups.
fn splice_href(re: &Regex, html: &str, url: &str) -> String {
    re.replace(html, |caps: &regex::Captures| {
        format!("{}{}{}", &caps[1], url, &caps[2])
    })
    .into_owned()
}

// ── Parsed section content ────────────────────────────────────────────

/// A section document parsed into its typed shape, ready to splice into
/// the pages it appears on.
#[derive(Debug, Clone)]
pub enum SectionContent {
    Hero(HeroData),
    About(AboutData),
    Coaching(CoachingData),
    Footer(FooterData),
    Testimonials(Vec<Testimonial>),
    Packages(Vec<PackageData>),
}

impl SectionContent {
    pub fn parse(section: &str, data: &serde_json::Value) -> Result<Self, RenderError> {
        fn typed<T: DeserializeOwned>(
            section: &str,
            data: &serde_json::Value,
        ) -> Result<T, RenderError> {
            serde_json::from_value(data.clone()).map_err(|source| RenderError::BadData {
                section: section.to_string(),
                source,
            })
        }
        match section {
            "hero" => Ok(Self::Hero(typed(section, data)?)),
            "about" => Ok(Self::About(typed(section, data)?)),
            "coaching" => Ok(Self::Coaching(typed(section, data)?)),
            "footer" => Ok(Self::Footer(typed(section, data)?)),
            "testimonials" => Ok(Self::Testimonials(typed(section, data)?)),
            "packages" => Ok(Self::Packages(typed(section, data)?)),
            other => Err(RenderError::UnknownSection(other.to_string())),
        }
    }

    /// Repository files this section's publish touches, in batch order.
    pub fn files(&self) -> &'static [&'static str] {
        match self {
            Self::Hero(_) | Self::Testimonials(_) => &["index.html"],
            Self::About(_) => &["about.html"],
            Self::Coaching(_) | Self::Packages(_) => &["coaching.html"],
            Self::Footer(_) => FOOTER_PAGES,
        }
    }

    /// Splice this section's copy into one page's HTML.
    pub fn apply(&self, html: &str) -> String {
        match self {
            Self::Hero(d) => {
                let html = splice(
                    &HERO_TAGLINE,
                    html,
                    &format!(r#"<p class="hero-tagline">{}</p>"#, d.label),
                );
                let html = splice(
                    &HERO_TITLE,
                    &html,
                    &format!(r#"<h1 class="hero-title">{}</h1>"#, d.title),
                );
                splice(
                    &HERO_SUBTITLE,
                    &html,
                    &format!(r#"<p class="hero-subtitle">{}</p>"#, d.subtitle),
                )
            }
            Self::About(d) => {
                let html = splice(
                    &ABOUT_LABEL,
                    html,
                    &format!(r#"<span class="about-label">{}</span>"#, d.label),
                );
                let html = splice(
                    &ABOUT_TITLE,
                    &html,
                    &format!(r#"<h2 class="about-title">{}</h2>"#, d.title),
                );
                let html = splice(
                    &ABOUT_INTRO,
                    &html,
                    &format!(r#"<p class="about-intro">{}</p>"#, d.intro),
                );
                let html = splice(
                    &ABOUT_STORY,
                    &html,
                    &format!(r#"<p class="about-story">{}</p>"#, d.story),
                );
                splice(
                    &ABOUT_MISSION,
                    &html,
                    &format!(r#"<p class="about-mission">{}</p>"#, d.mission),
                )
            }
            Self::Coaching(d) => {
                let html = splice(
                    &COACHING_TITLE,
                    html,
                    &format!(r#"<h1 class="coaching-title">{}</h1>"#, d.title),
                );
                let html = splice(
                    &COACHING_SUBTITLE,
                    &html,
                    &format!(r#"<p class="coaching-subtitle">{}</p>"#, d.subtitle),
                );
                let html = splice(
                    &COACHING_DESCRIPTION,
                    &html,
                    &format!(r#"<p class="coaching-description">{}</p>"#, d.description),
                );
                splice(
                    &COACHING_CTA,
                    &html,
                    &format!(
                        r#"<a class="coaching-cta" href="{}">{}</a>"#,
                        d.cta_link, d.cta_text
                    ),
                )
            }
            Self::Footer(d) => {
                let html = splice(
                    &FOOTER_DESCRIPTION,
                    html,
                    &format!(r#"<p class="footer-description">{}</p>"#, d.description),
                );
                let html = splice(
                    &FOOTER_COPYRIGHT,
                    &html,
                    &format!(r#"<p class="footer-copyright">{}</p>"#, d.copyright),
                );
                let html = splice_href(&FOOTER_INSTAGRAM, &html, &d.instagram);
                let html = splice_href(&FOOTER_TWITTER, &html, &d.twitter);
                splice_href(&FOOTER_LINKEDIN, &html, &d.linkedin)
            }
            Self::Testimonials(items) => {
                splice(&TESTIMONIALS_GRID, html, &render_testimonials(items))
            }
            Self::Packages(items) => splice(&PACKAGES_GRID, html, &render_packages(items)),
        }
    }
}

fn render_testimonials(items: &[Testimonial]) -> String {
    let mut block = String::from("<div class=\"testimonials-grid\">\n");
    for t in items {
        block.push_str(&format!(
            concat!(
                "        <div class=\"testimonial-card\">\n",
                "          <span class=\"testimonial-badge\">{}</span>\n",
                "          <p class=\"testimonial-text\">{}</p>\n",
                "          <p class=\"testimonial-author\">{}</p>\n",
                "          <p class=\"testimonial-position\">{}</p>\n",
                "        </div>\n"
            ),
            t.badge, t.text, t.author, t.position
        ));
    }
    block.push_str("      </div><!-- /testimonials-grid -->");
    block
}

fn render_packages(items: &[PackageData]) -> String {
    let mut block = String::from("<div class=\"packages-grid\">\n");
    for p in items.iter().filter(|p| p.active) {
        let card_class = if p.recommended {
            "package-card package-recommended"
        } else {
            "package-card"
        };
        let features: String = p
            .features
            .iter()
            .map(|f| format!("            <li>{}</li>\n", f))
            .collect();
        block.push_str(&format!(
            concat!(
                "        <div class=\"{}\">\n",
                "          <h3 class=\"package-name\">{}</h3>\n",
                "          <p class=\"package-description\">{}</p>\n",
                "          <p class=\"package-price\">{}<span class=\"package-duration\">{}</span></p>\n",
                "          <ul class=\"package-features\">\n{}",
                "          </ul>\n",
                "          <a class=\"package-cta\" href=\"{}\">{}</a>\n",
                "        </div>\n"
            ),
            card_class, p.name, p.description, p.price, p.duration, features, p.cta_link, p.cta_text
        ));
    }
    block.push_str("      </div><!-- /packages-grid -->");
    block
}
