//! Timeline rendering in list, card and waterfall layouts.
//!
//! All three layouts consume the same bucket slice; the mode only picks the
//! per-title renderer and the container class.

use std::fmt::Write;
use std::str::FromStr;

use crate::config::Locale;
use crate::images::{ImageSize, ImageUrls};
use crate::models::Title;
use crate::timeline::{format_year_month, BucketExpansion, TimelineBucket};

/// Titles shown for a collapsed bucket.
pub const COLLAPSED_PREVIEW: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    List,
    Card,
    Waterfall,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::List, ViewMode::Card, ViewMode::Waterfall];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::List => "list",
            ViewMode::Card => "card",
            ViewMode::Waterfall => "waterfall",
        }
    }

    fn container_class(&self) -> &'static str {
        match self {
            ViewMode::List => "grid grid-cols-1 gap-3",
            ViewMode::Card => "grid grid-cols-2 sm:grid-cols-3 md:grid-cols-4 lg:grid-cols-6 gap-3",
            ViewMode::Waterfall => "columns-2 sm:columns-3 md:columns-4 lg:columns-6 space-y-3",
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" => Ok(ViewMode::List),
            "card" => Ok(ViewMode::Card),
            "waterfall" => Ok(ViewMode::Waterfall),
            other => Err(format!("unknown view mode '{other}'")),
        }
    }
}

/// Rendering inputs passed down from the page instead of living in globals.
#[derive(Debug, Clone)]
pub struct DisplayContext {
    pub images: ImageUrls,
    pub locale: Locale,
}

impl DisplayContext {
    pub fn new(images: ImageUrls, locale: Locale) -> Self {
        Self { images, locale }
    }

    pub(crate) fn text(&self, en: &'static str, zh: &'static str) -> &'static str {
        match self.locale {
            Locale::En => en,
            Locale::Zh => zh,
        }
    }
}

/// Renders the bucket sequence. `toggle_href` builds the link that flips one
/// bucket's expansion.
pub fn render_timeline<F>(
    buckets: &[TimelineBucket],
    mode: ViewMode,
    expansion: &BucketExpansion,
    ctx: &DisplayContext,
    toggle_href: F,
) -> String
where
    F: Fn(&str) -> String,
{
    let mut html = String::from("<div class=\"timeline space-y-8\">");
    for bucket in buckets {
        let expanded = expansion.is_expanded(&bucket.year_month);
        let label = if expanded {
            ctx.text("Collapse", "收起")
        } else {
            ctx.text("Expand", "展开")
        };
        let _ = write!(
            html,
            "<section class=\"bucket\" data-year-month=\"{key}\"><div class=\"bucket-header\"><h2>{heading}</h2><a class=\"toggle\" href=\"{href}\">{label}</a></div><div class=\"{class}\" data-mode=\"{mode}\">",
            key = escape_html(&bucket.year_month),
            heading = escape_html(&format_year_month(&bucket.year_month)),
            href = escape_html(&toggle_href(&bucket.year_month)),
            class = mode.container_class(),
            mode = mode.as_str(),
        );
        let shown = if expanded {
            bucket.titles.len()
        } else {
            COLLAPSED_PREVIEW
        };
        for title in bucket.titles.iter().take(shown) {
            html.push_str(&render_title(title, mode, ctx));
        }
        if !expanded && bucket.titles.len() > COLLAPSED_PREVIEW {
            let _ = write!(
                html,
                "<p class=\"more\">+{}</p>",
                bucket.titles.len() - COLLAPSED_PREVIEW
            );
        }
        html.push_str("</div></section>");
    }
    html.push_str("</div>");
    html
}

pub fn render_title(title: &Title, mode: ViewMode, ctx: &DisplayContext) -> String {
    match mode {
        ViewMode::List => list_item(title, ctx),
        ViewMode::Card => card(title, ctx),
        ViewMode::Waterfall => waterfall_item(title, ctx),
    }
}

fn list_item(title: &Title, ctx: &DisplayContext) -> String {
    format!(
        "<a class=\"title list-item\" href=\"{href}\" data-title-id=\"{id}\"><img src=\"{poster}\" alt=\"{name}\" class=\"w-12 h-18\"><div><h3>{name}</h3><span class=\"rating\">★ {rating:.1}</span> <span class=\"date\">{date}</span><p class=\"overview line-clamp-1\">{overview}</p></div></a>",
        href = title_href(title),
        id = title.id,
        poster = escape_html(&ctx.images.poster(title.poster_path.as_deref(), ImageSize::W92)),
        name = escape_html(&title.name),
        rating = title.vote_average,
        date = escape_html(title.display_date().unwrap_or_default()),
        overview = escape_html(title.overview.as_deref().unwrap_or_default()),
    )
}

fn card(title: &Title, ctx: &DisplayContext) -> String {
    format!(
        "<a class=\"title card\" href=\"{href}\" data-title-id=\"{id}\"><div class=\"poster aspect-[2/3]\"><img src=\"{poster}\" alt=\"{name}\"><span class=\"badge rating\">★ {rating:.1}</span></div><div class=\"p-2\"><h3>{name}</h3><span class=\"date\">{date}</span></div></a>",
        href = title_href(title),
        id = title.id,
        poster = escape_html(&ctx.images.poster(title.poster_path.as_deref(), ImageSize::W342)),
        name = escape_html(&title.name),
        rating = title.vote_average,
        date = escape_html(title.display_date().unwrap_or_default()),
    )
}

fn waterfall_item(title: &Title, ctx: &DisplayContext) -> String {
    format!(
        "<a class=\"title waterfall-item block mb-3 break-inside-avoid\" href=\"{href}\" data-title-id=\"{id}\"><img src=\"{poster}\" alt=\"{name}\"><div class=\"overlay\"><h3>{name}</h3><span class=\"rating\">★ {rating:.1}</span> <span class=\"date\">{date}</span></div></a>",
        href = title_href(title),
        id = title.id,
        poster = escape_html(&ctx.images.poster(title.poster_path.as_deref(), ImageSize::W342)),
        name = escape_html(&title.name),
        rating = title.vote_average,
        date = escape_html(title.display_date().unwrap_or_default()),
    )
}

/// Detail page link; carries the internal id so the page can show the header.
pub fn title_href(title: &Title) -> String {
    format!("/anime/{}?id={}", title.tmdb_id, title.id)
}

pub fn escape_html(input: &str) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::group_by_month;

    fn ctx() -> DisplayContext {
        DisplayContext::new(ImageUrls::new("https://img.test/t/p"), Locale::En)
    }

    fn title(id: i64, date: &str) -> Title {
        Title {
            id,
            tmdb_id: id * 100,
            name: format!("Show {id}"),
            overview: Some(format!("Overview of show {id}")),
            first_air_date: Some(date.to_string()),
            vote_average: 7.3,
            poster_path: Some(format!("/p{id}.jpg")),
            ..Title::default()
        }
    }

    fn rendered_ids(html: &str) -> Vec<String> {
        html.split("data-title-id=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .map(str::to_string)
            .collect()
    }

    fn sample_buckets() -> Vec<TimelineBucket> {
        let titles = vec![
            title(3, "2023-11-02"),
            title(1, "2022-01-09"),
            title(4, "2023-11-28"),
            title(2, "2021-03-14"),
        ];
        group_by_month(&titles)
    }

    #[test]
    fn every_mode_shows_same_titles_in_same_order() {
        let buckets = sample_buckets();
        let snapshot = buckets.clone();
        let expansion = BucketExpansion::default();
        let orders: Vec<Vec<String>> = [ViewMode::List, ViewMode::Card, ViewMode::Waterfall, ViewMode::List]
            .into_iter()
            .map(|mode| rendered_ids(&render_timeline(&buckets, mode, &expansion, &ctx(), |k| format!("#{k}"))))
            .collect();
        assert_eq!(orders[0], vec!["3", "4", "1", "2"]);
        assert!(orders.iter().all(|o| o == &orders[0]));
        assert_eq!(buckets, snapshot);
    }

    #[test]
    fn only_list_mode_shows_overview() {
        let t = title(1, "2024-01-01");
        assert!(render_title(&t, ViewMode::List, &ctx()).contains("Overview of show 1"));
        assert!(!render_title(&t, ViewMode::Card, &ctx()).contains("Overview of show 1"));
        assert!(!render_title(&t, ViewMode::Waterfall, &ctx()).contains("Overview of show 1"));
    }

    #[test]
    fn poster_sizes_follow_layout() {
        let t = title(1, "2024-01-01");
        assert!(render_title(&t, ViewMode::List, &ctx()).contains("https://img.test/t/p/w92/p1.jpg"));
        assert!(render_title(&t, ViewMode::Card, &ctx()).contains("https://img.test/t/p/w342/p1.jpg"));
        assert!(render_title(&t, ViewMode::Waterfall, &ctx()).contains("★ 7.3"));
    }

    #[test]
    fn collapsed_bucket_shows_preview_only() {
        let titles: Vec<Title> = (0..15).map(|i| title(i, "2024-02-01")).collect();
        let buckets = group_by_month(&titles);
        let collapsed = render_timeline(&buckets, ViewMode::Card, &BucketExpansion::default(), &ctx(), |k| k.to_string());
        assert_eq!(rendered_ids(&collapsed).len(), COLLAPSED_PREVIEW);
        assert!(collapsed.contains(">Expand<"));

        let expanded = BucketExpansion::from_keys(["2024-02"]);
        let full = render_timeline(&buckets, ViewMode::Card, &expanded, &ctx(), |k| k.to_string());
        assert_eq!(rendered_ids(&full).len(), 15);
        assert!(full.contains(">Collapse<"));
    }

    #[test]
    fn escapes_backend_text() {
        let mut t = title(1, "2024-01-01");
        t.name = "<script>alert('x')</script>".to_string();
        let html = render_title(&t, ViewMode::Card, &ctx());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn parses_mode_names() {
        for mode in ViewMode::ALL {
            assert_eq!(mode.as_str().parse::<ViewMode>(), Ok(mode));
        }
        assert!("grid".parse::<ViewMode>().is_err());
    }
}
