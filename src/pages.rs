//! Full HTML documents served by the web host.

use chrono::{Datelike, Utc};
use std::fmt::Write;

use crate::api::SearchParams;
use crate::config::Locale;
use crate::detail::{DetailNavigator, DetailState};
use crate::images::ImageSize;
use crate::models::{Episode, Title};
use crate::recommend::RecommendationView;
use crate::search::SearchView;
use crate::timeline::{BucketExpansion, RatingFilter};
use crate::view::{escape_html, render_timeline, title_href, DisplayContext, ViewMode};

pub fn layout(ctx: &DisplayContext, heading: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"{lang}\"><head><meta charset=\"utf-8\"><meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"><title>{heading}</title></head><body><header class=\"site-header\"><a href=\"/\" class=\"brand\">{brand}</a><nav><a href=\"/\">{search}</a> <a href=\"/recommend\">{recommend}</a></nav></header><main class=\"container\">{body}</main><footer><p>&copy; {year} {brand}</p></footer></body></html>",
        lang = ctx.text("en", "zh"),
        heading = escape_html(heading),
        brand = ctx.text("Anime Timeline", "今天看点什么动漫"),
        search = ctx.text("Timeline", "时间线"),
        recommend = ctx.text("Recommendations", "推荐"),
        body = body,
        year = Utc::now().year(),
    )
}

pub fn error_page(ctx: &DisplayContext, message: &str) -> String {
    let body = format!(
        "<div class=\"error text-center\"><p class=\"text-red-500\">{}</p><a class=\"button\" href=\"/\">{}</a></div>",
        escape_html(message),
        ctx.text("Back to Home", "返回首页"),
    );
    layout(ctx, message, &body)
}

/// Link back to the search page with the given state encoded in the query.
/// With a session the host re-renders the stored results instead of
/// searching again, as long as `params` are unchanged.
pub fn search_href(
    params: &SearchParams,
    rating: RatingFilter,
    mode: ViewMode,
    expansion: &BucketExpansion,
    session: Option<u64>,
) -> String {
    let mut query = params.query_string();
    let mut push = |key: &str, value: &str| {
        if !query.is_empty() {
            query.push('&');
        }
        let _ = write!(query, "{}={}", key, urlencoding::encode(value));
    };
    if rating != RatingFilter::All {
        push("rating", rating.as_str());
    }
    push("view", mode.as_str());
    let keys = expansion.keys();
    if !keys.is_empty() {
        push("expanded", &keys.join(","));
    }
    if let Some(id) = session {
        push("session", &id.to_string());
    }
    format!("/?{query}")
}

pub fn search_page(view: &SearchView, ctx: &DisplayContext, session: u64) -> String {
    let mut body = String::new();
    let params = &view.params;
    let value = |v: &Option<String>| escape_html(v.as_deref().unwrap_or_default());

    let _ = write!(
        body,
        "<form class=\"search\" method=\"get\" action=\"/\"><input type=\"search\" name=\"keyword\" value=\"{keyword}\" placeholder=\"{placeholder}\"><input type=\"date\" name=\"startDate\" value=\"{start}\"><input type=\"date\" name=\"endDate\" value=\"{end}\"><select name=\"rating\">",
        keyword = value(&params.keyword),
        placeholder = ctx.text("Search anime...", "搜索动漫..."),
        start = value(&params.start_date),
        end = value(&params.end_date),
    );
    for filter in RatingFilter::ALL {
        let selected = if filter == view.rating { " selected" } else { "" };
        let label = match filter {
            RatingFilter::All => ctx.text("All ratings", "全部评分"),
            _ => filter.as_str(),
        };
        let _ = write!(
            body,
            "<option value=\"{}\"{}>{}</option>",
            filter.as_str(),
            selected,
            label
        );
    }
    let _ = write!(
        body,
        "</select><input type=\"hidden\" name=\"view\" value=\"{}\"><input type=\"hidden\" name=\"session\" value=\"{}\"><button type=\"submit\">{}</button></form>",
        view.mode.as_str(),
        session,
        ctx.text("Search", "搜索"),
    );

    body.push_str("<nav class=\"view-modes\">");
    for mode in ViewMode::ALL {
        let class = if mode == view.mode { "active" } else { "" };
        let _ = write!(
            body,
            "<a class=\"{}\" href=\"{}\">{}</a> ",
            class,
            escape_html(&search_href(params, view.rating, mode, &view.expansion, Some(session))),
            mode.as_str()
        );
    }
    body.push_str("</nav>");

    if let Some(message) = view.error() {
        let _ = write!(
            body,
            "<div class=\"error\"><p class=\"text-red-500\">{}</p><a class=\"button\" href=\"{}\">{}</a></div>",
            escape_html(message),
            escape_html(&search_href(params, view.rating, view.mode, &view.expansion, None)),
            ctx.text("Retry", "重试"),
        );
    }

    if let Some(page) = view.page() {
        let buckets = view.buckets();
        if buckets.is_empty() {
            let _ = write!(
                body,
                "<p class=\"empty\">{}</p>",
                ctx.text("No anime to show.", "暂无动漫。")
            );
        } else {
            body.push_str(&render_timeline(
                &buckets,
                view.mode,
                &view.expansion,
                ctx,
                |year_month| {
                    let mut toggled = view.expansion.clone();
                    toggled.toggle(year_month);
                    search_href(params, view.rating, view.mode, &toggled, Some(session))
                },
            ));
        }

        body.push_str("<nav class=\"pagination\">");
        let page_link = |number: u32, label: &str| {
            let target = SearchParams {
                page: Some(number),
                size: params.size.or(Some(page.page_size)).filter(|s| *s > 0),
                ..params.clone()
            };
            format!(
                "<a href=\"{}\">{}</a>",
                escape_html(&search_href(
                    &target,
                    view.rating,
                    view.mode,
                    &view.expansion,
                    Some(session)
                )),
                label
            )
        };
        if page.has_previous() {
            body.push_str(&page_link(
                page.current_page.saturating_sub(1),
                ctx.text("Previous", "上一页"),
            ));
        }
        let _ = write!(
            body,
            " <span>{} / {}</span> ",
            page.current_page.saturating_add(1),
            page.total_pages.max(1)
        );
        if page.has_next() {
            body.push_str(&page_link(
                page.current_page.saturating_add(1),
                ctx.text("Next", "下一页"),
            ));
        }
        body.push_str("</nav>");
    }

    layout(ctx, ctx.text("Anime Timeline", "动漫时间线"), &body)
}

fn title_header(title: &Title, ctx: &DisplayContext) -> String {
    let unknown = ctx.text("Unknown date", "日期未知");
    format!(
        "<div class=\"backdrop\"><img src=\"{backdrop}\" alt=\"{name}\"></div><div class=\"title-header\"><img class=\"poster\" src=\"{poster}\" alt=\"{name}\"><div><h1>{name}</h1><p class=\"original-name\">{original}</p><span class=\"rating\">★ {rating:.1}</span> <span class=\"date\">{date}</span> <span class=\"media-type\">{media}</span><h2>{synopsis_label}</h2><p class=\"overview\">{overview}</p><dl><dt>{language_label}</dt><dd>{language}</dd><dt>{popularity_label}</dt><dd>{popularity}</dd><dt>{votes_label}</dt><dd>{votes}</dd></dl></div></div>",
        backdrop = escape_html(&ctx.images.backdrop(title.backdrop_path.as_deref(), ImageSize::Original)),
        poster = escape_html(&ctx.images.poster(title.poster_path.as_deref(), ImageSize::W500)),
        name = escape_html(&title.name),
        original = escape_html(title.original_name.as_deref().unwrap_or_default()),
        rating = title.vote_average,
        date = escape_html(title.display_date().unwrap_or(unknown)),
        media = escape_html(&title.media_type.as_deref().unwrap_or_default().to_uppercase()),
        synopsis_label = ctx.text("Synopsis", "简介"),
        overview = escape_html(
            title
                .overview
                .as_deref()
                .filter(|o| !o.is_empty())
                .unwrap_or(ctx.text("No synopsis available.", "暂无简介。"))
        ),
        language_label = ctx.text("Language", "语言"),
        language = escape_html(&title.original_language.as_deref().unwrap_or_default().to_uppercase()),
        popularity_label = ctx.text("Popularity", "热度"),
        popularity = title.popularity,
        votes_label = ctx.text("Vote Count", "评分人数"),
        votes = title.vote_count,
    )
}

/// Link to the detail page with a season selected and some episodes open.
pub fn detail_href(
    tmdb_id: i64,
    title_id: Option<i64>,
    season: i32,
    open: impl IntoIterator<Item = i32>,
    session: Option<u64>,
) -> String {
    let mut href = format!("/anime/{tmdb_id}?season={season}");
    if let Some(id) = title_id {
        let _ = write!(href, "&id={id}");
    }
    let open: Vec<String> = open.into_iter().map(|n| n.to_string()).collect();
    if !open.is_empty() {
        let _ = write!(href, "&open={}", open.join(","));
    }
    if let Some(session) = session {
        let _ = write!(href, "&session={session}");
    }
    href
}

pub fn detail_page(
    title: Option<&Title>,
    nav: &DetailNavigator,
    ctx: &DisplayContext,
    session: Option<u64>,
) -> String {
    let mut body = String::new();
    if let Some(title) = title {
        body.push_str(&title_header(title, ctx));
    }
    let title_id = title.map(|t| t.id);
    let tmdb_id = nav.tmdb_id();

    match nav.state() {
        DetailState::Initial => {
            let _ = write!(body, "<p class=\"loading\">{}</p>", ctx.text("Loading...", "加载中..."));
        }
        DetailState::Error(message) => {
            let _ = write!(
                body,
                "<div class=\"error\"><p class=\"text-red-500\">{}</p><a class=\"button\" href=\"/\">{}</a></div>",
                escape_html(message),
                ctx.text("Back to Home", "返回首页"),
            );
        }
        DetailState::EpisodesLoaded {
            seasons,
            selected,
            episodes,
        } => {
            body.push_str("<nav class=\"season-tabs\">");
            for season in seasons {
                let class = if season.season_number == *selected { "active" } else { "" };
                let label = season
                    .name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| match ctx.locale {
                        Locale::En => format!("Season {}", season.season_number),
                        Locale::Zh => format!("第{}季", season.season_number),
                    });
                let _ = write!(
                    body,
                    "<a class=\"{}\" href=\"{}\" data-season=\"{}\">{}</a> ",
                    class,
                    escape_html(&detail_href(tmdb_id, title_id, season.season_number, [], session)),
                    season.season_number,
                    escape_html(&label),
                );
            }
            body.push_str("</nav><ol class=\"episodes\">");
            for episode in episodes {
                body.push_str(&episode_row(episode, nav, title_id, *selected, ctx, session));
            }
            body.push_str("</ol>");
        }
    }

    let heading = title.map(|t| t.name.as_str()).unwrap_or(ctx.text("Anime", "动漫"));
    layout(ctx, heading, &body)
}

fn episode_row(
    episode: &Episode,
    nav: &DetailNavigator,
    title_id: Option<i64>,
    season: i32,
    ctx: &DisplayContext,
    session: Option<u64>,
) -> String {
    let number = episode.episode_number;
    let expanded = nav.is_expanded(number);
    let toggled = nav
        .expanded_episodes()
        .filter(|n| *n != number)
        .chain((!expanded).then_some(number));
    let name = episode.name.as_deref().unwrap_or_default();
    let mut row = format!(
        "<li class=\"episode\" data-episode=\"{number}\"><a class=\"toggle\" href=\"{href}\"><span class=\"number\">{number}.</span> {name}</a>",
        href = escape_html(&detail_href(nav.tmdb_id(), title_id, season, toggled, session)),
        name = escape_html(name),
    );
    if expanded {
        let _ = write!(
            row,
            "<div class=\"episode-detail\"><img src=\"{still}\" alt=\"{name}\"><p>{overview}</p><span class=\"date\">{date}</span> <span class=\"runtime\">{runtime}</span> <a href=\"{link}\">{more}</a></div>",
            still = escape_html(&ctx.images.still(episode.still_path.as_deref(), ImageSize::W300)),
            name = escape_html(name),
            overview = escape_html(episode.overview.as_deref().unwrap_or_default()),
            date = escape_html(episode.air_date.as_deref().unwrap_or_default()),
            runtime = episode
                .runtime
                .map(|r| format!("{r} min"))
                .unwrap_or_default(),
            link = format!(
                "/anime/{}/seasons/{}/episodes/{}",
                nav.tmdb_id(),
                season,
                number
            ),
            more = ctx.text("Details", "详情"),
        );
    }
    row.push_str("</li>");
    row
}

pub fn episode_page(
    tmdb_id: i64,
    season: i32,
    episode: &Episode,
    ctx: &DisplayContext,
) -> String {
    let name = episode.name.as_deref().unwrap_or_default();
    let body = format!(
        "<article class=\"episode-page\"><a href=\"{back}\">{back_label}</a><img src=\"{still}\" alt=\"{name}\"><h1>{number}. {name}</h1><p class=\"overview\">{overview}</p><span class=\"date\">{date}</span> <span class=\"runtime\">{runtime}</span> <span class=\"rating\">{rating}</span></article>",
        back = escape_html(&detail_href(tmdb_id, None, season, [], None)),
        back_label = ctx.text("Back", "返回"),
        still = escape_html(&ctx.images.still(episode.still_path.as_deref(), ImageSize::Original)),
        name = escape_html(name),
        number = episode.episode_number,
        overview = escape_html(episode.overview.as_deref().unwrap_or_default()),
        date = escape_html(episode.air_date.as_deref().unwrap_or_default()),
        runtime = episode.runtime.map(|r| format!("{r} min")).unwrap_or_default(),
        rating = episode
            .vote_average
            .map(|v| format!("★ {v:.1}"))
            .unwrap_or_default(),
    );
    layout(ctx, name, &body)
}

pub fn recommend_page(view: &RecommendationView, ctx: &DisplayContext) -> String {
    let mut body = format!(
        "<section class=\"recommend\"><h1>{heading}</h1><p>{intro}</p><form method=\"post\" action=\"/recommend\"><input type=\"text\" name=\"query\" value=\"{query}\" placeholder=\"{placeholder}\"><button type=\"submit\">{submit}</button></form></section>",
        heading = ctx.text("What anime do you feel like today?", "今天想看什么动漫？"),
        intro = ctx.text(
            "Tell me your mood or taste and I will suggest something to watch.",
            "告诉我你的心情或喜好，我会为你推荐适合的动漫"
        ),
        query = escape_html(view.query()),
        placeholder = ctx.text(
            "e.g. a bright, beautifully drawn high-school slice of life",
            "例如：我想看充满青春气息，画风精美的高中日常动漫"
        ),
        submit = ctx.text("Search", "搜索"),
    );

    if let Some(message) = view.error() {
        let _ = write!(
            body,
            "<div class=\"error\"><p class=\"text-red-500\">{}</p><a class=\"button\" href=\"/recommend\">{}</a></div>",
            escape_html(message),
            ctx.text("Retry", "重试"),
        );
    }

    if !view.recommendations().is_empty() {
        let _ = write!(
            body,
            "<h2>{}</h2><div class=\"recommendations grid\">",
            ctx.text("Recommended for you", "为你推荐的动漫")
        );
        for rec in view.recommendations() {
            let anime = &rec.anime;
            let _ = write!(
                body,
                "<a class=\"recommendation card\" href=\"{href}\" data-title-id=\"{id}\"><img src=\"{poster}\" alt=\"{name}\"><span class=\"badge rating\">★ {rating:.1}</span><h3>{name}</h3><p class=\"original-name\">{original}</p><p class=\"reason\">{reason}</p><span class=\"date\">{date}</span></a>",
                href = escape_html(&title_href(anime)),
                id = anime.id,
                poster = escape_html(&ctx.images.poster(anime.poster_path.as_deref(), ImageSize::W342)),
                name = escape_html(&anime.name),
                rating = anime.vote_average,
                original = escape_html(anime.original_name.as_deref().unwrap_or_default()),
                reason = escape_html(&rec.reason),
                date = escape_html(anime.display_date().unwrap_or_default()),
            );
        }
        body.push_str("</div>");
    }

    layout(ctx, ctx.text("Recommendations", "推荐"), &body)
}
