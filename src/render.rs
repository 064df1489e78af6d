//! Plain-text rendering of the page controllers for the terminal client.
//! Layouts live in `templates/`.

use askama::Template;

use crate::models::{AdminUser, FeedReview, Foot, Review};
use crate::views::admin_users::{AdminUsersPage, SELF_DELETE};
use crate::views::feed::FeetStats;
use crate::views::feet::{DuplicateFoot, FeetPage};
use crate::views::foot_detail::{FootDetailPage, FOOT_NOT_FOUND};
use crate::views::minigame::MinigamePage;
use crate::views::PageStatus;

const LOADING: &str = "Cargando...";

#[derive(Template)]
#[template(path = "partials/stats.txt")]
struct StatsView<'a> {
    stats: &'a FeetStats,
}

#[derive(Template)]
#[template(path = "partials/latest_reviews.txt")]
struct LatestReviewsView<'a> {
    reviews: &'a [FeedReview],
    loading: bool,
}

#[derive(Template)]
#[template(path = "partials/duplicate.txt")]
struct DuplicateView<'a> {
    dup: &'a DuplicateFoot,
}

struct FootRow<'a> {
    foot: &'a Foot,
    action: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "pages/feet.txt")]
struct FeetView<'a> {
    banner: Option<&'a str>,
    duplicate: Option<&'a str>,
    rows: Vec<FootRow<'a>>,
    pending_delete: Option<i64>,
    stats: &'a str,
    latest: &'a str,
}

struct ReviewRow<'a> {
    review: &'a Review,
    editable: bool,
}

#[derive(Template)]
#[template(path = "pages/foot_detail.txt")]
struct FootDetailView<'a> {
    banner: Option<&'a str>,
    popup: Option<&'a str>,
    not_found: Option<&'a str>,
    foot: Option<&'a Foot>,
    rows: Vec<ReviewRow<'a>>,
    pending_delete: Option<i64>,
}

struct UserRow<'a> {
    user: &'a AdminUser,
    is_self: bool,
}

#[derive(Template)]
#[template(path = "pages/admin_users.txt")]
struct AdminUsersView<'a> {
    banner: Option<&'a str>,
    search: &'a str,
    rows: Vec<UserRow<'a>>,
    page_label: String,
    self_note: Option<&'a str>,
    pending_user: Option<i64>,
    pending_review: Option<i64>,
    latest: &'a str,
}

#[derive(Template)]
#[template(path = "pages/minigame.txt")]
struct MinigameView<'a> {
    folder: Option<&'a str>,
    total: usize,
    finished: bool,
    likes: u32,
    dislikes: u32,
    current: Option<&'a str>,
    progress: String,
    day_likes: u32,
    day_dislikes: u32,
}

/// Render without the surrounding blank lines the tag layout leaves behind.
fn block<T: Template>(view: &T) -> askama::Result<String> {
    Ok(view.render()?.trim_matches('\n').to_string())
}

fn page<T: Template>(view: &T) -> askama::Result<String> {
    let mut out = block(view)?;
    out.push('\n');
    Ok(out)
}

pub fn stats(stats: &FeetStats) -> askama::Result<String> {
    page(&StatsView { stats })
}

pub fn latest_reviews(reviews: &[FeedReview], loading: bool) -> askama::Result<String> {
    page(&LatestReviewsView { reviews, loading })
}

pub fn duplicate(dup: &DuplicateFoot) -> askama::Result<String> {
    page(&DuplicateView { dup })
}

pub fn feet_page(feet: &FeetPage) -> askama::Result<String> {
    if feet.status.is_loading() {
        return Ok(format!("{}\n", LOADING));
    }

    let duplicate = feet
        .duplicate
        .as_ref()
        .map(|dup| block(&DuplicateView { dup }))
        .transpose()?;
    let stats = block(&StatsView { stats: &feet.stats })?;
    let latest = block(&LatestReviewsView {
        reviews: &feet.latest_reviews,
        loading: feet.loading_reviews,
    })?;
    let rows = feet
        .feet
        .iter()
        .map(|foot| FootRow {
            foot,
            action: feet
                .can_delete(foot)
                .then(|| feet.deleting.label(&foot.id, "eliminar", "eliminando...")),
        })
        .collect();

    page(&FeetView {
        banner: feet.banner(),
        duplicate: duplicate.as_deref(),
        rows,
        pending_delete: feet.delete_confirmation.pending().copied(),
        stats: &stats,
        latest: &latest,
    })
}

pub fn foot_detail(detail: &FootDetailPage) -> askama::Result<String> {
    if detail.status.is_loading() {
        return Ok(format!("{}\n", LOADING));
    }

    let rows = detail
        .reviews
        .iter()
        .map(|review| ReviewRow {
            review,
            editable: detail.can_edit(review),
        })
        .collect();

    page(&FootDetailView {
        banner: detail.banner(),
        popup: detail.friendly_popup.as_deref(),
        not_found: (detail.foot.is_none() && detail.status.is_ready()).then_some(FOOT_NOT_FOUND),
        foot: detail.foot.as_ref(),
        rows,
        pending_delete: detail.delete_confirmation.pending().copied(),
    })
}

pub fn admin_users(admin: &AdminUsersPage) -> askama::Result<String> {
    if admin.status.is_loading() {
        return Ok(format!("{}\n", LOADING));
    }

    let latest = block(&LatestReviewsView {
        reviews: &admin.latest_reviews,
        loading: admin.loading_reviews,
    })?;
    let rows: Vec<UserRow> = admin
        .users
        .iter()
        .map(|user| UserRow {
            user,
            is_self: admin.is_self(user.id),
        })
        .collect();
    let self_note = rows.iter().any(|row| row.is_self).then_some(SELF_DELETE);

    page(&AdminUsersView {
        banner: admin.banner(),
        search: &admin.search,
        rows,
        page_label: admin.page_label(),
        self_note,
        pending_user: admin.user_confirmation.pending().copied(),
        pending_review: admin.review_confirmation.pending().copied(),
        latest: &latest,
    })
}

pub fn minigame(game: &MinigamePage) -> askama::Result<String> {
    if let PageStatus::Errored(msg) = &game.status {
        return Ok(format!("[!] {}\n", msg));
    }

    let finished = game.finished();
    page(&MinigameView {
        folder: game.selected_folder.as_deref(),
        total: game.total(),
        finished,
        likes: game.likes,
        dislikes: game.dislikes,
        current: if finished { None } else { game.current_image() },
        progress: game.progress_label(),
        day_likes: game.totals.likes,
        day_dislikes: game.totals.dislikes,
    })
}
