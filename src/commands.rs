use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use axum::Router;
use clap::Subcommand;
use tokio::io::{AsyncBufReadExt, BufReader};
use tower_http::trace::TraceLayer;

use crate::api::ApiClient;
use crate::config::{Cli, Config};
use crate::library;
use crate::models::{ArchType, Role, SwipeAction};
use crate::navigation::{Navigator, Route, SESSION_EXPIRED_PATH};
use crate::render;
use crate::session::SessionStore;
use crate::state::AppState;
use crate::views::admin_users::AdminUsersPage;
use crate::views::feet::FeetPage;
use crate::views::foot_detail::FootDetailPage;
use crate::views::login::{self, LoginPage};
use crate::views::minigame::MinigamePage;
use crate::views::register::RegisterPage;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the minigame image library over HTTP
    Serve,
    /// Log in and store the session token
    Login { username: String, password: String },
    /// Create a new account
    Register {
        username: String,
        email: String,
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// List feet with stats and the latest reviews
    Feet {
        /// Keep refreshing the latest reviews panel
        #[arg(long)]
        watch: bool,
    },
    /// Publish a foot
    CreateFoot {
        title: String,
        /// Remote image URL
        #[arg(long, conflicts_with = "image")]
        image_url: Option<String>,
        /// Local image file, uploaded as a data URL
        #[arg(long)]
        image: Option<PathBuf>,
        /// PES_PLANUS, PES_RECTUS or PES_CAVUS
        #[arg(long)]
        arch: Option<ArchType>,
    },
    /// Delete one of your feet (any foot for admins)
    DeleteFoot { id: i64 },
    /// Show a foot and its reviews
    Foot { id: i64 },
    /// Review a foot
    Review {
        foot_id: i64,
        /// 1 to 5
        #[arg(short, long, default_value_t = 5)]
        rating: u8,
        comment: String,
    },
    /// Edit one of your reviews
    EditReview {
        foot_id: i64,
        review_id: i64,
        #[arg(short, long)]
        rating: Option<u8>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Delete a review (admin)
    DeleteReview { foot_id: i64, review_id: i64 },
    /// Like or dislike a foot
    Swipe {
        foot_id: i64,
        #[arg(long)]
        dislike: bool,
    },
    /// List your swipes
    Swipes,
    /// Admin panel
    #[command(subcommand)]
    Admin(AdminCommand),
    /// Play the like/dislike minigame
    Game {
        #[arg(long)]
        folder: Option<String>,
        #[arg(long)]
        shuffle: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// List users, one page at a time
    Users {
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        search: Option<String>,
    },
    /// Change a user's email or role
    Edit {
        id: i64,
        #[arg(long)]
        email: Option<String>,
        /// ROLE_USER or ROLE_ADMIN
        #[arg(long)]
        role: Option<Role>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        search: Option<String>,
    },
    /// Delete a user
    Delete {
        id: i64,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        search: Option<String>,
    },
    /// Delete a review from the latest reviews panel
    DeleteReview { id: i64 },
}

/// Everything a command needs: the API client (with its session and
/// navigator), the loaded config and the prompt policy.
struct Shell {
    client: ApiClient,
    config: Config,
    assume_yes: bool,
}

impl Shell {
    fn navigator(&self) -> &Navigator {
        self.client.navigator()
    }

    /// Ask before a destructive action. Accepts `s` or `y`.
    async fn confirm(&self, question: &str) -> anyhow::Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        println!("{} [s/N]", question);
        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
        Ok(matches!(line.trim().to_lowercase().as_str(), "s" | "y" | "si" | "sí" | "yes"))
    }

    /// Tell the user when a 401 sent them back to the login page.
    fn report_redirect(&self) {
        if self.navigator().current() == SESSION_EXPIRED_PATH {
            eprintln!("Tu sesión ha expirado. Vuelve a iniciar sesión con `solemate login`.");
        }
    }
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let data_dir = Config::data_dir(&cli);
    let session = SessionStore::open(&data_dir, &config.session)
        .with_context(|| format!("opening session in {}", data_dir.display()))?;
    let navigator = Navigator::at(initial_route(&cli.command));
    let client = ApiClient::new(
        &config.api.base_url,
        config.library_url(),
        session,
        navigator,
    );
    let ctx = Shell {
        client,
        config,
        assume_yes: cli.yes,
    };

    let result = dispatch(&ctx, cli.command).await;
    ctx.report_redirect();
    tracing::debug!("Navigation: {:?}", ctx.navigator().visited());
    result
}

fn initial_route(command: &Command) -> Route {
    match command {
        Command::Login { .. } | Command::Logout | Command::Serve => Route::Login,
        Command::Register { .. } => Route::Register,
        Command::Foot { id }
        | Command::EditReview { foot_id: id, .. }
        | Command::DeleteReview { foot_id: id, .. }
        | Command::Review { foot_id: id, .. } => Route::FootDetail(*id),
        Command::Game { .. } => Route::Minigame,
        Command::Admin(_) => Route::AdminUsers,
        _ => Route::Feet,
    }
}

async fn dispatch(ctx: &Shell, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Serve => serve(ctx.config.clone()).await?,
        Command::Login { username, password } => {
            let mut page = LoginPage::new(ctx.client.clone());
            page.username = username;
            page.password = password;
            if page.submit().await {
                println!("Sesión iniciada como {}", page.username.trim());
            } else if let Some(err) = &page.error {
                eprintln!("{}", err);
            }
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let mut page = RegisterPage::new(ctx.client.clone());
            page.username = username;
            page.email = email;
            page.password = password;
            page.submit().await;
            if let Some(ok) = &page.ok {
                println!("{}", ok);
            }
            if let Some(err) = &page.error {
                eprintln!("{}", err);
            }
        }
        Command::Logout => {
            login::logout(&ctx.client)?;
            println!("Sesión cerrada");
        }
        Command::Feet { watch } => feet(ctx, watch).await?,
        Command::CreateFoot {
            title,
            image_url,
            image,
            arch,
        } => create_foot(ctx, title, image_url, image, arch).await?,
        Command::DeleteFoot { id } => delete_foot(ctx, id).await?,
        Command::Foot { id } => {
            let mut page = FootDetailPage::new(ctx.client.clone(), id);
            page.load().await;
            print!("{}", render::foot_detail(&page)?);
        }
        Command::Review {
            foot_id,
            rating,
            comment,
        } => {
            let mut page = FootDetailPage::new(ctx.client.clone(), foot_id);
            page.load().await;
            page.form.rating = rating;
            page.form.comment = comment;
            page.create_review().await;
            print!("{}", render::foot_detail(&page)?);
        }
        Command::EditReview {
            foot_id,
            review_id,
            rating,
            comment,
        } => {
            let mut page = FootDetailPage::new(ctx.client.clone(), foot_id);
            page.load().await;
            if page.open_edit(review_id) {
                if let Some(edit) = page.editing.as_mut() {
                    edit.form.rating = rating.unwrap_or(edit.form.rating);
                    edit.form.comment = comment.unwrap_or_else(|| edit.form.comment.clone());
                }
                page.save_edit().await;
            } else if page.status.is_ready() {
                eprintln!("Solo puedes editar tus propias reviews");
            }
            print!("{}", render::foot_detail(&page)?);
        }
        Command::DeleteReview { foot_id, review_id } => {
            let mut page = FootDetailPage::new(ctx.client.clone(), foot_id);
            page.load().await;
            if page.request_delete(review_id) {
                if ctx.confirm(&format!("¿Eliminar la review #{}?", review_id)).await? {
                    page.confirm_delete().await;
                } else {
                    page.cancel_delete();
                }
            } else if page.status.is_ready() {
                eprintln!("Solo un admin puede eliminar reviews existentes");
            }
            print!("{}", render::foot_detail(&page)?);
        }
        Command::Swipe { foot_id, dislike } => {
            let action = if dislike {
                SwipeAction::Dislike
            } else {
                SwipeAction::Like
            };
            match ctx.client.save_swipe(foot_id, action).await {
                Ok(swipe) => println!("{:?} en foot #{}", swipe.action, swipe.foot_id),
                Err(err) => eprintln!("{}", err.user_message()),
            }
        }
        Command::Swipes => match ctx.client.my_swipes().await {
            Ok(swipes) => {
                for swipe in swipes {
                    println!("#{} {:?} {}", swipe.foot_id, swipe.action, swipe.created_at);
                }
            }
            Err(err) => eprintln!("{}", err.user_message()),
        },
        Command::Admin(admin) => admin_command(ctx, admin).await?,
        Command::Game { folder, shuffle } => game(ctx, folder, shuffle).await?,
    }
    Ok(())
}

async fn feet(ctx: &Shell, watch: bool) -> anyhow::Result<()> {
    let mut page = FeetPage::new(ctx.client.clone(), ctx.config.feed.latest_reviews);
    page.load().await;
    print!("{}", render::feet_page(&page)?);
    if !watch || !page.status.is_ready() {
        return Ok(());
    }

    let every = Duration::from_secs(ctx.config.feed.poll_seconds.max(1));
    page.watch(every, |page| {
        match render::latest_reviews(&page.latest_reviews, page.loading_reviews) {
            Ok(panel) => print!("\n{}", panel),
            Err(e) => tracing::error!("Template render error: {}", e),
        }
    })
    .await;
    Ok(())
}

async fn create_foot(
    ctx: &Shell,
    title: String,
    image_url: Option<String>,
    image: Option<PathBuf>,
    arch: Option<ArchType>,
) -> anyhow::Result<()> {
    let mut page = FeetPage::new(ctx.client.clone(), ctx.config.feed.latest_reviews);
    page.load().await;
    if !page.status.is_ready() {
        print!("{}", render::feet_page(&page)?);
        return Ok(());
    }

    page.form.title = title;
    if let Some(arch) = arch {
        page.form.arch_type = arch;
    }
    if let Some(url) = image_url {
        page.form.image_url = url;
    }
    if let Some(path) = image {
        if !page.attach_image(&path).await {
            print!("{}", render::feet_page(&page)?);
            return Ok(());
        }
    }

    if page.create_foot().await {
        println!("Foot publicado");
    }
    print!("{}", render::feet_page(&page)?);
    Ok(())
}

async fn delete_foot(ctx: &Shell, id: i64) -> anyhow::Result<()> {
    let mut page = FeetPage::new(ctx.client.clone(), ctx.config.feed.latest_reviews);
    page.load().await;
    if page.request_delete(id) {
        if ctx.confirm(&format!("¿Eliminar el foot #{}?", id)).await? {
            page.confirm_delete().await;
        } else {
            page.cancel_delete();
        }
    } else if page.status.is_ready() {
        eprintln!("No puedes eliminar el foot #{}", id);
    }
    print!("{}", render::feet_page(&page)?);
    Ok(())
}

async fn admin_page(ctx: &Shell, page_number: u32, search: Option<String>) -> AdminUsersPage {
    let mut page = AdminUsersPage::new(
        ctx.client.clone(),
        ctx.config.admin.page_size,
        ctx.config.feed.admin_latest_reviews,
    );
    if let Some(search) = search {
        page.search_input = search.clone();
        page.search = search.trim().to_string();
    }
    page.page = page_number.saturating_sub(1);
    page.init().await;
    page
}

async fn admin_command(ctx: &Shell, command: AdminCommand) -> anyhow::Result<()> {
    let page = match command {
        AdminCommand::Users { page, search } => admin_page(ctx, page, search).await,
        AdminCommand::Edit {
            id,
            email,
            role,
            page,
            search,
        } => {
            let mut page = admin_page(ctx, page, search).await;
            if page.open_edit(id) {
                if let Some(edit) = page.editing.as_mut() {
                    if let Some(email) = email {
                        edit.email = email;
                    }
                    if let Some(role) = role {
                        edit.role = role;
                    }
                }
                page.save_edit().await;
            }
            page
        }
        AdminCommand::Delete { id, page, search } => {
            let mut page = admin_page(ctx, page, search).await;
            if page.request_delete_user(id) {
                if ctx.confirm(&format!("¿Eliminar el usuario #{}?", id)).await? {
                    page.confirm_delete_user().await;
                } else {
                    page.cancel_delete_user();
                }
            }
            page
        }
        AdminCommand::DeleteReview { id } => {
            let mut page = admin_page(ctx, 1, None).await;
            if page.request_delete_review(id) {
                if ctx.confirm(&format!("¿Eliminar la review #{}?", id)).await? {
                    page.confirm_delete_review().await;
                } else {
                    page.cancel_delete_review();
                }
            }
            page
        }
    };

    if ctx.navigator().current_route() == Some(Route::Feet) {
        eprintln!("El panel de administración es solo para admins");
        return Ok(());
    }
    print!("{}", render::admin_users(&page)?);
    Ok(())
}

/// Interactive loop: `l` like, `d` dislike, `r` restart, `q` quit.
async fn game(ctx: &Shell, folder: Option<String>, shuffle: bool) -> anyhow::Result<()> {
    let mut page = MinigamePage::new(ctx.client.clone(), shuffle);
    page.load(folder.as_deref()).await;
    print!("{}", render::minigame(&page)?);
    if !page.status.is_ready() || page.total() == 0 {
        return Ok(());
    }

    println!("l = like, d = dislike, r = reiniciar, q = salir");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "l" => {
                page.swipe(SwipeAction::Like);
            }
            "d" => {
                page.swipe(SwipeAction::Dislike);
            }
            "r" => page.restart(),
            "q" => break,
            _ => continue,
        }
        print!("{}", render::minigame(&page)?);
    }
    Ok(())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(&config);
    tracing::info!("Serving image library from {}", state.public_dir.display());

    let app = Router::new()
        .merge(library::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
