use std::io::{self, BufRead, Write};

use anyhow::Context;
use chrono::Utc;
use shelf_api::{AuthToken, BookId, CommentId, ServerId, UserId, Uuid, Viewer};
use shelf_client::{time, CreateOutcome, DeleteOutcome, LikeOutcome, MutationController};

mod http;
use http::HttpCommentService;

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(short, long)]
    host: String,

    /// Book whose comments to act on
    #[structopt(short, long)]
    book: i64,

    /// Member id the token belongs to
    #[structopt(short, long)]
    member: String,

    #[structopt(long)]
    nick: Option<String>,

    /// Comments the member already liked
    #[structopt(long)]
    liked: Vec<String>,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// List the comments of the book, newest first
    List,

    /// Write a comment
    Write { text: String },

    /// Like a comment, or take the like back
    Like { comment: String },

    /// Delete one of your comments
    Delete {
        comment: String,

        /// Do not ask for confirmation
        #[structopt(short, long)]
        yes: bool,
    },
}

fn auth_token() -> anyhow::Result<AuthToken> {
    let tok = std::env::var("SHELF_TOKEN").context("retrieving SHELF_TOKEN environment variable")?;
    let tok = Uuid::try_parse(&tok).context("parsing SHELF_TOKEN as an auth token")?;
    Ok(AuthToken(tok))
}

fn comment_id(s: &str) -> anyhow::Result<CommentId> {
    CommentId::parse(s).with_context(|| format!("parsing {s:?} as a comment id"))
}

fn ask(question: &str) -> bool {
    print!("{question} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
        Err(_) => false,
    }
}

fn list(controller: &MutationController<HttpCommentService>) {
    let snapshot = controller.snapshot();
    if snapshot.is_empty() {
        println!("no comments yet");
        return;
    }
    let now = Utc::now();
    for c in snapshot.comments() {
        let liked = match c.server_id() {
            Some(id) if snapshot.is_liked(id) => " (liked)",
            _ => "",
        };
        println!(
            "[{}] {} - {} - {} likes{}",
            c.id,
            c.author_name,
            time::relative_age(c.created_at, now),
            c.like_count,
            liked,
        );
        println!("    {}", c.text);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let opt = <Opt as structopt::StructOpt>::from_args();

    let book = BookId(opt.book);
    let service = HttpCommentService::new(opt.host, auth_token()?);
    let detail = service.fetch_book(book).await?;
    tracing::debug!(%book, title = %detail.title, "fetched book");

    let liked = opt
        .liked
        .iter()
        .map(|s| ServerId::from_text(s).with_context(|| format!("parsing {s:?} as a comment id")))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let controller = MutationController::new(book, service);
    controller.load(detail.review_response_dtos, liked);

    let mut viewer = Viewer::new(UserId(opt.member));
    viewer.nick_name = opt.nick;

    match opt.cmd {
        Command::List => list(&controller),
        Command::Write { text } => match controller.create(Some(&viewer), &text).await? {
            CreateOutcome::Inserted(id) => println!("wrote comment {id}"),
            CreateOutcome::Unresolved { .. } => {
                println!("comment written, but the server did not say its id; run `list` to see it")
            }
        },
        Command::Like { comment } => {
            let id = comment_id(&comment)?;
            match controller.toggle_like(Some(&viewer), &id).await? {
                LikeOutcome::Liked => println!("liked comment {id}"),
                LikeOutcome::Unliked => println!("took back like on comment {id}"),
            }
        }
        Command::Delete { comment, yes } => {
            let id = comment_id(&comment)?;
            let outcome = controller
                .delete(Some(&viewer), &id, |c| {
                    yes || ask(&format!("Delete comment {:?}?", c.text))
                })
                .await?;
            match outcome {
                DeleteOutcome::Deleted => println!("deleted comment {id}"),
                DeleteOutcome::AlreadyGone => println!("comment {id} is not listed anymore"),
                DeleteOutcome::Cancelled => println!("kept comment {id}"),
            }
        }
    }

    Ok(())
}
