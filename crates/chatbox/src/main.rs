//! A terminal chat client built on the `chatbox` library.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::mem;
use std::path::PathBuf;
use std::time::Duration;

use chatbox::core::SessionBuilder;
use chatbox::core::attachment::Attachment;
use chatbox::core::conversation::RestoreOutcome;
use chatbox::core::message::{Entry, TYPING_PLACEHOLDER};
use chatbox::core::store::FileStore;
use chatbox::{
    CallbackView, InputCommand, Line, ViewEvent, load_attachment, read_line,
};
use chatbox_openai_model::{OpenAIConfigBuilder, OpenAIProvider};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io;
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum SessionEvent {
    Idle,
    View(ViewEvent),
}

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Ok(api_key) = env::var("OPENAI_API_KEY") else {
        eprintln!("OPENAI_API_KEY environment variable is not set");
        return;
    };
    let mut config = OpenAIConfigBuilder::with_api_key(api_key);
    if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
        config = config.with_base_url(base_url);
    }
    if let Ok(model) = env::var("OPENAI_MODEL") {
        config = config.with_model(model);
    }
    let model_provider = OpenAIProvider::new(config.build());

    let Some(data_dir) = data_dir() else {
        eprintln!("cannot locate a data directory, set CHATBOX_DATA_DIR");
        return;
    };
    debug!("keeping history in {}", data_dir.display());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let session = SessionBuilder::with_model_provider(model_provider)
        .with_store(FileStore::new(data_dir))
        .with_view(CallbackView::new({
            let event_tx = event_tx.clone();
            move |event: ViewEvent| {
                event_tx.send(SessionEvent::View(event)).ok();
            }
        }))
        .on_idle(move || {
            event_tx.send(SessionEvent::Idle).ok();
        })
        .build();

    if matches!(
        session.restore_outcome(),
        RestoreOutcome::Malformed(_) | RestoreOutcome::Unavailable(_)
    ) {
        println!(
            "{}",
            "⚠️ The previous conversation could not be restored."
                .bright_yellow()
        );
    }
    // The restored history has been rendered while the session was built.
    print_pending_events(&mut event_rx);

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let mut staged: Vec<Attachment> = Vec::new();
    let mut stdin = io::BufReader::new(io::stdin());

    loop {
        if staged.is_empty() {
            print!("> ");
        } else {
            print!("{} > ", format!("[{} attached]", staged.len()).dimmed());
        }
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut stdin).await else {
            break;
        };

        match InputCommand::parse(&line) {
            InputCommand::Attach(path) => match load_attachment(&path).await {
                Ok(attachment) => {
                    println!("{}", attachment.summary().dimmed());
                    staged.push(attachment);
                }
                Err(err) => {
                    println!("{}", err.bright_red());
                }
            },
            InputCommand::Detach => {
                staged.clear();
                println!("{}", "No files attached.".dimmed());
            }
            InputCommand::Clear => {
                if session.clear_history().is_err() {
                    break;
                }
                // Wait for the session to apply it before printing.
                if session.snapshot().await.is_err() {
                    break;
                }
                print_pending_events(&mut event_rx);
            }
            InputCommand::Quit => break,
            InputCommand::Say(text) => {
                if text.is_empty() && staged.is_empty() {
                    continue;
                }
                if session
                    .submit_user_turn(text, mem::take(&mut staged))
                    .is_err()
                {
                    break;
                }
                if !wait_for_reply(&mut event_rx, &progress_style).await {
                    break;
                }
            }
        }
    }
}

/// Prints transcript changes with a spinner while the reply is pending.
/// Returns `false` if the session has gone away.
async fn wait_for_reply(
    event_rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    progress_style: &ProgressStyle,
) -> bool {
    let mut progress_bar: Option<ProgressBar> = None;

    loop {
        if let Some(progress_bar) = &progress_bar {
            progress_bar.inc(1);
        }

        let sleep = sleep(Duration::from_millis(100));
        let event = select! {
            event = event_rx.recv() => {
                let Some(event) = event else {
                    return false;
                };
                event
            },
            _ = sleep => {
                continue;
            }
        };

        // Finish the progress bar before printing anything else.
        if let Some(progress_bar) = progress_bar.take() {
            progress_bar.finish_and_clear();
        }

        match event {
            SessionEvent::Idle => return true,
            SessionEvent::View(ViewEvent::Appended(Entry::Pending(_))) => {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(progress_style.clone());
                spinner.set_message(TYPING_PLACEHOLDER);
                progress_bar = Some(spinner);
            }
            SessionEvent::View(event) => print_view_event(&event),
        }
    }
}

fn print_pending_events(event_rx: &mut mpsc::UnboundedReceiver<SessionEvent>) {
    while let Ok(event) = event_rx.try_recv() {
        if let SessionEvent::View(event) = event {
            print_view_event(&event);
        }
    }
}

fn print_view_event(event: &ViewEvent) {
    match event {
        ViewEvent::Appended(entry) => {
            if let Some(line) = Line::of(entry) {
                print_line(&line);
            }
        }
        ViewEvent::Resolved {
            message, failure, ..
        } => {
            let line = Line::of_message(message);
            match failure {
                Some(kind) => {
                    debug!("reply failed: {kind}");
                    println!(
                        "{}🤖 {}",
                        BAR_CHAR.bright_red(),
                        line.text().bright_red()
                    );
                }
                None => print_line(&line),
            }
        }
        ViewEvent::Cleared => {
            println!("{}", "🧹 History cleared.".dimmed());
        }
    }
}

fn print_line(line: &Line) {
    match line {
        Line::User(text) => {
            println!("{}🧑 {}", BAR_CHAR.bright_green(), text);
        }
        Line::Bot(text) => {
            println!("{}🤖 {}", BAR_CHAR.bright_cyan(), text.bright_white());
        }
        Line::Preview(text) => {
            println!("{}{}", BAR_CHAR.bright_black(), text.dimmed());
        }
    }
}

fn data_dir() -> Option<PathBuf> {
    env::var_os("CHATBOX_DATA_DIR")
        .map(PathBuf::from)
        .or_else(|| dirs::data_dir().map(|dir| dir.join("chatbox")))
}
