//! Line-oriented front end. Each stdin line is one command; notices and
//! result changes are echoed to the output writer.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use clap::builder::RangedU64ValueParser;
use clap::{ColorChoice, Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::app::{App, AppState, JobRunner, UiEvent};
use crate::backend::Services;
use crate::error::AppResult;
use crate::search::{ImageSource, ResultGrid};
use crate::selection::AlignmentKind;

const IDLE_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Parser)]
#[command(
    name = "postcomposer",
    no_binary_name = true,
    disable_version_flag = true,
    subcommand_required = true,
    color = ColorChoice::Never,
    after_help = "alignments: none, left, center, right, below_text"
)]
struct CommandLine {
    #[command(subcommand)]
    command: Command,
}

/// Positions are 1-based, as printed next to results and selected images.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Search images (debounced, translated when enabled); no words clears
    #[command(visible_alias = "k")]
    Keywords {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// Switch image provider (pexels or unsplash)
    Source { source: ImageSource },
    /// Minimum result width; omit to clear
    MinWidth { px: Option<u32> },
    /// Minimum result height; omit to clear
    MinHeight { px: Option<u32> },
    /// Toggle result N in the selection
    Select {
        #[arg(value_parser = position())]
        position: usize,
    },
    /// Drop selected image N
    Remove {
        #[arg(value_parser = position())]
        position: usize,
    },
    /// Alignment of selected image N
    Align {
        #[arg(value_parser = position())]
        position: usize,
        alignment: AlignmentKind,
    },
    /// Default featured image alignment
    FeaturedAlign { alignment: AlignmentKind },
    /// Default content image alignment
    ContentAlign { alignment: AlignmentKind },
    /// Alternate content image sides
    Alternate { mode: Switch },
    /// Post title
    Title {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// Post body; `\n` starts a new line
    Content {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// Comma-separated tags
    Tags {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// Template used for the post
    Template { name: String },
    /// Scheduled publish date (YYYY-MM-DDTHH:MM); omit to clear
    Date { date: Option<String> },
    /// Store a template; `\n` starts a new line
    SaveTemplate {
        name: String,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        content: Vec<String>,
    },
    /// Keyword translation
    Translate { mode: Switch },
    /// Resize result N on the server
    Resize {
        #[arg(value_parser = position())]
        position: usize,
        width: u32,
        height: u32,
        /// Ignore the original aspect ratio
        #[arg(long)]
        free: bool,
    },
    /// Publish the post
    Submit,
    /// Print the current form, results and selection
    Show,
    #[command(visible_aliases = ["exit", "q"])]
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    const fn enabled(self) -> bool {
        matches!(self, Self::On)
    }
}

fn position() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::new().range(1..)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no image at position {0}")]
pub struct NoSuchImage(pub usize);

/// `Ok(None)` for a blank line. `help` comes back as an error of kind
/// `DisplayHelp` and renders like any other.
pub fn parse_command(line: &str) -> Result<Option<Command>, clap::Error> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }
    CommandLine::try_parse_from(words).map(|parsed| Some(parsed.command))
}

fn text(words: &[String]) -> String {
    words.join(" ")
}

fn multiline(words: &[String]) -> String {
    text(words).replace("\\n", "\n")
}

/// Turns a command into events against the current state.
pub fn resolve(command: Command, state: &AppState) -> Result<Vec<UiEvent>, NoSuchImage> {
    let result_url = |position: usize| {
        state
            .results()
            .results()
            .get(position - 1)
            .map(|result| result.url.clone())
            .ok_or(NoSuchImage(position))
    };
    let selected_url = |position: usize| {
        state
            .selection()
            .get(position - 1)
            .map(|image| image.url.clone())
            .ok_or(NoSuchImage(position))
    };

    let event = match command {
        Command::Keywords { words } => UiEvent::KeywordsChanged(text(&words)),
        Command::Source { source } => UiEvent::SourceChanged(source),
        Command::MinWidth { px } => UiEvent::MinWidthChanged(px),
        Command::MinHeight { px } => UiEvent::MinHeightChanged(px),
        Command::Select { position } => UiEvent::ToggleImage(result_url(position)?),
        Command::Remove { position } => UiEvent::RemoveImage(selected_url(position)?),
        Command::Align {
            position,
            alignment,
        } => UiEvent::SetImageAlignment {
            url: selected_url(position)?,
            alignment,
        },
        Command::FeaturedAlign { alignment } => UiEvent::FeaturedAlignmentChanged(alignment),
        Command::ContentAlign { alignment } => UiEvent::ContentAlignmentChanged(alignment),
        Command::Alternate { mode } => UiEvent::AlternatingChanged(mode.enabled()),
        Command::Title { words } => UiEvent::TitleChanged(text(&words)),
        Command::Content { words } => UiEvent::ContentChanged(multiline(&words)),
        Command::Tags { words } => UiEvent::TagsChanged(text(&words)),
        Command::Template { name } => UiEvent::TemplateChosen(name),
        Command::Date { date } => UiEvent::PublishDateChanged(date),
        Command::SaveTemplate { name, content } => UiEvent::SaveTemplate {
            name,
            content: multiline(&content),
        },
        Command::Translate { mode } => UiEvent::TranslationToggleRequested(mode.enabled()),
        Command::Resize {
            position,
            width,
            height,
            free,
        } => {
            return Ok(vec![
                UiEvent::OpenResize(result_url(position)?),
                UiEvent::ResizeSizeChanged { width, height },
                UiEvent::ResizeAspectChanged(!free),
                UiEvent::ConfirmResize,
            ]);
        }
        Command::Submit => UiEvent::Submit,
        Command::Show | Command::Quit => return Ok(Vec::new()),
    };
    Ok(vec![event])
}

/// Forwards stdin lines to the returned channel until EOF.
pub fn spawn_stdin_reader() -> io::Result<Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("postcomposer-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(%err, "failed to read stdin");
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

/// Drives `app` from `lines` until `quit`, or until input ends and all
/// pending work has settled.
pub fn run_session<S, R, W>(
    app: &mut App<S, R>,
    lines: Receiver<String>,
    out: &mut W,
) -> AppResult<()>
where
    S: Services,
    R: JobRunner,
    W: Write,
{
    let mut input_open = true;
    let mut rendered_revision = app.state().revision();
    let mut rendered_grid = app.state().results().clone();
    let mut rendered_status = app.state().translation_status().label();

    loop {
        let now = Instant::now();
        app.tick(now);
        flush_updates(
            app,
            out,
            &mut rendered_revision,
            &mut rendered_grid,
            &mut rendered_status,
        )?;

        let wait = app
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
            .map_or(IDLE_POLL, |until| until.min(IDLE_POLL));

        if !input_open {
            if app.is_idle() {
                break;
            }
            thread::sleep(wait);
            continue;
        }

        let line = match lines.recv_timeout(wait) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                tracing::debug!("input closed; waiting for pending work");
                input_open = false;
                continue;
            }
        };

        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(Command::Show)) => render_state(out, app.state())?,
            Ok(Some(command)) => match resolve(command, app.state()) {
                Ok(events) => {
                    for event in events {
                        app.handle(event, Instant::now());
                    }
                }
                Err(err) => writeln!(out, "error: {err}")?,
            },
            Err(err) => writeln!(out, "{}", err.render().to_string().trim_end())?,
        }
    }

    out.flush()?;
    Ok(())
}

fn flush_updates<S, R, W>(
    app: &mut App<S, R>,
    out: &mut W,
    rendered_revision: &mut u64,
    rendered_grid: &mut ResultGrid,
    rendered_status: &mut String,
) -> io::Result<()>
where
    S: Services,
    R: JobRunner,
    W: Write,
{
    for notice in app.take_notices() {
        writeln!(out, "{notice}")?;
    }
    let state = app.state();
    if state.revision() == *rendered_revision {
        return Ok(());
    }
    *rendered_revision = state.revision();

    let status = state.translation_status().label();
    if status != *rendered_status {
        if !status.is_empty() {
            writeln!(out, "keywords: {status}")?;
        }
        *rendered_status = status;
    }
    if *state.results() != *rendered_grid {
        render_results(out, state)?;
        *rendered_grid = state.results().clone();
    }
    Ok(())
}

fn render_results(out: &mut impl Write, state: &AppState) -> io::Result<()> {
    match state.results() {
        ResultGrid::Idle => Ok(()),
        ResultGrid::Loading => writeln!(out, "searching..."),
        ResultGrid::Empty => writeln!(out, "no images found"),
        ResultGrid::Failed(message) => writeln!(out, "search failed: {message}"),
        ResultGrid::Results(results) => {
            for (position, result) in results.iter().enumerate() {
                let marker = if state.selection().contains(&result.url) {
                    '*'
                } else {
                    ' '
                };
                let size = result
                    .size
                    .map(|(w, h)| format!("{w}x{h}"))
                    .unwrap_or_else(|| "?".to_string());
                writeln!(
                    out,
                    "{marker}{:>2}. {size:>9} {}",
                    position + 1,
                    result.display_url()
                )?;
            }
            Ok(())
        }
    }
}

fn render_state(out: &mut impl Write, state: &AppState) -> io::Result<()> {
    let form = state.form();
    writeln!(
        out,
        "source: {}  translation: {}",
        form.source,
        if state.translation_enabled() { "on" } else { "off" }
    )?;
    let status = state.translation_status().label();
    if !status.is_empty() {
        writeln!(out, "keywords: {status}")?;
    }
    render_results(out, state)?;

    writeln!(out, "selected:")?;
    for (position, (role, image)) in state.selection().ordered_view().enumerate() {
        writeln!(
            out,
            "  {}. [{}] {} ({})",
            position + 1,
            role.as_str(),
            image.url,
            image.alignment
        )?;
    }
    let layout = form.layout;
    writeln!(
        out,
        "layout: featured={} content={} alternating={}",
        layout.featured_alignment(),
        layout.content_alignment(),
        layout.alternating()
    )?;

    let preview = state.preview();
    writeln!(out, "title: {}", preview.title)?;
    writeln!(out, "paragraphs: {}", preview.paragraphs.len())?;
    writeln!(out, "tags: {}", preview.tags.join(", "))?;
    if state.submitting() {
        writeln!(out, "submitting...")?;
    }
    Ok(())
}
