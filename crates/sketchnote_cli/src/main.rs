//! SketchNote command-line host.
//!
//! # Responsibility
//! - Verify `sketchnote_core` linkage (`ping`).
//! - Inspect a note database and exercise the save pipeline end to end.

use clap::{Parser, Subcommand};
use log::{error, info};
use sketchnote_core::{
    init_logging, CoreConfig, LoadOutcome, NoteEditor, NoteList, NoteRepository, RichText,
    SaveOutcome, SqliteNoteRepository,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEMO_CANVAS_WIDTH: u32 = 240;
const DEMO_CANVAS_HEIGHT: u32 = 160;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(name = "sketchnote")]
#[command(version, about = "Sketch + rich-text note store")]
#[command(propagate_version = true)]
struct Cli {
    /// JSON config document (density, brush and color defaults, log level)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print core health check and version
    Ping,

    /// Print stored note summaries as JSON lines
    List {
        /// Note database file
        #[arg(long, value_name = "PATH")]
        db: PathBuf,
    },

    /// Draw a demo stroke and save it as a note
    Sketch {
        /// Note database file
        #[arg(long, value_name = "PATH")]
        db: PathBuf,

        /// Note title
        #[arg(long)]
        title: String,

        /// Plain body text
        #[arg(long, default_value = "")]
        text: String,

        /// Update this existing note instead of creating one
        #[arg(long)]
        id: Option<i64>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| {
        if let Some(log_dir) = &cli.log_dir {
            init_logging(&config.log_level, &log_dir.to_string_lossy())?;
        }
        info!("event=cli_start module=cli status=ok command={}", cli.command.name());
        match cli.command {
            Commands::Ping => handle_ping(),
            Commands::List { db } => handle_list(&db),
            Commands::Sketch { db, title, text, id } => handle_sketch(config, &db, title, text, id),
        }
    });

    if let Err(err) = result {
        error!("event=cli_exit module=cli status=error error={err}");
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::List { .. } => "list",
            Self::Sketch { .. } => "sketch",
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<CoreConfig, Box<dyn Error>> {
    match path {
        Some(path) => Ok(CoreConfig::from_json_str(&std::fs::read_to_string(path)?)?),
        None => Ok(CoreConfig::default()),
    }
}

fn handle_ping() -> CliResult {
    println!("sketchnote_core ping={}", sketchnote_core::ping());
    println!("sketchnote_core version={}", sketchnote_core::core_version());
    Ok(())
}

fn handle_list(db: &Path) -> CliResult {
    let repo = SqliteNoteRepository::open(db)?;
    let notes = repo.list_all_notes()?;
    for note in &notes {
        println!("{}", serde_json::to_string(&note.summary())?);
    }
    info!(
        "event=note_list module=cli status=ok db={} notes={}",
        db.display(),
        notes.len()
    );
    Ok(())
}

fn handle_sketch(
    config: CoreConfig,
    db: &Path,
    title: String,
    text: String,
    id: Option<i64>,
) -> CliResult {
    let repo = Arc::new(SqliteNoteRepository::open(db)?);
    let list = NoteList::new(repo.list_all_notes()?);
    let mut editor = NoteEditor::new(config);
    editor
        .canvas_mut()
        .resize(DEMO_CANVAS_WIDTH, DEMO_CANVAS_HEIGHT);

    if let Some(id) = id {
        if let LoadOutcome::FellBackToEmpty(err) = editor.load(repo.as_ref(), id) {
            error!("event=note_sketch module=cli status=error note_id={id} error={err}");
            return Err(err.into());
        }
    }

    editor.set_title(title);
    editor.set_body(RichText::plain(text));
    draw_demo_stroke(&mut editor);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .build()?;
    let handle = editor.save(runtime.handle(), Arc::clone(&repo));
    let task_id = handle.task_id();
    info!("event=note_sketch module=cli status=start task_id={task_id}");
    match runtime.block_on(handle.complete(&list)) {
        SaveOutcome::Saved { notice, note_id } => {
            info!(
                "event=note_sketch module=cli status=ok task_id={task_id} note_id={note_id} notes={}",
                list.len()
            );
            println!("{} id={note_id} notes={}", notice.message(), list.len());
            Ok(())
        }
        SaveOutcome::Failed(err) => {
            error!("event=note_sketch module=cli status=error task_id={task_id} error={err}");
            Err(err.into())
        }
    }
}

fn draw_demo_stroke(editor: &mut NoteEditor) {
    let canvas = editor.canvas_mut();
    let (width, height) = (DEMO_CANVAS_WIDTH as f32, DEMO_CANVAS_HEIGHT as f32);
    canvas.on_pointer_down(width * 0.1, height * 0.8);
    for step in 1..=8 {
        let t = step as f32 / 8.0;
        canvas.on_pointer_move(width * (0.1 + 0.8 * t), height * (0.8 - 0.6 * t));
    }
    canvas.on_pointer_up(width * 0.9, height * 0.2);
}
