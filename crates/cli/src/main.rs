mod photo;

use album::{
    random_default_wish, AlbumInfo, AlbumStore, Memory, MemoryDraft, MemoryUpdate, SqliteStore,
};
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use generation::{prompts, Generators, ImageGenerator, ImageOutcome, VideoState, WishOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "rakhi")]
#[command(about = "Raksha Bandhan memory album - photos, wishes, and AI magic")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Album database (defaults to the local data directory)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the album with its first memory
    New {
        /// Your name
        #[arg(long)]
        creator: String,

        /// Your brother's or sister's name
        #[arg(long)]
        sibling: String,

        /// Your gender (female, male, other)
        #[arg(long)]
        gender: String,

        /// Photo file, URL or data URI
        #[arg(long)]
        photo: String,

        /// What the photo shows
        #[arg(long)]
        description: String,

        /// Year of the photo
        #[arg(long, default_value = album::FALLBACK_YEAR)]
        year: String,
    },

    /// Add a memory
    Add {
        /// Photo file, URL or data URI
        photo: String,

        #[arg(short, long)]
        description: String,

        #[arg(short, long, default_value = album::FALLBACK_YEAR)]
        year: String,

        /// Caption to use as-is
        #[arg(long, conflicts_with = "generate_wish")]
        wish: Option<String>,

        /// Ask the AI for a caption (a preset wish is used if that fails)
        #[arg(long)]
        generate_wish: bool,
    },

    /// List memories in the order they were added
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show memories grouped by year
    Timeline,

    /// Edit a memory
    Edit {
        id: String,

        #[arg(long)]
        photo: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        year: Option<String>,

        #[arg(long)]
        wish: Option<String>,
    },

    /// Remove a memory
    Remove { id: String },

    /// Generate a wish for a memory
    Wish {
        id: String,

        /// Store the generated wish on the memory
        #[arg(long)]
        save: bool,
    },

    /// Re-imagine a memory as a stylised image
    Image {
        id: String,

        /// Preset number (1-5); random if omitted
        #[arg(long)]
        preset: Option<usize>,

        /// Do not send the photo as a likeness reference
        #[arg(long)]
        no_reference: bool,

        /// Output file (defaults to <id>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Animate a memory photo into a short video
    Video {
        id: String,

        /// Animation preset number (1-5); random if omitted
        #[arg(long)]
        preset: Option<usize>,

        /// Output file (defaults to <id>.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

type Album = AlbumStore<SqliteStore>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    let mut album = open_album(cli.data)?;

    match cli.command {
        Commands::New {
            creator,
            sibling,
            gender,
            photo,
            description,
            year,
        } => new_command(&mut album, creator, sibling, gender, photo, description, year),
        Commands::Add {
            photo,
            description,
            year,
            wish,
            generate_wish,
        } => add_command(&mut album, photo, description, year, wish, generate_wish).await,
        Commands::List { json } => list_command(&album, json),
        Commands::Timeline => timeline_command(&album),
        Commands::Edit {
            id,
            photo,
            description,
            year,
            wish,
        } => edit_command(&mut album, id, photo, description, year, wish),
        Commands::Remove { id } => remove_command(&mut album, id),
        Commands::Wish { id, save } => wish_command(&mut album, id, save).await,
        Commands::Image {
            id,
            preset,
            no_reference,
            output,
        } => image_command(&album, id, preset, no_reference, output).await,
        Commands::Video { id, preset, output } => video_command(&album, id, preset, output).await,
    }
}

fn open_album(data: Option<PathBuf>) -> Result<Album> {
    let path = match data {
        Some(path) => path,
        None => {
            let dir = album::app_data_dir();
            std::fs::create_dir_all(&dir)?;
            dir.join("album.db")
        }
    };
    let album = AlbumStore::open(SqliteStore::open_or_create(&path)?)?;
    debug!("Using album database {}", album.record_store().path().display());
    Ok(album)
}

fn find(album: &Album, id: &str) -> Result<Memory> {
    match album.get(id) {
        Some(memory) => Ok(memory.clone()),
        None => bail!("Yaad nahi mili: {}", id),
    }
}

fn preset_at<'a>(presets: &'a [&'a str], n: Option<usize>) -> Result<Option<&'a str>> {
    match n {
        None => Ok(None),
        Some(n) if (1..=presets.len()).contains(&n) => Ok(Some(presets[n - 1])),
        Some(n) => bail!("preset must be between 1 and {}, got {}", presets.len(), n),
    }
}

fn print_memory(memory: &Memory) {
    println!("{}  [{}]  {}", memory.id, memory.year, memory.image_description);
    if !memory.wish.is_empty() {
        println!("    \"{}\"", memory.wish);
    }
}

fn new_command(
    album: &mut Album,
    creator: String,
    sibling: String,
    gender: String,
    photo: String,
    description: String,
    year: String,
) -> Result<()> {
    if album.is_created() {
        warn!("Replacing the existing album");
    }
    let image_url = photo::import_photo(&photo)?;
    let info = AlbumInfo::new(creator, sibling, gender);
    let greeting = info.greeting();
    let memories = album.create_album(info, vec![MemoryDraft::new(image_url, description, year)])?;

    info!("Album created with {} memory", memories.len());
    println!("{}", greeting);
    Ok(())
}

async fn add_command(
    album: &mut Album,
    photo: String,
    description: String,
    year: String,
    wish: Option<String>,
    generate_wish: bool,
) -> Result<()> {
    let image_url = photo::import_photo(&photo)?;
    let mut draft = MemoryDraft::new(image_url, description, year);
    draft.validate()?;

    if let Some(wish) = wish {
        draft = draft.with_wish(wish);
    } else if generate_wish {
        let generators = Generators::gemini_from_env()?;
        let wish = generators
            .wish
            .generate_or_fallback(&draft.image_description, random_default_wish())
            .await;
        draft = draft.with_wish(wish);
    }

    let memory = album.add(draft)?;
    info!("Added memory {}", memory.id);
    print_memory(&memory);
    Ok(())
}

fn list_command(album: &Album, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(album.memories())?);
        return Ok(());
    }
    if let Some(greeting) = album.greeting() {
        println!("{}\n", greeting);
    }
    if album.is_empty() {
        println!("Abhi koi yaad nahi hai. `rakhi add` se jodiye.");
    }
    for memory in album.memories() {
        print_memory(memory);
    }
    Ok(())
}

fn timeline_command(album: &Album) -> Result<()> {
    for group in album.timeline() {
        println!("== {} ({}) ==", group.label, group.memories.len());
        for memory in &group.memories {
            print_memory(memory);
        }
        println!();
    }
    Ok(())
}

fn edit_command(
    album: &mut Album,
    id: String,
    photo: Option<String>,
    description: Option<String>,
    year: Option<String>,
    wish: Option<String>,
) -> Result<()> {
    let image_url = photo.map(|p| photo::import_photo(&p)).transpose()?;
    let update = MemoryUpdate {
        image_url,
        image_description: description,
        wish,
        year,
    };
    let memory = album.update(&id, update)?;
    info!("Updated memory {}", memory.id);
    print_memory(&memory);
    Ok(())
}

fn remove_command(album: &mut Album, id: String) -> Result<()> {
    let removed = album.remove(&id)?;
    info!("Removed memory {}", removed.id);
    Ok(())
}

async fn wish_command(album: &mut Album, id: String, save: bool) -> Result<()> {
    let memory = find(album, &id)?;
    let generators = Generators::gemini_from_env()?;

    match generators.wish.generate_outcome(&memory.image_description).await {
        WishOutcome::Completed { wish } => {
            println!("{}", wish);
            if save {
                album.set_wish(&id, wish)?;
                info!("Wish saved on {}", id);
            }
            Ok(())
        }
        WishOutcome::Failed { error } => {
            println!("Suggestion: {}", random_default_wish());
            bail!(error.message)
        }
    }
}

async fn image_command(
    album: &Album,
    id: String,
    preset: Option<usize>,
    no_reference: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let memory = find(album, &id)?;
    let preset = preset_at(&prompts::IMAGE_PRESETS, preset)?;
    let prompt = ImageGenerator::memory_prompt(&memory.image_description, preset);

    let reference = if no_reference {
        None
    } else {
        match generation::MediaPayload::parse(&memory.image_url) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!("Photo cannot be used as a reference: {}", e);
                None
            }
        }
    };

    let generators = Generators::gemini_from_env()?;
    info!("Kalpana ko rang mil rahe hain...");
    match generators.image.generate(&prompt, reference).await {
        ImageOutcome::Completed { image, caption } => {
            let path = output.unwrap_or_else(|| {
                PathBuf::from(format!("{}.{}", id, photo::extension_for(image.mime())))
            });
            let written = photo::write_payload(&image, &path)?;
            info!("Saved {} ({} bytes)", path.display(), written);
            if let Some(caption) = caption {
                println!("{}", caption);
            }
            Ok(())
        }
        ImageOutcome::Failed { error } => bail!(error.message),
    }
}

async fn video_command(
    album: &Album,
    id: String,
    preset: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    let memory = find(album, &id)?;
    let image = generation::MediaPayload::parse(&memory.image_url)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    let preset = preset_at(&prompts::VIDEO_PRESETS, preset)?;

    let generators = Generators::gemini_from_env()?;
    let videos = &generators.video;
    let task = videos.start(videos.memory_request(&memory.image_description, image, preset));

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")?);
    spinner.set_message("Video shuru ho raha hai...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let mut updates = task.subscribe();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let state = loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break task.state();
                }
                let state = updates.borrow_and_update().clone();
                if let VideoState::Processing { checks } = &state {
                    spinner.set_message(format!("Video ban raha hai... (check {})", checks));
                }
                if state.is_terminal() {
                    break state;
                }
            }
            _ = &mut ctrl_c => {
                task.cancel();
                break task.state();
            }
        }
    };
    spinner.finish_and_clear();

    match state {
        VideoState::Completed { video } => {
            let path = output.unwrap_or_else(|| PathBuf::from(format!("{}.mp4", id)));
            let written = photo::write_payload(&video, &path)?;
            info!("Video saved to {} ({} bytes)", path.display(), written);
            Ok(())
        }
        VideoState::Failed { error } => bail!(error.message),
        other => bail!("video job stopped in state {}", other.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_bounds() {
        assert_eq!(preset_at(&prompts::VIDEO_PRESETS, None).unwrap(), None);
        assert_eq!(
            preset_at(&prompts::VIDEO_PRESETS, Some(1)).unwrap(),
            Some(prompts::VIDEO_PRESETS[0])
        );
        assert!(preset_at(&prompts::VIDEO_PRESETS, Some(0)).is_err());
        assert!(preset_at(&prompts::VIDEO_PRESETS, Some(6)).is_err());
    }

    #[test]
    fn test_cli_parses_add() {
        let cli = Cli::try_parse_from([
            "rakhi",
            "--data",
            "/tmp/album.db",
            "add",
            "photo.png",
            "-d",
            "Rakhi bandhte hue",
            "-y",
            "2021",
            "--generate-wish",
        ])
        .unwrap();
        assert_eq!(cli.data, Some(PathBuf::from("/tmp/album.db")));
        match cli.command {
            Commands::Add {
                year,
                generate_wish,
                wish,
                ..
            } => {
                assert_eq!(year, "2021");
                assert!(generate_wish);
                assert!(wish.is_none());
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_open_album_at_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut album = open_album(Some(dir.path().join("album.db"))).unwrap();
        album
            .add(MemoryDraft::new("https://placehold.co/a.png", "Holi 2019", "2019"))
            .unwrap();
        drop(album);

        let album = open_album(Some(dir.path().join("album.db"))).unwrap();
        assert_eq!(album.len(), 1);
        assert!(find(&album, "missing").is_err());
    }
}
