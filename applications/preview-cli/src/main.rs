/// Signage Preview - inspect, edit and preview a playlist from the terminal
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use signage_core::{
    AssetId, Folder, FolderId, MediaAsset, MediaType, Playlist, PlaylistId, PlaylistItem,
    PlaylistItemId,
};
use signage_editor::{logging, EditorConfig, PlaylistEditor, Stores};
use signage_store_client::{MemoryStore, RemoteStore};
use std::{path::PathBuf, sync::Arc};

#[derive(Parser)]
#[command(name = "signage-preview")]
#[command(about = "Inspect, edit and preview signage playlists", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SIGNAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Use a built-in in-memory library instead of the remote store
    /// (playlist id: "demo")
    #[arg(long)]
    demo: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the timeline with effective durations
    Show {
        /// Playlist ID
        playlist: String,
    },
    /// Run the looping preview
    Preview {
        /// Playlist ID
        playlist: String,
        /// Stop after this many full loops (runs until Ctrl+C when omitted)
        #[arg(long)]
        cycles: Option<usize>,
    },
    /// Move an item to a new position
    Move {
        /// Playlist ID
        playlist: String,
        /// Item ID
        item: String,
        /// Zero-based target position
        position: usize,
    },
    /// Set an item's duration override ("clear" removes it)
    SetDuration {
        /// Playlist ID
        playlist: String,
        /// Item ID
        item: String,
        /// Seconds, or "clear"
        seconds: String,
    },
    /// List one catalog folder with usage counts for the playlist
    Catalog {
        /// Playlist ID
        playlist: String,
        /// Folder ID (root when omitted)
        #[arg(long)]
        folder: Option<String>,
        /// Free-text search
        #[arg(long)]
        search: Option<String>,
        /// Media type (image, video, audio, document, webpage, app, design)
        #[arg(long = "type")]
        media_type: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = EditorConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    logging::init(&config.log.filter)?;

    let stores = if cli.demo {
        Stores::shared(demo_store().await)
    } else {
        let remote =
            RemoteStore::new(config.store_config()).context("Invalid store configuration")?;
        Stores::shared(Arc::new(remote))
    };

    match cli.command {
        Commands::Show { playlist } => {
            let editor = open(&playlist, stores, &config).await?;
            print_timeline(&editor);
            editor.close().await;
        }
        Commands::Preview { playlist, cycles } => {
            let mut editor = open(&playlist, stores, &config).await?;
            preview(&mut editor, cycles).await;
            editor.close().await;
        }
        Commands::Move {
            playlist,
            item,
            position,
        } => {
            let mut editor = open(&playlist, stores, &config).await?;
            let moved = editor.move_item(&PlaylistItemId::new(item), position)?;
            if !moved {
                println!("Item is already at position {}", position);
            }
            finish(editor).await?;
        }
        Commands::SetDuration {
            playlist,
            item,
            seconds,
        } => {
            let seconds = match seconds.as_str() {
                "clear" => None,
                value => Some(
                    value
                        .parse::<u32>()
                        .with_context(|| format!("Invalid duration: {}", value))?,
                ),
            };
            let mut editor = open(&playlist, stores, &config).await?;
            let change = editor.set_duration(&PlaylistItemId::new(item), seconds)?;
            println!(
                "Duration override: {} -> {}",
                format_override(change.previous),
                format_override(change.value)
            );
            finish(editor).await?;
        }
        Commands::Catalog {
            playlist,
            folder,
            search,
            media_type,
        } => {
            let media_type = match media_type {
                Some(name) => match MediaType::parse(&name) {
                    Some(t) => Some(t),
                    None => bail!("Unknown media type: {}", name),
                },
                None => None,
            };
            let mut editor = open(&playlist, stores, &config).await?;
            if folder.is_some() {
                editor.navigate(folder.map(FolderId::new)).await?;
            }
            if media_type.is_some() {
                editor.set_type_filter(media_type).await?;
            }
            if search.is_some() {
                editor.search(search).await?;
            }
            print_catalog(&editor);
            editor.close().await;
        }
    }

    Ok(())
}

async fn open(
    playlist: &str,
    stores: Stores,
    config: &EditorConfig,
) -> anyhow::Result<PlaylistEditor> {
    PlaylistEditor::open(PlaylistId::new(playlist), stores, config)
        .await
        .with_context(|| format!("Failed to open playlist {}", playlist))
}

/// Wait for the writes, reconcile, print the result
async fn finish(mut editor: PlaylistEditor) -> anyhow::Result<()> {
    editor.flush().await?;
    editor.process_outcomes().await?;
    print_timeline(&editor);

    let closed = editor.close().await;
    for notice in &closed.notices {
        eprintln!("! {}", notice.message);
    }
    Ok(())
}

async fn preview(editor: &mut PlaylistEditor, cycles: Option<usize>) {
    let len = editor.items().len();
    if !editor.play() {
        println!("Playlist is empty, nothing to preview");
        return;
    }
    let limit = cycles.map(|c| c * len);
    print_slot(editor);

    let mut advanced = 0;
    loop {
        tokio::select! {
            tick = editor.next_tick() => {
                if tick.is_none() {
                    break;
                }
                print_slot(editor);
                advanced += 1;
                if limit.is_some_and(|limit| advanced >= limit) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    editor.stop();
    tracing::debug!(events = ?editor.playback_events(), "Preview finished");
}

fn print_slot(editor: &PlaylistEditor) {
    let Some(index) = editor.playback().current_index() else {
        return;
    };
    let Some(item) = editor.items().get(index) else {
        return;
    };
    println!(
        "> [{}] {} ({}s)",
        index,
        asset_name(editor, &item.asset_id),
        editor.list().effective_duration(item)
    );
}

fn print_timeline(editor: &PlaylistEditor) {
    let playlist = editor.playlist();
    println!("{} ({})", playlist.name, playlist.id);
    for item in editor.items() {
        let stale = if editor.list().is_stale(&item.id) {
            "  [asset deleted]"
        } else {
            ""
        };
        let marker = if item.override_duration_seconds.is_some() {
            "*"
        } else {
            " "
        };
        println!(
            "  {:>3}  {:<28} {:>5}s{}  {}{}",
            item.position,
            asset_name(editor, &item.asset_id),
            editor.list().effective_duration(item),
            marker,
            item.id,
            stale
        );
    }
    println!("  total: {}s", editor.total_duration());
}

fn print_catalog(editor: &PlaylistEditor) {
    let catalog = editor.catalog();
    let path: Vec<&str> = catalog.breadcrumb().iter().map(|f| f.name.as_str()).collect();
    println!("/{}  ({} assets)", path.join("/"), catalog.total_count());
    for folder in catalog.subfolders() {
        println!("  [{}] {}/", folder.id, folder.name);
    }
    for (_, asset) in catalog.visible_rows() {
        if let Some(asset) = asset {
            let used = editor.usage_count(&asset.id);
            let usage = if used > 0 {
                format!("  (used {}x)", used)
            } else {
                String::new()
            };
            println!(
                "  {:<8} {:<28} {}{}",
                asset.media_type.as_str(),
                asset.name,
                asset.id,
                usage
            );
        }
    }
    if let Some(error) = catalog.last_error() {
        eprintln!("! {}", error);
    }
}

fn asset_name(editor: &PlaylistEditor, asset_id: &AssetId) -> String {
    editor
        .asset(asset_id)
        .map(|a| a.name.clone())
        .unwrap_or_else(|| format!("<missing {}>", asset_id))
}

fn format_override(seconds: Option<u32>) -> String {
    seconds.map_or_else(|| "default".to_string(), |s| format!("{}s", s))
}

/// Small library for trying the editor without a server
async fn demo_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let playlist = Playlist {
        id: PlaylistId::new("demo"),
        ..Playlist::new("Lobby screen")
    };

    store
        .add_folder(Folder {
            id: FolderId::new("menus"),
            name: "Menus".into(),
            parent_id: None,
            media_count: 2,
        })
        .await;

    let library = [
        ("welcome", "Welcome slide", MediaType::Design, None, None),
        ("promo", "Spring promo", MediaType::Video, Some(15), None),
        ("breakfast", "Breakfast menu", MediaType::Image, None, Some("menus")),
        ("lunch", "Lunch menu", MediaType::Image, None, Some("menus")),
        ("weather", "Weather", MediaType::WebPage, None, None),
    ];
    for (id, name, media_type, duration, folder) in library {
        let mut asset = MediaAsset::new(name, media_type, format!("https://cdn.example/{}", id));
        asset.id = AssetId::new(id);
        asset.duration_seconds = duration;
        asset.folder_id = folder.map(FolderId::new);
        store.add_asset(asset).await;
    }

    let timeline = [
        ("welcome", None),
        ("promo", None),
        ("breakfast", Some(8)),
        ("weather", Some(20)),
    ];
    for (position, (asset, seconds)) in timeline.into_iter().enumerate() {
        let mut item =
            PlaylistItem::new(playlist.id.clone(), AssetId::new(asset), position as u32)
                .with_override(seconds);
        item.id = PlaylistItemId::new(format!("demo-{}", position + 1));
        store.add_item(item).await;
    }
    store.add_playlist(playlist).await;

    store
}
