use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    DictionarySource, FileLocalePreferenceStore, HttpDictionarySource, LocaleError,
    MissingDictionarySource, PlaybackEvent, Session, SessionConfig, SessionSlot,
    TrackCatalogClient, Variables,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod media;

use media::ConsoleMediaPlayer;

#[derive(Parser, Debug)]
#[command(about = "Play through the catalog from the command line")]
struct Args {
    /// Backend serving `/tracks` and `/i18n`; overrides the config file.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "client-prefs.toml")]
    preferences: PathBuf,
    /// Switch to this locale before loading modules.
    #[arg(long)]
    locale: Option<String>,
    /// Translation modules to load and print.
    #[arg(long = "module", default_values_t = vec!["nav".to_string()])]
    modules: Vec<String>,
    /// Playlist index to start playing.
    #[arg(long)]
    play: Option<usize>,
    #[arg(long)]
    volume: Option<f32>,
    /// Simulated length of every track, in seconds.
    #[arg(long, default_value_t = 5)]
    track_seconds: u64,
    /// How long to follow playback before exiting, in seconds.
    #[arg(long, default_value_t = 12)]
    listen_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    let server_url = args.server_url.clone().or_else(|| config.server_url.clone());

    let dictionaries: Arc<dyn DictionarySource> = match &server_url {
        Some(url) => Arc::new(HttpDictionarySource::new(url.clone())),
        None => {
            warn!("no server configured; translations fall back to keys");
            Arc::new(MissingDictionarySource)
        }
    };
    let media = Arc::new(ConsoleMediaPlayer::new(
        Duration::from_secs(args.track_seconds),
        Duration::from_secs(1),
    ));

    let slot = SessionSlot::new();
    let session = Session::start_with_dependencies(
        &config,
        media,
        dictionaries,
        Arc::new(FileLocalePreferenceStore::new(&args.preferences)),
        None,
    )
    .await;
    slot.install(Arc::new(session));

    let locale = slot.locale()?;
    if let Some(requested) = &args.locale {
        match locale.set_locale(requested).await {
            Ok(()) => {}
            Err(err @ LocaleError::UnsupportedLocale(_)) => return Err(err.into()),
            Err(err) => warn!(error = %err, "locale switch incomplete"),
        }
    }
    println!("Locale: {}", locale.locale());

    for module in &args.modules {
        let translator = locale.translator(module);
        translator.ensure_loaded().await;
        if translator.loading() {
            println!("[{module}] not available");
            continue;
        }
        let mut variables = Variables::new();
        variables.insert("module".to_string(), module.clone());
        println!(
            "[{module}] {}",
            translator.translate("title", Some("module {module} loaded"), Some(&variables))
        );
    }

    let playback = slot.playback()?;
    if let Some(volume) = args.volume {
        playback.set_volume(volume);
    }

    if let Some(url) = &server_url {
        let tracks = TrackCatalogClient::new(url.clone())
            .fetch_tracks()
            .await
            .context("failed to load playlist")?;
        for (index, track) in tracks.iter().enumerate() {
            println!(
                "{index:>3}. {} [{}]",
                track.display_title(),
                track.formatted_duration()
            );
        }
        playback.set_tracks(tracks);
    }

    let Some(index) = args.play else {
        return Ok(());
    };

    let mut events = playback.subscribe();
    playback.play_track(index)?;

    let follow = async {
        let mut last_index = None;
        while let Ok(event) = events.recv().await {
            match event {
                PlaybackEvent::StateChanged(snapshot) => {
                    if snapshot.current_index != last_index {
                        last_index = snapshot.current_index;
                        if let Some(track) = snapshot.current_track() {
                            println!("Now playing: {}", track.display_title());
                        }
                    }
                    if !snapshot.is_playing && snapshot.current_index.is_some() {
                        info!("playback stopped");
                        break;
                    }
                }
                PlaybackEvent::Error(message) => {
                    warn!(%message, "playback error");
                    break;
                }
            }
        }
    };
    if tokio::time::timeout(Duration::from_secs(args.listen_seconds), follow)
        .await
        .is_err()
    {
        info!("listen window elapsed");
    }

    slot.clear();
    Ok(())
}
