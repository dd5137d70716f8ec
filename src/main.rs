use anyhow::{Context, Result};
use std::process::ExitCode;
use tracing::{error, info};

use cinetrack::backends::StreamingApi;
use cinetrack::config::Config;
use cinetrack::models::{AuthTokens, PlaybackRequest, ProfileId, SessionContext, TitleId};
use cinetrack::services::{PlaybackServices, PlaybackSession};

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinetrack=debug".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(title_id), Some(profile_id)) = (args.next(), args.next()) else {
        eprintln!("usage: cinetrack <title-id> <profile-id>");
        return Ok(ExitCode::from(2));
    };

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Ok(url) = std::env::var("CINETRACK_API_URL") {
        config.network.base_url = url;
    }

    let tokens = std::env::var("CINETRACK_ACCESS_TOKEN")
        .ok()
        .map(|access| AuthTokens::new(access, std::env::var("CINETRACK_REFRESH_TOKEN").ok()));
    let context = SessionContext::new(Some(ProfileId::new(profile_id)), tokens);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(config, context, TitleId::new(title_id)))
}

async fn run(config: Config, context: SessionContext, title_id: TitleId) -> Result<ExitCode> {
    info!("Using API at {}", config.network.base_url);

    let api = StreamingApi::from_config(&config.network, &context)
        .context("Invalid API base URL")?;
    let (services, _queue_worker) = PlaybackServices::from_api(api);

    let session =
        PlaybackSession::initialize(context, title_id, &services, PlaybackRequest::default())
            .await;

    let Some(media) = session.media() else {
        let message = session
            .error_message()
            .unwrap_or_else(|| "Failed to load the video".to_string());
        error!("{}", message);
        eprintln!("{}", message);
        return Ok(ExitCode::FAILURE);
    };

    println!("Title:   {}", media.title.title);
    println!("Quality: {}", media.playback.quality);
    println!("URL:     {}", media.playback.url);

    let profile_id = session.context().require_profile()?;
    match services.store.get_progress(profile_id, session.title_id()).await {
        Ok(progress) => println!("Resume:  {}s", progress.position.as_secs()),
        Err(e) => println!("Resume:  unavailable ({})", e.user_message()),
    }

    Ok(ExitCode::SUCCESS)
}
