use std::{error::Error, sync::Arc, time::Duration};

use drowse::{
    config::{config_path, ConfigLoadError, DrowseConfig},
    logging::DrowseLogger,
    Drowse,
};
use tokio::sync::broadcast;

const NOTIFICATION_DRAIN: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();
    #[cfg(debug_assertions)]
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();
    #[cfg(not(debug_assertions))]
    env_logger::init();

    let config_file = config_path()?;

    let config = match DrowseConfig::load(&config_file) {
        Ok(config) => {
            // Save config to fill missing fields
            let _ = config.save(&config_file);
            Ok(config)
        }
        Err(error) => match error {
            ConfigLoadError::Io(_) => {
                let default_config = DrowseConfig::default();
                if default_config.save(&config_file).is_ok() {
                    DrowseLogger::config_created(&config_file);
                }
                Ok(default_config)
            }
            ConfigLoadError::Parse(parse_error) => Err(parse_error),
        },
    }?;

    let drowse = Arc::new(Drowse::new(config)?);
    let stop = broadcast::channel(1).0;

    let mut server = tokio::spawn({
        let drowse = drowse.clone();
        let stop = stop.subscribe();
        async move {
            if let Err(e) = drowse.start(stop).await {
                log::error!("{e}");
            }
        }
    });

    {
        use futures::future::{select_all, FutureExt};
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        let sigint_fut = sigint.recv().boxed();
        let sigterm_fut = sigterm.recv().boxed();

        tokio::select! {
            _ = select_all([sigint_fut, sigterm_fut]) => {
                DrowseLogger::shutdown_signal();
                let _ = stop.send(());
                let _ = (&mut server).await;
            }
            _ = &mut server => {}
        }
    }

    drowse.wake().drain(NOTIFICATION_DRAIN).await;
    Ok(())
}
