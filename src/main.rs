use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vacancy_feed::{config::Config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr);
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = Config::from_env()?;
    let state = AppState::new(config)?;
    info!(
        backend = %state.api.base_url(),
        user_id = ?state.launch_params.user_id(),
        "Loading vacancy feed"
    );

    let snapshot = state.feed.refresh().await?;
    info!(
        total = snapshot.envelope().map(|page| page.count).unwrap_or_default(),
        held = snapshot.vacancies().len(),
        active = snapshot.active().count(),
        "Feed ready"
    );

    if std::env::args().nth(1).as_deref() == Some("like") {
        match state.feed.like() {
            Some(ticket) => {
                let id = ticket.vacancy().id;
                match ticket.outcome().await {
                    Ok(()) => info!(vacancy_id = id, "Approval recorded"),
                    Err(err) => warn!(vacancy_id = id, error = %err, "Approval failed"),
                }
            }
            None => info!("Feed is empty, nothing to like"),
        }
    }

    let cards = serde_json::to_string_pretty(state.feed.snapshot().vacancies())?;
    println!("{}", cards);
    Ok(())
}
