use anyhow::{bail, Context};
use carpark_finder::sdk::{
    api::{self, AppState},
    carpark::{DEFAULT_DURATION_HOURS, DEFAULT_RADIUS_M},
    config::{AppConfig, BackendConfig},
    geocode::AddressSuggestionClient,
    location::{FixedPositionSource, GeolocationProvider, PositionSource},
    navigation::{launch, LaunchPlan, NavigationLinkBuilder, NavigationService, Platform, SystemLauncher},
    report::render_search_state,
    search::{CarparkSource, FallbackCarparkSource, RemoteCarparkSource, SearchCache, SearchError, SearchOrchestrator},
    session::Session,
    util::log::init_logging,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;

/// Compare parking prices around a destination
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the carpark search API
    Serve {
        /// Address to listen on (defaults to CARPARK_BIND_ADDR)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Find the cheapest carparks near a destination
    #[command(allow_negative_numbers = true)]
    Search {
        /// Destination address, resolved through OneMap
        #[arg(short, long, conflicts_with_all = ["lat", "here"])]
        address: Option<String>,

        /// Destination latitude
        #[arg(long, requires = "lng", conflicts_with = "here")]
        lat: Option<f64>,

        /// Destination longitude
        #[arg(long, requires = "lat")]
        lng: Option<f64>,

        /// Search around the device position (CARPARK_DEVICE_LAT/LNG)
        #[arg(long)]
        here: bool,

        /// Parking duration in hours
        #[arg(short, long, default_value_t = DEFAULT_DURATION_HOURS)]
        duration: f64,

        /// Search radius in meters
        #[arg(short, long, default_value_t = DEFAULT_RADIUS_M)]
        radius: f64,

        /// Ask the API at PUBLIC_API_URL instead of searching in-process
        #[arg(long)]
        remote: bool,
    },

    /// List address suggestions for a partial query
    Suggest { query: String },

    /// Print or open driving directions to a carpark
    #[command(allow_negative_numbers = true)]
    Navigate {
        lat: f64,
        lng: f64,

        #[arg(long, value_enum, default_value_t = Service::Waze)]
        service: Service,

        /// User agent of the device that will navigate
        #[arg(long, default_value = "")]
        user_agent: String,

        /// Open the link instead of printing it
        #[arg(long)]
        open: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Service {
    Waze,
    Google,
    Apple,
}

impl From<Service> for NavigationService {
    fn from(service: Service) -> Self {
        match service {
            Service::Waze => NavigationService::Waze,
            Service::Google => NavigationService::GoogleMaps,
            Service::Apple => NavigationService::AppleMaps,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Invalid configuration")?;

    match cli.command {
        Command::Serve { bind } => serve(&config, bind).await,
        Command::Search {
            address,
            lat,
            lng,
            here,
            duration,
            radius,
            remote,
        } => {
            let destination = match (address, lat.zip(lng)) {
                (Some(address), _) => Destination::Address(address),
                (None, Some((lat, lng))) => Destination::Pinned(lat, lng),
                (None, None) if here => Destination::Device,
                (None, None) => bail!("Give an --address, --lat/--lng, or --here"),
            };
            search(&config, destination, duration, radius, remote).await
        }
        Command::Suggest { query } => suggest(&config, &query).await,
        Command::Navigate {
            lat,
            lng,
            service,
            user_agent,
            open,
        } => navigate(&config, lat, lng, service, &user_agent, open).await,
    }
}

enum Destination {
    Address(String),
    Pinned(f64, f64),
    Device,
}

async fn serve(config: &AppConfig, bind: Option<String>) -> anyhow::Result<()> {
    if config.backend == BackendConfig::Mock {
        log::info!("No BACKEND_API_URL configured, serving mock carparks");
    }
    let addr = bind.unwrap_or_else(|| config.bind_addr.clone());
    let state = AppState::new(FallbackCarparkSource::from_config(&config.backend));
    api::serve(&addr, state)
        .await
        .with_context(|| format!("Failed to serve on {}", addr))
}

async fn search(
    config: &AppConfig,
    destination: Destination,
    duration: f64,
    radius: f64,
    remote: bool,
) -> anyhow::Result<()> {
    let source: Arc<dyn CarparkSource> = if remote {
        Arc::new(RemoteCarparkSource::new(config.public_api_url.clone()))
    } else {
        Arc::new(FallbackCarparkSource::from_config(&config.backend))
    };
    let orchestrator = SearchOrchestrator::new(source, SearchCache::load_from_file(&config.cache_file));

    let device = config.device_position.map(|(lat, lng)| {
        Arc::new(FixedPositionSource::new(lat, lng)) as Arc<dyn PositionSource>
    });
    let geocoder = Arc::new(AddressSuggestionClient::new(config.onemap_base_url.clone()));
    let session = Session::new(GeolocationProvider::new(device), orchestrator, Some(geocoder.clone()))
        .with_radius(radius);

    match destination {
        Destination::Address(address) => {
            let Some(found) = geocoder.geocode_address(&address).await else {
                bail!("No address found for {:?}", address);
            };
            log::info!("Destination set to: {}", found.address);
            session.select_address(&found);
        }
        Destination::Pinned(lat, lng) => {
            session.location().set_location(lat, lng, "Pinned location");
        }
        Destination::Device => {
            let state = session.locate().await;
            if let Some(error) = state.error {
                bail!(error);
            }
        }
    }

    match session.search(duration).await {
        Err(e @ (SearchError::MissingCoordinates | SearchError::InvalidParameter { .. })) => {
            return Err(e.into())
        }
        // Anything else is reflected in the search state below
        _ => {}
    }

    print!(
        "{}",
        render_search_state(&session.search_orchestrator().state(), duration)
    );
    Ok(())
}

async fn suggest(config: &AppConfig, query: &str) -> anyhow::Result<()> {
    let client = AddressSuggestionClient::new(config.onemap_base_url.clone());
    let suggestions = client.search_addresses(query).await;
    if suggestions.is_empty() {
        println!("No suggestions for {:?}", query);
    }
    for suggestion in suggestions {
        println!(
            "{}  ({}, {})",
            suggestion.address, suggestion.lat, suggestion.lng
        );
    }
    Ok(())
}

async fn navigate(
    config: &AppConfig,
    lat: f64,
    lng: f64,
    service: Service,
    user_agent: &str,
    open: bool,
) -> anyhow::Result<()> {
    let builder = NavigationLinkBuilder::new(config.app_fallback);
    let plan = builder.plan(service.into(), lat, lng, Platform::from_user_agent(user_agent));

    if open {
        let outcome = launch(&SystemLauncher, &plan)
            .await
            .context("Failed to open navigation link")?;
        log::info!("Navigation launch: {:?}", outcome);
        return Ok(());
    }

    match plan {
        LaunchPlan::AppWithFallback {
            app_url,
            web_url,
            fallback_after,
        } => {
            println!("{}", app_url);
            println!("{}  (after {}ms)", web_url, fallback_after.as_millis());
        }
        LaunchPlan::NewContext { url } => println!("{}", url),
    }
    Ok(())
}
