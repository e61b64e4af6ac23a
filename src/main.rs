use std::process::ExitCode;

use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use volunteerly::{
    config::Settings,
    domain::{Event, EventDraft, EventPatch, EventType},
    listing::{CategoryFilter, EventFilter, EventStatus, JoinedFilter},
    scope::ViewScope,
    service::{EventDetails, ServiceContext},
    validation::EventForm,
    AppError, Result,
};

#[derive(Parser)]
#[command(name = "volunteerly", version, about = "Browse, create and join community-service events")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List upcoming events
    Upcoming {
        /// Event type, or "all"
        #[arg(long, default_value = "all")]
        category: CategoryFilter,
        /// Text to look for in titles and descriptions
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one event
    Show { id: String },
    /// Create an event
    Create {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long = "type", default_value = "")]
        event_type: String,
        #[arg(long, default_value = "")]
        thumbnail: String,
        #[arg(long, default_value = "")]
        location: String,
        /// RFC 3339 timestamp, e.g. 2026-11-02T09:00:00Z
        #[arg(long)]
        date: Option<DateTime<Utc>>,
    },
    /// Join an event
    Join { id: String },
    /// Events you joined
    Joined {
        /// all, upcoming or past
        #[arg(long, default_value = "all")]
        view: JoinedFilter,
    },
    /// Events you created, with totals
    Manage,
    /// Edit an event you created
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "type")]
        event_type: Option<EventType>,
        #[arg(long)]
        thumbnail: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        date: Option<DateTime<Utc>>,
    },
    /// Delete an event you created
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let loaded = Settings::new().map_err(AppError::from);
    let filter = match &loaded {
        Ok(settings) => settings.logging.filter.clone(),
        Err(_) => Settings::default().logging.filter,
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let settings = loaded.unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::debug!("Using events API at {}", settings.api.base_url);
    if settings.auth.token.is_some() && settings.viewer.is_none() {
        tracing::warn!(
            "auth.token is set without a viewer section; commands that act as you will fail"
        );
    }

    let context = ServiceContext::from_settings(&settings);

    // Ctrl-C closes the view; the in-flight request still completes
    let scope = ViewScope::new();
    let closer = scope.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            closer.close();
        }
    });

    match scope.settle(run(cli.command, &context)).await {
        Some(Ok(())) => Ok(ExitCode::SUCCESS),
        Some(Err(e)) => {
            tracing::warn!(kind = ?e.kind(), "{}", e);
            eprintln!("✖ {}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
        None => {
            eprintln!("Cancelled");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(command: Command, context: &ServiceContext) -> Result<()> {
    let service = &context.event_service;
    let credentials = &context.credentials;
    let now = Utc::now();

    match command {
        Command::Upcoming { category, search } => {
            let mut filter = EventFilter::new().category(category);
            if let Some(term) = search {
                filter = filter.search(term);
            }

            let events = service.upcoming(&filter).await?;
            if events.is_empty() {
                println!("No events match your current filters.");
            }
            for event in &events {
                print_event_line(event, now);
            }
        }
        Command::Show { id } => {
            let viewer = credentials.current_viewer().await;
            let details = service.details(&id, viewer.as_ref()).await?;
            print_details(&details);
        }
        Command::Create {
            title,
            description,
            event_type,
            thumbnail,
            location,
            date,
        } => {
            let creator = credentials.require_viewer("create an event").await?;
            let mut form = EventForm::from_draft(EventDraft {
                title,
                description,
                event_type,
                thumbnail,
                location,
                event_date: date,
            });

            match service.submit(&mut form, &creator).await {
                Ok(event) => println!("✅ Event created: {} ({})", event.title, event.id),
                Err(e) => {
                    for (field, message) in form.errors().iter() {
                        eprintln!("  {}: {}", field, message);
                    }
                    return Err(e);
                }
            }
        }
        Command::Join { id } => {
            let viewer = credentials.require_viewer("join this event").await?;
            let event = service.join_by_id(&id, &viewer).await?;
            println!(
                "🎉 Successfully joined {} ({} participants)",
                event.title,
                event.participant_count()
            );
        }
        Command::Joined { view } => {
            let viewer = credentials.require_viewer("view your joined events").await?;
            let events = service.joined_events(&viewer, view).await?;
            if events.is_empty() {
                println!("No joined events.");
            }
            for event in &events {
                print_event_line(event, now);
            }
        }
        Command::Manage => {
            let viewer = credentials.require_viewer("manage your events").await?;
            let managed = service.created_events(&viewer).await?;
            println!(
                "Total created: {}  Upcoming: {}  Completed: {}  Total participants: {}",
                managed.stats.total,
                managed.stats.upcoming,
                managed.stats.past,
                managed.stats.total_participants
            );
            for event in &managed.events {
                print_event_line(event, now);
            }
        }
        Command::Update {
            id,
            title,
            description,
            event_type,
            thumbnail,
            location,
            date,
        } => {
            let viewer = credentials.require_viewer("update this event").await?;
            let patch = EventPatch {
                title,
                description,
                event_type,
                thumbnail,
                location,
                event_date: date,
            };

            let current = context.event_repo.find_by_id(&id).await?;
            let updated = service.update(&current, &patch, &viewer).await?;
            println!("✅ Event updated: {}", updated.title);
        }
        Command::Delete { id } => {
            let viewer = credentials.require_viewer("delete this event").await?;
            let current = context.event_repo.find_by_id(&id).await?;
            service.delete(&current, &viewer).await?;
            println!("🗑  Event deleted: {}", current.title);
        }
    }

    Ok(())
}

fn print_event_line(event: &Event, now: DateTime<Utc>) {
    println!(
        "[{:<9}] {}  {}  ({}, {})  {} joined  #{}",
        EventStatus::of(event, now).label(),
        event.event_date.with_timezone(&Local).format("%b %e, %Y %H:%M"),
        event.title,
        event.event_type,
        event.location,
        event.participant_count(),
        event.id
    );
}

fn print_details(details: &EventDetails) {
    let event = &details.event;
    println!("{}  [{}]", event.title, details.status);
    println!("  Type:      {}", event.event_type);
    println!(
        "  When:      {}",
        event.event_date.with_timezone(&Local).format("%B %e, %Y %H:%M")
    );
    println!("  Where:     {}", event.location);
    if let Some(name) = &event.creator_name {
        println!("  Organizer: {}", name);
    }
    println!("  {}", event.description);
    println!(
        "  {} {} joined",
        details.participant_count,
        if details.participant_count == 1 { "person" } else { "people" }
    );
    for participant in &event.participants {
        println!(
            "    - {} (joined {})",
            participant.user_name,
            participant.joined_at.with_timezone(&Local).format("%Y-%m-%d")
        );
    }
    if details.has_joined {
        println!("  You have joined this event.");
    } else if details.can_manage {
        println!("  You created this event.");
    }
}
