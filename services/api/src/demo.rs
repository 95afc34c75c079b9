use crate::infra::{marketplace_service, Marketplace};
use chrono::NaiveDate;
use clap::Args;
use homepal::config::MarketplaceConfig;
use homepal::error::AppError;
use homepal::marketplace::{
    Actor, CategoryEstimator, JobCategory, JobView, MarketplaceError, NewJob, NewQuote, NewReminder,
    PaymentRequest, PriceBand, PriceEstimator, RecordingLiveUpdates, Registration,
    ReminderCategory, UserRole,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Job category or alias (e.g. "tesisat"). Defaults to plumbing.
    #[arg(long)]
    pub(crate) category: Option<String>,
    /// Quote price in TL. Defaults to the middle of the job's band.
    #[arg(long)]
    pub(crate) price: Option<u32>,
    /// First due date for the maintenance reminder (YYYY-MM-DD).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) reminder_due: Option<NaiveDate>,
    /// Skip the maintenance reminder portion of the demo.
    #[arg(long)]
    pub(crate) skip_reminders: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct PricingArgs {
    /// Only show this category or alias
    #[arg(long)]
    pub(crate) category: Option<String>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct PricingRow {
    pub(crate) category: JobCategory,
    pub(crate) aliases: Vec<&'static str>,
    pub(crate) default_band: PriceBand,
    pub(crate) photo_estimate: Option<PriceBand>,
}

fn resolve_category(raw: Option<&str>) -> Result<JobCategory, AppError> {
    match raw {
        None => Ok(JobCategory::Plumbing),
        Some(raw) => JobCategory::from_alias(raw).ok_or_else(|| {
            AppError::from(MarketplaceError::Validation(format!(
                "unknown job category '{raw}'"
            )))
        }),
    }
}

pub(crate) fn pricing_rows(filter: Option<&str>) -> Result<Vec<PricingRow>, AppError> {
    let categories = match filter {
        Some(raw) => vec![resolve_category(Some(raw))?],
        None => JobCategory::ALL.to_vec(),
    };
    let estimator = CategoryEstimator;

    Ok(categories
        .into_iter()
        .map(|category| PricingRow {
            category,
            aliases: category.aliases().collect(),
            default_band: category.default_band(),
            photo_estimate: estimator.estimate(category, "demo://photo"),
        })
        .collect())
}

pub(crate) fn run_pricing(args: PricingArgs) -> Result<(), AppError> {
    let rows = pricing_rows(args.category.as_deref())?;

    if args.json {
        match serde_json::to_string_pretty(&rows) {
            Ok(json) => println!("{}", json),
            Err(err) => println!("Pricing payload unavailable: {}", err),
        }
        return Ok(());
    }

    println!("Category price bands (TL)");
    for row in rows {
        let estimate = row
            .photo_estimate
            .map(|band| format!("{}-{}", band.min_price, band.max_price))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "- {:<11} default {:>5}-{:<6} photo estimate {:<12} aliases: {}",
            row.category.code(),
            row.default_band.min_price,
            row.default_band.max_price,
            estimate,
            row.aliases.join(", ")
        );
    }
    Ok(())
}

fn enrol(
    service: &Marketplace<RecordingLiveUpdates>,
    name: &str,
    email: &str,
    role: UserRole,
    specialties: &[&str],
) -> Result<Actor, AppError> {
    let profile = service.register(Registration {
        name: name.to_string(),
        email: email.to_string(),
        role,
        phone: None,
        address: Some("Kadikoy, Istanbul".to_string()),
        specialties: specialties.iter().map(|s| s.to_string()).collect(),
        saved_card: None,
    })?;
    println!("  Registered {} {} ({})", role, profile.name, profile.id);
    Ok(Actor::new(profile.id.as_str(), role))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        category,
        price,
        reminder_due,
        skip_reminders,
    } = args;
    let category = resolve_category(category.as_deref())?;

    let live = Arc::new(RecordingLiveUpdates::default());
    let service = marketplace_service(&MarketplaceConfig::default(), live.clone());

    println!("HomePal marketplace demo");
    let homeowner = enrol(&service, "Ayse Yilmaz", "ayse@example.com", UserRole::Homeowner, &[])?;
    let professional = enrol(
        &service,
        "Usta Mehmet",
        "mehmet@example.com",
        UserRole::Professional,
        &[category.code()],
    )?;

    let job = service.create_job(
        &homeowner,
        NewJob::new(
            "Demo repair",
            "Scripted job created by the command-line demo.",
            category,
        ),
    )?;
    let band = job.price_band;
    println!(
        "\nJob {} posted in {} with band {}-{} TL",
        job.id, job.category, band.min_price, band.max_price
    );

    let lowball = band.min_price.saturating_sub(1);
    match service.submit_quote(&professional, quote(&job, lowball)) {
        Err(err) => println!("  Quote of {} TL refused: {} [{}]", lowball, err, err.code()),
        Ok(quote) => println!("  Quote of {} TL unexpectedly accepted ({})", lowball, quote.id),
    }

    let price = price.unwrap_or((band.min_price + band.max_price) / 2);
    let bid = service.submit_quote(&professional, quote(&job, price))?;
    println!("  {} quoted {} TL ({})", bid.professional.name, bid.price, bid.status);

    let accepted = service.accept_quote(&homeowner, &bid.id)?;
    println!("  Homeowner accepted quote {} -> {}", accepted.id, accepted.status);

    let completed = service.complete_job(
        &professional,
        &job.id,
        Some("Work finished during the demo.".to_string()),
    )?;
    println!(
        "  Job {} is {} at {} TL",
        completed.id,
        completed.status,
        completed.price.unwrap_or_default()
    );

    let payment = service.pay(
        &homeowner,
        PaymentRequest {
            job_id: job.id.clone(),
            card: None,
        },
    )?;
    match serde_json::to_string_pretty(&payment) {
        Ok(json) => println!("  Payment record:\n{}", json),
        Err(err) => println!("  Payment record unavailable: {}", err),
    }

    println!("\nNotifications");
    for actor in [&homeowner, &professional] {
        let inbox = service.list_notifications(actor)?;
        println!("  {} ({} unread):", actor.id, service.unread_notifications(actor)?);
        for notification in inbox {
            println!("    - [{:?}] {}", notification.kind, notification.message);
        }
    }

    let events = live.events();
    if events.is_empty() {
        println!("\nLive updates: none published");
    } else {
        println!("\nLive updates:");
        for event in events {
            println!("    - {} at {}", event.kind.name(), event.emitted_at.to_rfc3339());
        }
    }

    if skip_reminders {
        return Ok(());
    }

    let suggestion = service.reminder_suggestion(&homeowner, ReminderCategory::Klima)?;
    let reminder = service.create_reminder(
        &homeowner,
        NewReminder {
            name: suggestion.name,
            category: suggestion.category,
            frequency_days: suggestion.frequency_days,
            next_due_date: reminder_due,
            notes: None,
        },
    )?;
    println!(
        "\nMaintenance reminder \"{}\" every {} days, next due {}",
        reminder.name,
        reminder.frequency_days,
        reminder.next_due_date.format("%Y-%m-%d")
    );

    Ok(())
}

fn quote(job: &JobView, price: u32) -> NewQuote {
    NewQuote {
        job_id: job.id.clone(),
        price,
        message: Some("Available this week.".to_string()),
    }
}
