use anyhow::Result;
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

use job_tracker::config::Config;
use job_tracker::email::{JobTracker, MessageSource};

#[derive(Parser)]
#[command(name = "job-tracker")]
#[command(about = "Classifies job application emails and extracts the company behind them")]
#[command(version = "0.1.0")]
struct Args {
    /// Dry-run mode: print the classifications, write nothing
    #[arg(short, long)]
    dry_run: bool,

    /// Daemon mode: run on the configured schedule
    #[arg(long)]
    daemon: bool,

    /// Output directory for the artifacts (overrides DATA_DIR, default: ./data)
    #[arg(short = 'o', long)]
    data_dir: Option<String>,

    /// Maximum number of emails to process (default: unlimited)
    #[arg(short = 'l', long)]
    limit: Option<usize>,

    /// Read messages from a JSON file instead of Gmail
    #[arg(short, long, conflicts_with = "eml")]
    input: Option<PathBuf>,

    /// Read messages from a directory of .eml files instead of Gmail
    #[arg(long)]
    eml: Option<PathBuf>,

    /// Check the configuration without connecting
    #[arg(long)]
    check_config: bool,
}

impl Args {
    fn source(&self) -> MessageSource {
        match (&self.input, &self.eml) {
            (Some(path), _) => MessageSource::JsonFile(path.clone()),
            (None, Some(dir)) => MessageSource::EmlDir(dir.clone()),
            (None, None) => MessageSource::Gmail,
        }
    }

    /// Command-line values win over the environment.
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();

    env_logger::init();

    if args.dry_run {
        info!("🧪 Starting job tracker in DRY-RUN mode");
    } else {
        info!("🚀 Starting job tracker");
    }

    // Missing credentials stop here, before any message is read
    let mut config = Config::new()?;

    if args.check_config {
        println!("✅ Configuration valid!");
        println!("🤖 Model: {} ({:?} mode)", config.classifier.model_id, config.classifier.mode);
        println!("🌐 Endpoint: {}", config.classifier.base_url);
        match &config.gmail {
            Some(gmail) => {
                println!("📧 Gmail API OAuth2");
                println!("🔑 Credentials: {}", gmail.credentials_path);
                println!("💾 Token cache: {}", gmail.token_cache_path);
                println!("🔎 Query: {}", gmail.query);
            }
            None => println!("📧 Gmail not configured (use --input or --eml)"),
        }
        println!("📁 Data directory: {}", config.data_dir);
        println!(
            "💬 Slack: {}",
            if config.slack.is_some() { "enabled" } else { "disabled" }
        );
        return Ok(());
    }

    args.apply_overrides(&mut config);

    if args.daemon {
        info!("🔄 Starting in daemon mode");
        run_daemon_mode(config, args).await?;
        return Ok(());
    }

    let tracker = if args.dry_run {
        JobTracker::new_dry_run(config, args.source())?
    } else {
        JobTracker::new(config, args.source())?
    };

    match tracker.run(args.limit).await {
        Ok(result) => {
            info!(
                "✅ Run completed successfully. {} emails classified, {} failed.",
                result.emails_processed, result.emails_failed
            );
        }
        Err(e) => {
            error!("❌ Error while processing emails: {:#}", e);
            return Err(e);
        }
    }

    Ok(())
}

async fn run_daemon_mode(config: Config, args: Args) -> Result<()> {
    use chrono::{Local, Timelike};
    use tokio_cron_scheduler::{Job, JobScheduler};

    if !config.scheduler.enabled {
        error!("❌ Daemon mode requires SCHEDULER_ENABLED=true");
        anyhow::bail!("Scheduler not enabled in configuration");
    }

    if config.scheduler.schedule_times.is_empty() {
        error!("❌ No schedule defined (SCHEDULER_TIMES)");
        anyhow::bail!("No schedule defined");
    }

    info!("📅 Configured run times: {:?}", config.scheduler.schedule_times);

    let scheduler = JobScheduler::new().await?;

    for schedule_time in &config.scheduler.schedule_times {
        let Some((hour, minute)) = schedule_time.split_once(':') else {
            error!("❌ Invalid schedule format: {}. Use HH:MM", schedule_time);
            continue;
        };

        // Cron format: "0 minute hour * * *" (every day)
        let cron_expr = format!("0 {} {} * * *", minute, hour);
        info!("📆 Adding scheduled job: {} (cron: {})", schedule_time, cron_expr);

        let config_clone = config.clone();
        let source = args.source();
        let dry_run = args.dry_run;
        let limit = args.limit;
        let schedule_time_clone = schedule_time.clone();

        let job = Job::new_async(cron_expr.as_str(), move |_uuid, _l| {
            let config = config_clone.clone();
            let source = source.clone();
            let schedule_time = schedule_time_clone.clone();

            Box::pin(async move {
                info!("⏰ Scheduled run at {} - fetching emails...", schedule_time);

                let tracker = if dry_run {
                    JobTracker::new_dry_run(config, source)
                } else {
                    JobTracker::new(config, source)
                };
                let tracker = match tracker {
                    Ok(tracker) => tracker,
                    Err(e) => {
                        error!("❌ Unable to create the job tracker: {}", e);
                        return;
                    }
                };

                match tracker.run(limit).await {
                    Ok(result) => {
                        info!(
                            "✅ Scheduled run finished at {}: {} emails classified",
                            schedule_time, result.emails_processed
                        );
                    }
                    Err(e) => {
                        error!("❌ Scheduled run at {} failed: {:#}", schedule_time, e);
                    }
                }
            })
        })?;

        scheduler.add(job).await?;
    }

    scheduler.start().await?;

    info!("✅ Daemon started. Waiting for scheduled runs...");
    info!("⏸️  Press Ctrl+C to stop the daemon");

    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;

        let now = Local::now();
        if now.minute() == 0 {
            info!("💓 Daemon alive - {}", now.format("%Y-%m-%d %H:%M"));
        }
    }
}
