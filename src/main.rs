use dotenv::dotenv;
use human_panic::setup_panic;
use tracing::{debug, error, info, warn};

// 从 lib.rs 导入模块
use rust_course_ratings::config::AppConfig;
use rust_course_ratings::runtime::lifetime;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let start_time = chrono::Utc::now();

    // 初始化配置
    setup_panic!();
    if let Err(e) = AppConfig::init() {
        eprintln!("Failed to initialize configuration: {e}");
        std::process::exit(1);
    }
    let config = AppConfig::get();

    // 初始化日志
    let stdout_log = std::io::stdout();
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(stdout_log);
    let filter = tracing_subscriber::EnvFilter::new(&config.app.log_level);
    let tracing_format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_ansi(true);

    let tracing_builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking_writer)
        .event_format(tracing_format);

    if config.is_development() {
        tracing_builder
            .with_file(true)
            .with_line_number(true)
            .init();
    } else {
        tracing_builder.json().init();
    }

    warn!(
        "Starting pre-startup processing...
        Project: {}
        Version: {}
        Authors: {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_AUTHORS")
    );

    let startup = match lifetime::startup::prepare_startup(config).await {
        Ok(startup) => startup,
        Err(e) => {
            error!("Startup failed: {}", e.format_simple());
            std::process::exit(1);
        }
    };

    debug!(
        "Pre-startup processing completed in {} ms",
        chrono::Utc::now()
            .signed_duration_since(start_time)
            .num_milliseconds()
    );

    let storage = startup.storage.clone();

    match storage.get_last_courses().await {
        Ok(courses) => info!("Latest courses: {}", courses.len()),
        Err(e) => warn!("Failed to list courses: {}", e),
    }
    match storage.get_last_professors().await {
        Ok(professors) => info!("Latest professors: {}", professors.len()),
        Err(e) => warn!("Failed to list professors: {}", e),
    }
    match storage.get_last_scores().await {
        Ok(scores) => {
            info!("Latest scores: {}", scores.len());
            for score in scores.iter().filter(|s| s.is_graded()).take(10) {
                info!(
                    "{} / {}: {:?} ({} grades)",
                    score.course_code,
                    score.professor_name,
                    score.score_average,
                    score.grade_count
                );
            }
        }
        Err(e) => warn!("Failed to list scores: {}", e),
    }

    startup.shutdown().await;
}
