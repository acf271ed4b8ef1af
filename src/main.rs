//! Scam Risk Analyzer: binary entrypoint.
//! `analyze` / `demo` print diagnoses to stdout, `serve` boots the Axum HTTP
//! server, `probe` makes one collaborator call, `scenarios` / `simulate` list
//! and send phishing-awareness training emails.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scam_risk_analyzer::ai_bootstrap::AiRuntime;
use scam_risk_analyzer::api::{self, AppState};
use scam_risk_analyzer::simulation;
use scam_risk_analyzer::FinalDiagnosis;

/// Messages used by `demo`: gibberish, a tax-refund lure, a prize lure.
const DEMO_MESSAGES: [&str; 3] = [
    "sdlkfjaslfjewjf;lasjfwpsdf",
    "긴급! 국세청입니다. 세금 환급을 위해 계좌번호를 회신해주세요.",
    "당첨되셨습니다! 지금 즉시 링크를 클릭하여 상금을 수령하세요.",
];

#[derive(Parser)]
#[command(name = "scam-risk-analyzer", version, about = "Phishing/scam risk scoring for text")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one message (words are joined with spaces)
    Analyze {
        #[arg(required = true)]
        text: Vec<String>,
        /// Print the full diagnosis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Analyze the built-in sample messages
    Demo,
    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
    /// Send one probe prompt to the configured collaborator
    Probe,
    /// List the training scenarios
    Scenarios,
    /// Mail a training scenario (SMTP settings from the environment)
    Simulate {
        /// Recipient address
        #[arg(long)]
        to: String,
        /// Scenario id, see `scenarios`
        #[arg(long)]
        scenario: String,
    },
}

/// Compact logs by default, JSON with LOG_FORMAT=json. Filter via RUST_LOG.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scam_risk_analyzer=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn print_pretty(d: &FinalDiagnosis) {
    let level = d.risk_level;
    println!(
        "위험도: {} {} ({}%)",
        level.emoji(),
        level.label(),
        d.risk_score
    );
    println!("요약: {}", d.summary);
    for p in &d.detected_patterns {
        println!(
            "  - {} [{}] {:.1}: {}",
            p.description,
            p.category,
            p.score,
            p.matched_keywords.join(", ")
        );
    }
    for r in &d.recommendations {
        println!("  * {r}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze { text, json } => {
            let pipeline = AiRuntime::discover().pipeline();
            let d = pipeline.analyze(&text.join(" ")).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&d)?);
            } else {
                print_pretty(&d);
            }
        }
        Command::Demo => {
            let pipeline = AiRuntime::discover().pipeline();
            for (i, msg) in DEMO_MESSAGES.iter().enumerate() {
                println!("[테스트 {}] {msg}", i + 1);
                let d = pipeline.analyze(msg).await;
                print_pretty(&d);
                println!("{}", "-".repeat(80));
            }
        }
        Command::Serve { addr } => {
            let app = api::router(AppState::from_env());
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!(%addr, "listening");
            axum::serve(listener, app).await?;
        }
        Command::Probe => {
            let ok = AiRuntime::discover().quick_probe().await;
            if !ok {
                anyhow::bail!("collaborator probe failed or not configured");
            }
        }
        Command::Scenarios => {
            for s in simulation::scenarios() {
                println!("{:<18} {}", s.id, s.title);
                println!("{:<18} {} <{}>", "", s.sender_name, s.sender_email);
                println!("{:<18} {}", "", s.subject);
            }
        }
        Command::Simulate { to, scenario } => {
            simulation::send_phishing_email(&to, &scenario).await?;
            println!("훈련 메일 발송 완료: {scenario}");
        }
    }
    Ok(())
}
