use std::env;

use anyhow::{anyhow, bail, Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{Address, AsyncTransport, Tokio1Executor};
use tracing::info;

use super::{find, training_link, Scenario, UNKNOWN_SCENARIO};
use crate::analyze::anon_hash;

pub const ENV_SMTP_HOST: &str = "SMTP_HOST";
pub const ENV_SMTP_USER: &str = "SMTP_USER";
pub const ENV_SMTP_PASS: &str = "SMTP_PASS";
/// Envelope sender; the display name comes from the scenario.
pub const ENV_SIMULATION_FROM: &str = "SIMULATION_FROM";
/// Public base URL of this service, used for the training link.
pub const ENV_SIMULATION_BASE_URL: &str = "SIMULATION_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

pub const MAIL_NOT_CONFIGURED: &str =
    "메일 발송 설정이 완료되지 않았습니다. (.env 파일을 확인해주세요)";

/// SMTP sender for training emails.
pub struct TrainingMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Address,
    base_url: String,
}

impl TrainingMailer {
    /// Fails with [`MAIL_NOT_CONFIGURED`] when any SMTP variable is missing.
    pub fn from_env() -> Result<Self> {
        let var = |k: &str| env::var(k).ok().filter(|v| !v.trim().is_empty());
        let (Some(host), Some(user), Some(pass), Some(from)) = (
            var(ENV_SMTP_HOST),
            var(ENV_SMTP_USER),
            var(ENV_SMTP_PASS),
            var(ENV_SIMULATION_FROM),
        ) else {
            bail!(MAIL_NOT_CONFIGURED);
        };

        let from: Address = from
            .trim()
            .parse()
            .with_context(|| format!("invalid {ENV_SIMULATION_FROM}"))?;
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(host.trim())
            .with_context(|| format!("invalid {ENV_SMTP_HOST}"))?
            .credentials(Credentials::new(user, pass))
            .build();
        let base_url = var(ENV_SIMULATION_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            mailer,
            from,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn send(&self, target_email: &str, scenario: &Scenario) -> Result<()> {
        let link = training_link(&self.base_url, scenario.id);
        let msg = build_message(scenario, &self.from, target_email, &link)?;
        self.mailer.send(msg).await.context("send training email")?;
        info!(scenario = scenario.id, target = %anon_hash(target_email), "training email sent");
        Ok(())
    }
}

/// HTML email for `scenario` with the link substituted.
pub fn build_message(
    scenario: &Scenario,
    from: &Address,
    target_email: &str,
    link: &str,
) -> Result<Message> {
    let to: Mailbox = target_email
        .trim()
        .parse()
        .context("invalid target email")?;
    Message::builder()
        .from(Mailbox::new(Some(scenario.sender_name.to_string()), from.clone()))
        .to(to)
        .subject(scenario.subject)
        .header(header::ContentType::TEXT_HTML)
        .body(scenario.render_body(link))
        .context("build training email")
}

/// Look up `scenario_id`, read SMTP settings from the environment and send.
/// An unknown id fails before the mail settings are checked.
pub async fn send_phishing_email(target_email: &str, scenario_id: &str) -> Result<()> {
    let scenario = find(scenario_id).ok_or_else(|| anyhow!(UNKNOWN_SCENARIO))?;
    let mailer = TrainingMailer::from_env()?;
    mailer.send(target_email, scenario).await
}
