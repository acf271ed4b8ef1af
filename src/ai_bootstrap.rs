// src/ai_bootstrap.rs
use crate::analyze::ai_adapter::{build_collaborator, DynCollaborator};
use crate::config::ai::AiConfig;
use crate::pipeline::Pipeline;
use tracing::{info, warn};

/// Collaborator wiring resolved once at startup.
pub struct AiRuntime {
    pub cfg: Option<AiConfig>,
    pub collaborator: Option<DynCollaborator>,
}

impl AiRuntime {
    /// Config file / environment discovery; absence is not an error.
    pub fn discover() -> Self {
        Self::from_config(AiConfig::discover())
    }

    pub fn from_path(path: &str) -> anyhow::Result<Self> {
        let cfg = AiConfig::load_from_file(path)?;
        Ok(Self::from_config(Some(cfg)))
    }

    pub fn from_config(cfg: Option<AiConfig>) -> Self {
        if let Some(c) = &cfg {
            // Safe diagnostics: only provider + enabled + key length
            info!(
                "AI cfg loaded: provider={}, model={}, enabled={}, key_len={}",
                c.provider,
                c.model,
                c.enabled,
                c.api_key.len()
            );
        }
        let collaborator = build_collaborator(cfg.as_ref());
        Self { cfg, collaborator }
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.collaborator.clone())
    }

    /// One collaborator call with a fixed prompt; logs the outcome, never fails.
    pub async fn quick_probe(&self) -> bool {
        let Some(client) = &self.collaborator else {
            warn!("AI quick_probe skipped: no collaborator configured");
            return false;
        };
        match client.complete("한 문장으로 답하세요: 연결 확인").await {
            Ok(out) => {
                info!(provider = client.provider_name(), chars = out.chars().count(), "AI quick_probe ok");
                true
            }
            Err(e) => {
                warn!(provider = client.provider_name(), error = ?e, "AI quick_probe failed");
                false
            }
        }
    }
}
