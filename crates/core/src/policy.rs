//! Policy texts handed verbatim to the completion service.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

pub const VACATION_FILE: &str = "vacaciones.txt";
pub const LEAVE_FILE: &str = "licencias.txt";
pub const PURCHASES_FILE: &str = "compras.txt";
pub const COMMISSIONS_FILE: &str = "comisiones.txt";
pub const FAQ_FILE: &str = "faq.txt";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolicyBundle {
    pub vacation: String,
    pub leave: String,
    pub purchases: String,
    pub commissions: String,
    pub faq: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PolicyPresence {
    pub name: &'static str,
    pub present: bool,
    pub chars: usize,
}

impl PolicyBundle {
    /// Reads every blob from `dir`. Missing or unreadable files become empty
    /// strings.
    pub fn load(dir: &Path) -> Self {
        let bundle = Self {
            vacation: read_blob(dir, VACATION_FILE),
            leave: read_blob(dir, LEAVE_FILE),
            purchases: read_blob(dir, PURCHASES_FILE),
            commissions: read_blob(dir, COMMISSIONS_FILE),
            faq: read_blob(dir, FAQ_FILE),
        };

        info!(
            event_name = "policy.bundle_loaded",
            policy_dir = %dir.display(),
            present = bundle.presence().iter().filter(|blob| blob.present).count(),
            "policy bundle loaded"
        );
        bundle
    }

    pub fn presence(&self) -> Vec<PolicyPresence> {
        [
            ("vacation", &self.vacation),
            ("leave", &self.leave),
            ("purchases", &self.purchases),
            ("commissions", &self.commissions),
            ("faq", &self.faq),
        ]
        .into_iter()
        .map(|(name, text)| PolicyPresence {
            name,
            present: !text.trim().is_empty(),
            chars: text.chars().count(),
        })
        .collect()
    }
}

fn read_blob(dir: &Path, file: &str) -> String {
    let path = dir.join(file);
    match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(error) => {
            warn!(
                event_name = "policy.blob_missing",
                path = %path.display(),
                error = %error,
                "policy text unavailable, using empty text"
            );
            String::new()
        }
    }
}
