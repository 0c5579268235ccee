//! Transient user-facing status banner.
//!
//! A new banner always overwrites the current one. Success banners dismiss
//! themselves after a fixed delay; every other kind stays until cleared.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerKind {
    Success,
    Error,
    Info,
    Warning,
}

impl std::fmt::Display for BannerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BannerKind::Success => write!(f, "success"),
            BannerKind::Error => write!(f, "error"),
            BannerKind::Info => write!(f, "info"),
            BannerKind::Warning => write!(f, "warning"),
        }
    }
}

/// What the banner currently displays. The idle banner is `("", None)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub message: String,
    pub kind: Option<BannerKind>,
}

impl Banner {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.kind.is_none() && self.message.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct BannerState {
    current: Banner,
    expires_at: Option<Instant>,
    dismiss_after: Duration,
}

impl BannerState {
    #[must_use]
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            current: Banner::default(),
            expires_at: None,
            dismiss_after,
        }
    }

    pub fn set(&mut self, kind: BannerKind, message: impl Into<String>) {
        self.set_at(kind, message, Instant::now());
    }

    pub fn set_at(&mut self, kind: BannerKind, message: impl Into<String>, now: Instant) {
        self.current = Banner {
            message: message.into(),
            kind: Some(kind),
        };
        self.expires_at = (kind == BannerKind::Success).then(|| now + self.dismiss_after);
    }

    pub fn clear(&mut self) {
        self.current = Banner::default();
        self.expires_at = None;
    }

    #[must_use]
    pub fn view(&self) -> Banner {
        self.view_at(Instant::now())
    }

    /// The banner as displayed at `now`, honouring auto-dismissal.
    #[must_use]
    pub fn view_at(&self, now: Instant) -> Banner {
        match self.expires_at {
            Some(deadline) if now >= deadline => Banner::default(),
            _ => self.current.clone(),
        }
    }
}

impl Default for BannerState {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}
