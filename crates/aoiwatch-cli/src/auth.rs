//! Credential command handlers: `login`, `logout` and `status`.

use aoiwatch_core::BannerKind;
use aoiwatch_dashboard::Dashboard;

const HASH_PREFIX_LEN: usize = 12;

/// Validate `key` with the provider and store it in both credential scopes.
///
/// # Errors
///
/// Returns an error if the provider rejects the key or it cannot be saved.
pub(crate) async fn run_login(dashboard: &mut Dashboard, key: &str) -> anyhow::Result<()> {
    dashboard.check_api_key(key.trim()).await?;
    dashboard.set_banner(BannerKind::Success, "API key validated and saved");
    Ok(())
}

pub(crate) fn run_logout(dashboard: &mut Dashboard) -> anyhow::Result<()> {
    dashboard.logout()?;
    dashboard.set_banner(BannerKind::Info, "Logged out");
    Ok(())
}

pub(crate) fn run_status(dashboard: &mut Dashboard) -> anyhow::Result<()> {
    let login_required = dashboard.credentials_mut().check_auth()?;
    let demo_mode = dashboard.state().demo_mode();

    println!("demo mode:  {}", if demo_mode { "on" } else { "off" });
    match dashboard.credentials().current() {
        Some(credential) => {
            let hash = &credential.api_key_hash;
            println!(
                "key hash:   {}...",
                hash.get(..HASH_PREFIX_LEN).unwrap_or(hash)
            );
        }
        None => println!("key hash:   {}", crate::or_dash(None)),
    }
    println!(
        "session:    {}",
        if login_required { "login required" } else { "active" }
    );

    if login_required && !demo_mode {
        dashboard.set_banner(
            BannerKind::Warning,
            "Not logged in; run `aoiwatch login --key <KEY>`",
        );
    } else {
        dashboard.set_banner(BannerKind::Info, "Ready");
    }
    Ok(())
}
