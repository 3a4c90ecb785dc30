//! Register and logout command implementations

use devreg::error::Result;

use crate::cli::{CommandContext, GlobalOptions};
use crate::output;

/// Register the harness device for a profile
pub async fn register(opts: &GlobalOptions, profile_id: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let outcome = ctx.client.register_device(profile_id).await?;
    output::print(&outcome, ctx.format)?;
    outcome.ensure_success()?;
    Ok(())
}

/// Log a profile out
pub async fn logout(opts: &GlobalOptions, profile_id: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let outcome = ctx.client.log_out_profile(profile_id).await?;
    output::print(&outcome, ctx.format)?;
    outcome.ensure_success()?;
    Ok(())
}
