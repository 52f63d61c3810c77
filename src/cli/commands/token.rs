use anyhow::Context;
use clap::Args;
use serde_json::{json, Map};

use crate::auth::JwtKeys;
use crate::cli::{utils::output_success, OutputFormat};
use crate::config::config;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long, help = "External identity (token subject) the user record is resolved by")]
    pub subject: String,

    #[arg(long, help = "Email claim")]
    pub email: Option<String>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config().security;
    let keys = JwtKeys::from_config(security).context("JWT_SECRET must be set to mint tokens")?;
    let token = keys.issue(&args.subject, args.email.as_deref())?;

    match output_format {
        OutputFormat::Text => println!("{}", token),
        OutputFormat::Json => {
            let mut data = Map::new();
            data.insert("token".into(), json!(token));
            data.insert("expires_in_hours".into(), json!(security.jwt_expiry_hours));
            output_success(output_format, &format!("Token issued for {}", args.subject), data)?;
        }
    }
    Ok(())
}
