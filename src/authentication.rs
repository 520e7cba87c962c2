use anyhow::{Context, bail};

use cal_overlap::storage::Config;
use cal_overlap::sync::{CredentialProvider, GoogleAuthenticator, StaticToken};

pub const TOKEN_ENV: &str = "CAL_OVERLAP_TOKEN";

/// Picks the credential source: explicit token, then environment, then the
/// cached OAuth token (running the interactive setup when there is none).
pub async fn credential_provider(
    token: Option<String>,
    config: &Config,
) -> anyhow::Result<Box<dyn CredentialProvider>> {
    if let Some(token) = token.or_else(|| std::env::var(TOKEN_ENV).ok()) {
        tracing::info!("Using access token supplied on the command line or environment");
        return Ok(Box::new(StaticToken::new(token)));
    }

    let mut auth = GoogleAuthenticator::new(config.google.clone());

    if !auth.has_client_credentials() {
        println!("Configuration incomplete. Please edit the config file at:");
        println!("{}", Config::config_path().display());
        println!("\nYou need to set:");
        println!("  - google.client_id: Your Google OAuth2 client ID");
        println!("  - google.client_secret: Your Google OAuth2 client secret");
        println!("\nGet these from: https://console.cloud.google.com/apis/credentials");
        println!("Alternatively pass --token or set {}.", TOKEN_ENV);
        bail!("Missing Google OAuth credentials in config");
    }

    match auth.get_valid_token().await {
        Ok(_) => Ok(Box::new(auth)),
        Err(e) => {
            tracing::info!("No usable cached token ({}), starting authorization", e);
            println!("No valid authentication found. Setting up read-only calendar access...\n");
            println!("1. Visit this URL in your browser:\n");
            println!("{}\n", auth.get_auth_url());
            println!("2. Sign in and authorize the application");
            println!("3. Copy the 'code' parameter from the localhost:8080 redirect URL\n");
            println!("Enter the authorization code: ");

            let mut code = String::new();
            std::io::stdin().read_line(&mut code)?;

            auth.exchange_code_for_token(code.trim())
                .await
                .context("Failed to exchange authorization code")?;
            println!("\nAuthentication successful!\n");

            Ok(Box::new(auth))
        }
    }
}
