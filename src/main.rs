// src/main.rs

// Thin presentation shim over the reconnaissance engine: normalize the
// input to a bare domain, run a scan, print the report as JSON. Anything
// richer (chat front ends, formatted text) belongs outside this binary.

use color_eyre::eyre::{Result, eyre};
use url::Url;

mod core;
mod logging;

use crate::core::scanner;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::initialize_logging()?;

    let raw_input = std::env::args()
        .nth(1)
        .ok_or_else(|| eyre!("usage: tunnelprobe <domain>"))?;

    // Accept scheme-prefixed input and reduce it to the host part.
    let input_with_scheme = if !raw_input.starts_with("http://") && !raw_input.starts_with("https://")
    {
        format!("https://{}", raw_input)
    } else {
        raw_input.clone()
    };
    let target_domain = Url::parse(&input_with_scheme)
        .ok()
        .and_then(|url| url.host_str().map(String::from))
        .unwrap_or(raw_input);

    match scanner::run_full_scan(&target_domain).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => Err(eyre!(e)),
    }
}
