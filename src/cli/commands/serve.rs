//! Web server command.

use console::style;

use crate::config::{Config, Settings};

const DEFAULT_PORT: u16 = 8501;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, config: &Config, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;

    println!(
        "{} Starting docqa at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, config, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "8501" -> 127.0.0.1:8501
/// - Just a host: "0.0.0.0" -> 0.0.0.0:8501
/// - Host and port: "0.0.0.0:8080" -> 0.0.0.0:8080
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    let bind = bind.trim();
    if bind.is_empty() {
        anyhow::bail!("Empty bind address");
    }

    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    Ok((bind.to_string(), DEFAULT_PORT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_address() {
        assert_eq!(
            parse_bind_address("9000").unwrap(),
            ("127.0.0.1".to_string(), 9000)
        );
        assert_eq!(
            parse_bind_address("0.0.0.0").unwrap(),
            ("0.0.0.0".to_string(), 8501)
        );
        assert_eq!(
            parse_bind_address("0.0.0.0:8080").unwrap(),
            ("0.0.0.0".to_string(), 8080)
        );
        assert!(parse_bind_address("  ").is_err());
    }
}
