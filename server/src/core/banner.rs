//! Startup banner

use super::config::{AppConfig, is_all_interfaces};
use super::constants::APP_NAME;
use crate::domain::nlquery::ExtractorKind;

/// Label column width
const W: usize = 14;

/// Print the startup banner with endpoints and the active model setup
pub fn print_banner(config: &AppConfig, extractor: Option<ExtractorKind>, analysis: bool) {
    let host = &config.server.host;
    let port = config.server.port;
    let display_host = if is_all_interfaces(host) {
        "localhost"
    } else {
        host.as_str()
    };

    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();

    let api_url = format!("http://{}:{}/api/nlquery", display_host, port);
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
        "API:",
        link(&api_url)
    );
    println!(
        "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
        "Traces:",
        link(&config.jaeger.url)
    );

    match extractor {
        Some(kind) => {
            let model = match config.nlquery.provider.as_deref() {
                Some(provider) => format!("{} ({})", config.nlquery.model, provider),
                None => "none".to_string(),
            };
            println!(
                "  \x1b[35m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
                "Extractor:", kind
            );
            println!(
                "  \x1b[35m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}{}",
                "Model:",
                model,
                if analysis { "" } else { " \x1b[90m(analysis off)\x1b[0m" }
            );
        }
        None => {
            println!(
                "  \x1b[90m➜  {:<W$} disabled\x1b[0m",
                "NL query:"
            );
        }
    }

    if is_all_interfaces(host) {
        if let Ok(interfaces) = local_ip_address::list_afinet_netifas() {
            for (_, ip) in interfaces
                .iter()
                .filter(|(_, ip)| ip.is_ipv4() && !ip.is_loopback())
            {
                println!(
                    "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
                    "Network:",
                    link(&format!("http://{}:{}", ip, port))
                );
            }
        }
    } else if host == "127.0.0.1" || host == "localhost" {
        println!(
            "  \x1b[90m➜  {:<W$} use --host 0.0.0.0 to expose\x1b[0m",
            "Network:"
        );
    }

    println!();
}

/// Cyan text, wrapped in an OSC 8 hyperlink when stdout supports it
fn link(url: &str) -> String {
    let colored = format!("\x1b[36m{}\x1b[0m", url);
    if supports_hyperlinks::on(supports_hyperlinks::Stream::Stdout) {
        format!("\x1b]8;;{}\x07{}\x1b]8;;\x07", url, colored)
    } else {
        colored
    }
}
