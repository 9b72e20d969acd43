//! Tether CLI - send one request through a transporter.
//!
//! ```text
//! tether http://127.0.0.1:8080/v1/containers
//! tether -X POST -H 'Content-Type: application/json' -d '{"name":"logs"}' http://...
//! tether -T ./disk.img http://127.0.0.1:8080/v1/containers/backups/disk.img
//! cat disk.img | tether -T - http://127.0.0.1:8080/v1/containers/backups/disk.img
//! ```

use clap::Parser;
use std::io::Write;
use std::process::ExitCode;
use tether::prelude::*;
use tracing_subscriber::EnvFilter;

/// Send a single HTTP request and print the response body.
#[derive(Debug, Parser)]
#[command(name = "tether", version, about, long_about = None)]
struct Cli {
    /// HTTP method; GET by default, POST with --data, PUT with --upload-file.
    #[arg(short = 'X', long = "request")]
    method: Option<Method>,

    /// Extra header as 'Name: value'. May be repeated.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body sent from memory; implies POST unless -X is given.
    #[arg(short, long, conflicts_with = "upload_file")]
    data: Option<String>,

    /// Stream the request body from a file, or '-' for standard input.
    #[arg(short = 'T', long)]
    upload_file: Option<String>,

    /// Print the status line and response headers.
    #[arg(short, long)]
    include: bool,

    /// Target URI.
    uri: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error + Send + Sync>> {
    // Logs go to stderr so the body on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let headers = parse_headers(&cli.headers)?;
    let transporter = HyperTransporter::new(TransportConfig::from_env()?);

    let response = match cli.upload_file.as_deref() {
        Some(upload) => {
            let method = default_method(&cli);
            let resource = if upload == "-" {
                Resource::reader(tokio::io::stdin())
            } else {
                Resource::locator(upload.to_string())
            };
            transporter
                .do_request_with_resource(&cli.uri, method, headers, resource)
                .await?
        }
        None => {
            let request = Request::new(&cli.uri)
                .method(default_method(&cli))
                .headers(headers)
                .body(cli.data.clone().unwrap_or_default());
            transporter.do_request(request).await?
        }
    };

    let mut stdout = std::io::stdout().lock();
    if cli.include {
        writeln!(stdout, "HTTP {}", response.status)?;
        for (name, value) in response.headers.iter() {
            writeln!(stdout, "{}: {}", name, value)?;
        }
        writeln!(stdout)?;
    }
    stdout.write_all(&response.body)?;
    stdout.flush()?;

    if response.status.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!("Server answered {}", response.status);
        Ok(ExitCode::FAILURE)
    }
}

/// Method to use when `-X` is absent: PUT for uploads, POST for `-d`, else GET.
fn default_method(cli: &Cli) -> Method {
    cli.method.unwrap_or(if cli.upload_file.is_some() {
        Method::Put
    } else if cli.data.is_some() {
        Method::Post
    } else {
        Method::Get
    })
}

/// Parse `Name: value` arguments, keeping their order.
fn parse_headers(raw: &[String]) -> Result<Headers, String> {
    let mut headers = Headers::new();
    for line in raw {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| format!("header '{}' is not in 'Name: value' form", line))?;
        headers.append(name.trim(), value.trim());
    }
    Ok(headers)
}
