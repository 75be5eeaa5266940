#![forbid(unsafe_code)]

//! Lidingo CLI: SAML service provider operations (init, metadata, validate, c14n).

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use base64::{prelude::BASE64_STANDARD, Engine};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use lidingo_core::Error;
use lidingo_saml::{Metadata, ServiceProvider, Validated};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "lidingo",
    about = "Lidingo: SAML 2.0 service provider core (AuthnRequest, metadata, response validation, exc-c14n)",
    version
)]
struct Cli {
    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an AuthnRequest
    Init {
        /// Service provider entity ID
        #[arg(long = "sp-entity-id")]
        sp_entity_id: String,

        /// IdP metadata; adds Destination and ACS URL to the request
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Assertion Consumer Service URL (with --metadata)
        #[arg(long = "acs-url", requires = "metadata")]
        acs_url: Option<String>,

        /// Request ID (default: freshly generated)
        #[arg(long = "request-id")]
        request_id: Option<String>,
    },

    /// Parse IdP metadata and print what was found
    Metadata {
        /// IdP metadata XML file
        file: PathBuf,
    },

    /// Validate a SAML response against IdP metadata
    Validate {
        /// File holding the base64 SAMLResponse form field
        response: PathBuf,

        /// IdP metadata XML file
        #[arg(long)]
        metadata: PathBuf,

        /// Service provider entity ID (expected audience)
        #[arg(long = "sp-entity-id")]
        sp_entity_id: String,

        /// Allowed subject email domain (repeatable)
        #[arg(long = "allowed-domain")]
        allowed_domains: Vec<String>,

        /// Validation time, RFC 3339 (default: now)
        #[arg(long)]
        now: Option<String>,

        /// The response file is raw XML rather than base64
        #[arg(long)]
        xml: bool,
    },

    /// Exclusive canonicalization of an XML document
    C14n {
        /// Input XML file
        file: PathBuf,

        /// InclusiveNamespaces PrefixList (space separated)
        #[arg(long, default_value = "")]
        prefixes: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Lidingo(#[from] Error),

    #[error("{0}")]
    Rejected(String),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Init {
            sp_entity_id,
            metadata,
            acs_url,
            request_id,
        } => cmd_init(sp_entity_id, metadata, acs_url, request_id),

        Commands::Metadata { file } => cmd_metadata(file),

        Commands::Validate {
            response,
            metadata,
            sp_entity_id,
            allowed_domains,
            now,
            xml,
        } => cmd_validate(response, metadata, sp_entity_id, allowed_domains, now, xml),

        Commands::C14n {
            file,
            prefixes,
            output,
        } => cmd_c14n(file, prefixes, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_init(
    sp_entity_id: String,
    metadata: Option<PathBuf>,
    acs_url: Option<String>,
    request_id: Option<String>,
) -> Result<(), CliError> {
    let request_id = request_id.unwrap_or_else(lidingo_saml::new_request_id);
    let now = Utc::now();
    let init = match metadata {
        Some(path) => {
            let idp = load_metadata(&path)?;
            let sp = ServiceProvider::new(&sp_entity_id, acs_url.as_deref().unwrap_or_default());
            sp.authn_request(&request_id, &idp, now)
        }
        None => lidingo_saml::init(&request_id, &sp_entity_id, now),
    };

    println!("RequestID: {request_id}");
    println!("SAMLRequest: {}", init.saml_request);
    eprintln!("{}", init.request_xml);
    Ok(())
}

fn cmd_metadata(file: PathBuf) -> Result<(), CliError> {
    let idp = load_metadata(&file)?;
    println!("Entity ID: {}", idp.idp_entity_id);
    println!("SSO (HTTP-POST): {}", idp.redirect_url);
    for (binding, location) in &idp.sso_bindings {
        println!("  {binding} -> {location}");
    }
    println!("Signing certificate: {} bytes DER", idp.idp_certificate.len());
    // Fails early on a certificate that cannot verify anything
    lidingo_crypto::rsa_public_key_from_cert(&idp.idp_certificate)?;
    Ok(())
}

fn cmd_validate(
    response: PathBuf,
    metadata: PathBuf,
    sp_entity_id: String,
    allowed_domains: Vec<String>,
    now: Option<String>,
    xml: bool,
) -> Result<(), CliError> {
    let idp = load_metadata(&metadata)?;
    let now: DateTime<Utc> = match now {
        Some(s) => lidingo_saml::parse_instant(&s)?,
        None => Utc::now(),
    };
    let raw = read_file(&response)?;
    let saml_response = if xml {
        BASE64_STANDARD.encode(raw.as_bytes())
    } else {
        raw
    };

    let sp = ServiceProvider {
        entity_id: sp_entity_id,
        acs_url: String::new(),
        allowed_domains,
    };
    debug!(response = %response.display(), %now, "validating");
    match sp.validate(&saml_response, &idp, now) {
        Ok(validated) => report(&validated),
        Err(rejection) => {
            if let Some(assertion_id) = rejection.response.as_ref().and_then(|r| r.assertion_id.as_deref()) {
                eprintln!("Assertion ID: {assertion_id}");
            }
            Err(CliError::Rejected(format!("REJECTED: {}", rejection.error)))
        }
    }
}

fn report(validated: &Validated) -> Result<(), CliError> {
    let response = &validated.response;
    println!("Request ID: {}", response.request_id.as_deref().unwrap_or("-"));
    println!("Assertion ID: {}", response.assertion_id.as_deref().unwrap_or("-"));
    println!("Subject: {}", response.subject_id.as_deref().unwrap_or("-"));
    if let Some(session) = response.session_not_on_or_after {
        println!("Session not on or after: {}", lidingo_saml::format_instant(session));
    }
    for (name, value) in &response.attributes {
        println!("  {name} = {value}");
    }

    let Some(problems) = &validated.problems else {
        println!("OK");
        return Ok(());
    };
    let problem = if let Some(m) = &problems.bad_issuer {
        format!("issuer is {}, expected {}", m.actual, m.expected)
    } else if let Some(m) = &problems.bad_audience {
        format!("audience is {}, expected {}", m.actual, m.expected)
    } else if let Some(subject) = &problems.bad_subject_id {
        format!("subject {subject} is not an email address")
    } else if let Some(domain) = &problems.email_outside_domains {
        format!("email domain {domain} is not allowed")
    } else {
        "unspecified problem".to_owned()
    };
    Err(CliError::Rejected(format!("INVALID: {problem}")))
}

fn cmd_c14n(file: PathBuf, prefixes: String, output: Option<PathBuf>) -> Result<(), CliError> {
    let xml = read_file(&file)?;
    let prefixes = lidingo_c14n::parse_prefix_list(&prefixes);
    let canonical = lidingo_c14n::canonicalize_str(&xml, &prefixes)?;
    write_output(output, &canonical)
}

fn load_metadata(path: &Path) -> Result<Metadata, CliError> {
    let xml = read_file(path)?;
    Ok(lidingo_saml::parse_metadata(xml.as_bytes())?)
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn write_output(path: Option<PathBuf>, data: &[u8]) -> Result<(), CliError> {
    match path {
        Some(p) => std::fs::write(&p, data).map_err(|source| CliError::Io {
            path: p.display().to_string(),
            source,
        }),
        None => std::io::stdout().write_all(data).map_err(|source| CliError::Io {
            path: "<stdout>".to_owned(),
            source,
        }),
    }
}
