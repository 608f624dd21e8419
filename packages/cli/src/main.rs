//! `vibecheck`: run the verification pipeline from the command line.
//!
//! Subcommands:
//!
//! - **`verify`**: classify every claim in a text (needs a model credential).
//! - **`citation`**: look up one paper in the academic index.
//! - **`check-url`**: probe one URL for existence.
//! - **`fetch`**: download one URL and print its extracted text.
//! - **`extract`**: list the URLs found in a text.
//!
//! `verify` and `extract` read from a file path or from stdin (`-`).

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use vibecheck::{
    describe_validation, extract_urls, ContentFetcher, VerificationReport, Verifier,
    VerifierConfig,
};

/// vibecheck: detect hallucinated facts, citations and URLs
#[derive(Parser)]
#[command(name = "vibecheck", version, about, long_about = None)]
struct Cli {
    /// Log more (-v info, -vv debug). Logs go to stderr.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Command {
    /// Verify every claim in a text.
    ///
    /// Exits 1 when any claim is a hallucination or a broken URL.
    ///
    /// Pass `-` as FILE to read from stdin.
    Verify {
        /// Path to a text file, or `-` for stdin.
        file: PathBuf,

        /// Model API key. Falls back to GEMINI_API_KEY, GOOGLE_API_KEY, then
        /// the project credential.
        #[arg(long, env = "VIBECHECK_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Look up a paper by title in the academic index.
    ///
    /// Prints the lookup record as JSON. Exits 1 when nothing matches.
    Citation {
        title: String,

        /// Author last name to check against the match.
        #[arg(short, long)]
        author: Option<String>,
    },

    /// Check whether a URL exists and is reachable.
    ///
    /// Exits 1 when the URL is malformed or broken.
    CheckUrl { url: String },

    /// Download a URL and print its extracted text.
    Fetch {
        url: String,

        /// Character budget for the extracted text.
        #[arg(long, value_name = "N", default_value_t = vibecheck::content::DEFAULT_MAX_CHARS)]
        max_chars: usize,
    },

    /// List the URLs found in a text, one per line.
    ///
    /// Pass `-` as FILE to read from stdin.
    Extract { file: PathBuf },
}

#[tokio::main]
async fn main() {
    let _ = dotenv::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(log_filter(cli.verbose))
        .init();

    let config = VerifierConfig::from_env();

    match cli.command {
        Command::Verify {
            file,
            api_key,
            format,
        } => {
            let text = read_input(&file);
            let verifier = build_verifier(&config);
            let report = verifier
                .verify(&text, api_key.as_deref())
                .await
                .unwrap_or_else(|e| fatal(&e.to_string()));

            match format {
                Format::Json => println!("{}", to_json(&report)),
                Format::Text => print!("{}", render_report(&report)),
            }
            if report.claims.iter().any(|c| c.status.is_problem()) {
                process::exit(1);
            }
        }

        Command::Citation { title, author } => {
            let verifier = build_verifier(&config);
            let record = verifier.scholar().verify_paper(&title, author.as_deref()).await;
            println!("{}", to_json(&record));
            if !record.found {
                process::exit(1);
            }
        }

        Command::CheckUrl { url } => {
            let verifier = build_verifier(&config);
            let validation = verifier.validator().check(&url).await;
            println!("{}", describe_validation(&validation));
            if !validation.is_accessible {
                process::exit(1);
            }
        }

        Command::Fetch { url, max_chars } => {
            let fetcher = ContentFetcher::new()
                .unwrap_or_else(|e| fatal(&format!("failed to build HTTP client: {e}")))
                .max_chars(max_chars);
            let content = fetcher.fetch(&url).await;
            if !content.success {
                fatal(content.error.as_deref().unwrap_or("fetch failed"));
            }
            if let Some(title) = &content.title {
                println!("# {title}\n");
            }
            println!("{}", content.content.unwrap_or_default());
        }

        Command::Extract { file } => {
            for url in extract_urls(&read_input(&file)) {
                println!("{url}");
            }
        }
    }
}

fn log_filter(verbose: u8) -> tracing_subscriber::EnvFilter {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("vibecheck={level},vibecheck_cli={level}").into())
}

fn build_verifier(config: &VerifierConfig) -> Verifier {
    Verifier::from_config(config).unwrap_or_else(|e| fatal(&e.to_string()))
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| fatal(&format!("failed to serialise output: {e}")))
}

/// Human-readable report: one block per claim, then a per-status tally.
fn render_report(report: &VerificationReport) -> String {
    let mut out = String::new();
    if report.is_empty() {
        out.push_str("no claims found\n");
        return out;
    }

    for claim in &report.claims {
        let _ = writeln!(
            out,
            "[{}] ({}, {}%) {}",
            claim.status, claim.claim_type, claim.confidence_score, claim.original_text
        );
        let _ = writeln!(out, "    reasoning: {}", claim.reasoning);
        if let Some(correction) = &claim.correction {
            let _ = writeln!(out, "    correction: {correction}");
        }
        if let Some(source) = &claim.source_url {
            let _ = writeln!(out, "    source: {source}");
        }
    }

    let tally = report
        .status_counts()
        .into_iter()
        .map(|(status, n)| format!("{status}: {n}"))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "\n{} claims ({tally})", report.claims.len());
    out
}

/// Read the full contents of a file, or stdin when the path is `"-"`.
fn read_input(path: &PathBuf) -> String {
    if path.to_str() == Some("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .unwrap_or_else(|e| fatal(&format!("failed to read stdin: {e}")));
        buf
    } else {
        fs::read_to_string(path)
            .unwrap_or_else(|e| fatal(&format!("failed to read {}: {e}", path.display())))
    }
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("vibecheck: {msg}");
    process::exit(2);
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibecheck::{ClaimAnalysis, ClaimStatus, ClaimType};

    fn claim(status: ClaimStatus, correction: Option<&str>) -> ClaimAnalysis {
        ClaimAnalysis {
            original_text: "The moon is made of green cheese.".into(),
            claim_type: ClaimType::Fact,
            status,
            reasoning: "It is rock.".into(),
            correction: correction.map(Into::into),
            source_url: None,
            confidence_score: 90,
        }
    }

    #[test]
    fn text_report_lists_claims_and_tally() {
        let report = VerificationReport {
            claims: vec![
                claim(ClaimStatus::Hallucination, Some("The moon is made of rock.")),
                claim(ClaimStatus::Opinion, None),
                claim(ClaimStatus::Hallucination, Some("The moon is made of rock.")),
            ],
        };
        let text = render_report(&report);
        assert!(text.starts_with("[HALLUCINATION] (FACT, 90%) The moon is made of green cheese.\n"));
        assert!(text.contains("    correction: The moon is made of rock.\n"));
        assert!(text.ends_with("3 claims (HALLUCINATION: 2, OPINION: 1)\n"));
    }

    #[test]
    fn empty_report_says_so() {
        assert_eq!(render_report(&VerificationReport::empty()), "no claims found\n");
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["vibecheck", "-vv", "citation", "Attention", "--author", "Vaswani"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Command::Citation { ref title, author: Some(ref a) } if title == "Attention" && a == "Vaswani"
        ));

        let cli = Cli::try_parse_from(["vibecheck", "verify", "-", "--format", "json"]).unwrap();
        assert!(matches!(cli.command, Command::Verify { format: Format::Json, .. }));
    }
}
