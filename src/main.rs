use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use answerfmt::{ChatError, ChatSession, Config, GeminiClient, GeminiSettings, OutputFormat, Section};

#[derive(Parser)]
#[command(name = "answerfmt")]
#[command(about = "Ask Gemini questions and read structured answers")]
struct Cli {
    /// Config file
    #[arg(short, long, global = true, default_value = "answerfmt.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format (overrides the config file)
    #[arg(short, long, global = true, value_enum)]
    format: Option<FormatArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat; one prompt per line, `/quit` to leave
    Chat {
        /// Write the transcript as PDF on exit
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
    /// Ask a single question
    Ask {
        /// Prompt text
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,

        /// Also write the answer as PDF
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
    /// Format an existing answer without calling the model
    Format {
        /// Input file (reads stdin when omitted)
        input: Option<PathBuf>,

        /// Also write the result as PDF
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(&cli.config);
    let output = cli.format.map(OutputFormat::from).unwrap_or(config.render.format);

    match cli.command {
        Command::Chat { pdf } => chat(&config, pdf.as_deref()).await,
        Command::Ask { prompt, pdf } => ask(&config, &prompt.join(" "), output, pdf.as_deref()).await,
        Command::Format { input, pdf } => format_input(input.as_deref(), output, pdf.as_deref()),
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();
}

fn session(config: &Config) -> Result<ChatSession<GeminiClient>> {
    let client = GeminiClient::new(GeminiSettings::from(&config.model))
        .context("failed to set up Gemini client")?;
    Ok(ChatSession::new(client))
}

fn print_sections(sections: &[Section], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Text => println!("{}", answerfmt::render_sections(sections)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(sections)?),
    }
    Ok(())
}

fn write_pdf(path: &Path, bytes: Vec<u8>) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Error writing {}", path.display()))?;
    eprintln!("Created {}", path.display());
    Ok(())
}

async fn ask(config: &Config, prompt: &str, output: OutputFormat, pdf: Option<&Path>) -> Result<()> {
    let mut session = session(config)?;
    let reply = session
        .submit(prompt)
        .await
        .context("Failed to generate answer")?;

    print_sections(&reply.sections, output)?;

    if let Some(path) = pdf {
        write_pdf(path, answerfmt::sections_to_pdf(&reply.sections)?)?;
    }
    Ok(())
}

async fn chat(config: &Config, pdf: Option<&Path>) -> Result<()> {
    let mut session = session(config)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    eprintln!("Ask me anything. Enter to send, /quit to leave.");
    loop {
        eprint!("> ");
        io::stderr().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            _ => {}
        }

        eprintln!("Generating...");
        match session.submit(&line).await {
            Ok(reply) => {
                println!("{}", answerfmt::render_message(&reply.message));
                println!();
            }
            Err(ChatError::EmptyPrompt) => {}
            Err(e) => eprintln!("Failed to generate answer: {e}"),
        }
    }

    if let Some(path) = pdf {
        if session.conversation().is_empty() {
            eprintln!("Nothing to export");
        } else {
            write_pdf(path, answerfmt::conversation_to_pdf(session.conversation())?)?;
        }
    }
    Ok(())
}

fn format_input(input: Option<&Path>, output: OutputFormat, pdf: Option<&Path>) -> Result<()> {
    let text = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Error reading {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Error reading stdin")?;
            text
        }
    };

    let sections = answerfmt::format(&text);
    print_sections(&sections, output)?;

    if let Some(path) = pdf {
        write_pdf(path, answerfmt::sections_to_pdf(&sections)?)?;
    }
    Ok(())
}
