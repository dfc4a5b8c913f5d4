use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scamscope::{AnalysisOutcome, QuizExample, SuspiciousPhrase};
use scamscope_local::analyze::analyze_text;
use scamscope_local::annotate::{annotate_spans, render_annotated};
use scamscope_local::catalog::{self, COMPARISON_EXAMPLES, QUIZ_EXAMPLES};
use scamscope_local::extract::{self, ExtractError, ExtractedText};
use scamscope_local::present::render_outcome_text;
use scamscope_local::quiz::{quiz_risk_marker, QuizSession};
use scamscope_local::report::render_report_html;
use scamscope_local::{backend_for, http_client, shellout, Provider};
use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "scamscope")]
#[command(about = "Score text for scam, misinformation and manipulation risk", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze text (from --text, --file, or stdin) with the configured model.
    Analyze(AnalyzeCmd),
    /// Render the annotated HTML view for a text and a phrase list (offline).
    Highlight(HighlightCmd),
    /// Extract text from a PDF, DOCX, image or .txt file.
    Extract(ExtractCmd),
    /// Interactive phrase-spotting quiz.
    Quiz(QuizCmd),
    /// Show a suspicious message next to its legitimate counterpart.
    Compare(CompareCmd),
    /// Print the red-flags guide.
    Guide(GuideCmd),
    /// Diagnose configuration and local tools (json; no secrets).
    Doctor(DoctorCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct AnalyzeCmd {
    /// Text to analyze. If neither --text nor --file is given, stdin is read.
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,
    /// File to extract text from before analysis.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Declared MIME type of --file (otherwise inferred from the extension).
    #[arg(long)]
    mime: Option<String>,
    /// Output format: text|json|html
    #[arg(long = "output", alias = "format", default_value = "text")]
    output: String,
    /// Write the output here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Model provider: gemini|openai-compat (default: gemini).
    #[arg(long, env = "SCAMSCOPE_PROVIDER")]
    provider: Option<String>,
    /// Model name override.
    #[arg(long)]
    model: Option<String>,
    /// Request timeout override (ms).
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(clap::Args, Debug)]
struct HighlightCmd {
    /// Text to annotate. If omitted, stdin is read.
    #[arg(long)]
    text: Option<String>,
    /// Phrase list: inline JSON (`[{"phrase": "...", "reason": "..."}]`) or a path to a JSON file.
    /// A full analysis report (`suspicious_phrases` field) is accepted too.
    #[arg(long)]
    phrases: String,
    /// Output format: html|json (json lists the kept highlight spans)
    #[arg(long = "output", alias = "format", default_value = "html")]
    output: String,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct ExtractCmd {
    #[arg(long)]
    file: PathBuf,
    #[arg(long)]
    mime: Option<String>,
    /// Output format: text|json
    #[arg(long = "output", alias = "format", default_value = "text")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct QuizCmd {
    /// Start with this quiz example (1-5) instead of a random one.
    #[arg(long)]
    id: Option<u32>,
}

#[derive(clap::Args, Debug)]
struct CompareCmd {
    /// Scenario id; omit to list scenarios.
    #[arg(long)]
    scenario: Option<u32>,
    /// Output format: text|json
    #[arg(long = "output", alias = "format", default_value = "text")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct GuideCmd {
    /// Output format: text|json
    #[arg(long = "output", alias = "format", default_value = "text")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct DoctorCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

fn emit(out: Option<&Path>, s: &str) -> Result<()> {
    match out {
        Some(p) => {
            std::fs::write(p, s).with_context(|| format!("writing {}", p.display()))?;
            eprintln!("wrote {}", p.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(s.as_bytes())?;
            if !s.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut s = String::new();
    std::io::stdin()
        .read_to_string(&mut s)
        .context("reading stdin")?;
    Ok(s)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn extract_file(
    path: &Path,
    mime: Option<&str>,
) -> Result<std::result::Result<ExtractedText, ExtractError>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = file_name(path);
    let mime = mime.map(str::to_string);

    // Extraction may shell out to local tools; keep it off the async workers.
    let (bytes, name, local) = tokio::task::spawn_blocking(move || {
        let local = extract::extract_text(&bytes, &name, mime.as_deref());
        (bytes, name, local)
    })
    .await
    .context("extraction task")?;

    #[cfg(feature = "vision-gemini")]
    {
        if matches!(local, Err(ExtractError::Ocr(_))) {
            if let Some(g) = http_client()
                .ok()
                .and_then(|c| scamscope_local::gemini::GeminiClient::from_env(c, None).ok())
            {
                return Ok(extract::vision_fallback(&g, local, &bytes, &name).await);
            }
        }
    }
    #[cfg(not(feature = "vision-gemini"))]
    let _ = (bytes, name);

    Ok(local)
}

fn parse_phrases(arg: &str) -> Result<Vec<SuspiciousPhrase>> {
    let raw = if arg.trim_start().starts_with(['[', '{']) {
        arg.to_string()
    } else {
        std::fs::read_to_string(arg).with_context(|| format!("reading phrases file {arg}"))?
    };
    let v: serde_json::Value = serde_json::from_str(&raw).context("phrases must be JSON")?;
    let list = match v {
        serde_json::Value::Object(mut m) => m
            .remove("suspicious_phrases")
            .or_else(|| {
                m.remove("data").and_then(|mut d| {
                    d.get_mut("suspicious_phrases")
                        .map(serde_json::Value::take)
                })
            })
            .unwrap_or(serde_json::Value::Array(Vec::new())),
        other => other,
    };
    serde_json::from_value(list).context("phrases must be a list of {phrase, reason}")
}

fn clock_index(len: usize) -> usize {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as usize;
    nanos % len.max(1)
}

fn pick_quiz(avoid: Option<u32>) -> &'static QuizExample {
    let mut i = clock_index(QUIZ_EXAMPLES.len());
    if QUIZ_EXAMPLES.len() > 1 && avoid == Some(QUIZ_EXAMPLES[i].id) {
        i = (i + 1) % QUIZ_EXAMPLES.len();
    }
    &QUIZ_EXAMPLES[i]
}

fn print_quiz<W: Write>(out: &mut W, s: &QuizSession) -> std::io::Result<()> {
    let Some(q) = s.active() else {
        return Ok(());
    };
    writeln!(out)?;
    writeln!(out, "📂 Category: {}", q.category)?;
    writeln!(
        out,
        "{} Risk Level: {}/100",
        quiz_risk_marker(q.risk_score),
        q.risk_score
    )?;
    writeln!(out, "📝 Message to analyze:")?;
    let words: Vec<String> = s
        .words()
        .iter()
        .enumerate()
        .map(|(i, w)| format!("[{}]{w}", i + 1))
        .collect();
    writeln!(out, "  {}", words.join(" "))?;
    writeln!(
        out,
        "Type word numbers to toggle (e.g. `3 7`), `r` to reveal, `q` to quit."
    )?;
    Ok(())
}

/// Drive a quiz over line-oriented input. Returns the finished session.
fn run_quiz<R: BufRead, W: Write>(
    input: R,
    out: &mut W,
    first: &'static QuizExample,
) -> Result<QuizSession> {
    let mut s = QuizSession::new();
    s.start(first);
    writeln!(out, "🎯 Test your scam detection skills!")?;
    print_quiz(out, &s)?;

    for line in input.lines() {
        let line = line?;
        let cmd = line.trim();
        match cmd {
            "" => continue,
            "q" | "quit" | "exit" => break,
            "r" | "reveal" => match s.reveal() {
                Ok(score) => {
                    writeln!(
                        out,
                        "{} You identified {}/{} suspicious phrases ({:.0}%)",
                        score.verdict.headline(),
                        score.correct,
                        score.total,
                        score.percent
                    )?;
                    writeln!(out, "🚩 All suspicious phrases:")?;
                    for (i, p) in score.phrases.iter().enumerate() {
                        let icon = if p.was_selected { "✅" } else { "❌" };
                        writeln!(out, "  {icon} {}. \"{}\"", i + 1, p.phrase)?;
                        writeln!(out, "      {}", p.reason)?;
                    }
                    writeln!(out, "Type `n` for another quiz or `q` to quit.")?;
                }
                Err(e) => writeln!(out, "{e}")?,
            },
            "n" | "next" => {
                let current = s.active().map(|q| q.id);
                s.next(pick_quiz(current));
                print_quiz(out, &s)?;
            }
            _ => {
                for tok in cmd.split_whitespace() {
                    let res = tok
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n >= 1)
                        .ok_or_else(|| {
                            scamscope::Error::Quiz(format!("not a word number: {tok}"))
                        })
                        .and_then(|n| s.toggle_word(n - 1));
                    match res {
                        Ok((sel, true)) => writeln!(out, "  + {sel}")?,
                        Ok((sel, false)) => writeln!(out, "  - {sel}")?,
                        Err(e) => writeln!(out, "  {e}")?,
                    }
                }
                if !s.selections().is_empty() {
                    writeln!(out, "✅ Your selections: {}", s.selections().join(" | "))?;
                }
            }
        }
    }

    if let Some(avg) = s.average_percent() {
        writeln!(
            out,
            "🎯 Quizzes completed: {} | Average score: {avg:.0}%",
            s.quizzes_taken()
        )?;
    }
    s.exit();
    Ok(s)
}

fn comparison_text(c: &scamscope::ComparisonExample) -> String {
    let mut out = format!("🔄 Spot the Difference: {}\n\n", c.category);
    out.push_str(&format!("❌ Suspicious version:\n  {}\n\n", c.suspicious));
    out.push_str(&format!("✅ Legitimate version:\n  {}\n\n", c.legitimate));
    out.push_str("🔍 Key differences:\n");
    for (i, d) in c.differences.iter().enumerate() {
        out.push_str(&format!("  📌 {}. {}\n", i + 1, d.point));
        out.push_str(&format!("      ❌ {}\n", d.suspicious_detail));
        out.push_str(&format!("      ✅ {}\n", d.legitimate_detail));
    }
    out.push_str(&format!("\n💡 {}\n", catalog::COMPARISON_TAKEAWAY));
    out
}

fn init_tracing() {
    // Logs go to stderr; stdout carries command output.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scamscope=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Process env wins over `.env`; `SCAMSCOPE_DOTENV=0` disables the lookup.
    if std::env::var("SCAMSCOPE_DOTENV").map_or(true, |v| v.trim() != "0") {
        let _ = dotenvy::dotenv();
    }
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => {
            let text = if let Some(t) = args.text {
                t
            } else if let Some(path) = &args.file {
                match extract_file(path, args.mime.as_deref()).await? {
                    Ok(x) => {
                        eprintln!(
                            "✅ Extracted {} characters from {} ({})",
                            x.text.chars().count(),
                            file_name(path),
                            x.engine
                        );
                        x.text
                    }
                    Err(e) => anyhow::bail!("{e}"),
                }
            } else {
                read_stdin()?
            };
            tracing::debug!(input_chars = text.chars().count(), "analysis input ready");

            let provider = match &args.provider {
                Some(p) => Provider::parse(p)?,
                None => Provider::from_env()?,
            };
            let outcome = match backend_for(provider, http_client()?, args.model, args.timeout_ms)
            {
                Ok(backend) => analyze_text(backend.as_ref(), &text).await,
                Err(e) => AnalysisOutcome::failure(e.to_string()),
            };

            let rendered = match args.output.to_ascii_lowercase().as_str() {
                "json" => serde_json::to_string_pretty(&outcome)?,
                "html" => render_report_html(&outcome, &text),
                _ => render_outcome_text(&outcome),
            };
            emit(args.out.as_deref(), &rendered)?;
        }
        Commands::Highlight(args) => {
            let text = match args.text {
                Some(t) => t,
                None => read_stdin()?,
            };
            let phrases = parse_phrases(&args.phrases)?;
            let rendered = match args.output.to_ascii_lowercase().as_str() {
                "json" => serde_json::to_string_pretty(&serde_json::json!({
                    "spans": annotate_spans(&text, &phrases),
                }))?,
                _ => render_annotated(&text, &phrases),
            };
            emit(args.out.as_deref(), &rendered)?;
        }
        Commands::Extract(args) => {
            let json = args.output.eq_ignore_ascii_case("json");
            match extract_file(&args.file, args.mime.as_deref()).await? {
                Ok(x) => {
                    if json {
                        println!(
                            "{}",
                            serde_json::json!({
                                "ok": true,
                                "kind": x.kind,
                                "engine": x.engine,
                                "chars": x.text.chars().count(),
                                "warnings": x.warnings,
                                "text": x.text,
                            })
                        );
                    } else {
                        println!("{}", x.text);
                    }
                }
                Err(e) => {
                    if json {
                        println!(
                            "{}",
                            serde_json::json!({
                                "ok": false,
                                "error": {"code": e.code(), "message": e.to_string()},
                            })
                        );
                    }
                    anyhow::bail!("{e}");
                }
            }
        }
        Commands::Quiz(args) => {
            let first = match args.id {
                Some(id) => catalog::quiz_by_id(id).ok_or_else(|| {
                    anyhow::anyhow!(
                        "no quiz with id {id} (available: 1-{})",
                        QUIZ_EXAMPLES.len()
                    )
                })?,
                None => pick_quiz(None),
            };
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            run_quiz(stdin.lock(), &mut stdout, first)?;
        }
        Commands::Compare(args) => {
            let json = args.output.eq_ignore_ascii_case("json");
            match args.scenario {
                None => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(COMPARISON_EXAMPLES)?);
                    } else {
                        println!("Choose a scenario with --scenario <id>:");
                        for c in COMPARISON_EXAMPLES {
                            println!("  {}. {}", c.id, c.category);
                        }
                    }
                }
                Some(id) => {
                    let c = catalog::comparison_by_id(id)
                        .ok_or_else(|| anyhow::anyhow!("no comparison scenario with id {id}"))?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(c)?);
                    } else {
                        print!("{}", comparison_text(c));
                    }
                }
            }
        }
        Commands::Guide(args) => {
            if args.output.eq_ignore_ascii_case("json") {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "red_flags": catalog::RED_FLAG_GUIDE,
                        "safety_steps": catalog::SAFETY_STEPS,
                        "report": catalog::REPORTING_LINKS,
                    }))?
                );
            } else {
                print!("{}", catalog::guide_text());
            }
        }
        Commands::Doctor(args) => {
            fn has_env(k: &str) -> bool {
                std::env::var(k).ok().is_some_and(|v| !v.trim().is_empty())
            }

            let t0 = std::time::Instant::now();

            // Env presence (booleans only; never print values).
            let gemini_configured = has_env("SCAMSCOPE_GEMINI_API_KEY")
                || has_env("GEMINI_API_KEY")
                || has_env("GOOGLE_API_KEY");
            let openai_compat_configured = has_env("SCAMSCOPE_OPENAI_COMPAT_BASE_URL");
            let (provider, provider_error) = match Provider::from_env() {
                Ok(p) => (Some(p.as_str()), None),
                Err(e) => (None, Some(e.to_string())),
            };
            let provider_ready = match provider {
                Some("gemini") => gemini_configured,
                Some(_) => openai_compat_configured,
                None => false,
            };

            let tools = serde_json::json!({
                "tesseract": shellout::has("tesseract"),
                "pdftotext": shellout::has("pdftotext"),
                "mutool": shellout::has("mutool"),
                "pandoc": shellout::has("pandoc"),
            });
            let payload = serde_json::json!({
                "schema_version": 1,
                "kind": "doctor",
                "ok": provider_ready,
                "name": "scamscope",
                "version": env!("CARGO_PKG_VERSION"),
                "provider": provider,
                "provider_error": provider_error,
                "configured": {
                    "gemini": gemini_configured,
                    "openai_compat": openai_compat_configured,
                },
                "gemini_model": scamscope_local::gemini::gemini_model_from_env(),
                "modes": {
                    "ocr": shellout::ocr_mode_from_env().as_str(),
                    "pandoc": shellout::pandoc_mode_from_env().as_str(),
                    "pdf_shellout": shellout::pdf_shellout_mode_from_env().as_str(),
                },
                "tools": tools,
                "features": {
                    "vision_gemini": cfg!(feature = "vision-gemini"),
                },
                "elapsed_ms": t0.elapsed().as_millis() as u64,
            });

            match args.output.to_ascii_lowercase().as_str() {
                "text" => {
                    println!("scamscope {}", env!("CARGO_PKG_VERSION"));
                    println!(
                        "provider: {} ({})",
                        provider.unwrap_or("invalid"),
                        if provider_ready { "ready" } else { "not configured" }
                    );
                    if let Some(e) = &provider_error {
                        println!("  {e}");
                    }
                    println!("gemini key: {}", if gemini_configured { "set" } else { "missing" });
                    println!(
                        "openai-compat base url: {}",
                        if openai_compat_configured { "set" } else { "missing" }
                    );
                    for t in ["tesseract", "pdftotext", "mutool", "pandoc"] {
                        let ok = payload["tools"][t].as_bool().unwrap_or(false);
                        println!("{t}: {}", if ok { "found" } else { "not found" });
                    }
                }
                _ => println!("{payload}"),
            }
        }
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "ok": true,
                "name": "scamscope",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("scamscope {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{}", v),
            }
        }
    }

    Ok(())
}
