use anyhow::Context;
use clap::Parser;
use logcluster::anomaly::{detect_line_anomalies, AnomalyThresholds};
use logcluster::catalog::{ClusterCatalog, TemplateSummary};
use logcluster::{build_catalog, ClusterOpts, TemplateModel};
use regex::Regex;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::sync::Once;

fn init_parallelism() {
    static START: Once = Once::new();
    START.call_once(|| {
        let n = num_cpus::get();
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    });
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("logcluster=warn"));
    fmt().with_env_filter(filter).with_target(false).with_writer(io::stderr).init();
}

#[derive(Parser, Debug)]
#[command(name = "logcluster", version, about = "Discover log templates and score lines against them")]
struct Cli {
    /// Input files (`-` for stdin). May be repeated.
    #[arg(required = false)]
    input: Vec<String>,

    /// Print only a specific section: catalog | templates | scores | anomalies
    #[arg(long = "only", default_value = "catalog")]
    only: String,

    /// Max ratio of distinct values to lines for a position to be a split key
    #[arg(long = "threshold", default_value_t = logcluster::config::DEFAULT_THRESHOLD)]
    threshold: f64,
    /// Stop refining after this many rounds
    #[arg(long = "max-rounds")]
    max_rounds: Option<usize>,
    /// Refine groups on a single thread
    #[arg(long = "sequential", default_value_t = false)]
    sequential: bool,

    /// Catalog JSON from an earlier run, merged before clustering
    #[arg(long = "prior")]
    prior: Option<String>,
    /// Catalog JSON to score against (scores | anomalies)
    #[arg(long = "catalog")]
    catalog: Option<String>,
    /// Write the catalog here instead of stdout
    #[arg(long = "output", short = 'o')]
    output: Option<String>,
    /// Denominator for event probabilities; defaults to the catalog's line total
    #[arg(long = "total-lines")]
    total_lines: Option<usize>,

    // Template filters (when --only templates)
    #[arg(long = "format", default_value = "json")] format: String,
    #[arg(long = "match")] match_re: Option<String>,
    #[arg(long = "exclude")] exclude_re: Option<String>,
    #[arg(long = "min-count")] min_count: Option<usize>,
    #[arg(long = "top")] top: Option<usize>,

    // Anomaly thresholds (when --only anomalies)
    #[arg(long = "rare-event", default_value_t = 0.01)] rare_event: f64,
    #[arg(long = "rare-variables", default_value_t = 0.05)] rare_variables: f64,
}

fn read_all_lines(paths: &[String]) -> io::Result<Vec<String>> {
    let mut out = Vec::new();
    for p in paths {
        if p == "-" {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                out.push(line?);
            }
        } else {
            let r = BufReader::new(File::open(p)?);
            for line in r.lines() {
                out.push(line?);
            }
        }
    }
    Ok(out)
}

fn load_catalog(path: &str) -> anyhow::Result<ClusterCatalog> {
    let f = File::open(path).with_context(|| format!("opening catalog {path}"))?;
    ClusterCatalog::from_reader(BufReader::new(f)).with_context(|| format!("reading catalog {path}"))
}

fn main() -> anyhow::Result<()> {
    init_logging();
    init_parallelism();
    let cli = Cli::parse();

    let input_files = if cli.input.is_empty() { vec!["-".to_string()] } else { cli.input.clone() };
    let lines = read_all_lines(&input_files).context("reading input")?;
    tracing::debug!(lines = lines.len(), files = input_files.len(), "input loaded");

    let opts = ClusterOpts {
        threshold: cli.threshold,
        max_rounds: cli.max_rounds,
        parallel: !cli.sequential,
    };

    match cli.only.as_str() {
        "scores" | "anomalies" => {
            let path = cli.catalog.as_deref().context("--catalog is required to score lines")?;
            let mut model = TemplateModel::from_catalog(load_catalog(path)?);
            if let Some(total) = cli.total_lines {
                model = model.with_total_lines(total);
            }
            tracing::debug!(templates = model.catalog().len(), total_lines = model.total_lines(), "model loaded");
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            if cli.only == "scores" {
                for line in lines.iter().filter(|l| !l.trim().is_empty()) {
                    let scored = model.classify(line)?;
                    writeln!(out, "{}", serde_json::json!({"line": line, "score": scored}))?;
                }
            } else {
                let thresholds = AnomalyThresholds { rare_event: cli.rare_event, rare_variables: cli.rare_variables };
                for anomaly in detect_line_anomalies(&model, &lines, &thresholds)? {
                    writeln!(out, "{}", serde_json::to_string(&anomaly)?)?;
                }
            }
            out.flush()?;
        }
        "templates" => {
            let catalog = build(&cli, &lines, &opts)?;
            let mut summaries = catalog.summaries();
            if let Some(re) = &cli.match_re {
                let rx = Regex::new(re).context("invalid --match regex")?;
                summaries.retain(|s| rx.is_match(&s.template));
            }
            if let Some(re) = &cli.exclude_re {
                let rx = Regex::new(re).context("invalid --exclude regex")?;
                summaries.retain(|s| !rx.is_match(&s.template));
            }
            if let Some(mc) = cli.min_count { summaries.retain(|s| s.total_lines >= mc); }
            if let Some(top) = cli.top { summaries.truncate(top); }
            if cli.format == "table" {
                print_templates_table(&summaries);
            } else {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            }
        }
        "catalog" => {
            let catalog = build(&cli, &lines, &opts)?;
            match &cli.output {
                Some(path) => {
                    let f = File::create(path).with_context(|| format!("creating {path}"))?;
                    catalog.to_writer_pretty(BufWriter::new(f))?;
                    eprintln!("wrote {} templates to {}", catalog.len(), path);
                }
                None => println!("{}", serde_json::to_string_pretty(&catalog)?),
            }
        }
        other => anyhow::bail!("unknown section for --only: {other}"),
    }
    Ok(())
}

fn build(cli: &Cli, lines: &[String], opts: &ClusterOpts) -> anyhow::Result<ClusterCatalog> {
    let prior = match cli.prior.as_deref() {
        Some(path) => Some(load_catalog(path)?.prior_clusters()),
        None => None,
    };
    Ok(build_catalog(lines, prior.as_ref(), opts)?)
}

fn print_templates_table(summaries: &[TemplateSummary]) {
    println!("{:<8} {:<6} {:<6} {}", "Count", "Len", "Vars", "Template");
    for s in summaries {
        println!("{:<8} {:<6} {:<6} {}", s.total_lines, s.line_length, s.variable_count, s.template);
    }
}
