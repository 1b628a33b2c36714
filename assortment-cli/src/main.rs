//! `assortment`: batch driver for store geometry repair and assortment
//! generation.
//!
//! Each subcommand reads JSON inputs, runs one stage and writes its outputs.
//! Set `RUST_LOG=info` (or `debug`) for per-pass logging.

use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use chrono::Utc;
use clap::{Parser, Subcommand};

use assortment_core::{AssortmentResult, Config};
use assortment_pipeline::dataset_index::DatasetIndex;
use assortment_pipeline::generation::generate_assortments;
use assortment_pipeline::loader::{
    load_assortments_file, load_stores_file, load_templates_file, write_assortment_csv_file,
    write_json, write_text,
};
use assortment_pipeline::pipelines::geo_repair::GeoRepairPipeline;
use assortment_pipeline::report::{generation_summary, geo_summary, validation_report};
use assortment_pipeline::schema::StoreSnapshot;

#[derive(Parser, Debug)]
#[command(name = "assortment")]
#[command(about = "Store geometry repair and store-seeded assortment generation")]
struct Args {
    /// JSON config file; missing sections fall back to built-in defaults
    #[arg(long, global = true, env = "ASSORTMENT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cluster, space, and recompute competition and context for a store file
    Repair {
        /// Input store snapshot (v1 array or versioned envelope)
        #[arg(long)]
        stores: PathBuf,
        /// Output store snapshot (current schema)
        #[arg(long)]
        out: PathBuf,
        /// Optional Markdown geometry summary
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Generate one assortment per store from its retailer/format template
    Assort {
        #[arg(long)]
        stores: PathBuf,
        #[arg(long)]
        templates: PathBuf,
        /// Output assortments JSON
        #[arg(long)]
        out: PathBuf,
        /// Optional CSV summary, one row per store
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Optional Markdown run summary
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Write the validation report for a set of generated assortments
    Validate {
        #[arg(long)]
        assortments: PathBuf,
        #[arg(long)]
        templates: PathBuf,
        /// Report path; printed to stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rewrite a store file in the current schema version
    Migrate {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print catalog, performance and listing opportunities for one store
    Inspect {
        #[arg(long)]
        stores: PathBuf,
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        performance: PathBuf,
        #[arg(long)]
        opportunities: PathBuf,
        /// Store to inspect
        #[arg(long)]
        store: String,
        /// Measure to read for the store (unsegmented)
        #[arg(long, default_value = "sales_value")]
        measure: String,
        /// Number of opportunities to print
        #[arg(long, default_value = "10")]
        top: usize,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let started = Instant::now();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    log::info!("finished in {}ms", started.elapsed().as_millis());
}

fn run(args: Args) -> AssortmentResult<()> {
    let config = load_config(args.config.as_deref())?;
    let generated_at = Utc::now().to_rfc3339();

    match args.command {
        Command::Repair {
            stores,
            out,
            summary,
        } => {
            let (snapshot, _) = load_stores_file(&stores)?;
            let result = GeoRepairPipeline::new(&config).run(&snapshot.stores)?;
            for pass in &result.passes {
                println!(
                    "  {:20} {:>8}  {} stores changed",
                    pass.name,
                    if pass.enabled { "ran" } else { "skipped" },
                    pass.changed
                );
            }
            if let Some(path) = summary {
                write_text(&path, &geo_summary(&result.stores, &generated_at))?;
            }
            write_json(&out, &StoreSnapshot::new(result.stores, Some(generated_at)))?;
            println!("  wrote {}", out.display());
        }

        Command::Assort {
            stores,
            templates,
            out,
            csv,
            summary,
        } => {
            let (snapshot, _) = load_stores_file(&stores)?;
            let repo = load_templates_file(&templates)?.with_tier3_children(&config.tier3_parents);
            let run = generate_assortments(
                &snapshot.stores,
                &repo,
                &config.brand_tiers,
                &config.variation,
            );
            write_json(&out, &run.assortments)?;
            if let Some(path) = csv {
                write_assortment_csv_file(&path, &run.assortments)?;
            }
            if let Some(path) = summary {
                write_text(&path, &generation_summary(&run, &generated_at))?;
            }
            println!(
                "  {} assortments  \u{00b7}  {} aspirational  \u{00b7}  avg variation {:.2}%  \u{00b7}  {} stores without template",
                run.assortments.len(),
                run.aspirational_count(),
                run.average_variation_pct(),
                run.missing_template.len()
            );
        }

        Command::Validate {
            assortments,
            templates,
            out,
        } => {
            let assortments = load_assortments_file(&assortments)?;
            let repo = load_templates_file(&templates)?.with_tier3_children(&config.tier3_parents);
            let report = validation_report(&assortments, &repo, &config, &generated_at);
            match out {
                Some(path) => {
                    write_text(&path, &report)?;
                    println!("  wrote {}", path.display());
                }
                None => print!("{}", report),
            }
        }

        Command::Migrate { input, out } => {
            let (snapshot, report) = load_stores_file(&input)?;
            match report {
                Some(r) => println!(
                    "  migrated {} stores from v{} (missions dropped on {}, catchment on {})",
                    r.records, r.from_version, r.dropped_missions, r.dropped_catchment
                ),
                None => println!("  {} stores already current", snapshot.stores.len()),
            }
            write_json(&out, &StoreSnapshot::new(snapshot.stores, Some(generated_at)))?;
        }

        Command::Inspect {
            stores,
            catalog,
            performance,
            opportunities,
            store,
            measure,
            top,
        } => {
            let (snapshot, _) = load_stores_file(&stores)?;
            let index = DatasetIndex::load(
                snapshot.stores,
                &catalog,
                &performance,
                &opportunities,
            )?;
            print_store(&index, &store, &measure, top);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> AssortmentResult<Config> {
    match path {
        Some(p) => {
            log::info!("loading config from {}", p.display());
            Config::from_file(p)
        }
        None => Ok(Config::default()),
    }
}

fn print_store(index: &DatasetIndex, store_id: &str, measure: &str, top: usize) {
    let Some(store) = index.get_store(store_id) else {
        println!("  no store {} among {} stores", store_id, index.store_count());
        return;
    };

    println!();
    println!(
        "  {}  {} {}  ({})",
        store.store_id, store.retailer, store.format, store.region
    );
    if let Some(context) = store.store_context {
        println!("  context: {}", context);
    }
    if let Some(cluster) = &store.cluster_id {
        println!("  cluster: {}", cluster);
    }
    println!("  competitors nearby: {}", store.nearby_competition.len());

    match index.get_measure_value(store_id, measure, None, None) {
        Some(value) => println!("  {}: {:.2}", measure, value),
        None => println!("  {}: n/a", measure),
    }
    println!(
        "  performance records: {}",
        index.get_performance_by_store(store_id).len()
    );

    let opportunities = index.get_listing_opportunities(store_id);
    if opportunities.is_empty() {
        println!("  no listing opportunities");
        return;
    }
    println!();
    println!("  {:\u{2500}<64}", "");
    for (i, o) in opportunities.iter().take(top).enumerate() {
        let name = index
            .get_sku(&o.sku_id)
            .map(|s| s.name.as_str())
            .unwrap_or("");
        println!(
            "  {:>2}. {:8} {:12} {:30} uplift {:.0}",
            i + 1,
            o.priority.to_string(),
            o.sku_id,
            name,
            o.estimated_uplift
        );
    }
    println!("  {:\u{2500}<64}", "");
}
