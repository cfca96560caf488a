use clap::Parser;
use sjs2mod::iff::SampleRecord;
use sjs2mod::protracker::{self, ModWriter, Sample};
use sjs2mod::{leveldata, sjs, Converter, SjsModule};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sjs2mod")]
#[command(version = "0.1.0")]
#[command(about = "SJS to MOD converter", long_about = None)]
struct Args {
    /// Input SJS module
    module: PathBuf,

    /// Output MOD file (dumps the SJS module if not specified)
    output: Option<PathBuf>,

    /// Leveldata file listing the module's samples (default: beside the module)
    #[arg(short, long)]
    leveldata: Option<PathBuf>,

    /// Module title (default: the module's file name)
    #[arg(short, long)]
    title: Option<String>,

    /// Also dump the converted module
    #[arg(short, long)]
    dump: bool,

    /// Log translation details
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), sjs2mod::Error> {
    let args = Args::parse();

    // RUST_LOG wins over -v
    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .init();

    let data = std::fs::read(&args.module)?;
    let module = SjsModule::parse(&data)?;

    let Some(output) = &args.output else {
        let mut stdout = io::stdout().lock();
        sjs::dump::dump(&module, &mut stdout)?;
        stdout.flush()?;
        return Ok(());
    };

    let module_name = args
        .module
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let module_dir = args
        .module
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let leveldata_path = args
        .leveldata
        .clone()
        .unwrap_or_else(|| module_dir.join("leveldata"));

    let samples = load_samples(&leveldata_path, &module_dir, &module_name)?;

    tracing::info!("Converting {:?} -> {:?}", args.module, output);

    let mut mod_module = Converter::new(&module).convert(&samples)?;
    mod_module.set_title(args.title.as_deref().unwrap_or(&module_name));

    if args.dump {
        let mut stdout = io::stdout().lock();
        protracker::dump::dump(&mod_module, &mut stdout)?;
        stdout.flush()?;
    }

    ModWriter::new(&mod_module).save(output)?;

    tracing::info!(
        "Wrote {} patterns, {} orders",
        mod_module.patterns.len(),
        mod_module.pattern_table().len()
    );

    Ok(())
}

/// Load the samples leveldata lists for `module_name`
///
/// Missing files leave their slots empty; the module still converts.
fn load_samples(
    leveldata_path: &Path,
    sample_dir: &Path,
    module_name: &str,
) -> Result<Vec<Option<Sample>>, sjs2mod::Error> {
    let mut samples = vec![None; leveldata::SAMPLES_PER_MODULE];

    if !leveldata_path.exists() {
        tracing::warn!("cannot determine samples: missing {:?}", leveldata_path);
        return Ok(samples);
    }

    let table = std::fs::read(leveldata_path)?;
    let Some(names) = leveldata::sample_names(&table, module_name)? else {
        tracing::warn!("cannot determine samples: no entry for {} in leveldata", module_name);
        return Ok(samples);
    };

    for (slot, name) in samples.iter_mut().zip(names.iter()) {
        let Some(name) = name else {
            continue;
        };

        let path = sample_dir.join(name);
        if !path.exists() {
            tracing::warn!("missing sample {:?}", name);
            continue;
        }

        let mut sample = SampleRecord::load(&path)?.to_protracker()?;
        sample.set_name(name);
        tracing::debug!("sample {:?}: {} bytes", name, sample.data().len());
        *slot = Some(sample);
    }

    Ok(samples)
}
