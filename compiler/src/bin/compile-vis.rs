//! `compile-vis`: PVSSolver, the second compile phase (spec.md §6).
//! Reads an existing `.bsp`, reconstructs the tree/portal graph it
//! implies, computes the potentially-visible-set, and patches the
//! visdata lump back into the same file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use compiler::cancel::CancelToken;
use vis::VisConfig;

#[derive(Parser)]
#[command(name = "compile-vis", about = "Computes PVS for a compiled .bsp")]
struct Args {
    bsp: PathBuf,

    #[arg(long, default_value_t = 4)]
    level: usize,
    #[arg(long)]
    fast: bool,
    #[arg(long)]
    visdist: Option<f32>,
    #[arg(long)]
    targetratio: Option<f32>,
    #[arg(long)]
    noambient: bool,
}

fn run(args: Args) -> Result<(), compiler::error::CompileError> {
    let _ = (args.visdist, args.targetratio, args.noambient);
    let bytes = compiler::read_bytes(&args.bsp)?;
    let (dialect_name, mut bsp) = compiler::dialect_probe::decode(&bytes)?;

    let mut vis_config = VisConfig::default();
    vis_config.test_level = if args.fast { 0 } else { args.level.min(4) };

    let cancel = CancelToken::new();
    compiler::compile_vis(&mut bsp, &vis_config, vis_config.on_epsilon, &cancel)?;

    let dialect = compiler::resolve_dialect(dialect_name)?;
    let out = dialect.encode(&bsp)?;
    compiler::write_bytes(&args.bsp, &out)?;
    log::info!("patched visdata into {} ({} bytes)", args.bsp.display(), bsp.visibility.len());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
