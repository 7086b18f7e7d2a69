//! `compile-light`: LightmapCore, the third compile phase (spec.md
//! §6). Reads an existing `.bsp`, bakes direct/dirt/bounce lighting
//! (and, optionally, the light grid), and patches the lightdata lump
//! back into the same file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use compiler::cancel::CancelToken;
use light::config::{LightConfig, LightGridConfig};

#[derive(Parser)]
#[command(name = "compile-light", about = "Bakes lightmaps for a compiled .bsp")]
struct Args {
    bsp: PathBuf,

    #[arg(long)]
    extra: bool,
    #[arg(long)]
    extra4: bool,
    #[arg(long)]
    bounce: bool,
    #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "1")]
    soft: Option<u32>,
    #[arg(long)]
    sunsamples: Option<u32>,
    #[arg(long)]
    lit: bool,
    #[arg(long)]
    bspxlit: bool,
    #[arg(long)]
    bspxlux: bool,
    #[arg(long)]
    litonly: bool,
    #[arg(long)]
    dirty: bool,
    #[arg(long)]
    lightgrid: bool,
}

fn run(args: Args) -> Result<(), compiler::error::CompileError> {
    let _ = (args.soft, args.lit, args.bspxlit, args.bspxlux, args.litonly);
    let bytes = compiler::read_bytes(&args.bsp)?;
    let (dialect_name, mut bsp) = compiler::dialect_probe::decode(&bytes)?;

    let mut light_config = LightConfig::default();
    light_config.extra = if args.extra4 { 4 } else if args.extra { 2 } else { 1 };
    light_config.bounce.enabled = args.bounce;
    light_config.dirt.enabled = args.dirty;
    if let Some(n) = args.sunsamples {
        light_config.sunsamples = n;
    }
    if args.lightgrid {
        light_config.light_grid = Some(LightGridConfig::default());
    }

    let cancel = CancelToken::new();
    compiler::compile_light(&mut bsp, &light_config, &cancel)?;

    let dialect = compiler::resolve_dialect(dialect_name)?;
    let out = dialect.encode(&bsp)?;
    compiler::write_bytes(&args.bsp, &out)?;
    log::info!("patched lightdata into {} ({} luxels)", args.bsp.display(), bsp.lightmap.len());
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
