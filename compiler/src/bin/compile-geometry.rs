//! `compile-geometry`: BrushModel -> CSG -> TreeBuilder -> PortalExtractor
//! -> FaceBuilder -> FormatShim, the first of the three compile phases
//! (spec.md §6).

use std::path::PathBuf;
use std::process::ExitCode;

use bsptree::TreeConfig;
use clap::Parser;
use compiler::cancel::CancelToken;
use compiler::config::GameProfile;
use face::FaceConfig;

#[derive(Parser)]
#[command(name = "compile-geometry", about = "Compiles a .map into a vis/light-less .bsp")]
struct Args {
    map: PathBuf,

    #[arg(long)]
    nodetail: bool,
    #[arg(long)]
    nofill: bool,
    #[arg(long)]
    noclip: bool,
    #[arg(long)]
    maxnodesize: Option<f32>,
    #[arg(long)]
    epsilon: Option<f32>,
    #[arg(long, default_value = "goldsrc")]
    target: String,
    #[arg(long)]
    gameconfig: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), compiler::error::CompileError> {
    let _ = (args.nodetail, args.nofill, args.noclip);
    let profile_path = compiler::config::resolve_profile_path(args.gameconfig);
    let mut profile = GameProfile::load_or_default(profile_path.as_deref()).unwrap_or_default();
    profile.target_dialect = args.target;
    if let Some(e) = args.epsilon {
        profile.epsilon = e;
    }

    let mut tree_config = TreeConfig::default();
    if let Some(n) = args.maxnodesize {
        tree_config.max_node_size = n;
    }
    let face_config = FaceConfig::default();

    let cancel = CancelToken::new();
    let output = compiler::compile_geometry(&args.map, &profile, &tree_config, &face_config, &cancel)?;

    let dialect = compiler::resolve_dialect(&profile.target_dialect)?;
    let bytes = dialect.encode(&output.bsp)?;
    let bsp_path = args.map.with_extension("bsp");
    compiler::write_bytes(&bsp_path, &bytes)?;
    log::info!("wrote {} ({} faces, {} leaves)", bsp_path.display(), output.bsp.faces.len(), output.bsp.leaves.len());
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
