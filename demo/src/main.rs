use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use gerber_offset::{parse_with_options, BoundingBox, GeometryKind, ParserOptions, ScaleTransformer};
use log::{info, warn};

/// Parse a Gerber file and grow or shrink its copper by a boundary offset.
#[derive(Parser)]
#[command(name = "gerber_offset_demo")]
struct Cli {
    /// Gerber file to read
    path: PathBuf,

    /// Horizontal scale, values above 1 grow features
    #[arg(long, default_value_t = 1.0)]
    sx: f64,

    /// Vertical scale, values above 1 grow features
    #[arg(long, default_value_t = 1.0)]
    sy: f64,

    /// Also emit move-mode draws
    #[arg(long)]
    emit_moves: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    #[cfg(feature = "profile-with-puffin")]
    let _puffin_server = start_puffin_server();

    let cli = Cli::parse();

    let text = std::fs::read_to_string(&cli.path).with_context(|| format!("reading {}", cli.path.display()))?;
    let file = parse_with_options(&text, ParserOptions {
        emit_moves: cli.emit_moves,
    })
    .with_context(|| format!("parsing {}", cli.path.display()))?;

    for warning in &file.warnings {
        warn!("{}", warning);
    }

    let output = ScaleTransformer::new(cli.sx, cli.sy)
        .with_scaled_catalog(true)
        .apply(&file);

    let original = bounds(output.original.iter().flat_map(|geometry| geometry.points().iter().copied()));
    let transformed = bounds(output.transformed.iter().flat_map(|geometry| geometry.points().iter().copied()));

    for kind in [GeometryKind::FlashAperture, GeometryKind::Draw, GeometryKind::Arc, GeometryKind::Region] {
        let count = output
            .transformed
            .iter()
            .filter(|geometry| geometry.kind() == kind)
            .count();
        info!("{:?}: {}", kind, count);
    }

    info!(
        "apertures: {}, commands: {}, warnings: {}",
        file.catalog.len(),
        file.commands.len(),
        file.warnings.len()
    );
    info!(
        "bounds. original: {:.4} x {:.4}, transformed: {:.4} x {:.4}",
        original.width(),
        original.height(),
        transformed.width(),
        transformed.height()
    );

    Ok(())
}

fn bounds(points: impl Iterator<Item = gerber_offset::Position>) -> BoundingBox {
    let points: Vec<_> = points.collect();
    BoundingBox::from_points(&points)
}

#[cfg(feature = "profile-with-puffin")]
fn start_puffin_server() -> Option<puffin_http::Server> {
    profiling::puffin::set_scopes_on(true);

    match puffin_http::Server::new("127.0.0.1:8585") {
        Ok(puffin_server) => {
            info!("Run: cargo install puffin_viewer && puffin_viewer --url 127.0.0.1:8585");
            Some(puffin_server)
        }
        Err(err) => {
            warn!("Failed to start puffin server: {}", err);
            None
        }
    }
}
