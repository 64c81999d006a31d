use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use stadium_engine::assets::{ByteLoader, ChainLoader, FsLoader, MemoryLoader, ObjDecoder};
use stadium_engine::build::{NodeStatus, TokioSpawner};
use stadium_engine::device::{DeviceInit, NullDevice, RenderDevice, WgpuDevice};
use stadium_engine::input::InputSnapshot;
use stadium_engine::logging::{init_logging, LoggingConfig};
use stadium_engine::render::{CommandSink, FrameOutcome, RecordingSink, WgpuSink};
use stadium_engine::resources::{ResourceBuilder, SceneManifest};
use stadium_engine::time::FrameTime;
use stadium_engine::{Renderer, RendererConfig};

#[derive(Parser, Debug)]
#[command(name = "stadium-probe")]
#[command(about = "Builds the stadium scene from an asset directory and records headless frames")]
struct Args {
    /// Directory holding the shader, mesh and texture files.
    #[arg(default_value = ".")]
    assets: PathBuf,

    #[arg(long, default_value_t = 3)]
    frames: u64,

    /// Render with a real wgpu device and the bundled WGSL shaders instead
    /// of the null device.
    #[arg(long)]
    wgpu: bool,

    /// Draw the skybox cube before the rest of the scene.
    #[arg(long)]
    skybox: bool,

    /// Give up on the build after this many seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// env_logger filter, e.g. "debug" or "stadium_engine::build=trace".
    #[arg(long)]
    log: Option<String>,
}

/// WGSL programs of `SceneManifest::stadium_wgsl`, shipped with the binary.
const WGSL_SHADERS: [(&str, &str); 5] = [
    ("vertex.wgsl", include_str!("../shaders/vertex.wgsl")),
    ("instanced_vertex.wgsl", include_str!("../shaders/instanced_vertex.wgsl")),
    ("pixel.wgsl", include_str!("../shaders/pixel.wgsl")),
    ("light_pixel.wgsl", include_str!("../shaders/light_pixel.wgsl")),
    ("pyramid_pixel.wgsl", include_str!("../shaders/pyramid_pixel.wgsl")),
];

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(LoggingConfig { env_filter: args.log.clone(), ..Default::default() });

    let mut manifest = if args.wgpu { SceneManifest::stadium_wgsl() } else { SceneManifest::stadium() };
    if args.skybox {
        manifest = manifest.with_skybox();
    }

    let gpu = if args.wgpu {
        let device = pollster::block_on(WgpuDevice::new_headless(DeviceInit::default()))
            .context("failed to create headless wgpu device")?;
        Some(Arc::new(device))
    } else {
        None
    };
    let device: Arc<dyn RenderDevice> = match &gpu {
        Some(gpu) => gpu.clone(),
        None => Arc::new(NullDevice::new()),
    };

    let files: Arc<dyn ByteLoader> = Arc::new(FsLoader::new(&args.assets));
    let loader: Arc<dyn ByteLoader> = if gpu.is_some() {
        let shaders = WGSL_SHADERS.iter().fold(MemoryLoader::new(), |m, (name, src)| m.with(*name, *src));
        Arc::new(ChainLoader::new().then(Arc::new(shaders)).then(files))
    } else {
        files
    };
    let spawner = TokioSpawner::new("stadium-build").context("failed to start build runtime")?;
    let resources = ResourceBuilder::new(device, loader, Arc::new(ObjDecoder), Arc::new(spawner), manifest);
    let config = RendererConfig::default();
    let (width, height) = (config.width, config.height);
    let mut renderer = Renderer::new(config, resources);

    log::info!("building scene from {}", args.assets.display());
    let ticket = renderer.create_device_resources().context("scene manifest rejected")?;
    match ticket.wait_timeout(Duration::from_secs(args.timeout)) {
        Some(NodeStatus::Succeeded) => {}
        Some(NodeStatus::Failed(err)) => {
            for name in failed_drawables(&renderer) {
                log::error!("drawable `{name}` failed");
            }
            bail!("scene build failed: {}", err.root_cause());
        }
        Some(NodeStatus::Pending) | None => bail!("scene build did not finish within {}s", args.timeout),
    }
    log::info!("scene ready: {} live handles", renderer.resources().handle_count());

    match gpu {
        Some(gpu) => {
            let mut sink = WgpuSink::new(gpu, width, height);
            run_frames(&mut renderer, &mut sink, args.frames, |index, sink| {
                let stats = sink.finish().context("failed to submit frame")?;
                log::info!(
                    "frame {index}: {} render passes, {} draws, {} skipped, {} pipelines",
                    stats.passes,
                    stats.draws,
                    stats.skipped,
                    sink.pipeline_count()
                );
                Ok(())
            })?;
        }
        None => {
            let mut sink = RecordingSink::new();
            run_frames(&mut renderer, &mut sink, args.frames, |index, sink| {
                log::info!("frame {index}: {} commands, {} draws", sink.len(), sink.draw_count());
                sink.clear();
                Ok(())
            })?;
        }
    }

    renderer.release_device_resources();
    Ok(())
}

/// Updates and renders `frames` fixed-step frames into `sink`, handing the
/// sink to `after` once per frame.
fn run_frames<S: CommandSink>(
    renderer: &mut Renderer,
    sink: &mut S,
    frames: u64,
    mut after: impl FnMut(u64, &mut S) -> Result<()>,
) -> Result<()> {
    let dt = 1.0 / 60.0;
    for index in 0..frames {
        let time = FrameTime::fixed(dt, index as f64 * f64::from(dt), index);
        renderer.update(&time, &InputSnapshot::default());

        match renderer.render(sink) {
            FrameOutcome::Rendered { passes } => log::debug!("frame {index}: {passes} draw passes recorded"),
            FrameOutcome::NotReady => log::warn!("frame {index}: resources not ready"),
        }
        after(index, sink)?;
    }
    Ok(())
}

fn failed_drawables(renderer: &Renderer) -> Vec<String> {
    let resources = renderer.resources();
    resources
        .manifest()
        .drawables
        .iter()
        .filter(|d| resources.drawable_status(&d.name).is_some_and(|s| s.error().is_some()))
        .map(|d| d.name.clone())
        .collect()
}
