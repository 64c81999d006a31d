use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::assets::{decode_texture, ByteLoader, Bytes, MeshData, MeshDecoder, Vertex};
use crate::build::{
    BuildError,
    BuildTask,
    JoinPoint,
    NodeId,
    NodeStatus,
    ReadinessGate,
    Spawner,
    TaskGraph,
};
use crate::device::{
    BufferDesc,
    BufferHandle,
    BufferUsage,
    InputLayoutHandle,
    RenderDevice,
    ResourceHandle,
    ShaderHandle,
    ShaderStage,
    TextureHandle,
};
use crate::render::{InstancedModelViewProjection, ModelViewProjection};
use crate::scene::LightBuffer;

use super::drawable::{BuiltScene, ConstantBuffers, Drawable, ShaderSet};
use super::manifest::{ConstantSlot, SceneManifest, ShaderProgram};

/// Label of the join every build funnels into.
pub const SCENE_JOIN: &str = "scene";

#[derive(Debug, Copy, Clone)]
struct CompiledShader {
    handle: ShaderHandle,
    input_layout: Option<InputLayoutHandle>,
}

#[derive(Debug, Copy, Clone)]
struct IndexBuffer {
    handle: BufferHandle,
    count: u32,
}

struct MeshTasks {
    vertices: BuildTask<BufferHandle>,
    indices: BuildTask<IndexBuffer>,
}

struct ConstantTasks {
    shared: BuildTask<BufferHandle>,
    instanced: Option<BuildTask<BufferHandle>>,
    skybox: Option<BuildTask<BufferHandle>>,
    lights: BuildTask<BufferHandle>,
}

impl ConstantTasks {
    fn slot(&self, slot: ConstantSlot) -> Option<&BuildTask<BufferHandle>> {
        match slot {
            ConstantSlot::Shared => Some(&self.shared),
            ConstantSlot::Instanced => self.instanced.as_ref(),
            ConstantSlot::Skybox => self.skybox.as_ref(),
        }
    }
}

#[derive(Default)]
struct BuildState {
    generation: u64,
    graph: Option<TaskGraph>,
    terminal: Option<JoinPoint>,
    drawables: Vec<(String, JoinPoint)>,
    /// Handles created by the current generation.
    handles: Vec<ResourceHandle>,
    scene: Option<Arc<BuiltScene>>,
    failure: Option<BuildError>,
}

struct BuilderShared {
    state: Mutex<BuildState>,
}

/// Records handles against the generation that created them.
///
/// A handle created after its generation was superseded is released on the
/// spot, so a stale build never leaks into the next one.
#[derive(Clone)]
struct Tracker {
    generation: u64,
    shared: Weak<BuilderShared>,
    device: Arc<dyn RenderDevice>,
}

impl Tracker {
    fn keep<H: Into<ResourceHandle> + Copy>(&self, handle: H) -> H {
        let h: ResourceHandle = handle.into();
        if let Some(shared) = self.shared.upgrade() {
            let mut state = shared.state.lock();
            if state.generation == self.generation {
                state.handles.push(h);
                return handle;
            }
        }
        log::debug!("releasing {h:?} created by stale generation {}", self.generation);
        self.device.release(h);
        handle
    }
}

/// Handle on one submitted build.
#[derive(Debug, Clone)]
pub struct BuildTicket {
    generation: u64,
    graph: TaskGraph,
    terminal: JoinPoint,
    drawables: Vec<(String, JoinPoint)>,
}

impl BuildTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn terminal(&self) -> JoinPoint {
        self.terminal
    }

    pub fn drawable(&self, name: &str) -> Option<JoinPoint> {
        self.drawables.iter().find(|(n, _)| n == name).map(|(_, j)| *j)
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn status(&self) -> NodeStatus {
        self.graph.status(self.terminal.node())
    }

    /// Blocks until the whole build has fired.
    pub fn wait(&self) -> NodeStatus {
        self.graph.wait(self.terminal.node())
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Option<NodeStatus> {
        self.graph.wait_timeout(self.terminal.node(), timeout)
    }
}

/// Turns a `SceneManifest` into device resources off the frame thread.
///
/// Every shader, mesh, texture and constant buffer is its own task chain;
/// each drawable gets a join over the chains it needs, and a terminal join
/// over everything opens the readiness gate once all of it succeeded.
pub struct ResourceBuilder {
    device: Arc<dyn RenderDevice>,
    loader: Arc<dyn ByteLoader>,
    decoder: Arc<dyn MeshDecoder>,
    spawner: Arc<dyn Spawner>,
    manifest: Arc<SceneManifest>,
    gate: Arc<ReadinessGate>,
    shared: Arc<BuilderShared>,
}

impl std::fmt::Debug for ResourceBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ResourceBuilder")
            .field("generation", &state.generation)
            .field("ready", &self.gate.is_open())
            .field("handles", &state.handles.len())
            .finish()
    }
}

impl ResourceBuilder {
    /// `spawner` runs every task of every build; hosts normally pass a
    /// `TokioSpawner`.
    pub fn new(
        device: Arc<dyn RenderDevice>,
        loader: Arc<dyn ByteLoader>,
        decoder: Arc<dyn MeshDecoder>,
        spawner: Arc<dyn Spawner>,
        manifest: SceneManifest,
    ) -> Self {
        Self {
            device,
            loader,
            decoder,
            spawner,
            manifest: Arc::new(manifest),
            gate: Arc::new(ReadinessGate::new()),
            shared: Arc::new(BuilderShared { state: Mutex::new(BuildState::default()) }),
        }
    }

    pub fn manifest(&self) -> &SceneManifest {
        &self.manifest
    }

    pub fn device(&self) -> &Arc<dyn RenderDevice> {
        &self.device
    }

    pub fn gate(&self) -> Arc<ReadinessGate> {
        Arc::clone(&self.gate)
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.gate.is_open()
    }

    pub fn generation(&self) -> u64 {
        self.shared.state.lock().generation
    }

    /// The published scene of the current generation, once the gate opened.
    pub fn scene(&self) -> Option<Arc<BuiltScene>> {
        self.shared.state.lock().scene.clone()
    }

    /// Why the current generation failed, if it did.
    pub fn failure(&self) -> Option<BuildError> {
        self.shared.state.lock().failure.clone()
    }

    /// Status of one drawable's join in the current generation.
    pub fn drawable_status(&self, name: &str) -> Option<NodeStatus> {
        let state = self.shared.state.lock();
        let graph = state.graph.as_ref()?;
        let join = state.drawables.iter().find(|(n, _)| n == name).map(|(_, j)| *j)?;
        Some(graph.status(join.node()))
    }

    /// Number of live handles owned by the current generation.
    pub fn handle_count(&self) -> usize {
        self.shared.state.lock().handles.len()
    }

    /// Closes the gate and releases every handle of the current generation.
    ///
    /// Work still in flight belongs to a retired generation afterwards; what it
    /// creates is released as soon as it appears.
    pub fn release(&self) {
        self.retire();
    }

    /// Starts a new generation under one lock and releases the old one's
    /// handles. Returns the new generation.
    fn retire(&self) -> u64 {
        let (generation, handles) = {
            let mut state = self.shared.state.lock();
            self.gate.close();
            state.generation += 1;
            state.graph = None;
            state.terminal = None;
            state.drawables.clear();
            state.scene = None;
            state.failure = None;
            (state.generation, std::mem::take(&mut state.handles))
        };

        if !handles.is_empty() {
            log::debug!("releasing {} device handles", handles.len());
        }
        for h in handles {
            self.device.release(h);
        }
        generation
    }

    /// Device-loss path: tear everything down and build again.
    pub fn rebuild(&self) -> Result<BuildTicket, BuildError> {
        log::warn!("rebuilding device resources");
        self.build()
    }

    /// Submits the whole build and returns immediately.
    ///
    /// Fails synchronously only if the manifest is inconsistent. A previous
    /// generation is released first.
    pub fn build(&self) -> Result<BuildTicket, BuildError> {
        self.manifest.validate()?;
        let generation = self.retire();

        let graph = TaskGraph::new(Arc::clone(&self.spawner));
        let tracker = Tracker {
            generation,
            shared: Arc::downgrade(&self.shared),
            device: Arc::clone(&self.device),
        };
        log::debug!(
            "submitting build generation {generation}: {} shaders, {} drawables",
            self.manifest.shaders.len(),
            self.manifest.drawables.len()
        );

        let shaders: HashMap<String, BuildTask<CompiledShader>> = self
            .manifest
            .shaders
            .iter()
            .map(|p| (p.name.clone(), self.shader_task(&graph, &tracker, p)))
            .collect();

        let meshes: HashMap<String, MeshTasks> = self
            .manifest
            .meshes()
            .into_iter()
            .map(|file| (file.to_string(), self.mesh_tasks(&graph, &tracker, file)))
            .collect();

        let textures: HashMap<String, BuildTask<TextureHandle>> = self
            .manifest
            .textures()
            .into_iter()
            .map(|file| (file.to_string(), self.texture_task(&graph, &tracker, file)))
            .collect();

        let constants = ConstantTasks {
            shared: self.constant_task(&graph, &tracker, "shared", ModelViewProjection::SIZE),
            instanced: self
                .manifest
                .uses_slot(ConstantSlot::Instanced)
                .then(|| self.constant_task(&graph, &tracker, "instanced", InstancedModelViewProjection::SIZE)),
            skybox: self
                .manifest
                .uses_slot(ConstantSlot::Skybox)
                .then(|| self.constant_task(&graph, &tracker, "skybox", ModelViewProjection::SIZE)),
            lights: self.constant_task(&graph, &tracker, "lights", LightBuffer::SIZE),
        };

        let mut drawables = Vec::with_capacity(self.manifest.drawables.len());
        for d in &self.manifest.drawables {
            let missing = |what: &str| BuildError::Manifest(format!("drawable `{}`: no task for {what}", d.name));

            let mesh = meshes.get(&d.mesh).ok_or_else(|| missing(&d.mesh))?;
            let mut deps: Vec<NodeId> = vec![mesh.vertices.node(), mesh.indices.node()];
            for (_, name) in d.shaders.stages() {
                deps.push(shaders.get(name).ok_or_else(|| missing(name))?.node());
            }
            if let Some(texture) = &d.texture {
                deps.push(textures.get(texture).ok_or_else(|| missing(texture))?.node());
            }
            deps.push(constants.slot(d.constants).ok_or_else(|| missing("constants"))?.node());

            let join = graph.join(format!("drawable:{}", d.name), deps);
            let name = d.name.clone();
            graph.on_complete(join.node(), move |status| {
                if let NodeStatus::Failed(e) = status {
                    log::error!("drawable `{name}` failed: {}", e.root_cause());
                }
            });
            drawables.push((d.name.clone(), join));
        }

        let mut leaves: Vec<NodeId> = drawables.iter().map(|(_, j)| j.node()).collect();
        leaves.extend(shaders.values().map(BuildTask::node));
        leaves.push(constants.lights.node());
        let terminal = graph.join(SCENE_JOIN, leaves);

        {
            let mut state = self.shared.state.lock();
            if state.generation == generation {
                state.graph = Some(graph.clone());
                state.terminal = Some(terminal);
                state.drawables = drawables.clone();
            }
        }

        let assembly = Assembly {
            generation,
            manifest: Arc::clone(&self.manifest),
            shaders,
            meshes,
            textures,
            constants,
        };
        let shared = Arc::downgrade(&self.shared);
        let gate = Arc::clone(&self.gate);
        graph.on_complete(terminal.node(), move |status| {
            publish(&shared, &gate, assembly, status);
        });

        Ok(BuildTicket { generation, graph, terminal, drawables })
    }

    fn shader_task(&self, graph: &TaskGraph, tracker: &Tracker, program: &ShaderProgram) -> BuildTask<CompiledShader> {
        let bytes: BuildTask<Bytes> =
            graph.submit_async(format!("load:{}", program.file), self.loader.load(&program.file));

        let device = Arc::clone(&self.device);
        let tracker = tracker.clone();
        let (name, stage) = (program.name.clone(), program.stage);

        graph.then(&bytes, format!("shader:{name}"), move |bytecode: Bytes| {
            let handle = device
                .create_shader(stage, &name, &bytecode)
                .map_err(|e| BuildError::device(&name, e))?;
            let handle = tracker.keep(handle);

            let input_layout = match stage {
                ShaderStage::Vertex => {
                    let layout = device
                        .create_input_layout(&Vertex::LAYOUT, &bytecode)
                        .map_err(|e| BuildError::device(format!("{name}/input-layout"), e))?;
                    Some(tracker.keep(layout))
                }
                _ => None,
            };

            Ok(CompiledShader { handle, input_layout })
        })
    }

    fn mesh_tasks(&self, graph: &TaskGraph, tracker: &Tracker, file: &str) -> MeshTasks {
        let bytes: BuildTask<Bytes> = graph.submit_async(format!("load:{file}"), self.loader.load(file));

        let decoder = Arc::clone(&self.decoder);
        let name = file.to_string();
        let mesh = graph.then(&bytes, format!("decode:{file}"), move |b: Bytes| {
            decoder.decode(&name, &b).map(Arc::new)
        });

        let (device, keep, label) = (Arc::clone(&self.device), tracker.clone(), format!("vb:{file}"));
        let vertices = graph.then(&mesh, label.clone(), move |m: Arc<MeshData>| {
            let desc = BufferDesc::init(&label, BufferUsage::Vertex, m.vertex_bytes());
            device
                .create_buffer(&desc)
                .map(|h| keep.keep(h))
                .map_err(|e| BuildError::device(&label, e))
        });

        let (device, keep, label) = (Arc::clone(&self.device), tracker.clone(), format!("ib:{file}"));
        let indices = graph.then(&mesh, label.clone(), move |m: Arc<MeshData>| {
            let desc = BufferDesc::init(&label, BufferUsage::Index, m.index_bytes());
            let handle = device
                .create_buffer(&desc)
                .map(|h| keep.keep(h))
                .map_err(|e| BuildError::device(&label, e))?;
            Ok(IndexBuffer { handle, count: m.index_count() })
        });

        MeshTasks { vertices, indices }
    }

    fn texture_task(&self, graph: &TaskGraph, tracker: &Tracker, file: &str) -> BuildTask<TextureHandle> {
        let bytes: BuildTask<Bytes> = graph.submit_async(format!("load:{file}"), self.loader.load(file));

        let device = Arc::clone(&self.device);
        let tracker = tracker.clone();
        let name = file.to_string();
        graph.then(&bytes, format!("texture:{file}"), move |b: Bytes| {
            let image = decode_texture(&name, &b)?;
            device
                .create_texture(&name, &image)
                .map(|h| tracker.keep(h))
                .map_err(|e| BuildError::device(&name, e))
        })
    }

    fn constant_task(
        &self,
        graph: &TaskGraph,
        tracker: &Tracker,
        label: &'static str,
        size: u64,
    ) -> BuildTask<BufferHandle> {
        let device = Arc::clone(&self.device);
        let tracker = tracker.clone();
        graph.submit(format!("cb:{label}"), move || {
            device
                .create_buffer(&BufferDesc::empty(label, BufferUsage::Constant, size))
                .map(|h| tracker.keep(h))
                .map_err(|e| BuildError::device(label, e))
        })
    }
}

/// Everything the terminal continuation needs to assemble the scene.
struct Assembly {
    generation: u64,
    manifest: Arc<SceneManifest>,
    shaders: HashMap<String, BuildTask<CompiledShader>>,
    meshes: HashMap<String, MeshTasks>,
    textures: HashMap<String, BuildTask<TextureHandle>>,
    constants: ConstantTasks,
}

impl Assembly {
    fn assemble(&self) -> Result<BuiltScene, BuildError> {
        let missing = |what: &str| BuildError::Manifest(format!("no task for `{what}`"));
        let shader = |name: &str| -> Result<CompiledShader, BuildError> {
            self.shaders.get(name).ok_or_else(|| missing(name))?.result()
        };
        let optional = |name: &Option<String>| -> Result<Option<ShaderHandle>, BuildError> {
            name.as_deref().map(|n| shader(n).map(|s| s.handle)).transpose()
        };

        let mut drawables = Vec::with_capacity(self.manifest.drawables.len());
        for d in &self.manifest.drawables {
            let mesh = self.meshes.get(&d.mesh).ok_or_else(|| missing(&d.mesh))?;
            let vertex = shader(&d.shaders.vertex)?;
            let input_layout = vertex
                .input_layout
                .ok_or_else(|| BuildError::Manifest(format!("`{}` has no input layout", d.shaders.vertex)))?;
            let indices = mesh.indices.result()?;
            let texture = match &d.texture {
                Some(t) => Some(self.textures.get(t).ok_or_else(|| missing(t))?.result()?),
                None => None,
            };

            drawables.push(Drawable {
                name: d.name.clone(),
                vertex_buffer: mesh.vertices.result()?,
                index_buffer: indices.handle,
                index_count: indices.count,
                topology: d.topology,
                texture,
                shaders: ShaderSet {
                    vertex: vertex.handle,
                    hull: optional(&d.shaders.hull)?,
                    domain: optional(&d.shaders.domain)?,
                    geometry: optional(&d.shaders.geometry)?,
                    pixel: shader(&d.shaders.pixel)?.handle,
                    input_layout,
                },
                constants: d.constants,
                instances: d.instances,
                clear_depth_after: d.clear_depth_after,
            });
        }

        let c = &self.constants;
        let constants = ConstantBuffers {
            shared: c.shared.result()?,
            instanced: c.instanced.as_ref().map(BuildTask::result).transpose()?,
            skybox: c.skybox.as_ref().map(BuildTask::result).transpose()?,
            lights: c.lights.result()?,
        };

        Ok(BuiltScene { generation: self.generation, drawables, constants })
    }
}

/// Terminal continuation: publish the scene and open the gate, or record the
/// failure. Either way only for the generation that is still current.
fn publish(shared: &Weak<BuilderShared>, gate: &ReadinessGate, assembly: Assembly, status: &NodeStatus) {
    let Some(shared) = shared.upgrade() else {
        return;
    };

    let outcome = match status {
        NodeStatus::Succeeded => assembly.assemble(),
        NodeStatus::Failed(e) => Err(e.clone()),
        NodeStatus::Pending => Err(BuildError::Unavailable { label: SCENE_JOIN.to_string() }),
    };

    let mut state = shared.state.lock();
    if state.generation != assembly.generation {
        log::debug!("discarding result of stale build generation {}", assembly.generation);
        return;
    }

    match outcome {
        Ok(scene) => {
            let count = scene.drawables.len();
            state.scene = Some(Arc::new(scene));
            state.failure = None;
            if gate.open() {
                log::info!("scene ready: {count} drawables (generation {})", assembly.generation);
            }
        }
        Err(e) => {
            log::error!("scene build failed: {e} (root cause: {})", e.root_cause());
            state.failure = Some(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{MemoryLoader, ObjDecoder};
    use crate::build::InlineSpawner;
    use crate::device::{NullDevice, PrimitiveTopology};
    use crate::resources::{DrawableDesc, ShaderSetDesc};

    const TRI: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1\n";

    fn tiny_manifest() -> SceneManifest {
        SceneManifest::new()
            .shader("vs", ShaderStage::Vertex, "vs.cso")
            .shader("ps", ShaderStage::Pixel, "ps.cso")
            .drawable(DrawableDesc::new("a", "a.obj", PrimitiveTopology::TriangleList, ShaderSetDesc::new("vs", "ps")))
            .drawable(
                DrawableDesc::new("b", "b.obj", PrimitiveTopology::TriangleList, ShaderSetDesc::new("vs", "ps"))
                    .instanced(2),
            )
    }

    fn loader() -> MemoryLoader {
        MemoryLoader::new()
            .with("vs.cso", vec![1u8; 8])
            .with("ps.cso", vec![2u8; 8])
            .with("a.obj", TRI)
            .with("b.obj", TRI)
    }

    fn builder(device: Arc<NullDevice>, loader: MemoryLoader, manifest: SceneManifest) -> ResourceBuilder {
        ResourceBuilder::new(device, Arc::new(loader), Arc::new(ObjDecoder), Arc::new(InlineSpawner), manifest)
    }

    #[test]
    fn inline_build_publishes_scene_and_opens_gate() {
        let device = Arc::new(NullDevice::new());
        let b = builder(Arc::clone(&device), loader(), tiny_manifest());
        assert!(!b.is_ready());

        let ticket = b.build().unwrap();
        assert_eq!(ticket.status(), NodeStatus::Succeeded);
        assert!(b.is_ready());

        let scene = b.scene().unwrap();
        assert_eq!(scene.generation, ticket.generation());
        assert_eq!(scene.drawables.len(), 2);
        assert_eq!(scene.drawables[0].index_count, 3);
        assert!(scene.constants.instanced.is_some());
        assert!(scene.constants.skybox.is_none());
        assert_eq!(device.buffer_size(scene.constants.lights), Some(LightBuffer::SIZE));
        // 2 shaders + 1 layout + 2x(vb, ib) + shared, instanced, lights
        assert_eq!(device.live_count(), 10);
        assert_eq!(b.handle_count(), 10);
    }

    #[test]
    fn missing_mesh_fails_only_its_drawable() {
        let device = Arc::new(NullDevice::new());
        let files = loader();
        files.remove("b.obj");
        let b = builder(device, files, tiny_manifest());

        let ticket = b.build().unwrap();
        assert!(ticket.status().error().is_some());
        assert!(!b.is_ready());
        assert!(b.scene().is_none());
        assert_eq!(b.drawable_status("a"), Some(NodeStatus::Succeeded));

        let failed = b.drawable_status("b").unwrap();
        assert_eq!(
            failed.error().map(BuildError::root_cause),
            Some(&BuildError::NotFound { name: "b.obj".into() })
        );
        assert!(b.failure().is_some());
    }

    #[test]
    fn release_returns_every_handle() {
        let device = Arc::new(NullDevice::new());
        let b = builder(Arc::clone(&device), loader(), tiny_manifest());
        b.build().unwrap();
        assert!(device.live_count() > 0);

        b.release();
        assert_eq!(device.live_count(), 0);
        assert!(!b.is_ready());
        assert!(b.scene().is_none());
        assert_eq!(b.drawable_status("a"), None);
    }

    #[test]
    fn concurrent_builds_take_distinct_generations() {
        let device = Arc::new(NullDevice::new());
        let b = builder(Arc::clone(&device), loader(), tiny_manifest());

        let tickets: Vec<BuildTicket> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..4).map(|_| s.spawn(|| b.build().unwrap())).collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        let mut generations: Vec<u64> = tickets.iter().map(BuildTicket::generation).collect();
        generations.sort_unstable();
        generations.dedup();
        assert_eq!(generations.len(), 4);

        let latest = *generations.last().unwrap();
        assert_eq!(b.generation(), latest);
        assert_eq!(b.scene().map(|s| s.generation), Some(latest));
        assert_eq!(device.live_count(), b.handle_count());
    }

    #[test]
    fn rebuild_replaces_the_previous_generation() {
        let device = Arc::new(NullDevice::new());
        let b = builder(Arc::clone(&device), loader(), tiny_manifest());
        let first = b.build().unwrap();
        let live = device.live_count();

        let second = b.rebuild().unwrap();
        assert!(second.generation() > first.generation());
        assert!(b.is_ready());
        assert_eq!(device.live_count(), live);
        assert_eq!(b.scene().map(|s| s.generation), Some(second.generation()));
    }

    #[test]
    fn invalid_manifest_fails_before_submitting() {
        let device = Arc::new(NullDevice::new());
        let manifest = SceneManifest::new().drawable(DrawableDesc::new(
            "x",
            "x.obj",
            PrimitiveTopology::TriangleList,
            ShaderSetDesc::new("nope", "nada"),
        ));
        let b = builder(Arc::clone(&device), MemoryLoader::new(), manifest);
        assert!(matches!(b.build(), Err(BuildError::Manifest(_))));
        assert_eq!(b.generation(), 0);
        assert_eq!(device.live_count(), 0);
    }
}
