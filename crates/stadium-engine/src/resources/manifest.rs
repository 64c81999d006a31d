use std::collections::HashSet;

use crate::build::BuildError;
use crate::device::{PrimitiveTopology, ShaderStage};
use crate::render::MAX_INSTANCES;

/// A compiled shader file and the stage it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    pub name: String,
    pub stage: ShaderStage,
    pub file: String,
}

/// Shader names used by one drawable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSetDesc {
    pub vertex: String,
    pub hull: Option<String>,
    pub domain: Option<String>,
    pub geometry: Option<String>,
    pub pixel: String,
}

impl ShaderSetDesc {
    pub fn new(vertex: impl Into<String>, pixel: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            hull: None,
            domain: None,
            geometry: None,
            pixel: pixel.into(),
        }
    }

    pub fn tessellated(mut self, hull: impl Into<String>, domain: impl Into<String>) -> Self {
        self.hull = Some(hull.into());
        self.domain = Some(domain.into());
        self
    }

    pub fn with_geometry(mut self, geometry: impl Into<String>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    /// `(stage, name)` for every stage this set uses, in pipeline order.
    pub fn stages(&self) -> impl Iterator<Item = (ShaderStage, &str)> {
        [
            (ShaderStage::Vertex, Some(self.vertex.as_str())),
            (ShaderStage::Hull, self.hull.as_deref()),
            (ShaderStage::Domain, self.domain.as_deref()),
            (ShaderStage::Geometry, self.geometry.as_deref()),
            (ShaderStage::Pixel, Some(self.pixel.as_str())),
        ]
        .into_iter()
        .filter_map(|(stage, name)| name.map(|n| (stage, n)))
    }
}

/// Which per-frame transform buffer a drawable reads.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ConstantSlot {
    /// Single model matrix shared by most of the scene.
    Shared,
    /// One model matrix per light position.
    Instanced,
    /// Model matrix follows the camera.
    Skybox,
}

/// One drawable, in the order it is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawableDesc {
    pub name: String,
    pub mesh: String,
    pub topology: PrimitiveTopology,
    pub shaders: ShaderSetDesc,
    pub texture: Option<String>,
    pub constants: ConstantSlot,
    /// Instance count; `1` draws non-instanced.
    pub instances: u32,
    /// Clear depth/stencil once this drawable is drawn.
    pub clear_depth_after: bool,
}

impl DrawableDesc {
    pub fn new(
        name: impl Into<String>,
        mesh: impl Into<String>,
        topology: PrimitiveTopology,
        shaders: ShaderSetDesc,
    ) -> Self {
        Self {
            name: name.into(),
            mesh: mesh.into(),
            topology,
            shaders,
            texture: None,
            constants: ConstantSlot::Shared,
            instances: 1,
            clear_depth_after: false,
        }
    }

    pub fn textured(mut self, texture: impl Into<String>) -> Self {
        self.texture = Some(texture.into());
        self
    }

    pub fn instanced(mut self, instances: u32) -> Self {
        self.constants = ConstantSlot::Instanced;
        self.instances = instances;
        self
    }

    pub fn skybox(mut self) -> Self {
        self.constants = ConstantSlot::Skybox;
        self.clear_depth_after = true;
        self
    }
}

/// Everything the builder creates and the orchestrator draws.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneManifest {
    pub shaders: Vec<ShaderProgram>,
    pub drawables: Vec<DrawableDesc>,
}

pub mod names {
    pub const VERTEX: &str = "vertex";
    pub const INSTANCED_VERTEX: &str = "instanced_vertex";
    pub const HULL: &str = "hull";
    pub const DOMAIN: &str = "domain";
    pub const GEOMETRY: &str = "geometry";
    pub const PIXEL: &str = "pixel";
    pub const LIGHT_PIXEL: &str = "light_pixel";
    pub const PYRAMID_PIXEL: &str = "pyramid_pixel";
}

impl SceneManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shader(mut self, name: impl Into<String>, stage: ShaderStage, file: impl Into<String>) -> Self {
        self.shaders.push(ShaderProgram { name: name.into(), stage, file: file.into() });
        self
    }

    pub fn drawable(mut self, drawable: DrawableDesc) -> Self {
        self.drawables.push(drawable);
        self
    }

    /// The stadium scene: a pyramid per light, the floor, three pokeball
    /// platforms and the stadium with its tessellated dome.
    ///
    /// The plain pixel shader is compiled with the rest but no drawable
    /// binds it.
    pub fn stadium() -> Self {
        use self::names::*;

        let lit = || ShaderSetDesc::new(VERTEX, LIGHT_PIXEL).tessellated(HULL, DOMAIN);
        let patch = PrimitiveTopology::PatchList3;

        Self::new()
            .shader(VERTEX, ShaderStage::Vertex, "SampleVertexShader.cso")
            .shader(INSTANCED_VERTEX, ShaderStage::Vertex, "InstancedVertexShader.cso")
            .shader(HULL, ShaderStage::Hull, "HullShader.cso")
            .shader(DOMAIN, ShaderStage::Domain, "DomainShader.cso")
            .shader(GEOMETRY, ShaderStage::Geometry, "GeometryShader.cso")
            .shader(PIXEL, ShaderStage::Pixel, "SamplePixelShader.cso")
            .shader(LIGHT_PIXEL, ShaderStage::Pixel, "LightPixelShader.cso")
            .shader(PYRAMID_PIXEL, ShaderStage::Pixel, "PyramidPixelShader.cso")
            .drawable(
                DrawableDesc::new(
                    "pyramid",
                    "pyramid.obj",
                    PrimitiveTopology::TriangleStrip,
                    ShaderSetDesc::new(INSTANCED_VERTEX, PYRAMID_PIXEL),
                )
                .instanced(MAX_INSTANCES as u32),
            )
            .drawable(DrawableDesc::new("floor_bottom", "floor_bottom.obj", patch, lit()).textured("Castle1.dds"))
            .drawable(DrawableDesc::new("floor_platform", "floor_platform.obj", patch, lit()))
            .drawable(DrawableDesc::new("pokeball_red", "pokeballred.obj", patch, lit()).textured("pokeball.dds"))
            .drawable(DrawableDesc::new("pokeball_white", "pokeballwhite.obj", patch, lit()).textured("pokeball.dds"))
            .drawable(DrawableDesc::new("pokeball_black", "pokeballblack.obj", patch, lit()).textured("pokeball.dds"))
            .drawable(DrawableDesc::new("stadium", "stadium.obj", patch, lit()).textured("pokeball.dds"))
            .drawable(
                DrawableDesc::new(
                    "stadium_top",
                    "sphere.obj",
                    patch,
                    ShaderSetDesc::new(VERTEX, PYRAMID_PIXEL).tessellated(HULL, DOMAIN).with_geometry(GEOMETRY),
                )
                .textured("pokeball.dds"),
            )
    }

    /// The stadium scene as WGSL shaders, for devices without hull, domain
    /// or geometry stages.
    ///
    /// Same drawables, meshes and textures as [`SceneManifest::stadium`],
    /// drawn as plain triangle lists.
    pub fn stadium_wgsl() -> Self {
        use self::names::*;

        let lit = || ShaderSetDesc::new(VERTEX, LIGHT_PIXEL);
        let list = PrimitiveTopology::TriangleList;

        Self::new()
            .shader(VERTEX, ShaderStage::Vertex, "vertex.wgsl")
            .shader(INSTANCED_VERTEX, ShaderStage::Vertex, "instanced_vertex.wgsl")
            .shader(PIXEL, ShaderStage::Pixel, "pixel.wgsl")
            .shader(LIGHT_PIXEL, ShaderStage::Pixel, "light_pixel.wgsl")
            .shader(PYRAMID_PIXEL, ShaderStage::Pixel, "pyramid_pixel.wgsl")
            .drawable(
                DrawableDesc::new("pyramid", "pyramid.obj", list, ShaderSetDesc::new(INSTANCED_VERTEX, PYRAMID_PIXEL))
                    .instanced(MAX_INSTANCES as u32),
            )
            .drawable(DrawableDesc::new("floor_bottom", "floor_bottom.obj", list, lit()).textured("Castle1.dds"))
            .drawable(DrawableDesc::new("floor_platform", "floor_platform.obj", list, lit()))
            .drawable(DrawableDesc::new("pokeball_red", "pokeballred.obj", list, lit()).textured("pokeball.dds"))
            .drawable(DrawableDesc::new("pokeball_white", "pokeballwhite.obj", list, lit()).textured("pokeball.dds"))
            .drawable(DrawableDesc::new("pokeball_black", "pokeballblack.obj", list, lit()).textured("pokeball.dds"))
            .drawable(DrawableDesc::new("stadium", "stadium.obj", list, lit()).textured("pokeball.dds"))
            .drawable(
                DrawableDesc::new("stadium_top", "sphere.obj", list, ShaderSetDesc::new(VERTEX, PYRAMID_PIXEL))
                    .textured("pokeball.dds"),
            )
    }

    /// Adds the camera-centred skybox, drawn before everything else.
    ///
    /// Uses the tessellated shader set when the manifest declares a hull
    /// shader and plain vertex/pixel shaders otherwise.
    pub fn with_skybox(mut self) -> Self {
        use self::names::*;

        let (topology, shaders) = if self.program(HULL).is_some() {
            (
                PrimitiveTopology::PatchList3,
                ShaderSetDesc::new(VERTEX, PYRAMID_PIXEL).tessellated(HULL, DOMAIN).with_geometry(GEOMETRY),
            )
        } else {
            (PrimitiveTopology::TriangleList, ShaderSetDesc::new(VERTEX, PYRAMID_PIXEL))
        };
        let skybox = DrawableDesc::new("skybox", "SkyboxCube.obj", topology, shaders)
            .textured("OutputCube.dds")
            .skybox();
        self.drawables.insert(0, skybox);
        self
    }

    pub fn program(&self, name: &str) -> Option<&ShaderProgram> {
        self.shaders.iter().find(|p| p.name == name)
    }

    pub fn drawable_desc(&self, name: &str) -> Option<&DrawableDesc> {
        self.drawables.iter().find(|d| d.name == name)
    }

    pub fn uses_slot(&self, slot: ConstantSlot) -> bool {
        self.drawables.iter().any(|d| d.constants == slot)
    }

    /// Checks that every reference resolves and every drawable is drawable.
    pub fn validate(&self) -> Result<(), BuildError> {
        let mut seen = HashSet::new();
        for program in &self.shaders {
            if !seen.insert(program.name.as_str()) {
                return Err(BuildError::Manifest(format!("shader `{}` declared twice", program.name)));
            }
        }

        let mut seen = HashSet::new();
        for d in &self.drawables {
            if !seen.insert(d.name.as_str()) {
                return Err(BuildError::Manifest(format!("drawable `{}` declared twice", d.name)));
            }

            for (stage, name) in d.shaders.stages() {
                match self.program(name) {
                    Some(p) if p.stage == stage => {}
                    Some(p) => {
                        return Err(BuildError::Manifest(format!(
                            "drawable `{}` binds `{name}` as {stage:?} but it is a {:?} shader",
                            d.name, p.stage
                        )));
                    }
                    None => {
                        return Err(BuildError::Manifest(format!(
                            "drawable `{}` uses undeclared shader `{name}`",
                            d.name
                        )));
                    }
                }
            }

            let tessellated = d.shaders.hull.is_some();
            if tessellated != d.shaders.domain.is_some() {
                return Err(BuildError::Manifest(format!(
                    "drawable `{}` needs both hull and domain shaders or neither",
                    d.name
                )));
            }
            if tessellated != (d.topology == PrimitiveTopology::PatchList3) {
                return Err(BuildError::Manifest(format!(
                    "drawable `{}`: patch topology and tessellation stages must go together",
                    d.name
                )));
            }

            let max = if d.constants == ConstantSlot::Instanced { MAX_INSTANCES as u32 } else { 1 };
            if d.instances == 0 || d.instances > max {
                return Err(BuildError::Manifest(format!(
                    "drawable `{}` asks for {} instances (1..={max} allowed)",
                    d.name, d.instances
                )));
            }
        }
        Ok(())
    }

    /// Distinct texture files, in first-use order.
    pub fn textures(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.drawables
            .iter()
            .filter_map(|d| d.texture.as_deref())
            .filter(|t| seen.insert(*t))
            .collect()
    }

    /// Distinct mesh files, in first-use order.
    pub fn meshes(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.drawables
            .iter()
            .map(|d| d.mesh.as_str())
            .filter(|m| seen.insert(*m))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stadium_scene_is_valid() {
        let scene = SceneManifest::stadium();
        scene.validate().unwrap();
        assert_eq!(scene.drawables.len(), 8);
        assert_eq!(scene.drawables[0].name, "pyramid");
        assert_eq!(scene.drawables[0].instances, 3);
        assert_eq!(scene.textures(), vec!["Castle1.dds", "pokeball.dds"]);
        assert_eq!(scene.shaders.len(), 8);
        assert_eq!(scene.program(names::PIXEL).map(|p| p.file.as_str()), Some("SamplePixelShader.cso"));
        assert!(scene.drawables.iter().all(|d| d.shaders.pixel != names::PIXEL));
        assert!(!scene.uses_slot(ConstantSlot::Skybox));
    }

    #[test]
    fn skybox_is_drawn_first() {
        let scene = SceneManifest::stadium().with_skybox();
        scene.validate().unwrap();
        let first = &scene.drawables[0];
        assert_eq!(first.name, "skybox");
        assert!(first.clear_depth_after);
        assert!(scene.uses_slot(ConstantSlot::Skybox));
    }

    #[test]
    fn wgsl_scene_uses_only_vertex_and_pixel_stages() {
        let scene = SceneManifest::stadium_wgsl().with_skybox();
        scene.validate().unwrap();

        let stadium = SceneManifest::stadium();
        let names: Vec<_> = scene.drawables.iter().skip(1).map(|d| d.name.as_str()).collect();
        let expected: Vec<_> = stadium.drawables.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, expected);
        assert_eq!(scene.meshes()[1..], stadium.meshes()[..]);

        assert!(scene.shaders.iter().all(|p| matches!(p.stage, ShaderStage::Vertex | ShaderStage::Pixel)));
        assert!(scene.drawables.iter().all(|d| d.topology == PrimitiveTopology::TriangleList));
        assert!(scene.drawables.iter().all(|d| d.shaders.stages().count() == 2));
        assert!(scene.drawables[0].clear_depth_after);
    }

    #[test]
    fn unknown_shader_is_rejected() {
        let scene = SceneManifest::new()
            .shader("vs", ShaderStage::Vertex, "vs.cso")
            .drawable(DrawableDesc::new(
                "box",
                "box.obj",
                PrimitiveTopology::TriangleList,
                ShaderSetDesc::new("vs", "ps"),
            ));
        assert!(matches!(scene.validate(), Err(BuildError::Manifest(msg)) if msg.contains("`ps`")));
    }

    #[test]
    fn stage_mismatch_is_rejected() {
        let scene = SceneManifest::new()
            .shader("vs", ShaderStage::Vertex, "vs.cso")
            .drawable(DrawableDesc::new(
                "box",
                "box.obj",
                PrimitiveTopology::TriangleList,
                ShaderSetDesc::new("vs", "vs"),
            ));
        assert!(scene.validate().is_err());
    }

    #[test]
    fn patch_topology_requires_tessellation() {
        let scene = SceneManifest::new()
            .shader("vs", ShaderStage::Vertex, "vs.cso")
            .shader("ps", ShaderStage::Pixel, "ps.cso")
            .drawable(DrawableDesc::new(
                "box",
                "box.obj",
                PrimitiveTopology::PatchList3,
                ShaderSetDesc::new("vs", "ps"),
            ));
        assert!(scene.validate().is_err());
    }

    #[test]
    fn stage_iteration_skips_absent_stages() {
        let set = ShaderSetDesc::new("vs", "ps").with_geometry("gs");
        let stages: Vec<_> = set.stages().map(|(s, _)| s).collect();
        assert_eq!(stages, vec![ShaderStage::Vertex, ShaderStage::Geometry, ShaderStage::Pixel]);
    }
}
