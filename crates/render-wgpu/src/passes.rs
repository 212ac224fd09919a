//! Draw passes and the fixed-order driver that runs them.

use crate::gpu::{CUBE_INDEX_COUNT, GROUND_INDEX_COUNT};

/// One step of a frame. `Ctx` is whatever the passes record into; for the
/// GPU backend that is a `wgpu::RenderPass`.
pub trait RenderPass<Ctx> {
    fn label(&self) -> &'static str;
    /// Set pipeline and buffers.
    fn bind(&self, ctx: &mut Ctx);
    fn draw(&self, ctx: &mut Ctx);
    fn unbind(&self, _ctx: &mut Ctx) {}
}

/// Run every pass in order: bind, draw, unbind.
pub fn run_passes<Ctx>(ctx: &mut Ctx, passes: &[&dyn RenderPass<Ctx>]) {
    for pass in passes {
        tracing::trace!(pass = pass.label(), "draw pass");
        pass.bind(ctx);
        pass.draw(ctx);
        pass.unbind(ctx);
    }
}

/// The ground quad, drawn first so cubes resting on it win the depth test.
pub struct GroundPass {
    pub(crate) pipeline: wgpu::RenderPipeline,
    pub(crate) globals: wgpu::BindGroup,
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
}

impl<'p> RenderPass<wgpu::RenderPass<'p>> for GroundPass {
    fn label(&self) -> &'static str {
        "ground"
    }

    fn bind(&self, pass: &mut wgpu::RenderPass<'p>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.globals, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'p>) {
        pass.draw_indexed(0..GROUND_INDEX_COUNT, 0, 0..1);
    }
}

/// Every voxel as one instance of the unit cube.
pub struct CubePass {
    pub(crate) pipeline: wgpu::RenderPipeline,
    pub(crate) globals: wgpu::BindGroup,
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) instance_buffer: wgpu::Buffer,
    pub(crate) instance_count: u32,
}

impl<'p> RenderPass<wgpu::RenderPass<'p>> for CubePass {
    fn label(&self) -> &'static str {
        "cubes"
    }

    fn bind(&self, pass: &mut wgpu::RenderPass<'p>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.globals, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'p>) {
        if self.instance_count > 0 {
            pass.draw_indexed(0..CUBE_INDEX_COUNT, 0, 0..self.instance_count);
        }
    }
}
