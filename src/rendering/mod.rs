use bytemuck::{Pod, Zeroable};
use wgpu::{Buffer, BufferUsages, Device, VertexAttribute, VertexBufferLayout};

use crate::app_settings::SimulationSettings;
use crate::physics::area::{AreaEffect, AreaMode};
use crate::physics::{Boid, Bounds, Position};

const RING_SEGMENTS: usize = 64;
const RADIUS_SEGMENTS: usize = 24;
const RING_THICKNESS: f32 = 2.0;
const LINE_WIDTH: f32 = 1.0;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    /// Clip-space position
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRIBS: [VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2,  // position
        1 => Float32x4,  // color
    ];

    pub fn desc() -> VertexBufferLayout<'static> {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const MAGENTA: Color = Color::new(1.0, 0.0, 1.0, 1.0);
    pub const GREEN: Color = Color::new(0.0, 0.9, 0.3, 0.8);
    pub const RED: Color = Color::new(0.9, 0.1, 0.1, 0.8);
    pub const BLUE: Color = Color::new(0.2, 0.4, 1.0, 0.9);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Per-boid debug overlay: view and avoid rings plus a heading line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Radii {
    pub view: f32,
    pub avoid: f32,
    pub heading_length: f32,
    pub view_color: Color,
    pub avoid_color: Color,
    pub heading_color: Color,
}

impl Radii {
    pub fn new(settings: &SimulationSettings) -> Self {
        Self {
            view: settings.view_distance,
            avoid: settings.avoid_distance,
            heading_length: 32.0,
            view_color: Color::GREEN,
            avoid_color: Color::RED,
            heading_color: Color::BLUE,
        }
    }
}

/// How boids and the area ring are drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    /// Half-length of a boid triangle, in simulation units
    pub boid_size: f32,
    pub boid_color: Color,
    pub attract_color: Color,
    pub repel_color: Color,
    /// Drawn under every boid when set
    pub radii: Option<Radii>,
}

impl Style {
    pub fn with_radii(settings: &SimulationSettings) -> Self {
        Self {
            radii: Some(Radii::new(settings)),
            ..Self::default()
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self {
            boid_size: 4.0,
            boid_color: Color::MAGENTA,
            attract_color: Color::GREEN,
            repel_color: Color::RED,
            radii: None,
        }
    }
}

fn to_clip(position: Position, bounds: &Bounds) -> [f32; 2] {
    [
        position.x / bounds.width * 2.0 - 1.0,
        1.0 - position.y / bounds.height * 2.0,
    ]
}

/// Thin ring of `segments` quads around `center`.
fn push_ring(
    out: &mut Vec<Vertex>,
    center: Position,
    radius: f32,
    segments: usize,
    color: [f32; 4],
    bounds: &Bounds,
) {
    let inner = (radius - RING_THICKNESS / 2.0).max(0.0);
    let outer = radius + RING_THICKNESS / 2.0;
    let point = |segment: usize, radius: f32| {
        let angle = segment as f32 / segments as f32 * std::f32::consts::TAU;
        let offset = Position::new(angle.cos(), angle.sin()) * radius;
        Vertex {
            position: to_clip(center + offset, bounds),
            color,
        }
    };
    for segment in 0..segments {
        let next = segment + 1;
        out.extend_from_slice(&[
            point(segment, inner),
            point(segment, outer),
            point(next, inner),
            point(segment, outer),
            point(next, outer),
            point(next, inner),
        ]);
    }
}

/// Quad of width [`LINE_WIDTH`] from `start` to `end`.
fn push_line(out: &mut Vec<Vertex>, start: Position, end: Position, color: [f32; 4], bounds: &Bounds) {
    let along = end - start;
    let length = along.norm();
    if length <= f32::EPSILON {
        return;
    }
    let side = Position::new(-along.y, along.x) / length * (LINE_WIDTH / 2.0);
    for corner in [
        start + side,
        start - side,
        end + side,
        start - side,
        end - side,
        end + side,
    ] {
        out.push(Vertex {
            position: to_clip(corner, bounds),
            color,
        });
    }
}

/// Writes the radii overlay when the style has one, then one triangle per
/// boid pointing along its heading, then the area ring when `area` has a
/// center. `out` is cleared first.
pub fn build_vertices(
    boids: &[Boid],
    area: Option<&AreaEffect>,
    bounds: &Bounds,
    style: &Style,
    out: &mut Vec<Vertex>,
) {
    out.clear();

    if let Some(radii) = &style.radii {
        for boid in boids {
            push_ring(
                out,
                boid.position,
                radii.view,
                RADIUS_SEGMENTS,
                radii.view_color.to_array(),
                bounds,
            );
            push_ring(
                out,
                boid.position,
                radii.avoid,
                RADIUS_SEGMENTS,
                radii.avoid_color.to_array(),
                bounds,
            );
            push_line(
                out,
                boid.position,
                boid.position + boid.direction * radii.heading_length,
                radii.heading_color.to_array(),
                bounds,
            );
        }
    }

    let color = style.boid_color.to_array();
    let size = style.boid_size;
    for boid in boids {
        let forward = boid.direction * size;
        let side = Position::new(-boid.direction.y, boid.direction.x) * (size * 0.6);
        let tail = boid.position - forward;
        for corner in [boid.position + forward * 1.5, tail + side, tail - side] {
            out.push(Vertex {
                position: to_clip(corner, bounds),
                color,
            });
        }
    }

    let Some(area) = area else {
        return;
    };
    let (Some(center), true) = (area.center(), area.radius() > 0.0) else {
        return;
    };
    let color = match area.mode() {
        AreaMode::Attract => style.attract_color,
        AreaMode::Repel => style.repel_color,
    }
    .to_array();
    push_ring(out, center, area.radius(), RING_SEGMENTS, color, bounds);
}

pub struct BoidRenderer {
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: Option<Buffer>,
    vertex_capacity: usize,
    vertex_count: u32,
    vertices: Vec<Vertex>,
    style: Style,
}

impl BoidRenderer {
    pub fn new(device: &Device, format: wgpu::TextureFormat, style: Style) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Boid Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("boids.wgsl").into()),
        });

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Boid Pipeline Layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Boid Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[Vertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        Self {
            render_pipeline,
            vertex_buffer: None,
            vertex_capacity: 0,
            vertex_count: 0,
            vertices: Vec::new(),
            style,
        }
    }

    /// Rebuilds the frame's vertices and uploads them, growing the buffer when needed.
    pub fn prepare(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        boids: &[Boid],
        area: Option<&AreaEffect>,
        bounds: &Bounds,
    ) {
        build_vertices(boids, area, bounds, &self.style, &mut self.vertices);
        self.vertex_count = self.vertices.len() as u32;
        if self.vertices.is_empty() {
            return;
        }

        if self.vertex_capacity < self.vertices.len() {
            self.vertex_capacity = (self.vertices.len() * 2).max(6000);
            log::debug!("vertex buffer grown to {} vertices", self.vertex_capacity);
            self.vertex_buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Boid Vertex Buffer"),
                size: (self.vertex_capacity * std::mem::size_of::<Vertex>()) as u64,
                usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }

        if let Some(ref buffer) = self.vertex_buffer {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&self.vertices));
        }
    }

    pub fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        if self.vertex_count == 0 {
            return;
        }
        if let Some(ref vertex_buffer) = self.vertex_buffer {
            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            render_pass.draw(0..self.vertex_count, 0..1);
        }
    }
}
