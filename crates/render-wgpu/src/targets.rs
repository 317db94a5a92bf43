pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Depth buffer plus, when multisampling, the MSAA color target that
/// resolves into the frame's output view.
pub struct Attachments {
    pub depth: wgpu::TextureView,
    pub msaa: Option<wgpu::TextureView>,
    pub width: u32,
    pub height: u32,
}

impl Attachments {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Self {
        let depth = create_target(device, "depth_texture", DEPTH_FORMAT, width, height, sample_count);
        let msaa = (sample_count > 1).then(|| {
            create_target(device, "msaa_color", color_format, width, height, sample_count)
        });
        tracing::debug!(width, height, sample_count, "render attachments created");
        Self {
            depth,
            msaa,
            width,
            height,
        }
    }

    /// Color view to render into and the resolve target, if any.
    pub fn color<'a>(
        &'a self,
        output: &'a wgpu::TextureView,
    ) -> (&'a wgpu::TextureView, Option<&'a wgpu::TextureView>) {
        match &self.msaa {
            Some(msaa) => (msaa, Some(output)),
            None => (output, None),
        }
    }
}

fn create_target(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    sample_count: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
