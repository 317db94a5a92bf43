use skinview_render::RenderError;

/// Device and surface options for [`crate::WgpuRenderer`].
#[derive(Debug, Clone)]
pub struct WgpuInit {
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    pub present_mode: wgpu::PresentMode,
    /// Used when the surface supports it, otherwise the first supported mode.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,
    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,
}

impl Default for WgpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
        }
    }
}

pub fn create_instance(init: &WgpuInit) -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: init.backends,
        ..Default::default()
    })
}

pub async fn request_device(
    instance: &wgpu::Instance,
    compatible_surface: Option<&wgpu::Surface<'_>>,
    init: &WgpuInit,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue), RenderError> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: init.power_preference,
            compatible_surface,
            force_fallback_adapter: false,
        })
        .await
        .ok_or_else(|| RenderError::NoDevice("no suitable GPU adapter".into()))?;

    let info = adapter.get_info();
    tracing::info!(adapter = %info.name, backend = ?info.backend, "selected GPU adapter");

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("skinview_device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                memory_hints: Default::default(),
            },
            None,
        )
        .await
        .map_err(|e| RenderError::NoDevice(e.to_string()))?;
    Ok((adapter, device, queue))
}

pub fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = *formats.first()?;
    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        if let Some(format) = preferred.into_iter().find(|f| formats.contains(f)) {
            return Some(format);
        }
    } else if let Some(format) = formats.iter().copied().find(|f| !f.is_srgb()) {
        return Some(format);
    }
    Some(first)
}

/// Where frames end up.
pub enum Target {
    Surface {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    Offscreen {
        texture: wgpu::Texture,
        format: wgpu::TextureFormat,
    },
}

/// The output image of one frame.
pub struct Acquired {
    pub surface_texture: Option<wgpu::SurfaceTexture>,
    pub view: wgpu::TextureView,
}

impl Target {
    pub fn surface(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        init: &WgpuInit,
        prefer_srgb: bool,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let caps = surface.get_capabilities(adapter);
        let format = choose_surface_format(&caps.formats, prefer_srgb)
            .ok_or_else(|| RenderError::Surface("surface reports no formats".into()))?;
        let alpha_mode = init
            .alpha_mode
            .filter(|m| caps.alpha_modes.contains(m))
            .or_else(|| caps.alpha_modes.first().copied())
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(device, &config);
        tracing::debug!(?format, ?alpha_mode, width, height, "surface configured");
        Ok(Target::Surface { surface, config })
    }

    pub fn offscreen(device: &wgpu::Device, prefer_srgb: bool, width: u32, height: u32) -> Self {
        let format = if prefer_srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        Target::Offscreen {
            texture: create_offscreen(device, format, width, height),
            format,
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        match self {
            Target::Surface { config, .. } => config.format,
            Target::Offscreen { format, .. } => *format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        match self {
            Target::Surface { surface, config } => {
                config.width = width.max(1);
                config.height = height.max(1);
                surface.configure(device, config);
            }
            Target::Offscreen { texture, format } => {
                *texture = create_offscreen(device, *format, width, height);
            }
        }
    }

    /// Get this frame's output image. `None` means skip the frame.
    pub fn acquire(&self, device: &wgpu::Device) -> Option<Acquired> {
        match self {
            Target::Surface { surface, config } => match surface.get_current_texture() {
                Ok(surface_texture) => {
                    let view = surface_texture
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default());
                    Some(Acquired {
                        surface_texture: Some(surface_texture),
                        view,
                    })
                }
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    tracing::debug!("surface lost, reconfiguring");
                    surface.configure(device, config);
                    None
                }
                Err(err) => {
                    tracing::warn!(%err, "failed to acquire surface texture");
                    None
                }
            },
            Target::Offscreen { texture, .. } => Some(Acquired {
                surface_texture: None,
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            }),
        }
    }
}

fn create_offscreen(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen_target"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat as F;

    #[test]
    fn prefers_srgb_when_asked() {
        let formats = [F::Bgra8Unorm, F::Rgba8UnormSrgb];
        assert_eq!(choose_surface_format(&formats, true), Some(F::Rgba8UnormSrgb));
        assert_eq!(choose_surface_format(&formats, false), Some(F::Bgra8Unorm));
    }

    #[test]
    fn falls_back_to_first_format() {
        assert_eq!(choose_surface_format(&[F::Rgb10a2Unorm], true), Some(F::Rgb10a2Unorm));
        assert_eq!(choose_surface_format(&[F::Bgra8UnormSrgb], false), Some(F::Bgra8UnormSrgb));
        assert_eq!(choose_surface_format(&[], true), None);
    }
}
