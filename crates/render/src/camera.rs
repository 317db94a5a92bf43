use glam::{Mat4, Vec3};

/// Clip-space depth convention of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthRange {
    /// wgpu, Vulkan, Metal, D3D.
    ZeroToOne,
    /// OpenGL.
    NegativeOneToOne,
}

/// Camera orbiting a target point, the usual skin viewer control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::new(0.0, 16.0, 0.0),
            distance: 60.0,
            yaw: 30.0_f32.to_radians(),
            pitch: 10.0_f32.to_radians(),
            fov: 50.0_f32.to_radians(),
            aspect: 1.0,
            near: 0.1,
            far: 500.0,
            sensitivity: 0.005,
            min_distance: 10.0,
            max_distance: 200.0,
        }
    }
}

impl OrbitCamera {
    pub fn eye(&self) -> Vec3 {
        let offset = Vec3::new(
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.cos() * self.pitch.cos(),
        );
        self.target + offset * self.distance
    }

    /// Drag by a pointer delta in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * self.sensitivity;
        self.pitch += dy * self.sensitivity;
        self.pitch = self
            .pitch
            .clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    /// Scale the orbit radius, `factor > 1` moves away.
    pub fn zoom(&mut self, factor: f32) {
        self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, depth: DepthRange) -> Mat4 {
        match depth {
            DepthRange::ZeroToOne => Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far),
            DepthRange::NegativeOneToOne => {
                Mat4::perspective_rh_gl(self.fov, self.aspect, self.near, self.far)
            }
        }
    }

    pub fn view_projection(&self, depth: DepthRange) -> Mat4 {
        self.projection_matrix(depth) * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera() {
        let cam = OrbitCamera::default();
        assert!((cam.eye().distance(cam.target) - cam.distance).abs() < 1e-3);
        let vp = cam.view_projection(DepthRange::ZeroToOne);
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn target_projects_to_center() {
        let cam = OrbitCamera::default();
        for depth in [DepthRange::ZeroToOne, DepthRange::NegativeOneToOne] {
            let clip = cam.view_projection(depth) * cam.target.extend(1.0);
            let ndc = clip / clip.w;
            assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        }
    }

    #[test]
    fn depth_ranges_differ_at_near_plane() {
        let cam = OrbitCamera {
            yaw: 0.0,
            pitch: 0.0,
            ..OrbitCamera::default()
        };
        let near_point = cam.eye() - Vec3::Z * cam.near;
        let dx = cam.view_projection(DepthRange::ZeroToOne) * near_point.extend(1.0);
        let gl = cam.view_projection(DepthRange::NegativeOneToOne) * near_point.extend(1.0);
        assert!((dx.z / dx.w).abs() < 1e-3);
        assert!((gl.z / gl.w + 1.0).abs() < 1e-3);
    }

    #[test]
    fn pitch_and_zoom_are_clamped() {
        let mut cam = OrbitCamera::default();
        cam.rotate(0.0, 1.0e6);
        assert!(cam.pitch <= 89.0_f32.to_radians());
        cam.zoom(1000.0);
        assert_eq!(cam.distance, cam.max_distance);
        cam.zoom(0.0);
        assert_eq!(cam.distance, cam.min_distance);
    }
}
