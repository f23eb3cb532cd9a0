use crate::engine::scene::Scene;
use crate::solar::registry::PlanetRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
}

/// Advances the planets once per displayed frame. Speeds are per frame, so
/// motion follows the host's refresh rate.
#[derive(Debug)]
pub struct FrameDriver {
    state: DriverState,
}

impl Default for FrameDriver {
    fn default() -> Self {
        FrameDriver::new()
    }
}

impl FrameDriver {
    pub fn new() -> Self {
        FrameDriver { state: DriverState::Idle }
    }

    /// There is no way back to `Idle`; the loop runs until the page goes away.
    pub fn start(&mut self) {
        if self.state == DriverState::Idle {
            log::info!("frame loop started");
            self.state = DriverState::Running;
        }
    }

    /// Spins every mesh and revolves every pivot by one frame's increment.
    /// Returns `false` without touching the scene while idle.
    pub fn advance(&mut self, scene: &mut Scene, registry: &PlanetRegistry) -> bool {
        if self.state == DriverState::Idle {
            return false;
        }
        for body in registry.iter() {
            scene.rotate_y(body.mesh, body.spin_speed);
            scene.rotate_y(body.pivot, body.revolution_speed);
        }
        true
    }
}

#[cfg(test)]
impl FrameDriver {
    pub fn state(&self) -> DriverState {
        self.state
    }
}
