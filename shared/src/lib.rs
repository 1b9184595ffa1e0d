use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: u32 = 1;

/// Half-extent of the square region new dummies spawn into.
pub const SPAWN_EXTENT: f32 = 10.0;
/// Half-extent of the square arena dummies are clamped to while roaming.
pub const ARENA_EXTENT: f32 = 12.0;
/// Downward acceleration applied to a dummy's jump height, units/s².
pub const GRAVITY: f32 = 20.0;

/// Opaque handle for a connected peer; assigned by the server and never
/// reused within one server run.
pub type OwnerId = u64;
/// Identifier of one spawned dummy; doubles as its display-name suffix.
pub type DummyId = u32;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    SpawnDummies {
        count: u32,
        color: Option<DummyColor>,
    },
    DeleteAllDummies,
    DummyInput {
        dummy_id: DummyId,
        sequence: u32,
        heading_deg: f32,
        jump: bool,
    },
    Ping {
        timestamp: u64,
    },
    Disconnect,

    Connected {
        client_id: OwnerId,
    },
    Pong {
        timestamp: u64,
    },
    WorldState {
        tick: u32,
        timestamp: u64,
        dummy_count: u32,
        dummies: Vec<Dummy>,
    },
    Disconnected {
        reason: String,
    },
}

/// RGB color in the 0.0–1.0 range, as replicated with each dummy.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct DummyColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl DummyColor {
    pub const WHITE: DummyColor = DummyColor {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }
}

impl std::str::FromStr for DummyColor {
    type Err = String;

    /// Parses `"r,g,b"` with each channel in 0.0–1.0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!("expected \"r,g,b\", got \"{}\"", s));
        }

        let mut channels = [0.0f32; 3];
        for (slot, part) in channels.iter_mut().zip(&parts) {
            *slot = part
                .parse::<f32>()
                .map_err(|e| format!("bad color channel \"{}\": {}", part, e))?;
        }

        Ok(DummyColor::new(channels[0], channels[1], channels[2]))
    }
}

/// One replicated dummy entity. The server owns the authoritative copy;
/// clients receive it in every `WorldState` snapshot.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Dummy {
    pub id: DummyId,
    pub owner: OwnerId,
    pub name: String,
    pub color: DummyColor,
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub heading_deg: f32,
    pub height: f32,
    pub vertical_vel: f32,
    pub on_ground: bool,
    pub radius: f32,
    pub speed: f32,
    pub jump_velocity: f32,
}

impl Dummy {
    /// A freshly instantiated dummy. It stands still until its movement
    /// profile is attached and its owner submits the first input.
    pub fn new(
        id: DummyId,
        owner: OwnerId,
        name: String,
        color: DummyColor,
        x: f32,
        y: f32,
        radius: f32,
    ) -> Self {
        Self {
            id,
            owner,
            name,
            color,
            x,
            y,
            vel_x: 0.0,
            vel_y: 0.0,
            heading_deg: 0.0,
            height: 0.0,
            vertical_vel: 0.0,
            on_ground: true,
            radius,
            speed: 0.0,
            jump_velocity: 0.0,
        }
    }

    pub fn is_airborne(&self) -> bool {
        !self.on_ground
    }
}

/// Unit direction on the movement plane for a heading in degrees.
pub fn heading_vector(heading_deg: f32) -> (f32, f32) {
    let rad = heading_deg.to_radians();
    (rad.cos(), rad.sin())
}

/// Applies one simulated input to a dummy: the heading becomes the new
/// movement direction at the dummy's configured speed, and a jump request
/// launches it if it is on the ground. Jump requests while airborne are
/// dropped.
pub fn apply_dummy_input(dummy: &mut Dummy, heading_deg: f32, jump: bool) {
    let heading = heading_deg.rem_euclid(360.0);
    let (dir_x, dir_y) = heading_vector(heading);

    dummy.heading_deg = heading;
    dummy.vel_x = dir_x * dummy.speed;
    dummy.vel_y = dir_y * dummy.speed;

    if jump && dummy.on_ground {
        dummy.vertical_vel = dummy.jump_velocity;
        dummy.on_ground = false;
    }
}

/// Advances one dummy by `dt` seconds: plane movement clamped to the arena,
/// plus the vertical jump arc under gravity.
pub fn step_dummy(dummy: &mut Dummy, dt: f32) {
    dummy.x = (dummy.x + dummy.vel_x * dt).clamp(-ARENA_EXTENT, ARENA_EXTENT);
    dummy.y = (dummy.y + dummy.vel_y * dt).clamp(-ARENA_EXTENT, ARENA_EXTENT);

    if !dummy.on_ground {
        dummy.height += dummy.vertical_vel * dt;
        dummy.vertical_vel -= GRAVITY * dt;

        if dummy.height <= 0.0 {
            dummy.height = 0.0;
            dummy.vertical_vel = 0.0;
            dummy.on_ground = true;
        }
    }
}
