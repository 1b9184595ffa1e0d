use crate::dummy::BehaviorManager;
use crate::input::{InputManager, KeyCommands};
use crate::overlay::DiagnosticsOverlay;
use crate::rendering::Renderer;
use bincode::{deserialize, serialize};
use log::{error, info, warn};
use shared::{Dummy, DummyColor, OwnerId, Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;
use tokio::time::interval;

/// World state snapshots grow with the dummy population, so the receive
/// buffer is sized for a full datagram.
const RECV_BUFFER_SIZE: usize = 65536;

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    client_id: Option<OwnerId>,
    connected: bool,
    running: bool,

    behaviors: BehaviorManager,
    input_manager: InputManager,
    overlay: DiagnosticsOverlay,
    renderer: Renderer,

    /// Latest replicated world state, rendered as-is.
    dummies: Vec<Dummy>,
    batch_size: u32,
    preferred_color: Option<DummyColor>,
    last_frame: Instant,
}

impl Client {
    pub async fn new(
        server_addr: &str,
        batch_size: u32,
        preferred_color: Option<DummyColor>,
        width: usize,
        height: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        let renderer = Renderer::new(width, height)?;

        Ok(Client {
            socket,
            server_addr,
            client_id: None,
            connected: false,
            running: true,
            behaviors: BehaviorManager::new(),
            input_manager: InputManager::new(),
            overlay: DiagnosticsOverlay::new(),
            renderer,
            dummies: Vec::new(),
            batch_size,
            preferred_color,
            last_frame: Instant::now(),
        })
    }

    async fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to server...");

        let packet = Packet::Connect {
            client_version: PROTOCOL_VERSION,
        };
        self.send_packet(&packet).await?;

        Ok(())
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    async fn handle_packet(&mut self, packet: Packet) {
        match packet {
            Packet::Connected { client_id } => {
                info!("Connected! Client ID: {}", client_id);
                self.client_id = Some(client_id);
                self.connected = true;
            }

            Packet::Pong { timestamp } => {
                let rtt = unix_millis().saturating_sub(timestamp);
                self.overlay.record_rtt(rtt);
            }

            Packet::WorldState {
                dummy_count,
                dummies,
                ..
            } => {
                self.dummies = dummies;
                self.overlay.record_dummy_count(dummy_count);

                if let Some(client_id) = self.client_id {
                    self.behaviors
                        .sync(client_id, &self.dummies, Instant::now());
                }
            }

            Packet::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                self.connected = false;
                self.client_id = None;
            }

            _ => {
                warn!("Unexpected packet type");
            }
        }
    }

    async fn handle_commands(&mut self, commands: KeyCommands) {
        if commands.toggle_overlay {
            self.overlay.toggle_visibility();
            info!("Overlay visible: {}", self.overlay.is_visible());
        }

        if commands.quit {
            info!("Quitting...");
            self.running = false;
        }

        if !self.connected {
            return;
        }

        if commands.spawn_one {
            info!("Requesting 1 dummy");
            let packet = Packet::SpawnDummies {
                count: 1,
                color: self.preferred_color,
            };
            if let Err(e) = self.send_packet(&packet).await {
                error!("Error sending spawn request: {}", e);
            }
        }

        if commands.spawn_batch {
            info!("Requesting {} dummies", self.batch_size);
            let packet = Packet::SpawnDummies {
                count: self.batch_size,
                color: self.preferred_color,
            };
            if let Err(e) = self.send_packet(&packet).await {
                error!("Error sending spawn request: {}", e);
            }
        }

        if commands.delete_all {
            info!("Requesting deletion of all own dummies");
            if let Err(e) = self.send_packet(&Packet::DeleteAllDummies).await {
                error!("Error sending delete request: {}", e);
            }
        }
    }

    /// Ticks every owned dummy's behavior and submits the resulting inputs.
    async fn drive_dummies(&mut self) {
        if !self.connected {
            return;
        }

        let inputs = self.behaviors.tick(Instant::now());
        for input in inputs {
            let packet = Packet::DummyInput {
                dummy_id: input.dummy_id,
                sequence: input.sequence,
                heading_deg: input.heading_deg,
                jump: input.jump,
            };
            if let Err(e) = self.send_packet(&packet).await {
                error!("Error sending dummy input: {}", e);
            }
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;

        let mut input_interval = interval(Duration::from_millis(16));
        let mut ping_interval = interval(Duration::from_millis(500));
        let mut render_interval = interval(Duration::from_millis(16));

        let mut buffer = [0u8; RECV_BUFFER_SIZE];

        while self.running {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, _)) => {
                            if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                                self.handle_packet(packet).await;
                            }
                        },
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                _ = input_interval.tick() => {
                    let commands = self.input_manager.poll();
                    self.handle_commands(commands).await;
                    self.drive_dummies().await;
                },

                _ = ping_interval.tick() => {
                    if self.connected {
                        let packet = Packet::Ping { timestamp: unix_millis() };
                        if let Err(e) = self.send_packet(&packet).await {
                            error!("Error sending ping: {}", e);
                        }
                    }
                },

                _ = render_interval.tick() => {
                    let dt = self.last_frame.elapsed().as_secs_f32();
                    self.last_frame = Instant::now();
                    self.overlay.record_frame(dt);

                    self.renderer.render(&self.dummies, self.client_id, &self.overlay);
                },
            }
        }

        if self.connected {
            let _ = self.send_packet(&Packet::Disconnect).await;
        }

        Ok(())
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}
