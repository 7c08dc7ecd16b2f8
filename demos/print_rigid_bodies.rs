//! Print rigid body poses streamed by a NatNet server.
//!
//! ```text
//! cargo run --example print_rigid_bodies -- 192.168.184.32
//! RUST_LOG=natnet=debug cargo run --example print_rigid_bodies
//! ```

use std::net::IpAddr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use natnet::protocol::{FrameMetadata, Quat, Vec3};
use natnet::{ClientConfig, NatNetClient, RigidBodyDescription, StreamListener};
use tracing::info;
use tracing_subscriber::EnvFilter;

struct Printer;

impl StreamListener for Printer {
    fn on_frame(&self, frame: &FrameMetadata) {
        info!(
            frame = frame.frame_number,
            rigid_bodies = frame.rigid_body_count,
            recording = frame.is_recording,
            "received frame"
        );
    }

    fn on_rigid_body(&self, id: i32, position: &Vec3, orientation: &Quat) {
        info!(id, ?position, ?orientation, "received rigid body");
    }

    fn on_rigid_body_description(&self, description: &RigidBodyDescription) {
        info!(id = description.id, name = %description.name, "received description");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = ClientConfig::default();
    if let Some(server) = std::env::args().nth(1) {
        config = config.with_server_address(server.parse::<IpAddr>()?);
    }

    let mut client = NatNetClient::new(config);
    client.add_listener(Arc::new(Printer));
    client.start()?;

    loop {
        thread::sleep(Duration::from_secs(1));
        let session = client.lock();
        println!("stream version {}", session.version());
        for body in session.rigid_bodies() {
            let name = session
                .rigid_body_description(body.id)
                .map_or("?", |d| d.name.as_str());
            println!("{:>6} {:<16} {:?} {:?}", body.id, name, body.position, body.orientation);
        }
    }
}
