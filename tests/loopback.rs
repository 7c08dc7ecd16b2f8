use std::net::{Ipv4Addr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use natnet::protocol::FrameMetadata;
use natnet::{
    ClientConfig, CommandResponse, ConnectionType, MessageType, NatNetClient, StreamListener,
    StreamVersion,
};
use parking_lot::Mutex;

#[path = "../src/test_utils.rs"]
mod test_utils;

use test_utils::{BodySpec, DatasetSpec, DescriptionSpec, FrameSpec, Layout};

/// Minimal server: answers ping, model definition and text requests on one
/// command socket, recording the message types it saw.
struct FakeServer {
    socket: UdpSocket,
    stop: Arc<AtomicBool>,
    received: Arc<Mutex<Vec<u16>>>,
    handle: Option<JoinHandle<()>>,
}

impl FakeServer {
    fn start() -> Self {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        socket
            .set_read_timeout(Some(Duration::from_millis(20)))
            .unwrap();
        let stop = Arc::new(AtomicBool::new(false));
        let received = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let socket = socket.try_clone().unwrap();
            let stop = Arc::clone(&stop);
            let received = Arc::clone(&received);
            thread::spawn(move || serve(&socket, &stop, &received))
        };

        Self {
            socket,
            stop,
            received,
            handle: Some(handle),
        }
    }

    fn port(&self) -> u16 {
        self.socket.local_addr().unwrap().port()
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(socket: &UdpSocket, stop: &AtomicBool, received: &Mutex<Vec<u16>>) {
    let layout = Layout::for_version(2, 9);
    let mut buf = [0u8; 1024];
    while !stop.load(Ordering::Acquire) {
        let Ok((len, from)) = socket.recv_from(&mut buf) else {
            continue;
        };
        if len < 4 {
            continue;
        }
        let message_type = u16::from_le_bytes([buf[0], buf[1]]);
        received.lock().push(message_type);

        match MessageType::from_u16(message_type) {
            Some(MessageType::Ping) => {
                let reply = test_utils::ping_response_packet("FakeMotive", [2, 9, 0, 0]);
                socket.send_to(&reply, from).unwrap();
            }
            Some(MessageType::RequestModelDef) => {
                let model = test_utils::model_definition_packet(
                    &layout,
                    &[DatasetSpec::RigidBody(DescriptionSpec::new(1, "Head", -1))],
                );
                socket.send_to(&model, from).unwrap();
                let frame = FrameSpec {
                    frame_number: 1,
                    bodies: vec![BodySpec::new(1, [0.1, 1.6, -0.2])],
                    ..FrameSpec::default()
                };
                socket
                    .send_to(&test_utils::frame_packet(&layout, &frame), from)
                    .unwrap();
            }
            Some(MessageType::Request) => {
                socket
                    .send_to(&test_utils::response_text_packet("OK"), from)
                    .unwrap();
            }
            _ => {
                let mut reply = Vec::from(test_utils::UNRECOGNIZED_REQUEST.to_le_bytes());
                reply.extend_from_slice(&[0, 0]);
                socket.send_to(&reply, from).unwrap();
            }
        }
    }
}

#[derive(Default)]
struct Events {
    frames: AtomicUsize,
    responses: Mutex<Vec<CommandResponse>>,
}

impl StreamListener for Events {
    fn on_frame(&self, _frame: &FrameMetadata) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    fn on_response(&self, response: &CommandResponse) {
        self.responses.lock().push(response.clone());
    }
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

fn client_for(server: &FakeServer) -> NatNetClient {
    let config = ClientConfig::default()
        .with_server_address(Ipv4Addr::LOCALHOST)
        .with_command_port(server.port())
        .with_local_interface(Ipv4Addr::LOCALHOST)
        .with_connection_type(ConnectionType::Unicast)
        .with_data_port(0)
        .with_read_timeout(Duration::from_millis(20));
    NatNetClient::new(config)
}

#[test]
fn negotiates_and_tracks_over_udp() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let server = FakeServer::start();
    let mut client = client_for(&server);
    let events = Arc::new(Events::default());
    client.add_listener(events.clone());
    client.start().unwrap();

    assert!(wait_for(|| {
        client
            .rigid_body_states()
            .first()
            .is_some_and(|body| body.position == [0.1, 1.6, -0.2])
    }));
    assert_eq!(client.negotiated_version(), StreamVersion::new(2, 9, 0, 0));
    assert_eq!(client.server_info().unwrap().app_name, "FakeMotive");
    assert_eq!(client.rigid_body_descriptions()[0].name, "Head");

    client.send_request("StartRecording").unwrap();
    assert!(wait_for(|| !events.responses.lock().is_empty()));
    assert_eq!(
        events.responses.lock()[0],
        CommandResponse::Text("OK".into())
    );

    // Frames on the data socket go through the same commit path.
    let data_addr = client.data_local_addr().unwrap();
    let streamer = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let frame = FrameSpec {
        frame_number: 2,
        bodies: vec![BodySpec::new(1, [0.2, 1.5, -0.1])],
        ..FrameSpec::default()
    };
    streamer
        .send_to(
            &test_utils::frame_packet(&Layout::for_version(2, 9), &frame),
            data_addr,
        )
        .unwrap();
    assert!(wait_for(|| client.rigid_body_states()[0].position == [0.2, 1.5, -0.1]));
    assert!(events.frames.load(Ordering::Relaxed) >= 2);

    assert_eq!(
        server.received.lock()[..3],
        [
            MessageType::Ping.as_u16(),
            MessageType::RequestModelDef.as_u16(),
            MessageType::Request.as_u16(),
        ]
    );

    let stopping = Instant::now();
    client.stop();
    assert!(!client.is_running());
    assert!(stopping.elapsed() < Duration::from_secs(2));

    let metrics = client.metrics();
    assert_eq!(metrics.commands_sent, 3);
    assert_eq!(metrics.decode_errors, 0);
    assert_eq!(metrics.last_frame_number, 2);
}

#[test]
fn garbage_on_the_wire_is_dropped() {
    let server = FakeServer::start();
    let mut client = client_for(&server);
    client.start().unwrap();
    assert!(wait_for(|| client.rigid_body_states().len() == 1));
    let before = client.snapshot();

    let data_addr = client.data_local_addr().unwrap();
    let streamer = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let frame = test_utils::frame_packet(
        &Layout::for_version(2, 9),
        &FrameSpec {
            bodies: vec![BodySpec::new(1, [5.0, 5.0, 5.0]).with_markers(5)],
            ..FrameSpec::default()
        },
    );
    streamer.send_to(&frame[..frame.len() / 2], data_addr).unwrap();
    streamer.send_to(&[7, 0], data_addr).unwrap();

    assert!(wait_for(|| client.metrics().decode_errors == 2));
    assert_eq!(client.snapshot(), before);
    assert!(client.is_running());
}
