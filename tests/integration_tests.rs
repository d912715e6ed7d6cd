//! End-to-end loopback tests: a tiny in-process TCP/UDP receiver, fed by the real fleet and
//! sender code paths.

use std::io::Read;
use std::net::{TcpListener, UdpSocket};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use syslog_flood::config::{GeneratorConfig, MessageSource, RelpConfig, TlsConfig, TransportKind};
use syslog_flood::fleet::Fleet;
use syslog_flood::state::AppState;

fn base_config(target: String, port: u16, transport: TransportKind) -> GeneratorConfig {
    GeneratorConfig {
        target,
        ports: vec![port],
        num_ports: 1,
        connections: 4,
        messages: 40,
        start_msg_num: 0,
        pri: "167".to_string(),
        hostname: "testhost".to_string(),
        frame_delim: b'\n',
        octet_count_framed: false,
        message_source: MessageSource::Generated {
            extra_data_len: 0,
            randomize_extra: false,
            dynafile_range: None,
            rfc5424: false,
            json_cookie: None,
        },
        drop_connections: false,
        drop_probability: 0.95,
        transport,
        tls: TlsConfig::default(),
        relp: RelpConfig::default(),
        batch_size: 1_000_000,
        wait_time: Duration::ZERO,
        multithreaded: false,
        opener_threads: 4,
        no_abort_on_send_fail: false,
        silent: true,
        verbose: false,
    }
}

#[test]
fn tcp_fleet_delivers_all_messages_to_loopback_receiver() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let received = Arc::new(std::sync::Mutex::new(Vec::<u8>::new()));
    let received_clone = Arc::clone(&received);
    let accept_count = 4;
    let server = thread::spawn(move || {
        for _ in 0..accept_count {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).unwrap();
            received_clone.lock().unwrap().extend_from_slice(&buf);
        }
    });

    let cfg = Arc::new(base_config("127.0.0.1".to_string(), port, TransportKind::Tcp));
    let fleet = Arc::new(Fleet::open(&cfg, 4).expect("fleet should open against loopback listener"));
    let state = Arc::new(AppState::new(0));

    let result = syslog_flood::runner::run_once(&cfg, &fleet, &state, 4);
    assert!(!result.aborted);
    assert_eq!(result.total_sent, cfg.messages);

    let mut fleet = Arc::try_unwrap(fleet).unwrap();
    fleet.close_all();
    server.join().unwrap();

    let text = String::from_utf8(received.lock().unwrap().clone()).unwrap();
    assert_eq!(text.matches("msgnum:").count(), cfg.messages as usize);
}

#[test]
fn udp_fleet_delivers_messages_to_loopback_socket() {
    let server_socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = server_socket.local_addr().unwrap().port();
    server_socket.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

    let received_count = Arc::new(std::sync::atomic::AtomicU64::new(0));
    let received_count_clone = Arc::clone(&received_count);
    let expected = 20u64;
    let server = thread::spawn(move || {
        let mut buf = [0u8; 2048];
        while received_count_clone.load(std::sync::atomic::Ordering::Relaxed) < expected {
            match server_socket.recv(&mut buf) {
                Ok(_) => {
                    received_count_clone.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                }
                Err(_) => break,
            }
        }
    });

    let mut cfg = base_config("127.0.0.1".to_string(), port, TransportKind::Udp);
    cfg.messages = expected;
    let cfg = Arc::new(cfg);
    let fleet = Arc::new(Fleet::open(&cfg, 1).expect("udp fleet should bind a socket"));
    let state = Arc::new(AppState::new(0));

    let result = syslog_flood::runner::run_once(&cfg, &fleet, &state, 1);
    assert!(!result.aborted);

    server.join().unwrap();
    assert_eq!(received_count.load(std::sync::atomic::Ordering::Relaxed), expected);
}

/// `-T tcp -c 1 -m 3 -P 167 -h host -i 0`.
#[test]
fn scenario_plain_messages_match_exact_bytes() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let received = Arc::new(std::sync::Mutex::new(Vec::<u8>::new()));
    let received_clone = Arc::clone(&received);
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        received_clone.lock().unwrap().extend_from_slice(&buf);
    });

    let mut cfg = base_config("127.0.0.1".to_string(), port, TransportKind::Tcp);
    cfg.connections = 1;
    cfg.messages = 3;
    cfg.pri = "167".to_string();
    cfg.hostname = "host".to_string();
    cfg.start_msg_num = 0;
    let cfg = Arc::new(cfg);
    let fleet = Arc::new(Fleet::open(&cfg, 1).unwrap());
    let state = Arc::new(AppState::new(cfg.start_msg_num));

    let result = syslog_flood::runner::run_once(&cfg, &fleet, &state, 1);
    assert!(!result.aborted);

    let mut fleet = Arc::try_unwrap(fleet).unwrap();
    fleet.close_all();
    server.join().unwrap();

    let text = String::from_utf8(received.lock().unwrap().clone()).unwrap();
    assert_eq!(
        text,
        "<167>Mar  1 01:00:00 host tag msgnum:00000000:\n\
         <167>Mar  1 01:00:00 host tag msgnum:00000001:\n\
         <167>Mar  1 01:00:00 host tag msgnum:00000002:\n"
    );
}

/// `-T tcp -O -c 1 -m 1 -P 13 -h h -i 7`.
#[test]
fn scenario_octet_count_framed_message_matches_exact_bytes() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let received = Arc::new(std::sync::Mutex::new(Vec::<u8>::new()));
    let received_clone = Arc::clone(&received);
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        received_clone.lock().unwrap().extend_from_slice(&buf);
    });

    let mut cfg = base_config("127.0.0.1".to_string(), port, TransportKind::Tcp);
    cfg.connections = 1;
    cfg.messages = 1;
    cfg.pri = "13".to_string();
    cfg.hostname = "h".to_string();
    cfg.start_msg_num = 7;
    cfg.octet_count_framed = true;
    let cfg = Arc::new(cfg);
    let fleet = Arc::new(Fleet::open(&cfg, 1).unwrap());
    let state = Arc::new(AppState::new(cfg.start_msg_num));

    let result = syslog_flood::runner::run_once(&cfg, &fleet, &state, 1);
    assert!(!result.aborted);

    let mut fleet = Arc::try_unwrap(fleet).unwrap();
    fleet.close_all();
    server.join().unwrap();

    let text = String::from_utf8(received.lock().unwrap().clone()).unwrap();
    assert_eq!(text, "39 <13>Mar  1 01:00:00 h tag msgnum:00000007:\n");
}

/// `-T tcp -j X -c 1 -m 1 -P 20 -h h -i 1`.
#[test]
fn scenario_json_cookie_message_matches_exact_bytes() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let received = Arc::new(std::sync::Mutex::new(Vec::<u8>::new()));
    let received_clone = Arc::clone(&received);
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        received_clone.lock().unwrap().extend_from_slice(&buf);
    });

    let mut cfg = base_config("127.0.0.1".to_string(), port, TransportKind::Tcp);
    cfg.connections = 1;
    cfg.messages = 1;
    cfg.pri = "20".to_string();
    cfg.hostname = "h".to_string();
    cfg.start_msg_num = 1;
    cfg.message_source = MessageSource::Generated {
        extra_data_len: 0,
        randomize_extra: false,
        dynafile_range: None,
        rfc5424: false,
        json_cookie: Some("X".to_string()),
    };
    let cfg = Arc::new(cfg);
    let fleet = Arc::new(Fleet::open(&cfg, 1).unwrap());
    let state = Arc::new(AppState::new(cfg.start_msg_num));

    let result = syslog_flood::runner::run_once(&cfg, &fleet, &state, 1);
    assert!(!result.aborted);

    let mut fleet = Arc::try_unwrap(fleet).unwrap();
    fleet.close_all();
    server.join().unwrap();

    let text = String::from_utf8(received.lock().unwrap().clone()).unwrap();
    assert_eq!(text, "<20>Mar  1 01:00:00 h tag X{\"msgnum\":1}\n");
}

/// `-T udp -n 1 -p <port> -c 1 -m 1 -M foo` (the spec's example port 9999 is replaced with an
/// ephemeral one so the test doesn't depend on that port being free).
#[test]
fn scenario_udp_fixed_message_matches_exact_bytes() {
    let server_socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = server_socket.local_addr().unwrap().port();
    server_socket.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

    let mut cfg = base_config("127.0.0.1".to_string(), port, TransportKind::Udp);
    cfg.connections = 1;
    cfg.messages = 1;
    cfg.message_source = MessageSource::Fixed("foo".to_string());
    let cfg = Arc::new(cfg);
    let fleet = Arc::new(Fleet::open(&cfg, 1).unwrap());
    let state = Arc::new(AppState::new(0));

    let result = syslog_flood::runner::run_once(&cfg, &fleet, &state, 1);
    assert!(!result.aborted);

    let mut buf = [0u8; 64];
    let n = server_socket.recv(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"foo\n");
}
